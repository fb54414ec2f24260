//! Unit tests for billing ratios, percentages and rounding
//!
//! Tests cover ratio validation, proration arithmetic, percentage math and
//! the rounding rules applied to final prices and tax amounts.

use core_kernel::{
    amounts_match, round_final_price, round_tax_amount, MoneyError, Percentage, Ratio,
    AMOUNT_TOLERANCE,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod ratio_creation {
    use super::*;

    #[test]
    fn test_new_accepts_proper_fraction() {
        let ratio = Ratio::new(1, 2).unwrap();
        assert_eq!(ratio.numerator(), 1);
        assert_eq!(ratio.denominator(), 2);
    }

    #[test]
    fn test_new_accepts_zero_numerator() {
        let ratio = Ratio::new(0, 4).unwrap();
        assert_eq!(ratio.apply(dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_new_rejects_zero_denominator() {
        let err = Ratio::new(0, 0).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidRatio { denominator: 0, .. }));
    }

    #[test]
    fn test_new_rejects_numerator_above_denominator() {
        assert!(Ratio::new(5, 4).is_err());
    }

    #[test]
    fn test_default_is_full() {
        assert_eq!(Ratio::default(), Ratio::FULL);
    }

    #[test]
    fn test_display() {
        assert_eq!(Ratio::new(3, 4).unwrap().to_string(), "3/4");
    }
}

mod ratio_arithmetic {
    use super::*;

    #[test]
    fn test_half_of_three_hundred() {
        assert_eq!(Ratio::new(1, 2).unwrap().apply(dec!(300)), dec!(150));
    }

    #[test]
    fn test_quarter_ratio() {
        assert_eq!(Ratio::new(3, 4).unwrap().apply(dec!(200)), dec!(150));
    }

    #[test]
    fn test_as_decimal() {
        assert_eq!(Ratio::new(1, 4).unwrap().as_decimal(), dec!(0.25));
    }

    #[test]
    fn test_equal_parts_is_full() {
        let ratio = Ratio::new(7, 7).unwrap();
        assert!(ratio.is_full());
        assert_eq!(ratio.apply(dec!(99.99)), dec!(99.99));
    }
}

mod percentage {
    use super::*;

    #[test]
    fn test_of_amount() {
        let pct = Percentage::new(dec!(10)).unwrap();
        assert_eq!(pct.of(dec!(300)), dec!(30));
    }

    #[test]
    fn test_zero_percentage() {
        let pct = Percentage::new(Decimal::ZERO).unwrap();
        assert_eq!(pct.of(dec!(300)), Decimal::ZERO);
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(
            Percentage::new(dec!(-5)),
            Err(MoneyError::InvalidPercentage(dec!(-5)))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Percentage::new(dec!(20.00)).unwrap().to_string(), "20%");
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_final_price_rounds_half_away_from_zero() {
        assert_eq!(round_final_price(dec!(0.125)), dec!(0.13));
        assert_eq!(round_final_price(dec!(0.124)), dec!(0.12));
        assert_eq!(round_final_price(dec!(-0.125)), dec!(-0.13));
    }

    #[test]
    fn test_tax_amount_keeps_six_places() {
        assert_eq!(round_tax_amount(dec!(83.3333333333)), dec!(83.333333));
        assert_eq!(round_tax_amount(dec!(1.0000005)), dec!(1.000001));
    }

    #[test]
    fn test_tolerance_is_one_cent() {
        assert_eq!(AMOUNT_TOLERANCE, dec!(0.01));
        assert!(amounts_match(dec!(10.00), dec!(10.009)));
        assert!(!amounts_match(dec!(10.00), dec!(10.01)));
    }
}
