//! Unit tests for the identifier newtypes
//!
//! Tests cover creation, prefixes, parsing and serde behaviour.

use core_kernel::{
    BillItemId, BillingSchedulePeriodId, CourseId, DiscountId, OrderId, ProductId,
    StudentId, StudentPackageId, StudentProductId,
};
use uuid::Uuid;

mod student_product_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(StudentProductId::new(), StudentProductId::new());
    }

    #[test]
    fn test_new_v7_is_time_ordered() {
        let first = StudentProductId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = StudentProductId::new_v7();
        let first: Uuid = first.into();
        let second: Uuid = second.into();
        assert!(first < second);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(StudentProductId::prefix(), "SPR");
    }

    #[test]
    fn test_round_trip_through_display() {
        let id = StudentProductId::new();
        let parsed: StudentProductId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_invalid_string_rejected() {
        assert!("SPR-not-a-uuid".parse::<StudentProductId>().is_err());
    }
}

mod prefix_tests {
    use super::*;

    #[test]
    fn test_each_entity_has_distinct_prefix() {
        let prefixes = [
            ProductId::prefix(),
            DiscountId::prefix(),
            CourseId::prefix(),
            StudentId::prefix(),
            OrderId::prefix(),
            BillItemId::prefix(),
            BillingSchedulePeriodId::prefix(),
            StudentPackageId::prefix(),
        ];
        let unique: std::collections::HashSet<_> = prefixes.iter().collect();
        assert_eq!(unique.len(), prefixes.len());
    }

    #[test]
    fn test_display_uses_prefix() {
        assert!(OrderId::new().to_string().starts_with("ORD-"));
        assert!(BillItemId::new().to_string().starts_with("BIL-"));
    }
}

mod serde_tests {
    use super::*;

    #[test]
    fn test_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id = ProductId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }

    #[test]
    fn test_deserializes_from_uuid() {
        let uuid = Uuid::new_v4();
        let id: CourseId = serde_json::from_str(&format!("\"{}\"", uuid)).unwrap();
        assert_eq!(*id.as_uuid(), uuid);
    }
}
