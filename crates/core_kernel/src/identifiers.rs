//! Strongly-typed identifiers for domain entities
//!
//! Newtype wrappers around UUIDs keep a product id from being passed where a
//! student product id is expected. New records use time-ordered v7 UUIDs so
//! rows sort by creation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Catalog identifiers
define_id!(ProductId, "PRD");
define_id!(DiscountId, "DSC");
define_id!(TaxId, "TAX");
define_id!(BillingScheduleId, "BSC");
define_id!(BillingSchedulePeriodId, "BSP");
define_id!(BillingRatioId, "BRT");
define_id!(CourseId, "CRS");

// Student identifiers
define_id!(StudentId, "STU");
define_id!(LocationId, "LOC");

// Order and billing identifiers
define_id!(OrderId, "ORD");
define_id!(StudentProductId, "SPR");
define_id!(BillItemId, "BIL");
define_id!(StudentPackageId, "SPK");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_display() {
        let id = ProductId::new();
        let display = id.to_string();
        assert!(display.starts_with("PRD-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = StudentProductId::new_v7();
        let parsed: StudentProductId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);

        let bare: StudentProductId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, bare);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let order_id = OrderId::from(uuid);
        let back: Uuid = order_id.into();
        assert_eq!(uuid, back);
    }
}
