//! Catalog Domain
//!
//! Master data consulted when an order is priced: products and packages,
//! billing schedules with their periods and ratios, discounts, taxes and the
//! price table.
//!
//! # Product kinds
//!
//! ```text
//! Fee(OneTime | Recurring)
//! Material(OneTime | Recurring)
//! Package(OneTime | SlotBased | FrequencyBased | ScheduleBased)
//! ```
//!
//! Recurring fees and materials, frequency-based and schedule-based packages
//! are billed once per period of their billing schedule. Everything else is
//! billed once at order time.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_catalog::{Catalog, Product, ProductKind, Cadence};
//!
//! let mut catalog = Catalog::new();
//! catalog.insert_product(
//!     Product::new(product_id, "Tuition", ProductKind::Fee(Cadence::Recurring))
//!         .with_billing_schedule(schedule_id),
//! );
//! let periods = catalog.resolve_periods(&schedule_id, start_date)?;
//! ```

pub mod catalog;
pub mod discount;
pub mod error;
pub mod price;
pub mod product;
pub mod schedule;
pub mod tax;

pub use catalog::Catalog;
pub use discount::{Discount, DiscountAmount, DiscountType, UserDiscountTag};
pub use error::CatalogError;
pub use price::{PriceTable, PriceType, ProductPrice};
pub use product::{Cadence, Package, PackageCourse, PackageType, Product, ProductKind, QuantityType};
pub use schedule::{BillingRatio, BillingSchedule, BillingSchedulePeriod, ResolvedPeriod};
pub use tax::{Tax, TaxCategory};
