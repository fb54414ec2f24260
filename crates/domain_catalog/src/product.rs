//! Products and packages
//!
//! A product is either a fee, a material or a package. Fees and materials are
//! billed once or on a schedule; packages bundle courses and are priced by
//! course slots or course weights depending on their package type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BillingScheduleId, CourseId, ProductId, TaxId};
use crate::error::CatalogError;

/// Billing cadence of a fee or material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cadence {
    /// Billed once at order time
    OneTime,
    /// Billed once per billing schedule period
    Recurring,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::OneTime => "ONE_TIME",
            Cadence::Recurring => "RECURRING",
        }
    }
}

impl FromStr for Cadence {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONE_TIME" => Ok(Cadence::OneTime),
            "RECURRING" => Ok(Cadence::Recurring),
            other => Err(CatalogError::unknown("cadence", other)),
        }
    }
}

/// Pricing model of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageType {
    /// Flat price, billed once
    OneTime,
    /// Priced by total slots, billed once
    SlotBased,
    /// Priced by slots per week, billed per period
    FrequencyBased,
    /// Priced by course weight, billed per period
    ScheduleBased,
}

impl PackageType {
    /// Quantity measured on course items for this package type
    pub fn quantity_type(&self) -> QuantityType {
        match self {
            PackageType::OneTime | PackageType::ScheduleBased => QuantityType::CourseWeight,
            PackageType::SlotBased => QuantityType::Slot,
            PackageType::FrequencyBased => QuantityType::SlotPerWeek,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, PackageType::FrequencyBased | PackageType::ScheduleBased)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::OneTime => "PACKAGE_TYPE_ONE_TIME",
            PackageType::SlotBased => "PACKAGE_TYPE_SLOT_BASED",
            PackageType::FrequencyBased => "PACKAGE_TYPE_FREQUENCY",
            PackageType::ScheduleBased => "PACKAGE_TYPE_SCHEDULED",
        }
    }
}

impl FromStr for PackageType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PACKAGE_TYPE_ONE_TIME" => Ok(PackageType::OneTime),
            "PACKAGE_TYPE_SLOT_BASED" => Ok(PackageType::SlotBased),
            "PACKAGE_TYPE_FREQUENCY" => Ok(PackageType::FrequencyBased),
            "PACKAGE_TYPE_SCHEDULED" => Ok(PackageType::ScheduleBased),
            other => Err(CatalogError::unknown("package type", other)),
        }
    }
}

/// How the quantity of a package order is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuantityType {
    /// Sum of course weights
    CourseWeight,
    /// Sum of course slots
    Slot,
    /// Sum of course slots per week
    SlotPerWeek,
}

impl QuantityType {
    /// Returns true when course items carry slots rather than weights
    pub fn uses_slots(&self) -> bool {
        matches!(self, QuantityType::Slot | QuantityType::SlotPerWeek)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityType::CourseWeight => "QUANTITY_TYPE_COURSE_WEIGHT",
            QuantityType::Slot => "QUANTITY_TYPE_SLOT",
            QuantityType::SlotPerWeek => "QUANTITY_TYPE_SLOT_PER_WEEK",
        }
    }
}

impl FromStr for QuantityType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUANTITY_TYPE_COURSE_WEIGHT" => Ok(QuantityType::CourseWeight),
            "QUANTITY_TYPE_SLOT" => Ok(QuantityType::Slot),
            "QUANTITY_TYPE_SLOT_PER_WEEK" => Ok(QuantityType::SlotPerWeek),
            other => Err(CatalogError::unknown("quantity type", other)),
        }
    }
}

/// Closed set of product kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "product_type", content = "subtype", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Fee(Cadence),
    Material(Cadence),
    Package(PackageType),
}

impl ProductKind {
    /// Returns true when the product bills once per schedule period
    pub fn is_recurring(&self) -> bool {
        match self {
            ProductKind::Fee(cadence) | ProductKind::Material(cadence) => {
                *cadence == Cadence::Recurring
            }
            ProductKind::Package(package_type) => package_type.is_recurring(),
        }
    }

    pub fn package_type(&self) -> Option<PackageType> {
        match self {
            ProductKind::Package(package_type) => Some(*package_type),
            _ => None,
        }
    }

    pub fn is_package(&self) -> bool {
        matches!(self, ProductKind::Package(_))
    }

    /// Storage name of the product type column
    pub fn product_type_str(&self) -> &'static str {
        match self {
            ProductKind::Fee(_) => "PRODUCT_TYPE_FEE",
            ProductKind::Material(_) => "PRODUCT_TYPE_MATERIAL",
            ProductKind::Package(_) => "PRODUCT_TYPE_PACKAGE",
        }
    }

    /// Storage name of the subtype column
    pub fn subtype_str(&self) -> &'static str {
        match self {
            ProductKind::Fee(cadence) | ProductKind::Material(cadence) => cadence.as_str(),
            ProductKind::Package(package_type) => package_type.as_str(),
        }
    }

    /// Rebuilds a kind from its two storage columns
    pub fn from_parts(product_type: &str, subtype: &str) -> Result<Self, CatalogError> {
        match product_type {
            "PRODUCT_TYPE_FEE" => Ok(ProductKind::Fee(subtype.parse()?)),
            "PRODUCT_TYPE_MATERIAL" => Ok(ProductKind::Material(subtype.parse()?)),
            "PRODUCT_TYPE_PACKAGE" => Ok(ProductKind::Package(subtype.parse()?)),
            other => Err(CatalogError::unknown("product type", other)),
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product_type_str(), self.subtype_str())
    }
}

/// A sellable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Fee, material or package with its subtype
    pub kind: ProductKind,
    /// Tax applied to the product's bill items
    pub tax_id: Option<TaxId>,
    /// Billing schedule for recurring products
    pub billing_schedule_id: Option<BillingScheduleId>,
    /// Charge the full first period even on a mid-period start
    pub disable_pro_rating: bool,
    /// Only one active student product allowed at a time
    pub is_unique: bool,
    /// Archived products cannot be ordered
    pub is_archived: bool,
}

impl Product {
    /// Creates a product with no tax or schedule
    pub fn new(id: ProductId, name: impl Into<String>, kind: ProductKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            tax_id: None,
            billing_schedule_id: None,
            disable_pro_rating: false,
            is_unique: false,
            is_archived: false,
        }
    }

    pub fn with_tax(mut self, tax_id: TaxId) -> Self {
        self.tax_id = Some(tax_id);
        self
    }

    pub fn with_billing_schedule(mut self, schedule_id: BillingScheduleId) -> Self {
        self.billing_schedule_id = Some(schedule_id);
        self
    }

    pub fn with_pro_rating_disabled(mut self) -> Self {
        self.disable_pro_rating = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.kind.is_recurring()
    }

    /// Checks that the schedule reference agrees with the cadence
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidProduct` when a recurring product has no
    /// billing schedule or a one-time product carries one.
    pub fn validate(&self) -> Result<(), CatalogError> {
        match (self.is_recurring(), self.billing_schedule_id) {
            (true, None) => Err(CatalogError::invalid_product(
                self.id,
                "recurring product requires a billing schedule",
            )),
            (false, Some(_)) => Err(CatalogError::invalid_product(
                self.id,
                "one-time product must not reference a billing schedule",
            )),
            _ => Ok(()),
        }
    }
}

/// A course offered inside a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCourse {
    pub course_id: CourseId,
    /// Must appear on every order and billing item of the package
    pub mandatory: bool,
    /// Upper bound on the slot value of an order for this course
    pub max_slots_per_course: u32,
    /// Weight used by schedule-based pricing
    pub course_weight: u32,
}

impl PackageCourse {
    pub fn new(course_id: CourseId, max_slots_per_course: u32, course_weight: u32) -> Self {
        Self {
            course_id,
            mandatory: false,
            max_slots_per_course,
            course_weight,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }
}

/// Package details attached to a package product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub product_id: ProductId,
    /// First date the package can be attended
    pub start_date: Option<NaiveDate>,
    /// Last date the package can be attended
    pub end_date: Option<NaiveDate>,
    /// Maximum number of courses per order
    pub max_slot: u32,
    pub courses: Vec<PackageCourse>,
}

impl Package {
    pub fn new(product_id: ProductId, max_slot: u32) -> Self {
        Self {
            product_id,
            start_date: None,
            end_date: None,
            max_slot,
            courses: Vec::new(),
        }
    }

    pub fn with_dates(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self.end_date = Some(end_date);
        self
    }

    pub fn with_course(mut self, course: PackageCourse) -> Self {
        self.courses.push(course);
        self
    }

    pub fn course(&self, course_id: &CourseId) -> Option<&PackageCourse> {
        self.courses.iter().find(|c| &c.course_id == course_id)
    }

    pub fn mandatory_courses(&self) -> impl Iterator<Item = &PackageCourse> {
        self.courses.iter().filter(|c| c.mandatory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_type_mapping() {
        assert_eq!(PackageType::OneTime.quantity_type(), QuantityType::CourseWeight);
        assert_eq!(PackageType::ScheduleBased.quantity_type(), QuantityType::CourseWeight);
        assert_eq!(PackageType::SlotBased.quantity_type(), QuantityType::Slot);
        assert_eq!(PackageType::FrequencyBased.quantity_type(), QuantityType::SlotPerWeek);
    }

    #[test]
    fn test_recurring_kinds() {
        assert!(ProductKind::Fee(Cadence::Recurring).is_recurring());
        assert!(!ProductKind::Material(Cadence::OneTime).is_recurring());
        assert!(ProductKind::Package(PackageType::FrequencyBased).is_recurring());
        assert!(!ProductKind::Package(PackageType::SlotBased).is_recurring());
    }

    #[test]
    fn test_kind_storage_round_trip() {
        let kind = ProductKind::Package(PackageType::ScheduleBased);
        let parsed = ProductKind::from_parts(kind.product_type_str(), kind.subtype_str()).unwrap();
        assert_eq!(kind, parsed);

        assert!(ProductKind::from_parts("PRODUCT_TYPE_FEE", "PACKAGE_TYPE_SCHEDULED").is_err());
    }

    #[test]
    fn test_validate_recurring_requires_schedule() {
        let product = Product::new(ProductId::new(), "Tuition", ProductKind::Fee(Cadence::Recurring));
        assert!(product.validate().is_err());

        let product = product.with_billing_schedule(BillingScheduleId::new());
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_validate_one_time_rejects_schedule() {
        let product = Product::new(ProductId::new(), "Book", ProductKind::Material(Cadence::OneTime))
            .with_billing_schedule(BillingScheduleId::new());
        assert!(matches!(product.validate(), Err(CatalogError::InvalidProduct { .. })));
    }

    #[test]
    fn test_kind_serde_tagged() {
        let json = serde_json::to_value(ProductKind::Fee(Cadence::OneTime)).unwrap();
        assert_eq!(json["product_type"], "FEE");
        assert_eq!(json["subtype"], "ONE_TIME");
    }

    #[test]
    fn test_package_mandatory_courses() {
        let math = CourseId::new();
        let art = CourseId::new();
        let package = Package::new(ProductId::new(), 2)
            .with_course(PackageCourse::new(math, 3, 1).mandatory())
            .with_course(PackageCourse::new(art, 2, 2));

        let mandatory: Vec<_> = package.mandatory_courses().map(|c| c.course_id).collect();
        assert_eq!(mandatory, vec![math]);
        assert_eq!(package.course(&art).map(|c| c.course_weight), Some(2));
    }
}
