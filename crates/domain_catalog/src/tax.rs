//! Tax definitions

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{Percentage, TaxId};
use crate::error::CatalogError;

/// Whether the tax is embedded in the price or added on top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxCategory {
    Inclusive,
    Exclusive,
}

impl TaxCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxCategory::Inclusive => "TAX_CATEGORY_INCLUSIVE",
            TaxCategory::Exclusive => "TAX_CATEGORY_EXCLUSIVE",
        }
    }
}

impl FromStr for TaxCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TAX_CATEGORY_INCLUSIVE" => Ok(TaxCategory::Inclusive),
            "TAX_CATEGORY_EXCLUSIVE" => Ok(TaxCategory::Exclusive),
            other => Err(CatalogError::unknown("tax category", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tax {
    pub id: TaxId,
    pub name: String,
    pub percentage: Percentage,
    pub category: TaxCategory,
    pub is_archived: bool,
}

impl Tax {
    pub fn new(id: TaxId, name: impl Into<String>, percentage: Percentage, category: TaxCategory) -> Self {
        Self {
            id,
            name: name.into(),
            percentage,
            category,
            is_archived: false,
        }
    }
}
