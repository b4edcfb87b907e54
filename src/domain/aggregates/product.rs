//! Catalog snapshot
//!
//! Product-detail payloads arrive from the storefront API as loosely typed
//! records. They are validated and folded into [`CatalogItem`] before they
//! reach the cart, so the cart never branches on a missing base price.

use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::value_objects::{IdError, Money, ProductId};

/// Raw product-detail payload.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CatalogRecord {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub base_price: Option<Money>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
    #[serde(default)]
    #[validate]
    pub weight_options: Vec<WeightOptionRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct WeightOptionRecord {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(range(min = 1))]
    pub weight_grams: u32,
    pub price: Money,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
}

/// A product as the cart sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogItem {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub slug: Option<String>,
    pub pricing: Pricing,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pricing {
    Simple { base_price: Money, stock: u32 },
    Varianted { options: Vec<WeightOption> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeightOption { pub id: String, pub weight_grams: u32, pub price: Money, pub stock: u32 }

/// The priced, stock-bounded choice a shopper made on a product page.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub variant_id: Option<String>,
    pub display_name: String,
    pub unit_price: Money,
    pub stock: u32,
}

impl CatalogItem {
    pub fn simple(id: ProductId, name: impl Into<String>, base_price: Money, stock: u32) -> Self {
        Self { id, name: name.into(), image: None, slug: None, pricing: Pricing::Simple { base_price, stock } }
    }

    pub fn varianted(id: ProductId, name: impl Into<String>, options: Vec<WeightOption>) -> Self {
        Self { id, name: name.into(), image: None, slug: None, pricing: Pricing::Varianted { options } }
    }

    pub fn is_varianted(&self) -> bool { matches!(self.pricing, Pricing::Varianted { .. }) }

    /// Picks the price and stock ceiling for `variant_id`.
    pub fn resolve(&self, variant_id: Option<&str>) -> Result<Selection, CatalogError> {
        match (&self.pricing, variant_id) {
            (Pricing::Simple { base_price, stock }, None) => Ok(Selection {
                variant_id: None, display_name: self.name.clone(), unit_price: *base_price, stock: *stock,
            }),
            (Pricing::Simple { .. }, Some(v)) => Err(CatalogError::UnknownVariant(v.to_string())),
            (Pricing::Varianted { .. }, None) => Err(CatalogError::VariantRequired),
            (Pricing::Varianted { options }, Some(v)) => {
                let option = options.iter().find(|o| o.id == v).ok_or_else(|| CatalogError::UnknownVariant(v.to_string()))?;
                Ok(Selection {
                    variant_id: Some(option.id.clone()),
                    display_name: format!("{} ({})", self.name, format_weight(option.weight_grams)),
                    unit_price: option.price,
                    stock: option.stock,
                })
            }
        }
    }
}

fn format_weight(grams: u32) -> String {
    if grams >= 1000 && grams % 1000 == 0 { format!("{}kg", grams / 1000) } else { format!("{grams}g") }
}

fn stock_from(raw: i32) -> u32 { u32::try_from(raw).unwrap_or(0) }

impl TryFrom<CatalogRecord> for CatalogItem {
    type Error = CatalogError;

    fn try_from(record: CatalogRecord) -> Result<Self, Self::Error> {
        record.validate().map_err(|e| CatalogError::Invalid(e.to_string()))?;
        let id = ProductId::new(record.id).map_err(CatalogError::Id)?;
        let pricing = if !record.weight_options.is_empty() {
            Pricing::Varianted {
                options: record.weight_options.into_iter().map(|o| WeightOption {
                    id: o.id, weight_grams: o.weight_grams, price: o.price, stock: stock_from(o.stock_quantity),
                }).collect(),
            }
        } else {
            let base_price = record.base_price.ok_or(CatalogError::MissingPrice)?;
            Pricing::Simple { base_price, stock: stock_from(record.stock_quantity) }
        };
        let in_range = match &pricing {
            Pricing::Simple { base_price, stock } => base_price.checked_multiply(*stock).is_some(),
            Pricing::Varianted { options } => options.iter().all(|o| o.price.checked_multiply(o.stock).is_some()),
        };
        if !in_range { return Err(CatalogError::PriceTooLarge); }
        Ok(Self { id, name: record.name, image: record.image, slug: record.slug, pricing })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError { Invalid(String), Id(IdError), MissingPrice, PriceTooLarge, VariantRequired, UnknownVariant(String) }
impl std::error::Error for CatalogError {}
impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "Invalid catalog record: {e}"),
            Self::Id(e) => write!(f, "{e}"),
            Self::MissingPrice => write!(f, "Product has neither a base price nor weight options"),
            Self::PriceTooLarge => write!(f, "Price too large for the stock on hand"),
            Self::VariantRequired => write!(f, "Choose a weight option"),
            Self::UnknownVariant(v) => write!(f, "Unknown weight option: {v}"),
        }
    }
}
