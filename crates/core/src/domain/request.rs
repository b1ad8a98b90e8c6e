use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::CatalogProduct;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub i64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Case-insensitive parse; anything outside low|medium|high is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One selected product on a request.
///
/// `total` is always `quantity * price`; it is recomputed on every quantity
/// change and on deserialization, so a stored total can never drift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLineItem")]
pub struct LineItem {
    label: String,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
}

#[derive(Deserialize)]
struct RawLineItem {
    label: String,
    #[serde(default = "default_quantity")]
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

fn default_quantity() -> u32 {
    1
}

impl TryFrom<RawLineItem> for LineItem {
    type Error = DomainError;

    fn try_from(raw: RawLineItem) -> Result<Self, Self::Error> {
        Self::new(raw.label, raw.quantity, raw.price)
    }
}

fn line_total(label: &str, quantity: u32, price: Decimal) -> Result<Decimal, DomainError> {
    price.checked_mul(Decimal::from(quantity)).ok_or_else(|| {
        DomainError::InvariantViolation(format!(
            "line item `{label}` total overflows ({quantity} x {price})"
        ))
    })
}

impl LineItem {
    /// Quantities below 1 are clamped to 1. Fails when `quantity * price`
    /// does not fit in a decimal.
    pub fn new(
        label: impl Into<String>,
        quantity: u32,
        price: Decimal,
    ) -> Result<Self, DomainError> {
        let label = label.into();
        let quantity = quantity.max(1);
        let total = line_total(&label, quantity, price)?;
        Ok(Self { label, quantity, price, total })
    }

    /// Point-in-time copy of a catalog entry with quantity 1.
    pub fn from_catalog(product: &CatalogProduct) -> Self {
        Self {
            label: product.label.clone(),
            quantity: 1,
            price: product.price,
            total: product.price,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Quantities below 1 are clamped to 1. On overflow the item is left
    /// unchanged.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), DomainError> {
        let quantity = quantity.max(1);
        self.total = line_total(&self.label, quantity, self.price)?;
        self.quantity = quantity;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

/// Every user-supplied field of a request. This is the create/update payload;
/// `id` and `createdAt` are owned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFields {
    pub requestor_name: String,
    pub requestor_email: String,
    pub department: String,
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_behalf_of: Option<String>,
    pub request_title: String,
    pub description: String,
    pub requested_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub priority: String,
    #[serde(default)]
    pub products: Vec<LineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    pub cost_center: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

impl RequestFields {
    /// `None` when the sum does not fit in a decimal.
    pub fn products_total(&self) -> Option<Decimal> {
        self.products.iter().try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total()))
    }

    /// Data-model rules every stored request holds: a known priority and a
    /// non-negative budget.
    pub fn validate(&self) -> Result<(), DomainError> {
        if Priority::parse(&self.priority).is_none() {
            return Err(DomainError::InvariantViolation(format!(
                "priority `{}` must be one of low, medium, high",
                self.priority
            )));
        }
        if self.budget < Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "budget {} must not be negative",
                self.budget
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: RequestId,
    #[serde(flatten)]
    pub fields: RequestFields,
    pub created_at: DateTime<Utc>,
}

impl Request {
    pub fn new(id: RequestId, fields: RequestFields, created_at: DateTime<Utc>) -> Self {
        Self { id, fields, created_at }
    }

    pub fn priority(&self) -> Option<Priority> {
        Priority::parse(&self.fields.priority)
    }

    pub fn has_priority(&self, priority: Priority) -> bool {
        self.priority() == Some(priority)
    }

    /// Full-field overwrite. `id` and `created_at` are kept from the original.
    pub fn overwrite(&mut self, fields: RequestFields) {
        self.fields = fields;
    }
}
