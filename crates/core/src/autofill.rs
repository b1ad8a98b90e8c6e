//! Parsing of machine-generated drafts used to prefill the wizard.
//!
//! The generator is not trusted: the body must be a JSON object, every field
//! is optional, line items are re-priced from the catalog, and items whose
//! label is not in the catalog are dropped. Generated attachments are ignored
//! because they do not refer to uploaded files.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::domain::catalog::Catalog;
use crate::domain::request::LineItem;
use crate::errors::ApplicationError;
use crate::wizard::DraftPatch;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedDraft {
    pub requestor_name: Option<String>,
    pub requestor_email: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "employeeID")]
    pub employee_id: Option<String>,
    pub on_behalf_of: Option<String>,
    pub request_title: Option<String>,
    pub description: Option<String>,
    pub requested_date: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub products: Vec<GeneratedLineItem>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub budget: Option<Decimal>,
    pub cost_center: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratedLineItem {
    pub label: Option<String>,
    pub quantity: Option<u32>,
}

impl GeneratedDraft {
    pub fn parse(body: &str) -> Result<Self, ApplicationError> {
        let value: serde_json::Value = serde_json::from_str(body.trim())
            .map_err(|error| ApplicationError::MalformedUpstream(error.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ApplicationError> {
        if !value.is_object() {
            return Err(ApplicationError::MalformedUpstream(
                "generated draft must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|error| ApplicationError::MalformedUpstream(error.to_string()))
    }

    pub fn into_patch(self, catalog: &Catalog) -> DraftPatch {
        let mut products: Vec<LineItem> = Vec::new();
        for generated in self.products {
            let Some(label) = generated.label else {
                continue;
            };
            let Some(product) = catalog.find(&label) else {
                warn!(
                    event_name = "wizard.autofill.unknown_product",
                    label = %label,
                    "generated draft referenced a product outside the catalog"
                );
                continue;
            };
            if products.iter().any(|item| item.label() == label) {
                continue;
            }
            let mut item = LineItem::from_catalog(product);
            if let Err(error) = item.set_quantity(generated.quantity.unwrap_or(1)) {
                warn!(
                    event_name = "wizard.autofill.quantity_rejected",
                    label = %label,
                    error = %error,
                    "generated quantity kept at 1"
                );
            }
            products.push(item);
        }

        DraftPatch {
            requestor_name: self.requestor_name,
            requestor_email: self.requestor_email,
            department: self.department,
            employee_id: self.employee_id,
            on_behalf_of: self.on_behalf_of,
            request_title: self.request_title,
            description: self.description,
            requested_date: self.requested_date,
            due_date: self.due_date,
            priority: self.priority,
            products: Some(products),
            budget: self.budget.map(|budget| budget.max(Decimal::ZERO)),
            cost_center: self.cost_center,
            attachments: None,
        }
    }
}
