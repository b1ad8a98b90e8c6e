use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::request::{AttachmentRef, LineItem, Priority, RequestFields};

/// A file picked in the attachments step. `url` stays empty until an upload
/// collaborator has stored the file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAttachment {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&DraftAttachment> for AttachmentRef {
    fn from(attachment: &DraftAttachment) -> Self {
        Self {
            name: attachment.name.clone(),
            url: attachment.url.clone().unwrap_or_default(),
            size: attachment.size,
        }
    }
}

/// The in-progress request held by the wizard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Draft {
    pub requestor_name: String,
    pub requestor_email: String,
    pub department: String,
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub on_behalf_of: Option<String>,
    pub request_title: String,
    pub description: String,
    pub requested_date: String,
    pub due_date: Option<String>,
    pub priority: String,
    pub products: Vec<LineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    pub cost_center: String,
    pub attachments: Vec<DraftAttachment>,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            requestor_name: String::new(),
            requestor_email: String::new(),
            department: String::new(),
            employee_id: String::new(),
            on_behalf_of: None,
            request_title: String::new(),
            description: String::new(),
            requested_date: String::new(),
            due_date: None,
            priority: Priority::Medium.as_str().to_string(),
            products: Vec::new(),
            budget: Decimal::ZERO,
            cost_center: String::new(),
            attachments: Vec::new(),
        }
    }
}

/// A shallow partial update. `Some` replaces the field wholesale, including
/// `products` and `attachments`; `None` leaves it untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftPatch {
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
    pub products: Option<Vec<LineItem>>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub budget: Option<Decimal>,
    pub cost_center: Option<String>,
    pub attachments: Option<Vec<DraftAttachment>>,
}

impl Draft {
    pub fn merge(&mut self, patch: DraftPatch) {
        fn replace<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        replace(&mut self.requestor_name, patch.requestor_name);
        replace(&mut self.requestor_email, patch.requestor_email);
        replace(&mut self.department, patch.department);
        replace(&mut self.employee_id, patch.employee_id);
        if let Some(on_behalf_of) = patch.on_behalf_of {
            self.on_behalf_of = non_empty(on_behalf_of);
        }
        replace(&mut self.request_title, patch.request_title);
        replace(&mut self.description, patch.description);
        replace(&mut self.requested_date, patch.requested_date);
        if let Some(due_date) = patch.due_date {
            self.due_date = non_empty(due_date);
        }
        replace(&mut self.priority, patch.priority);
        replace(&mut self.products, patch.products);
        replace(&mut self.budget, patch.budget);
        replace(&mut self.cost_center, patch.cost_center);
        replace(&mut self.attachments, patch.attachments);
    }

    /// `None` when the sum does not fit in a decimal.
    pub fn products_total(&self) -> Option<Decimal> {
        self.products.iter().try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total()))
    }

    /// The create payload for this draft. Does not validate.
    pub fn to_fields(&self) -> RequestFields {
        RequestFields {
            requestor_name: self.requestor_name.trim().to_string(),
            requestor_email: self.requestor_email.trim().to_string(),
            department: self.department.clone(),
            employee_id: self.employee_id.clone(),
            on_behalf_of: self.on_behalf_of.clone(),
            request_title: self.request_title.trim().to_string(),
            description: self.description.clone(),
            requested_date: self.requested_date.clone(),
            due_date: self.due_date.clone(),
            priority: self.priority.clone(),
            products: self.products.clone(),
            budget: self.budget,
            cost_center: self.cost_center.clone(),
            attachments: self.attachments.iter().map(AttachmentRef::from).collect(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}
