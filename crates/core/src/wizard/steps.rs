use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wizard::draft::Draft;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WizardStep {
    ClientInfo,
    ProductSelection,
    Attachments,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] =
        [Self::ClientInfo, Self::ProductSelection, Self::Attachments, Self::Review];

    pub fn index(self) -> usize {
        match self {
            Self::ClientInfo => 0,
            Self::ProductSelection => 1,
            Self::Attachments => 2,
            Self::Review => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ClientInfo => "Client Info",
            Self::ProductSelection => "Product Selection",
            Self::Attachments => "Attachments",
            Self::Review => "Review",
        }
    }

    pub fn first() -> Self {
        Self::ClientInfo
    }

    pub fn last() -> Self {
        Self::Review
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationFailure {
    pub step: WizardStep,
    pub missing_fields: Vec<String>,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(step: WizardStep, missing_fields: Vec<&str>) -> Self {
        let labels: Vec<&str> = missing_fields
            .iter()
            .map(|field| {
                REQUIREMENTS
                    .iter()
                    .find(|requirement| requirement.field == *field)
                    .map_or(*field, |requirement| requirement.label)
            })
            .collect();
        let message =
            format!("{}: please complete {}.", step.label(), labels.join(", "));
        Self {
            step,
            missing_fields: missing_fields.into_iter().map(str::to_string).collect(),
            message,
        }
    }
}

struct Requirement {
    step: WizardStep,
    field: &'static str,
    label: &'static str,
    satisfied: fn(&Draft) -> bool,
}

/// Every gating rule, ordered by step. Attachments carry no requirement of
/// their own; moving past them still re-checks everything before them.
const REQUIREMENTS: &[Requirement] = &[
    Requirement {
        step: WizardStep::ClientInfo,
        field: "requestorName",
        label: "Requestor Name",
        satisfied: has_requestor_name,
    },
    Requirement {
        step: WizardStep::ClientInfo,
        field: "requestorEmail",
        label: "Requestor Email",
        satisfied: has_requestor_email,
    },
    Requirement {
        step: WizardStep::ClientInfo,
        field: "requestedDate",
        label: "Requested Date",
        satisfied: has_requested_date,
    },
    Requirement {
        step: WizardStep::ProductSelection,
        field: "products",
        label: "at least one product",
        satisfied: has_products,
    },
    Requirement {
        step: WizardStep::Review,
        field: "requestTitle",
        label: "Request Title",
        satisfied: has_request_title,
    },
    Requirement {
        step: WizardStep::Review,
        field: "description",
        label: "Description",
        satisfied: has_description,
    },
];

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

fn has_requestor_name(draft: &Draft) -> bool {
    filled(&draft.requestor_name)
}

fn has_requestor_email(draft: &Draft) -> bool {
    filled(&draft.requestor_email)
}

fn has_requested_date(draft: &Draft) -> bool {
    filled(&draft.requested_date)
}

fn has_products(draft: &Draft) -> bool {
    !draft.products.is_empty()
}

fn has_request_title(draft: &Draft) -> bool {
    filled(&draft.request_title)
}

fn has_description(draft: &Draft) -> bool {
    filled(&draft.description)
}

/// Checks every requirement of `step` and of all steps before it. The failure
/// names the earliest step with missing fields.
pub fn validate_through(draft: &Draft, step: WizardStep) -> Result<(), ValidationFailure> {
    for current in WizardStep::ALL.into_iter().filter(|candidate| *candidate <= step) {
        let missing: Vec<&str> = REQUIREMENTS
            .iter()
            .filter(|requirement| requirement.step == current && !(requirement.satisfied)(draft))
            .map(|requirement| requirement.field)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationFailure::new(current, missing));
        }
    }
    Ok(())
}
