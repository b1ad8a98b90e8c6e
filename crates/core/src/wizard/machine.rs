use tracing::{debug, warn};

use crate::domain::catalog::{Catalog, CostCenter};
use crate::domain::request::{LineItem, RequestFields};
use crate::errors::DomainError;
use crate::notify::{NotificationChannel, NotifyOptions, Severity};
use crate::wizard::draft::{Draft, DraftAttachment, DraftPatch};
use crate::wizard::steps::{validate_through, ValidationFailure, WizardStep};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Complete,
    Current,
    Upcoming,
}

/// Holds the draft across steps and decides whether navigation may proceed.
///
/// Backward and same-step navigation is always allowed. Moving forward to step
/// `t` requires every requirement of the steps before `t` to hold; a failure
/// posts a notification and leaves the current step unchanged.
#[derive(Clone, Debug)]
pub struct Wizard {
    current: WizardStep,
    draft: Draft,
    catalog: Catalog,
    cost_centers: Vec<CostCenter>,
    notifications: NotificationChannel,
}

impl Wizard {
    pub fn new(notifications: NotificationChannel) -> Self {
        Self {
            current: WizardStep::first(),
            draft: Draft::default(),
            catalog: Catalog::default(),
            cost_centers: Vec::new(),
            notifications,
        }
    }

    pub fn current_step(&self) -> WizardStep {
        self.current
    }

    pub fn current_index(&self) -> usize {
        self.current.index()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cost_centers(&self) -> &[CostCenter] {
        &self.cost_centers
    }

    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    pub fn set_reference_data(&mut self, catalog: Catalog, cost_centers: Vec<CostCenter>) {
        self.catalog = catalog;
        self.cost_centers = cost_centers;
    }

    pub fn step_status(&self, step: WizardStep) -> StepStatus {
        match step.cmp(&self.current) {
            std::cmp::Ordering::Less => StepStatus::Complete,
            std::cmp::Ordering::Equal => StepStatus::Current,
            std::cmp::Ordering::Greater => StepStatus::Upcoming,
        }
    }

    /// Requirements of `step` and every step before it.
    pub fn validate(&self, step: WizardStep) -> Result<(), ValidationFailure> {
        validate_through(&self.draft, step)
    }

    pub fn go_to(&mut self, target_index: usize) -> Result<WizardStep, DomainError> {
        let target =
            WizardStep::from_index(target_index).ok_or(DomainError::UnknownStep(target_index))?;

        if target > self.current {
            // `target` is at least one past `current`, so the step before it exists.
            let gate = WizardStep::from_index(target_index - 1).unwrap_or(self.current);
            if let Err(failure) = self.validate(gate) {
                self.reject(&failure);
                return Err(failure.into());
            }
        }

        debug!(
            event_name = "wizard.step.entered",
            from = self.current.label(),
            to = target.label(),
            "wizard step changed"
        );
        self.current = target;
        Ok(target)
    }

    pub fn next(&mut self) -> Result<WizardStep, DomainError> {
        self.go_to(self.current.index() + 1)
    }

    pub fn back(&mut self) -> WizardStep {
        let previous = self.current.index().saturating_sub(1);
        self.current = WizardStep::from_index(previous).unwrap_or(WizardStep::first());
        self.current
    }

    pub fn set_draft(&mut self, patch: DraftPatch) {
        self.draft.merge(patch);
    }

    /// Reconciles the line items with a new product selection. Items no longer
    /// selected are dropped, kept items retain their quantity and copied price,
    /// newly selected items are appended at quantity 1 with the current catalog
    /// price.
    pub fn select_products(&mut self, labels: &[&str]) -> Result<(), DomainError> {
        if let Some(unknown) = labels.iter().find(|label| self.catalog.find(label).is_none()) {
            return Err(DomainError::UnknownProduct((*unknown).to_string()));
        }

        let mut products: Vec<LineItem> = self
            .draft
            .products
            .iter()
            .filter(|item| labels.contains(&item.label()))
            .cloned()
            .collect();

        for label in labels {
            if products.iter().any(|item| item.label() == *label) {
                continue;
            }
            if let Some(product) = self.catalog.find(label) {
                products.push(LineItem::from_catalog(product));
            }
        }

        self.draft.products = products;
        Ok(())
    }

    pub fn set_quantity(&mut self, label: &str, quantity: u32) -> Result<(), DomainError> {
        let item = self
            .draft
            .products
            .iter_mut()
            .find(|item| item.label() == label)
            .ok_or_else(|| DomainError::UnknownProduct(label.to_string()))?;
        item.set_quantity(quantity)
    }

    pub fn add_attachment(&mut self, attachment: DraftAttachment) {
        self.draft.attachments.push(attachment);
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<DraftAttachment> {
        (index < self.draft.attachments.len()).then(|| self.draft.attachments.remove(index))
    }

    /// Gate for submission: the whole draft must be valid.
    pub fn prepare_submission(&self) -> Result<RequestFields, DomainError> {
        if let Err(failure) = self.validate(WizardStep::last()) {
            self.reject(&failure);
            return Err(failure.into());
        }
        Ok(self.draft.to_fields())
    }

    /// Fresh draft at the first step. Reference data is kept.
    pub fn reset(&mut self) {
        self.current = WizardStep::first();
        self.draft = Draft::default();
    }

    fn reject(&self, failure: &ValidationFailure) {
        warn!(
            event_name = "wizard.step.rejected",
            step = failure.step.label(),
            missing_fields = ?failure.missing_fields,
            "wizard navigation blocked by validation"
        );
        self.notifications.show(failure.message.clone(), NotifyOptions::severity(Severity::Error));
    }
}
