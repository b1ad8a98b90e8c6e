pub mod aggregate;
pub mod autofill;
pub mod config;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod wizard;

pub use aggregate::{MonthlyBucket, RequestMetrics, TimelineReport, TimelineSummary};
pub use autofill::{GeneratedDraft, GeneratedLineItem};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::catalog::{Catalog, CatalogProduct, CostCenter, ProductId};
pub use domain::request::{AttachmentRef, LineItem, Priority, Request, RequestFields, RequestId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use notify::{Notification, NotificationChannel, NotifyOptions, Severity};
pub use wizard::{
    validate_through, Draft, DraftAttachment, DraftPatch, StepStatus, ValidationFailure, Wizard,
    WizardStep,
};
