//! The multi-step request wizard: an ordered set of steps, a draft that each
//! step fills in, and validation that gates forward navigation.

pub mod draft;
pub mod machine;
pub mod steps;

pub use draft::{Draft, DraftAttachment, DraftPatch};
pub use machine::{StepStatus, Wizard};
pub use steps::{validate_through, ValidationFailure, WizardStep};
