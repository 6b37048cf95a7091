//! Pipeline document model and the logic that generates, validates, and
//! updates the persisted `.drone.yml`.
//!
//! Data flows strictly top-down: `step` builds individual step records,
//! `commands` assembles the execute step's shell command list, and
//! `manager` orchestrates generation, validation, and persistence of the
//! whole document.

pub mod commands;
pub mod document;
pub mod manager;
pub mod notifications;
pub mod request;
pub mod step;

pub use commands::Workflow;
pub use document::DronePipeline;
pub use manager::{create_pipeline, ensure_pipeline, generate_pipeline, EnsureOutcome};
pub use notifications::NotificationRequest;
pub use request::PipelineRequest;
pub use step::{PipelineStep, VolumeMount};
