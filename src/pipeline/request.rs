//! The per-invocation request describing what the pipeline should run.

use super::notifications::NotificationRequest;

/// Everything the user supplies for one generate/ensure invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    /// Workflow engine identifier; the recognized built-in is
    /// `"snakemake"`, anything else treats `user_commands` as literal
    /// shell commands.
    pub workflow: String,
    pub user_commands: Vec<String>,
    pub input_files: Vec<String>,
    pub output_files: Vec<String>,
    pub notifications: Vec<NotificationRequest>,
}

impl Default for PipelineRequest {
    fn default() -> Self {
        Self {
            workflow: super::commands::SNAKEMAKE.to_string(),
            user_commands: Vec::new(),
            input_files: Vec::new(),
            output_files: Vec::new(),
            notifications: Vec::new(),
        }
    }
}
