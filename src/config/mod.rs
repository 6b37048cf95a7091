//! Runtime settings for pipeline generation.
//!
//! Settings are loaded with layered precedence:
//!
//! 1. Hardcoded defaults (lowest priority)
//! 2. Optional settings file passed on the command line (`--config`)
//! 3. Environment variables (`PIPEWRIGHT_*` prefix, highest priority)
//!
//! The preparation command baseline, container images, publish branch, and
//! the notification webhook all live here so deployments can override them
//! without touching the generation logic.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Deployment-level settings injected into every pipeline operation.
///
/// The defaults describe the stock deployment: a runner image with git,
/// git-annex, and snakemake on the PATH, a host-mounted cache volume, and
/// the `pipewright` branch as the publish target for output files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Name of the generated pipeline document.
    pub pipeline_name: String,
    /// Container image for the execute step.
    pub execute_image: String,
    /// Container image for the restore-cache/rebuild-cache steps.
    pub cache_image: String,
    /// Host path backing the cache volume.
    pub cache_host_path: String,
    /// Branch that receives pushed output files.
    pub publish_branch: String,
    /// `annex.largefiles` expression for registering output files.
    pub annex_largefiles: String,
    /// Name of the CI secret holding the SSH private key.
    pub ssh_secret: String,
    /// Environment variable on the runner that names the data server.
    pub server_env: String,
    /// Committer identity used for back-pushes.
    pub committer_name: String,
    pub committer_email: String,
    /// Slack webhook for notification steps. Unset means notification
    /// requests for Slack are skipped with a warning.
    pub slack_webhook: Option<String>,
    /// Trigger defaults for generated pipelines.
    pub trigger_branches: Vec<String>,
    pub trigger_events: Vec<String>,
    pub trigger_status: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pipeline_name: "pipewright".to_string(),
            execute_image: "pipewright/runner:latest".to_string(),
            cache_image: "drillster/drone-volume-cache".to_string(),
            cache_host_path: "/pipewright/cache".to_string(),
            publish_branch: "pipewright".to_string(),
            annex_largefiles: "largerthan=10M".to_string(),
            ssh_secret: "DRONE_PRIVATE_SSH_KEY".to_string(),
            server_env: "DRONE_GOGS_SERVER".to_string(),
            committer_name: "pipewright".to_string(),
            committer_email: "pipewright@local".to_string(),
            slack_webhook: None,
            trigger_branches: vec!["master".to_string()],
            trigger_events: vec!["push".to_string()],
            trigger_status: vec!["success".to_string()],
        }
    }
}

impl Settings {
    /// Load settings from an optional YAML file, then apply environment
    /// overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    ConfigError::invalid(format!(
                        "settings file {} unreadable: {e}",
                        path.display()
                    ))
                })?;
                serde_yaml::from_str(&content).map_err(|e| {
                    ConfigError::invalid(format!(
                        "settings file {} malformed: {e}",
                        path.display()
                    ))
                })?
            }
            None => Settings::default(),
        };
        settings.merge_env_vars();
        Ok(settings)
    }

    /// Apply `PIPEWRIGHT_*` environment variables over the current values.
    pub fn merge_env_vars(&mut self) {
        if let Ok(value) = env::var("PIPEWRIGHT_PIPELINE_NAME") {
            self.pipeline_name = value;
        }
        if let Ok(value) = env::var("PIPEWRIGHT_EXECUTE_IMAGE") {
            self.execute_image = value;
        }
        if let Ok(value) = env::var("PIPEWRIGHT_CACHE_IMAGE") {
            self.cache_image = value;
        }
        if let Ok(value) = env::var("PIPEWRIGHT_PUBLISH_BRANCH") {
            self.publish_branch = value;
        }
        if let Ok(value) = env::var("PIPEWRIGHT_SLACK_WEBHOOK") {
            self.slack_webhook = Some(value);
        }
    }

    /// The preparation command baseline: the fixed prefix every valid
    /// execute step must start with.
    ///
    /// The sequence prepares the workspace inside the runner container:
    /// SSH agent and key from the CI secret, relaxed host key checking,
    /// committer identity, known hosts for the data server, then an
    /// update-or-clone that leaves the shell inside the repository.
    pub fn prep_commands(&self) -> Vec<String> {
        vec![
            "eval $(ssh-agent -s)".to_string(),
            "mkdir -p /root/.ssh".to_string(),
            "echo \"$SSH_KEY\" > /root/.ssh/id_rsa".to_string(),
            "chmod 0600 /root/.ssh/id_rsa".to_string(),
            "mkdir -p /etc/ssh".to_string(),
            "echo \"StrictHostKeyChecking no\" >> /etc/ssh/ssh_config".to_string(),
            "ssh-add /root/.ssh/id_rsa".to_string(),
            format!("git config --global user.name \"{}\"", self.committer_name),
            format!(
                "git config --global user.email \"{}\"",
                self.committer_email
            ),
            format!(
                "ssh-keyscan -t rsa \"${}\" > /root/.ssh/authorized_keys",
                self.server_env
            ),
            "if [ -d \"$DRONE_REPO_NAME\" ]; then \
             cd \"$DRONE_REPO_NAME\"/; \
             git fetch --all; \
             git checkout -f \"$DRONE_COMMIT\"; \
             else \
             git clone \"$DRONE_GIT_SSH_URL\"; \
             cd \"$DRONE_REPO_NAME\"/; \
             fi"
            .to_string(),
        ]
    }
}
