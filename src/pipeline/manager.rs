//! Orchestration around the persisted `.drone.yml`: generate a fresh
//! document, or validate an existing one and update it in place.
//!
//! Validation failures are always resolved by regeneration, which discards
//! any manual edits. There is no partial-merge recovery; writes replace
//! the whole document atomically.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_yaml::Mapping;
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::error::ConfigError;

use super::commands::{append_request_commands, assemble_execute_commands};
use super::document::{CloneSettings, DronePipeline, HostVolume, Trigger, EXECUTE_STEP};
use super::notifications::replace_notifications;
use super::request::PipelineRequest;
use super::step::{EnvValue, PipelineStep, VolumeMount};

/// File name of the persisted configuration inside a repository.
pub const DRONE_FILE: &str = ".drone.yml";

const CACHE_MOUNT: &str = "/drone/src";
const CACHE_VOLUME: &str = "cache";
const CACHE_PATH: &str = "/cache";
const REPO_VOLUME: &str = "repo";
const REPO_PATH: &str = "/repo";
const SSH_KEY_ENV: &str = "SSH_KEY";

/// Which path `ensure_pipeline` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The existing document was valid and updated in place.
    Updated,
    /// The document was missing or rejected and written fresh.
    Regenerated,
}

/// Build a complete fresh pipeline document.
///
/// Three fixed steps: restore-cache ahead of the execute step to speed up
/// (or avoid) the clone inside the preparation commands, and rebuild-cache
/// after execution so the next build starts from the latest state.
/// Notification steps, the cache volume, and the trigger come last.
pub fn generate_pipeline(
    settings: &Settings,
    request: &PipelineRequest,
) -> Result<DronePipeline, ConfigError> {
    debug!("writing fresh configuration");

    let steps = vec![
        PipelineStep::builder("restore-cache", settings.cache_image.as_str())
            .volume(VolumeMount::new(CACHE_VOLUME, CACHE_PATH))
            .setting("restore", true)
            .setting("mount", CACHE_MOUNT)
            .build(),
        PipelineStep::builder(EXECUTE_STEP, settings.execute_image.as_str())
            .volume(VolumeMount::new(REPO_VOLUME, REPO_PATH))
            .env(SSH_KEY_ENV, EnvValue::secret(settings.ssh_secret.as_str()))
            .commands(assemble_execute_commands(settings, request))
            .build(),
        PipelineStep::builder("rebuild-cache", settings.cache_image.as_str())
            .volume(VolumeMount::new(CACHE_VOLUME, CACHE_PATH))
            .setting("rebuild", true)
            .setting("mount", CACHE_MOUNT)
            .build(),
    ];

    let pipeline = DronePipeline {
        kind: "pipeline".to_string(),
        name: settings.pipeline_name.clone(),
        clone: CloneSettings { disable: true },
        steps: replace_notifications(steps, &request.notifications, settings),
        volumes: vec![HostVolume::new(
            CACHE_VOLUME,
            settings.cache_host_path.as_str(),
        )],
        trigger: Trigger {
            branch: settings.trigger_branches.clone(),
            event: settings.trigger_events.clone(),
            status: settings.trigger_status.clone(),
        },
        extra: Mapping::new(),
    };

    pipeline
        .validate()
        .map_err(|e| ConfigError::generation(e.to_string()))?;

    debug!("configuration complete");
    Ok(pipeline)
}

/// Validate the persisted configuration and either update it in place or
/// discard it and regenerate.
///
/// Checks, in order: the file exists and is non-empty, it parses, its
/// structure holds the document invariants, and the execute step's command
/// prefix equals the preparation baseline exactly. Any rejection discards
/// the document, manual edits included, and writes a fresh one.
pub fn ensure_pipeline(
    dir: &Path,
    settings: &Settings,
    request: &PipelineRequest,
) -> Result<EnsureOutcome, ConfigError> {
    let path = dir.join(DRONE_FILE);

    match load_existing(&path, settings) {
        Ok(mut pipeline) => {
            debug!("updating already existing CI configuration");
            update_pipeline(&mut pipeline, settings, request)?;
            write_pipeline(&path, &pipeline)?;
            Ok(EnsureOutcome::Updated)
        }
        Err(err) if err.is_recoverable() => {
            error!("{err}");
            info!("generating fresh configuration");
            let pipeline = generate_pipeline(settings, request)?;
            write_pipeline(&path, &pipeline)?;
            Ok(EnsureOutcome::Regenerated)
        }
        Err(err) => Err(err),
    }
}

/// Unconditionally regenerate and write the configuration.
pub fn create_pipeline(
    dir: &Path,
    settings: &Settings,
    request: &PipelineRequest,
) -> Result<(), ConfigError> {
    let pipeline = generate_pipeline(settings, request)?;
    write_pipeline(&dir.join(DRONE_FILE), &pipeline)
}

/// Load and fully validate the persisted document. Every rejection is a
/// recoverable `Invalid`; I/O failures other than absence propagate as-is.
fn load_existing(path: &Path, settings: &Settings) -> Result<DronePipeline, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::invalid("CI config not found in repository"));
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(ConfigError::invalid("CI config is empty"));
    }

    let pipeline: DronePipeline = serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::invalid(format!("CI config is not processable: {e}")))?;
    pipeline.validate()?;

    let prep = settings.prep_commands();
    let commands = pipeline
        .execute_step()
        .and_then(|step| step.commands.as_deref())
        .unwrap_or(&[]);
    if commands.len() < prep.len() || commands[..prep.len()] != prep[..] {
        return Err(ConfigError::invalid(
            "existing CI config does not match the preparation baseline",
        ));
    }

    Ok(pipeline)
}

/// Recompute the execute step's commands as baseline + request suffix and
/// replace the notification steps. Everything else is left untouched.
fn update_pipeline(
    pipeline: &mut DronePipeline,
    settings: &Settings,
    request: &PipelineRequest,
) -> Result<(), ConfigError> {
    let step = pipeline
        .execute_step_mut()
        .ok_or_else(|| ConfigError::generation("execute step disappeared during update"))?;

    let mut commands = settings.prep_commands();
    append_request_commands(settings, request, &mut commands);
    step.commands = Some(commands);

    let steps = std::mem::take(&mut pipeline.steps);
    pipeline.steps = replace_notifications(steps, &request.notifications, settings);
    Ok(())
}

/// Serialize the full document, then replace the destination atomically
/// via a same-directory temp file so a crash never leaves a truncated
/// configuration behind.
fn write_pipeline(path: &Path, pipeline: &DronePipeline) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(pipeline)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(yaml.as_bytes())?;
    file.persist(path).map_err(|e| ConfigError::Io(e.error))?;

    debug!("configuration written to {}", path.display());
    Ok(())
}
