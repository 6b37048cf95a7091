//! Individual pipeline step records.
//!
//! Steps serialize with every absent field omitted so the emitted document
//! stays minimal; the builder normalizes empty collections to `None` to
//! keep that guarantee independent of how callers assemble a step.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// A named volume mounted into a step's container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeMount {
    pub name: String,
    pub path: String,
}

impl VolumeMount {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// An environment value: either a literal string or a reference into the
/// CI system's secret store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EnvValue {
    Secret { from_secret: String },
    Plain(String),
}

impl EnvValue {
    pub fn secret(name: impl Into<String>) -> Self {
        Self::Secret {
            from_secret: name.into(),
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self::Plain(value.into())
    }
}

/// One step of a pipeline document.
///
/// `name` is the sole lookup key for replacement and removal, so no two
/// steps in a document may share one. Unknown fields from hand-edited
/// documents are carried through `extra` and survive an update untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineStep {
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<VolumeMount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<BTreeMap<String, EnvValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl PipelineStep {
    /// Start building a step from its two required fields.
    pub fn builder(name: impl Into<String>, image: impl Into<String>) -> StepBuilder {
        StepBuilder {
            name: name.into(),
            image: image.into(),
            volumes: Vec::new(),
            settings: Mapping::new(),
            environment: BTreeMap::new(),
            commands: Vec::new(),
        }
    }
}

/// Builder for [`PipelineStep`]. Pure; no error paths.
pub struct StepBuilder {
    name: String,
    image: String,
    volumes: Vec<VolumeMount>,
    settings: Mapping,
    environment: BTreeMap<String, EnvValue>,
    commands: Vec<String>,
}

impl StepBuilder {
    pub fn volume(mut self, mount: VolumeMount) -> Self {
        self.volumes.push(mount);
        self
    }

    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings
            .insert(Value::String(key.into()), value.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: EnvValue) -> Self {
        self.environment.insert(key.into(), value);
        self
    }

    pub fn commands(mut self, commands: Vec<String>) -> Self {
        self.commands = commands;
        self
    }

    /// Finish the step, dropping any collection left empty.
    pub fn build(self) -> PipelineStep {
        PipelineStep {
            name: self.name,
            image: self.image,
            volumes: (!self.volumes.is_empty()).then_some(self.volumes),
            settings: (!self.settings.is_empty()).then_some(self.settings),
            environment: (!self.environment.is_empty()).then_some(self.environment),
            commands: (!self.commands.is_empty()).then_some(self.commands),
            extra: Mapping::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_omits_empty_fields() {
        let step = PipelineStep::builder("restore-cache", "drillster/drone-volume-cache").build();
        assert!(step.volumes.is_none());
        assert!(step.settings.is_none());
        assert!(step.environment.is_none());
        assert!(step.commands.is_none());

        let yaml = serde_yaml::to_string(&step).unwrap();
        assert!(!yaml.contains("volumes"));
        assert!(!yaml.contains("settings"));
        assert!(!yaml.contains("environment"));
        assert!(!yaml.contains("commands"));
    }

    #[test]
    fn builder_keeps_populated_fields() {
        let step = PipelineStep::builder("execute", "pipewright/runner:latest")
            .volume(VolumeMount::new("repo", "/repo"))
            .env("SSH_KEY", EnvValue::secret("DRONE_PRIVATE_SSH_KEY"))
            .commands(vec!["snakemake".to_string()])
            .build();

        assert_eq!(step.volumes.as_ref().unwrap()[0].name, "repo");
        assert_eq!(
            step.environment.as_ref().unwrap()["SSH_KEY"],
            EnvValue::secret("DRONE_PRIVATE_SSH_KEY")
        );
        assert_eq!(step.commands.as_ref().unwrap(), &["snakemake"]);
    }

    #[test]
    fn secret_env_serializes_as_from_secret() {
        let step = PipelineStep::builder("execute", "img")
            .env("SSH_KEY", EnvValue::secret("DRONE_PRIVATE_SSH_KEY"))
            .build();
        let yaml = serde_yaml::to_string(&step).unwrap();
        assert!(yaml.contains("from_secret: DRONE_PRIVATE_SSH_KEY"));
    }

    #[test]
    fn env_values_roundtrip_plain_and_secret() {
        let yaml = "name: execute\nimage: img\nenvironment:\n  A: literal\n  B:\n    from_secret: TOKEN\n";
        let step: PipelineStep = serde_yaml::from_str(yaml).unwrap();
        let env = step.environment.unwrap();
        assert_eq!(env["A"], EnvValue::plain("literal"));
        assert_eq!(env["B"], EnvValue::secret("TOKEN"));
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let yaml = "name: lint\nimage: img\nwhen:\n  event: [push]\n";
        let step: PipelineStep = serde_yaml::from_str(yaml).unwrap();
        assert!(step.extra.contains_key("when"));

        let out = serde_yaml::to_string(&step).unwrap();
        assert!(out.contains("when:"));
    }
}
