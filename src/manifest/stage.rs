//! Stage and service types
//!
//! A stage is a named unit of build work. It is either a *leaf* stage that
//! runs commands in a container, or a *parallel container* stage grouping
//! child stages; the two shapes are mutually exclusive. Any key the schema
//! does not recognize is preserved verbatim as an ordered custom property,
//! so pipeline extensions can carry their own configuration through the
//! manifest untouched.

use super::builder::Builder;
use super::errors::ValidationError;
use super::sections::stage_section;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::collections::BTreeMap;

/// A named unit of work in a pipeline, release or bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stage {
    /// Stage name, assigned from the enclosing section key; a `name` set
    /// in the body is recognized but overwritten by the key.
    #[serde(default, skip_serializing)]
    pub name: String,

    /// Container image the commands run in.
    #[serde(rename = "image", default, skip_serializing_if = "String::is_empty")]
    pub container_image: String,

    /// Shell the commands are fed to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shell: String,

    /// Working directory inside the container.
    #[serde(rename = "workDir", default, skip_serializing_if = "String::is_empty")]
    pub working_directory: String,

    /// Commands executed in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,

    /// Predicate deciding whether the stage runs; interpreted by the host.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub when: String,

    /// Environment variables for this stage.
    #[serde(rename = "env", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,

    /// Child stages executed concurrently; makes this a parallel container.
    #[serde(
        rename = "parallelStages",
        default,
        with = "stage_section",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub parallel_stages: Vec<Stage>,

    /// Sidecar services running alongside the stage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    /// Unrecognized keys, preserved in source order for the execution layer.
    #[serde(flatten)]
    pub custom_properties: Mapping,
}

impl Stage {
    /// Fills unset fields, propagating the builder's operating system into
    /// the default shell and working directory.
    pub fn set_defaults(&mut self, builder: &Builder) {
        let windows = builder.operating_system == "windows";

        if self.parallel_stages.is_empty() && self.shell.is_empty() {
            self.shell = if windows { "powershell" } else { "/bin/sh" }.to_string();
        }

        if self.parallel_stages.is_empty() && self.working_directory.is_empty() {
            self.working_directory =
                if windows { "C:/rigline-work" } else { "/rigline-work" }.to_string();
        }

        if self.when.is_empty() {
            self.when = "status == 'succeeded'".to_string();
        }

        for stage in &mut self.parallel_stages {
            stage.set_defaults(builder);
        }

        let has_image = !self.container_image.is_empty();
        for service in &mut self.services {
            service.set_defaults(builder, has_image);
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.parallel_stages.is_empty() {
            if self.container_image.is_empty() && self.services.is_empty() {
                return Err(ValidationError::StageMissingImage {
                    stage: self.name.clone(),
                });
            }
        } else {
            // parallel containers delegate all execution detail to children
            if !self.container_image.is_empty()
                || !self.shell.is_empty()
                || !self.working_directory.is_empty()
                || !self.commands.is_empty()
                || !self.env_vars.is_empty()
            {
                return Err(ValidationError::ParallelStageConflict {
                    stage: self.name.clone(),
                });
            }

            for stage in &self.parallel_stages {
                stage.validate()?;
            }
        }

        for service in &self.services {
            service.validate()?;
        }

        Ok(())
    }

    /// Structured JSON form for diagnostics and host API responses.
    ///
    /// Recognized fields keep their wire names; custom properties are
    /// collected under their own `customProperties` key instead of being
    /// inlined, so consumers can tell extension configuration apart from
    /// the schema. Empty fields are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error when a custom property cannot be represented in
    /// JSON, i.e. a mapping with non-string keys.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut object = serde_json::Map::new();

        if !self.name.is_empty() {
            object.insert("name".to_string(), self.name.clone().into());
        }
        if !self.container_image.is_empty() {
            object.insert("image".to_string(), self.container_image.clone().into());
        }
        if !self.shell.is_empty() {
            object.insert("shell".to_string(), self.shell.clone().into());
        }
        if !self.working_directory.is_empty() {
            object.insert("workDir".to_string(), self.working_directory.clone().into());
        }
        if !self.commands.is_empty() {
            object.insert("commands".to_string(), serde_json::to_value(&self.commands)?);
        }
        if !self.when.is_empty() {
            object.insert("when".to_string(), self.when.clone().into());
        }
        if !self.env_vars.is_empty() {
            object.insert("env".to_string(), serde_json::to_value(&self.env_vars)?);
        }
        if !self.parallel_stages.is_empty() {
            let stages = self
                .parallel_stages
                .iter()
                .map(Stage::to_json)
                .collect::<Result<Vec<_>, _>>()?;
            object.insert("parallelStages".to_string(), stages.into());
        }
        if !self.services.is_empty() {
            let services = self
                .services
                .iter()
                .map(Service::to_json)
                .collect::<Result<Vec<_>, _>>()?;
            object.insert("services".to_string(), services.into());
        }
        if !self.custom_properties.is_empty() {
            object.insert(
                "customProperties".to_string(),
                serde_json::to_value(&self.custom_properties)?,
            );
        }

        Ok(serde_json::Value::Object(object))
    }
}

/// A sidecar container running next to a stage
///
/// Its configuration is opaque to this library beyond defaulting and
/// validation; the execution layer interprets the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Service {
    /// Service name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Container image the service runs.
    #[serde(rename = "image", default, skip_serializing_if = "String::is_empty")]
    pub container_image: String,

    /// Shell used for service commands.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shell: String,

    /// Environment variables for the service.
    #[serde(rename = "env", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,

    /// Whether the service outlives its stage and is shared with later ones.
    #[serde(
        rename = "multiStage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub multi_stage: Option<bool>,

    /// Unrecognized keys (readiness probes and the like), preserved for the
    /// execution layer.
    #[serde(flatten)]
    pub custom_properties: Mapping,
}

impl Service {
    /// Fills unset fields; `stage_has_image` steers the multi-stage default.
    pub fn set_defaults(&mut self, builder: &Builder, stage_has_image: bool) {
        if self.shell.is_empty() {
            self.shell = if builder.operating_system == "windows" {
                "powershell"
            } else {
                "/bin/sh"
            }
            .to_string();
        }

        if self.multi_stage.is_none() {
            self.multi_stage = Some(!stage_has_image);
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.container_image.is_empty() {
            return Err(ValidationError::ServiceMissingImage {
                service: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Structured JSON form; see [`Stage::to_json`].
    ///
    /// # Errors
    ///
    /// Returns an error when a custom property cannot be represented in
    /// JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut object = serde_json::Map::new();

        if !self.name.is_empty() {
            object.insert("name".to_string(), self.name.clone().into());
        }
        if !self.container_image.is_empty() {
            object.insert("image".to_string(), self.container_image.clone().into());
        }
        if !self.shell.is_empty() {
            object.insert("shell".to_string(), self.shell.clone().into());
        }
        if !self.env_vars.is_empty() {
            object.insert("env".to_string(), serde_json::to_value(&self.env_vars)?);
        }
        if let Some(multi_stage) = self.multi_stage {
            object.insert("multiStage".to_string(), multi_stage.into());
        }
        if !self.custom_properties.is_empty() {
            object.insert(
                "customProperties".to_string(),
                serde_json::to_value(&self.custom_properties)?,
            );
        }

        Ok(serde_json::Value::Object(object))
    }
}
