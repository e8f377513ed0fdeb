//! The manifest root: codec, defaulting, validation and trigger collection

use super::bot::Bot;
use super::builder::{Builder, Preferences};
use super::errors::{ManifestError, ValidationError};
use super::release::Release;
use super::release_template::ReleaseTemplate;
use super::sections;
use super::stage::Stage;
use super::trigger::{Trigger, TriggerContext};
use super::version::Version;
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// The object a pipeline-manifest document deserializes to
///
/// Name-keyed sections (`stages`, `releases`, `releaseTemplates`, `bots`)
/// keep their source order; re-serializing a decoded manifest reproduces
/// the same sections in the same order. Decoding is strict: unknown keys
/// anywhere in the document are an error, except inside stages and
/// services where extension properties are collected instead.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    /// Whether the pipeline is archived and skips building.
    pub archived: bool,

    /// Builder the pipeline runs on.
    pub builder: Builder,

    /// Free-form labels, optionally checked against server-side regexes.
    pub labels: BTreeMap<String, String>,

    /// How version numbers are generated.
    pub version: Version,

    /// Environment variables shared by all stages.
    pub global_env_vars: BTreeMap<String, String>,

    /// Triggers starting builds of this pipeline.
    pub triggers: Vec<Trigger>,

    /// Ordered build stages.
    pub stages: Vec<Stage>,

    /// Ordered release targets.
    pub releases: Vec<Release>,

    /// Ordered release templates that releases can inherit from.
    pub release_templates: Vec<ReleaseTemplate>,

    /// Ordered bots.
    pub bots: Vec<Bot>,
}

impl Manifest {
    /// Cascades defaults through the whole manifest.
    ///
    /// The manifest builder is defaulted first since stage defaults depend
    /// on its operating system. Releases and bots without their own builder
    /// inherit a copy of the manifest builder.
    pub fn set_defaults(&mut self, preferences: &Preferences) {
        self.builder.set_defaults(preferences);
        self.version.set_defaults();

        for trigger in &mut self.triggers {
            trigger.set_defaults(preferences, TriggerContext::Build, "");
        }
        for stage in &mut self.stages {
            stage.set_defaults(&self.builder);
        }

        for release in &mut self.releases {
            if release.clone_repository.is_none() {
                release.clone_repository = Some(false);
            }

            let builder = match &mut release.builder {
                None => {
                    release.builder = Some(self.builder.clone());
                    self.builder.clone()
                }
                Some(builder) => {
                    builder.set_defaults(preferences);
                    builder.clone()
                }
            };

            for trigger in &mut release.triggers {
                trigger.set_defaults(preferences, TriggerContext::Release, &release.name);
            }
            for stage in &mut release.stages {
                stage.set_defaults(&builder);
            }
        }

        for bot in &mut self.bots {
            if bot.clone_repository.is_none() {
                bot.clone_repository = Some(false);
            }

            let builder = match &mut bot.builder {
                None => {
                    bot.builder = Some(self.builder.clone());
                    self.builder.clone()
                }
                Some(builder) => {
                    builder.set_defaults(preferences);
                    builder.clone()
                }
            };

            for trigger in &mut bot.triggers {
                trigger.set_defaults(preferences, TriggerContext::Bot, &bot.name);
            }
            for stage in &mut bot.stages {
                stage.set_defaults(&builder);
            }
        }
    }

    /// Checks the manifest against all validation rules, returning the
    /// first violation found.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] in walk order: builder, labels,
    /// stages, build triggers, releases, bots.
    pub fn validate(&self, preferences: &Preferences) -> Result<(), ValidationError> {
        self.builder.validate(preferences)?;

        for (key, value) in &self.labels {
            let Some(pattern) = preferences.label_regexes.get(key) else {
                continue;
            };
            let anchored = format!("^{}$", pattern.trim());

            let regex =
                Regex::new(&anchored).map_err(|err| ValidationError::LabelPatternInvalid {
                    key: key.clone(),
                    pattern: anchored.clone(),
                    message: err.to_string(),
                })?;

            if !regex.is_match(value) {
                return Err(ValidationError::LabelMismatch {
                    key: key.clone(),
                    pattern: anchored,
                });
            }
        }

        if self.stages.is_empty() {
            return Err(ValidationError::NoStages);
        }
        for stage in &self.stages {
            stage.validate()?;
        }

        for trigger in &self.triggers {
            trigger.validate(TriggerContext::Build, "")?;
        }

        for release in &self.releases {
            if let Some(builder) = &release.builder {
                builder.validate(preferences)?;
            }
            for trigger in &release.triggers {
                trigger.validate(TriggerContext::Release, &release.name)?;
            }
            for stage in &release.stages {
                stage.validate()?;
            }
        }

        for bot in &self.bots {
            if let Some(builder) = &bot.builder {
                builder.validate(preferences)?;
            }
            for trigger in &bot.triggers {
                trigger.validate(TriggerContext::Bot, &bot.name)?;
            }
            for stage in &bot.stages {
                stage.validate()?;
            }
        }

        Ok(())
    }

    /// Collects build, release and bot triggers into one flat list for
    /// publication to the host, rewriting `self` references to the fully
    /// qualified pipeline name.
    #[must_use]
    pub fn get_all_triggers(
        &self,
        repo_source: &str,
        repo_owner: &str,
        repo_name: &str,
    ) -> Vec<Trigger> {
        let pipeline = format!("{repo_source}/{repo_owner}/{repo_name}");

        let release_triggers = self.releases.iter().flat_map(|r| &r.triggers);
        let bot_triggers = self.bots.iter().flat_map(|b| &b.triggers);

        self.triggers
            .iter()
            .chain(release_triggers)
            .chain(bot_triggers)
            .map(|trigger| {
                let mut trigger = trigger.clone();
                trigger.replace_self(&pipeline);
                trigger
            })
            .collect()
    }

    /// Serializes the manifest back to YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Codec`] when a value cannot be represented.
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

const MANIFEST_KEYS: &[&str] = &[
    "archived",
    "builder",
    "labels",
    "version",
    "env",
    "pipelines",
    "triggers",
    "stages",
    "releases",
    "releaseTemplates",
    "bots",
];

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let document = Mapping::deserialize(deserializer)?;

        let mut manifest = Manifest::default();
        let mut stage_section = Mapping::new();
        let mut legacy_stage_section = Mapping::new();
        let mut release_section = Mapping::new();
        let mut template_section = Mapping::new();
        let mut bot_section = Mapping::new();

        for (key, value) in document {
            let Some(key) = key.as_str() else {
                return Err(de::Error::custom("manifest keys must be strings"));
            };

            // a key with nothing under it keeps its default
            if value.is_null() {
                continue;
            }

            match key {
                "archived" => manifest.archived = from_value(value)?,
                "builder" => manifest.builder = from_value(value)?,
                "labels" => manifest.labels = from_value(value)?,
                "version" => manifest.version = from_value(value)?,
                "env" => manifest.global_env_vars = from_value(value)?,
                "triggers" => manifest.triggers = from_value(value)?,
                "stages" => stage_section = from_value(value)?,
                "pipelines" => legacy_stage_section = from_value(value)?,
                "releases" => release_section = from_value(value)?,
                "releaseTemplates" => template_section = from_value(value)?,
                "bots" => bot_section = from_value(value)?,
                unknown => {
                    return Err(de::Error::unknown_field(unknown, MANIFEST_KEYS));
                }
            }
        }

        // the pipelines section is the deprecated name for stages
        if stage_section.is_empty() && !legacy_stage_section.is_empty() {
            stage_section = legacy_stage_section;
        }

        manifest.stages = sections::decode::<Stage, D::Error>(&stage_section)?
            .into_iter()
            .map(|(name, mut stage)| {
                stage.name = name;
                stage
            })
            .collect();

        // templates decode before releases so releases can inherit from them
        manifest.release_templates =
            sections::decode::<ReleaseTemplate, D::Error>(&template_section)?
                .into_iter()
                .map(|(name, mut template)| {
                    if template.name.is_empty() {
                        template.name = name;
                    }
                    template
                })
                .collect();

        manifest.releases = sections::decode::<Release, D::Error>(&release_section)?
            .into_iter()
            .map(|(name, mut release)| {
                if release.name.is_empty() {
                    release.name = name;
                }
                release.init_from_template(&manifest.release_templates);
                release
            })
            .collect();

        manifest.bots = sections::decode::<Bot, D::Error>(&bot_section)?
            .into_iter()
            .map(|(name, mut bot)| {
                bot.name = name;
                bot
            })
            .collect();

        Ok(manifest)
    }
}

fn from_value<T, E>(value: Value) -> Result<T, E>
where
    T: serde::de::DeserializeOwned,
    E: de::Error,
{
    serde_yaml::from_value(value).map_err(de::Error::custom)
}

impl Serialize for Manifest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut document = Mapping::new();

        if self.archived {
            document.insert(Value::from("archived"), Value::from(self.archived));
        }
        if !self.builder.is_zero() {
            document.insert(Value::from("builder"), to_value(&self.builder)?);
        }
        if !self.labels.is_empty() {
            document.insert(Value::from("labels"), to_value(&self.labels)?);
        }
        if self.version != Version::default() {
            document.insert(Value::from("version"), to_value(&self.version)?);
        }
        if !self.global_env_vars.is_empty() {
            document.insert(Value::from("env"), to_value(&self.global_env_vars)?);
        }
        if !self.triggers.is_empty() {
            document.insert(Value::from("triggers"), to_value(&self.triggers)?);
        }
        if !self.stages.is_empty() {
            let section: Mapping = sections::encode(
                self.stages.iter().map(|stage| (stage.name.as_str(), stage)),
            )?;
            document.insert(Value::from("stages"), Value::Mapping(section));
        }
        if !self.releases.is_empty() {
            let section: Mapping = sections::encode(
                self.releases
                    .iter()
                    .map(|release| (release.name.as_str(), release)),
            )?;
            document.insert(Value::from("releases"), Value::Mapping(section));
        }
        if !self.release_templates.is_empty() {
            let section: Mapping = sections::encode(
                self.release_templates
                    .iter()
                    .map(|template| (template.name.as_str(), template)),
            )?;
            document.insert(Value::from("releaseTemplates"), Value::Mapping(section));
        }
        if !self.bots.is_empty() {
            let section: Mapping =
                sections::encode(self.bots.iter().map(|bot| (bot.name.as_str(), bot)))?;
            document.insert(Value::from("bots"), Value::Mapping(section));
        }

        document.serialize(serializer)
    }
}

fn to_value<T, E>(value: &T) -> Result<Value, E>
where
    T: Serialize,
    E: ser::Error,
{
    serde_yaml::to_value(value).map_err(ser::Error::custom)
}

/// Whether a manifest file exists at the given path.
#[must_use]
pub fn exists<P: AsRef<Path>>(manifest_path: P) -> bool {
    manifest_path.as_ref().exists()
}

/// Decodes a manifest from YAML text, cascades defaults and optionally
/// validates.
///
/// Passing no preferences uses the library defaults.
///
/// # Errors
///
/// Returns [`ManifestError::Codec`] for malformed or unknown-key YAML, and
/// [`ManifestError::Validation`] when `validate` is set and a rule is
/// violated.
pub fn read_manifest(
    preferences: Option<&Preferences>,
    manifest_text: &str,
    validate: bool,
) -> Result<Manifest, ManifestError> {
    let default_preferences;
    let preferences = match preferences {
        Some(preferences) => preferences,
        None => {
            default_preferences = Preferences::default();
            &default_preferences
        }
    };

    let mut manifest: Manifest = serde_yaml::from_str(manifest_text)?;

    manifest.set_defaults(preferences);

    if validate {
        manifest.validate(preferences)?;
    }

    Ok(manifest)
}

/// Reads and decodes a manifest file, cascades defaults and optionally
/// validates.
///
/// # Errors
///
/// Returns [`ManifestError::Io`] when the file cannot be read, and the
/// same errors as [`read_manifest`] otherwise.
pub fn read_manifest_from_file<P: AsRef<Path>>(
    preferences: Option<&Preferences>,
    manifest_path: P,
    validate: bool,
) -> Result<Manifest, ManifestError> {
    let path = manifest_path.as_ref();
    tracing::debug!(path = %path.display(), "reading manifest file");

    let manifest_text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let manifest = read_manifest(preferences, &manifest_text, validate)?;

    tracing::debug!(path = %path.display(), "finished reading manifest file");

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const FULL_MANIFEST: &str = concat!(
        "builder:\n",
        "  track: dev\n",
        "labels:\n",
        "  app: rigline\n",
        "  team: rigline-team\n",
        "version:\n",
        "  semver:\n",
        "    major: 1\n",
        "    minor: 2\n",
        "env:\n",
        "  VAR_A: Greetings\n",
        "  VAR_B: World\n",
        "triggers:\n",
        "- pipeline:\n",
        "    name: github.com/rigline-org/build-agent\n",
        "stages:\n",
        "  build:\n",
        "    image: golang:1.21-alpine\n",
        "    workDir: /go/src/github.com/rigline-org/rigline\n",
        "    commands:\n",
        "    - go build ./...\n",
        "  bake:\n",
        "    image: extensions/docker:stable\n",
        "    commands:\n",
        "    - docker build -t rigline .\n",
        "releaseTemplates:\n",
        "  default-deploy:\n",
        "    clone: true\n",
        "    stages:\n",
        "      deploy:\n",
        "        image: extensions/deploy-to-kubernetes:stable\n",
        "releases:\n",
        "  development:\n",
        "    template: default-deploy\n",
        "  production:\n",
        "    actions:\n",
        "    - name: deploy-canary\n",
        "    - name: rollback-canary\n",
        "      hideBadge: true\n",
        "    triggers:\n",
        "    - pipeline:\n",
        "        name: self\n",
        "        branch: main\n",
        "      releases:\n",
        "        target: production\n",
        "    stages:\n",
        "      deploy:\n",
        "        image: extensions/deploy-to-kubernetes:stable\n",
        "bots:\n",
        "  pr-responder:\n",
        "    triggers:\n",
        "    - github:\n",
        "        events:\n",
        "        - pull_request\n",
        "      runs:\n",
        "        branch: main\n",
        "    stages:\n",
        "      respond:\n",
        "        image: extensions/github-comment:stable\n",
    );

    #[test]
    fn test_read_manifest_decodes_all_sections() {
        let manifest = read_manifest(None, FULL_MANIFEST, true).unwrap();

        assert_eq!(manifest.builder.track, "dev");
        assert_eq!(manifest.labels["app"], "rigline");
        assert_eq!(manifest.version.semver.as_ref().unwrap().major, 1);
        assert_eq!(manifest.global_env_vars["VAR_A"], "Greetings");
        assert_eq!(manifest.triggers.len(), 1);

        let stage_names: Vec<&str> = manifest.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(stage_names, ["build", "bake"]);

        let release_names: Vec<&str> =
            manifest.releases.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(release_names, ["development", "production"]);

        assert_eq!(manifest.release_templates.len(), 1);
        assert_eq!(manifest.bots.len(), 1);
        assert_eq!(manifest.bots[0].name, "pr-responder");
    }

    #[test]
    fn test_read_manifest_applies_release_template() {
        let manifest = read_manifest(None, FULL_MANIFEST, true).unwrap();

        let development = &manifest.releases[0];
        assert_eq!(development.clone_repository, Some(true));
        assert_eq!(development.stages.len(), 1);
        assert_eq!(development.stages[0].name, "deploy");

        // the production release defines its own stages and keeps them
        let production = &manifest.releases[1];
        assert_eq!(production.clone_repository, Some(false));
        assert_eq!(production.actions.len(), 2);
    }

    #[test]
    fn test_read_manifest_cascades_defaults() {
        let manifest = read_manifest(None, FULL_MANIFEST, true).unwrap();

        assert_eq!(manifest.builder.operating_system, "linux");
        assert_eq!(manifest.stages[0].shell, "/bin/sh");
        assert_eq!(manifest.stages[0].when, "status == 'succeeded'");
        assert_eq!(manifest.stages[1].working_directory, "/rigline-work");

        let build_trigger = &manifest.triggers[0];
        assert_eq!(build_trigger.pipeline.as_ref().unwrap().event, "finished");
        assert_eq!(build_trigger.build_action.as_ref().unwrap().branch, "master");

        // releases inherit the manifest builder and default to not cloning
        let production = &manifest.releases[1];
        assert_eq!(production.builder.as_ref().unwrap().track, "dev");
        let release_trigger = &production.triggers[0];
        assert_eq!(
            release_trigger.release_action.as_ref().unwrap().version,
            "same"
        );
    }

    #[test]
    fn test_set_defaults_is_idempotent() {
        let preferences = Preferences::default();
        let mut manifest = read_manifest(None, FULL_MANIFEST, true).unwrap();
        let once = manifest.clone();

        manifest.set_defaults(&preferences);

        assert_eq!(manifest, once);
    }

    #[test]
    fn test_round_trip_preserves_section_order() {
        let manifest = read_manifest(None, FULL_MANIFEST, false).unwrap();

        let encoded = manifest.to_yaml().unwrap();
        let decoded = read_manifest(None, &encoded, false).unwrap();

        assert_eq!(decoded, manifest);

        let build = encoded.find("  build:").unwrap();
        let bake = encoded.find("  bake:").unwrap();
        assert!(build < bake);
    }

    #[test]
    fn test_read_manifest_rejects_unknown_root_key() {
        let result = read_manifest(None, "stagez:\n  build:\n    image: alpine\n", false);

        assert!(matches!(result, Err(ManifestError::Codec(_))));
    }

    #[test]
    fn test_read_manifest_supports_deprecated_pipelines_section() {
        let yaml = concat!(
            "pipelines:\n",
            "  build:\n",
            "    image: golang:1.21-alpine\n",
            "    commands:\n",
            "    - go build ./...\n",
        );

        let manifest = read_manifest(None, yaml, true).unwrap();

        assert_eq!(manifest.stages.len(), 1);
        assert_eq!(manifest.stages[0].name, "build");
    }

    #[test]
    fn test_read_manifest_prefers_stages_over_pipelines() {
        let yaml = concat!(
            "pipelines:\n",
            "  old:\n",
            "    image: alpine\n",
            "stages:\n",
            "  new:\n",
            "    image: alpine\n",
        );

        let manifest = read_manifest(None, yaml, true).unwrap();

        assert_eq!(manifest.stages.len(), 1);
        assert_eq!(manifest.stages[0].name, "new");
    }

    #[test]
    fn test_validate_requires_at_least_one_stage() {
        let result = read_manifest(None, "labels:\n  app: rigline\n", true);

        assert!(matches!(
            result,
            Err(ManifestError::Validation(ValidationError::NoStages))
        ));
    }

    #[test]
    fn test_validate_skips_when_disabled() {
        let manifest = read_manifest(None, "labels:\n  app: rigline\n", false).unwrap();

        assert!(manifest.stages.is_empty());
    }

    #[test]
    fn test_validate_checks_labels_against_preferences() {
        let mut preferences = Preferences::default();
        preferences
            .label_regexes
            .insert("app".to_string(), "[a-z]+".to_string());

        let ok = read_manifest(
            Some(&preferences),
            "labels:\n  app: rigline\nstages:\n  build:\n    image: alpine\n",
            true,
        );
        assert!(ok.is_ok());

        let mismatch = read_manifest(
            Some(&preferences),
            "labels:\n  app: Rigline2\nstages:\n  build:\n    image: alpine\n",
            true,
        );
        assert!(matches!(
            mismatch,
            Err(ManifestError::Validation(
                ValidationError::LabelMismatch { .. }
            ))
        ));
    }

    #[test]
    fn test_validate_reports_broken_label_pattern() {
        let mut preferences = Preferences::default();
        preferences
            .label_regexes
            .insert("app".to_string(), "(".to_string());

        let result = read_manifest(
            Some(&preferences),
            "labels:\n  app: rigline\nstages:\n  build:\n    image: alpine\n",
            true,
        );

        assert!(matches!(
            result,
            Err(ManifestError::Validation(
                ValidationError::LabelPatternInvalid { .. }
            ))
        ));
    }

    #[test]
    fn test_validate_reports_first_violation_only() {
        // both the builder os and the stage are invalid; the builder is
        // checked first
        let yaml = concat!(
            "builder:\n",
            "  os: plan9\n",
            "stages:\n",
            "  build: {}\n",
        );

        let result = read_manifest(None, yaml, true);

        assert!(matches!(
            result,
            Err(ManifestError::Validation(
                ValidationError::UnsupportedOperatingSystem { .. }
            ))
        ));
    }

    #[test]
    fn test_get_all_triggers_flattens_and_rewrites_self() {
        let manifest = read_manifest(None, FULL_MANIFEST, true).unwrap();

        let triggers = manifest.get_all_triggers("github.com", "rigline-org", "rigline");

        // one build trigger, one release trigger, one bot trigger
        assert_eq!(triggers.len(), 3);
        assert_eq!(
            triggers[1].pipeline.as_ref().unwrap().name,
            "github.com/rigline-org/rigline"
        );
        // the manifest itself is left untouched
        assert_eq!(
            manifest.releases[1].triggers[0].pipeline.as_ref().unwrap().name,
            "self"
        );
    }

    #[test]
    fn test_generated_version_from_manifest() {
        let manifest = read_manifest(None, FULL_MANIFEST, true).unwrap();

        let version = manifest.version.version(&crate::manifest::VersionParams {
            auto_increment: 16,
            branch: "main".to_string(),
            revision: String::new(),
        });

        assert_eq!(version, "1.2.16");
    }

    #[test]
    fn test_read_manifest_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_MANIFEST.as_bytes()).unwrap();

        let manifest = read_manifest_from_file(None, file.path(), true).unwrap();

        assert_eq!(manifest.stages.len(), 2);
        assert!(exists(file.path()));
    }

    #[test]
    fn test_read_manifest_from_file_reports_missing_file() {
        let result = read_manifest_from_file(None, "/no/such/manifest.yaml", true);

        assert!(matches!(result, Err(ManifestError::Io { .. })));
        assert!(!exists("/no/such/manifest.yaml"));
    }
}
