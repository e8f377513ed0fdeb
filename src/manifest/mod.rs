//! Manifest domain types and logic
//!
//! A manifest describes a CI pipeline: its build stages, release targets,
//! bots, triggers and version rules. This module owns decoding manifests
//! from YAML text, cascading defaults, fail-fast validation, trigger event
//! matching and version-string generation.

pub mod bot;
pub mod builder;
pub mod errors;
pub mod event;
pub mod manifest_def;
pub mod release;
pub mod release_template;
pub mod stage;
pub mod trigger;
pub mod version;

pub(crate) mod sections;

// Re-export public types from submodules
pub use bot::Bot;
pub use builder::{Builder, Preferences};
pub use errors::{ManifestError, ValidationError};
pub use event::{
    BitbucketEvent, CronEvent, DockerEvent, Event, GitEvent, GithubEvent, ManualEvent,
    PipelineEvent, PubSubEvent, PubSubMessage, ReleaseEvent,
};
pub use manifest_def::{Manifest, exists, read_manifest, read_manifest_from_file};
pub use release::{Release, ReleaseAction};
pub use release_template::ReleaseTemplate;
pub use stage::{Service, Stage};
pub use trigger::{
    BitbucketTrigger, CronTrigger, DockerTrigger, GitTrigger, GithubTrigger, PipelineTrigger,
    PubSubTrigger, ReleaseTrigger, Trigger, TriggerBotAction, TriggerBuildAction, TriggerContext,
    TriggerFilter, TriggerReleaseAction,
};
pub use version::{CustomVersion, SemverVersion, StringOrStringArray, Version, VersionParams};
