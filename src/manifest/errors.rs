//! Error types for manifest parsing and validation

use thiserror::Error;

/// Errors that can occur while reading or serializing a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read
    #[error("failed to read manifest file '{path}': {source}")]
    Io {
        /// Path of the manifest file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest text could not be decoded or re-encoded
    #[error("failed to decode manifest: {0}")]
    Codec(#[from] serde_yaml::Error),

    /// The decoded manifest violates a validation rule
    #[error("invalid manifest: {0}")]
    Validation(#[from] ValidationError),
}

/// Validation errors for manifest components
///
/// Validation is fail-fast: the first violated rule is returned and the
/// walk stops. Messages are meant for pipeline authors, not for matching
/// on by code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Builder operating system is not one of the supported values
    #[error("builder os '{operating_system}' is not supported, use one of: {supported:?}")]
    UnsupportedOperatingSystem {
        /// The unsupported operating system.
        operating_system: String,
        /// Operating systems accepted by the server.
        supported: Vec<String>,
    },

    /// Builder track is not one of the supported values
    #[error("builder track '{track}' is not supported, use one of: {supported:?}")]
    UnsupportedTrack {
        /// The unsupported track.
        track: String,
        /// Tracks accepted by the server.
        supported: Vec<String>,
    },

    /// A label value does not match its configured regex
    #[error("label '{key}' does not match regex '{pattern}'")]
    LabelMismatch {
        /// The label key.
        key: String,
        /// The anchored pattern the value was tested against.
        pattern: String,
    },

    /// A configured label regex failed to compile
    #[error("label '{key}' has an invalid regex '{pattern}': {message}")]
    LabelPatternInvalid {
        /// The label key.
        key: String,
        /// The pattern that failed to compile.
        pattern: String,
        /// Compile error text.
        message: String,
    },

    /// The manifest defines no stages
    #[error("the manifest should define 1 or more stages")]
    NoStages,

    /// A parallel-container stage also sets leaf-stage fields
    #[error(
        "stage '{stage}' cannot use 'image', 'shell', 'workDir', 'commands' or 'env' in combination with 'parallelStages'"
    )]
    ParallelStageConflict {
        /// Name of the offending stage.
        stage: String,
    },

    /// A leaf stage has neither a container image nor any services
    #[error("set an 'image' for stage '{stage}' or add at least one service")]
    StageMissingImage {
        /// Name of the offending stage.
        stage: String,
    },

    /// A service does not declare a container image
    #[error("set an 'image' for service '{service}'")]
    ServiceMissingImage {
        /// Name of the offending service.
        service: String,
    },

    /// A trigger sets none of the event-filter variants
    #[error(
        "set at least one of 'pipeline', 'release', 'git', 'docker', 'cron', 'pubsub', 'github' or 'bitbucket' on your trigger"
    )]
    MissingTriggerFilter,

    /// A trigger sets more than one event-filter variant
    #[error(
        "do not set more than one of 'pipeline', 'release', 'git', 'docker', 'cron', 'pubsub', 'github' or 'bitbucket' per trigger"
    )]
    TooManyTriggerFilters,

    /// A trigger filter field has an invalid value
    #[error("{message}")]
    InvalidTriggerFilter {
        /// Which rule the filter violates.
        message: String,
    },

    /// A cron schedule could not be parsed
    #[error("invalid cron schedule '{schedule}': {message}")]
    InvalidCronSchedule {
        /// The schedule that failed to parse.
        schedule: String,
        /// Parse error text.
        message: String,
    },

    /// A trigger carries the wrong action for the context it lives in
    #[error("{message}")]
    WrongTriggerAction {
        /// Which action rule the trigger violates.
        message: String,
    },

    /// A release trigger's action targets a different release than it belongs to
    #[error("the target in your 'releases' action should have defaulted to '{expected}'")]
    ReleaseActionTargetMismatch {
        /// Name of the release the trigger belongs to.
        expected: String,
    },
}
