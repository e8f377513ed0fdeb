//! Runtime events that triggers are matched against
//!
//! Events arrive from the host - webhook handlers, the scheduler, other
//! pipelines finishing - and are fed to the corresponding trigger filters'
//! `fires` predicates. The [`Event`] container carries any one of them
//! together with the name of the trigger that fired.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pipeline build changed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PipelineEvent {
    /// Version of the build.
    #[serde(rename = "buildVersion", default, skip_serializing_if = "String::is_empty")]
    pub build_version: String,

    /// Source host of the repository, i.e. github.com.
    #[serde(rename = "repoSource", default, skip_serializing_if = "String::is_empty")]
    pub repo_source: String,

    /// Owner of the repository.
    #[serde(rename = "repoOwner", default, skip_serializing_if = "String::is_empty")]
    pub repo_owner: String,

    /// Name of the repository.
    #[serde(rename = "repoName", default, skip_serializing_if = "String::is_empty")]
    pub repo_name: String,

    /// Branch the build ran against.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,

    /// Build status, `succeeded` or `failed`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Lifecycle event, `started` or `finished`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,
}

/// A pipeline release changed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReleaseEvent {
    /// Version that was released.
    #[serde(rename = "releaseVersion", default, skip_serializing_if = "String::is_empty")]
    pub release_version: String,

    /// Source host of the repository.
    #[serde(rename = "repoSource", default, skip_serializing_if = "String::is_empty")]
    pub repo_source: String,

    /// Owner of the repository.
    #[serde(rename = "repoOwner", default, skip_serializing_if = "String::is_empty")]
    pub repo_owner: String,

    /// Name of the repository.
    #[serde(rename = "repoName", default, skip_serializing_if = "String::is_empty")]
    pub repo_name: String,

    /// Release target that was deployed to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,

    /// Release status, `succeeded` or `failed`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Lifecycle event, `started` or `finished`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,
}

/// Code was pushed to a git repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GitEvent {
    /// Git event kind, currently only `push`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,

    /// Fully qualified repository name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    /// Branch the push landed on.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
}

/// A docker image changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DockerEvent {
    /// Docker event kind.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,

    /// Image name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    /// Image tag.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

/// The scheduler ticked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronEvent {
    /// Time of the tick.
    pub time: DateTime<Utc>,
}

/// A user started a build or release by hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ManualEvent {
    /// Identity of the user.
    #[serde(rename = "userID", default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
}

/// A message arrived on a pubsub topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PubSubEvent {
    /// Cloud project id containing the topic.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,

    /// Topic the message arrived on.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic: String,

    /// The message itself.
    #[serde(default)]
    pub message: PubSubMessage,
}

/// The payload of a pubsub message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PubSubMessage {
    /// Raw message data as delivered by the host.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
}

/// A github webhook fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GithubEvent {
    /// Github event name, i.e. `create` or `push`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,

    /// Fully qualified repository name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    /// Delivery guid assigned by github.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delivery: String,

    /// Raw webhook payload.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
}

/// A bitbucket webhook fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BitbucketEvent {
    /// Bitbucket event name, i.e. `repo:push`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,

    /// Fully qualified repository name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    /// Raw webhook payload.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
}

/// Any event, tagged with the trigger that consumed it
///
/// Exactly one of the variant fields is set; `fired` records whether the
/// named trigger matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Event {
    /// Name of the trigger this event was matched against.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Whether the trigger fired for this event.
    #[serde(default, skip_serializing_if = "super::sections::is_false")]
    pub fired: bool,

    /// Pipeline state change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineEvent>,

    /// Release state change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseEvent>,

    /// Git push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitEvent>,

    /// Docker image change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerEvent>,

    /// Scheduler tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<CronEvent>,

    /// PubSub message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubsub: Option<PubSubEvent>,

    /// Github webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubEvent>,

    /// Bitbucket webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket: Option<BitbucketEvent>,

    /// Manual start by a user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual: Option<ManualEvent>,
}
