//! Trigger types and the event-matching engine
//!
//! A trigger pairs exactly one event filter (pipeline, release, git,
//! docker, cron, pubsub, github or bitbucket) with exactly one action
//! (build, release or run), the required action kind depending on whether
//! the trigger lives under the manifest's build triggers, a release or a
//! bot. Each filter exposes a pure `fires` predicate over the matching
//! runtime event type.
//!
//! Most filters match their string fields through [`regex_match`]: the
//! pattern may carry a `=~` (explicit positive) or `!~` (negated) prefix,
//! is trimmed and anchored as a full-string match, and a pattern that fails
//! to compile never matches - even under negation.

use super::builder::Preferences;
use super::errors::ValidationError;
use super::event::{
    BitbucketEvent, CronEvent, DockerEvent, GitEvent, GithubEvent, PipelineEvent, PubSubEvent,
    ReleaseEvent,
};
use chrono::{Datelike, TimeZone, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which part of the manifest a trigger belongs to
///
/// The context determines the action the trigger must carry and the target
/// its action is bound to during defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerContext {
    /// Top-level trigger starting a build.
    Build,
    /// Trigger under a release target.
    Release,
    /// Trigger under a bot.
    Bot,
}

/// A trigger of any supported filter type and the action taken when it fires
///
/// The decode shape keeps one optional field per filter variant so that a
/// manifest setting zero or several variants still decodes and is rejected
/// by validation rather than by the parser. [`Trigger::filter`] exposes the
/// well-formed sum-type view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Trigger {
    /// Optional display name for the trigger.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Fires for pipeline build state changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineTrigger>,

    /// Fires for pipeline releases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseTrigger>,

    /// Fires for git repository pushes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitTrigger>,

    /// Fires for docker image changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerTrigger>,

    /// Fires at times described by a cron schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<CronTrigger>,

    /// Fires for pubsub messages on a project/topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubsub: Option<PubSubTrigger>,

    /// Fires for github webhook events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubTrigger>,

    /// Fires for bitbucket webhook events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket: Option<BitbucketTrigger>,

    /// What to build when the trigger fires (build context).
    #[serde(rename = "builds", default, skip_serializing_if = "Option::is_none")]
    pub build_action: Option<TriggerBuildAction>,

    /// What to release when the trigger fires (release context).
    #[serde(rename = "releases", default, skip_serializing_if = "Option::is_none")]
    pub release_action: Option<TriggerReleaseAction>,

    /// What to run when the trigger fires (bot context).
    #[serde(rename = "runs", default, skip_serializing_if = "Option::is_none")]
    pub bot_action: Option<TriggerBotAction>,
}

/// Borrowed view of the single event filter configured on a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerFilter<'a> {
    /// Pipeline state filter.
    Pipeline(&'a PipelineTrigger),
    /// Release filter.
    Release(&'a ReleaseTrigger),
    /// Git push filter.
    Git(&'a GitTrigger),
    /// Docker image filter.
    Docker(&'a DockerTrigger),
    /// Cron schedule filter.
    Cron(&'a CronTrigger),
    /// PubSub filter.
    PubSub(&'a PubSubTrigger),
    /// Github filter.
    Github(&'a GithubTrigger),
    /// Bitbucket filter.
    Bitbucket(&'a BitbucketTrigger),
}

impl Trigger {
    /// Returns the configured filter when exactly one variant is set.
    #[must_use]
    pub fn filter(&self) -> Option<TriggerFilter<'_>> {
        let mut found = None;
        let mut count = 0;

        let mut record = |filter| {
            count += 1;
            found = Some(filter);
        };

        if let Some(p) = &self.pipeline {
            record(TriggerFilter::Pipeline(p));
        }
        if let Some(r) = &self.release {
            record(TriggerFilter::Release(r));
        }
        if let Some(g) = &self.git {
            record(TriggerFilter::Git(g));
        }
        if let Some(d) = &self.docker {
            record(TriggerFilter::Docker(d));
        }
        if let Some(c) = &self.cron {
            record(TriggerFilter::Cron(c));
        }
        if let Some(p) = &self.pubsub {
            record(TriggerFilter::PubSub(p));
        }
        if let Some(g) = &self.github {
            record(TriggerFilter::Github(g));
        }
        if let Some(b) = &self.bitbucket {
            record(TriggerFilter::Bitbucket(b));
        }

        if count == 1 { found } else { None }
    }

    /// Fills filter and action defaults for the given context; `target_name`
    /// is the owning release or bot name, empty for build triggers.
    pub fn set_defaults(
        &mut self,
        preferences: &Preferences,
        context: TriggerContext,
        target_name: &str,
    ) {
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.set_defaults();
        }
        if let Some(release) = &mut self.release {
            release.set_defaults();
        }
        if let Some(git) = &mut self.git {
            git.set_defaults();
        }
        if let Some(github) = &mut self.github {
            github.set_defaults();
        }
        if let Some(bitbucket) = &mut self.bitbucket {
            bitbucket.set_defaults();
        }
        // docker, cron and pubsub filters have no defaults

        match context {
            TriggerContext::Build => {
                self.build_action
                    .get_or_insert_with(TriggerBuildAction::default)
                    .set_defaults(preferences);
            }
            TriggerContext::Release => {
                let triggers_on_self = matches!(&self.pipeline, Some(p) if p.name == "self")
                    || matches!(&self.release, Some(r) if r.name == "self");
                self.release_action
                    .get_or_insert_with(TriggerReleaseAction::default)
                    .set_defaults(target_name, triggers_on_self);
            }
            TriggerContext::Bot => {
                self.bot_action
                    .get_or_insert_with(TriggerBotAction::default)
                    .set_defaults(preferences, target_name);
            }
        }
    }

    pub(crate) fn validate(
        &self,
        context: TriggerContext,
        target_name: &str,
    ) -> Result<(), ValidationError> {
        let mut filters = 0;

        if self.pipeline.is_none()
            && self.release.is_none()
            && self.git.is_none()
            && self.docker.is_none()
            && self.cron.is_none()
            && self.pubsub.is_none()
            && self.github.is_none()
            && self.bitbucket.is_none()
        {
            return Err(ValidationError::MissingTriggerFilter);
        }

        if let Some(pipeline) = &self.pipeline {
            pipeline.validate()?;
            filters += 1;
        }
        if let Some(release) = &self.release {
            release.validate()?;
            filters += 1;
        }
        if let Some(git) = &self.git {
            git.validate()?;
            filters += 1;
        }
        if self.docker.is_some() {
            filters += 1;
        }
        if let Some(cron) = &self.cron {
            cron.validate()?;
            filters += 1;
        }
        if let Some(pubsub) = &self.pubsub {
            pubsub.validate()?;
            filters += 1;
        }
        if let Some(github) = &self.github {
            github.validate()?;
            filters += 1;
        }
        if let Some(bitbucket) = &self.bitbucket {
            bitbucket.validate()?;
            filters += 1;
        }

        if filters != 1 {
            return Err(ValidationError::TooManyTriggerFilters);
        }

        match context {
            TriggerContext::Build => {
                if self.build_action.is_none() {
                    return Err(ValidationError::WrongTriggerAction {
                        message: "for a build trigger set the 'builds' property".to_string(),
                    });
                }
                if self.release_action.is_some() {
                    return Err(ValidationError::WrongTriggerAction {
                        message: "for a build trigger do not set the 'releases' property"
                            .to_string(),
                    });
                }
            }
            TriggerContext::Release => {
                let Some(release_action) = &self.release_action else {
                    return Err(ValidationError::WrongTriggerAction {
                        message: "for a release trigger set the 'releases' property".to_string(),
                    });
                };
                if self.build_action.is_some() {
                    return Err(ValidationError::WrongTriggerAction {
                        message: "for a release trigger do not set the 'builds' property"
                            .to_string(),
                    });
                }
                release_action.validate(target_name)?;
            }
            TriggerContext::Bot => {
                if self.bot_action.is_none() {
                    return Err(ValidationError::WrongTriggerAction {
                        message: "for a bot trigger set the 'runs' property".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Rewrites identity fields holding the literal `self` to the fully
    /// qualified pipeline name; applied once when triggers are flattened
    /// for publication to the host.
    pub fn replace_self(&mut self, pipeline: &str) {
        if let Some(p) = &mut self.pipeline
            && p.name == "self"
        {
            p.name = pipeline.to_string();
        }
        if let Some(r) = &mut self.release
            && r.name == "self"
        {
            r.name = pipeline.to_string();
        }
        if let Some(g) = &mut self.github
            && g.repository == "self"
        {
            g.repository = pipeline.to_string();
        }
        if let Some(b) = &mut self.bitbucket
            && b.repository == "self"
        {
            b.repository = pipeline.to_string();
        }
    }
}

/// Filter on pipeline build state changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PipelineTrigger {
    /// Build lifecycle event, `started` or `finished`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,

    /// Final status for `finished` events, `succeeded` or `failed`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Fully qualified pipeline name, or `self`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Branch pattern, negatable regex.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
}

impl PipelineTrigger {
    pub(crate) fn set_defaults(&mut self) {
        if self.event.is_empty() {
            self.event = "finished".to_string();
        }
        if self.status.is_empty() {
            self.status = "succeeded".to_string();
        }
        if self.branch.is_empty() {
            self.branch = "master|main".to_string();
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.event != "started" && self.event != "finished" {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set pipeline.event in your trigger to 'started' or 'finished'"
                    .to_string(),
            });
        }
        if self.event == "finished" && self.status != "succeeded" && self.status != "failed" {
            return Err(ValidationError::InvalidTriggerFilter {
                message:
                    "set pipeline.status in your trigger to 'succeeded' or 'failed' for event 'finished'"
                        .to_string(),
            });
        }
        if self.name.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set pipeline.name in your trigger to 'self' or a fully qualified pipeline name, i.e. github.com/rigline-org/rigline"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Whether this filter fires for the given pipeline event.
    #[must_use]
    pub fn fires(&self, event: &PipelineEvent) -> bool {
        if !regex_match(&self.event, &event.event) {
            return false;
        }

        if self.event == "finished" && !regex_match(&self.status, &event.status) {
            return false;
        }

        // pipeline identity is an exact case-insensitive comparison, not a regex
        let identity = format!(
            "{}/{}/{}",
            event.repo_source, event.repo_owner, event.repo_name
        );
        if !self.name.eq_ignore_ascii_case(&identity) {
            return false;
        }

        regex_match(&self.branch, &event.branch)
    }
}

/// Filter on pipeline releases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ReleaseTrigger {
    /// Release lifecycle event, `started` or `finished`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,

    /// Final status for `finished` events.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Fully qualified pipeline name, or `self`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Release target pattern, negatable regex.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
}

impl ReleaseTrigger {
    pub(crate) fn set_defaults(&mut self) {
        if self.event.is_empty() {
            self.event = "finished".to_string();
        }
        if self.status.is_empty() {
            self.status = "succeeded".to_string();
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.event != "started" && self.event != "finished" {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set release.event in your trigger to 'started' or 'finished'"
                    .to_string(),
            });
        }
        if self.event == "finished" && self.status != "succeeded" && self.status != "failed" {
            return Err(ValidationError::InvalidTriggerFilter {
                message:
                    "set release.status in your trigger to 'succeeded' or 'failed' for event 'finished'"
                        .to_string(),
            });
        }
        if self.name.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set release.name in your trigger to 'self' or a fully qualified pipeline name"
                    .to_string(),
            });
        }
        if self.target.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message:
                    "set release.target in your trigger to a release target on the pipeline set by release.name"
                        .to_string(),
            });
        }
        Ok(())
    }

    /// Whether this filter fires for the given release event.
    #[must_use]
    pub fn fires(&self, event: &ReleaseEvent) -> bool {
        if !regex_match(&self.event, &event.event) {
            return false;
        }

        if self.event == "finished" && !regex_match(&self.status, &event.status) {
            return false;
        }

        let identity = format!(
            "{}/{}/{}",
            event.repo_source, event.repo_owner, event.repo_name
        );
        if !self.name.eq_ignore_ascii_case(&identity) {
            return false;
        }

        regex_match(&self.target, &event.target)
    }
}

/// Filter on git repository pushes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GitTrigger {
    /// Git event kind; only `push` is supported.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,

    /// Fully qualified repository name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    /// Branch pattern, negatable regex.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
}

impl GitTrigger {
    pub(crate) fn set_defaults(&mut self) {
        if self.event.is_empty() {
            self.event = "push".to_string();
        }
        if self.branch.is_empty() {
            self.branch = "master|main".to_string();
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.event != "push" {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set git.event in your trigger to 'push'".to_string(),
            });
        }
        if self.repository.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set git.repository in your trigger to a fully qualified repository name, i.e. github.com/rigline-org/rigline"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Whether this filter fires for the given git event.
    #[must_use]
    pub fn fires(&self, event: &GitEvent) -> bool {
        if !regex_match(&self.event, &event.event) {
            return false;
        }

        if !self.repository.eq_ignore_ascii_case(&event.repository) {
            return false;
        }

        regex_match(&self.branch, &event.branch)
    }
}

/// Filter on docker image changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DockerTrigger {
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

impl DockerTrigger {
    /// Whether this filter fires for the given docker event.
    ///
    /// Docker triggers never fire; matching has not been implemented.
    #[must_use]
    pub fn fires(&self, _event: &DockerEvent) -> bool {
        false
    }
}

/// Filter firing at times described by a cron schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CronTrigger {
    /// Standard five-field schedule: minute, hour, day of month, month,
    /// day of week.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule: String,
}

impl CronTrigger {
    fn parsed_schedule(&self) -> Result<cron::Schedule, ValidationError> {
        let invalid = |message: String| ValidationError::InvalidCronSchedule {
            schedule: self.schedule.clone(),
            message,
        };

        let fields: Vec<&str> = self.schedule.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = fields.as_slice() else {
            return Err(invalid(
                "expected '<minute> <hour> <day of month> <month> <day of week>'".to_string(),
            ));
        };

        // the cron crate expects a leading seconds field and numbers days
        // of week 1-7 starting at Sunday; standard schedules fire on the
        // whole minute and count days of week 0-6 starting at Sunday
        let expression = format!(
            "0 {minute} {hour} {day_of_month} {month} {}",
            shift_day_of_week(day_of_week)
        );

        cron::Schedule::from_str(&expression).map_err(|err| invalid(err.to_string()))
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.schedule.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message:
                    "set cron.schedule in your trigger to '<minute> <hour> <day of month> <month> <day of week>'"
                        .to_string(),
            });
        }

        self.parsed_schedule().map(|_| ())
    }

    /// Whether this filter fires for the given cron event.
    ///
    /// The event timestamp is truncated to the minute in UTC; the trigger
    /// fires iff the schedule's next fire time after the previous minute
    /// lands on that exact minute.
    #[must_use]
    pub fn fires(&self, event: &CronEvent) -> bool {
        let Ok(schedule) = self.parsed_schedule() else {
            return false;
        };

        let time = event.time.with_timezone(&Utc);
        let Some(truncated) = Utc
            .with_ymd_and_hms(
                time.year(),
                time.month(),
                time.day(),
                time.hour(),
                time.minute(),
                0,
            )
            .single()
        else {
            return false;
        };

        // step back one minute, otherwise the next fire time is at least
        // one minute past the event
        let Some(next) = schedule.after(&(truncated - chrono::Duration::minutes(1))).next() else {
            return false;
        };

        next.year() == time.year()
            && next.month() == time.month()
            && next.day() == time.day()
            && next.hour() == time.hour()
            && next.minute() == time.minute()
    }
}

/// Filter on pubsub messages in a project and topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PubSubTrigger {
    /// Cloud project id containing the topic.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,

    /// Topic the pipeline subscribes to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic: String,
}

impl PubSubTrigger {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.project.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set pubsub.project in your trigger to the cloud project id containing the pubsub topic"
                    .to_string(),
            });
        }
        if self.topic.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set pubsub.topic in your trigger to the pubsub topic to subscribe to"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Whether this filter fires for the given pubsub event.
    ///
    /// Project and topic are anchored regexes without `=~`/`!~` prefix
    /// support.
    #[must_use]
    pub fn fires(&self, event: &PubSubEvent) -> bool {
        anchored_match(&self.project, &event.project) && anchored_match(&self.topic, &event.topic)
    }
}

/// Filter on github webhook events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GithubTrigger {
    /// Github event names this trigger is interested in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,

    /// Repository the events come from, or `self`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,
}

impl GithubTrigger {
    pub(crate) fn set_defaults(&mut self) {
        if self.repository.is_empty() {
            self.repository = "self".to_string();
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.events.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message: "set array github.events in your trigger to at least one github event"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Whether this filter fires for the given github event.
    ///
    /// Fires for any event kind once the repository matches; the configured
    /// events list does not restrict matching.
    #[must_use]
    pub fn fires(&self, event: &GithubEvent) -> bool {
        !(!event.repository.is_empty() && event.repository != self.repository)
    }
}

/// Filter on bitbucket webhook events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct BitbucketTrigger {
    /// Bitbucket event names this trigger is interested in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,

    /// Repository the events come from, or `self`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,
}

impl BitbucketTrigger {
    pub(crate) fn set_defaults(&mut self) {
        if self.repository.is_empty() {
            self.repository = "self".to_string();
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.events.is_empty() {
            return Err(ValidationError::InvalidTriggerFilter {
                message:
                    "set array bitbucket.events in your trigger to at least one bitbucket event"
                        .to_string(),
            });
        }
        Ok(())
    }

    /// Whether this filter fires for the given bitbucket event.
    ///
    /// Fires for any event kind once the repository matches; the configured
    /// events list does not restrict matching.
    #[must_use]
    pub fn fires(&self, event: &BitbucketEvent) -> bool {
        !(!event.repository.is_empty() && event.repository != self.repository)
    }
}

/// Determines which branch builds when a build trigger fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TriggerBuildAction {
    /// Branch to build.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
}

impl TriggerBuildAction {
    pub(crate) fn set_defaults(&mut self, preferences: &Preferences) {
        if self.branch.is_empty() {
            self.branch = preferences.default_branch.clone();
        }
    }
}

/// Determines what releases when a release trigger fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TriggerReleaseAction {
    /// Release target; always bound to the owning release's name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,

    /// Optional release action on the target.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,

    /// Version to release: `same`, `latest` or an explicit version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl TriggerReleaseAction {
    pub(crate) fn set_defaults(&mut self, target_name: &str, triggers_on_self: bool) {
        self.target = target_name.to_string();
        if self.version.is_empty() {
            self.version = if triggers_on_self { "same" } else { "latest" }.to_string();
        }
    }

    pub(crate) fn validate(&self, target_name: &str) -> Result<(), ValidationError> {
        if self.target != target_name {
            return Err(ValidationError::ReleaseActionTargetMismatch {
                expected: target_name.to_string(),
            });
        }
        Ok(())
    }
}

/// Determines which bot runs when a bot trigger fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TriggerBotAction {
    /// Bot to run; bound to the owning bot's name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bot: String,

    /// Branch whose code the bot runs against.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
}

impl TriggerBotAction {
    pub(crate) fn set_defaults(&mut self, preferences: &Preferences, bot_name: &str) {
        self.bot = bot_name.to_string();
        if self.branch.is_empty() {
            self.branch = preferences.default_branch.clone();
        }
    }
}

/// Matches `value` against `pattern` as a full-string regex.
///
/// A `=~` prefix requests a positive match (the default); a `!~` prefix
/// negates the result. The remaining pattern is trimmed and anchored as
/// `^(pattern)$`. A pattern that fails to compile never matches, even
/// under negation.
fn regex_match(pattern: &str, value: &str) -> bool {
    let (pattern, negate) = if let Some(rest) = pattern.strip_prefix("=~") {
        (rest, false)
    } else if let Some(rest) = pattern.strip_prefix("!~") {
        (rest, true)
    } else {
        (pattern, false)
    };

    let anchored = format!("^({})$", pattern.trim());

    match Regex::new(&anchored) {
        Ok(re) => {
            let matched = re.is_match(value);
            if negate { !matched } else { matched }
        }
        Err(_) => false,
    }
}

/// Rewrites a standard day-of-week field (0-6, Sunday first) to the 1-7
/// numbering the schedule parser expects.
///
/// Day names, `*` and step values pass through untouched; numbers outside
/// 0-6 shift out of range and fail the parse, as standard cron rejects
/// them too.
fn shift_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(|entry| {
            let (days, step) = match entry.split_once('/') {
                Some((days, step)) => (days, Some(step)),
                None => (entry, None),
            };

            let shifted = days
                .split('-')
                .map(|token| match token.parse::<u32>() {
                    Ok(day) => (day + 1).to_string(),
                    Err(_) => token.to_string(),
                })
                .collect::<Vec<_>>()
                .join("-");

            match step {
                Some(step) => format!("{shifted}/{step}"),
                None => shifted,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Anchored full-string match without prefix support; compile errors fail
/// closed.
fn anchored_match(pattern: &str, value: &str) -> bool {
    let anchored = format!("^({})$", pattern.trim());
    Regex::new(&anchored).is_ok_and(|re| re.is_match(value))
}
