//! Bots responding to integration events

use super::builder::Builder;
use super::sections::stage_section;
use super::stage::Stage;
use super::trigger::Trigger;
use serde::{Deserialize, Serialize};

/// A bot running stages in response to integration events
///
/// Bots look like releases without actions or templates: triggers decide
/// when they run, stages decide what they do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Bot {
    /// Bot name, taken from the enclosing section key.
    #[serde(default, skip_serializing)]
    pub name: String,

    /// Builder override for this bot; inherits the manifest builder when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<Builder>,

    /// Whether running the bot clones the repository first.
    #[serde(rename = "clone", default, skip_serializing_if = "Option::is_none")]
    pub clone_repository: Option<bool>,

    /// Triggers starting this bot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,

    /// Ordered stages run by the bot.
    #[serde(default, with = "stage_section", skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,
}
