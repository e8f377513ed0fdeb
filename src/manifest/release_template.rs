//! Reusable templates for release targets

use super::builder::Builder;
use super::sections::stage_section;
use super::stage::Stage;
use super::trigger::Trigger;
use serde::{Deserialize, Serialize};

/// A named bundle of release settings that release targets can inherit from
///
/// Templates are plain data; they are never defaulted or validated
/// themselves, only the releases instantiated from them are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ReleaseTemplate {
    /// Template name, taken from the enclosing section key.
    #[serde(default, skip_serializing)]
    pub name: String,

    /// Builder override for releases using this template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<Builder>,

    /// Whether releasing clones the repository first.
    #[serde(rename = "clone", default, skip_serializing_if = "Option::is_none")]
    pub clone_repository: Option<bool>,

    /// Actions selectable when releasing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<super::release::ReleaseAction>,

    /// Triggers starting releases automatically.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,

    /// Ordered stages run when releasing.
    #[serde(default, with = "stage_section", skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_stages_in_source_order() {
        let yaml = concat!(
            "clone: true\n",
            "stages:\n",
            "  deploy:\n",
            "    image: extensions/deploy-to-kubernetes:stable\n",
            "  notify:\n",
            "    image: extensions/slack-notify:stable\n",
        );

        let template: ReleaseTemplate = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(template.clone_repository, Some(true));
        let names: Vec<&str> = template.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["deploy", "notify"]);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let result = serde_yaml::from_str::<ReleaseTemplate>("stagez: {}\n");

        assert!(result.is_err());
    }
}
