//! Release targets and their actions

use super::builder::Builder;
use super::release_template::ReleaseTemplate;
use super::sections::{is_false, stage_section};
use super::stage::Stage;
use super::trigger::Trigger;
use serde::{Deserialize, Serialize};

/// A release target with one or more stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Release {
    /// Release name, taken from the enclosing section key.
    #[serde(default, skip_serializing)]
    pub name: String,

    /// Builder override for this release; inherits the manifest builder
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<Builder>,

    /// Whether releasing clones the repository first.
    #[serde(rename = "clone", default, skip_serializing_if = "Option::is_none")]
    pub clone_repository: Option<bool>,

    /// Actions selectable when releasing to this target.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ReleaseAction>,

    /// Triggers starting this release automatically.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,

    /// Ordered stages run when releasing.
    #[serde(default, with = "stage_section", skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,

    /// Name of the release template this release inherits from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
}

impl Release {
    /// Copies unset settings from the named release template.
    ///
    /// Inheritance is wholesale per field: a release that sets its own
    /// stages keeps all of them and takes none of the template's. A
    /// template name that matches nothing is silently ignored.
    pub fn init_from_template(&mut self, templates: &[ReleaseTemplate]) {
        if self.template.is_empty() {
            return;
        }

        let Some(template) = templates.iter().find(|t| t.name == self.template) else {
            return;
        };

        if self.builder.is_none() {
            self.builder = template.builder.clone();
        }
        if self.clone_repository.is_none() {
            self.clone_repository = template.clone_repository;
        }
        if self.actions.is_empty() {
            self.actions = template.actions.clone();
        }
        if self.triggers.is_empty() {
            self.triggers = template.triggers.clone();
        }
        if self.stages.is_empty() {
            self.stages = template.stages.clone();
        }
    }
}

/// A selectable action on a release target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ReleaseAction {
    /// Action name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Hides the release badge for this action.
    #[serde(rename = "hideBadge", default, skip_serializing_if = "is_false")]
    pub hide_badge: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template_with_stage(name: &str) -> ReleaseTemplate {
        serde_yaml::from_str::<ReleaseTemplate>(concat!(
            "clone: true\n",
            "actions:\n",
            "- name: deploy-canary\n",
            "- name: rollback-canary\n",
            "  hideBadge: true\n",
            "stages:\n",
            "  deploy:\n",
            "    image: extensions/deploy-to-kubernetes:stable\n",
        ))
        .map(|mut template| {
            template.name = name.to_string();
            template
        })
        .unwrap()
    }

    #[test]
    fn test_init_from_template_fills_unset_fields() {
        let templates = [template_with_stage("default-deploy")];
        let mut release = Release {
            name: "development".to_string(),
            template: "default-deploy".to_string(),
            ..Release::default()
        };

        release.init_from_template(&templates);

        assert_eq!(release.clone_repository, Some(true));
        assert_eq!(release.actions.len(), 2);
        assert_eq!(release.actions[1].name, "rollback-canary");
        assert!(release.actions[1].hide_badge);
        assert_eq!(release.stages.len(), 1);
        assert_eq!(release.stages[0].name, "deploy");
    }

    #[test]
    fn test_init_from_template_release_fields_win_wholesale() {
        let templates = [template_with_stage("default-deploy")];
        let own_stage: Vec<Stage> = vec![Stage {
            name: "custom-deploy".to_string(),
            container_image: "extensions/deploy-to-cloudflare:stable".to_string(),
            ..Stage::default()
        }];
        let mut release = Release {
            name: "production".to_string(),
            template: "default-deploy".to_string(),
            clone_repository: Some(false),
            stages: own_stage,
            ..Release::default()
        };

        release.init_from_template(&templates);

        // own stages replace the template's entirely, no merge
        assert_eq!(release.stages.len(), 1);
        assert_eq!(release.stages[0].name, "custom-deploy");
        assert_eq!(release.clone_repository, Some(false));
        // unset fields still come from the template
        assert_eq!(release.actions.len(), 2);
    }

    #[test]
    fn test_releases_resolved_from_same_template_are_independent() {
        let templates = [template_with_stage("default-deploy")];
        let mut development = Release {
            name: "development".to_string(),
            template: "default-deploy".to_string(),
            ..Release::default()
        };
        let mut production = development.clone();
        production.name = "production".to_string();

        development.init_from_template(&templates);
        production.init_from_template(&templates);

        development.stages[0].container_image = "extensions/deploy-to-gke:dev".to_string();

        assert_eq!(
            production.stages[0].container_image,
            "extensions/deploy-to-kubernetes:stable"
        );
    }

    #[test]
    fn test_init_from_template_unknown_template_is_ignored() {
        let templates = [template_with_stage("default-deploy")];
        let mut release = Release {
            name: "development".to_string(),
            template: "no-such-template".to_string(),
            ..Release::default()
        };

        release.init_from_template(&templates);

        assert!(release.stages.is_empty());
        assert!(release.clone_repository.is_none());
    }

    #[test]
    fn test_init_from_template_without_template_name_is_a_no_op() {
        let templates = [template_with_stage("default-deploy")];
        let mut release = Release {
            name: "development".to_string(),
            ..Release::default()
        };

        release.init_from_template(&templates);

        assert!(release.stages.is_empty());
    }
}
