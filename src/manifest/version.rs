//! Version number generation
//!
//! A manifest either versions semantically (`major.minor.patch`, with a
//! branch-derived pre-release label off release branches) or with a fully
//! custom template. Templates substitute `{{auto}}`, `{{branch}}` and
//! `{{revision}}` placeholders from [`VersionParams`]; rendering never
//! fails, an unknown placeholder renders to its error text instead so the
//! broken value surfaces in the produced version.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder regex"));

/// How version numbers are generated for a pipeline
///
/// At most one strategy is set; an empty version defaults to semantic
/// versioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Version {
    /// Semantic versioning strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semver: Option<SemverVersion>,

    /// Custom template strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomVersion>,
}

impl Version {
    /// Fills in the semver strategy when none is chosen, and defaults the
    /// chosen strategy's unset fields.
    pub fn set_defaults(&mut self) {
        if self.semver.is_none() && self.custom.is_none() {
            self.semver = Some(SemverVersion::default());
        }

        if let Some(semver) = &mut self.semver {
            if semver.patch.is_empty() {
                semver.patch = "{{auto}}".to_string();
            }
            if semver.label_template.is_empty() {
                semver.label_template = "{{branch}}".to_string();
            }
            if semver.release_branch.is_empty() {
                semver.release_branch =
                    StringOrStringArray::from(vec!["master".to_string(), "main".to_string()]);
            }
        }

        if let Some(custom) = &mut self.custom
            && custom.label_template.is_empty()
        {
            custom.label_template = "{{revision}}".to_string();
        }
    }

    /// Generates the version number for the given build parameters.
    ///
    /// Custom wins when both strategies are somehow set.
    #[must_use]
    pub fn version(&self, params: &VersionParams) -> String {
        if let Some(custom) = &self.custom {
            return custom.version(params);
        }
        if let Some(semver) = &self.semver {
            return semver.version(params);
        }
        String::new()
    }
}

/// A fully templated version number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CustomVersion {
    /// Template the version is rendered from.
    #[serde(rename = "labelTemplate", default)]
    pub label_template: String,
}

impl CustomVersion {
    /// Renders the version from the template.
    #[must_use]
    pub fn version(&self, params: &VersionParams) -> String {
        params.render_template(&self.label_template)
    }
}

/// Semantic versioning (<https://semver.org/>)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SemverVersion {
    /// Major version number.
    #[serde(default)]
    pub major: i32,

    /// Minor version number.
    #[serde(default)]
    pub minor: i32,

    /// Patch template, usually `{{auto}}`.
    #[serde(default)]
    pub patch: String,

    /// Template for the pre-release label appended off release branches.
    #[serde(rename = "labelTemplate", default)]
    pub label_template: String,

    /// Branches that produce release versions without a label.
    #[serde(rename = "releaseBranch", default)]
    pub release_branch: StringOrStringArray,
}

impl SemverVersion {
    /// Generates `major.minor.patch`, with the label appended when the
    /// branch is not a release branch.
    #[must_use]
    pub fn version(&self, params: &VersionParams) -> String {
        format!(
            "{}.{}.{}",
            self.major,
            self.minor,
            self.patch_with_label(params)
        )
    }

    fn patch_with_label(&self, params: &VersionParams) -> String {
        let patch = self.patch(params);
        let label = self.label(params);

        if self.release_branch.contains(&params.branch) || label.is_empty() {
            return patch;
        }

        format!("{patch}-{label}")
    }

    /// Renders the patch template.
    #[must_use]
    pub fn patch(&self, params: &VersionParams) -> String {
        params.render_template(&self.patch)
    }

    /// Renders the label template and tidies the result into a valid dns
    /// label.
    ///
    /// A rendered label starting with a digit gets the first placeholder
    /// name of the template as a prefix, so that `1-2-fix` from a
    /// `{{branch}}` template becomes `branch-1-2-fix` instead of being
    /// stripped to `fix`.
    #[must_use]
    pub fn label(&self, params: &VersionParams) -> String {
        let label = params.render_template(&self.label_template);

        if label.as_bytes().first().is_some_and(u8::is_ascii_digit) {
            let prefix = PLACEHOLDER
                .captures(&self.label_template)
                .map_or_else(|| "label-".to_string(), |caps| format!("{}-", &caps[1]));

            return tidy_label(&format!("{prefix}{label}"));
        }

        tidy_label(&label)
    }
}

/// Reduces a rendered label to a valid dns label.
///
/// Lowercase letters, digits and hyphens only, starting with a letter, not
/// ending in a hyphen, at most 63 characters.
fn tidy_label(label: &str) -> String {
    static INVALID: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^a-z0-9-]+").expect("invalid-character regex"));
    static LEADING: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[0-9-]+").expect("leading-character regex"));

    let label = label.to_lowercase();
    let label = INVALID.replace_all(&label, "-");
    let label = label.replace("--", "-");
    let label = label.trim_matches('-');
    let label = LEADING.replace(label, "");

    let mut label = label.into_owned();
    label.truncate(63);
    label
}

/// Build parameters substituted into version templates
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionParams {
    /// Build counter for the repository and branch.
    pub auto_increment: i32,

    /// Branch being built.
    pub branch: String,

    /// Revision being built.
    pub revision: String,
}

impl VersionParams {
    /// Substitutes `{{auto}}`, `{{branch}}` and `{{revision}}` placeholders
    /// in the template.
    ///
    /// An unknown placeholder turns the whole result into its error text
    /// rather than failing, so misconfigured templates surface in the
    /// generated version.
    #[must_use]
    pub fn render_template(&self, template: &str) -> String {
        let mut unknown: Option<String> = None;

        let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
            match caps[1].trim() {
                "auto" => self.auto_increment.to_string(),
                "branch" => self.branch.clone(),
                "revision" => self.revision.clone(),
                other => {
                    unknown
                        .get_or_insert_with(|| format!("template: unknown placeholder '{other}'"));
                    String::new()
                }
            }
        });

        unknown.unwrap_or_else(|| rendered.into_owned())
    }
}

/// A YAML value that is either a single string or a list of strings
///
/// Encodes back to a scalar when it holds exactly one value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringOrStringArray {
    /// The contained values.
    pub values: Vec<String>,
}

impl StringOrStringArray {
    /// Whether the given value is one of the contained values.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Whether no values are contained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<String>> for StringOrStringArray {
    fn from(values: Vec<String>) -> Self {
        Self { values }
    }
}

impl<'de> Deserialize<'de> for StringOrStringArray {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Single(String),
            Multiple(Vec<String>),
        }

        let values = match Option::<Repr>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Repr::Single(value)) => vec![value],
            Some(Repr::Multiple(values)) => values,
        };

        Ok(Self { values })
    }
}

impl Serialize for StringOrStringArray {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.values.len() == 1 {
            return serializer.serialize_str(&self.values[0]);
        }

        let mut seq = serializer.serialize_seq(Some(self.values.len()))?;
        for value in &self.values {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(auto_increment: i32, branch: &str, revision: &str) -> VersionParams {
        VersionParams {
            auto_increment,
            branch: branch.to_string(),
            revision: revision.to_string(),
        }
    }

    fn defaulted_semver() -> SemverVersion {
        let mut version = Version {
            semver: Some(SemverVersion::default()),
            custom: None,
        };
        version.set_defaults();
        version.semver.unwrap()
    }

    #[test]
    fn test_set_defaults_picks_semver_when_nothing_is_set() {
        let mut version = Version::default();
        version.set_defaults();

        let semver = version.semver.expect("semver strategy");
        assert_eq!(semver.major, 0);
        assert_eq!(semver.minor, 0);
        assert_eq!(semver.patch, "{{auto}}");
        assert_eq!(semver.label_template, "{{branch}}");
        assert_eq!(semver.release_branch.values, ["master", "main"]);
        assert!(version.custom.is_none());
    }

    #[test]
    fn test_set_defaults_custom_label_template() {
        let mut version = Version {
            custom: Some(CustomVersion::default()),
            semver: None,
        };
        version.set_defaults();

        assert_eq!(version.custom.unwrap().label_template, "{{revision}}");
        assert!(version.semver.is_none());
    }

    #[test]
    fn test_semver_version_on_release_branch_has_no_label() {
        let semver = defaulted_semver();

        assert_eq!(semver.version(&params(16, "main", "")), "0.0.16");
    }

    #[test]
    fn test_semver_version_off_release_branch_appends_label() {
        let semver = defaulted_semver();

        assert_eq!(
            semver.version(&params(16, "my-feature", "")),
            "0.0.16-my-feature"
        );
    }

    #[test]
    fn test_semver_version_with_explicit_major_minor() {
        let semver = SemverVersion {
            major: 1,
            minor: 2,
            ..defaulted_semver()
        };

        assert_eq!(semver.version(&params(3, "master", "")), "1.2.3");
    }

    #[test]
    fn test_custom_version_renders_template() {
        let custom = CustomVersion {
            label_template: "{{branch}}-{{auto}}".to_string(),
        };

        assert_eq!(custom.version(&params(7, "release", "")), "release-7");
    }

    #[test]
    fn test_render_template_substitutes_all_placeholders() {
        let params = params(5, "main", "219aae19153da2b20ac1921d10ba33d6798efd13");

        assert_eq!(
            params.render_template("{{auto}}/{{branch}}/{{revision}}"),
            "5/main/219aae19153da2b20ac1921d10ba33d6798efd13"
        );
    }

    #[test]
    fn test_render_template_unknown_placeholder_returns_error_text() {
        let params = params(5, "main", "abc");

        let rendered = params.render_template("{{branch}}-{{typo}}");

        assert_eq!(rendered, "template: unknown placeholder 'typo'");
    }

    #[test]
    fn test_label_starting_with_digit_gets_placeholder_prefix() {
        let semver = defaulted_semver();

        assert_eq!(semver.label(&params(0, "4-feature", "")), "branch-4-feature");
    }

    #[test]
    fn test_label_starting_with_digit_without_placeholder_gets_generic_prefix() {
        let semver = SemverVersion {
            label_template: "4fix".to_string(),
            ..defaulted_semver()
        };

        assert_eq!(semver.label(&params(0, "main", "")), "label-4fix");
    }

    #[test]
    fn test_tidy_label_lowercases_and_replaces_invalid_characters() {
        assert_eq!(tidy_label("Feature/JIRA-123_cleanup"), "feature-jira-123-cleanup");
    }

    #[test]
    fn test_tidy_label_trims_hyphens_and_leading_digits() {
        assert_eq!(tidy_label("-42-fix-"), "fix");
    }

    #[test]
    fn test_tidy_label_truncates_to_dns_label_length() {
        let long = "a".repeat(80);

        assert_eq!(tidy_label(&long).len(), 63);
    }

    #[test]
    fn test_string_or_string_array_decodes_scalar_and_sequence() {
        let single: StringOrStringArray = serde_yaml::from_str("main").unwrap();
        assert_eq!(single.values, ["main"]);

        let multiple: StringOrStringArray = serde_yaml::from_str("[master, main]").unwrap();
        assert_eq!(multiple.values, ["master", "main"]);

        let empty: StringOrStringArray = serde_yaml::from_str("null").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_string_or_string_array_encodes_single_value_as_scalar() {
        let single = StringOrStringArray::from(vec!["main".to_string()]);
        assert_eq!(serde_yaml::to_string(&single).unwrap(), "main\n");

        let multiple = StringOrStringArray::from(vec!["master".to_string(), "main".to_string()]);
        assert_eq!(
            serde_yaml::to_string(&multiple).unwrap(),
            "- master\n- main\n"
        );
    }
}
