//! Builder configuration and server-side preferences

use super::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selects the build agent a manifest runs on
///
/// The builder's operating system also steers stage defaults: the default
/// shell and the path form of the default working directory differ between
/// linux and windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Builder {
    /// Release track of the builder image.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub track: String,

    /// Operating system the builder runs, `linux` or `windows`.
    #[serde(rename = "os", default, skip_serializing_if = "String::is_empty")]
    pub operating_system: String,
}

impl Builder {
    /// Returns true when no field has been set explicitly.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.track.is_empty() && self.operating_system.is_empty()
    }

    /// Fills unset fields with platform defaults.
    pub fn set_defaults(&mut self, _preferences: &Preferences) {
        if self.track.is_empty() {
            self.track = "stable".to_string();
        }
        if self.operating_system.is_empty() {
            self.operating_system = "linux".to_string();
        }
    }

    pub(crate) fn validate(&self, preferences: &Preferences) -> Result<(), ValidationError> {
        if !preferences
            .builder_operating_systems
            .iter()
            .any(|os| os == &self.operating_system)
        {
            return Err(ValidationError::UnsupportedOperatingSystem {
                operating_system: self.operating_system.clone(),
                supported: preferences.builder_operating_systems.clone(),
            });
        }

        if !preferences
            .builder_tracks
            .iter()
            .any(|track| track == &self.track)
        {
            return Err(ValidationError::UnsupportedTrack {
                track: self.track.clone(),
                supported: preferences.builder_tracks.clone(),
            });
        }

        Ok(())
    }
}

/// Host-supplied knobs for defaulting and validation
///
/// Passed explicitly through every call; the library never holds ambient
/// state. `Preferences::default()` returns the library defaults used when
/// the host passes none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Per-label regex a label value must fully match; labels without an
    /// entry are unchecked.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub label_regexes: BTreeMap<String, String>,

    /// Operating systems builds may run on.
    pub builder_operating_systems: Vec<String>,

    /// Builder tracks builds may select.
    pub builder_tracks: Vec<String>,

    /// Branch a build action targets when the trigger does not name one.
    pub default_branch: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            label_regexes: BTreeMap::new(),
            builder_operating_systems: vec!["linux".to_string(), "windows".to_string()],
            builder_tracks: vec![
                "stable".to_string(),
                "beta".to_string(),
                "dev".to_string(),
            ],
            default_branch: "master".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_builder() -> Builder {
        Builder {
            track: "stable".to_string(),
            operating_system: "linux".to_string(),
        }
    }

    #[test]
    fn test_set_defaults_fills_track_and_os() {
        let mut builder = Builder::default();
        builder.set_defaults(&Preferences::default());

        assert_eq!(builder.track, "stable");
        assert_eq!(builder.operating_system, "linux");
    }

    #[test]
    fn test_set_defaults_keeps_explicit_values() {
        let mut builder = Builder {
            track: "dev".to_string(),
            operating_system: "windows".to_string(),
        };
        builder.set_defaults(&Preferences::default());

        assert_eq!(builder.track, "dev");
        assert_eq!(builder.operating_system, "windows");
    }

    #[test]
    fn test_validate_accepts_defaulted_builder() {
        assert!(linux_builder().validate(&Preferences::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_os() {
        let builder = Builder {
            track: "stable".to_string(),
            operating_system: "plan9".to_string(),
        };

        let result = builder.validate(&Preferences::default());

        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedOperatingSystem { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_track() {
        let builder = Builder {
            track: "nightly".to_string(),
            operating_system: "linux".to_string(),
        };

        let result = builder.validate(&Preferences::default());

        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedTrack { .. })
        ));
    }

    #[test]
    fn test_default_preferences() {
        let preferences = Preferences::default();

        assert_eq!(preferences.default_branch, "master");
        assert_eq!(preferences.builder_operating_systems, ["linux", "windows"]);
        assert_eq!(preferences.builder_tracks, ["stable", "beta", "dev"]);
        assert!(preferences.label_regexes.is_empty());
    }
}
