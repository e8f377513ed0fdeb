//! Codec helpers for ordered name-keyed manifest sections
//!
//! The `stages`, `releases`, `releaseTemplates` and `bots` sections (and a
//! stage's `parallelStages`) are YAML mappings from a unique name to a body
//! object. Source order is semantically meaningful - it drives validation
//! order and must survive re-serialization - so sections decode to ordered
//! `(name, body)` lists rather than lookup tables. `serde_yaml::Mapping`
//! preserves insertion order on both sides of the codec.

use serde::de::{self, DeserializeOwned};
use serde::ser;
use serde_yaml::{Mapping, Value};

/// Decodes an ordered name-keyed mapping into `(name, body)` pairs.
///
/// A null body (a name with nothing under it) decodes to the default body,
/// matching how a bare `stage:` line is treated.
pub(crate) fn decode<T, E>(section: &Mapping) -> Result<Vec<(String, T)>, E>
where
    T: DeserializeOwned + Default,
    E: de::Error,
{
    let mut items = Vec::with_capacity(section.len());

    for (key, body) in section {
        let name = key
            .as_str()
            .ok_or_else(|| de::Error::custom("section keys must be strings"))?;

        let item = if body.is_null() {
            T::default()
        } else {
            serde_yaml::from_value(body.clone()).map_err(de::Error::custom)?
        };

        items.push((name.to_string(), item));
    }

    Ok(items)
}

/// Re-encodes `(name, body)` pairs into an ordered name-keyed mapping.
pub(crate) fn encode<'a, T, I, E>(items: I) -> Result<Mapping, E>
where
    T: serde::Serialize + 'a,
    I: IntoIterator<Item = (&'a str, &'a T)>,
    E: ser::Error,
{
    let mut section = Mapping::new();

    for (name, item) in items {
        let body = serde_yaml::to_value(item).map_err(ser::Error::custom)?;
        section.insert(Value::from(name), body);
    }

    Ok(section)
}

/// `serde(with = ...)` adapter for stage sections.
///
/// Stage names come from the enclosing mapping key, overwriting whatever a
/// body might claim, and are re-attached as keys on the way out.
pub(crate) mod stage_section {
    use super::super::stage::Stage;
    use super::{Mapping, decode, encode};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Stage>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let section = Mapping::deserialize(deserializer)?;
        let stages = decode::<Stage, D::Error>(&section)?
            .into_iter()
            .map(|(name, mut stage)| {
                stage.name = name;
                stage
            })
            .collect();
        Ok(stages)
    }

    pub(crate) fn serialize<S>(stages: &[Stage], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let section: Mapping =
            encode(stages.iter().map(|stage| (stage.name.as_str(), stage)))?;
        section.serialize(serializer)
    }
}

/// `skip_serializing_if` helper for optional boolean flags.
pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
