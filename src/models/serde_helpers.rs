//! Serde serialization helpers for ensuring consistent JSON output

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialize Option<T> as null when None (don't skip the field)
pub fn serialize_option_as_null<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(v),
        None => serializer.serialize_none(),
    }
}

/// `Vec<char>` as an array of numeric codepoints
///
/// JS hosts build strings with `String.fromCodePoint(...cps)`, so patches
/// cross the boundary as `u32` values rather than one-char strings.
pub mod codepoints {
    use super::*;

    pub fn serialize<S>(value: &[char], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(value.iter().map(|c| *c as u32))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<char>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<u32>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|cp| {
                char::from_u32(cp)
                    .ok_or_else(|| D::Error::custom(format!("invalid codepoint: {:#x}", cp)))
            })
            .collect()
    }
}
