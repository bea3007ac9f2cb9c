//! Element types and enumerations for musical notation
//!
//! This module defines the element kinds a single codepoint can classify to,
//! the rhythmic properties of each kind, and the supported pitch systems.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Enumeration of all element types a codepoint can be classified as
#[wasm_bindgen]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Musical notes with definite pitch (1, 2#, S, C, etc.)
    PitchedElement = 1,

    /// Rhythmic dash (rest or tie, depending on context)
    UnpitchedElement = 2,

    /// Breath mark (' or ,)
    BreathMark = 3,

    /// Superscript pitch (grace note)
    SuperscriptPitched = 4,

    /// Superscript dash (grace rest)
    SuperscriptUnpitched = 5,

    /// Any other superscript codepoint
    SuperscriptOther = 6,

    /// Whitespace (beat delimiter)
    Whitespace = 7,

    /// Single barline (|)
    SingleBarline = 8,

    /// Double barline (||)
    DoubleBarline = 9,

    /// Left repeat barline (|:)
    RepeatLeftBarline = 10,

    /// Right repeat barline (:|)
    RepeatRightBarline = 11,

    /// Repeat both directions (:|:)
    RepeatBothBarline = 12,

    /// Symbol elements (single non-alphanumeric characters: @, #, !, ?, etc.)
    Symbol = 13,

    /// Text elements that cannot be parsed as musical notation
    Text = 14,
}

/// Role an element plays when a line is exported to a score format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportRole {
    Note,
    RestOrTie,
    BreathMark,
    GraceNotes,
    GraceRest,
    None,
    Structural,
}

// Custom serialization to show both name and value
impl Serialize for ElementKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ElementKind", 2)?;
        state.serialize_field("name", &self.snake_case_name())?;
        state.serialize_field("value", &(*self as u8))?;
        state.end()
    }
}

// Custom deserialization - accepts either number or object format
impl<'de> Deserialize<'de> for ElementKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ElementKindVisitor;

        impl<'de> serde::de::Visitor<'de> for ElementKindVisitor {
            type Value = ElementKind;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("an ElementKind number or object")
            }

            fn visit_u64<E>(self, value: u64) -> Result<ElementKind, E>
            where
                E: serde::de::Error,
            {
                u8::try_from(value)
                    .ok()
                    .and_then(ElementKind::from_u8)
                    .ok_or_else(|| E::custom(format!("invalid ElementKind value: {}", value)))
            }

            fn visit_map<A>(self, mut map: A) -> Result<ElementKind, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut value: Option<u8> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "value" {
                        value = Some(map.next_value()?);
                    } else {
                        map.next_value::<serde::de::IgnoredAny>()?;
                    }
                }
                match value {
                    Some(v) => ElementKind::from_u8(v).ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid ElementKind value: {}", v))
                    }),
                    None => Err(serde::de::Error::missing_field("value")),
                }
            }
        }

        deserializer.deserialize_any(ElementKindVisitor)
    }
}

impl ElementKind {
    pub fn from_u8(value: u8) -> Option<ElementKind> {
        Some(match value {
            1 => ElementKind::PitchedElement,
            2 => ElementKind::UnpitchedElement,
            3 => ElementKind::BreathMark,
            4 => ElementKind::SuperscriptPitched,
            5 => ElementKind::SuperscriptUnpitched,
            6 => ElementKind::SuperscriptOther,
            7 => ElementKind::Whitespace,
            8 => ElementKind::SingleBarline,
            9 => ElementKind::DoubleBarline,
            10 => ElementKind::RepeatLeftBarline,
            11 => ElementKind::RepeatRightBarline,
            12 => ElementKind::RepeatBothBarline,
            13 => ElementKind::Symbol,
            14 => ElementKind::Text,
            _ => return None,
        })
    }

    /// Pitched or unpitched: the only kinds that consume duration
    pub fn is_timed(&self) -> bool {
        matches!(self, ElementKind::PitchedElement | ElementKind::UnpitchedElement)
    }

    pub fn consumes_duration(&self) -> bool {
        self.is_timed()
    }

    /// Timed elements start and terminate beats; separators end them.
    /// Breath marks and superscripts never define a boundary.
    pub fn defines_beat_boundary(&self) -> bool {
        self.is_timed()
    }

    pub fn is_superscript(&self) -> bool {
        matches!(
            self,
            ElementKind::SuperscriptPitched
                | ElementKind::SuperscriptUnpitched
                | ElementKind::SuperscriptOther
        )
    }

    /// Check if this element is any kind of barline
    pub fn is_barline(&self) -> bool {
        matches!(
            self,
            ElementKind::SingleBarline
                | ElementKind::DoubleBarline
                | ElementKind::RepeatLeftBarline
                | ElementKind::RepeatRightBarline
                | ElementKind::RepeatBothBarline
        )
    }

    /// Whitespace, barlines and any other structural codepoint
    pub fn is_beat_separator(&self) -> bool {
        matches!(
            self,
            ElementKind::Whitespace | ElementKind::Symbol | ElementKind::Text
        ) || self.is_barline()
    }

    /// Whether this element carries an underline when it sits inside a beat
    pub fn is_underlined_in_beat(&self) -> bool {
        self.is_timed() || self.is_superscript()
    }

    pub fn export_role(&self) -> ExportRole {
        match self {
            ElementKind::PitchedElement => ExportRole::Note,
            ElementKind::UnpitchedElement => ExportRole::RestOrTie,
            ElementKind::BreathMark => ExportRole::BreathMark,
            ElementKind::SuperscriptPitched => ExportRole::GraceNotes,
            ElementKind::SuperscriptUnpitched => ExportRole::GraceRest,
            ElementKind::SuperscriptOther => ExportRole::None,
            _ => ExportRole::Structural,
        }
    }

    /// Get snake_case name for JSON serialization
    pub fn snake_case_name(&self) -> &'static str {
        match self {
            ElementKind::PitchedElement => "pitched_element",
            ElementKind::UnpitchedElement => "unpitched_element",
            ElementKind::BreathMark => "breath_mark",
            ElementKind::SuperscriptPitched => "superscript_pitched",
            ElementKind::SuperscriptUnpitched => "superscript_unpitched",
            ElementKind::SuperscriptOther => "superscript_other",
            ElementKind::Whitespace => "whitespace",
            ElementKind::SingleBarline => "single_barline",
            ElementKind::DoubleBarline => "double_barline",
            ElementKind::RepeatLeftBarline => "repeat_left_barline",
            ElementKind::RepeatRightBarline => "repeat_right_barline",
            ElementKind::RepeatBothBarline => "repeat_both_barline",
            ElementKind::Symbol => "symbol",
            ElementKind::Text => "text",
        }
    }
}

/// Enumeration of supported pitch systems for musical notation
#[wasm_bindgen]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde_repr::Serialize_repr, serde_repr::Deserialize_repr)]
pub enum PitchSystem {
    /// Number system (1, 2, 3, 4, 5, 6, 7) - default system
    Number = 1,

    /// Western system (c, d, e, f, g, a, b or C, D, E, F, G, A, B)
    Western = 2,

    /// Sargam system (S, r, R, g, G, m, M, P, d, D, n, N)
    Sargam = 3,
}

impl PitchSystem {
    /// Convert the host's numeric pitch system id; unknown ids fall back to Number
    pub fn from_u8(value: u8) -> PitchSystem {
        match value {
            2 => PitchSystem::Western,
            3 => PitchSystem::Sargam,
            _ => PitchSystem::Number,
        }
    }

    /// Get a human-readable name for this pitch system
    pub fn name(&self) -> &'static str {
        match self {
            PitchSystem::Number => "Number",
            PitchSystem::Western => "Western",
            PitchSystem::Sargam => "Sargam",
        }
    }
}

impl Default for PitchSystem {
    fn default() -> Self {
        PitchSystem::Number
    }
}
