// PitchCode enum - all possible musical pitches

use serde::{Deserialize, Serialize};

/// Represents the type of accidental applied to a pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccidentalType {
    None,
    Sharp,
    Flat,
    HalfFlat,
    DoubleSharp,
    DoubleFlat,
}

/// A scale degree (1-7) with its accidental.
///
/// Variants are grouped by accidental in blocks of seven, so
/// `group * 7 + (degree - 1)` is the discriminant.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchCode {
    // Naturals (7)
    N1, N2, N3, N4, N5, N6, N7,
    // Sharps (7)
    N1s, N2s, N3s, N4s, N5s, N6s, N7s,
    // Flats (7)
    N1b, N2b, N3b, N4b, N5b, N6b, N7b,
    // Double sharps (7)
    N1ss, N2ss, N3ss, N4ss, N5ss, N6ss, N7ss,
    // Double flats (7)
    N1bb, N2bb, N3bb, N4bb, N5bb, N6bb, N7bb,
    // Half-flats (7)
    N1hf, N2hf, N3hf, N4hf, N5hf, N6hf, N7hf,
}

use PitchCode::*;

const ALL: [PitchCode; 42] = [
    N1, N2, N3, N4, N5, N6, N7,
    N1s, N2s, N3s, N4s, N5s, N6s, N7s,
    N1b, N2b, N3b, N4b, N5b, N6b, N7b,
    N1ss, N2ss, N3ss, N4ss, N5ss, N6ss, N7ss,
    N1bb, N2bb, N3bb, N4bb, N5bb, N6bb, N7bb,
    N1hf, N2hf, N3hf, N4hf, N5hf, N6hf, N7hf,
];

const GROUPS: [AccidentalType; 6] = [
    AccidentalType::None,
    AccidentalType::Sharp,
    AccidentalType::Flat,
    AccidentalType::DoubleSharp,
    AccidentalType::DoubleFlat,
    AccidentalType::HalfFlat,
];

impl PitchCode {
    /// Build a pitch code from a degree (1-7) and an accidental
    pub fn from_parts(degree: u8, accidental: AccidentalType) -> Option<PitchCode> {
        if !(1..=7).contains(&degree) {
            return None;
        }
        let group = GROUPS.iter().position(|g| *g == accidental)?;
        Some(ALL[group * 7 + (degree as usize - 1)])
    }

    /// Get the degree (1-7) of this pitch
    pub fn degree(&self) -> u8 {
        (*self as u8) % 7 + 1
    }

    /// Get the type of accidental applied to this pitch (sharp, flat, etc.)
    pub fn accidental_type(&self) -> AccidentalType {
        GROUPS[(*self as u8 / 7) as usize]
    }

    /// Convert this pitch to its natural form (remove accidentals)
    pub fn to_natural(&self) -> PitchCode {
        ALL[(self.degree() - 1) as usize]
    }

    fn with_accidental(&self, accidental: AccidentalType) -> PitchCode {
        ALL[GROUPS.iter().position(|g| *g == accidental).unwrap_or(0) * 7 + (self.degree() - 1) as usize]
    }

    /// Apply a typed sharp sign
    /// - Natural → Sharp, Sharp → Double sharp
    /// - Flat → Natural (sharp cancels flat)
    pub fn apply_sharp(&self) -> Option<PitchCode> {
        match self.accidental_type() {
            AccidentalType::None => Some(self.with_accidental(AccidentalType::Sharp)),
            AccidentalType::Sharp => Some(self.with_accidental(AccidentalType::DoubleSharp)),
            AccidentalType::Flat => Some(self.to_natural()),
            _ => None,
        }
    }

    /// Apply a typed flat sign
    /// - Natural → Flat, Flat → Double flat
    /// - Sharp → Natural (flat cancels sharp)
    pub fn apply_flat(&self) -> Option<PitchCode> {
        match self.accidental_type() {
            AccidentalType::None => Some(self.with_accidental(AccidentalType::Flat)),
            AccidentalType::Flat => Some(self.with_accidental(AccidentalType::DoubleFlat)),
            AccidentalType::Sharp => Some(self.to_natural()),
            _ => None,
        }
    }

    /// Apply a slash to a flat pitch (half-flat)
    pub fn apply_half_flat(&self) -> Option<PitchCode> {
        match self.accidental_type() {
            AccidentalType::Flat => Some(self.with_accidental(AccidentalType::HalfFlat)),
            _ => None,
        }
    }

    /// Remove the most recently typed accidental sign, one level at a time
    pub fn peel_accidental(&self) -> Option<PitchCode> {
        let peeled = match self.accidental_type() {
            AccidentalType::None => return None,
            AccidentalType::Sharp | AccidentalType::Flat => AccidentalType::None,
            AccidentalType::DoubleSharp => AccidentalType::Sharp,
            AccidentalType::DoubleFlat | AccidentalType::HalfFlat => AccidentalType::Flat,
        };
        Some(self.with_accidental(peeled))
    }
}
