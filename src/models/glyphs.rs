//! Codepoint encoding for notation glyphs
//!
//! Pitches with accidentals or octave shifts are stored as single codepoints in
//! the Private Use Area of the NotationFont, so every musical element of a line
//! is exactly one codepoint in the buffer.
//!
//! **Pitch variants** (30 per scale degree):
//! - `base + (degree - 1) × 30 + accidental_index × 5 + octave_index`
//! - accidental order: natural, flat, half-flat, double-flat, double-sharp, sharp
//! - octave order: 0, -2, -1, +1, +2
//!
//! Natural pitches at the base octave keep their plain ASCII character, so the
//! common case of typing a digit or letter never needs a substitution.
//!
//! **Superscripts** (grace notes) live in Supplementary PUA-A at
//! `0xF8000 + (pitch_glyph - 0xE000)`. They are outside the BMP and take two
//! UTF-16 code units in the host text control.
//!
//! **Barlines** are the Unicode Musical Symbols (U+1D100-U+1D108).

use crate::models::elements::PitchSystem;
use crate::models::pitch_code::{AccidentalType, PitchCode};

// ============================================================================
// Barline Unicode Constants
// ============================================================================

/// Single barline: 𝄀 (U+1D100)
pub const BARLINE_SINGLE: char = '\u{1D100}';

/// Double barline: 𝄁 (U+1D101)
pub const BARLINE_DOUBLE: char = '\u{1D101}';

/// Repeat left barline (begin repeat): 𝄆 (U+1D106)
pub const BARLINE_REPEAT_LEFT: char = '\u{1D106}';

/// Repeat right barline (end repeat): 𝄇 (U+1D107)
pub const BARLINE_REPEAT_RIGHT: char = '\u{1D107}';

/// Repeat both (begin and end repeat): 𝄈 (U+1D108)
pub const BARLINE_REPEAT_BOTH: char = '\u{1D108}';

// ============================================================================
// PUA layout
// ============================================================================

pub const NUMBER_PUA_BASE: u32 = 0xE000;
pub const WESTERN_PUA_BASE: u32 = 0xE100;
pub const SARGAM_PUA_BASE: u32 = 0xE200;
pub const VARIANTS_PER_CHARACTER: u32 = 30;
const OCTAVE_VARIANTS: u32 = 5;
const DEGREES: u32 = 7;

pub const SUPERSCRIPT_BASE: u32 = 0xF8000;
/// Superscript dash (grace rest)
pub const SUPERSCRIPT_DASH: char = '\u{F8300}';
const SUPERSCRIPT_END: u32 = 0xFE040;

/// Unicode superscript digits usable as grace notes in any system
const UNICODE_SUPERSCRIPT_DIGITS: [(char, u8); 7] = [
    ('¹', 1), ('²', 2), ('³', 3), ('⁴', 4), ('⁵', 5), ('⁶', 6), ('⁷', 7),
];

const UNICODE_SUPERSCRIPT_MINUS: char = '⁻';

const UNICODE_SUPERSCRIPT_OTHER: [char; 9] = ['⁰', '⁸', '⁹', '⁺', '⁼', '⁽', '⁾', 'ⁿ', 'ⁱ'];

/// Sargam letters with the pitch each one denotes at the base octave
const SARGAM_LETTERS: [(char, PitchCode); 12] = [
    ('S', PitchCode::N1),
    ('r', PitchCode::N2b),
    ('R', PitchCode::N2),
    ('g', PitchCode::N3b),
    ('G', PitchCode::N3),
    ('m', PitchCode::N4),
    ('M', PitchCode::N4s),
    ('P', PitchCode::N5),
    ('d', PitchCode::N6b),
    ('D', PitchCode::N6),
    ('n', PitchCode::N7b),
    ('N', PitchCode::N7),
];

const WESTERN_LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

fn pua_base(system: PitchSystem) -> u32 {
    match system {
        PitchSystem::Number => NUMBER_PUA_BASE,
        PitchSystem::Western => WESTERN_PUA_BASE,
        PitchSystem::Sargam => SARGAM_PUA_BASE,
    }
}

fn accidental_index(accidental: AccidentalType) -> u32 {
    match accidental {
        AccidentalType::None => 0,
        AccidentalType::Flat => 1,
        AccidentalType::HalfFlat => 2,
        AccidentalType::DoubleFlat => 3,
        AccidentalType::DoubleSharp => 4,
        AccidentalType::Sharp => 5,
    }
}

fn accidental_from_index(index: u32) -> Option<AccidentalType> {
    Some(match index {
        0 => AccidentalType::None,
        1 => AccidentalType::Flat,
        2 => AccidentalType::HalfFlat,
        3 => AccidentalType::DoubleFlat,
        4 => AccidentalType::DoubleSharp,
        5 => AccidentalType::Sharp,
        _ => return None,
    })
}

fn octave_index(octave: i8) -> Option<u32> {
    Some(match octave {
        0 => 0,
        -2 => 1,
        -1 => 2,
        1 => 3,
        2 => 4,
        _ => return None,
    })
}

fn octave_from_index(index: u32) -> Option<i8> {
    Some(match index {
        0 => 0,
        1 => -2,
        2 => -1,
        3 => 1,
        4 => 2,
        _ => return None,
    })
}

/// Plain character for a pitch at the base octave, when the system has one
fn ascii_for_pitch(pitch: PitchCode, system: PitchSystem) -> Option<char> {
    match system {
        PitchSystem::Number if pitch.accidental_type() == AccidentalType::None => {
            char::from_digit(pitch.degree() as u32, 10)
        }
        PitchSystem::Western if pitch.accidental_type() == AccidentalType::None => {
            Some(WESTERN_LETTERS[(pitch.degree() - 1) as usize])
        }
        PitchSystem::Sargam => SARGAM_LETTERS
            .iter()
            .find(|(_, p)| *p == pitch)
            .map(|(c, _)| *c),
        _ => None,
    }
}

fn pitch_for_ascii(ch: char, system: PitchSystem) -> Option<PitchCode> {
    match system {
        PitchSystem::Number => match ch {
            '1'..='7' => PitchCode::from_parts(ch as u8 - b'0', AccidentalType::None),
            _ => None,
        },
        PitchSystem::Western => {
            let upper = ch.to_ascii_uppercase();
            WESTERN_LETTERS
                .iter()
                .position(|c| *c == upper)
                .and_then(|i| PitchCode::from_parts(i as u8 + 1, AccidentalType::None))
        }
        PitchSystem::Sargam => SARGAM_LETTERS
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, p)| *p),
    }
}

/// Offset of a pitch glyph inside the PUA pitch region (always the PUA slot,
/// even for pitches that render as plain ASCII)
fn pua_offset(pitch: PitchCode, octave: i8, system: PitchSystem) -> Option<u32> {
    let oi = octave_index(octave)?;
    Some(
        pua_base(system) - NUMBER_PUA_BASE
            + (pitch.degree() as u32 - 1) * VARIANTS_PER_CHARACTER
            + accidental_index(pitch.accidental_type()) * OCTAVE_VARIANTS
            + oi,
    )
}

/// Get the glyph character for a pitch with octave shift
///
/// Returns None if the octave is out of range (-2..=2).
pub fn glyph_for_pitch(pitch: PitchCode, octave: i8, system: PitchSystem) -> Option<char> {
    if octave == 0 {
        if let Some(ch) = ascii_for_pitch(pitch, system) {
            return Some(ch);
        }
    }
    char::from_u32(NUMBER_PUA_BASE + pua_offset(pitch, octave, system)?)
}

/// Decode a PUA pitch glyph into (pitch, octave, system)
fn decode_pua(cp: u32) -> Option<(PitchCode, i8, PitchSystem)> {
    let system = match cp {
        c if (NUMBER_PUA_BASE..NUMBER_PUA_BASE + DEGREES * VARIANTS_PER_CHARACTER).contains(&c) => {
            PitchSystem::Number
        }
        c if (WESTERN_PUA_BASE..WESTERN_PUA_BASE + DEGREES * VARIANTS_PER_CHARACTER).contains(&c) => {
            PitchSystem::Western
        }
        c if (SARGAM_PUA_BASE..SARGAM_PUA_BASE + DEGREES * VARIANTS_PER_CHARACTER).contains(&c) => {
            PitchSystem::Sargam
        }
        _ => return None,
    };
    let rel = cp - pua_base(system);
    let degree = (rel / VARIANTS_PER_CHARACTER + 1) as u8;
    let variant = rel % VARIANTS_PER_CHARACTER;
    let accidental = accidental_from_index(variant / OCTAVE_VARIANTS)?;
    let octave = octave_from_index(variant % OCTAVE_VARIANTS)?;
    Some((PitchCode::from_parts(degree, accidental)?, octave, system))
}

/// Reverse lookup: get pitch, octave and glyph system from a (non-superscript)
/// pitch codepoint.
///
/// Plain characters are interpreted in `system`; PUA glyphs carry their own.
pub fn pitch_from_codepoint(ch: char, system: PitchSystem) -> Option<(PitchCode, i8, PitchSystem)> {
    if let Some(pitch) = pitch_for_ascii(ch, system) {
        return Some((pitch, 0, system));
    }
    decode_pua(ch as u32)
}

/// Check whether a codepoint is any kind of superscript
pub fn is_superscript(ch: char) -> bool {
    let cp = ch as u32;
    (SUPERSCRIPT_BASE..SUPERSCRIPT_END).contains(&cp)
        || UNICODE_SUPERSCRIPT_DIGITS.iter().any(|(c, _)| *c == ch)
        || ch == UNICODE_SUPERSCRIPT_MINUS
        || UNICODE_SUPERSCRIPT_OTHER.contains(&ch)
}

/// Decode a superscript pitch (PUA-A glyph or Unicode superscript digit)
pub fn superscript_pitch(ch: char) -> Option<(PitchCode, i8, PitchSystem)> {
    if let Some((_, degree)) = UNICODE_SUPERSCRIPT_DIGITS.iter().find(|(c, _)| *c == ch) {
        let pitch = PitchCode::from_parts(*degree, AccidentalType::None)?;
        return Some((pitch, 0, PitchSystem::Number));
    }
    let cp = ch as u32;
    if cp < SUPERSCRIPT_BASE {
        return None;
    }
    decode_pua(cp - SUPERSCRIPT_BASE + NUMBER_PUA_BASE)
}

/// Check whether a codepoint is a superscript dash (grace rest)
pub fn is_superscript_dash(ch: char) -> bool {
    ch == SUPERSCRIPT_DASH || ch == UNICODE_SUPERSCRIPT_MINUS
}

/// Superscript glyph for a pitch
pub fn superscript_for_pitch(pitch: PitchCode, octave: i8, system: PitchSystem) -> Option<char> {
    char::from_u32(SUPERSCRIPT_BASE + pua_offset(pitch, octave, system)?)
}

/// Convert a pitch or dash codepoint to its superscript form.
///
/// Codepoints that are already superscript are returned unchanged.
pub fn to_superscript(ch: char, system: PitchSystem) -> Option<char> {
    if is_superscript(ch) {
        return Some(ch);
    }
    if ch == '-' {
        return Some(SUPERSCRIPT_DASH);
    }
    let (pitch, octave, glyph_system) = pitch_from_codepoint(ch, system)?;
    superscript_for_pitch(pitch, octave, glyph_system)
}
