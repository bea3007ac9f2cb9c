//! Recursive descent parser for codepoints
//!
//! Works directly on single codepoints, used by the mutation engine for
//! incremental editing.
//!
//! Parser structure:
//! - normalize(ch) → normalized codepoint (e.g., '|' → BARLINE_SINGLE)
//! - try_combine(prev, new) → combined codepoint if they form a unit
//! - peel(ch) → the element with its last modifier removed (backspace)

use crate::models::glyphs::{
    self, BARLINE_DOUBLE, BARLINE_REPEAT_BOTH, BARLINE_REPEAT_LEFT, BARLINE_REPEAT_RIGHT,
    BARLINE_SINGLE,
};
use crate::models::{PitchCode, PitchSystem};
use crate::parse::classify::{COLON, FLAT, HALF_FLAT, OCTAVE_DOWN, OCTAVE_UP, PIPE, SHARP};

const MAX_OCTAVE: i8 = 2;

/// Parse a single codepoint into its normalized form.
///
/// - '|' → BARLINE_SINGLE (U+1D100)
///
/// Most characters pass through unchanged.
pub fn normalize(ch: char) -> char {
    match ch {
        PIPE => BARLINE_SINGLE,
        _ => ch,
    }
}

/// Try to combine two codepoints using recursive descent.
///
/// Tries each production rule in order:
/// 1. Barline combinations (|:, :|, ||, :|:)
/// 2. Pitch + accidental combinations (1#, 2b, 3b/)
/// 3. Pitch + octave mark combinations
///
/// Returns Some(combined) if they combine, None otherwise.
pub fn try_combine(prev: char, new: char, system: PitchSystem) -> Option<char> {
    if let Some(combined) = try_barline(normalize(prev), normalize(new)) {
        return Some(combined);
    }
    try_pitch_modifier(prev, new, system)
}

/// Barline production rules:
/// - BARLINE + COLON → REPEAT_LEFT
/// - COLON + BARLINE → REPEAT_RIGHT
/// - BARLINE + BARLINE → DOUBLE
/// - REPEAT_RIGHT + COLON → REPEAT_BOTH
fn try_barline(prev: char, new: char) -> Option<char> {
    match (prev, new) {
        (BARLINE_SINGLE, COLON) => Some(BARLINE_REPEAT_LEFT),
        (COLON, BARLINE_SINGLE) => Some(BARLINE_REPEAT_RIGHT),
        (BARLINE_SINGLE, BARLINE_SINGLE) => Some(BARLINE_DOUBLE),
        (BARLINE_REPEAT_RIGHT, COLON) => Some(BARLINE_REPEAT_BOTH),
        _ => None,
    }
}

/// A decoded pitch codepoint, remembering how it was encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PitchGlyph {
    pitch: PitchCode,
    octave: i8,
    system: PitchSystem,
    superscript: bool,
}

impl PitchGlyph {
    fn decode(ch: char, system: PitchSystem) -> Option<PitchGlyph> {
        if let Some((pitch, octave, system)) = glyphs::superscript_pitch(ch) {
            return Some(PitchGlyph { pitch, octave, system, superscript: true });
        }
        let (pitch, octave, system) = glyphs::pitch_from_codepoint(ch, system)?;
        Some(PitchGlyph { pitch, octave, system, superscript: false })
    }

    fn encode(&self) -> Option<char> {
        if self.superscript {
            glyphs::superscript_for_pitch(self.pitch, self.octave, self.system)
        } else {
            glyphs::glyph_for_pitch(self.pitch, self.octave, self.system)
        }
    }
}

/// Pitch modifier production rules:
/// - PITCH + SHARP → SHARPED_PITCH
/// - PITCH + FLAT → FLATTED_PITCH
/// - FLAT_PITCH + SLASH → HALF_FLAT_PITCH
/// - PITCH + DOT_ABOVE / DOT_BELOW → octave shifted pitch
fn try_pitch_modifier(prev: char, new: char, system: PitchSystem) -> Option<char> {
    let mut glyph = PitchGlyph::decode(prev, system)?;

    match new {
        SHARP => glyph.pitch = glyph.pitch.apply_sharp()?,
        FLAT => glyph.pitch = glyph.pitch.apply_flat()?,
        HALF_FLAT => glyph.pitch = glyph.pitch.apply_half_flat()?,
        OCTAVE_UP if glyph.octave < MAX_OCTAVE => glyph.octave += 1,
        OCTAVE_DOWN if glyph.octave > -MAX_OCTAVE => glyph.octave -= 1,
        _ => return None,
    }

    glyph.encode()
}

/// Remove the last modifier from a composed element.
///
/// Returns None when the element has nothing left to peel and should be
/// deleted outright.
/// - octave shifts move one step toward the base octave first
/// - then accidentals are removed one level at a time
/// - DOUBLE → SINGLE, REPEAT_LEFT → SINGLE, REPEAT_RIGHT → ':',
///   REPEAT_BOTH → REPEAT_RIGHT
pub fn peel(ch: char, system: PitchSystem) -> Option<char> {
    match ch {
        BARLINE_DOUBLE | BARLINE_REPEAT_LEFT => return Some(BARLINE_SINGLE),
        BARLINE_REPEAT_RIGHT => return Some(COLON),
        BARLINE_REPEAT_BOTH => return Some(BARLINE_REPEAT_RIGHT),
        _ => {}
    }

    let mut glyph = PitchGlyph::decode(ch, system)?;
    if glyph.octave > 0 {
        glyph.octave -= 1;
    } else if glyph.octave < 0 {
        glyph.octave += 1;
    } else {
        glyph.pitch = glyph.pitch.peel_accidental()?;
    }
    glyph.encode()
}
