//! Codepoint classification
//!
//! Maps a single codepoint to its `ElementKind` and provides the two
//! per-pitch-system sets the mutation engine consults:
//! - simple: codepoints that can be spliced into a line as-is
//! - combining: codepoints that modify their left neighbour and always go
//!   through the grammar-aware mutator
//!
//! The sets are built once per pitch system and handed out by reference;
//! switching pitch systems re-fetches them.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;

use crate::models::glyphs::{
    self, BARLINE_DOUBLE, BARLINE_REPEAT_BOTH, BARLINE_REPEAT_LEFT, BARLINE_REPEAT_RIGHT,
    BARLINE_SINGLE,
};
use crate::models::{ElementKind, PitchSystem};

pub const SHARP: char = '#';
pub const FLAT: char = 'b';
pub const HALF_FLAT: char = '/';
pub const COLON: char = ':';
pub const PIPE: char = '|';
/// Combining dot above: raise octave
pub const OCTAVE_UP: char = '\u{0307}';
/// Combining dot below: lower octave
pub const OCTAVE_DOWN: char = '\u{0323}';

const COMBINING: [char; 8] = [
    SHARP, FLAT, HALF_FLAT, COLON, PIPE, BARLINE_SINGLE, OCTAVE_UP, OCTAVE_DOWN,
];

/// Marks that have no meaning without a host element to their left
const NEVER_ALONE: [char; 4] = [SHARP, HALF_FLAT, OCTAVE_UP, OCTAVE_DOWN];

const NON_PITCH_SIMPLE: [char; 4] = ['-', ' ', '\'', ','];

/// Classify one codepoint in the context of a pitch system
pub fn classify(ch: char, system: PitchSystem) -> ElementKind {
    if glyphs::is_superscript(ch) {
        return if glyphs::superscript_pitch(ch).is_some() {
            ElementKind::SuperscriptPitched
        } else if glyphs::is_superscript_dash(ch) {
            ElementKind::SuperscriptUnpitched
        } else {
            ElementKind::SuperscriptOther
        };
    }

    if glyphs::pitch_from_codepoint(ch, system).is_some() {
        return ElementKind::PitchedElement;
    }

    match ch {
        '-' => ElementKind::UnpitchedElement,
        '\'' | ',' => ElementKind::BreathMark,
        PIPE | BARLINE_SINGLE => ElementKind::SingleBarline,
        BARLINE_DOUBLE => ElementKind::DoubleBarline,
        BARLINE_REPEAT_LEFT => ElementKind::RepeatLeftBarline,
        BARLINE_REPEAT_RIGHT => ElementKind::RepeatRightBarline,
        BARLINE_REPEAT_BOTH => ElementKind::RepeatBothBarline,
        c if c.is_whitespace() => ElementKind::Whitespace,
        c if c.is_alphanumeric() => ElementKind::Text,
        _ => ElementKind::Symbol,
    }
}

/// Check whether a mark can only exist merged into a host element
pub fn is_never_alone(ch: char) -> bool {
    NEVER_ALONE.contains(&ch)
}

/// Classification sets for one pitch system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClasses {
    system: PitchSystem,
    simple: BTreeSet<char>,
    combining: BTreeSet<char>,
}

static NUMBER_CLASSES: Lazy<CharClasses> = Lazy::new(|| CharClasses::build(PitchSystem::Number));
static WESTERN_CLASSES: Lazy<CharClasses> = Lazy::new(|| CharClasses::build(PitchSystem::Western));
static SARGAM_CLASSES: Lazy<CharClasses> = Lazy::new(|| CharClasses::build(PitchSystem::Sargam));

impl CharClasses {
    /// Get the (cached) classification sets for a pitch system
    pub fn for_system(system: PitchSystem) -> &'static CharClasses {
        match system {
            PitchSystem::Number => &NUMBER_CLASSES,
            PitchSystem::Western => &WESTERN_CLASSES,
            PitchSystem::Sargam => &SARGAM_CLASSES,
        }
    }

    fn build(system: PitchSystem) -> CharClasses {
        let combining: BTreeSet<char> = COMBINING.iter().copied().collect();
        let pitch_chars: Vec<char> = match system {
            PitchSystem::Number => ('1'..='7').collect(),
            PitchSystem::Western => "CDEFGABcdefgab".chars().collect(),
            PitchSystem::Sargam => "SrRgGmMPdDnN".chars().collect(),
        };
        let simple = pitch_chars
            .into_iter()
            .chain(NON_PITCH_SIMPLE)
            .filter(|c| !combining.contains(c))
            .collect();

        CharClasses {
            system,
            simple,
            combining,
        }
    }

    pub fn system(&self) -> PitchSystem {
        self.system
    }

    /// Whether a single typed codepoint can be spliced without the grammar.
    ///
    /// Codepoints outside both sets (text, symbols, Unicode superscripts)
    /// splice as-is too; only combining marks and control characters don't.
    pub fn is_simple(&self, ch: char) -> bool {
        self.simple.contains(&ch) || !(self.combining.contains(&ch) || ch.is_control())
    }

    /// Whether `ch` is on the explicit allowlist (typed as one key)
    pub fn is_allowlisted(&self, ch: char) -> bool {
        self.simple.contains(&ch)
    }

    pub fn is_combining(&self, ch: char) -> bool {
        self.combining.contains(&ch)
    }

    /// The explicit allowlist, in codepoint order
    pub fn simple_chars(&self) -> Vec<char> {
        self.simple.iter().copied().collect()
    }

    pub fn combining_chars(&self) -> Vec<char> {
        self.combining.iter().copied().collect()
    }

    pub fn classify(&self, ch: char) -> ElementKind {
        classify(ch, self.system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basic_number() {
        let sys = PitchSystem::Number;
        assert_eq!(classify('1', sys), ElementKind::PitchedElement);
        assert_eq!(classify('\u{E019}', sys), ElementKind::PitchedElement);
        assert_eq!(classify('-', sys), ElementKind::UnpitchedElement);
        assert_eq!(classify('\'', sys), ElementKind::BreathMark);
        assert_eq!(classify(' ', sys), ElementKind::Whitespace);
        assert_eq!(classify('|', sys), ElementKind::SingleBarline);
        assert_eq!(classify(BARLINE_REPEAT_BOTH, sys), ElementKind::RepeatBothBarline);
        assert_eq!(classify('x', sys), ElementKind::Text);
        assert_eq!(classify('8', sys), ElementKind::Text);
        assert_eq!(classify('#', sys), ElementKind::Symbol);
    }

    #[test]
    fn test_classify_superscripts() {
        let sys = PitchSystem::Number;
        assert_eq!(classify('⁵', sys), ElementKind::SuperscriptPitched);
        assert_eq!(classify('\u{F8000}', sys), ElementKind::SuperscriptPitched);
        assert_eq!(classify('⁻', sys), ElementKind::SuperscriptUnpitched);
        assert_eq!(classify(glyphs::SUPERSCRIPT_DASH, sys), ElementKind::SuperscriptUnpitched);
        assert_eq!(classify('⁰', sys), ElementKind::SuperscriptOther);
    }

    #[test]
    fn test_classification_depends_on_system() {
        assert_eq!(classify('S', PitchSystem::Sargam), ElementKind::PitchedElement);
        assert_eq!(classify('S', PitchSystem::Number), ElementKind::Text);
        assert_eq!(classify('1', PitchSystem::Western), ElementKind::Text);
        assert_eq!(classify('g', PitchSystem::Western), ElementKind::PitchedElement);
    }

    #[test]
    fn test_sets_are_disjoint() {
        for system in [PitchSystem::Number, PitchSystem::Western, PitchSystem::Sargam] {
            let classes = CharClasses::for_system(system);
            for ch in classes.simple_chars() {
                assert!(!classes.is_combining(ch), "{:?} in both sets for {:?}", ch, system);
            }
        }
    }

    #[test]
    fn test_western_b_is_combining_not_simple() {
        let classes = CharClasses::for_system(PitchSystem::Western);
        assert!(classes.is_combining('b'));
        assert!(!classes.is_simple('b'));
        assert!(classes.is_simple('B'));
    }

    #[test]
    fn test_is_simple_fallback() {
        let classes = CharClasses::for_system(PitchSystem::Number);
        assert!(classes.is_simple('1'));
        assert!(classes.is_simple('x'));
        assert!(classes.is_simple('⁵'));
        assert!(!classes.is_simple('#'));
        assert!(!classes.is_simple('\u{0307}'));
        assert!(!classes.is_simple('\n'));
    }

    #[test]
    fn test_for_system_is_cached() {
        let a = CharClasses::for_system(PitchSystem::Sargam);
        let b = CharClasses::for_system(PitchSystem::Sargam);
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.system(), PitchSystem::Sargam);
    }
}
