use notation_edit_core::mutation::{AppliedPatch, DeleteDirection, MutationEngine, MutationPath};
use notation_edit_core::parse::CharClasses;
use notation_edit_core::text::LineBuffer;
use notation_edit_core::PitchSystem;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert { at: usize, text: Vec<char> },
    Replace { start: usize, end: usize, text: Vec<char> },
    Backspace { at: usize },
    DeleteForward { at: usize },
}

fn system() -> impl Strategy<Value = PitchSystem> {
    prop::sample::select(vec![PitchSystem::Number, PitchSystem::Western, PitchSystem::Sargam])
}

/// Codepoints a user can type for `system`: its pitch keys plus the shared
/// modifiers and separators
fn notation_char(system: PitchSystem) -> impl Strategy<Value = char> {
    let mut chars = match system {
        PitchSystem::Western => vec!['C', 'D', 'E', 'B', 'a', 'c', 'g'],
        PitchSystem::Sargam => vec!['S', 'r', 'R', 'g', 'm', 'M', 'n', 'N'],
        _ => vec!['1', '2', '5', '7'],
    };
    chars.extend(['-', ' ', '\'', '#', 'b', '/', ':', '|', '\u{0307}', '\u{0323}', '⁵', 'x']);
    prop::sample::select(chars)
}

fn op(system: PitchSystem) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..30, prop::collection::vec(notation_char(system), 1..4))
            .prop_map(|(at, text)| Op::Insert { at, text }),
        (0usize..30, 0usize..30, prop::collection::vec(notation_char(system), 0..3))
            .prop_map(|(start, end, text)| Op::Replace { start, end, text }),
        (0usize..30).prop_map(|at| Op::Backspace { at }),
        (0usize..30).prop_map(|at| Op::DeleteForward { at }),
    ]
}

/// A system with a starting line and an edit sequence typed in it
fn edit_session(max_ops: usize) -> impl Strategy<Value = (PitchSystem, Vec<char>, Vec<Op>)> {
    system().prop_flat_map(move |system| {
        (
            Just(system),
            prop::collection::vec(notation_char(system), 0..12),
            prop::collection::vec(op(system), 1..max_ops),
        )
    })
}

fn engine(system: PitchSystem) -> MutationEngine {
    MutationEngine::new(CharClasses::for_system(system))
}

fn run(eng: &MutationEngine, buf: &mut LineBuffer, op: &Op) -> AppliedPatch {
    let m = match op {
        Op::Insert { at, text } => eng.insert(buf, *at, *at, text),
        Op::Replace { start, end, text } => eng.insert(buf, *start, *end, text),
        Op::Backspace { at } => eng.delete_range(buf, *at, *at, DeleteDirection::Backward),
        Op::DeleteForward { at } => eng.delete_range(buf, *at, *at, DeleteDirection::Forward),
    };
    buf.apply_patch(&m.patch)
}

proptest! {
    /// Replaying the produced patches on a fresh line reproduces the result
    #[test]
    fn patch_replay_reproduces_line((system, _, ops) in edit_session(25)) {
        let eng = engine(system);
        let mut buf = LineBuffer::new();
        let mut patches = Vec::new();
        for op in &ops {
            let applied = run(&eng, &mut buf, op);
            prop_assert!(applied.patch.new_cursor_cp <= buf.len());
            patches.push(applied.patch);
        }

        let mut replay = LineBuffer::new();
        for patch in &patches {
            replay.apply_patch(patch);
        }
        prop_assert_eq!(replay.chars(), buf.chars());
    }

    /// Replaying inverses in reverse restores the starting line
    #[test]
    fn inverse_replay_restores_line((system, initial, ops) in edit_session(20)) {
        let eng = engine(system);
        let mut buf = LineBuffer::from_chars(initial.clone());
        let mut history = Vec::new();
        for op in &ops {
            history.push(run(&eng, &mut buf, op));
        }
        for applied in history.iter().rev() {
            buf.apply_patch(&applied.inverse());
        }
        prop_assert_eq!(buf.chars(), initial.as_slice());
    }

    /// The UTF-16 translation of each patch keeps a host-side mirror in sync
    #[test]
    fn external_patch_mirrors_host_text((system, initial, ops) in edit_session(20)) {
        let eng = engine(system);
        let mut buf = LineBuffer::from_chars(initial);
        let mut mirror: Vec<u16> = buf.text().encode_utf16().collect();
        for op in &ops {
            let applied = run(&eng, &mut buf, op);
            let ext = &applied.external;
            mirror.splice(ext.start..ext.end, ext.text.encode_utf16());
            prop_assert_eq!(String::from_utf16_lossy(&mirror), buf.text());
            prop_assert!(ext.cursor <= mirror.len());
        }
    }

    /// Backspace after a single-key codepoint removes exactly that codepoint
    #[test]
    fn backspace_removes_single_key_codepoint(
        (system, initial, _) in edit_session(2),
        idx in any::<prop::sample::Index>(),
    ) {
        let eng = engine(system);
        prop_assume!(!initial.is_empty());
        let at = idx.index(initial.len()) + 1;
        let prev = initial[at - 1];
        prop_assume!(eng.classes().is_allowlisted(prev));
        // a stray mark after the cursor may merge into whatever precedes it
        prop_assume!(initial.get(at).map_or(true, |c| !eng.classes().is_combining(*c)));

        let mut buf = LineBuffer::from_chars(initial.clone());
        let m = eng.delete_range(&buf, at, at, DeleteDirection::Backward);
        buf.apply_patch(&m.patch);

        let mut expected = initial;
        expected.remove(at - 1);
        prop_assert_eq!(buf.chars(), expected.as_slice());
        prop_assert_eq!(m.patch.new_cursor_cp, at - 1);
    }

    /// A lone non-combining codepoint lands the same way on either path
    #[test]
    fn local_splice_matches_grammar_path(
        (system, initial, _) in edit_session(2),
        at in 0usize..16,
        ch in any::<char>(),
    ) {
        let eng = engine(system);
        prop_assume!(!eng.classes().is_combining(ch) && !ch.is_control());
        let buf = LineBuffer::from_chars(initial);

        let fast = eng.insert(&buf, at, at, &[ch]);
        prop_assert_eq!(fast.path, MutationPath::LocalSplice);
        let slow = eng.insert_via_grammar(&buf, at, at, &[ch]);

        let mut a = buf.clone();
        let mut b = buf.clone();
        a.apply_patch(&fast.patch);
        b.apply_patch(&slow.patch);
        prop_assert_eq!(a.chars(), b.chars());
    }

    /// Rejected grammar input is never lost: the fallback splices it verbatim
    #[test]
    fn fallback_preserves_input(
        (system, input) in system().prop_flat_map(|s| (Just(s), prop::collection::vec(notation_char(s), 1..6))),
    ) {
        let eng = engine(system);
        let mut buf = LineBuffer::new();
        let m = eng.insert_via_grammar(&buf, 0, 0, &input);
        buf.apply_patch(&m.patch);
        if m.path == MutationPath::Fallback {
            prop_assert_eq!(buf.chars(), input.as_slice());
        } else {
            prop_assert!(buf.len() <= input.len());
        }
    }
}

#[test]
fn leading_sharp_falls_back() {
    let eng = engine(PitchSystem::Number);
    let buf = LineBuffer::new();
    let m = eng.insert_via_grammar(&buf, 0, 0, &['#', '1']);
    assert_eq!(m.path, MutationPath::Fallback);
    assert_eq!(m.patch.replacement, vec!['#', '1']);
}

#[test]
fn sargam_sharp_then_backspace_leaves_nothing() {
    let eng = engine(PitchSystem::Sargam);
    let mut buf = LineBuffer::from_chars(vec!['r']);
    run(&eng, &mut buf, &Op::Insert { at: 1, text: vec!['#'] });
    assert_eq!(buf.chars(), &['R']);
    run(&eng, &mut buf, &Op::Backspace { at: 1 });
    assert!(buf.is_empty());
}
