//! Model-based checks for the linear history.

use inkmark_history::{History, HistoryConfig, Restore, UndoBoundary};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Record(u32),
    Undo,
    Redo,
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u32>().prop_map(Op::Record),
        3 => Just(Op::Undo),
        2 => Just(Op::Redo),
        1 => Just(Op::Clear),
    ]
}

/// Reference model using the signed cursor directly.
#[derive(Debug)]
struct Model {
    entries: Vec<u32>,
    cursor: isize,
}

impl Model {
    fn new() -> Self {
        Model {
            entries: Vec::new(),
            cursor: -1,
        }
    }

    fn apply(&mut self, op: &Op, allow_empty: bool) {
        let floor = if allow_empty { -1 } else { 0 };
        match op {
            Op::Record(v) => {
                self.entries.truncate((self.cursor + 1) as usize);
                self.entries.push(*v);
                self.cursor = self.entries.len() as isize - 1;
            }
            Op::Undo => {
                if self.cursor > floor {
                    self.cursor -= 1;
                }
            }
            Op::Redo => {
                if self.cursor < self.entries.len() as isize - 1 {
                    self.cursor += 1;
                }
            }
            Op::Clear => {
                self.entries.clear();
                self.cursor = -1;
            }
        }
    }
}

fn run(ops: &[Op], boundary: UndoBoundary) -> Result<(), TestCaseError> {
    let allow_empty = boundary == UndoBoundary::AllowEmpty;
    let mut history = History::with_config(HistoryConfig::default().with_boundary(boundary)).unwrap();
    let mut model = Model::new();

    for op in ops {
        let before = (history.len(), history.position());
        let result = match op {
            Op::Record(v) => {
                history.record(*v);
                None
            }
            Op::Undo => Some(history.undo()),
            Op::Redo => Some(history.redo()),
            Op::Clear => {
                history.clear();
                None
            }
        };
        model.apply(op, allow_empty);

        let len = history.len() as isize;
        let cursor = history.position();
        prop_assert_eq!(history.iter().copied().collect::<Vec<_>>(), model.entries.clone());
        prop_assert_eq!(cursor, model.cursor);
        prop_assert!((-1..len).contains(&cursor));

        let floor = if allow_empty { -1 } else { 0 };
        prop_assert_eq!(history.can_undo(), cursor > floor);
        prop_assert_eq!(history.can_redo(), cursor < len - 1);

        match (op, result) {
            (Op::Record(_), _) => {
                prop_assert_eq!(cursor, len - 1);
            }
            (Op::Undo | Op::Redo, Some(None)) => {
                prop_assert_eq!((history.len(), history.position()), before);
            }
            (Op::Undo | Op::Redo, Some(Some(Restore::Snapshot(v)))) => {
                prop_assert_eq!(Some(&v), history.current());
            }
            (Op::Undo, Some(Some(Restore::Empty))) => {
                prop_assert_eq!(cursor, -1);
            }
            _ => {}
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn keep_first_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        run(&ops, UndoBoundary::KeepFirst)?;
    }

    #[test]
    fn allow_empty_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        run(&ops, UndoBoundary::AllowEmpty)?;
    }

    #[test]
    fn bounded_history_never_exceeds_cap(
        cap in 1usize..8,
        values in prop::collection::vec(any::<u32>(), 0..32),
    ) {
        let mut history = History::with_config(HistoryConfig::default().with_max_states(cap)).unwrap();
        for v in values {
            history.record(v);
            prop_assert!(history.len() <= cap);
            prop_assert_eq!(history.cursor(), Some(history.len() - 1));
            prop_assert_eq!(history.current(), Some(&v));
        }
    }
}

#[test]
fn branch_example_keeps_b_and_drops_c() {
    let mut history = History::new();
    history.record("A");
    history.record("B");
    history.record("C");
    assert_eq!((history.len(), history.position()), (3, 2));

    history.undo();
    assert_eq!(history.position(), 1);

    history.record("D");
    assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec!["A", "B", "D"]);
    assert_eq!((history.len(), history.position()), (3, 2));
}
