use std::cell::{Cell, RefCell};

use arbor_types::{Slice, Value};
use tracing::trace;

struct MemoEntry {
    inputs: Vec<Slice>,
    args: Vec<Value>,
    value: Slice,
}

impl MemoEntry {
    fn matches(&self, inputs: &[Slice], args: &[Value]) -> bool {
        self.inputs.len() == inputs.len()
            && self.inputs.iter().zip(inputs).all(|(a, b)| a.same(b))
            && self.args == args
    }
}

/// Single-entry cache for a selector.
///
/// A cached value is reused while every input is [`same`](Slice::same) as
/// last time and the call arguments are equal.
#[derive(Default)]
pub struct Memo {
    entry: RefCell<Option<MemoEntry>>,
    recomputations: Cell<u64>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &self,
        inputs: Vec<Slice>,
        args: &[Value],
        compute: impl FnOnce(&[Slice], &[Value]) -> Slice,
    ) -> Slice {
        if let Some(entry) = self.entry.borrow().as_ref() {
            if entry.matches(&inputs, args) {
                trace!("memo hit");
                return entry.value.clone();
            }
        }
        trace!("memo miss");
        let value = compute(&inputs, args);
        self.recomputations.set(self.recomputations.get() + 1);
        *self.entry.borrow_mut() = Some(MemoEntry {
            inputs,
            args: args.to_vec(),
            value: value.clone(),
        });
        value
    }

    /// How many times the computation has run.
    pub fn recomputations(&self) -> u64 {
        self.recomputations.get()
    }

    pub fn clear(&self) {
        self.entry.borrow_mut().take();
    }
}

impl std::fmt::Debug for Memo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("cached", &self.entry.borrow().is_some())
            .field("recomputations", &self.recomputations.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn total(inputs: &[Slice], _: &[Value]) -> Slice {
        let sum: i64 = inputs.iter().filter_map(Slice::as_i64).sum();
        Slice::from(sum)
    }

    #[test]
    fn reuses_value_while_inputs_keep_identity() {
        let memo = Memo::new();
        let shared = Slice::from(json!({ "n": 1 }));

        memo.get_or_compute(vec![shared.clone()], &[], |_, _| Slice::from(1));
        memo.get_or_compute(vec![shared.clone()], &[], |_, _| Slice::from(2));
        assert_eq!(memo.recomputations(), 1);

        // Equal content, new identity.
        memo.get_or_compute(vec![Slice::from(json!({ "n": 1 }))], &[], |_, _| Slice::from(3));
        assert_eq!(memo.recomputations(), 2);
    }

    #[test]
    fn primitive_inputs_compare_by_value() {
        let memo = Memo::new();
        let first = memo.get_or_compute(vec![Slice::from(2), Slice::from(3)], &[], total);
        let second = memo.get_or_compute(vec![Slice::from(2), Slice::from(3)], &[], total);
        assert_eq!(first.as_i64(), Some(5));
        assert!(Slice::ptr_eq(&first, &second));
        assert_eq!(memo.recomputations(), 1);
    }

    #[test]
    fn arguments_are_part_of_the_key() {
        let memo = Memo::new();
        memo.get_or_compute(vec![], &[json!(1)], total);
        memo.get_or_compute(vec![], &[json!(1)], total);
        memo.get_or_compute(vec![], &[json!(2)], total);
        assert_eq!(memo.recomputations(), 2);

        memo.clear();
        memo.get_or_compute(vec![], &[json!(2)], total);
        assert_eq!(memo.recomputations(), 3);
    }
}
