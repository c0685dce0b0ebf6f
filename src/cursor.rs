//! Tree cursor — a value-semantic position into a nested sequence.
//!
//! A cursor is a non-empty list of indices `[i0, i1, …, ik]`: descend
//! into child `i0` of the root, then child `i1` of that, and point at
//! position `ik` inside the deepest sequence reached. The final index
//! may be one past the last element (end-of-sequence is representable
//! but not readable). Every operation returns a new cursor; the engine
//! reads the input only through cursors.

use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    indices: Vec<usize>,
}

impl Cursor {
    /// A depth-1 cursor pointing at `start` in the top-level sequence.
    pub fn root(start: usize) -> Cursor {
        Cursor {
            indices: vec![start],
        }
    }

    /// The deepest index.
    pub fn last(&self) -> usize {
        *self.indices.last().expect("cursor is never empty")
    }

    /// Nesting depth (1 = top level).
    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    /// The sequence containing the element under the cursor: the result
    /// of following every index but the last. `None` when some interior
    /// index is out of range or addresses a non-sequence.
    pub fn container<'a>(&self, input: &'a Value) -> Option<&'a Value> {
        let mut node = input;
        for &i in &self.indices[..self.indices.len() - 1] {
            node = match node {
                Value::List(items) => items.get(i)?,
                // Vector and Str elements are scalars, so a deeper index
                // can never resolve through them.
                _ => return None,
            };
        }
        node.is_sequence().then_some(node)
    }

    /// Length of the sequence containing the element under the cursor.
    pub fn container_len(&self, input: &Value) -> Option<usize> {
        self.container(input)?.seq_len()
    }

    /// True iff every index addresses a readable element.
    pub fn valid(&self, input: &Value) -> bool {
        self.item(input).is_some()
    }

    /// The element under the cursor (string positions yield `Char`).
    /// `None` when the cursor is not valid.
    pub fn item(&self, input: &Value) -> Option<Value> {
        self.container(input)?.seq_child(self.last())
    }

    /// Cursor with its last index advanced by `n`.
    pub fn step(&self, n: usize) -> Cursor {
        let mut indices = self.indices.clone();
        *indices.last_mut().expect("cursor is never empty") += n;
        Cursor { indices }
    }

    /// Enter the current element as a sub-sequence: append index 0.
    pub fn descend(&self) -> Cursor {
        let mut indices = self.indices.clone();
        indices.push(0);
        Cursor { indices }
    }

    /// Drop the last index and step by 1 in the parent. `None` at
    /// depth 1.
    pub fn ascend(&self) -> Option<Cursor> {
        if self.indices.len() < 2 {
            return None;
        }
        let mut indices = self.indices[..self.indices.len() - 1].to_vec();
        *indices.last_mut().expect("depth checked above") += 1;
        Some(Cursor { indices })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, idx) in self.indices.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `(a (b "cd") [1 2])`
    fn nested() -> Value {
        Value::list([
            Value::sym("a"),
            Value::list([Value::sym("b"), Value::Str("cd".into())]),
            Value::vector([1i64, 2]),
        ])
    }

    #[test]
    fn root_reads_top_level() {
        let input = nested();
        let p = Cursor::root(0);
        assert!(p.valid(&input));
        assert_eq!(p.item(&input), Some(Value::sym("a")));
        assert_eq!(p.container_len(&input), Some(3));
    }

    #[test]
    fn end_of_sequence_is_representable_but_not_valid() {
        let input = nested();
        let p = Cursor::root(3);
        assert!(!p.valid(&input));
        assert_eq!(p.item(&input), None);
        // The containing sequence still resolves.
        assert_eq!(p.container_len(&input), Some(3));
    }

    #[test]
    fn step_advances_last_index() {
        let input = nested();
        let p = Cursor::root(0).step(1);
        assert_eq!(p.item(&input), Some(nested().seq_child(1).unwrap()));
        assert_eq!(p.last(), 1);
        assert_eq!(p.step(2).last(), 3);
    }

    #[test]
    fn descend_into_list() {
        let input = nested();
        let p = Cursor::root(1).descend();
        assert_eq!(p.depth(), 2);
        assert_eq!(p.item(&input), Some(Value::sym("b")));
        assert_eq!(p.container_len(&input), Some(2));
    }

    #[test]
    fn descend_into_string_yields_chars() {
        let input = nested();
        let p = Cursor::root(1).descend().step(1).descend();
        assert_eq!(p.item(&input), Some(Value::Char('c')));
        assert_eq!(p.step(1).item(&input), Some(Value::Char('d')));
        assert_eq!(p.container_len(&input), Some(2));
    }

    #[test]
    fn descend_into_vector() {
        let input = nested();
        let p = Cursor::root(2).descend();
        assert_eq!(p.item(&input), Some(Value::Int(1)));
    }

    #[test]
    fn ascend_steps_in_parent() {
        let input = nested();
        let p = Cursor::root(1).descend();
        let up = p.ascend().unwrap();
        assert_eq!(up, Cursor::root(2));
        assert_eq!(up.item(&input), Some(nested().seq_child(2).unwrap()));
    }

    #[test]
    fn ascend_at_top_level_is_none() {
        assert_eq!(Cursor::root(0).ascend(), None);
    }

    #[test]
    fn descend_through_scalar_is_invalid() {
        let input = nested();
        let p = Cursor::root(0).descend();
        assert!(!p.valid(&input));
        assert_eq!(p.container(&input), None);
    }

    #[test]
    fn operations_return_new_cursors() {
        let p = Cursor::root(0);
        let _ = p.step(1);
        let _ = p.descend();
        assert_eq!(p, Cursor::root(0));
    }

    #[test]
    fn display_joins_indices() {
        assert_eq!(format!("{}", Cursor::root(2)), "[2]");
        assert_eq!(format!("{}", Cursor::root(1).descend().step(3)), "[1.3]");
    }
}
