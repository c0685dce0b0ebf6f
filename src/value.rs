//! Runtime values — the tagged variant for input sequences, matched
//! fragments, and pipeline results.

use std::fmt;

use serde::Deserialize;

/// A value: an atom, a sequence, or the null value.
///
/// Input sequences, the fragments a match produces, and everything the
/// result pipeline manipulates are `Value`s. Sequences come in three
/// kinds: `List` (arbitrary items), `Str` (characters), and `Vector`
/// (numbers by convention). Lists nest freely.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value — produced by `(? e)` misses and vetoed identities.
    Null,
    /// A symbol atom.
    Sym(String),
    /// A character atom.
    Char(char),
    /// An integer atom.
    Int(i64),
    /// A float atom.
    Float(f64),
    /// A string — a sequence of characters.
    Str(String),
    /// A vector — a sequence of numbers by convention.
    Vector(Vec<Value>),
    /// An ordered sequence of arbitrary items.
    List(Vec<Value>),
}

impl Value {
    /// Build a symbol value.
    pub fn sym(name: impl Into<String>) -> Value {
        Value::Sym(name.into())
    }

    /// Build a list from anything convertible to values.
    pub fn list<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a vector from anything convertible to values.
    pub fn vector<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Vector(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_sym(&self) -> bool {
        matches!(self, Value::Sym(_))
    }

    pub fn is_char(&self) -> bool {
        matches!(self, Value::Char(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// Int or float.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// An integer in `[0, 255]`.
    pub fn is_byte(&self) -> bool {
        matches!(self, Value::Int(n) if (0..=255).contains(n))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Value::Vector(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Str, vector, or list.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Str(_) | Value::Vector(_) | Value::List(_))
    }

    /// Number of elements of a sequence (characters for `Str`).
    /// `None` for non-sequences.
    pub fn seq_len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Vector(items) | Value::List(items) => Some(items.len()),
            _ => None,
        }
    }

    /// The `i`-th element of a sequence as a value (string positions
    /// yield `Char`). `None` for non-sequences and out-of-range indices.
    pub fn seq_child(&self, i: usize) -> Option<Value> {
        match self {
            Value::Str(s) => s.chars().nth(i).map(Value::Char),
            Value::Vector(items) | Value::List(items) => items.get(i).cloned(),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Value {
        Value::Char(c)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Float(x)
    }
}

impl fmt::Display for Value {
    /// Canonical literal form: symbols bare, strings quoted, chars as
    /// `#\c`, lists as `(a b c)`, vectors as `[1 2 3]`, null as `nil`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "nil"),
            Value::Sym(name) => write!(f, "{name}"),
            Value::Char(' ') => write!(f, "#\\space"),
            Value::Char('\t') => write!(f, "#\\tab"),
            Value::Char('\n') => write!(f, "#\\newline"),
            Value::Char(c) => write!(f, "#\\{c}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Vector(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Sym(name) => serializer.serialize_str(name),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Vector(items) | Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    /// Self-describing formats map onto values: sequences become `List`,
    /// strings `Str`, integers `Int`, floats `Float`, null `Null`.
    /// Maps and booleans have no value form and are rejected.
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> serde::de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a scalar, string, sequence, or null")
            }

            fn visit_i64<E>(self, n: i64) -> Result<Value, E> {
                Ok(Value::Int(n))
            }

            fn visit_u64<E>(self, n: u64) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(n)
                    .map(Value::Int)
                    .map_err(|_| E::custom("integer out of range"))
            }

            fn visit_f64<E>(self, x: f64) -> Result<Value, E> {
                Ok(Value::Float(x))
            }

            fn visit_char<E>(self, c: char) -> Result<Value, E> {
                Ok(Value::Char(c))
            }

            fn visit_str<E>(self, s: &str) -> Result<Value, E> {
                Ok(Value::Str(s.to_string()))
            }

            fn visit_string<E>(self, s: String) -> Result<Value, E> {
                Ok(Value::Str(s))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Value::deserialize(deserializer)
            }

            fn visit_bool<E>(self, _: bool) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Err(E::custom("booleans have no value form"))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<A>(self, _: A) -> Result<Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                use serde::de::Error;
                Err(A::Error::custom("maps have no value form"))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_predicates() {
        assert!(Value::sym("a").is_sym());
        assert!(Value::Char('x').is_char());
        assert!(Value::Int(3).is_int());
        assert!(Value::Float(1.5).is_float());
        assert!(Value::Int(3).is_number());
        assert!(Value::Float(1.5).is_number());
        assert!(!Value::sym("a").is_number());
        assert!(Value::Str("ab".into()).is_str());
        assert!(Value::vector([1i64, 2]).is_vector());
        assert!(Value::list(["a", "b"]).is_list());
        assert!(Value::Null.is_null());
    }

    #[test]
    fn byte_range() {
        assert!(Value::Int(0).is_byte());
        assert!(Value::Int(255).is_byte());
        assert!(!Value::Int(-1).is_byte());
        assert!(!Value::Int(256).is_byte());
        assert!(!Value::Float(1.0).is_byte());
    }

    #[test]
    fn sequence_predicate() {
        assert!(Value::Str("a".into()).is_sequence());
        assert!(Value::vector([1i64]).is_sequence());
        assert!(Value::list(["a"]).is_sequence());
        assert!(!Value::Int(1).is_sequence());
        assert!(!Value::Null.is_sequence());
    }

    #[test]
    fn seq_len_counts_chars() {
        assert_eq!(Value::Str("abc".into()).seq_len(), Some(3));
        assert_eq!(Value::list(["a", "b"]).seq_len(), Some(2));
        assert_eq!(Value::vector([1i64, 2, 3]).seq_len(), Some(3));
        assert_eq!(Value::Int(1).seq_len(), None);
    }

    #[test]
    fn seq_child_of_string_is_char() {
        let s = Value::Str("abc".into());
        assert_eq!(s.seq_child(0), Some(Value::Char('a')));
        assert_eq!(s.seq_child(2), Some(Value::Char('c')));
        assert_eq!(s.seq_child(3), None);
    }

    #[test]
    fn seq_child_of_list() {
        let l = Value::list([Value::sym("a"), Value::Int(2)]);
        assert_eq!(l.seq_child(0), Some(Value::sym("a")));
        assert_eq!(l.seq_child(1), Some(Value::Int(2)));
        assert_eq!(l.seq_child(2), None);
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from("ab"), Value::Str("ab".to_string()));
        assert_eq!(Value::from('x'), Value::Char('x'));
        assert_eq!(Value::from(7i64), Value::Int(7));
        assert_eq!(Value::from(2.5), Value::Float(2.5));
    }

    #[test]
    fn display_atoms() {
        assert_eq!(format!("{}", Value::sym("hey")), "hey");
        assert_eq!(format!("{}", Value::Char('a')), "#\\a");
        assert_eq!(format!("{}", Value::Char(' ')), "#\\space");
        assert_eq!(format!("{}", Value::Int(-3)), "-3");
        assert_eq!(format!("{}", Value::Str("ab".into())), "\"ab\"");
        assert_eq!(format!("{}", Value::Null), "nil");
    }

    #[test]
    fn display_sequences() {
        let l = Value::list([Value::sym("a"), Value::list([Value::Int(1), Value::Int(2)])]);
        assert_eq!(format!("{l}"), "(a (1 2))");
        let v = Value::vector([1i64, 2, 3]);
        assert_eq!(format!("{v}"), "[1 2 3]");
    }

    #[test]
    fn deserialize_yaml_sequence() {
        let v: Value = serde_yml::from_str("- a\n- 2\n- [1, 2]\n").unwrap();
        assert_eq!(
            v,
            Value::list([
                Value::Str("a".into()),
                Value::Int(2),
                Value::list([Value::Int(1), Value::Int(2)]),
            ])
        );
    }

    #[test]
    fn deserialize_rejects_maps() {
        let result: Result<Value, _> = serde_yml::from_str("a: 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn serialize_round_trip_shape() {
        let v = Value::list([Value::Int(1), Value::Str("x".into())]);
        let text = serde_yml::to_string(&v).unwrap();
        let back: Value = serde_yml::from_str(&text).unwrap();
        assert_eq!(back, v);
    }
}
