//! Fatal engine errors.
//!
//! Match failure is not an error — it is a value (`Ok(None)`) that
//! propagates silently through the combinators. Everything here aborts
//! the whole parse and surfaces to the caller.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A rule reference names no rule in the active grammar.
    UnknownRule(String),
    /// A rule expression that cannot be evaluated: surface-syntax parse
    /// failure, a reserved word in rule position, or a call whose
    /// argument count does not match the rule's parameters.
    Malformed(String),
    /// A `rep` bound that is not a number or a 1- or 2-element list,
    /// or whose minimum exceeds its maximum.
    IllegalRepetition(String),
    /// A rule reached itself without an intervening cursor advance.
    LeftRecursion {
        rule: String,
        /// Cursor position of the repeated entry, in display form.
        at: String,
    },
    /// The top-level input is not a sequence.
    Input(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownRule(name) => write!(f, "unknown rule '{name}'"),
            Error::Malformed(msg) => write!(f, "malformed rule expression: {msg}"),
            Error::IllegalRepetition(msg) => write!(f, "illegal repetition range: {msg}"),
            Error::LeftRecursion { rule, at } => {
                write!(f, "left recursion detected: rule '{rule}' at {at}")
            }
            Error::Input(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
