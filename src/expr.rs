//! The rule-expression algebra.
//!
//! A `RuleExpr` is a recursive value describing what to match: literal
//! atoms, typed wildcards, rule references, and the combinators that
//! compose them. `expr_summary` renders the canonical surface form used
//! by trace output and error messages.

use std::fmt;

use crate::error::Error;
use crate::value::Value;

/// Bounds of a `(rep k e)` repetition, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepBounds {
    pub min: usize,
    pub max: usize,
}

impl RepBounds {
    /// Exactly `n` repetitions (`(rep n e)`).
    pub fn exactly(n: usize) -> RepBounds {
        RepBounds { min: n, max: n }
    }

    /// `0..=max` repetitions (`(rep (max) e)`).
    pub fn at_most(max: usize) -> RepBounds {
        RepBounds { min: 0, max }
    }

    /// `min..=max` repetitions (`(rep (min max) e)`). A minimum above
    /// the maximum can never be satisfied and is rejected.
    pub fn between(min: usize, max: usize) -> Result<RepBounds, Error> {
        if min > max {
            return Err(Error::IllegalRepetition(format!(
                "minimum {min} exceeds maximum {max}"
            )));
        }
        Ok(RepBounds { min, max })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    /// `'name` — a quoted symbol literal.
    Sym(String),
    /// `#\c` — a character literal.
    Char(char),
    /// An integer literal.
    Int(i64),
    /// A float literal.
    Float(f64),
    /// `"chars"` — a string literal.
    Str(String),
    /// `[n …]` — a vector literal (numbers only).
    Vector(Vec<Value>),
    /// `char` — any character.
    AnyChar,
    /// `byte` — an integer in `[0, 255]`.
    AnyByte,
    /// `symbol` — any symbol.
    AnySym,
    /// `form` — any item at all.
    AnyForm,
    /// `list` — any list.
    AnyList,
    /// `vector` — any vector.
    AnyVector,
    /// `number` — any int or float.
    AnyNumber,
    /// `string` — any string.
    AnyStr,
    /// `name` or `(name arg…)` — a rule reference. A no-argument
    /// reference to a formal parameter in scope dispatches at match
    /// time instead.
    Call(String, Vec<RuleExpr>),
    /// `(or e…)` — ordered choice, first success wins.
    Or(Vec<RuleExpr>),
    /// `(and e…)` — ordered sequence.
    And(Vec<RuleExpr>),
    /// `(and~ e…)` — unordered sequence, each child exactly once.
    AndUnordered(Vec<RuleExpr>),
    /// `(not e)` — the inner expression must fail; consumes one item.
    Not(Box<RuleExpr>),
    /// `(* e)` — zero or more, greedy.
    Star(Box<RuleExpr>),
    /// `(+ e)` — one or more, greedy.
    Plus(Box<RuleExpr>),
    /// `(rep k e)` — bounded repetition, greedy.
    Rep(RepBounds, Box<RuleExpr>),
    /// `(? e)` — optional; null value on a miss.
    Opt(Box<RuleExpr>),
    /// `(& e)` — look-ahead; succeeds without consuming.
    Ahead(Box<RuleExpr>),
    /// `(! e)` — negative look-ahead; the inner expression must fail,
    /// returns the item under the cursor without consuming.
    BehindNot(Box<RuleExpr>),
    /// `(list e)` — the current item must be a list whose entire
    /// contents match the inner expression.
    DescendList(Box<RuleExpr>),
    /// `(string e)` — as `(list e)` for strings.
    DescendStr(Box<RuleExpr>),
    /// `(vector e)` — as `(list e)` for vectors.
    DescendVector(Box<RuleExpr>),
}

/// Render the canonical surface form of an expression.
pub fn expr_summary(expr: &RuleExpr) -> String {
    match expr {
        RuleExpr::Sym(name) => format!("'{name}"),
        RuleExpr::Char(c) => format!("{}", Value::Char(*c)),
        RuleExpr::Int(n) => n.to_string(),
        RuleExpr::Float(x) => x.to_string(),
        RuleExpr::Str(s) => format!("{s:?}"),
        RuleExpr::Vector(items) => format!("{}", Value::Vector(items.clone())),
        RuleExpr::AnyChar => "char".to_string(),
        RuleExpr::AnyByte => "byte".to_string(),
        RuleExpr::AnySym => "symbol".to_string(),
        RuleExpr::AnyForm => "form".to_string(),
        RuleExpr::AnyList => "list".to_string(),
        RuleExpr::AnyVector => "vector".to_string(),
        RuleExpr::AnyNumber => "number".to_string(),
        RuleExpr::AnyStr => "string".to_string(),
        RuleExpr::Call(name, args) => {
            if args.is_empty() {
                name.clone()
            } else {
                format!("({name} {})", summaries(args))
            }
        }
        RuleExpr::Or(alts) => format!("(or {})", summaries(alts)),
        RuleExpr::And(items) => format!("(and {})", summaries(items)),
        RuleExpr::AndUnordered(items) => format!("(and~ {})", summaries(items)),
        RuleExpr::Not(inner) => format!("(not {})", expr_summary(inner)),
        RuleExpr::Star(inner) => format!("(* {})", expr_summary(inner)),
        RuleExpr::Plus(inner) => format!("(+ {})", expr_summary(inner)),
        RuleExpr::Rep(bounds, inner) => {
            let k = if bounds.min == bounds.max {
                bounds.min.to_string()
            } else if bounds.min == 0 {
                format!("({})", bounds.max)
            } else {
                format!("({} {})", bounds.min, bounds.max)
            };
            format!("(rep {k} {})", expr_summary(inner))
        }
        RuleExpr::Opt(inner) => format!("(? {})", expr_summary(inner)),
        RuleExpr::Ahead(inner) => format!("(& {})", expr_summary(inner)),
        RuleExpr::BehindNot(inner) => format!("(! {})", expr_summary(inner)),
        RuleExpr::DescendList(inner) => format!("(list {})", expr_summary(inner)),
        RuleExpr::DescendStr(inner) => format!("(string {})", expr_summary(inner)),
        RuleExpr::DescendVector(inner) => format!("(vector {})", expr_summary(inner)),
    }
}

fn summaries(exprs: &[RuleExpr]) -> String {
    exprs
        .iter()
        .map(expr_summary)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for RuleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", expr_summary(self))
    }
}
