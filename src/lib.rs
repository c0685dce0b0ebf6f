//! seqpeg — a parsing-expression engine over nested sequences.
//!
//! A [`Grammar`] maps rule names to [`RuleDef`]s; a rule body is a
//! [`RuleExpr`] built directly or parsed from canonical surface text
//! (`(and 'hey (* char))`). [`Grammar::parse`] matches a start
//! expression against an input [`Value`] — a list, a string, or a
//! vector, nested arbitrarily — and returns the processed result of the
//! match. Rules can take parameters, carry lexical and inherited
//! bindings, shape their results through a [`PipelineStep`] pipeline,
//! and be traced per rule. Left recursion is detected and reported as a
//! fatal [`Error`] rather than looping.

pub mod cursor;
pub mod engine;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod rules;
pub mod trace;
pub mod value;

pub use cursor::Cursor;
pub use engine::{ParseOptions, Parsed};
pub use error::Error;
pub use expr::{expr_summary, RepBounds, RuleExpr};
pub use parser::parse_expr;
pub use pipeline::{Bindings, PipelineStep};
pub use rules::{with_local_rules, Grammar, RuleDef};
pub use trace::TraceLevel;
pub use value::Value;
