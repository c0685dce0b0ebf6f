//! The matcher — atom matching, combinator interpretation, rule
//! invocation, and the top-level driver.
//!
//! A match attempt produces `Ok(None)` on silent failure (the caller
//! keeps its cursor — tentative cursors are simply dropped), `Ok(Some)`
//! with the value and the advanced cursor on success, and `Err` only
//! for the fatal conditions: unknown rules, malformed expressions,
//! illegal repetition ranges, and left recursion.

use std::collections::HashMap;

use crate::cursor::Cursor;
use crate::error::Error;
use crate::expr::{RepBounds, RuleExpr};
use crate::parser::parse_expr;
use crate::pipeline::{self, Bindings};
use crate::rules::{Grammar, RuleDef};
use crate::trace::Tracer;
use crate::value::Value;

/// Options for the top-level driver.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Starting offset in the top-level sequence.
    pub start: usize,
    /// Offset the match must reach. Defaults to the input length.
    pub end: Option<usize>,
    /// Allow the match to stop short of `end`.
    pub junk_allowed: bool,
}

/// A successful top-level parse: the processed value and the final
/// top-level offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub value: Value,
    pub end: usize,
}

/// A match attempt: `None` is silent failure.
type Step = Option<(Value, Cursor)>;

/// Formal arguments visible inside a rule body. Each bound expression
/// was substituted at call time, so it carries no references to the
/// caller's own parameters.
#[derive(Default)]
struct Scope {
    args: HashMap<String, RuleExpr>,
}

#[derive(Clone, Copy)]
enum SeqKind {
    List,
    Str,
    Vector,
}

impl Grammar {
    /// Match `start_expr` against `input`. Returns the processed value
    /// and final offset on success, `None` on match failure, and `Err`
    /// on fatal errors.
    pub fn parse(
        &self,
        start_expr: &RuleExpr,
        input: &Value,
        opts: &ParseOptions,
    ) -> Result<Option<Parsed>, Error> {
        let len = input
            .seq_len()
            .ok_or_else(|| Error::Input(format!("expected a sequence, got {input}")))?;

        let mut matcher = Matcher::new(self, input);
        let pos = Cursor::root(opts.start);
        let Some((value, end_pos)) = matcher.match_expr(start_expr, &pos, &Scope::default())?
        else {
            return Ok(None);
        };

        let end_offset = end_pos.last();
        let complete = match opts.end {
            Some(end) => end_offset == end || (opts.junk_allowed && end_offset < end),
            None => end_offset == len || opts.junk_allowed,
        };
        if complete {
            Ok(Some(Parsed {
                value,
                end: end_offset,
            }))
        } else {
            Ok(None)
        }
    }

    /// As `parse`, with the start expression in canonical surface text.
    pub fn parse_str(
        &self,
        start_expr: &str,
        input: &Value,
        opts: &ParseOptions,
    ) -> Result<Option<Parsed>, Error> {
        self.parse(&parse_expr(start_expr)?, input, opts)
    }
}

/// Per-parse state: the binding stack, the per-rule recursion stacks,
/// and the tracer.
struct Matcher<'g> {
    grammar: &'g Grammar,
    input: &'g Value,
    bindings: Bindings,
    active: HashMap<String, Vec<Cursor>>,
    tracer: Tracer,
}

impl<'g> Matcher<'g> {
    fn new(grammar: &'g Grammar, input: &'g Value) -> Matcher<'g> {
        Matcher {
            grammar,
            input,
            bindings: Bindings::new(),
            active: HashMap::new(),
            tracer: Tracer::new(),
        }
    }

    fn match_expr(&mut self, expr: &RuleExpr, pos: &Cursor, scope: &Scope) -> Result<Step, Error> {
        match expr {
            RuleExpr::Sym(_)
            | RuleExpr::Char(_)
            | RuleExpr::Int(_)
            | RuleExpr::Float(_)
            | RuleExpr::Str(_)
            | RuleExpr::Vector(_)
            | RuleExpr::AnyChar
            | RuleExpr::AnyByte
            | RuleExpr::AnySym
            | RuleExpr::AnyForm
            | RuleExpr::AnyList
            | RuleExpr::AnyVector
            | RuleExpr::AnyNumber
            | RuleExpr::AnyStr => Ok(self.match_atom(expr, pos)),

            RuleExpr::Call(name, args) => self.match_call(name, args, pos, scope),

            RuleExpr::Or(alts) => {
                for alt in alts {
                    if let Some(hit) = self.match_expr(alt, pos, scope)? {
                        return Ok(Some(hit));
                    }
                }
                Ok(None)
            }
            RuleExpr::And(items) => self.match_and(items, pos, scope),
            RuleExpr::AndUnordered(items) => self.match_and_unordered(items, pos, scope),
            RuleExpr::Not(inner) => {
                let Some(item) = pos.item(self.input) else {
                    return Ok(None);
                };
                Ok(match self.match_expr(inner, pos, scope)? {
                    Some(_) => None,
                    None => Some((item, pos.step(1))),
                })
            }
            RuleExpr::Star(inner) => {
                let (values, end) = self.repeat(inner, pos, scope, usize::MAX)?;
                Ok(Some((Value::List(values), end)))
            }
            RuleExpr::Plus(inner) => {
                let (values, end) = self.repeat(inner, pos, scope, usize::MAX)?;
                if values.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some((Value::List(values), end)))
                }
            }
            RuleExpr::Rep(bounds, inner) => self.match_rep(*bounds, inner, pos, scope),
            RuleExpr::Opt(inner) => Ok(match self.match_expr(inner, pos, scope)? {
                Some(hit) => Some(hit),
                None => Some((Value::Null, pos.clone())),
            }),
            RuleExpr::Ahead(inner) => {
                Ok(self.match_expr(inner, pos, scope)?.map(|(v, _)| (v, pos.clone())))
            }
            RuleExpr::BehindNot(inner) => {
                let Some(item) = pos.item(self.input) else {
                    return Ok(None);
                };
                Ok(match self.match_expr(inner, pos, scope)? {
                    Some(_) => None,
                    None => Some((item, pos.clone())),
                })
            }
            RuleExpr::DescendList(inner) => self.match_descend(SeqKind::List, inner, pos, scope),
            RuleExpr::DescendStr(inner) => self.match_descend(SeqKind::Str, inner, pos, scope),
            RuleExpr::DescendVector(inner) => {
                self.match_descend(SeqKind::Vector, inner, pos, scope)
            }
        }
    }

    // ---- atoms ----

    fn match_atom(&self, expr: &RuleExpr, pos: &Cursor) -> Step {
        match expr {
            RuleExpr::Str(lit) => return self.match_str_literal(lit, pos),
            RuleExpr::Vector(lit) => return self.match_vector_literal(lit, pos),
            _ => {}
        }

        let item = pos.item(self.input)?;
        let hit = match expr {
            RuleExpr::Sym(name) => matches!(&item, Value::Sym(s) if s == name),
            RuleExpr::Char(c) => item == Value::Char(*c),
            RuleExpr::Int(n) => item == Value::Int(*n),
            RuleExpr::Float(x) => item == Value::Float(*x),
            RuleExpr::AnyChar => item.is_char(),
            RuleExpr::AnyByte => item.is_byte(),
            RuleExpr::AnySym => item.is_sym(),
            RuleExpr::AnyForm => true,
            RuleExpr::AnyList => item.is_list(),
            RuleExpr::AnyVector => item.is_vector(),
            RuleExpr::AnyNumber => item.is_number(),
            RuleExpr::AnyStr => item.is_str(),
            _ => false,
        };
        hit.then(|| (item, pos.step(1)))
    }

    /// A string literal matches as a contiguous run of characters when
    /// the containing sequence is itself a string, and as a whole item
    /// otherwise.
    fn match_str_literal(&self, lit: &str, pos: &Cursor) -> Step {
        if let Some(Value::Str(container)) = pos.container(self.input) {
            let chars: Vec<char> = container.chars().collect();
            let lit_chars: Vec<char> = lit.chars().collect();
            let start = pos.last();
            if start + lit_chars.len() <= chars.len()
                && chars[start..start + lit_chars.len()] == lit_chars[..]
            {
                return Some((Value::Str(lit.to_string()), pos.step(lit_chars.len())));
            }
            return None;
        }
        let item = pos.item(self.input)?;
        (item == Value::Str(lit.to_string())).then(|| (item, pos.step(1)))
    }

    /// As `match_str_literal`, for vector literals inside vectors.
    fn match_vector_literal(&self, lit: &[Value], pos: &Cursor) -> Step {
        if let Some(Value::Vector(container)) = pos.container(self.input) {
            let start = pos.last();
            if start + lit.len() <= container.len()
                && container[start..start + lit.len()] == lit[..]
            {
                return Some((Value::Vector(lit.to_vec()), pos.step(lit.len())));
            }
            return None;
        }
        let item = pos.item(self.input)?;
        (item == Value::Vector(lit.to_vec())).then(|| (item, pos.step(1)))
    }

    // ---- combinators ----

    fn match_and(&mut self, items: &[RuleExpr], pos: &Cursor, scope: &Scope) -> Result<Step, Error> {
        let mut values = Vec::with_capacity(items.len());
        let mut p = pos.clone();
        for item in items {
            match self.match_expr(item, &p, scope)? {
                Some((value, next)) => {
                    values.push(value);
                    p = next;
                }
                None => return Ok(None),
            }
        }
        Ok(Some((Value::List(values), p)))
    }

    /// Every alternative must succeed exactly once, in any order. The
    /// result is index-aligned to the declaration order.
    fn match_and_unordered(
        &mut self,
        items: &[RuleExpr],
        pos: &Cursor,
        scope: &Scope,
    ) -> Result<Step, Error> {
        let mut slots: Vec<Option<Value>> = vec![None; items.len()];
        let mut p = pos.clone();
        for _ in 0..items.len() {
            let mut accepted = false;
            for (i, item) in items.iter().enumerate() {
                if slots[i].is_some() {
                    continue;
                }
                if let Some((value, next)) = self.match_expr(item, &p, scope)? {
                    slots[i] = Some(value);
                    p = next;
                    accepted = true;
                    break;
                }
            }
            if !accepted {
                return Ok(None);
            }
        }
        let values = slots
            .into_iter()
            .map(|slot| slot.expect("every slot accepted exactly once"))
            .collect();
        Ok(Some((Value::List(values), p)))
    }

    /// Greedy repetition up to `max` applications. An inner success
    /// that does not advance the cursor is collected once and stops the
    /// loop, so zero-consumption expressions cannot livelock.
    fn repeat(
        &mut self,
        inner: &RuleExpr,
        pos: &Cursor,
        scope: &Scope,
        max: usize,
    ) -> Result<(Vec<Value>, Cursor), Error> {
        let mut values = Vec::new();
        let mut p = pos.clone();
        while values.len() < max {
            match self.match_expr(inner, &p, scope)? {
                Some((value, next)) => {
                    let stalled = next == p;
                    values.push(value);
                    p = next;
                    if stalled {
                        break;
                    }
                }
                None => break,
            }
        }
        Ok((values, p))
    }

    fn match_rep(
        &mut self,
        bounds: RepBounds,
        inner: &RuleExpr,
        pos: &Cursor,
        scope: &Scope,
    ) -> Result<Step, Error> {
        let (values, end) = self.repeat(inner, pos, scope, bounds.max)?;
        if values.len() >= bounds.min {
            Ok(Some((Value::List(values), end)))
        } else {
            Ok(None)
        }
    }

    /// The current item must be a sub-sequence of the given kind, and
    /// the inner expression must consume its entire contents.
    fn match_descend(
        &mut self,
        kind: SeqKind,
        inner: &RuleExpr,
        pos: &Cursor,
        scope: &Scope,
    ) -> Result<Step, Error> {
        let Some(item) = pos.item(self.input) else {
            return Ok(None);
        };
        let kind_ok = match kind {
            SeqKind::List => item.is_list(),
            SeqKind::Str => item.is_str(),
            SeqKind::Vector => item.is_vector(),
        };
        if !kind_ok {
            return Ok(None);
        }
        let sub_len = item.seq_len().expect("sequence kinds have lengths");

        let child = pos.descend();
        let Some((value, end)) = self.match_expr(inner, &child, scope)? else {
            return Ok(None);
        };
        if end.last() == sub_len {
            Ok(Some((value, pos.step(1))))
        } else {
            Ok(None)
        }
    }

    // ---- rule invocation ----

    fn match_call(
        &mut self,
        name: &str,
        args: &[RuleExpr],
        pos: &Cursor,
        scope: &Scope,
    ) -> Result<Step, Error> {
        // Runtime dispatch: a bare reference to a formal parameter
        // matches whatever expression the caller bound to it.
        if args.is_empty() {
            if let Some(bound) = scope.args.get(name) {
                return self.match_expr(bound, pos, &Scope::default());
            }
        }
        self.invoke_rule(name, args, pos, scope)
    }

    fn invoke_rule(
        &mut self,
        name: &str,
        args: &[RuleExpr],
        pos: &Cursor,
        scope: &Scope,
    ) -> Result<Step, Error> {
        let grammar = self.grammar;
        let def = grammar
            .get(name)
            .ok_or_else(|| Error::UnknownRule(name.to_string()))?;
        if args.len() != def.params.len() {
            return Err(Error::Malformed(format!(
                "rule '{name}' takes {} argument(s), got {}",
                def.params.len(),
                args.len()
            )));
        }

        // Bind formals to the caller's argument expressions. An argument
        // that is a bare reference to one of the caller's own formals is
        // forwarded as the caller's binding; everything else passes
        // through by value.
        let mut call_scope = Scope::default();
        for (param, arg) in def.params.iter().zip(args) {
            let resolved = match arg {
                RuleExpr::Call(n, inner) if inner.is_empty() => {
                    scope.args.get(n).cloned().unwrap_or_else(|| arg.clone())
                }
                other => other.clone(),
            };
            call_scope.args.insert(param.clone(), resolved);
        }

        // Left-recursion guard: reaching this rule again at the same
        // cursor means no progress was made in between.
        let stack = self.active.entry(name.to_string()).or_default();
        if stack.last() == Some(pos) {
            return Err(Error::LeftRecursion {
                rule: name.to_string(),
                at: pos.to_string(),
            });
        }
        stack.push(pos.clone());

        let token = self.tracer.enter(grammar.trace_level(name), name, pos);
        self.bindings.push_frame(&def.locals, &def.inherited);

        let result = self.run_rule(def, pos, &call_scope);

        self.bindings.pop_frame();
        match &result {
            Ok(Some((value, end))) => self.tracer.exit_success(token, name, pos, end, value),
            _ => self.tracer.exit_failure(token, name),
        }
        self.active
            .get_mut(name)
            .expect("stack pushed on entry")
            .pop();

        result
    }

    fn run_rule(&mut self, def: &RuleDef, pos: &Cursor, scope: &Scope) -> Result<Step, Error> {
        let Some((value, end)) = self.match_expr(&def.body, pos, scope)? else {
            return Ok(None);
        };
        // A pipeline veto turns the success into failure at the entry
        // cursor (the tentative cursor is simply dropped).
        match pipeline::apply(&def.pipeline, value, &mut self.bindings) {
            Some(value) => Ok(Some((value, end))),
            None => Ok(None),
        }
    }
}
