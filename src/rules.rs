//! Rule definitions and the grammar table.
//!
//! A `Grammar` owns the name→rule map and the per-rule trace levels.
//! Grammars are plain values: a parse borrows one immutably, so parses
//! over distinct grammars are independent.

use std::collections::HashMap;

use crate::error::Error;
use crate::expr::RuleExpr;
use crate::parser::parse_expr;
use crate::pipeline::PipelineStep;
use crate::trace::TraceLevel;
use crate::value::Value;

/// A named rule: body expression, formal parameters, lexical and
/// inherited bindings, and the result-processing pipeline.
pub struct RuleDef {
    pub(crate) name: String,
    pub(crate) params: Vec<String>,
    pub(crate) body: RuleExpr,
    pub(crate) locals: Vec<(String, Value)>,
    pub(crate) inherited: Vec<String>,
    pub(crate) pipeline: Vec<PipelineStep>,
}

impl RuleDef {
    pub fn new(name: impl Into<String>, body: RuleExpr) -> RuleDef {
        RuleDef {
            name: name.into(),
            params: Vec::new(),
            body,
            locals: Vec::new(),
            inherited: Vec::new(),
            pipeline: Vec::new(),
        }
    }

    /// Build a rule from canonical surface text.
    pub fn parse(name: impl Into<String>, body: &str) -> Result<RuleDef, Error> {
        Ok(RuleDef::new(name, parse_expr(body)?))
    }

    /// Formal parameters, bound at call time to caller-supplied
    /// expressions.
    pub fn with_params(mut self, params: &[&str]) -> RuleDef {
        self.params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Add a lexical binding, created fresh on each entry to the rule.
    pub fn with_local(mut self, name: &str, init: Value) -> RuleDef {
        self.locals.push((name.to_string(), init));
        self
    }

    /// Declare an inherited binding: a name the rule's pipeline may
    /// read/write but which some caller must have created.
    pub fn with_inherited(mut self, name: &str) -> RuleDef {
        self.inherited.push(name.to_string());
        self
    }

    /// Append a pipeline step; steps run in the order added.
    pub fn with_step(mut self, step: PipelineStep) -> RuleDef {
        self.pipeline.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The rule table plus the trace-level table.
#[derive(Default)]
pub struct Grammar {
    rules: HashMap<String, RuleDef>,
    trace: HashMap<String, TraceLevel>,
}

impl Grammar {
    pub fn new() -> Grammar {
        Grammar::default()
    }

    /// Register a rule, replacing any existing rule of the same name.
    ///
    /// The surface keywords (`char`, `or`, `rep`, …) are reserved; a
    /// rule carrying one of those names is unreachable from parsed
    /// expressions.
    pub fn define(&mut self, def: RuleDef) {
        self.rules.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&RuleDef> {
        self.rules.get(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Turn on tracing for a rule. `recursive` also traces every rule
    /// reached while it is active.
    pub fn trace_rule(&mut self, name: &str, recursive: bool) {
        let level = if recursive {
            TraceLevel::Recursive
        } else {
            TraceLevel::Rule
        };
        self.trace.insert(name.to_string(), level);
    }

    pub fn untrace_rule(&mut self, name: &str) {
        self.trace.remove(name);
    }

    pub fn trace_level(&self, name: &str) -> TraceLevel {
        self.trace.get(name).copied().unwrap_or_default()
    }
}

/// Run `f` with a fresh grammar whose rule and trace tables start
/// empty, so definitions inside it cannot leak anywhere else.
pub fn with_local_rules<R>(f: impl FnOnce(&mut Grammar) -> R) -> R {
    let mut grammar = Grammar::new();
    f(&mut grammar)
}
