//! Result-processing pipeline and binding frames.
//!
//! Each rule carries an ordered list of `PipelineStep`s applied to the
//! body result of a successful match. A `Test`/`TestNot` step can veto
//! the match, turning success into failure at the entry cursor. Steps
//! that run host code receive the rule's `Bindings` — the stack of
//! lexical frames plus the declared inherited (dynamic-scope) names.

use std::collections::HashMap;

use crate::value::Value;

/// Destructure-and-transform: receives the value's elements and the
/// rule's bindings, produces the new running value.
pub type TransformFn = Box<dyn Fn(&[Value], &mut Bindings) -> Value>;
/// Destructure-and-decide: `Test` vetoes on false, `TestNot` on true.
pub type PredicateFn = Box<dyn Fn(&[Value], &mut Bindings) -> bool>;
/// A pure positional call over the value's elements, no bindings access.
pub type ValueFn = Box<dyn Fn(&[Value]) -> Value>;
/// Condition over the whole running value; `Identity` nulls it on false.
pub type ConditionFn = Box<dyn Fn(&Value, &Bindings) -> bool>;

pub enum PipelineStep {
    /// Replace the running value with a constant.
    Constant(Value),
    /// Destructure, run host code, use the result as the new value.
    Lambda(TransformFn),
    /// Alias of `Lambda`.
    Destructure(TransformFn),
    /// Call host code with the value's elements as positional arguments.
    Function(ValueFn),
    /// Keep the value when the condition holds, otherwise null it.
    Identity(ConditionFn),
    /// Deep-flatten nested lists into a single list. Null values vanish
    /// (they flatten to nothing).
    Flatten,
    /// Flatten, then concatenate the element text into one string.
    Stringify,
    /// Flatten, then collect the elements into a vector.
    Vectorize,
    /// Veto the match when the predicate is false.
    Test(PredicateFn),
    /// Veto the match when the predicate is true.
    TestNot(PredicateFn),
}

impl PipelineStep {
    pub fn lambda(f: impl Fn(&[Value], &mut Bindings) -> Value + 'static) -> PipelineStep {
        PipelineStep::Lambda(Box::new(f))
    }

    pub fn destructure(f: impl Fn(&[Value], &mut Bindings) -> Value + 'static) -> PipelineStep {
        PipelineStep::Destructure(Box::new(f))
    }

    pub fn function(f: impl Fn(&[Value]) -> Value + 'static) -> PipelineStep {
        PipelineStep::Function(Box::new(f))
    }

    pub fn identity(f: impl Fn(&Value, &Bindings) -> bool + 'static) -> PipelineStep {
        PipelineStep::Identity(Box::new(f))
    }

    pub fn test(f: impl Fn(&[Value], &mut Bindings) -> bool + 'static) -> PipelineStep {
        PipelineStep::Test(Box::new(f))
    }

    pub fn test_not(f: impl Fn(&[Value], &mut Bindings) -> bool + 'static) -> PipelineStep {
        PipelineStep::TestNot(Box::new(f))
    }
}

/// The dynamic binding stack: one frame per active rule call.
///
/// `get`/`set` resolve against the top frame's own variables first, then
/// — only for names the top frame declares as inherited — against the
/// enclosing frames, nearest caller first. Reading a name that no frame
/// created yields `None`; writing one is a no-op reporting `false`.
#[derive(Debug, Default)]
pub struct Bindings {
    frames: Vec<Frame>,
}

#[derive(Debug)]
struct Frame {
    vars: HashMap<String, Value>,
    inherited: Vec<String>,
}

impl Bindings {
    pub fn new() -> Bindings {
        Bindings { frames: Vec::new() }
    }

    pub(crate) fn push_frame(&mut self, locals: &[(String, Value)], inherited: &[String]) {
        self.frames.push(Frame {
            vars: locals.iter().cloned().collect(),
            inherited: inherited.to_vec(),
        });
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let top = self.frames.last()?;
        if let Some(value) = top.vars.get(name) {
            return Some(value.clone());
        }
        if !top.inherited.iter().any(|n| n == name) {
            return None;
        }
        self.frames[..self.frames.len() - 1]
            .iter()
            .rev()
            .find_map(|frame| frame.vars.get(name).cloned())
    }

    /// Write an existing binding. Returns whether one was found.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        let len = self.frames.len();
        let Some(top) = self.frames.last_mut() else {
            return false;
        };
        if let Some(slot) = top.vars.get_mut(name) {
            *slot = value;
            return true;
        }
        if !top.inherited.iter().any(|n| n == name) {
            return false;
        }
        for frame in self.frames[..len - 1].iter_mut().rev() {
            if let Some(slot) = frame.vars.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }
}

/// The value's elements: a list's items, or the value itself wrapped as
/// a one-element slice.
fn elements(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn flatten(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::List(items) => items.iter().flat_map(flatten).collect(),
        other => vec![other.clone()],
    }
}

fn append_text(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Sym(name) => out.push_str(name),
        Value::Char(c) => out.push(*c),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Float(x) => out.push_str(&x.to_string()),
        Value::Str(s) => out.push_str(s),
        Value::Vector(items) | Value::List(items) => {
            for item in items {
                append_text(out, item);
            }
        }
    }
}

/// Run the pipeline over the body result. `None` means a veto.
pub(crate) fn apply(
    steps: &[PipelineStep],
    value: Value,
    bindings: &mut Bindings,
) -> Option<Value> {
    let mut value = value;
    for step in steps {
        value = match step {
            PipelineStep::Constant(c) => c.clone(),
            PipelineStep::Lambda(f) | PipelineStep::Destructure(f) => {
                f(&elements(&value), bindings)
            }
            PipelineStep::Function(f) => f(&elements(&value)),
            PipelineStep::Identity(f) => {
                if f(&value, bindings) {
                    value
                } else {
                    Value::Null
                }
            }
            PipelineStep::Flatten => Value::List(flatten(&value)),
            PipelineStep::Stringify => {
                let mut out = String::new();
                for item in flatten(&value) {
                    append_text(&mut out, &item);
                }
                Value::Str(out)
            }
            PipelineStep::Vectorize => Value::Vector(flatten(&value)),
            PipelineStep::Test(f) => {
                if !f(&elements(&value), bindings) {
                    return None;
                }
                value
            }
            PipelineStep::TestNot(f) => {
                if f(&elements(&value), bindings) {
                    return None;
                }
                value
            }
        };
    }
    Some(value)
}
