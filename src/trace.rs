//! Per-rule call/return tracing.
//!
//! Each rule has a trace level: off, trace this rule, or trace this rule
//! and everything reached while it is active. The tracer keeps the
//! dynamic depth counter and the count of active recursive traces; the
//! engine reports rule entry and exit through it.

use std::fmt;

use crate::cursor::Cursor;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceLevel {
    #[default]
    Off,
    /// Trace calls to this rule only.
    Rule,
    /// Trace calls to this rule and to every rule reached while it is
    /// active.
    Recursive,
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TraceLevel::Off => "off",
            TraceLevel::Rule => "rule",
            TraceLevel::Recursive => "recursive",
        };
        write!(f, "{text}")
    }
}

/// Handed back by `enter`; the matching `exit_*` call undoes its effects.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TraceToken {
    traced: bool,
    forced: bool,
}

enum Sink {
    Stderr,
    #[cfg(test)]
    Buffer(Vec<String>),
}

pub(crate) struct Tracer {
    depth: usize,
    active_recursive: usize,
    sink: Sink,
}

impl Tracer {
    pub(crate) fn new() -> Tracer {
        Tracer {
            depth: 0,
            active_recursive: 0,
            sink: Sink::Stderr,
        }
    }

    #[cfg(test)]
    fn buffered() -> Tracer {
        Tracer {
            depth: 0,
            active_recursive: 0,
            sink: Sink::Buffer(Vec::new()),
        }
    }

    #[cfg(test)]
    fn lines(&self) -> &[String] {
        match &self.sink {
            Sink::Buffer(lines) => lines,
            Sink::Stderr => &[],
        }
    }

    fn emit(&mut self, line: String) {
        match &mut self.sink {
            Sink::Stderr => eprintln!("{line}"),
            #[cfg(test)]
            Sink::Buffer(lines) => lines.push(line),
        }
    }

    pub(crate) fn enter(&mut self, level: TraceLevel, name: &str, at: &Cursor) -> TraceToken {
        let traced = level != TraceLevel::Off || self.active_recursive > 0;
        let forced = level == TraceLevel::Recursive;
        if forced {
            self.active_recursive += 1;
        }
        if traced {
            let line = format!("{:indent$}{}: {name} {at}?", "", self.depth, indent = self.depth);
            self.emit(line);
            self.depth += 1;
        }
        TraceToken { traced, forced }
    }

    pub(crate) fn exit_success(
        &mut self,
        token: TraceToken,
        name: &str,
        entry: &Cursor,
        exit: &Cursor,
        value: &Value,
    ) {
        if token.traced {
            self.depth -= 1;
            let line = format!(
                "{:indent$}{}: {name} {entry} -> {exit} => {value}",
                "",
                self.depth,
                indent = self.depth
            );
            self.emit(line);
        }
        if token.forced {
            self.active_recursive -= 1;
        }
    }

    pub(crate) fn exit_failure(&mut self, token: TraceToken, name: &str) {
        if token.traced {
            self.depth -= 1;
            let line = format!("{:indent$}{}: {name} -|", "", self.depth, indent = self.depth);
            self.emit(line);
        }
        if token.forced {
            self.active_recursive -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_rules_emit_nothing() {
        let mut tracer = Tracer::buffered();
        let token = tracer.enter(TraceLevel::Off, "digits", &Cursor::root(0));
        tracer.exit_failure(token, "digits");
        assert!(tracer.lines().is_empty());
    }

    #[test]
    fn traced_entry_and_success() {
        let mut tracer = Tracer::buffered();
        let entry = Cursor::root(0);
        let token = tracer.enter(TraceLevel::Rule, "digits", &entry);
        tracer.exit_success(token, "digits", &entry, &Cursor::root(3), &Value::Str("123".into()));
        assert_eq!(
            tracer.lines(),
            ["0: digits [0]?", "0: digits [0] -> [3] => \"123\""]
        );
    }

    #[test]
    fn traced_failure() {
        let mut tracer = Tracer::buffered();
        let token = tracer.enter(TraceLevel::Rule, "digits", &Cursor::root(2));
        tracer.exit_failure(token, "digits");
        assert_eq!(tracer.lines(), ["0: digits [2]?", "0: digits -|"]);
    }

    #[test]
    fn nested_calls_indent() {
        let mut tracer = Tracer::buffered();
        let outer = tracer.enter(TraceLevel::Rule, "outer", &Cursor::root(0));
        let inner = tracer.enter(TraceLevel::Rule, "inner", &Cursor::root(0));
        tracer.exit_failure(inner, "inner");
        tracer.exit_failure(outer, "outer");
        assert_eq!(
            tracer.lines(),
            ["0: outer [0]?", " 1: inner [0]?", " 1: inner -|", "0: outer -|"]
        );
    }

    #[test]
    fn recursive_trace_forces_untraced_rules() {
        let mut tracer = Tracer::buffered();
        let outer = tracer.enter(TraceLevel::Recursive, "outer", &Cursor::root(0));
        let inner = tracer.enter(TraceLevel::Off, "inner", &Cursor::root(0));
        tracer.exit_failure(inner, "inner");
        tracer.exit_failure(outer, "outer");
        assert_eq!(tracer.lines().len(), 4);

        // Once the recursive rule exits, untraced rules are silent again.
        let quiet = tracer.enter(TraceLevel::Off, "inner", &Cursor::root(0));
        tracer.exit_failure(quiet, "inner");
        assert_eq!(tracer.lines().len(), 4);
    }

    #[test]
    fn trace_level_display() {
        assert_eq!(format!("{}", TraceLevel::Off), "off");
        assert_eq!(format!("{}", TraceLevel::Rule), "rule");
        assert_eq!(format!("{}", TraceLevel::Recursive), "recursive");
    }
}
