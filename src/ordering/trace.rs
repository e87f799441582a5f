use std::fmt;

use tracing::trace;

/// Grammar rules of the order-by language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    SortList,
    SortSpec,
    SortKey,
    FunctionCall,
    Argument,
    Collation,
    Ordering,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rule::SortList => "sortList",
            Rule::SortSpec => "sortSpec",
            Rule::SortKey => "sortKey",
            Rule::FunctionCall => "functionCall",
            Rule::Argument => "argument",
            Rule::Collation => "collation",
            Rule::Ordering => "ordering",
        };
        f.write_str(name)
    }
}

/// Hook called by the parser around every grammar rule. `depth` is the
/// nesting level of the rule being entered or left.
pub trait ParseTracer {
    fn enter(&mut self, rule: Rule, depth: usize);
    fn exit(&mut self, rule: Rule, depth: usize);
}

#[derive(Debug, Default)]
pub struct NoopTracer;

impl ParseTracer for NoopTracer {
    fn enter(&mut self, _rule: Rule, _depth: usize) {}
    fn exit(&mut self, _rule: Rule, _depth: usize) {}
}

/// Emits an indented `trace!` event per rule transition.
#[derive(Debug, Default)]
pub struct TracingTracer;

impl ParseTracer for TracingTracer {
    fn enter(&mut self, rule: Rule, depth: usize) {
        trace!("{}-> {}", "-".repeat(depth * 2), rule);
    }

    fn exit(&mut self, rule: Rule, depth: usize) {
        trace!("<-{} {}", "-".repeat(depth * 2), rule);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Enter(Rule, usize),
    Exit(Rule, usize),
}

/// Keeps every transition in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pub events: Vec<TraceEvent>,
}

impl ParseTracer for RecordingTracer {
    fn enter(&mut self, rule: Rule, depth: usize) {
        self.events.push(TraceEvent::Enter(rule, depth));
    }

    fn exit(&mut self, rule: Rule, depth: usize) {
        self.events.push(TraceEvent::Exit(rule, depth));
    }
}
