//! Top-level evaluation entry points.

use std::cell::RefCell;
use std::rc::Rc;

use glean_value::Value;

use crate::error::GleanError;
use crate::exec;
use crate::mode::Mode;
use crate::registry::{ProbeFn, Registration, Registry};
use crate::scope::Scope;
use crate::spec::Spec;
use crate::trace::{TraceSnapshot, DEFAULT_MAX_WIDTH};

thread_local! {
    static DEFAULT_REGISTRY: RefCell<Rc<Registry>> =
        RefCell::new(Rc::new(Registry::with_builtins()));
}

/// Extend the ambient registry with a type's handlers.
///
/// Affects later evaluations on this thread; compiled specs keep the
/// registry they were compiled against.
pub fn register(reg: Registration) {
    DEFAULT_REGISTRY.with(|cell| {
        Rc::make_mut(&mut cell.borrow_mut()).register(reg);
    });
}

/// Extend the ambient registry with a probe-backed operation. `exact`
/// restricts the operation to concrete-type matches.
pub fn register_op(name: impl Into<String>, probe: ProbeFn, exact: bool) {
    DEFAULT_REGISTRY.with(|cell| {
        Rc::make_mut(&mut cell.borrow_mut()).register_op(name, probe, exact);
    });
}

fn ambient_registry() -> Rc<Registry> {
    DEFAULT_REGISTRY.with(|cell| Rc::clone(&cell.borrow()))
}

/// Evaluate `spec` against `target` with the ambient registry and
/// default settings.
pub fn evaluate(target: &Value, spec: &Spec) -> Result<Value, GleanError> {
    Evaluation::new().run(target, spec)
}

type ErrorFilter = Rc<dyn Fn(&GleanError) -> bool>;

/// A configured evaluation: optional fallback value, extra scope
/// bindings, a pinned registry, and trace rendering width.
#[derive(Clone, Default)]
pub struct Evaluation {
    default: Option<Value>,
    default_filter: Option<ErrorFilter>,
    registry: Option<Rc<Registry>>,
    bindings: Vec<(Rc<str>, Value)>,
    path_prefix: Vec<String>,
    max_trace_width: Option<usize>,
}

impl Evaluation {
    pub fn new() -> Evaluation {
        Evaluation::default()
    }

    /// Return `value` instead of the error when evaluation fails.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restrict the fallback to errors the filter accepts; rejected
    /// errors propagate.
    pub fn default_filter(mut self, filter: impl Fn(&GleanError) -> bool + 'static) -> Self {
        self.default_filter = Some(Rc::new(filter));
        self
    }

    /// Pin a registry instead of the thread's ambient one.
    pub fn registry(mut self, registry: Rc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Seed a scope binding visible to `S`-rooted expressions.
    pub fn bind(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.bindings.push((name.into(), value.into()));
        self
    }

    /// Seed the diagnostic path, for callers evaluating a sub-spec of a
    /// larger document.
    pub fn path_prefix(mut self, segments: Vec<String>) -> Self {
        self.path_prefix = segments;
        self
    }

    /// Cap rendered trace lines at `width` characters.
    pub fn max_trace_width(mut self, width: usize) -> Self {
        self.max_trace_width = Some(width);
        self
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&self, target: &Value, spec: &Spec) -> Result<Value, GleanError> {
        let registry = self
            .registry
            .clone()
            .unwrap_or_else(ambient_registry);
        let scope = Scope::root(registry, Mode::Auto, target.clone());
        // The root target stays reachable by name for scope-rooted and
        // assignment expressions.
        scope.define("T", target.clone());
        for (name, value) in &self.bindings {
            scope.define(Rc::clone(name), value.clone());
        }
        for segment in &self.path_prefix {
            scope.push_path_segment(segment.clone());
        }
        tracing::debug!(spec = %spec, "evaluating");
        match exec::evaluate_spec(target, spec, &scope) {
            Ok(flow) => Ok(flow.into_value()),
            Err(err) => {
                let width = self.max_trace_width.unwrap_or(DEFAULT_MAX_WIDTH);
                let err = err.with_trace(TraceSnapshot::capture(&scope, width));
                if let Some(default) = &self.default {
                    if self.default_filter.as_ref().is_none_or(|f| f(&err)) {
                        tracing::debug!(error = %err, "falling back to default");
                        return Ok(default.clone());
                    }
                }
                Err(err)
            }
        }
    }
}

/// A spec paired with the registry it was compiled against.
///
/// Compiling snapshots the ambient registry: later global registrations
/// do not change what a compiled spec dispatches to.
#[derive(Clone)]
pub struct CompiledSpec {
    spec: Spec,
    registry: Rc<Registry>,
}

impl CompiledSpec {
    pub fn compile(spec: Spec) -> CompiledSpec {
        CompiledSpec { spec, registry: ambient_registry() }
    }

    /// Compile against an explicit registry.
    pub fn with_registry(spec: Spec, registry: Rc<Registry>) -> CompiledSpec {
        CompiledSpec { spec, registry }
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    pub fn evaluate(&self, target: &Value) -> Result<Value, GleanError> {
        Evaluation::new()
            .registry(Rc::clone(&self.registry))
            .run(target, &self.spec)
    }
}
