//! Chained evaluation scopes.
//!
//! Each spec step runs in a child scope of its parent. A scope carries
//! name bindings with innermost-first lookup, the ambient mode and
//! handler registry, the target and spec under evaluation, and the
//! child bookkeeping the trace capture walks after a failure.
//!
//! Parents hold children strongly (`last_child`, `child_errors`) so the
//! failure tree survives until the trace is rendered; the child's back
//! pointer to its parent is weak so the tree drops cleanly afterwards.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use glean_value::{Heap, Value, WeakHeap};

use crate::error::GleanError;
use crate::mode::Mode;
use crate::registry::Registry;
use crate::spec::Spec;

#[derive(Debug, Default)]
struct Frame {
    bindings: FxHashMap<Rc<str>, Value>,
    parent: Option<WeakHeap<Frame>>,
    mode: Mode,
    registry: Option<Rc<Registry>>,
    path: Vec<String>,
    target: Value,
    spec: Option<Spec>,
    last_child: Option<Scope>,
    child_errors: Vec<Scope>,
    error: Option<GleanError>,
}

/// A frame in the scope chain. Clones share the frame.
#[derive(Debug, Clone)]
pub struct Scope(Heap<Frame>);

impl Scope {
    /// The evaluation root. Seeds the registry and mode every child
    /// inherits.
    pub fn root(registry: Rc<Registry>, mode: Mode, target: Value) -> Scope {
        Scope(Heap::new(Frame {
            registry: Some(registry),
            mode,
            target,
            ..Frame::default()
        }))
    }

    /// Open a child frame for one spec step.
    pub fn child(&self) -> Scope {
        let parent = self.0.borrow();
        Scope(Heap::new(Frame {
            parent: Some(self.0.downgrade()),
            mode: parent.mode,
            registry: parent.registry.clone(),
            target: parent.target.clone(),
            spec: parent.spec.clone(),
            ..Frame::default()
        }))
    }

    /// Bind a name in this frame, shadowing outer frames.
    pub fn define(&self, name: impl Into<Rc<str>>, value: Value) {
        self.0.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Bind a name in the parent frame, so siblings of this step see it.
    /// Root frames bind locally.
    pub fn define_in_parent(&self, name: impl Into<Rc<str>>, value: Value) {
        let parent = self.0.borrow().parent.clone();
        match parent.and_then(|weak| weak.upgrade()) {
            Some(frame) => {
                frame.borrow_mut().bindings.insert(name.into(), value);
            }
            None => self.define(name, value),
        }
    }

    /// Innermost-first name lookup through the chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.0.borrow().bindings.get(name) {
            return Some(v.clone());
        }
        let mut parent = self.0.borrow().parent.clone();
        while let Some(weak) = parent {
            let frame = weak.upgrade()?;
            if let Some(v) = frame.borrow().bindings.get(name) {
                return Some(v.clone());
            }
            parent = frame.borrow().parent.clone();
        }
        None
    }

    pub fn mode(&self) -> Mode {
        self.0.borrow().mode
    }

    pub fn set_mode(&self, mode: Mode) {
        self.0.borrow_mut().mode = mode;
    }

    /// The handler registry. Every frame holds the root's registry
    /// strongly, so a scope kept alive past its parents still
    /// dispatches against the registry it was evaluated with.
    pub fn registry(&self) -> Rc<Registry> {
        self.0.borrow().registry.clone().unwrap_or_default()
    }

    /// Record a human-readable step in the ambient path, shown by traces.
    pub fn push_path_segment(&self, segment: impl Into<String>) {
        self.0.borrow_mut().path.push(segment.into());
    }

    pub fn target(&self) -> Value {
        self.0.borrow().target.clone()
    }

    pub fn set_target(&self, target: Value) {
        self.0.borrow_mut().target = target;
    }

    pub fn spec(&self) -> Option<Spec> {
        self.0.borrow().spec.clone()
    }

    pub fn set_spec(&self, spec: Spec) {
        self.0.borrow_mut().spec = Some(spec);
    }

    /// Note a finished child step, keeping failures for branch traces.
    pub fn note_child(&self, child: &Scope, failed: bool) {
        let mut frame = self.0.borrow_mut();
        frame.last_child = Some(child.clone());
        if failed {
            frame.child_errors.push(child.clone());
        }
    }

    pub fn record_error(&self, error: GleanError) {
        self.0.borrow_mut().error = Some(error);
    }

    pub fn error(&self) -> Option<GleanError> {
        self.0.borrow().error.clone()
    }

    pub fn last_child(&self) -> Option<Scope> {
        self.0.borrow().last_child.clone()
    }

    pub fn child_errors(&self) -> Vec<Scope> {
        self.0.borrow().child_errors.clone()
    }

    /// Drop recorded child failures, used when a pipeline rebases its
    /// next step on a recovered value.
    pub fn clear_child_errors(&self) {
        self.0.borrow_mut().child_errors.clear();
    }

    /// The deepest frame reachable through `last_child` links.
    pub fn deepest_child(&self) -> Scope {
        let mut cur = self.clone();
        while let Some(next) = cur.last_child() {
            cur = next;
        }
        cur
    }

    pub fn path_segments(&self) -> Vec<String> {
        self.0.borrow().path.clone()
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        self.0.ptr_eq(&other.0)
    }
}
