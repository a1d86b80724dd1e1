//! Typed operation dispatch.
//!
//! The registry maps (target type, operation name) pairs to handler
//! closures. Resolution first tries the exact type, then walks the
//! type's declared ancestry nearest-first so a handler registered for a
//! base type covers its subtypes. Types may also mark an operation as
//! explicitly unsupported, which short-circuits the walk, or mark
//! themselves exact so they never stand in for their descendants.
//!
//! Resolutions are memoized per (type, operation); any registration
//! invalidates the memo. Cloning a registry produces an independent
//! snapshot with a fresh memo.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use glean_value::{TypeTag, Value};

use crate::error::GleanError;
use crate::path::Path;

pub type GetFn = Rc<dyn Fn(&Value, &Value, &Path) -> Result<Value, String>>;
pub type IterFn = Rc<dyn Fn(&Value) -> Result<Vec<Value>, String>>;
pub type AssignFn = Rc<dyn Fn(&Value, &Value, Value) -> Result<(), String>>;
pub type DeleteFn = Rc<dyn Fn(&Value, &Value) -> Result<(), String>>;
pub type OpFn = Rc<dyn Fn(&Value, &[Value]) -> Result<Value, String>>;

/// A resolved handler for one operation.
#[derive(Clone)]
pub enum Handler {
    /// Keyed read: `(target, key, path context)`.
    Get(GetFn),
    /// Enumerate element values.
    Iterate(IterFn),
    /// Enumerate keys, for targets with a keyed shape.
    Keys(IterFn),
    /// Keyed write: `(target, key, value)`.
    Assign(AssignFn),
    /// Keyed removal.
    Delete(DeleteFn),
    /// Host-named operation: `(target, args)`.
    Op(OpFn),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Handler::Get(_) => "Get",
            Handler::Iterate(_) => "Iterate",
            Handler::Keys(_) => "Keys",
            Handler::Assign(_) => "Assign",
            Handler::Delete(_) => "Delete",
            Handler::Op(_) => "Op",
        };
        f.debug_tuple(name).finish()
    }
}

/// What a type declares for one operation.
#[derive(Debug, Clone)]
pub enum OpSupport {
    Handles(Handler),
    /// Declared refusal: stops ancestry fallback cold.
    Unsupported,
}

/// Outcome of a dispatch lookup.
#[derive(Debug, Clone)]
pub enum Resolution {
    Handler(Handler),
    /// The type (or an ancestor) declared the operation unsupported.
    Unsupported,
    /// Nothing registered anywhere along the ancestry.
    Missing,
}

/// Per-type probe run when a type and an operation first meet, letting
/// an operation cover types registered after it.
pub type ProbeFn = Rc<dyn Fn(TypeTag) -> Option<OpSupport>>;

#[derive(Default)]
struct OpTable {
    by_type: IndexMap<TypeTag, OpSupport>,
    probe: Option<ProbeFn>,
    /// Exact operations only ever match the concrete type.
    exact: bool,
}

/// Builder describing one type's handlers.
pub struct Registration {
    tag: TypeTag,
    name: Option<String>,
    ancestors: Vec<TypeTag>,
    descendants: Vec<TypeTag>,
    exact: bool,
    ops: Vec<(String, OpSupport)>,
}

impl Registration {
    pub fn new(tag: TypeTag) -> Registration {
        Registration {
            tag,
            name: None,
            ancestors: Vec::new(),
            descendants: Vec::new(),
            exact: false,
            ops: Vec::new(),
        }
    }

    /// Display name used in diagnostics. Builtin tags already have one.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare the ancestry chain, nearest ancestor first.
    pub fn child_of(mut self, ancestors: Vec<TypeTag>) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// Declare already-registered types this type is a nearer ancestor
    /// of, splicing it into their chains.
    pub fn parent_of(mut self, descendants: Vec<TypeTag>) -> Self {
        self.descendants = descendants;
        self
    }

    /// Exact types never answer for their descendants.
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn get(mut self, f: impl Fn(&Value, &Value, &Path) -> Result<Value, String> + 'static) -> Self {
        self.ops.push(("get".into(), OpSupport::Handles(Handler::Get(Rc::new(f)))));
        self
    }

    pub fn iterate(mut self, f: impl Fn(&Value) -> Result<Vec<Value>, String> + 'static) -> Self {
        self.ops.push(("iterate".into(), OpSupport::Handles(Handler::Iterate(Rc::new(f)))));
        self
    }

    pub fn keys(mut self, f: impl Fn(&Value) -> Result<Vec<Value>, String> + 'static) -> Self {
        self.ops.push(("keys".into(), OpSupport::Handles(Handler::Keys(Rc::new(f)))));
        self
    }

    pub fn assign(mut self, f: impl Fn(&Value, &Value, Value) -> Result<(), String> + 'static) -> Self {
        self.ops.push(("assign".into(), OpSupport::Handles(Handler::Assign(Rc::new(f)))));
        self
    }

    pub fn delete(mut self, f: impl Fn(&Value, &Value) -> Result<(), String> + 'static) -> Self {
        self.ops.push(("delete".into(), OpSupport::Handles(Handler::Delete(Rc::new(f)))));
        self
    }

    /// Register a host-named operation for this type.
    pub fn op(mut self, name: impl Into<String>, f: impl Fn(&Value, &[Value]) -> Result<Value, String> + 'static) -> Self {
        self.ops.push((name.into(), OpSupport::Handles(Handler::Op(Rc::new(f)))));
        self
    }

    /// Declare an operation explicitly unsupported for this type.
    pub fn unsupported(mut self, op: impl Into<String>) -> Self {
        self.ops.push((op.into(), OpSupport::Unsupported));
        self
    }
}

/// The dispatch table threaded through every evaluation scope.
pub struct Registry {
    ops: IndexMap<String, OpTable>,
    ancestry: FxHashMap<TypeTag, Vec<TypeTag>>,
    names: FxHashMap<TypeTag, String>,
    exact: FxHashSet<TypeTag>,
    cache: RefCell<FxHashMap<(TypeTag, String), Resolution>>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            ops: IndexMap::new(),
            ancestry: FxHashMap::default(),
            names: FxHashMap::default(),
            exact: FxHashSet::default(),
            cache: RefCell::new(FxHashMap::default()),
        }
    }
}

// Snapshot clone: shares handler closures, drops the memo.
impl Clone for Registry {
    fn clone(&self) -> Self {
        Registry {
            ops: self
                .ops
                .iter()
                .map(|(name, table)| {
                    (
                        name.clone(),
                        OpTable {
                            by_type: table.by_type.clone(),
                            probe: table.probe.clone(),
                            exact: table.exact,
                        },
                    )
                })
                .collect(),
            ancestry: self.ancestry.clone(),
            names: self.names.clone(),
            exact: self.exact.clone(),
            cache: RefCell::new(FxHashMap::default()),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("ops", &self.ops.keys().collect::<Vec<_>>())
            .field("types", &self.names.values().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// A registry preloaded with handlers for the builtin value shapes.
    pub fn with_builtins() -> Registry {
        let mut r = Registry::default();
        r.register(
            Registration::new(TypeTag::Map)
                .get(builtin::map_get)
                .keys(builtin::map_keys)
                .iterate(builtin::map_keys)
                .assign(builtin::map_assign)
                .delete(builtin::map_delete),
        );
        r.register(
            Registration::new(TypeTag::List)
                .get(builtin::list_get)
                .iterate(builtin::seq_iterate)
                .assign(builtin::list_assign)
                .delete(builtin::list_delete),
        );
        r.register(
            Registration::new(TypeTag::Tuple)
                .get(builtin::list_get)
                .iterate(builtin::seq_iterate),
        );
        r.register(
            Registration::new(TypeTag::Str)
                .iterate(builtin::str_iterate)
                .unsupported("get"),
        );
        r.register(
            Registration::new(TypeTag::Set)
                .iterate(builtin::seq_iterate)
                .delete(builtin::set_delete),
        );
        // Fallback get: foreign values read attributes through their
        // trait, everything else reports a plain access failure.
        r.register(Registration::new(TypeTag::Any).get(builtin::default_get));
        r
    }

    /// Install a type's handlers, replacing earlier entries for the same
    /// (type, operation) pairs.
    pub fn register(&mut self, reg: Registration) {
        let tag = reg.tag;
        if let Some(name) = reg.name {
            self.names.insert(tag, name);
        } else if let Some(builtin) = tag.builtin_name() {
            self.names.entry(tag).or_insert_with(|| builtin.to_owned());
        }
        if reg.exact {
            self.exact.insert(tag);
        }
        self.ancestry.insert(tag, reg.ancestors);
        // Splice this type between its declared descendants and their
        // old chains, so descendant resolution finds it nearest.
        for descendant in reg.descendants {
            let chain = self.ancestry.entry(descendant).or_default();
            chain.retain(|a| *a != tag);
            chain.insert(0, tag);
        }
        for (op, support) in reg.ops {
            self.ops.entry(op).or_default().by_type.insert(tag, support);
        }
        // A new type may be covered by probe-backed operations registered
        // before it existed.
        for table in self.ops.values_mut() {
            if table.by_type.contains_key(&tag) {
                continue;
            }
            if let Some(probe) = &table.probe {
                if let Some(support) = probe(tag) {
                    table.by_type.insert(tag, support);
                }
            }
        }
        self.cache.borrow_mut().clear();
    }

    /// Install an operation with a probe that decides, per type, whether
    /// the operation applies. The probe runs now for every known type and
    /// again for types registered later. An `exact` operation never
    /// falls back along type ancestry.
    pub fn register_op(&mut self, name: impl Into<String>, probe: ProbeFn, exact: bool) {
        let name = name.into();
        let known: Vec<TypeTag> = self.ancestry.keys().copied().collect();
        let table = self.ops.entry(name).or_default();
        table.exact = exact;
        for tag in known {
            if table.by_type.contains_key(&tag) {
                continue;
            }
            if let Some(support) = probe(tag) {
                table.by_type.insert(tag, support);
            }
        }
        table.probe = Some(probe);
        self.cache.borrow_mut().clear();
    }

    fn lookup(&self, tag: TypeTag, op: &str) -> Option<Resolution> {
        let support = self.ops.get(op)?.by_type.get(&tag)?;
        Some(match support {
            OpSupport::Handles(h) => Resolution::Handler(h.clone()),
            OpSupport::Unsupported => Resolution::Unsupported,
        })
    }

    /// Resolve a handler for `target` and `op`, walking the target
    /// type's ancestry on an exact miss.
    pub fn resolve(&self, target: &Value, op: &str) -> Resolution {
        let tag = target.type_tag();
        let key = (tag, op.to_owned());
        if let Some(hit) = self.cache.borrow().get(&key) {
            return hit.clone();
        }
        let resolution = self.resolve_uncached(target, tag, op);
        self.cache.borrow_mut().insert(key, resolution.clone());
        resolution
    }

    fn resolve_uncached(&self, target: &Value, tag: TypeTag, op: &str) -> Resolution {
        if let Some(found) = self.lookup(tag, op) {
            return found;
        }
        if self.ops.get(op).is_some_and(|t| t.exact) {
            return Resolution::Missing;
        }
        // Nearest-first fuzzy walk: a breadth-first pass over declared
        // chains (an ancestor's own ancestors follow it), then the
        // value's self-reported tags, then Any.
        let mut queue: VecDeque<TypeTag> =
            self.ancestry.get(&tag).cloned().unwrap_or_default().into();
        if let Value::Foreign(v) = target {
            queue.extend(v.ancestor_tags());
        }
        let mut seen = FxHashSet::default();
        seen.insert(tag);
        seen.insert(TypeTag::Any);
        while let Some(ancestor) = queue.pop_front() {
            if !seen.insert(ancestor) {
                continue;
            }
            if let Some(chain) = self.ancestry.get(&ancestor) {
                queue.extend(chain.iter().copied());
            }
            if self.exact.contains(&ancestor) {
                continue;
            }
            if let Some(found) = self.lookup(ancestor, op) {
                return found;
            }
        }
        // The universal ancestor answers only when nothing nearer did.
        if !self.exact.contains(&TypeTag::Any) {
            if let Some(found) = self.lookup(TypeTag::Any, op) {
                return found;
            }
        }
        Resolution::Missing
    }

    /// Like `resolve`, but turns a miss into an `UnregisteredTarget`
    /// error naming the types that do support the operation.
    pub fn resolve_or_err(
        &self,
        target: &Value,
        op: &str,
        path: &Path,
    ) -> Result<Handler, GleanError> {
        match self.resolve(target, op) {
            Resolution::Handler(h) => Ok(h),
            Resolution::Unsupported | Resolution::Missing => Err(GleanError::unregistered(
                op,
                self.name_of(target),
                self.expected_for(op),
                path.clone(),
            )),
        }
    }

    fn name_of(&self, target: &Value) -> String {
        self.names
            .get(&target.type_tag())
            .cloned()
            .unwrap_or_else(|| target.type_name().to_owned())
    }

    fn expected_for(&self, op: &str) -> String {
        let mut names: Vec<String> = self
            .ops
            .get(op)
            .map(|table| {
                table
                    .by_type
                    .iter()
                    .filter(|(_, support)| matches!(support, OpSupport::Handles(_)))
                    .map(|(tag, _)| {
                        self.names
                            .get(tag)
                            .cloned()
                            .or_else(|| tag.builtin_name().map(str::to_owned))
                            .unwrap_or_else(|| format!("{tag:?}"))
                    })
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names.dedup();
        names.join(", ")
    }
}

mod builtin {
    use glean_value::{access, Value};

    use crate::path::Path;

    pub fn map_get(target: &Value, key: &Value, _path: &Path) -> Result<Value, String> {
        match access::item_get(target, key) {
            Ok(v) => Ok(v),
            // Dotted-path text carries string keys; retry integer-looking
            // ones as ints before giving up.
            Err(first) => {
                if let Value::Str(s) = key {
                    if let Ok(n) = s.parse::<i64>() {
                        return access::item_get(target, &Value::Int(n)).map_err(|_| first);
                    }
                }
                Err(first)
            }
        }
    }

    pub fn map_keys(target: &Value) -> Result<Vec<Value>, String> {
        match target {
            Value::Map(m) => Ok(m.borrow().keys().cloned().collect()),
            other => Err(format!("'{}' has no keys", other.type_name())),
        }
    }

    pub fn map_assign(target: &Value, key: &Value, value: Value) -> Result<(), String> {
        access::item_set(target, key, value)
    }

    pub fn map_delete(target: &Value, key: &Value) -> Result<(), String> {
        access::item_del(target, key)
    }

    pub fn list_get(target: &Value, key: &Value, _path: &Path) -> Result<Value, String> {
        match key {
            // String keys from dotted-path text must read as indices.
            Value::Str(s) => {
                let idx: i64 = s
                    .parse()
                    .map_err(|_| format!("invalid index: {key}"))?;
                access::item_get(target, &Value::Int(idx))
            }
            _ => access::item_get(target, key),
        }
    }

    pub fn seq_iterate(target: &Value) -> Result<Vec<Value>, String> {
        match target {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Tuple(items) => Ok(items.to_vec()),
            Value::Set(items) => Ok(items.borrow().iter().cloned().collect()),
            other => Err(format!("'{}' is not iterable", other.type_name())),
        }
    }

    pub fn list_assign(target: &Value, key: &Value, value: Value) -> Result<(), String> {
        access::item_set(target, key, value)
    }

    pub fn list_delete(target: &Value, key: &Value) -> Result<(), String> {
        access::item_del(target, key)
    }

    pub fn str_iterate(target: &Value) -> Result<Vec<Value>, String> {
        match target {
            Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
            other => Err(format!("'{}' is not iterable", other.type_name())),
        }
    }

    pub fn set_delete(target: &Value, key: &Value) -> Result<(), String> {
        access::item_del(target, key)
    }

    pub fn default_get(target: &Value, key: &Value, _path: &Path) -> Result<Value, String> {
        match (target, key) {
            (Value::Foreign(_), Value::Str(name)) => access::attr_get(target, name),
            _ => access::item_get(target, key),
        }
    }
}
