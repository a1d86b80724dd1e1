//! Deferred path expressions and ordered access paths.
//!
//! A `PathExpr` records a chain of accesses against a symbolic root
//! (`T` for the target, `S` for the scope, `A` for assignment) without
//! executing anything. Operations are stored as a reverse-linked chain
//! of `Rc<OpNode>` so that extending an expression shares the existing
//! prefix instead of copying it.

mod parse;

pub use parse::parse_expr;

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use glean_value::{
    ops::{BinaryOp, UnaryOp},
    Value,
};

use crate::spec::Spec;

/// Symbolic root of a path expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Root {
    /// The current target.
    Target,
    /// The evaluation scope.
    Scope,
    /// Assignment into the target reached through the scope.
    Assign,
}

impl Root {
    fn symbol(self) -> &'static str {
        match self {
            Root::Target => "T",
            Root::Scope => "S",
            Root::Assign => "A",
        }
    }
}

/// One recorded operation in a path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOp {
    /// Attribute access, `.name`.
    Attr(Rc<str>),
    /// Index access, `[key]`.
    Item(Value),
    /// Generic segment: registry-dispatched get, used by dotted paths.
    Seg(Value),
    /// Call with spec arguments, `(args..., k=v, ...)`.
    Call {
        args: Rc<[Spec]>,
        kwargs: Rc<[(Rc<str>, Spec)]>,
    },
    /// Binary operation against an operand spec.
    Binary(BinaryOp, Rc<Spec>),
    /// Unary operation.
    Unary(UnaryOp),
    /// Single-level wildcard expansion, `.*`.
    Star,
    /// Recursive wildcard expansion, `.**`.
    DeepStar,
}

impl Eq for PathOp {}

impl Hash for PathOp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            PathOp::Attr(name) => name.hash(state),
            PathOp::Item(v) | PathOp::Seg(v) => v.hash(state),
            PathOp::Call { args, kwargs } => {
                args.hash(state);
                kwargs.hash(state);
            }
            PathOp::Binary(op, operand) => {
                op.hash(state);
                operand.hash(state);
            }
            PathOp::Unary(op) => op.hash(state),
            PathOp::Star | PathOp::DeepStar => {}
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct OpNode {
    op: PathOp,
    prev: Option<Rc<OpNode>>,
}

/// A deferred access expression rooted at `T`, `S`, or `A`.
///
/// Cloning is cheap and extending shares structure: `base.attr("a")` and
/// `base.attr("b")` both point at `base`'s chain.
#[derive(Debug, Clone)]
pub struct PathExpr {
    root: Root,
    tail: Option<Rc<OpNode>>,
    len: usize,
}

/// A fresh expression rooted at the current target.
pub fn t() -> PathExpr {
    PathExpr::new(Root::Target)
}

/// A fresh expression rooted at the evaluation scope.
pub fn s() -> PathExpr {
    PathExpr::new(Root::Scope)
}

/// A fresh assignment expression.
pub fn a() -> PathExpr {
    PathExpr::new(Root::Assign)
}

impl PathExpr {
    fn new(root: Root) -> PathExpr {
        PathExpr { root, tail: None, len: 0 }
    }

    fn push(&self, op: PathOp) -> PathExpr {
        PathExpr {
            root: self.root,
            tail: Some(Rc::new(OpNode { op, prev: self.tail.clone() })),
            len: self.len + 1,
        }
    }

    /// Append an attribute access.
    pub fn attr(&self, name: impl Into<Rc<str>>) -> PathExpr {
        self.push(PathOp::Attr(name.into()))
    }

    /// Append an index access.
    pub fn item(&self, key: impl Into<Value>) -> PathExpr {
        self.push(PathOp::Item(key.into()))
    }

    /// Append a registry-dispatched segment access.
    pub fn seg(&self, key: impl Into<Value>) -> PathExpr {
        self.push(PathOp::Seg(key.into()))
    }

    /// Append a call with positional spec arguments.
    pub fn call(&self, args: Vec<Spec>) -> PathExpr {
        self.push(PathOp::Call { args: args.into(), kwargs: Rc::from(vec![]) })
    }

    /// Append a call with positional and keyword spec arguments.
    pub fn call_kw(&self, args: Vec<Spec>, kwargs: Vec<(Rc<str>, Spec)>) -> PathExpr {
        self.push(PathOp::Call { args: args.into(), kwargs: kwargs.into() })
    }

    /// Append a binary operation whose operand is itself a spec.
    pub fn binary(&self, op: BinaryOp, operand: impl Into<Spec>) -> PathExpr {
        self.push(PathOp::Binary(op, Rc::new(operand.into())))
    }

    /// Append a unary operation.
    pub fn unary(&self, op: UnaryOp) -> PathExpr {
        self.push(PathOp::Unary(op))
    }

    /// Append a single-level wildcard.
    pub fn star(&self) -> PathExpr {
        self.push(PathOp::Star)
    }

    /// Append a recursive wildcard.
    pub fn deep_star(&self) -> PathExpr {
        self.push(PathOp::DeepStar)
    }

    /// Root of this expression.
    pub fn root(&self) -> Root {
        self.root
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the expression is a bare root.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Operations in application order.
    pub fn ops(&self) -> SmallVec<[&PathOp; 8]> {
        let mut out: SmallVec<[&PathOp; 8]> = SmallVec::with_capacity(self.len);
        let mut node = self.tail.as_deref();
        while let Some(n) = node {
            out.push(&n.op);
            node = n.prev.as_deref();
        }
        out.reverse();
        out
    }

    /// The expression truncated to its first `n` operations.
    pub fn prefix(&self, n: usize) -> PathExpr {
        if n >= self.len {
            return self.clone();
        }
        // Rebuild by walking back to depth n; shares nothing past it.
        let mut node = self.tail.as_deref();
        let mut depth = self.len;
        while depth > n {
            match node {
                Some(m) => {
                    node = m.prev.as_deref();
                    depth -= 1;
                }
                None => break,
            }
        }
        let mut expr = PathExpr::new(self.root);
        let mut kept: SmallVec<[&PathOp; 8]> = SmallVec::new();
        let mut cur = node;
        while let Some(m) = cur {
            kept.push(&m.op);
            cur = m.prev.as_deref();
        }
        for op in kept.iter().rev() {
            expr = expr.push((*op).clone());
        }
        expr
    }

    /// Check structural well-formedness.
    ///
    /// Assignment roots admit only attribute, item, and segment
    /// operations, and require at least one of them.
    pub fn validate(&self) -> Result<(), String> {
        if self.root == Root::Assign {
            if self.is_empty() {
                return Err("assignment expression needs at least one access".into());
            }
            for op in self.ops() {
                match op {
                    PathOp::Attr(_) | PathOp::Item(_) | PathOp::Seg(_) => {}
                    other => {
                        return Err(format!(
                            "assignment expression cannot contain {other:?}"
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for PathExpr {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.len == other.len && self.ops() == other.ops()
    }
}

impl Eq for PathExpr {}

impl Hash for PathExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        for op in self.ops() {
            op.hash(state);
        }
    }
}

macro_rules! path_binop {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Spec>> std::ops::$trait<R> for PathExpr {
            type Output = PathExpr;
            fn $method(self, rhs: R) -> PathExpr {
                self.binary($op, rhs)
            }
        }
    };
}

path_binop!(Add, add, BinaryOp::Add);
path_binop!(Sub, sub, BinaryOp::Sub);
path_binop!(Mul, mul, BinaryOp::Mul);
path_binop!(Div, div, BinaryOp::Div);
path_binop!(Rem, rem, BinaryOp::Mod);
path_binop!(BitAnd, bitand, BinaryOp::BitAnd);
path_binop!(BitOr, bitor, BinaryOp::BitOr);
path_binop!(BitXor, bitxor, BinaryOp::BitXor);

impl std::ops::Neg for PathExpr {
    type Output = PathExpr;
    fn neg(self) -> PathExpr {
        self.unary(UnaryOp::Neg)
    }
}

impl std::ops::Not for PathExpr {
    type Output = PathExpr;
    fn not(self) -> PathExpr {
        self.unary(UnaryOp::Invert)
    }
}

fn is_bare_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_seg(f: &mut fmt::Formatter<'_>, key: &Value) -> fmt::Result {
    // Dotted rendering when the segment reads back as an identifier.
    match key {
        Value::Str(s) if is_bare_ident(s) => write!(f, ".{s}"),
        other => write!(f, "[{other}]"),
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops = self.ops();
        // Operator ops wrap the whole rendered prefix in parentheses, so
        // scan for the outermost one and recurse through prefixes.
        if let Some((idx, op)) = ops
            .iter()
            .enumerate()
            .rev()
            .find(|(_, op)| matches!(op, PathOp::Binary(..) | PathOp::Unary(_)))
        {
            let head = self.prefix(idx);
            match op {
                PathOp::Binary(bin, operand) => {
                    write!(f, "({head} {} {operand})", bin.as_symbol())?;
                }
                PathOp::Unary(un) => {
                    write!(f, "({}{head})", un.as_symbol())?;
                }
                _ => unreachable!("filtered above"),
            }
            for later in &ops[idx + 1..] {
                write_op(f, later)?;
            }
            return Ok(());
        }
        f.write_str(self.root.symbol())?;
        for op in ops {
            write_op(f, op)?;
        }
        Ok(())
    }
}

fn write_op(f: &mut fmt::Formatter<'_>, op: &PathOp) -> fmt::Result {
    match op {
        PathOp::Attr(name) => write!(f, ".{name}"),
        PathOp::Item(key) => write!(f, "[{key}]"),
        PathOp::Seg(key) => write_seg(f, key),
        PathOp::Call { args, kwargs } => {
            f.write_str("(")?;
            let mut first = true;
            for arg in args.iter() {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{arg}")?;
            }
            for (name, arg) in kwargs.iter() {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{name}={arg}")?;
            }
            f.write_str(")")
        }
        PathOp::Star => f.write_str(".*"),
        PathOp::DeepStar => f.write_str(".**"),
        PathOp::Binary(..) | PathOp::Unary(_) => {
            unreachable!("operator ops are rendered by the prefix scan")
        }
    }
}

const TEXT_CACHE_CAP: usize = 512;

thread_local! {
    static TEXT_CACHE: RefCell<FxHashMap<Rc<str>, Path>> =
        RefCell::new(FxHashMap::default());
}

/// An ordered access path: a target-rooted expression used both as a
/// runnable spec and as positional context inside errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    expr: PathExpr,
}

impl Path {
    /// Build a path from explicit segment keys.
    pub fn new(segments: Vec<Value>) -> Path {
        let mut expr = t();
        for seg in segments {
            expr = expr.seg(seg);
        }
        Path { expr }
    }

    /// Parse dotted-path text; each dot-separated piece becomes a string
    /// segment. Parses are memoized per thread.
    pub fn from_text(text: &str) -> Path {
        TEXT_CACHE.with(|cache| {
            if let Some(path) = cache.borrow().get(text) {
                return path.clone();
            }
            let mut expr = t();
            if !text.is_empty() {
                for piece in text.split('.') {
                    expr = expr.seg(Value::string(piece));
                }
            }
            let path = Path { expr };
            let mut cache = cache.borrow_mut();
            if cache.len() >= TEXT_CACHE_CAP {
                cache.clear();
            }
            cache.insert(Rc::from(text), path.clone());
            path
        })
    }

    /// Wrap an existing expression as a path.
    pub fn of_expr(expr: PathExpr) -> Path {
        Path { expr }
    }

    /// The underlying expression.
    pub fn expr(&self) -> &PathExpr {
        &self.expr
    }

    /// Number of operations in the path.
    pub fn len(&self) -> usize {
        self.expr.len()
    }

    /// Whether the path has no operations.
    pub fn is_empty(&self) -> bool {
        self.expr.is_empty()
    }

    /// Human-readable summary of the operation at `idx`.
    pub fn part(&self, idx: usize) -> Option<String> {
        let ops = self.expr.ops();
        ops.get(idx).map(|op| match op {
            PathOp::Attr(name) => format!("{}", Value::string(name.as_ref())),
            PathOp::Item(key) | PathOp::Seg(key) => format!("{key}"),
            PathOp::Call { .. } => "call".to_owned(),
            PathOp::Binary(bin, _) => bin.as_symbol().to_owned(),
            PathOp::Unary(un) => un.as_symbol().to_owned(),
            PathOp::Star => "*".to_owned(),
            PathOp::DeepStar => "**".to_owned(),
        })
    }

    /// The path truncated to its first `n` operations.
    pub fn slice(&self, n: usize) -> Path {
        Path { expr: self.expr.prefix(n) }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops = self.expr.ops();
        let all_segs = !ops.is_empty() && ops.iter().all(|op| matches!(op, PathOp::Seg(_)));
        if all_segs {
            f.write_str("Path(")?;
            for (i, op) in ops.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                if let PathOp::Seg(key) = op {
                    write!(f, "{key}")?;
                }
            }
            f.write_str(")")
        } else {
            write!(f, "Path({})", self.expr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extension_shares_the_prefix_chain() {
        let base = t().attr("a").attr("b");
        let left = base.attr("c");
        let right = base.attr("d");
        let left_ops = left.ops();
        let right_ops = right.ops();
        assert_eq!(left_ops[..2], right_ops[..2]);
        // Prefix nodes are literally the same allocations.
        assert!(std::ptr::eq(left_ops[0], right_ops[0]));
        assert!(std::ptr::eq(left_ops[1], right_ops[1]));
        assert!(!std::ptr::eq(left_ops[2], right_ops[2]));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let exprs = [
            t().attr("a").item(Value::string("b c")).item(Value::Int(3)),
            s().attr("names").item(Value::Int(-2)),
            a().attr("T").attr("a"),
            t().attr("items").star().attr("name"),
            t().deep_star(),
        ];
        for expr in exprs {
            let rendered = expr.to_string();
            let reparsed = parse_expr(&rendered).unwrap();
            assert_eq!(reparsed, expr, "round-trip of {rendered}");
        }
    }

    #[test]
    fn operator_ops_render_wrapped() {
        let expr = t().attr("a") + Spec::lit(1);
        assert_eq!(expr.to_string(), "(T.a + 1)");
        let neg = -t().attr("n");
        assert_eq!(neg.to_string(), "(-T.n)");
        let chained = (t().attr("a") + Spec::lit(1)).attr("b");
        assert_eq!(chained.to_string(), "(T.a + 1).b");
    }

    #[test]
    fn prefix_truncates_in_application_order() {
        let expr = t().attr("a").attr("b").attr("c");
        assert_eq!(expr.prefix(2), t().attr("a").attr("b"));
        assert_eq!(expr.prefix(0), t());
        assert_eq!(expr.prefix(9), expr);
    }

    #[test]
    fn assignment_validation_rejects_calls_and_bare_roots() {
        assert!(a().validate().is_err());
        assert!(a().seg("x").call(vec![]).validate().is_err());
        assert!(a().seg("T").seg("a").validate().is_ok());
    }

    #[test]
    fn dotted_path_parses_and_caches() {
        let p1 = Path::from_text("a.b.c");
        let p2 = Path::from_text("a.b.c");
        assert_eq!(p1, p2);
        assert_eq!(p1.to_string(), "Path('a', 'b', 'c')");
        assert_eq!(p1, Path::new(vec![
            Value::string("a"),
            Value::string("b"),
            Value::string("c"),
        ]));
    }

    #[test]
    fn part_summaries_name_each_operation() {
        let p = Path::of_expr(t().seg("a").attr("b").item(Value::Int(0)).call(vec![]));
        assert_eq!(p.part(0).as_deref(), Some("'a'"));
        assert_eq!(p.part(1).as_deref(), Some("'b'"));
        assert_eq!(p.part(2).as_deref(), Some("0"));
        assert_eq!(p.part(3).as_deref(), Some("call"));
        assert_eq!(p.part(4), None);
    }
}
