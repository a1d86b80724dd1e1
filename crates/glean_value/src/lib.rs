//! Glean Value - runtime value model for the glean data-shaping engine.
//!
//! This crate provides the dynamically typed values the engine evaluates
//! specs against, plus the primitive operations over them:
//!
//! - `Value`: the closed runtime union (scalars, containers, functions,
//!   foreign host values)
//! - `Heap`: single-threaded shared-ownership wrapper giving containers
//!   mutate-in-place semantics
//! - `Flow`: the tri-state step result (`Value`/`Skip`/`Stop`)
//! - `access`: plain attribute/item get, set, and delete
//! - `ops`: binary and unary arithmetic with checked integer math
//! - `TypeTag`/`ForeignValue`: concrete-type tokens and the host extension
//!   trait used by the dispatch registry

pub mod access;
mod flow;
mod func;
mod heap;
pub mod ops;
mod type_tag;
mod value;

pub use flow::Flow;
pub use func::FuncValue;
pub use heap::{Heap, WeakHeap};
pub use ops::{evaluate_binary, evaluate_unary, BinaryOp, UnaryOp};
pub use type_tag::{ForeignValue, TypeTag};
pub use value::{Value, ValueMap, ValueSet};
