//! Evaluation modes.
//!
//! The mode decides what the data-shaped spec variants mean: Auto reads
//! them as transformation templates, Fill reads them as literal
//! construction. Deferred expressions, paths, and custom nodes behave
//! the same in both modes and are handled before the mode is consulted.

mod auto;
mod fill;

use glean_value::{Flow, Value};

use crate::error::GleanError;
use crate::scope::Scope;
use crate::spec::Spec;

/// The ambient interpretation of data-shaped specs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Templates: text is a dotted path, a one-element list maps over
    /// the target, a tuple is a pipeline.
    #[default]
    Auto,
    /// Literal construction: data shapes build themselves, with inner
    /// specs evaluated recursively.
    Fill,
}

impl Mode {
    /// Interpret a data-shaped spec under this mode.
    pub(crate) fn interpret(
        self,
        target: &Value,
        spec: &Spec,
        scope: &Scope,
    ) -> Result<Flow, GleanError> {
        match self {
            Mode::Auto => auto::interpret(target, spec, scope),
            Mode::Fill => fill::interpret(target, spec, scope),
        }
    }
}

/// Invoke a bare callable spec with the target as its sole argument.
fn invoke(func: &glean_value::FuncValue, target: &Value) -> Result<Flow, GleanError> {
    func.call(&[target.clone()], &[])
        .map_err(|message| GleanError::wrapped(func.name().to_owned(), message))
}
