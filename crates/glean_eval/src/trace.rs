//! Branch-aware failure traces.
//!
//! After a top-level failure the evaluator walks the scope tree the run
//! left behind and captures a plain-data snapshot: one step per frame on
//! the `last_child` spine, with a fork into per-branch sub-traces at the
//! first frame that recorded two or more failed children. The snapshot
//! renders itself; it keeps no references into live scopes.

use crate::scope::Scope;

/// Default cap on rendered target/spec lines, in characters.
pub const DEFAULT_MAX_WIDTH: usize = 80;

/// One recorded evaluation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    /// Rendered spec for this step.
    pub spec: String,
    /// Rendered target, omitted when unchanged from the previous step.
    pub target: Option<String>,
    /// Sub-traces for a step whose children failed along several
    /// branches. Non-empty only on the last step of its snapshot.
    pub branches: Vec<TraceSnapshot>,
}

/// A captured failure trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceSnapshot {
    pub steps: Vec<TraceStep>,
}

fn clip(text: String, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text;
    }
    let len = text.chars().count();
    let keep: String = text.chars().take(max_width).collect();
    format!("{keep}... (len={len})")
}

fn render_target(scope: &Scope, max_width: usize) -> String {
    clip(scope.target().to_string(), max_width)
}

fn render_spec(scope: &Scope, max_width: usize) -> String {
    let mut line = scope.spec().map(|s| s.to_string()).unwrap_or_default();
    let segments = scope.path_segments();
    if !segments.is_empty() {
        if !line.is_empty() {
            line.push_str(" @ ");
        }
        line.push_str(&segments.join("/"));
    }
    clip(line, max_width)
}

impl TraceSnapshot {
    /// Capture the failure spine rooted at `scope`.
    pub fn capture(scope: &Scope, max_width: usize) -> TraceSnapshot {
        let mut steps = Vec::new();
        let mut prev_target: Option<String> = None;
        let mut cur = Some(scope.clone());
        while let Some(frame) = cur {
            let failed = frame.child_errors();
            let target = render_target(&frame, max_width);
            let target = if prev_target.as_deref() == Some(target.as_str()) {
                None
            } else {
                prev_target = Some(target.clone());
                Some(target)
            };
            let spec = render_spec(&frame, max_width);
            if failed.len() >= 2 {
                // Fork point: record the step, then one sub-trace per
                // failed branch, and stop walking the spine.
                let branches = failed
                    .iter()
                    .map(|branch| TraceSnapshot::capture(branch, max_width))
                    .collect();
                steps.push(TraceStep { spec, target, branches });
                break;
            }
            if !spec.is_empty() || target.is_some() {
                steps.push(TraceStep { spec, target, branches: Vec::new() });
            }
            cur = frame.last_child();
        }
        TraceSnapshot { steps }
    }

    fn render(&self, f: &mut std::fmt::Formatter<'_>, indent: usize) -> std::fmt::Result {
        let pad = " ".repeat(indent);
        for step in &self.steps {
            if let Some(target) = &step.target {
                writeln!(f, "{pad} - Target: {target}")?;
            }
            if !step.spec.is_empty() {
                writeln!(f, "{pad} + Spec: {}", step.spec)?;
            }
            for (i, branch) in step.branches.iter().enumerate() {
                let last = i + 1 == step.branches.len();
                let marker = if last { "\\" } else { "|" };
                writeln!(f, "{pad} {marker} Branch {}:", i + 1)?;
                branch.render(f, indent + 2)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for TraceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Target-spec trace (most recent last):")?;
        self.render(f, 0)
    }
}
