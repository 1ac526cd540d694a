use anyhow::{Context as _, Result};

use super::context::Context;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use dotstow::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("nothing configured".into());
/// let reported = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(reported, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped (nothing to do).
    Skipped(String),
    /// Task only inspected the system and changed nothing.
    DryRun,
}

/// Counters for batch tasks that process many items.
///
/// # Examples
///
/// ```
/// use dotstow::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Number of items changed or applied.
    pub changed: u32,
    /// Number of items already in the correct state.
    pub already_ok: u32,
    /// Number of items skipped due to errors or inapplicability.
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self) -> String {
        if self.skipped > 0 {
            format!(
                "{} changed, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} changed, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the task result.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary());
        TaskResult::Ok
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// Check each resource's current state and apply it where missing or
/// incorrect, in order.
///
/// `verb_for` names the action taken on each resource (e.g. "enable",
/// "restart") for log messages. A resource that cannot be checked or applied
/// is reported and the remaining resources still run.
///
/// # Errors
///
/// Returns an error naming every resource that failed.
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    verb_for: impl Fn(&R) -> &'static str,
) -> Result<TaskResult> {
    let mut stats = TaskStats::new();
    let mut failed = Vec::new();
    for resource in resources {
        match process_single(ctx, &resource, verb_for(&resource)) {
            Ok(delta) => stats += delta,
            Err(e) => {
                ctx.log.warn(&format!("{e:#}"));
                failed.push(resource.description());
            }
        }
    }

    if failed.is_empty() {
        return Ok(stats.finish(ctx));
    }
    ctx.log.info(&stats.summary());
    anyhow::bail!("{} failed: {}", failed.len(), failed.join(", "))
}

/// Check and, if needed, apply a single resource, returning a stats delta.
fn process_single<R: Resource>(ctx: &Context, resource: &R, verb: &str) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    let state = resource
        .current_state()
        .with_context(|| format!("checking {desc}"))?;
    match state {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Invalid { reason } => {
            ctx.log.debug(&format!("skipping {desc}: {reason}"));
            delta.skipped += 1;
        }
        ResourceState::Missing | ResourceState::Incorrect { .. } => {
            let change = resource
                .apply()
                .with_context(|| format!("failed to {verb} {desc}"))?;
            match change {
                ResourceChange::Applied => {
                    ctx.log.info(&format!("{verb}: {desc}"));
                    delta.changed += 1;
                }
                ResourceChange::AlreadyCorrect => delta.already_ok += 1,
                ResourceChange::Skipped { reason } => {
                    anyhow::bail!("failed to {verb} {desc}: {reason}");
                }
            }
        }
    }
    Ok(delta)
}
