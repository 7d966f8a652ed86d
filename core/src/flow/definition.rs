// cartsync/src/flow/definition.rs

//! The `Flow<T, Err>` type and its construction.

use crate::error::SyncError;
use crate::flow::control::FlowControl;
use crate::flow::step::{SkipCondition, StepDef};
use crate::shared::Shared;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A boxed async step handler over the flow's shared context.
///
/// Handlers must drop any `Shared` guard before their first `.await`.
pub type Handler<T, Err> =
  Box<dyn Fn(Shared<T>) -> Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>> + Send + Sync>;

/// Where in a step a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub(crate) const ALL: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  pub(crate) fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

/// An ordered list of named steps over a context `T`, with handlers
/// returning `Err`.
///
/// `Err` must be buildable from `SyncError` so that setup problems found at
/// run time (a required step with no handlers) surface through the same
/// error type as handler failures.
pub struct Flow<T, Err>
where
  T: Send + Sync + 'static,
  Err: std::error::Error + From<SyncError> + Send + Sync + 'static,
{
  pub(crate) name: &'static str,
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) before: HashMap<String, Vec<Handler<T, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<T, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T, Err>>>,
}

impl<T, Err> Flow<T, Err>
where
  T: Send + Sync + 'static,
  Err: std::error::Error + From<SyncError> + Send + Sync + 'static,
{
  /// Creates a flow from `(step_name, optional, skip_if)` triples.
  pub fn new(name: &'static str, step_defs: &[(&str, bool, Option<SkipCondition<T>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional, skip_if)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name,
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Panics on an unknown step name: flows are wired once at construction,
  /// so a typo here is a programming error rather than a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("cartsync setup error: step '{}' not found in flow '{}'.", step_name, self.name);
    }
  }

  pub(crate) fn handlers(&self, phase: Phase, step_name: &str) -> &[Handler<T, Err>] {
    let table = match phase {
      Phase::Before => &self.before,
      Phase::On => &self.on,
      Phase::After => &self.after,
    };
    table.get(step_name).map(Vec::as_slice).unwrap_or(&[])
  }

  pub(crate) fn handlers_mut(&mut self, phase: Phase) -> &mut HashMap<String, Vec<Handler<T, Err>>> {
    match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }
}
