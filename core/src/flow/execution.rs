// cartsync/src/flow/execution.rs

//! `Flow::run()`.

use crate::error::SyncError;
use crate::flow::control::{FlowControl, FlowOutcome};
use crate::flow::definition::{Flow, Phase};
use crate::shared::Shared;
use tracing::{event, span, Instrument, Level};

impl<T, Err> Flow<T, Err>
where
  T: Send + Sync + 'static,
  Err: std::error::Error + From<SyncError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx`.
  ///
  /// A step runs its `before`, `on` and `after` handlers in that order. The
  /// first handler to return `FlowControl::Stop` ends the run with
  /// `FlowOutcome::Stopped`; the first error is returned as is. A
  /// non-optional step with no handlers at all fails with
  /// `SyncError::HandlerMissing`.
  pub async fn run(&self, ctx: Shared<T>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, flow = self.name, num_steps = self.steps.len(), "Flow starting.");

    for (step_index, step) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::DEBUG,
        "flow_step",
        flow = self.name,
        step_name = step.name.as_str(),
        step_index
      );

      if let Some(skip_if) = &step.skip_if {
        if skip_if(&ctx) {
          step_span.in_scope(|| event!(Level::DEBUG, "Step skipped by its skip condition."));
          continue;
        }
      }

      let has_handlers = Phase::ALL
        .iter()
        .any(|phase| !self.handlers(*phase, &step.name).is_empty());
      if !has_handlers {
        if step.optional {
          step_span.in_scope(|| event!(Level::DEBUG, "Optional step has no handlers, skipping."));
          continue;
        }
        step_span.in_scope(|| event!(Level::ERROR, "Non-optional step has no handlers."));
        return Err(Err::from(SyncError::HandlerMissing {
          step_name: step.name.clone(),
        }));
      }

      for phase in Phase::ALL {
        let control = self
          .run_phase(phase, &step.name, &ctx)
          .instrument(step_span.clone())
          .await?;
        if control == FlowControl::Stop {
          step_span.in_scope(|| event!(Level::DEBUG, phase = phase.as_str(), "Flow stopped by handler."));
          return Ok(FlowOutcome::Stopped);
        }
      }
    }

    event!(Level::DEBUG, flow = self.name, "Flow completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_phase(&self, phase: Phase, step_name: &str, ctx: &Shared<T>) -> Result<FlowControl, Err> {
    for (handler_index, handler) in self.handlers(phase, step_name).iter().enumerate() {
      match handler(ctx.clone()).await {
        Ok(FlowControl::Continue) => {}
        Ok(FlowControl::Stop) => return Ok(FlowControl::Stop),
        Err(e) => {
          event!(Level::WARN, phase = phase.as_str(), handler_index, error = %e, "Flow handler failed.");
          return Err(e);
        }
      }
    }
    Ok(FlowControl::Continue)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::SkipCondition;
  use std::sync::Arc;

  #[derive(Default)]
  struct Trace {
    visited: Vec<String>,
  }

  fn visit(name: &'static str) -> impl Fn(Shared<Trace>) -> std::future::Ready<Result<FlowControl, SyncError>> {
    move |ctx: Shared<Trace>| {
      ctx.write().visited.push(name.to_string());
      std::future::ready(Ok(FlowControl::Continue))
    }
  }

  #[tokio::test]
  async fn phases_run_in_order_within_each_step() {
    let mut flow = Flow::<Trace, SyncError>::new("order", &[("a", false, None), ("b", false, None)]);
    flow.after_step("a", visit("a.after"));
    flow.on_step("a", visit("a.on"));
    flow.before_step("a", visit("a.before"));
    flow.on_step("b", visit("b.on"));

    let ctx = Shared::new(Trace::default());
    let outcome = flow.run(ctx.clone()).await.unwrap();

    assert_eq!(outcome, FlowOutcome::Completed);
    assert_eq!(ctx.read().visited, vec!["a.before", "a.on", "a.after", "b.on"]);
  }

  #[tokio::test]
  async fn stop_skips_the_rest_of_the_flow() {
    let mut flow = Flow::<Trace, SyncError>::new("stop", &[("a", false, None), ("b", false, None)]);
    flow.on_step("a", |ctx: Shared<Trace>| async move {
      ctx.write().visited.push("a.on".to_string());
      Ok::<_, SyncError>(FlowControl::Stop)
    });
    flow.after_step("a", visit("a.after"));
    flow.on_step("b", visit("b.on"));

    let ctx = Shared::new(Trace::default());
    assert_eq!(flow.run(ctx.clone()).await.unwrap(), FlowOutcome::Stopped);
    assert_eq!(ctx.read().visited, vec!["a.on"]);
  }

  #[tokio::test]
  async fn skip_condition_and_optional_steps() {
    let always: SkipCondition<Trace> = Arc::new(|_| true);
    let mut flow = Flow::<Trace, SyncError>::new(
      "skips",
      &[("skipped", false, Some(always)), ("empty_optional", true, None), ("last", false, None)],
    );
    flow.on_step("skipped", visit("skipped.on"));
    flow.on_step("last", visit("last.on"));

    let ctx = Shared::new(Trace::default());
    assert_eq!(flow.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);
    assert_eq!(ctx.read().visited, vec!["last.on"]);
  }

  #[tokio::test]
  async fn required_step_without_handlers_fails() {
    let flow = Flow::<Trace, SyncError>::new("missing", &[("nothing_here", false, None)]);
    match flow.run(Shared::new(Trace::default())).await {
      Err(SyncError::HandlerMissing { step_name }) => assert_eq!(step_name, "nothing_here"),
      other => panic!("expected HandlerMissing, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn handler_error_is_returned_and_later_steps_do_not_run() {
    let mut flow = Flow::<Trace, SyncError>::new("fails", &[("a", false, None), ("b", false, None)]);
    flow.on_step("a", |_ctx: Shared<Trace>| async move {
      Err::<FlowControl, _>(SyncError::Validation("nope".to_string()))
    });
    flow.on_step("b", visit("b.on"));

    let ctx = Shared::new(Trace::default());
    let err = flow.run(ctx.clone()).await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(ref m) if m == "nope"));
    assert!(ctx.read().visited.is_empty());
  }

  #[test]
  #[should_panic(expected = "not found in flow")]
  fn registering_on_unknown_step_panics() {
    let mut flow = Flow::<Trace, SyncError>::new("typo", &[("real", false, None)]);
    flow.on_step("reel", visit("reel"));
  }
}
