// cartsync/src/flow/mod.rs

//! A small async step runner. The synchronizer expresses its cart load,
//! write-through and checkout sequences as `Flow`s so each phase is named,
//! logged under its own span, and individually skippable or stoppable.

pub mod control;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod step;

pub use control::{FlowControl, FlowOutcome};
pub use definition::{Flow, Handler};
pub use step::{SkipCondition, StepDef};
