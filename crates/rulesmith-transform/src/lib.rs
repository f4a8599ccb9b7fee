//! Label plans for rulesmith.
//!
//! A label plan is the deterministic program format: a rule set flattened
//! into winning order and evaluated with Polars `when/then/otherwise`
//! expressions. The same evaluator doubles as the reference labelling the
//! validator derives its expectations from.

mod error;
mod eval;
mod plan;

pub use error::{Result, TransformError};
pub use eval::{apply_plan, clause_expr, condition_expr, label_expr, label_frame, winning_labels};
pub use plan::{LabelPlan, PLAN_FORMAT, PlanRule, compile_plan};
