mod planner;
mod types;

pub use planner::plan_targets;
pub use types::{DownloadTarget, PlanSummary, TargetPlan};
