mod apply;
mod config;
mod options;
mod pattern;
mod planner;
mod sanitize;
mod tokens;
mod transform;

pub use apply::{execute_plan, ApplyResult, ExecutionOutcome, ExecutionStatus};
pub use config::{app_paths, load_config, save_config, AppConfig, AppPaths};
pub use options::{CaseMode, ConflictPolicy, OptionsError, RenameOptions, SpaceMode};
pub use pattern::{auto_insert_tokens, substitute};
pub use planner::{
    collect_candidate_files, generate_plan, plan, CandidateFile, ConflictKind, ConflictResolution,
    PlanEvent, PlanStats, RenamePlan, RenamePlanEntry,
};
pub use sanitize::sanitize_filename;
pub use tokens::{format_date, format_sequence, DateFormat};
pub use transform::TextTransforms;
