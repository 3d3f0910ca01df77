use crate::planner::RenamePlan;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExecutionStatus {
    Renamed,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApplyResult {
    pub renamed: usize,
    pub failed: usize,
    pub outcomes: Vec<ExecutionOutcome>,
}

/// 計画をエントリ単位のベストエフォートで適用する。1件の失敗は記録して
/// 次のエントリへ進み、バッチ全体は止めない。
pub fn execute_plan(plan: &RenamePlan) -> ApplyResult {
    let mut result = ApplyResult::default();

    for entry in &plan.entries {
        let status = match fs::rename(&entry.old_path, &entry.new_path) {
            Ok(()) => {
                result.renamed += 1;
                ExecutionStatus::Renamed
            }
            Err(err) => {
                result.failed += 1;
                ExecutionStatus::Failed {
                    reason: format!(
                        "リネームに失敗しました: {} -> {}: {}",
                        entry.old_path.display(),
                        entry.new_path.display(),
                        err
                    ),
                }
            }
        };
        result.outcomes.push(ExecutionOutcome {
            old_path: entry.old_path.clone(),
            new_path: entry.new_path.clone(),
            status,
        });
    }

    result
}
