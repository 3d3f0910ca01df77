use crate::tokens::DateFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CaseMode {
    Keep,
    Upper,
    Lower,
    Capitalize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpaceMode {
    Keep,
    StripAll,
    Underscore,
}

/// 衝突時の最終的な振る舞い。上書きと連番付与が同時に有効な場合は上書きが優先。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConflictPolicy {
    Overwrite,
    AddIncrement,
    Skip,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("出力パターンが空です")]
    EmptyPattern,
    #[error("開始番号は1以上の整数を指定してください")]
    InvalidStartNum,
    #[error("桁数は1以上の整数を指定してください")]
    InvalidDigits,
    #[error("未対応の日付フォーマットです: {0}")]
    UnknownDateFormat(String),
    #[error("未対応のケース変換です: {0}")]
    UnknownCaseMode(String),
    #[error("未対応の空白処理です: {0}")]
    UnknownSpaceMode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameOptions {
    pub output_pattern: String,
    pub replace_old: String,
    pub replace_new: String,
    pub remove_regex: Option<String>,
    pub case_mode: CaseMode,
    pub space_mode: SpaceMode,
    pub sequential: bool,
    pub start_num: u32,
    pub digits: usize,
    pub use_custom_date: bool,
    pub date_value: String,
    pub date_input_format: DateFormat,
    pub date_output_format: DateFormat,
    pub ignore_ext_case: bool,
    pub overwrite_on_conflict: bool,
    pub add_increment_on_conflict: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            output_pattern: String::new(),
            replace_old: String::new(),
            replace_new: String::new(),
            remove_regex: None,
            case_mode: CaseMode::Keep,
            space_mode: SpaceMode::Keep,
            sequential: false,
            start_num: 1,
            digits: 3,
            use_custom_date: false,
            date_value: String::new(),
            date_input_format: DateFormat::Ymd,
            date_output_format: DateFormat::Ymd,
            ignore_ext_case: true,
            overwrite_on_conflict: false,
            add_increment_on_conflict: true,
        }
    }
}

impl RenameOptions {
    /// 計画開始前の事前検証。ここで弾かれた設定は計画を生成しない。
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.output_pattern.trim().is_empty() {
            return Err(OptionsError::EmptyPattern);
        }
        if self.start_num == 0 {
            return Err(OptionsError::InvalidStartNum);
        }
        if self.digits == 0 {
            return Err(OptionsError::InvalidDigits);
        }
        Ok(())
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        if self.overwrite_on_conflict {
            ConflictPolicy::Overwrite
        } else if self.add_increment_on_conflict {
            ConflictPolicy::AddIncrement
        } else {
            ConflictPolicy::Skip
        }
    }
}

impl CaseMode {
    pub fn from_key(key: &str) -> Result<Self, OptionsError> {
        match key {
            "keep" => Ok(CaseMode::Keep),
            "upper" => Ok(CaseMode::Upper),
            "lower" => Ok(CaseMode::Lower),
            "capitalize" => Ok(CaseMode::Capitalize),
            other => Err(OptionsError::UnknownCaseMode(other.to_string())),
        }
    }
}

impl SpaceMode {
    pub fn from_key(key: &str) -> Result<Self, OptionsError> {
        match key {
            "keep" => Ok(SpaceMode::Keep),
            "strip" => Ok(SpaceMode::StripAll),
            "underscore" => Ok(SpaceMode::Underscore),
            other => Err(OptionsError::UnknownSpaceMode(other.to_string())),
        }
    }
}
