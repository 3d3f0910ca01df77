use crate::options::OptionsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 対応する日付フォーマットは4種類のみ。キーは設定値としてそのまま保存される。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateFormat {
    Ymd,
    YmdDashed,
    Dmy,
    DmyDashed,
}

impl DateFormat {
    pub fn from_key(key: &str) -> Result<Self, OptionsError> {
        match key {
            "YYYYMMDD" => Ok(DateFormat::Ymd),
            "YYYY-MM-DD" => Ok(DateFormat::YmdDashed),
            "DDMMYYYY" => Ok(DateFormat::Dmy),
            "DD-MM-YYYY" => Ok(DateFormat::DmyDashed),
            other => Err(OptionsError::UnknownDateFormat(other.to_string())),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            DateFormat::Ymd => "YYYYMMDD",
            DateFormat::YmdDashed => "YYYY-MM-DD",
            DateFormat::Dmy => "DDMMYYYY",
            DateFormat::DmyDashed => "DD-MM-YYYY",
        }
    }

    fn chrono_format(self) -> &'static str {
        match self {
            DateFormat::Ymd => "%Y%m%d",
            DateFormat::YmdDashed => "%Y-%m-%d",
            DateFormat::Dmy => "%d%m%Y",
            DateFormat::DmyDashed => "%d-%m-%Y",
        }
    }
}

/// 連番をゼロ埋めで整形する。桁あふれは切り詰めずそのまま出力する。
pub fn format_sequence(n: u32, digits: usize) -> String {
    if digits > 0 {
        format!("{:0width$}", n, width = digits)
    } else {
        n.to_string()
    }
}

/// 入力フォーマットで厳密にパースし、出力フォーマットへ整形し直す。
/// パースできない場合は None(呼び出し側が警告を出してプレースホルダを空にする)。
pub fn format_date(raw: &str, input: DateFormat, output: DateFormat) -> Option<String> {
    let date = NaiveDate::parse_from_str(raw, input.chrono_format()).ok()?;
    Some(date.format(output.chrono_format()).to_string())
}
