use crate::options::{CaseMode, RenameOptions, SpaceMode};
use regex::Regex;

/// 1回の実行分のテキスト変換。正規表現はここで一度だけコンパイルする。
#[derive(Debug)]
pub struct TextTransforms {
    replace_old: String,
    replace_new: String,
    remove: Option<Regex>,
    space_mode: SpaceMode,
    case_mode: CaseMode,
}

impl TextTransforms {
    /// コンパイルに失敗した正規表現は無効化し、そのパターン文字列を返す。
    /// 失敗は致命的ではなく、削除ステップが no-op になるだけ。
    pub fn compile(options: &RenameOptions) -> (Self, Option<String>) {
        let mut invalid = None;
        let remove = match options.remove_regex.as_deref().filter(|p| !p.is_empty()) {
            Some(pattern) => match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(_) => {
                    invalid = Some(pattern.to_string());
                    None
                }
            },
            None => None,
        };

        let transforms = Self {
            replace_old: options.replace_old.clone(),
            replace_new: options.replace_new.clone(),
            remove,
            space_mode: options.space_mode,
            case_mode: options.case_mode,
        };
        (transforms, invalid)
    }

    /// 置換 → 正規表現削除 → 空白処理 → ケース変換。順序は固定。
    pub fn apply(&self, name: &str) -> String {
        let mut value = name.to_string();

        if !self.replace_old.is_empty() {
            value = value.replace(&self.replace_old, &self.replace_new);
        }

        if let Some(remove) = &self.remove {
            value = remove.replace_all(&value, "").into_owned();
        }

        value = match self.space_mode {
            SpaceMode::Keep => value,
            SpaceMode::StripAll => value.replace(' ', ""),
            SpaceMode::Underscore => value.replace(' ', "_"),
        };

        match self.case_mode {
            CaseMode::Keep => value,
            CaseMode::Upper => value.to_uppercase(),
            CaseMode::Lower => value.to_lowercase(),
            CaseMode::Capitalize => capitalize(&value),
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
