/// ファイル名として使えない文字を取り除く。置換ではなく除去。
pub fn sanitize_filename(value: &str) -> String {
    value.chars().filter(|ch| !is_disallowed_char(*ch)).collect()
}

fn is_disallowed_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}
