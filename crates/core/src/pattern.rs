/// 連番・日付が有効なのにプレースホルダが無い場合、パターンへ自動挿入する。
/// 連番は最後の `{ext}` の直前(区切りのドットがあればその前、`{ext}` が無ければ
/// 末尾)、日付は `{ext}` より手前にある `{sequence}` の直後、無ければ `{ext}` の
/// 直前、どちらも無ければ末尾。
pub fn auto_insert_tokens(pattern: &str, sequential: bool, use_custom_date: bool) -> String {
    let mut pattern = pattern.to_string();

    if sequential && !pattern.contains("{sequence}") {
        match pattern.rfind("{ext}") {
            Some(ext_pos) => {
                let at = insert_point_before_ext(&pattern, ext_pos);
                pattern.insert_str(at, "_{sequence}");
            }
            None => pattern.push_str("_{sequence}"),
        }
    }

    if use_custom_date && !pattern.contains("{date}") {
        match pattern.rfind("{ext}") {
            Some(ext_pos) => match pattern.rfind("{sequence}") {
                Some(seq_pos) if seq_pos < ext_pos => {
                    pattern.insert_str(seq_pos + "{sequence}".len(), "_{date}");
                }
                _ => {
                    let at = insert_point_before_ext(&pattern, ext_pos);
                    pattern.insert_str(at, "_{date}");
                }
            },
            None => pattern.push_str("_{date}"),
        }
    }

    pattern
}

// `{ext}` の直前にパターン作者が書いた区切りドットは拡張子側に付けておく。
fn insert_point_before_ext(pattern: &str, ext_pos: usize) -> usize {
    if pattern[..ext_pos].ends_with('.') {
        ext_pos - 1
    } else {
        ext_pos
    }
}

/// 4つのプレースホルダを1パスで置換する。置換後の値は再走査しないため、
/// 値の中に `{ext}` 等が含まれていても再置換は起きない。未知のトークンは
/// そのまま残す。
pub fn substitute(
    pattern: &str,
    original_name: &str,
    sequence: &str,
    date: &str,
    ext: &str,
) -> String {
    let mut out = String::with_capacity(pattern.len() + original_name.len());
    let mut rest = pattern;

    loop {
        let Some(open) = rest.find('{') else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            break;
        };

        match &tail[..=close] {
            "{original_name}" => {
                out.push_str(original_name);
                rest = &tail[close + 1..];
            }
            "{sequence}" => {
                out.push_str(sequence);
                rest = &tail[close + 1..];
            }
            "{date}" => {
                out.push_str(date);
                rest = &tail[close + 1..];
            }
            "{ext}" => {
                out.push_str(ext);
                rest = &tail[close + 1..];
            }
            _ => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out
}
