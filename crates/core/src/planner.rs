use crate::options::{ConflictPolicy, RenameOptions};
use crate::pattern::{auto_insert_tokens, substitute};
use crate::sanitize::sanitize_filename;
use crate::tokens::{format_date, format_sequence, DateFormat};
use crate::transform::TextTransforms;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl CandidateFile {
    /// 拡張子は先頭のドット抜きで保持する。無ければ空文字。
    pub fn from_path(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path,
            stem,
            extension,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenamePlanEntry {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConflictKind {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConflictResolution {
    Overwrite,
    Increment,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanEvent {
    InvalidRemoveRegex {
        pattern: String,
    },
    InvalidDateValue {
        value: String,
        format: DateFormat,
    },
    Conflict {
        old_path: PathBuf,
        kind: ConflictKind,
        resolution: ConflictResolution,
        new_path: PathBuf,
    },
    SkippedUnchanged {
        old_path: PathBuf,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub scanned_files: usize,
    pub planned: usize,
    pub skipped_unchanged: usize,
    pub skipped_no_resolution: usize,
    pub conflicts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub pattern: String,
    pub entries: Vec<RenamePlanEntry>,
    pub events: Vec<PlanEvent>,
    pub stats: PlanStats,
}

/// フォルダを走査して実ファイルシステム相手に計画を立てる入口。
pub fn generate_plan(root: &Path, recursive: bool, options: &RenameOptions) -> Result<RenamePlan> {
    if !root.is_dir() {
        anyhow::bail!("フォルダが存在しません: {}", root.display());
    }
    let files = collect_candidate_files(root, recursive)?;
    plan(&files, options, |path| path.exists())
}

/// 走査順は決定的: 再帰なしはファイル名ソート、再帰ありは各階層で
/// ファイルを名前順に並べてからサブディレクトリへ降りる(os.walk と同じ
/// トップダウン順)。ディレクトリ自体は候補にしない。
pub fn collect_candidate_files(root: &Path, recursive: bool) -> Result<Vec<CandidateFile>> {
    let mut out = Vec::new();

    if recursive {
        // 同一階層ではファイルをディレクトリより先に出す。
        let walker = WalkDir::new(root).sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        });
        for entry in walker {
            let entry =
                entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
            if entry.path().is_dir() {
                continue;
            }
            out.push(CandidateFile::from_path(entry.path().to_path_buf()));
        }
    } else {
        let mut paths = Vec::new();
        for entry in fs::read_dir(root)
            .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            paths.push(path);
        }
        paths.sort();
        out.extend(paths.into_iter().map(CandidateFile::from_path));
    }

    Ok(out)
}

/// 候補リストから衝突のない計画を1パスで組み立てる。`exists` が計画中に
/// 参照する唯一のファイルシステム情報で、プレビューと適用で計画は一致する。
pub fn plan<F>(files: &[CandidateFile], options: &RenameOptions, exists: F) -> Result<RenamePlan>
where
    F: Fn(&Path) -> bool,
{
    options.validate()?;

    let mut events = Vec::new();
    let mut stats = PlanStats {
        scanned_files: files.len(),
        ..PlanStats::default()
    };

    let (transforms, invalid_regex) = TextTransforms::compile(options);
    if let Some(pattern) = invalid_regex {
        events.push(PlanEvent::InvalidRemoveRegex { pattern });
    }

    let formatted_date = if options.use_custom_date {
        match format_date(
            &options.date_value,
            options.date_input_format,
            options.date_output_format,
        ) {
            Some(date) => date,
            None => {
                events.push(PlanEvent::InvalidDateValue {
                    value: options.date_value.clone(),
                    format: options.date_input_format,
                });
                String::new()
            }
        }
    } else {
        String::new()
    };

    let pattern = auto_insert_tokens(
        &options.output_pattern,
        options.sequential,
        options.use_custom_date,
    );

    let mut entries = Vec::new();
    // 新パス → それを先に主張した旧パス。実行内の内部衝突検出に使う。
    let mut claimed = HashMap::<PathBuf, PathBuf>::new();
    let mut counter = options.start_num;

    for file in files {
        let processed = transforms.apply(&file.stem);
        // カウンタは展開直後・衝突判定前に進める。以降でスキップされても戻さない。
        let sequence = if options.sequential {
            let value = format_sequence(counter, options.digits);
            counter += 1;
            value
        } else {
            String::new()
        };
        let extension = if options.ignore_ext_case {
            file.extension.to_lowercase()
        } else {
            file.extension.clone()
        };

        let substituted = substitute(
            &pattern,
            &processed,
            &sequence,
            &formatted_date,
            &extension,
        );
        let new_basename = sanitize_filename(&substituted);

        let parent = file.path.parent().unwrap_or_else(|| Path::new(""));
        let candidate = parent.join(&new_basename);

        let conflict = if claimed
            .get(&candidate)
            .is_some_and(|claimant| claimant != &file.path)
        {
            Some(ConflictKind::Internal)
        } else if candidate != file.path && exists(&candidate) {
            Some(ConflictKind::External)
        } else {
            None
        };

        let final_path = match conflict {
            None => candidate,
            Some(kind) => {
                stats.conflicts += 1;
                match options.conflict_policy() {
                    ConflictPolicy::Overwrite => {
                        events.push(PlanEvent::Conflict {
                            old_path: file.path.clone(),
                            kind,
                            resolution: ConflictResolution::Overwrite,
                            new_path: candidate.clone(),
                        });
                        candidate
                    }
                    ConflictPolicy::AddIncrement => {
                        let resolved =
                            next_free_increment(parent, &new_basename, &claimed, &exists);
                        events.push(PlanEvent::Conflict {
                            old_path: file.path.clone(),
                            kind,
                            resolution: ConflictResolution::Increment,
                            new_path: resolved.clone(),
                        });
                        resolved
                    }
                    ConflictPolicy::Skip => {
                        events.push(PlanEvent::Conflict {
                            old_path: file.path.clone(),
                            kind,
                            resolution: ConflictResolution::Skip,
                            new_path: candidate,
                        });
                        stats.skipped_no_resolution += 1;
                        continue;
                    }
                }
            }
        };

        if final_path == file.path {
            events.push(PlanEvent::SkippedUnchanged {
                old_path: file.path.clone(),
            });
            stats.skipped_unchanged += 1;
            continue;
        }

        claimed.insert(final_path.clone(), file.path.clone());
        stats.planned += 1;
        entries.push(RenamePlanEntry {
            old_path: file.path.clone(),
            new_path: final_path,
        });
    }

    Ok(RenamePlan {
        pattern,
        entries,
        events,
        stats,
    })
}

/// `name (1).ext`, `name (2).ext`, … と試し、ディスクにも計画にも無い
/// 最小の番号を採用する。上限は設けない。
fn next_free_increment<F>(
    parent: &Path,
    basename: &str,
    claimed: &HashMap<PathBuf, PathBuf>,
    exists: &F,
) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let (stem, ext) = split_basename(basename);
    let mut n = 1usize;
    loop {
        let name = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = parent.join(name);
        if !claimed.contains_key(&candidate) && !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn split_basename(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RenameOptions;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    fn candidate(path: &str) -> CandidateFile {
        CandidateFile::from_path(PathBuf::from(path))
    }

    fn options(pattern: &str) -> RenameOptions {
        RenameOptions {
            output_pattern: pattern.to_string(),
            ..RenameOptions::default()
        }
    }

    #[test]
    fn plan_rejects_empty_pattern_before_running() {
        let err = plan(&[], &RenameOptions::default(), |_| false).expect_err("must fail");
        assert!(err.to_string().contains("出力パターンが空です"));
    }

    #[test]
    fn sequential_two_file_scenario() {
        let mut opts = options("file_{sequence}.{ext}");
        opts.sequential = true;
        opts.start_num = 1;
        opts.digits = 2;

        let files = [candidate("/data/a.txt"), candidate("/data/b.txt")];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        assert_eq!(
            plan.entries,
            vec![
                RenamePlanEntry {
                    old_path: PathBuf::from("/data/a.txt"),
                    new_path: PathBuf::from("/data/file_01.txt"),
                },
                RenamePlanEntry {
                    old_path: PathBuf::from("/data/b.txt"),
                    new_path: PathBuf::from("/data/file_02.txt"),
                },
            ]
        );
        assert_eq!(plan.stats.planned, 2);
        assert_eq!(plan.stats.conflicts, 0);
    }

    #[test]
    fn internal_collisions_get_distinct_increments_in_scan_order() {
        let opts = options("same.{ext}");
        let files = [
            candidate("/data/a.txt"),
            candidate("/data/b.txt"),
            candidate("/data/c.txt"),
        ];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        assert_eq!(plan.entries.len(), 3);
        assert_eq!(plan.entries[0].new_path, PathBuf::from("/data/same.txt"));
        assert_eq!(plan.entries[1].new_path, PathBuf::from("/data/same (1).txt"));
        assert_eq!(plan.entries[2].new_path, PathBuf::from("/data/same (2).txt"));

        let distinct: HashSet<_> = plan.entries.iter().map(|e| &e.new_path).collect();
        assert_eq!(distinct.len(), 3);
        assert_eq!(plan.stats.conflicts, 2);
    }

    #[test]
    fn external_collision_probes_past_existing_increments() {
        let opts = options("out.{ext}");
        let files = [candidate("/data/a.txt")];
        let on_disk = |path: &Path| {
            path == Path::new("/data/out.txt") || path == Path::new("/data/out (1).txt")
        };
        let plan = plan(&files, &opts, on_disk).expect("must plan");

        assert_eq!(plan.entries[0].new_path, PathBuf::from("/data/out (2).txt"));
        assert!(plan.events.iter().any(|e| matches!(
            e,
            PlanEvent::Conflict {
                kind: ConflictKind::External,
                resolution: ConflictResolution::Increment,
                ..
            }
        )));
    }

    #[test]
    fn overwrite_policy_accepts_the_colliding_target() {
        let mut opts = options("out.{ext}");
        opts.overwrite_on_conflict = true;
        let files = [candidate("/data/a.txt")];
        let plan =
            plan(&files, &opts, |path| path == Path::new("/data/out.txt")).expect("must plan");

        assert_eq!(plan.entries[0].new_path, PathBuf::from("/data/out.txt"));
    }

    #[test]
    fn skip_policy_drops_colliding_files_and_continues() {
        let mut opts = options("out.{ext}");
        opts.add_increment_on_conflict = false;
        let files = [candidate("/data/a.txt"), candidate("/data/b.txt")];
        let plan =
            plan(&files, &opts, |path| path == Path::new("/data/out.txt")).expect("must plan");

        assert!(plan.entries.is_empty());
        assert_eq!(plan.stats.skipped_no_resolution, 2);
        assert_eq!(plan.stats.scanned_files, 2);
    }

    #[test]
    fn unchanged_name_is_dropped_from_the_plan() {
        let opts = options("{original_name}.{ext}");
        let files = [candidate("/data/photo.txt")];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        assert!(plan.entries.is_empty());
        assert_eq!(plan.stats.skipped_unchanged, 1);
        assert!(plan
            .events
            .iter()
            .any(|e| matches!(e, PlanEvent::SkippedUnchanged { .. })));
    }

    #[test]
    fn same_path_on_disk_is_never_an_external_conflict() {
        let opts = options("{original_name}.{ext}");
        let files = [candidate("/data/photo.txt")];
        let plan =
            plan(&files, &opts, |path| path == Path::new("/data/photo.txt")).expect("must plan");

        assert_eq!(plan.stats.conflicts, 0);
        assert_eq!(plan.stats.skipped_unchanged, 1);
    }

    #[test]
    fn counter_advances_across_skipped_unchanged_files() {
        // a_001.txt は展開結果が元名と一致してスキップされるが、連番は消費される。
        let mut opts = options("{original_name}_{sequence}.{ext}");
        opts.sequential = true;
        opts.replace_old = "_001".to_string();
        opts.replace_new = String::new();

        let files = [candidate("/data/a_001.txt"), candidate("/data/b.txt")];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        assert_eq!(plan.stats.skipped_unchanged, 1);
        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].new_path, PathBuf::from("/data/b_002.txt"));
    }

    #[test]
    fn invalid_regex_warns_once_and_planning_continues() {
        let mut opts = options("new_{original_name}.{ext}");
        opts.remove_regex = Some("[bad".to_string());
        let files = [candidate("/data/a.txt")];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        assert_eq!(
            plan.events,
            vec![PlanEvent::InvalidRemoveRegex {
                pattern: "[bad".to_string()
            }]
        );
        assert_eq!(plan.entries[0].new_path, PathBuf::from("/data/new_a.txt"));
    }

    #[test]
    fn invalid_date_resolves_placeholder_to_empty() {
        let mut opts = options("{original_name}_{date}.{ext}");
        opts.use_custom_date = true;
        opts.date_value = "not-a-date".to_string();
        let files = [candidate("/data/a.txt")];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        assert!(plan
            .events
            .iter()
            .any(|e| matches!(e, PlanEvent::InvalidDateValue { .. })));
        assert_eq!(plan.entries[0].new_path, PathBuf::from("/data/a_.txt"));
    }

    #[test]
    fn date_is_reformatted_into_the_name() {
        let mut opts = options("{original_name}_{date}.{ext}");
        opts.use_custom_date = true;
        opts.date_value = "20250609".to_string();
        opts.date_output_format = DateFormat::DmyDashed;
        let files = [candidate("/data/a.txt")];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        assert_eq!(
            plan.entries[0].new_path,
            PathBuf::from("/data/a_09-06-2025.txt")
        );
    }

    #[test]
    fn sanitization_keeps_disallowed_chars_out_of_the_basename() {
        let mut opts = options("{original_name}.{ext}");
        opts.replace_old = "a".to_string();
        opts.replace_new = "a?b*c".to_string();
        let files = [candidate("/data/a.txt")];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        let name = plan.entries[0]
            .new_path
            .file_name()
            .and_then(|v| v.to_str())
            .expect("must have name");
        assert_eq!(name, "abc.txt");
    }

    #[test]
    fn extension_case_is_normalized_by_default() {
        let opts = options("{original_name}.{ext}");
        let files = [candidate("/data/PHOTO.JPG")];
        let plan_lower = plan(&files, &opts, |_| false).expect("must plan");
        assert_eq!(
            plan_lower.entries[0].new_path,
            PathBuf::from("/data/PHOTO.jpg")
        );

        let mut keep = options("{original_name}.{ext}");
        keep.ignore_ext_case = false;
        let plan_keep = plan(&files, &keep, |_| false).expect("must plan");
        assert!(plan_keep.entries.is_empty());
        assert_eq!(plan_keep.stats.skipped_unchanged, 1);
    }

    #[test]
    fn increment_probing_works_without_extension() {
        let opts = options("report");
        let files = [candidate("/data/a"), candidate("/data/b")];
        let plan = plan(&files, &opts, |_| false).expect("must plan");

        assert_eq!(plan.entries[0].new_path, PathBuf::from("/data/report"));
        assert_eq!(plan.entries[1].new_path, PathBuf::from("/data/report (1)"));
    }

    #[test]
    fn collect_flat_skips_directories_and_sorts() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("b.txt"), b"x").expect("write b");
        fs::write(temp.path().join("a.txt"), b"x").expect("write a");
        fs::create_dir(temp.path().join("sub")).expect("mkdir");
        fs::write(temp.path().join("sub").join("c.txt"), b"x").expect("write c");

        let files = collect_candidate_files(temp.path(), false).expect("must collect");
        let names: Vec<_> = files.iter().map(|f| f.stem.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn collect_recursive_includes_subdirectories() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"x").expect("write a");
        fs::create_dir(temp.path().join("sub")).expect("mkdir");
        fs::write(temp.path().join("sub").join("c.txt"), b"x").expect("write c");

        let files = collect_candidate_files(temp.path(), true).expect("must collect");
        let names: Vec<_> = files.iter().map(|f| f.stem.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn recursive_scan_lists_files_before_subdirectory_contents() {
        // z.txt は辞書順ではサブディレクトリ a/ の後だが、走査は同一階層の
        // ファイルを先に出してから下の階層へ降りる。
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("z.txt"), b"x").expect("write z");
        fs::create_dir(temp.path().join("a")).expect("mkdir a");
        fs::write(temp.path().join("a").join("b.txt"), b"x").expect("write b");

        let files = collect_candidate_files(temp.path(), true).expect("must collect");
        let names: Vec<_> = files.iter().map(|f| f.stem.as_str()).collect();
        assert_eq!(names, vec!["z", "b"]);
    }

    #[test]
    fn recursive_scan_keeps_each_level_sorted_files_first() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("m.txt"), b"x").expect("write m");
        fs::write(temp.path().join("b.txt"), b"x").expect("write b");
        fs::create_dir(temp.path().join("d1")).expect("mkdir d1");
        fs::create_dir(temp.path().join("d2")).expect("mkdir d2");
        fs::write(temp.path().join("d1").join("q.txt"), b"x").expect("write q");
        fs::write(temp.path().join("d2").join("a.txt"), b"x").expect("write a");

        let files = collect_candidate_files(temp.path(), true).expect("must collect");
        let names: Vec<_> = files.iter().map(|f| f.stem.as_str()).collect();
        assert_eq!(names, vec!["b", "m", "q", "a"]);
    }

    #[test]
    fn generate_plan_rejects_missing_directory() {
        let err = generate_plan(
            Path::new("/nonexistent/nameflux"),
            false,
            &options("{original_name}.{ext}"),
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("フォルダが存在しません"));
    }

    #[test]
    fn candidate_file_splits_stem_and_extension() {
        let file = candidate("/data/archive.tar.gz");
        assert_eq!(file.stem, "archive.tar");
        assert_eq!(file.extension, "gz");

        let file = candidate("/data/.config");
        assert_eq!(file.stem, ".config");
        assert_eq!(file.extension, "");
    }
}
