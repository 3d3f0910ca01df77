use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use nameflux_core::{
    app_paths, execute_plan, generate_plan, load_config, CaseMode, ConflictPolicy, DateFormat,
    ExecutionStatus, PlanEvent, RenameOptions, RenamePlan, SpaceMode,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nameflux-cli")]
#[command(about = "出力パターンとテキスト変換でファイル名を一括リネームします")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Args)]
struct RenameArgs {
    #[arg(long)]
    dir: PathBuf,
    #[arg(long)]
    pattern: String,
    #[arg(long, default_value_t = false)]
    recursive: bool,
    #[arg(long, default_value_t = false)]
    apply: bool,
    #[arg(long, default_value = "")]
    replace_old: String,
    #[arg(long, default_value = "")]
    replace_new: String,
    #[arg(long)]
    remove_regex: Option<String>,
    #[arg(long, default_value = "keep", help = "keep / upper / lower / capitalize")]
    case: String,
    #[arg(long, default_value = "keep", help = "keep / strip / underscore")]
    spaces: String,
    #[arg(long, default_value_t = false)]
    sequential: bool,
    #[arg(long, default_value_t = 1)]
    start_num: u32,
    #[arg(long, default_value_t = 3)]
    digits: usize,
    #[arg(long, help = "カスタム日付。指定すると {date} が有効になります")]
    date: Option<String>,
    #[arg(long, default_value = "YYYYMMDD")]
    date_input: String,
    #[arg(long, default_value = "YYYYMMDD")]
    date_output: String,
    #[arg(long, default_value_t = false)]
    keep_ext_case: bool,
    #[arg(long, value_enum, default_value_t = OnConflict::Increment)]
    on_conflict: OnConflict,
    #[arg(long, default_value_t = false, help = "上書きモードでの適用を承諾する")]
    force: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnConflict {
    Increment,
    Overwrite,
    Skip,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let options = RenameOptions {
        output_pattern: args.pattern,
        replace_old: args.replace_old,
        replace_new: args.replace_new,
        remove_regex: args.remove_regex,
        case_mode: CaseMode::from_key(&args.case)?,
        space_mode: SpaceMode::from_key(&args.spaces)?,
        sequential: args.sequential,
        start_num: args.start_num,
        digits: args.digits,
        use_custom_date: args.date.is_some(),
        date_value: args.date.unwrap_or_default(),
        date_input_format: DateFormat::from_key(&args.date_input)?,
        date_output_format: DateFormat::from_key(&args.date_output)?,
        ignore_ext_case: !args.keep_ext_case,
        overwrite_on_conflict: matches!(args.on_conflict, OnConflict::Overwrite),
        add_increment_on_conflict: matches!(args.on_conflict, OnConflict::Increment),
    };

    // 破壊的な設定は明示的な承諾なしに実行へ進めない。
    if args.apply && options.conflict_policy() == ConflictPolicy::Overwrite && !args.force {
        anyhow::bail!(
            "上書きモードで適用するには --force を指定してください。同名の既存ファイルは失われます。"
        );
    }

    let plan = generate_plan(&args.dir, args.recursive, &options)?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        OutputFormat::Table => {
            print_table(&plan);
        }
    }

    if args.apply {
        let result = execute_plan(&plan);
        for outcome in &result.outcomes {
            if let ExecutionStatus::Failed { reason } = &outcome.status {
                eprintln!("{}", reason);
            }
        }
        eprintln!("適用完了: {}件 (失敗 {}件)", result.renamed, result.failed);
    } else {
        eprintln!("dry-runモード: 実ファイルは変更していません。適用するには --apply を指定してください。");
    }

    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn print_table(plan: &RenamePlan) {
    println!("旧ファイル -> 新ファイル");
    for entry in &plan.entries {
        println!(
            "{} -> {}",
            entry.old_path.display(),
            entry.new_path.display()
        );
    }

    for event in &plan.events {
        println!("{}", describe_event(event));
    }

    println!(
        "\n集計: scanned={} planned={} unchanged_skip={} no_resolution_skip={} conflicts={}",
        plan.stats.scanned_files,
        plan.stats.planned,
        plan.stats.skipped_unchanged,
        plan.stats.skipped_no_resolution,
        plan.stats.conflicts
    );
}

fn describe_event(event: &PlanEvent) -> String {
    match event {
        PlanEvent::InvalidRemoveRegex { pattern } => {
            format!("警告: 正規表現が不正なため削除処理を無効化しました: {}", pattern)
        }
        PlanEvent::InvalidDateValue { value, format } => format!(
            "警告: 日付 '{}' が入力フォーマット '{}' と一致しません。{{date}} は空になります",
            value,
            format.key()
        ),
        PlanEvent::Conflict {
            old_path,
            kind,
            resolution,
            new_path,
        } => {
            let kind = match kind {
                nameflux_core::ConflictKind::Internal => "内部",
                nameflux_core::ConflictKind::External => "既存ファイル",
            };
            let resolution = match resolution {
                nameflux_core::ConflictResolution::Overwrite => "上書き",
                nameflux_core::ConflictResolution::Increment => "連番付与",
                nameflux_core::ConflictResolution::Skip => "スキップ",
            };
            format!(
                "衝突({}): {} -> {} [{}]",
                kind,
                old_path.display(),
                new_path.display(),
                resolution
            )
        }
        PlanEvent::SkippedUnchanged { old_path } => {
            format!("スキップ: {} は名前が変わりません", old_path.display())
        }
    }
}
