use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cli_meta_diff::{diff_meta_files, render_changes, write_output, OutputFormat};
use cli_meta_export::{
    build_modules_meta, export_command_table, write_modules_meta, CommandTableDoc, ExportOptions,
};
use cli_meta_version::{next_version, NextVersionRequest, PreTagChoice, SegmentTagChoice};

/// Output mode enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputType {
    Text,
    Dict,
    Tree,
}

impl From<CliOutputType> for OutputFormat {
    fn from(output_type: CliOutputType) -> Self {
        match output_type {
            CliOutputType::Text => Self::Text,
            CliOutputType::Dict => Self::Dict,
            CliOutputType::Tree => Self::Tree,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "cli-meta")]
#[command(about = "Command-metadata export, semantic diffing, and next-version computation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export command-table documents into per-module metadata snapshots.
    ExportCommandMeta(ExportArgs),
    /// Compare two metadata snapshots and report the changes.
    CmpCommandMeta(CmpArgs),
    /// Compute the next version of a module from its metadata diff.
    NextVersion(NextVersionArgs),
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Command-table JSON document produced by the command loader.
    #[arg(long)]
    commands_file: PathBuf,
    /// Output directory for per-module snapshot files.
    #[arg(long)]
    meta_output_path: PathBuf,
    /// Include short summaries on groups, commands, and parameters.
    #[arg(long)]
    with_help: bool,
    /// Include command examples.
    #[arg(long)]
    with_example: bool,
    /// Only export the named modules (comma-separated).
    #[arg(long, value_delimiter = ',')]
    modules: Vec<String>,
}

#[derive(Debug, Args)]
struct CmpArgs {
    /// Snapshot of the older release.
    #[arg(long)]
    base_meta_file: PathBuf,
    /// Snapshot of the newer release.
    #[arg(long)]
    diff_meta_file: PathBuf,
    /// Only report breaking changes.
    #[arg(long)]
    only_break: bool,
    /// Report format (default: text).
    #[arg(long, default_value = "text")]
    output_type: CliOutputType,
    /// Also persist the report to this path.
    #[arg(long)]
    output_file: Option<PathBuf>,
    /// Suppression whitelist file: one tab-joined filter key per line.
    #[arg(long)]
    whitelist_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct NextVersionArgs {
    /// Module name as listed in the package index.
    #[arg(long)]
    module: String,
    /// Current released version, e.g. 3.11.0 or 1.0.0b3.
    #[arg(long)]
    current_version: String,
    /// Module is flagged preview.
    #[arg(long)]
    is_preview: bool,
    /// Module is flagged experimental.
    #[arg(long)]
    is_experimental: bool,
    /// Snapshot of the older release.
    #[arg(long)]
    base_meta_file: PathBuf,
    /// Snapshot of the newer release.
    #[arg(long)]
    diff_meta_file: PathBuf,
    /// Force the next version to be stable or preview.
    #[arg(long)]
    next_version_pre_tag: Option<String>,
    /// Force which segment is bumped: major, minor, patch, or pre.
    #[arg(long)]
    next_version_segment_tag: Option<String>,
    /// Override the package-index URL.
    #[arg(long)]
    index_url: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cli_meta=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::ExportCommandMeta(args) => run_export(args),
        Command::CmpCommandMeta(args) => run_cmp(args),
        Command::NextVersion(args) => run_next_version(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_export(args: ExportArgs) -> Result<(), String> {
    let opts = ExportOptions {
        with_help: args.with_help,
        with_example: args.with_example,
    };
    let written = if args.modules.is_empty() {
        export_command_table(&args.commands_file, &args.meta_output_path, &opts)
            .map_err(|e| e.to_string())?
    } else {
        let raw = std::fs::read_to_string(&args.commands_file).map_err(|err| {
            format!("Failed to read '{}': {err}", args.commands_file.display())
        })?;
        let doc: CommandTableDoc = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
        let mut metas = build_modules_meta(&doc, &opts);
        metas.retain(|module_name, _| args.modules.iter().any(|m| m == module_name));
        write_modules_meta(&metas, &args.meta_output_path).map_err(|e| e.to_string())?
    };
    println!(
        "Exported {} module snapshot(s) to '{}'.",
        written.len(),
        args.meta_output_path.display()
    );
    Ok(())
}

fn run_cmp(args: CmpArgs) -> Result<(), String> {
    let changes = diff_meta_files(
        &args.base_meta_file,
        &args.diff_meta_file,
        args.whitelist_file.as_deref(),
    )
    .map_err(|e| e.to_string())?;

    let module_name = module_name_from_snapshot(&args.base_meta_file)?;
    let rendered = render_changes(
        &changes,
        &module_name,
        args.output_type.into(),
        args.only_break,
    )
    .map_err(|e| e.to_string())?;

    println!("{}", rendered.to_output_string().map_err(|e| e.to_string())?);
    if let Some(output_file) = &args.output_file {
        write_output(&rendered, output_file).map_err(|err| {
            format!("Failed to write '{}': {err}", output_file.display())
        })?;
    }
    Ok(())
}

fn run_next_version(args: NextVersionArgs) -> Result<(), String> {
    let next_version_pre_tag = args
        .next_version_pre_tag
        .as_deref()
        .map(PreTagChoice::from_str)
        .transpose()
        .map_err(|e| e.to_string())?;
    let next_version_segment_tag = args
        .next_version_segment_tag
        .as_deref()
        .map(SegmentTagChoice::from_str)
        .transpose()
        .map_err(|e| e.to_string())?;

    let request = NextVersionRequest {
        module_name: args.module,
        current_version: args.current_version,
        is_preview: args.is_preview,
        is_experimental: args.is_experimental,
        next_version_pre_tag,
        next_version_segment_tag,
        index_url: args.index_url,
    };
    let result = next_version(&args.base_meta_file, &args.diff_meta_file, &request)
        .map_err(|e| e.to_string())?;
    let raw = serde_json::to_string_pretty(&result)
        .map_err(|err| format!("Failed to serialize result: {err}"))?;
    println!("{raw}");
    Ok(())
}

fn module_name_from_snapshot(path: &std::path::Path) -> Result<String, String> {
    let root = cli_meta_core::CommandMetaRoot::load(path).map_err(|e| e.to_string())?;
    Ok(root.module_name)
}
