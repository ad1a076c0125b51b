use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use gorew::config::{load_from_path, load_or_default, RewriteConfig};
use gorew::decl::{DeclKind, Declaration};
use gorew::format::{
    prettify_file_diff, CommandFormatter, FileError, IdentityFormatter, SourceFormatter,
};
use gorew::session::RewriteSession;
use gorew::workspace::find_files;
use rayon::prelude::*;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rew")]
#[command(about = "Structural rewriting for Go source files", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./rew.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format Go files and drop unused or duplicate imports
    Prettify {
        /// Files or directories to process
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Leave import blocks alone
        #[arg(long)]
        no_clean_imports: bool,

        /// Report what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// List the top-level declarations of a Go file
    Decls {
        file: PathBuf,

        /// Only this kind: import, const, var, type, struct, func, unclassified or all
        #[arg(short, long, default_value = "all")]
        kind: String,

        /// Name globs; a declaration matches when any of its names matches
        #[arg(long = "name")]
        names: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Prettify {
            paths,
            no_clean_imports,
            dry_run,
            diff,
        } => cmd_prettify(&config, &paths, !no_clean_imports, dry_run, diff),
        Commands::Decls {
            file,
            kind,
            names,
            json,
        } => cmd_decls(&file, &kind, &names, json),
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Logging goes to stderr and stays off unless `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn load_config(explicit: Option<&Path>) -> Result<RewriteConfig> {
    match explicit {
        Some(path) => Ok(load_from_path(path)?),
        None => Ok(load_or_default(".")?),
    }
}

fn build_formatter(config: &RewriteConfig) -> Box<dyn SourceFormatter> {
    if config.format.enabled {
        Box::new(CommandFormatter::new(
            config.format.command.clone(),
            config.format.args.clone(),
        ))
    } else {
        Box::new(IdentityFormatter)
    }
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_prettify(
    config: &RewriteConfig,
    paths: &[PathBuf],
    clean_imports: bool,
    dry_run: bool,
    show_diff: bool,
) -> Result<ExitCode> {
    let clean_imports = clean_imports && config.imports.clean;
    let formatter = build_formatter(config);

    let mut files = Vec::new();
    for root in paths {
        files.extend(find_files(root, &config.files.extension, &config.files.exclude)?);
    }
    files.sort();
    files.dedup();

    if dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    // files are independent; results come back in input order
    let results: Vec<(PathBuf, Result<Option<(String, String)>, FileError>)> = files
        .par_iter()
        .map(|path| {
            let outcome = prettify_file_diff(path, formatter.as_ref(), clean_imports, dry_run);
            (path.clone(), outcome)
        })
        .collect();

    let mut changed = 0;
    let mut failed = 0;
    for (path, outcome) in results {
        match outcome {
            Ok(Some((original, pretty))) => {
                changed += 1;
                let verb = if dry_run { "would rewrite" } else { "rewrote" };
                println!("  {} {}", "✓".green(), format!("{verb} {}", path.display()));
                if show_diff {
                    display_diff(&path, &original, &pretty);
                }
            }
            Ok(None) => {
                println!("  {} {}", "○".dimmed(), path.display().to_string().dimmed());
            }
            Err(e) => {
                failed += 1;
                eprintln!("  {} {}", "✗".red(), e);
            }
        }
    }

    println!();
    println!(
        "Summary: {} files, {} changed, {} failed",
        files.len(),
        changed.to_string().green(),
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        }
    );

    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[derive(Serialize)]
struct DeclRow<'a> {
    kind: String,
    name: String,
    line: usize,
    comment: Option<String>,
    #[serde(flatten)]
    decl: &'a Declaration,
}

fn cmd_decls(file: &Path, kind: &str, names: &[String], json: bool) -> Result<ExitCode> {
    let kind = DeclKind::parse_filter(kind)?;
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut session =
        RewriteSession::new(bytes).with_context(|| format!("failed to parse {}", file.display()))?;

    let decls: Vec<Declaration> = if names.is_empty() {
        session.declarations(kind).into_iter().cloned().collect()
    } else {
        session.find_by_name(kind, names).into_iter().cloned().collect()
    };

    let rows: Vec<DeclRow<'_>> = decls
        .iter()
        .map(|decl| DeclRow {
            kind: decl.kind_label(),
            name: decl.name(),
            line: session.file().position(decl.span.start).line,
            comment: decl.comment(true),
            decl,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(ExitCode::SUCCESS);
    }

    for row in &rows {
        let name = if row.name.is_empty() {
            "-".dimmed().to_string()
        } else {
            row.name.bold().to_string()
        };
        println!("{:>5}  {:<13} {}", row.line, row.kind.cyan(), name);
        if let Some(err) = row.decl.classification_error() {
            println!("       {}", err.to_string().yellow());
        }
    }
    if rows.is_empty() {
        println!("{}", "no matching declarations".dimmed());
    }
    Ok(ExitCode::SUCCESS)
}
