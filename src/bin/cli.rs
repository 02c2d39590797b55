use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tfsentry::config::{Config, CONFIG_DIR};
use tfsentry::error::ScanError;
use tfsentry::output::OutputFormat;
use tfsentry::ScanOptions;

#[derive(Parser)]
#[command(
    name = "tfsentry",
    about = "Static security scanner for Terraform configuration",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a Terraform module tree for security issues
    Scan {
        /// Path to the root module directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Config file path (.json, .yaml, .yml or .toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Directory containing *_tfchecks.json / *_tfchecks.yaml files
        #[arg(long)]
        custom_checks: Option<PathBuf>,

        /// Output format (console, json, sarif)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Report findings suppressed by tfsec:ignore comments
        #[arg(long)]
        include_ignored: bool,

        /// Exit 0 even when findings remain
        #[arg(long)]
        soft_fail: bool,

        /// Number of worker threads (defaults to available parallelism)
        #[arg(long, env = "TFSENTRY_THREADS")]
        threads: Option<usize>,
    },

    /// List all available rules, including custom checks
    ListRules {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,

        /// Directory containing custom check files
        #[arg(long)]
        custom_checks: Option<PathBuf>,
    },

    /// Generate a starter .tfsec/config.yml
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            path,
            config,
            custom_checks,
            format,
            output,
            include_ignored,
            soft_fail,
            threads,
        } => {
            let options = ScanOptions {
                config_path: config,
                custom_checks_dir: custom_checks,
                include_ignored,
                threads,
                cancel: None,
            };
            cmd_scan(path, options, format, output, soft_fail)
        }
        Commands::ListRules {
            format,
            custom_checks,
        } => cmd_list_rules(format, custom_checks),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn cmd_scan(
    path: PathBuf,
    options: ScanOptions,
    format_str: String,
    output_path: Option<PathBuf>,
    soft_fail: bool,
) -> Result<i32, ScanError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let report = tfsentry::scan(&path, &options)?;
    let rendered = tfsentry::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered).map_err(|e| {
            ScanError::Output(format!("cannot write {}: {}", out.display(), e))
        })?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 = pass, 1 = findings remain
    Ok(if report.verdict.pass || soft_fail { 0 } else { 1 })
}

fn cmd_list_rules(format_str: String, custom_checks: Option<PathBuf>) -> Result<i32, ScanError> {
    let cwd = PathBuf::from(".");
    let registry = tfsentry::load_registry(&cwd, custom_checks.as_deref())?;
    let rules = registry.list_rules();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!(
                "{:<10} {:<9} {:<10} {:<36} DESCRIPTION",
                "ID", "PROVIDER", "SEVERITY", "APPLIES TO"
            );
            println!("{}", "-".repeat(100));
            for rule in &rules {
                let applies_to = if rule.required_labels.is_empty() {
                    rule.required_types.join(",")
                } else {
                    rule.required_labels.join(",")
                };
                println!(
                    "{:<10} {:<9} {:<10} {:<36} {}",
                    rule.id,
                    rule.provider.to_string(),
                    rule.default_severity.to_string(),
                    applies_to,
                    rule.description,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, ScanError> {
    let dir = PathBuf::from(CONFIG_DIR);
    let path = dir.join("config.yml");

    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", path.display());
        return Ok(1);
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, Config::starter_yaml())?;
    println!("Created {}", path.display());

    Ok(0)
}
