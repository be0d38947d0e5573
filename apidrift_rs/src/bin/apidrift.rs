use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use apidrift::report::ImpactBundle;
use apidrift::runner::{
    AnalyzerMode, AnalyzerOptions, build_api_snapshot, diff_files, run_analyzer, write_report_json,
};
use apidrift::shape::ApiSnapshot;
use apidrift::types::Severity;
use apidrift::{api_diff_to_findings, compute_api_diff, format_report_text};

const USAGE: &str = "\
apidrift - semantic API-surface diff for TypeScript/JavaScript

USAGE:
    apidrift snapshot [PATHS...] [--root DIR] [--tsconfig FILE] [--json]
    apidrift api-snapshot PATH [--root DIR] [--tsconfig FILE] [--out FILE]
    apidrift diff BEFORE AFTER [--root DIR] [--tsconfig FILE] [--json] [--out FILE]
    apidrift api-diff BEFORE.json AFTER.json [--json]

OPTIONS:
    --root DIR        Project root (default: current directory)
    --tsconfig FILE   Explicit tsconfig.json path
    --json            Machine-readable JSON output
    --out FILE        Write the JSON report to FILE (atomic)
    -h, --help        Show this help
    -V, --version     Show version
";

struct Cli {
    command: String,
    positional: Vec<String>,
    root: PathBuf,
    tsconfig: Option<PathBuf>,
    json: bool,
    out: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Cli> {
    let mut cli = Cli {
        command: String::new(),
        positional: Vec::new(),
        root: PathBuf::from("."),
        tsconfig: None,
        json: false,
        out: None,
    };

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("apidrift {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--json" => cli.json = true,
            "--root" => {
                let value = iter.next().context("--root requires a value")?;
                cli.root = PathBuf::from(value);
            }
            "--tsconfig" => {
                let value = iter.next().context("--tsconfig requires a value")?;
                cli.tsconfig = Some(PathBuf::from(value));
            }
            "--out" => {
                let value = iter.next().context("--out requires a value")?;
                cli.out = Some(PathBuf::from(value));
            }
            other if other.starts_with('-') => bail!("unknown flag: {other}"),
            other => {
                if cli.command.is_empty() {
                    cli.command = other.to_string();
                } else {
                    cli.positional.push(other.to_string());
                }
            }
        }
    }

    if cli.command.is_empty() {
        bail!("missing command\n\n{USAGE}");
    }
    Ok(cli)
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Breaking => "breaking".red().bold().to_string(),
        Severity::Warning => "warning".yellow().to_string(),
        Severity::Info => "info".dimmed().to_string(),
    }
}

fn cmd_snapshot(cli: &Cli) -> Result<()> {
    let options = AnalyzerOptions {
        repo_root: cli.root.clone(),
        paths: cli.positional.iter().map(PathBuf::from).collect(),
        tsconfig: cli.tsconfig.clone(),
        mode: AnalyzerMode::ExportsOnly,
    };
    let report = run_analyzer(&options);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} files, {} exported symbols",
            report.file_paths.len(),
            report.symbol_names.len()
        );
        if let Some(stats) = &report.export_stats {
            println!(
                "exports: {} total, {} runtime, {} type, {} unresolved re-export groups",
                stats.exports_total,
                stats.exports_runtime,
                stats.exports_type,
                stats.reexport_groups_unresolved
            );
        }
    }
    Ok(())
}

fn cmd_api_snapshot(cli: &Cli) -> Result<()> {
    if cli.positional.is_empty() {
        bail!("api-snapshot requires an entrypoint path");
    }
    let options = AnalyzerOptions {
        repo_root: cli.root.clone(),
        paths: cli.positional.iter().map(PathBuf::from).collect(),
        tsconfig: cli.tsconfig.clone(),
        mode: AnalyzerMode::ApiSnapshot,
    };
    let snapshot = build_api_snapshot(&options).context("could not build API snapshot")?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    match &cli.out {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_diff(cli: &Cli) -> Result<ExitCode> {
    let [before, after] = cli.positional.as_slice() else {
        bail!("diff requires BEFORE and AFTER paths");
    };
    let report = diff_files(
        &cli.root,
        &PathBuf::from(before),
        &PathBuf::from(after),
        &ImpactBundle::default(),
        cli.tsconfig.as_deref(),
    )
    .context("diff failed; see warnings above")?;

    if let Some(path) = &cli.out {
        write_report_json(&report, path)?;
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report_text(&report));
        if report.has_breaking() {
            println!("{}", "Breaking changes detected.".red().bold());
        }
    }
    Ok(if report.has_breaking() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_api_diff(cli: &Cli) -> Result<ExitCode> {
    let [before_path, after_path] = cli.positional.as_slice() else {
        bail!("api-diff requires two ApiSnapshot JSON files");
    };
    let before: ApiSnapshot = serde_json::from_str(
        &std::fs::read_to_string(before_path).with_context(|| format!("reading {before_path}"))?,
    )?;
    let after: ApiSnapshot = serde_json::from_str(
        &std::fs::read_to_string(after_path).with_context(|| format!("reading {after_path}"))?,
    )?;
    let diff = compute_api_diff(&before, &after);
    let findings = api_diff_to_findings(&diff);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else {
        for finding in &findings {
            println!(
                "  [{}] {} {}",
                severity_label(finding.severity),
                finding.rule_id.bold(),
                finding.message
            );
        }
        if findings.is_empty() {
            println!("{}", "[OK] API surfaces are identical.".green());
        }
    }
    let breaking = findings.iter().any(|f| f.severity == Severity::Breaking);
    Ok(if breaking {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{} {err}", "[apidrift][error]".red());
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.as_str() {
        "snapshot" => cmd_snapshot(&cli).map(|_| ExitCode::SUCCESS),
        "api-snapshot" => cmd_api_snapshot(&cli).map(|_| ExitCode::SUCCESS),
        "diff" => cmd_diff(&cli),
        "api-diff" => cmd_api_diff(&cli),
        other => {
            eprintln!("[apidrift][error] unknown command: {other}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "[apidrift][error]".red());
            ExitCode::FAILURE
        }
    }
}
