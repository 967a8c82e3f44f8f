use crate::config::types::SortboxError;
use crate::config::ExecutorConfig;
use crate::judge::reference::StdSort;
use crate::judge::{Judge, Submission};
use crate::safety::workspace::WorkspaceManager;
use crate::verdict::ExecutionOutcome;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a snippet and run its sort entry point on one input
    Run {
        #[command(flatten)]
        job: JobArgs,
    },
    /// Like `run`, and compare against the standard library sort
    Test {
        #[command(flatten)]
        job: JobArgs,
    },
    /// Check that the Rust toolchain is available
    CheckDeps {
        /// Show the full version line
        #[arg(long)]
        verbose: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Remove workspaces left behind by crashed or kept runs
    Cleanup {
        /// Only remove workspaces at least this old
        #[arg(long, default_value_t = 3600)]
        max_age_secs: u64,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args)]
struct JobArgs {
    /// Source file of the submission, or `-` for stdin
    #[arg(long)]
    code: String,
    /// Input values, comma or whitespace separated (e.g. "5,3,4")
    #[arg(long, allow_hyphen_values = true)]
    input: String,
    /// Algorithm hint (e.g. quickSort); unknown names are ignored
    #[arg(long)]
    hint: Option<String>,
    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Wall-clock limit for compile plus call, in milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,
    /// Parent directory for run workspaces
    #[arg(long)]
    scratch_root: Option<PathBuf>,
    /// Leave the run workspace on disk
    #[arg(long)]
    keep_workspace: bool,
}

impl ConfigArgs {
    fn load(&self) -> Result<ExecutorConfig> {
        let mut config = match &self.config {
            Some(path) => ExecutorConfig::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExecutorConfig::default(),
        };
        if let Some(limit) = self.time_limit_ms {
            eprintln!("🔧 CLI Override - Time limit: {} ms", limit);
            config.time_limit_ms = limit;
        }
        if let Some(root) = &self.scratch_root {
            config.scratch_root = root.clone();
        }
        if self.keep_workspace {
            config.keep_workspace = true;
        }
        Ok(config)
    }
}

impl JobArgs {
    fn submission(&self) -> Result<Submission> {
        let source = read_code(&self.code)?;
        let submission = Submission::new(source);
        Ok(match &self.hint {
            Some(hint) => submission.with_hint_str(hint),
            None => submission,
        })
    }
}

pub fn run() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { job } => {
            let judge = Judge::new(job.config.load()?)?;
            let input = parse_input(&job.input)?;
            let outcome = judge.run(&job.submission()?, &input);

            if job.json {
                println!("{}", outcome.to_json()?);
            } else {
                print_outcome(&outcome);
            }
            if !outcome.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Test { job } => {
            let judge = Judge::new(job.config.load()?)?;
            let input = parse_input(&job.input)?;
            let report = judge.compile_and_test(&job.submission()?, &input, &StdSort);

            if job.json {
                println!("{}", report.to_json()?);
            } else {
                print_outcome(&report.submitted);
                println!("expected: {}", join_values(&report.expected));
                if report.matches() {
                    println!("✅ matches reference");
                } else {
                    println!("❌ differs from reference");
                }
            }
            if !report.matches() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::CheckDeps { verbose, config } => check_toolchain(&config.load()?, verbose),
        Commands::Cleanup {
            max_age_secs,
            config,
        } => {
            let config = config.load()?;
            let manager = WorkspaceManager::new(config.scratch_root.clone())?;
            let removed = manager.cleanup_old_workspaces(Duration::from_secs(max_age_secs))?;
            eprintln!(
                "Removed {} workspace(s) from {}",
                removed,
                manager.base_dir().display()
            );
            Ok(())
        }
    }
}

fn read_code(source: &str) -> Result<String> {
    if source == "-" {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("reading submission from stdin")?;
        return Ok(code);
    }
    std::fs::read_to_string(source).with_context(|| format!("reading submission {}", source))
}

/// Parse `"5,3,4"` or `"5 3 4"` into values; an empty string is an empty input.
fn parse_input(raw: &str) -> Result<Vec<i32>> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<i32>()
                .with_context(|| format!("invalid input value '{}'", token))
        })
        .collect()
}

fn join_values(values: &[i32]) -> String {
    values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_outcome(outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Success { result } => println!("{}", join_values(result)),
        ExecutionOutcome::Failure { kind, message } => eprintln!("{}: {}", kind, message),
    }
}

fn check_toolchain(config: &ExecutorConfig, verbose: bool) -> Result<()> {
    use std::process::Command;

    let rustc = &config.toolchain.rustc;
    println!("🔍 Checking toolchain ({})...", config.toolchain.envelope_id());

    let output = Command::new(rustc).arg("--version").output();
    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            println!("✅ {} - OK", rustc);
            if verbose {
                println!("  {} -> {}", rustc, version);
            }
            Ok(())
        }
        Ok(output) => {
            println!("❌ {} - FAILED ({})", rustc, output.status);
            Err(SortboxError::Toolchain(format!("{} --version failed", rustc)).into())
        }
        Err(e) => {
            println!("❌ {} - NOT FOUND", rustc);
            println!("   Install a Rust toolchain or set {}", crate::config::presets::RUSTC_ENV);
            Err(SortboxError::Toolchain(format!("cannot run {}: {}", rustc, e)).into())
        }
    }
}
