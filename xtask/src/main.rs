use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitCode};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Build tasks for unitrun")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo fmt --check
    Fmt,
    /// Run cargo check
    Check,
    /// Run cargo clippy
    Clippy,
    /// Run cargo test
    Test,
    /// Run all CI checks (fmt, check, clippy, test, demo)
    Ci,
    /// Run the demo suites
    Demo {
        /// Arguments to pass to unitrun
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Write the demo run as JUnit XML to target/unitrun-report.xml
    Report,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Fmt => cmd_fmt(),
        Commands::Check => cmd_check(),
        Commands::Clippy => cmd_clippy(),
        Commands::Test => cmd_test(),
        Commands::Ci => cmd_ci(),
        Commands::Demo { args } => cmd_demo(&args),
        Commands::Report => cmd_report(),
    }
}

fn cmd_fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--check"])
}

fn cmd_check() -> Result<()> {
    cargo(&["check", "--workspace", "--all-targets"])
}

fn cmd_clippy() -> Result<()> {
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
}

fn cmd_test() -> Result<()> {
    cargo(&["test", "--workspace"])
}

fn cmd_ci() -> Result<()> {
    cmd_fmt()?;
    cmd_check()?;
    cmd_clippy()?;
    cmd_test()?;
    cmd_demo(&["--uncolored".to_string(), "--terse".to_string()])?;
    Ok(())
}

fn cmd_demo(args: &[String]) -> Result<()> {
    let mut cmd_args = vec!["run", "-p", "unitrun", "--quiet", "--"];
    cmd_args.extend(args.iter().map(String::as_str));
    cargo(&cmd_args)
}

fn cmd_report() -> Result<()> {
    let output = Command::new("cargo")
        .args(["run", "-p", "unitrun", "--quiet", "--", "--output", "junit", "--times"])
        .output()
        .context("Failed to execute: cargo run -p unitrun")?;

    let path = PathBuf::from("target").join("unitrun-report.xml");
    fs::create_dir_all("target").context("Failed to create target directory")?;
    fs::write(&path, &output.stdout)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote: {}", path.display());

    if !output.status.success() {
        let code_info = match output.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        bail!("demo run failed: {code_info}");
    }
    Ok(())
}

fn cargo(args: &[&str]) -> Result<()> {
    exec("cargo", args)
}

fn exec(program: &str, args: &[&str]) -> Result<()> {
    let cmd_line = format!("{program} {}", args.join(" "));
    eprintln!("$ {cmd_line}");

    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute: {cmd_line}"))?;

    if !status.success() {
        let code_info = match status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        bail!("{cmd_line}: {code_info}");
    }
    Ok(())
}
