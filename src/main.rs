use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use colored::*;

use altsum::config::{Config, OutputFormat};
use altsum::error::{error_suggestion, AltsumError};
use altsum::logging::LogFormat;

/// Print a short report and let the default hook finish the job.
#[cfg(not(coverage))]
fn setup_crash_handlers() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        eprintln!("\n{}", "altsum crashed".red().bold());
        if let Some(location) = panic_info.location() {
            eprintln!(
                "{}",
                format!("Panic at {}:{}", location.file(), location.line()).red()
            );
        }
        eprintln!("{}", "This is a bug, please report it.".yellow());
        default_panic(panic_info);
    }));
}

/// No-op under source-based coverage: we don't deliberately test panic-reporting UX.
#[cfg(coverage)]
fn setup_crash_handlers() {}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
    Compact,
}

/// Reads n and m from stdin, prints n..=m with even values negated,
/// then the doubled running sum and gcd(n, m).
#[derive(Parser)]
#[command(name = "altsum")]
#[command(version = "0.1.0")]
#[command(about = "Alternating-sign range sum and subtraction GCD", long_about = None)]
struct Cli {
    /// Don't print the `n = ` / `m = ` prompts
    #[arg(long)]
    no_prompt: bool,

    /// Give up on the GCD after this many subtraction steps
    #[arg(long, value_name = "STEPS")]
    gcd_limit: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: FormatArg,

    /// Log filter, e.g. `debug` or `warn,altsum::driver=trace` (overrides ALTSUM_LOG)
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,

    /// Log record format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormatArg,

    /// Append log records to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config, AltsumError> {
        let mut config = Config::from_env()?;
        if let Some(spec) = &self.log {
            config = config.with_log_filter(spec)?;
        }
        config.log.format = match self.log_format {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        };
        config.log.file = self.log_file;
        config.driver.prompts = !self.no_prompt;
        config.driver.gcd_limit = self.gcd_limit;
        config.driver.output = match self.format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        };
        Ok(config)
    }
}

fn main() {
    setup_crash_handlers();

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        if let Some(hint) = error_suggestion(&e) {
            eprintln!("  {} {}", "hint:".yellow(), hint);
        }
        process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<(), AltsumError> {
    let config = cli.into_config()?;
    config.log.install();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let result = altsum::run(stdin.lock(), &mut out, &config.driver);
    // Whatever was printed before a failure still belongs on stdout.
    let flushed = out.flush();
    result?;
    flushed?;
    Ok(())
}
