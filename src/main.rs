//! Command line entry point for certclone.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use certclone::config::{Config, DEFAULT_KEY_BITS, FailurePolicy, ReusedKeyOutput};
use certclone::pipeline;

#[derive(Parser, Debug)]
#[command(name = "certclone", version)]
#[command(about = "Re-issue certificates as self-signed clones with the same identity")]
struct Cli {
    /// Generate a new RSA key instead of reusing <dir>/<name>.key
    #[arg(short = 'n', long = "new-key", alias = "nk")]
    new_key: bool,

    /// Output directory for keys
    #[arg(short = 'k', long = "key-out", alias = "ko", default_value = ".")]
    key_out: PathBuf,

    /// Output directory for certificates
    #[arg(short = 'c', long = "cert-out", alias = "co", default_value = ".")]
    cert_out: PathBuf,

    /// Key size in bits when generating a new key (power of 2, >= 128)
    #[arg(short = 'b', long = "key-bits", alias = "kb", default_value_t = DEFAULT_KEY_BITS)]
    key_bits: usize,

    /// Keep processing the remaining directories after a failure
    #[arg(long)]
    keep_going: bool,

    /// Do not write the key file when the existing key is reused
    #[arg(long)]
    skip_reused_key: bool,

    /// Directories holding <name>.crt and <name>.key, where <name> is the directory name
    #[arg(required = true, value_name = "DIR")]
    dirs: Vec<PathBuf>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config::builder()
            .generate_new_key(cli.new_key)
            .key_out(cli.key_out)
            .cert_out(cli.cert_out)
            .key_bits(cli.key_bits)
            .sources(cli.dirs)
            .failure_policy(if cli.keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Halt
            })
            .reused_key_output(if cli.skip_reused_key {
                ReusedKeyOutput::Skip
            } else {
                ReusedKeyOutput::Reencode
            })
            .build()
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from(Cli::parse());
    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> anyhow::Result<bool> {
    let report = pipeline::run(config).context("certificate cloning aborted")?;
    tracing::info!(
        cloned = report.processed.len(),
        failed = report.failures.len(),
        "done"
    );
    Ok(report.is_success())
}
