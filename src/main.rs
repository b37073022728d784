//! AWS MFA session helper
//!
//! Exchanges an MFA one-time code for temporary AWS session credentials.
//!
//! The program performs the following operations:
//! 1. Parses and validates command-line arguments
//! 2. Requests a session token from STS using the configured profile, MFA device and code
//! 3. Delivers the credentials according to `--mode`:
//!    - `conf`: replaces the profile's sections in the AWS config and credentials files
//!    - `env`: starts `$SHELL` with the credentials exported as environment variables

use std::env;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

mod cli;
mod config;
mod credentials;
mod profile;
mod shell;
mod updater;

use cli::{Args, Mode};
use config::Config;
use credentials::SessionExchanger;
use shell::{EnvSink, NativeExec};
use updater::ProfileUpdater;

/// Main entry point.
///
/// Missing `--serial` or `--mfa` is a usage error: clap prints the usage and
/// exits with status 2 before any request is made. Every other failure is
/// returned as an error and exits with status 1.
#[tokio::main]
async fn main() -> Result<()> {
    // Users can override with RUST_LOG environment variable.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    if let Err(err) = args.validate() {
        err.exit();
    }
    let config = Config::from_args(args)?;

    if config.has_static_credentials() {
        warn!(
            "--access-key-id/--secret-access-key are ignored, credentials come from profile {}",
            config.profile
        );
    }

    info!(
        "Fetching session token - Profile: {}, Duration: {}s, Mode: {}",
        config.profile, config.duration, config.mode
    );
    let session = SessionExchanger::new(&config)
        .get_session_token(&config.token_code)
        .await?;

    match config.mode {
        Mode::Env => {
            EnvSink::new(NativeExec).launch(env::var_os("SHELL"), &session, &config.region)
        }
        Mode::Conf => {
            ProfileUpdater::new(&config).store(&session).await?;
            info!("Success! Credentials expire at: {}", session.expires_at());
            Ok(())
        }
    }
}
