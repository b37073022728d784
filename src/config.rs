//! Run configuration assembled once from the parsed command line.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::{Args, Mode};

/// Immutable settings for a single invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub region: String,
    pub profile: String,
    pub serial_number: String,
    pub token_code: String,
    pub mode: Mode,
    /// Requested session lifetime in seconds
    pub duration: u32,
    pub config_path: PathBuf,
    pub credentials_path: PathBuf,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Config {
    /// Builds the configuration, filling in `~/.aws/config` and
    /// `~/.aws/credentials` for paths not given on the command line.
    pub fn from_args(args: Args) -> Result<Self> {
        let config_path = resolve(args.config_path, "config")?;
        let credentials_path = resolve(args.credentials_path, "credentials")?;

        Ok(Self {
            region: args.region,
            profile: args.profile,
            serial_number: args.serial,
            token_code: args.mfa,
            mode: args.mode,
            duration: args.duration,
            config_path,
            credentials_path,
            access_key_id: args.access_key_id,
            secret_access_key: args.secret_access_key,
        })
    }

    pub fn has_static_credentials(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.access_key_id) && set(&self.secret_access_key)
    }
}

fn resolve(path: Option<PathBuf>, file_name: &str) -> Result<PathBuf> {
    path.or_else(|| dirs::home_dir().map(|home| home.join(".aws").join(file_name)))
        .context("Could not determine home directory")
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["aws-mfa-session", "--mfa", "123456"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_explicit_paths_are_kept() {
        let config = Config::from_args(parse(&[
            "--conf",
            "/srv/aws/config",
            "--cred",
            "/srv/aws/credentials",
        ]))
        .unwrap();

        assert_eq!(config.config_path, PathBuf::from("/srv/aws/config"));
        assert_eq!(config.credentials_path, PathBuf::from("/srv/aws/credentials"));
        assert_eq!(config.token_code, "123456");
        assert_eq!(config.serial_number, "virtual");
    }

    #[test]
    fn test_default_paths_live_under_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let mut args = parse(&[]);
        args.config_path = None;
        args.credentials_path = None;

        let config = Config::from_args(args).unwrap();
        assert_eq!(config.config_path, home.join(".aws").join("config"));
        assert_eq!(config.credentials_path, home.join(".aws").join("credentials"));
    }

    #[test]
    fn test_static_credentials_need_both_keys() {
        let neither = Config::from_args(parse(&["--conf", "c", "--cred", "k"])).unwrap();
        assert!(!neither.has_static_credentials());

        let one = Config::from_args(parse(&[
            "--conf",
            "c",
            "--cred",
            "k",
            "--access-key-id",
            "AKIAEXAMPLE",
        ]))
        .unwrap();
        assert!(!one.has_static_credentials());

        let empty_secret = Config::from_args(parse(&[
            "--conf",
            "c",
            "--cred",
            "k",
            "--access-key-id",
            "AKIAEXAMPLE",
            "--secret-access-key",
            "",
        ]))
        .unwrap();
        assert!(!empty_secret.has_static_credentials());

        let both = Config::from_args(parse(&[
            "--conf",
            "c",
            "--cred",
            "k",
            "--access-key-id",
            "AKIAEXAMPLE",
            "--secret-access-key",
            "secret",
        ]))
        .unwrap();
        assert!(both.has_static_credentials());
    }
}
