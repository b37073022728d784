//! Command-line interface definitions.

use std::{fmt, path::PathBuf};

use clap::{CommandFactory, Parser, ValueEnum, error::ErrorKind};

/// AWS MFA session helper.
///
/// Exchanges an MFA code for temporary session credentials and either writes
/// them to the shared AWS config/credentials files under `--profile`, or
/// starts a new shell with the credentials exported as environment variables.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// AWS region
    #[arg(short, long, default_value = "eu-central-1")]
    pub region: String,

    /// AWS profile name
    #[arg(short, long, default_value = "mfa_user")]
    pub profile: String,

    /// The identification number of the MFA device
    #[arg(long, default_value = "virtual")]
    pub serial: String,

    /// MFA token for your AWS account
    #[arg(long, default_value = "", hide_default_value = true)]
    pub mfa: String,

    /// Where to deliver the credentials
    #[arg(long, value_enum, default_value_t = Mode::Conf)]
    pub mode: Mode,

    /// Session token duration in seconds
    #[arg(short, long, env = "AWS_SESSION_DURATION", default_value = "43200")]
    pub duration: u32,

    /// AWS config file location [default: ~/.aws/config]
    #[arg(long = "conf", env = "AWS_CONFIG_FILE")]
    pub config_path: Option<PathBuf>,

    /// AWS credentials file location [default: ~/.aws/credentials]
    #[arg(long = "cred", env = "AWS_SHARED_CREDENTIALS_FILE")]
    pub credentials_path: Option<PathBuf>,

    /// IAM access key id to authenticate the request
    #[arg(long)]
    pub access_key_id: Option<String>,

    /// IAM secret access key to authenticate the request
    #[arg(long)]
    pub secret_access_key: Option<String>,
}

/// Credential delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Start a new shell with the credentials loaded as environment variables
    Env,
    /// Write the credentials to the AWS config and credentials files
    Conf,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Env => "env",
            Self::Conf => "conf",
        })
    }
}

impl Args {
    /// Checks the options clap cannot express as required: both may be
    /// passed explicitly as empty strings.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.serial.trim().is_empty() || self.mfa.trim().is_empty() {
            return Err(Self::command().error(
                ErrorKind::MissingRequiredArgument,
                "Serial number and mfa must be defined (--serial, --mfa)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["aws-mfa-session", "--mfa", "123456"]).unwrap();

        assert_eq!(args.region, "eu-central-1");
        assert_eq!(args.profile, "mfa_user");
        assert_eq!(args.serial, "virtual");
        assert_eq!(args.mode, Mode::Conf);
        assert!(args.access_key_id.is_none());
        assert!(args.secret_access_key.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "aws-mfa-session",
            "--region",
            "us-west-2",
            "--profile",
            "work",
            "--serial",
            "arn:aws:iam::123456789012:mfa/alice",
            "--mfa",
            "654321",
            "--mode",
            "env",
            "--duration",
            "3600",
            "--conf",
            "/tmp/config",
            "--cred",
            "/tmp/credentials",
        ])
        .unwrap();

        assert_eq!(args.region, "us-west-2");
        assert_eq!(args.profile, "work");
        assert_eq!(args.serial, "arn:aws:iam::123456789012:mfa/alice");
        assert_eq!(args.mfa, "654321");
        assert_eq!(args.mode, Mode::Env);
        assert_eq!(args.duration, 3600);
        assert_eq!(args.config_path, Some(PathBuf::from("/tmp/config")));
        assert_eq!(args.credentials_path, Some(PathBuf::from("/tmp/credentials")));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_unsupported_mode_is_rejected() {
        let err = Args::try_parse_from(["aws-mfa-session", "--mfa", "1", "--mode", "file"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_missing_mfa_fails_validation() {
        let args = Args::try_parse_from(["aws-mfa-session"]).unwrap();
        let err = args.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_empty_serial_fails_validation() {
        let args =
            Args::try_parse_from(["aws-mfa-session", "--mfa", "123456", "--serial", ""]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_mode_display_matches_value_names() {
        for mode in Mode::value_variants() {
            let name = mode.to_possible_value().unwrap();
            assert_eq!(mode.to_string(), name.get_name());
        }
    }
}
