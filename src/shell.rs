//! Environment-variable delivery: start the user's shell with the session
//! credentials exported.

use std::{ffi::OsString, path::Path, process::Command};

use anyhow::{Context, Result};
use log::info;

use crate::credentials::SessionCredentials;

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AWS_REGION: &str = "AWS_REGION";

/// The variables exported to the shell.
pub fn session_env<'a>(
    session: &'a SessionCredentials,
    region: &'a str,
) -> [(&'static str, &'a str); 4] {
    [
        (AWS_ACCESS_KEY_ID, session.access_key_id.as_str()),
        (AWS_SECRET_ACCESS_KEY, session.secret_access_key.as_str()),
        (AWS_SESSION_TOKEN, session.session_token.as_str()),
        (AWS_REGION, region),
    ]
}

/// Replaces the running process with another program.
pub trait ReplaceProcess {
    /// Runs `command` in place of the current process. Returns only on failure.
    fn replace(&self, command: Command) -> Result<()>;
}

/// `exec(2)` on Unix; elsewhere the command is spawned and this process exits
/// with the child's status once it finishes.
pub struct NativeExec;

impl ReplaceProcess for NativeExec {
    #[cfg(unix)]
    fn replace(&self, mut command: Command) -> Result<()> {
        use std::os::unix::process::CommandExt;

        let err = command.exec();
        Err(err).with_context(|| format!("could not execute {:?}", command.get_program()))
    }

    #[cfg(not(unix))]
    fn replace(&self, mut command: Command) -> Result<()> {
        let status = command
            .status()
            .with_context(|| format!("could not execute {:?}", command.get_program()))?;
        std::process::exit(status.code().unwrap_or(1))
    }
}

pub struct EnvSink<R> {
    replacer: R,
}

impl<R: ReplaceProcess> EnvSink<R> {
    pub fn new(replacer: R) -> Self {
        Self { replacer }
    }

    /// Starts `shell` (normally `$SHELL`) with the current environment plus
    /// the session variables.
    ///
    /// With [`NativeExec`] on Unix this only returns when the shell could not
    /// be executed.
    ///
    /// # Arguments
    ///
    /// * `shell` - Program to start; `None` or empty is an error
    /// * `session` - Credentials exported as `AWS_ACCESS_KEY_ID`,
    ///   `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`
    /// * `region` - Exported as `AWS_REGION`
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * `shell` is missing or empty
    /// * The replacer fails to start the program
    pub fn launch(
        &self,
        shell: Option<OsString>,
        session: &SessionCredentials,
        region: &str,
    ) -> Result<()> {
        let shell = shell
            .filter(|s| !s.is_empty())
            .context("SHELL is not set, cannot start a shell with the credentials")?;

        let mut command = Command::new(&shell);
        command.envs(session_env(session, region));

        info!(
            "Starting {} with session credentials, expire at: {}",
            Path::new(&shell).display(),
            session.expires_at()
        );
        self.replacer.replace(command)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, ffi::OsStr};

    use aws_smithy_types::DateTime;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        command: RefCell<Option<Command>>,
    }

    impl ReplaceProcess for &Recorder {
        fn replace(&self, command: Command) -> Result<()> {
            *self.command.borrow_mut() = Some(command);
            Ok(())
        }
    }

    fn session() -> SessionCredentials {
        SessionCredentials {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiration: DateTime::from_secs(0),
        }
    }

    #[test]
    fn test_launch_exports_session_variables() {
        let recorder = Recorder::default();
        EnvSink::new(&recorder)
            .launch(Some("/bin/zsh".into()), &session(), "eu-central-1")
            .unwrap();

        let command = recorder.command.take().unwrap();
        assert_eq!(command.get_program(), OsStr::new("/bin/zsh"));
        assert_eq!(command.get_args().count(), 0);

        let envs: Vec<_> = command.get_envs().collect();
        assert_eq!(
            envs,
            [
                (OsStr::new(AWS_ACCESS_KEY_ID), Some(OsStr::new("ASIAEXAMPLE"))),
                (OsStr::new(AWS_REGION), Some(OsStr::new("eu-central-1"))),
                (OsStr::new(AWS_SECRET_ACCESS_KEY), Some(OsStr::new("secret"))),
                (OsStr::new(AWS_SESSION_TOKEN), Some(OsStr::new("token"))),
            ]
        );
    }

    #[test]
    fn test_launch_requires_shell() {
        let recorder = Recorder::default();
        let sink = EnvSink::new(&recorder);

        assert!(sink.launch(None, &session(), "eu-central-1").is_err());
        assert!(sink.launch(Some("".into()), &session(), "eu-central-1").is_err());
        assert!(recorder.command.borrow().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_native_exec_reports_missing_program() {
        let command = Command::new("/nonexistent/aws-mfa-session-shell");
        let err = NativeExec.replace(command).unwrap_err();
        assert!(err.to_string().contains("could not execute"));
    }
}
