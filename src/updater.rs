//! AWS profile file updater
//!
//! Persists session credentials to the two shared AWS files for a single
//! profile:
//!
//! ```ini
//! # config
//! [profile mfa_user]
//! region=eu-central-1
//!
//! # credentials
//! [mfa_user]
//! aws_access_key_id=ASIA...
//! aws_secret_access_key=...
//! aws_session_token=...
//! ```
//!
//! Both files must already exist. They are read in full before anything is
//! written, so a read failure leaves both untouched. There is no transaction
//! across the two writes: if the config write fails after the credentials
//! write succeeded, the error names the config file and the credentials file
//! already holds the new session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use tokio::{fs, io::AsyncWriteExt};

use crate::{
    config::Config,
    credentials::SessionCredentials,
    profile::{Document, Section},
};

/// Writes session credentials into the AWS config and credentials files.
pub struct ProfileUpdater {
    profile: String,
    region: String,
    config_path: PathBuf,
    credentials_path: PathBuf,
}

impl ProfileUpdater {
    /// Creates an updater for the profile, region and file paths in `config`.
    ///
    /// Nothing is read or checked here; both files are opened by [`store`].
    ///
    /// # Arguments
    ///
    /// * `config` - Run configuration. `profile` names the sections to replace,
    ///   `region` goes into the config section, and `config_path` /
    ///   `credentials_path` locate the two files.
    ///
    /// [`store`]: ProfileUpdater::store
    pub fn new(config: &Config) -> Self {
        Self {
            profile: config.profile.clone(),
            region: config.region.clone(),
            config_path: config.config_path.clone(),
            credentials_path: config.credentials_path.clone(),
        }
    }

    /// Replaces the profile's sections in both files with `session`.
    ///
    /// Both files are read before either is written. The credentials file is
    /// written first, then the config file.
    ///
    /// # Arguments
    ///
    /// * `session` - Temporary credentials returned by STS
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Both files hold exactly one up-to-date section for the profile
    /// * `Err(anyhow::Error)` - The message names the file that failed
    ///
    /// # Errors
    ///
    /// * Either file cannot be read (nothing is written in that case)
    /// * Either file cannot be written or its permissions cannot be set
    pub async fn store(&self, session: &SessionCredentials) -> Result<()> {
        let config = read(&self.config_path, "config").await?;
        let credentials = read(&self.credentials_path, "credentials").await?;

        let credentials = rewrite(&credentials, &Section::credentials(&self.profile, session));
        let config = rewrite(&config, &Section::config(&self.profile, &self.region));

        write_private(&self.credentials_path, &credentials, "credentials").await?;
        write_private(&self.config_path, &config, "config").await?;

        info!(
            "Updated profile {} in {} and {}",
            self.profile,
            self.credentials_path.display(),
            self.config_path.display()
        );
        Ok(())
    }
}

/// Returns `text` with any previous copy of `section` replaced by it.
pub fn rewrite(text: &str, section: &Section) -> String {
    let mut document = Document::parse(text);
    if let Some(line) = document.find(section.kind(), section.profile()) {
        debug!(
            "Replacing {:?} section for {} found at line {}",
            section.kind(),
            section.profile(),
            line + 1
        );
    }
    document.upsert(section);
    document.to_string()
}

async fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("could not read {what} file {}", path.display()))
}

/// Replaces the contents of `path`, restricting it to owner read/write on
/// Unix before any of `content` is written.
async fn write_private(path: &Path, content: &str, what: &str) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .with_context(|| format!("could not open {what} file {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await
            .with_context(|| format!("could not restrict permissions of {}", path.display()))?;
    }

    file.write_all(content.as_bytes())
        .await
        .with_context(|| format!("could not write {what} file {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("could not write {what} file {}", path.display()))?;

    Ok(())
}
