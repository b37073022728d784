//! Profile sections of the shared AWS `config` and `credentials` files.
//!
//! Both files are plain INI documents keyed by profile name:
//!
//! ```ini
//! # ~/.aws/config
//! [profile mfa_user]
//! region=eu-central-1
//!
//! # ~/.aws/credentials
//! [mfa_user]
//! aws_access_key_id=ASIA...
//! aws_secret_access_key=...
//! aws_session_token=...
//! ```
//!
//! Editing is line based rather than a parse/serialize round trip so that
//! comments, ordering and unrelated sections survive untouched. A stale
//! section is recognised by its exact header line followed by the known keys
//! in their rendered order; only those lines are removed.

use std::fmt;

use crate::credentials::SessionCredentials;

/// Profile name that is never prefixed with `profile ` in the config file.
const DEFAULT_PROFILE: &str = "default";

const CONFIG_KEYS: [&str; 1] = ["region"];
const CREDENTIAL_KEYS: [&str; 3] = [
    "aws_access_key_id",
    "aws_secret_access_key",
    "aws_session_token",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Config,
    Credentials,
}

impl SectionKind {
    pub fn header(self, profile: &str) -> String {
        match self {
            Self::Config if profile != DEFAULT_PROFILE => format!("[profile {profile}]"),
            _ => format!("[{profile}]"),
        }
    }

    /// Whether `line` is a header for `profile`. The config file also accepts
    /// `[profile default]`, which older files may carry next to `[default]`.
    pub fn is_header(self, line: &str, profile: &str) -> bool {
        let line = line.trim();
        line == self.header(profile)
            || (self == Self::Config
                && profile == DEFAULT_PROFILE
                && line == format!("[profile {profile}]"))
    }

    /// Keys written under the header, in order.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Config => &CONFIG_KEYS,
            Self::Credentials => &CREDENTIAL_KEYS,
        }
    }
}

/// A freshly rendered profile section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    kind: SectionKind,
    profile: String,
    values: Vec<String>,
}

impl Section {
    pub fn config(profile: &str, region: &str) -> Self {
        Self {
            kind: SectionKind::Config,
            profile: profile.to_string(),
            values: vec![region.to_string()],
        }
    }

    pub fn credentials(profile: &str, session: &SessionCredentials) -> Self {
        Self {
            kind: SectionKind::Credentials,
            profile: profile.to_string(),
            values: vec![
                session.access_key_id.clone(),
                session.secret_access_key.clone(),
                session.session_token.clone(),
            ],
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    fn lines(&self) -> impl Iterator<Item = String> + '_ {
        let entries = self
            .kind
            .keys()
            .iter()
            .zip(&self.values)
            .map(|(key, value)| format!("{key}={value}"));
        std::iter::once(self.kind.header(&self.profile)).chain(entries)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Position of the section scanner relative to a matching header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Outside,
    /// Index into [`SectionKind::keys`] expected on the current line.
    Awaiting(usize),
}

/// An INI document held as an ordered list of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Index of the first header line for `profile`.
    pub fn find(&self, kind: SectionKind, profile: &str) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| kind.is_header(line, profile))
    }

    /// Removes every `profile` section of `kind`, returning how many headers
    /// were found.
    ///
    /// A header is followed by at most `kind.keys().len()` lines that belong
    /// to it; each one is removed only if it carries the key expected at that
    /// offset. Any other `[...]` header ends the section. A blank line
    /// directly above a removed header goes with it.
    pub fn remove_section(&mut self, kind: SectionKind, profile: &str) -> usize {
        let keys = kind.keys();

        let mut stale = vec![false; self.lines.len()];
        let mut removed = 0;
        let mut state = Scan::Outside;

        for (i, line) in self.lines.iter().enumerate() {
            if kind.is_header(line, profile) {
                stale[i] = true;
                if i > 0 && !stale[i - 1] && self.lines[i - 1].trim().is_empty() {
                    stale[i - 1] = true;
                }
                removed += 1;
                state = Scan::Awaiting(0);
                continue;
            }

            state = match state {
                Scan::Outside => Scan::Outside,
                Scan::Awaiting(_) if line.trim_start().starts_with('[') => Scan::Outside,
                Scan::Awaiting(k) => {
                    if line.contains(keys[k]) {
                        stale[i] = true;
                    }
                    if k + 1 < keys.len() {
                        Scan::Awaiting(k + 1)
                    } else {
                        Scan::Outside
                    }
                }
            };
        }

        if removed > 0 {
            let mut stale = stale.into_iter();
            self.lines.retain(|_| !stale.next().unwrap_or(false));
        }
        removed
    }

    /// Drops whitespace-only lines at the start and end of the document.
    pub fn trim_blank_edges(&mut self) {
        let blank = |line: &String| line.trim().is_empty();
        let end = self
            .lines
            .iter()
            .rposition(|line| !blank(line))
            .map_or(0, |i| i + 1);
        self.lines.truncate(end);
        let start = self
            .lines
            .iter()
            .position(|line| !blank(line))
            .unwrap_or(self.lines.len());
        self.lines.drain(..start);
    }

    /// Replaces any existing copy of `section` with the fresh one at the end
    /// of the document.
    pub fn upsert(&mut self, section: &Section) -> usize {
        let removed = self.remove_section(section.kind(), section.profile());
        self.trim_blank_edges();
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines.extend(section.lines());
        removed
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
