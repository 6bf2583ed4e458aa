//! Hand-off to the host's default mail composer.
//!
//! After a run the score sheet is usually mailed to the assessment office.
//! We only open a pre-filled compose window via a `mailto:` URI; attaching
//! the file is left to the user.
//!
//! ```rust,ignore
//! use sloscore::mail::{MailConfig, open_composer};
//!
//! let config = MailConfig::from_env();
//! if let Err(e) = open_composer(&config) {
//!     eprintln!("{e}");
//! }
//! ```

use std::env;
use std::process::Command;

use crate::error::MailError;

/// Placeholder recipient used when none is configured.
pub const DEFAULT_RECIPIENT: &str = "recipient@example.com";

/// Subject line used when none is configured.
pub const DEFAULT_SUBJECT: &str = "SLO Grades";

/// Compose window fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MailConfig {
    pub recipient: String,
    pub subject: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_RECIPIENT.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

impl MailConfig {
    pub fn new(recipient: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
        }
    }

    /// Read `SLOSCORE_MAIL_TO` and `SLOSCORE_MAIL_SUBJECT`, falling back to defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Self {
            recipient: env::var("SLOSCORE_MAIL_TO").unwrap_or(defaults.recipient),
            subject: env::var("SLOSCORE_MAIL_SUBJECT").unwrap_or(defaults.subject),
        }
    }

    /// Override fields given on the command line.
    pub fn with_overrides(mut self, recipient: Option<String>, subject: Option<String>) -> Self {
        if let Some(r) = recipient {
            self.recipient = r;
        }
        if let Some(s) = subject {
            self.subject = s;
        }
        self
    }

    pub fn mailto_uri(&self) -> String {
        format!(
            "mailto:{}?subject={}",
            percent_encode(&self.recipient, true),
            percent_encode(&self.subject, false)
        )
    }
}

/// RFC 3986 percent-encoding. `@` is kept in addresses.
fn percent_encode(input: &str, address: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'@' if address => out.push('@'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Platform command that opens a URI with the default handler.
fn opener(uri: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(uri);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", uri]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(uri);
        cmd
    }
}

/// Open the default mail composer with recipient and subject filled in.
pub fn open_composer(config: &MailConfig) -> Result<(), MailError> {
    let uri = config.mailto_uri();
    let mut cmd = opener(&uri);
    let command = format!("{:?}", cmd.get_program());

    let status = cmd.status().map_err(|source| MailError::Launch {
        command: command.clone(),
        source,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(MailError::Exit {
            command,
            status: status.to_string(),
        })
    }
}
