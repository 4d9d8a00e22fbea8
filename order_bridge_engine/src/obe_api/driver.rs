use std::path::{Path, PathBuf};

use log::*;
use thiserror::Error;

use crate::helpers::Secret;

const DEFAULT_SESSION_FILE: &str = "partner-session.json";
const DEFAULT_PARTNER_URL: &str = "https://www.zomato.com/partners";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("The partner portal rejected the login. {0}")]
    LoginRejected(String),
    #[error("The automation driver failed. {0}")]
    DriverFailure(String),
}

/// The contract for the external browser automation that logs into the partner portal.
///
/// Implementations own all browser and network I/O, including timeouts and retries.
#[allow(async_fn_in_trait)]
pub trait AutomationDriver {
    /// Verifies the credentials against the partner portal and persists the resulting browser session.
    ///
    /// Returns an opaque reference to the persisted session artifact (typically a file path).
    async fn establish_session(&self, principal: &str, proof: &Secret<String>) -> Result<String, DriverError>;

    /// Whether a reusable session artifact from an earlier login is available.
    fn has_existing_session(&self) -> bool;
}

/// A driver that keeps the browser session in a single file.
///
/// This driver does not perform the browser login itself. It accepts any non-blank credentials and hands back the
/// configured session file, which the browser automation is expected to populate.
#[derive(Debug, Clone)]
pub struct SessionFileDriver {
    session_file: PathBuf,
    partner_url: String,
    headless: bool,
}

impl Default for SessionFileDriver {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_FILE, DEFAULT_PARTNER_URL, true)
    }
}

impl SessionFileDriver {
    pub fn new<P: AsRef<Path>>(session_file: P, partner_url: &str, headless: bool) -> Self {
        Self { session_file: session_file.as_ref().to_path_buf(), partner_url: partner_url.to_string(), headless }
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    pub fn partner_url(&self) -> &str {
        &self.partner_url
    }

    pub fn headless(&self) -> bool {
        self.headless
    }
}

impl AutomationDriver for SessionFileDriver {
    async fn establish_session(&self, principal: &str, proof: &Secret<String>) -> Result<String, DriverError> {
        info!("🔌️ Attempting login for user: {principal} at {} (headless: {})", self.partner_url, self.headless);
        if principal.trim().is_empty() {
            return Err(DriverError::LoginRejected("A username is required".into()));
        }
        if proof.reveal().is_empty() {
            return Err(DriverError::LoginRejected(format!("No password was supplied for {principal}")));
        }
        Ok(self.session_file.to_string_lossy().into_owned())
    }

    fn has_existing_session(&self) -> bool {
        self.session_file.exists()
    }
}
