//! Common utility functions shared across CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use guestbook_core::{
    FileKeyValueStore, GalleryTab, GuestbookSession, HeadlessWorkspace, HttpGuestbookStore,
    HttpStoreConfig, SyncConfig, VisitorId, VisitorIdentity,
};
use tracing::debug;

/// Session type every command works with.
pub type CliSession = GuestbookSession<HttpGuestbookStore, HeadlessWorkspace>;

/// Settings shared by all commands, resolved from flags and the environment.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub config: SyncConfig,
    pub state_file: PathBuf,
    pub quiet: bool,
}

impl ClientContext {
    pub fn new(server: Option<String>, state_file: Option<PathBuf>, quiet: bool) -> Self {
        let config = SyncConfig::from_env();
        let config = match server {
            Some(url) => config.with_server_url(url),
            None => config,
        };
        Self {
            config,
            state_file: state_file.unwrap_or_else(default_state_file),
            quiet,
        }
    }

    /// Persisted visitor id, created on first use.
    pub fn visitor(&self) -> Result<VisitorId> {
        debug!(path = %self.state_file.display(), "Loading visitor id");
        VisitorIdentity::new(FileKeyValueStore::new(&self.state_file))
            .get_or_create()
            .context("Failed to load visitor identity")
    }

    pub fn store(&self) -> Result<HttpGuestbookStore> {
        let config = HttpStoreConfig::from_sync_config(&self.config)
            .context("Failed to configure guestbook store")?;
        HttpGuestbookStore::new(config).context("Failed to create HTTP client")
    }

    /// A session for this visitor with the gallery open on `tab`.
    pub fn session(&self, tab: GalleryTab) -> Result<CliSession> {
        Ok(GuestbookSession::new(
            self.store()?,
            HeadlessWorkspace::new(tab, true),
            self.visitor()?,
            &self.config,
        ))
    }
}

/// `<data dir>/guestbook/state.json`, or `./guestbook-state.json` when the
/// platform has no data directory.
pub fn default_state_file() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("guestbook").join("state.json"))
        .unwrap_or_else(|| PathBuf::from("guestbook-state.json"))
}

/// Read an input file with the error message the exit-code mapping expects.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Format an entry timestamp in local time.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_state_file_name() {
        let path = default_state_file();
        assert!(path.ends_with("guestbook/state.json") || path.ends_with("guestbook-state.json"));
    }

    #[test]
    fn test_server_flag_overrides_environment() {
        let ctx = ClientContext::new(
            Some("http://guestbook.local:8080/".into()),
            Some(PathBuf::from("state.json")),
            false,
        );
        assert_eq!(ctx.config.server_url, "http://guestbook.local:8080");
        assert_eq!(ctx.state_file, PathBuf::from("state.json"));
    }

    #[test]
    fn test_visitor_is_persisted() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ClientContext::new(None, Some(dir.path().join("nested/state.json")), true);
        let first = ctx.visitor().unwrap();
        let second = ctx.visitor().unwrap();
        assert_eq!(first, second);
        assert!(first.as_str().starts_with("visitor_"));
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap();
        let formatted = format_timestamp(&at);
        assert!(formatted.starts_with("2024-01-1"));
        assert_eq!(formatted.len(), "2024-01-15 12:30:45".len());
    }

    #[test]
    fn test_missing_input_message() {
        let err = read_input(Path::new("does/not/exist.jpg")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read file"));
    }
}
