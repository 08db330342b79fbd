//! Vela SMB - network share browsing for the player
//!
//! Thin wrapper over an external SMB client: connect to a share, list
//! directories as JSON-friendly entries, and build `smb://` URLs the
//! playback engine can open. The SMB protocol itself is entirely the
//! client library's business.

use pavao::{SmbClient, SmbCredentials, SmbDirentType, SmbOptions};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

/// Result type alias for share operations
pub type Result<T> = std::result::Result<T, SmbError>;

/// Share wrapper errors
#[derive(Error, Debug)]
pub enum SmbError {
    #[error("SMB client error: {0}")]
    Client(#[from] pavao::SmbError),

    #[error("failed to encode listing: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Connection parameters for one share
#[derive(Clone, Serialize, Deserialize)]
pub struct SmbConfig {
    pub host: String,
    pub share: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub domain: String,
}

impl std::fmt::Debug for SmbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmbConfig")
            .field("host", &self.host)
            .field("share", &self.share)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

/// One directory listing entry, camelCase on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmbEntry {
    pub name: String,
    /// Share-relative path, always starting with `/`
    pub path: String,
    pub is_directory: bool,
    /// File size in bytes; absent for directories
    pub size: Option<u64>,
    /// Milliseconds since the Unix epoch
    pub modified_time: Option<i64>,
}

/// A connected SMB share.
///
/// The connection lives as long as this value; dropping it disconnects.
pub struct SmbShare {
    client: SmbClient,
    host: String,
    share: String,
}

impl SmbShare {
    /// Connect and probe the share root, so bad credentials fail here
    /// rather than on the first listing.
    pub fn connect(config: &SmbConfig) -> Result<Self> {
        let share = config.share.trim_matches('/').to_string();
        let client = SmbClient::new(
            SmbCredentials::default()
                .server(format!("smb://{}", config.host))
                .share(format!("/{share}"))
                .username(&config.username)
                .password(&config.password)
                .workgroup(&config.domain),
            SmbOptions::default().one_share_per_server(true),
        )?;
        client.stat("/")?;

        info!(host = %config.host, share = %share, "SMB share connected");
        Ok(Self {
            client,
            host: config.host.clone(),
            share,
        })
    }

    /// List a directory, skipping hidden entries and non-file listings
    /// (workgroups, printer shares and the like).
    pub fn list_directory(&self, path: &str) -> Result<Vec<SmbEntry>> {
        let dir = normalize_path(path);
        let mut entries = Vec::new();

        for dirent in self.client.list_dir(&dir)? {
            let name = dirent.name().trim_end_matches('/').to_string();
            if name.is_empty() || name.starts_with('.') {
                continue;
            }
            let is_directory = match dirent.get_type() {
                SmbDirentType::Dir => true,
                SmbDirentType::File => false,
                _ => continue,
            };

            let entry_path = join_path(&dir, &name);
            // Advisory: a file we cannot stat still shows up in the listing
            let stat = self.client.stat(&entry_path).ok();
            entries.push(SmbEntry {
                size: if is_directory {
                    None
                } else {
                    stat.as_ref().map(|s| s.size)
                },
                modified_time: stat.as_ref().and_then(|s| epoch_ms(s.modified)),
                name,
                path: entry_path,
                is_directory,
            });
        }

        debug!(path = %dir, count = entries.len(), "directory listed");
        Ok(entries)
    }

    /// The listing as a JSON array, the shape the host UI consumes
    pub fn list_directory_json(&self, path: &str) -> Result<String> {
        Ok(serde_json::to_string(&self.list_directory(path)?)?)
    }

    /// Full `smb://` URL for a share-relative path
    pub fn file_url(&self, path: &str) -> String {
        format!("smb://{}/{}{}", self.host, self.share, normalize_path(path))
    }

    /// Explicit disconnect; dropping the share does the same
    pub fn disconnect(self) {
        info!(host = %self.host, share = %self.share, "SMB share disconnected");
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn join_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn epoch_ms(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .map(|elapsed| elapsed.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("Movies"), "/Movies");
        assert_eq!(normalize_path("/Movies/2024/"), "/Movies/2024");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "a.mkv"), "/a.mkv");
        assert_eq!(join_path("/Movies", "a.mkv"), "/Movies/a.mkv");
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = SmbEntry {
            name: "a.mkv".into(),
            path: "/Movies/a.mkv".into(),
            is_directory: false,
            size: Some(1024),
            modified_time: Some(1700000000000),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""isDirectory":false"#));
        assert!(json.contains(r#""modifiedTime":1700000000000"#));
        assert!(json.contains(r#""size":1024"#));

        let parsed: SmbEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_directory_entry_has_no_size() {
        let entry = SmbEntry {
            name: "Movies".into(),
            path: "/Movies".into(),
            is_directory: true,
            size: None,
            modified_time: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""size":null"#));
    }

    #[test]
    fn test_config_debug_redacts_password() {
        let config = SmbConfig {
            host: "nas".into(),
            share: "media".into(),
            username: "user".into(),
            password: "hunter2".into(),
            domain: String::new(),
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
