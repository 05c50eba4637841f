use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shellwire_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
#[cfg(unix)]
use shellwire_transport::UnixDomainSocket;

use crate::error::Result;

/// Configuration of a UI process's listening side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory holding the session socket.
    pub socket_dir: PathBuf,
    /// Permission bits applied to the socket file.
    pub socket_mode: u32,
    /// Maximum payload size accepted from a content process.
    pub max_payload_size: usize,
    /// Name used for the UI process in logs.
    pub process_name: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            socket_dir: default_socket_dir(),
            socket_mode: 0o600,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            process_name: "ui".to_string(),
        }
    }
}

/// The user's runtime directory, or the temp dir where there is none.
pub fn default_socket_dir() -> PathBuf {
    dirs::runtime_dir().unwrap_or_else(std::env::temp_dir)
}

impl HostConfig {
    /// Frame settings for connections accepted under this config.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
        }
    }

    /// Pick a fresh session socket path inside [`HostConfig::socket_dir`].
    pub fn session_socket_path(&self) -> Result<PathBuf> {
        Ok(shellwire_transport::session_socket_path(&self.socket_dir)?)
    }

    /// Bind the session socket at `path`, or at a fresh session path.
    #[cfg(unix)]
    pub fn bind(&self, path: Option<&Path>) -> Result<UnixDomainSocket> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.session_socket_path()?,
        };
        Ok(UnixDomainSocket::bind_with_mode(path, self.socket_mode)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HostConfig::default();
        assert_eq!(config.socket_mode, 0o600);
        assert_eq!(config.frame_config().max_payload_size, DEFAULT_MAX_PAYLOAD);
        assert!(config
            .session_socket_path()
            .unwrap()
            .starts_with(&config.socket_dir));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: HostConfig =
            serde_json::from_str(r#"{"max_payload_size": 1024, "process_name": "shell"}"#)
                .unwrap();
        assert_eq!(config.max_payload_size, 1024);
        assert_eq!(config.process_name, "shell");
        assert_eq!(config.socket_mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn bind_explicit_path() {
        let dir = std::env::temp_dir().join(format!("shellwire-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("host.sock");

        let socket = HostConfig::default().bind(Some(&path)).unwrap();
        assert_eq!(socket.path(), path);
        drop(socket);
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
