//! Per-session socket naming.

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

use crate::error::{Result, TransportError};

/// File name prefix of every session socket.
pub const SOCKET_PREFIX: &str = "shellwire-ipc";

const SUFFIX_LEN: usize = 10;
const MAX_ATTEMPTS: usize = 32;

/// Build an unused socket path for this UI process inside `dir`.
///
/// Names look like `shellwire-ipc-<pid>-<suffix>`. A candidate that already
/// exists on disk is skipped and a new suffix is drawn.
pub fn session_socket_path(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let pid = std::process::id();
    let mut rng = rand::thread_rng();

    for _ in 0..MAX_ATTEMPTS {
        let suffix: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(char::from)
            .collect();
        let candidate = dir.join(format!("{SOCKET_PREFIX}-{pid}-{suffix}"));
        if std::fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
        debug!(path = ?candidate, "session socket name taken, retrying");
    }

    Err(TransportError::SessionPathExhausted {
        dir: dir.to_path_buf(),
        attempts: MAX_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_has_prefix_and_pid() {
        let dir = std::env::temp_dir();
        let path = session_socket_path(&dir).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(path.starts_with(&dir));
        assert!(name.starts_with(&format!("{SOCKET_PREFIX}-{}-", std::process::id())));
        assert_eq!(
            name.len(),
            format!("{SOCKET_PREFIX}-{}-", std::process::id()).len() + SUFFIX_LEN
        );
    }

    #[test]
    fn consecutive_paths_differ() {
        let dir = std::env::temp_dir();
        let first = session_socket_path(&dir).unwrap();
        let second = session_socket_path(&dir).unwrap();
        assert_ne!(first, second);
    }
}
