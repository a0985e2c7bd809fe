//! Upward directory search for configuration roots.

use std::path::{Path, PathBuf};

use kickstart_runtime::Environment;

/// Sentinel directory under which cached data lives.
pub const CACHE_SENTINEL: &str = ".cache";

/// Sentinel directory for machine-local overrides.
pub const LOCAL_SENTINEL: &str = ".local";

/// Config sentinel for `namespace`: `.config/<namespace as path>`.
pub fn config_sentinel(namespace: &str) -> String {
    format!(".config/{}", namespace.replace('\\', "/"))
}

/// Find the nearest `ancestor/sentinel` directory, starting at `start`.
///
/// `start` itself is checked first, then each parent up to the filesystem
/// root. When nothing matches, `start` is returned unchanged. Lookup problems
/// (unreadable directories, a start that cannot be canonicalized) count as
/// "not found".
pub fn find_path(env: &dyn Environment, start: &Path, sentinel: &str) -> PathBuf {
    let mut current = env
        .canonicalize(start)
        .unwrap_or_else(|_| start.to_path_buf());

    loop {
        let candidate = current.join(sentinel);
        if env.is_dir(&candidate) {
            tracing::debug!(path = %candidate.display(), "found {}", sentinel);
            return candidate;
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => {
                tracing::debug!(start = %start.display(), "no {} above start", sentinel);
                return start.to_path_buf();
            }
        }
    }
}
