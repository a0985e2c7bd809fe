//! Namespace-prefix loader descriptors.
//!
//! An [`Autoload`] maps qualified names under a namespace to files below a
//! root directory: `My\Lib\Sub\Thing` with namespace `My\Lib` and path
//! `/srv/lib` resolves to `/srv/lib/Sub/Thing.so` (on Linux).

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Class name reported for loaders built without an explicit `class`.
pub const DEFAULT_AUTOLOAD_CLASS: &str = "Kickstart\\Autoload";

/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "Kickstart";

/// Namespace separator used when none is given.
pub const DEFAULT_SEPARATOR: &str = "\\";

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new(1);

/// Optional fields of a loader as written in configuration.
///
/// Missing fields take their defaults in [`Autoload::from_state`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoloadState {
    pub class: Option<String>,
    pub namespace: Option<String>,
    pub path: Option<PathBuf>,
    pub separator: Option<String>,
    pub extension: Option<String>,
}

/// A registered (or registrable) namespace loader.
///
/// Every loader built by [`Autoload::new`] is a distinct instance, and clones
/// share their original's instance. Equality compares configuration only;
/// registration is keyed on the instance (see [`Autoload::same_instance`]).
#[derive(Debug, Clone, Serialize)]
pub struct Autoload {
    #[serde(skip)]
    id: u64,
    /// Loader implementation name
    pub class: String,
    /// Namespace prefix this loader serves
    pub namespace: String,
    /// Root directory searched for files
    pub path: PathBuf,
    /// Separator between namespace segments
    pub separator: String,
    /// File extension appended to the last segment
    pub extension: String,
}

impl Autoload {
    /// Loader for `namespace` rooted at `path`, everything else default.
    pub fn new(namespace: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed),
            class: DEFAULT_AUTOLOAD_CLASS.to_string(),
            namespace: namespace.into(),
            path: path.into(),
            separator: DEFAULT_SEPARATOR.to_string(),
            extension: std::env::consts::DLL_SUFFIX.to_string(),
        }
    }

    /// Process-unique instance id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether `other` is this loader or a clone of it.
    pub fn same_instance(&self, other: &Autoload) -> bool {
        self.id == other.id
    }

    /// Fill in a configured state. `default_path` is used when no path was given.
    pub fn from_state(state: AutoloadState, default_path: &Path) -> Self {
        let mut loader = Self::new(
            state.namespace.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            state.path.unwrap_or_else(|| default_path.to_path_buf()),
        );
        if let Some(class) = state.class {
            loader.class = class;
        }
        if let Some(separator) = state.separator.filter(|s| !s.is_empty()) {
            loader.separator = separator;
        }
        if let Some(extension) = state.extension {
            loader.extension = extension;
        }
        loader
    }

    /// Whether `name` lives under this loader's namespace.
    pub fn serves(&self, name: &str) -> bool {
        let name = name.trim_start_matches(self.separator.as_str());
        if self.namespace.is_empty() {
            return true;
        }
        match name.strip_prefix(self.namespace.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(self.separator.as_str()),
            None => false,
        }
    }

    /// File that would hold `name`, or `None` when the name is outside the namespace.
    pub fn filename_for(&self, name: &str) -> Option<PathBuf> {
        if !self.serves(name) {
            return None;
        }
        let name = name.trim_start_matches(self.separator.as_str());
        let rest = name[self.namespace.len()..].trim_start_matches(self.separator.as_str());
        if rest.is_empty() {
            return None;
        }

        let rest: String = rest.chars().filter(|c| *c != '\0').collect();

        let mut file = self.path.clone();
        let mut segments = rest.split(self.separator.as_str()).peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                file.push(segment);
            } else {
                file.push(format!("{}{}", segment, self.extension));
            }
        }
        Some(file)
    }
}

impl PartialEq for Autoload {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && self.namespace == other.namespace
            && self.path == other.path
            && self.separator == other.separator
            && self.extension == other.extension
    }
}

impl Eq for Autoload {}

impl Hash for Autoload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.namespace.hash(state);
        self.path.hash(state);
        self.separator.hash(state);
        self.extension.hash(state);
    }
}
