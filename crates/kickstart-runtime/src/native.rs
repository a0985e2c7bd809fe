/*
 * native.rs
 *
 * NativeEnvironment: the real filesystem plus process-wide settings.
 *
 * Settings (directives, timezone, time limit, loaders, error handler) live in
 * a ProcessState behind a mutex. `NativeEnvironment::new()` shares one state
 * for the whole process; `NativeEnvironment::isolated()` gets a private one,
 * which is what tests use.
 */

use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kickstart_error_reporting::{DiagnosticKind, DiagnosticMessage, DiagnosticMessageBuilder};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::autoload::Autoload;
use crate::error_handler::ErrorHandler;
use crate::traits::{Environment, RuntimeError, RuntimeResult};

/// Recorded warnings kept per state; older ones are dropped first.
pub const MAX_RECORDED_WARNINGS: usize = 256;

static PROCESS_STATE: Lazy<Arc<Mutex<ProcessState>>> =
    Lazy::new(|| Arc::new(Mutex::new(ProcessState::default())));

#[derive(Debug, Default)]
struct ProcessState {
    directives: BTreeMap<String, String>,
    timezone: Option<String>,
    time_limit: Option<(Duration, Instant)>,
    autoloaders: Vec<Autoload>,
    error_handlers: Vec<ErrorHandler>,
    warnings: VecDeque<DiagnosticMessage>,
}

/// Environment backed by the real filesystem and process environment.
#[derive(Debug, Clone)]
pub struct NativeEnvironment {
    state: Arc<Mutex<ProcessState>>,
}

impl NativeEnvironment {
    /// Environment sharing the process-wide settings.
    pub fn new() -> Self {
        Self {
            state: Arc::clone(&PROCESS_STATE),
        }
    }

    /// Environment with settings private to this value (and its clones).
    pub fn isolated() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProcessState::default())),
        }
    }

    /// Current value of a directive.
    pub fn directive(&self, name: &str) -> Option<String> {
        self.state.lock().directives.get(name).cloned()
    }

    /// Current default timezone, if one was set.
    pub fn timezone(&self) -> Option<String> {
        self.state.lock().timezone.clone()
    }

    /// Current time ceiling, `None` when unlimited.
    pub fn time_limit(&self) -> Option<Duration> {
        self.state.lock().time_limit.map(|(limit, _)| limit)
    }

    /// Time left before the ceiling is reached.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.state
            .lock()
            .time_limit
            .map(|(limit, started)| limit.saturating_sub(started.elapsed()))
    }

    /// Fail once the configured time ceiling has passed.
    pub fn check_time_limit(&self) -> RuntimeResult<()> {
        match self.state.lock().time_limit {
            Some((limit, started)) if started.elapsed() >= limit => {
                Err(RuntimeError::TimeLimitExceeded(limit))
            }
            _ => Ok(()),
        }
    }

    /// Registered loaders, optionally only those for the given namespaces.
    pub fn autoloaders(&self, namespaces: Option<&[&str]>) -> Vec<Autoload> {
        let state = self.state.lock();
        state
            .autoloaders
            .iter()
            .filter(|loader| match namespaces {
                Some(wanted) => wanted.contains(&loader.namespace.as_str()),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// The active error handler.
    pub fn error_handler(&self) -> Option<ErrorHandler> {
        self.state.lock().error_handlers.last().cloned()
    }

    /// Restore the handler that was active before the current one.
    pub fn restore_error_handler(&self) -> Option<ErrorHandler> {
        let mut state = self.state.lock();
        state.error_handlers.pop();
        state.error_handlers.last().cloned()
    }

    /// Warnings reported so far (at most [`MAX_RECORDED_WARNINGS`]).
    pub fn warnings(&self) -> Vec<DiagnosticMessage> {
        self.state.lock().warnings.iter().cloned().collect()
    }

    /// Drain the recorded warnings.
    pub fn take_warnings(&self) -> Vec<DiagnosticMessage> {
        std::mem::take(&mut self.state.lock().warnings).into()
    }

    /// First existing file any registered loader maps `name` to.
    pub fn locate_class(&self, name: &str) -> Option<PathBuf> {
        self.autoloaders(None)
            .iter()
            .filter_map(|loader| loader.filename_for(name))
            .find(|file| self.is_file(file))
    }
}

impl Default for NativeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

fn check_directive_name(name: &str) -> RuntimeResult<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(RuntimeError::InvalidArgument(format!(
            "directive name '{}'",
            name
        )));
    }
    Ok(())
}

fn check_timezone(name: &str) -> RuntimeResult<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(RuntimeError::InvalidArgument(format!("timezone '{}'", name)));
    }
    Ok(())
}

impl Environment for NativeEnvironment {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string_from(&self, path: &Path, offset: u64) -> RuntimeResult<String> {
        let mut file = File::open(path)?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(contents)
    }

    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        Ok(std::fs::canonicalize(path)?)
    }

    fn script_dir(&self) -> RuntimeResult<PathBuf> {
        let exe = std::env::current_exe()?;
        exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            RuntimeError::NotSupported(format!("no parent directory for {}", exe.display()))
        })
    }

    fn env_get(&self, name: &str) -> RuntimeResult<Option<String>> {
        Ok(std::env::var(name).ok())
    }

    fn set_directive(&self, name: &str, value: &str) -> RuntimeResult<Option<String>> {
        check_directive_name(name)?;
        tracing::debug!(name, value, "setting directive");
        Ok(self
            .state
            .lock()
            .directives
            .insert(name.to_string(), value.to_string()))
    }

    fn set_time_limit(&self, limit: Option<Duration>) -> RuntimeResult<()> {
        tracing::debug!(seconds = limit.map(|l| l.as_secs()), "setting time limit");
        self.state.lock().time_limit = limit.map(|limit| (limit, Instant::now()));
        Ok(())
    }

    fn set_timezone(&self, name: &str) -> RuntimeResult<()> {
        check_timezone(name)?;
        tracing::debug!(timezone = name, "setting timezone");
        self.state.lock().timezone = Some(name.to_string());
        Ok(())
    }

    fn register_autoloader(&self, loader: &Autoload) -> RuntimeResult<()> {
        let mut state = self.state.lock();
        if state.autoloaders.iter().any(|l| l.same_instance(loader)) {
            tracing::debug!(namespace = %loader.namespace, "autoloader already registered");
            return Ok(());
        }
        tracing::debug!(
            namespace = %loader.namespace,
            path = %loader.path.display(),
            "registering autoloader"
        );
        state.autoloaders.push(loader.clone());
        Ok(())
    }

    fn unregister_autoloader(&self, loader: &Autoload) -> RuntimeResult<()> {
        let removed = {
            let mut state = self.state.lock();
            let index = state.autoloaders.iter().position(|l| l.same_instance(loader));
            index.map(|index| state.autoloaders.remove(index))
        };
        if removed.is_none() {
            self.warn(
                DiagnosticMessageBuilder::from_code(DiagnosticKind::Warning, "K-2-4")
                    .problem(format!(
                        "No autoloader for namespace `{}` is registered",
                        loader.namespace
                    ))
                    .build(),
            );
        }
        Ok(())
    }

    fn register_error_handler(&self, handler: &ErrorHandler) -> RuntimeResult<()> {
        tracing::debug!(class = %handler.class, "registering error handler");
        self.state.lock().error_handlers.push(handler.clone());
        Ok(())
    }

    fn warn(&self, diagnostic: DiagnosticMessage) {
        tracing::warn!(
            code = diagnostic.code.as_deref().unwrap_or(""),
            "{}",
            diagnostic.title
        );
        let mut state = self.state.lock();
        if state.warnings.len() >= MAX_RECORDED_WARNINGS {
            state.warnings.pop_front();
        }
        state.warnings.push_back(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::Severity;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_from_offset() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("multi.yaml");
        fs::write(&file, "a: 1\n---\nb: 2\n").unwrap();

        let env = NativeEnvironment::isolated();
        assert_eq!(env.read_to_string(&file).unwrap(), "a: 1\n---\nb: 2\n");
        assert_eq!(env.read_to_string_from(&file, 5).unwrap(), "---\nb: 2\n");
        assert_eq!(env.read_to_string_from(&file, 1000).unwrap(), "");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let env = NativeEnvironment::isolated();
        let err = env
            .read_to_string(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Io(_)));
    }

    #[test]
    fn test_directive_returns_previous() {
        let env = NativeEnvironment::isolated();
        assert_eq!(env.set_directive("memory_limit", "128M").unwrap(), None);
        assert_eq!(
            env.set_directive("memory_limit", "256M").unwrap(),
            Some("128M".to_string())
        );
        assert_eq!(env.directive("memory_limit"), Some("256M".to_string()));
        assert!(env.set_directive("bad name", "1").is_err());
    }

    #[test]
    fn test_time_limit() {
        let env = NativeEnvironment::isolated();
        assert_eq!(env.time_limit(), None);
        assert!(env.check_time_limit().is_ok());

        env.set_time_limit(Some(Duration::from_secs(60))).unwrap();
        assert_eq!(env.time_limit(), Some(Duration::from_secs(60)));
        assert!(env.time_remaining().unwrap() <= Duration::from_secs(60));
        assert!(env.check_time_limit().is_ok());

        env.set_time_limit(Some(Duration::ZERO)).unwrap();
        assert!(matches!(
            env.check_time_limit(),
            Err(RuntimeError::TimeLimitExceeded(_))
        ));

        env.set_time_limit(None).unwrap();
        assert_eq!(env.time_remaining(), None);
    }

    #[test]
    fn test_timezone_validation() {
        let env = NativeEnvironment::isolated();
        env.set_timezone("Europe/Berlin").unwrap();
        assert_eq!(env.timezone(), Some("Europe/Berlin".to_string()));
        assert!(matches!(
            env.set_timezone(""),
            Err(RuntimeError::InvalidArgument(_))
        ));
        assert!(env.set_timezone("Not A Zone").is_err());
        assert_eq!(env.timezone(), Some("Europe/Berlin".to_string()));
    }

    #[test]
    fn test_autoloader_registration_is_per_instance() {
        let env = NativeEnvironment::isolated();
        let loader = Autoload::new("My\\Lib", "/srv/lib");
        env.register_autoloader(&loader).unwrap();
        env.register_autoloader(&loader.clone()).unwrap();
        assert_eq!(env.autoloaders(None).len(), 1);

        let twin = Autoload::new("My\\Lib", "/srv/lib");
        env.register_autoloader(&twin).unwrap();
        assert_eq!(env.autoloaders(Some(&["My\\Lib"])).len(), 2);

        env.register_autoloader(&Autoload::new("Other", "/srv/other"))
            .unwrap();
        assert_eq!(env.autoloaders(Some(&["Other"])).len(), 1);
        assert_eq!(env.autoloaders(None).len(), 3);

        env.unregister_autoloader(&loader).unwrap();
        let remaining = env.autoloaders(Some(&["My\\Lib"]));
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].same_instance(&twin));
    }

    #[test]
    fn test_unregister_missing_autoloader_warns() {
        let env = NativeEnvironment::isolated();
        let loader = Autoload::new("My\\Lib", "/srv/lib");
        env.register_autoloader(&loader).unwrap();
        env.unregister_autoloader(&loader).unwrap();
        assert!(env.warnings().is_empty());

        env.unregister_autoloader(&loader).unwrap();
        let warnings = env.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code.as_deref(), Some("K-2-4"));
        assert!(warnings[0].to_text().contains("My\\Lib"));
    }

    #[test]
    fn test_locate_class() {
        let dir = TempDir::new().unwrap();
        let mut loader = Autoload::new("App", dir.path());
        loader.extension = ".mod".to_string();
        fs::create_dir_all(dir.path().join("Http")).unwrap();
        fs::write(dir.path().join("Http").join("Kernel.mod"), "").unwrap();

        let env = NativeEnvironment::isolated();
        env.register_autoloader(&loader).unwrap();
        assert_eq!(
            env.locate_class("App\\Http\\Kernel"),
            Some(dir.path().join("Http").join("Kernel.mod"))
        );
        assert_eq!(env.locate_class("App\\Http\\Missing"), None);
    }

    #[test]
    fn test_error_handler_stack() {
        let env = NativeEnvironment::isolated();
        assert!(env.error_handler().is_none());
        env.register_error_handler(&ErrorHandler::default()).unwrap();
        env.register_error_handler(&ErrorHandler::new("App\\Strict", Some(Severity::ALL)))
            .unwrap();
        assert_eq!(env.error_handler().unwrap().class, "App\\Strict");
        let restored = env.restore_error_handler().unwrap();
        assert_eq!(restored, ErrorHandler::default());
    }

    #[test]
    fn test_warnings_are_recorded() {
        let env = NativeEnvironment::isolated();
        env.warn(DiagnosticMessage::warning("Unknown tag"));
        assert_eq!(env.warnings().len(), 1);
        assert_eq!(env.warnings()[0].title, "Unknown tag");
    }

    #[test]
    fn test_take_warnings_drains() {
        let env = NativeEnvironment::isolated();
        env.warn(DiagnosticMessage::warning("first"));
        env.warn(DiagnosticMessage::warning("second"));
        let taken = env.take_warnings();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[1].title, "second");
        assert!(env.warnings().is_empty());
    }

    #[test]
    fn test_recorded_warnings_are_capped() {
        let env = NativeEnvironment::isolated();
        for i in 0..MAX_RECORDED_WARNINGS + 3 {
            env.warn(DiagnosticMessage::warning(format!("w{}", i)));
        }
        let warnings = env.warnings();
        assert_eq!(warnings.len(), MAX_RECORDED_WARNINGS);
        assert_eq!(warnings[0].title, "w3");
    }

    #[test]
    fn test_isolated_environments_do_not_share() {
        let a = NativeEnvironment::isolated();
        let b = NativeEnvironment::isolated();
        a.set_directive("display_errors", "1").unwrap();
        assert_eq!(b.directive("display_errors"), None);

        let a2 = a.clone();
        assert_eq!(a2.directive("display_errors"), Some("1".to_string()));
    }
}
