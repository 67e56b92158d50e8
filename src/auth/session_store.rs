//! Persistent bearer token storage
//!
//! The session token is the only client state that survives a restart.
//! [`SessionStore`] abstracts where it lives:
//!
//! - [`FileSessionStore`] -- a JSON file in the user's data directory
//! - [`KeyringSessionStore`] -- the OS native credential store (Keychain on
//!   macOS, Secret Service on Linux, Windows Credential Manager on Windows)
//! - [`MemorySessionStore`] -- process memory only
//!
//! All stores treat "nothing saved" as `Ok(None)` and make `clear`
//! idempotent.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::config::{SessionConfig, StorageBackend};
use crate::error::{QuerydeskError, Result};

// ---------------------------------------------------------------------------
// PersistedSession
// ---------------------------------------------------------------------------

/// What gets written to storage after a successful login.
///
/// The role is cached next to the token so it can be shown before the
/// token is decoded again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// The bearer token exactly as issued.
    pub access_token: String,

    /// Role decoded from the token at login time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Storage for the persisted session.
pub trait SessionStore: Send + std::fmt::Debug {
    /// Load the saved session, `Ok(None)` when there is none.
    fn load(&self) -> Result<Option<PersistedSession>>;

    /// Replace the saved session.
    fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Remove the saved session. No-op when nothing is saved.
    fn clear(&self) -> Result<()>;
}

/// Build the store selected by configuration.
///
/// `scope` distinguishes backends sharing one machine; the keyring entry
/// is keyed by it.
///
/// # Errors
///
/// Returns [`QuerydeskError::Storage`] when the file backend has no
/// explicit path and the platform data directory cannot be determined.
pub fn open_store(config: &SessionConfig, scope: &str) -> Result<Box<dyn SessionStore>> {
    let store: Box<dyn SessionStore> = match config.storage {
        StorageBackend::File => match &config.path {
            Some(path) => Box::new(FileSessionStore::new_with_path(path.clone())),
            None => Box::new(FileSessionStore::new()?),
        },
        StorageBackend::Keyring => Box::new(KeyringSessionStore::new(scope)),
        StorageBackend::Memory => Box::new(MemorySessionStore::default()),
    };
    tracing::debug!(backend = ?config.storage, "Opened session store");
    Ok(store)
}

// ---------------------------------------------------------------------------
// FileSessionStore
// ---------------------------------------------------------------------------

/// Session persisted as JSON in a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store under the platform data directory (`.../querydesk/session.json`).
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "querydesk", "querydesk").ok_or_else(|| {
            QuerydeskError::Storage("Could not determine data directory".into())
        })?;
        Ok(Self::new_with_path(proj_dirs.data_dir().join("session.json")))
    }

    /// Store at an explicit path. Parent directories are created on save.
    ///
    /// # Examples
    ///
    /// ```
    /// use querydesk::auth::session_store::{FileSessionStore, SessionStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = FileSessionStore::new_with_path(dir.path().join("session.json"));
    /// assert!(store.load().unwrap().is_none());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(QuerydeskError::Io(e).into()),
        };
        let session = serde_json::from_str(&contents).map_err(QuerydeskError::Serialization)?;
        Ok(Some(session))
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuerydeskError::Storage(format!("Failed to create session directory: {}", e))
            })?;
        }
        let json = serde_json::to_string_pretty(session).map_err(QuerydeskError::Serialization)?;
        let mut file = open_private(&self.path).map_err(QuerydeskError::Io)?;

        // A file left by an older run keeps its mode on open.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(QuerydeskError::Io)?;
        }

        file.write_all(json.as_bytes()).map_err(QuerydeskError::Io)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(QuerydeskError::Io(e).into()),
        }
    }
}

/// Open `path` for writing, truncated. New files are created owner-only.
fn open_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

// ---------------------------------------------------------------------------
// KeyringSessionStore
// ---------------------------------------------------------------------------

/// Session persisted in the OS keyring.
///
/// Each backend gets its own entry under a service name derived from the
/// backend URL, so switching `base_url` does not reuse another backend's
/// token.
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    scope: String,
}

impl KeyringSessionStore {
    /// Store keyed by `scope` (normally the backend base URL).
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
        }
    }

    /// Keyring service name, prefixed with `querydesk-session-` to avoid
    /// collisions with other applications.
    fn service_name(scope: &str) -> String {
        format!("querydesk-session-{}", scope)
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&Self::service_name(&self.scope), "session")
            .map_err(|e| QuerydeskError::Keyring(e).into())
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        match self.entry()?.get_password() {
            Ok(json_str) => {
                let session =
                    serde_json::from_str(&json_str).map_err(QuerydeskError::Serialization)?;
                Ok(Some(session))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(QuerydeskError::Keyring(e).into()),
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        let json_str = serde_json::to_string(session).map_err(QuerydeskError::Serialization)?;
        self.entry()?
            .set_password(&json_str)
            .map_err(QuerydeskError::Keyring)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(QuerydeskError::Keyring(e).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemorySessionStore
// ---------------------------------------------------------------------------

/// Session kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    /// Store pre-seeded with a session, as if saved by an earlier run.
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<PersistedSession>>> {
        self.session
            .lock()
            .map_err(|_| QuerydeskError::Storage("session lock poisoned".into()).into())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

/// Shared handles let a test keep observing the store an `Assistant` owns.
impl<S: SessionStore + Sync> SessionStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<PersistedSession>> {
        (**self).load()
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
