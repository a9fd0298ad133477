use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use super::SessionError;

/// Fixed keys the session is persisted under
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const TOKEN_TYPE: &str = "token_type";
    pub const USER_ID: &str = "user_id";
    pub const USER_EMAIL: &str = "user_email";
    pub const USER_NAME: &str = "user_name";
    pub const USER_ROLE: &str = "user_role";
    pub const LOGGED_IN_AT: &str = "logged_in_at";

    pub const ALL: [&str; 7] = [TOKEN, TOKEN_TYPE, USER_ID, USER_EMAIL, USER_NAME, USER_ROLE, LOGGED_IN_AT];
}

/// Key/value persistence for the credential and identity fields.
///
/// `replace` and `clear` act on the whole set at once so a reader never sees a
/// token from one login next to the identity of another.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<BTreeMap<String, String>, SessionError>;
    fn replace(&self, entries: BTreeMap<String, String>) -> Result<(), SessionError>;
    /// Remove everything; `true` only for the caller that actually removed a token
    fn clear(&self) -> Result<bool, SessionError>;
}

/// JSON file under the console config directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub const FILE_NAME: &'static str = "session.json";

    pub fn in_dir(dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self { path: dir.join(Self::FILE_NAME) })
    }

    /// `$CONSOLE_CONFIG_DIR` when set, otherwise `$HOME/.config/crm-console`
    pub fn default_dir(configured: Option<&Path>) -> Result<PathBuf, SessionError> {
        if let Some(dir) = configured {
            return Ok(dir.to_path_buf());
        }
        let home = std::env::var("HOME").map_err(|_| SessionError::NoHome)?;
        Ok(PathBuf::from(home).join(".config").join("crm-console"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<BTreeMap<String, String>, SessionError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn replace(&self, entries: BTreeMap<String, String>) -> Result<(), SessionError> {
        let content = serde_json::to_string_pretty(&entries)?;
        // write-then-rename keeps the swap atomic
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<bool, SessionError> {
        // rename is atomic, so concurrent clears see exactly one winner
        let taken = self.path.with_extension(format!("json.{}", Uuid::new_v4().simple()));
        match fs::rename(&self.path, &taken) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        let had_token = fs::read_to_string(&taken)
            .ok()
            .and_then(|content| serde_json::from_str::<BTreeMap<String, String>>(&content).ok())
            .map_or(true, |entries| entries.contains_key(keys::TOKEN));
        fs::remove_file(&taken)?;
        Ok(had_token)
    }
}

/// Process-local storage, used by tests and short-lived embeddings
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<BTreeMap<String, String>, SessionError> {
        Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn replace(&self, entries: BTreeMap<String, String>) -> Result<(), SessionError> {
        *self.entries.lock().unwrap_or_else(PoisonError::into_inner) = entries;
        Ok(())
    }

    fn clear(&self) -> Result<bool, SessionError> {
        let removed = std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner));
        Ok(removed.contains_key(keys::TOKEN))
    }
}
