use std::io;
use std::path::PathBuf;

use crate::db::models::User;
use crate::error::AppError;

/// Key the signed-in user is stored under.
pub const SESSION_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Absent,
    Loading,
    Present(User),
}

/// Client-local key/value store, one JSON file per key.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn read(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn write(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)
    }

    pub fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Who is signed in on this client. Passed explicitly to whatever needs an
/// authenticated user.
#[derive(Debug)]
pub struct SessionContext {
    store: LocalStore,
    state: Session,
}

impl SessionContext {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            state: Session::Absent,
        }
    }

    /// Reads the persisted record. Anything missing or unreadable means
    /// nobody is signed in.
    pub fn restore(&mut self) -> &Session {
        self.state = Session::Loading;

        let raw = match self.store.read(SESSION_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "could not read session record");
                None
            }
        };

        self.state = match raw.map(|raw| serde_json::from_str::<User>(&raw)) {
            Some(Ok(user)) => Session::Present(user),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "discarding unreadable session record");
                Session::Absent
            }
            None => Session::Absent,
        };
        &self.state
    }

    pub fn establish(&mut self, user: User) -> Result<(), AppError> {
        let raw = serde_json::to_string(&user).map_err(|e| AppError::Internal(e.to_string()))?;
        self.store
            .write(SESSION_KEY, &raw)
            .map_err(|e| AppError::Internal(format!("could not save session: {e}")))?;
        self.state = Session::Present(user);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        self.state = Session::Absent;
        self.store
            .remove(SESSION_KEY)
            .map_err(|e| AppError::Internal(format!("could not clear session: {e}")))
    }

    pub fn state(&self) -> &Session {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            Session::Present(user) => Some(user),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alice() -> User {
        User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_restore_without_record_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = SessionContext::new(LocalStore::new(dir.path()));
        assert_eq!(ctx.restore(), &Session::Absent);
    }

    #[test]
    fn test_establish_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let user = alice();
        let mut ctx = SessionContext::new(LocalStore::new(dir.path()));
        ctx.establish(user.clone()).unwrap();

        let mut fresh = SessionContext::new(LocalStore::new(dir.path()));
        assert_eq!(fresh.restore(), &Session::Present(user));
        assert_eq!(fresh.user().map(|u| u.username.as_str()), Some("alice"));
    }

    #[test]
    fn test_garbage_record_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.write(SESSION_KEY, "{not json").unwrap();

        let mut ctx = SessionContext::new(store);
        assert_eq!(ctx.restore(), &Session::Absent);
    }

    #[test]
    fn test_clear_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let mut ctx = SessionContext::new(store.clone());
        ctx.establish(alice()).unwrap();

        ctx.clear().unwrap();
        assert_eq!(ctx.state(), &Session::Absent);
        assert_eq!(store.read(SESSION_KEY).unwrap(), None);
        // Clearing twice is fine.
        ctx.clear().unwrap();
    }
}
