use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use serde::Deserialize;

use crate::db::models::{User, UserRecord};
use crate::error::{AppError, StoreError};
use crate::session::SessionContext;
use crate::store::TaskStore;
use crate::viewmodel::TaskList;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Same text for unknown usernames and wrong passwords.
pub const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Verified against on unknown usernames so both login failures cost one
/// argon2 run. Parameters match `Argon2::default()`; no password maps to it.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$sCHhaRTkK2wh+g6gM45k0A$p5d35ISLd5wJ7eSFIeDmDKZdIiFBS9n15px04pJHgRM";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    /// Checked against `password` when present.
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl RegisterForm {
    /// Returns the trimmed username. Runs before anything touches the store.
    pub fn validate(&self) -> Result<&str, AppError> {
        let username = self.username.trim();
        let confirm_blank = self
            .confirm_password
            .as_deref()
            .is_some_and(|c| c.trim().is_empty());

        if username.is_empty() || self.password.trim().is_empty() || confirm_blank {
            return Err(AppError::Validation("all fields are required".to_string()));
        }
        if let Some(confirm) = &self.confirm_password
            && *confirm != self.password
        {
            return Err(AppError::Validation("passwords do not match".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(username)
    }
}

/// Registration and login against the task store.
#[derive(Clone)]
pub struct AuthGate<S> {
    store: S,
}

impl<S: TaskStore> AuthGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the user together with one open task row per template.
    pub async fn register(&self, form: &RegisterForm) -> Result<User, AppError> {
        let username = form.validate()?;

        if self.store.find_user(username).await?.is_some() {
            return Err(AppError::Conflict(format!("username {username} is taken")));
        }

        let hash = hash_password(form.password.clone()).await?;
        let record = UserRecord::new(username, hash);

        let template_ids: Vec<String> = self
            .store
            .task_templates()
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        // The unique constraint still catches a racing registration.
        self.store
            .create_user_with_tasks(&record, &template_ids)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("username {username} is taken"))
                }
                other => other,
            })?;

        tracing::info!(
            user_id = %record.id,
            username,
            tasks = template_ids.len(),
            "user registered"
        );
        Ok(record.into())
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User, AppError> {
        let username = credentials.username.trim();
        let Some(record) = self.store.find_user(username).await? else {
            verify_password(credentials.password.clone(), DUMMY_HASH.to_string()).await?;
            tracing::debug!(username, "login for unknown user");
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(credentials.password.clone(), record.password_hash.clone()).await? {
            tracing::debug!(username, "login with wrong password");
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!(user_id = %record.id, "user logged in");
        Ok(record.into())
    }

    /// Forgets the signed-in user and their cached checklist.
    pub fn logout(
        &self,
        session: &mut SessionContext,
        tasks: &mut TaskList<S>,
    ) -> Result<(), AppError> {
        tasks.clear();
        session.clear()
    }
}

// Hashing runs on the blocking pool.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}

async fn verify_password(password: String, stored: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || -> Result<bool, AppError> {
        let parsed = PasswordHash::new(&stored)
            .map_err(|e| StoreError::Corrupt(format!("stored password hash: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{schema, test_pool};
    use crate::session::{LocalStore, Session};
    use crate::store::SqliteStore;

    async fn gate() -> AuthGate<SqliteStore> {
        let pool = test_pool().await;
        schema::provision(&pool).await.unwrap();
        AuthGate::new(SqliteStore::new(pool))
    }

    fn form(username: &str, password: &str, confirm: Option<&str>) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm.map(str::to_string),
        }
    }

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    async fn count(gate: &AuthGate<SqliteStore>, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(gate.store.pool())
            .await
            .unwrap()
    }

    #[test]
    fn test_validation_rules() {
        assert!(form("alice", "secret", Some("secret")).validate().is_ok());
        assert!(form("alice", "secret", None).validate().is_ok());
        assert_eq!(form("  alice ", "secret", None).validate().unwrap(), "alice");

        for bad in [
            form("", "secret", None),
            form("   ", "secret", None),
            form("alice", "", None),
            form("alice", "secret", Some(" ")),
            form("alice", "secret", Some("secreT")),
            form("alice", "12345", Some("12345")),
        ] {
            assert!(matches!(bad.validate(), Err(AppError::Validation(_))), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn test_short_password_writes_nothing() {
        let gate = gate().await;
        let err = gate.register(&form("alice", "12345", Some("12345"))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(count(&gate, "users").await, 0);
        assert_eq!(count(&gate, "user_tasks").await, 0);
    }

    #[tokio::test]
    async fn test_register_fans_out_templates() {
        let gate = gate().await;
        let user = gate.register(&form("alice", "secret1", Some("secret1"))).await.unwrap();
        assert_eq!(user.username, "alice");

        let templates = count(&gate, "tasks").await;
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_tasks WHERE user_id = ?")
            .bind(&user.id)
            .fetch_one(gate.store.pool())
            .await
            .unwrap();
        assert_eq!(rows, templates);
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_plaintext() {
        let gate = gate().await;
        gate.register(&form("alice", "secret1", None)).await.unwrap();
        let record = gate.store.find_user("alice").await.unwrap().unwrap();
        assert_ne!(record.password_hash, "secret1");
        assert!(record.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let gate = gate().await;
        gate.register(&form("alice", "secret1", None)).await.unwrap();
        let users = count(&gate, "users").await;
        let rows = count(&gate, "user_tasks").await;

        let err = gate.register(&form("alice", "another", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(count(&gate, "users").await, users);
        assert_eq!(count(&gate, "user_tasks").await, rows);
    }

    #[tokio::test]
    async fn test_login_errors_do_not_enumerate() {
        let gate = gate().await;
        let user = gate.register(&form("alice", "secret1", None)).await.unwrap();

        let ok = gate.login(&creds("alice", "secret1")).await.unwrap();
        assert_eq!(ok.id, user.id);

        let wrong = gate.login(&creds("alice", "secret2")).await.unwrap_err();
        let unknown = gate.login(&creds("mallory", "secret1")).await.unwrap_err();
        assert!(matches!(wrong, AppError::Auth(_)));
        assert!(matches!(unknown, AppError::Auth(_)));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_unknown_user_runs_a_full_verify() {
        let parsed = PasswordHash::new(DUMMY_HASH).unwrap();
        assert_eq!(parsed.algorithm, argon2::Algorithm::Argon2id.ident());
        let params = argon2::Params::try_from(&parsed).unwrap();
        let default = argon2::Params::default();
        assert_eq!(
            (params.m_cost(), params.t_cost(), params.p_cost()),
            (default.m_cost(), default.t_cost(), default.p_cost())
        );
        assert!(!verify_password("secret1".to_string(), DUMMY_HASH.to_string()).await.unwrap());

        let gate = gate().await;
        let err = gate.login(&creds("mallory", "secret1")).await.unwrap_err();
        assert_eq!(err.to_string(), AppError::Auth(INVALID_CREDENTIALS.to_string()).to_string());
    }

    #[tokio::test]
    async fn test_unreadable_stored_hash_is_internal() {
        let gate = gate().await;
        let record = UserRecord::new("alice", "not-a-hash".to_string());
        gate.store.create_user_with_tasks(&record, &[]).await.unwrap();

        let err = gate.login(&creds("alice", "secret1")).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let gate = gate().await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::new(LocalStore::new(dir.path()));
        let mut tasks = TaskList::new(gate.store.clone());
        assert_eq!(session.restore(), &Session::Absent);

        let user = gate.register(&form("alice", "secret1", None)).await.unwrap();
        session.establish(user.clone()).unwrap();
        tasks.load(&user.id).await.unwrap();
        assert!(!tasks.items().is_empty());

        let mut reopened = SessionContext::new(LocalStore::new(dir.path()));
        assert_eq!(reopened.restore(), &Session::Present(user));

        gate.logout(&mut session, &mut tasks).unwrap();
        assert_eq!(session.state(), &Session::Absent);
        assert!(tasks.items().is_empty());
        assert_eq!(reopened.restore(), &Session::Absent);
    }
}
