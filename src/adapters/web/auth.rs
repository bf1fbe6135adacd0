//! Authentication backend for axum-login.
//!
//! Single-owner model: credentials come from the `[auth]` config section.
//! The identity provider is external to the journal itself; the store only
//! receives an upserted copy of the identity at login.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum_login::{AuthUser, AuthnBackend, UserId};

use crate::domain::error::JournalError;
use crate::domain::user::User;
use crate::ports::config_port::ConfigPort;

pub type AuthSession = axum_login::AuthSession<AuthBackend>;

/// Authenticated journal owner. Since this is single-user, the username is
/// the ID.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionUser {
    pub username: String,
    /// The password hash string as bytes, used by axum-login to validate
    /// sessions.
    pw_hash_bytes: Vec<u8>,
    email: Option<String>,
    display_name: Option<String>,
}

impl SessionUser {
    /// The identity record kept in the store, refreshed on every login.
    pub fn to_record(&self) -> User {
        User {
            id: self.username.clone(),
            email: self.email.clone(),
            name: self.display_name.clone(),
        }
    }
}

impl AuthUser for SessionUser {
    type Id = String;

    fn id(&self) -> String {
        self.username.clone()
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.pw_hash_bytes
    }
}

/// Login credentials submitted as a JSON body.
#[derive(Clone, serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Authentication backend that verifies against a single configured user.
#[derive(Clone)]
pub struct AuthBackend {
    username: String,
    password_hash: String,
    email: Option<String>,
    display_name: Option<String>,
}

impl AuthBackend {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            username,
            password_hash,
            email: None,
            display_name: None,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let username =
            config
                .get_string("auth", "username")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "auth".into(),
                    key: "username".into(),
                })?;
        let password_hash =
            config
                .get_string("auth", "password_hash")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "auth".into(),
                    key: "password_hash".into(),
                })?;

        Ok(Self {
            username,
            password_hash,
            email: config.get_string("auth", "email"),
            display_name: config.get_string("auth", "display_name"),
        })
    }

    fn make_user(&self) -> SessionUser {
        SessionUser {
            username: self.username.clone(),
            pw_hash_bytes: self.password_hash.as_bytes().to_vec(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

impl AuthnBackend for AuthBackend {
    type User = SessionUser;
    type Credentials = Credentials;
    type Error = std::convert::Infallible;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        if creds.username != self.username {
            return Ok(None);
        }

        let parsed_hash = match PasswordHash::new(&self.password_hash) {
            Ok(h) => h,
            Err(_) => return Ok(None),
        };

        let argon2 = Argon2::default();
        if argon2
            .verify_password(creds.password.as_bytes(), &parsed_hash)
            .is_ok()
        {
            Ok(Some(self.make_user()))
        } else {
            Ok(None)
        }
    }

    async fn get_user(
        &self,
        user_id: &UserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        if user_id == &self.username {
            Ok(Some(self.make_user()))
        } else {
            Ok(None)
        }
    }
}
