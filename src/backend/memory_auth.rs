//! Process-local auth provider.
//!
//! Development and test stand-in for the hosted auth service. Accounts and
//! sessions live in memory; passwords are kept as given, so never point real
//! users at it.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{AuthProvider, NewAccount, ProviderError, Session, SignIn, SignUp, User, UserUpdate};

const SESSION_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

/// In-memory accounts keyed by email, sessions keyed by token.
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    accounts: DashMap<String, Account>,
    sessions: DashMap<String, String>,
    reset_requests: DashMap<String, usize>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a verified account directly (seeding, tests).
    pub fn insert_user(&self, email: &str, password: &str, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: Some(name.to_string()),
            email_verified: true,
        };
        self.accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// How many reset mails were requested for `email`.
    pub fn reset_requests(&self, email: &str) -> usize {
        self.reset_requests.get(email).map(|n| *n).unwrap_or(0)
    }

    fn open_session(&self, email: &str) -> Session {
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), email.to_string());
        Session {
            access_token: token,
            expires_at: Some(Utc::now().timestamp() + SESSION_SECS),
        }
    }

    fn email_for(&self, access_token: &str) -> Result<String, ProviderError> {
        self.sessions
            .get(access_token)
            .map(|email| email.clone())
            .ok_or(ProviderError::InvalidToken)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, ProviderError> {
        let user = match self.accounts.get(email) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(ProviderError::InvalidCredentials),
        };
        Ok(SignIn {
            session: self.open_session(email),
            user,
        })
    }

    async fn sign_up(&self, account: NewAccount) -> Result<SignUp, ProviderError> {
        if self.accounts.contains_key(&account.email) {
            return Err(ProviderError::AlreadyRegistered);
        }
        let user = self.insert_user(&account.email, &account.password, &account.name);
        Ok(SignUp {
            session: Some(self.open_session(&account.email)),
            user,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<User, ProviderError> {
        let email = self.email_for(access_token)?;
        self.accounts
            .get(&email)
            .map(|account| account.user.clone())
            .ok_or(ProviderError::InvalidToken)
    }

    async fn update_user(&self, access_token: &str, update: UserUpdate) -> Result<User, ProviderError> {
        let email = self.email_for(access_token)?;

        if let Some(new_email) = &update.email {
            if new_email != &email && self.accounts.contains_key(new_email) {
                return Err(ProviderError::AlreadyRegistered);
            }
        }

        let (_, mut account) = self.accounts.remove(&email).ok_or(ProviderError::InvalidToken)?;
        if let Some(password) = update.password {
            account.password = password;
        }
        if let Some(name) = update.name {
            account.user.name = Some(name);
        }
        if let Some(new_email) = update.email {
            account.user.email = new_email;
            for mut session in self.sessions.iter_mut() {
                if *session == email {
                    *session = account.user.email.clone();
                }
            }
        }

        let user = account.user.clone();
        self.accounts.insert(user.email.clone(), account);
        Ok(user)
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError> {
        let email = self
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.key().clone())
            .ok_or(ProviderError::NotFound)?;
        self.accounts.remove(&email);
        self.sessions.retain(|_, session_email| *session_email != email);
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &str,
        _redirect_to: Option<&str>,
    ) -> Result<(), ProviderError> {
        *self.reset_requests.entry(email.to_string()).or_insert(0) += 1;
        if self.accounts.contains_key(email) {
            Ok(())
        } else {
            Err(ProviderError::NotFound)
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        self.sessions
            .remove(access_token)
            .map(|_| ())
            .ok_or(ProviderError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_resolve_token() {
        let auth = MemoryAuthProvider::new();
        let user = auth.insert_user("a@example.com", "Passw0rd", "Ada");

        assert!(matches!(
            auth.sign_in("a@example.com", "wrong").await,
            Err(ProviderError::InvalidCredentials)
        ));
        let sign_in = auth.sign_in("a@example.com", "Passw0rd").await.unwrap();
        let resolved = auth.get_user(&sign_in.session.access_token).await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up() {
        let auth = MemoryAuthProvider::new();
        let account = NewAccount {
            email: "a@example.com".into(),
            password: "Passw0rd".into(),
            name: "Ada".into(),
            redirect_to: None,
        };
        assert!(auth.sign_up(account.clone()).await.is_ok());
        assert!(matches!(
            auth.sign_up(account).await,
            Err(ProviderError::AlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn test_email_change_keeps_session() {
        let auth = MemoryAuthProvider::new();
        auth.insert_user("a@example.com", "Passw0rd", "Ada");
        let token = auth.sign_in("a@example.com", "Passw0rd").await.unwrap().session.access_token;

        let update = UserUpdate {
            email: Some("b@example.com".into()),
            ..Default::default()
        };
        auth.update_user(&token, update).await.unwrap();

        assert_eq!(auth.get_user(&token).await.unwrap().email, "b@example.com");
        assert!(auth.sign_in("b@example.com", "Passw0rd").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_ends_sessions() {
        let auth = MemoryAuthProvider::new();
        let user = auth.insert_user("a@example.com", "Passw0rd", "Ada");
        let token = auth.sign_in("a@example.com", "Passw0rd").await.unwrap().session.access_token;

        auth.delete_user(&user.id).await.unwrap();
        assert!(matches!(auth.get_user(&token).await, Err(ProviderError::InvalidToken)));
    }
}
