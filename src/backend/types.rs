//! Records exchanged with the auth provider and the data store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated account as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

/// Access token plus expiry, returned on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    /// Unix timestamp (seconds).
    pub expires_at: Option<i64>,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub user: User,
    pub session: Session,
}

/// Result of a successful sign-up. No session means the provider wants the
/// email confirmed first.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: User,
    pub session: Option<Session>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Where the confirmation link should land.
    pub redirect_to: Option<String>,
}

/// Changes to the signed-in user. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Lifecycle state of an idea's landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    #[default]
    Draft,
    Live,
    Paused,
    Archived,
}

impl IdeaStatus {
    /// Live and paused ideas count against the free-tier limit.
    pub fn is_active(&self) -> bool {
        matches!(self, IdeaStatus::Live | IdeaStatus::Paused)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Draft => "draft",
            IdeaStatus::Live => "live",
            IdeaStatus::Paused => "paused",
            IdeaStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown idea status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for IdeaStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(IdeaStatus::Draft),
            "live" => Ok(IdeaStatus::Live),
            "paused" => Ok(IdeaStatus::Paused),
            "archived" => Ok(IdeaStatus::Archived),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One idea and its landing page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub user_id: String,
    pub slug: String,
    pub title: String,
    pub tagline: String,
    pub problem: String,
    pub solution: String,
    pub audience: String,
    pub price_hint: Option<String>,
    pub status: IdeaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Landing page content written on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaFields {
    pub slug: String,
    pub title: String,
    pub tagline: String,
    pub problem: String,
    pub solution: String,
    pub audience: String,
    pub price_hint: Option<String>,
    pub status: IdeaStatus,
}

/// Request context captured with a waitlist signup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupMetadata {
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// One waitlist email for one idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    pub id: Uuid,
    pub email: String,
    /// Slug of the idea whose page collected the email.
    pub source: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: SignupMetadata,
}

#[derive(Debug, Clone)]
pub struct NewSignup {
    pub email: String,
    pub source: String,
    pub metadata: SignupMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_activity() {
        assert_eq!("live".parse::<IdeaStatus>(), Ok(IdeaStatus::Live));
        assert!("Live".parse::<IdeaStatus>().is_err());
        assert!(IdeaStatus::Paused.is_active());
        assert!(!IdeaStatus::Draft.is_active());
        assert!(!IdeaStatus::Archived.is_active());
        assert_eq!(serde_json::to_string(&IdeaStatus::Archived).unwrap(), "\"archived\"");
    }
}
