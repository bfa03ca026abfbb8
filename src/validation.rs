//! Input validation for account, idea and signup payloads.
//!
//! Each check returns the user-facing message for the first rule that fails.

use crate::backend::IdeaStatus;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 72;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;

pub const MIN_SLUG_LEN: usize = 3;
pub const MAX_SLUG_LEN: usize = 60;
pub const MAX_TITLE_LEN: usize = 60;
pub const MAX_TAGLINE_LEN: usize = 120;
pub const MAX_AUDIENCE_LEN: usize = 100;
pub const MAX_PRICE_HINT_LEN: usize = 50;

/// Slugs that collide with first-party routes or subdomains.
pub const RESERVED_SLUGS: &[&str] = &[
    "www", "api", "app", "admin", "dashboard", "login", "signup", "register", "auth", "logout",
    "profile", "settings", "idea", "ideas", "help", "support", "contact", "about", "terms",
    "privacy", "blog", "docs", "pricing", "features", "home", "index", "static", "public", "cdn",
    "assets", "images", "img",
];

// Substring match, so keep entries long enough not to hit ordinary words.
const BLOCKED_WORDS: &[&str] = &[
    "fuck", "shit", "damn", "bitch", "bastard", "crap", "dick", "cock", "pussy", "cunt", "whore",
    "slut", "fag", "nigger",
];

/// Lowercase and trim an email so limiter and lockout keys are stable.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld`: no whitespace, exactly one `@`, a dot inside the domain.
pub fn validate_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Every password rule that `password` breaks, in display order.
pub fn password_errors(password: &str) -> Vec<&'static str> {
    let mut errors = Vec::new();
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        errors.push("Password must be at least 8 characters long");
    }
    if len > MAX_PASSWORD_LEN {
        errors.push("Password must be at most 72 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number");
    }
    errors
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    match password_errors(password).into_iter().next() {
        Some(first) => Err(first),
        None => Ok(()),
    }
}

pub fn validate_name(name: &str) -> bool {
    let len = name.trim().chars().count();
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len)
}

pub fn validate_slug(slug: &str) -> Result<(), &'static str> {
    let len = slug.chars().count();
    if len < MIN_SLUG_LEN {
        return Err("Slug must be at least 3 characters");
    }
    if len > MAX_SLUG_LEN {
        return Err("Slug must be 60 characters or less");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Slug can only contain lowercase letters, numbers, and hyphens");
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err("Slug cannot start or end with a hyphen");
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Err("This slug is reserved");
    }
    if BLOCKED_WORDS.iter().any(|word| slug.contains(word)) {
        return Err("Slug contains inappropriate content");
    }
    Ok(())
}

/// Landing page fields as submitted by the owner.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct IdeaInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub audience: Option<String>,
    pub price_hint: Option<String>,
    pub status: Option<String>,
}

/// An `IdeaInput` that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidIdea {
    pub slug: String,
    pub title: String,
    pub tagline: String,
    pub problem: String,
    pub solution: String,
    pub audience: String,
    pub price_hint: Option<String>,
    pub status: Option<IdeaStatus>,
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

impl IdeaInput {
    /// Check required fields, status, field lengths and slug, in that order.
    pub fn validate(&self) -> Result<ValidIdea, String> {
        let (Some(slug), Some(title), Some(tagline), Some(problem), Some(solution), Some(audience)) = (
            required(&self.slug),
            required(&self.title),
            required(&self.tagline),
            required(&self.problem),
            required(&self.solution),
            required(&self.audience),
        ) else {
            return Err("Missing required fields".to_string());
        };

        let status = match self.status.as_deref() {
            None => None,
            Some(raw) => Some(raw.parse::<IdeaStatus>().map_err(|_| "Invalid status".to_string())?),
        };

        if too_long(&title, MAX_TITLE_LEN) {
            return Err("Title too long (max 60 characters)".to_string());
        }
        if too_long(&tagline, MAX_TAGLINE_LEN) {
            return Err("Tagline too long (max 120 characters)".to_string());
        }
        if too_long(&audience, MAX_AUDIENCE_LEN) {
            return Err("Audience too long (max 100 characters)".to_string());
        }
        let price_hint = required(&self.price_hint);
        if let Some(hint) = &price_hint {
            if too_long(hint, MAX_PRICE_HINT_LEN) {
                return Err("Price hint too long (max 50 characters)".to_string());
            }
        }

        validate_slug(&slug).map_err(str::to_string)?;

        Ok(ValidIdea {
            slug,
            title,
            tagline,
            problem,
            solution,
            audience,
            price_hint,
            status,
        })
    }
}
