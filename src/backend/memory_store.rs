//! Process-local data store.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DataStore, Idea, IdeaFields, NewSignup, Signup, StoreError};

#[derive(Debug, Default)]
struct Tables {
    ideas: Vec<Idea>,
    signups: Vec<Signup>,
}

/// Ideas and signups held in memory. Uniqueness mirrors the hosted schema:
/// slug among non-deleted ideas, and (email, source) among signups.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(rows: &mut [T], created: impl Fn(&T) -> chrono::DateTime<Utc>) {
    rows.sort_by_key(|row| std::cmp::Reverse(created(row)));
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_ideas(&self, owner: &str) -> Result<Vec<Idea>, StoreError> {
        let tables = self.tables.read().await;
        let mut ideas: Vec<Idea> = tables
            .ideas
            .iter()
            .filter(|i| i.user_id == owner && i.deleted_at.is_none())
            .cloned()
            .collect();
        newest_first(&mut ideas, |i| i.created_at);
        Ok(ideas)
    }

    async fn get_idea(&self, owner: &str, id: Uuid) -> Result<Option<Idea>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .ideas
            .iter()
            .find(|i| i.id == id && i.user_id == owner && i.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Idea>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .ideas
            .iter()
            .find(|i| i.slug == slug && i.deleted_at.is_none())
            .cloned())
    }

    async fn count_active_ideas(&self, owner: &str) -> Result<usize, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .ideas
            .iter()
            .filter(|i| i.user_id == owner && i.deleted_at.is_none() && i.status.is_active())
            .count())
    }

    async fn insert_idea(&self, owner: &str, fields: IdeaFields) -> Result<Idea, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .ideas
            .iter()
            .any(|i| i.slug == fields.slug && i.deleted_at.is_none())
        {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let idea = Idea {
            id: Uuid::new_v4(),
            user_id: owner.to_string(),
            slug: fields.slug,
            title: fields.title,
            tagline: fields.tagline,
            problem: fields.problem,
            solution: fields.solution,
            audience: fields.audience,
            price_hint: fields.price_hint,
            status: fields.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.ideas.push(idea.clone());
        Ok(idea)
    }

    async fn update_idea(
        &self,
        owner: &str,
        id: Uuid,
        fields: IdeaFields,
    ) -> Result<Option<Idea>, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .ideas
            .iter()
            .any(|i| i.id != id && i.slug == fields.slug && i.deleted_at.is_none())
        {
            return Err(StoreError::Conflict);
        }

        let Some(idea) = tables
            .ideas
            .iter_mut()
            .find(|i| i.id == id && i.user_id == owner && i.deleted_at.is_none())
        else {
            return Ok(None);
        };

        idea.slug = fields.slug;
        idea.title = fields.title;
        idea.tagline = fields.tagline;
        idea.problem = fields.problem;
        idea.solution = fields.solution;
        idea.audience = fields.audience;
        idea.price_hint = fields.price_hint;
        idea.status = fields.status;
        idea.updated_at = Utc::now();
        Ok(Some(idea.clone()))
    }

    async fn soft_delete_idea(&self, owner: &str, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(idea) = tables
            .ideas
            .iter_mut()
            .find(|i| i.id == id && i.user_id == owner && i.deleted_at.is_none())
        {
            idea.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn add_signup(&self, signup: NewSignup) -> Result<Signup, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .signups
            .iter()
            .any(|s| s.email == signup.email && s.source == signup.source)
        {
            return Err(StoreError::Conflict);
        }

        let row = Signup {
            id: Uuid::new_v4(),
            email: signup.email,
            source: signup.source,
            created_at: Utc::now(),
            metadata: signup.metadata,
        };
        tables.signups.push(row.clone());
        Ok(row)
    }

    async fn list_signups(&self) -> Result<Vec<Signup>, StoreError> {
        let tables = self.tables.read().await;
        let mut signups = tables.signups.clone();
        newest_first(&mut signups, |s| s.created_at);
        Ok(signups)
    }
}
