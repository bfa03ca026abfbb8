//! Signup statistics per idea.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::backend::Signup;
use crate::http::{ApiError, AppState, AuthUser};

/// Signals above this many signups are worth building.
pub const HOT_THRESHOLD: usize = 100;
/// Signals at or above this many signups are worth watching.
pub const WATCH_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Heat {
    Hot,
    Watch,
    Dead,
}

impl Heat {
    pub fn from_total(total: usize) -> Self {
        if total > HOT_THRESHOLD {
            Heat::Hot
        } else if total >= WATCH_THRESHOLD {
            Heat::Watch
        } else {
            Heat::Dead
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdeaStats {
    pub source: String,
    pub title: String,
    pub total: usize,
    pub last_24h: usize,
    pub last_7d: usize,
    pub status: Heat,
    pub first_signup: Option<DateTime<Utc>>,
    pub last_signup: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_signups: usize,
    pub ideas: usize,
    pub hot: usize,
    pub watch: usize,
    pub dead: usize,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub stats: Vec<IdeaStats>,
}

/// Group `signups` by source and compute per-idea counts as of `now`.
///
/// Every source in `titles` gets a row even with no signups; signups for
/// other sources are ignored. Rows are ordered by total, largest first.
pub fn calculate_stats(
    signups: &[Signup],
    titles: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> Vec<IdeaStats> {
    let day_ago = now - Duration::hours(24);
    let week_ago = now - Duration::days(7);

    let mut stats: Vec<IdeaStats> = titles
        .iter()
        .map(|(source, title)| {
            let rows: Vec<&Signup> = signups.iter().filter(|s| &s.source == source).collect();
            let total = rows.len();
            IdeaStats {
                source: source.clone(),
                title: title.clone(),
                total,
                last_24h: rows.iter().filter(|s| s.created_at > day_ago).count(),
                last_7d: rows.iter().filter(|s| s.created_at > week_ago).count(),
                status: Heat::from_total(total),
                first_signup: rows.iter().map(|s| s.created_at).min(),
                last_signup: rows.iter().map(|s| s.created_at).max(),
            }
        })
        .collect();

    stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.source.cmp(&b.source)));
    stats
}

pub fn summarize(stats: &[IdeaStats]) -> Summary {
    let count = |heat: Heat| stats.iter().filter(|s| s.status == heat).count();
    Summary {
        total_signups: stats.iter().map(|s| s.total).sum(),
        ideas: stats.len(),
        hot: count(Heat::Hot),
        watch: count(Heat::Watch),
        dead: count(Heat::Dead),
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Dashboard>, ApiError> {
    let ideas = state.store.list_ideas(&auth.user.id).await?;
    let titles: HashMap<String, String> = ideas
        .into_iter()
        .map(|idea| (idea.slug, idea.title))
        .collect();

    let signups = state.store.list_signups().await?;
    let stats = calculate_stats(&signups, &titles, Utc::now());
    Ok(Json(Dashboard {
        summary: summarize(&stats),
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SignupMetadata;
    use uuid::Uuid;

    fn signup(source: &str, created_at: DateTime<Utc>) -> Signup {
        Signup {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            source: source.to_string(),
            created_at,
            metadata: SignupMetadata::default(),
        }
    }

    fn titles(sources: &[&str]) -> HashMap<String, String> {
        sources
            .iter()
            .map(|s| (s.to_string(), s.to_uppercase()))
            .collect()
    }

    #[test]
    fn test_heat_thresholds() {
        assert_eq!(Heat::from_total(0), Heat::Dead);
        assert_eq!(Heat::from_total(9), Heat::Dead);
        assert_eq!(Heat::from_total(10), Heat::Watch);
        assert_eq!(Heat::from_total(100), Heat::Watch);
        assert_eq!(Heat::from_total(101), Heat::Hot);
    }

    #[test]
    fn test_recent_windows() {
        let now = Utc::now();
        let signups = vec![
            signup("alpha", now - Duration::hours(1)),
            signup("alpha", now - Duration::hours(30)),
            signup("alpha", now - Duration::days(8)),
        ];
        let stats = calculate_stats(&signups, &titles(&["alpha"]), now);

        assert_eq!(stats.len(), 1);
        let alpha = &stats[0];
        assert_eq!(alpha.title, "ALPHA");
        assert_eq!(alpha.total, 3);
        assert_eq!(alpha.last_24h, 1);
        assert_eq!(alpha.last_7d, 2);
        assert_eq!(alpha.first_signup, Some(now - Duration::days(8)));
        assert_eq!(alpha.last_signup, Some(now - Duration::hours(1)));
    }

    #[test]
    fn test_ordering_scope_and_summary() {
        let now = Utc::now();
        let mut signups: Vec<Signup> = (0..12).map(|_| signup("beta", now)).collect();
        signups.push(signup("alpha", now));
        signups.push(signup("someone-else", now));

        let stats = calculate_stats(&signups, &titles(&["alpha", "beta", "gamma"]), now);
        let order: Vec<&str> = stats.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(order, ["beta", "alpha", "gamma"]);
        assert_eq!(stats[2].total, 0);
        assert_eq!(stats[2].first_signup, None);

        let summary = summarize(&stats);
        assert_eq!(summary.total_signups, 13);
        assert_eq!(summary.ideas, 3);
        assert_eq!(summary.watch, 1);
        assert_eq!(summary.dead, 2);
        assert_eq!(summary.hot, 0);
    }
}
