//! Hostname to tenant route resolution.
//!
//! # Responsibilities
//! - Extract the subdomain label from a request host
//! - Decide whether a path is rewritten to `/idea/<label>/…` or passed through
//!
//! # Design Decisions
//! - Host comparison is case-insensitive
//! - The host is split on `.` only, so a port stays glued to its label
//!   (`landlord.localhost:3000` → `["landlord", "localhost:3000"]`)
//! - Routing never fails; the worst case is a pass-through

use crate::config::DomainConfig;

/// Path prefix every tenant page lives under.
pub const IDEA_PREFIX: &str = "/idea";

const WWW: &str = "www";

/// Which root the request host hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootDomain {
    Localhost,
    Apex,
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    PassThrough,
    Rewrite(String),
}

/// Host facts for one request, attached to the request as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRoute {
    pub hostname: String,
    pub root: RootDomain,
    pub subdomain: Option<String>,
}

/// Compiled host routing rules.
#[derive(Debug, Clone)]
pub struct HostRouter {
    apex_domain: String,
    localhost_root: String,
    bypass_prefixes: Vec<String>,
}

impl HostRouter {
    pub fn new(config: &DomainConfig) -> Self {
        Self {
            apex_domain: config.apex_domain.to_lowercase(),
            localhost_root: config.localhost_root.to_lowercase(),
            bypass_prefixes: config.bypass_prefixes.clone(),
        }
    }

    /// Root domain string for `root` (used in logs and links).
    pub fn root_name(&self, root: RootDomain) -> &str {
        match root {
            RootDomain::Localhost => &self.localhost_root,
            RootDomain::Apex => &self.apex_domain,
        }
    }

    /// Classify `hostname` and extract its subdomain label, if any.
    pub fn resolve(&self, hostname: &str) -> HostRoute {
        let hostname = hostname.to_lowercase();
        let labels: Vec<&str> = hostname.split('.').collect();

        let root = if hostname.contains("localhost") {
            RootDomain::Localhost
        } else {
            RootDomain::Apex
        };

        let min_labels = match root {
            RootDomain::Localhost => 2,
            RootDomain::Apex => 3,
        };
        let subdomain = labels
            .first()
            .filter(|label| labels.len() >= min_labels && !label.is_empty())
            .map(|label| label.to_string());

        HostRoute {
            hostname,
            root,
            subdomain,
        }
    }

    /// Whether `path` is an asset, API call or file and must not be rewritten.
    pub fn is_bypassed(&self, path: &str) -> bool {
        path.contains('.') || self.bypass_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Route one request.
    pub fn route(&self, hostname: &str, path: &str) -> RouteDecision {
        if self.is_bypassed(path) {
            return RouteDecision::PassThrough;
        }

        match self.resolve(hostname).subdomain {
            Some(label) if label != WWW => RouteDecision::Rewrite(tenant_path(&label, path)),
            _ => RouteDecision::PassThrough,
        }
    }
}

/// `/idea/<label>` followed by `path`, dropping a lone `/`.
pub fn tenant_path(label: &str, path: &str) -> String {
    if path == "/" || path.is_empty() {
        format!("{}/{}", IDEA_PREFIX, label)
    } else {
        format!("{}/{}{}", IDEA_PREFIX, label, path)
    }
}
