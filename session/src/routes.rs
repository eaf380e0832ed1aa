//! Route classification and redirect decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! The edge guard and the in-app guard both call [`RouteTable::decide`], so a
//! path redirects the same way whether the decision is made from cookies
//! before the page loads or from storage after it hydrates.
//!
//! Classification is a static, segment-aware prefix match. Only the
//! enumerated admin sections are protected; any other path is public, so an
//! unknown route fails open while the listed sections fail closed.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";
pub const DEFAULT_LANDING_PATH: &str = "/admin/overview";
pub const DEFAULT_PROTECTED_PREFIXES: &[&str] = &[
    "/admin/overview",
    "/admin/programs",
    "/admin/enrollments",
    "/admin/blogs",
    "/admin/roles",
    "/admin/permissions",
    "/admin/users",
    "/admin/onboarding-forms",
    "/admin/invoices",
    "/admin/food-categories",
    "/admin/workout-categories",
    "/admin/testimonials",
];

/// Query parameter carrying the post-login destination.
pub const REDIRECT_PARAM: &str = "redirect";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteKind {
    /// The login form.
    Login,
    /// Requires a valid session.
    Protected,
    /// Everything else.
    Public,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    login_path: String,
    landing_path: String,
    protected_prefixes: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_LOGIN_PATH,
            DEFAULT_LANDING_PATH,
            DEFAULT_PROTECTED_PREFIXES.iter().copied(),
        )
    }
}

impl RouteTable {
    #[must_use]
    pub fn new<'a>(login_path: &str, landing_path: &str, protected_prefixes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            login_path: normalize_path(login_path).to_owned(),
            landing_path: normalize_path(landing_path).to_owned(),
            protected_prefixes: protected_prefixes
                .into_iter()
                .map(|p| normalize_path(p).to_owned())
                .collect(),
        }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    #[must_use]
    pub fn protected_prefixes(&self) -> &[String] {
        &self.protected_prefixes
    }

    /// Classify a path. Query strings, fragments and trailing slashes are ignored.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteKind {
        let path = normalize_path(path);
        if matches_prefix(path, &self.login_path) {
            return RouteKind::Login;
        }
        if self.protected_prefixes.iter().any(|prefix| matches_prefix(path, prefix)) {
            return RouteKind::Protected;
        }
        RouteKind::Public
    }

    /// Login URL that returns to `path_and_query` after authentication.
    #[must_use]
    pub fn login_redirect(&self, path_and_query: &str) -> String {
        format!(
            "{}?{REDIRECT_PARAM}={}",
            self.login_path,
            urlencoding::encode(path_and_query)
        )
    }

    /// Where a navigation to `path_and_query` should end up.
    ///
    /// Authenticated users are sent from the login form to the landing path;
    /// unauthenticated users are sent from protected paths to the login form.
    #[must_use]
    pub fn decide(&self, path_and_query: &str, authenticated: bool) -> RouteDecision {
        match (self.classify(path_and_query), authenticated) {
            (RouteKind::Login, true) => RouteDecision::Redirect(self.landing_path.clone()),
            (RouteKind::Protected, false) => RouteDecision::Redirect(self.login_redirect(path_and_query)),
            _ => RouteDecision::Allow,
        }
    }

    /// Post-login destination for a decoded `redirect` parameter.
    ///
    /// Only same-site absolute paths are honored, and never the login form
    /// itself; anything else lands on the landing path.
    #[must_use]
    pub fn safe_redirect_target(&self, raw: Option<&str>) -> String {
        let Some(target) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
            return self.landing_path.clone();
        };
        let same_site = target.starts_with('/')
            && !target.starts_with("//")
            && !target.starts_with("/\\")
            && !target.chars().any(char::is_control);
        if !same_site || self.classify(target) == RouteKind::Login {
            tracing::debug!(target, "ignoring unsafe post-login redirect");
            return self.landing_path.clone();
        }
        target.to_owned()
    }
}

/// Strip query, fragment and trailing slashes. The root path stays `/`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Segment-aware prefix match: `/admin/roles` covers `/admin/roles/7` but not
/// `/admin/rolesx`.
#[must_use]
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
