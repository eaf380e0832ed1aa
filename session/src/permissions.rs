//! Path → required-permission map for in-app authorization.
//!
//! The map is written as a nested tree of groups whose leaves are
//! `{ path, permission }` rules, and flattened once when loaded:
//!
//! ```yaml
//! roles:
//!   list: { path: /admin/roles, permission: roles.view }
//!   create: { path: /admin/roles/create, permission: roles.create }
//! reports: { path: /admin/reports, permission: "" }
//! ```
//!
//! A rule without a `permission` is unrestricted. A rule whose permission is
//! the empty string is closed to everyone. The two must never be conflated.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::routes::{matches_prefix, normalize_path};

/// What a path demands of the current user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Requirement {
    /// No rule, or a rule without a permission.
    Unrestricted,
    /// A rule with an empty permission: nobody may enter.
    Forbidden,
    /// The named permission must be held.
    Permission(String),
}

impl Requirement {
    fn from_rule(permission: Option<&str>) -> Self {
        match permission {
            None => Self::Unrestricted,
            Some("") => Self::Forbidden,
            Some(name) => Self::Permission(name.to_owned()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied { requirement: Requirement },
}

impl Access {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteRule {
    path: String,
    #[serde(default)]
    permission: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PermissionNode {
    Rule(RouteRule),
    Group(BTreeMap<String, PermissionNode>),
}

/// Flattened permission map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionMap {
    rules: BTreeMap<String, Requirement>,
}

impl<'de> Deserialize<'de> for PermissionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tree = BTreeMap::<String, PermissionNode>::deserialize(deserializer)?;
        let mut rules = BTreeMap::new();
        for node in tree.into_values() {
            flatten(node, &mut rules);
        }
        tracing::debug!(rules = rules.len(), "permission map flattened");
        Ok(Self { rules })
    }
}

fn flatten(node: PermissionNode, out: &mut BTreeMap<String, Requirement>) {
    match node {
        PermissionNode::Rule(rule) => {
            let path = normalize_path(&rule.path).to_owned();
            out.entry(path)
                .or_insert_with(|| Requirement::from_rule(rule.permission.as_deref()));
        }
        PermissionNode::Group(children) => {
            for child in children.into_values() {
                flatten(child, out);
            }
        }
    }
}

impl PermissionMap {
    /// Build a map from `(path, permission)` pairs. The first rule for a path wins.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        let mut rules = BTreeMap::new();
        for (path, permission) in pairs {
            rules
                .entry(normalize_path(path).to_owned())
                .or_insert_with(|| Requirement::from_rule(permission));
        }
        Self { rules }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Requirement for `path`: exact rule first, then the longest prefix rule.
    #[must_use]
    pub fn requirement_for(&self, path: &str) -> Requirement {
        let path = normalize_path(path);
        if let Some(requirement) = self.rules.get(path) {
            return requirement.clone();
        }
        self.rules
            .iter()
            .filter(|(prefix, _)| matches_prefix(path, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(Requirement::Unrestricted, |(_, requirement)| requirement.clone())
    }

    /// Check `path` against the permissions a user holds.
    #[must_use]
    pub fn authorize<S: AsRef<str>>(&self, path: &str, granted: &[S]) -> Access {
        match self.requirement_for(path) {
            Requirement::Unrestricted => Access::Granted,
            Requirement::Permission(name) if granted.iter().any(|g| g.as_ref() == name) => Access::Granted,
            requirement => Access::Denied { requirement },
        }
    }
}

#[cfg(test)]
#[path = "permissions_test.rs"]
mod tests;
