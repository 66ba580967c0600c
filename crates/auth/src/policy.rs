//! Permission policy engine.
//!
//! Pure decision logic over a user's resolved groups:
//! - No IO
//! - No panics
//! - No mutable state after construction

use serde::Serialize;

use warden_core::GroupId;

use crate::{Group, Permission};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Grant {
    group: GroupId,
    permission: Permission,
}

/// Aggregated permissions of one user, ready for `matches` queries.
///
/// Negative permissions are resolved once at construction: a negative from
/// group `G` stays in force unless a positive from some *other* group covers
/// it. Positives of `G` itself never cancel `G`'s own negatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEngine {
    positives: Vec<Grant>,
    negatives: Vec<Grant>,
}

impl PolicyEngine {
    pub fn for_groups<'a, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = &'a Group>,
    {
        let mut positives = Vec::new();
        let mut candidates = Vec::new();

        for group in groups {
            for permission in &group.permissions {
                let grant = Grant {
                    group: group.entity.id.clone(),
                    permission: permission.clone(),
                };
                if permission.is_negative() {
                    candidates.push(grant);
                } else {
                    positives.push(grant);
                }
            }
        }

        let negatives = candidates
            .into_iter()
            .filter(|negative| {
                !positives.iter().any(|positive| {
                    positive.group != negative.group
                        && positive.permission.contains(&negative.permission)
                })
            })
            .collect();

        Self {
            positives,
            negatives,
        }
    }

    /// Whether every required permission is granted and none is denied.
    ///
    /// An empty requirement is vacuously satisfied.
    pub fn matches(&self, required: &[Permission]) -> bool {
        required.iter().all(|r| self.covering_positive(r).is_some())
            && !required.iter().any(|r| self.denying_negative(r).is_some())
    }

    /// Explain the decision `matches` would make for `required`.
    pub fn explain(&self, required: &[Permission]) -> PolicyDecision {
        let uncovered: Vec<String> = required
            .iter()
            .filter(|r| self.covering_positive(r).is_none())
            .map(ToString::to_string)
            .collect();

        let denied: Vec<Denial> = required
            .iter()
            .filter_map(|r| {
                self.denying_negative(r).map(|negative| Denial {
                    required: r.to_string(),
                    negated_by: negative.permission.to_string(),
                    group: negative.group.clone(),
                })
            })
            .collect();

        PolicyDecision {
            granted: uncovered.is_empty() && denied.is_empty(),
            uncovered,
            denied,
        }
    }

    /// Negative permissions that survived cross-group promotion.
    pub fn effective_negatives(&self) -> impl Iterator<Item = &Permission> {
        self.negatives.iter().map(|g| &g.permission)
    }

    fn covering_positive(&self, required: &Permission) -> Option<&Grant> {
        self.positives
            .iter()
            .find(|g| g.permission.contains(required))
    }

    fn denying_negative(&self, required: &Permission) -> Option<&Grant> {
        self.negatives
            .iter()
            .find(|g| g.permission.contains(required))
    }
}

/// Auditable outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDecision {
    pub granted: bool,

    /// Required permissions no positive permission covers.
    pub uncovered: Vec<String>,

    /// Required permissions blocked by an effective negative permission.
    pub denied: Vec<Denial>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub required: String,
    pub negated_by: String,
    pub group: GroupId,
}
