//! # User Profiles
//!
//! Persisted governance identity: a role and a two-part reputation.
//! Profiles live in the `users` collection, keyed by user id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::{ActorContext, Role};

/// Combined reputation a novice needs before batch promotion to citizen
pub const PROMOTION_THRESHOLD: i64 = 50;

/// Which half of the reputation to adjust
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReputationKind {
    /// Earned by authoring structures that get verified
    Creation,
    /// Earned by voting and flagging
    Contributor,
}

impl ReputationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationKind::Creation => "creation",
            ReputationKind::Contributor => "contributor",
        }
    }
}

impl fmt::Display for ReputationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReputationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creation" => Ok(ReputationKind::Creation),
            "contributor" => Ok(ReputationKind::Contributor),
            other => Err(format!("unknown reputation kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reputation {
    #[serde(default)]
    pub creation: i64,
    #[serde(default)]
    pub contributor: i64,
}

impl Reputation {
    pub fn new(creation: i64, contributor: i64) -> Self {
        Self {
            creation,
            contributor,
        }
    }

    pub fn total(&self) -> i64 {
        self.creation.saturating_add(self.contributor)
    }

    /// Add `amount` (possibly negative) to one score
    pub fn adjust(&mut self, kind: ReputationKind, amount: i64) {
        let score = match kind {
            ReputationKind::Creation => &mut self.creation,
            ReputationKind::Contributor => &mut self.contributor,
        };
        *score = score.saturating_add(amount);
    }
}

/// A user's stored governance profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub reputation: Reputation,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// A first-time profile: citizen, one contributor point
    pub fn new(uid: impl Into<String>, display_name: Option<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name,
            email,
            role: Role::Citizen,
            reputation: Reputation::new(0, 1),
            created_at: Utc::now(),
        }
    }

    /// Admin profiles cannot have their role or reputation changed
    pub fn is_protected(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_eligible_for_promotion(&self) -> bool {
        self.role == Role::Novice && self.reputation.total() >= PROMOTION_THRESHOLD
    }

    /// The actor this profile acts as
    pub fn actor(&self) -> ActorContext {
        ActorContext::new(self.uid.clone(), self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_defaults() {
        let profile = UserProfile::new("u1", None, None);
        assert_eq!(profile.role, Role::Citizen);
        assert_eq!(profile.reputation, Reputation::new(0, 1));
        assert!(!profile.is_protected());
    }

    #[test]
    fn test_promotion_eligibility() {
        let mut profile = UserProfile::new("u1", None, None);
        profile.role = Role::Novice;
        profile.reputation = Reputation::new(30, 19);
        assert!(!profile.is_eligible_for_promotion());

        profile.reputation.adjust(ReputationKind::Contributor, 1);
        assert!(profile.is_eligible_for_promotion());

        profile.role = Role::Citizen;
        assert!(!profile.is_eligible_for_promotion());
    }

    #[test]
    fn test_reputation_adjust_saturates() {
        let mut reputation = Reputation::new(i64::MAX, 0);
        reputation.adjust(ReputationKind::Creation, 5);
        assert_eq!(reputation.creation, i64::MAX);
        reputation.adjust(ReputationKind::Contributor, -3);
        assert_eq!(reputation.contributor, -3);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(UserProfile::new("u1", Some("Ada".into()), None)).unwrap();
        assert_eq!(json["role"], "citizen");
        assert_eq!(json["displayName"], "Ada");
        assert_eq!(json["reputation"]["contributor"], 1);
    }
}
