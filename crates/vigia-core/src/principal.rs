//! Principals — the resolved, authenticated actors of the system.
//!
//! A [`Principal`] is what the session layer hands to everything else once
//! an authentication-provider identity has been matched to a stored
//! [`Profile`]. All authorization questions are answered from the principal
//! alone; see [`crate::permission`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::{self, Access};

// ─── Role ────────────────────────────────────────────────────────────────────

/// The seniority tier of a principal. The derived `Ord` gives the total order
/// Student < Staff < Direction used by [`Access::AtLeast`] queries.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Student,
  Staff,
  Direction,
}

impl Role {
  /// Numeric seniority rank, derived from declaration order.
  pub fn rank(self) -> u8 { self as u8 }
}

// ─── Principal ───────────────────────────────────────────────────────────────

/// The authenticated actor: a stored profile materialised for a session.
///
/// Invariant: an inactive principal has zero permissions regardless of role.
/// The evaluator enforces this; nothing else needs to re-check `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
  pub id:        Uuid,
  pub name:      String,
  pub email:     String,
  pub role:      Role,
  pub is_active: bool,
}

impl Principal {
  /// True iff this principal holds the capability `tag`.
  pub fn can(&self, tag: &str) -> bool {
    permission::allows(Some(self), &Access::Can(tag))
  }

  /// True iff this principal's role is at least as senior as `role`.
  pub fn is_at_least(&self, role: Role) -> bool {
    permission::allows(Some(self), &Access::AtLeast(role))
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The stored user record, looked up by provider email at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
}

impl Profile {
  /// Materialise the session-facing [`Principal`] for this profile.
  pub fn into_principal(self) -> Principal {
    Principal {
      id:        self.id,
      name:      self.name,
      email:     self.email,
      role:      self.role,
      is_active: self.is_active,
    }
  }
}

/// Input to [`crate::store::SafetyStore::add_user`].
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub name:      String,
  pub email:     String,
  pub role:      Role,
  pub is_active: bool,
}
