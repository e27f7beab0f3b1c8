//! The permission model: capability tags, the static grant table, and the
//! one evaluator every authorization decision goes through.
//!
//! The grant table is the single source of truth. Role seniority
//! ([`Role::rank`]) is a derived convenience for "at least this senior"
//! checks; it never overrides a capability decision. Evaluation is pure and
//! synchronous — there is no error case, only `false`.

use crate::principal::{Principal, Role};

// ─── Capability tags ─────────────────────────────────────────────────────────

/// An opaque capability tag, granted to zero or more roles.
pub type Permission = &'static str;

pub const DASHBOARD_VIEW: Permission = "dashboard:view";
pub const REPORTS_CREATE: Permission = "reports:create";
pub const REPORTS_MANAGE: Permission = "reports:manage";
pub const VISITORS_MANAGE: Permission = "visitors:manage";
pub const NOTICES_MANAGE: Permission = "notices:manage";
pub const CAMPAIGNS_MANAGE: Permission = "campaigns:manage";
pub const EMERGENCY_TRIGGER: Permission = "emergency:trigger";
pub const CHECKLIST_MANAGE: Permission = "checklist:manage";
pub const DRILLS_MANAGE: Permission = "drills:manage";
pub const USERS_MANAGE: Permission = "users:manage";

// ─── Grant table ─────────────────────────────────────────────────────────────

const STUDENT_GRANTS: &[Permission] = &[DASHBOARD_VIEW, REPORTS_CREATE];

const STAFF_GRANTS: &[Permission] = &[
  DASHBOARD_VIEW,
  REPORTS_CREATE,
  VISITORS_MANAGE,
  NOTICES_MANAGE,
  CHECKLIST_MANAGE,
];

const DIRECTION_GRANTS: &[Permission] = &[
  DASHBOARD_VIEW,
  REPORTS_CREATE,
  REPORTS_MANAGE,
  VISITORS_MANAGE,
  NOTICES_MANAGE,
  CAMPAIGNS_MANAGE,
  EMERGENCY_TRIGGER,
  CHECKLIST_MANAGE,
  DRILLS_MANAGE,
  USERS_MANAGE,
];

/// The capability tags granted to `role`. Static configuration, not data.
pub fn grants(role: Role) -> &'static [Permission] {
  match role {
    Role::Student => STUDENT_GRANTS,
    Role::Staff => STAFF_GRANTS,
    Role::Direction => DIRECTION_GRANTS,
  }
}

fn role_has(role: Role, tag: &str) -> bool {
  grants(role).iter().any(|p| *p == tag)
}

// ─── Access queries ──────────────────────────────────────────────────────────

/// A single authorization question. The list forms use any-match semantics:
/// the query passes if the principal satisfies at least one entry.
#[derive(Debug, Clone, Copy)]
pub enum Access<'a> {
  /// Role at least as senior as this one.
  AtLeast(Role),
  /// Role at least as senior as at least one of these.
  AnyRole(&'a [Role]),
  /// Holds this capability tag.
  Can(&'a str),
  /// Holds at least one of these capability tags.
  AnyOf(&'a [&'a str]),
}

// ─── Evaluator ───────────────────────────────────────────────────────────────

/// The unified authorization decision.
///
/// Rejects unconditionally when there is no principal or the principal is
/// inactive; otherwise answers `access` against the grant table (capability
/// forms) or the derived seniority rank (role forms).
pub fn allows(principal: Option<&Principal>, access: &Access<'_>) -> bool {
  let Some(p) = principal else {
    return false;
  };
  if !p.is_active {
    return false;
  }
  match access {
    Access::AtLeast(role) => p.role.rank() >= role.rank(),
    Access::AnyRole(roles) => roles.iter().any(|r| p.role.rank() >= r.rank()),
    Access::Can(tag) => role_has(p.role, tag),
    Access::AnyOf(tags) => tags.iter().any(|t| role_has(p.role, t)),
  }
}
