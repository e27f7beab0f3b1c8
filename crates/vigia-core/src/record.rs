//! Domain records — the tracked entities of the safety system.
//!
//! Every record has an identity, a mutable status/lifecycle field, and a
//! store-assigned creation timestamp. Records are never hard-deleted by
//! normal flows; the only deletion is the explicit admin action on reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Collections ─────────────────────────────────────────────────────────────

/// The tracked collections. The string names are the compatibility surface
/// shared by the store schema and the change feed — they must match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
  Users,
  Reports,
  Visitors,
  Notices,
  Campaigns,
  EmergencyAlerts,
  Checklist,
  Drills,
}

impl Collection {
  /// The collection name stored and published on the change feed.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Users => "users",
      Self::Reports => "reports",
      Self::Visitors => "visitors",
      Self::Notices => "notices",
      Self::Campaigns => "campaigns",
      Self::EmergencyAlerts => "emergency_alerts",
      Self::Checklist => "checklist",
      Self::Drills => "drills",
    }
  }
}

// ─── Shared attributes ───────────────────────────────────────────────────────

/// Urgency attached to reports and notices.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

/// The category of emergency an alert or drill concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
  Lockdown,
  Evacuation,
  Medical,
  General,
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// What kind of incident a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
  Bullying,
  Infrastructure,
  Security,
  Health,
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
  Pending,
  InReview,
  Resolved,
}

/// An incident report submitted by a principal (or anonymously).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
  pub id:          Uuid,
  pub title:       String,
  pub description: String,
  pub category:    ReportCategory,
  pub status:      ReportStatus,
  pub priority:    Priority,
  /// `None` when the report was submitted anonymously.
  pub reporter_id: Option<Uuid>,
  pub anonymous:   bool,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::SafetyStore::add_report`].
/// `id`, `status` (always `Pending`), and `created_at` are set by the store.
#[derive(Debug, Clone)]
pub struct NewReport {
  pub title:       String,
  pub description: String,
  pub category:    ReportCategory,
  pub priority:    Priority,
  pub reporter_id: Option<Uuid>,
  pub anonymous:   bool,
}

impl NewReport {
  /// Convenience constructor with default priority, attributed to nobody.
  pub fn new(title: impl Into<String>, category: ReportCategory) -> Self {
    Self {
      title:       title.into(),
      description: String::new(),
      category,
      priority:    Priority::default(),
      reporter_id: None,
      anonymous:   false,
    }
  }
}

// ─── Visitors ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorStatus {
  CheckedIn,
  CheckedOut,
}

/// A visitor currently or previously on the premises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visitor {
  pub id:             Uuid,
  pub name:           String,
  /// Identity document number shown at the gate, if collected.
  pub document:       Option<String>,
  /// Who or which sector the visitor is here to see.
  pub visiting:       String,
  pub reason:         String,
  pub status:         VisitorStatus,
  pub checked_in_at:  DateTime<Utc>,
  pub checked_out_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::store::SafetyStore::check_in`].
#[derive(Debug, Clone)]
pub struct NewVisitor {
  pub name:     String,
  pub document: Option<String>,
  pub visiting: String,
  pub reason:   String,
}

// ─── Notices ─────────────────────────────────────────────────────────────────

/// A notice shown on every role's board while `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
  pub id:         Uuid,
  pub title:      String,
  pub body:       String,
  pub priority:   Priority,
  pub is_active:  bool,
  pub author_id:  Option<Uuid>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::SafetyStore::add_notice`]. Created active.
#[derive(Debug, Clone)]
pub struct NewNotice {
  pub title:     String,
  pub body:      String,
  pub priority:  Priority,
  pub author_id: Option<Uuid>,
}

// ─── Campaigns ───────────────────────────────────────────────────────────────

/// An educational campaign scheduled for a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
  pub id:             Uuid,
  pub title:          String,
  pub description:    String,
  pub scheduled_date: NaiveDate,
  pub is_active:      bool,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::SafetyStore::add_campaign`]. Created active.
#[derive(Debug, Clone)]
pub struct NewCampaign {
  pub title:          String,
  pub description:    String,
  pub scheduled_date: NaiveDate,
}

// ─── Emergency alerts ────────────────────────────────────────────────────────

/// A live emergency alert. Stays in every feed while `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAlert {
  pub id:           Uuid,
  pub kind:         AlertKind,
  pub message:      String,
  pub is_active:    bool,
  pub triggered_by: Option<Uuid>,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::SafetyStore::trigger_alert`].
#[derive(Debug, Clone)]
pub struct NewAlert {
  pub kind:         AlertKind,
  pub message:      String,
  pub triggered_by: Option<Uuid>,
}

// ─── Safety checklist ────────────────────────────────────────────────────────

/// One inspectable item of the recurring safety checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
  pub id:         Uuid,
  pub label:      String,
  /// Physical area the item belongs to, e.g. "patio", "lab".
  pub area:       String,
  pub done:       bool,
  pub updated_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::SafetyStore::add_checklist_item`].
#[derive(Debug, Clone)]
pub struct NewChecklistItem {
  pub label: String,
  pub area:  String,
}

// ─── Drills ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillStatus {
  Scheduled,
  Completed,
  Cancelled,
}

/// A scheduled emergency drill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drill {
  pub id:             Uuid,
  pub title:          String,
  pub kind:           AlertKind,
  pub scheduled_date: NaiveDate,
  pub status:         DrillStatus,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::SafetyStore::add_drill`]. Created `Scheduled`.
#[derive(Debug, Clone)]
pub struct NewDrill {
  pub title:          String,
  pub kind:           AlertKind,
  pub scheduled_date: NaiveDate,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collection_names_match_serde_tags() {
    for c in [
      Collection::Users,
      Collection::Reports,
      Collection::Visitors,
      Collection::Notices,
      Collection::Campaigns,
      Collection::EmergencyAlerts,
      Collection::Checklist,
      Collection::Drills,
    ] {
      let tag = serde_json::to_value(c).unwrap();
      assert_eq!(tag, serde_json::Value::String(c.as_str().to_string()));
    }
  }
}
