//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, calendar dates as ISO
//! `YYYY-MM-DD` (which sorts lexically), UUIDs as hyphenated lowercase
//! strings, and status enums as their serde snake_case tags.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use vigia_core::{
  principal::{Profile, Role},
  record::{
    AlertKind, Campaign, ChecklistItem, Drill, DrillStatus, EmergencyAlert,
    Notice, Priority, Report, ReportCategory, ReportStatus, Visitor,
    VisitorStatus,
  },
};

use crate::{Error, Result};

fn unknown(field: &'static str, value: &str) -> Error {
  Error::Domain(vigia_core::Error::UnknownTag(field, value.to_string()))
}

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_uuid_opt(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enum tags ───────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Student => "student",
    Role::Staff => "staff",
    Role::Direction => "direction",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "student" => Ok(Role::Student),
    "staff" => Ok(Role::Staff),
    "direction" => Ok(Role::Direction),
    other => Err(unknown("role", other)),
  }
}

pub fn encode_report_category(c: ReportCategory) -> &'static str {
  match c {
    ReportCategory::Bullying => "bullying",
    ReportCategory::Infrastructure => "infrastructure",
    ReportCategory::Security => "security",
    ReportCategory::Health => "health",
    ReportCategory::Other => "other",
  }
}

pub fn decode_report_category(s: &str) -> Result<ReportCategory> {
  match s {
    "bullying" => Ok(ReportCategory::Bullying),
    "infrastructure" => Ok(ReportCategory::Infrastructure),
    "security" => Ok(ReportCategory::Security),
    "health" => Ok(ReportCategory::Health),
    "other" => Ok(ReportCategory::Other),
    other => Err(unknown("report category", other)),
  }
}

pub fn encode_report_status(s: ReportStatus) -> &'static str {
  match s {
    ReportStatus::Pending => "pending",
    ReportStatus::InReview => "in_review",
    ReportStatus::Resolved => "resolved",
  }
}

pub fn decode_report_status(s: &str) -> Result<ReportStatus> {
  match s {
    "pending" => Ok(ReportStatus::Pending),
    "in_review" => Ok(ReportStatus::InReview),
    "resolved" => Ok(ReportStatus::Resolved),
    other => Err(unknown("report status", other)),
  }
}

pub fn encode_priority(p: Priority) -> &'static str {
  match p {
    Priority::Low => "low",
    Priority::Medium => "medium",
    Priority::High => "high",
  }
}

pub fn decode_priority(s: &str) -> Result<Priority> {
  match s {
    "low" => Ok(Priority::Low),
    "medium" => Ok(Priority::Medium),
    "high" => Ok(Priority::High),
    other => Err(unknown("priority", other)),
  }
}

pub fn encode_visitor_status(s: VisitorStatus) -> &'static str {
  match s {
    VisitorStatus::CheckedIn => "checked_in",
    VisitorStatus::CheckedOut => "checked_out",
  }
}

pub fn decode_visitor_status(s: &str) -> Result<VisitorStatus> {
  match s {
    "checked_in" => Ok(VisitorStatus::CheckedIn),
    "checked_out" => Ok(VisitorStatus::CheckedOut),
    other => Err(unknown("visitor status", other)),
  }
}

pub fn encode_alert_kind(k: AlertKind) -> &'static str {
  match k {
    AlertKind::Lockdown => "lockdown",
    AlertKind::Evacuation => "evacuation",
    AlertKind::Medical => "medical",
    AlertKind::General => "general",
  }
}

pub fn decode_alert_kind(s: &str) -> Result<AlertKind> {
  match s {
    "lockdown" => Ok(AlertKind::Lockdown),
    "evacuation" => Ok(AlertKind::Evacuation),
    "medical" => Ok(AlertKind::Medical),
    "general" => Ok(AlertKind::General),
    other => Err(unknown("alert kind", other)),
  }
}

pub fn encode_drill_status(s: DrillStatus) -> &'static str {
  match s {
    DrillStatus::Scheduled => "scheduled",
    DrillStatus::Completed => "completed",
    DrillStatus::Cancelled => "cancelled",
  }
}

pub fn decode_drill_status(s: &str) -> Result<DrillStatus> {
  match s {
    "scheduled" => Ok(DrillStatus::Scheduled),
    "completed" => Ok(DrillStatus::Completed),
    "cancelled" => Ok(DrillStatus::Cancelled),
    other => Err(unknown("drill status", other)),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawProfile {
  pub id:         String,
  pub name:       String,
  pub email:      String,
  pub role:       String,
  pub is_active:  bool,
  pub created_at: String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      email:      self.email,
      role:       decode_role(&self.role)?,
      is_active:  self.is_active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `reports` row.
pub struct RawReport {
  pub id:          String,
  pub title:       String,
  pub description: String,
  pub category:    String,
  pub status:      String,
  pub priority:    String,
  pub reporter_id: Option<String>,
  pub anonymous:   bool,
  pub created_at:  String,
}

impl RawReport {
  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      id:          decode_uuid(&self.id)?,
      title:       self.title,
      description: self.description,
      category:    decode_report_category(&self.category)?,
      status:      decode_report_status(&self.status)?,
      priority:    decode_priority(&self.priority)?,
      reporter_id: decode_uuid_opt(self.reporter_id.as_deref())?,
      anonymous:   self.anonymous,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `visitors` row.
pub struct RawVisitor {
  pub id:             String,
  pub name:           String,
  pub document:       Option<String>,
  pub visiting:       String,
  pub reason:         String,
  pub status:         String,
  pub checked_in_at:  String,
  pub checked_out_at: Option<String>,
}

impl RawVisitor {
  pub fn into_visitor(self) -> Result<Visitor> {
    Ok(Visitor {
      id:             decode_uuid(&self.id)?,
      name:           self.name,
      document:       self.document,
      visiting:       self.visiting,
      reason:         self.reason,
      status:         decode_visitor_status(&self.status)?,
      checked_in_at:  decode_dt(&self.checked_in_at)?,
      checked_out_at: self
        .checked_out_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from a `notices` row.
pub struct RawNotice {
  pub id:         String,
  pub title:      String,
  pub body:       String,
  pub priority:   String,
  pub is_active:  bool,
  pub author_id:  Option<String>,
  pub created_at: String,
}

impl RawNotice {
  pub fn into_notice(self) -> Result<Notice> {
    Ok(Notice {
      id:         decode_uuid(&self.id)?,
      title:      self.title,
      body:       self.body,
      priority:   decode_priority(&self.priority)?,
      is_active:  self.is_active,
      author_id:  decode_uuid_opt(self.author_id.as_deref())?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `campaigns` row.
pub struct RawCampaign {
  pub id:             String,
  pub title:          String,
  pub description:    String,
  pub scheduled_date: String,
  pub is_active:      bool,
  pub created_at:     String,
}

impl RawCampaign {
  pub fn into_campaign(self) -> Result<Campaign> {
    Ok(Campaign {
      id:             decode_uuid(&self.id)?,
      title:          self.title,
      description:    self.description,
      scheduled_date: decode_date(&self.scheduled_date)?,
      is_active:      self.is_active,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `emergency_alerts` row.
pub struct RawAlert {
  pub id:           String,
  pub kind:         String,
  pub message:      String,
  pub is_active:    bool,
  pub triggered_by: Option<String>,
  pub created_at:   String,
}

impl RawAlert {
  pub fn into_alert(self) -> Result<EmergencyAlert> {
    Ok(EmergencyAlert {
      id:           decode_uuid(&self.id)?,
      kind:         decode_alert_kind(&self.kind)?,
      message:      self.message,
      is_active:    self.is_active,
      triggered_by: decode_uuid_opt(self.triggered_by.as_deref())?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `checklist` row.
pub struct RawChecklistItem {
  pub id:         String,
  pub label:      String,
  pub area:       String,
  pub done:       bool,
  pub updated_at: String,
  pub created_at: String,
}

impl RawChecklistItem {
  pub fn into_item(self) -> Result<ChecklistItem> {
    Ok(ChecklistItem {
      id:         decode_uuid(&self.id)?,
      label:      self.label,
      area:       self.area,
      done:       self.done,
      updated_at: decode_dt(&self.updated_at)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `drills` row.
pub struct RawDrill {
  pub id:             String,
  pub title:          String,
  pub kind:           String,
  pub scheduled_date: String,
  pub status:         String,
  pub created_at:     String,
}

impl RawDrill {
  pub fn into_drill(self) -> Result<Drill> {
    Ok(Drill {
      id:             decode_uuid(&self.id)?,
      title:          self.title,
      kind:           decode_alert_kind(&self.kind)?,
      scheduled_date: decode_date(&self.scheduled_date)?,
      status:         decode_drill_status(&self.status)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}
