//! [`SqliteStore`] — the SQLite implementation of [`SafetyStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use uuid::Uuid;

use vigia_core::{
  principal::{NewProfile, Profile},
  record::{
    Campaign, ChecklistItem, Collection, Drill, DrillStatus, EmergencyAlert,
    NewAlert, NewCampaign, NewChecklistItem, NewDrill, NewNotice, NewReport,
    NewVisitor, Notice, Report, ReportStatus, Visitor, VisitorStatus,
  },
  store::{ProfileSource, SafetyStore},
};

use crate::{
  encode::{
    encode_alert_kind, encode_date, encode_drill_status, encode_dt,
    encode_priority, encode_report_category, encode_report_status,
    encode_role, encode_uuid, encode_visitor_status, RawAlert, RawCampaign,
    RawChecklistItem, RawDrill, RawNotice, RawProfile, RawReport, RawVisitor,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Change-bus capacity. A lagged feed recovers by re-querying, never by
/// replaying missed events, so a small ring is enough.
const CHANGE_BUS_CAPACITY: usize = 64;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vigia safety store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted and all
/// clones share one change bus.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<Collection>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_conn(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_conn(conn).await
  }

  async fn with_conn(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(CHANGE_BUS_CAPACITY);
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Announce a committed write. Sending fails only when nobody is
  /// subscribed, which is not an error.
  fn publish(&self, collection: Collection) {
    tracing::trace!(collection = collection.as_str(), "store change");
    let _ = self.changes.send(collection);
  }

  /// Run an UPDATE/DELETE and map "zero rows touched" to `not_found`.
  async fn execute_one(
    &self,
    sql: &'static str,
    params: Vec<rusqlite::types::Value>,
    not_found: vigia_core::Error,
  ) -> Result<()> {
    let touched: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(sql, rusqlite::params_from_iter(params))?)
      })
      .await?;
    if touched == 0 {
      return Err(not_found.into());
    }
    Ok(())
  }
}

// ─── ProfileSource impl ──────────────────────────────────────────────────────

impl ProfileSource for SqliteStore {
  type Error = Error;

  async fn get_profile(&self, email: &str) -> Result<Option<Profile>> {
    let email = email.to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, name, email, role, is_active, created_at
             FROM users WHERE email = ?1",
            rusqlite::params![email],
            |row| {
              Ok(RawProfile {
                id:         row.get(0)?,
                name:       row.get(1)?,
                email:      row.get(2)?,
                role:       row.get(3)?,
                is_active:  row.get(4)?,
                created_at: row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }
}

// ─── SafetyStore impl ────────────────────────────────────────────────────────

impl SafetyStore for SqliteStore {
  fn changes(&self) -> broadcast::Receiver<Collection> {
    self.changes.subscribe()
  }

  // ── Users / profiles ──────────────────────────────────────────────────────

  async fn add_user(&self, input: NewProfile) -> Result<Profile> {
    let profile = Profile {
      id:         Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      role:       input.role,
      is_active:  input.is_active,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(profile.id);
    let name     = profile.name.clone();
    let email    = profile.email.clone();
    let role_str = encode_role(profile.role).to_owned();
    let active   = profile.is_active;
    let at_str   = encode_dt(profile.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (id, name, email, role, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, email, role_str, active, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::Users);
    Ok(profile)
  }

  async fn list_users(&self) -> Result<Vec<Profile>> {
    let raws: Vec<RawProfile> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, name, email, role, is_active, created_at
           FROM users ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawProfile {
              id:         row.get(0)?,
              name:       row.get(1)?,
              email:      row.get(2)?,
              role:       row.get(3)?,
              is_active:  row.get(4)?,
              created_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<()> {
    self
      .execute_one(
        "UPDATE users SET is_active = ?2 WHERE id = ?1",
        vec![encode_uuid(id).into(), is_active.into()],
        vigia_core::Error::UserNotFound(id),
      )
      .await?;
    self.publish(Collection::Users);
    Ok(())
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn add_report(&self, input: NewReport) -> Result<Report> {
    let report = Report {
      id:          Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      category:    input.category,
      status:      ReportStatus::Pending,
      priority:    input.priority,
      reporter_id: input.reporter_id,
      anonymous:   input.anonymous,
      created_at:  Utc::now(),
    };

    let id_str       = encode_uuid(report.id);
    let title        = report.title.clone();
    let description  = report.description.clone();
    let category_str = encode_report_category(report.category).to_owned();
    let status_str   = encode_report_status(report.status).to_owned();
    let priority_str = encode_priority(report.priority).to_owned();
    let reporter_str = report.reporter_id.map(encode_uuid);
    let anonymous    = report.anonymous;
    let at_str       = encode_dt(report.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reports (
             id, title, description, category, status, priority,
             reporter_id, anonymous, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            title,
            description,
            category_str,
            status_str,
            priority_str,
            reporter_str,
            anonymous,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::Reports);
    Ok(report)
  }

  async fn list_reports(&self) -> Result<Vec<Report>> {
    let raws: Vec<RawReport> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, title, description, category, status, priority,
                  reporter_id, anonymous, created_at
           FROM reports ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawReport {
              id:          row.get(0)?,
              title:       row.get(1)?,
              description: row.get(2)?,
              category:    row.get(3)?,
              status:      row.get(4)?,
              priority:    row.get(5)?,
              reporter_id: row.get(6)?,
              anonymous:   row.get(7)?,
              created_at:  row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReport::into_report).collect()
  }

  async fn set_report_status(
    &self,
    id: Uuid,
    status: ReportStatus,
  ) -> Result<()> {
    self
      .execute_one(
        "UPDATE reports SET status = ?2 WHERE id = ?1",
        vec![
          encode_uuid(id).into(),
          encode_report_status(status).to_owned().into(),
        ],
        vigia_core::Error::RecordNotFound(id),
      )
      .await?;
    self.publish(Collection::Reports);
    Ok(())
  }

  async fn delete_report(&self, id: Uuid) -> Result<()> {
    self
      .execute_one(
        "DELETE FROM reports WHERE id = ?1",
        vec![encode_uuid(id).into()],
        vigia_core::Error::RecordNotFound(id),
      )
      .await?;
    self.publish(Collection::Reports);
    Ok(())
  }

  // ── Visitors ──────────────────────────────────────────────────────────────

  async fn check_in(&self, input: NewVisitor) -> Result<Visitor> {
    let visitor = Visitor {
      id:             Uuid::new_v4(),
      name:           input.name,
      document:       input.document,
      visiting:       input.visiting,
      reason:         input.reason,
      status:         VisitorStatus::CheckedIn,
      checked_in_at:  Utc::now(),
      checked_out_at: None,
    };

    let id_str     = encode_uuid(visitor.id);
    let name       = visitor.name.clone();
    let document   = visitor.document.clone();
    let visiting   = visitor.visiting.clone();
    let reason     = visitor.reason.clone();
    let status_str = encode_visitor_status(visitor.status).to_owned();
    let in_str     = encode_dt(visitor.checked_in_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO visitors (
             id, name, document, visiting, reason, status, checked_in_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, name, document, visiting, reason, status_str, in_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::Visitors);
    Ok(visitor)
  }

  async fn list_visitors(&self) -> Result<Vec<Visitor>> {
    let raws: Vec<RawVisitor> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, name, document, visiting, reason, status,
                  checked_in_at, checked_out_at
           FROM visitors ORDER BY checked_in_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawVisitor {
              id:             row.get(0)?,
              name:           row.get(1)?,
              document:       row.get(2)?,
              visiting:       row.get(3)?,
              reason:         row.get(4)?,
              status:         row.get(5)?,
              checked_in_at:  row.get(6)?,
              checked_out_at: row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVisitor::into_visitor).collect()
  }

  async fn check_out(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let status: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT status FROM visitors WHERE id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    match status.as_deref() {
      None => return Err(vigia_core::Error::RecordNotFound(id).into()),
      Some(s) if s == encode_visitor_status(VisitorStatus::CheckedOut) => {
        return Err(vigia_core::Error::AlreadyCheckedOut(id).into());
      }
      Some(_) => {}
    }

    let id_str     = encode_uuid(id);
    let status_str = encode_visitor_status(VisitorStatus::CheckedOut).to_owned();
    let out_str    = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE visitors SET status = ?2, checked_out_at = ?3 WHERE id = ?1",
          rusqlite::params![id_str, status_str, out_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::Visitors);
    Ok(())
  }

  // ── Notices ───────────────────────────────────────────────────────────────

  async fn add_notice(&self, input: NewNotice) -> Result<Notice> {
    let notice = Notice {
      id:         Uuid::new_v4(),
      title:      input.title,
      body:       input.body,
      priority:   input.priority,
      is_active:  true,
      author_id:  input.author_id,
      created_at: Utc::now(),
    };

    let id_str       = encode_uuid(notice.id);
    let title        = notice.title.clone();
    let body         = notice.body.clone();
    let priority_str = encode_priority(notice.priority).to_owned();
    let author_str   = notice.author_id.map(encode_uuid);
    let at_str       = encode_dt(notice.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notices (
             id, title, body, priority, is_active, author_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
          rusqlite::params![id_str, title, body, priority_str, author_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::Notices);
    Ok(notice)
  }

  async fn list_active_notices(&self) -> Result<Vec<Notice>> {
    let raws: Vec<RawNotice> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, title, body, priority, is_active, author_id, created_at
           FROM notices WHERE is_active = 1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawNotice {
              id:         row.get(0)?,
              title:      row.get(1)?,
              body:       row.get(2)?,
              priority:   row.get(3)?,
              is_active:  row.get(4)?,
              author_id:  row.get(5)?,
              created_at: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotice::into_notice).collect()
  }

  async fn set_notice_active(&self, id: Uuid, is_active: bool) -> Result<()> {
    self
      .execute_one(
        "UPDATE notices SET is_active = ?2 WHERE id = ?1",
        vec![encode_uuid(id).into(), is_active.into()],
        vigia_core::Error::RecordNotFound(id),
      )
      .await?;
    self.publish(Collection::Notices);
    Ok(())
  }

  // ── Campaigns ─────────────────────────────────────────────────────────────

  async fn add_campaign(&self, input: NewCampaign) -> Result<Campaign> {
    let campaign = Campaign {
      id:             Uuid::new_v4(),
      title:          input.title,
      description:    input.description,
      scheduled_date: input.scheduled_date,
      is_active:      true,
      created_at:     Utc::now(),
    };

    let id_str      = encode_uuid(campaign.id);
    let title       = campaign.title.clone();
    let description = campaign.description.clone();
    let date_str    = encode_date(campaign.scheduled_date);
    let at_str      = encode_dt(campaign.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO campaigns (
             id, title, description, scheduled_date, is_active, created_at
           ) VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          rusqlite::params![id_str, title, description, date_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::Campaigns);
    Ok(campaign)
  }

  async fn list_upcoming_campaigns(
    &self,
    today: NaiveDate,
  ) -> Result<Vec<Campaign>> {
    let today_str = encode_date(today);

    let raws: Vec<RawCampaign> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, title, description, scheduled_date, is_active, created_at
           FROM campaigns
           WHERE is_active = 1 AND scheduled_date >= ?1
           ORDER BY scheduled_date ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![today_str], |row| {
            Ok(RawCampaign {
              id:             row.get(0)?,
              title:          row.get(1)?,
              description:    row.get(2)?,
              scheduled_date: row.get(3)?,
              is_active:      row.get(4)?,
              created_at:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCampaign::into_campaign).collect()
  }

  // ── Emergency alerts ──────────────────────────────────────────────────────

  async fn trigger_alert(&self, input: NewAlert) -> Result<EmergencyAlert> {
    let alert = EmergencyAlert {
      id:           Uuid::new_v4(),
      kind:         input.kind,
      message:      input.message,
      is_active:    true,
      triggered_by: input.triggered_by,
      created_at:   Utc::now(),
    };

    let id_str        = encode_uuid(alert.id);
    let kind_str      = encode_alert_kind(alert.kind).to_owned();
    let message       = alert.message.clone();
    let triggered_str = alert.triggered_by.map(encode_uuid);
    let at_str        = encode_dt(alert.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO emergency_alerts (
             id, kind, message, is_active, triggered_by, created_at
           ) VALUES (?1, ?2, ?3, 1, ?4, ?5)",
          rusqlite::params![id_str, kind_str, message, triggered_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::EmergencyAlerts);
    Ok(alert)
  }

  async fn list_active_alerts(&self) -> Result<Vec<EmergencyAlert>> {
    let raws: Vec<RawAlert> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, kind, message, is_active, triggered_by, created_at
           FROM emergency_alerts WHERE is_active = 1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawAlert {
              id:           row.get(0)?,
              kind:         row.get(1)?,
              message:      row.get(2)?,
              is_active:    row.get(3)?,
              triggered_by: row.get(4)?,
              created_at:   row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  async fn resolve_alert(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let is_active: Option<bool> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT is_active FROM emergency_alerts WHERE id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    match is_active {
      None => return Err(vigia_core::Error::RecordNotFound(id).into()),
      Some(false) => return Err(vigia_core::Error::AlreadyResolved(id).into()),
      Some(true) => {}
    }

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE emergency_alerts SET is_active = 0 WHERE id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::EmergencyAlerts);
    Ok(())
  }

  // ── Safety checklist ──────────────────────────────────────────────────────

  async fn add_checklist_item(
    &self,
    input: NewChecklistItem,
  ) -> Result<ChecklistItem> {
    let now = Utc::now();
    let item = ChecklistItem {
      id:         Uuid::new_v4(),
      label:      input.label,
      area:       input.area,
      done:       false,
      updated_at: now,
      created_at: now,
    };

    let id_str = encode_uuid(item.id);
    let label  = item.label.clone();
    let area   = item.area.clone();
    let at_str = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO checklist (id, label, area, done, updated_at, created_at)
           VALUES (?1, ?2, ?3, 0, ?4, ?4)",
          rusqlite::params![id_str, label, area, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::Checklist);
    Ok(item)
  }

  async fn list_checklist(&self) -> Result<Vec<ChecklistItem>> {
    let raws: Vec<RawChecklistItem> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, label, area, done, updated_at, created_at
           FROM checklist ORDER BY area, label",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawChecklistItem {
              id:         row.get(0)?,
              label:      row.get(1)?,
              area:       row.get(2)?,
              done:       row.get(3)?,
              updated_at: row.get(4)?,
              created_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChecklistItem::into_item).collect()
  }

  async fn set_item_done(&self, id: Uuid, done: bool) -> Result<()> {
    self
      .execute_one(
        "UPDATE checklist SET done = ?2, updated_at = ?3 WHERE id = ?1",
        vec![
          encode_uuid(id).into(),
          done.into(),
          encode_dt(Utc::now()).into(),
        ],
        vigia_core::Error::RecordNotFound(id),
      )
      .await?;
    self.publish(Collection::Checklist);
    Ok(())
  }

  // ── Drills ────────────────────────────────────────────────────────────────

  async fn add_drill(&self, input: NewDrill) -> Result<Drill> {
    let drill = Drill {
      id:             Uuid::new_v4(),
      title:          input.title,
      kind:           input.kind,
      scheduled_date: input.scheduled_date,
      status:         DrillStatus::Scheduled,
      created_at:     Utc::now(),
    };

    let id_str     = encode_uuid(drill.id);
    let title      = drill.title.clone();
    let kind_str   = encode_alert_kind(drill.kind).to_owned();
    let date_str   = encode_date(drill.scheduled_date);
    let status_str = encode_drill_status(drill.status).to_owned();
    let at_str     = encode_dt(drill.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO drills (id, title, kind, scheduled_date, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, title, kind_str, date_str, status_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Collection::Drills);
    Ok(drill)
  }

  async fn list_drills(&self) -> Result<Vec<Drill>> {
    let raws: Vec<RawDrill> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, title, kind, scheduled_date, status, created_at
           FROM drills ORDER BY scheduled_date ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDrill {
              id:             row.get(0)?,
              title:          row.get(1)?,
              kind:           row.get(2)?,
              scheduled_date: row.get(3)?,
              status:         row.get(4)?,
              created_at:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDrill::into_drill).collect()
  }

  async fn set_drill_status(&self, id: Uuid, status: DrillStatus) -> Result<()> {
    self
      .execute_one(
        "UPDATE drills SET status = ?2 WHERE id = ?1",
        vec![
          encode_uuid(id).into(),
          encode_drill_status(status).to_owned().into(),
        ],
        vigia_core::Error::RecordNotFound(id),
      )
      .await?;
    self.publish(Collection::Drills);
    Ok(())
  }
}
