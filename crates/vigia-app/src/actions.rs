//! Permission-checked mutations.
//!
//! Thin wrappers over store writes that enforce the capability table before
//! touching the backend. A denied call is [`Error::Forbidden`], a normal
//! rejected-operation outcome; a backend failure is surfaced as
//! [`Error::Store`], never swallowed.

use std::sync::Arc;

use uuid::Uuid;
use vigia_core::{
  permission::{
    self, Access, CAMPAIGNS_MANAGE, CHECKLIST_MANAGE, DRILLS_MANAGE,
    EMERGENCY_TRIGGER, NOTICES_MANAGE, REPORTS_CREATE, REPORTS_MANAGE,
    USERS_MANAGE, VISITORS_MANAGE,
  },
  principal::Principal,
  record::{
    Campaign, ChecklistItem, Drill, DrillStatus, EmergencyAlert, NewAlert,
    NewCampaign, NewChecklistItem, NewDrill, NewNotice, NewReport,
    NewVisitor, Notice, Report, ReportStatus, Visitor,
  },
  store::SafetyStore,
};

use crate::error::Error;

/// The mutation surface handed to UI collaborators.
pub struct Actions<S> {
  store: Arc<S>,
}

impl<S> Actions<S>
where
  S: SafetyStore + Send + Sync,
{
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  fn require(
    &self,
    principal: Option<&Principal>,
    tag: &'static str,
  ) -> Result<(), Error> {
    if permission::allows(principal, &Access::Can(tag)) {
      Ok(())
    } else {
      Err(Error::Forbidden(tag))
    }
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  /// Submit an incident report. Attributed to the caller unless the report
  /// is anonymous, in which case no reporter is recorded regardless of who
  /// submitted it.
  pub async fn submit_report(
    &self,
    principal: Option<&Principal>,
    mut input: NewReport,
  ) -> Result<Report, Error> {
    self.require(principal, REPORTS_CREATE)?;
    input.reporter_id = if input.anonymous {
      None
    } else {
      principal.map(|p| p.id)
    };
    self.store.add_report(input).await.map_err(Error::store)
  }

  pub async fn set_report_status(
    &self,
    principal: Option<&Principal>,
    id: Uuid,
    status: ReportStatus,
  ) -> Result<(), Error> {
    self.require(principal, REPORTS_MANAGE)?;
    self
      .store
      .set_report_status(id, status)
      .await
      .map_err(Error::store)
  }

  pub async fn delete_report(
    &self,
    principal: Option<&Principal>,
    id: Uuid,
  ) -> Result<(), Error> {
    self.require(principal, REPORTS_MANAGE)?;
    self.store.delete_report(id).await.map_err(Error::store)
  }

  // ── Visitors ──────────────────────────────────────────────────────────────

  pub async fn check_in_visitor(
    &self,
    principal: Option<&Principal>,
    input: NewVisitor,
  ) -> Result<Visitor, Error> {
    self.require(principal, VISITORS_MANAGE)?;
    self.store.check_in(input).await.map_err(Error::store)
  }

  pub async fn check_out_visitor(
    &self,
    principal: Option<&Principal>,
    id: Uuid,
  ) -> Result<(), Error> {
    self.require(principal, VISITORS_MANAGE)?;
    self.store.check_out(id).await.map_err(Error::store)
  }

  // ── Notices ───────────────────────────────────────────────────────────────

  /// Publish a notice, attributed to the caller.
  pub async fn publish_notice(
    &self,
    principal: Option<&Principal>,
    mut input: NewNotice,
  ) -> Result<Notice, Error> {
    self.require(principal, NOTICES_MANAGE)?;
    input.author_id = principal.map(|p| p.id);
    self.store.add_notice(input).await.map_err(Error::store)
  }

  pub async fn set_notice_active(
    &self,
    principal: Option<&Principal>,
    id: Uuid,
    is_active: bool,
  ) -> Result<(), Error> {
    self.require(principal, NOTICES_MANAGE)?;
    self
      .store
      .set_notice_active(id, is_active)
      .await
      .map_err(Error::store)
  }

  // ── Campaigns ─────────────────────────────────────────────────────────────

  pub async fn schedule_campaign(
    &self,
    principal: Option<&Principal>,
    input: NewCampaign,
  ) -> Result<Campaign, Error> {
    self.require(principal, CAMPAIGNS_MANAGE)?;
    self.store.add_campaign(input).await.map_err(Error::store)
  }

  // ── Emergency alerts ──────────────────────────────────────────────────────

  /// Trigger a live alert, attributed to the caller.
  pub async fn trigger_alert(
    &self,
    principal: Option<&Principal>,
    mut input: NewAlert,
  ) -> Result<EmergencyAlert, Error> {
    self.require(principal, EMERGENCY_TRIGGER)?;
    input.triggered_by = principal.map(|p| p.id);
    self.store.trigger_alert(input).await.map_err(Error::store)
  }

  pub async fn resolve_alert(
    &self,
    principal: Option<&Principal>,
    id: Uuid,
  ) -> Result<(), Error> {
    self.require(principal, EMERGENCY_TRIGGER)?;
    self.store.resolve_alert(id).await.map_err(Error::store)
  }

  // ── Checklist ─────────────────────────────────────────────────────────────

  pub async fn add_checklist_item(
    &self,
    principal: Option<&Principal>,
    input: NewChecklistItem,
  ) -> Result<ChecklistItem, Error> {
    self.require(principal, CHECKLIST_MANAGE)?;
    self
      .store
      .add_checklist_item(input)
      .await
      .map_err(Error::store)
  }

  pub async fn set_checklist_done(
    &self,
    principal: Option<&Principal>,
    id: Uuid,
    done: bool,
  ) -> Result<(), Error> {
    self.require(principal, CHECKLIST_MANAGE)?;
    self.store.set_item_done(id, done).await.map_err(Error::store)
  }

  // ── Drills ────────────────────────────────────────────────────────────────

  pub async fn schedule_drill(
    &self,
    principal: Option<&Principal>,
    input: NewDrill,
  ) -> Result<Drill, Error> {
    self.require(principal, DRILLS_MANAGE)?;
    self.store.add_drill(input).await.map_err(Error::store)
  }

  pub async fn set_drill_status(
    &self,
    principal: Option<&Principal>,
    id: Uuid,
    status: DrillStatus,
  ) -> Result<(), Error> {
    self.require(principal, DRILLS_MANAGE)?;
    self
      .store
      .set_drill_status(id, status)
      .await
      .map_err(Error::store)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  pub async fn set_user_active(
    &self,
    principal: Option<&Principal>,
    id: Uuid,
    is_active: bool,
  ) -> Result<(), Error> {
    self.require(principal, USERS_MANAGE)?;
    self
      .store
      .set_user_active(id, is_active)
      .await
      .map_err(Error::store)
  }
}

#[cfg(test)]
mod tests {
  use vigia_core::{
    principal::Role,
    record::{AlertKind, ReportCategory},
  };
  use vigia_store_sqlite::SqliteStore;

  use super::*;

  async fn actions() -> Actions<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");
    Actions::new(Arc::new(store))
  }

  fn principal(role: Role) -> Principal {
    Principal {
      id:        Uuid::new_v4(),
      name:      "Test".into(),
      email:     "test@school.example".into(),
      role,
      is_active: true,
    }
  }

  fn visitor() -> NewVisitor {
    NewVisitor {
      name:     "Carlos".into(),
      document: None,
      visiting: "Direção".into(),
      reason:   "meeting".into(),
    }
  }

  #[tokio::test]
  async fn student_can_report_but_not_triage() {
    let a = actions().await;
    let student = principal(Role::Student);

    let r = a
      .submit_report(
        Some(&student),
        NewReport::new("Broken lock", ReportCategory::Infrastructure),
      )
      .await
      .unwrap();

    let err = a
      .set_report_status(Some(&student), r.id, ReportStatus::Resolved)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden("reports:manage")));
  }

  #[tokio::test]
  async fn signed_out_caller_is_forbidden() {
    let a = actions().await;
    let err = a
      .submit_report(None, NewReport::new("x", ReportCategory::Other))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden("reports:create")));
  }

  #[tokio::test]
  async fn report_is_attributed_unless_anonymous() {
    let a = actions().await;
    let staff = principal(Role::Staff);

    let named = a
      .submit_report(
        Some(&staff),
        NewReport::new("Named", ReportCategory::Security),
      )
      .await
      .unwrap();
    assert_eq!(named.reporter_id, Some(staff.id));

    let mut input = NewReport::new("Anonymous", ReportCategory::Bullying);
    input.anonymous = true;
    // Even a caller-supplied reporter id must not survive anonymity.
    input.reporter_id = Some(staff.id);
    let anon = a.submit_report(Some(&staff), input).await.unwrap();
    assert!(anon.anonymous);
    assert!(anon.reporter_id.is_none());
  }

  #[tokio::test]
  async fn staff_manages_visitors_but_not_alerts() {
    let a = actions().await;
    let staff = principal(Role::Staff);

    let v = a.check_in_visitor(Some(&staff), visitor()).await.unwrap();
    a.check_out_visitor(Some(&staff), v.id).await.unwrap();

    let err = a
      .trigger_alert(
        Some(&staff),
        NewAlert {
          kind:         AlertKind::Lockdown,
          message:      "nope".into(),
          triggered_by: None,
        },
      )
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden("emergency:trigger")));
  }

  #[tokio::test]
  async fn direction_triggers_and_resolves_alerts_with_attribution() {
    let a = actions().await;
    let direction = principal(Role::Direction);

    let alert = a
      .trigger_alert(
        Some(&direction),
        NewAlert {
          kind:         AlertKind::Evacuation,
          message:      "Evacuate block B".into(),
          triggered_by: None,
        },
      )
      .await
      .unwrap();
    assert_eq!(alert.triggered_by, Some(direction.id));

    a.resolve_alert(Some(&direction), alert.id).await.unwrap();
  }

  #[tokio::test]
  async fn notice_author_is_the_caller() {
    let a = actions().await;
    let staff = principal(Role::Staff);

    let notice = a
      .publish_notice(
        Some(&staff),
        NewNotice {
          title:     "Gate closes at 19h".into(),
          body:      String::new(),
          priority:  vigia_core::record::Priority::Medium,
          author_id: None,
        },
      )
      .await
      .unwrap();
    assert_eq!(notice.author_id, Some(staff.id));
  }

  #[tokio::test]
  async fn inactive_principal_is_forbidden_everywhere() {
    let a = actions().await;
    let mut direction = principal(Role::Direction);
    direction.is_active = false;

    let err = a
      .submit_report(
        Some(&direction),
        NewReport::new("x", ReportCategory::Other),
      )
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[tokio::test]
  async fn store_failures_surface_as_store_errors() {
    let a = actions().await;
    let direction = principal(Role::Direction);

    let err = a
      .check_out_visitor(Some(&direction), Uuid::new_v4())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
  }

  #[tokio::test]
  async fn only_direction_deletes_reports() {
    let a = actions().await;
    let staff = principal(Role::Staff);
    let direction = principal(Role::Direction);

    let r = a
      .submit_report(
        Some(&staff),
        NewReport::new("To delete", ReportCategory::Other),
      )
      .await
      .unwrap();

    let err = a.delete_report(Some(&staff), r.id).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden("reports:manage")));

    a.delete_report(Some(&direction), r.id).await.unwrap();
  }
}
