//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;
use vigia_core::{
  principal::{NewProfile, Role},
  record::{
    AlertKind, Collection, DrillStatus, NewAlert, NewCampaign,
    NewChecklistItem, NewDrill, NewNotice, NewReport, NewVisitor, Priority,
    ReportCategory, ReportStatus, VisitorStatus,
  },
  store::{ProfileSource, SafetyStore},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn profile(name: &str, email: &str, role: Role) -> NewProfile {
  NewProfile {
    name:      name.into(),
    email:     email.into(),
    role,
    is_active: true,
  }
}

fn report(title: &str) -> NewReport {
  NewReport::new(title, ReportCategory::Security)
}

fn visitor(name: &str) -> NewVisitor {
  NewVisitor {
    name:     name.into(),
    document: Some("12.345.678-9".into()),
    visiting: "Direção".into(),
    reason:   "meeting".into(),
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_user_and_get_profile_by_email() {
  let s = store().await;

  let created = s
    .add_user(profile("Ana Souza", "ana@school.example", Role::Staff))
    .await
    .unwrap();
  assert_eq!(created.role, Role::Staff);
  assert!(created.is_active);

  let fetched = s.get_profile("ana@school.example").await.unwrap();
  let fetched = fetched.expect("profile exists");
  assert_eq!(fetched.id, created.id);
  assert_eq!(fetched.name, "Ana Souza");
}

#[tokio::test]
async fn get_profile_missing_returns_none() {
  let s = store().await;
  let result = s.get_profile("nobody@school.example").await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn deactivated_user_round_trips_inactive() {
  let s = store().await;
  let created = s
    .add_user(profile("Bruno", "bruno@school.example", Role::Student))
    .await
    .unwrap();

  s.set_user_active(created.id, false).await.unwrap();

  let fetched = s.get_profile("bruno@school.example").await.unwrap().unwrap();
  assert!(!fetched.is_active);
}

#[tokio::test]
async fn set_user_active_missing_errors() {
  let s = store().await;
  let err = s.set_user_active(Uuid::new_v4(), false).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(vigia_core::Error::UserNotFound(_))
  ));
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_report_starts_pending() {
  let s = store().await;
  let r = s.add_report(report("Broken gate lock")).await.unwrap();
  assert_eq!(r.status, ReportStatus::Pending);

  let all = s.list_reports().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].id, r.id);
}

#[tokio::test]
async fn report_status_transitions_persist() {
  let s = store().await;
  let r = s.add_report(report("Smoke in lab")).await.unwrap();

  s.set_report_status(r.id, ReportStatus::InReview).await.unwrap();
  s.set_report_status(r.id, ReportStatus::Resolved).await.unwrap();

  let all = s.list_reports().await.unwrap();
  assert_eq!(all[0].status, ReportStatus::Resolved);
}

#[tokio::test]
async fn delete_report_removes_it() {
  let s = store().await;
  let r = s.add_report(report("Duplicate entry")).await.unwrap();

  s.delete_report(r.id).await.unwrap();
  assert!(s.list_reports().await.unwrap().is_empty());

  let err = s.delete_report(r.id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(vigia_core::Error::RecordNotFound(_))
  ));
}

#[tokio::test]
async fn anonymous_report_keeps_no_reporter() {
  let s = store().await;
  let mut input = report("Bullying in hallway");
  input.category = ReportCategory::Bullying;
  input.anonymous = true;
  input.priority = Priority::High;

  let r = s.add_report(input).await.unwrap();
  assert!(r.anonymous);
  assert!(r.reporter_id.is_none());

  let stored = &s.list_reports().await.unwrap()[0];
  assert!(stored.anonymous);
  assert_eq!(stored.priority, Priority::High);
}

// ─── Visitors ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn check_in_then_out() {
  let s = store().await;
  let v = s.check_in(visitor("Carlos Lima")).await.unwrap();
  assert_eq!(v.status, VisitorStatus::CheckedIn);
  assert!(v.checked_out_at.is_none());

  s.check_out(v.id).await.unwrap();

  let stored = &s.list_visitors().await.unwrap()[0];
  assert_eq!(stored.status, VisitorStatus::CheckedOut);
  assert!(stored.checked_out_at.is_some());
}

#[tokio::test]
async fn double_check_out_errors() {
  let s = store().await;
  let v = s.check_in(visitor("Dora")).await.unwrap();
  s.check_out(v.id).await.unwrap();

  let err = s.check_out(v.id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(vigia_core::Error::AlreadyCheckedOut(_))
  ));
}

#[tokio::test]
async fn check_out_missing_visitor_errors() {
  let s = store().await;
  let err = s.check_out(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(vigia_core::Error::RecordNotFound(_))
  ));
}

// ─── Notices ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_active_notices_are_listed() {
  let s = store().await;
  let kept = s
    .add_notice(NewNotice {
      title:     "Gate closes at 19h".into(),
      body:      "New winter schedule.".into(),
      priority:  Priority::Medium,
      author_id: None,
    })
    .await
    .unwrap();
  let hidden = s
    .add_notice(NewNotice {
      title:     "Old notice".into(),
      body:      "".into(),
      priority:  Priority::Low,
      author_id: None,
    })
    .await
    .unwrap();

  s.set_notice_active(hidden.id, false).await.unwrap();

  let active = s.list_active_notices().await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].id, kept.id);
}

// ─── Campaigns ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn upcoming_campaigns_filter_and_order() {
  let s = store().await;
  let today = Utc::now().date_naive();

  let past = today - Duration::days(10);
  let soon = today + Duration::days(3);
  let later = today + Duration::days(30);

  for (title, date) in
    [("Past", past), ("Later", later), ("Soon", soon), ("Today", today)]
  {
    s.add_campaign(NewCampaign {
      title:          title.into(),
      description:    String::new(),
      scheduled_date: date,
    })
    .await
    .unwrap();
  }

  let upcoming = s.list_upcoming_campaigns(today).await.unwrap();
  let titles: Vec<_> = upcoming.iter().map(|c| c.title.as_str()).collect();
  assert_eq!(titles, ["Today", "Soon", "Later"]);
}

#[tokio::test]
async fn campaign_date_survives_round_trip() {
  let s = store().await;
  let date = NaiveDate::from_ymd_opt(2031, 6, 15).unwrap();
  s.add_campaign(NewCampaign {
    title:          "Fire safety week".into(),
    description:    "Annual awareness campaign.".into(),
    scheduled_date: date,
  })
  .await
  .unwrap();

  let upcoming = s.list_upcoming_campaigns(date).await.unwrap();
  assert_eq!(upcoming[0].scheduled_date, date);
}

// ─── Emergency alerts ────────────────────────────────────────────────────────

#[tokio::test]
async fn trigger_and_resolve_alert() {
  let s = store().await;
  let a = s
    .trigger_alert(NewAlert {
      kind:         AlertKind::Lockdown,
      message:      "Drill in progress".into(),
      triggered_by: None,
    })
    .await
    .unwrap();
  assert!(a.is_active);
  assert_eq!(s.list_active_alerts().await.unwrap().len(), 1);

  s.resolve_alert(a.id).await.unwrap();
  assert!(s.list_active_alerts().await.unwrap().is_empty());

  let err = s.resolve_alert(a.id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(vigia_core::Error::AlreadyResolved(_))
  ));
}

// ─── Checklist ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn checklist_done_flag_updates() {
  let s = store().await;
  let item = s
    .add_checklist_item(NewChecklistItem {
      label: "Extinguisher pressure".into(),
      area:  "lab".into(),
    })
    .await
    .unwrap();
  assert!(!item.done);

  s.set_item_done(item.id, true).await.unwrap();

  let listed = s.list_checklist().await.unwrap();
  assert!(listed[0].done);
  assert!(listed[0].updated_at >= item.updated_at);
}

// ─── Drills ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn drills_start_scheduled_and_transition() {
  let s = store().await;
  let d = s
    .add_drill(NewDrill {
      title:          "Evacuation drill".into(),
      kind:           AlertKind::Evacuation,
      scheduled_date: Utc::now().date_naive(),
    })
    .await
    .unwrap();
  assert_eq!(d.status, DrillStatus::Scheduled);

  s.set_drill_status(d.id, DrillStatus::Completed).await.unwrap();
  assert_eq!(s.list_drills().await.unwrap()[0].status, DrillStatus::Completed);
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn writes_publish_their_collection_tag() {
  let s = store().await;
  let mut changes = s.changes();

  s.add_report(report("First")).await.unwrap();
  assert_eq!(changes.recv().await.unwrap(), Collection::Reports);

  let v = s.check_in(visitor("Eva")).await.unwrap();
  assert_eq!(changes.recv().await.unwrap(), Collection::Visitors);

  s.check_out(v.id).await.unwrap();
  assert_eq!(changes.recv().await.unwrap(), Collection::Visitors);
}

#[tokio::test]
async fn failed_writes_publish_nothing() {
  let s = store().await;
  let mut changes = s.changes();

  s.set_report_status(Uuid::new_v4(), ReportStatus::Resolved)
    .await
    .unwrap_err();

  // A successful write afterwards must be the first thing observed.
  s.add_report(report("Only published write")).await.unwrap();
  assert_eq!(changes.recv().await.unwrap(), Collection::Reports);
}
