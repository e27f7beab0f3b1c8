//! The `SafetyStore` trait — the boundary to the managed record store.
//!
//! The trait is implemented by storage backends (e.g. `vigia-store-sqlite`).
//! Higher layers (`vigia-app`, `vigia-cli`) depend on this abstraction, not
//! on any concrete backend.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes. Reads that back live feeds are filtered by
//! static predicates (`is_active`, `scheduled_date >= today`); the filters
//! live here, on the boundary, so every consumer sees the same projection.

use std::future::Future;

use chrono::NaiveDate;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  principal::{NewProfile, Profile},
  record::{
    Campaign, ChecklistItem, Collection, Drill, DrillStatus, EmergencyAlert,
    NewAlert, NewCampaign, NewChecklistItem, NewDrill, NewNotice, NewReport,
    NewVisitor, Notice, Report, ReportStatus, Visitor,
  },
};

/// The one corner of the store the session layer needs: resolving a
/// provider identity to a stored profile. Split out so session code (and
/// its tests) does not have to carry the whole [`SafetyStore`] surface.
pub trait ProfileSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up the stored profile for a provider identity (email).
  /// Returns `None` if no profile exists.
  fn get_profile<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;
}

/// Abstraction over a Vigia record-store backend.
///
/// Mutations are independent single-record writes; no cross-collection
/// transaction is attempted. Every successful write publishes its
/// [`Collection`] tag on the change feed after commit, which is how live
/// feeds learn to re-query.
pub trait SafetyStore: ProfileSource {
  // ── Change feed ───────────────────────────────────────────────────────

  /// Subscribe to write notifications. Each successful write sends the tag
  /// of the collection it touched. Receivers that fall behind may observe
  /// `Lagged`; the correct recovery is to re-query, not to replay.
  fn changes(&self) -> broadcast::Receiver<Collection>;

  // ── Users / profiles ──────────────────────────────────────────────────

  /// Create and persist a profile. The store assigns id and timestamp.
  fn add_user(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// List all profiles, newest first.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Activate or deactivate an account.
  fn set_user_active(
    &self,
    id: Uuid,
    is_active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Persist a new report with `Pending` status.
  fn add_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  /// All reports, newest first.
  fn list_reports(
    &self,
  ) -> impl Future<Output = Result<Vec<Report>, Self::Error>> + Send + '_;

  /// Move a report through its lifecycle.
  fn set_report_status(
    &self,
    id: Uuid,
    status: ReportStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Hard-delete a report. Explicit admin action only; no other flow
  /// removes records.
  fn delete_report(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Visitors ──────────────────────────────────────────────────────────

  /// Register a visitor as checked in now.
  fn check_in(
    &self,
    input: NewVisitor,
  ) -> impl Future<Output = Result<Visitor, Self::Error>> + Send + '_;

  /// All visitor records, most recent check-in first.
  fn list_visitors(
    &self,
  ) -> impl Future<Output = Result<Vec<Visitor>, Self::Error>> + Send + '_;

  /// Mark a visitor as checked out now. Errors if already checked out.
  fn check_out(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Notices ───────────────────────────────────────────────────────────

  /// Publish a notice (created active).
  fn add_notice(
    &self,
    input: NewNotice,
  ) -> impl Future<Output = Result<Notice, Self::Error>> + Send + '_;

  /// Active notices only, newest first — the live-feed projection.
  fn list_active_notices(
    &self,
  ) -> impl Future<Output = Result<Vec<Notice>, Self::Error>> + Send + '_;

  fn set_notice_active(
    &self,
    id: Uuid,
    is_active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Campaigns ─────────────────────────────────────────────────────────

  /// Schedule a campaign (created active).
  fn add_campaign(
    &self,
    input: NewCampaign,
  ) -> impl Future<Output = Result<Campaign, Self::Error>> + Send + '_;

  /// Active campaigns with `scheduled_date >= today`, soonest first — the
  /// live-feed projection.
  fn list_upcoming_campaigns(
    &self,
    today: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Campaign>, Self::Error>> + Send + '_;

  // ── Emergency alerts ──────────────────────────────────────────────────

  /// Raise an alert (created active).
  fn trigger_alert(
    &self,
    input: NewAlert,
  ) -> impl Future<Output = Result<EmergencyAlert, Self::Error>> + Send + '_;

  /// Currently active alerts, newest first.
  fn list_active_alerts(
    &self,
  ) -> impl Future<Output = Result<Vec<EmergencyAlert>, Self::Error>> + Send + '_;

  /// Stand down an alert. Errors if already resolved.
  fn resolve_alert(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Safety checklist ──────────────────────────────────────────────────

  fn add_checklist_item(
    &self,
    input: NewChecklistItem,
  ) -> impl Future<Output = Result<ChecklistItem, Self::Error>> + Send + '_;

  fn list_checklist(
    &self,
  ) -> impl Future<Output = Result<Vec<ChecklistItem>, Self::Error>> + Send + '_;

  fn set_item_done(
    &self,
    id: Uuid,
    done: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Drills ────────────────────────────────────────────────────────────

  fn add_drill(
    &self,
    input: NewDrill,
  ) -> impl Future<Output = Result<Drill, Self::Error>> + Send + '_;

  /// All drills, soonest scheduled first.
  fn list_drills(
    &self,
  ) -> impl Future<Output = Result<Vec<Drill>, Self::Error>> + Send + '_;

  fn set_drill_status(
    &self,
    id: Uuid,
    status: DrillStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
