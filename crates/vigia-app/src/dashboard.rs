//! The role-aware dashboard: one live feed per collection plus the stats
//! reducer over their latest snapshots.
//!
//! Every role sees the same broad data set; the only gated feed is the user
//! roster, which stays empty without `users:manage`. Row-level filtering is
//! a rendering concern left to the consumer.

use std::sync::Arc;

use chrono::Utc;
use vigia_core::{
  permission::{self, Access},
  principal::{Principal, Profile},
  record::{Campaign, ChecklistItem, Drill, EmergencyAlert, Notice, Report, Visitor},
  store::SafetyStore,
};

use crate::{
  feed::{Feed, FeedState, Feeds},
  stats::DashboardStats,
};

/// All feeds a signed-in dashboard holds. Dropping it tears every feed down.
pub struct Dashboard<S> {
  store:          Arc<S>,
  principal:      Option<Principal>,
  roster_visible: bool,
  reports:   Feed<Report>,
  visitors:  Feed<Visitor>,
  notices:   Feed<Notice>,
  campaigns: Feed<Campaign>,
  alerts:    Feed<EmergencyAlert>,
  checklist: Feed<ChecklistItem>,
  drills:    Feed<Drill>,
  users:     Feed<Profile>,
}

impl<S> Dashboard<S>
where
  S: SafetyStore + Send + Sync + 'static,
{
  /// Establish all feeds for the given principal. `None` is a signed-out
  /// viewer, who still sees the public collections but never the roster.
  pub fn establish(store: Arc<S>, principal: Option<Principal>) -> Self {
    let feeds = Feeds::new(Arc::clone(&store));
    let roster_visible = permission::allows(
      principal.as_ref(),
      &Access::Can(permission::USERS_MANAGE),
    );
    let users = feeds.subscribe_users(principal.as_ref());
    Self {
      roster_visible,
      reports: feeds.subscribe_reports(),
      visitors: feeds.subscribe_visitors(),
      notices: feeds.subscribe_notices(),
      campaigns: feeds.subscribe_campaigns(),
      alerts: feeds.subscribe_alerts(),
      checklist: feeds.subscribe_checklist(),
      drills: feeds.subscribe_drills(),
      users,
      store,
      principal,
    }
  }

  pub fn reports(&self) -> &Feed<Report> {
    &self.reports
  }

  pub fn visitors(&self) -> &Feed<Visitor> {
    &self.visitors
  }

  pub fn notices(&self) -> &Feed<Notice> {
    &self.notices
  }

  pub fn campaigns(&self) -> &Feed<Campaign> {
    &self.campaigns
  }

  pub fn alerts(&self) -> &Feed<EmergencyAlert> {
    &self.alerts
  }

  pub fn checklist(&self) -> &Feed<ChecklistItem> {
    &self.checklist
  }

  pub fn drills(&self) -> &Feed<Drill> {
    &self.drills
  }

  /// The roster feed; empty unless the principal holds `users:manage`.
  pub fn users(&self) -> &Feed<Profile> {
    &self.users
  }

  /// Headline numbers from the latest feed snapshots.
  pub fn stats(&self) -> DashboardStats {
    DashboardStats::reduce(
      &self.reports.state(),
      &self.visitors.state(),
      &self.notices.state(),
      &self.campaigns.state(),
      &self.alerts.state(),
      &self.users.state(),
    )
  }

  /// One-shot refresh: read every collection concurrently and reduce. A
  /// failed read degrades that collection to empty instead of failing the
  /// whole snapshot.
  pub async fn snapshot(&self) -> DashboardStats {
    let today = Utc::now().date_naive();
    let roster_visible = self.roster_visible;

    let (reports, visitors, notices, campaigns, alerts, users) = tokio::join!(
      self.store.list_reports(),
      self.store.list_visitors(),
      self.store.list_active_notices(),
      self.store.list_upcoming_campaigns(today),
      self.store.list_active_alerts(),
      async {
        if roster_visible {
          self.store.list_users().await
        } else {
          Ok(Vec::new())
        }
      },
    );

    DashboardStats::reduce(
      &degrade("reports", reports),
      &degrade("visitors", visitors),
      &degrade("notices", notices),
      &degrade("campaigns", campaigns),
      &degrade("alerts", alerts),
      &degrade("users", users),
    )
  }

  pub fn principal(&self) -> Option<&Principal> {
    self.principal.as_ref()
  }
}

fn degrade<T, E>(collection: &str, result: Result<Vec<T>, E>) -> FeedState<T>
where
  E: std::error::Error,
{
  let records = result.unwrap_or_else(|e| {
    tracing::warn!(collection, error = %e, "dashboard read failed");
    Vec::new()
  });
  FeedState {
    phase: crate::feed::FeedPhase::Live,
    records,
    error: None,
  }
}
