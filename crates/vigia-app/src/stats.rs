//! Dashboard stats reducer.
//!
//! A pure fold over the current feed snapshots. Feeds contribute
//! independently, so the result never depends on the order snapshots
//! arrived in, and a feed that is errored or not yet live simply counts as
//! empty. No cross-feed consistency is attempted.

use vigia_core::{
  principal::Profile,
  record::{
    Campaign, EmergencyAlert, Notice, Report, ReportStatus, Visitor,
    VisitorStatus,
  },
};

use crate::feed::{FeedPhase, FeedState};

/// The headline numbers on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
  pub total_reports:      usize,
  pub pending_reports:    usize,
  pub resolved_reports:   usize,
  pub active_visitors:    usize,
  pub active_notices:     usize,
  pub upcoming_campaigns: usize,
  pub active_alerts:      usize,
  pub total_users:        usize,
}

/// A snapshot only counts while its feed is live.
fn live<T>(state: &FeedState<T>) -> &[T] {
  match state.phase {
    FeedPhase::Live => &state.records,
    _ => &[],
  }
}

impl DashboardStats {
  pub fn reduce(
    reports: &FeedState<Report>,
    visitors: &FeedState<Visitor>,
    notices: &FeedState<Notice>,
    campaigns: &FeedState<Campaign>,
    alerts: &FeedState<EmergencyAlert>,
    users: &FeedState<Profile>,
  ) -> Self {
    let reports = live(reports);
    Self {
      total_reports:      reports.len(),
      pending_reports:    reports
        .iter()
        .filter(|r| r.status == ReportStatus::Pending)
        .count(),
      resolved_reports:   reports
        .iter()
        .filter(|r| r.status == ReportStatus::Resolved)
        .count(),
      active_visitors:    live(visitors)
        .iter()
        .filter(|v| v.status == VisitorStatus::CheckedIn)
        .count(),
      active_notices:     live(notices).len(),
      upcoming_campaigns: live(campaigns).len(),
      active_alerts:      live(alerts).len(),
      total_users:        live(users).len(),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;
  use vigia_core::record::{Priority, ReportCategory};

  use super::*;

  fn live_state<T>(records: Vec<T>) -> FeedState<T> {
    FeedState { phase: FeedPhase::Live, records, error: None }
  }

  fn errored<T>() -> FeedState<T> {
    FeedState {
      phase:   FeedPhase::Error,
      records: Vec::new(),
      error:   Some("backend unavailable".into()),
    }
  }

  fn report(status: ReportStatus) -> Report {
    Report {
      id: Uuid::new_v4(),
      title: "r".into(),
      description: String::new(),
      category: ReportCategory::Security,
      priority: Priority::Medium,
      status,
      anonymous: false,
      reporter_id: None,
      created_at: Utc::now(),
    }
  }

  fn visitor(status: VisitorStatus) -> Visitor {
    Visitor {
      id: Uuid::new_v4(),
      name: "v".into(),
      document: None,
      visiting: "Direção".into(),
      reason: "meeting".into(),
      status,
      checked_in_at: Utc::now(),
      checked_out_at: match status {
        VisitorStatus::CheckedIn => None,
        VisitorStatus::CheckedOut => Some(Utc::now()),
      },
    }
  }

  #[test]
  fn counts_reports_by_status_and_visitors_on_site() {
    let reports = live_state(vec![
      report(ReportStatus::Pending),
      report(ReportStatus::Pending),
      report(ReportStatus::Pending),
      report(ReportStatus::Resolved),
      report(ReportStatus::Resolved),
    ]);
    let visitors = live_state(vec![
      visitor(VisitorStatus::CheckedIn),
      visitor(VisitorStatus::CheckedOut),
    ]);

    let stats = DashboardStats::reduce(
      &reports,
      &visitors,
      &live_state(vec![]),
      &live_state(vec![]),
      &live_state(vec![]),
      &live_state(vec![]),
    );

    assert_eq!(stats.total_reports, 5);
    assert_eq!(stats.pending_reports, 3);
    assert_eq!(stats.resolved_reports, 2);
    assert_eq!(stats.active_visitors, 1);
  }

  #[test]
  fn errored_feed_contributes_zero_without_affecting_siblings() {
    let reports = live_state(vec![
      report(ReportStatus::Pending),
      report(ReportStatus::InReview),
    ]);

    let stats = DashboardStats::reduce(
      &reports,
      &errored(),
      &live_state(vec![]),
      &live_state(vec![]),
      &live_state(vec![]),
      &live_state(vec![]),
    );

    assert_eq!(stats.active_visitors, 0);
    assert_eq!(stats.total_reports, 2);
    assert_eq!(stats.pending_reports, 1);
  }

  #[test]
  fn not_yet_live_feed_counts_as_empty() {
    let pending: FeedState<Visitor> = FeedState {
      phase:   FeedPhase::Subscribing,
      records: vec![visitor(VisitorStatus::CheckedIn)],
      error:   None,
    };

    let stats = DashboardStats::reduce(
      &live_state(vec![]),
      &pending,
      &live_state(vec![]),
      &live_state(vec![]),
      &live_state(vec![]),
      &live_state(vec![]),
    );
    assert_eq!(stats.active_visitors, 0);
  }

  #[test]
  fn reduce_is_a_pure_function_of_the_snapshots() {
    let reports = live_state(vec![report(ReportStatus::Pending)]);
    let visitors = live_state(vec![visitor(VisitorStatus::CheckedIn)]);
    let empty_n = live_state(vec![]);
    let empty_c = live_state(vec![]);
    let empty_a = live_state(vec![]);
    let empty_u = live_state(vec![]);

    let a = DashboardStats::reduce(
      &reports, &visitors, &empty_n, &empty_c, &empty_a, &empty_u,
    );
    let b = DashboardStats::reduce(
      &reports, &visitors, &empty_n, &empty_c, &empty_a, &empty_u,
    );
    assert_eq!(a, b);
  }
}
