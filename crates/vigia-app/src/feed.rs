//! Live collection feeds.
//!
//! A [`Feed`] mirrors one store collection as an always-current snapshot: it
//! runs the query once on establishment, then re-runs it whenever the store
//! publishes a change tag for that collection. Every refresh replaces the
//! snapshot wholesale; consumers never see partial merges.
//!
//! A feed whose query fails parks in [`FeedPhase::Error`] and stays there.
//! Recovery is re-establishment by the owner, not silent retry.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use vigia_core::{
  permission::{self, Access},
  principal::{Principal, Profile},
  record::{
    Campaign, ChecklistItem, Collection, Drill, EmergencyAlert, Notice,
    Report, Visitor,
  },
  store::SafetyStore,
};

/// Boxed error from a feed query closure.
pub type QueryError = Box<dyn std::error::Error + Send + Sync>;

// ─── Feed state ──────────────────────────────────────────────────────────────

/// Where a feed is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
  /// Constructed but not yet established.
  #[default]
  Idle,
  /// Establishment started, first snapshot not yet loaded.
  Subscribing,
  /// Snapshot loaded and tracking changes.
  Live,
  /// A query failed. Terminal until the owner re-establishes the feed.
  Error,
  /// The feed was torn down. Terminal.
  Unsubscribed,
}

/// A feed's phase together with its current snapshot.
#[derive(Debug, Clone)]
pub struct FeedState<T> {
  pub phase:   FeedPhase,
  pub records: Vec<T>,
  pub error:   Option<String>,
}

impl<T> FeedState<T> {
  fn new(phase: FeedPhase) -> Self {
    Self { phase, records: Vec::new(), error: None }
  }
}

impl<T> Default for FeedState<T> {
  fn default() -> Self {
    Self::new(FeedPhase::Idle)
  }
}

struct FeedShared<T> {
  alive: AtomicBool,
  state: watch::Sender<FeedState<T>>,
}

impl<T> FeedShared<T> {
  /// Publish unless the feed has been torn down in the meantime. A refresh
  /// that completes after teardown must not resurrect the feed.
  fn commit(&self, next: FeedState<T>) {
    if !self.alive.load(Ordering::SeqCst) {
      return;
    }
    self.state.send_replace(next);
  }
}

// ─── Feed ────────────────────────────────────────────────────────────────────

/// A live view over one store collection. The handle is the subscription:
/// dropping it aborts the refresh task and subscribers observe
/// [`FeedPhase::Unsubscribed`].
pub struct Feed<T> {
  shared: Arc<FeedShared<T>>,
  task:   Option<tokio::task::JoinHandle<()>>,
}

impl<T> Feed<T>
where
  T: Clone + Send + Sync + 'static,
{
  /// A feed that never touches the store and reads as an empty live
  /// snapshot. Handed out where the caller lacks permission for the
  /// underlying collection.
  pub fn empty() -> Self {
    let (state, _) = watch::channel(FeedState::new(FeedPhase::Live));
    Self {
      shared: Arc::new(FeedShared { alive: AtomicBool::new(true), state }),
      task:   None,
    }
  }

  /// Establish a live feed over `collection`, refreshed by `query`.
  ///
  /// `query` is the full filtered read for the collection; it runs once
  /// immediately and again on every change tag matching `collection`.
  pub fn establish<S, Q, F>(
    store: Arc<S>,
    collection: Collection,
    query: Q,
  ) -> Self
  where
    S: SafetyStore + Send + Sync + 'static,
    Q: Fn(Arc<S>) -> F + Send + Sync + 'static,
    F: Future<Output = Result<Vec<T>, QueryError>> + Send + 'static,
  {
    let (state, _) = watch::channel(FeedState::new(FeedPhase::Subscribing));
    let shared = Arc::new(FeedShared { alive: AtomicBool::new(true), state });

    let task =
      tokio::spawn(Self::run(Arc::clone(&shared), store, collection, query));

    Self { shared, task: Some(task) }
  }

  async fn run<S, Q, F>(
    shared: Arc<FeedShared<T>>,
    store: Arc<S>,
    collection: Collection,
    query: Q,
  ) where
    S: SafetyStore + Send + Sync + 'static,
    Q: Fn(Arc<S>) -> F + Send + Sync + 'static,
    F: Future<Output = Result<Vec<T>, QueryError>> + Send,
  {
    // Subscribe before the initial load so no change slips between them.
    let mut changes = store.changes();

    if !Self::refresh(&shared, &store, collection, &query).await {
      return;
    }

    loop {
      match changes.recv().await {
        Ok(tag) if tag == collection => {
          if !Self::refresh(&shared, &store, collection, &query).await {
            return;
          }
        }
        Ok(_) => {}
        // Missed tags are indistinguishable from a matching one, so reload.
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          tracing::debug!(?collection, skipped, "feed lagged, reloading");
          if !Self::refresh(&shared, &store, collection, &query).await {
            return;
          }
        }
        Err(broadcast::error::RecvError::Closed) => return,
      }
    }
  }

  /// Re-run the query and publish. Returns false when the feed should stop.
  async fn refresh<S, Q, F>(
    shared: &Arc<FeedShared<T>>,
    store: &Arc<S>,
    collection: Collection,
    query: &Q,
  ) -> bool
  where
    S: SafetyStore + Send + Sync + 'static,
    Q: Fn(Arc<S>) -> F + Send + Sync + 'static,
    F: Future<Output = Result<Vec<T>, QueryError>> + Send,
  {
    match query(Arc::clone(store)).await {
      Ok(records) => {
        shared.commit(FeedState {
          phase: FeedPhase::Live,
          records,
          error: None,
        });
        true
      }
      Err(e) => {
        tracing::warn!(?collection, error = %e, "feed query failed");
        shared.commit(FeedState {
          phase:   FeedPhase::Error,
          records: Vec::new(),
          error:   Some(e.to_string()),
        });
        false
      }
    }
  }

  /// Observe the feed. The receiver always holds the latest snapshot.
  pub fn subscribe(&self) -> watch::Receiver<FeedState<T>> {
    self.shared.state.subscribe()
  }

  /// The current snapshot.
  pub fn state(&self) -> FeedState<T> {
    self.shared.state.borrow().clone()
  }

  pub fn phase(&self) -> FeedPhase {
    self.shared.state.borrow().phase
  }

  /// The current records, regardless of phase.
  pub fn records(&self) -> Vec<T> {
    self.shared.state.borrow().records.clone()
  }
}

impl<T> Drop for Feed<T> {
  fn drop(&mut self) {
    // Order matters: flip alive first so an in-flight refresh cannot land
    // after the Unsubscribed marker.
    self.shared.alive.store(false, Ordering::SeqCst);
    self.shared.state.send_modify(|state| {
      state.phase = FeedPhase::Unsubscribed;
    });
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

// ─── Feeds facade ────────────────────────────────────────────────────────────

/// Constructs the per-collection feeds over a shared store handle.
pub struct Feeds<S> {
  store: Arc<S>,
}

impl<S> Feeds<S>
where
  S: SafetyStore + Send + Sync + 'static,
  S::Error: Send + Sync + 'static,
{
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  pub fn subscribe_reports(&self) -> Feed<Report> {
    Feed::establish(
      Arc::clone(&self.store),
      Collection::Reports,
      |s| async move { s.list_reports().await.map_err(QueryError::from) },
    )
  }

  pub fn subscribe_visitors(&self) -> Feed<Visitor> {
    Feed::establish(
      Arc::clone(&self.store),
      Collection::Visitors,
      |s| async move { s.list_visitors().await.map_err(QueryError::from) },
    )
  }

  pub fn subscribe_notices(&self) -> Feed<Notice> {
    Feed::establish(Arc::clone(&self.store), Collection::Notices, |s| {
      async move { s.list_active_notices().await.map_err(QueryError::from) }
    })
  }

  pub fn subscribe_campaigns(&self) -> Feed<Campaign> {
    Feed::establish(Arc::clone(&self.store), Collection::Campaigns, |s| {
      async move {
        let today = Utc::now().date_naive();
        s.list_upcoming_campaigns(today).await.map_err(QueryError::from)
      }
    })
  }

  pub fn subscribe_alerts(&self) -> Feed<EmergencyAlert> {
    Feed::establish(
      Arc::clone(&self.store),
      Collection::EmergencyAlerts,
      |s| async move {
        s.list_active_alerts().await.map_err(QueryError::from)
      },
    )
  }

  pub fn subscribe_checklist(&self) -> Feed<ChecklistItem> {
    Feed::establish(Arc::clone(&self.store), Collection::Checklist, |s| {
      async move { s.list_checklist().await.map_err(QueryError::from) }
    })
  }

  pub fn subscribe_drills(&self) -> Feed<Drill> {
    Feed::establish(
      Arc::clone(&self.store),
      Collection::Drills,
      |s| async move { s.list_drills().await.map_err(QueryError::from) },
    )
  }

  /// The one permission-gated feed: the user roster is visible only to
  /// principals holding `users:manage`. Everyone else gets an empty live
  /// feed and the store is never queried.
  pub fn subscribe_users(&self, principal: Option<&Principal>) -> Feed<Profile> {
    if !permission::allows(principal, &Access::Can(permission::USERS_MANAGE)) {
      return Feed::empty();
    }
    Feed::establish(
      Arc::clone(&self.store),
      Collection::Users,
      |s| async move { s.list_users().await.map_err(QueryError::from) },
    )
  }
}

#[cfg(test)]
mod tests {
  use vigia_core::{
    principal::{NewProfile, Role},
    record::{NewNotice, NewReport, Priority, ReportCategory},
  };
  use vigia_store_sqlite::SqliteStore;

  use super::*;

  async fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"))
  }

  fn principal(role: Role) -> Principal {
    Principal {
      id:        uuid::Uuid::new_v4(),
      name:      "Test".into(),
      email:     "test@school.example".into(),
      role,
      is_active: true,
    }
  }

  async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<FeedState<T>>,
    len: usize,
  ) -> FeedState<T> {
    loop {
      {
        let state = rx.borrow_and_update();
        if state.records.len() == len && state.phase == FeedPhase::Live {
          return state.clone();
        }
      }
      rx.changed().await.expect("feed task alive");
    }
  }

  #[tokio::test]
  async fn feed_loads_initial_snapshot() {
    let s = store().await;
    s.add_report(NewReport::new("Existing", ReportCategory::Security))
      .await
      .unwrap();

    let feed = Feeds::new(Arc::clone(&s)).subscribe_reports();
    let mut rx = feed.subscribe();
    let state = wait_for(&mut rx, 1).await;
    assert_eq!(state.records[0].title, "Existing");
    assert!(state.error.is_none());
  }

  #[tokio::test]
  async fn feed_replaces_snapshot_on_change() {
    let s = store().await;
    let feed = Feeds::new(Arc::clone(&s)).subscribe_reports();
    let mut rx = feed.subscribe();
    wait_for(&mut rx, 0).await;

    s.add_report(NewReport::new("First", ReportCategory::Infrastructure))
      .await
      .unwrap();
    wait_for(&mut rx, 1).await;

    s.add_report(NewReport::new("Second", ReportCategory::Other))
      .await
      .unwrap();
    let state = wait_for(&mut rx, 2).await;
    assert_eq!(state.phase, FeedPhase::Live);
  }

  #[tokio::test]
  async fn feed_ignores_other_collections() {
    let s = store().await;
    let feed = Feeds::new(Arc::clone(&s)).subscribe_reports();
    let mut rx = feed.subscribe();
    wait_for(&mut rx, 0).await;

    s.add_notice(NewNotice {
      title:     "Unrelated".into(),
      body:      String::new(),
      priority:  Priority::Low,
      author_id: None,
    })
    .await
    .unwrap();

    // The notice write must not disturb the reports snapshot.
    s.add_report(NewReport::new("Only report", ReportCategory::Security))
      .await
      .unwrap();
    let state = wait_for(&mut rx, 1).await;
    assert_eq!(state.records[0].title, "Only report");
  }

  #[tokio::test]
  async fn dropping_feed_marks_unsubscribed() {
    let s = store().await;
    let feed = Feeds::new(Arc::clone(&s)).subscribe_reports();
    let mut rx = feed.subscribe();
    wait_for(&mut rx, 0).await;

    drop(feed);
    assert_eq!(rx.borrow().phase, FeedPhase::Unsubscribed);

    // Writes after teardown must not resurrect the feed.
    s.add_report(NewReport::new("Late", ReportCategory::Security))
      .await
      .unwrap();
    tokio::task::yield_now().await;
    assert_eq!(rx.borrow().phase, FeedPhase::Unsubscribed);
    assert!(rx.borrow().records.is_empty());
  }

  #[tokio::test]
  async fn failing_query_parks_in_error_with_empty_records() {
    let s = store().await;
    s.add_report(NewReport::new("Seed", ReportCategory::Security))
      .await
      .unwrap();

    let calls = Arc::new(std::sync::atomic::AtomicU64::new(0));
    let feed: Feed<Report> = {
      let calls = Arc::clone(&calls);
      Feed::establish(Arc::clone(&s), Collection::Reports, move |s| {
        let calls = Arc::clone(&calls);
        async move {
          if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            s.list_reports().await.map_err(QueryError::from)
          } else {
            Err(QueryError::from("backend unavailable"))
          }
        }
      })
    };
    let mut rx = feed.subscribe();
    wait_for(&mut rx, 1).await;

    s.add_report(NewReport::new("Trigger refresh", ReportCategory::Other))
      .await
      .unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().phase, FeedPhase::Error);
    assert!(rx.borrow().records.is_empty());
    assert_eq!(rx.borrow().error.as_deref(), Some("backend unavailable"));

    // Terminal: further writes do not revive the feed.
    let calls_after = calls.load(Ordering::SeqCst);
    s.add_report(NewReport::new("Ignored", ReportCategory::Other))
      .await
      .unwrap();
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), calls_after);
    assert_eq!(rx.borrow().phase, FeedPhase::Error);
  }

  #[tokio::test]
  async fn users_feed_is_gated_on_users_manage() {
    let s = store().await;
    s.add_user(NewProfile {
      name:      "Ana".into(),
      email:     "ana@school.example".into(),
      role:      Role::Staff,
      is_active: true,
    })
    .await
    .unwrap();
    let feeds = Feeds::new(Arc::clone(&s));

    // Staff lacks users:manage: empty live feed, no roster visible.
    let gated = feeds.subscribe_users(Some(&principal(Role::Staff)));
    assert_eq!(gated.phase(), FeedPhase::Live);
    assert!(gated.records().is_empty());

    // Direction sees the roster and tracks changes.
    let open = feeds.subscribe_users(Some(&principal(Role::Direction)));
    let mut rx = open.subscribe();
    wait_for(&mut rx, 1).await;

    s.add_user(NewProfile {
      name:      "Bruno".into(),
      email:     "bruno@school.example".into(),
      role:      Role::Student,
      is_active: true,
    })
    .await
    .unwrap();
    wait_for(&mut rx, 2).await;

    // The gated handle never learned anything.
    assert!(gated.records().is_empty());
  }

  #[tokio::test]
  async fn users_feed_denied_when_signed_out() {
    let s = store().await;
    let feed = Feeds::new(s).subscribe_users(None);
    assert_eq!(feed.phase(), FeedPhase::Live);
    assert!(feed.records().is_empty());
  }
}
