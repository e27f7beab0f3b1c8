//! Session resolution — matching authentication-provider transitions to a
//! [`Principal`].
//!
//! A [`Session`] owns the current [`SessionState`] and publishes it through
//! a [`watch`] channel. It is constructed with its collaborators injected
//! (profile source, notifier, config) so there is no global mutable state;
//! embedders hold it in an `Arc` and feed it [`AuthEvent`]s.
//!
//! Transitions are serialized latest-wins: each event bumps an epoch, and a
//! profile resolution that is still in flight when a newer event arrives is
//! abandoned rather than merged.

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use vigia_core::{
  permission::{self, Access},
  principal::{Principal, Role},
  store::ProfileSource,
};

// ─── Auth events ─────────────────────────────────────────────────────────────

/// An opaque authenticated-session transition from the external provider.
#[derive(Debug, Clone)]
pub enum AuthEvent {
  SignedIn { email: String },
  SignedOut,
}

// ─── Session state ───────────────────────────────────────────────────────────

/// What the rest of the app sees of the current session.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
  #[default]
  SignedOut,
  /// A sign-in event arrived and the profile lookup is in flight.
  Resolving,
  SignedIn(Principal),
  /// The profile exists but `is_active` is false. Callers surface this as
  /// "account deactivated"; it carries no principal.
  Deactivated,
}

impl SessionState {
  pub fn principal(&self) -> Option<&Principal> {
    match self {
      Self::SignedIn(p) => Some(p),
      _ => None,
    }
  }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// The push-notification permission prompt, kept behind a trait because the
/// transport is owned by the embedding platform. Called best-effort on each
/// successful sign-in; failures are logged and swallowed, never surfaced.
pub trait Notifier: Send + Sync {
  fn request_push_permission(
    &self,
    principal: &Principal,
  ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>>
  + Send;
}

/// A notifier that grants nothing and asks nobody. Useful for headless
/// embedders and tests.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  async fn request_push_permission(
    &self,
    _principal: &Principal,
  ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Ok(())
  }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Session behaviour toggles.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
  /// Demo mode only: when a sign-in has no stored profile, synthesize a
  /// principal whose role is inferred from the email. Off by default — in
  /// production an unknown identity stays signed out.
  pub demo_role_inference: bool,
}

fn infer_demo_role(email: &str) -> Role {
  let local = email.split('@').next().unwrap_or(email).to_ascii_lowercase();
  if local.contains("admin") || local.contains("direcao") {
    Role::Direction
  } else if local.contains("funcionario") {
    Role::Staff
  } else {
    Role::Student
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// The identity and role resolver.
pub struct Session<P, N> {
  profiles: Arc<P>,
  notifier: Arc<N>,
  config:   SessionConfig,
  state:    watch::Sender<SessionState>,
  epoch:    AtomicU64,
}

impl<P, N> Session<P, N>
where
  P: ProfileSource + 'static,
  N: Notifier + 'static,
{
  pub fn new(profiles: Arc<P>, notifier: Arc<N>, config: SessionConfig) -> Self {
    let (state, _) = watch::channel(SessionState::default());
    Self {
      profiles,
      notifier,
      config,
      state,
      epoch: AtomicU64::new(0),
    }
  }

  /// Observe session transitions. The receiver always holds the latest
  /// committed state.
  pub fn subscribe(&self) -> watch::Receiver<SessionState> {
    self.state.subscribe()
  }

  /// The latest committed state.
  pub fn state(&self) -> SessionState {
    self.state.borrow().clone()
  }

  /// Snapshot of the current principal, if signed in.
  pub fn principal(&self) -> Option<Principal> {
    self.state.borrow().principal().cloned()
  }

  /// Evaluate an authorization query against the current principal.
  pub fn allows(&self, access: &Access<'_>) -> bool {
    permission::allows(self.state.borrow().principal(), access)
  }

  /// Feed one provider transition into the session.
  ///
  /// Invoked at most once per auth-state transition by the embedder. If a
  /// newer event lands while this one's profile lookup is in flight, this
  /// one's outcome is dropped on commit.
  pub async fn handle_event(&self, event: AuthEvent) {
    let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
    match event {
      AuthEvent::SignedOut => {
        self.commit(epoch, SessionState::SignedOut);
      }
      AuthEvent::SignedIn { email } => {
        self.commit(epoch, SessionState::Resolving);
        let next = self.resolve(&email).await;
        let signed_in = matches!(next, SessionState::SignedIn(_));
        if self.commit(epoch, next) && signed_in {
          self.spawn_push_prompt();
        }
      }
    }
  }

  /// Publish `next` unless a newer event has superseded `epoch`.
  fn commit(&self, epoch: u64, next: SessionState) -> bool {
    if self.epoch.load(Ordering::SeqCst) != epoch {
      tracing::debug!(epoch, "dropping stale session resolution");
      return false;
    }
    self.state.send_replace(next);
    true
  }

  async fn resolve(&self, email: &str) -> SessionState {
    match self.profiles.get_profile(email).await {
      Ok(Some(profile)) if profile.is_active => {
        SessionState::SignedIn(profile.into_principal())
      }
      Ok(Some(_)) => SessionState::Deactivated,
      Ok(None) => self.fallback(email),
      Err(e) => {
        // Recovered locally: the caller never sees a lookup failure.
        tracing::warn!(email, error = %e, "profile lookup failed");
        self.fallback(email)
      }
    }
  }

  fn fallback(&self, email: &str) -> SessionState {
    if !self.config.demo_role_inference {
      return SessionState::SignedOut;
    }
    let role = infer_demo_role(email);
    tracing::info!(email, ?role, "demo mode: synthesized principal");
    SessionState::SignedIn(Principal {
      id:        uuid::Uuid::new_v4(),
      name:      email.split('@').next().unwrap_or(email).to_string(),
      email:     email.to_string(),
      role,
      is_active: true,
    })
  }

  /// Fire-and-forget push-permission request on successful sign-in.
  fn spawn_push_prompt(&self) {
    let Some(principal) = self.principal() else {
      return;
    };
    let notifier = Arc::clone(&self.notifier);
    tokio::spawn(async move {
      if let Err(e) = notifier.request_push_permission(&principal).await {
        tracing::warn!(error = %e, "push permission request failed");
      }
    });
  }
}
