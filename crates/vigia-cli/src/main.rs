//! `vigia` — operator binary for the school safety store.
//!
//! Reads `vigia.toml` (or the path specified with `--config`), opens the
//! SQLite store, and runs one subcommand:
//!
//! ```
//! vigia seed
//! vigia stats --as direcao@school.example
//! vigia check --as aluno@school.example reports:create
//! vigia report "Broken gate lock" --category infrastructure --as aluno@school.example
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, bail};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigia_app::{
  Access,
  actions::Actions,
  dashboard::Dashboard,
  session::{AuthEvent, NoopNotifier, Session, SessionConfig, SessionState},
};
use vigia_core::{
  principal::{NewProfile, Principal, Role},
  record::{
    AlertKind, NewCampaign, NewChecklistItem, NewDrill, NewNotice, NewReport,
    NewVisitor, Priority, ReportCategory,
  },
  store::SafetyStore,
};
use vigia_store_sqlite::SqliteStore;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Operator CLI for the Vigia safety store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "vigia.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Populate the store with demo profiles and sample records.
  Seed,
  /// Sign in as a profile and print the dashboard stats snapshot.
  Stats {
    /// Email of the profile to act as.
    #[arg(long = "as", value_name = "EMAIL")]
    as_email: String,
  },
  /// Evaluate a capability query against a profile.
  Check {
    /// Email of the profile to act as.
    #[arg(long = "as", value_name = "EMAIL")]
    as_email: String,

    /// Capability tag, e.g. `reports:create` or `users:manage`.
    permission: String,
  },
  /// Submit an incident report.
  Report {
    title: String,

    #[arg(long, default_value = "")]
    description: String,

    /// bullying | infrastructure | security | health | other
    #[arg(long, default_value = "other")]
    category: String,

    /// Withhold the reporter's identity.
    #[arg(long)]
    anonymous: bool,

    /// Email of the profile to act as.
    #[arg(long = "as", value_name = "EMAIL")]
    as_email: String,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the TOML config file, overridable via `VIGIA_*` env vars.
#[derive(Debug, Clone, Deserialize)]
struct Settings {
  #[serde(default = "default_store_path")]
  store_path: PathBuf,

  /// Demo mode: synthesize a principal for unknown sign-ins with the role
  /// inferred from the email. Off by default.
  #[serde(default)]
  demo_role_inference: bool,
}

fn default_store_path() -> PathBuf {
  PathBuf::from("vigia.db")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VIGIA"))
    .build()
    .context("failed to read config file")?;
  let settings: Settings = settings
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let store_path = expand_tilde(&settings.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  match cli.command {
    Command::Seed => seed(&store).await?,
    Command::Stats { as_email } => {
      let principal = sign_in(&store, &settings, &as_email).await?;
      stats(&store, principal).await;
    }
    Command::Check { as_email, permission } => {
      let principal = sign_in(&store, &settings, &as_email).await?;
      let granted = vigia_core::permission::allows(
        Some(&principal),
        &Access::Can(permission.as_str()),
      );
      println!(
        "{} ({:?}): {permission} {}",
        principal.email,
        principal.role,
        if granted { "granted" } else { "denied" },
      );
    }
    Command::Report { title, description, category, anonymous, as_email } => {
      let principal = sign_in(&store, &settings, &as_email).await?;
      let report = Actions::new(Arc::clone(&store))
        .submit_report(Some(&principal), NewReport {
          title,
          description,
          category: parse_category(&category)?,
          priority: Priority::default(),
          reporter_id: None,
          anonymous,
        })
        .await
        .context("report rejected")?;
      println!("report {} submitted ({:?})", report.id, report.status);
    }
  }

  Ok(())
}

// ─── Subcommands ──────────────────────────────────────────────────────────────

/// Resolve an email to a principal through the session machinery, so the CLI
/// honours deactivation and the demo-mode flag exactly like the app does.
async fn sign_in(
  store: &Arc<SqliteStore>,
  settings: &Settings,
  email: &str,
) -> anyhow::Result<Principal> {
  let session = Session::new(
    Arc::clone(store),
    Arc::new(NoopNotifier),
    SessionConfig { demo_role_inference: settings.demo_role_inference },
  );
  session
    .handle_event(AuthEvent::SignedIn { email: email.to_string() })
    .await;

  match session.state() {
    SessionState::SignedIn(principal) => Ok(principal),
    SessionState::Deactivated => bail!("account {email} is deactivated"),
    _ => bail!("no profile for {email}"),
  }
}

async fn seed(store: &Arc<SqliteStore>) -> anyhow::Result<()> {
  for (name, email, role) in [
    ("Direção", "direcao@school.example", Role::Direction),
    ("Funcionário", "funcionario@school.example", Role::Staff),
    ("Aluno", "aluno@school.example", Role::Student),
  ] {
    store
      .add_user(NewProfile {
        name:      name.to_string(),
        email:     email.to_string(),
        role,
        is_active: true,
      })
      .await
      .with_context(|| format!("seeding profile {email}"))?;
  }

  store
    .add_report(NewReport::new(
      "Broken lock on gate B",
      ReportCategory::Infrastructure,
    ))
    .await?;
  store
    .check_in(NewVisitor {
      name:     "Carlos Lima".into(),
      document: Some("12.345.678-9".into()),
      visiting: "Direção".into(),
      reason:   "parent meeting".into(),
    })
    .await?;
  store
    .add_notice(NewNotice {
      title:     "Gate closes at 19h".into(),
      body:      "New winter schedule starts Monday.".into(),
      priority:  Priority::Medium,
      author_id: None,
    })
    .await?;
  store
    .add_campaign(NewCampaign {
      title:          "Fire safety week".into(),
      description:    "Annual awareness campaign.".into(),
      scheduled_date: Utc::now().date_naive() + Duration::days(14),
    })
    .await?;
  store
    .add_checklist_item(NewChecklistItem {
      label: "Extinguisher pressure".into(),
      area:  "lab".into(),
    })
    .await?;
  store
    .add_drill(NewDrill {
      title:          "Evacuation drill".into(),
      kind:           AlertKind::Evacuation,
      scheduled_date: Utc::now().date_naive() + Duration::days(7),
    })
    .await?;

  println!("seeded 3 profiles and sample records");
  Ok(())
}

async fn stats(store: &Arc<SqliteStore>, principal: Principal) {
  let dashboard = Dashboard::establish(Arc::clone(store), Some(principal));
  let stats = dashboard.snapshot().await;

  println!("reports:   {} total, {} pending, {} resolved",
    stats.total_reports, stats.pending_reports, stats.resolved_reports);
  println!("visitors:  {} on site", stats.active_visitors);
  println!("notices:   {} active", stats.active_notices);
  println!("campaigns: {} upcoming", stats.upcoming_campaigns);
  println!("alerts:    {} active", stats.active_alerts);
  println!("users:     {}", stats.total_users);
}

fn parse_category(s: &str) -> anyhow::Result<ReportCategory> {
  Ok(match s {
    "bullying" => ReportCategory::Bullying,
    "infrastructure" => ReportCategory::Infrastructure,
    "security" => ReportCategory::Security,
    "health" => ReportCategory::Health,
    "other" => ReportCategory::Other,
    other => bail!("unknown report category {other:?}"),
  })
}

/// Expand a leading `~/` against `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
