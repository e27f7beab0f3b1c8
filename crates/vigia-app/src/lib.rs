//! Application layer for Vigia, backed by any [`vigia_core::store::SafetyStore`].
//!
//! This is the surface a UI shell consumes: session resolution
//! ([`session::Session`]), the permission evaluator ([`Access`] /
//! [`vigia_core::permission::allows`]), live collection feeds
//! ([`feed::Feed`]), the dashboard stats reducer ([`stats::DashboardStats`]),
//! and permission-checked mutations ([`actions::Actions`]).
//!
//! Rendering, navigation, and transport are the caller's responsibility.

pub mod actions;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod session;
pub mod stats;

pub use error::Error;
pub use vigia_core::permission::Access;
