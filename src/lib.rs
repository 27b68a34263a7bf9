//! jxlaunch: log in to a Jagex account and launch the game client.
//!
//! A launch either reuses cached credentials or starts an OAuth2 login in the
//! browser. The redirect re-invokes the binary with a `jagex:` intent payload
//! that carries the authorization code, which is exchanged for tokens. From
//! there a game session is created, the user picks an account and the game
//! process is started.
//!
//! # Quick Start
//!
//! ```no_run
//! use jxlaunch::config::LauncherConfig;
//! use jxlaunch::intent::IntentPayload;
//! use jxlaunch::session::{LaunchOutcome, SessionOrchestrator};
//!
//! # async fn example() -> jxlaunch::error::Result<()> {
//! let orchestrator = SessionOrchestrator::from_config(LauncherConfig::load()?);
//! let payload = IntentPayload::parse("jagex:intent=social_auth,code=abc123")?;
//! if let LaunchOutcome::Launched { account } = orchestrator.run(Some(payload)).await? {
//!     println!("playing as {}", account.display_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod intent;
pub mod launcher;
pub mod picker;
pub mod provider;
pub mod session;
