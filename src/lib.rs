//! Simulated live-broadcast engagement engine.
//!
//! Drives a fake viewer counter, a scripted chat feed, floating reactions
//! and a delayed call-to-action over a virtual clock, around a video
//! provider mounted into a headless surface.

pub mod chat;
pub mod config;
pub mod cta;
pub mod dump;
pub mod error;
pub mod markup;
pub mod provider;
pub mod reactions;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod viewers;

pub use config::LiveConfig;
pub use error::{Error, Result};
pub use session::{LiveSession, SessionSnapshot};
