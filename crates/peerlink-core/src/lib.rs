//! Peerlink Core - Shared identifiers and configuration
//!
//! This crate contains the foundational pieces used by the Peerlink
//! signaling server. It has no dependencies on networking code.

pub mod config;
pub mod error;
pub mod id;

pub use config::{Config, RoomConfig, ServerConfig};
pub use error::ConfigError;

/// Default WebSocket port
pub const DEFAULT_PORT: u16 = 3000;

/// Default room time-to-live (1 hour)
pub const DEFAULT_ROOM_TTL_SECS: u64 = 3600;

/// Default interval between expiry sweeps (15 minutes)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 900;
