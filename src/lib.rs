//! FitLife - Social Fitness Tracking Client Core
//!
//! Headless client core for a social fitness application: workout logging,
//! a friend-scoped feed, tier-segmented leaderboards, friendships, and
//! time-boxed challenges. The crate owns the client state snapshot, all
//! mutating actions against the remote backend, and all derived-data
//! computation; a UI embeds `AppStore` and renders its state.

pub mod config;
pub mod gateway;
pub mod metrics;
pub mod ranking;
pub mod social;
pub mod store;

// Re-export commonly used types
pub use gateway::{HttpGateway, MemoryGateway, RemoteGateway};
pub use social::types::{Challenge, Intensity, LeagueTier, Post, RankedUser};
pub use store::state::{AppState, View};
pub use store::{AppStore, StoreError};
