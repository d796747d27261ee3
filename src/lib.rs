//! # League Roster
//!
//! Ranked statistics for a fixed roster of League of Legends players,
//! kept up to date incrementally from the Riot match history API.
//!
//! ## Architecture
//!
//! - **source**: contract for the remote match history service
//! - **api**: Riot Games implementation of that contract
//! - **analysis**: match filter and stats presenter
//! - **cache**: per-player aggregates and the reconciliation algorithm
//! - **store**: atomic JSON persistence of the aggregates
//! - **roster**: bounded fan-out of reconciliations over the roster
//! - **server**: HTTP API and static front end
//! - **display**: terminal output for the `stats` command

pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod roster;
pub mod server;
pub mod source;
pub mod store;

pub use error::AppError;
