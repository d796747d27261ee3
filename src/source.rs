//! Contract for the remote match history service.
//!
//! The aggregation cache only talks to this trait. The Riot client in
//! [`crate::api::client`] is the production implementation.

use crate::error::AppError;
use chrono::{DateTime, Utc};

pub const UNRANKED: &str = "Unranked";

/// One completed game, reduced to what aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub match_id: String,
    pub queue_id: u16,
    pub created_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub participants: Vec<Participation>,
}

impl MatchRecord {
    pub fn participant(&self, player_id: &str) -> Option<&Participation> {
        self.participants.iter().find(|p| p.player_id == player_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Participation {
    pub player_id: String,
    pub champion: String,
    pub win: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedStanding {
    pub tier: String,
    pub division: String,
    pub league_points: i32,
}

impl RankedStanding {
    /// e.g. `GOLD II (45 LP)`
    pub fn label(&self) -> String {
        format!("{} {} ({} LP)", self.tier, self.division, self.league_points)
    }
}

pub trait MatchSource: Send + Sync {
    /// A page of match ids, most recent first. An empty page means there
    /// are no more.
    fn list_match_ids(
        &self,
        player_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<String>, AppError>;

    fn get_match(&self, match_id: &str) -> Result<MatchRecord, AppError>;

    /// `None` when the player has no solo queue standing.
    fn ranked_standing(&self, player_id: &str) -> Result<Option<RankedStanding>, AppError>;
}
