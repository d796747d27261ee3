use crate::error::AppError;
use crate::source::{MatchRecord, Participation, RankedStanding};
use chrono::DateTime;
use serde::Deserialize;

pub const SOLO_QUEUE: &str = "RANKED_SOLO_5x5";

// League V4 response
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    pub queue_type: String,
    pub tier: String,
    pub rank: String,
    pub league_points: i32,
}

impl From<LeagueEntryDto> for RankedStanding {
    fn from(entry: LeagueEntryDto) -> Self {
        RankedStanding {
            tier: entry.tier,
            division: entry.rank,
            league_points: entry.league_points,
        }
    }
}

/// The solo queue entry, if the player has one.
pub fn solo_standing(entries: Vec<LeagueEntryDto>) -> Option<RankedStanding> {
    entries
        .into_iter()
        .find(|entry| entry.queue_type == SOLO_QUEUE)
        .map(RankedStanding::from)
}

// Match V5 response
#[derive(Debug, Deserialize)]
pub struct MatchDto {
    pub metadata: MatchMetadata,
    pub info: Option<MatchInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub queue_id: u16,
    /// Unix epoch milliseconds
    pub game_creation: i64,
    /// Seconds
    pub game_duration: i64,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    pub champion_name: String,
    pub win: bool,
}

impl TryFrom<MatchDto> for MatchRecord {
    type Error = AppError;

    fn try_from(dto: MatchDto) -> Result<Self, Self::Error> {
        let match_id = dto.metadata.match_id;
        let info = dto
            .info
            .ok_or_else(|| AppError::MalformedRecord(format!("{} has no info block", match_id)))?;
        let created_at = DateTime::from_timestamp_millis(info.game_creation).ok_or_else(|| {
            AppError::MalformedRecord(format!(
                "{} has an invalid creation time {}",
                match_id, info.game_creation
            ))
        })?;

        Ok(MatchRecord {
            match_id,
            queue_id: info.queue_id,
            created_at,
            duration_secs: info.game_duration,
            participants: info
                .participants
                .into_iter()
                .map(|p| Participation {
                    player_id: p.puuid,
                    champion: p.champion_name,
                    win: p.win,
                })
                .collect(),
        })
    }
}
