use crate::cache::PlayerAggregate;
use serde::Serialize;

pub const NOT_AVAILABLE: &str = "N/A";

/// Display-ready statistics for one player. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub player_id: String,
    pub games_played: u32,
    pub winrate: String,
    pub most_played_champion: String,
    pub rank: String,
}

pub fn present(aggregate: &PlayerAggregate) -> StatsSummary {
    StatsSummary {
        player_id: aggregate.player_id.clone(),
        games_played: aggregate.games_played,
        winrate: winrate(aggregate.wins, aggregate.games_played),
        most_played_champion: most_played_champion(aggregate)
            .unwrap_or(NOT_AVAILABLE)
            .to_string(),
        rank: aggregate.rank.clone(),
    }
}

pub fn winrate(wins: u32, games: u32) -> String {
    if games == 0 {
        return NOT_AVAILABLE.to_string();
    }
    // Tenths of a percent, ties rounded up.
    let tenths = (u64::from(wins) * 2000 + u64::from(games)) / (u64::from(games) * 2);
    format!("{}.{}%", tenths / 10, tenths % 10)
}

/// Highest play count wins; ties go to the alphabetically first champion.
pub fn most_played_champion(aggregate: &PlayerAggregate) -> Option<&str> {
    aggregate
        .champion_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(champion, _)| champion.as_str())
}
