use crate::analysis::summary::present;
use crate::cache::Reconciliation;
use crate::error::AppError;
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct PlayerRow {
    #[tabled(rename = "#")]
    number: String,
    player: String,
    games: String,
    win_rate: String,
    most_played: String,
    rank: String,
}

/// Long PUUIDs are unreadable in a table; keep the head.
fn short_id(player_id: &str) -> String {
    match player_id.char_indices().nth(12) {
        Some((idx, _)) => format!("{}…", &player_id[..idx]),
        None => player_id.to_string(),
    }
}

pub fn display_roster(results: &[Result<Reconciliation, AppError>], roster: &[String]) {
    println!("\n{}", "📊 ROSTER STATS".bold().cyan());
    println!("{}\n", "=".repeat(80).cyan());

    let mut rows = vec![];
    let mut problems = vec![];

    for (idx, (player_id, result)) in roster.iter().zip(results).enumerate() {
        match result {
            Ok(reconciliation) => {
                let summary = present(&reconciliation.aggregate);
                rows.push(PlayerRow {
                    number: format!("{}", idx + 1),
                    player: short_id(&summary.player_id),
                    games: summary.games_played.to_string(),
                    win_rate: summary.winrate,
                    most_played: summary.most_played_champion,
                    rank: summary.rank,
                });
                if let Some(warning) = reconciliation.warning_message() {
                    problems.push((player_id.clone(), warning));
                }
            }
            Err(e) => {
                rows.push(PlayerRow {
                    number: format!("{}", idx + 1),
                    player: short_id(player_id),
                    games: "-".to_string(),
                    win_rate: "-".to_string(),
                    most_played: "-".to_string(),
                    rank: "-".to_string(),
                });
                problems.push((player_id.clone(), e.to_string()));
            }
        }
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);

    for (player_id, problem) in problems {
        display_warning(&format!("{}: {}", short_id(&player_id), problem));
    }
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}
