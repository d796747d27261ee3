use crate::source::MatchRecord;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

/// Decides which matches count toward a player's statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFilter {
    queues: BTreeSet<u16>,
    season_start: DateTime<Utc>,
    min_duration_secs: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnrankedQueue(u16),
    BeforeSeason,
    TooShort(i64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnrankedQueue(queue) => write!(f, "queue {} is not counted", queue),
            Rejection::BeforeSeason => write!(f, "played before season start"),
            Rejection::TooShort(secs) => write!(f, "lasted only {}s", secs),
        }
    }
}

impl MatchFilter {
    pub fn new(
        queues: impl IntoIterator<Item = u16>,
        season_start: DateTime<Utc>,
        min_duration_secs: i64,
    ) -> Self {
        MatchFilter {
            queues: queues.into_iter().collect(),
            season_start,
            min_duration_secs,
        }
    }

    pub fn queues(&self) -> &BTreeSet<u16> {
        &self.queues
    }

    pub fn season_start(&self) -> DateTime<Utc> {
        self.season_start
    }

    pub fn min_duration_secs(&self) -> i64 {
        self.min_duration_secs
    }

    pub fn check(&self, record: &MatchRecord) -> Result<(), Rejection> {
        if !self.queues.contains(&record.queue_id) {
            return Err(Rejection::UnrankedQueue(record.queue_id));
        }
        if record.created_at < self.season_start {
            return Err(Rejection::BeforeSeason);
        }
        // Remakes and early surrenders
        if record.duration_secs < self.min_duration_secs {
            return Err(Rejection::TooShort(record.duration_secs));
        }
        Ok(())
    }

    pub fn included(&self, record: &MatchRecord) -> bool {
        self.check(record).is_ok()
    }
}
