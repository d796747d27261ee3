use crate::analysis::filter::MatchFilter;
use crate::config::Config;
use crate::error::AppError;
use crate::source::{MatchRecord, MatchSource, UNRANKED};
use crate::store::AggregateStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Match ids requested per listing call.
pub const PAGE_SIZE: usize = 100;

/// Reconciliations that may see a record arrive unreadable before it is
/// dropped for good.
pub const MALFORMED_ATTEMPTS: u32 = 3;

/// Running tally for one tracked player.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerAggregate {
    pub player_id: String,
    pub seen_match_ids: BTreeSet<String>,
    pub games_played: u32,
    pub wins: u32,
    pub champion_counts: BTreeMap<String, u32>,
    pub rank: String,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Counted,
    Rejected,
    AlreadySeen,
}

impl PlayerAggregate {
    pub fn new(player_id: &str) -> Self {
        PlayerAggregate {
            player_id: player_id.to_string(),
            seen_match_ids: BTreeSet::new(),
            games_played: 0,
            wins: 0,
            champion_counts: BTreeMap::new(),
            rank: UNRANKED.to_string(),
            last_updated: None,
        }
    }

    pub fn has_seen(&self, match_id: &str) -> bool {
        self.seen_match_ids.contains(match_id)
    }

    /// Returns false if the id was already recorded.
    pub fn mark_seen(&mut self, match_id: &str) -> bool {
        self.seen_match_ids.insert(match_id.to_string())
    }

    /// Folds one fetched match into the tally. A match is recorded as seen
    /// whether or not it counts, and never counted twice.
    pub fn record_match(
        &mut self,
        match_id: &str,
        record: &MatchRecord,
        filter: &MatchFilter,
    ) -> MatchOutcome {
        if !self.mark_seen(match_id) {
            return MatchOutcome::AlreadySeen;
        }

        if let Err(reason) = filter.check(record) {
            debug!("Match {} not counted: {}", match_id, reason);
            return MatchOutcome::Rejected;
        }

        let Some(participation) = record.participant(&self.player_id) else {
            debug!("Match {} has no entry for {}", match_id, self.player_id);
            return MatchOutcome::Rejected;
        };

        self.games_played += 1;
        if participation.win {
            self.wins += 1;
        }
        *self
            .champion_counts
            .entry(participation.champion.clone())
            .or_insert(0) += 1;
        debug_assert!(self.is_consistent());

        MatchOutcome::Counted
    }

    pub fn is_consistent(&self) -> bool {
        self.wins <= self.games_played
            && self.champion_counts.values().sum::<u32>() == self.games_played
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub filter: MatchFilter,
    pub match_history_limit: usize,
    /// A player listed more recently than this is served without any
    /// network call. Zero disables the throttle.
    pub refresh_interval: Duration,
}

impl CacheSettings {
    pub fn from_config(config: &Config) -> Self {
        CacheSettings {
            filter: config.filter.clone(),
            match_history_limit: config.match_history_limit,
            refresh_interval: config.refresh_interval,
        }
    }
}

/// Result of one reconciliation. `warnings` holds soft failures: the
/// aggregate is still the best known state, it may just be behind.
#[derive(Debug)]
pub struct Reconciliation {
    pub aggregate: PlayerAggregate,
    pub recorded: usize,
    pub counted: usize,
    pub failed: usize,
    pub warnings: Vec<AppError>,
}

impl Reconciliation {
    fn unchanged(aggregate: PlayerAggregate) -> Self {
        Reconciliation {
            aggregate,
            recorded: 0,
            counted: 0,
            failed: 0,
            warnings: Vec::new(),
        }
    }

    pub fn is_stale(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warning_message(&self) -> Option<String> {
        if self.warnings.is_empty() {
            return None;
        }
        Some(
            self.warnings
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

struct PlayerSlot {
    aggregate: PlayerAggregate,
    last_checked: Option<Instant>,
    malformed_attempts: HashMap<String, u32>,
}

impl PlayerSlot {
    fn new(aggregate: PlayerAggregate) -> Self {
        PlayerSlot {
            aggregate,
            last_checked: None,
            malformed_attempts: HashMap::new(),
        }
    }

    fn checked_within(&self, interval: Duration) -> bool {
        self.last_checked
            .map(|checked| checked.elapsed() < interval)
            .unwrap_or(false)
    }
}

/// Owns every player's aggregate and keeps it in step with the match
/// source. Reconciliations of one player are serialized on that player's
/// slot; different players never wait on each other except to write the
/// store.
pub struct AggregateCache {
    source: Arc<dyn MatchSource>,
    settings: CacheSettings,
    store: AggregateStore,
    slots: Mutex<HashMap<String, Arc<Mutex<PlayerSlot>>>>,
}

impl AggregateCache {
    pub fn new(source: Arc<dyn MatchSource>, settings: CacheSettings, store: AggregateStore) -> Self {
        let slots = store
            .snapshot()
            .into_iter()
            .map(|(player_id, aggregate)| (player_id, Arc::new(Mutex::new(PlayerSlot::new(aggregate)))))
            .collect();

        AggregateCache {
            source,
            settings,
            store,
            slots: Mutex::new(slots),
        }
    }

    fn slot(&self, player_id: &str) -> Arc<Mutex<PlayerSlot>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(player_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(PlayerSlot::new(PlayerAggregate::new(player_id)))))
            .clone()
    }

    /// Brings the player's aggregate up to date with the source and returns
    /// it. Never fails: problems are reported as warnings next to the last
    /// known aggregate.
    pub fn reconcile(&self, player_id: &str) -> Reconciliation {
        let slot = self.slot(player_id);
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.checked_within(self.settings.refresh_interval) {
            debug!("Cache hit for {}", player_id);
            return Reconciliation::unchanged(slot.aggregate.clone());
        }

        let listed = match self.list_match_ids(player_id) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Listing matches for {} failed, serving cached stats: {}", player_id, e);
                let mut stale = Reconciliation::unchanged(slot.aggregate.clone());
                stale.warnings.push(e);
                return stale;
            }
        };

        let mut pending = HashSet::new();
        let new_ids: Vec<String> = listed
            .into_iter()
            .filter(|id| !slot.aggregate.has_seen(id) && pending.insert(id.clone()))
            .collect();

        if new_ids.is_empty() {
            debug!("No new matches for {}", player_id);
            slot.last_checked = Some(Instant::now());
            return Reconciliation::unchanged(slot.aggregate.clone());
        }

        info!("Found {} new matches for {}", new_ids.len(), player_id);

        let mut outcome = Reconciliation::unchanged(slot.aggregate.clone());
        let mut last_failure = None;

        for match_id in &new_ids {
            match self.source.get_match(match_id) {
                Ok(record) => {
                    outcome.recorded += 1;
                    let result = slot
                        .aggregate
                        .record_match(match_id, &record, &self.settings.filter);
                    if result == MatchOutcome::Counted {
                        outcome.counted += 1;
                    }
                }
                Err(e) if e.is_remote() => {
                    warn!("Match {} failed, will retry: {}", match_id, e);
                    outcome.failed += 1;
                    last_failure = Some(e);
                }
                Err(e) => {
                    let attempts = slot.malformed_attempts.entry(match_id.clone()).or_insert(0);
                    *attempts += 1;
                    if *attempts >= MALFORMED_ATTEMPTS {
                        warn!(
                            "Dropping match {} for good after {} unreadable fetches: {}",
                            match_id, attempts, e
                        );
                        slot.malformed_attempts.remove(match_id);
                        slot.aggregate.mark_seen(match_id);
                        outcome.recorded += 1;
                    } else {
                        warn!("Match {} unreadable (attempt {}), will retry: {}", match_id, attempts, e);
                        outcome.failed += 1;
                        last_failure = Some(e);
                    }
                }
            }
        }

        if let Some(e) = last_failure {
            outcome.warnings.push(AppError::RemoteUnavailable(format!(
                "{} of {} new matches could not be fetched ({})",
                outcome.failed,
                new_ids.len(),
                e
            )));
        }

        match self.source.ranked_standing(player_id) {
            Ok(standing) => {
                slot.aggregate.rank = standing
                    .map(|s| s.label())
                    .unwrap_or_else(|| UNRANKED.to_string());
            }
            Err(e) => {
                warn!("Rank refresh for {} failed, keeping {}: {}", player_id, slot.aggregate.rank, e);
                outcome.warnings.push(e);
            }
        }

        slot.aggregate.last_updated = Some(Utc::now());
        if outcome.failed == 0 {
            slot.last_checked = Some(Instant::now());
        }

        if let Err(e) = self.store.commit(&slot.aggregate) {
            warn!("Could not persist {}: {}", player_id, e);
            outcome.warnings.push(e);
        }

        info!(
            "Reconciled {}: {} recorded, {} counted, {} failed, {} games total",
            player_id, outcome.recorded, outcome.counted, outcome.failed, slot.aggregate.games_played
        );

        outcome.aggregate = slot.aggregate.clone();
        outcome
    }

    /// Rewrites the store with everything committed so far.
    pub fn flush(&self) -> Result<(), AppError> {
        self.store.flush()
    }

    fn list_match_ids(&self, player_id: &str) -> Result<Vec<String>, AppError> {
        let limit = self.settings.match_history_limit;
        let mut ids = Vec::new();
        let mut start = 0;

        while start < limit {
            let count = PAGE_SIZE.min(limit - start);
            let page = self.source.list_match_ids(player_id, start, count)?;
            if page.is_empty() {
                break;
            }
            ids.extend(page);
            start += count;
        }

        ids.truncate(limit);
        debug!("Listed {} matches for {}", ids.len(), player_id);
        Ok(ids)
    }
}
