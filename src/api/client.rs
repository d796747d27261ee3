use crate::config::Config;
use crate::error::AppError;
use crate::source::{MatchRecord, MatchSource, RankedStanding};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::thread;
use tracing::debug;

use super::endpoints;
use super::models::{solo_standing, LeagueEntryDto, MatchDto};

pub struct RiotApiClient {
    api_key: String,
    platform: String,
    agent: ureq::Agent,
    clock: DefaultClock,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl RiotApiClient {
    pub fn new(config: &Config) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .user_agent(concat!("league_roster/", env!("CARGO_PKG_VERSION")))
            .build();

        RiotApiClient {
            api_key: config.api_key.clone(),
            platform: config.region.clone(),
            agent,
            clock: DefaultClock::default(),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    fn regional_routing(&self) -> &'static str {
        endpoints::regional_routing(&self.platform)
    }

    /// Blocks until the local quota allows another call.
    fn wait_for_quota(&self) {
        while let Err(not_until) = self.rate_limiter.check() {
            thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }

    fn execute_request(&self, url: &str) -> Result<String, AppError> {
        self.wait_for_quota();
        debug!("GET {}", url);

        let response = self
            .agent
            .get(url)
            .set("X-Riot-Token", &self.api_key)
            .call();

        match response {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| AppError::RemoteUnavailable(format!("reading {}: {}", url, e))),
            Err(ureq::Error::Status(429, _)) => Err(AppError::RateLimited),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(AppError::RemoteUnavailable(format!("{} {}", code, body.trim())))
            }
            Err(e) => Err(AppError::RemoteUnavailable(e.to_string())),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        let body = self.execute_request(url)?;
        serde_json::from_str(&body).map_err(|e| AppError::MalformedRecord(e.to_string()))
    }

    pub fn get_league_entries(&self, puuid: &str) -> Result<Vec<LeagueEntryDto>, AppError> {
        self.get_json(&endpoints::league_entries_url(&self.platform, puuid))
    }
}

impl MatchSource for RiotApiClient {
    fn list_match_ids(
        &self,
        player_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<String>, AppError> {
        let url = endpoints::match_ids_url(self.regional_routing(), player_id, start, count);
        self.get_json(&url)
    }

    fn get_match(&self, match_id: &str) -> Result<MatchRecord, AppError> {
        let dto: MatchDto = self.get_json(&endpoints::match_url(self.regional_routing(), match_id))?;
        MatchRecord::try_from(dto)
    }

    fn ranked_standing(&self, player_id: &str) -> Result<Option<RankedStanding>, AppError> {
        self.get_league_entries(player_id).map(solo_standing)
    }
}
