//! Session-scoped memo of identity lookups and per-period broadcast listings.

use std::collections::HashMap;

use chrono::{Datelike, TimeZone};
use futures::future::join_all;
use tracing::instrument;

use super::client::{FetchError, RemoteClient};
use crate::model::{BroadcastRecord, HelixUser, HelixVideo, Login, StreamerIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKey {
    Year(i32),
}

pub type PeriodRecords = HashMap<Login, Vec<BroadcastRecord>>;

/// Outcome of loading one period. `records` always has an entry for every streamer
/// whose identity resolved; a failed fetch leaves that entry empty.
#[derive(Debug, Default)]
pub struct PeriodLoad {
    pub records: PeriodRecords,
    pub failures: Vec<(Login, FetchError)>,
    pub unresolved: Vec<Login>,
}

impl PeriodLoad {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.unresolved.is_empty()
    }

    pub fn all_records(&self) -> impl Iterator<Item = &BroadcastRecord> {
        self.records.values().flatten()
    }
}

#[derive(Debug, Default)]
pub struct LocalCache {
    identities: HashMap<Login, StreamerIdentity>,
    periods: HashMap<PeriodKey, PeriodRecords>,
}

impl LocalCache {
    pub fn cached_identity(&self, login: &Login) -> Option<&StreamerIdentity> {
        self.identities.get(login)
    }

    /// Seed an identity learned elsewhere, e.g. from the followed-channel listing.
    pub fn remember(&mut self, identity: StreamerIdentity) {
        self.identities.insert(identity.login.clone(), identity);
    }

    pub fn invalidate_periods(&mut self) {
        self.periods.clear();
    }

    pub fn has_period(&self, key: PeriodKey) -> bool {
        self.periods.contains_key(&key)
    }

    /// Cache-first identity lookup. An unknown channel is reported as `None` and is not
    /// remembered, so a later lookup asks again.
    pub async fn identity(
        &mut self,
        client: &RemoteClient,
        login: &Login,
    ) -> Result<Option<StreamerIdentity>, FetchError> {
        if let Some(identity) = self.identities.get(login) {
            return Ok(Some(identity.clone()));
        }

        let found = lookup(client, login).await?;
        if let Some(identity) = &found {
            self.remember(identity.clone());
        }

        Ok(found)
    }

    /// Broadcasts of every streamer in `streamers` that started in `year`, local time.
    /// Fetches run concurrently and each one fails on its own; a load with any failure is
    /// returned but not stored.
    #[instrument(skip(self, client, streamers, zone), fields(count = streamers.len()))]
    pub async fn year<Tz: TimeZone>(
        &mut self,
        client: &RemoteClient,
        streamers: &[Login],
        year: i32,
        zone: &Tz,
    ) -> PeriodLoad {
        let key = PeriodKey::Year(year);
        if let Some(records) = self.periods.get(&key) {
            return PeriodLoad {
                records: records.clone(),
                ..Default::default()
            };
        }

        let mut load = PeriodLoad::default();
        let identities = self.resolve(client, streamers, &mut load).await;

        let fetches = identities.iter().map(|identity| archive(client, identity));
        let results = join_all(fetches).await;

        for (identity, result) in identities.into_iter().zip(results) {
            let records = match result {
                Ok(records) => records
                    .into_iter()
                    .filter(|record| record.local_date(zone).year() == year)
                    .collect(),
                Err(error) => {
                    tracing::warn!(login = %identity.login, %error, "failed to fetch broadcasts");
                    load.failures.push((identity.login.clone(), error));
                    Vec::new()
                }
            };
            load.records.insert(identity.login, records);
        }

        if load.is_complete() {
            self.periods.insert(key, load.records.clone());
        } else {
            tracing::debug!(year, "period load incomplete, not caching");
        }

        load
    }

    /// Identities for `streamers` in order, fetching the missing ones concurrently.
    async fn resolve(
        &mut self,
        client: &RemoteClient,
        streamers: &[Login],
        load: &mut PeriodLoad,
    ) -> Vec<StreamerIdentity> {
        let missing: Vec<&Login> = streamers
            .iter()
            .filter(|login| !self.identities.contains_key(*login))
            .collect();

        let results = join_all(missing.iter().map(|login| lookup(client, login))).await;

        for (login, result) in missing.into_iter().zip(results) {
            match result {
                Ok(Some(identity)) => self.remember(identity),
                Ok(None) => load.unresolved.push(login.clone()),
                Err(error) => load.failures.push((login.clone(), error)),
            }
        }

        streamers
            .iter()
            .filter_map(|login| self.identities.get(login).cloned())
            .collect()
    }
}

async fn lookup(client: &RemoteClient, login: &Login) -> Result<Option<StreamerIdentity>, FetchError> {
    let users: Vec<HelixUser> = client.fetch_all(&format!("users?login={login}"), false).await?;
    Ok(users.into_iter().next().and_then(StreamerIdentity::from_user))
}

async fn archive(
    client: &RemoteClient,
    identity: &StreamerIdentity,
) -> Result<Vec<BroadcastRecord>, FetchError> {
    let endpoint = format!("videos?user_id={}&first=100&type=archive", identity.id);
    let videos: Vec<HelixVideo> = client.fetch_all(&endpoint, true).await?;
    Ok(videos.into_iter().filter_map(BroadcastRecord::from_video).collect())
}
