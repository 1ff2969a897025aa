//! In-memory session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use salesdesk_core::result::AppResult;
use salesdesk_entity::session::Session;

use crate::repositories::SessionRepository;

/// Sessions grouped per account plus a digest → account index.
///
/// Lock order is always `by_account` then `owners`; no code path takes
/// an `owners` guard and then reaches into `by_account`.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    by_account: DashMap<Uuid, Vec<Session>>,
    owners: DashMap<String, Uuid>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert_capped(&self, session: Session, cap: usize) -> AppResult<Vec<Session>> {
        let mut list = self.by_account.entry(session.account_id).or_default();
        self.owners
            .insert(session.token_digest.clone(), session.account_id);
        list.push(session);
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let excess = if cap > 0 { list.len().saturating_sub(cap) } else { 0 };
        let evicted: Vec<Session> = list.drain(..excess).collect();
        for old in &evicted {
            self.owners.remove(&old.token_digest);
        }
        Ok(evicted)
    }

    async fn find_by_digest(&self, token_digest: &str) -> AppResult<Option<Session>> {
        let Some(account_id) = self.owners.get(token_digest).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.by_account.get(&account_id).and_then(|list| {
            list.iter()
                .find(|s| s.token_digest == token_digest)
                .cloned()
        }))
    }

    async fn replace_token(
        &self,
        account_id: Uuid,
        old_digest: &str,
        new_digest: &str,
        new_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let Some(mut list) = self.by_account.get_mut(&account_id) else {
            return Ok(None);
        };
        let Some(session) = list.iter_mut().find(|s| s.token_digest == old_digest) else {
            return Ok(None);
        };
        session.token_digest = new_digest.to_string();
        session.expires_at = new_expires_at;
        let updated = session.clone();

        self.owners.remove(old_digest);
        self.owners.insert(new_digest.to_string(), account_id);
        Ok(Some(updated))
    }

    async fn remove_by_digest(
        &self,
        account_id: Uuid,
        token_digest: &str,
    ) -> AppResult<Option<Session>> {
        let Some(mut list) = self.by_account.get_mut(&account_id) else {
            return Ok(None);
        };
        let Some(pos) = list.iter().position(|s| s.token_digest == token_digest) else {
            return Ok(None);
        };
        let removed = list.remove(pos);
        self.owners.remove(&removed.token_digest);
        Ok(Some(removed))
    }

    async fn remove_by_id(&self, account_id: Uuid, session_id: Uuid) -> AppResult<Option<Session>> {
        let Some(mut list) = self.by_account.get_mut(&account_id) else {
            return Ok(None);
        };
        let Some(pos) = list.iter().position(|s| s.id == session_id) else {
            return Ok(None);
        };
        let removed = list.remove(pos);
        self.owners.remove(&removed.token_digest);
        Ok(Some(removed))
    }

    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<Session>> {
        Ok(self
            .by_account
            .get(&account_id)
            .map(|list| list.clone())
            .unwrap_or_default())
    }

    async fn remove_all(&self, account_id: Uuid) -> AppResult<Vec<Session>> {
        let Some(mut list) = self.by_account.get_mut(&account_id) else {
            return Ok(Vec::new());
        };
        let removed: Vec<Session> = list.drain(..).collect();
        for session in &removed {
            self.owners.remove(&session.token_digest);
        }
        Ok(removed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut purged = 0u64;
        for mut list in self.by_account.iter_mut() {
            let (expired, live): (Vec<Session>, Vec<Session>) =
                list.drain(..).partition(|s| s.is_expired_at(now));
            *list = live;
            for session in &expired {
                self.owners.remove(&session.token_digest);
            }
            purged += expired.len() as u64;
        }
        self.by_account.retain(|_, list| !list.is_empty());
        Ok(purged)
    }
}
