//! Cache-fronted ticket repository.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{StoreError, Ticket, TicketStore};

/// In-process mirror of the ticket store.
///
/// Mutations run under the cache lock and write the durable store before the
/// cache, so a failed store write leaves the cache untouched. The closures
/// passed to the check-and-commit methods run inside the critical section and
/// must not block.
pub struct TicketRepository {
    store: Arc<dyn TicketStore>,
    cache: Mutex<HashMap<String, Ticket>>,
}

impl TicketRepository {
    /// Build the repository, rehydrating the cache from `store`.
    pub fn load(store: Arc<dyn TicketStore>) -> Result<Self, StoreError> {
        let cache = store
            .list()?
            .into_iter()
            .map(|t| (t.channel_id.clone(), t))
            .collect::<HashMap<_, _>>();

        tracing::debug!(count = cache.len(), "Rehydrated ticket cache");

        Ok(Self {
            store,
            cache: Mutex::new(cache),
        })
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Ticket>> {
        // Writes hit the cache only after the store succeeded, so a poisoned
        // map is still a faithful mirror.
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn get(&self, channel_id: &str) -> Option<Ticket> {
        self.cache().get(channel_id).cloned()
    }

    /// Snapshot of every ticket, oldest first.
    pub fn list(&self) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self.cache().values().cloned().collect();
        tickets.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.channel_id.cmp(&b.channel_id))
        });
        tickets
    }

    /// Number of tickets matching `predicate`.
    pub fn count_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Ticket) -> bool,
    {
        self.cache().values().filter(|t| predicate(t)).count()
    }

    /// Run `f` over the current tickets with the cache locked.
    ///
    /// No ticket is inserted, updated or removed until `f` returns.
    pub fn with_locked<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&[&Ticket]) -> Result<R, E>,
    {
        let cache = self.cache();
        let tickets: Vec<&Ticket> = cache.values().collect();
        f(&tickets)
    }

    /// Insert `ticket` if `check` accepts the current contents.
    pub fn insert_with<E, F>(&self, ticket: Ticket, check: F) -> Result<Ticket, E>
    where
        E: From<StoreError>,
        F: FnOnce(&[&Ticket]) -> Result<(), E>,
    {
        let mut cache = self.cache();
        let existing: Vec<&Ticket> = cache.values().collect();
        check(&existing)?;
        if cache.contains_key(&ticket.channel_id) {
            return Err(StoreError::AlreadyExists(ticket.channel_id.clone()).into());
        }

        self.store.insert(&ticket)?;
        cache.insert(ticket.channel_id.clone(), ticket.clone());
        Ok(ticket)
    }

    /// Replace a ticket with the result of `transition`.
    ///
    /// `transition` sees the current record and either returns its successor
    /// or rejects the change.
    pub fn update<E, F>(&self, channel_id: &str, transition: F) -> Result<Ticket, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Ticket) -> Result<Ticket, E>,
    {
        let mut cache = self.cache();
        let current = cache
            .get(channel_id)
            .ok_or_else(|| StoreError::NotFound(channel_id.to_string()))?;

        let next = transition(current)?;
        self.store.update(&next)?;
        cache.insert(channel_id.to_string(), next.clone());
        Ok(next)
    }

    /// Remove a ticket if `check` accepts it. Returns the removed record.
    pub fn remove_if<E, F>(&self, channel_id: &str, check: F) -> Result<Ticket, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Ticket) -> Result<(), E>,
    {
        let mut cache = self.cache();
        let current = cache
            .get(channel_id)
            .ok_or_else(|| StoreError::NotFound(channel_id.to_string()))?;
        check(current)?;

        self.store.delete(channel_id)?;
        Ok(cache
            .remove(channel_id)
            .ok_or_else(|| StoreError::NotFound(channel_id.to_string()))?)
    }

    /// Remove a ticket unconditionally. Returns `None` if it was unknown.
    pub fn remove(&self, channel_id: &str) -> Result<Option<Ticket>, StoreError> {
        let mut cache = self.cache();
        if !cache.contains_key(channel_id) {
            return Ok(None);
        }
        self.store.delete(channel_id)?;
        Ok(cache.remove(channel_id))
    }

    /// Remove every ticket. Returns the removed records.
    pub fn drain(&self) -> Result<Vec<Ticket>, StoreError> {
        let mut cache = self.cache();
        self.store.delete_all()?;
        Ok(cache.drain().map(|(_, t)| t).collect())
    }
}
