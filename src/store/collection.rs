//! Normalized entity collection with request bookkeeping.
//!
//! Every request issued against a collection is registered under its
//! [`RequestId`] when it starts and removed when it settles; `loading` is
//! derived from that set, so overlapping requests never clear it early.

use std::collections::BTreeMap;

use serde::Serialize;

use super::RequestId;
use crate::model::Entity;

/// Loading and error flags shown alongside a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestStatus {
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Fetch,
    Mutation,
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    status: RequestStatus,
    in_flight: BTreeMap<RequestId, RequestKind>,
    latest_fetch: Option<RequestId>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: RequestStatus::default(),
            in_flight: BTreeMap::new(),
            latest_fetch: None,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    pub fn loading(&self) -> bool {
        self.status.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.status.error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.in_flight
            .values()
            .any(|kind| *kind == RequestKind::Fetch)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Register a request. Clears the previous error and raises `loading`.
    pub fn begin(&mut self, request: RequestId, kind: RequestKind) {
        self.status.error = None;
        self.in_flight.insert(request, kind);
        if kind == RequestKind::Fetch {
            self.latest_fetch = Some(request);
        }
        self.status.loading = true;
    }

    /// Remove `request` from the in-flight set.
    ///
    /// Returns `None` for an unknown or already-settled id; the caller must
    /// then leave the collection untouched.
    fn settle(&mut self, request: RequestId) -> Option<RequestKind> {
        let kind = self.in_flight.remove(&request);
        if kind.is_none() {
            tracing::debug!(
                entity = T::KIND,
                request = %request,
                "ignoring settle for unknown request"
            );
        }
        self.status.loading = !self.in_flight.is_empty();
        kind
    }

    fn superseded(&self, request: RequestId, kind: RequestKind) -> bool {
        kind == RequestKind::Fetch && self.latest_fetch != Some(request)
    }

    /// Replace the whole collection with a fetch result.
    ///
    /// Returns `false` when the result was ignored (unknown request, or a
    /// newer fetch of this collection was issued since).
    pub fn fetch_fulfilled(&mut self, request: RequestId, items: Vec<T>) -> bool {
        let Some(kind) = self.settle(request) else {
            return false;
        };
        if self.superseded(request, kind) {
            tracing::debug!(
                entity = T::KIND,
                request = %request,
                "discarding superseded fetch result"
            );
            return false;
        }
        self.items = items;
        true
    }

    /// Record a failed request. Superseded fetch failures are dropped.
    pub fn rejected(&mut self, request: RequestId, message: String) -> bool {
        let Some(kind) = self.settle(request) else {
            return false;
        };
        if self.superseded(request, kind) {
            tracing::debug!(
                entity = T::KIND,
                request = %request,
                %message,
                "discarding superseded fetch failure"
            );
            return false;
        }
        self.status.error = Some(message);
        true
    }

    /// Settle a mutation; `false` when the id was unknown.
    pub fn settle_mutation(&mut self, request: RequestId) -> bool {
        self.settle(request).is_some()
    }

    pub fn create_fulfilled(&mut self, request: RequestId, item: T) -> bool {
        if !self.settle_mutation(request) {
            return false;
        }
        self.upsert(item);
        true
    }

    pub fn update_fulfilled(&mut self, request: RequestId, item: T) -> bool {
        if !self.settle_mutation(request) {
            return false;
        }
        self.replace(item)
    }

    pub fn delete_fulfilled(&mut self, request: RequestId, id: &str) -> bool {
        if !self.settle_mutation(request) {
            return false;
        }
        self.remove(id).is_some()
    }

    /// Append `item`, or replace the entry that already has its id.
    pub fn upsert(&mut self, item: T) {
        match self.position(item.id()) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    /// Put `item` first, dropping any older entry with the same id.
    pub fn push_front(&mut self, item: T) {
        if let Some(index) = self.position(item.id()) {
            self.items.remove(index);
        }
        self.items.insert(0, item);
    }

    /// Replace in place; a missing id is reported as not found.
    pub fn replace(&mut self, item: T) -> bool {
        match self.position(item.id()) {
            Some(index) => {
                self.items[index] = item;
                true
            }
            None => {
                let id = item.id().to_string();
                self.not_found(&id);
                false
            }
        }
    }

    /// Replace in place only when present; no error otherwise.
    pub fn replace_if_present(&mut self, item: T) -> bool {
        match self.position(item.id()) {
            Some(index) => {
                self.items[index] = item;
                true
            }
            None => false,
        }
    }

    /// Remove by id; a missing id is reported as not found.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        match self.position(id) {
            Some(index) => Some(self.items.remove(index)),
            None => {
                self.not_found(id);
                None
            }
        }
    }

    pub fn remove_if_present(&mut self, id: &str) -> Option<T> {
        self.position(id).map(|index| self.items.remove(index))
    }

    /// Apply `f` to the entry with `id`; `false` when absent.
    pub fn modify(&mut self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        match self.position(id) {
            Some(index) => {
                f(&mut self.items[index]);
                true
            }
            None => false,
        }
    }

    /// Set the error without a request, e.g. after failed local validation.
    ///
    /// `loading` is left alone: it keeps reporting requests that are still
    /// in flight, so both flags can be set at once.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status.error = Some(message.into());
    }

    /// Back to the empty state; in-flight requests are forgotten and their
    /// settles ignored.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn not_found(&mut self, id: &str) {
        let message = format!("{} {} not found", T::KIND, id);
        tracing::warn!(entity = T::KIND, id, "{message}");
        self.status.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, TaskPriority, TaskStatus};

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Low,
            assigned_to: None,
            read: None,
        }
    }

    fn ids(collection: &Collection<Task>) -> Vec<&str> {
        collection.items().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn begin_clears_error_and_sets_loading() {
        let mut collection = Collection::<Task>::new();
        collection.fail("boom");
        collection.begin(RequestId(1), RequestKind::Fetch);
        assert!(collection.loading());
        assert_eq!(collection.error(), None);

        assert!(collection.fetch_fulfilled(RequestId(1), vec![task("a", "A")]));
        assert!(!collection.loading());
        assert_eq!(ids(&collection), vec!["a"]);
    }

    #[test]
    fn overlapping_requests_keep_loading_until_last_settles() {
        let mut collection = Collection::<Task>::new();
        collection.begin(RequestId(1), RequestKind::Fetch);
        collection.begin(RequestId(2), RequestKind::Mutation);

        assert!(collection.create_fulfilled(RequestId(2), task("b", "B")));
        assert!(collection.loading());
        assert_eq!(collection.in_flight(), 1);

        assert!(collection.fetch_fulfilled(RequestId(1), vec![task("a", "A")]));
        assert!(!collection.loading());
    }

    #[test]
    fn superseded_fetch_is_discarded() {
        let mut collection = Collection::<Task>::new();
        collection.begin(RequestId(1), RequestKind::Fetch);
        collection.begin(RequestId(2), RequestKind::Fetch);

        assert!(collection.fetch_fulfilled(RequestId(2), vec![task("new", "New")]));
        assert!(collection.loading());
        assert!(!collection.fetch_fulfilled(RequestId(1), vec![task("old", "Old")]));
        assert!(!collection.loading());
        assert_eq!(ids(&collection), vec!["new"]);

        collection.begin(RequestId(3), RequestKind::Fetch);
        collection.begin(RequestId(4), RequestKind::Fetch);
        assert!(!collection.rejected(RequestId(3), "stale".to_string()));
        assert_eq!(collection.error(), None);
    }

    #[test]
    fn settling_twice_is_ignored() {
        let mut collection = Collection::<Task>::new();
        collection.begin(RequestId(1), RequestKind::Mutation);
        assert!(collection.create_fulfilled(RequestId(1), task("a", "A")));
        assert!(!collection.create_fulfilled(RequestId(1), task("b", "B")));
        assert!(!collection.rejected(RequestId(1), "late".to_string()));
        assert_eq!(ids(&collection), vec!["a"]);
        assert_eq!(collection.error(), None);
    }

    #[test]
    fn create_with_existing_id_replaces() {
        let mut collection = Collection::<Task>::new();
        collection.upsert(task("a", "First"));
        collection.begin(RequestId(1), RequestKind::Mutation);
        assert!(collection.create_fulfilled(RequestId(1), task("a", "Second")));
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("a").map(|t| t.title.as_str()), Some("Second"));
    }

    #[test]
    fn update_of_missing_entity_reports_not_found() {
        let mut collection = Collection::<Task>::new();
        collection.upsert(task("a", "A"));
        collection.begin(RequestId(1), RequestKind::Mutation);

        assert!(!collection.update_fulfilled(RequestId(1), task("zzz", "Z")));
        assert_eq!(ids(&collection), vec!["a"]);
        assert_eq!(collection.error(), Some("Task zzz not found"));
        assert!(!collection.loading());
    }

    #[test]
    fn push_front_moves_existing_entry() {
        let mut collection = Collection::<Task>::new();
        collection.upsert(task("a", "A"));
        collection.upsert(task("b", "B"));
        collection.push_front(task("b", "B2"));
        assert_eq!(ids(&collection), vec!["b", "a"]);
        assert_eq!(collection.items()[0].title, "B2");
    }

    #[test]
    fn local_failure_during_fetch_keeps_both_flags() {
        let mut collection = Collection::<Task>::new();
        collection.begin(RequestId(1), RequestKind::Fetch);
        collection.fail("Title is required");
        assert!(collection.loading());
        assert_eq!(collection.error(), Some("Title is required"));

        assert!(collection.fetch_fulfilled(RequestId(1), vec![task("a", "A")]));
        assert!(!collection.loading());
        assert_eq!(collection.error(), Some("Title is required"));
        assert_eq!(ids(&collection), vec!["a"]);
    }

    #[test]
    fn reset_forgets_in_flight_requests() {
        let mut collection = Collection::<Task>::new();
        collection.begin(RequestId(1), RequestKind::Fetch);
        collection.reset();
        assert!(!collection.loading());
        assert!(!collection.fetch_fulfilled(RequestId(1), vec![task("a", "A")]));
        assert!(collection.is_empty());
    }
}
