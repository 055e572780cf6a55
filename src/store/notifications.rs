//! Notification feed fed by two writers: fetches of unseen tasks and live
//! pushes from the channel.
//!
//! The two are reconciled by id. A push that lands while a fetch is in
//! flight is remembered until that fetch settles; if the fetched payload
//! does not contain it, it is put back in front of the payload. Pushes are
//! kept newest first.

use super::{describe_request, Collection, Request, RequestKind, RequestStatus};
use crate::model::Notification;

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    Fetch(Request<Vec<Notification>>),
    Pushed(Notification),
    /// Fulfilled with the id of the notification confirmed as read.
    MarkRead(Request<String>),
}

impl NotificationAction {
    pub(crate) fn describe(&self) -> String {
        match self {
            NotificationAction::Fetch(request) => describe_request("fetch", request),
            NotificationAction::Pushed(notification) => format!("pushed {}", notification.id),
            NotificationAction::MarkRead(request) => describe_request("mark_read", request),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationSlice {
    notifications: Collection<Notification>,
    pushed_during_fetch: Vec<Notification>,
}

impl NotificationSlice {
    pub fn items(&self) -> &[Notification] {
        self.notifications.items()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.notifications.get(id)
    }

    pub fn status(&self) -> &RequestStatus {
        self.notifications.status()
    }

    pub fn unread_count(&self) -> usize {
        self.items().iter().filter(|n| n.is_unread()).count()
    }

    pub fn unread_ids(&self) -> Vec<String> {
        self.items()
            .iter()
            .filter(|n| n.is_unread())
            .map(|n| n.id.clone())
            .collect()
    }

    pub(crate) fn apply(&mut self, action: NotificationAction) {
        match action {
            NotificationAction::Fetch(Request::Pending(id)) => {
                self.notifications.begin(id, RequestKind::Fetch)
            }
            NotificationAction::Fetch(Request::Fulfilled(id, mut payload)) => {
                if self.notifications.fetch_fulfilled(id, Vec::new()) {
                    let missing: Vec<Notification> = self
                        .pushed_during_fetch
                        .iter()
                        .filter(|pushed| !payload.iter().any(|n| n.id == pushed.id))
                        .cloned()
                        .collect();
                    payload.splice(0..0, missing);
                    for notification in payload {
                        self.notifications.upsert(notification);
                    }
                }
                self.forget_pushes_when_idle();
            }
            NotificationAction::Fetch(Request::Rejected(id, message)) => {
                self.notifications.rejected(id, message);
                self.forget_pushes_when_idle();
            }
            NotificationAction::Pushed(notification) => {
                if self.notifications.fetch_in_flight() {
                    self.pushed_during_fetch.retain(|n| n.id != notification.id);
                    self.pushed_during_fetch.insert(0, notification.clone());
                }
                self.notifications.push_front(notification);
            }
            NotificationAction::MarkRead(Request::Pending(id)) => {
                self.notifications.begin(id, RequestKind::Mutation)
            }
            NotificationAction::MarkRead(Request::Fulfilled(id, notification_id)) => {
                if self.notifications.settle_mutation(id) {
                    self.mark_read_locally(&notification_id);
                }
            }
            NotificationAction::MarkRead(Request::Rejected(id, message)) => {
                self.notifications.rejected(id, message);
            }
        }
    }

    fn mark_read_locally(&mut self, notification_id: &str) {
        let found = self
            .notifications
            .modify(notification_id, |notification| notification.read = true);
        if !found {
            tracing::warn!(id = notification_id, "confirmed read for unknown notification");
        }
        self.pushed_during_fetch
            .iter_mut()
            .filter(|n| n.id == notification_id)
            .for_each(|n| n.read = true);
    }

    fn forget_pushes_when_idle(&mut self) {
        if !self.notifications.fetch_in_flight() {
            self.pushed_during_fetch.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RequestId;

    fn notification(id: &str, read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            read,
            status: None,
            priority: None,
            assigned_to: None,
        }
    }

    fn ids(slice: &NotificationSlice) -> Vec<&str> {
        slice.items().iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn push_during_fetch_survives_when_fetch_resolves_after() {
        let mut slice = NotificationSlice::default();
        slice.apply(NotificationAction::Fetch(Request::Pending(RequestId(1))));
        slice.apply(NotificationAction::Pushed(notification("live", false)));
        slice.apply(NotificationAction::Fetch(Request::Fulfilled(
            RequestId(1),
            vec![notification("a", false), notification("b", true)],
        )));

        assert_eq!(ids(&slice), vec!["live", "a", "b"]);
        assert_eq!(slice.unread_count(), 2);
    }

    #[test]
    fn push_after_fetch_lands_in_front() {
        let mut slice = NotificationSlice::default();
        slice.apply(NotificationAction::Fetch(Request::Pending(RequestId(1))));
        slice.apply(NotificationAction::Fetch(Request::Fulfilled(
            RequestId(1),
            vec![notification("a", false)],
        )));
        slice.apply(NotificationAction::Pushed(notification("live", false)));

        assert_eq!(ids(&slice), vec!["live", "a"]);
        assert_eq!(slice.unread_count(), 2);
    }

    #[test]
    fn fetched_copy_wins_over_pushed_copy() {
        let mut slice = NotificationSlice::default();
        slice.apply(NotificationAction::Fetch(Request::Pending(RequestId(1))));
        slice.apply(NotificationAction::Pushed(notification("a", false)));
        slice.apply(NotificationAction::Fetch(Request::Fulfilled(
            RequestId(1),
            vec![notification("a", true)],
        )));

        assert_eq!(ids(&slice), vec!["a"]);
        assert_eq!(slice.unread_count(), 0);
    }

    #[test]
    fn duplicate_push_moves_entry_to_front() {
        let mut slice = NotificationSlice::default();
        slice.apply(NotificationAction::Pushed(notification("a", false)));
        slice.apply(NotificationAction::Pushed(notification("b", false)));
        slice.apply(NotificationAction::Pushed(notification("a", false)));
        assert_eq!(ids(&slice), vec!["a", "b"]);
        assert_eq!(slice.unread_count(), 2);
    }

    #[test]
    fn failed_fetch_keeps_pushes_and_records_error() {
        let mut slice = NotificationSlice::default();
        slice.apply(NotificationAction::Fetch(Request::Pending(RequestId(1))));
        slice.apply(NotificationAction::Pushed(notification("live", false)));
        slice.apply(NotificationAction::Fetch(Request::Rejected(
            RequestId(1),
            "Failed to fetch notifications".to_string(),
        )));
        assert_eq!(ids(&slice), vec!["live"]);
        assert_eq!(
            slice.status().error.as_deref(),
            Some("Failed to fetch notifications")
        );
    }

    #[test]
    fn mark_read_flips_one_entry() {
        let mut slice = NotificationSlice::default();
        slice.apply(NotificationAction::Fetch(Request::Pending(RequestId(1))));
        slice.apply(NotificationAction::Fetch(Request::Fulfilled(
            RequestId(1),
            vec![notification("a", false), notification("b", false)],
        )));
        assert_eq!(slice.unread_ids(), vec!["a", "b"]);

        slice.apply(NotificationAction::MarkRead(Request::Pending(RequestId(2))));
        slice.apply(NotificationAction::MarkRead(Request::Pending(RequestId(3))));
        slice.apply(NotificationAction::MarkRead(Request::Fulfilled(
            RequestId(2),
            "a".to_string(),
        )));
        slice.apply(NotificationAction::MarkRead(Request::Rejected(
            RequestId(3),
            "Request failed with status code 500".to_string(),
        )));

        assert_eq!(slice.unread_count(), 1);
        assert_eq!(slice.unread_ids(), vec!["b"]);
        assert!(!slice.status().loading);
    }

    #[test]
    fn confirm_for_unknown_notification_changes_nothing() {
        let mut slice = NotificationSlice::default();
        slice.apply(NotificationAction::MarkRead(Request::Pending(RequestId(1))));
        slice.apply(NotificationAction::MarkRead(Request::Fulfilled(
            RequestId(1),
            "gone".to_string(),
        )));
        assert!(slice.items().is_empty());
        assert_eq!(slice.status().error, None);
    }
}
