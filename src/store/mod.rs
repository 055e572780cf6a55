//! Client-side state container.
//!
//! The [`Store`] composes one slice per entity kind. It is only mutated by
//! applying [`Action`]s, and shared through a [`StoreHandle`] that serializes
//! dispatches and announces each applied action on a revision channel.
//!
//! Requests follow a three-step shape: a slice sees `Pending(id)` when a
//! command starts, then exactly one of `Fulfilled(id, payload)` or
//! `Rejected(id, message)`.

mod collection;
pub mod members;
pub mod notifications;
pub mod tasks;
pub mod teams;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

pub use collection::{Collection, RequestKind, RequestStatus};
pub use members::{MemberAction, MemberSlice};
pub use notifications::{NotificationAction, NotificationSlice};
pub use tasks::{TaskAction, TaskSlice};
pub use teams::{TeamAction, TeamSlice};

/// Identifier of one issued request, unique per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of one request as seen by a slice.
#[derive(Debug, Clone, PartialEq)]
pub enum Request<T> {
    Pending(RequestId),
    Fulfilled(RequestId, T),
    Rejected(RequestId, String),
}

impl<T> Request<T> {
    pub fn id(&self) -> RequestId {
        match self {
            Request::Pending(id) | Request::Fulfilled(id, _) | Request::Rejected(id, _) => *id,
        }
    }

    fn phase(&self) -> &'static str {
        match self {
            Request::Pending(_) => "pending",
            Request::Fulfilled(..) => "fulfilled",
            Request::Rejected(..) => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Tasks(TaskAction),
    Members(MemberAction),
    Teams(TeamAction),
    Notifications(NotificationAction),
}

impl Action {
    fn describe(&self) -> (&'static str, String) {
        match self {
            Action::Tasks(action) => ("tasks", action.describe()),
            Action::Members(action) => ("members", action.describe()),
            Action::Teams(action) => ("teams", action.describe()),
            Action::Notifications(action) => ("notifications", action.describe()),
        }
    }
}

impl From<TaskAction> for Action {
    fn from(action: TaskAction) -> Self {
        Action::Tasks(action)
    }
}

impl From<MemberAction> for Action {
    fn from(action: MemberAction) -> Self {
        Action::Members(action)
    }
}

impl From<TeamAction> for Action {
    fn from(action: TeamAction) -> Self {
        Action::Teams(action)
    }
}

impl From<NotificationAction> for Action {
    fn from(action: NotificationAction) -> Self {
        Action::Notifications(action)
    }
}

pub(crate) fn describe_request<T>(name: &str, request: &Request<T>) -> String {
    format!("{name}/{} {}", request.phase(), request.id())
}

/// The composed read model. No invariant spans two slices.
#[derive(Debug, Clone, Default)]
pub struct Store {
    tasks: TaskSlice,
    members: MemberSlice,
    teams: TeamSlice,
    notifications: NotificationSlice,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &TaskSlice {
        &self.tasks
    }

    pub fn members(&self) -> &MemberSlice {
        &self.members
    }

    pub fn teams(&self) -> &TeamSlice {
        &self.teams
    }

    pub fn notifications(&self) -> &NotificationSlice {
        &self.notifications
    }

    pub fn apply(&mut self, action: Action) {
        let (slice, description) = action.describe();
        tracing::debug!(slice, action = %description, "apply");
        match action {
            Action::Tasks(action) => self.tasks.apply(action),
            Action::Members(action) => self.members.apply(action),
            Action::Teams(action) => self.teams.apply(action),
            Action::Notifications(action) => self.notifications.apply(action),
        }
    }
}

/// Shared, cloneable access to one [`Store`].
#[derive(Clone)]
pub struct StoreHandle {
    state: Arc<Mutex<Store>>,
    revision: Arc<watch::Sender<u64>>,
    next_request: Arc<AtomicU64>,
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new(Store::new())
    }
}

impl StoreHandle {
    pub fn new(store: Store) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(store)),
            revision: Arc::new(revision),
            next_request: Arc::new(AtomicU64::new(1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        // A panicking reader cannot leave a half-applied action behind.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn next_request_id(&self) -> RequestId {
        RequestId(self.next_request.fetch_add(1, Ordering::Relaxed))
    }

    /// Apply one action and bump the revision.
    pub fn dispatch(&self, action: impl Into<Action>) {
        {
            let mut store = self.lock();
            store.apply(action.into());
        }
        self.revision.send_modify(|revision| *revision += 1);
    }

    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> Store {
        self.lock().clone()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receiver that observes a new revision after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}
