//! Store commands: validate locally, call the remote, report to the store.
//!
//! Every remote-backed command dispatches `Pending` before the call and
//! exactly one of `Fulfilled` / `Rejected` after it. Validation failures are
//! recorded on the slice and never reach the remote.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;

use crate::api::Remote;
use crate::error::{Error, Result};
use crate::model::{
    LoginRequest, Member, NewTask, NewTeam, Notification, RegisterRequest, RegistrationForm,
    Task, TaskPatch, Team, TeamMembersRequest, TeamPatch,
};
use crate::session::{Credentials, Session};
use crate::store::{
    Action, MemberAction, NotificationAction, Request, StoreHandle, TaskAction, TeamAction,
};
use crate::validate::{self, ValidationErrors};

/// Outcome of marking every unread notification as read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkReadReport {
    pub confirmed: Vec<String>,
    pub failed: Vec<MarkReadFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkReadFailure {
    pub id: String,
    pub message: String,
}

impl MarkReadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Commands bound to one store, one remote and one set of credentials.
#[derive(Clone)]
pub struct Commands {
    remote: Arc<dyn Remote>,
    store: StoreHandle,
    credentials: Credentials,
}

impl Commands {
    pub fn new(remote: Arc<dyn Remote>, store: StoreHandle, credentials: Credentials) -> Self {
        Self {
            remote,
            store,
            credentials,
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Run `call` as one tracked request.
    async fn track<T, W, F>(&self, wrap: W, fallback: &str, call: F) -> Result<T>
    where
        T: Clone,
        W: Fn(Request<T>) -> Action,
        F: Future<Output = Result<T>>,
    {
        let id = self.store.next_request_id();
        self.store.dispatch(wrap(Request::Pending(id)));
        match call.await {
            Ok(value) => {
                self.store.dispatch(wrap(Request::Fulfilled(id, value.clone())));
                Ok(value)
            }
            Err(err) => {
                let message = err.slice_message(fallback);
                tracing::debug!(request = %id, error = %err, "request rejected");
                self.store.dispatch(wrap(Request::Rejected(id, message)));
                Err(err)
            }
        }
    }

    fn invalid(&self, action: impl Into<Action>, errors: ValidationErrors) -> Error {
        self.store.dispatch(action);
        Error::Validation(errors)
    }

    pub async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        self.track(
            |r| TaskAction::Fetch(r).into(),
            "Failed to fetch tasks",
            self.remote.list_tasks(&self.credentials),
        )
        .await
    }

    pub async fn create_task(&self, task: NewTask) -> Result<Task> {
        if let Err(errors) = validate::validate_new_task(&task) {
            let message = errors.first_message().unwrap_or_default().to_string();
            return Err(self.invalid(TaskAction::Invalid(message), errors));
        }
        self.track(
            |r| TaskAction::Create(r).into(),
            "Failed to create task",
            self.remote.create_task(&self.credentials, &task),
        )
        .await
    }

    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let mut errors = ValidationErrors::new();
        if patch.is_empty() {
            errors.add("patch", "Nothing to update");
        }
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            errors.add("title", "Title is required");
        }
        if patch.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            errors.add("description", "Description is required");
        }
        if let Some(message) = errors.first_message().map(str::to_string) {
            return Err(self.invalid(TaskAction::Invalid(message), errors));
        }
        self.track(
            |r| TaskAction::Update(r).into(),
            "Failed to update task",
            self.remote.update_task(&self.credentials, id, &patch),
        )
        .await
    }

    pub async fn fetch_members(&self) -> Result<Vec<Member>> {
        self.track(
            |r| MemberAction::FetchAll(r).into(),
            "Failed to fetch members",
            self.remote.list_users(&self.credentials),
        )
        .await
    }

    pub async fn fetch_team_members(&self) -> Result<Vec<Member>> {
        self.track(
            |r| MemberAction::FetchTeam(r).into(),
            "Failed to fetch team members",
            self.remote.list_team_members(&self.credentials),
        )
        .await
    }

    pub async fn fetch_teams(&self) -> Result<Vec<Team>> {
        self.track(
            |r| TeamAction::Fetch(r).into(),
            "Failed to fetch teams",
            self.remote.list_teams(&self.credentials),
        )
        .await
    }

    pub async fn fetch_user_teams(&self) -> Result<Vec<Team>> {
        self.track(
            |r| TeamAction::FetchMine(r).into(),
            "Failed to fetch user teams",
            self.remote.list_my_teams(&self.credentials),
        )
        .await
    }

    pub async fn create_team(&self, team: NewTeam) -> Result<Team> {
        if let Err(errors) = validate::validate_new_team(&team) {
            let message = errors.first_message().unwrap_or_default().to_string();
            return Err(self.invalid(TeamAction::Invalid(message), errors));
        }
        self.track(
            |r| TeamAction::Create(r).into(),
            "Failed to create team",
            self.remote.create_team(&self.credentials, &team),
        )
        .await
    }

    pub async fn update_team(&self, id: &str, patch: TeamPatch) -> Result<Team> {
        let check = match patch.name.as_deref() {
            Some(name) => validate::validate_team_name(name),
            None if patch.is_empty() => Err(ValidationErrors::single("patch", "Nothing to update")),
            None => Ok(()),
        };
        if let Err(errors) = check {
            let message = errors.first_message().unwrap_or_default().to_string();
            return Err(self.invalid(TeamAction::Invalid(message), errors));
        }
        self.track(
            |r| TeamAction::Update(r).into(),
            "Failed to update team",
            self.remote.update_team(&self.credentials, id, &patch),
        )
        .await
    }

    pub async fn delete_team(&self, id: &str) -> Result<String> {
        let call = async {
            self.remote.delete_team(&self.credentials, id).await?;
            Ok::<_, Error>(id.to_string())
        };
        self.track(|r| TeamAction::Delete(r).into(), "Failed to delete team", call)
            .await
    }

    pub async fn add_team_members(&self, request: TeamMembersRequest) -> Result<Team> {
        if let Err(errors) = validate::validate_team_members(&request) {
            let message = errors.first_message().unwrap_or_default().to_string();
            return Err(self.invalid(TeamAction::Invalid(message), errors));
        }
        self.track(
            |r| TeamAction::AddMembers(r).into(),
            "Failed to add team members",
            self.remote.add_team_members(&self.credentials, &request),
        )
        .await
    }

    pub fn set_current_team(&self, team: Option<Team>) {
        self.store.dispatch(TeamAction::SetCurrent(team));
    }

    pub fn reset_teams(&self) {
        self.store.dispatch(TeamAction::Reset);
    }

    pub async fn fetch_notifications(&self) -> Result<Vec<Notification>> {
        self.track(
            |r| NotificationAction::Fetch(r).into(),
            "Failed to fetch notifications",
            self.remote.list_unseen(&self.credentials),
        )
        .await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<()> {
        let call = async {
            self.remote.mark_read(&self.credentials, id).await?;
            Ok::<_, Error>(id.to_string())
        };
        self.track(
            |r| NotificationAction::MarkRead(r).into(),
            "Failed to mark notification as read",
            call,
        )
        .await
        .map(|_| ())
    }

    /// Confirm every unread notification independently.
    ///
    /// A failure on one entry leaves it unread and does not stop the others.
    pub async fn mark_all_read(&self) -> MarkReadReport {
        let unread = self.store.read(|store| store.notifications().unread_ids());
        let outcomes = join_all(unread.iter().map(|id| self.mark_notification_read(id))).await;

        let mut report = MarkReadReport::default();
        for (id, outcome) in unread.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.confirmed.push(id),
                Err(err) => {
                    let message = err.slice_message("Failed to mark notification as read");
                    tracing::warn!(id = %id, error = %message, "mark read failed");
                    report.failed.push(MarkReadFailure { id, message });
                }
            }
        }
        report
    }
}

/// Validate the form and create the account. Nothing is sent when the form
/// is invalid.
pub async fn register(remote: &dyn Remote, form: &RegistrationForm) -> Result<serde_json::Value> {
    validate::validate_registration(form).map_err(Error::Validation)?;
    remote.register(&RegisterRequest::from(form)).await
}

/// Exchange email and password for a session holding the bearer token.
pub async fn login(remote: &dyn Remote, email: &str, password: &str) -> Result<Session> {
    validate::validate_login(email, password).map_err(Error::Validation)?;
    let email = email.trim();
    let response = remote
        .login(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await?;
    if response.token.trim().is_empty() {
        return Err(Error::Protocol("login response carried an empty token".to_string()));
    }
    let display_name = response.display_name(email);
    Ok(Session::new(response.token, display_name, email))
}
