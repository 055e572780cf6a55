//! Remote data client.
//!
//! Store commands only see the [`Remote`] port; [`HttpRemote`] is the
//! reqwest-backed adapter. Every call is issued once: no retry, no backoff
//! and no caching happen at this layer.

mod http;

pub use http::HttpRemote;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    LoginRequest, LoginResponse, Member, NewTask, NewTeam, Notification, RegisterRequest, Task,
    TaskPatch, Team, TeamMembersRequest, TeamPatch,
};
use crate::session::Credentials;

/// Relative API paths, joined onto the configured base URL.
pub mod routes {
    pub const REGISTER: &str = "user/register";
    pub const LOGIN: &str = "user/login";
    pub const USERS: &str = "user/";
    pub const MY_TEAM_MEMBERS: &str = "user/my-teams";
    pub const TEAMS: &str = "teams/";
    pub const MY_TEAMS: &str = "teams/my-teams";
    pub const TEAM_MEMBERS: &str = "teams/members";
    pub const TASKS: &str = "task/";
    pub const UNSEEN: &str = "task/unseen";

    /// Collection segments that take a resource id as the next segment.
    pub const TEAM: &str = "teams";
    pub const TASK: &str = "task";
}

#[async_trait]
pub trait Remote: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value>;

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    async fn list_users(&self, credentials: &Credentials) -> Result<Vec<Member>>;

    /// Members of the teams the caller belongs to.
    async fn list_team_members(&self, credentials: &Credentials) -> Result<Vec<Member>>;

    async fn list_teams(&self, credentials: &Credentials) -> Result<Vec<Team>>;

    async fn list_my_teams(&self, credentials: &Credentials) -> Result<Vec<Team>>;

    async fn create_team(&self, credentials: &Credentials, team: &NewTeam) -> Result<Team>;

    async fn update_team(
        &self,
        credentials: &Credentials,
        id: &str,
        patch: &TeamPatch,
    ) -> Result<Team>;

    async fn delete_team(&self, credentials: &Credentials, id: &str) -> Result<()>;

    async fn add_team_members(
        &self,
        credentials: &Credentials,
        request: &TeamMembersRequest,
    ) -> Result<Team>;

    async fn list_tasks(&self, credentials: &Credentials) -> Result<Vec<Task>>;

    async fn create_task(&self, credentials: &Credentials, task: &NewTask) -> Result<Task>;

    async fn update_task(
        &self,
        credentials: &Credentials,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Task>;

    /// Tasks assigned to the caller that have not been marked read.
    async fn list_unseen(&self, credentials: &Credentials) -> Result<Vec<Notification>>;

    async fn mark_read(&self, credentials: &Credentials, id: &str) -> Result<()>;
}
