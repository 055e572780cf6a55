//! Reqwest-backed [`Remote`] adapter.
//!
//! Owns transport details only: URL joining, bearer headers, status mapping
//! and JSON decoding.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{routes, Remote};
use crate::error::{Error, Result};
use crate::model::{
    LoginRequest, LoginResponse, Member, NewTask, NewTeam, Notification, RegisterRequest, Task,
    TaskPatch, Team, TeamMembersRequest, TeamPatch,
};
use crate::session::Credentials;

const USER_AGENT: &str = concat!("taskdeck/", env!("CARGO_PKG_VERSION"));

pub struct HttpRemote {
    client: Client,
    base: Url,
}

impl HttpRemote {
    /// Build an adapter rooted at `base_url`; a missing trailing slash is
    /// added so relative routes keep the full base path.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, normalize_base(base_url)?))
    }

    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// `<base>/<collection>/<id>` with `id` kept as one encoded segment.
    fn resource(&self, collection: &str, id: &str) -> Result<Url> {
        if id.trim().is_empty() || id == "." || id == ".." {
            return Err(Error::InvalidArgument(format!("invalid resource id '{id}'")));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfig(format!("base URL {} cannot carry a path", self.base)))?
            .pop_if_empty()
            .push(collection)
            .push(id);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        credentials: Option<&Credentials>,
    ) -> Result<RequestBuilder> {
        tracing::debug!(%method, %url, "remote request");
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        Ok(match credentials {
            Some(credentials) => builder.bearer_auth(credentials.token()),
            None => builder,
        })
    }

    async fn call<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let body = send(builder).await?;
        decode(&body)
    }

    async fn call_unit(&self, builder: RequestBuilder) -> Result<()> {
        send(builder).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, credentials: &Credentials) -> Result<T> {
        self.call(self.request(Method::GET, self.endpoint(path)?, Some(credentials))?)
            .await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        url: Url,
        credentials: Option<&Credentials>,
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.call(self.request(method, url, credentials)?.json(body))
            .await
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value> {
        self.send_json(Method::POST, self.endpoint(routes::REGISTER)?, None, request)
            .await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.send_json(Method::POST, self.endpoint(routes::LOGIN)?, None, request)
            .await
    }

    async fn list_users(&self, credentials: &Credentials) -> Result<Vec<Member>> {
        self.get(routes::USERS, credentials).await
    }

    async fn list_team_members(&self, credentials: &Credentials) -> Result<Vec<Member>> {
        self.get(routes::MY_TEAM_MEMBERS, credentials).await
    }

    async fn list_teams(&self, credentials: &Credentials) -> Result<Vec<Team>> {
        self.get(routes::TEAMS, credentials).await
    }

    async fn list_my_teams(&self, credentials: &Credentials) -> Result<Vec<Team>> {
        self.get(routes::MY_TEAMS, credentials).await
    }

    async fn create_team(&self, credentials: &Credentials, team: &NewTeam) -> Result<Team> {
        self.send_json(Method::POST, self.endpoint(routes::TEAMS)?, Some(credentials), team)
            .await
    }

    async fn update_team(
        &self,
        credentials: &Credentials,
        id: &str,
        patch: &TeamPatch,
    ) -> Result<Team> {
        self.send_json(Method::PATCH, self.resource(routes::TEAM, id)?, Some(credentials), patch)
            .await
    }

    async fn delete_team(&self, credentials: &Credentials, id: &str) -> Result<()> {
        let url = self.resource(routes::TEAM, id)?;
        self.call_unit(self.request(Method::DELETE, url, Some(credentials))?)
            .await
    }

    async fn add_team_members(
        &self,
        credentials: &Credentials,
        request: &TeamMembersRequest,
    ) -> Result<Team> {
        let url = self.endpoint(routes::TEAM_MEMBERS)?;
        self.send_json(Method::POST, url, Some(credentials), request)
            .await
    }

    async fn list_tasks(&self, credentials: &Credentials) -> Result<Vec<Task>> {
        self.get(routes::TASKS, credentials).await
    }

    async fn create_task(&self, credentials: &Credentials, task: &NewTask) -> Result<Task> {
        self.send_json(Method::POST, self.endpoint(routes::TASKS)?, Some(credentials), task)
            .await
    }

    async fn update_task(
        &self,
        credentials: &Credentials,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Task> {
        self.send_json(Method::PATCH, self.resource(routes::TASK, id)?, Some(credentials), patch)
            .await
    }

    async fn list_unseen(&self, credentials: &Credentials) -> Result<Vec<Notification>> {
        self.get(routes::UNSEEN, credentials).await
    }

    async fn mark_read(&self, credentials: &Credentials, id: &str) -> Result<()> {
        let url = self.resource(routes::TASK, id)?;
        self.call_unit(self.request(Method::PATCH, url, Some(credentials))?)
            .await
    }
}

/// Parse `base_url` and make sure its path ends with `/`.
pub(crate) fn normalize_base(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn send(builder: RequestBuilder) -> Result<Vec<u8>> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(map_status_error(status, &body));
    }
    Ok(body.to_vec())
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn map_status_error(status: StatusCode, body: &[u8]) -> Error {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message.or(parsed.error))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
    Error::Http {
        status: status.as_u16(),
        message,
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}
