#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use taskdeck::api::Remote;
use taskdeck::commands::Commands;
use taskdeck::model::{
    LoginRequest, LoginResponse, Member, NewTask, NewTeam, Notification, RegisterRequest, Task,
    TaskPatch, Team, TeamMembersRequest, TeamPatch,
};
use taskdeck::session::Credentials;
use taskdeck::store::{Store, StoreHandle};
use taskdeck::{Error, Result};

struct Reply {
    gate: Option<oneshot::Receiver<()>>,
    outcome: std::result::Result<Value, (u16, String)>,
}

/// Remote that answers from a per-call script and records every call.
///
/// Calls are keyed by method name; `mark_read` is keyed as
/// `mark_read <id>` so tests can script each notification separately.
#[derive(Default)]
pub struct FakeRemote {
    script: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, call: &str, value: Value) {
        self.push(call, None, Ok(value));
    }

    pub fn fail(&self, call: &str, status: u16, message: &str) {
        self.push(call, None, Err((status, message.to_string())));
    }

    /// Reply with `value` only once the returned sender fires.
    pub fn gated(&self, call: &str, value: Value) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.push(call, Some(gate), Ok(value));
        release
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn push(
        &self,
        call: &str,
        gate: Option<oneshot::Receiver<()>>,
        outcome: std::result::Result<Value, (u16, String)>,
    ) {
        self.script
            .lock()
            .unwrap()
            .entry(call.to_string())
            .or_default()
            .push_back(Reply { gate, outcome });
    }

    async fn respond<T: DeserializeOwned>(&self, call: &str) -> Result<T> {
        self.calls.lock().unwrap().push(call.to_string());
        let reply = self
            .script
            .lock()
            .unwrap()
            .get_mut(call)
            .and_then(VecDeque::pop_front);
        let Some(reply) = reply else {
            return Err(Error::OperationFailed(format!("unscripted call: {call}")));
        };
        if let Some(gate) = reply.gate {
            let _ = gate.await;
        }
        match reply.outcome {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err((status, message)) => Err(Error::Http { status, message }),
        }
    }
}

#[async_trait]
impl Remote for FakeRemote {
    async fn register(&self, _request: &RegisterRequest) -> Result<Value> {
        self.respond("register").await
    }

    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse> {
        self.respond("login").await
    }

    async fn list_users(&self, _credentials: &Credentials) -> Result<Vec<Member>> {
        self.respond("list_users").await
    }

    async fn list_team_members(&self, _credentials: &Credentials) -> Result<Vec<Member>> {
        self.respond("list_team_members").await
    }

    async fn list_teams(&self, _credentials: &Credentials) -> Result<Vec<Team>> {
        self.respond("list_teams").await
    }

    async fn list_my_teams(&self, _credentials: &Credentials) -> Result<Vec<Team>> {
        self.respond("list_my_teams").await
    }

    async fn create_team(&self, _credentials: &Credentials, _team: &NewTeam) -> Result<Team> {
        self.respond("create_team").await
    }

    async fn update_team(
        &self,
        _credentials: &Credentials,
        _id: &str,
        _patch: &TeamPatch,
    ) -> Result<Team> {
        self.respond("update_team").await
    }

    async fn delete_team(&self, _credentials: &Credentials, _id: &str) -> Result<()> {
        self.respond("delete_team").await
    }

    async fn add_team_members(
        &self,
        _credentials: &Credentials,
        _request: &TeamMembersRequest,
    ) -> Result<Team> {
        self.respond("add_team_members").await
    }

    async fn list_tasks(&self, _credentials: &Credentials) -> Result<Vec<Task>> {
        self.respond("list_tasks").await
    }

    async fn create_task(&self, _credentials: &Credentials, _task: &NewTask) -> Result<Task> {
        self.respond("create_task").await
    }

    async fn update_task(
        &self,
        _credentials: &Credentials,
        _id: &str,
        _patch: &TaskPatch,
    ) -> Result<Task> {
        self.respond("update_task").await
    }

    async fn list_unseen(&self, _credentials: &Credentials) -> Result<Vec<Notification>> {
        self.respond("list_unseen").await
    }

    async fn mark_read(&self, _credentials: &Credentials, id: &str) -> Result<()> {
        self.respond(&format!("mark_read {id}")).await
    }
}

pub fn commands(remote: &Arc<FakeRemote>) -> Commands {
    Commands::new(
        remote.clone(),
        StoreHandle::default(),
        Credentials::new("test-token"),
    )
}

/// Yield until `condition` holds on the store, failing after a bounded
/// number of scheduler turns.
pub async fn wait_for(store: &StoreHandle, condition: impl Fn(&Store) -> bool) {
    for _ in 0..200 {
        if store.read(&condition) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("store never reached the expected state: {store:?}");
}

/// Yield until the remote has seen `count` calls.
pub async fn wait_for_calls(remote: &FakeRemote, count: usize) {
    for _ in 0..200 {
        if remote.call_count() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("remote saw {:?}, expected {count} calls", remote.calls());
}
