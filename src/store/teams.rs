//! Teams slice: every team, the caller's own teams and the team being edited.
//!
//! Mutations are tracked on the `teams` list; their results are mirrored into
//! `user_teams` so both views agree after a create, update or delete.

use super::{describe_request, Collection, Request, RequestKind, RequestStatus};
use crate::model::Team;

#[derive(Debug, Clone, PartialEq)]
pub enum TeamAction {
    Fetch(Request<Vec<Team>>),
    FetchMine(Request<Vec<Team>>),
    Create(Request<Team>),
    Update(Request<Team>),
    /// Fulfilled with the deleted team's id.
    Delete(Request<String>),
    AddMembers(Request<Team>),
    SetCurrent(Option<Team>),
    Reset,
    Invalid(String),
}

impl TeamAction {
    pub(crate) fn describe(&self) -> String {
        match self {
            TeamAction::Fetch(request) => describe_request("fetch", request),
            TeamAction::FetchMine(request) => describe_request("fetch_mine", request),
            TeamAction::Create(request) => describe_request("create", request),
            TeamAction::Update(request) => describe_request("update", request),
            TeamAction::Delete(request) => describe_request("delete", request),
            TeamAction::AddMembers(request) => describe_request("add_members", request),
            TeamAction::SetCurrent(team) => format!(
                "set_current {}",
                team.as_ref().map(|team| team.id.as_str()).unwrap_or("-")
            ),
            TeamAction::Reset => "reset".to_string(),
            TeamAction::Invalid(message) => format!("invalid: {message}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamSlice {
    teams: Collection<Team>,
    user_teams: Collection<Team>,
    current_team: Option<Team>,
}

impl TeamSlice {
    pub fn teams(&self) -> &[Team] {
        self.teams.items()
    }

    pub fn status(&self) -> &RequestStatus {
        self.teams.status()
    }

    pub fn user_teams(&self) -> &[Team] {
        self.user_teams.items()
    }

    pub fn user_teams_status(&self) -> &RequestStatus {
        self.user_teams.status()
    }

    pub fn current_team(&self) -> Option<&Team> {
        self.current_team.as_ref()
    }

    pub fn get(&self, id: &str) -> Option<&Team> {
        self.teams.get(id).or_else(|| self.user_teams.get(id))
    }

    pub(crate) fn apply(&mut self, action: TeamAction) {
        match action {
            TeamAction::Fetch(request) => fetch(&mut self.teams, request),
            TeamAction::FetchMine(request) => fetch(&mut self.user_teams, request),

            TeamAction::Create(Request::Pending(id))
            | TeamAction::Update(Request::Pending(id))
            | TeamAction::Delete(Request::Pending(id))
            | TeamAction::AddMembers(Request::Pending(id)) => {
                self.teams.begin(id, RequestKind::Mutation)
            }

            TeamAction::Create(Request::Fulfilled(id, team)) => {
                if self.teams.create_fulfilled(id, team.clone()) {
                    self.user_teams.upsert(team);
                }
            }
            TeamAction::Update(Request::Fulfilled(id, team)) => {
                if self.teams.settle_mutation(id) {
                    self.replace_everywhere(team);
                    self.current_team = None;
                }
            }
            TeamAction::AddMembers(Request::Fulfilled(id, team)) => {
                if self.teams.settle_mutation(id) {
                    self.replace_everywhere(team);
                }
            }
            TeamAction::Delete(Request::Fulfilled(id, team_id)) => {
                if self.teams.settle_mutation(id) {
                    let in_teams = self.teams.remove_if_present(&team_id).is_some();
                    let in_user_teams = self.user_teams.remove_if_present(&team_id).is_some();
                    if !in_teams && !in_user_teams {
                        self.teams.remove(&team_id);
                    }
                    if self.current_team.as_ref().map(|team| team.id.as_str())
                        == Some(team_id.as_str())
                    {
                        self.current_team = None;
                    }
                }
            }

            TeamAction::Create(Request::Rejected(id, message))
            | TeamAction::Update(Request::Rejected(id, message))
            | TeamAction::Delete(Request::Rejected(id, message))
            | TeamAction::AddMembers(Request::Rejected(id, message)) => {
                self.teams.rejected(id, message);
            }

            TeamAction::SetCurrent(team) => self.current_team = team,
            TeamAction::Reset => *self = TeamSlice::default(),
            TeamAction::Invalid(message) => self.teams.fail(message),
        }
    }

    /// Replace `team` in both lists; not found only when it is in neither.
    fn replace_everywhere(&mut self, team: Team) {
        let in_user_teams = self.user_teams.replace_if_present(team.clone());
        if in_user_teams {
            self.teams.replace_if_present(team);
        } else {
            self.teams.replace(team);
        }
    }
}

fn fetch(collection: &mut Collection<Team>, request: Request<Vec<Team>>) {
    match request {
        Request::Pending(id) => collection.begin(id, RequestKind::Fetch),
        Request::Fulfilled(id, teams) => {
            collection.fetch_fulfilled(id, teams);
        }
        Request::Rejected(id, message) => {
            collection.rejected(id, message);
        }
    }
}
