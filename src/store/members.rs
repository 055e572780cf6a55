//! Members are read-only: the slice holds every user and, separately, the
//! members of the caller's teams. Each list has its own request status.

use super::{describe_request, Collection, Request, RequestKind, RequestStatus};
use crate::model::Member;

#[derive(Debug, Clone, PartialEq)]
pub enum MemberAction {
    FetchAll(Request<Vec<Member>>),
    FetchTeam(Request<Vec<Member>>),
}

impl MemberAction {
    pub(crate) fn describe(&self) -> String {
        match self {
            MemberAction::FetchAll(request) => describe_request("fetch_all", request),
            MemberAction::FetchTeam(request) => describe_request("fetch_team", request),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemberSlice {
    all: Collection<Member>,
    team: Collection<Member>,
}

impl MemberSlice {
    pub fn members(&self) -> &[Member] {
        self.all.items()
    }

    pub fn status(&self) -> &RequestStatus {
        self.all.status()
    }

    pub fn team_members(&self) -> &[Member] {
        self.team.items()
    }

    pub fn team_status(&self) -> &RequestStatus {
        self.team.status()
    }

    pub fn get(&self, id: &str) -> Option<&Member> {
        self.all.get(id).or_else(|| self.team.get(id))
    }

    pub(crate) fn apply(&mut self, action: MemberAction) {
        let (collection, request) = match action {
            MemberAction::FetchAll(request) => (&mut self.all, request),
            MemberAction::FetchTeam(request) => (&mut self.team, request),
        };
        match request {
            Request::Pending(id) => collection.begin(id, RequestKind::Fetch),
            Request::Fulfilled(id, members) => {
                collection.fetch_fulfilled(id, members);
            }
            Request::Rejected(id, message) => {
                collection.rejected(id, message);
            }
        }
    }
}
