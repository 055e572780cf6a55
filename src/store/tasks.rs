use super::{describe_request, Collection, Request, RequestKind, RequestStatus};
use crate::model::Task;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    Fetch(Request<Vec<Task>>),
    Create(Request<Task>),
    Update(Request<Task>),
    /// Local validation failed; nothing was sent.
    Invalid(String),
}

impl TaskAction {
    pub(crate) fn describe(&self) -> String {
        match self {
            TaskAction::Fetch(request) => describe_request("fetch", request),
            TaskAction::Create(request) => describe_request("create", request),
            TaskAction::Update(request) => describe_request("update", request),
            TaskAction::Invalid(message) => format!("invalid: {message}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskSlice {
    tasks: Collection<Task>,
}

impl TaskSlice {
    pub fn items(&self) -> &[Task] {
        self.tasks.items()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn status(&self) -> &RequestStatus {
        self.tasks.status()
    }

    pub(crate) fn apply(&mut self, action: TaskAction) {
        match action {
            TaskAction::Fetch(Request::Pending(id)) => self.tasks.begin(id, RequestKind::Fetch),
            TaskAction::Fetch(Request::Fulfilled(id, tasks)) => {
                self.tasks.fetch_fulfilled(id, tasks);
            }
            TaskAction::Create(Request::Pending(id)) | TaskAction::Update(Request::Pending(id)) => {
                self.tasks.begin(id, RequestKind::Mutation)
            }
            TaskAction::Create(Request::Fulfilled(id, task)) => {
                self.tasks.create_fulfilled(id, task);
            }
            TaskAction::Update(Request::Fulfilled(id, task)) => {
                self.tasks.update_fulfilled(id, task);
            }
            TaskAction::Fetch(Request::Rejected(id, message))
            | TaskAction::Create(Request::Rejected(id, message))
            | TaskAction::Update(Request::Rejected(id, message)) => {
                self.tasks.rejected(id, message);
            }
            TaskAction::Invalid(message) => self.tasks.fail(message),
        }
    }
}
