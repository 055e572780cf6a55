//! taskdeck task list/add/update

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::events::EventKind;
use crate::model::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::output::{emit_success, HumanOutput};

/// Options for `taskdeck task add`
pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assign: Option<String>,
}

/// Options for `taskdeck task update`
pub struct UpdateOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assign: Option<String>,
}

#[derive(Serialize)]
struct TaskListReport<'a> {
    count: usize,
    tasks: &'a [Task],
}

pub(super) fn format_task(task: &Task) -> String {
    let mut line = format!(
        "{}  [{}/{}]  {}",
        task.id, task.status, task.priority, task.title
    );
    if let Some(assignee) = &task.assigned_to {
        line.push_str(&format!("  @{assignee}"));
    }
    line
}

pub async fn run_list(ctx: &mut Context) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    commands.fetch_tasks().await?;

    let snapshot = commands.store().snapshot();
    let tasks = snapshot.tasks().items();

    let mut human = HumanOutput::new(format!("taskdeck task list: {} task(s)", tasks.len()));
    for status in TaskStatus::ALL {
        let count = tasks.iter().filter(|t| t.status == status).count();
        if count > 0 {
            human.push_summary(status.as_str(), count.to_string());
        }
    }
    for task in tasks {
        human.push_detail(format_task(task));
    }
    if tasks.is_empty() {
        human.push_next_step("taskdeck task add --title <title> --description <text>");
    }

    let report = TaskListReport {
        count: tasks.len(),
        tasks,
    };
    emit_success(ctx.output, "task list", &report, Some(&human))
}

pub async fn run_add(ctx: &mut Context, options: AddOptions) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    let task = commands
        .create_task(NewTask {
            title: options.title,
            description: options.description,
            status: options.status,
            priority: options.priority,
            assigned_to: options.assign,
        })
        .await?;

    ctx.emit_event(EventKind::TaskCreated, Some(&session.display_name), &task)?;

    let mut human = HumanOutput::new(format!("taskdeck task add: {}", task.id));
    human.push_detail(format_task(&task));
    human.push_next_step(format!("taskdeck task update {} --status in-progress", task.id));
    emit_success(ctx.output, "task add", &task, Some(&human))
}

pub async fn run_update(ctx: &mut Context, options: UpdateOptions) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    let patch = TaskPatch {
        title: options.title,
        description: options.description,
        status: options.status,
        priority: options.priority,
        assigned_to: options.assign,
    };
    let task = commands.update_task(&options.id, patch).await?;

    ctx.emit_event(EventKind::TaskUpdated, Some(&session.display_name), &task)?;

    let mut human = HumanOutput::new(format!("taskdeck task update: {}", task.id));
    human.push_detail(format_task(&task));
    emit_success(ctx.output, "task update", &task, Some(&human))
}
