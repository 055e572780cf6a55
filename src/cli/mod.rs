//! Command-line interface for taskdeck
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::api::HttpRemote;
use crate::commands::Commands;
use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind, EventSink};
use crate::model::{TaskPriority, TaskStatus};
use crate::output::OutputOptions;
use crate::session::{Session, SessionStore};
use crate::store::StoreHandle;

mod auth;
mod members;
mod notifications;
mod tasks;
mod teams;

/// taskdeck - task management client
///
/// Manage tasks, teams and members on a task server and follow task
/// notifications live.
#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a taskdeck.toml (defaults to ./taskdeck.toml when present)
    #[arg(long, global = true, env = "TASKDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true, env = "TASKDECK_API_URL")]
    pub api_url: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write JSONL events to a file, or "-" for stdout
    #[arg(long, global = true, env = "TASKDECK_EVENTS")]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Repeat the password (defaults to --password)
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Whoami,

    /// Task commands
    #[command(subcommand)]
    Task(TaskCommands),

    /// Member commands
    #[command(subcommand)]
    Member(MemberCommands),

    /// Team commands
    #[command(subcommand)]
    Team(TeamCommands),

    /// Notification commands
    #[command(subcommand)]
    Notification(NotificationCommands),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks
    List,

    /// Create a task
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// pending, in-progress or completed
        #[arg(long, default_value = "pending")]
        status: TaskStatus,

        /// low, medium or high
        #[arg(long, default_value = "low")]
        priority: TaskPriority,

        /// Member id to assign
        #[arg(long)]
        assign: Option<String>,
    },

    /// Update fields of a task
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<TaskStatus>,

        #[arg(long)]
        priority: Option<TaskPriority>,

        #[arg(long)]
        assign: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemberCommands {
    /// List every user
    List,

    /// List members of your teams
    Mine,
}

#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// List every team
    List,

    /// List the teams you belong to
    Mine,

    /// Create a team
    Create {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Member ids (repeatable)
        #[arg(long = "member")]
        members: Vec<String>,
    },

    /// Update a team
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Replace the member list (repeatable)
        #[arg(long = "member")]
        members: Option<Vec<String>>,
    },

    /// Delete a team
    Delete { id: String },

    /// Add members to a team
    AddMembers {
        /// Team id
        #[arg(long)]
        team: String,

        /// Member ids (repeatable)
        #[arg(long = "member")]
        members: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List unseen notifications
    List,

    /// Mark one notification as read
    Read { id: String },

    /// Mark every unread notification as read
    ReadAll,

    /// Follow new notifications on the live channel
    Watch {
        /// Stop after this many notifications
        #[arg(long)]
        limit: Option<usize>,

        /// Skip the initial fetch of unseen notifications
        #[arg(long)]
        no_fetch: bool,
    },
}

/// Per-invocation state shared by all command implementations.
pub(crate) struct Context {
    pub config: Config,
    pub output: OutputOptions,
    events: Option<EventSink>,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(&std::env::current_dir()?)?,
        };
        let config = match &cli.api_url {
            Some(url) => config.with_api_url(url.clone())?,
            None => config,
        };
        let destination = EventDestination::parse(cli.events.as_deref());
        let events_to_stdout = destination == Some(EventDestination::Stdout);
        let events = destination.map(|d| d.open()).transpose()?;
        Ok(Self {
            config,
            output: OutputOptions {
                json: cli.json && !events_to_stdout,
                quiet: cli.quiet,
            },
            events,
        })
    }

    pub fn sessions(&self) -> Result<SessionStore> {
        Ok(SessionStore::new(self.config.state_dir()?))
    }

    pub fn session(&self) -> Result<Session> {
        self.sessions()?.require()
    }

    pub fn remote(&self) -> Result<Arc<HttpRemote>> {
        Ok(Arc::new(HttpRemote::new(&self.config.api.base_url)?))
    }

    /// Commands against a fresh store, authenticated as `session`.
    pub fn commands(&self, session: &Session) -> Result<Commands> {
        Ok(Commands::new(
            self.remote()?,
            StoreHandle::default(),
            session.credentials(),
        ))
    }

    pub fn emit_event<T: Serialize>(
        &mut self,
        kind: EventKind,
        actor: Option<&str>,
        data: T,
    ) -> Result<()> {
        let Some(sink) = self.events.as_mut() else {
            return Ok(());
        };
        let event = Event::new(kind, actor.map(str::to_string)).with_data(data)?;
        sink.emit(&event)
    }
}

/// Run `future` on a current-thread runtime inside a `LocalSet`.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    Ok(local.block_on(&runtime, future))
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let mut ctx = Context::load(&self)?;
        block_on(async move { dispatch(&mut ctx, self.command).await })?
    }
}

async fn dispatch(ctx: &mut Context, command: Command) -> Result<()> {
    match command {
        Command::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            let confirm_password = confirm_password.unwrap_or_else(|| password.clone());
            auth::run_register(
                ctx,
                auth::RegisterOptions {
                    name,
                    email,
                    password,
                    confirm_password,
                },
            )
            .await
        }
        Command::Login { email, password } => auth::run_login(ctx, email, password).await,
        Command::Logout => auth::run_logout(ctx),
        Command::Whoami => auth::run_whoami(ctx),
        Command::Task(cmd) => match cmd {
            TaskCommands::List => tasks::run_list(ctx).await,
            TaskCommands::Add {
                title,
                description,
                status,
                priority,
                assign,
            } => {
                tasks::run_add(
                    ctx,
                    tasks::AddOptions {
                        title,
                        description,
                        status,
                        priority,
                        assign,
                    },
                )
                .await
            }
            TaskCommands::Update {
                id,
                title,
                description,
                status,
                priority,
                assign,
            } => {
                tasks::run_update(
                    ctx,
                    tasks::UpdateOptions {
                        id,
                        title,
                        description,
                        status,
                        priority,
                        assign,
                    },
                )
                .await
            }
        },
        Command::Member(cmd) => match cmd {
            MemberCommands::List => members::run_list(ctx, false).await,
            MemberCommands::Mine => members::run_list(ctx, true).await,
        },
        Command::Team(cmd) => match cmd {
            TeamCommands::List => teams::run_list(ctx, false).await,
            TeamCommands::Mine => teams::run_list(ctx, true).await,
            TeamCommands::Create {
                name,
                description,
                members,
            } => teams::run_create(ctx, name, description, members).await,
            TeamCommands::Update {
                id,
                name,
                description,
                members,
            } => teams::run_update(ctx, id, name, description, members).await,
            TeamCommands::Delete { id } => teams::run_delete(ctx, id).await,
            TeamCommands::AddMembers { team, members } => {
                teams::run_add_members(ctx, team, members).await
            }
        },
        Command::Notification(cmd) => match cmd {
            NotificationCommands::List => notifications::run_list(ctx).await,
            NotificationCommands::Read { id } => notifications::run_read(ctx, id).await,
            NotificationCommands::ReadAll => notifications::run_read_all(ctx).await,
            NotificationCommands::Watch { limit, no_fetch } => {
                notifications::run_watch(ctx, notifications::WatchOptions { limit, no_fetch })
                    .await
            }
        },
    }
}
