//! taskdeck notification list/read/read-all/watch

use serde::Serialize;
use tokio::sync::mpsc;

use super::Context;
use crate::channel::{ChannelEvent, LiveChannel, WsTransport};
use crate::error::{Error, Result};
use crate::events::EventKind;
use crate::model::Notification;
use crate::output::{emit_success, HumanOutput};

/// Options for `taskdeck notification watch`
pub struct WatchOptions {
    pub limit: Option<usize>,
    pub no_fetch: bool,
}

#[derive(Serialize)]
struct NotificationListReport<'a> {
    count: usize,
    unread: usize,
    notifications: &'a [Notification],
}

#[derive(Serialize)]
struct ReadReport {
    id: String,
    unread: usize,
}

#[derive(Serialize)]
struct WatchReport {
    received: Vec<Notification>,
    unread: usize,
    closed: Option<String>,
}

fn format_notification(notification: &Notification) -> String {
    let marker = if notification.is_unread() { "*" } else { " " };
    let mut line = format!("{marker} {}  {}", notification.id, notification.title);
    if let Some(priority) = notification.priority {
        line.push_str(&format!("  [{priority}]"));
    }
    line
}

pub async fn run_list(ctx: &mut Context) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    commands.fetch_notifications().await?;

    let snapshot = commands.store().snapshot();
    let slice = snapshot.notifications();
    let notifications = slice.items();

    let mut human = HumanOutput::new(format!(
        "taskdeck notification list: {} unread",
        slice.unread_count()
    ));
    for notification in notifications {
        human.push_detail(format_notification(notification));
    }
    if slice.unread_count() > 0 {
        human.push_next_step("taskdeck notification read-all");
    }

    let report = NotificationListReport {
        count: notifications.len(),
        unread: slice.unread_count(),
        notifications,
    };
    emit_success(ctx.output, "notification list", &report, Some(&human))
}

pub async fn run_read(ctx: &mut Context, id: String) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    commands.fetch_notifications().await?;
    commands.mark_notification_read(&id).await?;

    ctx.emit_event(
        EventKind::NotificationRead,
        Some(&session.display_name),
        serde_json::json!({ "id": id }),
    )?;

    let unread = commands.store().read(|s| s.notifications().unread_count());
    let mut human = HumanOutput::new(format!("taskdeck notification read: {id}"));
    human.push_summary("unread", unread.to_string());
    emit_success(ctx.output, "notification read", &ReadReport { id, unread }, Some(&human))
}

pub async fn run_read_all(ctx: &mut Context) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    commands.fetch_notifications().await?;
    let report = commands.mark_all_read().await;

    for id in &report.confirmed {
        ctx.emit_event(
            EventKind::NotificationRead,
            Some(&session.display_name),
            serde_json::json!({ "id": id }),
        )?;
    }

    if !report.is_complete() {
        return Err(Error::MarkReadIncomplete(report));
    }

    let mut human = HumanOutput::new(format!(
        "taskdeck notification read-all: {} marked read",
        report.confirmed.len()
    ));
    for id in &report.confirmed {
        human.push_detail(id.clone());
    }
    emit_success(ctx.output, "notification read-all", &report, Some(&human))
}

/// Follow the live channel until interrupted, the server closes the
/// connection, or `limit` notifications have arrived.
pub async fn run_watch(ctx: &mut Context, options: WatchOptions) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    let transport = WsTransport::connect(ctx.config.channel_url(), commands.credentials()).await?;

    let (observer, mut events) = mpsc::unbounded_channel();
    let handle = LiveChannel::new(
        transport,
        commands.store().clone(),
        commands.credentials().clone(),
    )
    .with_namespace(ctx.config.channel.namespace.clone())
    .with_observer(observer)
    .spawn_local();

    let mut warnings = Vec::new();
    if !options.no_fetch {
        if let Err(err) = commands.fetch_notifications().await {
            tracing::warn!(error = %err, "initial notification fetch failed");
            warnings.push(format!("initial fetch failed: {err}"));
        }
    }

    let live_output = !ctx.output.json && !ctx.output.quiet;
    let mut received = Vec::new();
    let mut closed = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while options.limit.map_or(true, |limit| received.len() < limit) {
        let event = tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => event,
        };
        match event {
            Some(ChannelEvent::Opened { sid }) => tracing::debug!(%sid, "channel opened"),
            Some(ChannelEvent::Connected) => {
                if live_output {
                    println!("taskdeck notification watch: connected");
                }
            }
            Some(ChannelEvent::Notification(notification)) => {
                ctx.emit_event(
                    EventKind::NotificationReceived,
                    Some(&session.display_name),
                    &notification,
                )?;
                if live_output {
                    println!("{}", format_notification(&notification));
                }
                received.push(notification);
            }
            Some(ChannelEvent::Closed { reason }) => {
                closed = Some(reason);
                break;
            }
            None => break,
        }
    }

    if let Err(err) = handle.shutdown().await {
        if closed.is_none() {
            return Err(err);
        }
        warnings.push(err.to_string());
    }

    let unread = commands.store().read(|s| s.notifications().unread_count());
    let mut human = HumanOutput::new(format!(
        "taskdeck notification watch: {} received",
        received.len()
    ));
    human.push_summary("unread", unread.to_string());
    if let Some(reason) = &closed {
        human.push_summary("closed", reason.clone());
    }
    for warning in warnings {
        human.push_warning(warning);
    }

    let report = WatchReport {
        received,
        unread,
        closed,
    };
    emit_success(ctx.output, "notification watch", &report, Some(&human))
}
