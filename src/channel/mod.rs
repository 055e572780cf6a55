//! Live notification channel.
//!
//! One long-lived Socket.IO connection per session. Each `new-notification`
//! event is decoded and dispatched into the store as a push; `connect` is
//! only logged. The channel runs on the current thread (inside a
//! `tokio::task::LocalSet`) until the server closes it or shutdown is
//! requested.

pub mod protocol;
mod ws;

pub use ws::WsTransport;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::model::Notification;
use crate::session::Credentials;
use crate::store::{NotificationAction, StoreHandle};
use protocol::{EnginePacket, SocketPacket, DEFAULT_NAMESPACE};

/// Event name the server uses for newly assigned tasks.
pub const NEW_NOTIFICATION_EVENT: &str = "new-notification";

/// Text-frame transport under the channel.
#[async_trait(?Send)]
pub trait FrameTransport {
    /// Next text frame; `None` once the peer has closed the connection.
    async fn recv(&mut self) -> Option<Result<String>>;

    async fn send(&mut self, frame: String) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// What the channel observed, for callers that render progress.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened { sid: String },
    Connected,
    Notification(Notification),
    Closed { reason: String },
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop(String),
}

pub struct LiveChannel<T> {
    transport: T,
    store: StoreHandle,
    credentials: Credentials,
    namespace: String,
    observer: Option<mpsc::UnboundedSender<ChannelEvent>>,
}

impl<T: FrameTransport> LiveChannel<T> {
    pub fn new(transport: T, store: StoreHandle, credentials: Credentials) -> Self {
        Self {
            transport,
            store,
            credentials,
            namespace: DEFAULT_NAMESPACE.to_string(),
            observer: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let namespace = namespace.trim();
        self.namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            namespace.to_string()
        };
        self
    }

    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Drive the connection until the server closes it or `shutdown` fires.
    ///
    /// Dropping the shutdown sender counts as a shutdown request.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("live channel shutting down");
                    self.leave().await;
                    self.notify(ChannelEvent::Closed { reason: "shutdown".to_string() });
                    return Ok(());
                }
                frame = self.transport.recv() => {
                    let reason = match frame {
                        None => "connection closed by server".to_string(),
                        Some(Err(err)) => {
                            self.notify(ChannelEvent::Closed { reason: err.to_string() });
                            return Err(err);
                        }
                        Some(Ok(text)) => match self.handle_frame(&text).await? {
                            Flow::Continue => continue,
                            Flow::Stop(reason) => reason,
                        },
                    };
                    tracing::info!(%reason, "live channel closed");
                    self.notify(ChannelEvent::Closed { reason });
                    return Ok(());
                }
            }
        }
    }

    /// Run on the current `LocalSet`; the returned handle stops it.
    pub fn spawn_local(self) -> ChannelHandle
    where
        T: 'static,
    {
        let (shutdown, receiver) = oneshot::channel();
        let task = tokio::task::spawn_local(self.run(receiver));
        ChannelHandle {
            shutdown: Some(shutdown),
            task,
        }
    }

    async fn handle_frame(&mut self, text: &str) -> Result<Flow> {
        let packet = match EnginePacket::decode(text) {
            Ok(packet) => packet,
            Err(err) => {
                tracing::warn!(error = %err, "skipping undecodable frame");
                return Ok(Flow::Continue);
            }
        };
        match packet {
            EnginePacket::Open(handshake) => {
                tracing::info!(
                    sid = %handshake.sid,
                    ping_interval = handshake.ping_interval,
                    "live channel open"
                );
                self.notify(ChannelEvent::Opened {
                    sid: handshake.sid,
                });
                let auth = json!({ "token": self.credentials.token() });
                let connect = SocketPacket::connect(&self.namespace, Some(auth)).to_frame()?;
                self.transport.send(connect).await?;
            }
            EnginePacket::Ping(data) => {
                self.transport.send(EnginePacket::Pong(data).encode()?).await?;
            }
            EnginePacket::Close => return Ok(Flow::Stop("server sent close".to_string())),
            EnginePacket::Message(payload) => return self.handle_message(&payload).await,
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }
        Ok(Flow::Continue)
    }

    async fn handle_message(&mut self, payload: &str) -> Result<Flow> {
        let packet = match SocketPacket::decode(payload) {
            Ok(packet) => packet,
            Err(err) => {
                tracing::warn!(error = %err, "skipping undecodable socket packet");
                return Ok(Flow::Continue);
            }
        };
        if packet.namespace() != self.namespace {
            tracing::debug!(namespace = packet.namespace(), "ignoring packet for other namespace");
            return Ok(Flow::Continue);
        }
        match packet {
            SocketPacket::Connect { .. } => {
                tracing::info!(namespace = %self.namespace, "connect");
                self.notify(ChannelEvent::Connected);
            }
            SocketPacket::ConnectError { data, .. } => {
                let message = connect_error_message(data.as_ref());
                self.notify(ChannelEvent::Closed {
                    reason: message.clone(),
                });
                return Err(Error::Channel(message));
            }
            SocketPacket::Disconnect { .. } => {
                return Ok(Flow::Stop("server disconnected the namespace".to_string()))
            }
            SocketPacket::Event { id, name, args, .. } => {
                if name == NEW_NOTIFICATION_EVENT {
                    self.push(args.into_iter().next());
                } else {
                    tracing::debug!(event = %name, "ignoring event");
                }
                if let Some(id) = id {
                    let ack = SocketPacket::ack(&self.namespace, id).to_frame()?;
                    self.transport.send(ack).await?;
                }
            }
            SocketPacket::Ack { .. } => {}
        }
        Ok(Flow::Continue)
    }

    fn push(&self, payload: Option<Value>) {
        let Some(payload) = payload else {
            tracing::warn!("new-notification event without a payload");
            return;
        };
        match serde_json::from_value::<Notification>(payload) {
            Ok(notification) => {
                tracing::info!(id = %notification.id, title = %notification.title, "notification received");
                self.store
                    .dispatch(NotificationAction::Pushed(notification.clone()));
                self.notify(ChannelEvent::Notification(notification));
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed notification payload");
            }
        }
    }

    /// Best-effort disconnect; failures only matter for logging.
    async fn leave(&mut self) {
        let frame = match SocketPacket::disconnect(&self.namespace).to_frame() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::debug!(error = %err, "could not encode disconnect");
                return;
            }
        };
        if let Err(err) = self.transport.send(frame).await {
            tracing::debug!(error = %err, "disconnect not delivered");
        }
        if let Err(err) = self.transport.close().await {
            tracing::debug!(error = %err, "close not delivered");
        }
    }

    fn notify(&self, event: ChannelEvent) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(event);
        }
    }
}

fn connect_error_message(data: Option<&Value>) -> String {
    match data {
        Some(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("connection refused")
            .to_string(),
        Some(Value::String(message)) => message.clone(),
        _ => "connection refused".to_string(),
    }
}

/// Handle to a spawned channel.
pub struct ChannelHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl ChannelHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the channel to disconnect and wait for it to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.join().await
    }

    /// Wait for the channel to stop on its own.
    pub async fn join(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(Error::Channel(format!("channel task failed: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays scripted frames and records what the channel sends.
    struct ScriptedTransport {
        incoming: VecDeque<String>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait(?Send)]
    impl FrameTransport for ScriptedTransport {
        async fn recv(&mut self) -> Option<Result<String>> {
            self.incoming.pop_front().map(Ok)
        }

        async fn send(&mut self, frame: String) -> Result<()> {
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn scripted(frames: &[&str]) -> (ScriptedTransport, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = ScriptedTransport {
            incoming: frames.iter().map(|f| f.to_string()).collect(),
            sent: Arc::clone(&sent),
        };
        (transport, sent)
    }

    const OPEN: &str = r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

    #[tokio::test]
    async fn handshake_ping_and_push() {
        let (transport, sent) = scripted(&[
            OPEN,
            r#"40{"sid":"x1"}"#,
            "2",
            r#"42["new-notification",{"_id":"n1","title":"Review PR","description":"today"}]"#,
            r#"42["new-notification",{"title":"missing id"}]"#,
            r#"42["something-else",{}]"#,
        ]);
        let store = StoreHandle::default();
        let (observer, mut events) = mpsc::unbounded_channel();
        let (_shutdown, receiver) = oneshot::channel();

        LiveChannel::new(transport, store.clone(), Credentials::new("tok"))
            .with_observer(observer)
            .run(receiver)
            .await
            .unwrap();

        let sent = sent.lock().unwrap().clone();
        assert_eq!(sent, vec![r#"40{"token":"tok"}"#.to_string(), "3".to_string()]);

        let snapshot = store.snapshot();
        let items = snapshot.notifications().items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "n1");
        assert_eq!(snapshot.notifications().unread_count(), 1);

        assert_eq!(
            events.recv().await,
            Some(ChannelEvent::Opened {
                sid: "s1".to_string()
            })
        );
        assert_eq!(events.recv().await, Some(ChannelEvent::Connected));
        assert!(matches!(events.recv().await, Some(ChannelEvent::Notification(n)) if n.id == "n1"));
        assert!(matches!(events.recv().await, Some(ChannelEvent::Closed { .. })));
    }

    #[tokio::test]
    async fn event_with_ack_id_is_acknowledged() {
        let (transport, sent) = scripted(&[
            OPEN,
            r#"4213["new-notification",{"_id":"n1","title":"A"}]"#,
        ]);
        let (_shutdown, receiver) = oneshot::channel();
        LiveChannel::new(transport, StoreHandle::default(), Credentials::new("tok"))
            .run(receiver)
            .await
            .unwrap();
        assert_eq!(sent.lock().unwrap().last().map(String::as_str), Some("4313[]"));
    }

    #[tokio::test]
    async fn connect_error_ends_the_channel() {
        let (transport, _sent) = scripted(&[OPEN, r#"44{"message":"Authentication error"}"#]);
        let (_shutdown, receiver) = oneshot::channel();
        let err = LiveChannel::new(transport, StoreHandle::default(), Credentials::new("bad"))
            .run(receiver)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Live channel error: Authentication error");
    }

    #[tokio::test]
    async fn packets_for_other_namespaces_are_ignored() {
        let (transport, _sent) = scripted(&[
            OPEN,
            r#"42/admin,["new-notification",{"_id":"n1","title":"A"}]"#,
        ]);
        let store = StoreHandle::default();
        let (_shutdown, receiver) = oneshot::channel();
        LiveChannel::new(transport, store.clone(), Credentials::new("tok"))
            .run(receiver)
            .await
            .unwrap();
        assert!(store.snapshot().notifications().items().is_empty());
    }

    #[tokio::test]
    async fn padded_namespace_still_receives_its_events() {
        let (transport, sent) = scripted(&[
            OPEN,
            r#"40/admin,{"sid":"x1"}"#,
            r#"42/admin,["new-notification",{"_id":"n1","title":"A"}]"#,
        ]);
        let store = StoreHandle::default();
        let (_shutdown, receiver) = oneshot::channel();
        LiveChannel::new(transport, store.clone(), Credentials::new("tok"))
            .with_namespace(" /admin ")
            .run(receiver)
            .await
            .unwrap();

        assert_eq!(
            sent.lock().unwrap().first().map(String::as_str),
            Some(r#"40/admin,{"token":"tok"}"#)
        );
        assert_eq!(store.snapshot().notifications().items().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_sends_disconnect() {
        struct Idle {
            sent: Arc<Mutex<Vec<String>>>,
        }

        #[async_trait(?Send)]
        impl FrameTransport for Idle {
            async fn recv(&mut self) -> Option<Result<String>> {
                std::future::pending().await
            }

            async fn send(&mut self, frame: String) -> Result<()> {
                self.sent.lock().unwrap().push(frame);
                Ok(())
            }

            async fn close(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = Idle {
            sent: Arc::clone(&sent),
        };
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let handle =
                    LiveChannel::new(transport, StoreHandle::default(), Credentials::new("tok"))
                        .spawn_local();
                tokio::task::yield_now().await;
                handle.shutdown().await.unwrap();
            })
            .await;
        assert_eq!(sent.lock().unwrap().as_slice(), ["41".to_string()]);
    }
}
