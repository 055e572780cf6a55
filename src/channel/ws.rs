//! awc WebSocket transport for the live channel.

use actix_codec::Framed;
use async_trait::async_trait;
use awc::ws::{Codec, Frame, Message};
use awc::BoxedSocket;
use futures_util::{SinkExt, StreamExt};

use super::protocol::socket_url;
use super::FrameTransport;
use crate::error::{Error, Result};
use crate::session::Credentials;

pub struct WsTransport {
    socket: Framed<BoxedSocket, Codec>,
}

impl WsTransport {
    /// Open the Socket.IO WebSocket endpoint of the server at `base_url`.
    pub async fn connect(base_url: &str, credentials: &Credentials) -> Result<Self> {
        let url = socket_url(base_url)?;
        tracing::info!(%url, "connecting live channel");
        let (response, socket) = awc::Client::default()
            .ws(url.as_str())
            .bearer_auth(credentials.token())
            .connect()
            .await
            .map_err(|err| Error::Channel(format!("websocket connect failed: {err}")))?;
        tracing::debug!(status = %response.status(), "websocket upgraded");
        Ok(Self { socket })
    }
}

#[async_trait(?Send)]
impl FrameTransport for WsTransport {
    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            let frame = match self.socket.next().await? {
                Ok(frame) => frame,
                Err(err) => return Some(Err(Error::Channel(err.to_string()))),
            };
            match frame {
                Frame::Text(bytes) => {
                    return Some(
                        String::from_utf8(bytes.to_vec())
                            .map_err(|err| Error::Protocol(format!("non UTF-8 text frame: {err}"))),
                    )
                }
                Frame::Ping(bytes) => {
                    if let Err(err) = self.socket.send(Message::Pong(bytes)).await {
                        return Some(Err(Error::Channel(err.to_string())));
                    }
                }
                Frame::Close(reason) => {
                    tracing::debug!(?reason, "websocket close frame");
                    return None;
                }
                Frame::Binary(_) | Frame::Continuation(_) => {
                    tracing::debug!("ignoring binary websocket frame");
                }
                Frame::Pong(_) => {}
            }
        }
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.socket
            .send(Message::Text(frame.into()))
            .await
            .map_err(|err| Error::Channel(err.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.socket
            .send(Message::Close(None))
            .await
            .map_err(|err| Error::Channel(err.to_string()))
    }
}
