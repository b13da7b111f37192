// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! WebSocket relay connection
//!
//! Each subscribe or publish opens its own connection; nothing is shared
//! between calls.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::error::RelayError;
use super::message::{ClientMessage, RelayMessage};
use super::transport::{ok_to_result, Relay};
use crate::config::validate_relay_url;
use crate::event::{Event, Filter};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const SUBSCRIPTION_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub struct WebSocketRelay {
    url: String,
    connect_timeout: Duration,
}

impl WebSocketRelay {
    /// Relay at `url`; the scheme must be `ws` or `wss`
    pub fn new(url: &str) -> Result<Self, RelayError> {
        let url = validate_relay_url(url)?;
        Ok(Self {
            url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn connection_error(&self, reason: impl ToString) -> RelayError {
        RelayError::Connection {
            relay: self.url.clone(),
            reason: reason.to_string(),
        }
    }

    async fn connect(&self) -> Result<WsStream, RelayError> {
        debug!("Connecting to relay {}", self.url);
        match tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str())).await {
            Ok(Ok((ws, _response))) => Ok(ws),
            Ok(Err(e)) => Err(self.connection_error(e)),
            Err(_) => Err(RelayError::Timeout {
                relay: self.url.clone(),
                timeout_ms: self.connect_timeout.as_millis() as u64,
            }),
        }
    }

    async fn send(&self, ws: &mut WsStream, message: &ClientMessage) -> Result<(), RelayError> {
        ws.send(Message::Text(message.to_json()?))
            .await
            .map_err(|e| self.connection_error(e))
    }
}

#[async_trait]
impl Relay for WebSocketRelay {
    fn url(&self) -> &str {
        &self.url
    }

    async fn subscribe(
        &self,
        subscription_id: &str,
        filters: Vec<Filter>,
    ) -> Result<mpsc::Receiver<RelayMessage>, RelayError> {
        let mut ws = self.connect().await?;
        self.send(
            &mut ws,
            &ClientMessage::Req {
                subscription_id: subscription_id.to_string(),
                filters,
            },
        )
        .await?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let close = ClientMessage::Close(subscription_id.to_string()).to_json()?;
        let url = self.url.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        debug!("Closing subscription on {}", url);
                        let _ = ws.send(Message::Text(close.clone())).await;
                        let _ = ws.close(None).await;
                        break;
                    }
                    frame = ws.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => match RelayMessage::from_json(&text) {
                                Ok(message) => {
                                    if tx.send(message).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => debug!("Ignoring frame from {}: {}", url, e),
                            },
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Relay {} closed the connection", url);
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("Relay {} connection error: {}", url, e);
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn publish(&self, event: &Event) -> Result<(), RelayError> {
        let mut ws = self.connect().await?;
        self.send(&mut ws, &ClientMessage::Event(Box::new(event.clone())))
            .await?;

        let result = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => match RelayMessage::from_json(&text) {
                    Ok(RelayMessage::Ok {
                        event_id,
                        accepted,
                        message,
                    }) if event_id == event.id => break ok_to_result(&self.url, accepted, &message),
                    Ok(RelayMessage::Notice { message }) => {
                        debug!("Notice from {}: {}", self.url, message)
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Ignoring frame from {}: {}", self.url, e),
                },
                Some(Ok(Message::Close(_))) | None => {
                    break Err(self.connection_error("connection closed before OK"))
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break Err(self.connection_error(e)),
            }
        };

        let _ = ws.close(None).await;
        result
    }
}
