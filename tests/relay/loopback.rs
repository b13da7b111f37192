// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Minimal WebSocket relay bound to 127.0.0.1 for transport tests

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use redshift::relay::{ClientMessage, RelayMessage};
use redshift::Event;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Clone)]
pub struct LoopbackRelay {
    events: Arc<Mutex<Vec<Event>>>,
    url: String,
}

impl LoopbackRelay {
    /// Start a relay on an ephemeral port
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let relay = Self {
            events: Arc::new(Mutex::new(Vec::new())),
            url: format!("ws://{}", addr),
        };

        let events = relay.events.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, events.clone()));
            }
        });
        relay
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn stored(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn store(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

fn handle(message: ClientMessage, events: &Mutex<Vec<Event>>) -> Vec<RelayMessage> {
    match message {
        ClientMessage::Event(event) => {
            let event = *event;
            if let Err(e) = event.verify() {
                return vec![RelayMessage::Ok {
                    event_id: event.id,
                    accepted: false,
                    message: format!("invalid: {}", e),
                }];
            }
            let mut stored = events.lock().unwrap();
            if stored.iter().any(|e| e.id == event.id) {
                return vec![RelayMessage::Ok {
                    event_id: event.id,
                    accepted: false,
                    message: "duplicate: already have it".to_string(),
                }];
            }
            let event_id = event.id.clone();
            stored.push(event);
            vec![RelayMessage::Ok {
                event_id,
                accepted: true,
                message: String::new(),
            }]
        }
        ClientMessage::Req {
            subscription_id,
            filters,
        } => {
            let stored = events.lock().unwrap();
            let mut replies: Vec<RelayMessage> = stored
                .iter()
                .filter(|e| filters.iter().any(|f| f.matches(e)))
                .map(|e| RelayMessage::Event {
                    subscription_id: subscription_id.clone(),
                    event: Box::new(e.clone()),
                })
                .collect();
            replies.push(RelayMessage::Eose { subscription_id });
            replies
        }
        ClientMessage::Close(_) => Vec::new(),
    }
}

async fn serve(stream: TcpStream, events: Arc<Mutex<Vec<Event>>>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let replies = match ClientMessage::from_json(&text) {
            Ok(message) => handle(message, &events),
            Err(e) => vec![RelayMessage::Notice {
                message: format!("error: {}", e),
            }],
        };
        for reply in replies {
            if ws.send(Message::Text(reply.to_json())).await.is_err() {
                return;
            }
        }
    }
}
