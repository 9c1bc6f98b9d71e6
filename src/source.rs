// ABOUTME: Blocking Nostr relay client speaking REQ/EVENT/EOSE over WebSocket
// ABOUTME: Merges events across relays; unreachable relays degrade to no events

use crate::model::{NostrEvent, KIND_TEXT_NOTE};
use crate::{Error, Result};
use rand::Rng;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tungstenite::client::IntoClientRequest;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

const FETCH_TIMEOUT_SECS: u64 = 10;

/// Source of candidate events for one sync run.
pub trait EventSource {
    /// Fetch text notes by the monitored authors with `created_at` strictly
    /// greater than `since`. A relay that cannot be reached contributes no
    /// events; it does not fail the fetch.
    fn fetch_since(&mut self, since: u64) -> Result<Vec<NostrEvent>>;
}

pub struct RelayPool {
    relays: Vec<String>,
    authors: Vec<String>,
    timeout: Duration,
}

impl RelayPool {
    pub fn new(relays: Vec<String>, authors: Vec<String>) -> Result<Self> {
        if relays.is_empty() {
            return Err(Error::Config("relay list is empty".into()));
        }
        if authors.is_empty() {
            return Err(Error::Config("author list is empty".into()));
        }

        Ok(RelayPool {
            relays,
            authors,
            timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn fetch_from_relay(&self, relay: &str, since: u64) -> Result<Vec<NostrEvent>> {
        let relay_err = |reason: String| Error::Relay(format!("{}: {}", relay, reason));

        let mut ws = connect_relay(relay, self.timeout)?;

        let sub_id = format!("{:08x}", rand::thread_rng().gen::<u32>());
        // Relay `since` filters are inclusive; the checkpoint timestamp has
        // already been synced, so ask for strictly newer events.
        let filter = json!({
            "authors": self.authors,
            "kinds": [KIND_TEXT_NOTE],
            "since": since + 1,
        });
        let req = json!(["REQ", sub_id, filter]);
        ws.send(Message::Text(req.to_string()))
            .map_err(|e| relay_err(e.to_string()))?;

        let deadline = Instant::now() + self.timeout;
        let mut events = Vec::new();

        while Instant::now() < deadline {
            let msg = match ws.read() {
                Ok(msg) => msg,
                // Read timeout, connection drop: whatever arrived still counts.
                Err(_) => break,
            };

            let Message::Text(raw) = msg else { continue };
            match parse_relay_message(&raw) {
                Some(RelayMessage::Event(event)) => {
                    if event.kind == KIND_TEXT_NOTE && event.created_at > since {
                        events.push(event);
                    }
                }
                Some(RelayMessage::EndOfStored) => break,
                Some(RelayMessage::Notice(notice)) => {
                    eprintln!("notice from {}: {}", relay, notice);
                }
                None => {}
            }
        }

        let _ = ws.send(Message::Text(json!(["CLOSE", sub_id]).to_string()));
        let _ = ws.close(None);

        Ok(events)
    }
}

impl EventSource for RelayPool {
    fn fetch_since(&mut self, since: u64) -> Result<Vec<NostrEvent>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut events = Vec::new();

        for relay in &self.relays {
            match self.fetch_from_relay(relay, since) {
                Ok(batch) => {
                    println!("  {} returned {} event(s)", relay, batch.len());
                    for event in batch {
                        if seen.insert(event.id.clone()) {
                            events.push(event);
                        }
                    }
                }
                Err(e) => eprintln!("warning: {}", e),
            }
        }

        Ok(events)
    }
}

/// Dial a relay with a bounded TCP connect and read timeout, then run the
/// WebSocket (and TLS, for wss) handshake over the socket.
fn connect_relay(url: &str, timeout: Duration) -> Result<WebSocket<MaybeTlsStream<TcpStream>>> {
    let relay_err = |reason: String| Error::Relay(format!("{}: {}", url, reason));

    let request = url
        .into_client_request()
        .map_err(|e| relay_err(e.to_string()))?;
    let uri = request.uri();
    let host = uri
        .host()
        .ok_or_else(|| relay_err("missing host".into()))?
        .to_string();
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("wss") => 443,
        _ => 80,
    });

    let addrs: Vec<_> = (host.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| relay_err(e.to_string()))?
        .collect();

    let mut stream = None;
    for addr in &addrs {
        if let Ok(s) = TcpStream::connect_timeout(addr, timeout) {
            stream = Some(s);
            break;
        }
    }
    let stream = stream.ok_or_else(|| relay_err("connect failed".into()))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|e| relay_err(e.to_string()))?;

    let (ws, _response) =
        tungstenite::client_tls(request, stream).map_err(|e| relay_err(e.to_string()))?;
    Ok(ws)
}

enum RelayMessage {
    Event(NostrEvent),
    EndOfStored,
    Notice(String),
}

fn parse_relay_message(raw: &str) -> Option<RelayMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let frame = value.as_array()?;

    match frame.first()?.as_str()? {
        "EVENT" => {
            let event = serde_json::from_value(frame.get(2)?.clone()).ok()?;
            Some(RelayMessage::Event(event))
        }
        "EOSE" => Some(RelayMessage::EndOfStored),
        "NOTICE" => Some(RelayMessage::Notice(
            frame.get(1)?.as_str().unwrap_or_default().to_string(),
        )),
        _ => None,
    }
}
