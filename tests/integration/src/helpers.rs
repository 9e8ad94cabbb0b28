//! Test helpers for integration tests
//!
//! Provides a self-contained gateway server plus small WebSocket utilities.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use changes_common::ChangesConfig;
use changes_gateway::{
    create_app, GatewayState, IdleSweeper, Session, TimeSensitiveStore, TransportRegistry,
};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Client side of an events socket
pub type EventsSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for a frame or a condition before failing
const WAIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: GatewayState,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server whose missing sessions survive a few seconds
    pub async fn start() -> Result<Self> {
        Self::start_with_expiry(Duration::from_secs(5)).await
    }

    /// Start a server with a custom expiry window
    pub async fn start_with_expiry(expiry: Duration) -> Result<Self> {
        let config = ChangesConfig {
            heartbeat_interval_secs: 1,
            outbound_buffer: 32,
            ..ChangesConfig::default()
        };

        let registry = TransportRegistry::new_shared(Arc::new(TimeSensitiveStore::new(expiry)));
        let sweeper = Arc::new(IdleSweeper::new(
            Arc::clone(&registry),
            Duration::from_millis(25),
        ));
        sweeper.start();

        let state = GatewayState::new(registry, sweeper, config);
        let app = create_app(state.clone());

        // Bind to an ephemeral port
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            state,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn registry(&self) -> &Arc<TransportRegistry> {
        self.state.registry()
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Send a subscription command over the HTTP control endpoint
    pub async fn configure(&self, id: &str, command: &str, value: Option<&str>) -> Result<Response> {
        let url = format!("{}/changes/config", self.base_url());
        let mut query = vec![("id", id), ("command", command)];
        if let Some(value) = value {
            query.push(("value", value));
        }
        Ok(self.client.post(&url).query(&query).send().await?)
    }

    /// Open an events socket and consume its `Connected` frame
    ///
    /// Returns the socket and the connection id the server assigned.
    pub async fn connect_events(&self, id: Option<&str>) -> Result<(EventsSocket, String)> {
        let url = match id {
            Some(id) => format!("ws://{}/changes/events?id={id}", self.addr),
            None => format!("ws://{}/changes/events", self.addr),
        };
        let (mut socket, _) = connect_async(url.as_str()).await?;

        let frame = next_frame(&mut socket).await?;
        anyhow::ensure!(frame["Type"] == "Connected", "expected Connected, got {frame}");
        let id = frame["Value"]["id"]
            .as_str()
            .context("Connected frame without id")?
            .to_string();

        Ok((socket, id))
    }

    /// Wait until the session for `id` exists and satisfies `condition`
    pub async fn wait_for_session(
        &self,
        id: &str,
        condition: impl Fn(&Session) -> bool,
    ) -> Result<Arc<Session>> {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        loop {
            if let Some(session) = self.registry().get(id) {
                if condition(&session) {
                    return Ok(session);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("session {id} did not reach the expected state");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Wait until the session for `id` has been reclaimed
    pub async fn wait_for_removal(&self, id: &str) -> Result<()> {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        while self.registry().has_session(id) {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("session {id} was never removed");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

/// Read the next text frame as JSON
pub async fn next_frame(socket: &mut EventsSocket) -> Result<Value> {
    loop {
        let message = tokio::time::timeout(WAIT_TIMEOUT, socket.next())
            .await
            .context("timed out waiting for a frame")?
            .context("socket closed")??;

        match message {
            Message::Text(text) => return Ok(serde_json::from_str(&text)?),
            Message::Close(_) => anyhow::bail!("socket closed by server"),
            _ => {}
        }
    }
}

/// Read the next change message, skipping heartbeats
pub async fn next_change(socket: &mut EventsSocket) -> Result<Value> {
    loop {
        let frame = next_frame(socket).await?;
        if frame["Type"] != "Heartbeat" {
            return Ok(frame);
        }
    }
}

/// Send a subscription command over the events socket
pub async fn send_command(socket: &mut EventsSocket, command: &str, value: Option<&str>) -> Result<()> {
    let frame = match value {
        Some(value) => json!({ "command": command, "value": value }),
        None => json!({ "command": command }),
    };
    socket.send(Message::Text(frame.to_string())).await?;
    Ok(())
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}

/// Assert response status and parse JSON body
pub async fn assert_json(response: Response, expected_status: StatusCode) -> Result<Value> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}
