//! Test helpers for end-to-end tests
//!
//! Provides a spawned server, authenticated HTTP calls, and a small
//! WebSocket client that speaks the gateway's event envelope.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use relay_api::{create_app, create_app_state_with, serve};
use relay_common::JwtService;
use relay_db::MemoryStore;
use relay_service::ServiceContext;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::fixtures::{chat_room, support_room, test_config, SECRET};

/// How long a test waits for an expected frame
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Running server bound to an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: MemoryStore,
    jwt: JwtService,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the chat and support rooms seeded
    pub async fn start() -> Result<Self> {
        let store = MemoryStore::new();
        store.insert_room(chat_room());
        store.insert_room(support_room());

        let state =
            create_app_state_with(ServiceContext::builder_with_store(store.clone()), test_config()?)?;
        let app = create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            store,
            jwt: JwtService::new(SECRET, 3600),
            _handle: handle,
        })
    }

    /// Signed credential for a user
    pub fn token(&self, user_id: i64) -> String {
        self.jwt.issue(user_id).unwrap_or_default()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn gateway_url(&self, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/gateway?token={token}", self.addr),
            None => format!("ws://{}/gateway", self.addr),
        }
    }

    /// Authenticated JSON call returning status and body
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        user_id: i64,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let url = format!("{}{}", self.base_url(), path);
        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(self.token(user_id));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).with_context(|| format!("non-JSON body: {text}"))?
        };
        Ok((status, value))
    }

    /// Unauthenticated GET
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Open a socket authenticated through the query token and wait for `ready`
    pub async fn connect(&self, user_id: i64) -> Result<WsClient> {
        let token = self.token(user_id);
        let (stream, _) = connect_async(self.gateway_url(Some(&token))).await?;
        let mut client = WsClient::from_stream(stream);
        client.expect("ready").await?;
        Ok(client)
    }
}

/// Gateway client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Wrap an already connected stream
    pub fn from_stream(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self { stream }
    }

    /// Send an `{event, data}` frame
    pub async fn send(&mut self, event: &str, data: Value) -> Result<()> {
        let frame = json!({"event": event, "data": data}).to_string();
        self.stream.send(Message::Text(frame)).await?;
        Ok(())
    }

    /// Next event frame, skipping control frames
    pub async fn next_event(&mut self) -> Result<Value> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for a frame")?;
            match message {
                Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
                Some(Ok(Message::Close(frame))) => bail!("socket closed: {frame:?}"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => bail!("socket ended"),
            }
        }
    }

    /// Skip frames until one with the given event name arrives; returns its data
    pub async fn expect(&mut self, event: &str) -> Result<Value> {
        loop {
            let frame = self.next_event().await?;
            if frame["event"] == event {
                return Ok(frame["data"].clone());
            }
        }
    }

    /// Round-trip a ping so every earlier frame has been handled
    pub async fn sync(&mut self) -> Result<()> {
        self.send("ping", json!({})).await?;
        self.expect("pong").await?;
        Ok(())
    }

    pub async fn join(&mut self, room_id: i64) -> Result<()> {
        self.send("join_room", json!({"room_id": room_id})).await?;
        self.sync().await
    }
}
