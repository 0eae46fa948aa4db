//! A single-connection Socket.IO server speaking just enough Engine.IO v4 to
//! drive the client.

#![allow(dead_code)]

use {
    futures_util::{SinkExt, StreamExt},
    serde_json::json,
    std::{
        net::SocketAddr,
        sync::{Arc, Mutex},
    },
    tokio::{
        net::TcpListener,
        sync::mpsc,
        task::JoinHandle,
        time::{Duration, timeout},
    },
    tokio_websockets::{Message, ServerBuilder},
};

pub const FAKE_SID: &str = "fake-sid";

#[derive(Clone, Debug)]
pub struct FakeServerOptions {
    pub send_open: bool,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    pub max_payload: u64,
    pub connect_reply: String,
}

impl Default for FakeServerOptions {
    fn default() -> Self {
        Self {
            send_open: true,
            ping_interval: 25000,
            ping_timeout: 20000,
            max_payload: 1_000_000,
            connect_reply: format!(r#"40{{"sid":"{FAKE_SID}"}}"#),
        }
    }
}

enum Command {
    Send(String),
    Drop,
}

pub struct FakeServer {
    addr: SocketAddr,
    received: mpsc::UnboundedReceiver<String>,
    commands: mpsc::UnboundedSender<Command>,
    request_uri: Arc<Mutex<Option<String>>>,
    _task: JoinHandle<()>,
}

impl FakeServer {
    pub async fn start() -> Self {
        Self::start_with(FakeServerOptions::default()).await
    }

    pub async fn start_with(options: FakeServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
        let addr = listener.local_addr().expect("no local addr");
        let (received_tx, received) = mpsc::unbounded_channel();
        let (commands, mut commands_rx) = mpsc::unbounded_channel();
        let request_uri = Arc::new(Mutex::new(None));
        let request_uri_task = Arc::clone(&request_uri);

        let task = tokio::spawn(async move {
            let Ok((tcp, _)) = listener.accept().await else {
                return;
            };
            let Ok((request, ws)) = ServerBuilder::new().accept(tcp).await else {
                return;
            };
            *request_uri_task.lock().unwrap() = Some(request.uri().to_string());
            let (mut sink, mut stream) = ws.split();

            if !options.send_open {
                // hold the socket open without ever completing the handshake
                while let Some(Command::Send(_)) = commands_rx.recv().await {}
                return;
            }

            let open = json!({
                "sid": "engine-sid",
                "upgrades": [],
                "pingInterval": options.ping_interval,
                "pingTimeout": options.ping_timeout,
                "maxPayload": options.max_payload,
            });
            if sink.send(Message::text(format!("0{open}"))).await.is_err() {
                return;
            }

            loop {
                match stream.next().await {
                    Some(Ok(msg)) => {
                        if msg.as_text().is_some_and(|text| text.starts_with("40")) {
                            break;
                        }
                    }
                    _ => return,
                }
            }
            if sink
                .send(Message::text(options.connect_reply.clone()))
                .await
                .is_err()
            {
                return;
            }

            loop {
                tokio::select! {
                    msg = stream.next() => match msg {
                        Some(Ok(msg)) => {
                            if let Some(text) = msg.as_text() {
                                let _ = received_tx.send(text.to_string());
                            } else if msg.is_close() {
                                break;
                            }
                        }
                        _ => break,
                    },
                    command = commands_rx.recv() => match command {
                        Some(Command::Send(text)) => {
                            if sink.send(Message::text(text)).await.is_err() {
                                break;
                            }
                        }
                        Some(Command::Drop) | None => break,
                    },
                }
            }
        });

        Self {
            addr,
            received,
            commands,
            request_uri,
            _task: task,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_uri(&self) -> Option<String> {
        self.request_uri.lock().unwrap().clone()
    }

    /// Send a raw Engine.IO packet.
    pub fn send_raw(&self, text: impl Into<String>) {
        let _ = self.commands.send(Command::Send(text.into()));
    }

    /// Emit a Socket.IO event on the default namespace.
    pub fn emit(&self, name: &str, data: serde_json::Value) {
        self.send_raw(format!("42{}", json!([name, data])));
    }

    /// Drop the TCP connection without a close handshake.
    pub fn drop_connection(&self) {
        let _ = self.commands.send(Command::Drop);
    }

    /// Next text frame from the client, skipping pongs.
    pub async fn recv(&mut self) -> String {
        loop {
            let text = timeout(Duration::from_secs(5), self.received.recv())
                .await
                .expect("recv timed out")
                .expect("server stopped");
            if text != "3" {
                return text;
            }
        }
    }

    /// Next text frame from the client, pongs included.
    pub async fn recv_any(&mut self) -> String {
        timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("recv timed out")
            .expect("server stopped")
    }
}
