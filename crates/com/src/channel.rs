use {
    crate::{packet::*, *},
    futures_util::{
        SinkExt, StreamExt,
        stream::{SplitSink, SplitStream},
    },
    serde_json::{Value, json},
    std::{
        pin::Pin,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        task::{Context, Poll},
        time::Duration,
    },
    tokio::{
        net::TcpStream,
        sync::mpsc,
        task::JoinHandle,
        time::timeout,
    },
    tokio_websockets::{ClientBuilder, MaybeTlsStream, Message, WebSocketStream},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

// disconnect reasons, as Socket.IO names them
const REASON_SERVER_DISCONNECT: &str = "io server disconnect";
const REASON_CLIENT_DISCONNECT: &str = "io client disconnect";
const REASON_PING_TIMEOUT: &str = "ping timeout";
const REASON_TRANSPORT_CLOSE: &str = "transport close";
const REASON_TRANSPORT_ERROR: &str = "transport error";

enum Outgoing {
    Text(String),
    Close,
}

/// Entry point for opening a channel.
pub struct Channel;

impl Channel {
    /// Connect to a Socket.IO server.
    ///
    /// Completes the Engine.IO open handshake and the namespace connect
    /// before returning. The first event on the returned [`ChannelEvents`] is
    /// always [`ServerEvent::Connected`].
    pub async fn connect(config: &ChannelConfig) -> Result<(ChannelSender, ChannelEvents), ComError> {
        let uri = config.endpoint_uri()?;
        log::info!("connecting to {}", uri);

        let (stream, open, sid) = timeout(config.handshake_timeout, handshake(uri))
            .await
            .map_err(|_| ComError::Timeout)??;
        log::info!(
            "channel connected: sid {}, ping every {} ms",
            sid,
            open.ping_interval
        );

        let (sink, source) = stream.split();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        let _ = events_tx.send(ServerEvent::Connected { sid: sid.clone() });

        let writer = tokio::spawn(run_writer(sink, outgoing_rx));
        let ping_deadline = Duration::from_millis(open.ping_interval + open.ping_timeout);
        let reader = tokio::spawn(run_reader(
            source,
            outgoing_tx.downgrade(),
            events_tx,
            Arc::clone(&connected),
            ping_deadline,
        ));

        let sender = ChannelSender {
            outgoing: outgoing_tx,
            connected,
            sid,
            max_payload: open.max_payload.map(|max| max as usize),
        };
        let events = ChannelEvents {
            receiver: events_rx,
            _reader: reader,
            _writer: writer,
        };
        Ok((sender, events))
    }
}

async fn next_text(stream: &mut WsStream) -> Result<String, ComError> {
    loop {
        match stream.next().await {
            Some(Ok(msg)) => {
                if let Some(text) = msg.as_text() {
                    return Ok(text.to_string());
                }
                if msg.is_close() {
                    return Err(ComError::ConnectionClosed);
                }
            }
            Some(Err(e)) => return Err(ComError::from(e)),
            None => return Err(ComError::ConnectionClosed),
        }
    }
}

async fn handshake(uri: http::Uri) -> Result<(WsStream, OpenInfo, String), ComError> {
    let (mut stream, _response) = ClientBuilder::from_uri(uri).connect().await?;

    let open = match EnginePacket::decode(&next_text(&mut stream).await?)? {
        EnginePacket::Open(open) => open,
        other => {
            return Err(ComError::Protocol(format!(
                "expected engine.io open, got {:?}",
                other
            )));
        }
    };

    let connect = EnginePacket::Message(SocketPacket::new(SocketPayload::Connect(None)));
    stream.send(Message::text(connect.encode())).await?;

    loop {
        match EnginePacket::decode(&next_text(&mut stream).await?)? {
            EnginePacket::Message(SocketPacket {
                payload: SocketPayload::Connect(data),
                ..
            }) => {
                let sid = data
                    .as_ref()
                    .and_then(|data| data.get("sid"))
                    .and_then(Value::as_str)
                    .unwrap_or(open.sid.as_str())
                    .to_string();
                return Ok((stream, open, sid));
            }
            EnginePacket::Message(SocketPacket {
                payload: SocketPayload::ConnectError(data),
                ..
            }) => {
                let message = data
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| data.to_string());
                return Err(ComError::Protocol(format!("connect refused: {message}")));
            }
            EnginePacket::Ping(data) => {
                stream
                    .send(Message::text(EnginePacket::Pong(data).encode()))
                    .await?;
            }
            EnginePacket::Close => return Err(ComError::ConnectionClosed),
            other => log::debug!("ignoring {:?} during handshake", other),
        }
    }
}

async fn run_writer(mut sink: WsSink, mut outgoing: mpsc::UnboundedReceiver<Outgoing>) {
    while let Some(item) = outgoing.recv().await {
        match item {
            Outgoing::Text(text) => {
                if let Err(error) = sink.send(Message::text(text)).await {
                    log::warn!("channel write failed: {}", error);
                    break;
                }
            }
            Outgoing::Close => {
                let disconnect =
                    EnginePacket::Message(SocketPacket::new(SocketPayload::Disconnect));
                let _ = sink.send(Message::text(disconnect.encode())).await;
                break;
            }
        }
    }
    // every sender is gone, or close was requested
    let _ = sink.close().await;
    log::debug!("channel writer stopped");
}

async fn run_reader(
    mut source: WsSource,
    outgoing: mpsc::WeakUnboundedSender<Outgoing>,
    events: mpsc::UnboundedSender<ServerEvent>,
    connected: Arc<AtomicBool>,
    ping_deadline: Duration,
) {
    let reason = loop {
        let msg = match timeout(ping_deadline, source.next()).await {
            Err(_) => break REASON_PING_TIMEOUT,
            Ok(None) => break REASON_TRANSPORT_CLOSE,
            Ok(Some(Err(error))) => {
                log::warn!("channel read failed: {}", error);
                break REASON_TRANSPORT_ERROR;
            }
            Ok(Some(Ok(msg))) => msg,
        };
        if msg.is_close() {
            break REASON_TRANSPORT_CLOSE;
        }
        let Some(text) = msg.as_text() else {
            continue;
        };

        let packet = match EnginePacket::decode(text) {
            Ok(packet) => packet,
            Err(error) => {
                log::warn!("dropping packet: {}", error);
                continue;
            }
        };
        match packet {
            EnginePacket::Ping(data) => {
                let Some(outgoing) = outgoing.upgrade() else {
                    break REASON_CLIENT_DISCONNECT;
                };
                let _ = outgoing.send(Outgoing::Text(EnginePacket::Pong(data).encode()));
            }
            EnginePacket::Close => break REASON_TRANSPORT_CLOSE,
            EnginePacket::Message(SocketPacket { payload, .. }) => match payload {
                SocketPayload::Event { name, args, .. } => {
                    match ServerEvent::from_event(&name, &args) {
                        Some(event) => {
                            if events.send(event).is_err() {
                                // nobody listens anymore
                                break REASON_CLIENT_DISCONNECT;
                            }
                        }
                        None => log::debug!("ignoring event {}", name),
                    }
                }
                SocketPayload::Disconnect => break REASON_SERVER_DISCONNECT,
                other => log::debug!("ignoring {:?}", other),
            },
            _ => {}
        }
    };

    // a close() from this side already cleared the flag
    let reason = if connected.swap(false, Ordering::Relaxed) {
        reason
    } else {
        REASON_CLIENT_DISCONNECT
    };
    log::info!("channel disconnected: {}", reason);
    let _ = events.send(ServerEvent::Disconnected {
        reason: reason.to_string(),
    });
    // let the writer finish
    if let Some(outgoing) = outgoing.upgrade() {
        let _ = outgoing.send(Outgoing::Close);
    }
}

/// Sending half of a channel. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ChannelSender {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    connected: Arc<AtomicBool>,
    sid: String,
    max_payload: Option<usize>,
}

impl ChannelSender {
    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Queue a Socket.IO event. Never waits for the network.
    pub fn emit(&self, name: &str, data: Value) -> Result<(), ComError> {
        if !self.is_connected() {
            return Err(ComError::ConnectionClosed);
        }
        let text = EnginePacket::Message(SocketPacket::event(name, data)).encode();
        if let Some(max_payload) = self.max_payload {
            if text.len() > max_payload {
                return Err(ComError::MessageTooLarge(text.len()));
            }
        }
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| ComError::ConnectionClosed)
    }

    /// Send one encoded frame as the `image` event.
    pub fn send_frame(&self, payload: &FramePayload) -> Result<(), ComError> {
        self.emit(IMAGE_EVENT, serde_json::to_value(payload)?)
    }

    /// Ask the server whether its processing backend is up.
    ///
    /// The answer arrives as [`ServerEvent::ProbeResponse`].
    pub fn probe(&self) -> Result<(), ComError> {
        self.emit(TEST_CONNECTION_EVENT, json!({}))
    }

    /// Disconnect from the namespace and close the socket. Safe to call repeatedly.
    pub fn close(&self) {
        if self.connected.swap(false, Ordering::Relaxed) {
            log::info!("closing channel {}", self.sid);
            let _ = self.outgoing.send(Outgoing::Close);
        }
    }
}

/// Receiving half of a channel.
///
/// Ends after [`ServerEvent::Disconnected`].
pub struct ChannelEvents {
    receiver: mpsc::UnboundedReceiver<ServerEvent>,
    _reader: JoinHandle<()>,
    _writer: JoinHandle<()>,
}

impl ChannelEvents {
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.receiver.recv().await
    }
}

impl futures_core::Stream for ChannelEvents {
    type Item = ServerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
