//! Engine.IO v4 and Socket.IO v5 text packets.
//!
//! Every WebSocket text frame carries one Engine.IO packet: a single type
//! digit followed by its data. Engine.IO `message` packets (`4`) wrap a
//! Socket.IO packet, which again starts with a type digit, optionally
//! followed by a namespace, an ack id and a JSON payload, e.g.
//! `42["image",{"image":"data:..."}]`.

use {
    crate::ComError,
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

pub const DEFAULT_NAMESPACE: &str = "/";

/// Handshake data from the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    pub namespace: String,
    pub payload: SocketPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPayload {
    Connect(Option<Value>),
    Disconnect,
    Event {
        name: String,
        args: Vec<Value>,
        ack: Option<u64>,
    },
    Ack {
        id: u64,
        args: Vec<Value>,
    },
    ConnectError(Value),
}

impl SocketPacket {
    pub fn new(payload: SocketPayload) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            payload,
        }
    }

    /// An event on the default namespace with a single argument.
    pub fn event(name: &str, data: Value) -> Self {
        Self::new(SocketPayload::Event {
            name: name.to_string(),
            args: vec![data],
            ack: None,
        })
    }

    fn type_digit(&self) -> char {
        match self.payload {
            SocketPayload::Connect(_) => '0',
            SocketPayload::Disconnect => '1',
            SocketPayload::Event { .. } => '2',
            SocketPayload::Ack { .. } => '3',
            SocketPayload::ConnectError(_) => '4',
        }
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.type_digit());
        if self.namespace != DEFAULT_NAMESPACE {
            out.push_str(&self.namespace);
            out.push(',');
        }
        match &self.payload {
            SocketPayload::Connect(Some(auth)) => out.push_str(&auth.to_string()),
            SocketPayload::Connect(None) | SocketPayload::Disconnect => {}
            SocketPayload::Event { name, args, ack } => {
                if let Some(id) = ack {
                    out.push_str(&id.to_string());
                }
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                out.push_str(&Value::Array(array).to_string());
            }
            SocketPayload::Ack { id, args } => {
                out.push_str(&id.to_string());
                out.push_str(&Value::Array(args.clone()).to_string());
            }
            SocketPayload::ConnectError(data) => out.push_str(&data.to_string()),
        }
        out
    }

    pub fn decode(text: &str) -> Result<Self, ComError> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ComError::Protocol("empty socket.io packet".to_string()))?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(ComError::Protocol(
                "binary socket.io packets are not supported".to_string(),
            ));
        }

        let mut namespace = DEFAULT_NAMESPACE.to_string();
        if rest.starts_with('/') {
            let (nsp, tail) = match rest.split_once(',') {
                Some((nsp, tail)) => (nsp, tail),
                None => (rest, ""),
            };
            namespace = nsp.to_string();
            rest = tail;
        }

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let ack = if digits > 0 {
            Some(
                rest[..digits]
                    .parse::<u64>()
                    .map_err(|e| ComError::Protocol(format!("bad ack id: {e}")))?,
            )
        } else {
            None
        };
        let json = &rest[digits..];
        let data = if json.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(json)?)
        };

        let payload = match kind {
            '0' => SocketPayload::Connect(data),
            '1' => SocketPayload::Disconnect,
            '2' => {
                let Some(Value::Array(mut items)) = data else {
                    return Err(ComError::Protocol(format!("event is not an array: {text}")));
                };
                if items.is_empty() {
                    return Err(ComError::Protocol("event without a name".to_string()));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(ComError::Protocol("event name is not a string".to_string()));
                };
                SocketPayload::Event {
                    name,
                    args: items,
                    ack,
                }
            }
            '3' => {
                let id = ack.ok_or_else(|| ComError::Protocol("ack without id".to_string()))?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                SocketPayload::Ack { id, args }
            }
            '4' => SocketPayload::ConnectError(data.unwrap_or(Value::Null)),
            other => {
                return Err(ComError::Protocol(format!(
                    "unknown socket.io packet type '{other}'"
                )));
            }
        };

        Ok(Self { namespace, payload })
    }
}

impl EnginePacket {
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(info) => {
                format!("0{}", serde_json::to_string(info).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }

    pub fn decode(text: &str) -> Result<Self, ComError> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ComError::Protocol("empty engine.io packet".to_string()))?;
        let rest = chars.as_str();
        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(rest.to_string())),
            '3' => Ok(EnginePacket::Pong(rest.to_string())),
            '4' => Ok(EnginePacket::Message(SocketPacket::decode(rest)?)),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(ComError::Protocol(format!(
                "unknown engine.io packet type '{other}'"
            ))),
        }
    }
}
