//! Built-in JSON state kernel.
//!
//! A small kernel that keeps a key/value map in its [`KernelContext`]. Text
//! frames carry JSON commands tagged by `type`; binary frames are echoed back.
//!
//! ```text
//! → {"type":"set","key":"count","value":1}
//! ← {"type":"ok","key":"count","previous":null}
//! → {"type":"get","key":"count"}
//! ← {"type":"value","key":"count","value":1}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use portico_protocols::{AppLoop, Inbound, KernelContext, KernelError, Transport};

/// A command sent by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Ping,
    Set { key: String, value: Value },
    Get { key: String },
    Keys,
    Close,
}

/// A reply sent by the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// First message of every connection.
    Ready {
        connection_id: String,
        keys: Vec<String>,
    },
    Pong,
    Ok {
        key: String,
        previous: Option<Value>,
    },
    Value {
        key: String,
        value: Option<Value>,
    },
    Keys {
        keys: Vec<String>,
    },
    Error {
        message: String,
    },
    Closing,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StateKernel;

impl StateKernel {
    pub fn new() -> Self {
        Self
    }

    fn handle(&self, command: Command, context: &KernelContext) -> Reply {
        match command {
            Command::Ping => Reply::Pong,
            Command::Set { key, value } => {
                let previous = context.set(key.clone(), value);
                Reply::Ok { key, previous }
            }
            Command::Get { key } => {
                let value = context.get(&key);
                Reply::Value { key, value }
            }
            Command::Keys => Reply::Keys {
                keys: sorted_keys(context),
            },
            Command::Close => Reply::Closing,
        }
    }
}

impl AppLoop for StateKernel {
    fn name(&self) -> &str {
        "state"
    }

    fn run(&self, transport: &mut dyn Transport, context: &KernelContext) -> Result<(), KernelError> {
        send_reply(
            transport,
            &Reply::Ready {
                connection_id: context.connection_id().to_string(),
                keys: sorted_keys(context),
            },
        )?;

        loop {
            match transport.receive()? {
                Inbound::Disconnected => return Err(KernelError::Disconnected),
                Inbound::Binary(bytes) => {
                    debug!(len = bytes.len(), "Echoing binary frame");
                    transport.send_bytes(&bytes)?;
                }
                Inbound::Text(text) => {
                    let reply = match serde_json::from_str::<Command>(&text) {
                        Ok(command) => self.handle(command, context),
                        Err(e) => {
                            warn!("Malformed kernel command: {}", e);
                            Reply::Error {
                                message: e.to_string(),
                            }
                        }
                    };
                    let closing = reply == Reply::Closing;
                    send_reply(transport, &reply)?;
                    if closing {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn sorted_keys(context: &KernelContext) -> Vec<String> {
    let mut keys = context.keys();
    keys.sort();
    keys
}

fn send_reply(transport: &mut dyn Transport, reply: &Reply) -> Result<(), KernelError> {
    let payload = serde_json::to_string(reply).map_err(|e| KernelError::Protocol(e.to_string()))?;
    transport.send_text(&payload)?;
    Ok(())
}
