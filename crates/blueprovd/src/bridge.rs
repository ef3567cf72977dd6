//! Line-delimited JSON bridge to the attribute-protocol manager
//!
//! Every line on the input is one request:
//!
//! ```json
//! {"id": 7, "op": "write_value", "path": "/org/bluez/example/service0/char2",
//!  "value": [115, 115, 105, 100], "options": {"type": "request"}}
//! ```
//!
//! and gets exactly one reply line, either `{"id": 7, "ok": ...}` or
//! `{"id": 7, "error": "<fault name>", "message": "..."}`. Property changes
//! are written as `{"signal": "PropertiesChanged", ...}` lines, ahead of the
//! reply of the operation that raised them.

use blueprov::gatt::{ManagedObjects, PropertiesChanged, Properties};
use blueprov::{GattError, ObjectPath, Options, ServerHandle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    GetManagedObjects,
    GetAll {
        path: ObjectPath,
        interface: String,
    },
    ReadValue {
        path: ObjectPath,
        #[serde(default)]
        options: Options,
    },
    WriteValue {
        path: ObjectPath,
        value: Vec<u8>,
        #[serde(default)]
        options: Options,
    },
    StartNotify {
        path: ObjectPath,
    },
    StopNotify {
        path: ObjectPath,
    },
}

#[derive(Debug, Serialize)]
pub struct Registration<'a> {
    pub root: &'a ObjectPath,
    pub objects: ManagedObjects,
}

/// One output line
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outbound<'a> {
    Register {
        register: Registration<'a>,
    },
    Reply {
        id: Value,
        ok: Value,
    },
    Fault {
        id: Value,
        error: &'static str,
        message: String,
    },
    Signal {
        signal: &'static str,
        path: ObjectPath,
        interface: String,
        changed: Properties,
        invalidated: Vec<String>,
    },
}

impl Outbound<'_> {
    fn fault(id: Value, err: &GattError) -> Self {
        Outbound::Fault {
            id,
            error: err.fault_name(),
            message: err.to_string(),
        }
    }

    fn signal(change: PropertiesChanged) -> Self {
        Outbound::Signal {
            signal: "PropertiesChanged",
            path: change.path,
            interface: change.interface,
            changed: change.changed,
            invalidated: change.invalidated,
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, message: &Outbound<'_>) -> anyhow::Result<()> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, GattError> {
    serde_json::to_value(value).map_err(|e| GattError::Failed(e.to_string()))
}

pub struct Bridge<W> {
    handle: ServerHandle,
    out: W,
}

impl<W: AsyncWrite + Unpin> Bridge<W> {
    pub fn new(handle: ServerHandle, out: W) -> Self {
        Self { handle, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Announces the application root and its objects.
    pub async fn register(&mut self) -> anyhow::Result<()> {
        let objects = self.handle.get_managed_objects().await?;
        info!(root = %self.handle.root(), objects = objects.len(), "registering GATT application");
        let message = Outbound::Register {
            register: Registration {
                root: self.handle.root(),
                objects,
            },
        };
        write_line(&mut self.out, &message).await
    }

    async fn call(&self, op: Op) -> Result<Value, GattError> {
        match op {
            Op::GetManagedObjects => to_json(&self.handle.get_managed_objects().await?),
            Op::GetAll { path, interface } => to_json(&self.handle.get_all(path, interface).await?),
            Op::ReadValue { path, options } => {
                to_json(&self.handle.read_value(path, options).await?)
            }
            Op::WriteValue {
                path,
                value,
                options,
            } => {
                self.handle.write_value(path, value, options).await?;
                Ok(Value::Null)
            }
            Op::StartNotify { path } => {
                self.handle.start_notify(path).await?;
                Ok(Value::Null)
            }
            Op::StopNotify { path } => {
                self.handle.stop_notify(path).await?;
                Ok(Value::Null)
            }
        }
    }

    async fn answer(&self, line: &str) -> Outbound<'static> {
        let mut request: Value = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                return Outbound::fault(Value::Null, &GattError::InvalidArgs);
            }
        };
        let id = request
            .as_object_mut()
            .and_then(|fields| fields.remove("id"))
            .unwrap_or(Value::Null);
        let op = match serde_json::from_value::<Op>(request) {
            Ok(op) => op,
            Err(e) => {
                warn!(%id, error = %e, "malformed request");
                return Outbound::fault(id, &GattError::InvalidArgs);
            }
        };
        debug!(%id, ?op, "request");
        match self.call(op).await {
            Ok(ok) => Outbound::Reply { id, ok },
            Err(err) => {
                info!(%id, fault = err.fault_name(), "request failed: {}", err);
                Outbound::fault(id, &err)
            }
        }
    }

    /// Serves `input` until it ends or `shutdown` fires.
    pub async fn serve<R: AsyncBufRead + Unpin>(
        &mut self,
        input: R,
        mut signals: mpsc::UnboundedReceiver<PropertiesChanged>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut lines = input.lines();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("manager closed the request stream");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let reply = self.answer(&line).await;
                    // changes raised by this request go out first
                    while let Ok(change) = signals.try_recv() {
                        write_line(&mut self.out, &Outbound::signal(change)).await?;
                    }
                    write_line(&mut self.out, &reply).await?;
                }
                Some(change) = signals.recv() => {
                    write_line(&mut self.out, &Outbound::signal(change)).await?;
                }
            }
        }
        Ok(())
    }
}
