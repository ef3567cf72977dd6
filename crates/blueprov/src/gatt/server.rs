//! GATT application server
//!
//! A single task owns the [`AttributeTree`] and serves requests from the
//! attribute-protocol manager in arrival order. Sampling timers run as
//! separate tasks that only enqueue ticks, so a tick never interleaves with
//! a request. Property changes raised by an operation reach the
//! [`SignalSink`] before that operation's reply is sent.

use super::tree::{AttributeTree, CharacteristicId};
use super::types::{ManagedObjects, ObjectPath, Options, Properties, PropertiesChanged};
use crate::error::{GattError, GattResult};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Depth of the request queue
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Receives `PropertiesChanged` events for the manager.
pub trait SignalSink: Send + 'static {
    fn emit(&self, signal: PropertiesChanged);
}

impl SignalSink for mpsc::UnboundedSender<PropertiesChanged> {
    fn emit(&self, signal: PropertiesChanged) {
        if self.send(signal).is_err() {
            debug!("signal receiver dropped");
        }
    }
}

enum Command {
    GetManagedObjects {
        reply: oneshot::Sender<ManagedObjects>,
    },
    GetAll {
        path: ObjectPath,
        interface: String,
        reply: oneshot::Sender<GattResult<Properties>>,
    },
    ReadValue {
        path: ObjectPath,
        options: Options,
        reply: oneshot::Sender<GattResult<Vec<u8>>>,
    },
    WriteValue {
        path: ObjectPath,
        value: Vec<u8>,
        options: Options,
        reply: oneshot::Sender<GattResult<()>>,
    },
    StartNotify {
        path: ObjectPath,
        reply: oneshot::Sender<GattResult<()>>,
    },
    StopNotify {
        path: ObjectPath,
        reply: oneshot::Sender<GattResult<()>>,
    },
    Tick(CharacteristicId),
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("requester went away before the reply");
    }
}

pub struct GattServer<S> {
    tree: AttributeTree,
    sink: S,
    commands: mpsc::Receiver<Command>,
    ticks: mpsc::WeakSender<Command>,
    shutdown: CancellationToken,
}

impl<S: SignalSink> GattServer<S> {
    /// Wraps `tree`; the server stops once every handle is dropped or
    /// [`ServerHandle::shutdown`] is called.
    pub fn new(tree: AttributeTree, sink: S) -> (Self, ServerHandle) {
        let (sender, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let shutdown = CancellationToken::new();
        let handle = ServerHandle {
            root: tree.root().clone(),
            commands: sender.clone(),
            shutdown: shutdown.clone(),
        };
        let server = Self {
            tree,
            sink,
            commands,
            ticks: sender.downgrade(),
            shutdown,
        };
        (server, handle)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(mut self) {
        for (id, period) in self.tree.pollers() {
            self.spawn_poller(id, period);
        }
        info!(
            root = %self.tree.root(),
            services = self.tree.service_count(),
            characteristics = self.tree.characteristic_count(),
            descriptors = self.tree.descriptor_count(),
            "GATT application running"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => break,
                },
            }
        }

        // stops every poller
        self.shutdown.cancel();
        info!("GATT application stopped");
    }

    fn spawn_poller(&self, id: CharacteristicId, period: Duration) {
        if period.is_zero() {
            warn!(path = ?self.tree.characteristic_path(id), "zero poll interval, timer disabled");
            return;
        }
        let ticks = self.ticks.clone();
        let token = self.shutdown.child_token();
        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(sender) = ticks.upgrade() else { break };
                        if sender.send(Command::Tick(id)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    fn flush(&mut self) {
        for signal in self.tree.take_signals() {
            self.sink.emit(signal);
        }
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::GetManagedObjects { reply } => {
                info!("GetManagedObjects");
                respond(reply, self.tree.get_managed_objects());
            }
            Command::GetAll {
                path,
                interface,
                reply,
            } => respond(reply, self.tree.get_all(&path, &interface)),
            Command::ReadValue {
                path,
                options,
                reply,
            } => {
                let result = self.tree.read_value(&path, &options);
                self.flush();
                respond(reply, result);
            }
            Command::WriteValue {
                path,
                value,
                options,
                reply,
            } => {
                let result = self.tree.write_value(&path, &value, &options);
                self.flush();
                respond(reply, result);
            }
            Command::StartNotify { path, reply } => {
                let result = self.tree.start_notify(&path);
                self.flush();
                respond(reply, result);
            }
            Command::StopNotify { path, reply } => {
                let result = self.tree.stop_notify(&path);
                self.flush();
                respond(reply, result);
            }
            Command::Tick(id) => {
                self.tree.tick(id);
                self.flush();
            }
        }
    }
}

/// Cloneable front end of a running [`GattServer`]
#[derive(Clone)]
pub struct ServerHandle {
    root: ObjectPath,
    commands: mpsc::Sender<Command>,
    shutdown: CancellationToken,
}

fn stopped() -> GattError {
    GattError::Failed("server stopped".into())
}

impl ServerHandle {
    /// Application root path
    pub fn root(&self) -> &ObjectPath {
        &self.root
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> GattResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| stopped())?;
        response.await.map_err(|_| stopped())
    }

    pub async fn get_managed_objects(&self) -> GattResult<ManagedObjects> {
        self.request(|reply| Command::GetManagedObjects { reply })
            .await
    }

    pub async fn get_all(
        &self,
        path: ObjectPath,
        interface: impl Into<String>,
    ) -> GattResult<Properties> {
        let interface = interface.into();
        self.request(|reply| Command::GetAll {
            path,
            interface,
            reply,
        })
        .await?
    }

    pub async fn read_value(&self, path: ObjectPath, options: Options) -> GattResult<Vec<u8>> {
        self.request(|reply| Command::ReadValue {
            path,
            options,
            reply,
        })
        .await?
    }

    pub async fn write_value(
        &self,
        path: ObjectPath,
        value: Vec<u8>,
        options: Options,
    ) -> GattResult<()> {
        self.request(|reply| Command::WriteValue {
            path,
            value,
            options,
            reply,
        })
        .await?
    }

    pub async fn start_notify(&self, path: ObjectPath) -> GattResult<()> {
        self.request(|reply| Command::StartNotify { path, reply })
            .await?
    }

    pub async fn stop_notify(&self, path: ObjectPath) -> GattResult<()> {
        self.request(|reply| Command::StopNotify { path, reply })
            .await?
    }

    /// Stops the server and its timers.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
