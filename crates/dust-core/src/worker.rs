//! Background task owning a [`DataManager`], driven by messages.
//!
//! Requests are handled one at a time in arrival order, so a population and
//! the queries that follow it never interleave.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatch::{Command, DataManager, Reply};
use crate::loader::DatasetSource;

#[derive(Debug)]
enum Message {
    Command(Command),
    Call { operation: String, args: Vec<Value> },
}

#[derive(Debug)]
struct Request {
    message: Message,
    reply: oneshot::Sender<Reply>,
}

/// Cloneable sender side of a running worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<Request>,
}

/// Start the worker on the current tokio runtime. It stops once every
/// handle is dropped.
pub fn spawn<S: DatasetSource>(manager: DataManager<S>) -> (WorkerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(manager, rx));
    (WorkerHandle { tx }, task)
}

async fn run<S: DatasetSource>(mut manager: DataManager<S>, mut rx: mpsc::UnboundedReceiver<Request>) {
    info!("Guide worker started");
    while let Some(Request { message, reply }) = rx.recv().await {
        let answer = match message {
            Message::Command(command) => manager.handle(command).await,
            Message::Call { operation, args } => {
                debug!(%operation, "Handling call");
                manager.call(&operation, args).await
            }
        };
        if reply.send(answer).is_err() {
            debug!("Caller went away before the reply was ready");
        }
    }
    info!("Guide worker stopped");
}

impl WorkerHandle {
    async fn send(&self, message: Message) -> Reply {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = Request {
            message,
            reply: reply_tx,
        };
        if self.tx.send(request).is_err() {
            warn!("Guide worker is no longer running");
            return stopped();
        }
        reply_rx.await.unwrap_or_else(|_| stopped())
    }

    pub async fn request(&self, command: Command) -> Reply {
        self.send(Message::Command(command)).await
    }

    /// Positional call, answered as JSON.
    pub async fn call(&self, operation: &str, args: Vec<Value>) -> Value {
        let reply = self
            .send(Message::Call {
                operation: operation.to_string(),
                args,
            })
            .await;
        serde_json::to_value(&reply).unwrap_or_else(|err| {
            warn!(error = %err, "Reply could not be encoded");
            Value::Null
        })
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

fn stopped() -> Reply {
    Reply::Failed {
        reason: "guide worker is not running".to_string(),
    }
}
