//! Database connection management.
//!
//! rusqlite connections are not `Sync`, so the connection lives on a
//! dedicated worker thread and async callers submit closures over a
//! channel. The handle is cheap to clone; dropping the last clone shuts
//! the worker down.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

use super::migrations;

type Task = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Command {
    Run(Task),
    Shutdown,
}

#[derive(Debug)]
struct Inner {
    sender: mpsc::Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if self.sender.send(Command::Shutdown).is_err() {
                tracing::error!("store worker already gone at shutdown");
            }
            if handle.join().is_err() {
                tracing::error!("failed to join store worker thread");
            }
        }
    }
}

/// Handle to the local replica database
#[derive(Clone, Debug)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::start(Some(path.as_ref().to_path_buf()))
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::start(None)
    }

    fn start(path: Option<PathBuf>) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let worker = thread::Builder::new()
            .name("dialcache-store".into())
            .spawn(move || {
                let opened = match &path {
                    Some(path) => Connection::open(path),
                    None => Connection::open_in_memory(),
                };
                let mut conn = match opened {
                    Ok(conn) => conn,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.into()));
                        return;
                    }
                };

                if path.is_some() {
                    if let Err(e) = conn.pragma_update(None, "journal_mode", "WAL") {
                        tracing::warn!("failed to enable WAL mode: {e}");
                    }
                }
                if let Err(e) = conn.pragma_update(None, "synchronous", "NORMAL") {
                    tracing::warn!("failed to set synchronous pragma: {e}");
                }

                if ready_tx.send(migrations::run(&mut conn)).is_err() {
                    tracing::error!("store opener dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        Command::Run(task) => task(&mut conn),
                        Command::Shutdown => break,
                    }
                }

                tracing::debug!("store worker shutting down");
            })
            .map_err(|e| Error::StoreWrite(format!("failed to spawn store worker: {e}")))?;

        ready_rx
            .recv()
            .map_err(|_| Error::StoreWrite("store worker exited during startup".into()))??;

        Ok(Self {
            inner: Arc::new(Inner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Run a closure against the connection on the worker thread.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = Command::Run(Box::new(move |conn| {
            if reply_tx.send(task(conn)).is_err() {
                tracing::error!("store caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|_| Error::StoreWrite("store worker is gone".into()))?;

        reply_rx
            .await
            .map_err(|_| Error::StoreWrite("store worker terminated unexpectedly".into()))?
    }
}
