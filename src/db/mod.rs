use std::{
    path::PathBuf,
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::{params, Connection};
use tokio::sync::oneshot;

mod migrations;

use crate::models::UserProgress;
use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Async facade over a dedicated worker thread that owns the SQLite
/// connection. Callers submit closures and await the reply.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let label = db_path.display().to_string();
        let path_for_thread = db_path.clone();
        Self::start(move || Connection::open(&path_for_thread), label)
    }

    /// In-memory database, used in tests.
    pub fn in_memory() -> Result<Self> {
        Self::start(Connection::open_in_memory, ":memory:".to_string())
    }

    fn start(
        open: impl FnOnce() -> rusqlite::Result<Connection> + Send + 'static,
        label: String,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("cuffsim-db".into())
            .spawn(move || {
                let mut conn = match open() {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("Failed to enable foreign keys: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {label}");

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    pub async fn insert_user_progress(&self, progress: &UserProgress) -> Result<()> {
        let user_id = progress.user.id.clone();
        let email = progress.user.email.clone();
        let payload =
            serde_json::to_string(progress).context("failed to serialize user progress")?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO users (id, email, progress) VALUES (?1, ?2, ?3)",
                params![user_id, email, payload],
            )
            .with_context(|| "failed to insert user")?;
            Ok(())
        })
        .await
    }

    /// Whole-object overwrite of one user's stored progress.
    pub async fn save_user_progress(&self, progress: &UserProgress) -> Result<()> {
        let user_id = progress.user.id.clone();
        let payload =
            serde_json::to_string(progress).context("failed to serialize user progress")?;
        self.execute(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE users SET progress = ?2 WHERE id = ?1",
                    params![user_id, payload],
                )
                .with_context(|| "failed to update user progress")?;
            if updated == 0 {
                return Err(anyhow!("no stored user with id {user_id}"));
            }
            Ok(())
        })
        .await
    }

    pub async fn load_user_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT progress FROM users WHERE id = ?1")?;
            let mut rows = stmt.query(params![user_id])?;
            if let Some(row) = rows.next()? {
                let payload: String = row.get(0)?;
                let progress = serde_json::from_str(&payload)
                    .context("failed to decode stored user progress")?;
                Ok(Some(progress))
            } else {
                Ok(None)
            }
        })
        .await
    }

    pub async fn find_user_id_by_email(&self, email: &str) -> Result<Option<String>> {
        let email = email.to_lowercase();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT id FROM users WHERE email = ?1")?;
            let mut rows = stmt.query(params![email])?;
            if let Some(row) = rows.next()? {
                Ok(Some(row.get::<_, String>(0)?))
            } else {
                Ok(None)
            }
        })
        .await
    }

    pub async fn set_active_session(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO active_session (slot, user_id) VALUES (0, ?1)
                 ON CONFLICT(slot) DO UPDATE SET user_id = excluded.user_id",
                params![user_id],
            )
            .with_context(|| "failed to set active session")?;
            Ok(())
        })
        .await
    }

    pub async fn get_active_session(&self) -> Result<Option<String>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare("SELECT user_id FROM active_session WHERE slot = 0")?;
            let mut rows = stmt.query([])?;
            if let Some(row) = rows.next()? {
                Ok(Some(row.get::<_, String>(0)?))
            } else {
                Ok(None)
            }
        })
        .await
    }

    pub async fn clear_active_session(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM active_session", [])
                .with_context(|| "failed to clear active session")?;
            Ok(())
        })
        .await
    }
}
