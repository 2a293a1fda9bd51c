//! Dedicated writer thread. Every write job runs inside an immediate
//! transaction; jobs are serialized behind a channel so readers on the pool
//! never observe a half-applied write.

use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use tokio::sync::{mpsc, oneshot};

use tasknest_core::errors::{DatabaseError, Error, Result};

use super::DbPool;

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send>;

#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<WriteJob>,
}

impl WriteHandle {
    /// Run `f` on the writer thread inside an immediate transaction. A job
    /// returning `Err` rolls the whole transaction back; the result is
    /// delivered only after the transaction has committed or rolled back.
    pub async fn exec<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let (res_tx, res_rx) = oneshot::channel();
        let job: WriteJob = Box::new(move |conn| {
            let mut outcome: Option<Result<T>> = None;
            let tx_result = conn.immediate_transaction::<_, diesel::result::Error, _>(|tx_conn| {
                match f(tx_conn) {
                    Ok(value) => {
                        outcome = Some(Ok(value));
                        Ok(())
                    }
                    Err(err) => {
                        outcome = Some(Err(err));
                        Err(diesel::result::Error::RollbackTransaction)
                    }
                }
            });
            let result = match tx_result {
                Ok(()) => outcome.unwrap_or_else(|| {
                    Err(Error::Database(DatabaseError::Internal(
                        "write job produced no result".to_string(),
                    )))
                }),
                Err(diesel::result::Error::RollbackTransaction) => outcome.unwrap_or_else(|| {
                    Err(Error::Database(DatabaseError::Internal(
                        "write job rolled back without a result".to_string(),
                    )))
                }),
                Err(err) => Err(Error::Database(DatabaseError::QueryFailed(format!(
                    "Transaction failed: {err}"
                )))),
            };
            let _ = res_tx.send(result);
        });
        self.tx.send(job).map_err(|_| {
            Error::Database(DatabaseError::Unavailable("writer stopped".to_string()))
        })?;
        res_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "writer dropped job before completion".to_string(),
            ))
        })?
    }
}

/// Spawn the writer thread for `pool`.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<WriteJob>();
    std::thread::spawn(move || {
        while let Some(job) = rx.blocking_recv() {
            match pool.get() {
                Ok(mut conn) => job(&mut conn),
                Err(err) => {
                    // Dropping the job cancels its oneshot; the caller sees
                    // the error on await.
                    log::warn!("[TaskSync] Writer could not acquire a connection: {err}");
                }
            }
        }
    });
    WriteHandle { tx }
}
