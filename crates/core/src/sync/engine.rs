//! Reconciliation engine: drain outbox, upload local-only tasks, converge on
//! server truth.

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::{Error, RemoteError, Result};
use crate::tasks::{Task, TaskCacheRepositoryTrait};

use super::model::{
    IdMappingRepositoryTrait, OutboxEntry, OutboxOp, OutboxRepositoryTrait, ReconcileSummary,
    ReconcileTrigger, RemoteTaskApi,
};

/// Outcome of replaying a single outbox entry.
enum EntryOutcome {
    /// Confirmed on the server and removed from the outbox.
    Applied,
    /// Discarded without a network call (unresolvable reference).
    Dropped,
}

/// Orchestrates the local stores and the remote task service.
///
/// One engine instance exists per local store. All mutation of the Entity
/// Cache, Outbox, and Identifier Mapping Table during a pass goes through
/// this type; a `tokio::sync::Mutex` makes passes single-flight (a pass
/// requested while one is running queues behind it and executes afterwards).
pub struct SyncEngine {
    cache: Arc<dyn TaskCacheRepositoryTrait>,
    outbox: Arc<dyn OutboxRepositoryTrait>,
    id_map: Arc<dyn IdMappingRepositoryTrait>,
    remote: Arc<dyn RemoteTaskApi>,
    pass_guard: tokio::sync::Mutex<()>,
    tasks: RwLock<Vec<Task>>,
    online: AtomicBool,
    watcher: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn new(
        cache: Arc<dyn TaskCacheRepositoryTrait>,
        outbox: Arc<dyn OutboxRepositoryTrait>,
        id_map: Arc<dyn IdMappingRepositoryTrait>,
        remote: Arc<dyn RemoteTaskApi>,
    ) -> Self {
        Self {
            cache,
            outbox,
            id_map,
            remote,
            pass_guard: tokio::sync::Mutex::new(()),
            tasks: RwLock::new(Vec::new()),
            online: AtomicBool::new(false),
            watcher: tokio::sync::Mutex::new(None),
        }
    }

    /// Current in-memory task list (server truth as of the last successful
    /// load or pass).
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.read().map(|t| t.clone()).unwrap_or_default()
    }

    /// Last connectivity state reported by the watcher.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn set_tasks(&self, tasks: Vec<Task>) {
        if let Ok(mut guard) = self.tasks.write() {
            *guard = tasks;
        }
    }

    /// Initial task load: server if reachable, local cache otherwise.
    ///
    /// Cancellable by dropping the returned future: the cache write is a
    /// single atomic job issued only after the fetch has completed, so a
    /// load cancelled mid-fetch leaves the cache as it was.
    pub async fn load_initial(&self) -> Result<Vec<Task>> {
        if self.is_online() {
            match self.remote.list_tasks().await {
                Ok(raw) => {
                    let tasks: Vec<Task> = raw.into_iter().map(Task::from_raw).collect();
                    if let Err(err) = self.cache.replace_all(tasks.clone()).await {
                        // The server answered; stale-cache persistence is not
                        // worth failing the load over.
                        warn!("[TaskSync] Failed to cache initial snapshot: {err}");
                    }
                    self.set_tasks(tasks.clone());
                    return Ok(tasks);
                }
                Err(err) => {
                    warn!("[TaskSync] Initial fetch failed, falling back to cache: {err}");
                }
            }
        }

        match self.cache.get_all() {
            Ok(tasks) => {
                self.set_tasks(tasks.clone());
                Ok(tasks)
            }
            Err(err) => Err(Error::TasksUnavailable(err.to_string())),
        }
    }

    /// Run one reconciliation pass on demand.
    pub async fn reconcile(&self) -> Result<ReconcileSummary> {
        self.run_pass(ReconcileTrigger::Manual).await
    }

    async fn run_pass(&self, trigger: ReconcileTrigger) -> Result<ReconcileSummary> {
        let _guard = self.pass_guard.lock().await;
        let started_at = Instant::now();
        debug!("[TaskSync] Reconciliation pass started (trigger={trigger:?})");

        // Step 1: server snapshot. The only abort point of the pass.
        let snapshot = self.remote.list_tasks().await.map_err(|err| {
            warn!("[TaskSync] Server snapshot fetch failed, aborting pass: {err}");
            Error::SyncUnavailable(err.to_string())
        })?;
        let server_tasks: Vec<Task> = snapshot.into_iter().map(Task::from_raw).collect();
        let server_ids: HashSet<String> =
            server_tasks.iter().filter_map(|t| t.id.clone()).collect();

        // Step 2: local snapshot, taken before the outbox drain.
        let local_tasks = self.cache.get_all()?;

        let mut replayed = 0usize;
        let mut dropped = 0usize;
        let mut failed = 0usize;
        let mut uploaded = 0usize;

        // Step 3: drain the outbox in timestamp order. The sort is stable, so
        // equal timestamps keep their enqueue order.
        let mut entries = self.outbox.list()?;
        entries.sort_by_key(|entry| entry.ts);
        for entry in &entries {
            match self.apply_entry(entry).await {
                Ok(EntryOutcome::Applied) => replayed += 1,
                Ok(EntryOutcome::Dropped) => dropped += 1,
                Err(err) => {
                    warn!(
                        "[TaskSync] Outbox entry {} ({:?} for {}) failed, will retry next pass: {err}",
                        entry.id, entry.op, entry.client_id
                    );
                    failed += 1;
                }
            }
        }

        // Step 4: upload local-only tasks. A task whose correlation id still
        // has a pending outbox entry is skipped; its intent replays next pass.
        let still_pending: HashSet<String> = self
            .outbox
            .list()?
            .into_iter()
            .map(|entry| entry.client_id)
            .collect();
        for task in &local_tasks {
            if still_pending.contains(&task.client_id) {
                continue;
            }
            if self.id_map.get(&task.client_id)?.is_some() {
                continue;
            }
            let known_on_server = task
                .id
                .as_ref()
                .map(|id| server_ids.contains(id))
                .unwrap_or(false)
                || server_ids.contains(&task.client_id);
            if known_on_server {
                continue;
            }

            match self.upload_local_only(task).await {
                Ok(()) => uploaded += 1,
                Err(err) => {
                    warn!(
                        "[TaskSync] Upload of local-only task {} failed, will retry next pass: {err}",
                        task.client_id
                    );
                    failed += 1;
                }
            }
        }

        // Step 5: converge on server truth.
        let refreshed = self.remote.list_tasks().await.map_err(|err| {
            warn!("[TaskSync] Convergence fetch failed: {err}");
            Error::SyncUnavailable(err.to_string())
        })?;
        let reverse: HashMap<String, String> = self
            .id_map
            .all()?
            .into_iter()
            .map(|mapping| (mapping.server_id, mapping.client_id))
            .collect();
        let final_tasks: Vec<Task> = refreshed
            .into_iter()
            .map(Task::from_raw)
            .filter(|task| !task.deleted)
            .map(|mut task| {
                // Re-key server rows to their stable correlation identifier.
                if let Some(client_id) = task.id.as_ref().and_then(|id| reverse.get(id)) {
                    task.client_id = client_id.clone();
                }
                task
            })
            .collect();
        self.cache.replace_all(final_tasks.clone()).await?;
        self.set_tasks(final_tasks);

        let summary = ReconcileSummary {
            replayed,
            uploaded,
            dropped,
            failed,
            total: self.tasks.read().map(|t| t.len()).unwrap_or(0),
            duration_ms: started_at.elapsed().as_millis() as i64,
        };
        info!(
            "[TaskSync] Pass complete (trigger={trigger:?}): replayed={} uploaded={} dropped={} failed={} total={} duration_ms={}",
            summary.replayed,
            summary.uploaded,
            summary.dropped,
            summary.failed,
            summary.total,
            summary.duration_ms
        );
        Ok(summary)
    }

    async fn apply_entry(&self, entry: &OutboxEntry) -> Result<EntryOutcome> {
        match entry.op {
            OutboxOp::Create => {
                let payload = entry.payload.clone().unwrap_or_default();
                let raw = self.remote.create_task(&payload).await?;
                let mut task = Task::from_raw(raw);
                let server_id = task.id.clone().ok_or_else(|| {
                    Error::Remote(RemoteError::Decode(
                        "create response carried no identifier".to_string(),
                    ))
                })?;
                self.id_map.set(&entry.client_id, &server_id).await?;
                task.client_id = entry.client_id.clone();
                self.cache.put(task).await?;
                self.outbox.remove(&entry.id).await?;
                Ok(EntryOutcome::Applied)
            }
            OutboxOp::Update => {
                let Some(server_id) = self.id_map.get(&entry.client_id)? else {
                    debug!(
                        "[TaskSync] Dropping update for {}: never created server-side",
                        entry.client_id
                    );
                    self.outbox.remove(&entry.id).await?;
                    return Ok(EntryOutcome::Dropped);
                };
                let payload = entry.payload.clone().unwrap_or_default();
                let raw = self.remote.update_task(&server_id, &payload).await?;
                let mut task = Task::from_raw(raw);
                task.client_id = entry.client_id.clone();
                if task.id.is_none() {
                    task.id = Some(server_id);
                }
                self.cache.put(task).await?;
                self.outbox.remove(&entry.id).await?;
                Ok(EntryOutcome::Applied)
            }
            OutboxOp::Delete => {
                let Some(server_id) = self.id_map.get(&entry.client_id)? else {
                    debug!(
                        "[TaskSync] Dropping delete for {}: never created server-side",
                        entry.client_id
                    );
                    self.outbox.remove(&entry.id).await?;
                    return Ok(EntryOutcome::Dropped);
                };
                self.remote.delete_task(&server_id).await?;
                self.cache.remove(&server_id).await?;
                self.outbox.remove(&entry.id).await?;
                Ok(EntryOutcome::Applied)
            }
        }
    }

    async fn upload_local_only(&self, task: &Task) -> Result<()> {
        let raw = self.remote.create_task(&task.payload()).await?;
        let mut created = Task::from_raw(raw);
        let server_id = created.id.clone().ok_or_else(|| {
            Error::Remote(RemoteError::Decode(
                "create response carried no identifier".to_string(),
            ))
        })?;
        self.id_map.set(&task.client_id, &server_id).await?;
        created.client_id = task.client_id.clone();
        self.cache.put(created).await?;
        Ok(())
    }

    /// Watch the connectivity signal: keep the online flag current and run
    /// exactly one reconciliation pass per unreachable→reachable transition.
    pub async fn start_connectivity_watcher(self: Arc<Self>, rx: watch::Receiver<bool>) {
        let mut guard = self.watcher.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
            guard.take();
        }

        let engine = Arc::clone(&self);
        let mut rx = rx;
        let mut reachable = *rx.borrow();
        engine.set_online(reachable);

        let handle = tokio::spawn(async move {
            loop {
                // Sender dropped means the collaborator went away; stop.
                if rx.changed().await.is_err() {
                    break;
                }
                let now = *rx.borrow();
                engine.set_online(now);
                if !reachable && now {
                    info!("[TaskSync] Connectivity regained, scheduling reconciliation pass");
                    if let Err(err) = engine.run_pass(ReconcileTrigger::ConnectivityRegained).await
                    {
                        warn!("[TaskSync] Connectivity-triggered pass failed: {err}");
                    }
                }
                reachable = now;
            }
        });
        *guard = Some(handle);
    }

    pub async fn stop_connectivity_watcher(&self) {
        if let Some(handle) = self.watcher.lock().await.take() {
            handle.abort();
        }
    }
}
