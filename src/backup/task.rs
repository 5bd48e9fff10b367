use crate::backup::cycle::{run_cycle, BackupLocations, CycleError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome attached to every signal emitted by a backup task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Failed,
    Ended,
    Paused,
    Skipped,
}

/// Signal emitted by the backup task towards its observer.
///
/// `done` is true only for the single final `Ended` signal, and `error` is
/// set if and only if `status` is `Failed`.
#[derive(Debug)]
pub struct BackupTaskSignal {
    pub done: bool,
    pub status: TaskStatus,
    pub error: Option<CycleError>,
}

impl BackupTaskSignal {
    fn status(status: TaskStatus) -> Self {
        Self {
            done: false,
            status,
            error: None,
        }
    }

    fn failed(error: CycleError) -> Self {
        Self {
            done: false,
            status: TaskStatus::Failed,
            error: Some(error),
        }
    }

    fn ended() -> Self {
        Self {
            done: true,
            status: TaskStatus::Ended,
            error: None,
        }
    }
}

/// Commands accepted by a running backup task.
///
/// `Skip` suppresses exactly the next tick; `Pause` suppresses every tick
/// until a `Resume` arrives; `End` terminates the task loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskHandleSignal {
    End,
    Pause,
    Skip,
    Resume,
}

/// Handle to a spawned backup task, returned alongside its signal channel.
#[derive(Debug)]
pub struct BackupTask {
    halt: CancellationToken,
    handle: JoinHandle<()>,
}

impl BackupTask {
    /// Halts the timer loop immediately, without waiting for the loop to
    /// acknowledge an `End` command. No further signal is emitted.
    pub fn halt(&self) {
        self.halt.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task loop to exit.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

// Sends towards the observer block once a signal is in flight, so a slow or
// absent observer stalls the whole loop, command delivery included.
const SIGNAL_CHANNEL_CAPACITY: usize = 1;

/// Spawns the periodic backup task.
///
/// Every `backup_interval` the task copies and archives the configured source
/// file, unless paused or skip-armed, and reports each outcome on the
/// returned signal channel. Commands arrive on `task_handle`; dropping that
/// channel ends the task the same way an `End` command does. The first cycle
/// runs one full interval after creation, and ticks that elapse while a cycle
/// is still running are dropped, never queued.
pub fn create_file_backup_task(
    locations: BackupLocations,
    task_handle: mpsc::Receiver<TaskHandleSignal>,
    backup_interval: Duration,
) -> (mpsc::Receiver<BackupTaskSignal>, BackupTask) {
    let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
    let halt = CancellationToken::new();

    let loop_halt = halt.clone();
    let handle = tokio::spawn(async move {
        backup_task_loop(locations, task_handle, backup_interval, signal_tx, loop_halt).await;
    });

    (signal_rx, BackupTask { halt, handle })
}

async fn backup_task_loop(
    locations: BackupLocations,
    mut task_handle: mpsc::Receiver<TaskHandleSignal>,
    backup_interval: Duration,
    signals: mpsc::Sender<BackupTaskSignal>,
    halt: CancellationToken,
) {
    let mut ticker = time::interval_at(
        time::Instant::now() + backup_interval,
        backup_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut skip_backup = false;
    let mut pause_backup = false;

    loop {
        tokio::select! {
            _ = halt.cancelled() => {
                info!("backup task halted, exiting without acknowledgment");
                return;
            }
            command = task_handle.recv() => {
                // A dropped command channel ends the task.
                match command.unwrap_or(TaskHandleSignal::End) {
                    TaskHandleSignal::End => {
                        emit(&signals, BackupTaskSignal::ended()).await;
                        info!("terminating all backups");
                        return;
                    }
                    TaskHandleSignal::Pause => {
                        pause_backup = true;
                        info!("pausing all following backups");
                        if !emit(&signals, BackupTaskSignal::status(TaskStatus::Paused)).await {
                            return;
                        }
                    }
                    TaskHandleSignal::Skip => {
                        skip_backup = true;
                        info!("skipping the next backup");
                        if !emit(&signals, BackupTaskSignal::status(TaskStatus::Skipped)).await {
                            return;
                        }
                    }
                    TaskHandleSignal::Resume => {
                        // No TaskStatus models a resume, so this transition
                        // is log-only.
                        pause_backup = false;
                        info!("resuming periodic backups");
                    }
                }
            }
            _ = ticker.tick() => {
                if skip_backup {
                    skip_backup = false;
                    info!("skipped one backup tick");
                    continue;
                }
                if pause_backup {
                    info!("backups are paused, skipped backup tick");
                    continue;
                }

                let outcome = match run_cycle(&locations) {
                    Ok(()) => BackupTaskSignal::status(TaskStatus::Success),
                    Err(error) => BackupTaskSignal::failed(error),
                };
                if !emit(&signals, outcome).await {
                    return;
                }
            }
        }
    }
}

async fn emit(signals: &mpsc::Sender<BackupTaskSignal>, signal: BackupTaskSignal) -> bool {
    if signals.send(signal).await.is_err() {
        warn!("signal observer dropped, stopping the backup task");
        return false;
    }
    true
}
