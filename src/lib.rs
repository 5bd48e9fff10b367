//! # backupd
//!
//! A controllable periodic file backup daemon.
//!
//! ## Features
//!
//! - **Scheduled Backups**: fixed-interval full copies of a single source file
//! - **Compression**: every backup is wrapped into a zip archive
//! - **Graceful Degrade**: a failed archive step never loses the copied backup
//! - **Task Control**: pause, resume, skip-once and end commands over a channel
//! - **Observability**: every cycle outcome is reported to an observer channel
//!
//! ## Quick Start
//!
//! ```no_run
//! use backupd::backup::backup_config::BackupConfig;
//! use backupd::backup::task::{create_file_backup_task, TaskHandleSignal};
//! use tokio::sync::mpsc;
//! use validator::Validate;
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from YAML file
//! let config: BackupConfig = serde_yml::from_reader(std::fs::File::open("config.yml")?)?;
//! config.validate()?;
//!
//! // Start the backup task and watch its signals
//! let (_commands, command_rx) = mpsc::channel::<TaskHandleSignal>(20);
//! let (mut signals, _task) =
//!     create_file_backup_task(config.locations(), command_rx, config.interval);
//! while let Some(signal) = signals.recv().await {
//!     if signal.done {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod backup;
