use backupd::backup::backup_config::BackupConfig;
use backupd::backup::result_error::error::Error;
use backupd::backup::result_error::result::Result;
use backupd::backup::result_error::WithMsg;
use backupd::backup::task::{
    create_file_backup_task, BackupTaskSignal, TaskHandleSignal, TaskStatus,
};
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::exit;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use validator::Validate;

/// Periodic file backup daemon
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file
    #[arg(short, long)]
    config: PathBuf,
}

// The task reads commands faster than any human issues them; commands are
// rare relative to ticks.
const COMMAND_CHANNEL_CAPACITY: usize = 20;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!("{e}");
        exit(1);
    }
}

fn load_config(path: &Path) -> Result<BackupConfig> {
    File::open(path)
        .map_err(Error::from)
        .and_then(|f| {
            serde_yml::from_reader::<_, BackupConfig>(f)
                .map_err(Error::from)
                .with_msg(format!("Parse YAML config failed: {:?}", path))
        })
        .and_then(|config| {
            config
                .validate()
                .map_err(Error::from)
                .map(|_| config)
                .with_msg(format!("Config validation failed: {:?}", path))
        })
}

async fn run(config: BackupConfig) -> Result<()> {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (mut signals, task) =
        create_file_backup_task(config.locations(), command_rx, config.interval);
    info!(
        "started backup task for {:?} every {:?}",
        config.source, config.interval
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested, ending the backup task");
                command_tx
                    .send(TaskHandleSignal::End)
                    .await
                    .map_err(Error::from)
                    .with_msg("Backup task is no longer accepting commands")?;
            }
            signal = signals.recv() => {
                let Some(signal) = signal else {
                    warn!("backup task closed its signal channel");
                    break;
                };
                log_signal(&signal);
                if signal.done {
                    break;
                }
            }
        }
    }

    task.join().await;
    Ok(())
}

fn log_signal(signal: &BackupTaskSignal) {
    match signal.status {
        TaskStatus::Success => info!("backup cycle succeeded"),
        TaskStatus::Failed => match &signal.error {
            Some(error) => warn!("backup cycle failed: {error}"),
            None => warn!("backup cycle failed"),
        },
        TaskStatus::Paused => info!("backup task paused"),
        TaskStatus::Skipped => info!("next backup will be skipped"),
        TaskStatus::Ended => info!("backup task ended"),
    }
}
