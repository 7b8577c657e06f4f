use std::path::PathBuf;

use chrono::Utc;
use colored::Colorize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::events::{OutputEvent, OutputSender};

/// The message sink: consumes the pipeline's result stream, prints each
/// discovered share and optionally appends a JSON line per share to an
/// events file. The task ends when every sender is dropped, which is how the
/// app flushes it before exiting.
pub fn spawn(events_file: Option<PathBuf>) -> (OutputSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut sink = match &events_file {
            Some(path) => match tokio::fs::File::create(path).await {
                Ok(file) => Some(file),
                Err(err) => {
                    tracing::warn!("cannot create events file {path:?}: {err}");
                    None
                }
            },
            None => None,
        };

        while let Some(event) = rx.recv().await {
            match event {
                OutputEvent::ShareDiscovered { record, scanned } => {
                    let verdict = if scanned {
                        "scan queued".green()
                    } else {
                        "listed only".yellow()
                    };
                    println!("{} {} ({verdict})", "[share]".cyan().bold(), record.path);

                    let mut write_failed = false;
                    if let Some(file) = sink.as_mut() {
                        let line = serde_json::json!({
                            "timestamp": Utc::now().to_rfc3339(),
                            "path": record.path,
                            "scan_requested": record.scan_requested,
                            "scanned": scanned,
                        });
                        let mut buf = line.to_string();
                        buf.push('\n');
                        if let Err(err) = file.write_all(buf.as_bytes()).await {
                            tracing::warn!("events file write failed, disabling: {err}");
                            write_failed = true;
                        }
                    }
                    if write_failed {
                        sink = None;
                    }
                }
            }
        }

        if let Some(mut file) = sink {
            let _ = file.flush().await;
        }
    });

    (tx, handle)
}
