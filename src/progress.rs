//! Live progress bar for a batch
//!
//! Workers never touch the counter directly. Each selected task holds a
//! [`ProgressTick`] that sends one message when dropped, and a single
//! reporter task counts messages and redraws the bar.

use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Number of slots in the bar
pub const BAR_WIDTH: usize = 100;

/// Render the bar for `processed` of `total`, prefixed with `\r` so it
/// overwrites the previous line.
pub fn render(processed: usize, total: usize) -> String {
    let percent = if total == 0 {
        100
    } else {
        processed * 100 / total
    };
    let filled = (processed * BAR_WIDTH / total.max(1)).min(BAR_WIDTH);

    format!(
        "\r[{}{}] {}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Sender side handed to the coordinator
#[derive(Clone)]
pub struct ProgressHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ProgressHandle {
    /// Guard that counts one completed task when dropped
    pub fn tick(&self) -> ProgressTick {
        ProgressTick {
            tx: self.tx.clone(),
        }
    }
}

/// Counts exactly once, whether the task finished, failed, panicked or was aborted
pub struct ProgressTick {
    tx: mpsc::UnboundedSender<()>,
}

impl Drop for ProgressTick {
    fn drop(&mut self) {
        // reporter gone means nobody is watching; nothing to do
        let _ = self.tx.send(());
    }
}

/// Spawn the reporter task.
///
/// The returned join handle resolves to the processed count once every
/// [`ProgressHandle`] and [`ProgressTick`] has been dropped.
pub fn spawn_reporter<W>(total: usize, mut out: W) -> (ProgressHandle, JoinHandle<usize>)
where
    W: Write + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();

    let reporter = tokio::spawn(async move {
        let mut processed = 0usize;
        while rx.recv().await.is_some() {
            processed += 1;
            if total == 0 {
                continue;
            }
            let _ = out.write_all(render(processed, total).as_bytes());
            if processed == total {
                let _ = out.write_all(b"\n");
            }
            let _ = out.flush();
        }
        processed
    });

    (ProgressHandle { tx }, reporter)
}
