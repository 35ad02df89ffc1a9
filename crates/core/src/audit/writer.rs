use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AuditHandle, AuditRecord, AuditStore};

/// Most records written in one store transaction.
const MAX_BATCH: usize = 64;

/// What the writer did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub written: u64,
    pub dropped: u64,
}

/// Drains the audit channel into an [`AuditStore`].
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditRecord>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditRecord>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Write whatever has queued up, one batch at a time, until every handle
    /// is dropped. A batch the store rejects is logged and dropped.
    pub async fn run(mut self) -> WriterStats {
        tracing::info!("Audit writer started");
        let mut stats = WriterStats::default();
        let mut batch = Vec::with_capacity(MAX_BATCH);

        while self.rx.recv_many(&mut batch, MAX_BATCH).await > 0 {
            let n = batch.len() as u64;
            match self.store.append(&batch) {
                Ok(()) => stats.written += n,
                Err(e) => {
                    stats.dropped += n;
                    tracing::error!(records = n, "Failed to write audit batch: {}", e);
                }
            }
            batch.clear();
        }

        tracing::info!(
            written = stats.written,
            dropped = stats.dropped,
            "Audit writer shutting down"
        );
        stats
    }
}

/// Wire a handle to a writer over a channel of `buffer_size` records.
///
/// Spawn the writer with `tokio::spawn(writer.run())`; it exits once every
/// clone of the handle has been dropped.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (AuditHandle::new(tx), AuditWriter::new(rx, store))
}
