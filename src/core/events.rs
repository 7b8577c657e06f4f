use tokio::sync::mpsc;

use super::models::ShareRecord;

/// Externally visible result stream. Diagnostics go through `tracing`; these
/// events are the output a consumer of the tool actually wants.
#[derive(Debug, Clone)]
pub enum OutputEvent {
    ShareDiscovered { record: ShareRecord, scanned: bool },
}

pub type OutputSender = mpsc::UnboundedSender<OutputEvent>;
#[allow(dead_code)]
pub type OutputReceiver = mpsc::UnboundedReceiver<OutputEvent>;
