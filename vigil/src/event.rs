use std::sync::Arc;

use serde::Serialize;
use vigil_common::SecurityEvent;

/// Owned, printable view of a [`SecurityEvent`] for the log and JSON sinks.
#[derive(Clone, Debug, Serialize)]
pub struct CollectedEvent {
	pub timestamp: u64,
	pub pid: u32,
	pub tid: u32,
	pub uid: u32,
	pub gid: u32,
	pub comm: Arc<str>,
	pub filename: Arc<str>,
	pub event_type: &'static str,
	pub severity: &'static str,
	pub description: Arc<str>,
	pub container_id: Arc<str>,
}

impl From<&SecurityEvent> for CollectedEvent {
	fn from(e: &SecurityEvent) -> Self {
		CollectedEvent {
			timestamp: e.timestamp,
			pid: e.pid,
			tid: e.tid,
			uid: e.uid,
			gid: e.gid,
			comm: lossy(e.comm()),
			filename: lossy(e.filename()),
			event_type: e.event_type().map(|t| t.as_str()).unwrap_or("unknown"),
			severity: e.severity().map(|s| s.as_str()).unwrap_or("unknown"),
			description: lossy(e.description()),
			container_id: lossy(e.container_id()),
		}
	}
}

fn lossy(bytes: &[u8]) -> Arc<str> {
	Arc::from(String::from_utf8_lossy(bytes))
}

// region:    --- Tests


// endregion: --- Tests
