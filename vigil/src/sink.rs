use std::{
	fs::{File, OpenOptions},
	io::{BufWriter, Write},
	path::Path,
};

use clap::ValueEnum;
use tracing::{debug, info};
use vigil_common::SecurityEvent;
use zerocopy::IntoBytes;

use crate::{event::CollectedEvent, trx::Rx, Result};

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
	/// One tracing line per event.
	Log,
	/// One JSON object per line.
	Json,
	/// The 496-byte record as emitted.
	Raw,
}

pub struct EventSink {
	format: OutputFormat,
	out: BufWriter<Box<dyn Write + Send>>,
}

impl EventSink {
	/// Appends to `path` when given, stdout otherwise.
	pub fn open(format: OutputFormat, path: Option<&Path>) -> Result<Self> {
		let out: Box<dyn Write + Send> = match path {
			Some(path) => Box::new(Self::open_file(path)?),
			None => Box::new(std::io::stdout()),
		};

		Ok(Self {
			format,
			out: BufWriter::new(out),
		})
	}

	pub fn write(&mut self, evt: &SecurityEvent) -> Result<()> {
		match self.format {
			OutputFormat::Log => {
				let e = CollectedEvent::from(evt);
				info!(
					"[{}] {}: {} {} (PID: {}, UID: {}, comm: {}, container: {})",
					e.severity, e.event_type, e.description, e.filename, e.pid, e.uid, e.comm, e.container_id
				);
			}
			OutputFormat::Json => {
				serde_json::to_writer(&mut self.out, &CollectedEvent::from(evt))?;
				self.out.write_all(b"\n")?;
			}
			OutputFormat::Raw => self.out.write_all(evt.as_bytes())?,
		}
		Ok(())
	}

	pub fn flush(&mut self) -> Result<()> {
		self.out.flush()?;
		Ok(())
	}

	/// Writes until every sender is gone. Producers stop on cancellation and
	/// the stage in between forwards what they left, so nothing in flight is lost.
	pub async fn run(mut self, rx: Rx<SecurityEvent>) -> Result<()> {
		let mut written: u64 = 0;

		while let Ok(evt) = rx.recv().await {
			self.write(&evt)?;
			written += 1;
		}

		debug!("{} channel closed after {written} events", rx.name());
		self.flush()
	}
}

// private fns
impl EventSink {
	fn open_file(path: &Path) -> Result<File> {
		if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
			std::fs::create_dir_all(dir)?;
		}
		let file = OpenOptions::new().create(true).append(true).open(path)?;
		Ok(file)
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use crate::trx::new_channel;
	use vigil_common::{EventType, Severity};
	use zerocopy::FromZeros;

	fn record(pid: u32) -> SecurityEvent {
		let mut evt = SecurityEvent::new_zeroed();
		evt.pid = pid;
		evt.event_type = EventType::Network as u32;
		evt.severity = Severity::Medium as u32;
		evt.set_filename(b"network_socket");
		evt
	}

	fn fx_path(name: &str) -> std::path::PathBuf {
		std::env::temp_dir().join(format!("vigil-sink-{}-{name}", std::process::id()))
	}

	#[test]
	fn json_lines() -> Result<()> {
		// -- Setup & Fixtures
		let path = fx_path("events.jsonl");
		let _ = std::fs::remove_file(&path);
		let mut sink = EventSink::open(OutputFormat::Json, Some(&path))?;

		// -- Exec
		sink.write(&record(1))?;
		sink.write(&record(2))?;
		sink.flush()?;

		// -- Check
		let content = std::fs::read_to_string(&path)?;
		let lines: Vec<serde_json::Value> = content
			.lines()
			.map(serde_json::from_str)
			.collect::<core::result::Result<_, _>>()?;
		assert_eq!(lines.len(), 2);
		assert_eq!(lines[1]["pid"], 2);
		assert_eq!(lines[0]["event_type"], "network");
		assert_eq!(lines[0]["severity"], "medium");

		std::fs::remove_file(&path)?;

		Ok(())
	}

	#[tokio::test]
	async fn raw_run_until_channel_closes() -> Result<()> {
		// -- Setup & Fixtures
		let path = fx_path("events.raw");
		let _ = std::fs::remove_file(&path);
		let sink = EventSink::open(OutputFormat::Raw, Some(&path))?;
		let (tx, rx) = new_channel::<SecurityEvent>("sink_test", 8);
		tx.send(record(1)).await?;
		tx.send(record(2)).await?;
		drop(tx);

		// -- Exec
		sink.run(rx).await?;

		// -- Check
		let bytes = std::fs::read(&path)?;
		assert_eq!(bytes.len(), 2 * 496);
		assert_eq!(&bytes[8..12], &1u32.to_ne_bytes());
		assert_eq!(&bytes[496 + 8..496 + 12], &2u32.to_ne_bytes());

		std::fs::remove_file(&path)?;

		Ok(())
	}
}

// endregion: --- Tests
