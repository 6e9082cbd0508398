use aya::maps::{MapData, RingBuf};
use tokio::io::unix::AsyncFd;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vigil_common::{EventType, SecurityEvent, Severity};
use zerocopy::FromBytes;

use crate::{
	error::{Error, Result},
	trx::Tx,
};

pub struct RingBufWorker {
	pub ringbuf_fd: AsyncFd<RingBuf<MapData>>,
	pub tx: Tx<SecurityEvent>,
	shutdown: CancellationToken,
}

impl RingBufWorker {
	pub fn start(ringbuf_fd: AsyncFd<RingBuf<MapData>>, tx: Tx<SecurityEvent>, shutdown: CancellationToken) -> Result<Self> {
		Ok(RingBufWorker {
			ringbuf_fd,
			tx,
			shutdown,
		})
	}

	pub async fn run(mut self) -> Result<()> {
		let mut received: u64 = 0;

		loop {
			tokio::select! {
				_ = self.shutdown.cancelled() => {
					break;
				}

				ready = self.ringbuf_fd.readable_mut() => {
					let mut guard = ready?;
					let ring_buf = guard.get_inner_mut();

					while let Some(item) = ring_buf.next() {
						match parse_event_from_bytes(item.as_ref()) {
							Ok(evt) => {
								received += 1;
								self.tx.send(evt).await?;
							}
							Err(e) => debug!("dropping ring buffer sample: {e}"),
						}
					}

					guard.clear_ready();
				}
			}
		}

		info!("{} worker stopped after {received} events", self.tx.name());
		Ok(())
	}
}

/// Decodes one sample. Trailing bytes are ignored; taxonomy codes must be known.
pub fn parse_event_from_bytes(data: &[u8]) -> Result<SecurityEvent> {
	let (evt, _) = SecurityEvent::read_from_prefix(data).map_err(|_| Error::InvalidEventSize)?;

	EventType::try_from(evt.event_type).map_err(Error::UnknownEventType)?;
	Severity::try_from(evt.severity).map_err(Error::InvalidSeverity)?;

	Ok(evt)
}

// region:    --- Tests


// endregion: --- Tests
