use flume::{Receiver, Sender, TrySendError};
use vigil_common::{probe::EventOutput, SecurityEvent};

use crate::Result;

pub struct Tx<T> {
	name: &'static str,
	tx: Sender<T>,
}

impl<T> Clone for Tx<T> {
	fn clone(&self) -> Self {
		Self {
			name: self.name,
			tx: self.tx.clone(),
		}
	}
}

impl<T> Tx<T> {
	pub async fn send(&self, item: T) -> Result<()> {
		self.tx.send_async(item).await?;
		Ok(())
	}

	pub fn try_send(&self, item: T) -> core::result::Result<(), TrySendError<T>> {
		self.tx.try_send(item)
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

pub struct Rx<T> {
	name: &'static str,
	rx: Receiver<T>,
}

impl<T> Rx<T> {
	pub async fn recv(&self) -> Result<T> {
		let res = self.rx.recv_async().await?;
		Ok(res)
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

/// Bounded so a stalled consumer turns into drops instead of memory growth.
pub fn new_channel<T>(name: &'static str, capacity: usize) -> (Tx<T>, Rx<T>) {
	let (tx, rx) = flume::bounded::<T>(capacity);

	(Tx { name, tx }, Rx { name, rx })
}

/// Host-side output channel for [`crate::probe::ProbeSet`]. Never blocks:
/// a full queue is `-ENOSPC`, a vanished consumer is `-EPIPE`.
pub struct ChannelOutput {
	tx: Tx<SecurityEvent>,
}

impl ChannelOutput {
	pub fn new(tx: Tx<SecurityEvent>) -> Self {
		Self { tx }
	}
}

impl EventOutput for ChannelOutput {
	fn output(&self, evt: &SecurityEvent) -> core::result::Result<(), i64> {
		match self.tx.try_send(*evt) {
			Ok(()) => Ok(()),
			Err(TrySendError::Full(_)) => Err(-(libc::ENOSPC as i64)),
			Err(TrySendError::Disconnected(_)) => Err(-(libc::EPIPE as i64)),
		}
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use zerocopy::FromZeros;

	#[tokio::test]
	async fn channel_output_full_and_closed() -> Result<()> {
		// -- Setup & Fixtures
		let (tx, rx) = new_channel::<SecurityEvent>("test", 1);
		let output = ChannelOutput::new(tx);
		let evt = SecurityEvent::new_zeroed();

		// -- Exec
		let first = output.output(&evt);
		let second = output.output(&evt);
		let received = rx.recv().await?;
		drop(rx);
		let third = output.output(&evt);

		// -- Check
		assert_eq!(first, Ok(()));
		assert_eq!(second, Err(-(libc::ENOSPC as i64)));
		assert_eq!(received.timestamp, 0);
		assert_eq!(third, Err(-(libc::EPIPE as i64)));

		Ok(())
	}
}

// endregion: --- Tests
