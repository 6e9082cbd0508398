use tracing::debug;
use vigil_common::SecurityEvent;

use crate::{
	container::ContainerResolver,
	error::Result,
	trx::{Rx, Tx},
};

/// Stamps `container_id` onto records between the producer and the sink.
/// Runs until the producer side of `rx` is gone.
pub struct ContainerStage {
	pub tx: Tx<SecurityEvent>,
	pub rx: Rx<SecurityEvent>,
	resolver: ContainerResolver,
}

impl ContainerStage {
	pub fn start(tx: Tx<SecurityEvent>, rx: Rx<SecurityEvent>, resolver: ContainerResolver) -> Result<Self> {
		Ok(ContainerStage { tx, rx, resolver })
	}

	pub async fn run(mut self) -> Result<()> {
		while let Ok(mut evt) = self.rx.recv().await {
			if let Some(id) = self.resolver.resolve(evt.pid) {
				evt.set_container_id(id.as_bytes());
			}

			self.tx.send(evt).await?;
		}

		debug!(
			"{} stage done, {} pids cached",
			self.rx.name(),
			self.resolver.cache_size()
		);
		Ok(())
	}
}

// region:    --- Tests


// endregion: --- Tests
