use std::{future::Future, time::Duration};

use tokio::{
	signal::unix::{signal, SignalKind},
	task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;

/// Owns every long-running task and the token that stops them.
pub struct Supervisor {
	shutdown: CancellationToken,
	tasks: JoinSet<Result<()>>,
}

impl Supervisor {
	pub fn new() -> Self {
		Self {
			shutdown: CancellationToken::new(),
			tasks: JoinSet::new(),
		}
	}

	pub fn token(&self) -> CancellationToken {
		self.shutdown.clone()
	}

	/// A task returning `Err` cancels the token, so the rest wind down with it.
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = Result<()>> + Send + 'static,
	{
		let token = self.token();
		self.tasks.spawn(async move {
			let res = fut.await;
			if let Err(e) = &res {
				warn!("task failed, shutting down: {e}");
				token.cancel();
			}
			res
		});
	}

	/// Cancels on ctrl-c or SIGTERM.
	pub fn install_signal_handlers(&self) -> Result<()> {
		let mut sigterm = signal(SignalKind::terminate())?;

		let t = self.token();
		tokio::spawn(async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				info!("ctrl-c received");
			}
			t.cancel();
		});

		let t = self.token();
		tokio::spawn(async move {
			sigterm.recv().await;
			info!("SIGTERM received");
			t.cancel();
		});

		Ok(())
	}

	/// Cancels once `run_time` has elapsed.
	pub fn cancel_after(&self, run_time: Duration) {
		let t = self.token();
		tokio::spawn(async move {
			tokio::select! {
				_ = t.cancelled() => {}
				_ = tokio::time::sleep(run_time) => {
					info!("run time of {}s elapsed", run_time.as_secs());
					t.cancel();
				}
			}
		});
	}

	/// Cancels and joins all tasks; the first task error is returned after
	/// every task has stopped.
	pub async fn shutdown(mut self) -> Result<()> {
		info!("Supervisor shutdown starting");
		self.shutdown.cancel();

		let mut first_err = None;
		while let Some(res) = self.tasks.join_next().await {
			let res = res.map_err(crate::Error::from).and_then(|r| r);
			if let Err(e) = res {
				first_err.get_or_insert(e);
			}
		}
		info!("Supervisor shutdown complete");

		match first_err {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use crate::{
		container::ContainerResolver,
		sink::{EventSink, OutputFormat},
		trx::new_channel,
		workers::ContainerStage,
		Error,
	};
	use vigil_common::SecurityEvent;
	use zerocopy::FromZeros;

	#[tokio::test]
	async fn shutdown_stops_waiting_tasks() -> Result<()> {
		// -- Setup & Fixtures
		let mut supervisor = Supervisor::new();
		let token = supervisor.token();
		supervisor.spawn(async move {
			token.cancelled().await;
			Ok(())
		});

		// -- Exec & Check
		supervisor.shutdown().await?;

		Ok(())
	}

	#[tokio::test]
	async fn shutdown_reports_task_error() -> Result<()> {
		// -- Setup & Fixtures
		let mut supervisor = Supervisor::new();
		supervisor.spawn(async { Err(Error::custom("sink failed")) });
		supervisor.spawn(async { Ok(()) });

		// -- Exec
		let res = supervisor.shutdown().await;

		// -- Check
		assert!(matches!(res, Err(Error::Custom(msg)) if msg == "sink failed"));

		Ok(())
	}

	#[tokio::test]
	async fn failing_task_cancels_the_rest() -> Result<()> {
		// -- Setup & Fixtures
		let mut supervisor = Supervisor::new();
		let token = supervisor.token();
		let waiter = supervisor.token();
		supervisor.spawn(async move {
			waiter.cancelled().await;
			Ok(())
		});

		// -- Exec
		supervisor.spawn(async { Err(Error::custom("broken pipe")) });
		tokio::time::timeout(Duration::from_secs(5), token.cancelled()).await?;
		let res = supervisor.shutdown().await;

		// -- Check
		assert!(token.is_cancelled());
		assert!(matches!(res, Err(Error::Custom(msg)) if msg == "broken pipe"));

		Ok(())
	}

	#[tokio::test]
	async fn shutdown_keeps_records_in_flight() -> Result<()> {
		// -- Setup & Fixtures
		let dir = std::env::temp_dir().join(format!("vigil-supervisor-{}", std::process::id()));
		let out_path = dir.join("events.raw");
		let _ = std::fs::remove_dir_all(&dir);

		let mut supervisor = Supervisor::new();
		let (probe_tx, probe_rx) = new_channel::<SecurityEvent>("probe", 8);
		let (sink_tx, sink_rx) = new_channel::<SecurityEvent>("sink", 8);
		let sink = EventSink::open(OutputFormat::Raw, Some(&out_path))?;
		supervisor.spawn(sink.run(sink_rx));
		let stage = ContainerStage::start(sink_tx, probe_rx, ContainerResolver::with_proc_root(dir.join("proc")))?;
		supervisor.spawn(stage.run());

		// -- Exec
		// A producer still draining when the token fires.
		supervisor.token().cancel();
		tokio::time::sleep(Duration::from_millis(50)).await;
		let mut evt = SecurityEvent::new_zeroed();
		evt.pid = 4242;
		probe_tx.send(evt).await?;
		drop(probe_tx);
		let res = supervisor.shutdown().await;

		// -- Check
		assert!(res.is_ok(), "shutdown failed: {res:?}");
		let bytes = std::fs::read(&out_path)?;
		assert_eq!(bytes.len(), 496);
		assert_eq!(&bytes[8..12], &4242u32.to_ne_bytes());

		std::fs::remove_dir_all(&dir)?;

		Ok(())
	}

	#[tokio::test(start_paused = true)]
	async fn cancel_after_elapses() -> Result<()> {
		// -- Setup & Fixtures
		let supervisor = Supervisor::new();
		let token = supervisor.token();

		// -- Exec
		supervisor.cancel_after(Duration::from_secs(5));
		token.cancelled().await;

		// -- Check
		assert!(token.is_cancelled());

		Ok(())
	}
}

// endregion: --- Tests
