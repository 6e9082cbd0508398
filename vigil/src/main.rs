use std::{path::Path, sync::Arc, time::Duration};

use aya::Ebpf;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::{
	non_blocking::WorkerGuard,
	rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::EnvFilter;
use vigil::{
	cli::args::{Cli, RunMode},
	config::Config,
	container::ContainerResolver,
	hooks,
	probe::ProbeSet,
	sink::EventSink,
	state::StateTable,
	supervisor::Supervisor,
	trx::{new_channel, ChannelOutput, Tx},
	workers::{ContainerStage, RingBufWorker, Simulator},
	Result,
};
use vigil_common::SecurityEvent;

#[tokio::main]
async fn main() -> Result<()> {
	let args = Cli::parse();
	let config = Config::load(args.config.as_deref())?;
	let _guard = init_tracing(&args.log_file);

	let mode = resolve_mode(args.mode, args.ebpf_object.as_deref());
	info!("starting in {mode:?} mode");

	let mut supervisor = Supervisor::new();
	supervisor.install_signal_handlers()?;
	if let Some(secs) = args.time {
		supervisor.cancel_after(Duration::from_secs(secs));
	}

	let (probe_tx, probe_rx) = new_channel::<SecurityEvent>("probe", config.channel.capacity);
	let (sink_tx, sink_rx) = new_channel::<SecurityEvent>("sink", config.channel.capacity);

	let sink = EventSink::open(args.output, args.output_file.as_deref())?;
	supervisor.spawn(sink.run(sink_rx));

	let stage = ContainerStage::start(sink_tx, probe_rx, ContainerResolver::new())?;
	supervisor.spawn(stage.run());

	// Held until shutdown; dropping it detaches every program.
	let _ebpf = match mode {
		RunMode::Live => Some(start_live(&mut supervisor, &args, &config, probe_tx)?),
		RunMode::Simulate => {
			start_simulator(&mut supervisor, &config, probe_tx)?;
			None
		}
	};

	supervisor.token().cancelled().await;

	supervisor.shutdown().await?;

	Ok(())
}

fn start_live(supervisor: &mut Supervisor, args: &Cli, config: &Config, tx: Tx<SecurityEvent>) -> Result<Ebpf> {
	// Bump the memlock rlimit for kernels without memcg based accounting.
	let rlim = libc::rlimit {
		rlim_cur: libc::RLIM_INFINITY,
		rlim_max: libc::RLIM_INFINITY,
	};
	let ret = unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) };
	if ret != 0 {
		debug!("remove limit on locked memory failed, ret is: {ret}");
	}

	let mut ebpf = hooks::load_ebpf(args.ebpf_object.as_deref())?;
	if let Err(e) = aya_log::EbpfLogger::init(&mut ebpf) {
		// Happens when the object carries no log statements.
		warn!("failed to initialize eBPF logger: {e}");
	}

	let ringbuf_fd = hooks::load_hooks(&mut ebpf, &config.probe)?;
	let worker = RingBufWorker::start(ringbuf_fd, tx, supervisor.token())?;
	supervisor.spawn(worker.run());

	Ok(ebpf)
}

fn start_simulator(supervisor: &mut Supervisor, config: &Config, tx: Tx<SecurityEvent>) -> Result<()> {
	let probes = ProbeSet::new(
		Arc::new(ChannelOutput::new(tx)),
		Arc::new(StateTable::new(config.state.capacity)),
		config.probe.table(),
	);
	let simulator = Simulator::start(
		probes,
		Duration::from_millis(config.simulate.interval_ms),
		config.probe.generic_syscalls,
		supervisor.token(),
	)?;
	supervisor.spawn(simulator.run());

	Ok(())
}

/// Live mode needs root and a probe object; without either we simulate.
fn resolve_mode(requested: RunMode, ebpf_object: Option<&Path>) -> RunMode {
	if requested == RunMode::Simulate {
		return RunMode::Simulate;
	}

	if unsafe { libc::geteuid() } != 0 {
		warn!("not running as root, falling back to simulate mode");
		return RunMode::Simulate;
	}

	if !hooks::object_available(ebpf_object) {
		warn!("no probe object available, falling back to simulate mode");
		return RunMode::Simulate;
	}

	RunMode::Live
}

fn init_tracing(log_path: &Path) -> WorkerGuard {
	let dir = log_path.parent().unwrap_or(Path::new("/var/log"));
	let file = log_path.file_name().unwrap_or_default().to_string_lossy().into_owned();

	let appender = RollingFileAppender::builder()
		.rotation(Rotation::DAILY)
		.filename_prefix(file)
		.build(dir);
	let (non_blocking_writer, guard, fallback) = match appender {
		Ok(appender) => {
			let (writer, guard) = tracing_appender::non_blocking(appender);
			(writer, guard, None)
		}
		Err(e) => {
			let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
			(writer, guard, Some(e))
		}
	};

	tracing_subscriber::fmt()
		.with_writer(non_blocking_writer)
		.with_target(false)
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	if let Some(e) = fallback {
		warn!("cannot log to {}: {e}, using stderr", log_path.display());
	}

	guard
}
