use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vigil_common::{probe::UserMemory, strbuf, TaskInfo, COMM_LEN};

use crate::{
	error::Result,
	probe::{ProbeSet, SyscallEnter},
	trx::ChannelOutput,
};

const EFAULT: i64 = -(libc::EFAULT as i64);

#[derive(Clone, Copy, Debug)]
pub enum Action {
	Open(&'static str),
	Exec(&'static str),
	Connect,
	Setuid,
	/// Goes through the generic handler only.
	Syscall(u32),
}

#[derive(Clone, Copy, Debug)]
pub struct Scenario {
	pub uid: u32,
	pub action: Action,
}

impl Scenario {
	const fn new(uid: u32, action: Action) -> Self {
		Self { uid, action }
	}
}

pub const SCENARIOS: [Scenario; 9] = [
	Scenario::new(0, Action::Open("/etc/shadow")),
	Scenario::new(1000, Action::Open("/proc/self/status")),
	Scenario::new(1000, Action::Open("/tmp/foo.txt")),
	Scenario::new(0, Action::Exec("/bin/bash")),
	Scenario::new(1000, Action::Exec("/bin/bash")),
	Scenario::new(1000, Action::Exec("/usr/bin/nc")),
	Scenario::new(1000, Action::Exec("/usr/bin/ls")),
	Scenario::new(1000, Action::Connect),
	Scenario::new(0, Action::Setuid),
];

/// User memory of a simulated task: address `n` holds the n-th path.
pub struct ScenarioMemory {
	paths: Vec<&'static str>,
}

impl ScenarioMemory {
	pub fn new(scenarios: &[Scenario]) -> Self {
		let paths = scenarios
			.iter()
			.filter_map(|s| match s.action {
				Action::Open(p) | Action::Exec(p) => Some(p),
				_ => None,
			})
			.collect();
		Self { paths }
	}

	fn addr_of(&self, path: &str) -> u64 {
		self.paths.iter().position(|p| *p == path).map(|i| i as u64).unwrap_or(u64::MAX)
	}
}

impl UserMemory for ScenarioMemory {
	fn read_str(&self, addr: u64, dst: &mut [u8]) -> core::result::Result<usize, i64> {
		let src = usize::try_from(addr)
			.ok()
			.and_then(|i| self.paths.get(i))
			.ok_or(EFAULT)?
			.as_bytes();
		if dst.is_empty() {
			return Err(EFAULT);
		}
		let len = src.len().min(dst.len() - 1);
		dst[..len].copy_from_slice(&src[..len]);
		dst[len] = 0;
		Ok(len)
	}
}

/// Drives the host probe set through [`SCENARIOS`] on a fixed interval,
/// standing in for the kernel when no probe can be attached.
pub struct Simulator {
	probes: ProbeSet<ChannelOutput>,
	scenarios: Vec<Scenario>,
	memory: ScenarioMemory,
	interval: Duration,
	shutdown: CancellationToken,
}

impl Simulator {
	pub fn start(
		probes: ProbeSet<ChannelOutput>,
		interval: Duration,
		generic_syscalls: bool,
		shutdown: CancellationToken,
	) -> Result<Self> {
		let mut scenarios = SCENARIOS.to_vec();
		if generic_syscalls {
			scenarios.push(Scenario::new(0, Action::Syscall(libc::SYS_mount as u32)));
		}
		let memory = ScenarioMemory::new(&scenarios);

		Ok(Simulator {
			probes,
			scenarios,
			memory,
			interval,
			shutdown,
		})
	}

	pub async fn run(self) -> Result<()> {
		info!(
			"simulating {} scenarios every {}ms (state table capacity {})",
			self.scenarios.len(),
			self.interval.as_millis(),
			self.probes.state().capacity()
		);

		let mut ticker = tokio::time::interval(self.interval);
		loop {
			tokio::select! {
				_ = self.shutdown.cancelled() => {
					break;
				}

				_ = ticker.tick() => {
					self.round();
				}
			}
		}

		Ok(())
	}

	/// One pass over the catalogue.
	pub fn round(&self) {
		let identity = HostIdentity::current();

		for scenario in &self.scenarios {
			let (nr, args) = self.syscall_of(scenario.action);
			let enter = SyscallEnter {
				task: identity.task(scenario.uid),
				nr,
				args,
			};

			match scenario.action {
				Action::Open(_) => self.probes.on_openat(&enter, &self.memory),
				Action::Exec(_) => self.probes.on_execve(&enter, &self.memory),
				Action::Connect => self.probes.on_connect(&enter),
				Action::Setuid => self.probes.on_setuid(&enter),
				Action::Syscall(nr) => {
					debug!("syscall {nr} risk {:?}", self.probes.risk_of(nr));
					self.probes.on_sys_enter(&enter)
				}
			};
		}
	}

	fn syscall_of(&self, action: Action) -> (u32, [u64; 6]) {
		let mut args = [0u64; 6];
		let nr = match action {
			Action::Open(path) => {
				args[0] = libc::AT_FDCWD as u64;
				args[1] = self.memory.addr_of(path);
				libc::SYS_openat
			}
			Action::Exec(path) => {
				args[0] = self.memory.addr_of(path);
				libc::SYS_execve
			}
			Action::Connect => libc::SYS_connect,
			Action::Setuid => libc::SYS_setuid,
			Action::Syscall(nr) => return (nr, args),
		};
		(nr as u32, args)
	}
}

/// pid, tid and comm of this process, reported for every simulated event.
struct HostIdentity {
	pid: u32,
	tid: u32,
	comm: [u8; COMM_LEN],
}

impl HostIdentity {
	fn current() -> Self {
		let tid = unsafe { libc::syscall(libc::SYS_gettid) } as u32;
		let name = std::fs::read_to_string("/proc/self/comm").unwrap_or_else(|_| "vigil".to_string());

		let mut comm = [0u8; COMM_LEN];
		strbuf::copy_str(&mut comm, name.trim_end().as_bytes());

		Self {
			pid: std::process::id(),
			tid,
			comm,
		}
	}

	fn task(&self, uid: u32) -> TaskInfo {
		TaskInfo {
			timestamp: monotonic_ns(),
			pid: self.pid,
			tid: self.tid,
			uid,
			gid: uid,
			comm: self.comm,
		}
	}
}

/// Same clock as `bpf_ktime_get_ns`.
fn monotonic_ns() -> u64 {
	let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
	let ret = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
	if ret != 0 {
		return 0;
	}
	(ts.tv_sec as u64) * 1_000_000_000 + ts.tv_nsec as u64
}

// region:    --- Tests


// endregion: --- Tests
