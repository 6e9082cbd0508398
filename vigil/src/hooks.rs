use std::path::Path;

use aya::{
	maps::{HashMap, MapData, RingBuf},
	programs::TracePoint,
	Ebpf,
};
use tokio::io::unix::AsyncFd;
use tracing::{debug, info};
use vigil_common::SecurityEvent;

use crate::{config::ProbeConfig, Error, Result};

/// (program, tracepoint category, tracepoint name)
const SYSCALL_HOOKS: [(&str, &str, &str); 4] = [
	("sys_enter_openat", "syscalls", "sys_enter_openat"),
	("sys_enter_execve", "syscalls", "sys_enter_execve"),
	("sys_enter_connect", "syscalls", "sys_enter_connect"),
	("sys_enter_setuid", "syscalls", "sys_enter_setuid"),
];

const GENERIC_HOOK: (&str, &str, &str) = ("raw_sys_enter", "raw_syscalls", "sys_enter");

/// Loads the probe object from `path`, or the embedded one.
pub fn load_ebpf(path: Option<&Path>) -> Result<Ebpf> {
	if let Some(path) = path {
		info!("loading probe object {}", path.display());
		return Ok(Ebpf::load_file(path)?);
	}

	load_embedded()
}

#[cfg(feature = "embed")]
fn load_embedded() -> Result<Ebpf> {
	Ok(Ebpf::load(aya::include_bytes_aligned!(concat!(env!("OUT_DIR"), "/vigil")))?)
}

#[cfg(not(feature = "embed"))]
fn load_embedded() -> Result<Ebpf> {
	Err(Error::NoEbpfObject)
}

pub fn object_available(path: Option<&Path>) -> bool {
	match path {
		Some(path) => path.is_file(),
		None => cfg!(feature = "embed"),
	}
}

/// Attaches every program and hands back the readable end of `EVT_MAP`.
/// Any failure here is fatal: nothing has been observed yet.
pub fn load_hooks(ebpf: &mut Ebpf, config: &ProbeConfig) -> Result<AsyncFd<RingBuf<MapData>>> {
	for (prog, category, name) in SYSCALL_HOOKS {
		attach_tracepoint(ebpf, prog, category, name)?;
	}

	// Opening it typed checks the value size against the kernel's view.
	let cache: HashMap<_, u32, SecurityEvent> =
		HashMap::try_from(ebpf.map("EVENT_CACHE").ok_or(Error::EbpfMapNotFound("EVENT_CACHE"))?)?;
	debug!("EVENT_CACHE ready, {} entries in use", cache.keys().count());

	if config.generic_syscalls {
		let table = config.table();
		if table.is_empty() {
			return Err(Error::custom("generic_syscalls is enabled but the syscall table is empty"));
		}

		let mut risk: HashMap<_, u32, u32> =
			HashMap::try_from(ebpf.map_mut("RISK_TABLE").ok_or(Error::EbpfMapNotFound("RISK_TABLE"))?)?;
		for (nr, class) in table.entries() {
			risk.insert(nr, class.code(), 0)?;
		}
		info!("RISK_TABLE loaded with {} syscalls", table.len());

		let (prog, category, name) = GENERIC_HOOK;
		attach_tracepoint(ebpf, prog, category, name)?;
	}

	let ring_buf = RingBuf::try_from(ebpf.take_map("EVT_MAP").ok_or(Error::EbpfMapNotFound("EVT_MAP"))?)?;
	let fd = AsyncFd::new(ring_buf)?;
	Ok(fd)
}

fn attach_tracepoint(ebpf: &mut Ebpf, prog: &'static str, category: &str, name: &str) -> Result<()> {
	let program: &mut TracePoint = ebpf.program_mut(prog).ok_or(Error::EbpfProgNotFound(prog))?.try_into()?;
	program.load()?;
	program.attach(category, name)?;
	debug!("attached {prog} to {category}/{name}");
	Ok(())
}

// region:    --- Tests


// endregion: --- Tests
