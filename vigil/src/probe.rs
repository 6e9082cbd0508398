//! The probe set on a general host: the same handler routines the kernel
//! programs run, wired to injected shared handles instead of BPF maps.

use std::sync::Arc;

use tracing::debug;
use vigil_common::{
	probe::{self, EventOutput, UserMemory},
	SecurityEvent, Severity, SyscallTable, TaskInfo, CONTINUE,
};
use zerocopy::FromZeros;

use crate::{config::SyscallNumbers, state::StateTable};

/// Raw context of one syscall-entry firing.
#[derive(Clone, Copy, Debug)]
pub struct SyscallEnter {
	pub task: TaskInfo,
	pub nr: u32,
	pub args: [u64; 6],
}

pub struct ProbeSet<O> {
	output: Arc<O>,
	state: Arc<StateTable>,
	syscalls: SyscallNumbers,
}

impl<O: EventOutput> ProbeSet<O> {
	pub fn new(output: Arc<O>, state: Arc<StateTable>, table: SyscallTable<'_>) -> Self {
		Self {
			output,
			state,
			syscalls: SyscallNumbers::from_table(table),
		}
	}

	/// `openat(dfd, filename, ...)`
	pub fn on_openat<M: UserMemory>(&self, enter: &SyscallEnter, mem: &M) -> u32 {
		let mut evt = SecurityEvent::new_zeroed();
		let res = probe::file_access(&mut evt, &enter.task, enter.args[1], mem, self.output.as_ref());
		Self::finish("openat", res)
	}

	/// `execve(filename, argv, envp)`
	pub fn on_execve<M: UserMemory>(&self, enter: &SyscallEnter, mem: &M) -> u32 {
		let mut evt = SecurityEvent::new_zeroed();
		let res = probe::process_exec(&mut evt, &enter.task, enter.args[0], mem, self.output.as_ref());
		Self::finish("execve", res)
	}

	pub fn on_connect(&self, enter: &SyscallEnter) -> u32 {
		let mut evt = SecurityEvent::new_zeroed();
		let res = probe::network_connect(&mut evt, &enter.task, self.output.as_ref());
		Self::finish("connect", res)
	}

	pub fn on_setuid(&self, enter: &SyscallEnter) -> u32 {
		let mut evt = SecurityEvent::new_zeroed();
		let res = probe::privilege_change(&mut evt, &enter.task, self.output.as_ref());
		Self::finish("setuid", res)
	}

	/// Generic coverage: emits only for syscalls the configured table classifies.
	pub fn on_sys_enter(&self, enter: &SyscallEnter) -> u32 {
		let Some(class) = self.syscalls.table().classify(enter.nr) else {
			return CONTINUE;
		};

		let mut evt = SecurityEvent::new_zeroed();
		let res = probe::sensitive_syscall(&mut evt, &enter.task, class, self.output.as_ref());
		Self::finish("sys_enter", res)
	}

	pub fn risk_of(&self, nr: u32) -> Option<Severity> {
		self.syscalls.table().risk_of(nr)
	}

	pub fn state(&self) -> &Arc<StateTable> {
		&self.state
	}

	fn finish(hook: &'static str, res: Result<(), i64>) -> u32 {
		if let Err(code) = res {
			debug!("{hook} record dropped, output returned {code}");
		}
		CONTINUE
	}
}

// region:    --- Tests


// endregion: --- Tests
