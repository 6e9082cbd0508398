//! Handler routines shared by the kernel programs and the host probe set.
//!
//! Each routine fills one record, classifies it and pushes it to an
//! [`EventOutput`]. The `Err` side is the output's return code; callers keep it
//! local and still report [`crate::CONTINUE`] to the instrumentation point.

use crate::{
	classify::{self, GENERIC_SYSCALL_SENTINEL, NETWORK_SENTINEL, SETUID_SENTINEL},
	event::{EventType, SecurityEvent, TaskInfo, FILENAME_LEN},
	risk::SyscallClass,
};

/// Best-effort sink for finished records. Must not block.
pub trait EventOutput {
	fn output(&self, evt: &SecurityEvent) -> Result<(), i64>;
}

/// Bounded string reads from the observed task's address space.
///
/// Implementations write at most `dst.len()` bytes, NUL included, and return
/// the string length without the terminator.
pub trait UserMemory {
	fn read_str(&self, addr: u64, dst: &mut [u8]) -> Result<usize, i64>;
}

/// Reads a user path into `filename`; a fault leaves it empty.
#[inline(always)]
fn read_filename<M: UserMemory>(evt: &mut SecurityEvent, addr: u64, mem: &M) {
	match mem.read_str(addr, &mut evt.filename) {
		Ok(_) => evt.filename[FILENAME_LEN - 1] = 0,
		Err(_) => evt.filename = [0u8; FILENAME_LEN],
	}
}

#[inline(always)]
pub fn file_access<M, O>(evt: &mut SecurityEvent, task: &TaskInfo, path: u64, mem: &M, out: &O) -> Result<(), i64>
where
	M: UserMemory,
	O: EventOutput,
{
	evt.begin(task, EventType::FileAccess);
	read_filename(evt, path, mem);

	let verdict = classify::file_access(evt.filename());
	evt.apply(verdict);

	out.output(evt)
}

#[inline(always)]
pub fn process_exec<M, O>(evt: &mut SecurityEvent, task: &TaskInfo, path: u64, mem: &M, out: &O) -> Result<(), i64>
where
	M: UserMemory,
	O: EventOutput,
{
	evt.begin(task, EventType::Process);
	read_filename(evt, path, mem);

	let verdict = classify::process_exec(evt.filename(), task.uid);
	evt.apply(verdict);

	out.output(evt)
}

#[inline(always)]
pub fn network_connect<O: EventOutput>(evt: &mut SecurityEvent, task: &TaskInfo, out: &O) -> Result<(), i64> {
	evt.begin(task, EventType::Network);
	evt.set_filename(NETWORK_SENTINEL);
	evt.apply(classify::network_connect());

	out.output(evt)
}

#[inline(always)]
pub fn privilege_change<O: EventOutput>(evt: &mut SecurityEvent, task: &TaskInfo, out: &O) -> Result<(), i64> {
	evt.begin(task, EventType::Syscall);
	evt.set_filename(SETUID_SENTINEL);
	evt.apply(classify::privilege_change());

	out.output(evt)
}

/// Generic coverage for syscalls the risk table classifies.
#[inline(always)]
pub fn sensitive_syscall<O: EventOutput>(
	evt: &mut SecurityEvent,
	task: &TaskInfo,
	class: SyscallClass,
	out: &O,
) -> Result<(), i64> {
	evt.begin(task, EventType::Syscall);
	evt.set_filename(GENERIC_SYSCALL_SENTINEL);
	evt.apply(classify::Verdict::new(class.severity(), class.description()));

	out.output(evt)
}

// region:    --- Tests


// endregion: --- Tests
