use aya_ebpf::{
	helpers::{
		bpf_get_current_comm, bpf_get_current_pid_tgid, bpf_get_current_uid_gid, bpf_ktime_get_ns,
		bpf_probe_read_user_str_bytes,
	},
	programs::TracePointContext,
};
use vigil_common::{
	probe::{EventOutput, UserMemory},
	SecurityEvent, TaskInfo, COMM_LEN,
};

use crate::{EVT_MAP, SCRATCH};

// trace_event_raw_sys_enter: common header (8), __syscall_nr / id (8), args[6]
pub const SYSCALL_NR_OFFSET: usize = 8;
const ARGS_OFFSET: usize = 16;

#[inline(always)]
pub fn arg_offset(index: usize) -> usize {
	ARGS_OFFSET + index * 8
}

/// A failed read yields a null address, which the string read then rejects.
#[inline(always)]
pub fn read_arg(ctx: &TracePointContext, index: usize) -> u64 {
	unsafe { ctx.read_at::<u64>(arg_offset(index)) }.unwrap_or(0)
}

#[inline(always)]
pub fn current_task() -> TaskInfo {
	let timestamp = unsafe { bpf_ktime_get_ns() };
	let comm = bpf_get_current_comm().unwrap_or([0u8; COMM_LEN]);

	TaskInfo::from_raw(timestamp, bpf_get_current_pid_tgid(), bpf_get_current_uid_gid(), comm)
}

#[inline(always)]
pub fn scratch() -> Result<&'static mut SecurityEvent, i64> {
	let ptr = SCRATCH.get_ptr_mut(0).ok_or(1i64)?;
	Ok(unsafe { &mut *ptr })
}

pub struct TaskMemory;

impl UserMemory for TaskMemory {
	#[inline(always)]
	fn read_str(&self, addr: u64, dst: &mut [u8]) -> Result<usize, i64> {
		let s = unsafe { bpf_probe_read_user_str_bytes(addr as *const u8, dst)? };
		Ok(s.len())
	}
}

pub struct RingOutput;

impl EventOutput for RingOutput {
	#[inline(always)]
	fn output(&self, evt: &SecurityEvent) -> Result<(), i64> {
		EVT_MAP.output(evt, 0)
	}
}
