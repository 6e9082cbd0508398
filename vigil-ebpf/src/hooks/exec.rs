use aya_ebpf::programs::TracePointContext;
use aya_log_ebpf::error;
use vigil_common::{probe, CONTINUE};

use crate::utils::{current_task, read_arg, scratch, RingOutput, TaskMemory};

// execve(const char __user *filename, const char __user *const __user *argv, ...)
pub fn try_sys_enter_execve(ctx: &TracePointContext) -> Result<u32, u32> {
	let filename = read_arg(ctx, 0);
	let task = current_task();
	let evt = scratch().map_err(|_| CONTINUE)?;

	if let Err(e) = probe::process_exec(evt, &task, filename, &TaskMemory, &RingOutput) {
		error!(ctx, "Couldn't write execve event to the ring buffer ->> ERROR: {}", e);
	}

	Ok(CONTINUE)
}
