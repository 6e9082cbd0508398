use aya_ebpf::programs::TracePointContext;
use aya_log_ebpf::error;
use vigil_common::{probe, CONTINUE};

use crate::utils::{current_task, read_arg, scratch, RingOutput, TaskMemory};

// openat(int dfd, const char __user *filename, int flags, umode_t mode)
pub fn try_sys_enter_openat(ctx: &TracePointContext) -> Result<u32, u32> {
	let filename = read_arg(ctx, 1);
	let task = current_task();
	let evt = scratch().map_err(|_| CONTINUE)?;

	if let Err(e) = probe::file_access(evt, &task, filename, &TaskMemory, &RingOutput) {
		error!(ctx, "Couldn't write openat event to the ring buffer ->> ERROR: {}", e);
	}

	Ok(CONTINUE)
}
