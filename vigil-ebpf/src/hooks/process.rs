use aya_ebpf::programs::TracePointContext;
use aya_log_ebpf::error;
use vigil_common::{probe, SyscallClass, CONTINUE};

use crate::{
	utils::{current_task, scratch, RingOutput, SYSCALL_NR_OFFSET},
	RISK_TABLE,
};

pub fn try_sys_enter_setuid(ctx: &TracePointContext) -> Result<u32, u32> {
	let task = current_task();
	let evt = scratch().map_err(|_| CONTINUE)?;

	if let Err(e) = probe::privilege_change(evt, &task, &RingOutput) {
		error!(ctx, "Couldn't write setuid event to the ring buffer ->> ERROR: {}", e);
	}

	Ok(CONTINUE)
}

// raw_syscalls:sys_enter carries `long id` where the syscalls tracepoints carry __syscall_nr.
pub fn try_raw_sys_enter(ctx: &TracePointContext) -> Result<u32, u32> {
	let id: i64 = unsafe { ctx.read_at(SYSCALL_NR_OFFSET) }.map_err(|_| CONTINUE)?;
	if id < 0 {
		return Ok(CONTINUE);
	}

	let Some(code) = (unsafe { RISK_TABLE.get(&(id as u32)) }) else {
		return Ok(CONTINUE);
	};
	let Some(class) = SyscallClass::from_code(*code) else {
		return Ok(CONTINUE);
	};

	let task = current_task();
	let evt = scratch().map_err(|_| CONTINUE)?;

	if let Err(e) = probe::sensitive_syscall(evt, &task, class, &RingOutput) {
		error!(ctx, "Couldn't write syscall {} event to the ring buffer ->> ERROR: {}", id, e);
	}

	Ok(CONTINUE)
}
