use aya_ebpf::programs::TracePointContext;
use aya_log_ebpf::error;
use vigil_common::{probe, CONTINUE};

use crate::utils::{current_task, scratch, RingOutput};

// The destination address is not decoded; the record only says a connect happened.
pub fn try_sys_enter_connect(ctx: &TracePointContext) -> Result<u32, u32> {
	let task = current_task();
	let evt = scratch().map_err(|_| CONTINUE)?;

	if let Err(e) = probe::network_connect(evt, &task, &RingOutput) {
		error!(ctx, "Couldn't write connect event to the ring buffer ->> ERROR: {}", e);
	}

	Ok(CONTINUE)
}
