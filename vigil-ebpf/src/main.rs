#![no_std]
#![no_main]

use aya_ebpf::{
	macros::{map, tracepoint},
	maps::{HashMap, PerCpuArray, RingBuf},
	programs::TracePointContext,
};
use vigil_common::{SecurityEvent, CONTINUE, EVENT_CACHE_ENTRIES};

mod hooks;
mod utils;

#[map]
static EVT_MAP: RingBuf = RingBuf::with_byte_size(256 * 1024, 0);

/// Reserved for cross-invocation correlation; no program touches it yet.
#[map]
static EVENT_CACHE: HashMap<u32, SecurityEvent> = HashMap::with_max_entries(EVENT_CACHE_ENTRIES, 0);

/// syscall nr -> `SyscallClass` code, filled by the loader.
#[map]
static RISK_TABLE: HashMap<u32, u32> = HashMap::with_max_entries(512, 0);

// A record is close to the 512 byte stack limit, so it is built here.
#[map]
static SCRATCH: PerCpuArray<SecurityEvent> = PerCpuArray::with_max_entries(1, 0);

#[tracepoint]
pub fn sys_enter_openat(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_openat(&ctx) {
		Ok(ret) => ret,
		Err(_) => CONTINUE,
	}
}

#[tracepoint]
pub fn sys_enter_execve(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_execve(&ctx) {
		Ok(ret) => ret,
		Err(_) => CONTINUE,
	}
}

#[tracepoint]
pub fn sys_enter_connect(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_connect(&ctx) {
		Ok(ret) => ret,
		Err(_) => CONTINUE,
	}
}

#[tracepoint]
pub fn sys_enter_setuid(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_setuid(&ctx) {
		Ok(ret) => ret,
		Err(_) => CONTINUE,
	}
}

#[tracepoint]
pub fn raw_sys_enter(ctx: TracePointContext) -> u32 {
	match hooks::try_raw_sys_enter(&ctx) {
		Ok(ret) => ret,
		Err(_) => CONTINUE,
	}
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
	loop {}
}

#[link_section = "license"]
#[no_mangle]
static LICENSE: [u8; 13] = *b"Dual MIT/GPL\0";
