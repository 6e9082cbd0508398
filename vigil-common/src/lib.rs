#![cfg_attr(not(test), no_std)]

pub mod classify;
pub mod event;
pub mod probe;
pub mod risk;
pub mod strbuf;

pub use event::{
	EventType, SecurityEvent, Severity, TaskInfo, COMM_LEN, CONTAINER_ID_LEN, CONTINUE, DESCRIPTION_LEN,
	EVENT_CACHE_ENTRIES, FILENAME_LEN,
};
pub use risk::{SyscallClass, SyscallTable};
