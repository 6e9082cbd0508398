//! Classification rules, one verdict function per event kind. First match wins.

use crate::event::Severity;

pub const ROOT_UID: u32 = 0;

pub const NETWORK_SENTINEL: &[u8] = b"network_socket";
pub const SETUID_SENTINEL: &[u8] = b"setuid_syscall";
pub const GENERIC_SYSCALL_SENTINEL: &[u8] = b"generic_syscall";

/// Prefix match, so `/etc/sudoers.d/...` counts as `/etc/sudoers`.
const SENSITIVE_FILES: [&[u8]; 4] = [b"/etc/passwd", b"/etc/shadow", b"/etc/gshadow", b"/etc/sudoers"];

const PROC_ROOT: &[u8] = b"/proc/";

const SHELLS: [&[u8]; 8] = [
	b"/bin/sh",
	b"/bin/bash",
	b"/bin/dash",
	b"/bin/zsh",
	b"/usr/bin/sh",
	b"/usr/bin/bash",
	b"/usr/bin/dash",
	b"/usr/bin/zsh",
];

const NETCAT: [&[u8]; 7] = [
	b"/bin/nc",
	b"/usr/bin/nc",
	b"/bin/netcat",
	b"/usr/bin/netcat",
	b"/usr/bin/ncat",
	b"/usr/bin/nc.openbsd",
	b"/usr/bin/nc.traditional",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
	pub severity: Severity,
	pub description: &'static str,
}

impl Verdict {
	pub const fn new(severity: Severity, description: &'static str) -> Self {
		Self { severity, description }
	}
}

// Byte loops bounded by the literal length. Slice `==` and `starts_with`
// may lower to memcmp/bcmp, which the BPF target has no symbol for.
#[inline(always)]
fn has_prefix(path: &[u8], prefix: &[u8]) -> bool {
	if path.len() < prefix.len() {
		return false;
	}
	let mut i = 0;
	while i < prefix.len() {
		if path[i] != prefix[i] {
			return false;
		}
		i += 1;
	}
	true
}

#[inline(always)]
fn is_exactly(path: &[u8], literal: &[u8]) -> bool {
	path.len() == literal.len() && has_prefix(path, literal)
}

#[inline(always)]
pub fn is_sensitive_file(path: &[u8]) -> bool {
	SENSITIVE_FILES.iter().any(|p| has_prefix(path, p))
}

#[inline(always)]
pub fn is_shell(path: &[u8]) -> bool {
	SHELLS.iter().any(|p| is_exactly(path, p))
}

#[inline(always)]
pub fn is_netcat(path: &[u8]) -> bool {
	NETCAT.iter().any(|p| is_exactly(path, p))
}

#[inline(always)]
pub fn file_access(path: &[u8]) -> Verdict {
	if is_sensitive_file(path) {
		Verdict::new(Severity::High, "Sensitive file access")
	} else if has_prefix(path, PROC_ROOT) {
		Verdict::new(Severity::Medium, "Proc filesystem access")
	} else {
		Verdict::new(Severity::Low, "File access")
	}
}

#[inline(always)]
pub fn process_exec(path: &[u8], uid: u32) -> Verdict {
	if is_shell(path) {
		if uid == ROOT_UID {
			Verdict::new(Severity::High, "Root shell execution")
		} else {
			Verdict::new(Severity::Medium, "Shell execution")
		}
	} else if is_netcat(path) {
		Verdict::new(Severity::Critical, "Netcat execution detected")
	} else {
		Verdict::new(Severity::Medium, "Process execution")
	}
}

#[inline(always)]
pub fn network_connect() -> Verdict {
	Verdict::new(Severity::Medium, "Network connection")
}

/// Intent is observed at entry; there is no benign branch.
#[inline(always)]
pub fn privilege_change() -> Verdict {
	Verdict::new(Severity::Critical, "UID change attempt")
}

// region:    --- Tests


// endregion: --- Tests
