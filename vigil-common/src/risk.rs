//! Baseline risk of raw syscall numbers.
//!
//! Numbers differ per architecture, so the lookup is driven by a
//! [`SyscallTable`] chosen (or supplied) at configuration time.

use crate::event::Severity;

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyscallClass {
	/// fork / clone / exec family
	ProcessLifecycle = 1,
	/// mount / umount / pivot_root family
	Mount = 2,
	/// setuid / setgid / setfsuid / setfsgid family
	CredentialChange = 3,
}

impl SyscallClass {
	pub fn severity(self) -> Severity {
		match self {
			SyscallClass::ProcessLifecycle => Severity::Medium,
			SyscallClass::Mount => Severity::High,
			SyscallClass::CredentialChange => Severity::Critical,
		}
	}

	pub fn description(self) -> &'static str {
		match self {
			SyscallClass::ProcessLifecycle => "Process lifecycle syscall",
			SyscallClass::Mount => "Mount operation",
			SyscallClass::CredentialChange => "Credential change syscall",
		}
	}

	pub fn code(self) -> u32 {
		self as u32
	}

	pub fn from_code(code: u32) -> Option<Self> {
		match code {
			1 => Some(SyscallClass::ProcessLifecycle),
			2 => Some(SyscallClass::Mount),
			3 => Some(SyscallClass::CredentialChange),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyscallTable<'a> {
	pub process: &'a [u32],
	pub mount: &'a [u32],
	pub credential: &'a [u32],
}

impl SyscallTable<'static> {
	pub const X86_64: Self = Self {
		// clone, fork, vfork, execve, execveat, clone3
		process: &[56, 57, 58, 59, 322, 435],
		// pivot_root, mount, umount2, move_mount, fsmount
		mount: &[155, 165, 166, 429, 432],
		// setuid, setgid, setreuid, setregid, setresuid, setresgid, setfsuid, setfsgid
		credential: &[105, 106, 113, 114, 117, 119, 122, 123],
	};

	pub const AARCH64: Self = Self {
		// clone, execve, execveat, clone3
		process: &[220, 221, 281, 435],
		// umount2, mount, pivot_root, move_mount, fsmount
		mount: &[39, 40, 41, 429, 432],
		// setregid, setgid, setreuid, setuid, setresuid, setresgid, setfsuid, setfsgid
		credential: &[143, 144, 145, 146, 147, 149, 151, 152],
	};

	pub const EMPTY: Self = Self {
		process: &[],
		mount: &[],
		credential: &[],
	};

	/// Table for the architecture this crate is compiled for.
	pub const fn native() -> Self {
		if cfg!(target_arch = "x86_64") {
			Self::X86_64
		} else if cfg!(target_arch = "aarch64") {
			Self::AARCH64
		} else {
			Self::EMPTY
		}
	}
}

impl<'a> SyscallTable<'a> {
	pub fn classify(&self, nr: u32) -> Option<SyscallClass> {
		if self.process.contains(&nr) {
			Some(SyscallClass::ProcessLifecycle)
		} else if self.mount.contains(&nr) {
			Some(SyscallClass::Mount)
		} else if self.credential.contains(&nr) {
			Some(SyscallClass::CredentialChange)
		} else {
			None
		}
	}

	/// `None` means unclassified, not an error.
	pub fn risk_of(&self, nr: u32) -> Option<Severity> {
		self.classify(nr).map(SyscallClass::severity)
	}

	pub fn entries(&self) -> impl Iterator<Item = (u32, SyscallClass)> + 'a {
		let process = self.process.iter().map(|&nr| (nr, SyscallClass::ProcessLifecycle));
		let mount = self.mount.iter().map(|&nr| (nr, SyscallClass::Mount));
		let credential = self.credential.iter().map(|&nr| (nr, SyscallClass::CredentialChange));
		process.chain(mount).chain(credential)
	}

	pub fn len(&self) -> usize {
		self.process.len() + self.mount.len() + self.credential.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn x86_64_risk_by_class() -> Result<()> {
		// -- Setup & Fixtures
		let table = SyscallTable::X86_64;

		// -- Exec & Check
		assert_eq!(table.risk_of(59), Some(Severity::Medium)); // execve
		assert_eq!(table.risk_of(56), Some(Severity::Medium)); // clone
		assert_eq!(table.risk_of(165), Some(Severity::High)); // mount
		assert_eq!(table.risk_of(155), Some(Severity::High)); // pivot_root
		assert_eq!(table.risk_of(105), Some(Severity::Critical)); // setuid
		assert_eq!(table.risk_of(123), Some(Severity::Critical)); // setfsgid
		assert_eq!(table.risk_of(0), None); // read
		assert_eq!(table.risk_of(2), None); // open

		Ok(())
	}

	#[test]
	fn aarch64_numbers_differ() -> Result<()> {
		// -- Setup & Fixtures
		let table = SyscallTable::AARCH64;

		// -- Exec & Check
		assert_eq!(table.classify(221), Some(SyscallClass::ProcessLifecycle)); // execve
		assert_eq!(table.classify(40), Some(SyscallClass::Mount)); // mount
		assert_eq!(table.classify(146), Some(SyscallClass::CredentialChange)); // setuid
		assert_eq!(table.classify(59), None);

		Ok(())
	}

	#[test]
	fn entries_cover_table() -> Result<()> {
		// -- Setup & Fixtures
		let table = SyscallTable::X86_64;

		// -- Exec
		let all_match = table.entries().all(|(nr, class)| table.classify(nr) == Some(class));

		// -- Check
		assert!(all_match);
		assert_eq!(table.entries().count(), table.len());
		assert!(SyscallTable::EMPTY.is_empty());

		Ok(())
	}

	#[test]
	fn class_code_round_trip() -> Result<()> {
		for class in [
			SyscallClass::ProcessLifecycle,
			SyscallClass::Mount,
			SyscallClass::CredentialChange,
		] {
			assert_eq!(SyscallClass::from_code(class.code()), Some(class));
		}
		assert_eq!(SyscallClass::from_code(0), None);

		Ok(())
	}
}

// endregion: --- Tests
