use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{classify::Verdict, strbuf};

pub const COMM_LEN: usize = 16;
pub const FILENAME_LEN: usize = 256;
pub const DESCRIPTION_LEN: usize = 128;
pub const CONTAINER_ID_LEN: usize = 64;

/// Capacity of the auxiliary state table (`EVENT_CACHE`).
pub const EVENT_CACHE_ENTRIES: u32 = 10_240;

/// Return code every program hands back to its tracepoint.
pub const CONTINUE: u32 = 0;

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
	Syscall = 1,
	FileAccess = 2,
	Network = 3,
	Process = 4,
}

impl EventType {
	pub fn as_str(self) -> &'static str {
		match self {
			EventType::Syscall => "syscall",
			EventType::FileAccess => "file_access",
			EventType::Network => "network",
			EventType::Process => "process",
		}
	}
}

impl TryFrom<u32> for EventType {
	type Error = u32;

	fn try_from(value: u32) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(EventType::Syscall),
			2 => Ok(EventType::FileAccess),
			3 => Ok(EventType::Network),
			4 => Ok(EventType::Process),
			other => Err(other),
		}
	}
}

/// Ordered risk level, `Low < Medium < High < Critical`.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
	Low = 1,
	Medium = 2,
	High = 3,
	Critical = 4,
}

impl Severity {
	pub fn as_str(self) -> &'static str {
		match self {
			Severity::Low => "low",
			Severity::Medium => "medium",
			Severity::High => "high",
			Severity::Critical => "critical",
		}
	}
}

impl TryFrom<u32> for Severity {
	type Error = u32;

	fn try_from(value: u32) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(Severity::Low),
			2 => Ok(Severity::Medium),
			3 => Ok(Severity::High),
			4 => Ok(Severity::Critical),
			other => Err(other),
		}
	}
}

/// Identity of the task that hit the instrumentation point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskInfo {
	pub timestamp: u64,
	pub pid: u32,
	pub tid: u32,
	pub uid: u32,
	pub gid: u32,
	pub comm: [u8; COMM_LEN],
}

impl TaskInfo {
	/// Splits the combined helper values: `pid_tgid` carries the pid in the
	/// high half, `uid_gid` carries the gid in the high half.
	pub fn from_raw(timestamp: u64, pid_tgid: u64, uid_gid: u64, comm: [u8; COMM_LEN]) -> Self {
		Self {
			timestamp,
			pid: (pid_tgid >> 32) as u32,
			tid: pid_tgid as u32,
			uid: uid_gid as u32,
			gid: (uid_gid >> 32) as u32,
			comm,
		}
	}
}

// Wire layout, native byte order. Offsets are part of the collector contract.
#[repr(C)]
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SecurityEvent {
	pub timestamp: u64,                       //   0..8
	pub pid: u32,                             //   8..12
	pub tid: u32,                             //  12..16
	pub uid: u32,                             //  16..20
	pub gid: u32,                             //  20..24
	pub comm: [u8; COMM_LEN],                 //  24..40
	pub filename: [u8; FILENAME_LEN],         //  40..296
	pub event_type: u32,                      // 296..300
	pub severity: u32,                        // 300..304
	pub description: [u8; DESCRIPTION_LEN],   // 304..432
	pub container_id: [u8; CONTAINER_ID_LEN], // 432..496
}

const _: () = assert!(core::mem::size_of::<SecurityEvent>() == 496);

#[cfg(feature = "user")]
unsafe impl aya::Pod for SecurityEvent {}

impl SecurityEvent {
	/// Overwrites every field for a new observation. Severity starts at `Low`
	/// so a record never leaves a handler with a zero severity.
	#[inline(always)]
	pub fn begin(&mut self, task: &TaskInfo, event_type: EventType) {
		self.timestamp = task.timestamp;
		self.pid = task.pid;
		self.tid = task.tid;
		self.uid = task.uid;
		self.gid = task.gid;
		strbuf::copy_str(&mut self.comm, &task.comm);
		self.filename = [0u8; FILENAME_LEN];
		self.event_type = event_type as u32;
		self.severity = Severity::Low as u32;
		self.description = [0u8; DESCRIPTION_LEN];
		self.container_id = [0u8; CONTAINER_ID_LEN];
	}

	#[inline(always)]
	pub fn apply(&mut self, verdict: Verdict) {
		self.severity = verdict.severity as u32;
		strbuf::copy_str(&mut self.description, verdict.description.as_bytes());
	}

	#[inline(always)]
	pub fn set_filename(&mut self, name: &[u8]) {
		strbuf::copy_str(&mut self.filename, name);
	}

	pub fn set_container_id(&mut self, id: &[u8]) {
		strbuf::copy_str(&mut self.container_id, id);
	}

	pub fn event_type(&self) -> Option<EventType> {
		EventType::try_from(self.event_type).ok()
	}

	pub fn severity(&self) -> Option<Severity> {
		Severity::try_from(self.severity).ok()
	}

	pub fn comm(&self) -> &[u8] {
		strbuf::until_nul(&self.comm)
	}

	pub fn filename(&self) -> &[u8] {
		strbuf::until_nul(&self.filename)
	}

	pub fn description(&self) -> &[u8] {
		strbuf::until_nul(&self.description)
	}

	pub fn container_id(&self) -> &[u8] {
		strbuf::until_nul(&self.container_id)
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use zerocopy::{FromBytes, FromZeros, IntoBytes};

	#[test]
	fn task_info_from_raw_splits_halves() -> Result<()> {
		// -- Setup & Fixtures
		let pid_tgid = (4242u64 << 32) | 4243;
		let uid_gid = (100u64 << 32) | 1000;

		// -- Exec
		let task = TaskInfo::from_raw(7, pid_tgid, uid_gid, *b"bash\0\0\0\0\0\0\0\0\0\0\0\0");

		// -- Check
		assert_eq!(task.pid, 4242);
		assert_eq!(task.tid, 4243);
		assert_eq!(task.uid, 1000);
		assert_eq!(task.gid, 100);

		Ok(())
	}

	#[test]
	fn begin_overwrites_stale_fields() -> Result<()> {
		// -- Setup & Fixtures
		let mut evt = SecurityEvent::new_zeroed();
		evt.filename = [b'x'; FILENAME_LEN];
		evt.description = [b'y'; DESCRIPTION_LEN];
		evt.container_id = [b'z'; CONTAINER_ID_LEN];
		let task = TaskInfo::from_raw(1, 1 << 32, 0, [b'a'; COMM_LEN]);

		// -- Exec
		evt.begin(&task, EventType::Network);

		// -- Check
		assert_eq!(evt.filename(), b"");
		assert_eq!(evt.description(), b"");
		assert_eq!(evt.container_id(), b"");
		assert_eq!(evt.comm(), &[b'a'; COMM_LEN - 1][..]);
		assert_eq!(evt.event_type(), Some(EventType::Network));
		assert_eq!(evt.severity(), Some(Severity::Low));

		Ok(())
	}

	#[test]
	fn wire_layout_offsets() -> Result<()> {
		// -- Setup & Fixtures
		let mut evt = SecurityEvent::new_zeroed();
		evt.timestamp = 0x0102_0304_0506_0708;
		evt.event_type = EventType::Process as u32;
		evt.severity = Severity::Critical as u32;
		evt.container_id[0] = b'c';

		// -- Exec
		let bytes = evt.as_bytes();
		let back = SecurityEvent::read_from_bytes(bytes).map_err(|_| "size mismatch")?;

		// -- Check
		assert_eq!(bytes.len(), 496);
		assert_eq!(&bytes[0..8], &evt.timestamp.to_ne_bytes());
		assert_eq!(&bytes[296..300], &4u32.to_ne_bytes());
		assert_eq!(&bytes[300..304], &4u32.to_ne_bytes());
		assert_eq!(bytes[432], b'c');
		assert_eq!(back.severity(), Some(Severity::Critical));

		Ok(())
	}

	#[test]
	fn severity_is_ordered() -> Result<()> {
		assert!(Severity::Low < Severity::Medium);
		assert!(Severity::Medium < Severity::High);
		assert!(Severity::High < Severity::Critical);
		assert_eq!(Severity::try_from(0), Err(0));
		assert_eq!(EventType::try_from(5), Err(5));

		Ok(())
	}
}

// endregion: --- Tests
