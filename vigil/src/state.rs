use std::{
	collections::{hash_map::Entry, HashMap},
	sync::Mutex,
};

use vigil_common::SecurityEvent;

use crate::{Error, Result};

/// Host counterpart of the kernel `EVENT_CACHE` map: u32 key -> record,
/// bounded. Like a full BPF hash map, a new key is rejected once the table is
/// at capacity while updates of existing keys keep working. Nothing evicts.
pub struct StateTable {
	capacity: usize,
	entries: Mutex<HashMap<u32, SecurityEvent>>,
}

impl StateTable {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			entries: Mutex::new(HashMap::with_capacity(capacity.min(1024))),
		}
	}

	/// Returns the record previously stored under `key`.
	pub fn upsert(&self, key: u32, evt: SecurityEvent) -> Result<Option<SecurityEvent>> {
		let mut entries = self.entries.lock()?;
		let len = entries.len();

		match entries.entry(key) {
			Entry::Occupied(mut slot) => Ok(Some(slot.insert(evt))),
			Entry::Vacant(slot) => {
				if len >= self.capacity {
					return Err(Error::StateTableFull(self.capacity));
				}
				slot.insert(evt);
				Ok(None)
			}
		}
	}

	pub fn get(&self, key: u32) -> Result<Option<SecurityEvent>> {
		Ok(self.entries.lock()?.get(&key).copied())
	}

	pub fn remove(&self, key: u32) -> Result<Option<SecurityEvent>> {
		Ok(self.entries.lock()?.remove(&key))
	}

	pub fn len(&self) -> usize {
		self.entries.lock().map(|e| e.len()).unwrap_or_default()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use std::{sync::Arc, thread};
	use zerocopy::FromZeros;

	fn record(pid: u32) -> SecurityEvent {
		let mut evt = SecurityEvent::new_zeroed();
		evt.pid = pid;
		evt
	}

	#[test]
	fn rejects_new_key_when_full() -> Result<()> {
		// -- Setup & Fixtures
		let table = StateTable::new(2);
		table.upsert(1, record(1))?;
		table.upsert(2, record(2))?;

		// -- Exec
		let res = table.upsert(3, record(3));
		let replaced = table.upsert(2, record(22))?;

		// -- Check
		assert!(matches!(res, Err(Error::StateTableFull(2))));
		assert_eq!(replaced.map(|e| e.pid), Some(2));
		assert_eq!(table.get(2)?.map(|e| e.pid), Some(22));
		assert_eq!(table.get(3)?.map(|e| e.pid), None);
		assert_eq!(table.len(), 2);

		Ok(())
	}

	#[test]
	fn remove_frees_a_slot() -> Result<()> {
		// -- Setup & Fixtures
		let table = StateTable::new(1);
		table.upsert(7, record(7))?;

		// -- Exec
		let removed = table.remove(7)?;
		table.upsert(8, record(8))?;

		// -- Check
		assert_eq!(removed.map(|e| e.pid), Some(7));
		assert_eq!(table.get(8)?.map(|e| e.pid), Some(8));
		assert_eq!(table.capacity(), 1);

		Ok(())
	}

	#[test]
	fn concurrent_upserts_stay_bounded() -> Result<()> {
		// -- Setup & Fixtures
		let table = Arc::new(StateTable::new(64));

		// -- Exec
		let handles: Vec<_> = (0..4u32)
			.map(|t| {
				let table = table.clone();
				thread::spawn(move || {
					for i in 0..100u32 {
						let _ = table.upsert(t * 1000 + i, record(i));
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().map_err(|_| "worker panicked")?;
		}

		// -- Check
		assert_eq!(table.len(), 64);
		assert!(!table.is_empty());

		Ok(())
	}
}

// endregion: --- Tests
