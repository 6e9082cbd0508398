use std::path::Path;

use serde::Deserialize;
use vigil_common::{SyscallTable, EVENT_CACHE_ENTRIES};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub probe: ProbeConfig,
	pub channel: ChannelConfig,
	pub state: StateConfig,
	pub simulate: SimulateConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
	/// Also attach `raw_syscalls/sys_enter` and report every syscall the table classifies.
	pub generic_syscalls: bool,
	pub syscall_table: TableChoice,
	/// Replaces the built-in table when present.
	pub syscalls: Option<SyscallNumbers>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum TableChoice {
	#[default]
	#[serde(rename = "native")]
	Native,
	#[serde(rename = "x86_64")]
	X86_64,
	#[serde(rename = "aarch64")]
	Aarch64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyscallNumbers {
	pub process: Vec<u32>,
	pub mount: Vec<u32>,
	pub credential: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
	pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateConfig {
	pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulateConfig {
	pub interval_ms: u64,
}

impl Default for ChannelConfig {
	fn default() -> Self {
		Self { capacity: 1000 }
	}
}

impl Default for StateConfig {
	fn default() -> Self {
		Self {
			capacity: EVENT_CACHE_ENTRIES as usize,
		}
	}
}

impl Default for SimulateConfig {
	fn default() -> Self {
		Self { interval_ms: 5000 }
	}
}

impl Config {
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let Some(path) = path else {
			return Ok(Self::default());
		};

		let content = std::fs::read_to_string(path)?;
		Self::from_toml(&content)
	}

	pub fn from_toml(content: &str) -> Result<Self> {
		let config: Config = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.channel.capacity == 0 {
			return Err(Error::InvalidConfig("channel.capacity must be at least 1".into()));
		}
		if self.state.capacity == 0 {
			return Err(Error::InvalidConfig("state.capacity must be at least 1".into()));
		}
		if self.simulate.interval_ms == 0 {
			return Err(Error::InvalidConfig("simulate.interval_ms must be at least 1".into()));
		}
		Ok(())
	}
}

impl ProbeConfig {
	pub fn table(&self) -> SyscallTable<'_> {
		if let Some(numbers) = &self.syscalls {
			return numbers.table();
		}

		match self.syscall_table {
			TableChoice::Native => SyscallTable::native(),
			TableChoice::X86_64 => SyscallTable::X86_64,
			TableChoice::Aarch64 => SyscallTable::AARCH64,
		}
	}
}

impl SyscallNumbers {
	pub fn from_table(table: SyscallTable<'_>) -> Self {
		Self {
			process: table.process.to_vec(),
			mount: table.mount.to_vec(),
			credential: table.credential.to_vec(),
		}
	}

	pub fn table(&self) -> SyscallTable<'_> {
		SyscallTable {
			process: &self.process,
			mount: &self.mount,
			credential: &self.credential,
		}
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn defaults_without_file() -> Result<()> {
		// -- Exec
		let config = Config::load(None)?;

		// -- Check
		assert!(!config.probe.generic_syscalls);
		assert_eq!(config.probe.syscall_table, TableChoice::Native);
		assert_eq!(config.channel.capacity, 1000);
		assert_eq!(config.state.capacity, 10_240);
		assert_eq!(config.simulate.interval_ms, 5000);

		Ok(())
	}

	#[test]
	fn partial_file_keeps_defaults() -> Result<()> {
		// -- Setup & Fixtures
		let fx_toml = r#"
[probe]
syscall_table = "aarch64"

[channel]
capacity = 16
"#;

		// -- Exec
		let config = Config::from_toml(fx_toml)?;

		// -- Check
		assert_eq!(config.probe.table(), SyscallTable::AARCH64);
		assert_eq!(config.channel.capacity, 16);
		assert_eq!(config.state.capacity, 10_240);

		Ok(())
	}

	#[test]
	fn syscall_override_replaces_builtin() -> Result<()> {
		// -- Setup & Fixtures
		let fx_toml = r#"
[probe]
syscall_table = "x86_64"

[probe.syscalls]
mount = [165]
credential = [105]
"#;

		// -- Exec
		let config = Config::from_toml(fx_toml)?;
		let table = config.probe.table();

		// -- Check
		assert_eq!(table.classify(165).map(|c| c.severity()), Some(vigil_common::Severity::High));
		assert_eq!(table.risk_of(59), None);
		assert_eq!(table.len(), 2);

		Ok(())
	}

	#[test]
	fn zero_capacity_is_rejected() -> Result<()> {
		// -- Exec
		let res = Config::from_toml("[channel]\ncapacity = 0\n");

		// -- Check
		assert!(matches!(res, Err(Error::InvalidConfig(_))));

		Ok(())
	}

	#[test]
	fn unknown_table_is_rejected() -> Result<()> {
		// -- Exec
		let res = Config::from_toml("[probe]\nsyscall_table = \"sparc\"\n");

		// -- Check
		assert!(matches!(res, Err(Error::TomlDe(_))));

		Ok(())
	}
}

// endregion: --- Tests
