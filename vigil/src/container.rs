use std::{
	collections::{hash_map::Entry, HashMap},
	path::PathBuf,
	sync::Arc,
};

const PROC_DIR: &str = "/proc";
const CACHE_CAPACITY: usize = 4096;

/// Maps a pid to the container it runs in, from `/proc/<pid>/cgroup`.
/// Host processes, and processes gone before lookup, resolve to `None`.
pub struct ContainerResolver {
	cache: HashMap<u32, Option<Arc<str>>>,
	proc_root: PathBuf,
}

impl ContainerResolver {
	pub fn new() -> Self {
		Self::with_proc_root(PROC_DIR)
	}

	pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
		Self {
			cache: HashMap::with_capacity(1024),
			proc_root: proc_root.into(),
		}
	}

	pub fn resolve(&mut self, pid: u32) -> Option<Arc<str>> {
		if self.cache.len() >= CACHE_CAPACITY {
			// pids get reused, so a full cache is mostly stale anyway
			self.clear();
		}

		match self.cache.entry(pid) {
			Entry::Occupied(entry) => entry.get().clone(),
			Entry::Vacant(entry) => {
				let id = Self::read_container_id(&self.proc_root, pid);
				entry.insert(id).clone()
			}
		}
	}

	pub fn cache_size(&self) -> usize {
		self.cache.len()
	}

	pub fn clear(&mut self) {
		self.cache.clear();
	}
}

// private fns
impl ContainerResolver {
	fn read_container_id(proc_root: &std::path::Path, pid: u32) -> Option<Arc<str>> {
		let content = std::fs::read_to_string(proc_root.join(pid.to_string()).join("cgroup")).ok()?;

		content
			.lines()
			.filter_map(|line| line.splitn(3, ':').nth(2))
			.find_map(extract_container_id)
			.map(Arc::from)
	}
}

const SCOPE_PREFIXES: [&str; 4] = ["docker-", "cri-containerd-", "crio-", "libpod-"];

/// Container id from a cgroup path such as
/// `/system.slice/docker-<id>.scope` or `/kubepods/burstable/pod<uid>/<id>`.
pub fn extract_container_id(cgroup_path: &str) -> Option<&str> {
	for part in cgroup_path.split('/') {
		if let Some(scope) = part.strip_suffix(".scope") {
			let id = SCOPE_PREFIXES.iter().find_map(|prefix| scope.strip_prefix(prefix));
			if let Some(id) = id.filter(|id| is_hex_id(id)) {
				return Some(id);
			}
		}

		if part.len() >= 32 && is_hex_id(part) {
			return Some(part);
		}
	}

	None
}

fn is_hex_id(s: &str) -> bool {
	s.len() >= 12 && s.chars().all(|c| c.is_ascii_hexdigit())
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	const FX_ID: &str = "4f1c2a7d9e0b3c5a6d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0c";

	#[test]
	fn extract_known_runtimes() -> Result<()> {
		// -- Setup & Fixtures
		let docker = format!("/system.slice/docker-{FX_ID}.scope");
		let containerd = format!("/kubepods.slice/kubepods-besteffort.slice/cri-containerd-{FX_ID}.scope");
		let crio = format!("/kubepods.slice/crio-{FX_ID}.scope");
		let podman = format!("/user.slice/user-1000.slice/libpod-{FX_ID}.scope");
		let cgroup_v1 = format!("/docker/{FX_ID}");

		// -- Exec & Check
		for path in [docker, containerd, crio, podman, cgroup_v1] {
			assert_eq!(extract_container_id(&path), Some(FX_ID), "{path}");
		}

		Ok(())
	}

	#[test]
	fn extract_host_paths() -> Result<()> {
		assert_eq!(extract_container_id("/user.slice/user-1000.slice/session-2.scope"), None);
		assert_eq!(extract_container_id("/system.slice/sshd.service"), None);
		assert_eq!(extract_container_id("/"), None);

		Ok(())
	}

	#[test]
	fn resolve_reads_proc_tree() -> Result<()> {
		// -- Setup & Fixtures
		let root = std::env::temp_dir().join(format!("vigil-proc-{}", std::process::id()));
		let container_pid = root.join("100");
		let host_pid = root.join("200");
		std::fs::create_dir_all(&container_pid)?;
		std::fs::create_dir_all(&host_pid)?;
		std::fs::write(container_pid.join("cgroup"), format!("0::/system.slice/docker-{FX_ID}.scope\n"))?;
		std::fs::write(host_pid.join("cgroup"), "0::/user.slice/user-1000.slice/session-2.scope\n")?;
		let mut resolver = ContainerResolver::with_proc_root(&root);

		// -- Exec
		let container = resolver.resolve(100);
		let host = resolver.resolve(200);
		let missing = resolver.resolve(300);

		// -- Check
		assert_eq!(container.as_deref(), Some(FX_ID));
		assert_eq!(host, None);
		assert_eq!(missing, None);
		assert_eq!(resolver.cache_size(), 3);

		std::fs::remove_dir_all(&root)?;

		Ok(())
	}
}

// endregion: --- Tests
