use which::which;

/// Rebuild the probe object whenever the linker changes; cargo does not track
/// it because it is not a dependency.
fn main() -> anyhow::Result<()> {
	let bpf_linker = which("bpf-linker")?;
	println!("cargo:rerun-if-changed={}", bpf_linker.display());
	Ok(())
}
