use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::sink::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "vigil", about = "Syscall-level security telemetry")]
pub struct Cli {
	#[arg(long, value_enum, default_value = "live")]
	pub mode: RunMode,

	/// TOML configuration file. Defaults apply when omitted.
	#[arg(long)]
	pub config: Option<PathBuf>,

	#[arg(long, default_value = "/var/log/vigil/vigil.log")]
	pub log_file: PathBuf,

	#[arg(long, value_enum, default_value = "log")]
	pub output: OutputFormat,

	/// Write events here instead of stdout. Ignored by the `log` output.
	#[arg(long)]
	pub output_file: Option<PathBuf>,

	#[arg(long, help = "Stop after this many seconds")]
	pub time: Option<u64>,

	/// Compiled probe object, required unless built with the `embed` feature.
	#[arg(long)]
	pub ebpf_object: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum RunMode {
	Live,
	Simulate,
}

// region:    --- Tests


// endregion: --- Tests
