mod container_resolver;
mod ringbuf;
mod simulator;

pub use container_resolver::*;
pub use ringbuf::*;
pub use simulator::*;
