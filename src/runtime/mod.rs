//! The execution engine: registers, banks and I/O driven by a resolved
//! instruction stream.

pub mod config;
pub mod machine;
pub mod runtime_error;

pub use config::MachineConfig;
pub use machine::Machine;
pub use runtime_error::{ErrorKind, RuntimeError};
