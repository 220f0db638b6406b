//! Runtime for programs compiled to a small register machine over 28
//! storage banks (27 stacks and one queue), with buffered decimal and
//! UTF-8 I/O.
//!
//! A compiled program arrives either as a text listing
//! ([`frontend::assemble`]) or as a binary image ([`bytecode::image`]),
//! and runs on a [`Machine`]:
//!
//! ```
//! use palheui_rt::{Machine, frontend::assemble};
//!
//! let program = assemble("read_dec\npush a\npop b\nadd\nprint_dec\nhalt\n").unwrap();
//! let mut out = Vec::new();
//! let mut machine = Machine::new(&b"21"[..], &mut out);
//! assert_eq!(machine.run(&program).unwrap(), 0);
//! drop(machine);
//! assert_eq!(out, b"42");
//! ```

pub mod bytecode;
pub mod frontend;
pub mod runtime;
pub mod storage;
pub mod stream;

/// The machine's scalar type. Arithmetic wraps on overflow.
pub type Integer = i64;

pub use bytecode::{Op, Program, Reg};
pub use runtime::{Machine, MachineConfig, RuntimeError};
