pub mod disasm;
pub mod image;
pub mod ir;
pub mod op;
pub mod verify;

pub use image::ImageError;
pub use ir::Program;
pub use op::{Op, Reg};
pub use verify::{VerifyError, verify};
