//! Buffered program I/O: a chunked [`Input`] with decimal and UTF-8
//! decoders, and a threshold-flushed [`Output`] with matching encoders.

pub mod input;
pub mod output;

pub use input::Input;
pub use output::Output;

use crate::Integer;

/// Default input chunk and output buffer size (128 KiB).
pub const DEFAULT_CHUNK: usize = 1 << 17;

/// Value produced by the decoders when the input is exhausted.
pub const EOF: Integer = -1;
