use crate::stream::DEFAULT_CHUNK;

/// Initial capacity of every bank (elements).
pub const DEFAULT_BANK_CAPACITY: usize = 1 << 16;

#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Abort with an error after this many executed instructions.
    pub max_steps: Option<u64>,
    pub bank_capacity: usize,
    /// Bytes requested from the source per refill.
    pub input_chunk: usize,
    /// Bytes buffered before output is flushed to the sink.
    pub output_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            max_steps: None,
            bank_capacity: DEFAULT_BANK_CAPACITY,
            input_chunk: DEFAULT_CHUNK,
            output_capacity: DEFAULT_CHUNK,
        }
    }
}
