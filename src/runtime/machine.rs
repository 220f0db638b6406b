use std::io::{Read, Write};

use tracing::{debug, trace};

use crate::Integer;
use crate::bytecode::{Op, Program, Reg};
use crate::runtime::config::MachineConfig;
use crate::runtime::runtime_error::{ErrorKind, RuntimeError};
use crate::storage::{BANK_COUNT, BankArray, StorageError};
use crate::stream::{Input, Output};

/// What the instruction loop does after an op.
enum Flow {
    Next,
    Jump(usize),
    Halt(Integer),
}

/// The register machine: scratch registers A and B, the bank array with
/// its selector, and the program's input and output.
///
/// One machine runs one program. All state is created at construction and
/// lives until the machine is dropped or taken apart with
/// [`into_parts`](Machine::into_parts).
pub struct Machine<R, W> {
    a: Integer,
    b: Integer,
    banks: BankArray,
    input: Input<R>,
    output: Output<W>,
    config: MachineConfig,
    steps: u64,
}

impl<R: Read, W: Write> Machine<R, W> {
    pub fn new(source: R, sink: W) -> Self {
        Self::with_config(source, sink, MachineConfig::default())
    }

    pub fn with_config(source: R, sink: W, config: MachineConfig) -> Self {
        Self {
            a: 0,
            b: 0,
            banks: BankArray::new(config.bank_capacity),
            input: Input::with_chunk_size(source, config.input_chunk),
            output: Output::with_capacity(sink, config.output_capacity),
            config,
            steps: 0,
        }
    }

    /// Current values of A and B.
    pub fn registers(&self) -> (Integer, Integer) {
        (self.a, self.b)
    }

    pub fn selector(&self) -> usize {
        self.banks.selector()
    }

    pub fn bank_size(&self, bank: usize) -> Option<usize> {
        self.banks.bank(bank).map(|b| b.len())
    }

    /// Element counts of all banks.
    pub fn sizes(&self) -> [usize; BANK_COUNT] {
        self.banks.sizes()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn output(&self) -> &Output<W> {
        &self.output
    }

    pub fn into_parts(self) -> (Input<R>, Output<W>) {
        (self.input, self.output)
    }

    /// Run `program` from its first instruction until `halt`.
    ///
    /// Returns the halt value. On error the run stops where it faulted and
    /// buffered output is left unflushed.
    pub fn run(&mut self, program: &Program) -> Result<Integer, RuntimeError> {
        self.steps = 0;
        debug!(ops = program.len(), "run starting");

        let mut pc = 0;
        loop {
            let Some(&op) = program.ops.get(pc) else {
                debug!(pc, "ran past end of program");
                return Err(RuntimeError::new(ErrorKind::NoHalt, pc, None));
            };

            let flow = self
                .check_limits()
                .and_then(|()| self.exec(op, program.len()))
                .map_err(|kind| {
                    debug!(pc, ?op, error = %kind, "runtime fault");
                    RuntimeError::new(kind, pc, Some(op))
                })?;

            match flow {
                Flow::Next => pc += 1,
                Flow::Jump(target) => pc = target,
                Flow::Halt(value) => {
                    debug!(value, steps = self.steps, "halted");
                    return Ok(value);
                }
            }
        }
    }

    fn check_limits(&mut self) -> Result<(), ErrorKind> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(ErrorKind::StepLimitExceeded(max));
            }
        }
        Ok(())
    }

    fn exec(&mut self, op: Op, len: usize) -> Result<Flow, ErrorKind> {
        trace!(?op, a = self.a, b = self.b, bank = self.banks.selector(), "exec");

        match op {
            Op::Nop => {}
            Op::Halt => return self.halt().map(Flow::Halt),

            // Arithmetic
            Op::Add => self.a = self.a.wrapping_add(self.b),
            Op::Sub => self.a = self.a.wrapping_sub(self.b),
            Op::Mul => self.a = self.a.wrapping_mul(self.b),
            Op::Div => {
                if self.b == 0 {
                    return Err(ErrorKind::DivisionByZero { op: "division" });
                }
                self.a = self.a.wrapping_div(self.b);
            }
            Op::Rem => {
                if self.b == 0 {
                    return Err(ErrorKind::DivisionByZero { op: "remainder" });
                }
                self.a = self.a.wrapping_rem(self.b);
            }
            Op::Compare => self.a = Integer::from(self.a >= self.b),

            // Banks
            Op::Select(bank) => self.banks.select(bank)?,
            Op::Pop(reg) => {
                let value = self.banks.pop()?;
                self.set(reg, value);
            }
            Op::Push(reg) => {
                let value = self.get(reg);
                self.banks.push(value);
            }
            Op::PushConst(value) => self.banks.push(value),
            Op::PushFront(reg) => {
                let value = self.get(reg);
                self.banks.push_front(value)?;
            }
            Op::PushTo { reg, bank } => {
                let value = self.get(reg);
                self.banks.push_to(bank, value)?;
            }
            Op::Dup => {
                let value = self.banks.pop()?;
                self.banks.push_head(value);
                self.banks.push_head(value);
            }
            Op::Swap => {
                if self.banks.size() < 2 {
                    let bank = self.banks.selector();
                    return Err(StorageError::EmptyBank { bank }.into());
                }
                let x = self.banks.pop()?;
                let y = self.banks.pop()?;
                self.banks.push_head(x);
                self.banks.push_head(y);
            }
            Op::Drop => {
                self.banks.pop()?;
            }

            // I/O
            Op::PrintDecimal => self.output.write_decimal(self.a)?,
            Op::PrintChar => self.output.write_codepoint(self.a)?,
            Op::ReadDecimal => self.a = self.input.read_decimal()?,
            Op::ReadChar => self.a = self.input.read_codepoint()?,

            // Control flow
            Op::Jump(target) => return jump(target, len),
            Op::JumpIfNonZero(target) => {
                if self.a != 0 {
                    return jump(target, len);
                }
            }
            Op::JumpIfSizeBelow { min, target } => {
                if self.banks.size() < min {
                    return jump(target, len);
                }
            }
            Op::JumpIfSizeAtLeast { min, target } => {
                if self.banks.size() >= min {
                    return jump(target, len);
                }
            }
        }
        Ok(Flow::Next)
    }

    /// Flush output, then pop-and-return the selected bank's head, or 0
    /// when it is empty.
    fn halt(&mut self) -> Result<Integer, ErrorKind> {
        self.output.flush()?;
        Ok(self.banks.pop().unwrap_or(0))
    }

    fn get(&self, reg: Reg) -> Integer {
        match reg {
            Reg::A => self.a,
            Reg::B => self.b,
        }
    }

    fn set(&mut self, reg: Reg, value: Integer) {
        match reg {
            Reg::A => self.a = value,
            Reg::B => self.b = value,
        }
    }
}

fn jump(target: usize, len: usize) -> Result<Flow, ErrorKind> {
    if target < len {
        Ok(Flow::Jump(target))
    } else {
        Err(ErrorKind::JumpOutOfRange { target, len })
    }
}
