use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use palheui_rt::bytecode::{Program, disasm, image, verify};
use palheui_rt::frontend::assemble;
use palheui_rt::runtime::{Machine, MachineConfig, config::DEFAULT_BANK_CAPACITY};
use palheui_rt::stream::DEFAULT_CHUNK;

/// Exit status for load, verify and runtime failures.
const FAILURE: i32 = 2;

/// Register-machine runtime for compiled stack/queue programs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program with stdin/stdout; exits with the halt value
    Run {
        /// Listing (.pasm) or image (.palb)
        file: PathBuf,

        #[command(flatten)]
        limits: Limits,
    },
    /// Assemble a listing into a binary image
    Asm {
        file: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a program as a listing
    Disasm { file: PathBuf },
}

#[derive(Args, Debug)]
struct Limits {
    /// Abort after this many executed instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Initial capacity of each bank
    #[arg(long, default_value_t = DEFAULT_BANK_CAPACITY)]
    bank_capacity: usize,

    /// Bytes read from stdin per refill
    #[arg(long, default_value_t = DEFAULT_CHUNK)]
    input_chunk: usize,

    /// Bytes buffered before stdout is written
    #[arg(long, default_value_t = DEFAULT_CHUNK)]
    output_capacity: usize,
}

impl From<Limits> for MachineConfig {
    fn from(limits: Limits) -> Self {
        MachineConfig {
            max_steps: limits.max_steps,
            bank_capacity: limits.bank_capacity,
            input_chunk: limits.input_chunk,
            output_capacity: limits.output_capacity,
        }
    }
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { file, limits } => {
            let program = load_verified(&file);
            process::exit(run(&program, limits.into()));
        }
        Command::Asm { file, output } => {
            let program = load_verified(&file);
            let bytes = image::encode(&program).unwrap_or_else(|e| fail(e));
            if let Err(e) = fs::write(&output, bytes) {
                fail(format!("failed to write '{}': {}", output.display(), e));
            }
        }
        Command::Disasm { file } => {
            disasm::print_program(&load(&file));
        }
    }
}

/// Logs go to stderr; stdout belongs to the program.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Report on stderr even when logging is filtered off.
fn fail(message: impl std::fmt::Display) -> ! {
    error!("{}", message);
    eprintln!("error: {}", message);
    process::exit(FAILURE);
}

fn load(path: &Path) -> Program {
    let bytes = fs::read(path)
        .unwrap_or_else(|e| fail(format!("failed to read '{}': {}", path.display(), e)));

    if image::is_image(&bytes) {
        debug!(path = %path.display(), "loading image");
        return image::decode(&bytes)
            .unwrap_or_else(|e| fail(format!("{}: {}", path.display(), e)));
    }

    debug!(path = %path.display(), "assembling listing");
    let source = String::from_utf8(bytes)
        .unwrap_or_else(|_| fail(format!("{}: listing is not valid UTF-8", path.display())));
    assemble(&source).unwrap_or_else(|e| fail(format!("{}: {}", path.display(), e)))
}

fn load_verified(path: &Path) -> Program {
    let program = load(path);
    if let Err(e) = verify(&program) {
        fail(format!("{}: {}", path.display(), e));
    }
    program
}

fn run(program: &Program, config: MachineConfig) -> i32 {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut machine = Machine::with_config(stdin.lock(), stdout.lock(), config);

    match machine.run(program) {
        Ok(value) => value as i32,
        Err(e) => fail(e),
    }
}
