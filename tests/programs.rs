//! End-to-end runs of assembled listings against in-memory I/O.

use std::io::{self, Write};

use palheui_rt::bytecode::{image, verify};
use palheui_rt::frontend::assemble;
use palheui_rt::runtime::ErrorKind;
use palheui_rt::storage::StorageError;
use palheui_rt::{Integer, Machine, MachineConfig, Program};

fn config() -> MachineConfig {
    MachineConfig {
        max_steps: Some(1_000_000),
        bank_capacity: 256,
        input_chunk: 64,
        output_capacity: 64,
    }
}

fn program(listing: &str) -> Program {
    let program = assemble(listing).unwrap();
    verify(&program).unwrap();
    program
}

fn run(listing: &str, input: &str) -> (Integer, String) {
    let program = program(listing);
    let mut out = Vec::new();
    let value = Machine::with_config(input.as_bytes(), &mut out, config())
        .run(&program)
        .unwrap();
    (value, String::from_utf8(out).unwrap())
}

/// Sink that keeps each write as its own chunk.
#[derive(Default)]
struct Chunks(Vec<Vec<u8>>);

impl Write for Chunks {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const DOUBLE: &str = "
    read_dec
    push a
    pop b
    add
    print_dec
    halt
";

#[test]
fn doubles_a_decimal() {
    assert_eq!(run(DOUBLE, "21"), (0, "42".to_string()));
    assert_eq!(
        run(DOUBLE, "-4611686018427387904\n"),
        (0, "-9223372036854775808".to_string())
    );
}

#[test]
fn queue_sum_leaves_six_in_a() {
    let program = program(
        "
        select 21
        push 1
        push 2
        push 3
        pop a
        pop b
        add
        pop b
        add
        halt
        ",
    );
    let mut machine = Machine::with_config(&b""[..], Vec::new(), config());
    assert_eq!(machine.run(&program).unwrap(), 0);
    assert_eq!(machine.registers().0, 6);
}

#[test]
fn sums_numbers_until_eof() {
    // read_dec yields -1 once input is exhausted
    let listing = "
        push 0          ; running total
    next:
        read_dec
        push_to a 1     ; stash x
        push -1
        pop b
        sub             ; a = x + 1, zero only at end of input
        jnz more
        jmp done
    more:
        select 1
        pop a
        select 0
        pop b
        add
        push a
        jmp next
    done:
        pop a
        print_dec
        push a
        halt
    ";
    let (value, out) = run(listing, "10 20 30 -5\n");
    assert_eq!(out, "55");
    assert_eq!(value, 55);
}

#[test]
fn reverses_a_line_with_a_stack() {
    let listing = "
    read:
        read_char
        push a
        push 10          ; newline ends the line
        pop b
        sub
        jnz read
        drop
    write:
        jlt 1 end
        pop a
        print_char
        jmp write
    end:
        halt
    ";
    let (_, out) = run(listing, "안녕, world\nrest");
    assert_eq!(out, "dlrow ,녕안");
}

#[test]
fn moves_values_between_banks() {
    // copy three values to bank 21 and read them back in insertion order
    let listing = "
        push 1
        push 2
        push 3
    move:
        jlt 1 show
        pop a
        push_to a 21
        jmp move
    show:
        select 21
    loop:
        jlt 1 end
        pop a
        print_dec
        jmp loop
    end:
        halt
    ";
    assert_eq!(run(listing, "").1, "321");
}

#[test]
fn push_front_jumps_the_queue() {
    let listing = "
        select 21
        push 1
        push 2
        push 3
        push 9
        pop a
        push_front a
        pop a
        print_dec
        pop a
        print_dec
        halt
    ";
    assert_eq!(run(listing, "").1, "12");

    let listing = "
        select 21
        push 1
        push 2
        read_dec
        push_front a
        halt
    ";
    assert_eq!(run(listing, "7").0, 7);
}

#[test]
fn growth_round_trip_through_the_machine() {
    // 1000 pushes into a bank starting at capacity 256, then sum them
    let listing = "
        push 0
        pop a
    fill:
        push a
        push 1
        pop b
        add
        push_to a 1
        push 1000
        pop b
        sub
        jnz more
        jmp total
    more:
        select 1
        pop a
        select 0
        jmp fill
    total:
        push 0
        pop a
    sum:
        jlt 1 end
        pop b
        add
        jmp sum
    end:
        push a
        halt
    ";
    let (value, _) = run(listing, "");
    assert_eq!(value, (0..1000).sum::<Integer>());
}

#[test]
fn output_overflow_flushes_in_chunks() {
    // print "7" a hundred times through a 64-byte buffer
    let listing = "
        push 100
        pop a
    loop:
        push_to a 1
        push 7
        pop a
        print_dec
        select 1
        pop a
        select 0
        push 1
        pop b
        sub
        jnz loop
        halt
    ";
    let program = program(listing);
    let mut machine = Machine::with_config(&b""[..], Chunks::default(), config());
    machine.run(&program).unwrap();
    let (_, out) = machine.into_parts();
    let chunks = out.into_inner().0;

    let lengths: Vec<usize> = chunks.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![64, 36]);
    assert_eq!(chunks.concat(), vec![b'7'; 100]);
}

#[test]
fn image_runs_like_the_listing() {
    let program = program(DOUBLE);
    let decoded = image::decode(&image::encode(&program).unwrap()).unwrap();
    let mut out = Vec::new();
    Machine::with_config(&b"50"[..], &mut out, config())
        .run(&decoded)
        .unwrap();
    assert_eq!(out, b"100");
}

#[test]
fn runtime_errors_name_their_cause() {
    let empty_pop = program("select 3\npop a\nhalt");
    let err = Machine::with_config(&b""[..], Vec::new(), config())
        .run(&empty_pop)
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Storage(StorageError::EmptyBank { bank: 3 })
    ));
    assert_eq!(err.pc, 1);

    let div_zero = program("read_dec\npush 0\npop b\ndiv\nhalt");
    let err = Machine::with_config(&b"5"[..], Vec::new(), config())
        .run(&div_zero)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DivisionByZero { .. }));
}
