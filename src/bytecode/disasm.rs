use crate::bytecode::{Op, Program};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

/// Print disassembly of a program to stdout.
pub fn print_program(program: &Program) {
    print!("{}", disassemble(program));
}

/// Render a program in listing syntax.
///
/// Every jump target gets a `label:` line (its recorded name, or a
/// generated `L<index>`), so the output assembles back to the same ops.
pub fn disassemble(program: &Program) -> String {
    let labels = label_names(program);
    let mut out = String::new();

    writeln!(out, "; {} instructions", program.ops.len()).ok();
    for (ip, op) in program.ops.iter().enumerate() {
        if let Some(name) = labels.get(&ip) {
            writeln!(out, "{}:", name).ok();
        }
        writeln!(out, "    {:<24}; {:04}", format_op(op, &labels), ip).ok();
    }
    // A label may point one past the last op.
    if let Some(name) = labels.get(&program.ops.len()) {
        writeln!(out, "{}:", name).ok();
    }
    out
}

fn label_names(program: &Program) -> BTreeMap<usize, String> {
    let mut names = program.labels.clone();
    let mut taken: HashSet<String> = names.values().cloned().collect();

    for op in &program.ops {
        let Some(target) = op.target() else {
            continue;
        };
        if names.contains_key(&target) {
            continue;
        }
        let mut name = format!("L{}", target);
        let mut n = 1;
        while taken.contains(&name) {
            name = format!("L{}_{}", target, n);
            n += 1;
        }
        taken.insert(name.clone());
        names.insert(target, name);
    }
    names
}

fn format_op(op: &Op, labels: &BTreeMap<usize, String>) -> String {
    let label = |target: usize| {
        labels
            .get(&target)
            .cloned()
            .unwrap_or_else(|| target.to_string())
    };

    match *op {
        Op::Nop => "nop".to_string(),
        Op::Halt => "halt".to_string(),

        Op::Add => "add".to_string(),
        Op::Sub => "sub".to_string(),
        Op::Mul => "mul".to_string(),
        Op::Div => "div".to_string(),
        Op::Rem => "rem".to_string(),
        Op::Compare => "cmp".to_string(),

        Op::Select(bank) => format!("select {}", bank),
        Op::Pop(reg) => format!("pop {}", reg.name()),
        Op::Push(reg) => format!("push {}", reg.name()),
        Op::PushConst(value) => format!("push {}", value),
        Op::PushFront(reg) => format!("push_front {}", reg.name()),
        Op::PushTo { reg, bank } => format!("push_to {} {}", reg.name(), bank),
        Op::Dup => "dup".to_string(),
        Op::Swap => "swap".to_string(),
        Op::Drop => "drop".to_string(),

        Op::PrintDecimal => "print_dec".to_string(),
        Op::PrintChar => "print_char".to_string(),
        Op::ReadDecimal => "read_dec".to_string(),
        Op::ReadChar => "read_char".to_string(),

        Op::Jump(target) => format!("jmp {}", label(target)),
        Op::JumpIfNonZero(target) => format!("jnz {}", label(target)),
        Op::JumpIfSizeBelow { min, target } => format!("jlt {} {}", min, label(target)),
        Op::JumpIfSizeAtLeast { min, target } => format!("jge {} {}", min, label(target)),
    }
}
