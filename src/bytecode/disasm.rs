use crate::bytecode::{BytecodeProgram, Op, Target};
use std::collections::BTreeMap;

/// Print disassembly of a bytecode program
pub fn print_bc(bc: &BytecodeProgram) {
    println!("=== BYTECODE PROGRAM ===");
    println!(" {} instructions, {} labels\n", bc.len(), bc.labels.len());
    print!("{}", disassemble(bc));
}

/// Return disassembly as a String
///
/// Label names are printed above the instruction they point at; `►` marks
/// instructions some jump or call lands on.
pub fn disassemble(bc: &BytecodeProgram) -> String {
    let labels = labels_by_address(bc);
    let jump_targets = collect_jump_targets(&bc.code);
    let mut output = String::new();

    for (ip, op) in bc.code.iter().enumerate() {
        if let Some(names) = labels.get(&ip) {
            for name in names {
                output.push_str(&format!("{}:\n", name));
            }
        }

        if jump_targets.contains(&ip) {
            output.push_str("      ┌──────────────────────────────────\n");
        }

        output.push_str(&format!("{:04} ", ip));

        if jump_targets.contains(&ip) {
            output.push_str("► ");
        } else {
            output.push_str("  ");
        }

        output.push_str(&format_op_string(op, &labels));
        output.push('\n');
    }

    output
}

/// Address -> label names bound there, sorted for stable output.
fn labels_by_address(bc: &BytecodeProgram) -> BTreeMap<usize, Vec<&str>> {
    let mut by_addr: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (name, addr) in &bc.labels {
        by_addr.entry(*addr).or_default().push(name);
    }
    for names in by_addr.values_mut() {
        names.sort_unstable();
    }
    by_addr
}

fn collect_jump_targets(ops: &[Op]) -> Vec<usize> {
    let mut targets = Vec::new();

    for op in ops {
        if let Some(Target::Addr(addr)) = op.target() {
            if !targets.contains(addr) {
                targets.push(*addr);
            }
        }
    }

    targets
}

fn format_op_string(op: &Op, labels: &BTreeMap<usize, Vec<&str>>) -> String {
    match op {
        Op::Push(n) => format!("{:<6}{}", op.mnemonic(), n),
        Op::Load(name) | Op::Store(name) => format!("{:<6}{}", op.mnemonic(), name),

        Op::Jmp(target) | Op::Jz(target) | Op::Jnz(target) | Op::Call(target) => match target {
            Target::Addr(addr) => match labels.get(addr) {
                Some(names) => format!("{:<6}→ {:04} ({})", op.mnemonic(), addr, names.join(", ")),
                None => format!("{:<6}→ {:04}", op.mnemonic(), addr),
            },
            Target::Label(name) => format!("{:<6}{} (unresolved)", op.mnemonic(), name),
        },

        _ => op.mnemonic().to_string(),
    }
}
