//! # Disassembler Tests

use pretty_assertions::assert_eq;
use tvm_core::isa::OpCode;
use tvm_core::isa::disasm::disassemble;

use crate::common::builder::{c, inst, m, r, s};

#[test]
fn test_operand_forms() {
    assert_eq!(inst(OpCode::Mov, &[r(1), c(4)]).to_string(), "Mov r1, #4");
    assert_eq!(inst(OpCode::Add, &[m(2), r(3)]).to_string(), "Add [r2], r3");
    assert_eq!(inst(OpCode::Jlt, &[s(-3)]).to_string(), "Jlt #-3");
    assert_eq!(inst(OpCode::Ret, &[]).to_string(), "Ret");
}

#[test]
fn test_listing_is_numbered() {
    let listing = disassemble(&[inst(OpCode::Noop, &[]), inst(OpCode::Exit, &[c(0)])]);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("   0: Noop"));
    assert!(lines[1].starts_with("   1: Exit #0"));
}
