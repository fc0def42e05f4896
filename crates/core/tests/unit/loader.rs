//! # Program Loader Tests

use pretty_assertions::assert_eq;
use tvm_core::common::KernelError;
use tvm_core::common::constants::{FIRST_USER_PROCESS_ID, INSTRUCTION_SIZE};
use tvm_core::config::Config;
use tvm_core::core::Cpu;
use tvm_core::isa::{Instruction, OpCode};
use tvm_core::sim::Program;

use crate::common::builder::{ProgramBuilder, c, r};
use crate::common::harness::TestContext;

#[test]
fn test_program_from_json() {
    let json = r#"{
        "priority": 7,
        "global_data": [1, 2, 3],
        "instructions": [
            { "op": "Mov", "args": [{ "Register": 1 }, { "Memory": 2 }] },
            { "op": "Jne", "args": [{ "Signed": -1 }] },
            { "op": "Ret" }
        ]
    }"#;
    let program = Program::from_json(json).unwrap();
    assert_eq!(program.priority, 7);
    assert_eq!(program.global_data, vec![1, 2, 3]);
    let text: Vec<String> = program.instructions.iter().map(ToString::to_string).collect();
    assert_eq!(text, vec!["Mov r1, [r2]", "Jne #-1", "Ret"]);
}

#[test]
fn test_unknown_opcode_in_json_rejected() {
    let json = r#"{ "instructions": [{ "op": "Halt" }] }"#;
    assert!(matches!(
        Program::from_json(json),
        Err(KernelError::InvalidProgram(_))
    ));
}

#[test]
fn test_constant_destination_in_json_rejected() {
    let json = r#"{ "instructions": [{ "op": "Pop", "args": [{ "Constant": 1 }] }] }"#;
    assert_eq!(
        Program::from_json(json),
        Err(KernelError::ConstantDestination {
            opcode: OpCode::Pop,
            slot: 0
        })
    );
}

#[test]
fn test_code_is_serialized_into_code_block() {
    let mut ctx = TestContext::new();
    let program = ProgramBuilder::new()
        .op(OpCode::Mov, &[r(1), c(4)])
        .op(OpCode::Exit, &[r(1)])
        .build();
    let pid = ctx.load(program.clone());
    assert_eq!(pid, FIRST_USER_PROCESS_ID);

    let pcb = ctx.process(pid);
    assert_eq!(pcb.code_length, 2);
    assert_eq!(pcb.page_table.code.size(), program.code_size());

    let raw = pcb
        .page_table
        .code
        .read(&ctx.cpu.bus.ram, INSTRUCTION_SIZE, INSTRUCTION_SIZE)
        .unwrap();
    assert_eq!(Instruction::decode(&raw).unwrap(), program.instructions[1]);
}

#[test]
fn test_allocate_code_block_spans_pages() {
    let mut ctx = TestContext::new();
    let block = ctx.cpu.allocate_code_block(FIRST_USER_PROCESS_ID, 600).unwrap();
    assert_eq!(block.pages().len(), 3);
    assert_eq!(block.size(), 600);
}

#[test]
fn test_failed_load_releases_frames() {
    let mut config = Config::default();
    config.memory.frame_count = 4;
    config.memory.shared_frames = 0;
    let mut cpu = Cpu::new(&config).unwrap();
    let free = cpu.bus.ram.free_frames();
    assert_eq!(free, 2);

    let program = ProgramBuilder::new()
        .global_data(&[0; 16])
        .op(OpCode::Exit, &[c(0)])
        .build();
    assert_eq!(cpu.load(&program), Err(KernelError::OutOfMemory(16)));
    assert_eq!(cpu.bus.ram.free_frames(), free);
    assert!(cpu.ready.is_empty());
}

#[test]
fn test_empty_program_halts_immediately() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(Program::default());
    ctx.step(1);
    assert!(!ctx.process(pid).running);
}
