//! Code sequences under construction. Most elements are finished
//! instructions; a call whose target procedure has not been placed yet stays
//! pending, holding the procedure's label until the fix-up in [`resolve`].

use pvm::constants::LINKS_SIZE;
use pvm::{Instruction, Opcode, Word};

use crate::label::Label;

#[derive(Clone, PartialEq, Debug)]
pub enum Code {
    Complete(Instruction),
    PendingCall(Label),
}

pub type CodeSeq = Vec<Code>;

impl Code {
    pub fn instr(op: Opcode, m: i32) -> Code {
        Code::Complete(Instruction::new(op, m))
    }

    /// A call to the procedure behind `label`: the address is captured now
    /// if the label is already set, and left for fix-up otherwise.
    pub fn cal(label: &Label) -> Code {
        if label.is_set() {
            Code::instr(Opcode::CAL, i32::from(label.read()))
        } else {
            Code::PendingCall(label.clone())
        }
    }

    pub fn lit(value: Word) -> Code {
        Code::instr(Opcode::LIT, i32::from(value))
    }

    pub fn inc(n: i32) -> Code {
        Code::instr(Opcode::INC, n)
    }

    pub fn jmp(offset: i32) -> Code {
        Code::instr(Opcode::JMP, offset)
    }

    pub fn jpc(offset: i32) -> Code {
        Code::instr(Opcode::JPC, offset)
    }

    /// Load through the frame pointer on top of the stack; `offset` is the
    /// slot index within the frame, past the link words.
    pub fn lod(offset: u32) -> Code {
        Code::instr(Opcode::LOD, LINKS_SIZE + offset as i32)
    }

    /// Store through the frame pointer below the value on top of the stack.
    pub fn sto(offset: u32) -> Code {
        Code::instr(Opcode::STO, LINKS_SIZE + offset as i32)
    }
}

/// Code to leave on top of the stack the base of the activation record
/// `levels_outward` static links away from the current one: push BP, then
/// follow one static link per level.
pub fn compute_fp(levels_outward: u32) -> CodeSeq {
    let mut seq = vec![Code::instr(Opcode::PBP, 0)];
    for _ in 0..levels_outward {
        seq.push(Code::instr(Opcode::PSI, 0));
    }
    seq
}

/// Replaces every pending call with a CAL instruction carrying its label's
/// address. Every label must be set by now; an unset one is a compiler bug
/// and panics.
pub fn resolve(seq: CodeSeq) -> Vec<Instruction> {
    seq.into_iter()
        .map(|code| match code {
            Code::Complete(instr) => instr,
            Code::PendingCall(label) => Instruction::new(Opcode::CAL, i32::from(label.read())),
        })
        .collect()
}
