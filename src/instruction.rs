use std::fmt;
use std::io;
use std::io::Write;

use num::FromPrimitive;
use num_derive::{FromPrimitive, ToPrimitive};

// The instruction set of the machine. Every instruction is a pair of an
// opcode and a single integer operand `m`, whose meaning depends on the
// opcode. The numeric order of the opcodes is part of the instruction-file
// format and must not change.

#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Opcode {
    //  Mnemonic | Effect (top of stack is stk[SP-1])
    //-----------+------------------------------------------------------------
    NOP, //      | Does nothing
    LIT, //      | Push m
    RTN, //      | Pop return address into PC, pop dynamic link into BP,
    //           | discard the static link
    CAL, //      | Push stk[BP] (static link), push BP (dynamic link),
    //           | push PC (already incremented), BP = old SP, PC = m
    POP, //      | Discard the top of the stack
    PSI, //      | a = pop; push stk[a]
    LOD, //      | a = pop; push stk[a + m]
    STO, //      | v = pop; a = pop; stk[a + m] = v
    INC, //      | SP += m (m may be negative)
    JMP, //      | PC = PC - 1 + m (relative to the jump's own address)
    JPC, //      | v = pop; if v != 0 then PC = PC - 1 + m
    CHO, //      | Write the low byte of the popped word to the output
    CHI, //      | Read one byte from the input and push it (-1 at EOF)
    HLT, //      | Stop execution
    NDB, //      | Disable tracing
    NEG, //      | Push -pop
    ADD, //      | b = pop; a = pop; push a + b
    SUB, //      | b = pop; a = pop; push a - b
    MUL, //      | b = pop; a = pop; push a * b
    DIV, //      | b = pop; a = pop; push a / b; b = 0 faults
    MOD, //      | b = pop; a = pop; push a mod b; b = 0 faults
    EQL, //      | b = pop; a = pop; push (a == b ? 1 : 0)
    NEQ, //      | b = pop; a = pop; push (a != b ? 1 : 0)
    LSS, //      | b = pop; a = pop; push (a < b ? 1 : 0)
    LEQ, //      | b = pop; a = pop; push (a <= b ? 1 : 0)
    GTR, //      | b = pop; a = pop; push (a > b ? 1 : 0)
    GEQ, //      | b = pop; a = pop; push (a >= b ? 1 : 0)
    PSP, //      | Push SP
    PBP, //      | Push BP
    PPC, //      | Push PC (already incremented)
    JMI, //      | PC = pop
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single machine instruction.
///
/// The opcode is kept as a raw integer so that programs read from a file can
/// carry an illegal opcode; the processor decodes it at dispatch time and
/// faults if it is out of range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub op: i32,
    pub m: i32,
}

impl Instruction {
    pub fn new(op: Opcode, m: i32) -> Instruction {
        Instruction {
            op: op as i32,
            m,
        }
    }

    /// Decodes the opcode, or `None` if it is not a legal opcode.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_i32(self.op)
    }

    /// The mnemonic for the opcode, or the raw number if it is illegal.
    pub fn mnemonic(&self) -> String {
        match self.opcode() {
            Some(op) => op.to_string(),
            None => self.op.to_string(),
        }
    }

    /// Writes the instruction as a row of the debugging table, prefixed with
    /// the address it is found at.
    pub fn write_with_addr<W: Write>(&self, out: &mut W, addr: usize) -> io::Result<()> {
        writeln!(out, "{:<5} {:<5} {:<5}", addr, self.mnemonic(), self.m)
    }
}

/// Formats the instruction in the VM's input format: the two integers
/// separated by whitespace.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:<5} {:<5}", self.op, self.m)
    }
}

/// Writes the heading of the instruction debugging table.
pub fn write_heading<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{:<5} {:<5} {:<5}", "Addr", "OP", "M")
}

/// Writes the whole program as a debugging table with addresses.
pub fn write_program<W: Write>(out: &mut W, code: &[Instruction]) -> io::Result<()> {
    write_heading(out)?;
    for (addr, instr) in code.iter().enumerate() {
        instr.write_with_addr(out, addr)?;
    }
    Ok(())
}
