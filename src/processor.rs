mod logic;

use std::fmt;
use std::io;
use std::io::{Read, Write};

use self::logic::TickResult;
use crate::instruction::{write_program, Instruction};
use crate::stack::Stack;
use crate::Address;

/// Why a program stopped running.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExitCode {
    /// A HLT instruction was executed (normal shutdown).
    Halted,
    /// A runtime fault; the program's results are meaningless.
    Fault(Fault),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FaultKind {
    ZeroDivide,
    BadOpcode,
    StackBounds,
    AddressOutOfRange,
    BadCallTarget,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            FaultKind::ZeroDivide => "division or modulus by zero",
            FaultKind::BadOpcode => "illegal opcode",
            FaultKind::StackBounds => "stack bounds violated",
            FaultKind::AddressOutOfRange => "stack address out of range",
            FaultKind::BadCallTarget => "call target outside the program",
        })
    }
}

/// A runtime fault, carrying enough of the machine state for a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fault {
    pub kind: FaultKind,
    pub instr: Instruction,
    pub pc: Address,
    pub bp: Address,
    pub sp: Address,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "VM fault: {} at PC {} ({} {}); BP {} SP {}",
            self.kind,
            self.pc,
            self.instr.mnemonic(),
            self.instr.m,
            self.bp,
            self.sp
        )
    }
}

impl std::error::Error for Fault {}

/// The fetch/execute machine. Owns the runtime stack and the tracing flag;
/// the code array and the I/O streams are supplied per run.
pub struct Processor {
    stack: Stack,
    tracing: bool,
}

impl Processor {
    pub fn new(tracing: bool) -> Processor {
        Processor {
            stack: Stack::new(),
            tracing,
        }
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Runs the program to completion. Bytes read by CHI come from `input`,
    /// bytes written by CHO go to `output`, and when tracing is enabled the
    /// program table and the per-step state go to `trace`.
    pub fn run<R, W, T>(
        &mut self,
        code: &[Instruction],
        input: &mut R,
        output: &mut W,
        trace: &mut T,
    ) -> io::Result<ExitCode>
    where
        R: Read,
        W: Write,
        T: Write,
    {
        let mut pc: i32 = 0;

        if self.tracing {
            write_program(trace, code)?;
            writeln!(trace, "Tracing ...")?;
            self.write_state(trace, pc)?;
        }

        if code.is_empty() {
            // Nothing at PC 0 to fetch.
            return Ok(self.fault(FaultKind::AddressOutOfRange, Instruction { op: 0, m: 0 }, 0));
        }

        loop {
            let instr = code[pc as usize];

            if self.tracing {
                write!(trace, "==> addr: ")?;
                instr.write_with_addr(trace, pc as usize)?;
            }

            let result =
                logic::tick(&mut self.stack, instr, pc as Address, code.len(), input, output)?;

            let new_pc = match result {
                TickResult::Next => pc + 1,
                TickResult::TraceOff => {
                    self.tracing = false;
                    pc + 1
                }
                TickResult::Jump(target) => target,
                TickResult::Stop(ExitCode::Halted) => {
                    if self.tracing {
                        self.write_state(trace, pc + 1)?;
                    }
                    return Ok(ExitCode::Halted);
                }
                TickResult::Stop(exit) => return Ok(exit),
            };

            if new_pc < 0 || new_pc as usize >= code.len() {
                return Ok(self.fault(FaultKind::AddressOutOfRange, instr, pc));
            }

            if self.tracing {
                self.write_state(trace, new_pc)?;
            }

            pc = new_pc;
        }
    }

    fn fault(&self, kind: FaultKind, instr: Instruction, pc: i32) -> ExitCode {
        ExitCode::Fault(Fault {
            kind,
            instr,
            pc: pc as Address,
            bp: self.stack.ar_base(),
            sp: self.stack.size(),
        })
    }

    /// One line of registers and one line with the stack slice `[BP..SP)`.
    fn write_state<T: Write>(&self, trace: &mut T, pc: i32) -> io::Result<()> {
        writeln!(
            trace,
            "PC: {} BP: {} SP: {}",
            pc,
            self.stack.ar_base(),
            self.stack.size()
        )?;
        write!(trace, "stack: ")?;
        let base = self.stack.ar_base() as usize;
        for (i, val) in self.stack.current_frame().iter().enumerate() {
            write!(trace, "S[{}]: {} ", base + i, val)?;
        }
        writeln!(trace)
    }
}

impl Default for Processor {
    fn default() -> Processor {
        Processor::new(true)
    }
}
