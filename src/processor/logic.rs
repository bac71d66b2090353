use std::io;
use std::io::{Read, Write};
use std::num::Wrapping;

use super::{ExitCode, Fault, FaultKind};
use crate::instruction::{Instruction, Opcode};
use crate::stack::{Stack, StackError};
use crate::{Address, Word};

pub enum TickResult {
    Next,
    Jump(i32),
    Stop(ExitCode),
    TraceOff,
}

fn fault(kind: FaultKind, instr: Instruction, pc: Address, stack: &Stack) -> TickResult {
    TickResult::Stop(ExitCode::Fault(Fault {
        kind,
        instr,
        pc,
        bp: stack.ar_base(),
        sp: stack.size(),
    }))
}

fn stack_fault(err: StackError, instr: Instruction, pc: Address, stack: &Stack) -> TickResult {
    let kind = match err {
        StackError::Bounds => FaultKind::StackBounds,
        StackError::OutOfRange(_) => FaultKind::AddressOutOfRange,
    };
    fault(kind, instr, pc, stack)
}

/// Executes one instruction. `pc` is the address the instruction was fetched
/// from; relative jumps and the saved return address are computed from the
/// already-incremented `pc + 1`, so `JMP m` targets `pc + m`.
pub fn tick<R, W>(
    stack: &mut Stack,
    instr: Instruction,
    pc: Address,
    code_len: usize,
    input: &mut R,
    output: &mut W,
) -> io::Result<TickResult>
where
    R: Read,
    W: Write,
{
    macro_rules! try_stack {
        ($e:expr) => {
            match $e {
                Ok(val) => val,
                Err(err) => return Ok(stack_fault(err, instr, pc, stack)),
            }
        };
    }

    macro_rules! binary_op {
        (|$a:ident, $b:ident| $result:expr) => {{
            let $b = Wrapping(try_stack!(stack.pop()));
            let $a = Wrapping(try_stack!(stack.pop()));
            try_stack!(stack.push($result));
        }};
    }

    let op_code = match instr.opcode() {
        Some(op_code) => op_code,
        None => return Ok(fault(FaultKind::BadOpcode, instr, pc, stack)),
    };

    let next = i32::from(pc) + 1;
    let m = instr.m;

    let result = match op_code {
        Opcode::NOP => TickResult::Next,

        Opcode::LIT => {
            try_stack!(stack.push(m as Word));
            TickResult::Next
        }

        Opcode::RTN => {
            let ret_addr = try_stack!(stack.ret());
            TickResult::Jump(i32::from(ret_addr))
        }

        Opcode::CAL => {
            if m < 0 || m as usize >= code_len {
                return Ok(fault(FaultKind::BadCallTarget, instr, pc, stack));
            }
            try_stack!(stack.call(next as Address));
            TickResult::Jump(m)
        }

        Opcode::POP => {
            try_stack!(stack.pop());
            TickResult::Next
        }

        Opcode::PSI => {
            let addr = try_stack!(stack.pop());
            let val = try_stack!(stack.fetch(i32::from(addr)));
            try_stack!(stack.push(val));
            TickResult::Next
        }

        Opcode::LOD => {
            let addr = try_stack!(stack.pop());
            let val = try_stack!(stack.fetch(i32::from(addr) + m));
            try_stack!(stack.push(val));
            TickResult::Next
        }

        Opcode::STO => {
            let val = try_stack!(stack.pop());
            let addr = try_stack!(stack.pop());
            try_stack!(stack.assign(i32::from(addr) + m, val));
            TickResult::Next
        }

        Opcode::INC => {
            try_stack!(stack.allocate(m));
            TickResult::Next
        }

        Opcode::JMP => TickResult::Jump(next - 1 + m),

        Opcode::JPC => {
            let top = try_stack!(stack.pop());
            if top != 0 {
                TickResult::Jump(next - 1 + m)
            } else {
                TickResult::Next
            }
        }

        Opcode::CHO => {
            let val = try_stack!(stack.pop());
            output.write_all(&[val as u8])?;
            TickResult::Next
        }

        Opcode::CHI => {
            let mut buf = [0u8; 1];
            let val = match input.read(&mut buf)? {
                0 => -1,
                _ => Word::from(buf[0]),
            };
            try_stack!(stack.push(val));
            TickResult::Next
        }

        Opcode::HLT => TickResult::Stop(ExitCode::Halted),

        Opcode::NDB => TickResult::TraceOff,

        Opcode::NEG => {
            let val = try_stack!(stack.pop());
            try_stack!(stack.push(val.wrapping_neg()));
            TickResult::Next
        }

        Opcode::ADD => {
            binary_op!(|a, b| (a + b).0);
            TickResult::Next
        }

        Opcode::SUB => {
            binary_op!(|a, b| (a - b).0);
            TickResult::Next
        }

        Opcode::MUL => {
            binary_op!(|a, b| (a * b).0);
            TickResult::Next
        }

        Opcode::DIV => {
            let divisor = Wrapping(try_stack!(stack.pop()));
            let dividend = Wrapping(try_stack!(stack.pop()));
            if divisor.0 == 0 {
                return Ok(fault(FaultKind::ZeroDivide, instr, pc, stack));
            }
            try_stack!(stack.push((dividend / divisor).0));
            TickResult::Next
        }

        Opcode::MOD => {
            let divisor = Wrapping(try_stack!(stack.pop()));
            let dividend = Wrapping(try_stack!(stack.pop()));
            if divisor.0 == 0 {
                return Ok(fault(FaultKind::ZeroDivide, instr, pc, stack));
            }
            try_stack!(stack.push((dividend % divisor).0));
            TickResult::Next
        }

        Opcode::EQL => {
            binary_op!(|a, b| set_if(a == b));
            TickResult::Next
        }

        Opcode::NEQ => {
            binary_op!(|a, b| set_if(a != b));
            TickResult::Next
        }

        Opcode::LSS => {
            binary_op!(|a, b| set_if(a.0 < b.0));
            TickResult::Next
        }

        Opcode::LEQ => {
            binary_op!(|a, b| set_if(a.0 <= b.0));
            TickResult::Next
        }

        Opcode::GTR => {
            binary_op!(|a, b| set_if(a.0 > b.0));
            TickResult::Next
        }

        Opcode::GEQ => {
            binary_op!(|a, b| set_if(a.0 >= b.0));
            TickResult::Next
        }

        Opcode::PSP => {
            let size = stack.size();
            try_stack!(stack.push(size as Word));
            TickResult::Next
        }

        Opcode::PBP => {
            let base = stack.ar_base();
            try_stack!(stack.push(base as Word));
            TickResult::Next
        }

        Opcode::PPC => {
            try_stack!(stack.push(next as Word));
            TickResult::Next
        }

        Opcode::JMI => {
            let target = try_stack!(stack.pop());
            TickResult::Jump(i32::from(target))
        }
    };

    Ok(result)
}

fn set_if(condition: bool) -> Word {
    if condition {
        1
    } else {
        0
    }
}
