//! The VM's input format: one instruction per line, the opcode number and
//! the operand separated by whitespace. Reading consumes integer pairs and
//! stops at EOF, at a malformed pair, or at the first pair whose opcode is
//! out of range, so trailing garbage is ignored rather than rejected.

use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use num_traits::FromPrimitive;
use pvm::{Instruction, Opcode};

pub fn read<R: Read>(reader: &mut R) -> std::io::Result<Vec<Instruction>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let mut code = Vec::new();
    let mut fields = text.split_whitespace();
    while let Some(op_text) = fields.next() {
        let op = match op_text.parse::<i32>() {
            Ok(op) => op,
            Err(_) => break,
        };
        let m = match fields.next().map(str::parse::<i32>) {
            Some(Ok(m)) => m,
            _ => break,
        };
        if Opcode::from_i32(op).is_none() {
            break;
        }
        code.push(Instruction { op, m });
    }

    Ok(code)
}

pub fn write<W: Write>(writer: &mut W, code: &[Instruction]) -> std::io::Result<()> {
    for instr in code {
        writeln!(writer, "{}", instr)?;
    }
    Ok(())
}

pub trait ReadCodeExt: Read + Sized {
    fn read_code(&mut self) -> std::io::Result<Vec<Instruction>> {
        read(self)
    }
}

impl<R: Read + Sized> ReadCodeExt for R {}

pub trait WriteCodeExt: Write + Sized {
    fn write_code(&mut self, code: &[Instruction]) -> std::io::Result<()> {
        write(self, code)
    }
}

impl<W: Write + Sized> WriteCodeExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<Instruction>> {
    BufReader::new(File::open(path)?).read_code()
}

pub fn write_file<P: AsRef<Path>>(path: P, code: &[Instruction]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_code(code)
}

#[cfg(test)]
mod test;
