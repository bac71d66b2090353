//! Runner for Pell VM programs: loads an instruction file (or compiles a
//! source file in-process) and executes it. Program output goes to stdout;
//! the execution trace, when enabled, goes to stderr.

use std::fmt;
use std::fs;
use std::io;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use pvm::{ExitCode, Instruction, Processor};

#[derive(Debug)]
pub enum Error {
    Io(io::Error, PathBuf),
    Run(io::Error),
    Compile(pellc::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err, path) => {
                write!(f, "reading file \"{}\" failed: {}", path.display(), err)
            }
            Error::Run(err) => write!(f, "I/O failed while running: {}", err),
            Error::Compile(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

/// Runs an already-loaded program against the given streams.
pub fn run_program<R, W, T>(
    code: &[Instruction],
    tracing: bool,
    input: &mut R,
    output: &mut W,
    trace: &mut T,
) -> io::Result<(Processor, ExitCode)>
where
    R: Read,
    W: Write,
    T: Write,
{
    let mut processor = Processor::new(tracing);
    let exit_code = processor.run(code, input, output, trace)?;
    Ok((processor, exit_code))
}

fn run_std(code: &[Instruction], tracing: bool) -> Result<(Processor, ExitCode), Error> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    let result = run_program(
        code,
        tracing,
        &mut stdin.lock(),
        &mut stdout.lock(),
        &mut stderr.lock(),
    );
    result.map_err(Error::Run)
}

/// Loads an instruction file and runs it on the standard streams.
pub fn run_code_file<P: AsRef<Path>>(
    path: P,
    tracing: bool,
) -> Result<(Processor, ExitCode), Error> {
    let code = pcodefile::read_file(&path)
        .map_err(|err| Error::Io(err, path.as_ref().to_owned()))?;
    run_std(&code, tracing)
}

/// Compiles a source file in-process and runs it immediately.
pub fn run_source<P: AsRef<Path>>(path: P, tracing: bool) -> Result<(Processor, ExitCode), Error> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|err| Error::Io(err, path.to_owned()))?;
    let name = path.to_string_lossy();
    let code = pellc::compile(&name, &source).map_err(Error::Compile)?;
    run_std(&code, tracing)
}
