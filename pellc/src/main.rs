#[macro_use]
extern crate clap;

use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Arg;

#[derive(Debug)]
enum Error {
    Compile(pellc::Error),
    Read(io::Error, PathBuf),
    Write(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Compile(err) => write!(f, "{}", err),
            Error::Read(err, path) => {
                write!(f, "reading file \"{}\" failed: {}", path.display(), err)
            }
            Error::Write(err) => write!(f, "writing output failed: {}", err),
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the source file to compile")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("lex")
                .short("l")
                .help("Print the token listing instead of compiling"),
        )
        .arg(
            Arg::with_name("unparse")
                .short("u")
                .conflicts_with("lex")
                .help("Pretty-print the parsed program instead of compiling"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let lex_only = matches.is_present("lex");
    let unparse_only = matches.is_present("unparse");

    if let Err(err) = run(input, lex_only, unparse_only) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run(input: &str, lex_only: bool, unparse_only: bool) -> Result<(), Error> {
    let path = PathBuf::from(input);
    let source = fs::read_to_string(&path).map_err(|err| Error::Read(err, path))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if lex_only {
        let tokens = pellc::tokens(input, &source).map_err(Error::Compile)?;
        return pellc::write_listing(&mut out, input, &tokens).map_err(Error::Write);
    }

    let mut program = pellc::parse_program(input, &source).map_err(Error::Compile)?;

    if unparse_only {
        pellc::unparse_program(&mut out, &program).map_err(Error::Write)?;
        pellc::check_program(&mut program).map_err(Error::Compile)?;
        return Ok(());
    }

    pellc::check_program(&mut program).map_err(Error::Compile)?;
    let code = pellc::gen_program(&program);
    pcodefile::write(&mut out, &code).map_err(Error::Write)?;
    out.flush().map_err(Error::Write)
}
