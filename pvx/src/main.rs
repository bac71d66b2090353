#[macro_use]
extern crate clap;

use std::process;

use clap::Arg;
use pvm::ExitCode;

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("PROGRAM")
                .help("Sets the instruction file to run")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("no_trace")
                .short("n")
                .help("Suppress tracing output"),
        )
        .get_matches();

    let program = matches.value_of("PROGRAM").unwrap();
    let tracing = !matches.is_present("no_trace");

    match pvx::run_code_file(program, tracing) {
        Ok((_, ExitCode::Halted)) => {}
        Ok((_, ExitCode::Fault(fault))) => {
            eprintln!("{}", fault);
            process::exit(1);
        }
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}
