#![forbid(unsafe_code)]
use std::path::PathBuf;
use std::{env, ffi, fs, io, io::Read, process};

use zessl::{decode, encode, Padding};

fn main() -> CodingResult {
    CodingResult::catch_panic(|| {
        let flags = Flags::from_args(env::args_os()).unwrap_or_else(|ParamError| explain());
        run_coding(flags)
    })
}

fn run_coding(flags: Flags) -> Result<(), io::Error> {
    let out: Box<dyn io::Write> = match flags.output {
        Output::File(file) => Box::new(fs::File::create(file)?),
        Output::Stdout => Box::new(io::stdout().lock()),
    };

    match flags.operation {
        Operation::Encode => {
            // The match search needs the whole input at hand.
            let data = match flags.input {
                Input::File(file) => fs::read(file)?,
                Input::Stdin => {
                    let mut data = vec![];
                    io::stdin().lock().read_to_end(&mut data)?;
                    data
                }
            };

            let mut encoder = encode::Encoder::with_padding(flags.padding);
            encoder.into_stream(out).encode(&data).status
        }
        Operation::Decode => {
            let mut decoder = decode::Decoder::new();
            let status = match flags.input {
                Input::File(file) => {
                    let data = fs::File::open(file)?;
                    let file = io::BufReader::with_capacity(1 << 26, data);
                    decoder.into_stream(out).decode_all(file).status
                }
                Input::Stdin => {
                    let input = io::BufReader::with_capacity(1 << 26, io::stdin());
                    decoder.into_stream(out).decode_all(input).status
                }
            };

            // Padded streams routinely end a few bytes into a token; the
            // short result is the expected one.
            match status {
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(()),
                other => other,
            }
        }
    }
}

struct Flags {
    input: Input,
    output: Output,
    operation: Operation,
    padding: Padding,
}

struct ParamError;

#[derive(Debug)]
enum Input {
    File(PathBuf),
    Stdin,
}

#[derive(Debug)]
enum Output {
    File(PathBuf),
    Stdout,
}

#[derive(Debug)]
enum Operation {
    Encode,
    Decode,
}

fn explain<T>() -> T {
    println!(
        "Usage: lzss [-d] [-p|-e] [-o <file>] <file>\n\
        Arguments:\n\
        -d\t operation decode (default is encode)\n\
        -p\t do not pad encoded output to multiples of 16 bytes\n\
        -e\t pad with no-op tokens so decoding yields the exact length\n\
        -o <file>\toutput filepath, stdout when absent\n\
        <file>\tfilepath or '-' for stdin"
    );
    process::exit(1);
}

fn command() -> clap::Command<'static> {
    clap::Command::new("zessl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interact with lzss binary data")
        .arg(
            clap::Arg::new("decode")
                .short('d')
                .long("--decode")
                .takes_value(false),
        )
        .arg(
            clap::Arg::new("no_pad")
                .short('p')
                .long("--no-pad")
                .takes_value(false),
        )
        .arg(
            clap::Arg::new("exact")
                .short('e')
                .long("--exact")
                .takes_value(false),
        )
        .group(
            clap::ArgGroup::new("padding")
                .args(&["no_pad", "exact"])
                .multiple(false),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("--output")
                .takes_value(true)
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
        .arg(
            clap::Arg::new("file")
                .default_value("-")
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
}

impl Flags {
    fn from_args(mut args: impl Iterator<Item = ffi::OsString>) -> Result<Self, ParamError> {
        let matches = command().get_matches_from(args.by_ref());

        let operation = if matches.contains_id("decode") {
            Operation::Decode
        } else {
            Operation::Encode
        };

        let padding = if matches.contains_id("exact") {
            Padding::Exact
        } else if matches.contains_id("no_pad") {
            Padding::None
        } else {
            Padding::Zeros
        };

        let input = match matches.get_one::<PathBuf>("file") {
            None => Input::Stdin,
            Some(p) if *p == PathBuf::from("-") => Input::Stdin,
            Some(p) => Input::File(p.clone()),
        };

        let output = match matches.get_one::<PathBuf>("output") {
            None => Output::Stdout,
            Some(p) => Output::File(p.clone()),
        };

        Ok(Flags {
            input,
            output,
            operation,
            padding,
        })
    }
}

enum CodingResult {
    Ok,
    Err(io::Error),
    Panic,
}

impl CodingResult {
    fn catch_panic(op: fn() -> Result<(), io::Error>) -> Self {
        std::panic::catch_unwind(|| match op() {
            Ok(()) => CodingResult::Ok,
            Err(err) => CodingResult::Err(err),
        })
        .unwrap_or(CodingResult::Panic)
    }
}

impl std::process::Termination for CodingResult {
    fn report(self) -> std::process::ExitCode {
        match self {
            CodingResult::Ok => std::process::ExitCode::SUCCESS,
            CodingResult::Err(err) => {
                eprintln!("{}", err);
                std::process::ExitCode::FAILURE
            }
            CodingResult::Panic => {
                eprintln!(
                    "The process failed irrecoverably! This should never happen and is a bug."
                );
                eprintln!("If you know what this means, please report it to:");
                eprintln!("	<{}>", env!("CARGO_PKG_REPOSITORY"));
                std::process::ExitCode::from(128)
            }
        }
    }
}
