extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

use std::io::{BufRead, Write};

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use gmachine::assembler::listing;
use gmachine::{Machine, Word, DEFAULT_MEM_SIZE};

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tDebug: {}\n\tListing: {}\n\tMemory: {}\n\tInfile: {}",
        level_for(args.occurrences_of("verbose")),
        args.is_present("debug"),
        args.is_present("listing"),
        args.value_of("memory").unwrap_or("default"),
        args.value_of("INPUT").unwrap_or("None"),
    );

    let stdin = std::io::stdin();
    if let Err(err) = run(&args, stdin.lock(), std::io::stdout()) {
        fatal(err);
    }
}

/// Assembles the input file and runs it on a machine bound to `input` and
/// `output`. The error carries the message printed before exiting.
fn run<R: BufRead, W: Write>(args: &ArgMatches, input: R, output: W) -> Result<(), String> {
    // INPUT is required, clap exits before we get here without it.
    let ifile = args.value_of("INPUT").unwrap();
    let memory = parse_memory(args.value_of("memory"))?;

    let program = gmachine::assemble_file(ifile).map_err(|e| e.to_string())?;

    if args.is_present("listing") {
        eprintln!("{}", render_listing(&program));
    }

    let mut machine = Machine::with_io(input, output).with_memory_size(memory);
    machine.debug = args.is_present("debug");

    machine.load(&program)
        .and_then(|_| machine.run())
        .map_err(|e| e.to_string())
}

fn parse_memory(value: Option<&str>) -> Result<usize, String> {
    match value.map(str::parse::<usize>) {
        None => Ok(DEFAULT_MEM_SIZE),
        Some(Ok(words)) if words > 0 => Ok(words),
        Some(_) => Err("--memory must be a positive number of words".to_string()),
    }
}

/// Writes the error to stderr and exits with status 1.
fn fatal<T: std::fmt::Display>(err: T) -> ! {
    eprintln!("{}", err);
    std::process::exit(1)
}

fn render_listing(program: &[Word]) -> String {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for entry in listing(program) {
        let words: Vec<String> = entry.words.iter().map(|w| format!("0x{:04X}", w)).collect();
        grid.add(Cell::from(format!("0x{:04X}:", entry.address)));
        grid.add(Cell::from(entry.text));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(words.join(" ")));
    }

    grid.fit_into_columns(4).to_string()
}

fn process_arguments() -> ArgMatches<'static> {
    cli().get_matches()
}

fn cli() -> App<'static, 'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap_or("gmachine"))
        .version(option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"))
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap_or(""))
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap_or(""))
        .arg(Arg::with_name("INPUT")
            .help("Sets the source file to assemble and run")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("debug")
            .short("d")
            .long("debug")
            .takes_value(false)
            .help("prints the machine state before every instruction \
                   and waits for a line on STDIN"))
        .arg(Arg::with_name("memory")
            .short("m")
            .long("memory")
            .takes_value(true)
            .value_name("WORDS")
            .help("sets the machine's memory size in words"))
        .arg(Arg::with_name("listing")
            .short("l")
            .long("listing")
            .alias("show")
            .takes_value(false)
            .help("prints the assembled program to STDERR before running it"))
}

fn level_for(verbosity: u64) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn initialize_logging(verbosity: u64) {
    // STDOUT belongs to the running program.
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_for(verbosity))
        .chain(std::io::stderr())
        .apply().ok();
}
