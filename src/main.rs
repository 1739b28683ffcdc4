use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::process;

use obsidian::error::ErrorFormat;
use obsidian::runner::{self, Mode, Options};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage: obsidian [options] file...
Options:
  --help                   Display this information.
  --help={optimizers|warnings|target}
                           Display specific types of command line options.
  --version                Display compiler version information.
  --dump-tokens            Print the token stream instead of the syntax tree.
  --check                  Parse the file and print nothing on success.
  --error-format=<plain|pretty>
                           Choose how diagnostics are rendered.

Report bugs at <https://github.com/obsidian-language/obsidian/issues>";

fn main() {
    env_logger::init();

    // Help and version are hand-written to keep the compiler's own format.
    let matches = Command::new("obsidian")
        .about("Front end of the Obsidian compiler")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .short('h')
                .long("help")
                .value_name("TOPIC")
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value(""),
        )
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-tokens")
                .long("dump-tokens")
                .help("Print the token stream instead of the syntax tree")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Parse only")
                .action(ArgAction::SetTrue)
                .conflicts_with("dump-tokens"),
        )
        .arg(
            Arg::new("error-format")
                .long("error-format")
                .value_name("FORMAT")
                .value_parser(value_parser!(ErrorFormat))
                .default_value("plain"),
        )
        .arg(
            Arg::new("file")
                .help("The source file to compile")
                .value_name("FILE")
                .index(1),
        )
        .get_matches();

    if let Some(topic) = matches.get_one::<String>("help") {
        print_help(topic);
        return;
    }

    if matches.get_flag("version") {
        println!("obsidian version {} ({} {})", VERSION, std::env::consts::OS, VERSION);
        return;
    }

    let mode = if matches.get_flag("dump-tokens") {
        Mode::DumpTokens
    } else if matches.get_flag("check") {
        Mode::Check
    } else {
        Mode::DumpAst
    };
    let options = Options {
        mode,
        error_format: matches
            .get_one::<ErrorFormat>("error-format")
            .copied()
            .unwrap_or_default(),
    };

    match matches.get_one::<String>("file") {
        Some(path) => run_file(path, &options),
        None => fatal("no input file"),
    }
}

fn print_help(topic: &str) {
    match topic {
        "" => println!("{}", USAGE),
        "optimizers" => print!(
            "The following options control optimizations:\n -O<number>        Set optimization level to <number>\n"
        ),
        "warnings" => println!("The following options control compiler warning messages:"),
        "target" => println!("The following options are target specific:"),
        other => fatal(&format!(
            "unrecognized argument to '--help=' option: '{}'",
            other
        )),
    }
}

fn run_file(path: &str, options: &Options) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => fatal(&format!("cannot read '{}': {}", path, e)),
    };

    if !runner::run(&source, path, options) {
        process::exit(1);
    }
}

fn fatal(message: &str) -> ! {
    eprintln!("obsidian: error: {}", message);
    process::exit(1);
}
