use gatework::Computer;
use getopts::Options;
use std::env;
use std::path::Path;
use std::process::exit;

const DEFAULT_MAX_CYCLES: usize = 10_000;

fn print_usage(opts: &Options) {
    let brief = "Usage: gatework [OPTIONS] PROGRAM";
    print!("{}", opts.usage(brief));
}

/// Parse and validate command line options, returning the `Matches`
/// object containing option information.
fn parse_options() -> getopts::Matches {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::new();

    opts.optflag("r", "run", "run to halt without prompting");
    opts.optopt(
        "m",
        "max-cycles",
        &format!("cycle limit for --run (default: {})", DEFAULT_MAX_CYCLES),
        "N",
    );
    opts.optflag("h", "help", "display this help and exit");
    opts.optflag("", "version", "output version information and exit");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            eprintln!("gatework: {}\n", f);
            print_usage(&opts);
            exit(1);
        }
    };

    if matches.opt_present("help") {
        print_usage(&opts);
        exit(0);
    }

    if matches.opt_present("version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        exit(0);
    }

    if matches.free.is_empty() {
        eprintln!("gatework: no program file\n");
        print_usage(&opts);
        exit(1);
    }

    matches
}

fn main() {
    env_logger::init();
    let matches = parse_options();

    let max_cycles = match matches.opt_str("max-cycles") {
        Some(n) => match n.parse() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("gatework: invalid cycle count: {}", n);
                exit(1);
            }
        },
        None => DEFAULT_MAX_CYCLES,
    };

    let mut computer = Computer::new();
    if let Err(e) = computer.load_program(Path::new(&matches.free[0])) {
        eprintln!("gatework: {}", e);
        exit(1);
    }

    if matches.opt_present("run") {
        let cycles = computer.run_to_halt(max_cycles);
        println!("ran {} cycles", cycles);
        computer.print_state();
        if computer.is_running() {
            eprintln!("gatework: cycle limit reached before HALT");
        }
    } else {
        computer.run_interactive();
    }
}
