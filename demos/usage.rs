//! Analyse an objdump listing and print the stack table and the call tree.
//!
//! ```text
//! objdump -d prog > prog.lst
//! cargo run --example usage -- prog.lst [prog | x86_64]
//! ```
//!
//! Without a second argument the target is taken from the `file format`
//! line of the listing.

use stacklimit as sl;

use std::{
    fs::File,
    io::{self, BufReader, BufRead},
    path::PathBuf,
    str::FromStr,
};

use sl::output::TableConf;


fn target_of_listing(listing: &PathBuf) -> Option<sl::Target>
{
    let file = File::open(listing).ok()?;
    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .find_map(|line| line.split_once("file format").map(|(_, f)| f.trim().to_string()))
        .and_then(|format| sl::Target::from_str(&format).ok())
}

fn main()
{
    let _ = env_logger::builder().try_init();

    let mut args = std::env::args().skip(1);
    let listing = match args.next()
    {
        Some(path) => PathBuf::from(path),
        None       => {
            eprintln!("usage: usage <listing> [<elf> | <target>]");
            std::process::exit(2);
        },
    };

    let target = match args.next()
    {
        Some(arg) if PathBuf::from(&arg).is_file() => match sl::input::load_target(PathBuf::from(&arg))
        {
            Ok(inp) => Some(inp.target),
            Err(e)  => {
                eprintln!("Error loading ELF!");
                eprintln!("{}", e);
                std::process::exit(1);
            },
        },
        Some(arg) => sl::Target::from_str(&arg).ok(),
        None      => target_of_listing(&listing),
    };

    let target = match target
    {
        Some(target) => target,
        None         => {
            eprintln!("Unknown target, pick one of {:?}", sl::Target::ALL.map(|t| t.name()));
            std::process::exit(1);
        },
    };
    println!("Target is {}", target);

    let mut state = match sl::State::new(target, sl::Config::default())
    {
        Ok(state) => state,
        Err(e)    => {
            eprintln!("{}", e);
            std::process::exit(1);
        },
    };

    let parsed = File::open(&listing)
        .map_err(sl::Error::from)
        .and_then(|file| state.parse(BufReader::new(file)));
    if let Err(e) = parsed
    {
        eprintln!("Error reading {:?}: {}", listing, e);
        std::process::exit(1);
    }

    state.calculate_stack();

    let stdout = io::stdout();
    let conf = TableConf { show_header: true, show_section: true };
    let shown = state
        .output_table(stdout.lock(), &conf)
        .and_then(|_| {
            println!();
            state.output_tree(stdout.lock())
        });
    if let Err(e) = shown
    {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    println!();
    println!("Stack limit: {} bytes{}", state.limit(), if state.precise { "" } else { " (lower bound)" });
}
