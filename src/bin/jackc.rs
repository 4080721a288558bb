//! jackc command-line driver
//!
//! Compiles a single `.jack` file or every `.jack` file in a directory,
//! writing `Name.vm` for each class.

use std::path::PathBuf;
use std::process;

use jackc::driver::{self, Outputs};
use log::LevelFilter;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "jackc", about = "Compile Jack classes to VM code")]
struct Opt {
    /// A .jack file or a directory containing .jack files
    #[structopt(parse(from_os_str))]
    path: PathBuf,

    /// Write output files here instead of next to each source
    #[structopt(long, parse(from_os_str))]
    out_dir: Option<PathBuf>,

    /// Also write each file's token stream as NameT.xml
    #[structopt(long)]
    tokens: bool,

    /// Also write each file's parse tree as Name.xml
    #[structopt(long)]
    xml: bool,

    /// Verbose logging (-v debug, -vv trace); RUST_LOG overrides
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let sources = match driver::collect_sources(&opt.path) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if sources.is_empty() {
        eprintln!("Error: no .jack files in {}", opt.path.display());
        process::exit(1);
    }

    let outputs = Outputs {
        out_dir: opt.out_dir.clone(),
        tokens: opt.tokens,
        parse_tree: opt.xml,
    };

    let mut failed = 0;
    for source in &sources {
        if let Err(e) = driver::compile_file(source, &outputs) {
            eprintln!("Error: {}: {}", source.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        eprintln!("{} of {} files failed to compile", failed, sources.len());
        process::exit(1);
    }
}
