use clap::{App, Arg};
use log::LevelFilter;
use std::path::Path;

use uncial::build::build_site;
use uncial::config::Config;

fn main() {
    let matches = App::new("uncial")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a personal blog from JSON article sources")
        .arg(
            Arg::with_name("working_dir")
                .help("The project directory (defaults to the current directory)")
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("The output directory (defaults to `public`)"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Increases log verbosity"),
        )
        .get_matches();

    env_logger::Builder::from_default_env()
        .filter_level(match matches.occurrences_of("verbose") {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        })
        .init();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(matches: &clap::ArgMatches) -> anyhow::Result<()> {
    let working_dir = Path::new(matches.value_of("working_dir").unwrap_or("."));
    let output = Path::new(matches.value_of("output").unwrap_or("public"));

    let config = Config::from_directory(working_dir, output)?;
    config.validate()?;
    build_site(&config)?;
    Ok(())
}
