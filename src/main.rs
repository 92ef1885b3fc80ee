mod args;
mod tally;

use clap::Parser;
use log::{info, LevelFilter};
use snafu::ErrorCompat;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    info!("main: args: {:?}", args);

    let res = tally::run_session(&args.config, &args.voters, &args.out, &args.reference);
    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
