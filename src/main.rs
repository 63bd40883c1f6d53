use clap::Parser;
use gtd_recur::cli::commands::Cli;
use gtd_recur::cli::handlers;
use gtd_recur::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
