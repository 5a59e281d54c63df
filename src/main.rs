mod cli;
mod config;
mod dataset;
mod error;
mod logging;
mod mutator;
mod record;
mod runner;
mod store;
mod templates;
mod util;

fn main() -> anyhow::Result<()> {
    let app = cli::parse();
    logging::init(app.verbose);
    runner::run(app)
}
