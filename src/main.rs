use algo_reveal::{app, config::Config};
use clap::Parser;
use log::error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = Config::parse();
    if let Err(err) = pollster::block_on(app::run(config)) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
