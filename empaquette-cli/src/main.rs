mod client;
mod cmd;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use empaquette::error::MqttError;
use log::error;

use crate::cmd::{Command, MqttCli};
use crate::settings::Settings;

pub type CmdResult = Result<(), MqttError>;

fn main() -> ExitCode {
    let cli = MqttCli::parse();
    init_logging(cli.verbose);

    let settings = Settings::from(&cli);

    let result = match cli.command {
        Command::Pub(publ) => publ.execute(settings),
        Command::Sub(sub) => sub.execute(settings),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` wins if set, otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = match verbose {
        true => "debug",
        false => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}
