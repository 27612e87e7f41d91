pub mod publish;
pub mod subscribe;

use clap::{ArgAction, Parser, Subcommand};
use empaquette::packet::Connect;

use self::{subscribe::SubscribeCmd, publish::PublishCmd};

#[derive(Debug, Parser)]
#[command(name = "empaquette-cli", about = "MQTT 3.1.1 command line client", disable_help_flag = true)]
pub struct MqttCli {

    /// command to run
    #[command(subcommand)]
    pub command: Command,

    /// turns on debug logging
    #[arg(global = true, short, long)]
    pub verbose: bool,

    /// optional server host name, defaults to `localhost`
    #[arg(global = true, short, long)]
    pub host: Option<String>,

    /// optional port number, defaults to `1883`
    #[arg(global = true, short, long)]
    pub port: Option<u16>,

    /// client identifier, defaults to `empaquette-` followed by the process ID
    #[arg(global = true, short = 'i', long)]
    pub client_id: Option<String>,

    /// keep alive interval in seconds, `0` turns it off
    #[arg(global = true, short, long, default_value_t = Connect::DEFAULT_KEEP_ALIVE)]
    pub keep_alive: u16,

    /// prints help, `-h` is taken by `--host`
    #[arg(global = true, long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// publishes to a broker
    Pub(PublishCmd),

    /// subscribes to a topic
    Sub(SubscribeCmd),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pub() {
        let cli = MqttCli::try_parse_from(["empaquette-cli", "pub", "-t", "a/b", "-m", "hello", "-q", "1", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Pub(_)));
    }

    #[test]
    fn parse_sub() {
        let cli = MqttCli::try_parse_from(["empaquette-cli", "sub", "--topic", "a/+", "--count", "3"]).unwrap();
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Command::Sub(_)));
    }

    #[test]
    fn topic_is_required() {
        assert!(MqttCli::try_parse_from(["empaquette-cli", "pub", "-m", "hello"]).is_err());
        assert!(MqttCli::try_parse_from(["empaquette-cli", "sub"]).is_err());
    }
}
