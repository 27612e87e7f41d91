use crate::cmd::MqttCli;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 1883;

/// Connection settings shared by all commands.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: u16,
}

impl Settings {

    pub fn addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

impl From<&MqttCli> for Settings {
    fn from(cli: &MqttCli) -> Self {
        Settings {
            host: cli.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.unwrap_or(DEFAULT_PORT),
            client_id: cli.client_id.clone().unwrap_or_else(|| format!("empaquette-{}", std::process::id())),
            keep_alive: cli.keep_alive,
        }
    }
}
