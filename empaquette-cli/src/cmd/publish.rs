use clap::Parser;
use empaquette::types::QoS;

use crate::{client::Client, settings::Settings, CmdResult};

#[derive(Debug, Parser)]
pub struct PublishCmd {
    /// Topic to publish to
    #[arg(short, long)]
    topic: String,

    /// message payload
    #[arg(short, long)]
    message: String,

    /// Quality of Service level. 0 (at most once), 1 (at least once), 2 (exactly once)
    #[arg(short, long)]
    qos: Option<u8>,
}

impl PublishCmd {

    pub fn execute(&self, settings: Settings) -> CmdResult {
        let qos = match self.qos {
            Some(qos) => QoS::try_from(qos)?,
            None => QoS::AtMostOnce,
        };

        let mut client = Client::connect(&settings)?;

        client.publish(&self.topic, self.message.as_bytes(), qos)?;

        client.disconnect()
    }
}
