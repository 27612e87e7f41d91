use clap::Parser;
use empaquette::types::QoS;

use crate::{client::Client, settings::Settings, CmdResult};

#[derive(Debug, Parser)]
pub struct SubscribeCmd {
    /// Topic pattern to subscribe to, may include wildcards (`+` or `#`).
    #[arg(short, long)]
    topic: String,

    /// Quality of Service level. 1 or 2. 0 is the default, no need to explicitly specify in that case.
    #[arg(short, long)]
    qos: Option<u8>,

    /// Disconnect after this many messages. Keeps listening until the server closes the connection otherwise.
    #[arg(short, long)]
    count: Option<usize>,
}

impl SubscribeCmd {

    pub fn execute(&self, settings: Settings) -> CmdResult {
        let qos = match self.qos {
            Some(qos) => QoS::try_from(qos)?,
            None => QoS::AtMostOnce,
        };

        let mut client = Client::connect(&settings)?;

        client.subscribe(&self.topic, qos)?;
        client.set_keep_alive(settings.keep_alive)?;
        client.listen(self.count)?;

        client.disconnect()
    }
}
