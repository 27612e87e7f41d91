use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use empaquette::{error::MqttError, packet::{Connect, Packet, Pubcomp, Pubrec, Pubrel}, types::{QoS, SubscribeReturnCode, VarLengthString}, Session};
use log::{debug, info, warn};

use crate::{settings::Settings, CmdResult};

pub struct Client<R: Read, W: Write> {
    session: Session<R, W>,
    connected: bool,
    /// while listening, send a `PINGREQ` once nothing has been sent for this long
    ping_interval: Option<Duration>,
}

/// How long to wait for `CONNACK`, `SUBACK` and publish acknowledgements.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

impl Client<TcpStream, TcpStream> {

    pub fn connect(settings: &Settings) -> Result<Self, MqttError> {
        info!("Connecting to {}:{}", settings.host, settings.port);

        let session = Session::connect(settings.addr())?;
        session.set_read_timeout(Some(RESPONSE_TIMEOUT))?;
        let mut client = Client { session, connected: false, ping_interval: None };
        client.handshake(settings)?;

        Ok(client)
    }

    pub fn disconnect(&mut self) -> CmdResult {
        if !self.connected {
            return Ok(())
        }

        self.session.disconnect()?;
        self.connected = false;
        self.session.shutdown()
    }

    /// While listening, the client sends at least one packet every `keep_alive` seconds. `0` turns pings off.
    ///
    /// Waiting for the next packet wakes up after half the interval, so a `PINGREQ` goes out no later than
    /// `keep_alive` seconds after the last packet sent.
    pub fn set_keep_alive(&mut self, keep_alive: u16) -> CmdResult {
        self.ping_interval = match keep_alive {
            0 => None,
            secs => Some(Duration::from_secs(secs.into()) / 2),
        };
        self.session.set_read_timeout(self.ping_interval)
    }
}

impl<R: Read, W: Write> Client<R, W> {

    fn handshake(&mut self, settings: &Settings) -> CmdResult {
        let mut connect = Connect::with_client_id(&settings.client_id)?;
        connect.keep_alive = settings.keep_alive;
        connect.clean_session = true;
        self.session.send(&connect)?;

        match self.session.read_next_packet()? {
            Packet::Connack(connack) => {
                debug!("CONNACK: {:?}", connack);
                connack.ensure_accepted()?;
                self.connected = true;
                Ok(())
            },
            els => Err(MqttError::unexpected_packet("CONNACK", els.packet_type())),
        }
    }

    pub fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> CmdResult {
        let packet_identifier = self.session.publish(topic, payload, qos)?;
        match packet_identifier {
            None => Ok(()),
            Some(id) => self.handle_pub_qos(id),
        }
    }

    pub fn subscribe(&mut self, filter: &str, qos: QoS) -> CmdResult {
        let packet_identifier = self.session.subscribe(&[(filter, qos)])?;

        match self.session.read_next_packet()? {
            Packet::Suback(suback) if suback.packet_identifier == packet_identifier => {
                debug!("SUBACK: {:?}", suback);
                match suback.return_codes.first() {
                    Some(SubscribeReturnCode::Success(granted)) => {
                        info!("Subscribed to {} with {}", filter, granted);
                        Ok(())
                    },
                    Some(SubscribeReturnCode::Failure) => {
                        Err(MqttError::ProtocolError(format!("Server rejected subscription to {}", filter)))
                    },
                    None => Err(MqttError::MalformedPacket("SUBACK without return codes".to_string())),
                }
            },
            Packet::Suback(suback) => Err(MqttError::ProtocolError(
                format!("SUBACK for packet {} while waiting for {}", suback.packet_identifier, packet_identifier)
            )),
            els => Err(MqttError::unexpected_packet("SUBACK", els.packet_type())),
        }
    }

    /// Prints incoming messages to stdout until `count` messages arrived, or until the server closes the connection.
    pub fn listen(&mut self, count: Option<usize>) -> CmdResult {
        let mut received = 0;
        let mut pending_release: HashSet<u16> = HashSet::new();

        while count.map_or(true, |max| received < max) {
            if self.ping_due() {
                self.session.ping()?;
            }
            if !self.session.wait_for_packet()? {
                continue;
            }

            // a timeout from here on is fatal, part of the packet is gone already
            let packet = match self.session.read_next_packet() {
                Ok(packet) => packet,
                Err(MqttError::Transport(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    info!("Server closed the connection");
                    self.connected = false;
                    return Ok(())
                },
                Err(e) => return Err(e),
            };

            match packet {
                Packet::Publish(publish) => {
                    debug!("PUBLISH: {:?}", publish);
                    match (publish.qos_level, publish.packet_identifier) {
                        (QoS::AtLeastOnce, Some(id)) => self.session.puback(id)?,
                        (QoS::ExactlyOnce, Some(id)) => {
                            self.session.send(&Pubrec::new(id))?;
                            // a duplicate delivery of a message we already printed
                            if !pending_release.insert(id) {
                                continue;
                            }
                        },
                        _ => {},
                    }
                    println!("{}", display_message(&publish.topic_name, &publish.payload));
                    received += 1;
                },
                Packet::Pubrel(pubrel) => {
                    if !pending_release.remove(&pubrel.packet_identifier) {
                        warn!("PUBREL for unknown packet identifier {}", pubrel.packet_identifier);
                    }
                    self.session.send(&Pubcomp::new(pubrel.packet_identifier))?;
                },
                Packet::Pingresp(_) => debug!("PINGRESP"),
                els => warn!("Ignoring unexpected {}", els.packet_type()),
            }
        }

        Ok(())
    }

    fn ping_due(&self) -> bool {
        self.ping_interval.map_or(false, |interval| self.session.idle_for() >= interval)
    }

    fn handle_pub_qos(&mut self, packet_identifier: u16) -> CmdResult {
        loop {
            match self.session.read_next_packet()? {
                Packet::Puback(puback) if puback.packet_identifier == packet_identifier => {
                    debug!("PUBACK: {:?}", puback);
                    return Ok(())
                },
                Packet::Pubrec(pubrec) if pubrec.packet_identifier == packet_identifier => {
                    debug!("PUBREC: {:?}", pubrec);
                    self.session.send(&Pubrel::new(packet_identifier))?;
                },
                Packet::Pubcomp(pubcomp) if pubcomp.packet_identifier == packet_identifier => {
                    debug!("PUBCOMP: {:?}", pubcomp);
                    return Ok(())
                },
                Packet::Pingresp(_) => debug!("PINGRESP"),
                els => return Err(MqttError::unexpected_packet("publish acknowledgement", els.packet_type())),
            }
        }
    }
}

fn display_message(topic: &VarLengthString, payload: &[u8]) -> String {
    format!("{}: {}", topic, String::from_utf8_lossy(payload))
}
