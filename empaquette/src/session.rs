//! A blocking client session over one connection.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::error::MqttError;
use crate::packet::{self, Connect, Disconnect, MqttControlPacket, Packet, Pingreq, Puback, Publish, Subscribe, Unsubscribe};
use crate::types::{QoS, VarLengthString};

/// One MQTT connection: a buffered reader and a buffered writer, usually the two halves of the same `TcpStream`.
///
/// Reads and writes block until the whole packet went through. There is no internal state besides the buffers and
/// the next packet identifier, so any sequence of calls is allowed; it is up to the caller to follow the protocol
/// (`CONNECT` first, wait for `CONNACK`, and so on).
///
/// A `Session` is not meant to be shared between threads. To read and write concurrently, [Session::into_split]
/// gives each thread its own half.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use empaquette::Session;
/// use empaquette::packet::Packet;
///
/// let mut session = Session::new(Cursor::new(vec![0x20, 0x02, 0x00, 0x00]), Vec::new());
/// session.send_connect("clienttesttoto").unwrap();
///
/// match session.read_next_packet().unwrap() {
///     Packet::Connack(connack) => assert!(connack.ensure_accepted().is_ok()),
///     els => panic!("unexpected {:?}", els),
/// }
/// ```
pub struct Session<R: Read, W: Write> {
    reader: PacketReader<R>,
    writer: PacketWriter<W>,
}

/// The receiving half of a [Session].
pub struct PacketReader<R: Read> {
    reader: BufReader<R>,
}

/// The sending half of a [Session], owning the packet identifier counter.
pub struct PacketWriter<W: Write> {
    writer: BufWriter<W>,
    packet_identifier: u16,
    last_sent: Instant,
}

impl Session<TcpStream, TcpStream> {

    /// Opens a TCP connection to `addr`. No MQTT packet is sent yet.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, MqttError> {
        let stream = TcpStream::connect(addr)?;
        debug!("Connected to {}", stream.peer_addr()?);

        let reader = stream.try_clone()?;
        Ok(Session::new(reader, stream))
    }

    /// Blocking reads fail with a [MqttError::Transport] after `timeout`. `None` blocks forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), MqttError> {
        self.reader.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Closes both directions of the underlying connection.
    pub fn shutdown(&mut self) -> Result<(), MqttError> {
        self.writer.writer.flush()?;
        self.writer.writer.get_ref().shutdown(Shutdown::Both)?;
        Ok(())
    }
}

impl<R: Read, W: Write> Session<R, W> {

    pub fn new(reader: R, writer: W) -> Self {
        Session {
            reader: PacketReader::new(reader),
            writer: PacketWriter::new(writer),
        }
    }

    /// Writes `packet` and flushes.
    pub fn send<P: MqttControlPacket>(&mut self, packet: &P) -> Result<(), MqttError> {
        self.writer.send(packet)
    }

    /// Sends a `CONNECT` with the default keep alive of one hour.
    pub fn send_connect(&mut self, client_id: &str) -> Result<(), MqttError> {
        self.writer.send_connect(client_id)
    }

    /// Publishes `payload` to `topic`, returning the packet identifier used if `qos` is greater than `0`.
    ///
    /// Does not wait for any acknowledgement, the matching `PUBACK` or `PUBREC` arrives through
    /// [Session::read_next_packet].
    pub fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<Option<u16>, MqttError> {
        self.writer.publish(topic, payload, qos)
    }

    /// Acknowledges a QoS 1 `PUBLISH` received from the server.
    pub fn puback(&mut self, packet_identifier: u16) -> Result<(), MqttError> {
        self.writer.puback(packet_identifier)
    }

    /// Sends a `SUBSCRIBE` for all `filters`, returning its packet identifier.
    pub fn subscribe(&mut self, filters: &[(&str, QoS)]) -> Result<u16, MqttError> {
        self.writer.subscribe(filters)
    }

    /// Sends an `UNSUBSCRIBE` for all `filters`, returning its packet identifier.
    pub fn unsubscribe(&mut self, filters: &[&str]) -> Result<u16, MqttError> {
        self.writer.unsubscribe(filters)
    }

    pub fn ping(&mut self) -> Result<(), MqttError> {
        self.writer.ping()
    }

    /// Sends a `DISCONNECT`. The connection itself stays open until the session is dropped.
    pub fn disconnect(&mut self) -> Result<(), MqttError> {
        self.writer.disconnect()
    }

    /// Blocks until one complete packet has been read.
    pub fn read_next_packet(&mut self) -> Result<Packet, MqttError> {
        self.reader.read_next_packet()
    }

    /// See [PacketReader::wait_for_packet].
    pub fn wait_for_packet(&mut self) -> Result<bool, MqttError> {
        self.reader.wait_for_packet()
    }

    /// Time since the last packet was sent, or since the session was created.
    pub fn idle_for(&self) -> Duration {
        self.writer.idle_for()
    }

    pub fn next_packet_identifier(&mut self) -> u16 {
        self.writer.next_packet_identifier()
    }

    /// Separates the session into halves that can be moved to different threads.
    pub fn into_split(self) -> (PacketReader<R>, PacketWriter<W>) {
        (self.reader, self.writer)
    }

    /// Flushes and gives back the reader and the writer. Bytes already buffered by the reader are lost.
    pub fn into_inner(self) -> Result<(R, W), MqttError> {
        Ok((self.reader.into_inner(), self.writer.into_inner()?))
    }
}

impl<R: Read> PacketReader<R> {

    pub fn new(reader: R) -> Self {
        PacketReader { reader: BufReader::new(reader) }
    }

    /// Blocks until one complete packet has been read.
    ///
    /// A read timeout hitting in the middle of a packet leaves the stream at an undefined position, so the
    /// connection has to be dropped after any error except [MqttError::UnsupportedPacketType].
    pub fn read_next_packet(&mut self) -> Result<Packet, MqttError> {
        packet::read_packet(&mut self.reader)
    }

    /// Blocks until at least the first byte of the next packet arrived or the stream ended, and returns `true`.
    ///
    /// Returns `false` if the read timeout of the transport expired first. Nothing has been consumed then, so
    /// unlike a timeout inside [PacketReader::read_next_packet] this leaves the stream usable.
    pub fn wait_for_packet(&mut self) -> Result<bool, MqttError> {
        match self.reader.fill_buf() {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Bytes already buffered are lost.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<W: Write> PacketWriter<W> {

    pub fn new(writer: W) -> Self {
        PacketWriter {
            writer: BufWriter::new(writer),
            packet_identifier: 0,
            last_sent: Instant::now(),
        }
    }

    /// Writes `packet` and flushes.
    pub fn send<P: MqttControlPacket>(&mut self, packet: &P) -> Result<(), MqttError> {
        let binary = packet.to_bytes()?;
        debug!("Sending {} of {} bytes", P::packet_type(), binary.len());
        trace!("{:?}", binary);

        self.writer.write_all(&binary)?;
        self.writer.flush()?;
        self.last_sent = Instant::now();
        Ok(())
    }

    pub fn send_connect(&mut self, client_id: &str) -> Result<(), MqttError> {
        self.send(&Connect::with_client_id(client_id)?)
    }

    pub fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<Option<u16>, MqttError> {
        let mut publish = Publish::new(topic, payload.to_vec())?;
        publish.qos_level = qos;
        if qos != QoS::AtMostOnce {
            publish.packet_identifier = Some(self.next_packet_identifier());
        }

        self.send(&publish)?;
        Ok(publish.packet_identifier)
    }

    pub fn puback(&mut self, packet_identifier: u16) -> Result<(), MqttError> {
        self.send(&Puback::new(packet_identifier))
    }

    pub fn subscribe(&mut self, filters: &[(&str, QoS)]) -> Result<u16, MqttError> {
        let topic_filters = filters.iter()
            .map(|(filter, qos)| VarLengthString::try_from(*filter).map(|filter| (filter, *qos)))
            .collect::<Result<Vec<_>, MqttError>>()?;

        let packet_identifier = self.next_packet_identifier();
        self.send(&Subscribe { packet_identifier, topic_filters })?;
        Ok(packet_identifier)
    }

    pub fn unsubscribe(&mut self, filters: &[&str]) -> Result<u16, MqttError> {
        let topic_filters = filters.iter()
            .map(|filter| VarLengthString::try_from(*filter))
            .collect::<Result<Vec<_>, MqttError>>()?;

        let packet_identifier = self.next_packet_identifier();
        self.send(&Unsubscribe { packet_identifier, topic_filters })?;
        Ok(packet_identifier)
    }

    pub fn ping(&mut self) -> Result<(), MqttError> {
        self.send(&Pingreq)
    }

    pub fn disconnect(&mut self) -> Result<(), MqttError> {
        self.send(&Disconnect)
    }

    pub fn idle_for(&self) -> Duration {
        self.last_sent.elapsed()
    }

    /// Non-zero and unique among the last 65,535 packets that needed one; wraps around from 65,535 to 1.
    pub fn next_packet_identifier(&mut self) -> u16 {
        self.packet_identifier = self.packet_identifier.checked_add(1).unwrap_or(1);
        self.packet_identifier
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Flushes and gives back the writer.
    pub fn into_inner(self) -> Result<W, MqttError> {
        self.writer.into_inner().map_err(|e| MqttError::from(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::packet::{Connack, Pubrec, PacketType};
    use crate::types::ConnectReturnCode;

    use super::*;

    fn session(incoming: Vec<u8>) -> Session<Cursor<Vec<u8>>, Vec<u8>> {
        Session::new(Cursor::new(incoming), Vec::new())
    }

    fn sent(session: &Session<Cursor<Vec<u8>>, Vec<u8>>) -> &[u8] {
        session.writer.get_ref()
    }

    #[test]
    fn send_connect() -> Result<(), MqttError> {
        let mut session = session(vec![]);
        session.send_connect("clienttesttoto")?;

        let mut expect: Vec<u8> = vec![0x10, 0x1A, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0x00, 0x0E, 0x10, 0x00, 0x0E];
        expect.extend_from_slice(b"clienttesttoto");
        assert_eq!(&expect[..], sent(&session));
        Ok(())
    }

    #[test]
    fn send_connect_client_id_too_long() {
        let mut session = session(vec![]);
        let client_id = "x".repeat(65536);
        assert!(matches!(session.send_connect(&client_id), Err(MqttError::StringTooLong(65536))));
        assert!(sent(&session).is_empty());
    }

    #[test]
    fn publish_qos_0() -> Result<(), MqttError> {
        let mut session = session(vec![]);
        assert_eq!(None, session.publish("test", b"test", QoS::AtMostOnce)?);
        assert_eq!(&[48, 10, 0, 4, 116, 101, 115, 116, 116, 101, 115, 116][..], sent(&session));
        Ok(())
    }

    #[test]
    fn publish_qos_1_and_wait_for_puback() -> Result<(), MqttError> {
        let mut session = session(vec![0x40, 0x02, 0x00, 0x01]);
        let packet_identifier = session.publish("a/b", b"hello", QoS::AtLeastOnce)?;
        assert_eq!(Some(1), packet_identifier);
        assert_eq!(&[0x32, 0x0C, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x00, 0x01, 0x68, 0x65, 0x6C, 0x6C, 0x6F][..], sent(&session));

        assert_eq!(Packet::Puback(Puback::new(1)), session.read_next_packet()?);
        Ok(())
    }

    #[test]
    fn read_connack_then_publish() -> Result<(), MqttError> {
        let mut session = session(vec![
            0x20, 0x02, 0x00, 0x00,
            0x33, 0x0C, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x00, 0x01, 0x68, 0x65, 0x6C, 0x6C, 0x6F,
            0x50, 0x02, 0x00, 0x02,
        ]);

        assert_eq!(Packet::Connack(Connack::new(false, ConnectReturnCode::Accepted)), session.read_next_packet()?);
        match session.read_next_packet()? {
            Packet::Publish(publish) => assert_eq!(b"hello".to_vec(), publish.payload),
            els => panic!("expected PUBLISH, got {:?}", els),
        }
        assert_eq!(Packet::Pubrec(Pubrec::new(2)), session.read_next_packet()?);
        assert!(matches!(session.read_next_packet(), Err(MqttError::Transport(_))));
        Ok(())
    }

    #[test]
    fn read_truncated() {
        let mut session = session(vec![0x33, 0x0C, 0x00, 0x03, 0x61]);
        assert!(matches!(session.read_next_packet(), Err(MqttError::Transport(_))));
    }

    #[test]
    fn subscribe_and_unsubscribe() -> Result<(), MqttError> {
        let mut session = session(vec![]);
        assert_eq!(1, session.subscribe(&[("a/b", QoS::AtLeastOnce)])?);
        assert_eq!(2, session.unsubscribe(&["a/b"])?);

        let mut expect = vec![0x82, 0x08, 0x00, 0x01, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x01];
        expect.extend_from_slice(&[0xA2, 0x07, 0x00, 0x02, 0x00, 0x03, 0x61, 0x2F, 0x62]);
        assert_eq!(&expect[..], sent(&session));
        Ok(())
    }

    #[test]
    fn into_inner() -> Result<(), MqttError> {
        let mut session = session(vec![0xD0, 0x00]);
        session.ping()?;

        let (_, written) = session.into_inner()?;
        assert_eq!(vec![0xC0, 0x00], written);
        Ok(())
    }

    #[test]
    fn split_halves() -> Result<(), MqttError> {
        let session = session(vec![0xD0, 0x00]);
        let (mut reader, mut writer) = session.into_split();

        let reading = std::thread::spawn(move || reader.read_next_packet());
        assert_eq!(Some(1), writer.publish("a/b", b"x", QoS::AtLeastOnce)?);
        writer.ping()?;

        assert_eq!(PacketType::PINGRESP, reading.join().unwrap()?.packet_type());
        assert_eq!(&[0x32, 0x08, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x00, 0x01, 0x78, 0xC0, 0x00][..], &writer.into_inner()?[..]);
        Ok(())
    }

    #[test]
    fn wait_for_packet_does_not_consume() -> Result<(), MqttError> {
        let mut session = session(vec![0xD0, 0x00]);
        assert!(session.wait_for_packet()?);
        assert!(session.wait_for_packet()?);
        assert_eq!(PacketType::PINGRESP, session.read_next_packet()?.packet_type());

        // end of stream is reported by the next read
        assert!(session.wait_for_packet()?);
        assert!(matches!(session.read_next_packet(), Err(MqttError::Transport(_))));
        Ok(())
    }

    #[test]
    fn wait_for_packet_times_out() -> Result<(), MqttError> {
        let mut session = Session::new(TimingOut, Vec::new());
        assert!(!session.wait_for_packet()?);
        Ok(())
    }

    #[test]
    fn sending_resets_idle_time() -> Result<(), MqttError> {
        let mut session = session(vec![]);
        std::thread::sleep(Duration::from_millis(20));
        assert!(session.idle_for() >= Duration::from_millis(20));

        session.ping()?;
        assert!(session.idle_for() < Duration::from_millis(20));
        Ok(())
    }

    /// A transport whose read timeout always expires.
    struct TimingOut;

    impl Read for TimingOut {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::WouldBlock))
        }
    }

    #[test]
    fn subscribe_without_filters() {
        let mut session = session(vec![]);
        assert!(matches!(session.subscribe(&[]), Err(MqttError::ProtocolError(_))));
    }

    #[test]
    fn ping_puback_and_disconnect() -> Result<(), MqttError> {
        let mut session = session(vec![]);
        session.ping()?;
        session.puback(0x0102)?;
        session.disconnect()?;
        assert_eq!(&[0xC0, 0x00, 0x40, 0x02, 0x01, 0x02, 0xE0, 0x00][..], sent(&session));
        Ok(())
    }

    #[test]
    fn unsupported_packet_keeps_stream_in_sync() -> Result<(), MqttError> {
        let mut session = session(vec![0xA2, 0x07, 0x00, 0x02, 0x00, 0x03, 0x61, 0x2F, 0x62, 0xD0, 0x00]);
        assert!(matches!(session.read_next_packet(), Err(MqttError::UnsupportedPacketType(PacketType::UNSUBSCRIBE))));
        assert_eq!(PacketType::PINGRESP, session.read_next_packet()?.packet_type());
        Ok(())
    }

    #[test]
    fn packet_identifiers_wrap_around() {
        let mut session = session(vec![]);
        assert_eq!(1, session.next_packet_identifier());
        assert_eq!(2, session.next_packet_identifier());

        session.writer.packet_identifier = u16::MAX - 1;
        assert_eq!(u16::MAX, session.next_packet_identifier());
        assert_eq!(1, session.next_packet_identifier());
    }
}
