use log::{debug, error, info};
use socketcan::{CanFrame, CanSocket, EmbeddedFrame, Id, Socket};
use std::io::{self, ErrorKind};
use std::time::Duration;
use tokio::sync::mpsc::Sender;

use crate::config::CONFIG;

/// One received bus frame, reduced to what the telegram decoder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusFrame {
    /// CAN arbitration id, which on the Elster bus is the sender node.
    pub id: u32,
    pub data: Vec<u8>,
}

pub struct CanReader {
    interface: String,
}

impl CanReader {
    pub fn new() -> Self {
        CanReader {
            interface: CONFIG.can.interface.clone(),
        }
    }

    /// Blocking receive loop, meant for its own thread. Frames are forwarded
    /// in arrival order. The one second receive timeout doubles as the
    /// shutdown check: even on an idle bus the loop notices a closed
    /// consumer within a second instead of blocking forever.
    pub fn start_thread(&mut self, frames: Sender<BusFrame>) {
        info!("Opening CAN interface {}", self.interface);
        let socket = match CanSocket::open(&self.interface) {
            Ok(socket) => socket,
            Err(e) => {
                error!("Unable to open CAN interface {}: {}", self.interface, e);
                error!("Is the interface up? See the README for the ip link setup");
                return;
            }
        };

        loop {
            let result = socket.read_frame_timeout(Duration::from_secs(1));
            if !self.forward_frame(result, &frames) {
                return;
            }
        }
    }

    /// Handles one receive attempt. Returns false when the reader is done:
    /// the consumer is gone or the socket failed.
    fn forward_frame(&self, result: io::Result<CanFrame>, frames: &Sender<BusFrame>) -> bool {
        match result {
            Ok(CanFrame::Data(frame)) => {
                let frame = BusFrame {
                    id: raw_can_id(frame.id()),
                    data: frame.data().to_vec(),
                };
                if frames.blocking_send(frame).is_err() {
                    debug!("Frame channel closed, CAN reader stopping");
                    return false;
                }
                true
            }
            /* Remote and error frames carry no Elster payload. */
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                if frames.is_closed() {
                    debug!("Frame channel closed, CAN reader stopping");
                    return false;
                }
                true
            }
            Err(e) => {
                error!("Reading from {} failed: {}", self.interface, e);
                false
            }
        }
    }
}

fn raw_can_id(id: Id) -> u32 {
    match id {
        Id::Standard(id) => id.as_raw() as u32,
        Id::Extended(id) => id.as_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socketcan::{ExtendedId, StandardId};

    fn reader() -> CanReader {
        CanReader {
            interface: "can0".to_string(),
        }
    }

    fn timed_out() -> io::Result<CanFrame> {
        Err(io::Error::new(ErrorKind::WouldBlock, "timed out"))
    }

    #[test]
    fn raw_id_covers_both_frame_widths() {
        let standard = Id::Standard(StandardId::new(0x180).unwrap());
        assert_eq!(raw_can_id(standard), 0x180);

        let extended = Id::Extended(ExtendedId::new(0x1FFFF).unwrap());
        assert_eq!(raw_can_id(extended), 0x1FFFF);
    }

    #[test]
    fn data_frames_are_forwarded() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let id = StandardId::new(0x180).unwrap();
        let frame = CanFrame::new(id, &[0x62, 0x00, 0xFA, 0x00, 0x0C, 0x00, 0xD7]).unwrap();

        assert!(reader().forward_frame(Ok(frame), &tx));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.id, 0x180);
        assert_eq!(received.data, vec![0x62, 0x00, 0xFA, 0x00, 0x0C, 0x00, 0xD7]);
    }

    #[test]
    fn remote_frames_are_skipped() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<BusFrame>(8);
        let id = StandardId::new(0x180).unwrap();
        let frame = CanFrame::new_remote(id, 2).unwrap();

        assert!(reader().forward_frame(Ok(frame), &tx));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn idle_reader_keeps_polling_while_the_consumer_lives() {
        let (tx, _rx) = tokio::sync::mpsc::channel::<BusFrame>(8);
        assert!(reader().forward_frame(timed_out(), &tx));
    }

    /* Shutdown on a quiet bus: no frame will ever arrive to make
     * blocking_send fail, so the timeout path itself must end the loop. */
    #[test]
    fn idle_reader_stops_once_the_consumer_is_gone() {
        let (tx, rx) = tokio::sync::mpsc::channel::<BusFrame>(8);
        drop(rx);
        assert!(!reader().forward_frame(timed_out(), &tx));
    }

    #[test]
    fn read_errors_stop_the_reader() {
        let (tx, _rx) = tokio::sync::mpsc::channel::<BusFrame>(8);
        let error = Err(io::Error::new(ErrorKind::BrokenPipe, "interface down"));
        assert!(!reader().forward_frame(error, &tx));
    }
}
