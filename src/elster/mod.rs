use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::sync::mpsc::{Receiver, Sender};

pub mod parser;
pub mod structs;
pub mod table;
pub mod utils;

use crate::can::BusFrame;
use crate::config::CONFIG;
use crate::mqtt::PublishData;
use structs::{Reading, Telegram, TelegramRole};
use table::{ElsterEntry, ElsterTable};

/// Telegram-level errors. All of them are contained in the bridge loop: the
/// offending frame is dropped and the next one is processed.
#[derive(Error, Debug)]
pub enum ElsterParseError {
    #[error("Telegram too short: {0} bytes")]
    TelegramTooShort(usize),
    #[error("CAN identifier 0x{0:X} outside the Elster addressing range")]
    IdentifierOutOfRange(u32),
    #[error("No state mapping for raw value {0}")]
    UnknownEnumValue(u16),
}

/// Publication policy: answers carry confirmed device state, requests and
/// changes are questions and commands and stay off the topic tree.
pub fn should_publish(role: TelegramRole) -> bool {
    role == TelegramRole::Answer
}

pub struct ElsterManager {
    sender: Sender<PublishData>,
    table: ElsterTable,
    topic_prefix: String,
    verbosity: u8,
}

impl ElsterManager {
    pub fn new(sender: Sender<PublishData>) -> ElsterManager {
        ElsterManager::with_table(
            sender,
            ElsterTable::new(),
            CONFIG.mqtt.topic_prefix.clone(),
            CONFIG.verbosity,
        )
    }

    /// Constructor with an explicit catalog, for swapping in an extended or
    /// reduced index table.
    pub fn with_table(
        sender: Sender<PublishData>,
        table: ElsterTable,
        topic_prefix: String,
        verbosity: u8,
    ) -> ElsterManager {
        ElsterManager {
            sender,
            table,
            topic_prefix,
            verbosity,
        }
    }

    pub async fn start_thread(&mut self, mut frames: Receiver<BusFrame>) {
        info!(
            "Starting Elster interpretation with {} table entries",
            self.table.len()
        );
        while let Some(frame) = frames.recv().await {
            self.handle_frame(frame).await;
        }
        debug!("Frame channel closed, Elster interpretation stopping");
    }

    /// Processes one frame end to end. Every failure on this path is local
    /// to the frame: report it and wait for the next one.
    async fn handle_frame(&self, frame: BusFrame) {
        /* Info level so the dump stays visible under the default filter. */
        if self.verbosity >= 3 {
            info!("raw frame id=0x{:03X} data={}", frame.id, hex::encode(&frame.data));
        }

        let telegram = match parser::decode_telegram(&frame) {
            Ok(telegram) => telegram,
            Err(e) => {
                if self.verbosity >= 2 {
                    warn!("[Invalid] {} ({})", e, hex::encode(&frame.data));
                }
                return;
            }
        };

        let role = telegram.role();

        let entry = match self.table.lookup(telegram.index) {
            Some(entry) => entry,
            None => {
                if self.verbosity >= 2 {
                    warn!(
                        "No table entry for Elster index 0x{:04X} (from 0x{:03X})",
                        telegram.index, telegram.source
                    );
                }
                return;
            }
        };

        /* Requests ask for a value, so their value bytes mean nothing; only
         * answers and changes are worth interpreting. */
        let value = match role {
            TelegramRole::Answer | TelegramRole::Change => {
                match utils::interpret_elster_value(telegram.raw_value, entry.kind) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        if self.verbosity >= 2 {
                            warn!("{} ({}, raw {})", e, entry.name, telegram.raw_value);
                        }
                        return;
                    }
                }
            }
            _ => None,
        };

        let reading = Reading {
            index: telegram.index,
            name: entry.name,
            topic_name: entry.display_name(),
            role,
            value,
        };

        self.log_reading(&telegram, entry, &reading);

        if should_publish(reading.role) {
            if let Some(value) = &reading.value {
                let publish = PublishData {
                    topic: utils::topic_for(&self.topic_prefix, reading.topic_name),
                    payload: value.to_string(),
                    qos: 0,
                    retain: false,
                };
                if self.sender.send(publish).await.is_err() {
                    error!(
                        "Publish channel closed, dropping reading for 0x{:04X}",
                        reading.index
                    );
                }
            }
        }
    }

    fn log_reading(&self, telegram: &Telegram, entry: &ElsterEntry, reading: &Reading) {
        if self.verbosity >= 2 {
            let value = match &reading.value {
                Some(value) => value.to_string(),
                None => "-".to_string(),
            };
            info!(
                "[{}] CAN-ID: {:03X} -> {:03X} | Elster-Index: 0x{:04X} ({}) | Value: {} | Type: {}",
                reading.role,
                telegram.source,
                telegram.destination,
                reading.index,
                reading.name,
                value,
                entry.kind
            );
        } else if self.verbosity == 1 && reading.role == TelegramRole::Answer {
            if let Some(value) = &reading.value {
                info!("Ans 0x{:04X} -> {}", reading.index, value);
            }
        }
    }
}
