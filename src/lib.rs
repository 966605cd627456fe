//! Bridge between the Elster CAN bus of Stiebel Eltron heat pumps and MQTT.
//!
//! Frames are read from a SocketCAN interface, decoded into Elster
//! telegrams, interpreted against the index table and published, answers
//! only, to an MQTT broker.

pub mod can;
pub mod config;
pub mod elster;
pub mod mqtt;

pub use can::{BusFrame, CanReader};
pub use config::CONFIG;
pub use elster::{should_publish, ElsterManager, ElsterParseError};
pub use mqtt::{MqttManager, PublishData};
