use std::io::Error;
use std::time::Duration;

use log::{debug, error, info};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::mpsc::{Receiver, Sender};

use crate::config::CONFIG;

/// One outgoing MQTT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishData {
    pub topic: String,
    pub payload: String,
    pub qos: u8,
    pub retain: bool,
}

pub struct MqttManager {
    rx: Receiver<PublishData>,
    client: AsyncClient,
}

impl MqttManager {
    /// Sets up the client and its event loop and returns the sender side of
    /// the publish queue. The broker does not have to be reachable yet; the
    /// event loop keeps reconnecting and the bus readout carries on.
    pub fn new() -> Result<(MqttManager, Sender<PublishData>), Error> {
        let (mtx, mrx) = tokio::sync::mpsc::channel(100);

        let config = CONFIG.mqtt.clone();
        info!(
            "MQTT server: {}:{}, user: {}",
            config.host,
            config.port,
            if config.user.is_empty() { "<none>" } else { config.user.as_str() }
        );

        let mut mqttoptions = MqttOptions::new(config.client_name, config.host, config.port);
        mqttoptions.set_keep_alive(Duration::from_secs(5));
        if !config.user.is_empty() {
            mqttoptions.set_credentials(config.user, config.pass);
        }

        let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);

        tokio::spawn(async move {
            info!("MQTT Eventloop started");
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Connected to the MQTT broker");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Error in MQTT {:?}, reconnecting", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok((MqttManager { rx: mrx, client }, mtx))
    }

    /// Drains the publish queue one message at a time, so readings leave in
    /// the order the interpretation produced them.
    pub async fn start_thread(&mut self) {
        while let Some(publish) = self.rx.recv().await {
            match self
                .client
                .publish(
                    publish.topic,
                    parse_qos(publish.qos),
                    publish.retain,
                    publish.payload,
                )
                .await
            {
                Ok(_) => debug!("Published successfully"),
                Err(e) => error!("Error publishing: {}", e),
            }
        }
        info!("Publish channel closed, MQTT manager stopping");
    }
}

fn parse_qos(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}
