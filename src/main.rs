use std::time::Duration;

use log::{error, info};
use tokio::task::JoinHandle;

use elster2mqtt::{CanReader, ElsterManager, MqttManager};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let default_filter = std::env::var("ELSTER2MQTT_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    info!("Starting CAN reader & Elster interpretation");

    let (mut mqtt, publish_tx) = MqttManager::new()?;

    let mut threads: Vec<JoinHandle<()>> = Vec::new();

    threads.push(tokio::spawn(async move {
        mqtt.start_thread().await;
    }));

    /* The CAN socket is read on a blocking thread of its own; frames flow
     * into the interpretation in arrival order. */
    let (frame_tx, frame_rx) = tokio::sync::mpsc::channel(64);
    let mut reader = CanReader::new();
    threads.push(tokio::task::spawn_blocking(move || {
        reader.start_thread(frame_tx);
    }));

    let mut bridge = ElsterManager::new(publish_tx);
    threads.push(tokio::spawn(async move {
        bridge.start_thread(frame_rx).await;
    }));

    info!("All modules started, now waiting for a signal to exit");
    let mut module_died = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                if threads.iter().any(|thread| thread.is_finished()) {
                    error!("A module stopped unexpectedly, shutting down");
                    module_died = true;
                    break;
                }
            }
        }
    }

    for thread in threads.iter() {
        thread.abort();
    }

    if module_died {
        std::process::exit(1);
    }
    Ok(())
}
