use lazy_static::lazy_static;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;

fn mqtt_host_default() -> String {
    return "localhost".to_string();
}

fn mqtt_port_default() -> u16 {
    return 1883;
}

fn mqtt_user_default() -> String {
    return "".to_string();
}

fn mqtt_pass_default() -> String {
    return "".to_string();
}

fn mqtt_client_name_default() -> String {
    return "elster2mqtt".to_string();
}

fn mqtt_topic_prefix_default() -> String {
    return "elster/".to_string();
}

fn mqtt_default() -> MqttConfig {
    return MqttConfig {
        host: mqtt_host_default(),
        port: mqtt_port_default(),
        user: mqtt_user_default(),
        pass: mqtt_pass_default(),
        client_name: mqtt_client_name_default(),
        topic_prefix: mqtt_topic_prefix_default(),
    };
}

fn can_interface_default() -> String {
    return "can0".to_string();
}

fn can_default() -> CanConfig {
    return CanConfig {
        interface: can_interface_default(),
    };
}

fn verbosity_default() -> u8 {
    return 2;
}

#[derive(Deserialize, Serialize, Clone)]
pub struct MqttConfig {
    #[serde(default = "mqtt_host_default")]
    pub host: String,
    #[serde(default = "mqtt_port_default")]
    pub port: u16,
    #[serde(default = "mqtt_user_default")]
    pub user: String,
    #[serde(default = "mqtt_pass_default")]
    pub pass: String,
    #[serde(default = "mqtt_client_name_default")]
    pub client_name: String,
    #[serde(default = "mqtt_topic_prefix_default")]
    pub topic_prefix: String,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct CanConfig {
    /// SocketCAN interface the heat pump bus is attached to.
    #[serde(default = "can_interface_default")]
    pub interface: String,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "mqtt_default")]
    pub mqtt: MqttConfig,
    #[serde(default = "can_default")]
    pub can: CanConfig,
    /// Console detail for per-telegram diagnostics: 0 none, 1 answers only,
    /// 2 every classified telegram, 3 raw frame dumps on top.
    #[serde(default = "verbosity_default")]
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mqtt: mqtt_default(),
            can: can_default(),
            verbosity: verbosity_default(),
        }
    }
}

impl Config {
    /// Checks the usual locations for a config file. Without one the bridge
    /// still runs, against a broker on localhost and interface can0. A file
    /// that exists but does not parse is an operator error and fatal.
    pub fn load() -> Self {
        for path in ["config/elster2mqtt.yaml", "elster2mqtt.yaml"] {
            if Path::new(path).exists() {
                match Self::load_from(path) {
                    Ok(config) => {
                        info!("Configuration loaded from {}", path);
                        return config;
                    }
                    Err(e) => {
                        error!("Unable to parse config file {}: {}", path, e);
                        std::process::exit(1);
                    }
                }
            }
        }
        info!("No configuration file found, using built-in defaults");
        Config::default()
    }

    pub fn load_from(path: &str) -> Result<Config, Box<dyn Error>> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yml::from_str(&contents)?;
        Ok(config)
    }
}

lazy_static! {
    pub static ref CONFIG: Config = Config::load();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_every_field() {
        let config = Config::default();
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert!(config.mqtt.user.is_empty());
        assert!(config.mqtt.pass.is_empty());
        assert_eq!(config.mqtt.client_name, "elster2mqtt");
        assert_eq!(config.mqtt.topic_prefix, "elster/");
        assert_eq!(config.can.interface, "can0");
        assert_eq!(config.verbosity, 2);
    }

    #[test]
    fn partial_yaml_is_filled_with_defaults() {
        let config: Config = serde_yml::from_str("mqtt:\n  host: broker.lan\n").unwrap();
        assert_eq!(config.mqtt.host, "broker.lan");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.can.interface, "can0");
        assert_eq!(config.verbosity, 2);
    }

    #[test]
    fn load_from_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "mqtt:\n  host: broker.lan\n  port: 8883\n  user: ha\n  pass: secret\ncan:\n  interface: can1\nverbosity: 3"
        )
        .unwrap();
        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.mqtt.host, "broker.lan");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.mqtt.user, "ha");
        assert_eq!(config.can.interface, "can1");
        assert_eq!(config.verbosity, 3);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mqtt: [not, a, mapping]").unwrap();
        assert!(Config::load_from(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn load_from_fails_on_missing_file() {
        assert!(Config::load_from("/nonexistent/elster2mqtt.yaml").is_err());
    }
}
