//! Message bus connection and topic names.

use crate::error::ConfigError;

/// MQTT topic names used by the prop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Inbound sensor readings, payload `"ch1,ch2"`
    pub values: String,

    /// Inbound session commands, payload `{"command": "start" | "reset"}`
    pub control: String,

    /// Inbound per-channel control, payload `{"control": ...}` (logged only)
    pub channel_control: String,

    /// Outbound status, payload `{"status": "completed"}`
    pub status: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            values: "potentiometer/values".to_string(),
            control: "mqtt/defcon/control".to_string(),
            channel_control: "mqtt/defcon/ch1/control".to_string(),
            status: "mqtt/defcon/ch1/status".to_string(),
        }
    }
}

impl Topics {
    /// Topics the prop subscribes to
    pub fn inbound(&self) -> [&str; 3] {
        [&self.values, &self.control, &self.channel_control]
    }
}

/// Broker connection parameters
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,

    /// MQTT keep-alive interval (seconds)
    pub keep_alive_secs: u64,

    /// Back-off after a connection error before polling again (milliseconds)
    pub reconnect_delay_ms: u64,

    pub topics: Topics,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 1883,
            client_id: "signallock".to_string(),
            keep_alive_secs: 60,
            reconnect_delay_ms: 2000,
            topics: Topics::default(),
        }
    }
}

impl BusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::invalid("broker host", "must not be empty"));
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::invalid("client_id", "must not be empty"));
        }
        // rumqttc rejects keep-alive below 5 seconds
        if self.keep_alive_secs < 5 {
            return Err(ConfigError::invalid(
                "keep_alive_secs",
                format!("must be >= 5, got {}", self.keep_alive_secs),
            ));
        }
        let topics = &self.topics;
        for (field, topic) in [
            ("values topic", &topics.values),
            ("control topic", &topics.control),
            ("channel control topic", &topics.channel_control),
            ("status topic", &topics.status),
        ] {
            if topic.is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bus_is_valid() {
        assert!(BusConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_topic() {
        let mut config = BusConfig::default();
        config.topics.status.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inbound_excludes_status() {
        let topics = Topics::default();
        assert!(!topics.inbound().contains(&topics.status.as_str()));
    }
}
