//! Environment variable overlay.
//!
//! Unset variables leave the file (or default) value in place.

use envconfig::Envconfig;

use crate::config::schema::ServiceConfig;

/// Values read from the process environment.
#[derive(Envconfig, Debug, Clone, Default)]
pub struct EnvOverrides {
    #[envconfig(from = "HTTP_SERVER_ADDRESS")]
    pub server_address: Option<String>,

    #[envconfig(from = "ENABLE_TLS")]
    pub enable_tls: Option<bool>,

    #[envconfig(from = "TLS_CERT_FILE")]
    pub tls_cert_file: Option<String>,

    #[envconfig(from = "TLS_KEY_FILE")]
    pub tls_key_file: Option<String>,

    #[envconfig(from = "REQUEST_TIMEOUT_SECONDS")]
    pub request_timeout_secs: Option<u64>,

    #[envconfig(from = "CORRELATION_HEADER")]
    pub correlation_header: Option<String>,

    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: Option<String>,

    #[envconfig(from = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl EnvOverrides {
    /// Write every set value into `config`.
    pub fn apply(self, config: &mut ServiceConfig) {
        if let Some(address) = self.server_address {
            config.server.address = address;
        }
        if let Some(enabled) = self.enable_tls {
            config.server.tls.enabled = enabled;
        }
        if let Some(cert_file) = self.tls_cert_file {
            config.server.tls.cert_file = cert_file;
        }
        if let Some(key_file) = self.tls_key_file {
            config.server.tls.key_file = key_file;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.server.request_timeout_secs = Some(secs);
        }
        if let Some(header) = self.correlation_header {
            config.server.correlation_header = header;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(address) = self.metrics_address {
            config.metrics.enabled = true;
            config.metrics.address = address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn set_variables_override_config() {
        let env = HashMap::from([
            ("HTTP_SERVER_ADDRESS".to_string(), "127.0.0.1:8000".to_string()),
            ("ENABLE_TLS".to_string(), "true".to_string()),
            ("LOG_LEVEL".to_string(), "warn".to_string()),
        ]);
        let overrides = EnvOverrides::init_from_hashmap(&env).unwrap();

        let mut config = ServiceConfig::default();
        overrides.apply(&mut config);

        assert_eq!(config.server.address, "127.0.0.1:8000");
        assert!(config.server.tls.enabled);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.server.correlation_header, "x-correlation-id");
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn empty_environment_changes_nothing() {
        let overrides = EnvOverrides::init_from_hashmap(&HashMap::new()).unwrap();
        let mut config = ServiceConfig::default();
        overrides.apply(&mut config);

        assert_eq!(config.server.address, "0.0.0.0:9440");
        assert_eq!(config.logging.level, "DEBUG");
    }
}
