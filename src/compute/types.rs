//! Typed Compute Engine backend-service resources
//!
//! Only the fields gcpctl edits are modeled. Everything else the API returns is
//! kept in `extra` so a write-back sends it unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which capacity setting of a backend is authoritative
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BalancingMode {
    Utilization,
    Rate,
    Connection,
    /// A mode this client doesn't know; passed through untouched
    Other(String),
}

impl BalancingMode {
    pub fn as_str(&self) -> &str {
        match self {
            BalancingMode::Utilization => "UTILIZATION",
            BalancingMode::Rate => "RATE",
            BalancingMode::Connection => "CONNECTION",
            BalancingMode::Other(s) => s,
        }
    }
}

impl From<String> for BalancingMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "UTILIZATION" => BalancingMode::Utilization,
            "RATE" => BalancingMode::Rate,
            "CONNECTION" => BalancingMode::Connection,
            _ => BalancingMode::Other(value),
        }
    }
}

impl From<BalancingMode> for String {
    fn from(mode: BalancingMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for BalancingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load-balancing limits of a backend that depend on the balancing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendField {
    MaxUtilization,
    MaxRate,
    MaxRatePerInstance,
    MaxConnections,
    MaxConnectionsPerInstance,
}

impl BackendField {
    /// Command-line flag setting this field
    pub fn flag(self) -> &'static str {
        match self {
            BackendField::MaxUtilization => "--max-utilization",
            BackendField::MaxRate => "--max-rate",
            BackendField::MaxRatePerInstance => "--max-rate-per-instance",
            BackendField::MaxConnections => "--max-connections",
            BackendField::MaxConnectionsPerInstance => "--max-connections-per-instance",
        }
    }
}

/// One backend (instance group) of a backend service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balancing_mode: Option<BalancingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_utilization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rate_per_instance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections_per_instance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_scaler: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Backend {
    pub fn is_set(&self, field: BackendField) -> bool {
        match field {
            BackendField::MaxUtilization => self.max_utilization.is_some(),
            BackendField::MaxRate => self.max_rate.is_some(),
            BackendField::MaxRatePerInstance => self.max_rate_per_instance.is_some(),
            BackendField::MaxConnections => self.max_connections.is_some(),
            BackendField::MaxConnectionsPerInstance => self.max_connections_per_instance.is_some(),
        }
    }

    pub fn clear(&mut self, field: BackendField) {
        match field {
            BackendField::MaxUtilization => self.max_utilization = None,
            BackendField::MaxRate => self.max_rate = None,
            BackendField::MaxRatePerInstance => self.max_rate_per_instance = None,
            BackendField::MaxConnections => self.max_connections = None,
            BackendField::MaxConnectionsPerInstance => self.max_connections_per_instance = None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDraining {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draining_timeout_sec: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A global backend service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<Backend>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub health_checks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_sec: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(rename = "enableCDN", default, skip_serializing_if = "Option::is_none")]
    pub enable_cdn: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity_cookie_ttl_sec: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_draining: Option<ConnectionDraining>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_service_keeps_unknown_fields() {
        let raw = json!({
            "name": "web",
            "id": "1234567890",
            "kind": "compute#backendService",
            "enableCDN": true,
            "loadBalancingScheme": "EXTERNAL",
            "backends": [{
                "group": "projects/p/zones/us-central1-a/instanceGroups/ig",
                "balancingMode": "RATE",
                "maxRate": 100,
                "failover": false
            }]
        });

        let service: BackendService = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(service.enable_cdn, Some(true));
        assert_eq!(service.backends[0].balancing_mode, Some(BalancingMode::Rate));
        assert_eq!(service.backends[0].max_rate, Some(100));

        assert_eq!(serde_json::to_value(&service).unwrap(), raw);
    }

    #[test]
    fn test_cleared_fields_are_omitted() {
        let mut backend = Backend {
            max_utilization: Some(0.8),
            max_rate: Some(10),
            ..Default::default()
        };
        backend.clear(BackendField::MaxUtilization);

        let value = serde_json::to_value(&backend).unwrap();
        assert_eq!(value, json!({"maxRate": 10}));
        assert!(!backend.is_set(BackendField::MaxUtilization));
        assert!(backend.is_set(BackendField::MaxRate));
    }

    #[test]
    fn test_unknown_balancing_mode_round_trips() {
        let mode: BalancingMode = serde_json::from_value(json!("CUSTOM_METRICS")).unwrap();
        assert_eq!(mode, BalancingMode::Other("CUSTOM_METRICS".to_string()));
        assert_eq!(serde_json::to_value(&mode).unwrap(), json!("CUSTOM_METRICS"));
    }
}
