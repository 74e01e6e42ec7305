//! Release channels and what each one exposes
//!
//! The same commands behave differently per channel: newer channels accept
//! more options, more balancing modes and regional instance groups. That
//! difference is data, held in one [`ChannelCapabilities`] table per channel.

use super::types::{BackendField, BalancingMode};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API release channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Ga,
    Beta,
    Alpha,
}

impl Channel {
    pub fn capabilities(self) -> &'static ChannelCapabilities {
        match self {
            Channel::Ga => &GA,
            Channel::Beta => &BETA,
            Channel::Alpha => &ALPHA,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Ga => "ga",
            Channel::Beta => "beta",
            Channel::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Channel::Ga => "GA",
            Channel::Beta => "Beta",
            Channel::Alpha => "Alpha",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ga" => Ok(Channel::Ga),
            "beta" => Ok(Channel::Beta),
            "alpha" => Ok(Channel::Alpha),
            other => Err(format!("unknown channel '{}' (expected ga, beta or alpha)", other)),
        }
    }
}

/// Options accepted by the backend-service update commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOption {
    Description,
    HttpHealthChecks,
    HttpsHealthChecks,
    HealthChecks,
    Timeout,
    Port,
    PortName,
    Protocol,
    EnableCdn,
    SessionAffinity,
    AffinityCookieTtl,
    ConnectionDrainingTimeout,
    BalancingMode,
    MaxUtilization,
    MaxRate,
    MaxRatePerInstance,
    MaxConnections,
    MaxConnectionsPerInstance,
    CapacityScaler,
    InstanceGroupRegion,
}

impl UpdateOption {
    pub fn flag(self) -> &'static str {
        match self {
            UpdateOption::Description => "--description",
            UpdateOption::HttpHealthChecks => "--http-health-checks",
            UpdateOption::HttpsHealthChecks => "--https-health-checks",
            UpdateOption::HealthChecks => "--health-checks",
            UpdateOption::Timeout => "--timeout",
            UpdateOption::Port => "--port",
            UpdateOption::PortName => "--port-name",
            UpdateOption::Protocol => "--protocol",
            UpdateOption::EnableCdn => "--enable-cdn",
            UpdateOption::SessionAffinity => "--session-affinity",
            UpdateOption::AffinityCookieTtl => "--affinity-cookie-ttl",
            UpdateOption::ConnectionDrainingTimeout => "--connection-draining-timeout",
            UpdateOption::BalancingMode => "--balancing-mode",
            UpdateOption::MaxUtilization => "--max-utilization",
            UpdateOption::MaxRate => "--max-rate",
            UpdateOption::MaxRatePerInstance => "--max-rate-per-instance",
            UpdateOption::MaxConnections => "--max-connections",
            UpdateOption::MaxConnectionsPerInstance => "--max-connections-per-instance",
            UpdateOption::CapacityScaler => "--capacity-scaler",
            UpdateOption::InstanceGroupRegion => "--instance-group-region",
        }
    }
}

/// What one channel supports for backend services
#[derive(Debug)]
pub struct ChannelCapabilities {
    pub channel: Channel,
    /// Compute API version path segment
    pub api_version: &'static str,
    /// Options accepted by `backend-services update`
    pub service_options: &'static [UpdateOption],
    /// Options accepted by `backend-services update-backend`
    pub backend_options: &'static [UpdateOption],
    pub balancing_modes: &'static [BalancingMode],
    /// Capacity limits of which at most one may be set on a backend
    pub capacity_group: &'static [BackendField],
    /// Fields cleared when a backend switches to a balancing mode
    pub mode_invalidates: &'static [(BalancingMode, &'static [BackendField])],
    /// Reject mode/limit combinations locally instead of leaving it to the server
    pub strict_balancing_validation: bool,
}

impl ChannelCapabilities {
    pub fn supports_service_option(&self, option: UpdateOption) -> bool {
        self.service_options.contains(&option)
    }

    pub fn supports_backend_option(&self, option: UpdateOption) -> bool {
        self.backend_options.contains(&option)
    }

    pub fn supports_mode(&self, mode: &BalancingMode) -> bool {
        self.balancing_modes.contains(mode)
    }

    pub fn regional_instance_groups(&self) -> bool {
        self.supports_backend_option(UpdateOption::InstanceGroupRegion)
    }

    /// Fields that must be absent once a backend uses `mode`
    pub fn invalidated_by(&self, mode: &BalancingMode) -> &'static [BackendField] {
        self.mode_invalidates
            .iter()
            .find(|(m, _)| m == mode)
            .map(|(_, fields)| *fields)
            .unwrap_or(&[])
    }
}

const GA_SERVICE_OPTIONS: &[UpdateOption] = &[
    UpdateOption::Description,
    UpdateOption::HttpHealthChecks,
    UpdateOption::HttpsHealthChecks,
    UpdateOption::Timeout,
    UpdateOption::Port,
    UpdateOption::PortName,
    UpdateOption::Protocol,
];

const BETA_SERVICE_OPTIONS: &[UpdateOption] = &[
    UpdateOption::Description,
    UpdateOption::HttpHealthChecks,
    UpdateOption::HttpsHealthChecks,
    UpdateOption::Timeout,
    UpdateOption::Port,
    UpdateOption::PortName,
    UpdateOption::Protocol,
    UpdateOption::EnableCdn,
];

const ALPHA_SERVICE_OPTIONS: &[UpdateOption] = &[
    UpdateOption::Description,
    UpdateOption::HttpHealthChecks,
    UpdateOption::HttpsHealthChecks,
    UpdateOption::HealthChecks,
    UpdateOption::Timeout,
    UpdateOption::Port,
    UpdateOption::PortName,
    UpdateOption::Protocol,
    UpdateOption::EnableCdn,
    UpdateOption::SessionAffinity,
    UpdateOption::AffinityCookieTtl,
    UpdateOption::ConnectionDrainingTimeout,
];

const GA_BACKEND_OPTIONS: &[UpdateOption] = &[
    UpdateOption::Description,
    UpdateOption::BalancingMode,
    UpdateOption::MaxUtilization,
    UpdateOption::MaxRate,
    UpdateOption::MaxRatePerInstance,
    UpdateOption::CapacityScaler,
];

const ALPHA_BACKEND_OPTIONS: &[UpdateOption] = &[
    UpdateOption::Description,
    UpdateOption::BalancingMode,
    UpdateOption::MaxUtilization,
    UpdateOption::MaxRate,
    UpdateOption::MaxRatePerInstance,
    UpdateOption::MaxConnections,
    UpdateOption::MaxConnectionsPerInstance,
    UpdateOption::CapacityScaler,
    UpdateOption::InstanceGroupRegion,
];

const GA_MODES: &[BalancingMode] = &[BalancingMode::Utilization, BalancingMode::Rate];

const ALPHA_MODES: &[BalancingMode] = &[
    BalancingMode::Utilization,
    BalancingMode::Rate,
    BalancingMode::Connection,
];

const GA_CAPACITY: &[BackendField] = &[BackendField::MaxRate, BackendField::MaxRatePerInstance];

const ALPHA_CAPACITY: &[BackendField] = &[
    BackendField::MaxRate,
    BackendField::MaxRatePerInstance,
    BackendField::MaxConnections,
    BackendField::MaxConnectionsPerInstance,
];

const GA_INVALIDATES: &[(BalancingMode, &[BackendField])] =
    &[(BalancingMode::Rate, &[BackendField::MaxUtilization])];

const ALPHA_INVALIDATES: &[(BalancingMode, &[BackendField])] = &[
    (
        BalancingMode::Rate,
        &[
            BackendField::MaxUtilization,
            BackendField::MaxConnections,
            BackendField::MaxConnectionsPerInstance,
        ],
    ),
    (
        BalancingMode::Connection,
        &[
            BackendField::MaxUtilization,
            BackendField::MaxRate,
            BackendField::MaxRatePerInstance,
        ],
    ),
];

pub static GA: ChannelCapabilities = ChannelCapabilities {
    channel: Channel::Ga,
    api_version: "v1",
    service_options: GA_SERVICE_OPTIONS,
    backend_options: GA_BACKEND_OPTIONS,
    balancing_modes: GA_MODES,
    capacity_group: GA_CAPACITY,
    mode_invalidates: GA_INVALIDATES,
    strict_balancing_validation: false,
};

pub static BETA: ChannelCapabilities = ChannelCapabilities {
    channel: Channel::Beta,
    api_version: "beta",
    service_options: BETA_SERVICE_OPTIONS,
    backend_options: GA_BACKEND_OPTIONS,
    balancing_modes: GA_MODES,
    capacity_group: GA_CAPACITY,
    mode_invalidates: GA_INVALIDATES,
    strict_balancing_validation: false,
};

pub static ALPHA: ChannelCapabilities = ChannelCapabilities {
    channel: Channel::Alpha,
    api_version: "alpha",
    service_options: ALPHA_SERVICE_OPTIONS,
    backend_options: ALPHA_BACKEND_OPTIONS,
    balancing_modes: ALPHA_MODES,
    capacity_group: ALPHA_CAPACITY,
    mode_invalidates: ALPHA_INVALIDATES,
    strict_balancing_validation: true,
};
