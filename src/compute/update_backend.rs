//! Editing one backend of a backend service.
//!
//! The policy finds the backend pointing at the target instance group and
//! rewrites its balancing settings following the selected channel's table:
//! switching modes clears the limits the new mode can't use, and a capacity
//! limit replaces every other limit of the capacity group.

use super::channel::{ChannelCapabilities, UpdateOption};
use super::types::{Backend, BackendField, BackendService, BalancingMode};
use crate::error::UpdateError;
use crate::resource::{FieldUpdate, MutationPolicy, ResourceReference, Scope};

/// The single capacity limit a request may set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapacityLimit {
    MaxRate(i64),
    MaxRatePerInstance(f64),
    MaxConnections(i64),
    MaxConnectionsPerInstance(i64),
}

impl CapacityLimit {
    pub fn field(&self) -> BackendField {
        match self {
            CapacityLimit::MaxRate(_) => BackendField::MaxRate,
            CapacityLimit::MaxRatePerInstance(_) => BackendField::MaxRatePerInstance,
            CapacityLimit::MaxConnections(_) => BackendField::MaxConnections,
            CapacityLimit::MaxConnectionsPerInstance(_) => BackendField::MaxConnectionsPerInstance,
        }
    }

    fn option(&self) -> UpdateOption {
        match self {
            CapacityLimit::MaxRate(_) => UpdateOption::MaxRate,
            CapacityLimit::MaxRatePerInstance(_) => UpdateOption::MaxRatePerInstance,
            CapacityLimit::MaxConnections(_) => UpdateOption::MaxConnections,
            CapacityLimit::MaxConnectionsPerInstance(_) => UpdateOption::MaxConnectionsPerInstance,
        }
    }

    fn is_negative(&self) -> bool {
        match *self {
            CapacityLimit::MaxRate(v)
            | CapacityLimit::MaxConnections(v)
            | CapacityLimit::MaxConnectionsPerInstance(v) => v < 0,
            CapacityLimit::MaxRatePerInstance(v) => v < 0.0,
        }
    }

    fn write(&self, backend: &mut Backend) {
        match *self {
            CapacityLimit::MaxRate(v) => backend.max_rate = Some(v),
            CapacityLimit::MaxRatePerInstance(v) => backend.max_rate_per_instance = Some(v),
            CapacityLimit::MaxConnections(v) => backend.max_connections = Some(v),
            CapacityLimit::MaxConnectionsPerInstance(v) => {
                backend.max_connections_per_instance = Some(v)
            }
        }
    }
}

/// Requested changes to a backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendMutation {
    pub description: FieldUpdate<String>,
    pub balancing_mode: Option<BalancingMode>,
    pub max_utilization: Option<f64>,
    pub capacity: Option<CapacityLimit>,
    pub capacity_scaler: Option<f64>,
}

impl BackendMutation {
    /// True when no option was supplied
    pub fn is_empty(&self) -> bool {
        self.description.is_unchanged()
            && self.balancing_mode.is_none()
            && self.max_utilization.is_none()
            && self.capacity.is_none()
            && self.capacity_scaler.is_none()
    }

    /// Balancing limits named explicitly by the request
    fn requested_fields(&self) -> Vec<BackendField> {
        let mut fields = Vec::new();
        if self.max_utilization.is_some() {
            fields.push(BackendField::MaxUtilization);
        }
        if let Some(capacity) = &self.capacity {
            fields.push(capacity.field());
        }
        fields
    }
}

/// Mutation policy of `backend-services update-backend`
#[derive(Debug, Clone)]
pub struct UpdateBackendPolicy {
    caps: &'static ChannelCapabilities,
    group: ResourceReference,
    service_name: String,
    mutation: BackendMutation,
}

impl UpdateBackendPolicy {
    pub fn new(
        caps: &'static ChannelCapabilities,
        group: ResourceReference,
        service_name: &str,
        mutation: BackendMutation,
    ) -> Self {
        Self {
            caps,
            group,
            service_name: service_name.to_string(),
            mutation,
        }
    }

    fn require(&self, option: UpdateOption) -> Result<(), UpdateError> {
        if self.caps.supports_backend_option(option) {
            Ok(())
        } else {
            Err(UpdateError::unsupported(option.flag(), self.caps.channel.to_string()))
        }
    }

    fn not_found(&self) -> UpdateError {
        UpdateError::SubResourceNotFound {
            kind: "backend".to_string(),
            name: self.group.name().to_string(),
            scope_type: self.group.scope().kind().to_string(),
            scope: self.group.scope().value().to_string(),
            parent_kind: "backend service".to_string(),
            parent: self.service_name.clone(),
        }
    }

    /// Reject limits the effective balancing mode can't use
    fn validate_against_mode(&self, current: &Backend) -> Result<(), UpdateError> {
        let mode = match self
            .mutation
            .balancing_mode
            .as_ref()
            .or(current.balancing_mode.as_ref())
        {
            Some(mode) => mode,
            None => return Ok(()),
        };

        let invalid = self.caps.invalidated_by(mode);
        match self
            .mutation
            .requested_fields()
            .into_iter()
            .find(|field| invalid.contains(field))
        {
            Some(field) => Err(UpdateError::incompatible(
                field.flag(),
                format!("cannot be set when the balancing mode is {}", mode),
            )),
            None => Ok(()),
        }
    }
}

fn unit_interval(option: &str, value: Option<f64>) -> Result<(), UpdateError> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(UpdateError::invalid_value(
            option,
            format!("{} is not between 0.0 and 1.0", v),
        )),
        _ => Ok(()),
    }
}

impl MutationPolicy<BackendService> for UpdateBackendPolicy {
    fn is_empty(&self) -> bool {
        self.mutation.is_empty()
    }

    fn precheck(&self) -> Result<(), UpdateError> {
        let m = &self.mutation;

        if !m.description.is_unchanged() {
            self.require(UpdateOption::Description)?;
        }
        if let Some(mode) = &m.balancing_mode {
            self.require(UpdateOption::BalancingMode)?;
            if !self.caps.supports_mode(mode) {
                let known: Vec<&str> =
                    self.caps.balancing_modes.iter().map(|m| m.as_str()).collect();
                return Err(UpdateError::invalid_value(
                    UpdateOption::BalancingMode.flag(),
                    format!("{} is not one of {}", mode, known.join(", ")),
                ));
            }
        }
        if m.max_utilization.is_some() {
            self.require(UpdateOption::MaxUtilization)?;
        }
        if let Some(capacity) = &m.capacity {
            self.require(capacity.option())?;
            if capacity.is_negative() {
                return Err(UpdateError::invalid_value(
                    capacity.field().flag(),
                    "must not be negative",
                ));
            }
        }
        if m.capacity_scaler.is_some() {
            self.require(UpdateOption::CapacityScaler)?;
        }
        if matches!(self.group.scope(), Scope::Region(_)) {
            self.require(UpdateOption::InstanceGroupRegion)?;
        }

        unit_interval(UpdateOption::MaxUtilization.flag(), m.max_utilization)?;
        unit_interval(UpdateOption::CapacityScaler.flag(), m.capacity_scaler)
    }

    fn apply(
        &self,
        original: &BackendService,
        replacement: &mut BackendService,
    ) -> Result<(), UpdateError> {
        let index = original
            .backends
            .iter()
            .position(|b| b.group.as_deref().is_some_and(|g| self.group.matches_link(g)))
            .ok_or_else(|| self.not_found())?;

        if self.caps.strict_balancing_validation {
            self.validate_against_mode(&original.backends[index])?;
        }

        let m = &self.mutation;
        let backend = &mut replacement.backends[index];

        m.description.apply_to(&mut backend.description);

        if let Some(mode) = &m.balancing_mode {
            for field in self.caps.invalidated_by(mode) {
                backend.clear(*field);
            }
            backend.balancing_mode = Some(mode.clone());
        }

        if let Some(utilization) = m.max_utilization {
            backend.max_utilization = Some(utilization);
        }

        if let Some(capacity) = &m.capacity {
            for field in self.caps.capacity_group {
                backend.clear(*field);
            }
            capacity.write(backend);
        }

        if let Some(scaler) = m.capacity_scaler {
            backend.capacity_scaler = Some(scaler);
        }

        Ok(())
    }
}
