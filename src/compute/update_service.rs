//! Editing the top-level settings of a backend service.

use super::channel::{ChannelCapabilities, UpdateOption};
use super::types::{BackendService, ConnectionDraining};
use crate::error::UpdateError;
use crate::resource::{FieldUpdate, MutationPolicy, ResourceReference};

pub const PROTOCOLS: &[&str] = &["HTTP", "HTTPS", "HTTP2", "SSL", "TCP", "UDP"];

pub const SESSION_AFFINITIES: &[&str] = &[
    "NONE",
    "CLIENT_IP",
    "CLIENT_IP_PROTO",
    "CLIENT_IP_PORT_PROTO",
    "GENERATED_COOKIE",
];

/// Longest accepted connection draining timeout, one hour
const MAX_DRAINING_TIMEOUT_SEC: i64 = 3600;

/// Requested changes to a backend service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendServiceMutation {
    pub description: FieldUpdate<String>,
    /// Resolved health checks; the collection tells which flag named them
    pub health_checks: Vec<ResourceReference>,
    pub timeout_sec: Option<i64>,
    pub port: Option<i64>,
    pub port_name: Option<String>,
    pub protocol: Option<String>,
    pub enable_cdn: Option<bool>,
    pub session_affinity: Option<String>,
    pub affinity_cookie_ttl_sec: Option<i64>,
    pub connection_draining_timeout_sec: Option<i64>,
}

/// Mutation policy of `backend-services update`
#[derive(Debug, Clone)]
pub struct UpdateServicePolicy {
    caps: &'static ChannelCapabilities,
    /// Compute API root that health check links are rendered under
    api_base: String,
    mutation: BackendServiceMutation,
}

impl UpdateServicePolicy {
    pub fn new(
        caps: &'static ChannelCapabilities,
        api_base: &str,
        mutation: BackendServiceMutation,
    ) -> Self {
        Self {
            caps,
            api_base: api_base.to_string(),
            mutation,
        }
    }

    fn require(&self, option: UpdateOption) -> Result<(), UpdateError> {
        if self.caps.supports_service_option(option) {
            Ok(())
        } else {
            Err(UpdateError::unsupported(option.flag(), self.caps.channel.to_string()))
        }
    }

    /// Options named by the request, in flag order
    fn requested_options(&self) -> Vec<UpdateOption> {
        let m = &self.mutation;
        let mut options = Vec::new();

        if !m.description.is_unchanged() {
            options.push(UpdateOption::Description);
        }
        for check in &m.health_checks {
            let option = match check.collection() {
                "httpHealthChecks" => UpdateOption::HttpHealthChecks,
                "httpsHealthChecks" => UpdateOption::HttpsHealthChecks,
                _ => UpdateOption::HealthChecks,
            };
            if !options.contains(&option) {
                options.push(option);
            }
        }

        let flagged = [
            (m.timeout_sec.is_some(), UpdateOption::Timeout),
            (m.port.is_some(), UpdateOption::Port),
            (m.port_name.is_some(), UpdateOption::PortName),
            (m.protocol.is_some(), UpdateOption::Protocol),
            (m.enable_cdn.is_some(), UpdateOption::EnableCdn),
            (m.session_affinity.is_some(), UpdateOption::SessionAffinity),
            (m.affinity_cookie_ttl_sec.is_some(), UpdateOption::AffinityCookieTtl),
            (
                m.connection_draining_timeout_sec.is_some(),
                UpdateOption::ConnectionDrainingTimeout,
            ),
        ];
        options.extend(flagged.into_iter().filter(|(set, _)| *set).map(|(_, o)| o));
        options
    }
}

fn one_of(option: UpdateOption, value: &Option<String>, allowed: &[&str]) -> Result<(), UpdateError> {
    match value {
        Some(v) if !allowed.contains(&v.as_str()) => Err(UpdateError::invalid_value(
            option.flag(),
            format!("{} is not one of {}", v, allowed.join(", ")),
        )),
        _ => Ok(()),
    }
}

fn non_negative(option: UpdateOption, value: Option<i64>) -> Result<(), UpdateError> {
    match value {
        Some(v) if v < 0 => Err(UpdateError::invalid_value(option.flag(), "must not be negative")),
        _ => Ok(()),
    }
}

impl MutationPolicy<BackendService> for UpdateServicePolicy {
    fn is_empty(&self) -> bool {
        self.requested_options().is_empty()
    }

    fn precheck(&self) -> Result<(), UpdateError> {
        for option in self.requested_options() {
            self.require(option)?;
        }

        let m = &self.mutation;
        one_of(UpdateOption::Protocol, &m.protocol, PROTOCOLS)?;
        one_of(UpdateOption::SessionAffinity, &m.session_affinity, SESSION_AFFINITIES)?;
        non_negative(UpdateOption::Timeout, m.timeout_sec)?;
        non_negative(UpdateOption::AffinityCookieTtl, m.affinity_cookie_ttl_sec)?;
        non_negative(
            UpdateOption::ConnectionDrainingTimeout,
            m.connection_draining_timeout_sec,
        )?;

        if let Some(port) = m.port {
            if !(1..=65535).contains(&port) {
                return Err(UpdateError::invalid_value(
                    UpdateOption::Port.flag(),
                    format!("{} is not a valid port", port),
                ));
            }
        }
        if m
            .connection_draining_timeout_sec
            .is_some_and(|t| t > MAX_DRAINING_TIMEOUT_SEC)
        {
            return Err(UpdateError::invalid_value(
                UpdateOption::ConnectionDrainingTimeout.flag(),
                "must be at most one hour",
            ));
        }
        Ok(())
    }

    fn apply(
        &self,
        _original: &BackendService,
        replacement: &mut BackendService,
    ) -> Result<(), UpdateError> {
        let m = &self.mutation;

        m.description.apply_to(&mut replacement.description);

        if !m.health_checks.is_empty() {
            replacement.health_checks = m
                .health_checks
                .iter()
                .map(|check| check.self_link(&self.api_base))
                .collect();
        }

        if let Some(timeout) = m.timeout_sec {
            replacement.timeout_sec = Some(timeout);
        }
        if let Some(port) = m.port {
            replacement.port = Some(port);
        }
        if let Some(port_name) = &m.port_name {
            replacement.port_name = Some(port_name.clone());
        }
        if let Some(protocol) = &m.protocol {
            replacement.protocol = Some(protocol.clone());
        }
        if let Some(enable_cdn) = m.enable_cdn {
            replacement.enable_cdn = Some(enable_cdn);
        }
        if let Some(affinity) = &m.session_affinity {
            replacement.session_affinity = Some(affinity.clone());
        }
        if let Some(ttl) = m.affinity_cookie_ttl_sec {
            replacement.affinity_cookie_ttl_sec = Some(ttl);
        }
        if let Some(timeout) = m.connection_draining_timeout_sec {
            // Replaces the whole draining block
            replacement.connection_draining = Some(ConnectionDraining {
                draining_timeout_sec: Some(timeout),
                ..Default::default()
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::channel::Channel;
    use crate::resource::Scope;

    const BASE: &str = "https://compute.googleapis.com/compute/v1";

    fn policy(channel: Channel, mutation: BackendServiceMutation) -> UpdateServicePolicy {
        UpdateServicePolicy::new(channel.capabilities(), BASE, mutation)
    }

    fn health_check(collection: &str, name: &str) -> ResourceReference {
        ResourceReference::new("p", Scope::Global, collection, name)
    }

    fn existing() -> BackendService {
        BackendService {
            name: Some("web".into()),
            description: Some("old".into()),
            timeout_sec: Some(30),
            health_checks: vec![format!("{}/projects/p/global/httpHealthChecks/legacy", BASE)],
            ..Default::default()
        }
    }

    fn apply(policy: &UpdateServicePolicy, original: &BackendService) -> BackendService {
        policy.precheck().unwrap();
        let mut replacement = original.clone();
        policy.apply(original, &mut replacement).unwrap();
        replacement
    }

    #[test]
    fn test_empty_request() {
        assert!(policy(Channel::Alpha, BackendServiceMutation::default()).is_empty());
    }

    #[test]
    fn test_empty_description_clears_it() {
        let mutation = BackendServiceMutation {
            description: FieldUpdate::Clear,
            ..Default::default()
        };
        let p = policy(Channel::Ga, mutation);
        assert!(!p.is_empty());

        let updated = apply(&p, &existing());
        assert_eq!(updated.description, None);
        assert_eq!(updated.timeout_sec, Some(30));
    }

    #[test]
    fn test_health_checks_replace_existing_links() {
        let mutation = BackendServiceMutation {
            health_checks: vec![
                health_check("httpHealthChecks", "hc-1"),
                health_check("httpsHealthChecks", "hc-2"),
            ],
            ..Default::default()
        };

        let updated = apply(&policy(Channel::Ga, mutation), &existing());
        assert_eq!(
            updated.health_checks,
            vec![
                format!("{}/projects/p/global/httpHealthChecks/hc-1", BASE),
                format!("{}/projects/p/global/httpsHealthChecks/hc-2", BASE),
            ]
        );
    }

    #[test]
    fn test_generic_health_checks_need_alpha() {
        let mutation = BackendServiceMutation {
            health_checks: vec![health_check("healthChecks", "hc")],
            ..Default::default()
        };
        let err = policy(Channel::Beta, mutation.clone()).precheck().unwrap_err();
        assert_eq!(
            err.to_string(),
            "[--health-checks] is not available in the Beta channel"
        );
        assert!(policy(Channel::Alpha, mutation).precheck().is_ok());
    }

    #[test]
    fn test_cdn_and_affinity_by_channel() {
        let cdn = BackendServiceMutation {
            enable_cdn: Some(false),
            ..Default::default()
        };
        assert!(policy(Channel::Ga, cdn.clone()).precheck().is_err());
        let updated = apply(&policy(Channel::Beta, cdn), &existing());
        assert_eq!(updated.enable_cdn, Some(false));

        let affinity = BackendServiceMutation {
            session_affinity: Some("GENERATED_COOKIE".into()),
            affinity_cookie_ttl_sec: Some(0),
            ..Default::default()
        };
        assert!(policy(Channel::Beta, affinity.clone()).precheck().is_err());
        let updated = apply(&policy(Channel::Alpha, affinity), &existing());
        assert_eq!(updated.session_affinity.as_deref(), Some("GENERATED_COOKIE"));
        assert_eq!(updated.affinity_cookie_ttl_sec, Some(0));
    }

    #[test]
    fn test_connection_draining() {
        let mutation = BackendServiceMutation {
            connection_draining_timeout_sec: Some(120),
            ..Default::default()
        };
        let updated = apply(&policy(Channel::Alpha, mutation), &existing());
        assert_eq!(
            updated.connection_draining.and_then(|d| d.draining_timeout_sec),
            Some(120)
        );

        let too_long = BackendServiceMutation {
            connection_draining_timeout_sec: Some(7200),
            ..Default::default()
        };
        assert!(policy(Channel::Alpha, too_long).precheck().is_err());
    }

    #[test]
    fn test_value_checks() {
        let bad_protocol = BackendServiceMutation {
            protocol: Some("FTP".into()),
            ..Default::default()
        };
        assert!(matches!(
            policy(Channel::Ga, bad_protocol).precheck(),
            Err(UpdateError::InvalidValue { .. })
        ));

        let bad_port = BackendServiceMutation {
            port: Some(0),
            ..Default::default()
        };
        assert!(policy(Channel::Ga, bad_port).precheck().is_err());
    }

    #[test]
    fn test_same_values_produce_no_change() {
        let mutation = BackendServiceMutation {
            description: FieldUpdate::Set("old".into()),
            timeout_sec: Some(30),
            ..Default::default()
        };
        let original = existing();
        assert_eq!(apply(&policy(Channel::Ga, mutation), &original), original);
    }
}
