//! `compute backend-services` commands

use super::{parse_duration_secs, uppercase, Context};
use crate::compute::{
    BackendMutation, BackendService, BackendServiceClient, BackendServiceMutation, BalancingMode,
    CapacityLimit, Channel, UpdateBackendPolicy, UpdateOption, UpdateServicePolicy,
};
use crate::error::UpdateError;
use crate::gcp::client::GcpClient;
use crate::resource::{
    FieldUpdate, ReferenceResolver, ResourceUpdater, ScopeHints, ScopeKinds, UpdateOutcome,
};
use anyhow::Result;
use clap::{ArgGroup, Args, Subcommand};

#[derive(Args, Debug)]
pub struct ComputeArgs {
    #[command(subcommand)]
    pub command: ComputeCommand,
}

impl ComputeArgs {
    pub(super) fn path(&self) -> String {
        match &self.command {
            ComputeCommand::BackendServices(args) => match &args.command {
                BackendServicesCommand::Update(_) => "backend-services.update".to_string(),
                BackendServicesCommand::UpdateBackend(_) => {
                    "backend-services.update-backend".to_string()
                }
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ComputeCommand {
    /// Backend services of load balancers
    BackendServices(BackendServicesArgs),
}

#[derive(Args, Debug)]
pub struct BackendServicesArgs {
    #[command(subcommand)]
    pub command: BackendServicesCommand,
}

#[derive(Subcommand, Debug)]
pub enum BackendServicesCommand {
    /// Update a backend service
    Update(UpdateServiceArgs),
    /// Update an existing backend in a backend service
    UpdateBackend(UpdateBackendArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpdateServiceArgs {
    /// The name of the backend service to update
    pub name: String,

    /// An optional, textual description; an empty string clears it
    #[arg(long)]
    pub description: Option<String>,

    /// Health checks for the backend service (Alpha)
    #[arg(long, value_delimiter = ',', value_name = "HEALTH_CHECK")]
    pub health_checks: Vec<String>,

    /// HTTP health checks for the backend service
    #[arg(long, value_delimiter = ',', value_name = "HTTP_HEALTH_CHECK")]
    pub http_health_checks: Vec<String>,

    /// HTTPS health checks for the backend service
    #[arg(long, value_delimiter = ',', value_name = "HTTPS_HEALTH_CHECK")]
    pub https_health_checks: Vec<String>,

    /// How long to wait for a backend to respond, e.g. 30s or 5m
    #[arg(long, value_parser = parse_duration_secs)]
    pub timeout: Option<i64>,

    /// TCP port to use when connecting to the backends
    #[arg(long)]
    pub port: Option<i64>,

    /// Named port of the instance groups to connect to
    #[arg(long)]
    pub port_name: Option<String>,

    /// Protocol used to reach the backends (HTTP, HTTPS, HTTP2, SSL, TCP, UDP)
    #[arg(long, value_parser = uppercase)]
    pub protocol: Option<String>,

    /// Enable Cloud CDN (Beta and Alpha)
    #[arg(long, overrides_with = "no_enable_cdn")]
    pub enable_cdn: bool,

    /// Disable Cloud CDN (Beta and Alpha)
    #[arg(long, overrides_with = "enable_cdn")]
    pub no_enable_cdn: bool,

    /// Session affinity type (Alpha)
    #[arg(long, value_parser = uppercase)]
    pub session_affinity: Option<String>,

    /// TTL in seconds of the generated affinity cookie (Alpha)
    #[arg(long)]
    pub affinity_cookie_ttl: Option<i64>,

    /// Connection draining timeout in seconds, 0 disables draining (Alpha)
    #[arg(long)]
    pub connection_draining_timeout: Option<i64>,
}

impl UpdateServiceArgs {
    fn enable_cdn(&self) -> Option<bool> {
        match (self.enable_cdn, self.no_enable_cdn) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn mutation(&self, resolver: &ReferenceResolver) -> Result<BackendServiceMutation> {
        let mut health_checks = Vec::new();
        for (collection, names) in [
            ("healthChecks", &self.health_checks),
            ("httpHealthChecks", &self.http_health_checks),
            ("httpsHealthChecks", &self.https_health_checks),
        ] {
            for name in names {
                health_checks.push(resolver.resolve_global(collection, name)?);
            }
        }

        Ok(BackendServiceMutation {
            description: FieldUpdate::from_text_flag(self.description.clone()),
            health_checks,
            timeout_sec: self.timeout,
            port: self.port,
            port_name: self.port_name.clone(),
            protocol: self.protocol.clone(),
            enable_cdn: self.enable_cdn(),
            session_affinity: self.session_affinity.clone(),
            affinity_cookie_ttl_sec: self.affinity_cookie_ttl,
            connection_draining_timeout_sec: self.connection_draining_timeout,
        })
    }
}

#[derive(Args, Debug, Clone, Default)]
#[command(group(ArgGroup::new("capacity").multiple(false)))]
pub struct UpdateBackendArgs {
    /// The name of the backend service to update
    pub name: String,

    /// The name or URL of the instance group the backend points at
    #[arg(long)]
    pub instance_group: String,

    /// Zone of the instance group
    #[arg(long, conflicts_with = "instance_group_region")]
    pub instance_group_zone: Option<String>,

    /// Region of the instance group (Alpha)
    #[arg(long)]
    pub instance_group_region: Option<String>,

    /// Deprecated, use --instance-group-zone
    #[arg(long, hide = true, conflicts_with_all = ["instance_group_zone", "instance_group_region"])]
    pub zone: Option<String>,

    /// An optional, textual description; an empty string clears it
    #[arg(long)]
    pub description: Option<String>,

    /// How load is spread over the backend (UTILIZATION, RATE or CONNECTION)
    #[arg(long, value_parser = uppercase)]
    pub balancing_mode: Option<String>,

    /// Target CPU utilization of the group, between 0.0 and 1.0
    #[arg(long)]
    pub max_utilization: Option<f64>,

    /// Maximum requests per second for the whole group
    #[arg(long, group = "capacity")]
    pub max_rate: Option<i64>,

    /// Maximum requests per second for each instance
    #[arg(long, group = "capacity")]
    pub max_rate_per_instance: Option<f64>,

    /// Maximum concurrent connections for the whole group (Alpha)
    #[arg(long, group = "capacity")]
    pub max_connections: Option<i64>,

    /// Maximum concurrent connections for each instance (Alpha)
    #[arg(long, group = "capacity")]
    pub max_connections_per_instance: Option<i64>,

    /// Fraction of the configured capacity to serve, between 0.0 and 1.0
    #[arg(long)]
    pub capacity_scaler: Option<f64>,
}

impl UpdateBackendArgs {
    fn mutation(&self) -> BackendMutation {
        let capacity = self
            .max_rate
            .map(CapacityLimit::MaxRate)
            .or(self.max_rate_per_instance.map(CapacityLimit::MaxRatePerInstance))
            .or(self.max_connections.map(CapacityLimit::MaxConnections))
            .or(self
                .max_connections_per_instance
                .map(CapacityLimit::MaxConnectionsPerInstance));

        BackendMutation {
            description: FieldUpdate::from_text_flag(self.description.clone()),
            balancing_mode: self.balancing_mode.clone().map(BalancingMode::from),
            max_utilization: self.max_utilization,
            capacity,
            capacity_scaler: self.capacity_scaler,
        }
    }

    fn scope_hints(&self) -> ScopeHints {
        ScopeHints {
            zone: self.instance_group_zone.clone().or_else(|| self.zone.clone()),
            region: self.instance_group_region.clone(),
        }
    }
}

/// Update the settings of a backend service
pub async fn update_service(
    client: &GcpClient,
    resolver: &ReferenceResolver,
    channel: Channel,
    args: &UpdateServiceArgs,
) -> Result<UpdateOutcome<BackendService>> {
    let caps = channel.capabilities();
    let reference = resolver.resolve_global("backendServices", &args.name)?;
    let services = BackendServiceClient::new(client, caps);

    let policy = UpdateServicePolicy::new(caps, &services.api_base(), args.mutation(resolver)?);
    let outcome = ResourceUpdater::new(&services)
        .update(&reference, &policy)
        .await?;
    Ok(outcome)
}

/// Update the backend of a backend service pointing at one instance group
pub async fn update_backend(
    client: &GcpClient,
    resolver: &ReferenceResolver,
    channel: Channel,
    args: &UpdateBackendArgs,
) -> Result<UpdateOutcome<BackendService>> {
    let caps = channel.capabilities();

    let mutation = args.mutation();
    if mutation.is_empty() {
        return Err(UpdateError::NoFieldsSpecified.into());
    }
    if args.instance_group_region.is_some() && !caps.regional_instance_groups() {
        return Err(UpdateError::unsupported(
            UpdateOption::InstanceGroupRegion.flag(),
            caps.channel.to_string(),
        )
        .into());
    }

    let allowed = if caps.regional_instance_groups() {
        ScopeKinds::ZONAL_OR_REGIONAL
    } else {
        ScopeKinds::ZONAL
    };
    let group = resolver.resolve_scoped(
        "instanceGroups",
        &args.instance_group,
        &args.scope_hints(),
        allowed,
    )?;
    let reference = resolver.resolve_global("backendServices", &args.name)?;

    let services = BackendServiceClient::new(client, caps);
    let policy = UpdateBackendPolicy::new(caps, group, reference.name(), mutation);
    let outcome = ResourceUpdater::new(&services)
        .update(&reference, &policy)
        .await?;
    Ok(outcome)
}

pub(super) async fn run(ctx: &Context, args: ComputeArgs) -> Result<()> {
    let ComputeCommand::BackendServices(services) = args.command;

    let client = ctx.client().await?;
    let resolver = ctx.resolver(&client.project_id);

    let (name, outcome) = match services.command {
        BackendServicesCommand::Update(args) => {
            let outcome = update_service(&client, &resolver, ctx.channel, &args).await?;
            (args.name, outcome)
        }
        BackendServicesCommand::UpdateBackend(args) => {
            if args.zone.is_some() {
                tracing::warn!("--zone used instead of --instance-group-zone");
                eprintln!("WARNING: The --zone flag is deprecated, use --instance-group-zone instead.");
            }
            let outcome = update_backend(&client, &resolver, ctx.channel, &args).await?;
            (args.name, outcome)
        }
    };

    report(&name, &outcome);
    Ok(())
}

fn report(name: &str, outcome: &UpdateOutcome<BackendService>) {
    match outcome {
        UpdateOutcome::Updated(service) => {
            let link = service.self_link.as_deref().unwrap_or(name);
            eprintln!("Updated [{}].", link);
        }
        UpdateOutcome::Unchanged(_) => {
            eprintln!("No change requested; skipping update for [{}].", name);
        }
    }
}
