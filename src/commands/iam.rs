//! `iam service-accounts` commands

use super::{print_yaml, Context};
use crate::gcp::client::GcpClient;
use crate::iam::{service_account_reference, Policy, RemoveBinding, ServiceAccountPolicyClient};
use crate::resource::{on_status, retry_on, ResourceUpdater, RetryPolicy};
use anyhow::Result;
use clap::{Args, Subcommand};
use reqwest::StatusCode;

/// A concurrent policy write invalidates the etag we read
const RETRY_STATUSES: &[StatusCode] = &[StatusCode::CONFLICT];

#[derive(Args, Debug)]
pub struct IamArgs {
    #[command(subcommand)]
    pub command: IamCommand,
}

impl IamArgs {
    pub(super) fn path(&self) -> String {
        let IamCommand::ServiceAccounts(args) = &self.command;
        match &args.command {
            ServiceAccountsCommand::RemoveIamPolicyBinding(_) => {
                "service-accounts.remove-iam-policy-binding".to_string()
            }
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum IamCommand {
    /// Service accounts of a project
    ServiceAccounts(ServiceAccountsArgs),
}

#[derive(Args, Debug)]
pub struct ServiceAccountsArgs {
    #[command(subcommand)]
    pub command: ServiceAccountsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ServiceAccountsCommand {
    /// Remove an IAM policy binding from a service account
    RemoveIamPolicyBinding(RemoveBindingArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RemoveBindingArgs {
    /// The service account address whose policy to remove from
    #[arg(value_name = "IAM-ADDRESS")]
    pub address: String,

    /// The member to remove, e.g. user:alice@example.com
    #[arg(long)]
    pub member: String,

    /// The role to remove the member from, e.g. roles/iam.serviceAccountUser
    #[arg(long)]
    pub role: String,
}

/// Remove a member from a role of a service account's policy, retrying the
/// whole read-modify-write when a concurrent writer wins
pub async fn remove_iam_policy_binding(
    client: &GcpClient,
    args: &RemoveBindingArgs,
    retry: &RetryPolicy,
) -> Result<Policy> {
    let reference = service_account_reference(&args.address)?;
    let policies = ServiceAccountPolicyClient::new(client);
    let edit = RemoveBinding::new(&args.member, &args.role);
    let updater = ResourceUpdater::new(&policies);

    let outcome = retry_on(
        retry,
        || updater.update(&reference, &edit),
        on_status(RETRY_STATUSES),
    )
    .await?;

    Ok(outcome.into_resource())
}

pub(super) async fn run(ctx: &Context, args: IamArgs) -> Result<()> {
    let IamCommand::ServiceAccounts(accounts) = args.command;
    let ServiceAccountsCommand::RemoveIamPolicyBinding(args) = accounts.command;

    let client = ctx.client().await?;
    let policy = remove_iam_policy_binding(&client, &args, &RetryPolicy::default()).await?;

    eprintln!("Updated IAM policy for serviceAccount [{}].", args.address);
    print_yaml(&policy)
}
