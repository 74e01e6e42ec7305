//! `dataflow` commands

use super::{print_yaml, render_error, Context};
use crate::dataflow::{DataflowClient, Importance, JobView, MessageFilter, RequestedState};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct DataflowArgs {
    /// Regional endpoint of the jobs
    #[arg(long, global = true)]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: DataflowCommand,
}

impl DataflowArgs {
    pub(super) fn path(&self) -> String {
        let path = match &self.command {
            DataflowCommand::Jobs(jobs) => match jobs {
                JobsCommand::Describe(_) => "jobs.describe",
                JobsCommand::Cancel(_) => "jobs.cancel",
                JobsCommand::Drain(_) => "jobs.drain",
            },
            DataflowCommand::Messages(MessagesCommand::List(_)) => "messages.list",
            DataflowCommand::Metrics(MetricsCommand::List(_)) => "metrics.list",
        };
        path.to_string()
    }
}

#[derive(Subcommand, Debug)]
pub enum DataflowCommand {
    /// Inspect and control jobs
    #[command(subcommand)]
    Jobs(JobsCommand),
    /// Messages logged by jobs
    #[command(subcommand)]
    Messages(MessagesCommand),
    /// Metrics reported by jobs
    #[command(subcommand)]
    Metrics(MetricsCommand),
}

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// Show a job
    Describe(DescribeArgs),
    /// Cancel jobs
    Cancel(JobIdsArgs),
    /// Drain jobs, finishing in-flight work first
    Drain(JobIdsArgs),
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    pub job_id: String,

    #[arg(long, value_enum, default_value_t = JobView::Summary)]
    pub view: JobView,
}

#[derive(Args, Debug)]
pub struct JobIdsArgs {
    #[arg(required = true)]
    pub job_ids: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum MessagesCommand {
    /// List the messages of a job
    List(MessagesListArgs),
}

#[derive(Args, Debug)]
pub struct MessagesListArgs {
    pub job_id: String,

    /// Minimum importance of listed messages
    #[arg(long, value_enum, default_value_t = Importance::Warning)]
    pub importance: Importance,

    /// Only messages at or after this RFC 3339 time
    #[arg(long, value_parser = parse_timestamp)]
    pub after: Option<DateTime<Utc>>,

    /// Only messages before this RFC 3339 time
    #[arg(long, value_parser = parse_timestamp)]
    pub before: Option<DateTime<Utc>>,

    #[arg(long)]
    pub page_size: Option<u32>,

    #[arg(long)]
    pub page_token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum MetricsCommand {
    /// Show the metrics of a job
    List(MetricsListArgs),
}

#[derive(Args, Debug)]
pub struct MetricsListArgs {
    pub job_id: String,

    /// Only metrics that changed after this RFC 3339 time
    #[arg(long, value_parser = parse_timestamp)]
    pub changed_after: Option<DateTime<Utc>>,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

pub(super) async fn run(ctx: &Context, args: DataflowArgs) -> Result<()> {
    let client = ctx.client().await?;
    let dataflow = DataflowClient::new(&client, &client.project_id, args.region);

    match args.command {
        DataflowCommand::Jobs(JobsCommand::Describe(describe)) => {
            let job = dataflow.get_job(&describe.job_id, describe.view).await?;
            print_yaml(&job)
        }
        DataflowCommand::Jobs(JobsCommand::Cancel(ids)) => {
            change_state(&dataflow, &ids.job_ids, RequestedState::Cancelled).await
        }
        DataflowCommand::Jobs(JobsCommand::Drain(ids)) => {
            change_state(&dataflow, &ids.job_ids, RequestedState::Drained).await
        }
        DataflowCommand::Messages(MessagesCommand::List(list)) => {
            let filter = MessageFilter {
                importance: Some(list.importance),
                after: list.after,
                before: list.before,
                page_size: list.page_size,
                page_token: list.page_token,
            };
            let response = dataflow.list_messages(&list.job_id, &filter).await?;

            for message in &response.job_messages {
                println!(
                    "{}\t{}\t{}\t{}",
                    message.id.as_deref().unwrap_or("-"),
                    message.time.as_deref().unwrap_or("-"),
                    message.message_importance.as_deref().unwrap_or("-"),
                    message.message_text.as_deref().unwrap_or_default()
                );
            }
            if let Some(token) = &response.next_page_token {
                eprintln!("More messages available; use --page-token {}", token);
            }
            Ok(())
        }
        DataflowCommand::Metrics(MetricsCommand::List(metrics)) => {
            let result = dataflow
                .get_metrics(&metrics.job_id, metrics.changed_after)
                .await?;
            print_yaml(&result)
        }
    }
}

/// Request `state` for each job in turn, reporting every outcome
async fn change_state(
    dataflow: &DataflowClient<'_>,
    job_ids: &[String],
    state: RequestedState,
) -> Result<()> {
    let (action, done) = match state {
        RequestedState::Cancelled => ("cancel", "Cancelled job"),
        RequestedState::Drained => ("drain", "Started draining job"),
    };

    let mut failed = 0;
    for id in job_ids {
        match dataflow.request_state(id, state).await {
            Ok(_) => eprintln!("{} [{}]", done, id),
            Err(e) => {
                failed += 1;
                eprintln!("Failed to {} job [{}]: {}", action, id, render_error(&e));
            }
        }
    }
    summarize(action, failed, job_ids.len())
}

fn summarize(action: &str, failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("Failed to {} {} of {} jobs", action, failed, total);
    }
    Ok(())
}
