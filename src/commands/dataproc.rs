//! `dataproc jobs submit` commands

use super::{print_yaml, Context};
use crate::compute::Channel;
use crate::dataproc::types::{
    generate_job_id, parse_label, parse_property, validate_job_id, JobScheduling,
};
use crate::dataproc::{DataprocClient, Job, JobDriver, JobReference, PySparkJob, SparkJob};
use crate::error::UpdateError;
use crate::gcp::client::GcpClient;
use anyhow::Result;
use clap::{ArgGroup, Args, Subcommand};

/// Region used when none is given
pub const DEFAULT_REGION: &str = "global";

#[derive(Args, Debug)]
pub struct DataprocArgs {
    /// Region of the cluster and its jobs
    #[arg(long, global = true, default_value = DEFAULT_REGION)]
    pub region: String,

    #[command(subcommand)]
    pub command: DataprocCommand,
}

impl DataprocArgs {
    pub(super) fn path(&self) -> String {
        let DataprocCommand::Jobs(JobsCommand::Submit(submit)) = &self.command;
        format!("jobs.submit.{}", submit.kind())
    }
}

#[derive(Subcommand, Debug)]
pub enum DataprocCommand {
    /// Submit and manage jobs
    #[command(subcommand)]
    Jobs(JobsCommand),
}

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// Submit a job to a cluster
    #[command(subcommand)]
    Submit(SubmitCommand),
}

#[derive(Subcommand, Debug)]
pub enum SubmitCommand {
    /// Submit a Spark job
    Spark(SparkArgs),
    /// Submit a PySpark job
    #[command(name = "pyspark")]
    PySpark(PySparkArgs),
}

impl SubmitCommand {
    fn kind(&self) -> &'static str {
        match self {
            SubmitCommand::Spark(_) => "spark",
            SubmitCommand::PySpark(_) => "pyspark",
        }
    }
}

/// Flags shared by every job type
#[derive(Args, Debug, Clone, Default)]
pub struct SubmitCommonArgs {
    /// The Dataproc cluster to submit the job to
    #[arg(long)]
    pub cluster: String,

    /// Id of the job; generated when omitted
    #[arg(long)]
    pub id: Option<String>,

    /// Labels to attach, as KEY=VALUE pairs
    #[arg(long, value_delimiter = ',', value_parser = parse_label)]
    pub labels: Vec<(String, String)>,

    /// How many times per hour the job may be restarted after failing (Beta)
    #[arg(long)]
    pub max_failures_per_hour: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
#[command(group(ArgGroup::new("main").required(true).args(["jar", "class"])))]
pub struct SparkArgs {
    #[command(flatten)]
    pub common: SubmitCommonArgs,

    /// URI of the jar holding the main class
    #[arg(long)]
    pub jar: Option<String>,

    /// Main class of a jar given with --jars
    #[arg(long)]
    pub class: Option<String>,

    /// Jars added to the driver and executor classpaths
    #[arg(long, value_delimiter = ',')]
    pub jars: Vec<String>,

    /// Spark properties, as KEY=VALUE pairs
    #[arg(long, value_delimiter = ',', value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Arguments passed to the driver, after `--`
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl SparkArgs {
    fn driver(&self) -> Result<JobDriver, UpdateError> {
        Ok(JobDriver::Spark(SparkJob {
            main_class: self.class.clone(),
            main_jar_file_uri: self.jar.as_deref().map(|j| remote_uri("--jar", j)).transpose()?,
            jar_file_uris: remote_uris("--jars", &self.jars)?,
            args: self.args.clone(),
            properties: self.properties.iter().cloned().collect(),
        }))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PySparkArgs {
    /// URI of the main Python file
    pub py_file: String,

    #[command(flatten)]
    pub common: SubmitCommonArgs,

    /// Python files added to the PYTHONPATH
    #[arg(long, value_delimiter = ',')]
    pub py_files: Vec<String>,

    /// Jars added to the driver and executor classpaths
    #[arg(long, value_delimiter = ',')]
    pub jars: Vec<String>,

    /// Spark properties, as KEY=VALUE pairs
    #[arg(long, value_delimiter = ',', value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Arguments passed to the driver, after `--`
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl PySparkArgs {
    fn driver(&self) -> Result<JobDriver, UpdateError> {
        Ok(JobDriver::PySpark(PySparkJob {
            main_python_file_uri: remote_uri("PY_FILE", &self.py_file)?,
            python_file_uris: remote_uris("--py-files", &self.py_files)?,
            jar_file_uris: remote_uris("--jars", &self.jars)?,
            args: self.args.clone(),
            properties: self.properties.iter().cloned().collect(),
        }))
    }
}

/// Files must already be reachable by the cluster; local files are not staged
fn remote_uri(option: &str, uri: &str) -> Result<String, UpdateError> {
    if uri.contains("://") {
        Ok(uri.to_string())
    } else {
        Err(UpdateError::invalid_value(
            option,
            format!(
                "{} is a local path; upload it to Cloud Storage and pass its gs:// URI",
                uri
            ),
        ))
    }
}

fn remote_uris(option: &str, uris: &[String]) -> Result<Vec<String>, UpdateError> {
    uris.iter().map(|u| remote_uri(option, u)).collect()
}

/// Submit a job to an existing cluster without waiting for it to finish
pub async fn submit_job(
    client: &GcpClient,
    region: &str,
    channel: Channel,
    common: &SubmitCommonArgs,
    driver: JobDriver,
) -> Result<Job> {
    if common.max_failures_per_hour.is_some() && channel == Channel::Ga {
        return Err(UpdateError::unsupported("--max-failures-per-hour", channel.to_string()).into());
    }
    let job_id = match &common.id {
        Some(id) => {
            validate_job_id(id).map_err(|reason| UpdateError::invalid_value("--id", reason))?;
            id.clone()
        }
        None => generate_job_id(),
    };

    let dataproc = DataprocClient::new(client, &client.project_id, region);
    let cluster = dataproc.get_cluster(&common.cluster).await?;
    tracing::debug!(
        "Cluster [{}] is {}",
        common.cluster,
        cluster
            .status
            .as_ref()
            .and_then(|s| s.state.as_deref())
            .unwrap_or("in an unknown state")
    );

    let reference = JobReference {
        project_id: dataproc.project().to_string(),
        job_id,
    };
    let mut job = Job::new(reference.clone(), &common.cluster, driver);
    job.labels = common.labels.iter().cloned().collect();
    job.scheduling = common.max_failures_per_hour.map(|n| JobScheduling {
        max_failures_per_hour: Some(n),
    });

    let mut submitted = dataproc.submit_job(job).await?;
    if submitted.reference.is_none() {
        submitted.reference = Some(reference);
    }
    Ok(submitted)
}

pub(super) async fn run(ctx: &Context, args: DataprocArgs) -> Result<()> {
    let DataprocCommand::Jobs(JobsCommand::Submit(submit)) = args.command;
    let (common, driver) = match &submit {
        SubmitCommand::Spark(spark) => (&spark.common, spark.driver()?),
        SubmitCommand::PySpark(pyspark) => (&pyspark.common, pyspark.driver()?),
    };

    let client = ctx.client().await?;
    let job = submit_job(&client, &args.region, ctx.channel, common, driver).await?;

    eprintln!("Job [{}] submitted.", job.job_id().unwrap_or_default());
    print_yaml(&job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        submit: SubmitCommand,
    }

    fn parse(args: &[&str]) -> Result<SubmitCommand, clap::Error> {
        TestCli::try_parse_from(std::iter::once("submit").chain(args.iter().copied()))
            .map(|cli| cli.submit)
    }

    #[test]
    fn test_spark_flags_and_driver_args() {
        let SubmitCommand::Spark(spark) = parse(&[
            "spark",
            "--cluster",
            "analytics",
            "--class",
            "org.example.Etl",
            "--jars",
            "gs://b/etl.jar,gs://b/deps.jar",
            "--labels",
            "team=data,env=prod",
            "--properties",
            "spark.executor.memory=4g",
            "--",
            "--day",
            "2024-05-01",
        ])
        .unwrap() else {
            panic!("expected a spark job");
        };

        assert_eq!(spark.common.cluster, "analytics");
        assert_eq!(spark.common.labels.len(), 2);
        assert_eq!(spark.args, vec!["--day", "2024-05-01"]);

        let JobDriver::Spark(job) = spark.driver().unwrap() else {
            panic!("expected a spark driver");
        };
        assert_eq!(job.main_class.as_deref(), Some("org.example.Etl"));
        assert_eq!(job.jar_file_uris.len(), 2);
        assert_eq!(job.properties["spark.executor.memory"], "4g");
    }

    #[test]
    fn test_spark_needs_exactly_one_main() {
        assert!(parse(&["spark", "--cluster", "c"]).is_err());
        assert!(parse(&[
            "spark", "--cluster", "c", "--jar", "gs://b/a.jar", "--class", "A"
        ])
        .is_err());
    }

    #[test]
    fn test_cluster_is_required() {
        assert!(parse(&["pyspark", "gs://b/main.py"]).is_err());
    }

    #[test]
    fn test_invalid_label_is_rejected_by_parser() {
        assert!(parse(&["pyspark", "gs://b/main.py", "--cluster", "c", "--labels", "Team=x"]).is_err());
    }

    #[test]
    fn test_local_files_are_rejected() {
        let args = PySparkArgs {
            py_file: "./main.py".into(),
            ..Default::default()
        };
        assert!(matches!(
            args.driver(),
            Err(UpdateError::InvalidValue { option, .. }) if option == "PY_FILE"
        ));

        let args = PySparkArgs {
            py_file: "gs://b/main.py".into(),
            py_files: vec!["gs://b/lib.py".into(), "helpers.py".into()],
            ..Default::default()
        };
        assert!(args.driver().is_err());
    }
}
