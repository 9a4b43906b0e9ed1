//! Render command
//!
//! Resolves the pipeline variables and prints what a run would submit.
//! Makes no external calls.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use flightflow_core::domain::batch::BatchId;
use flightflow_core::domain::context::{EnvironmentContext, VariableSource};
use flightflow_core::domain::job::{DEFAULT_RUNTIME_VERSION, JobSpecification, SubmissionSettings};
use flightflow_core::domain::trigger::TriggerCondition;

use crate::config::Config;

/// Execution-service settings for the rendered specification
#[derive(Args)]
pub struct RenderArgs {
    /// Serverless runtime version
    #[arg(long, env = "RUNTIME_VERSION", default_value = DEFAULT_RUNTIME_VERSION)]
    runtime_version: String,

    /// Job artifact (defaults to the artifact inside the context's bucket)
    #[arg(long, env = "MAIN_PYTHON_FILE_URI")]
    main_python_file_uri: Option<String>,

    #[arg(long, env = "SERVICE_ACCOUNT")]
    service_account: Option<String>,

    #[arg(long, env = "NETWORK_URI")]
    network_uri: Option<String>,

    #[arg(long, env = "SUBNETWORK_URI")]
    subnetwork_uri: Option<String>,

    /// Extra python files, comma separated
    #[arg(long, env = "PYTHON_FILE_URIS", value_delimiter = ',')]
    python_file_uris: Vec<String>,

    /// Jars on the job classpath, comma separated
    #[arg(long, env = "JAR_FILE_URIS", value_delimiter = ',')]
    jar_file_uris: Vec<String>,

    /// Print only the job specification JSON
    #[arg(long)]
    json: bool,
}

/// Everything a run derives before its first external call
#[derive(Debug)]
pub struct RenderedRun {
    pub batch_id: BatchId,
    pub trigger: TriggerCondition,
    pub spec: JobSpecification,
}

pub fn handle_render_command(args: RenderArgs, config: &Config) -> Result<()> {
    let variables = config.variables()?;
    let settings = settings(&args, config);
    let rendered = render(variables.as_ref(), &settings)?;

    let spec_json = serde_json::to_string_pretty(&rendered.spec)?;

    if args.json {
        println!("{}", spec_json);
        return Ok(());
    }

    println!("{} {}", "Batch ID:".bold(), rendered.batch_id.to_string().cyan());
    println!("{} {}", "Trigger: ".bold(), rendered.trigger);
    println!();
    println!("{}", spec_json);

    Ok(())
}

/// Settings as the runner builds them from the same environment
///
/// The project never appears in the rendered output, so it is optional here.
fn settings(args: &RenderArgs, config: &Config) -> SubmissionSettings {
    SubmissionSettings {
        project_id: config.project_id.clone().unwrap_or_default(),
        region: config.region.clone(),
        runtime_version: args.runtime_version.clone(),
        main_python_file_uri: args.main_python_file_uri.clone(),
        python_file_uris: uri_list(&args.python_file_uris),
        jar_file_uris: uri_list(&args.jar_file_uris),
        service_account: args.service_account.clone(),
        network_uri: args.network_uri.clone(),
        subnetwork_uri: args.subnetwork_uri.clone(),
        object_prefix: config.object_prefix.clone(),
    }
}

fn uri_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves the context and derives the run's identifiers and specification
pub fn render(variables: &dyn VariableSource, settings: &SubmissionSettings) -> Result<RenderedRun> {
    let context =
        EnvironmentContext::resolve(variables).context("Failed to resolve pipeline variables")?;

    Ok(RenderedRun {
        batch_id: BatchId::generate(&context.env)?,
        trigger: TriggerCondition::for_context(&context, &settings.object_prefix),
        spec: JobSpecification::build(&context, settings),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use crate::commands::Commands;
    use clap::Parser;
    use flightflow_core::domain::context::MapVariables;

    fn config() -> Config {
        Config {
            project_id: None,
            region: "us-central1".to_string(),
            storage_url: "http://localhost:4443".to_string(),
            batch_url: "http://localhost:8085".to_string(),
            access_token: None,
            variables_file: None,
            object_prefix: "airflow-project".to_string(),
        }
    }

    fn render_args(args: &[&str]) -> RenderArgs {
        let argv = ["flightflow", "render"].into_iter().chain(args.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Render(args) => args,
            _ => panic!("expected render command"),
        }
    }

    fn variables() -> MapVariables {
        MapVariables::new()
            .with("env", "prod")
            .with("gcs_bucket", "flights")
            .with("bq_project", "analytics")
            .with(
                "tables",
                r#"{"transformed_table": "t", "route_insights_table": "r", "origin_insights_table": "o"}"#,
            )
    }

    #[test]
    fn test_render() {
        let rendered = render(&variables(), &SubmissionSettings::new("compute-project")).unwrap();

        assert!(rendered.batch_id.as_str().starts_with("flight-booking-batch-prod-"));
        assert_eq!(
            rendered.trigger.to_string(),
            "gs://flights/airflow-project/source-prod/flight_booking.csv"
        );
        assert_eq!(
            rendered.spec.pyspark_batch.main_python_file_uri,
            "gs://flights/airflow-project/spark-job/spark_job.py"
        );
        assert!(rendered.spec.pyspark_batch.args.contains(&"--env=prod".to_string()));
    }

    #[test]
    fn test_settings_match_runner_settings() {
        let args = render_args(&[
            "--python-file-uris",
            "gs://flights/deps.zip, gs://flights/util.py,",
            "--jar-file-uris",
            "gs://flights/connector.jar",
            "--service-account",
            " runner@compute-project.iam.gserviceaccount.com",
        ]);

        let settings = settings(&args, &config());

        let mut expected = SubmissionSettings::new("");
        expected.runtime_version = args.runtime_version.clone();
        expected.python_file_uris = vec![
            "gs://flights/deps.zip".to_string(),
            "gs://flights/util.py".to_string(),
        ];
        expected.jar_file_uris = vec!["gs://flights/connector.jar".to_string()];
        expected.service_account =
            Some(" runner@compute-project.iam.gserviceaccount.com".to_string());
        assert_eq!(settings, expected);

        let rendered = render(&variables(), &settings).unwrap();
        assert_eq!(
            rendered.spec,
            JobSpecification::build(
                &EnvironmentContext::resolve(&variables()).unwrap(),
                &expected
            )
        );
        assert_eq!(rendered.spec.pyspark_batch.python_file_uris.len(), 2);
    }

    #[test]
    fn test_render_without_project() {
        let settings = settings(&render_args(&[]), &config());
        assert!(settings.project_id.is_empty());
        assert!(render(&variables(), &settings).is_ok());
    }

    #[test]
    fn test_render_reports_missing_variable() {
        let variables = MapVariables::new().with("gcs_bucket", "flights");
        let err = render(&variables, &SubmissionSettings::new("compute-project")).unwrap_err();
        assert!(err.to_string().contains("pipeline variables"));
    }
}
