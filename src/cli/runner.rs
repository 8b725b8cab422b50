//! CLI runner - executes commands

use crate::auth::{resolve_token, AuthConfig, Token};
use crate::cli::commands::{Cli, Commands, RunArgs};
use crate::error::{Error, Result, ResultExt};
use crate::github::{GraphQlFetcher, RestFetcher};
use crate::http::HttpClient;
use crate::items::{parse_items, read_items, WorkItem};
use crate::output::{flatten_rows, TableWriter};
use crate::pagination::{BatchDriver, BatchReport};
use crate::reports::{check_vars, list_builtin, load_report, ApiKind, ReportDefinition};
use crate::settings::Settings;
use crate::types::StringMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a `run` produced
#[derive(Debug)]
pub struct RunOutcome {
    /// Report that ran
    pub report: String,
    /// Table written
    pub output: PathBuf,
    /// Per-item results
    pub batch: BatchReport<WorkItem>,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run(args) => {
                let outcome = self.run_report(args).await?;
                print_summary(&outcome);
                Ok(())
            }
            Commands::Reports => self.list_reports(),
            Commands::Show { report } => self.show(report),
            Commands::Validate { file } => self.validate(file),
        }
    }

    /// Settings with CLI flags applied on top of file and environment
    pub fn settings(&self, concurrency: Option<usize>) -> Result<Settings> {
        let mut settings = Settings::load(self.cli.settings.as_deref())?;

        if let Some(dir) = &self.cli.output_dir {
            settings.output_dir.clone_from(dir);
        }
        if let Some(format) = self.cli.format {
            settings.format = format;
        }
        if let Some(token_file) = &self.cli.token_file {
            settings.token_file.clone_from(token_file);
        }
        if let Some(concurrency) = concurrency {
            settings.concurrency = concurrency;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Token for the run: `--token-file` beats `GITHUB_TOKEN`, which beats
    /// the settings key file
    fn token(&self, settings: &Settings) -> Result<Token> {
        let from_env = if self.cli.token_file.is_some() {
            None
        } else {
            Token::from_env()
        };
        resolve_token(from_env, Some(&settings.token_file))
    }

    /// Work items from `--item`, `--url` and `--items-file`, deduplicated
    fn work_items(&self, args: &RunArgs, def: &ReportDefinition) -> Result<Vec<WorkItem>> {
        let mut items = parse_items(
            args.items.iter().chain(&args.urls).map(String::as_str),
            def.item_kind,
        )?;

        if let Some(path) = &args.items_file {
            for item in read_items(path, def.item_kind)? {
                if !items.contains(&item) {
                    items.push(item);
                }
            }
        }

        if items.is_empty() {
            return Err(Error::config(format!(
                "Report '{}' needs {} items: use --item, --url or --items-file",
                def.name, def.item_kind
            )));
        }
        Ok(items)
    }

    /// Run a report end to end and write its table
    ///
    /// Everything that can be checked without the network is checked first.
    /// Per-item fetch failures end up in the outcome, not in the error.
    pub async fn run_report(&self, args: &RunArgs) -> Result<RunOutcome> {
        let settings = self.settings(args.concurrency)?;
        let def = load_report(&args.report)?;
        let items = self.work_items(args, &def)?;

        let overrides: StringMap = args.vars.iter().cloned().collect();
        let vars = def.resolve_vars(&overrides);
        check_vars(&def, &vars)?;

        let pagination =
            settings.apply_timeouts(def.pagination_config(args.page_size, args.max_pages));
        let driver = BatchDriver::new(pagination, settings.concurrency)?;
        let token = self.token(&settings)?;

        let client = Arc::new(
            HttpClient::with_auth(settings.http_client_config(), AuthConfig::Token(token))
                .context("Cannot build HTTP client")?,
        );

        info!(
            "Running report '{}' over {} {} items",
            def.name,
            items.len(),
            def.item_kind
        );

        let batch = match def.api {
            ApiKind::Graphql => {
                let fetcher = GraphQlFetcher::new(
                    client,
                    settings.graphql_url.clone(),
                    def.connection_query(vars)?,
                );
                driver.run_all(&fetcher, items).await
            }
            ApiKind::Rest => {
                let fetcher = RestFetcher::new(client, def.rest_listing(vars)?);
                driver.run_all(&fetcher, items).await
            }
        };

        let rows: Vec<_> = batch
            .iter()
            .flat_map(|result| flatten_rows(&result.work_item.label(), result.chronological()))
            .collect();
        debug!("Flattened {} rows", rows.len());

        let writer = TableWriter::new(&settings.output_dir, settings.format);
        let output = writer.write(&def.output_prefix(), &rows)?;

        let stats = batch.stats();
        if stats.failed > 0 {
            warn!(
                "{} of {} items failed; partial records were kept",
                stats.failed, stats.items
            );
        }

        Ok(RunOutcome {
            report: def.name,
            output,
            batch,
        })
    }

    /// List built-in reports
    fn list_reports(&self) -> Result<()> {
        for name in list_builtin() {
            let def = load_report(name)?;
            println!(
                "{name:<16} {:<8} {}",
                def.item_kind.to_string(),
                def.description.as_deref().unwrap_or_default()
            );
        }
        Ok(())
    }

    /// Print a report definition as YAML
    fn show(&self, report: &str) -> Result<()> {
        let def = load_report(report)?;
        print!("{}", serde_yaml::to_string(&def)?);
        Ok(())
    }

    /// Validate a report definition file
    fn validate(&self, file: &std::path::Path) -> Result<()> {
        if !file.exists() {
            return Err(Error::FileNotFound {
                path: file.display().to_string(),
            });
        }
        let def = load_report(file)?;
        println!(
            "Report '{}' is valid ({} API, {} items, output prefix '{}')",
            def.name,
            match def.api {
                ApiKind::Graphql => "GraphQL",
                ApiKind::Rest => "REST",
            },
            def.item_kind,
            def.output_prefix()
        );
        Ok(())
    }
}

/// Per-item summary on stdout
fn print_summary(outcome: &RunOutcome) {
    println!("Report: {}", outcome.report);
    for result in outcome.batch.iter() {
        let line = format!(
            "  {:<40} {:<5} {:>7} records {:>4} pages",
            result.work_item.label(),
            result.status.to_string(),
            result.len(),
            result.pages_fetched()
        );
        match result.error_message() {
            Some(message) => println!("{line}  {message}"),
            None => println!("{line}"),
        }
    }

    let stats = outcome.batch.stats();
    println!(
        "{} items ({} ok, {} failed), {} records in {} ms",
        stats.items, stats.succeeded, stats.failed, stats.records, stats.duration_ms
    );
    println!("Output: {}", outcome.output.display());
}
