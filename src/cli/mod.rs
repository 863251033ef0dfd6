//! CLI command handling
//!
//! Builds the collaborators from configuration, runs the suite and formats
//! output.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use crate::cases::CaseSource;
use crate::commands::{Commands, RunArgs};
use crate::common::config::{Config, DatabaseConfig, DatabaseKind};
use crate::common::{Error, Result};
use crate::fixture::{FixtureExecutor, MySqlExecutor, SqliteExecutor};
use crate::http::ReqwestDispatcher;
use crate::testing::{CaseTester, Runner};
use crate::verify::{ConsoleReporter, Verifier};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => run(args).await,
        Commands::Check { cases } => check(&cases).await,
    }
}

/// Load configuration and apply command line overrides
pub fn resolve_config(args: &RunArgs) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(cases) = &args.cases {
        config.cases.file_path = cases.clone();
    }
    if let Some(server) = &args.server {
        config.server.address = server.clone();
    }
    if let Some(database) = &args.database {
        config.database.path = database.clone();
    }
    if let Some(capacity) = args.queue_capacity {
        config.cases.queue_capacity = capacity;
    }
    config
        .verify
        .excluded_headers
        .extend(args.exclude_headers.iter().cloned());
    if let Some(mode) = args.header_mode {
        config.verify.header_mode = mode;
    }
    if args.strict {
        config.verify.strict = true;
    }
    if args.keep_going {
        config.run.fail_fast = false;
    }

    config.validate()?;
    Ok(config)
}

/// Build the fixture executor for the configured database
pub fn fixture_executor(config: &DatabaseConfig) -> Result<Arc<dyn FixtureExecutor>> {
    match config.kind {
        DatabaseKind::Sqlite => Ok(Arc::new(SqliteExecutor::open(&config.path)?)),
        DatabaseKind::Mysql => Ok(Arc::new(MySqlExecutor::new(
            &config.address,
            &config.user,
            &config.password,
            config.name.as_deref(),
        )?)),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    println!(
        "\n{} {}",
        "Running suite:".blue().bold(),
        config.cases.file_path.display().to_string().white().bold()
    );
    println!(
        "  {}",
        format!("server {}", config.server.address).dimmed()
    );

    let executor = fixture_executor(&config.database)?;
    let dispatcher = Arc::new(ReqwestDispatcher::new(
        config.server.address.clone(),
        Duration::from_secs(config.server.timeout_secs),
    )?);
    let verifier =
        Verifier::new(&config.verify.excluded_headers).with_header_mode(config.verify.header_mode);
    let reporter = Arc::new(ConsoleReporter::new(args.verbose));

    let tester =
        CaseTester::new(executor, dispatcher, verifier, reporter).strict(config.verify.strict);
    let runner = Runner::new(tester).fail_fast(config.run.fail_fast);

    let mut source = CaseSource::open(&config.cases.file_path, config.cases.queue_capacity)?;
    println!("\n{}", "Cases:".cyan());
    let summary = runner.run(&mut source).await?;
    summary.print();

    if !summary.completed() {
        return Err(Error::SuiteFailed {
            errored: summary.errored.len(),
        });
    }
    Ok(())
}

async fn check(path: &Path) -> Result<()> {
    let mut source = CaseSource::open(path, 1)?;
    let mut count = 0usize;

    println!("\n{} {}", "Checking suite:".blue().bold(), path.display());
    while let Some(case) = source.next().await? {
        count += 1;
        let method = if case.request.method.is_empty() {
            "GET"
        } else {
            case.request.method.as_str()
        };
        println!(
            "  {} {} {}",
            "✓".green(),
            case.name,
            format!("{} {}", method, case.request.path).dimmed()
        );
    }

    println!("\n{} {} case(s)\n", "✓".green().bold(), count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::HeaderMode;
    use std::path::PathBuf;

    #[test]
    fn test_overrides_win_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("casetest.yaml");
        std::fs::write(
            &config_path,
            "server:\n  address: http://config:1\nverify:\n  excluded_headers: [Date]\n",
        )
        .unwrap();

        let args = RunArgs {
            config: Some(config_path),
            cases: Some(PathBuf::from("/tmp/suite.json")),
            server: Some("http://flag:2".to_string()),
            exclude_headers: vec!["X-Request-Id".to_string()],
            header_mode: Some(HeaderMode::Subset),
            keep_going: true,
            strict: true,
            ..RunArgs::default()
        };

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.cases.file_path, PathBuf::from("/tmp/suite.json"));
        assert_eq!(config.server.address, "http://flag:2");
        assert_eq!(config.verify.excluded_headers, vec!["Date", "X-Request-Id"]);
        assert_eq!(config.verify.header_mode, HeaderMode::Subset);
        assert!(config.verify.strict);
        assert!(!config.run.fail_fast);
    }

    #[tokio::test]
    async fn test_fixture_executor_follows_kind() {
        let sqlite = DatabaseConfig {
            path: PathBuf::from(":memory:"),
            ..DatabaseConfig::default()
        };
        let executor = fixture_executor(&sqlite).unwrap();
        executor
            .execute(&["CREATE TABLE users (id INTEGER)".to_string()])
            .await
            .unwrap();

        let mysql = DatabaseConfig {
            kind: DatabaseKind::Mysql,
            address: "127.0.0.1:1".to_string(),
            ..DatabaseConfig::default()
        };
        let executor = fixture_executor(&mysql).unwrap();
        assert!(executor
            .execute(&["SELECT 1".to_string()])
            .await
            .is_err());

        let bad_port = DatabaseConfig {
            kind: DatabaseKind::Mysql,
            address: "db:port".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(matches!(fixture_executor(&bad_port), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("casetest.toml");
        std::fs::write(&config_path, "").unwrap();

        let args = RunArgs {
            config: Some(config_path),
            queue_capacity: Some(0),
            ..RunArgs::default()
        };
        assert!(matches!(resolve_config(&args), Err(Error::Config(_))));
    }
}
