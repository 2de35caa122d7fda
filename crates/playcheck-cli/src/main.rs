//! Playcheck CLI: list and run end-to-end suites
//!
//! ## Usage
//!
//! ```bash
//! playcheck list                            # Every suite and scenario
//! playcheck list -t todomvc                 # One site
//! playcheck run -t saucedemo --retries 1    # Run a site with one retry
//! playcheck run -f "login" --report junit   # Filter, write junit.xml
//! playcheck config -c playcheck.yaml        # Show effective settings
//! ```

use clap::Parser;
use playcheck_cli::{
    logging, render_list, resolve_run_config, CliConfig, CliError, CliResult, Cli, Commands,
    ConfigArgs, RunOverrides, SuiteRunner, Verbosity,
};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config);

    let catalog = playcheck::scenarios::catalog();
    match cli.command {
        Commands::List(args) => {
            print!("{}", render_list(&catalog, &args)?);
            Ok(())
        }
        Commands::Run(args) => {
            let mut runner = SuiteRunner::new(config);
            let report = runner.run(&catalog, &args).await?;
            if report.all_passed() {
                Ok(())
            } else {
                Err(CliError::test_execution(format!(
                    "{} scenario(s) failed",
                    report.failed_count()
                )))
            }
        }
        Commands::Config(args) => show_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(cli.color.clone().into())
        .with_log_format(cli.log_format.into())
}

fn show_config(args: &ConfigArgs) -> CliResult<()> {
    let config = resolve_run_config(args.config.as_deref(), &RunOverrides::default())?;
    let yaml = serde_yaml_ng::to_string(&config).map_err(|e| CliError::config(e.to_string()))?;
    print!("{yaml}");
    Ok(())
}
