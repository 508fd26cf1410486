use clap::Parser;
use dbexport::backend::odbc::{self, OdbcSession};
use dbexport::cli::Cli;
use dbexport::error::ExportError;
use dbexport::{masking, output, pipeline, verbose};
use std::io;
use std::process;

fn main() {
    // Load .env file (optional, ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        output::print_error(&err);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ExportError> {
    // Mode must be settled before any connection attempt.
    let (mut pipeline, app_config) = pipeline::prepare(cli, io::stdin().lock())?;
    verbose::init(app_config.verbose);
    tracing::debug!(
        user = app_config.connection.user.as_deref().unwrap_or("(not set)"),
        password = %masking::format_optional_secret(
            app_config.connection.password.as_ref(),
            app_config.show_secrets
        ),
        "configuration loaded"
    );
    if let Some(mode) = pipeline.mode() {
        tracing::debug!(mode = mode.label(), statement = mode.text(), "input mode selected");
    }

    // Declaration order gives release order: stream, session, environment.
    let env = odbc::open_environment()?;
    let session = OdbcSession::connect(&env, &app_config.connection, app_config.show_secrets)?;
    let sink = output::open_sink(app_config.output_file.as_deref())?;

    let summary = pipeline.run(&session, &app_config.options, sink)?;

    if let Some(ref path) = app_config.output_file {
        output::print_summary(summary.rows, path);
    }
    Ok(())
}
