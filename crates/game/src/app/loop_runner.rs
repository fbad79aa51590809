use std::process::ExitCode;

use ember_engine::run_app;
use tracing::error;

use super::bootstrap::{AppWiring, BootstrapError};

pub(crate) fn run(app: Result<AppWiring, BootstrapError>) -> ExitCode {
    let app = match app {
        Ok(app) => app,
        Err(err) => {
            report_bootstrap_failure(&err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = run_app(app.config, app.core, app.feed) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn report_bootstrap_failure(err: &BootstrapError) {
    error!(error = %err, "bootstrap_failed");
}
