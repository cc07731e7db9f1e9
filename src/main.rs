//! bagccgop - build for all gccgo-supported platforms, with cgo.
//!
//! Cross-builds a Go program inside foreign-architecture chroots, one per
//! Debian port, with a configurable number of parallel jobs.

use bagccgop::cli;
use bagccgop::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new(false);
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.info("Recovery suggestions:");
                for suggestion in suggestions {
                    output.indent_err(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
