//! `mcpx` entry point.
//!
//! Wiring lives in `mcpx_cli::bootstrap`; this file only maps the result
//! of a run to output and an exit code.

use mcpx_cli::CliError;

#[tokio::main]
async fn main() {
    let argv: Vec<String> = std::env::args().collect();

    let code = match mcpx_cli::run(&argv).await {
        Ok(code) => code,
        // clap prints usage errors and help itself
        Err(CliError::Usage(e)) => e.exit(),
        Err(e) if e.is_interrupted() => {
            eprintln!("{e}");
            e.exit_code()
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    };

    std::process::exit(code);
}
