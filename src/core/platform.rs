//! Platform-specific error reporting and argument handling

/// Report a fatal error and exit with code 1.
pub fn handle_error(error: anyhow::Error) -> ! {
    eprintln!();
    eprintln!("Error running linesetter:");
    eprintln!("{error:#}");
    eprintln!();
    eprintln!("Try running with --help for usage information.");
    std::process::exit(1);
}

/// Parse and validate command line arguments, exiting on invalid input.
pub fn get_cli_args() -> crate::core::cli::CliArgs {
    use clap::Parser;
    let cli_args = crate::core::cli::CliArgs::parse();
    if let Err(message) = cli_args.validate() {
        handle_error(anyhow::anyhow!(message));
    }
    cli_args
}
