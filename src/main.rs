//! Main application entry point.
//!
//! Parses the command line, handles help and version requests, and runs the light
//! controller until an operator stops it. Exit code 0 means a requested shutdown;
//! any error exits with 1.

use duskswitch::{
    Duskswitch,
    args::{self, CliAction, ParsedArgs},
    common::constants::{EXIT_FAILURE, EXIT_SUCCESS},
    log_end, log_error_exit, log_version,
};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let code = match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            EXIT_SUCCESS
        }
        CliAction::ShowHelp => {
            args::display_help();
            EXIT_SUCCESS
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            EXIT_FAILURE
        }
        CliAction::Run {
            port,
            debug_enabled,
            config_path,
        } => {
            log_version!();
            match Duskswitch::new(port, debug_enabled)
                .with_config_path(config_path)
                .run()
            {
                Ok(()) => {
                    log_end!();
                    EXIT_SUCCESS
                }
                Err(e) => {
                    log_error_exit!("{:#}", e);
                    EXIT_FAILURE
                }
            }
        }
    };

    std::process::exit(code);
}
