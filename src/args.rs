//! Command-line argument parsing and processing.
//!
//! duskswitch takes one positional argument, the serial port of the light controller,
//! plus the usual help, version, debug and config flags.

use std::path::PathBuf;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Drive the controller on `port`
    Run {
        port: String,
        debug_enabled: bool,
        config_path: Option<PathBuf>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to missing or unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped. Version takes precedence over
    /// help, and both take precedence over argument errors.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_path: Option<PathBuf> = None;
        let mut positionals: Vec<String> = Vec::new();

        let mut args_iter = args.into_iter().skip(1).map(|s| s.as_ref().to_string());
        while let Some(arg) = args_iter.next() {
            match arg.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" => match args_iter.next() {
                    Some(path) => config_path = Some(PathBuf::from(path)),
                    None => {
                        log_warning!("Missing value for {}", arg);
                        unknown_arg_found = true;
                    }
                },
                _ if arg.starts_with('-') && arg.len() > 1 => {
                    log_warning!("Unknown argument: {}", arg);
                    unknown_arg_found = true;
                }
                _ => positionals.push(arg),
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            match <[String; 1]>::try_from(positionals) {
                Ok([port]) => CliAction::Run {
                    port,
                    debug_enabled,
                    config_path,
                },
                Err(positionals) => {
                    if positionals.is_empty() {
                        log_warning!("Missing required argument: <PORT>");
                    } else {
                        log_warning!("Expected one serial port, got: {}", positionals.join(" "));
                    }
                    CliAction::ShowHelpDueToError
                }
            }
        };

        ParsedArgs { action }
    }

    /// Parse the process's own arguments.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("duskswitch [OPTIONS] <PORT>");
    log_block_start!("Arguments:");
    log_indented!("<PORT>                 Serial port of the light controller (e.g. /dev/ttyUSB0)");
    log_block_start!("Options:");
    log_indented!("-c, --config <FILE>    Use a custom configuration file");
    log_indented!("-d, --debug            Show serial traffic and scheduling details");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(port: &str, debug_enabled: bool, config_path: Option<&str>) -> CliAction {
        CliAction::Run {
            port: port.to_string(),
            debug_enabled,
            config_path: config_path.map(PathBuf::from),
        }
    }

    #[test]
    fn test_parse_port_only() {
        let parsed = ParsedArgs::parse(vec!["duskswitch", "/dev/ttyUSB0"]);
        assert_eq!(parsed.action, run("/dev/ttyUSB0", false, None));
    }

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["duskswitch"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_debug_flag() {
        let parsed = ParsedArgs::parse(vec!["duskswitch", "--debug", "COM3"]);
        assert_eq!(parsed.action, run("COM3", true, None));

        // Order doesn't matter
        let parsed = ParsedArgs::parse(vec!["duskswitch", "COM3", "-d"]);
        assert_eq!(parsed.action, run("COM3", true, None));
    }

    #[test]
    fn test_parse_config_flag() {
        let parsed = ParsedArgs::parse(vec![
            "duskswitch",
            "-c",
            "/etc/duskswitch.toml",
            "/dev/ttyACM0",
        ]);
        assert_eq!(
            parsed.action,
            run("/dev/ttyACM0", false, Some("/etc/duskswitch.toml"))
        );
    }

    #[test]
    fn test_config_flag_requires_value() {
        let parsed = ParsedArgs::parse(vec!["duskswitch", "/dev/ttyUSB0", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_help_flags() {
        for flag in ["--help", "-h"] {
            let parsed = ParsedArgs::parse(vec!["duskswitch", flag]);
            assert_eq!(parsed.action, CliAction::ShowHelp);
        }
    }

    #[test]
    fn test_parse_version_flags() {
        for flag in ["--version", "-V", "-v"] {
            let parsed = ParsedArgs::parse(vec!["duskswitch", flag]);
            assert_eq!(parsed.action, CliAction::ShowVersion);
        }
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["duskswitch", "--help", "--version", "--bogus"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_help_with_port_still_shows_help() {
        let parsed = ParsedArgs::parse(vec!["duskswitch", "/dev/ttyUSB0", "-h"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["duskswitch", "--unknown", "/dev/ttyUSB0"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_extra_positional_rejected() {
        let parsed = ParsedArgs::parse(vec!["duskswitch", "/dev/ttyUSB0", "/dev/ttyUSB1"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_lone_dash_is_a_port() {
        let parsed = ParsedArgs::parse(vec!["duskswitch", "-"]);
        assert_eq!(parsed.action, run("-", false, None));
    }
}
