//! Configuration loading helpers for the `labcon` CLI.
//!
//! Configuration flags are peeled off the front of the argument list and
//! handed to `ortho_config`; everything from the first other token on is
//! parsed as the subcommand.

use std::ffi::{OsStr, OsString};

use labcon_config::Config;

use crate::errors::AppError;

/// CLI flags recognised by the configuration loader.
///
/// Keep in sync with the fields of [`Config`].
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--daemon-socket",
    "--database-path",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::resolve_from(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Skip;
    }
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Skip
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut pending_value = false;
    for argument in rest {
        if pending_value {
            config_arguments.push(argument.clone());
            pending_value = false;
            continue;
        }
        match process_config_flag(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                pending_value = needs_value;
            }
            FlagAction::Skip => break,
        }
    }

    let command_start = config_arguments.len();
    ConfigArgumentSplit {
        config_arguments,
        command_start,
    }
}

/// Program name followed by everything after the configuration flags.
pub(crate) fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    args.first()
        .into_iter()
        .chain(args.get(split.command_start..).unwrap_or_default())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn inline_value_flags_do_not_need_follow_up_value() {
        assert_eq!(
            process_config_flag(OsStr::new("--log-filter=debug")),
            FlagAction::Include { needs_value: false }
        );
    }

    #[test]
    fn separate_value_flags_consume_following_argument() {
        assert_eq!(
            process_config_flag(OsStr::new("--daemon-socket")),
            FlagAction::Include { needs_value: true }
        );
    }

    #[test]
    fn non_flag_arguments_signal_stop() {
        assert_eq!(process_config_flag(OsStr::new("list")), FlagAction::Skip);
    }

    #[test]
    fn unknown_flags_are_skipped() {
        assert_eq!(process_config_flag(OsStr::new("--token")), FlagAction::Skip);
    }

    #[test]
    fn splits_leading_configuration_flags() {
        let args = os_args(&[
            "labcon",
            "--daemon-socket",
            "tcp://127.0.0.1:6000",
            "--log-filter=debug",
            "operation",
            "pump",
            "--token",
            "T",
        ]);
        let split = split_config_arguments(&args);
        assert_eq!(
            split.config_arguments,
            os_args(&[
                "labcon",
                "--daemon-socket",
                "tcp://127.0.0.1:6000",
                "--log-filter=debug"
            ])
        );
        assert_eq!(
            prepare_cli_arguments(&args, &split),
            os_args(&["labcon", "operation", "pump", "--token", "T"])
        );
    }

    #[test]
    fn flags_after_the_subcommand_stay_with_it() {
        let args = os_args(&["labcon", "list", "--daemon-socket", "tcp://x:1"]);
        let split = split_config_arguments(&args);
        assert_eq!(split.config_arguments, os_args(&["labcon"]));
        assert_eq!(prepare_cli_arguments(&args, &split), args);
    }

    #[test]
    fn empty_argument_lists_are_tolerated() {
        let split = split_config_arguments(&[]);
        assert_eq!(split.command_start, 0);
        assert!(prepare_cli_arguments(&[], &split).is_empty());
    }
}
