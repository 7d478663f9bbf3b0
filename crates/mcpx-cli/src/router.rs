//! Decide whether argv names a built-in command or a server alias.
//!
//! Aliases are only known at runtime, so argv is pre-scanned before clap
//! sees it. Built-in names always win over aliases. Global flags are only
//! recognised before the alias; everything after it belongs to the tool.

use mcpx_core::RESERVED_NAMES;

/// Global flags accepted before the command name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalFlags {
    pub refresh: bool,
    pub verbose: bool,
}

/// Where an invocation goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Parse with the static CLI definition.
    Builtin,
    /// `argv` starts at the alias.
    Alias { alias: String, argv: Vec<String> },
}

/// Scan `argv` (including the program name) for leading global flags and
/// the route.
pub fn route(argv: &[String], is_alias: impl Fn(&str) -> bool) -> (GlobalFlags, Route) {
    let mut flags = GlobalFlags::default();

    for (idx, token) in argv.iter().enumerate().skip(1) {
        match token.as_str() {
            "--refresh" => flags.refresh = true,
            "-v" | "--verbose" => flags.verbose = true,
            name if name.starts_with('-')
                || RESERVED_NAMES.contains(&name)
                || !is_alias(name) =>
            {
                break;
            }
            alias => {
                return (
                    flags,
                    Route::Alias {
                        alias: alias.to_string(),
                        argv: argv[idx..].to_vec(),
                    },
                );
            }
        }
    }

    (flags, Route::Builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    fn known(name: &str) -> bool {
        matches!(name, "time" | "list")
    }

    #[test]
    fn test_alias_route_keeps_tool_flags() {
        let (flags, route) = route(
            &argv(&["mcpx", "--refresh", "time", "now", "--verbose", "--tz", "UTC"]),
            known,
        );
        assert!(flags.refresh);
        assert!(!flags.verbose);
        assert_eq!(
            route,
            Route::Alias {
                alias: "time".into(),
                argv: argv(&["time", "now", "--verbose", "--tz", "UTC"]),
            }
        );
    }

    #[test]
    fn test_builtins_win_over_aliases() {
        let (_, route) = route(&argv(&["mcpx", "list"]), known);
        assert_eq!(route, Route::Builtin);
    }

    #[test]
    fn test_unknown_names_and_flags_go_to_clap() {
        assert_eq!(route(&argv(&["mcpx", "nope"]), known).1, Route::Builtin);
        assert_eq!(route(&argv(&["mcpx", "--help"]), known).1, Route::Builtin);
        assert_eq!(route(&argv(&["mcpx"]), known).1, Route::Builtin);
    }

    #[test]
    fn test_verbose_before_alias() {
        let (flags, route) = route(&argv(&["mcpx", "-v", "time"]), known);
        assert!(flags.verbose);
        assert!(matches!(route, Route::Alias { .. }));
    }
}
