//! CLI argument parsing using clap.

use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Watch local Composer path repositories
#[derive(Parser, Debug)]
#[command(
    name = "composer-watch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Link watched path repositories into vendor/ and dump the autoloader when their files change",
    long_about = "Run from the directory holding composer.json. Path repositories declared with \
                  \"options\": {\"watch\": true} and listed in \"require\" are linked into vendor/ \
                  and watched; adding or removing a file in one of them runs `composer dump-autoload`.",
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Show verbose diagnostic output
    #[arg(long)]
    pub debug: bool,

    /// Path to a custom settings file (defaults to .composer-watch.toml in the project root)
    #[arg(short, long, env = "COMPOSER_WATCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_debug_flag() {
        let cli = Cli::try_parse_from(["composer-watch", "--debug"]).unwrap();
        assert!(cli.debug);

        let cli = Cli::try_parse_from(["composer-watch"]).unwrap();
        assert!(!cli.debug);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["composer-watch", "--poll"]).is_err());
    }
}
