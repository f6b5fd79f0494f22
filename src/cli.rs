//! The CLI for `gz`.

use crate::{
    config::Config,
    errors::{ZenError, ZenResult},
    git,
    subcommands::Subcommands,
};
use clap::{
    builder::styling::{AnsiColor, Color, Style},
    ArgAction, Parser,
};
use tracing::Level;

const ABOUT: &str = "gz keeps a stack of commits in sync with one GitHub pull request per commit.";

/// The CLI application for `gz`.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(about = ABOUT, version, styles = cli_styles())]
pub struct Cli {
    /// Verbosity level (0-4)
    #[arg(short, action = ArgAction::Count)]
    pub v: u8,
    /// The subcommand to run
    #[clap(subcommand)]
    pub subcommand: Subcommands,
}

impl Cli {
    /// Runs the CLI application with the given arguments.
    pub async fn run(self) -> ZenResult<()> {
        let cli = self.init_tracing_subscriber()?;
        let repository = git::active_repository().ok_or(ZenError::NotInRepository)?;
        let root_dir = git::root_dir(&repository)?;
        let config = Config::load(&root_dir)?;
        cli.subcommand.run(repository, config).await
    }

    /// Initializes the tracing subscriber from the `-v` count.
    fn init_tracing_subscriber(self) -> ZenResult<Self> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(match self.v {
                0 => Level::ERROR,
                1 => Level::WARN,
                2 => Level::INFO,
                3 => Level::DEBUG,
                _ => Level::TRACE,
            })
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| std::io::Error::other(error.to_string()))?;
        Ok(self)
    }
}

/// Styles for the CLI application.
const fn cli_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}
