#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use clap::Parser;

mod branches;
mod cli;
mod config;
mod constants;
mod errors;
mod git;
mod github;
mod patches;
mod push;
mod stack;
mod subcommands;
#[cfg(test)]
mod test_utils;
mod token;
mod types;

#[tokio::main]
async fn main() {
    if let Err(error) = cli::Cli::parse().run().await {
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}
