//! CLI parse and validation tests (multi-file to keep each file small).

use clap::Parser;

use super::Cli;
use urlsmith_core::config::UrlsmithConfig;
use urlsmith_core::pipeline::ProcessOptions;

pub(super) fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

pub(super) fn options(args: &[&str]) -> anyhow::Result<ProcessOptions> {
    let cfg = UrlsmithConfig::default();
    parse(args).into_run(&cfg).map(|(opts, _)| opts)
}

mod specs;
