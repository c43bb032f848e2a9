use anyhow::Result;
use clap::Parser;

mod dispatch;
mod flows;
mod render;


fn main() -> Result<()> {
    dispatch::run_cli(dispatch::Cli::parse())
}
