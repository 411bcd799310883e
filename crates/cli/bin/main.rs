#[macro_use]
extern crate tracing;

mod adapter_wire;
mod args;
mod cmd;
mod compiler;
mod protocol;
mod utils;

use args::{SdbArgs, SdbSubcommand};
use clap::Parser;
use eyre::Result;

fn main() -> Result<()> {
    utils::install_error_handler();
    utils::subscriber();
    utils::enable_paint();

    let opts = SdbArgs::parse();

    match opts.cmd {
        SdbSubcommand::Serve(cmd) => utils::block_on(cmd.run()),
    }
}
