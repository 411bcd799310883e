use crate::cmd::serve::ServeArgs;
use clap::{Parser, Subcommand};

/// sdb: a source-level debugger for EVM-style bytecode.
#[derive(Parser, Debug)]
#[command(
    name = "sdb",
    version,
    after_help = "Speaks the UI client channel on stdin/stdout and the VM adapter channel over a TCP socket.",
    next_display_order = None,
)]
pub struct SdbArgs {
    #[command(subcommand)]
    pub cmd: SdbSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SdbSubcommand {
    /// Host a debugging session: read UI requests from stdin, drive the
    /// engine against a VM adapter, write UI responses to stdout.
    #[command(visible_alias = "s")]
    Serve(ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        SdbArgs::command().debug_assert();
    }
}
