use anyhow::Result;
use clap::Parser;

use vibechat::{app, cli, infra};

fn main() -> Result<()> {
    infra::secrets::install_panic_redaction_hook();

    let cli = cli::Cli::parse();
    app::run(cli)
}
