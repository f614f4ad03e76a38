use browserd::{cli::Cli, logging, server};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(err) = server::run(cli).await {
        error!(target: "browserd", error = %err, "server failed");
        std::process::exit(1);
    }
}
