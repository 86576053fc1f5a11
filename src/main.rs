use clap::Parser;
use composer_watch::cli::{self, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::watch::run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
