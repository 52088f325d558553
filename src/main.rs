use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = keyproxy::cli::Cli::parse();
    if let Err(e) = keyproxy::run::execute(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
