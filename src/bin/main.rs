use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "reelmatch-server")]
#[command(about = "Content-based movie recommendation server", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "reelmatch.yaml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Rebuild the similarity model even if a stored one matches the corpus
    #[arg(long)]
    rebuild: bool,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.debug {
        "reelmatch=debug,tower_http=debug"
    } else {
        "reelmatch=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(args.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let options = reelmatch::RunOptions {
        debug_logs: args.debug,
        rebuild: args.rebuild,
    };

    if let Err(e) = reelmatch::run(&args.config, options).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
