use crate::cli::crawl;
use clap::Parser;
use std::path::MAIN_SEPARATOR;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() {
    let f_appender =
        tracing_appender::rolling::daily(format!(".{}", MAIN_SEPARATOR), "galgrab.log");
    let (non_blk, _guard) = tracing_appender::non_blocking(f_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("libgalgrab=debug,thirtyfour=warn,hyper=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(tracing_subscriber::fmt::format().pretty())
        .with_writer(non_blk)
        .init();
    let cli = cli::Cli::parse();
    crawl(cli).await;
}
