use clap::Parser;
use dialoguer::Confirm;
use libgalgrab::{
    init_crawl, CancelFlag, CrawlRequest, CrawlRule, Update, DEFAULT_GALLERY_ANCHORS,
    DEFAULT_LANDING_URL, DEFAULT_LOGIN_URL, DEFAULT_WEBDRIVER_URL,
};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::channel;
use url::Url;

const MAX_BUFFER_SIZE: usize = 100;
const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A gallery image crawler",
    long_about = "Crawls gallery pages behind an interactive login and saves each post's \
    lead image into numbered files."
)]
pub struct Cli {
    #[arg(help = "A gallery page url, or a path to a .txt file holding one url per line.")]
    target: String,
    output_directory: PathBuf,
    #[arg(
        default_value = DEFAULT_WEBDRIVER_URL,
        help = "WebDriver server the browser session is started through.",
        long
    )]
    webdriver_url: String,
    #[arg(default_value = DEFAULT_LOGIN_URL, help = "Page to log in from.", long)]
    login_url: String,
    #[arg(
        default_value = DEFAULT_LANDING_URL,
        help = "Url the browser lands on once the login went through.",
        long
    )]
    landing_url: String,
    #[arg(
        default_value = DEFAULT_GALLERY_ANCHORS,
        help = "XPath matching the detail-page anchors on a target page.",
        long
    )]
    gallery_anchors: String,
    #[arg(
        default_value = "3600",
        help = "Seconds to wait for the interactive login.",
        long
    )]
    login_wait: u64,
    #[arg(
        default_value = "1000",
        help = "Milliseconds to let a page settle before its links are read.",
        long
    )]
    page_settle: u64,
    #[arg(help = "Skip the overwrite confirmation.", long)]
    yes: bool,
}

pub async fn crawl(cli: Cli) {
    let pages = match resolve_targets(&cli.target) {
        Ok(pages) => pages,
        Err(message) => {
            eprintln!("{}", message.red());
            return;
        }
    };

    // Only single-page runs write into the base folder directly; batch runs
    // land in fresh sub-folders and cannot overwrite anything.
    if pages.len() == 1 && !cli.yes && holds_images(&cli.output_directory) {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} already holds image files which may be overwritten. Continue?",
                cli.output_directory.display()
            ))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !overwrite {
            println!("Nothing downloaded.");
            return;
        }
    }

    println!("Initializing crawl....");
    let (tx, mut rx) = channel::<Update>(MAX_BUFFER_SIZE);
    let cancel = CancelFlag::new();

    let crawl_task = {
        let cancel = cancel.clone();
        let output_directory = cli.output_directory.clone();
        let request = CrawlRequest {
            pages,
            dest_dir: cli.output_directory.clone(),
        };
        let rule = CrawlRule {
            webdriver_url: cli.webdriver_url,
            login_url: cli.login_url,
            landing_url: cli.landing_url,
            gallery_anchors: cli.gallery_anchors,
            login_wait_secs: cli.login_wait,
            page_settle_millis: cli.page_settle,
        };
        tokio::spawn(async move {
            match init_crawl(request, rule, cancel.clone(), tx).await {
                Ok(_) => {
                    if cancel.is_cancelled() {
                        println!("{}", "Crawl stopped by user.".yellow());
                    } else {
                        println!(
                            "{}",
                            format!("Images saved under {}", output_directory.display()).green()
                        );
                    }
                }
                Err(e) => {
                    println!("{}", "Crawl wasn't able to complete".red());
                    println!("{}", e);
                }
            }
        })
    };

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("Stop requested. Finishing the download in flight....");
                cancel.cancel();
            }
        });
    }

    while let Some(update) = rx.recv().await {
        match update {
            Update::Status(message) => println!("{}", message),
            Update::ProgressMax(total) => println!("Images found : {}", total),
            Update::Progress(_) => {}
            Update::PagePair { current, total } => {
                if total > 1 {
                    println!("{}", format!("Page {current} of {total}").blue());
                }
            }
            Update::Done => {}
        };
    }

    if let Err(e) = crawl_task.await {
        println!("{}", format!("Crawl task failed : {e}").red());
    }
}

/// Reads the crawl targets out of `target`: the content of a newline
/// delimited url list when it names an existing .txt file, the single page
/// url otherwise.
fn resolve_targets(target: &str) -> Result<Vec<Url>, String> {
    let path = Path::new(target);
    let raw_targets = if target.to_lowercase().ends_with(".txt") && path.exists() {
        match std::fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => return Err(format!("Error reading the url file {target} : {e}")),
        }
    } else {
        vec![target.to_string()]
    };
    if raw_targets.is_empty() {
        return Err(format!("The url file {target} is empty."));
    }

    let mut pages = Vec::with_capacity(raw_targets.len());
    for raw_target in &raw_targets {
        match Url::parse(raw_target) {
            Ok(url) => pages.push(url),
            Err(e) => return Err(format!("Invalid url {raw_target} : {e}")),
        }
    }
    Ok(pages)
}

/// True when the folder already holds files with a common image extension.
fn holds_images(folder: &Path) -> bool {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(_) => return false,
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            return true;
        }
    }
    false
}
