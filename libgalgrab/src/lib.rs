use crate::download::download_image;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;
use tracing::instrument;
use url::Url;

mod browser;
mod download;
mod errors;
mod folder;
mod link;
mod session;

pub use crate::browser::{GalleryBrowser, WebDriverGallery};
pub use crate::errors::GrabError;
pub use crate::link::LinkSet;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_LOGIN_URL: &str = "https://arca.live/u/login?goto=%2F";
pub const DEFAULT_LANDING_URL: &str = "https://arca.live/";
/// Anchors of the gallery's list body. The path is structural on purpose,
/// the board markup carries no stable classes to select on.
pub const DEFAULT_GALLERY_ANCHORS: &str = "/html/body/div[2]/div[3]/article/div/div[2]/div[4]//a";

#[derive(Debug, Clone)]
pub struct CrawlRule {
    /// WebDriver server the browser session is started through
    pub webdriver_url: String,
    /// Page the browser is parked on for the interactive login
    pub login_url: String,
    /// Url the browser lands on once the login went through
    pub landing_url: String,
    /// XPath matching the detail-page anchors on a target page
    pub gallery_anchors: String,
    /// How long the interactive login may take before the run is abandoned
    pub login_wait_secs: u64,
    /// Time given to each target page to settle before its links are read
    pub page_settle_millis: u64,
}

impl Default for CrawlRule {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            landing_url: DEFAULT_LANDING_URL.to_string(),
            gallery_anchors: DEFAULT_GALLERY_ANCHORS.to_string(),
            login_wait_secs: 3600,
            page_settle_millis: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// The gallery pages to walk, in the order given
    pub pages: Vec<Url>,
    /// Base directory all downloads land under
    pub dest_dir: PathBuf,
}

/// Updates emitted over the channel while a crawl runs. [`Update::Done`] is
/// always the last one, on success, failure and cancellation alike.
#[derive(Debug)]
pub enum Update {
    Status(String),
    /// Images downloaded so far on the current page
    Progress(usize),
    /// Number of links found on the current page
    ProgressMax(usize),
    /// Position of the current page within the run
    PagePair { current: usize, total: usize },
    Done,
}

/// Cooperative stop signal shared between a crawl run and its supervisor.
/// Once raised it stays raised for the life of the run; the run reacts at
/// its next checkpoint, finishing the download already in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Entry point for a full crawl run. Starts the WebDriver-backed browser
/// session, then hands over to [`run_crawl`]. When no session can be
/// started the failure is reported over the channel and the terminal update
/// still goes out, without touching any page.
#[instrument]
pub async fn init_crawl(
    request: CrawlRequest,
    rule: CrawlRule,
    cancel: CancelFlag,
    update_tx: Sender<Update>,
) -> Result<(), GrabError> {
    let browser = match WebDriverGallery::connect(&rule.webdriver_url).await {
        Ok(b) => b,
        Err(e) => {
            if (update_tx
                .send(Update::Status(format!(
                    "Could not start the browser session : {e}"
                )))
                .await)
                .is_err()
            {};
            if (update_tx.send(Update::Done).await).is_err() {};
            return Err(e);
        }
    };
    run_crawl(browser, request, rule, cancel, update_tx).await
}

/// Drives a full crawl over an already-acquired browser session. Whatever
/// way the run ends, the session is released and [`Update::Done`] is the
/// last update sent.
#[tracing::instrument(skip(browser))]
pub async fn run_crawl<B: GalleryBrowser>(
    browser: B,
    request: CrawlRequest,
    rule: CrawlRule,
    cancel: CancelFlag,
    update_tx: Sender<Update>,
) -> Result<(), GrabError> {
    let outcome = crawl_pages(&browser, &request, &rule, &cancel, &update_tx).await;
    if let Err(e) = &outcome {
        if (update_tx
            .send(Update::Status(format!("Crawl aborted : {e}")))
            .await)
            .is_err()
        {};
    }
    if let Err(e) = browser.release().await {
        tracing::warn!("Failed to release the browser session\nError : {}", e);
    }
    if (update_tx.send(Update::Done).await).is_err() {};
    outcome
}

#[tracing::instrument(skip(browser))]
async fn crawl_pages<B: GalleryBrowser>(
    browser: &B,
    request: &CrawlRequest,
    rule: &CrawlRule,
    cancel: &CancelFlag,
    update_tx: &Sender<Update>,
) -> Result<(), GrabError> {
    if let Err(e) = fs::create_dir_all(&request.dest_dir).await {
        tracing::error!("Failed to create destination directory\nError : {}", e);
        return Err(GrabError::ErrorCreatingDestinationDirectory(e.to_string()));
    };

    session::confirm_login(browser, rule, update_tx).await?;

    let client = Client::builder()
        .user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36"
        ).build().unwrap();

    let total_pages = request.pages.len();
    // A single page writes into the base directory itself; a batch gets
    // one fresh sub-folder per page.
    let is_batch = total_pages > 1;

    'pages: for (page_idx, page) in request.pages.iter().enumerate() {
        if cancel.is_cancelled() {
            if (update_tx
                .send(Update::Status("Crawling stopped.".into()))
                .await)
                .is_err()
            {};
            break;
        }
        if (update_tx
            .send(Update::PagePair {
                current: page_idx + 1,
                total: total_pages,
            })
            .await)
            .is_err()
        {};

        let output_dir = folder::resolve_output_dir(&request.dest_dir, is_batch).await?;

        if (update_tx
            .send(Update::Status(format!("Crawling page : {page}")))
            .await)
            .is_err()
        {};
        browser.goto(page.as_str()).await?;
        sleep(Duration::from_millis(rule.page_settle_millis)).await;

        let links = LinkSet::new(browser.detail_links(&rule.gallery_anchors).await?);
        if links.is_empty() {
            if (update_tx
                .send(Update::Status(format!("No images found on {page}.")))
                .await)
                .is_err()
            {};
            continue;
        }
        tracing::debug!("Found {} detail links on {}", links.len(), page);

        if (update_tx.send(Update::ProgressMax(links.len())).await).is_err() {};
        if (update_tx.send(Update::Progress(0)).await).is_err() {};

        let mut downloaded = 0usize;
        for (link_idx, href) in links.iter().enumerate() {
            if cancel.is_cancelled() {
                if (update_tx
                    .send(Update::Status("Crawling stopped.".into()))
                    .await)
                    .is_err()
                {};
                break 'pages;
            }
            let file_name = links.file_name(link_idx);
            match grab_detail_link(browser, &client, href, &output_dir, &file_name).await {
                Ok(Some(saved)) => {
                    downloaded += 1;
                    if (update_tx
                        .send(Update::Status(format!(
                            "{}/{} downloaded : {}",
                            link_idx + 1,
                            links.len(),
                            saved.to_string_lossy()
                        )))
                        .await)
                        .is_err()
                    {};
                    if (update_tx.send(Update::Progress(downloaded)).await).is_err() {};
                }
                Ok(None) => {}
                Err(e) => {
                    // One bad link never takes the page down with it.
                    if (update_tx
                        .send(Update::Status(format!("Image download failed : {e}")))
                        .await)
                        .is_err()
                    {};
                }
            }
        }
    }
    Ok(())
}

/// Visits one detail link and downloads its image. `Ok(None)` means the
/// image element carried no source attribute and the link was skipped.
#[tracing::instrument(skip(browser, client))]
async fn grab_detail_link<B: GalleryBrowser>(
    browser: &B,
    client: &Client,
    href: &str,
    output_dir: &Path,
    file_name: &str,
) -> Result<Option<PathBuf>, GrabError> {
    browser.goto(href).await?;
    let src = match browser.first_image_src().await? {
        Some(src) => src,
        None => {
            tracing::debug!("Image on {} has no source attribute, skipping", href);
            return Ok(None);
        }
    };
    let saved = download_image(client, &src, output_dir, file_name).await?;
    Ok(Some(saved))
}
