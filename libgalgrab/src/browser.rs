use crate::errors::GrabError;
use async_trait::async_trait;
use thirtyfour::{By, DesiredCapabilities, WebDriver};

/// The browser-automation capabilities a crawl run needs. The production
/// implementation is [`WebDriverGallery`]; tests drive the run with scripted
/// implementations instead of a live browser.
#[async_trait]
pub trait GalleryBrowser: Send + Sync {
    /// Navigates the session to `url`.
    async fn goto(&self, url: &str) -> Result<(), GrabError>;

    /// The address currently shown in the browser's location bar.
    async fn current_url(&self) -> Result<String, GrabError>;

    /// `href` values of the anchors matched by `selector` (an XPath) on the
    /// current page, in document order. Anchors without an `href` are
    /// skipped.
    async fn detail_links(&self, selector: &str) -> Result<Vec<String>, GrabError>;

    /// `src` attribute of the first `img` element on the current page.
    /// `Ok(None)` means the element exists but carries no source; an error
    /// means the page has no image element at all.
    async fn first_image_src(&self) -> Result<Option<String>, GrabError>;

    /// Closes the browser session. Called on every exit path of a run.
    async fn release(self) -> Result<(), GrabError>;
}

/// A visible Chrome session driven over the WebDriver protocol. The window
/// stays on screen so the user can complete the interactive login.
pub struct WebDriverGallery {
    driver: WebDriver,
}

impl WebDriverGallery {
    /// Starts a fresh Chrome session through the WebDriver server at
    /// `server_url`, e.g a locally running chromedriver.
    pub async fn connect(server_url: &str) -> Result<Self, GrabError> {
        let caps = DesiredCapabilities::chrome();
        let driver = match WebDriver::new(server_url, caps).await {
            Err(e) => {
                tracing::error!("Error starting a browser session via {}", server_url);
                tracing::error!("{}", e);
                return Err(GrabError::ErrorStartingBrowser(e.to_string()));
            }
            Ok(d) => d,
        };
        Ok(Self { driver })
    }
}

#[async_trait]
impl GalleryBrowser for WebDriverGallery {
    async fn goto(&self, url: &str) -> Result<(), GrabError> {
        self.driver
            .goto(url)
            .await
            .map_err(|e| GrabError::BrowserError(e.to_string()))
    }

    async fn current_url(&self) -> Result<String, GrabError> {
        self.driver
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| GrabError::BrowserError(e.to_string()))
    }

    async fn detail_links(&self, selector: &str) -> Result<Vec<String>, GrabError> {
        let anchors = self
            .driver
            .find_all(By::XPath(selector))
            .await
            .map_err(|e| GrabError::BrowserError(e.to_string()))?;
        let mut links = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            if let Some(href) = anchor
                .attr("href")
                .await
                .map_err(|e| GrabError::BrowserError(e.to_string()))?
            {
                links.push(href);
            }
        }
        Ok(links)
    }

    async fn first_image_src(&self) -> Result<Option<String>, GrabError> {
        let image = self
            .driver
            .find(By::Tag("img"))
            .await
            .map_err(|e| GrabError::BrowserError(e.to_string()))?;
        image
            .attr("src")
            .await
            .map_err(|e| GrabError::BrowserError(e.to_string()))
    }

    async fn release(self) -> Result<(), GrabError> {
        self.driver
            .quit()
            .await
            .map_err(|e| GrabError::BrowserError(e.to_string()))
    }
}
