use crate::browser::GalleryBrowser;
use crate::errors::GrabError;
use crate::{CrawlRule, Update};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::time::{sleep, Instant};

const LOGIN_POLL_INTERVAL_MILLIS: u64 = 500;

/// Blocks until the interactive login completes. Sends the browser to the
/// login page, then polls its location until it equals the post-login
/// landing url exactly. Gives up with [`GrabError::SessionTimeout`] once
/// `rule.login_wait_secs` have passed without a match.
#[tracing::instrument(skip(browser))]
pub async fn confirm_login<B: GalleryBrowser>(
    browser: &B,
    rule: &CrawlRule,
    update_tx: &Sender<Update>,
) -> Result<(), GrabError> {
    if (update_tx
        .send(Update::Status(
            "Log in from the browser window. The crawl starts once you are through.".into(),
        ))
        .await)
        .is_err()
    {};
    browser.goto(&rule.login_url).await?;

    let deadline = Instant::now() + Duration::from_secs(rule.login_wait_secs);
    loop {
        if browser.current_url().await? == rule.landing_url {
            break;
        }
        if Instant::now() >= deadline {
            tracing::error!("Login was not completed within {}s", rule.login_wait_secs);
            return Err(GrabError::SessionTimeout);
        }
        sleep(Duration::from_millis(LOGIN_POLL_INTERVAL_MILLIS)).await;
    }

    tracing::debug!("Login confirmed @ {}", rule.landing_url);
    if (update_tx
        .send(Update::Status("Login confirmed.".into()))
        .await)
        .is_err()
    {};
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::channel;

    /// Reports one scripted location per poll; the last entry repeats.
    struct ScriptedBrowser {
        locations: Vec<String>,
        polls: AtomicUsize,
    }

    impl ScriptedBrowser {
        fn reporting(locations: &[&str]) -> Self {
            Self {
                locations: locations.iter().map(|l| l.to_string()).collect(),
                polls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GalleryBrowser for ScriptedBrowser {
        async fn goto(&self, _url: &str) -> Result<(), GrabError> {
            Ok(())
        }

        async fn current_url(&self) -> Result<String, GrabError> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(self.locations[poll.min(self.locations.len() - 1)].clone())
        }

        async fn detail_links(&self, _selector: &str) -> Result<Vec<String>, GrabError> {
            Ok(Vec::new())
        }

        async fn first_image_src(&self) -> Result<Option<String>, GrabError> {
            Ok(None)
        }

        async fn release(self) -> Result<(), GrabError> {
            Ok(())
        }
    }

    fn gate_rule() -> CrawlRule {
        CrawlRule {
            login_url: "https://gallery.test/login".into(),
            landing_url: "https://gallery.test/".into(),
            login_wait_secs: 2,
            ..CrawlRule::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_the_landing_page_is_reached() {
        let browser = ScriptedBrowser::reporting(&[
            "https://gallery.test/login",
            "https://gallery.test/login",
            "https://gallery.test/",
        ]);
        let (tx, mut rx) = channel(10);

        confirm_login(&browser, &gate_rule(), &tx).await.unwrap();

        drop(tx);
        let mut statuses = Vec::new();
        while let Some(update) = rx.recv().await {
            if let Update::Status(text) = update {
                statuses.push(text);
            }
        }
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].contains("Log in from the browser window"));
        assert!(statuses[1].contains("Login confirmed"));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_once_the_wait_time_is_spent() {
        let browser = ScriptedBrowser::reporting(&["https://gallery.test/login"]);
        let (tx, _rx) = channel(10);

        let error = confirm_login(&browser, &gate_rule(), &tx).await.unwrap_err();

        assert_eq!(error, GrabError::SessionTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn landing_url_must_match_exactly() {
        // Reaching some other logged-in page does not count.
        let browser = ScriptedBrowser::reporting(&["https://gallery.test/welcome"]);
        let (tx, _rx) = channel(10);

        let error = confirm_login(&browser, &gate_rule(), &tx).await.unwrap_err();

        assert_eq!(error, GrabError::SessionTimeout);
    }
}
