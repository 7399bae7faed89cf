use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Invalid browser config: {0}")]
    Config(String),
    #[error("Failed to launch Chromium: {0}")]
    Launch(#[source] CdpError),
    #[error("Failed to navigate to {url}: {source}")]
    Navigate {
        url: String,
        #[source]
        source: CdpError,
    },
    #[error("Browser protocol error: {0}")]
    Cdp(#[from] CdpError),
}

/// One Chromium process with a single page, owned for the length of a run.
///
/// Every caller goes through `&mut` or `&` access to the same page, so there is
/// never more than one navigation in flight. Call [`BrowserSession::close`] when
/// done; dropping the session only stops the CDP event loop.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(headless: bool) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Config)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(BrowserError::Launch)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {}", e);
                }
            }
            debug!("Chromium event loop exited");
        });

        let page = browser.new_page("about:blank").await?;
        info!(headless, "Browser session started");

        Ok(BrowserSession {
            browser,
            page,
            handler,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let navigate = |source| BrowserError::Navigate {
            url: url.to_string(),
            source,
        };
        self.page
            .goto(url)
            .await
            .map_err(navigate)?
            .wait_for_navigation()
            .await
            .map_err(navigate)?;
        Ok(())
    }

    /// Close the browser and wait for the process to exit.
    pub async fn close(mut self) -> Result<(), BrowserError> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            warn!("Chromium did not exit cleanly: {}", e);
        }
        info!("Browser session closed");
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
