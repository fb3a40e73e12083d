//! Browser session seam and its headless Chrome implementation

use crate::crawler::SessionError;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Where to scroll the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPosition {
    Top,
    Bottom,
}

impl ScrollPosition {
    fn script(self) -> &'static str {
        match self {
            ScrollPosition::Top => "window.scrollTo(0, 0);",
            ScrollPosition::Bottom => "window.scrollTo(0, document.body.scrollHeight);",
        }
    }
}

/// Per-session launch parameters, fixed for the session's lifetime
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Identity string presented to target sites
    pub identity: String,
    /// Relay endpoint, or `None` for a direct connection
    pub endpoint: Option<String>,
    pub headless: bool,
    /// Window size in pixels
    pub window: (u32, u32),
    pub request_timeout: Duration,
}

/// A live browser session with one page
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates the page to `url`
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Returns true if `selector` currently matches an element
    async fn has_element(&mut self, selector: &str) -> Result<bool, SessionError>;

    /// The page's `document.readyState`
    async fn ready_state(&mut self) -> Result<String, SessionError>;

    async fn scroll(&mut self, position: ScrollPosition) -> Result<(), SessionError>;

    /// Serialized markup of the current page
    async fn content(&mut self) -> Result<String, SessionError>;

    /// Releases the browser; calling it twice is harmless
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Starts browser sessions
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, SessionError>;
}

/// Launches a local Chrome or Chromium through the DevTools protocol
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, SessionError> {
        let (width, height) = options.window;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(options.request_timeout)
            .window_size(width, height)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", options.identity));

        if !options.headless {
            builder = builder.with_head();
        }

        if let Some(endpoint) = &options.endpoint {
            builder = builder.arg(format!("--proxy-server={}", endpoint));
        }

        let config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // Spawn a handler to process browser events
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(SessionError::Launch(format!("Failed to open page: {}", e)));
            }
        };

        if let Err(e) = page.set_user_agent(options.identity.as_str()).await {
            tracing::warn!("Failed to set identity on page: {}", e);
        }

        tracing::info!(
            headless = options.headless,
            relay = options.endpoint.as_deref().unwrap_or("direct"),
            "Browser session started"
        );

        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
        }))
    }
}

/// A Chrome instance with a single page
///
/// chromiumoxide pages and browsers have no `Drop` cleanup, so `close`
/// must be called explicitly; the fetcher guarantees it does.
struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, SessionError> {
        self.page.as_ref().ok_or(SessionError::Closed)
    }

    async fn evaluate_string(&self, script: &str) -> Result<String, SessionError> {
        self.page()?
            .evaluate(script)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| SessionError::Script(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.page()?
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool, SessionError> {
        Ok(self.page()?.find_element(selector).await.is_ok())
    }

    async fn ready_state(&mut self) -> Result<String, SessionError> {
        self.evaluate_string("document.readyState").await
    }

    async fn scroll(&mut self, position: ScrollPosition) -> Result<(), SessionError> {
        self.page()?
            .evaluate(position.script())
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        self.page()?
            .content()
            .await
            .map_err(|e| SessionError::Content(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        let mut result = Ok(());

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                result = Err(SessionError::Launch(format!("Failed to close browser: {}", e)));
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!("Failed to reap browser process: {}", e);
            }
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_scripts() {
        assert!(ScrollPosition::Bottom.script().contains("scrollHeight"));
        assert_eq!(ScrollPosition::Top.script(), "window.scrollTo(0, 0);");
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let mut session = ChromeSession {
            browser: None,
            page: None,
            handler_task: None,
        };
        assert!(matches!(
            session.navigate("https://example.com").await,
            Err(SessionError::Closed)
        ));
        assert!(session.close().await.is_ok());
        assert!(session.close().await.is_ok());
    }
}
