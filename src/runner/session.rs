//! The one browser session shared by every scenario of a run.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::driver::traits::Browser;
use crate::driver::web::{BrowserConfig, PlaywrightBrowser};
use crate::error::StepError;

/// Starts the browser a session will own
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn Browser>>;
}

/// Launches a Playwright-driven browser
pub struct PlaywrightLauncher {
    config: BrowserConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for PlaywrightLauncher {
    async fn launch(&self) -> Result<Arc<dyn Browser>> {
        let browser = PlaywrightBrowser::launch(self.config.clone()).await?;
        Ok(Arc::new(browser))
    }
}

enum SessionState {
    Uninitialized,
    Ready(Arc<dyn Browser>),
    Closed,
}

/// Browser session: `Uninitialized -> Ready -> Closed`, never back.
pub struct BrowserSession {
    state: Mutex<SessionState>,
}

impl Default for BrowserSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Uninitialized),
        }
    }

    /// Launch the browser unless it is already running.
    pub async fn initialize(&self, launcher: &dyn BrowserLauncher) -> Result<Arc<dyn Browser>> {
        let mut state = self.state.lock().await;
        match &*state {
            SessionState::Ready(browser) => Ok(browser.clone()),
            SessionState::Closed => Err(StepError::Session("closed").into()),
            SessionState::Uninitialized => {
                let browser = launcher.launch().await?;
                log::info!("Browser session started ({})", browser.name());
                *state = SessionState::Ready(browser.clone());
                Ok(browser)
            }
        }
    }

    pub async fn browser(&self) -> Result<Arc<dyn Browser>> {
        match &*self.state.lock().await {
            SessionState::Ready(browser) => Ok(browser.clone()),
            SessionState::Uninitialized => Err(StepError::Session("not initialized").into()),
            SessionState::Closed => Err(StepError::Session("closed").into()),
        }
    }

    pub async fn is_ready(&self) -> bool {
        matches!(&*self.state.lock().await, SessionState::Ready(_))
    }

    /// Close the browser. Returns true only for the call that actually closed it.
    pub async fn release(&self) -> bool {
        let previous = std::mem::replace(&mut *self.state.lock().await, SessionState::Closed);
        match previous {
            SessionState::Ready(browser) => {
                if let Err(e) = browser.close().await {
                    log::warn!("Failed to close browser: {:#}", e);
                }
                true
            }
            SessionState::Uninitialized | SessionState::Closed => false,
        }
    }
}
