//! Scrape trigger: asks the backend to ingest a server's message history.

use tracing::{info, warn};

use crate::client::{ClientError, MessageLimit, ScrapeReceipt};
use crate::flow::{RequestSeq, Ticket};

pub const SCRAPE_CONFIRMATION: &str = "Server scraped successfully!";

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRequest {
    pub guild_id: String,
    pub limit: MessageLimit,
}

#[derive(Debug, Default)]
pub struct ScrapeTrigger {
    pub guild_id: String,
    /// Raw text of the limit field; parsed only when submitting.
    pub limit_text: String,
    scraping: bool,
    error: Option<String>,
    seq: RequestSeq,
}

impl ScrapeTrigger {
    pub fn new(default_limit: u32) -> Self {
        Self {
            limit_text: default_limit.to_string(),
            ..Self::default()
        }
    }

    pub fn is_scraping(&self) -> bool {
        self.scraping
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_scrape(&mut self) -> (Ticket, ScrapeRequest) {
        self.error = None;
        self.scraping = true;
        let request = ScrapeRequest {
            guild_id: self.guild_id.clone(),
            limit: MessageLimit::parse(&self.limit_text),
        };
        (self.seq.issue(), request)
    }

    /// Returns the confirmation text on success, `None` otherwise (including
    /// stale responses). Nothing outside this flow is touched.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        outcome: Result<ScrapeReceipt, ClientError>,
    ) -> Option<&'static str> {
        if !self.seq.is_current(ticket) {
            return None;
        }
        self.scraping = false;
        match outcome {
            Ok(_) => {
                info!("[scrape] {} scraped", self.guild_id);
                Some(SCRAPE_CONFIRMATION)
            }
            Err(e) => {
                warn!("[scrape] failed: {}", e);
                self.error = Some(e.to_string());
                None
            }
        }
    }
}
