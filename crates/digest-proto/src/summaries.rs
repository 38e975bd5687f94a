//! Summary feed: fetched channel summaries and the view derived from them.
//!
//! The raw set is replaced wholesale on every successful fetch and kept on
//! failure. What gets displayed (`view`) is recomputed from the raw set each
//! time it is asked for: excluded channels dropped, the rest ordered by
//! message count, busiest first.

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::flow::{RequestSeq, Ticket};
use crate::protocol::ChannelSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryView<'a> {
    /// First fetch still outstanding.
    Loading,
    /// Last fetch failed; replaces the whole list.
    Failed(&'a str),
    /// Nothing left after filtering.
    NoActivity,
    Channels(Vec<&'a ChannelSummary>),
}

#[derive(Debug)]
pub struct SummaryFeed {
    summaries: Vec<ChannelSummary>,
    loading: bool,
    refreshing: bool,
    error: Option<String>,
    last_update: Option<DateTime<Local>>,
    seq: RequestSeq,
}

impl Default for SummaryFeed {
    fn default() -> Self {
        Self {
            summaries: Vec::new(),
            loading: true,
            refreshing: false,
            error: None,
            last_update: None,
            seq: RequestSeq::default(),
        }
    }
}

impl SummaryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> &[ChannelSummary] {
        &self.summaries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    /// Human-readable local time of the last successful fetch.
    pub fn last_update_label(&self) -> Option<String> {
        self.last_update.map(|t| t.format("%H:%M:%S").to_string())
    }

    /// Clear the error and issue a ticket for a new fetch. Only a forced
    /// refresh raises `refreshing`; scheduled fetches leave the flags alone.
    pub fn begin_fetch(&mut self, force_refresh: bool) -> Ticket {
        self.error = None;
        if force_refresh {
            self.refreshing = true;
        }
        self.seq.issue()
    }

    /// Apply a fetch result. Returns `false` if the response was stale and
    /// ignored.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<ChannelSummary>, ClientError>,
    ) -> bool {
        self.settle_at(ticket, outcome, Local::now())
    }

    pub fn settle_at(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<ChannelSummary>, ClientError>,
        now: DateTime<Local>,
    ) -> bool {
        if !self.seq.is_current(ticket) {
            debug!("[summaries] dropping stale response #{}", ticket.seq());
            return false;
        }
        match outcome {
            Ok(summaries) => {
                debug!("[summaries] {} channels", summaries.len());
                self.summaries = summaries;
                self.last_update = Some(now);
            }
            Err(e) => {
                warn!("[summaries] fetch failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
        self.loading = false;
        self.refreshing = false;
        true
    }

    pub fn view<'a>(&'a self, excluded: &[String]) -> SummaryView<'a> {
        if let Some(err) = self.error.as_deref() {
            return SummaryView::Failed(err);
        }
        if self.loading {
            return SummaryView::Loading;
        }
        let channels = display_set(&self.summaries, excluded);
        if channels.is_empty() {
            SummaryView::NoActivity
        } else {
            SummaryView::Channels(channels)
        }
    }
}

/// Drop excluded channel names and order by message count, descending.
/// Ties keep their input order.
pub fn display_set<'a>(
    summaries: &'a [ChannelSummary],
    excluded: &[String],
) -> Vec<&'a ChannelSummary> {
    let mut out: Vec<&ChannelSummary> = summaries
        .iter()
        .filter(|s| !excluded.iter().any(|name| *name == s.channel_name))
        .collect();
    out.sort_by(|a, b| b.message_count.cmp(&a.message_count));
    out
}
