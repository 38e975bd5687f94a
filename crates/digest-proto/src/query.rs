//! Query desk: free-text questions sent to `/ask`.

use tracing::{debug, warn};

use crate::client::ClientError;
use crate::flow::{RequestSeq, Ticket};
use crate::protocol::QueryResult;

#[derive(Debug, Default)]
pub struct QueryDesk {
    pub input: String,
    loading: bool,
    result: Option<QueryResult>,
    error: Option<String>,
    seq: RequestSeq,
}

impl QueryDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&QueryResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clear the error, raise `loading` and hand back the text to send.
    /// The text is not validated; empty queries go to the backend too.
    pub fn begin_submit(&mut self) -> (Ticket, String) {
        self.error = None;
        self.loading = true;
        (self.seq.issue(), self.input.clone())
    }

    /// Apply an `/ask` outcome. On error the previous result is left as is.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<QueryResult, ClientError>) -> bool {
        if !self.seq.is_current(ticket) {
            debug!("[query] dropping stale response #{}", ticket.seq());
            return false;
        }
        match outcome {
            Ok(result) => {
                debug!(
                    "[query] answer ({} chars, {} trace messages)",
                    result.answer.len(),
                    result.chat_history.len()
                );
                self.result = Some(result);
                self.error = None;
            }
            Err(e) => {
                warn!("[query] failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
        self.loading = false;
        true
    }
}
