//! Wire types for the analysis backend's JSON endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Requests ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

// ── Responses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub authenticated: bool,
}

/// Error envelope some endpoints return instead of (or alongside) a payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummariesResponse {
    #[serde(default)]
    pub summaries: Vec<ChannelSummary>,
}

/// Channel identifiers arrive either as JSON numbers or as snowflake strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One channel's weekly activity, as aggregated by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: ChannelId,
    pub channel_name: String,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub unique_authors: u64,
    #[serde(default)]
    pub most_active_hour: String,
    /// Markdown.
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub cache_age_seconds: u64,
}

impl ChannelSummary {
    /// Whole hours since the backend generated this summary.
    pub fn cache_age_hours(&self) -> u64 {
        self.cache_age_seconds / 3600
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    /// JSON-encoded arguments, echoed verbatim.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub function: ToolFunction,
}

impl ToolCall {
    /// Arguments parsed as JSON; `None` when they are not valid JSON.
    pub fn parsed_arguments(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.function.arguments).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn content_text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

/// How the backend chose to answer a query, recovered from the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approach {
    Sql,
    Rag,
}

impl Approach {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sql => "SQL Query Generation",
            Self::Rag => "RAG Similarity Search",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub chat_history: Vec<Message>,
}

impl QueryResult {
    pub fn first_tool_call(&self) -> Option<&ToolCall> {
        self.chat_history
            .iter()
            .find_map(|m| m.tool_calls().first())
    }

    pub fn approach(&self) -> Option<Approach> {
        let call = self.first_tool_call()?;
        let is_sql = call
            .parsed_arguments()
            .and_then(|args| args.get("approach").and_then(|v| v.as_str()).map(|s| s == "sql"))
            .unwrap_or(false);
        Some(if is_sql { Approach::Sql } else { Approach::Rag })
    }

    pub fn generated_sql(&self) -> Option<String> {
        if self.approach() != Some(Approach::Sql) {
            return None;
        }
        self.first_tool_call()?
            .parsed_arguments()?
            .get("sql_query")?
            .as_str()
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_message(arguments: &str) -> Message {
        Message {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![ToolCall {
                id: Some("call_1".to_string()),
                function: ToolFunction {
                    name: "route_query".to_string(),
                    arguments: arguments.to_string(),
                },
            }]),
        }
    }

    #[test]
    fn test_summary_accepts_numeric_and_string_ids() {
        let json = r#"{"summaries": [
            {"channel_id": 1, "channel_name": "general", "message_count": 50,
             "unique_authors": 5, "most_active_hour": "14:00", "summary": "...",
             "cache_age_seconds": 3600},
            {"channel_id": "1203948572039485", "channel_name": "dev"}
        ]}"#;
        let resp: SummariesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.summaries[0].channel_id, ChannelId::Number(1));
        assert_eq!(resp.summaries[0].cache_age_hours(), 1);
        assert_eq!(resp.summaries[1].channel_id.to_string(), "1203948572039485");
        assert_eq!(resp.summaries[1].message_count, 0);
        assert_eq!(resp.summaries[1].cache_age_hours(), 0);
    }

    #[test]
    fn test_cache_age_rounds_down() {
        let json = r#"{"channel_id": 2, "channel_name": "x", "cache_age_seconds": 7199}"#;
        let summary: ChannelSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.cache_age_hours(), 1);
    }

    #[test]
    fn test_query_result_tolerates_null_content_and_extra_fields() {
        let json = r#"{
            "answer": "42 users",
            "elapsed": 1.5,
            "chat_history": [
                {"role": "user", "content": "how many users?"},
                {"role": "assistant", "content": null, "tool_calls": [
                    {"id": "c1", "type": "function",
                     "function": {"name": "route_query", "arguments": "{\"approach\":\"rag\"}"}}
                ]}
            ]
        }"#;
        let result: QueryResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.answer, "42 users");
        assert_eq!(result.chat_history[1].content_text(), "");
        assert_eq!(result.chat_history[0].tool_calls().len(), 0);
        assert_eq!(result.first_tool_call().unwrap().function.name, "route_query");
    }

    #[test]
    fn test_approach_sql_with_generated_query() {
        let result = QueryResult {
            answer: String::new(),
            chat_history: vec![tool_message(
                r#"{"approach": "sql", "sql_query": "SELECT COUNT(*) FROM users"}"#,
            )],
        };
        assert_eq!(result.approach(), Some(Approach::Sql));
        assert_eq!(
            result.generated_sql().as_deref(),
            Some("SELECT COUNT(*) FROM users")
        );
    }

    #[test]
    fn test_approach_defaults_to_rag() {
        let rag = QueryResult {
            answer: String::new(),
            chat_history: vec![tool_message("not json at all")],
        };
        assert_eq!(rag.approach(), Some(Approach::Rag));
        assert_eq!(rag.generated_sql(), None);

        let none = QueryResult::default();
        assert_eq!(none.approach(), None);
    }
}
