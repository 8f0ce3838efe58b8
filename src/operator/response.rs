use super::errors::ToolError;
use rmcp::model::{CallToolResult, Content};

/// The uniform result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    pub is_error: bool,
    pub text: String,
}

impl ToolResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            text: non_empty(text.into(), "Done."),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            text: non_empty(text.into(), "Failed."),
        }
    }
}

fn non_empty(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

impl From<Result<String, ToolError>> for ToolResponse {
    fn from(result: Result<String, ToolError>) -> Self {
        match result {
            Ok(text) => ToolResponse::success(text),
            Err(error) => {
                tracing::error!(%error, "Tool call failed.");
                ToolResponse::error(error.to_string())
            }
        }
    }
}

/// Successes carry no `isError` at all, failures carry `isError: true`.
impl From<ToolResponse> for CallToolResult {
    fn from(response: ToolResponse) -> Self {
        let content = vec![Content::text(response.text)];

        if response.is_error {
            return CallToolResult::error(content);
        }

        let mut result = CallToolResult::success(content);
        result.is_error = None;
        result
    }
}
