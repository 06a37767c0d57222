//! MCP protocol response helpers.

use rmcp::model::{CallToolResult, Content, ErrorData};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};


/// Output format for tool responses.
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// JSON format (default).
    #[default]
    Json,
    /// TOON (Token-Oriented Object Notation) - 40-60% fewer tokens.
    Toon,
}

/// Tool response that serializes as the raw inner value.
///
/// ```ignore
/// Response(namespace, None).into()                      // JSON
/// Response(page, Some(OutputFormat::Toon)).into()       // TOON
/// ```
pub struct Response<T>(pub T, pub Option<OutputFormat>);

impl<T> Response<T> {
    pub fn json(data: T) -> Self {
        Response(data, None)
    }
}

impl<T: Serialize> Serialize for Response<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T: Serialize> From<Response<T>> for Result<CallToolResult, ErrorData> {
    fn from(response: Response<T>) -> Self {
        let content = match response.1.unwrap_or_default() {
            OutputFormat::Json => Content::json(&response.0)?,
            OutputFormat::Toon => Content::text(serde_toon::to_string(&response.0).map_err(|e| {
                ErrorData::internal_error(format!("TOON serialization error: {}", e), None)
            })?),
        };
        Ok(CallToolResult::success(vec![content]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_renders_json_content() {
        let result: Result<CallToolResult, ErrorData> =
            Response::json(serde_json::json!({"name": "catalog"})).into();
        assert!(result.is_ok());
    }
}
