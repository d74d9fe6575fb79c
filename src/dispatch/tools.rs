//! Tool catalog and tool execution
//!
//! Each tool takes a JSON argument object and produces a JSON payload with a
//! `success` flag. Failures never escape as `Err`: they become
//! `{ "success": false, "error": ... }` so the transport always answers 200.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use crate::error::LearningError;
use crate::service::{
    LearningLog, DEFAULT_LIST_LIMIT, DEFAULT_PATTERN_LIMIT, DEFAULT_REVIEW_LIMIT, DEFAULT_SEARCH_LIMIT,
};
use crate::types::{NewCorrection, NewPhrase};
use crate::validation;

/// Tool definition as advertised by `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Every tool this service exposes
pub fn tool_catalog() -> Vec<Tool> {
    vec![
        Tool {
            name: "save_phrase".to_string(),
            description: "Save a new English phrase with Japanese translation".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "english": {"type": "string", "description": "English phrase"},
                    "japanese": {"type": "string", "description": "Japanese translation"},
                    "context": {"type": "string", "description": "Usage context"},
                    "user_id": {"type": "string", "description": "User ID (optional)"}
                },
                "required": ["english", "japanese"]
            }),
        },
        Tool {
            name: "list_phrases".to_string(),
            description: "List saved phrases".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "number", "description": "Number of phrases to return"},
                    "order": {"type": "string", "enum": ["asc", "desc"], "description": "Sort order"},
                    "period": {
                        "type": "string",
                        "enum": ["today", "this_week", "all"],
                        "description": "Only phrases saved in this period (default: all)"
                    },
                    "user_id": {"type": "string", "description": "User ID (optional)"}
                }
            }),
        },
        Tool {
            name: "search_phrases".to_string(),
            description: "Search phrases by keyword".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "keyword": {"type": "string", "description": "Search keyword"},
                    "limit": {"type": "number", "description": "Number of results"},
                    "user_id": {"type": "string", "description": "User ID (optional)"}
                },
                "required": ["keyword"]
            }),
        },
        Tool {
            name: "get_review_priority".to_string(),
            description: "Get phrases that need review".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "number", "description": "Number of phrases to return"},
                    "user_id": {"type": "string", "description": "User ID (optional)"}
                }
            }),
        },
        Tool {
            name: "save_correction".to_string(),
            description: "Save an English correction".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "original_text": {"type": "string", "description": "Original text"},
                    "corrected_text": {"type": "string", "description": "Corrected text"},
                    "feedback": {"type": "string", "description": "Feedback"},
                    "error_pattern": {"type": "string", "description": "Error pattern/type"},
                    "user_id": {"type": "string", "description": "User ID (optional)"}
                },
                "required": ["original_text", "corrected_text", "feedback"]
            }),
        },
        Tool {
            name: "list_corrections".to_string(),
            description: "List saved corrections".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "number", "description": "Number of corrections to return"},
                    "order": {"type": "string", "enum": ["asc", "desc"], "description": "Sort order"},
                    "user_id": {"type": "string", "description": "User ID (optional)"}
                }
            }),
        },
        Tool {
            name: "analyze_weaknesses".to_string(),
            description: "Analyze common error patterns, repeated mistakes and hard-to-remember phrases"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "number", "description": "Number of patterns to return"},
                    "user_id": {"type": "string", "description": "User ID (optional)"}
                }
            }),
        },
    ]
}

/// Why a tool call did not produce a success payload
#[derive(Debug)]
enum ToolError {
    MissingArgument(&'static str),
    Invalid(String),
    Learning(LearningError),
}

impl From<LearningError> for ToolError {
    fn from(e: LearningError) -> Self {
        ToolError::Learning(e)
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Learning(LearningError::Serialization(e))
    }
}

type ToolResult = std::result::Result<Value, ToolError>;

fn required_str<'a>(args: &'a Map<String, Value>, key: &'static str) -> std::result::Result<&'a str, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ToolError::MissingArgument(key)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ToolError::Invalid(format!("Argument '{}' must be a string", key))),
    }
}

fn optional_str<'a>(args: &'a Map<String, Value>, key: &'static str, default: &'a str) -> std::result::Result<&'a str, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ToolError::Invalid(format!("Argument '{}' must be a string", key))),
    }
}

fn limit_arg(args: &Map<String, Value>, default: i64) -> std::result::Result<i64, ToolError> {
    match args.get("limit") {
        None | Some(Value::Null) => Ok(default),
        Some(value) => Ok(validation::limit_from_value(value)?),
    }
}

/// Run one tool and build its response payload.
///
/// `user_id` in the arguments selects the partition; otherwise
/// `default_user` is used.
pub async fn handle_tool_call(log: &LearningLog, name: &str, arguments: &Value, default_user: &str) -> Value {
    let empty = Map::new();
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return failure("Arguments must be a JSON object"),
    };

    debug!("Tool call: {}", name);

    let result = match optional_str(args, "user_id", default_user) {
        Ok(user_id) => run_tool(log, name, args, user_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(payload) => payload,
        Err(ToolError::MissingArgument(key)) => failure(&format!("Missing required argument: '{}'", key)),
        Err(ToolError::Invalid(message)) => failure(&message),
        Err(ToolError::Learning(e)) if e.is_validation() => failure(&e.to_string()),
        Err(ToolError::Learning(e)) => {
            error!("Tool '{}' failed: {}", name, e);
            failure(&format!("Failed to execute {}. Please try again later.", name))
        }
    }
}

fn failure(message: &str) -> Value {
    json!({ "success": false, "error": message })
}

async fn run_tool(log: &LearningLog, name: &str, args: &Map<String, Value>, user_id: &str) -> ToolResult {
    match name {
        "save_phrase" => {
            let input = NewPhrase {
                english: required_str(args, "english")?.to_string(),
                japanese: required_str(args, "japanese")?.to_string(),
                context: optional_str(args, "context", "")?.to_string(),
            };
            let phrase = log.save_phrase(user_id, &input).await?;
            Ok(json!({
                "success": true,
                "message": format!("Phrase saved: {}", phrase.english),
                "data": serde_json::to_value(&phrase)?,
            }))
        }
        "list_phrases" => {
            let limit = limit_arg(args, DEFAULT_LIST_LIMIT)?;
            let order = optional_str(args, "order", "desc")?;
            let period = optional_str(args, "period", "all")?;
            let phrases = log.list_phrases(user_id, limit, order, period).await?;
            Ok(json!({
                "success": true,
                "count": phrases.len(),
                "period": validation::validate_period(period).to_string(),
                "phrases": serde_json::to_value(&phrases)?,
            }))
        }
        "search_phrases" => {
            let keyword = required_str(args, "keyword")?;
            let limit = limit_arg(args, DEFAULT_SEARCH_LIMIT)?;
            let phrases = log.search_phrases(user_id, keyword, limit).await?;
            Ok(json!({
                "success": true,
                "count": phrases.len(),
                "keyword": keyword,
                "phrases": serde_json::to_value(&phrases)?,
            }))
        }
        "get_review_priority" => {
            let limit = limit_arg(args, DEFAULT_REVIEW_LIMIT)?;
            let phrases = log.review_priority(user_id, limit).await?;
            Ok(json!({
                "success": true,
                "count": phrases.len(),
                "phrases": serde_json::to_value(&phrases)?,
            }))
        }
        "save_correction" => {
            let input = NewCorrection {
                original_text: required_str(args, "original_text")?.to_string(),
                corrected_text: required_str(args, "corrected_text")?.to_string(),
                feedback: required_str(args, "feedback")?.to_string(),
                error_pattern: optional_str(args, "error_pattern", "")?.to_string(),
            };
            let correction = log.save_correction(user_id, &input).await?;
            Ok(json!({
                "success": true,
                "message": "Correction saved",
                "data": serde_json::to_value(&correction)?,
            }))
        }
        "list_corrections" => {
            let limit = limit_arg(args, DEFAULT_LIST_LIMIT)?;
            let order = optional_str(args, "order", "desc")?;
            let corrections = log.list_corrections(user_id, limit, order).await?;
            Ok(json!({
                "success": true,
                "count": corrections.len(),
                "corrections": serde_json::to_value(&corrections)?,
            }))
        }
        "analyze_weaknesses" => {
            let limit = limit_arg(args, DEFAULT_PATTERN_LIMIT)?;
            let report = log.analyze_weaknesses(user_id, limit).await?;
            Ok(json!({
                "success": true,
                "analysis": serde_json::to_value(&report)?,
            }))
        }
        other => Err(ToolError::Invalid(format!("Unknown tool: {}", other))),
    }
}
