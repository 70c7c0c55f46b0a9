use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::HintError;

pub const INVALID_HINT_TYPE_MESSAGE: &str = "hint_type must be 'code' or 'theory'.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintType {
    Code,
    Theory,
}

impl HintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HintType::Code => "code",
            HintType::Theory => "theory",
        }
    }

    /// Name of the single JSON field the model is asked to answer with.
    pub fn output_field(&self) -> &'static str {
        match self {
            HintType::Code => "snippet",
            HintType::Theory => "message",
        }
    }
}

impl fmt::Display for HintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HintType {
    type Err = HintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(HintType::Code),
            "theory" => Ok(HintType::Theory),
            _ => Err(HintError::InvalidArgument(
                INVALID_HINT_TYPE_MESSAGE.to_string(),
            )),
        }
    }
}

/// Raw body of `POST /generate-hint`, before `hint_type` is validated.
///
/// `hint_type` stays untyped so a missing, non-string or unknown value gets the
/// same guidance instead of a serde rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateHintPayload {
    #[serde(default)]
    pub hint_type: serde_json::Value,
    pub problem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_so_far: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintRequest {
    pub hint_type: HintType,
    pub problem: String,
    pub code_so_far: String,
}

impl TryFrom<GenerateHintPayload> for HintRequest {
    type Error = HintError;

    fn try_from(payload: GenerateHintPayload) -> Result<Self, Self::Error> {
        Ok(HintRequest {
            hint_type: match payload.hint_type.as_str() {
                Some(raw) => raw.parse()?,
                None => {
                    return Err(HintError::InvalidArgument(
                        INVALID_HINT_TYPE_MESSAGE.to_string(),
                    ))
                }
            },
            problem: payload.problem,
            code_so_far: payload.code_so_far.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetLanguage {
    Python,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HintResponse {
    Code {
        language: SnippetLanguage,
        snippet: String,
    },
    Theory {
        message: String,
    },
}

impl HintResponse {
    pub fn new(hint_type: HintType, text: String) -> Self {
        match hint_type {
            HintType::Code => HintResponse::Code {
                language: SnippetLanguage::Python,
                snippet: text,
            },
            HintType::Theory => HintResponse::Theory { message: text },
        }
    }
}

/// How model output that is not the requested JSON object gets handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Fall back to the trimmed raw text.
    #[default]
    Lenient,
    /// Treat it as an upstream failure.
    Strict,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(OutputMode::Lenient),
            "strict" => Ok(OutputMode::Strict),
            other => Err(format!("expected 'lenient' or 'strict', got '{}'", other)),
        }
    }
}
