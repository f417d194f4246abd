//! Conversation data model and the two model-facing renderings of it.
//!
//! A transcript is an ordered, append-only sequence of [`Exchange`] entries.
//! Before anything leaves this process the reserved termination marker is
//! filtered out: [`conversation_turns`] produces the role-tagged history sent
//! to the generation service and [`readable_text`] produces the plain-text
//! block embedded in the feedback prompt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved transcript value appended when the interview ends.
///
/// Never rendered to the user and never sent to the model; every transcript
/// reader filters it.
pub const END_MARKER: &str = "__END_INTERVIEW__";

/// Answers that end the interview, compared case-insensitively after trimming.
pub const END_COMMANDS: [&str; 3] = ["END INTERVIEW", "END_INTERVIEW", END_MARKER];

/// Returns true when a submitted answer is an end-of-interview command.
pub fn is_end_command(text: &str) -> bool {
    let trimmed = text.trim();
    END_COMMANDS
        .iter()
        .any(|command| trimmed.eq_ignore_ascii_case(command))
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Interviewer,
    Candidate,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Interviewer => write!(f, "Interviewer"),
            Speaker::Candidate => write!(f, "Candidate"),
        }
    }
}

/// One displayed turn of the interview. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub speaker: Speaker,
    pub text: String,
}

impl Exchange {
    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
        }
    }

    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
        }
    }

    /// True for the reserved termination marker entry.
    pub fn is_end_marker(&self) -> bool {
        self.text == END_MARKER
    }
}

/// Candidate experience level, fixed once the interview starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Fresher,
    Intermediate,
    Experienced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Fresher => write!(f, "Fresher"),
            Level::Intermediate => write!(f, "Intermediate"),
            Level::Experienced => write!(f, "Experienced"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown candidate level '{0}' (expected fresher, intermediate, or experienced)")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fresher" => Ok(Level::Fresher),
            "intermediate" => Ok(Level::Intermediate),
            "experienced" => Ok(Level::Experienced),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

/// Role tag of a conversation turn as the generation service understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    /// Wire-format role string.
    pub fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// One request-shaped unit of conversation history sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }
}

/// Maps the transcript onto the turn sequence sent to the generation service.
///
/// Candidate entries become `user` turns and Interviewer entries become
/// `model` turns. The termination marker is dropped, relative order is
/// preserved, and only the last `max_turns` entries are kept when a window is
/// given.
pub fn conversation_turns(transcript: &[Exchange], max_turns: Option<usize>) -> Vec<Turn> {
    let turns: Vec<Turn> = transcript
        .iter()
        .filter(|exchange| !exchange.is_end_marker())
        .map(|exchange| Turn {
            role: match exchange.speaker {
                Speaker::Candidate => TurnRole::User,
                Speaker::Interviewer => TurnRole::Model,
            },
            text: exchange.text.clone(),
        })
        .collect();

    match max_turns {
        Some(window) if turns.len() > window => turns[turns.len() - window..].to_vec(),
        _ => turns,
    }
}

/// Renders the transcript as `Speaker: text` lines for the feedback prompt.
///
/// The termination marker is dropped. When the joined text exceeds
/// `max_chars` characters it is truncated from the front, keeping the tail so
/// the most recent context survives.
pub fn readable_text(transcript: &[Exchange], max_chars: usize) -> String {
    let text = transcript
        .iter()
        .filter(|exchange| !exchange.is_end_marker())
        .map(|exchange| format!("{}: {}", exchange.speaker, exchange.text))
        .collect::<Vec<_>>()
        .join("\n");
    tail_chars(&text, max_chars).to_string()
}

/// Last `max_chars` characters of `s`, never splitting a code point.
fn tail_chars(s: &str, max_chars: usize) -> &str {
    let total = s.chars().count();
    if total <= max_chars {
        return s;
    }
    match s.char_indices().nth(total - max_chars) {
        Some((index, _)) => &s[index..],
        None => s,
    }
}
