//! # Message Log
//!
//! The running log of player-facing text produced by the turn pipeline.
//! Rendering is a collaborator concern; each entry carries a semantic style
//! tag instead of a concrete color.

use serde::{Deserialize, Serialize};

/// Semantic styling for a log entry. Collaborating renderers map these to
/// their own colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStyle {
    Info,
    Welcome,
    HealthRecovered,
    NeedsTarget,
    StatusEffect,
    PlayerAttack,
    EnemyAttack,
    PlayerDie,
    EnemyDie,
    Descend,
    Good,
    Impossible,
}

/// One log entry. Repeated identical texts stack into a single entry with a
/// counter instead of flooding the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub style: MessageStyle,
    pub count: u32,
}

impl Message {
    pub fn new(text: impl Into<String>, style: MessageStyle) -> Self {
        Self {
            text: text.into(),
            style,
            count: 1,
        }
    }

    /// The text with the stack counter appended when above one.
    pub fn full_text(&self) -> String {
        if self.count > 1 {
            format!("{} (x{})", self.text, self.count)
        } else {
            self.text.clone()
        }
    }
}

/// Append-only message log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    pub messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, stacking onto the previous entry when the text
    /// repeats exactly.
    pub fn add(&mut self, text: impl Into<String>, style: MessageStyle) {
        let text = text.into();
        if let Some(last) = self.messages.last_mut() {
            if last.text == text {
                last.count += 1;
                return;
            }
        }
        self.messages.push(Message::new(text, style));
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}
