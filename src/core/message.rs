//! core::message
//!
//! Commit and tag message construction.
//!
//! A message is the user-supplied text followed by a trailer block: an
//! optional author trailer (`Co-Authored-By: Name <email>` by default) and
//! any extra `key=value` trailers, sorted by key.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

/// Default commit message when none is given.
pub const DEFAULT_MESSAGE: &str = "Commit via API";

/// Default key for the author trailer.
pub const DEFAULT_AUTHOR_TRAILER: &str = "Co-Authored-By";

/// Headlines longer than this trigger a warning.
const MAX_HEADLINE: usize = 72;

/// Inputs for building a commit message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSpec {
    /// Free-form message text.
    pub message: String,
    /// Author trailer key; empty disables the author trailer.
    pub author_trailer: String,
    pub author_name: String,
    pub author_email: String,
    /// Extra trailers.
    pub trailers: BTreeMap<String, String>,
}

impl MessageSpec {
    /// Trailer lines in emission order.
    pub fn trailers(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.trailers.len() + 1);

        if !self.author_trailer.is_empty()
            && !self.author_name.is_empty()
            && !self.author_email.is_empty()
        {
            lines.push(format!(
                "{}: {} <{}>",
                self.author_trailer, self.author_name, self.author_email
            ));
        }

        lines.extend(self.trailers.iter().map(|(k, v)| format!("{k}: {v}")));
        lines
    }

    /// The full message text including the trailer block.
    pub fn build(&self) -> String {
        let trailers = self.trailers();

        let message = if trailers.is_empty() {
            self.message.clone()
        } else if self.message.is_empty() {
            format!("\n{}", trailers.join("\n"))
        } else {
            format!("{}\n\n{}", self.message, trailers.join("\n"))
        };

        let headline = message.lines().next().unwrap_or_default();
        if headline.chars().count() > MAX_HEADLINE {
            warn!(
                "commit message headline exceeds {} characters: {:?}",
                MAX_HEADLINE, headline
            );
        }

        message
    }
}

/// A commit message split the way the commit API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMessage {
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl CommitMessage {
    /// Split `message` at the first newline.
    pub fn parse(message: &str) -> Self {
        match message.split_once('\n') {
            Some((headline, body)) => Self {
                headline: headline.to_string(),
                body: Some(body.to_string()),
            },
            None => Self {
                headline: message.to_string(),
                body: None,
            },
        }
    }

    /// Reassemble the full text.
    pub fn full(&self) -> String {
        match &self.body {
            Some(body) => format!("{}\n{}", self.headline, body),
            None => self.headline.clone(),
        }
    }
}

impl From<&MessageSpec> for CommitMessage {
    fn from(spec: &MessageSpec) -> Self {
        CommitMessage::parse(&spec.build())
    }
}
