//! Transcript model.
//!
//! The backend sends the conversation as a flat list alternating question
//! and answer texts, plus one source annotation per answer. A
//! [`Conversation`] is rebuilt from scratch on every full sync.

use tracing::debug;

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Question(String),
    Answer { text: String, source: String },
}

/// Kind of a rendered block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Question,
    Answer,
    Source,
}

/// A block of text in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub kind: BlockKind,
    pub text: &'a str,
}

/// The full transcript of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    entries: Vec<Entry>,
}

impl Conversation {
    /// Build a transcript from the wire representation.
    ///
    /// Even positions are questions, odd positions answers. The `n`-th
    /// answer takes the `n`-th source; missing sources become empty and
    /// surplus sources are dropped, so every answer has exactly one.
    pub fn from_parts(parts: Vec<String>, sources: Vec<String>) -> Self {
        let answers = parts.len() / 2;
        if sources.len() != answers {
            debug!(
                answers,
                sources = sources.len(),
                "Source annotations do not match answers"
            );
        }

        let mut sources = sources.into_iter();
        let entries = parts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                if i % 2 == 0 {
                    Entry::Question(text)
                } else {
                    Entry::Answer {
                        text,
                        source: sources.next().unwrap_or_default(),
                    }
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of question and answer entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn question_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Question(_)))
            .count()
    }

    pub fn answer_count(&self) -> usize {
        self.len() - self.question_count()
    }

    /// Source annotations, one per answer.
    pub fn sources(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Answer { source, .. } => Some(source.as_str()),
                Entry::Question(_) => None,
            })
            .collect()
    }

    /// The trailing question that has no answer yet.
    pub fn pending_question(&self) -> Option<&str> {
        match self.entries.last() {
            Some(Entry::Question(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Display blocks: each question, then each answer directly followed by
    /// its source.
    pub fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks = Vec::with_capacity(self.entries.len() * 3 / 2 + 1);
        for entry in &self.entries {
            match entry {
                Entry::Question(text) => blocks.push(Block {
                    kind: BlockKind::Question,
                    text: text.as_str(),
                }),
                Entry::Answer { text, source } => {
                    blocks.push(Block {
                        kind: BlockKind::Answer,
                        text: text.as_str(),
                    });
                    blocks.push(Block {
                        kind: BlockKind::Source,
                        text: source.as_str(),
                    });
                }
            }
        }
        blocks
    }
}
