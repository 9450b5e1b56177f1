use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_COLOR: &str = "#fff";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

/// Display options for a single word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordConfig {
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for WordConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

/// A run of text with its own styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    #[serde(default)]
    pub config: WordConfig,
}

impl Word {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            config: WordConfig::default(),
        }
    }

    pub fn colored(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            config: WordConfig {
                color: color.into(),
            },
        }
    }
}

impl From<&str> for Word {
    fn from(text: &str) -> Self {
        Word::new(text)
    }
}

impl From<String> for Word {
    fn from(text: String) -> Self {
        Word::new(text)
    }
}

/// Display options for a sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceConfig {
    #[serde(default = "default_color")]
    pub color: String,
    /// Whether the line waits for acknowledgement before continuing.
    /// When false the interpreter moves on at once and the host may leave
    /// the line's future unresolved.
    #[serde(default = "default_true")]
    pub pause: bool,
    #[serde(default = "default_true")]
    pub display: bool,
}

impl Default for SentenceConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
            pause: true,
            display: true,
        }
    }
}

/// A line of dialogue or a menu prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Name of the speaking character, if any.
    pub character: Option<String>,
    pub text: Vec<Word>,
    #[serde(default)]
    pub config: SentenceConfig,
}

impl Sentence {
    pub fn new(character: Option<String>, text: Vec<Word>) -> Self {
        Self {
            character,
            text,
            config: SentenceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SentenceConfig) -> Self {
        self.config = config;
        self
    }

    /// The plain text with styling dropped.
    pub fn plain_text(&self) -> String {
        self.text.iter().map(|w| w.text.as_str()).collect()
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.text {
            f.write_str(&word.text)?;
        }
        Ok(())
    }
}

impl From<&str> for Sentence {
    fn from(text: &str) -> Self {
        Sentence::new(None, vec![Word::new(text)])
    }
}

impl From<String> for Sentence {
    fn from(text: String) -> Self {
        Sentence::new(None, vec![Word::new(text)])
    }
}

impl From<Word> for Sentence {
    fn from(word: Word) -> Self {
        Sentence::new(None, vec![word])
    }
}

impl From<Vec<Word>> for Sentence {
    fn from(words: Vec<Word>) -> Self {
        Sentence::new(None, words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_from_str() {
        let s = Sentence::from("Hello!");
        assert_eq!(s.plain_text(), "Hello!");
        assert!(s.character.is_none());
        assert!(s.config.display);
        assert!(s.config.pause);
    }

    #[test]
    fn mixed_words_join_without_separator() {
        let s = Sentence::from(vec![
            Word::new("Pick a number between "),
            Word::colored("1 and 10", "#f00"),
            Word::new("."),
        ]);
        assert_eq!(s.to_string(), "Pick a number between 1 and 10.");
        assert_eq!(s.text[1].config.color, "#f00");
        assert_eq!(s.text[0].config.color, "#fff");
    }

    #[test]
    fn config_defaults_fill_missing_ron_fields() {
        let s: Sentence = ron::from_str(r#"(character: Some("Ann"), text: [(text: "hi")])"#).unwrap();
        assert_eq!(s.character.as_deref(), Some("Ann"));
        assert_eq!(s.config, SentenceConfig::default());
        assert_eq!(s.text[0].config.color, "#fff");
    }
}
