use an_core::{Result, SummarizationModel};
use async_trait::async_trait;

/// Rule-based lead summarizer: keeps the opening sentences of the text.
///
/// Words are taken from the start until at least `min_len` words are collected and a
/// sentence ends, and never beyond `max_len` words.
#[derive(Debug, Default, Clone)]
pub struct ExtractiveModel;

impl ExtractiveModel {
    pub fn new() -> Self {
        Self
    }
}

fn ends_sentence(word: &str) -> bool {
    word.trim_end_matches(['"', '\'', ')', '\u{201d}'])
        .ends_with(['.', '!', '?'])
}

#[async_trait]
impl SummarizationModel for ExtractiveModel {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn summarize_text(&self, text: &str, max_len: usize, min_len: usize) -> Result<String> {
        let mut words = Vec::new();
        for word in text.split_whitespace() {
            if words.len() >= max_len {
                break;
            }
            words.push(word);
            if words.len() >= min_len && ends_sentence(word) {
                break;
            }
        }
        Ok(words.join(" "))
    }
}
