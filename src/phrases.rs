use crate::assets::read_embedded_json;
use crate::error::{FastLegendError, FlResult};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::fmt;

/// Phrase length class picked from the test duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DurationBucket {
    Short,
    Medium,
    Long,
}

impl DurationBucket {
    pub fn from_secs(duration: u32) -> Self {
        match duration {
            0..=30 => DurationBucket::Short,
            31..=90 => DurationBucket::Medium,
            _ => DurationBucket::Long,
        }
    }
}

/// Source of target text for a session
pub trait PhraseProvider: fmt::Debug {
    fn phrase(&self, bucket: DurationBucket) -> String;
}

#[derive(Deserialize, Clone, Debug)]
pub struct PhraseCorpus {
    pub short: Vec<String>,
    pub medium: Vec<String>,
    pub long: Vec<String>,
}

impl PhraseCorpus {
    /// Load the corpus bundled with the binary
    pub fn embedded() -> FlResult<Self> {
        let corpus: PhraseCorpus = read_embedded_json("phrases.json")?;
        corpus.validate()?;
        Ok(corpus)
    }

    pub fn bucket(&self, bucket: DurationBucket) -> &[String] {
        match bucket {
            DurationBucket::Short => &self.short,
            DurationBucket::Medium => &self.medium,
            DurationBucket::Long => &self.long,
        }
    }

    fn validate(&self) -> FlResult<()> {
        for bucket in [
            DurationBucket::Short,
            DurationBucket::Medium,
            DurationBucket::Long,
        ] {
            if self.bucket(bucket).iter().all(|p| p.trim().is_empty()) {
                return Err(FastLegendError::Corpus(format!("{bucket} bucket is empty")));
            }
        }
        Ok(())
    }
}

/// Uniformly random phrase from a bucketed corpus
#[derive(Debug, Clone)]
pub struct CorpusPhraseProvider {
    corpus: PhraseCorpus,
}

impl CorpusPhraseProvider {
    pub fn new(corpus: PhraseCorpus) -> Self {
        Self { corpus }
    }

    pub fn embedded() -> FlResult<Self> {
        Ok(Self::new(PhraseCorpus::embedded()?))
    }
}

impl PhraseProvider for CorpusPhraseProvider {
    fn phrase(&self, bucket: DurationBucket) -> String {
        self.corpus
            .bucket(bucket)
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

/// Always hands out the same text, used for custom prompts
#[derive(Debug, Clone)]
pub struct FixedPhraseProvider {
    prompt: String,
}

impl FixedPhraseProvider {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl PhraseProvider for FixedPhraseProvider {
    fn phrase(&self, _bucket: DurationBucket) -> String {
        self.prompt.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_thresholds() {
        assert_eq!(DurationBucket::from_secs(15), DurationBucket::Short);
        assert_eq!(DurationBucket::from_secs(30), DurationBucket::Short);
        assert_eq!(DurationBucket::from_secs(31), DurationBucket::Medium);
        assert_eq!(DurationBucket::from_secs(90), DurationBucket::Medium);
        assert_eq!(DurationBucket::from_secs(91), DurationBucket::Long);
        assert_eq!(DurationBucket::from_secs(120), DurationBucket::Long);
    }

    #[test]
    fn test_embedded_corpus_has_every_bucket() {
        let corpus = PhraseCorpus::embedded().unwrap();

        assert!(!corpus.short.is_empty());
        assert!(!corpus.medium.is_empty());
        assert!(!corpus.long.is_empty());
    }

    #[test]
    fn test_corpus_provider_picks_from_bucket() {
        let corpus = PhraseCorpus::embedded().unwrap();
        let provider = CorpusPhraseProvider::new(corpus.clone());

        for _ in 0..20 {
            let phrase = provider.phrase(DurationBucket::Short);
            assert!(corpus.short.contains(&phrase));
        }
    }

    #[test]
    fn test_empty_bucket_fails_validation() {
        let corpus = PhraseCorpus {
            short: vec!["a b c".to_string()],
            medium: vec![],
            long: vec!["d e f".to_string()],
        };
        assert!(corpus.validate().is_err());
    }

    #[test]
    fn test_fixed_provider() {
        let provider = FixedPhraseProvider::new("custom test prompt");
        assert_eq!(provider.phrase(DurationBucket::Long), "custom test prompt");
    }
}
