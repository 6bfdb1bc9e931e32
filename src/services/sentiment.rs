use crate::analytics::stats::round_to;
use crate::services::lexicon::{fold, Lexicon, MAX_WORD_WEIGHT};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const MAX_RETURNED_TOKENS: usize = 50;
/// Negation stops applying after this many tokens without a scored word.
pub const NEGATION_WINDOW: usize = 3;
const LABEL_THRESHOLD: f64 = 0.1;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").expect("valid email regex"));
// ASCII word characters plus Latin-1 letters (× and ÷ excluded); runs after lowercasing.
static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9_\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{00FF}\s-]")
        .expect("valid charset regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score > LABEL_THRESHOLD {
            Self::Positive
        } else if score < -LABEL_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    /// In [-1, 1], 3 decimals.
    pub score: f64,
    pub label: SentimentLabel,
    /// In [0, 1], 3 decimals.
    pub confidence: f64,
    pub positive_hits: usize,
    pub negative_hits: usize,
    /// First tokens of the cleaned text, informational only.
    pub tokens: Vec<String>,
}

impl SentimentResult {
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            positive_hits: 0,
            negative_hits: 0,
            tokens: Vec::new(),
        }
    }
}

/// A lexicon word that contributed to a score, after negation and modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct WordHit {
    pub word: String,
    pub contribution: f64,
}

#[derive(Clone)]
pub struct SentimentAnalyzer {
    lexicon: Arc<Lexicon>,
}

impl SentimentAnalyzer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn analyze(&self, text: Option<&str>) -> SentimentResult {
        self.analyze_with_hits(text).0
    }

    /// Like `analyze`, also returning the lexicon words that were scored.
    pub fn analyze_with_hits(&self, text: Option<&str>) -> (SentimentResult, Vec<WordHit>) {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return (SentimentResult::neutral(), Vec::new());
        };

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return (SentimentResult::neutral(), Vec::new());
        }
        let normalized: Vec<String> = tokens.iter().map(|t| fold(t)).collect();

        let mut negated = false;
        let mut multiplier = 1.0;
        let mut total = 0.0;
        let mut scored_words = 0usize;
        let mut positive_hits = 0usize;
        let mut negative_hits = 0usize;
        let mut hits = Vec::new();

        for (i, (token, norm)) in tokens.iter().zip(&normalized).enumerate() {
            if self.lexicon.is_negation(norm) {
                negated = true;
                continue;
            }
            if let Some(weight) = self.lexicon.intensifier(norm) {
                multiplier = weight;
                continue;
            }
            if let Some(weight) = self.lexicon.diminisher(norm) {
                multiplier = weight;
                continue;
            }

            match self.lexicon.word_score(norm, token) {
                Some(mut score) => {
                    if negated {
                        score = -score;
                        negated = false;
                    }
                    score *= multiplier;
                    multiplier = 1.0;

                    total += score;
                    scored_words += 1;
                    if score > 0.0 {
                        positive_hits += 1;
                    } else {
                        negative_hits += 1;
                    }
                    hits.push(WordHit {
                        word: norm.clone(),
                        contribution: score,
                    });
                }
                None => {
                    // No lookback before the window fills; negation at the
                    // start of text survives the first filler tokens.
                    if i >= NEGATION_WINDOW
                        && self.lexicon.is_negation(&normalized[i - NEGATION_WINDOW])
                    {
                        negated = false;
                    }
                }
            }
        }

        let score = if scored_words == 0 {
            0.0
        } else {
            (total / (scored_words as f64 * MAX_WORD_WEIGHT as f64)).clamp(-1.0, 1.0)
        };
        let token_basis = (tokens.len() as f64 / 3.0).max(5.0);
        let confidence = (scored_words as f64 / token_basis).min(1.0);

        let result = SentimentResult {
            score: round_to(score, 3),
            label: SentimentLabel::from_score(score),
            confidence: round_to(confidence, 3),
            positive_hits,
            negative_hits,
            tokens: tokens.into_iter().take(MAX_RETURNED_TOKENS).collect(),
        };
        (result, hits)
    }

    /// Most frequent non-stop-word tokens across `texts`, ties alphabetical.
    pub fn extract_keywords(&self, texts: &[&str], limit: usize) -> Vec<(String, usize)> {
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for token in tokenize(text) {
                let norm = fold(&token);
                if norm.chars().count() < 4 || self.lexicon.is_stop_word(&norm) {
                    continue;
                }
                *freq.entry(norm).or_insert(0) += 1;
            }
        }

        let mut pairs: Vec<(String, usize)> = freq.into_iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs.truncate(limit);
        pairs
    }
}

/// Lowercase, drop URLs, e-mails and punctuation, split on whitespace and
/// discard single-character tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let without_urls = URL_RE.replace_all(&lowered, " ");
    let without_emails = EMAIL_RE.replace_all(&without_urls, " ");
    let cleaned = DISALLOWED_RE.replace_all(&without_emails, " ");
    let collapsed = WHITESPACE_RE.replace_all(&cleaned, " ");

    collapsed
        .trim()
        .split(' ')
        .filter(|token| token.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SentimentAnalyzer {
        SentimentAnalyzer::new(Arc::new(Lexicon::portuguese()))
    }

    #[test]
    fn test_empty_input_is_neutral_zero() {
        let analyzer = analyzer();
        for input in [None, Some(""), Some("   "), Some("!!! ?")] {
            let result = analyzer.analyze(input);
            assert_eq!(result.score, 0.0);
            assert_eq!(result.label, SentimentLabel::Neutral);
            assert_eq!(result.confidence, 0.0);
            assert!(result.tokens.is_empty());
        }
    }

    #[test]
    fn test_positive_comment() {
        let result = analyzer().analyze(Some("Excelente trabalho, muito satisfeito!"));
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!(result.score > 0.0);
        // excelente (3) + muito * satisfeito (1.5 * 2) over 2 words * 3
        assert_eq!(result.score, 1.0);
        assert_eq!(result.positive_hits, 2);
        assert_eq!(result.negative_hits, 0);
    }

    #[test]
    fn test_negative_comment() {
        let result = analyzer().analyze(Some("Trabalho ruim e estressante, muito frustrado"));
        assert_eq!(result.label, SentimentLabel::Negative);
        assert!(result.score < 0.0);
        // (-2 - 2 - 3) / 9
        assert_eq!(result.score, -0.778);
        assert_eq!(result.negative_hits, 3);
    }

    #[test]
    fn test_negation_flips_next_scored_word() {
        let (result, hits) = analyzer().analyze_with_hits(Some("Não gosto do ambiente"));
        assert_eq!(result.label, SentimentLabel::Negative);
        assert_eq!(result.negative_hits, 1);
        assert_eq!(
            hits,
            vec![WordHit {
                word: "gosto".into(),
                contribution: -2.0
            }]
        );
    }

    #[test]
    fn test_negation_is_consumed_once() {
        let result = analyzer().analyze(Some("não gosto, bom"));
        assert_eq!(result.positive_hits, 1);
        assert_eq!(result.negative_hits, 1);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_negation_expires_after_three_tokens() {
        // "hoje" sits three tokens after "nada", clearing the negation
        let result = analyzer().analyze(Some("nada ainda agora hoje feliz"));
        assert_eq!(result.label, SentimentLabel::Positive);
        assert_eq!(result.positive_hits, 1);
    }

    #[test]
    fn test_negation_lookback_is_bounded_at_start_of_text() {
        // indices 1 and 2 have no token three places back, negation holds
        let result = analyzer().analyze(Some("nada ainda agora feliz"));
        assert_eq!(result.label, SentimentLabel::Negative);
        assert_eq!(result.negative_hits, 1);
    }

    #[test]
    fn test_diminisher_scales_down() {
        let (result, hits) = analyzer().analyze_with_hits(Some("equipe pouco motivada"));
        assert_eq!(hits[0].contribution, 1.0);
        assert_eq!(result.score, 0.333);
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[test]
    fn test_multiplier_resets_after_use() {
        let (_, hits) = analyzer().analyze_with_hits(Some("extremamente bom e bom"));
        let contributions: Vec<f64> = hits.iter().map(|h| h.contribution).collect();
        assert_eq!(contributions, vec![4.0, 2.0]);
    }

    #[test]
    fn test_score_and_confidence_bounds() {
        let analyzer = analyzer();
        let texts = [
            "extremamente excelente extremamente ótimo",
            "extremamente péssimo absolutamente horrível",
            "reunião na terça às 10h",
            "bom ruim bom ruim",
        ];
        for text in texts {
            let result = analyzer.analyze(Some(text));
            assert!((-1.0..=1.0).contains(&result.score), "{text}");
            assert!((0.0..=1.0).contains(&result.confidence), "{text}");
        }
    }

    #[test]
    fn test_confidence_uses_token_basis() {
        // 2 scored words out of 4 tokens -> 2 / max(5, 4/3)
        let result = analyzer().analyze(Some("Excelente trabalho, muito satisfeito!"));
        assert_eq!(result.confidence, 0.4);
    }

    #[test]
    fn test_tokenize_strips_noise() {
        let tokens = tokenize("Veja https://intra.net/x e fale com rh@empresa.com.br: gestão é top-notch!");
        assert_eq!(tokens, vec!["veja", "fale", "com", "gestão", "top-notch"]);
    }

    #[test]
    fn test_tokenize_keeps_only_latin_letters() {
        let tokens = tokenize("Ótimo привет 你好 ação 3×4 ok_go");
        assert_eq!(tokens, vec!["ótimo", "ação", "ok_go"]);

        // non-Latin words no longer count toward the confidence basis
        let result = SentimentAnalyzer::new(Arc::new(Lexicon::portuguese()))
            .analyze(Some("excelente работа работа работа работа работа"));
        assert_eq!(result.tokens, vec!["excelente"]);
    }

    #[test]
    fn test_tokens_are_truncated() {
        let text = "palavra ".repeat(80);
        let result = analyzer().analyze(Some(&text));
        assert_eq!(result.tokens.len(), MAX_RETURNED_TOKENS);
    }

    #[test]
    fn test_original_spelling_fallback() {
        // "incrível" exists only accented in the lexicon
        let result = analyzer().analyze(Some("Ambiente incrível"));
        assert_eq!(result.positive_hits, 1);
    }

    #[test]
    fn test_extract_keywords_skips_stop_words() {
        let analyzer = analyzer();
        let texts = ["Falta feedback do gestor", "feedback sobre metas", "Gestor ausente"];
        let keywords = analyzer.extract_keywords(&texts, 2);
        assert_eq!(
            keywords,
            vec![("feedback".to_string(), 2), ("gestor".to_string(), 2)]
        );
    }
}
