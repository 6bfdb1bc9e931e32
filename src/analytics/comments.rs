use crate::analytics::stats::{mean, pearson, percent, round_to};
use crate::db::SurveyFilter;
use crate::domain::models::{CommentField, SurveyResponse};
use crate::error::InsightsError;
use crate::services::sentiment::{SentimentAnalyzer, SentimentLabel, SentimentResult, WordHit};
use crate::state::SharedState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const TOP_COMMENTS: usize = 5;
pub const TOP_WORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAnalysis {
    pub employee_id: Uuid,
    pub field: CommentField,
    pub text: String,
    pub sentiment: SentimentResult,
    /// The numeric answer this comment is attached to.
    pub related_score: Option<i16>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub positive_pct: f64,
    pub neutral_pct: f64,
    pub negative_pct: f64,
}

impl LabelDistribution {
    fn from_labels(labels: impl Iterator<Item = SentimentLabel>) -> Self {
        let mut dist = Self::default();
        for label in labels {
            match label {
                SentimentLabel::Positive => dist.positive += 1,
                SentimentLabel::Neutral => dist.neutral += 1,
                SentimentLabel::Negative => dist.negative += 1,
            }
        }
        let total = dist.positive + dist.neutral + dist.negative;
        dist.positive_pct = percent(dist.positive, total);
        dist.neutral_pct = percent(dist.neutral, total);
        dist.negative_pct = percent(dist.negative, total);
        dist
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSentimentSummary {
    pub field: CommentField,
    pub label: String,
    pub total_comments: usize,
    pub average_score: f64,
    pub distribution: LabelDistribution,
    pub average_related_score: Option<f64>,
    /// Pearson r between comment sentiment and the related answer, over the
    /// comments whose answer is present.
    pub score_correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSummary {
    pub total_responses: usize,
    pub total_comments: usize,
    pub average_score: f64,
    pub distribution: LabelDistribution,
    pub by_field: Vec<FieldSentimentSummary>,
    pub top_positive: Vec<CommentAnalysis>,
    pub top_negative: Vec<CommentAnalysis>,
    pub positive_words: Vec<WordFrequency>,
    pub negative_words: Vec<WordFrequency>,
    pub keywords: Vec<WordFrequency>,
}

/// Every non-blank comment of `response`, in descriptor order.
pub fn analyze_response_comments(
    analyzer: &SentimentAnalyzer,
    response: &SurveyResponse,
) -> Vec<CommentAnalysis> {
    analyze_with_hits(analyzer, response)
        .into_iter()
        .map(|(analysis, _)| analysis)
        .collect()
}

fn analyze_with_hits(
    analyzer: &SentimentAnalyzer,
    response: &SurveyResponse,
) -> Vec<(CommentAnalysis, Vec<WordHit>)> {
    response
        .comments()
        .map(|(field, text)| {
            let (sentiment, hits) = analyzer.analyze_with_hits(Some(text));
            let analysis = CommentAnalysis {
                employee_id: response.employee_id,
                field,
                text: text.to_string(),
                sentiment,
                related_score: response.score(field.related()),
            };
            (analysis, hits)
        })
        .collect()
}

/// Mean comment sentiment of one response; `None` without comments.
pub fn response_sentiment(analyzer: &SentimentAnalyzer, response: &SurveyResponse) -> Option<f64> {
    let scores: Vec<f64> = response
        .comments()
        .map(|(_, text)| analyzer.analyze(Some(text)).score)
        .collect();
    mean(&scores)
}

fn summarize_field(field: CommentField, comments: &[&CommentAnalysis]) -> FieldSentimentSummary {
    let scores: Vec<f64> = comments.iter().map(|c| c.sentiment.score).collect();
    let (paired_sentiment, paired_related): (Vec<f64>, Vec<f64>) = comments
        .iter()
        .filter_map(|c| Some((c.sentiment.score, f64::from(c.related_score?))))
        .unzip();

    FieldSentimentSummary {
        field,
        label: field.label().to_string(),
        total_comments: comments.len(),
        average_score: mean(&scores).map(|m| round_to(m, 3)).unwrap_or(0.0),
        distribution: LabelDistribution::from_labels(comments.iter().map(|c| c.sentiment.label)),
        average_related_score: mean(&paired_related).map(|m| round_to(m, 2)),
        score_correlation: round_to(pearson(&paired_sentiment, &paired_related), 4),
    }
}

fn frequency_table(counts: HashMap<String, usize>, limit: usize) -> Vec<WordFrequency> {
    let mut table: Vec<WordFrequency> = counts
        .into_iter()
        .map(|(word, count)| WordFrequency { word, count })
        .collect();
    table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    table.truncate(limit);
    table
}

pub fn summarize(analyzer: &SentimentAnalyzer, responses: &[SurveyResponse]) -> SentimentSummary {
    let mut analyses = Vec::new();
    let mut positive_counts: HashMap<String, usize> = HashMap::new();
    let mut negative_counts: HashMap<String, usize> = HashMap::new();

    for response in responses {
        for (analysis, hits) in analyze_with_hits(analyzer, response) {
            for hit in hits {
                let table = if hit.contribution > 0.0 {
                    &mut positive_counts
                } else {
                    &mut negative_counts
                };
                *table.entry(hit.word).or_insert(0) += 1;
            }
            analyses.push(analysis);
        }
    }

    let by_field = CommentField::ALL
        .into_iter()
        .filter_map(|field| {
            let members: Vec<&CommentAnalysis> =
                analyses.iter().filter(|a| a.field == field).collect();
            (!members.is_empty()).then(|| summarize_field(field, &members))
        })
        .collect();

    let mut top_positive: Vec<CommentAnalysis> = analyses
        .iter()
        .filter(|a| a.sentiment.label == SentimentLabel::Positive)
        .cloned()
        .collect();
    top_positive.sort_by(|a, b| b.sentiment.score.total_cmp(&a.sentiment.score));
    top_positive.truncate(TOP_COMMENTS);

    let mut top_negative: Vec<CommentAnalysis> = analyses
        .iter()
        .filter(|a| a.sentiment.label == SentimentLabel::Negative)
        .cloned()
        .collect();
    top_negative.sort_by(|a, b| a.sentiment.score.total_cmp(&b.sentiment.score));
    top_negative.truncate(TOP_COMMENTS);

    let texts: Vec<&str> = analyses.iter().map(|a| a.text.as_str()).collect();
    let keywords = analyzer
        .extract_keywords(&texts, TOP_WORDS)
        .into_iter()
        .map(|(word, count)| WordFrequency { word, count })
        .collect();

    let scores: Vec<f64> = analyses.iter().map(|a| a.sentiment.score).collect();

    SentimentSummary {
        total_responses: responses.len(),
        total_comments: analyses.len(),
        average_score: mean(&scores).map(|m| round_to(m, 3)).unwrap_or(0.0),
        distribution: LabelDistribution::from_labels(analyses.iter().map(|a| a.sentiment.label)),
        by_field,
        top_positive,
        top_negative,
        positive_words: frequency_table(positive_counts, TOP_WORDS),
        negative_words: frequency_table(negative_counts, TOP_WORDS),
        keywords,
    }
}

pub async fn sentiment_summary(
    state: &SharedState,
    filter: &SurveyFilter,
) -> Result<SentimentSummary, InsightsError> {
    let responses = state.store.fetch_surveys(filter).await?;
    let summary = summarize(&state.analyzer(), &responses);
    tracing::info!(
        "Sentiment summary: {} comments across {} responses",
        summary.total_comments,
        summary.total_responses
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::InMemoryStore;
    use crate::domain::models::SurveySelection;
    use crate::services::lexicon::Lexicon;
    use crate::state::AppState;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn analyzer() -> SentimentAnalyzer {
        SentimentAnalyzer::new(Arc::new(Lexicon::portuguese()))
    }

    fn response(feedback: Option<i16>, feedback_comment: Option<&str>) -> SurveyResponse {
        let mut r = SurveyResponse::blank(Uuid::new_v4(), NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        r.feedback = feedback;
        r.feedback_comment = feedback_comment.map(String::from);
        r
    }

    #[test]
    fn test_comments_carry_related_score() {
        let mut r = response(Some(4), Some("Feedback bom e frequente"));
        r.enps = Some(9);
        r.enps_comment = Some("Excelente empresa".into());
        r.learning_comment = Some("   ".into());

        let analyses = analyze_response_comments(&analyzer(), &r);
        assert_eq!(analyses.len(), 2);
        assert_eq!(analyses[0].field, CommentField::Feedback);
        assert_eq!(analyses[0].related_score, Some(4));
        assert_eq!(analyses[1].field, CommentField::Enps);
        assert_eq!(analyses[1].related_score, Some(9));
    }

    #[test]
    fn test_response_sentiment_is_mean_or_none() {
        let analyzer = analyzer();
        assert_eq!(response_sentiment(&analyzer, &response(Some(3), None)), None);

        let mut r = response(Some(3), Some("Excelente trabalho, muito satisfeito!"));
        r.learning_comment = Some("Trabalho ruim e estressante, muito frustrado".into());
        let mean = response_sentiment(&analyzer, &r).unwrap();
        assert!((mean - (1.0 - 0.778) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_distribution_and_examples() {
        let responses = vec![
            response(Some(5), Some("Excelente trabalho, muito satisfeito!")),
            response(Some(1), Some("Trabalho ruim e estressante, muito frustrado")),
            response(Some(3), Some("Reunião na terça")),
            response(None, None),
        ];
        let summary = summarize(&analyzer(), &responses);

        assert_eq!(summary.total_responses, 4);
        assert_eq!(summary.total_comments, 3);
        assert_eq!(summary.distribution.positive, 1);
        assert_eq!(summary.distribution.neutral, 1);
        assert_eq!(summary.distribution.negative, 1);
        assert_eq!(summary.distribution.positive_pct, 33.33);

        assert_eq!(summary.by_field.len(), 1);
        let feedback = &summary.by_field[0];
        assert_eq!(feedback.field, CommentField::Feedback);
        assert_eq!(feedback.total_comments, 3);
        assert_eq!(feedback.average_related_score, Some(3.0));
        assert!(feedback.score_correlation > 0.9);

        assert_eq!(summary.top_positive.len(), 1);
        assert_eq!(summary.top_positive[0].sentiment.score, 1.0);
        assert_eq!(summary.top_negative.len(), 1);
        assert_eq!(summary.top_negative[0].related_score, Some(1));
    }

    #[test]
    fn test_word_tables_sorted_by_count_then_word() {
        let responses = vec![
            response(None, Some("bom ambiente, ruim salário")),
            response(None, Some("bom gestor")),
            response(None, Some("excelente e bom")),
        ];
        let summary = summarize(&analyzer(), &responses);
        assert_eq!(
            summary.positive_words[0],
            WordFrequency {
                word: "bom".into(),
                count: 3
            }
        );
        assert_eq!(summary.positive_words[1].word, "excelente");
        assert_eq!(summary.negative_words[0].word, "ruim");
    }

    #[test]
    fn test_empty_summary_is_zeroed() {
        let summary = summarize(&analyzer(), &[]);
        assert_eq!(summary.total_comments, 0);
        assert_eq!(summary.average_score, 0.0);
        assert_eq!(summary.distribution, LabelDistribution::default());
        assert!(summary.by_field.is_empty());
        assert!(summary.keywords.is_empty());
    }

    #[tokio::test]
    async fn test_sentiment_summary_from_store() {
        let r = response(Some(2), Some("Não gosto do ambiente"));
        let store = InMemoryStore::new(Vec::new(), vec![r]);
        let state = Arc::new(AppState::new(
            Arc::new(store),
            Arc::new(Lexicon::portuguese()),
            SurveySelection::MostRecent,
        ));
        let summary = sentiment_summary(&state, &SurveyFilter::All).await.unwrap();
        assert_eq!(summary.distribution.negative, 1);
        assert_eq!(summary.negative_words[0].word, "gosto");
    }
}
