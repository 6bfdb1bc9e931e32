//! Aggregate survey statistics: eNPS, favorability, field averages,
//! correlations and demographic breakdowns. All functions tolerate nulls.

use crate::analytics::stats::{describe, pearson, percent, round_to, DescriptiveStats};
use crate::db::{EmployeeFilter, SurveyFilter};
use crate::domain::models::{
    CompetencyField, Demographic, Employee, ScoreSource, SurveyResponse, NOT_INFORMED,
};
use crate::error::InsightsError;
use crate::state::SharedState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub const FAVORABLE_MIN: i16 = 4;
pub const UNFAVORABLE_MAX: i16 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnpsResult {
    /// In [-100, 100], 2 decimals.
    pub score: f64,
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
    pub total: usize,
    pub promoter_pct: f64,
    pub passive_pct: f64,
    pub detractor_pct: f64,
}

pub fn calculate_enps(responses: &[SurveyResponse]) -> EnpsResult {
    let mut result = EnpsResult::default();
    for value in responses.iter().filter_map(SurveyResponse::enps_score) {
        match value {
            9..=10 => result.promoters += 1,
            7..=8 => result.passives += 1,
            _ => result.detractors += 1,
        }
        result.total += 1;
    }

    if result.total == 0 {
        return EnpsResult::default();
    }

    let net = result.promoters as f64 - result.detractors as f64;
    result.score = round_to(net / result.total as f64 * 100.0, 2);
    result.promoter_pct = percent(result.promoters, result.total);
    result.passive_pct = percent(result.passives, result.total);
    result.detractor_pct = percent(result.detractors, result.total);
    result
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavorabilityResult {
    /// Share of answers rated 4 or 5, in [0, 100].
    pub favorability: f64,
    pub favorable: usize,
    pub neutral: usize,
    pub unfavorable: usize,
    pub total: usize,
}

/// Counts every non-null competency answer, field by field.
pub fn calculate_favorability(responses: &[SurveyResponse]) -> FavorabilityResult {
    let mut result = FavorabilityResult::default();
    for response in responses {
        for field in CompetencyField::ALL {
            let Some(value) = response.competency(field) else {
                continue;
            };
            if value >= FAVORABLE_MIN {
                result.favorable += 1;
            } else if value <= UNFAVORABLE_MAX {
                result.unfavorable += 1;
            } else {
                result.neutral += 1;
            }
            result.total += 1;
        }
    }
    result.favorability = percent(result.favorable, result.total);
    result
}

fn values_for(responses: &[SurveyResponse], source: ScoreSource) -> Vec<f64> {
    responses
        .iter()
        .filter_map(|r| r.score(source))
        .map(f64::from)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAverage {
    pub field: CompetencyField,
    pub label: String,
    pub average: f64,
    pub responses: usize,
}

pub fn field_averages(responses: &[SurveyResponse]) -> Vec<FieldAverage> {
    CompetencyField::ALL
        .into_iter()
        .map(|field| {
            let values = values_for(responses, ScoreSource::Competency(field));
            let average = if values.is_empty() {
                0.0
            } else {
                round_to(values.iter().sum::<f64>() / values.len() as f64, 2)
            };
            FieldAverage {
                field,
                label: field.label().to_string(),
                average,
                responses: values.len(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStats {
    pub field: String,
    pub stats: DescriptiveStats,
}

/// Descriptive stats per competency field plus eNPS.
pub fn field_stats(responses: &[SurveyResponse]) -> Vec<FieldStats> {
    score_sources()
        .into_iter()
        .map(|source| FieldStats {
            field: source.key().to_string(),
            stats: describe(&values_for(responses, source)),
        })
        .collect()
}

fn score_sources() -> Vec<ScoreSource> {
    CompetencyField::ALL
        .into_iter()
        .map(ScoreSource::Competency)
        .chain(std::iter::once(ScoreSource::Enps))
        .collect()
}

/// field key -> field key -> Pearson r (4 decimals).
pub type CorrelationMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// Pairwise correlations over the competency fields and eNPS. Each cell uses
/// only the responses where both answers are present.
pub fn correlation_matrix(responses: &[SurveyResponse]) -> CorrelationMatrix {
    let sources = score_sources();
    let mut matrix = CorrelationMatrix::new();

    for a in &sources {
        let row = matrix.entry(a.key().to_string()).or_default();
        for b in &sources {
            let (xs, ys): (Vec<f64>, Vec<f64>) = responses
                .iter()
                .filter_map(|r| Some((f64::from(r.score(*a)?), f64::from(r.score(*b)?))))
                .unzip();
            row.insert(b.key().to_string(), round_to(pearson(&xs, &ys), 4));
        }
    }
    matrix
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyOverview {
    pub total_responses: usize,
    pub enps: EnpsResult,
    pub favorability: FavorabilityResult,
    pub field_averages: Vec<FieldAverage>,
    pub field_stats: Vec<FieldStats>,
}

pub fn build_overview(responses: &[SurveyResponse]) -> SurveyOverview {
    SurveyOverview {
        total_responses: responses.len(),
        enps: calculate_enps(responses),
        favorability: calculate_favorability(responses),
        field_averages: field_averages(responses),
        field_stats: field_stats(responses),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicGroup {
    pub group: String,
    pub count: usize,
    pub enps: EnpsResult,
    pub favorability: f64,
    pub field_averages: Vec<FieldAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicBreakdown {
    pub dimension: Demographic,
    pub groups: Vec<DemographicGroup>,
}

/// Partitions responses by an employee attribute. Responses whose employee is
/// unknown, or whose attribute is blank, land in "Não informado".
pub fn group_by_demographic(
    employees: &[Employee],
    responses: &[SurveyResponse],
    dimension: Demographic,
) -> DemographicBreakdown {
    let by_id: HashMap<Uuid, &Employee> = employees.iter().map(|e| (e.id, e)).collect();

    let mut buckets: BTreeMap<String, Vec<SurveyResponse>> = BTreeMap::new();
    for response in responses {
        let group = by_id
            .get(&response.employee_id)
            .map(|e| e.bucket(dimension))
            .unwrap_or_else(|| NOT_INFORMED.to_string());
        buckets.entry(group).or_default().push(response.clone());
    }

    let mut groups: Vec<DemographicGroup> = buckets
        .into_iter()
        .map(|(group, members)| DemographicGroup {
            count: members.len(),
            enps: calculate_enps(&members),
            favorability: calculate_favorability(&members).favorability,
            field_averages: field_averages(&members),
            group,
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.group.cmp(&b.group)));

    DemographicBreakdown { dimension, groups }
}

pub async fn survey_overview(
    state: &SharedState,
    filter: &SurveyFilter,
) -> Result<SurveyOverview, InsightsError> {
    let responses = state.store.fetch_surveys(filter).await?;
    tracing::debug!("survey_overview: {} responses for {:?}", responses.len(), filter);
    Ok(build_overview(&responses))
}

pub async fn survey_correlations(
    state: &SharedState,
    filter: &SurveyFilter,
) -> Result<CorrelationMatrix, InsightsError> {
    let responses = state.store.fetch_surveys(filter).await?;
    Ok(correlation_matrix(&responses))
}

pub async fn demographic_breakdown(
    state: &SharedState,
    dimension: Demographic,
) -> Result<DemographicBreakdown, InsightsError> {
    let employee_filter = EmployeeFilter::default();
    let survey_filter = SurveyFilter::All;
    let (employees, responses) = futures::try_join!(
        state.store.fetch_employees(&employee_filter),
        state.store.fetch_surveys(&survey_filter),
    )?;
    tracing::debug!(
        "demographic_breakdown by {}: {} employees, {} responses",
        dimension.as_str(),
        employees.len(),
        responses.len()
    );
    Ok(group_by_demographic(&employees, &responses, dimension))
}
