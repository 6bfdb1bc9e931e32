use crate::analytics::attrition::{
    assess_employee, EmployeeRiskAssessment, RiskFactorKind, SIGNIFICANT_CONTRIBUTION,
};
use crate::analytics::stats::{pearson, percent, round_to};
use crate::db::{EmployeeFilter, SurveyFilter};
use crate::domain::models::{
    Employee, RiskLevel, SurveyResponse, SurveySelection, NOT_INFORMED,
};
use crate::error::InsightsError;
use crate::services::lexicon::fold;
use crate::services::sentiment::SentimentAnalyzer;
use crate::state::SharedState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;
/// Minimum risk gap between tenure extremes worth calling a pattern.
pub const TENURE_GAP_THRESHOLD: f64 = 15.0;

/// One assessment per employee that has at least one response, in the order
/// the employees were given.
pub fn assess_population(
    employees: &[Employee],
    responses: Vec<SurveyResponse>,
    analyzer: &SentimentAnalyzer,
    selection: SurveySelection,
) -> Vec<EmployeeRiskAssessment> {
    let mut by_employee: HashMap<Uuid, Vec<SurveyResponse>> = HashMap::new();
    for response in responses {
        by_employee.entry(response.employee_id).or_default().push(response);
    }

    employees
        .iter()
        .filter_map(|employee| {
            let answered = by_employee.get(&employee.id)?;
            let response = selection.pick(answered)?;
            Some(assess_employee(employee, response, analyzer))
        })
        .collect()
}

pub async fn assess_all(state: &SharedState) -> Result<Vec<EmployeeRiskAssessment>, InsightsError> {
    let employee_filter = EmployeeFilter::default();
    let survey_filter = SurveyFilter::All;
    let (employees, responses) = futures::try_join!(
        state.store.fetch_employees(&employee_filter),
        state.store.fetch_surveys(&survey_filter),
    )?;
    tracing::debug!(
        "Assessing {} employees against {} responses ({})",
        employees.len(),
        responses.len(),
        state.selection.as_str()
    );
    Ok(assess_population(
        &employees,
        responses,
        &state.analyzer(),
        state.selection,
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCount {
    pub level: RiskLevel,
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorImpact {
    pub factor: RiskFactorKind,
    pub name: String,
    pub average_contribution: f64,
    /// Employees for whom this factor contributes more than 0.1.
    pub affected_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRisk {
    pub group: String,
    pub count: usize,
    pub average_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttritionRiskSummary {
    pub total_assessed: usize,
    pub average_risk_score: f64,
    pub distribution: Vec<LevelCount>,
    pub factors: Vec<FactorImpact>,
    pub by_generation: Vec<GroupRisk>,
    pub by_tenure: Vec<GroupRisk>,
    pub by_area: Vec<GroupRisk>,
}

fn bucket_name(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_INFORMED)
        .to_string()
}

/// Average risk per group, highest first.
pub fn group_risk<F>(assessments: &[EmployeeRiskAssessment], key: F) -> Vec<GroupRisk>
where
    F: Fn(&EmployeeRiskAssessment) -> Option<&str>,
{
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for assessment in assessments {
        groups
            .entry(bucket_name(key(assessment)))
            .or_default()
            .push(assessment.risk_score);
    }

    let mut out: Vec<GroupRisk> = groups
        .into_iter()
        .map(|(group, scores)| GroupRisk {
            group,
            count: scores.len(),
            average_risk: round_to(scores.iter().sum::<f64>() / scores.len() as f64, 1),
        })
        .collect();
    out.sort_by(|a, b| {
        b.average_risk
            .total_cmp(&a.average_risk)
            .then_with(|| a.group.cmp(&b.group))
    });
    out
}

pub fn summarize(assessments: &[EmployeeRiskAssessment]) -> AttritionRiskSummary {
    let total = assessments.len();

    let distribution = RiskLevel::ALL
        .into_iter()
        .map(|level| {
            let count = assessments.iter().filter(|a| a.risk_level == level).count();
            LevelCount {
                level,
                label: level.label_pt().to_string(),
                count,
                percentage: percent(count, total),
            }
        })
        .collect();

    let mut factors: Vec<FactorImpact> = RiskFactorKind::ALL
        .into_iter()
        .map(|kind| {
            let contributions: Vec<f64> = assessments
                .iter()
                .filter_map(|a| a.factor(kind))
                .map(|f| f.contribution)
                .collect();
            let average = if contributions.is_empty() {
                0.0
            } else {
                contributions.iter().sum::<f64>() / contributions.len() as f64
            };
            FactorImpact {
                factor: kind,
                name: kind.label().to_string(),
                average_contribution: round_to(average, 4),
                affected_count: contributions
                    .iter()
                    .filter(|c| **c > SIGNIFICANT_CONTRIBUTION)
                    .count(),
            }
        })
        .collect();
    factors.sort_by(|a, b| b.average_contribution.total_cmp(&a.average_contribution));

    let average_risk_score = if total == 0 {
        0.0
    } else {
        round_to(assessments.iter().map(|a| a.risk_score).sum::<f64>() / total as f64, 1)
    };

    AttritionRiskSummary {
        total_assessed: total,
        average_risk_score,
        distribution,
        factors,
        by_generation: group_risk(assessments, |a| a.generation.as_deref()),
        by_tenure: group_risk(assessments, |a| a.tenure.as_deref()),
        by_area: group_risk(assessments, |a| a.area.as_deref()),
    }
}

pub async fn attrition_summary(state: &SharedState) -> Result<AttritionRiskSummary, InsightsError> {
    let assessments = assess_all(state).await?;
    let summary = summarize(&assessments);
    tracing::info!(
        "Attrition summary: {} employees, average risk {}",
        summary.total_assessed,
        summary.average_risk_score
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSort {
    #[default]
    RiskScore,
    Name,
}

impl TryFrom<&str> for RiskSort {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "risk" | "risk_score" | "riskscore" => Ok(Self::RiskScore),
            "name" => Ok(Self::Name),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskListQuery {
    /// 1-based.
    pub page: usize,
    pub limit: usize,
    pub sort: RiskSort,
    pub level: Option<RiskLevel>,
}

impl Default for RiskListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: RiskSort::default(),
            level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPage {
    pub items: Vec<EmployeeRiskAssessment>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

pub fn paginate(mut assessments: Vec<EmployeeRiskAssessment>, query: &RiskListQuery) -> RiskPage {
    if let Some(level) = query.level {
        assessments.retain(|a| a.risk_level == level);
    }
    match query.sort {
        RiskSort::RiskScore => assessments.sort_by(|a, b| {
            b.risk_score
                .total_cmp(&a.risk_score)
                .then_with(|| compare_names(&a.name, &b.name))
        }),
        RiskSort::Name => assessments.sort_by(|a, b| compare_names(&a.name, &b.name)),
    }

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let total = assessments.len();
    let total_pages = total.div_ceil(limit);
    let items = assessments
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    RiskPage {
        items,
        total,
        page,
        limit,
        total_pages,
    }
}

pub async fn list_risks(state: &SharedState, query: &RiskListQuery) -> Result<RiskPage, InsightsError> {
    let assessments = assess_all(state).await?;
    Ok(paginate(assessments, query))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarityBucket {
    pub career_clarity: i16,
    pub count: usize,
    pub average_risk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisVerdict {
    Confirmed,
    PartiallyConfirmed,
    NotConfirmed,
}

impl HypothesisVerdict {
    pub fn from_correlation(r: f64) -> Self {
        if r < -0.3 {
            Self::Confirmed
        } else if r < 0.0 {
            Self::PartiallyConfirmed
        } else {
            Self::NotConfirmed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerClarityHypothesis {
    pub hypothesis: String,
    pub buckets: Vec<ClarityBucket>,
    pub correlation: f64,
    pub verdict: HypothesisVerdict,
    pub conclusion: String,
}

/// Tests whether lower career clarity goes with higher attrition risk.
pub fn career_clarity_hypothesis(assessments: &[EmployeeRiskAssessment]) -> CareerClarityHypothesis {
    let mut buckets: BTreeMap<i16, Vec<f64>> = BTreeMap::new();
    for assessment in assessments {
        let clarity = assessment
            .factor(RiskFactorKind::CareerClarity)
            .and_then(|f| f.raw_value);
        if let Some(value) = clarity {
            buckets
                .entry(value as i16)
                .or_default()
                .push(assessment.risk_score);
        }
    }

    let buckets: Vec<ClarityBucket> = buckets
        .into_iter()
        .map(|(career_clarity, scores)| ClarityBucket {
            career_clarity,
            count: scores.len(),
            average_risk: round_to(scores.iter().sum::<f64>() / scores.len() as f64, 1),
        })
        .collect();

    let xs: Vec<f64> = buckets.iter().map(|b| f64::from(b.career_clarity)).collect();
    let ys: Vec<f64> = buckets.iter().map(|b| b.average_risk).collect();
    let correlation = round_to(pearson(&xs, &ys), 4);
    let verdict = HypothesisVerdict::from_correlation(correlation);

    let conclusion = match verdict {
        HypothesisVerdict::Confirmed => format!(
            "Hipótese confirmada: menor clareza de carreira está associada a maior risco (r = {:.2})",
            correlation
        ),
        HypothesisVerdict::PartiallyConfirmed => format!(
            "Hipótese parcialmente confirmada: associação fraca entre clareza de carreira e risco (r = {:.2})",
            correlation
        ),
        HypothesisVerdict::NotConfirmed => format!(
            "Hipótese não confirmada: clareza de carreira não reduz o risco de saída (r = {:.2})",
            correlation
        ),
    };

    CareerClarityHypothesis {
        hypothesis: "Colaboradores com menor clareza de carreira têm maior risco de saída".to_string(),
        buckets,
        correlation,
        verdict,
        conclusion,
    }
}

pub async fn career_hypothesis(state: &SharedState) -> Result<CareerClarityHypothesis, InsightsError> {
    let assessments = assess_all(state).await?;
    Ok(career_clarity_hypothesis(&assessments))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenurePatternAnalysis {
    /// Highest average risk first.
    pub buckets: Vec<GroupRisk>,
    pub highest: Option<GroupRisk>,
    pub lowest: Option<GroupRisk>,
    pub gap: f64,
    pub pattern: Option<String>,
}

pub fn tenure_pattern_analysis(assessments: &[EmployeeRiskAssessment]) -> TenurePatternAnalysis {
    let buckets = group_risk(assessments, |a| a.tenure.as_deref());
    let highest = buckets.first().cloned();
    let lowest = buckets.last().cloned();

    let gap = match (&highest, &lowest) {
        (Some(h), Some(l)) => round_to(h.average_risk - l.average_risk, 1),
        _ => 0.0,
    };
    let pattern = match (&highest, &lowest) {
        (Some(h), Some(l)) if gap > TENURE_GAP_THRESHOLD => Some(format!(
            "Colaboradores com tempo de casa \"{}\" apresentam risco médio {:.1} pontos acima de \"{}\"",
            h.group, gap, l.group
        )),
        _ => None,
    };

    TenurePatternAnalysis {
        buckets,
        highest,
        lowest,
        gap,
        pattern,
    }
}

pub async fn tenure_patterns(state: &SharedState) -> Result<TenurePatternAnalysis, InsightsError> {
    let assessments = assess_all(state).await?;
    Ok(tenure_pattern_analysis(&assessments))
}
