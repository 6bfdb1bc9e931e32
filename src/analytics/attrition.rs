//! Per-employee attrition risk.
//!
//! Eight weighted factors, each mapped to a risk value in [0, 1] where 1 is
//! the worst answer. A missing answer counts as 0.5. The weighted sum times
//! 100 is the risk score.

use crate::analytics::comments::response_sentiment;
use crate::analytics::stats::round_to;
use crate::db::SurveyFilter;
use crate::domain::models::{CompetencyField, Employee, RiskLevel, SurveyResponse};
use crate::error::InsightsError;
use crate::services::sentiment::SentimentAnalyzer;
use crate::state::SharedState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NEUTRAL_RISK: f64 = 0.5;
/// Factors contributing more than this are "affected" and get a recommendation.
pub const SIGNIFICANT_CONTRIBUTION: f64 = 0.1;
const MAX_RECOMMENDED_FACTORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskFactorKind {
    PermanenceExpectation,
    EnpsScore,
    CareerClarity,
    ManagerInteraction,
    SentimentScore,
    Feedback,
    LearningOpportunities,
    Contribution,
}

impl RiskFactorKind {
    pub const ALL: [RiskFactorKind; 8] = [
        RiskFactorKind::PermanenceExpectation,
        RiskFactorKind::EnpsScore,
        RiskFactorKind::CareerClarity,
        RiskFactorKind::ManagerInteraction,
        RiskFactorKind::SentimentScore,
        RiskFactorKind::Feedback,
        RiskFactorKind::LearningOpportunities,
        RiskFactorKind::Contribution,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::PermanenceExpectation => "permanenceExpectation",
            Self::EnpsScore => "enpsScore",
            Self::CareerClarity => "careerClarity",
            Self::ManagerInteraction => "managerInteraction",
            Self::SentimentScore => "sentimentScore",
            Self::Feedback => "feedback",
            Self::LearningOpportunities => "learningOpportunities",
            Self::Contribution => "contribution",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PermanenceExpectation => "Expectativa de Permanência",
            Self::EnpsScore => "eNPS",
            Self::CareerClarity => "Clareza de Carreira",
            Self::ManagerInteraction => "Interação com Gestor",
            Self::SentimentScore => "Sentimento dos Comentários",
            Self::Feedback => "Feedback",
            Self::LearningOpportunities => "Oportunidades de Aprendizado",
            Self::Contribution => "Contribuição",
        }
    }

    /// Weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Self::PermanenceExpectation => 0.25,
            Self::EnpsScore => 0.20,
            Self::CareerClarity => 0.15,
            Self::ManagerInteraction => 0.12,
            Self::SentimentScore => 0.10,
            Self::Feedback => 0.08,
            Self::LearningOpportunities => 0.05,
            Self::Contribution => 0.05,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::PermanenceExpectation => {
                "Conversar sobre planos de futuro e expectativas de permanência na empresa"
            }
            Self::EnpsScore => "Investigar os motivos da baixa disposição em recomendar a empresa",
            Self::CareerClarity => "Apresentar trilhas de carreira e critérios de promoção claros",
            Self::ManagerInteraction => "Fortalecer a relação com o gestor por meio de 1:1 regulares",
            Self::SentimentScore => "Ler os comentários abertos para entender as insatisfações relatadas",
            Self::Feedback => "Estabelecer uma rotina de feedback estruturado",
            Self::LearningOpportunities => "Oferecer oportunidades de capacitação e desenvolvimento",
            Self::Contribution => "Reconhecer e dar visibilidade às contribuições do colaborador",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub factor: RiskFactorKind,
    pub name: String,
    /// Answer as given: Likert 1-5, eNPS 0-10 or sentiment -1..1.
    pub raw_value: Option<f64>,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
    pub description: String,
}

/// The answers that feed the scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskInputs {
    pub permanence_expectation: Option<i16>,
    pub career_clarity: Option<i16>,
    pub manager_interaction: Option<i16>,
    pub feedback: Option<i16>,
    pub learning: Option<i16>,
    pub contribution: Option<i16>,
    pub enps: Option<i16>,
    /// Mean comment sentiment, `None` without comments.
    pub sentiment: Option<f64>,
}

impl RiskInputs {
    pub fn from_response(response: &SurveyResponse, analyzer: &SentimentAnalyzer) -> Self {
        Self {
            permanence_expectation: response.competency(CompetencyField::PermanenceExpectation),
            career_clarity: response.competency(CompetencyField::CareerClarity),
            manager_interaction: response.competency(CompetencyField::ManagerInteraction),
            feedback: response.competency(CompetencyField::Feedback),
            learning: response.competency(CompetencyField::Learning),
            contribution: response.competency(CompetencyField::Contribution),
            enps: response.enps_score(),
            sentiment: response_sentiment(analyzer, response),
        }
    }

    fn likert(&self, kind: RiskFactorKind) -> Option<i16> {
        match kind {
            RiskFactorKind::PermanenceExpectation => self.permanence_expectation,
            RiskFactorKind::CareerClarity => self.career_clarity,
            RiskFactorKind::ManagerInteraction => self.manager_interaction,
            RiskFactorKind::Feedback => self.feedback,
            RiskFactorKind::LearningOpportunities => self.learning,
            RiskFactorKind::Contribution => self.contribution,
            RiskFactorKind::EnpsScore | RiskFactorKind::SentimentScore => None,
        }
    }
}

pub fn likert_risk(value: Option<i16>) -> f64 {
    value.map_or(NEUTRAL_RISK, |v| (6.0 - f64::from(v)) / 5.0)
}

pub fn enps_risk(value: Option<i16>) -> f64 {
    value.map_or(NEUTRAL_RISK, |v| (10.0 - f64::from(v)) / 10.0)
}

pub fn sentiment_risk(score: Option<f64>) -> f64 {
    score.map_or(NEUTRAL_RISK, |s| (1.0 - s.clamp(-1.0, 1.0)) / 2.0)
}

fn describe_likert(kind: RiskFactorKind, value: Option<i16>) -> String {
    let label = kind.label();
    match value {
        None => format!("{}: sem resposta", label),
        Some(v) if v >= 4 => format!("{}: avaliação positiva ({}/5)", label, v),
        Some(v) if v >= 3 => format!("{}: avaliação moderada ({}/5)", label, v),
        Some(v) => format!("{}: requer atenção ({}/5)", label, v),
    }
}

fn describe_enps(value: Option<i16>) -> String {
    match value {
        None => "eNPS não respondido".to_string(),
        Some(v) if v >= 9 => format!("Promotor da empresa (eNPS {})", v),
        Some(v) if v >= 7 => format!("Neutro em relação à empresa (eNPS {})", v),
        Some(v) => format!("Detrator da empresa (eNPS {}), requer atenção", v),
    }
}

fn describe_sentiment(score: Option<f64>) -> String {
    match score {
        None => "Sem comentários abertos".to_string(),
        Some(s) if s > 0.1 => format!("Comentários positivos (sentimento {:.2})", s),
        Some(s) if s < -0.1 => format!("Comentários negativos (sentimento {:.2}), requer atenção", s),
        Some(s) => format!("Comentários neutros (sentimento {:.2})", s),
    }
}

fn factor(kind: RiskFactorKind, inputs: &RiskInputs) -> (RiskFactor, f64) {
    let (raw_value, value, description) = match kind {
        RiskFactorKind::EnpsScore => (
            inputs.enps.map(f64::from),
            enps_risk(inputs.enps),
            describe_enps(inputs.enps),
        ),
        RiskFactorKind::SentimentScore => (
            inputs.sentiment,
            sentiment_risk(inputs.sentiment),
            describe_sentiment(inputs.sentiment),
        ),
        _ => {
            let answer = inputs.likert(kind);
            (answer.map(f64::from), likert_risk(answer), describe_likert(kind, answer))
        }
    };
    let contribution = value * kind.weight();
    let factor = RiskFactor {
        factor: kind,
        name: kind.label().to_string(),
        raw_value,
        value: round_to(value, 4),
        weight: kind.weight(),
        contribution: round_to(contribution, 4),
        description,
    };
    (factor, contribution)
}

/// Score, level, ranked factors and recommendations for one set of answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
}

pub fn assess(inputs: &RiskInputs) -> RiskScore {
    let mut total = 0.0;
    let mut factors = Vec::with_capacity(RiskFactorKind::ALL.len());
    for kind in RiskFactorKind::ALL {
        let (factor, contribution) = factor(kind, inputs);
        total += contribution;
        factors.push(factor);
    }
    // stable: equal contributions keep weight-table order
    factors.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

    let risk_score = round_to(total * 100.0, 1).clamp(0.0, 100.0);
    let risk_level = RiskLevel::from_score(risk_score);
    let recommendations = recommendations(risk_level, &factors);

    RiskScore {
        risk_score,
        risk_level,
        factors,
        recommendations,
    }
}

/// Expects `factors` sorted by contribution, largest first.
pub fn recommendations(level: RiskLevel, factors: &[RiskFactor]) -> Vec<String> {
    let mut out = Vec::new();
    match level {
        RiskLevel::Critical => out.push(
            "URGENTE: agendar conversa individual de retenção com o colaborador imediatamente"
                .to_string(),
        ),
        RiskLevel::High => {
            out.push("Priorizar acompanhamento próximo com o gestor nas próximas semanas".to_string())
        }
        RiskLevel::Moderate | RiskLevel::Low => {}
    }
    out.extend(
        factors
            .iter()
            .filter(|f| f.contribution > SIGNIFICANT_CONTRIBUTION)
            .take(MAX_RECOMMENDED_FACTORS)
            .map(|f| f.factor.recommendation().to_string()),
    );
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRiskAssessment {
    pub employee_id: Uuid,
    pub name: String,
    pub generation: Option<String>,
    pub tenure: Option<String>,
    pub area: Option<String>,
    pub survey_id: Uuid,
    pub response_date: NaiveDate,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
}

impl EmployeeRiskAssessment {
    pub fn factor(&self, kind: RiskFactorKind) -> Option<&RiskFactor> {
        self.factors.iter().find(|f| f.factor == kind)
    }
}

pub fn assess_employee(
    employee: &Employee,
    response: &SurveyResponse,
    analyzer: &SentimentAnalyzer,
) -> EmployeeRiskAssessment {
    let score = assess(&RiskInputs::from_response(response, analyzer));
    EmployeeRiskAssessment {
        employee_id: employee.id,
        name: employee.name.clone(),
        generation: employee.generation.clone(),
        tenure: employee.tenure.clone(),
        area: employee.area_name().map(String::from),
        survey_id: response.id,
        response_date: response.response_date,
        risk_score: score.risk_score,
        risk_level: score.risk_level,
        factors: score.factors,
        recommendations: score.recommendations,
    }
}

/// `Ok(None)` when the employee is unknown or never answered the survey.
pub async fn calculate_employee_risk(
    state: &SharedState,
    employee_id: Uuid,
) -> Result<Option<EmployeeRiskAssessment>, InsightsError> {
    let filter = SurveyFilter::Employee(employee_id);
    let (employee, responses) = futures::try_join!(
        state.store.fetch_employee(employee_id),
        state.store.fetch_surveys(&filter),
    )?;

    let Some(employee) = employee else {
        tracing::debug!("Employee {} not found", employee_id);
        return Ok(None);
    };
    let Some(response) = state.selection.pick(&responses) else {
        tracing::debug!("Employee {} has no survey responses", employee_id);
        return Ok(None);
    };

    let assessment = assess_employee(&employee, response, &state.analyzer());
    tracing::info!(
        "Risk for {}: {} ({})",
        employee_id,
        assessment.risk_score,
        assessment.risk_level.as_str()
    );
    Ok(Some(assessment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::InMemoryStore;
    use crate::domain::models::SurveySelection;
    use crate::services::lexicon::Lexicon;
    use crate::state::AppState;
    use std::sync::Arc;

    fn uniform(likert: i16, enps: i16, sentiment: f64) -> RiskInputs {
        RiskInputs {
            permanence_expectation: Some(likert),
            career_clarity: Some(likert),
            manager_interaction: Some(likert),
            feedback: Some(likert),
            learning: Some(likert),
            contribution: Some(likert),
            enps: Some(enps),
            sentiment: Some(sentiment),
        }
    }

    fn person(name: &str) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            gender: None,
            generation: Some("Millennials".into()),
            tenure: Some("1 a 2 anos".into()),
            role: None,
            area_id: Some(3),
            area: None,
        }
    }

    fn state(store: InMemoryStore, selection: SurveySelection) -> SharedState {
        Arc::new(AppState::new(
            Arc::new(store),
            Arc::new(Lexicon::portuguese()),
            selection,
        ))
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum: f64 = RiskFactorKind::ALL.iter().map(|k| k.weight()).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_best_answers_are_low_risk() {
        let score = assess(&uniform(5, 10, 1.0));
        // only the Likert floor of 0.2 remains, on 0.70 of the weight
        assert_eq!(score.risk_score, 14.0);
        assert_eq!(score.risk_level, RiskLevel::Low);
        assert!(score.recommendations.is_empty());
        for f in &score.factors {
            assert!(f.contribution <= 0.05 + 1e-9, "{:?}", f.factor);
        }
    }

    #[test]
    fn test_worst_answers_are_critical() {
        let score = assess(&uniform(1, 0, -1.0));
        assert_eq!(score.risk_score, 100.0);
        assert_eq!(score.risk_level, RiskLevel::Critical);
        assert!(score.recommendations[0].starts_with("URGENTE"));
        assert_eq!(score.recommendations.len(), 4);
        assert_eq!(
            score.recommendations[1],
            RiskFactorKind::PermanenceExpectation.recommendation()
        );
        assert_eq!(score.recommendations[2], RiskFactorKind::EnpsScore.recommendation());
        assert_eq!(score.recommendations[3], RiskFactorKind::CareerClarity.recommendation());
    }

    #[test]
    fn test_factors_sorted_by_contribution() {
        let mut inputs = uniform(5, 10, 1.0);
        inputs.feedback = Some(1);
        let score = assess(&inputs);
        assert_eq!(score.factors.len(), 8);
        assert_eq!(score.factors[0].factor, RiskFactorKind::Feedback);
        assert_eq!(score.factors[0].contribution, 0.08);
        for pair in score.factors.windows(2) {
            assert!(pair[0].contribution >= pair[1].contribution);
        }
    }

    #[test]
    fn test_missing_answers_are_neutral() {
        let score = assess(&RiskInputs::default());
        assert!(score.factors.iter().all(|f| f.value == NEUTRAL_RISK));
        assert!(score.factors.iter().all(|f| f.raw_value.is_none()));
        assert_eq!(score.risk_score, 50.0);
        assert_eq!(score.risk_level, RiskLevel::High);
        assert!(score.recommendations[0].starts_with("Priorizar"));
        // only permanence (0.125) clears the threshold; eNPS sits exactly on it
        assert_eq!(score.recommendations.len(), 2);
    }

    #[test]
    fn test_value_mappings() {
        assert_eq!(likert_risk(Some(1)), 1.0);
        assert_eq!(likert_risk(Some(5)), 0.2);
        assert_eq!(enps_risk(Some(0)), 1.0);
        assert_eq!(enps_risk(Some(10)), 0.0);
        assert_eq!(sentiment_risk(Some(-1.0)), 1.0);
        assert_eq!(sentiment_risk(Some(0.0)), NEUTRAL_RISK);
        assert_eq!(sentiment_risk(None), NEUTRAL_RISK);
    }

    #[test]
    fn test_descriptions_follow_value_bands() {
        assert!(describe_likert(RiskFactorKind::Feedback, Some(4)).contains("positiva"));
        assert!(describe_likert(RiskFactorKind::Feedback, Some(3)).contains("moderada"));
        assert!(describe_likert(RiskFactorKind::Feedback, Some(2)).contains("atenção"));
        assert!(describe_enps(Some(9)).starts_with("Promotor"));
        assert!(describe_enps(Some(7)).starts_with("Neutro"));
        assert!(describe_enps(Some(6)).starts_with("Detrator"));
        assert!(describe_sentiment(Some(0.5)).starts_with("Comentários positivos"));
        assert!(describe_sentiment(Some(-0.5)).starts_with("Comentários negativos"));
    }

    #[test]
    fn test_score_stays_in_range() {
        for likert in 1..=5 {
            for enps in 0..=10 {
                for sentiment in [-1.0, 0.0, 1.0] {
                    let score = assess(&uniform(likert, enps, sentiment)).risk_score;
                    assert!((0.0..=100.0).contains(&score));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_calculate_employee_risk_uses_selection_policy() {
        let ana = person("Ana");
        let mut old = SurveyResponse::blank(ana.id, NaiveDate::from_ymd_opt(2023, 1, 10).unwrap());
        old.permanence_expectation = Some(1);
        let mut recent = SurveyResponse::blank(ana.id, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        recent.permanence_expectation = Some(5);
        recent.permanence_expectation_comment = Some("Pretendo ficar, estou muito feliz".into());
        let store = InMemoryStore::new(vec![ana.clone()], vec![old.clone(), recent.clone()]);

        let latest = calculate_employee_risk(&state(store.clone(), SurveySelection::MostRecent), ana.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.survey_id, recent.id);
        assert_eq!(latest.generation.as_deref(), Some("Millennials"));
        let sentiment = latest.factor(RiskFactorKind::SentimentScore).unwrap();
        assert!(sentiment.raw_value.unwrap() > 0.0);

        let first = calculate_employee_risk(&state(store, SurveySelection::FirstReturned), ana.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.survey_id, old.id);
        assert!(first.risk_score > latest.risk_score);
    }

    #[tokio::test]
    async fn test_calculate_employee_risk_none_cases() {
        let ana = person("Ana");
        let state = state(InMemoryStore::new(vec![ana.clone()], Vec::new()), SurveySelection::MostRecent);
        assert!(calculate_employee_risk(&state, ana.id).await.unwrap().is_none());
        assert!(calculate_employee_risk(&state, Uuid::new_v4()).await.unwrap().is_none());
    }
}
