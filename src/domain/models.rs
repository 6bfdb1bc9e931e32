use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NOT_INFORMED: &str = "Não informado";

/// Likert competency questions, 1 (worst) to 5 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetencyField {
    JobInterest,
    Contribution,
    Learning,
    Feedback,
    ManagerInteraction,
    CareerClarity,
    PermanenceExpectation,
}

impl CompetencyField {
    pub const ALL: [CompetencyField; 7] = [
        CompetencyField::JobInterest,
        CompetencyField::Contribution,
        CompetencyField::Learning,
        CompetencyField::Feedback,
        CompetencyField::ManagerInteraction,
        CompetencyField::CareerClarity,
        CompetencyField::PermanenceExpectation,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::JobInterest => "job_interest",
            Self::Contribution => "contribution",
            Self::Learning => "learning",
            Self::Feedback => "feedback",
            Self::ManagerInteraction => "manager_interaction",
            Self::CareerClarity => "career_clarity",
            Self::PermanenceExpectation => "permanence_expectation",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::JobInterest => "Interesse no Cargo",
            Self::Contribution => "Contribuição",
            Self::Learning => "Aprendizado e Desenvolvimento",
            Self::Feedback => "Feedback",
            Self::ManagerInteraction => "Interação com Gestor",
            Self::CareerClarity => "Clareza sobre Possibilidades de Carreira",
            Self::PermanenceExpectation => "Expectativa de Permanência",
        }
    }
}

/// Numeric answer a comment is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "field")]
pub enum ScoreSource {
    Competency(CompetencyField),
    Enps,
}

impl ScoreSource {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Competency(field) => field.key(),
            Self::Enps => "enps",
        }
    }
}

/// Free-text questions; each one comments on a specific numeric answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentField {
    JobInterest,
    Contribution,
    Learning,
    Feedback,
    ManagerInteraction,
    CareerClarity,
    PermanenceExpectation,
    Enps,
}

impl CommentField {
    pub const ALL: [CommentField; 8] = [
        CommentField::JobInterest,
        CommentField::Contribution,
        CommentField::Learning,
        CommentField::Feedback,
        CommentField::ManagerInteraction,
        CommentField::CareerClarity,
        CommentField::PermanenceExpectation,
        CommentField::Enps,
    ];

    pub fn related(&self) -> ScoreSource {
        match self {
            Self::JobInterest => ScoreSource::Competency(CompetencyField::JobInterest),
            Self::Contribution => ScoreSource::Competency(CompetencyField::Contribution),
            Self::Learning => ScoreSource::Competency(CompetencyField::Learning),
            Self::Feedback => ScoreSource::Competency(CompetencyField::Feedback),
            Self::ManagerInteraction => ScoreSource::Competency(CompetencyField::ManagerInteraction),
            Self::CareerClarity => ScoreSource::Competency(CompetencyField::CareerClarity),
            Self::PermanenceExpectation => {
                ScoreSource::Competency(CompetencyField::PermanenceExpectation)
            }
            Self::Enps => ScoreSource::Enps,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::JobInterest => "job_interest_comment",
            Self::Contribution => "contribution_comment",
            Self::Learning => "learning_comment",
            Self::Feedback => "feedback_comment",
            Self::ManagerInteraction => "manager_interaction_comment",
            Self::CareerClarity => "career_clarity_comment",
            Self::PermanenceExpectation => "permanence_expectation_comment",
            Self::Enps => "enps_comment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self.related() {
            ScoreSource::Competency(field) => field.label(),
            ScoreSource::Enps => "eNPS",
        }
    }
}

/// Five-level organisational path, company first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaPath {
    pub company: Option<String>,
    pub directorate: Option<String>,
    pub management: Option<String>,
    pub coordination: Option<String>,
    pub area: Option<String>,
}

impl AreaPath {
    /// Most specific non-empty level.
    pub fn display(&self) -> Option<&str> {
        [
            &self.area,
            &self.coordination,
            &self.management,
            &self.directorate,
            &self.company,
        ]
        .into_iter()
        .filter_map(|level| level.as_deref())
        .map(str::trim)
        .find(|level| !level.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub generation: Option<String>,
    #[serde(default)]
    pub tenure: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub area_id: Option<i64>,
    #[serde(default)]
    pub area: Option<AreaPath>,
}

impl Employee {
    pub fn area_name(&self) -> Option<&str> {
        self.area.as_ref().and_then(AreaPath::display)
    }

    pub fn attribute(&self, dimension: Demographic) -> Option<&str> {
        let value = match dimension {
            Demographic::Gender => self.gender.as_deref(),
            Demographic::Generation => self.generation.as_deref(),
            Demographic::Tenure => self.tenure.as_deref(),
            Demographic::Role => self.role.as_deref(),
            Demographic::Area => self.area_name(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Bucket name used when grouping; blanks collapse into "Não informado".
    pub fn bucket(&self, dimension: Demographic) -> String {
        self.attribute(dimension).unwrap_or(NOT_INFORMED).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demographic {
    Gender,
    Generation,
    Tenure,
    Role,
    Area,
}

impl Demographic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Generation => "generation",
            Self::Tenure => "tenure",
            Self::Role => "role",
            Self::Area => "area",
        }
    }
}

impl TryFrom<&str> for Demographic {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "gender" | "genero" => Ok(Self::Gender),
            "generation" | "geracao" => Ok(Self::Generation),
            "tenure" | "tempo_de_empresa" => Ok(Self::Tenure),
            "role" | "cargo" => Ok(Self::Role),
            "area" => Ok(Self::Area),
            _ => Err(()),
        }
    }
}

/// One employee's answers to a survey round. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub response_date: NaiveDate,
    #[serde(default)]
    pub job_interest: Option<i16>,
    #[serde(default)]
    pub contribution: Option<i16>,
    #[serde(default)]
    pub learning: Option<i16>,
    #[serde(default)]
    pub feedback: Option<i16>,
    #[serde(default)]
    pub manager_interaction: Option<i16>,
    #[serde(default)]
    pub career_clarity: Option<i16>,
    #[serde(default)]
    pub permanence_expectation: Option<i16>,
    #[serde(default)]
    pub enps: Option<i16>,
    #[serde(default)]
    pub job_interest_comment: Option<String>,
    #[serde(default)]
    pub contribution_comment: Option<String>,
    #[serde(default)]
    pub learning_comment: Option<String>,
    #[serde(default)]
    pub feedback_comment: Option<String>,
    #[serde(default)]
    pub manager_interaction_comment: Option<String>,
    #[serde(default)]
    pub career_clarity_comment: Option<String>,
    #[serde(default)]
    pub permanence_expectation_comment: Option<String>,
    #[serde(default)]
    pub enps_comment: Option<String>,
}

impl SurveyResponse {
    /// An empty response for `employee_id`; handy as a builder base.
    pub fn blank(employee_id: Uuid, response_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            response_date,
            job_interest: None,
            contribution: None,
            learning: None,
            feedback: None,
            manager_interaction: None,
            career_clarity: None,
            permanence_expectation: None,
            enps: None,
            job_interest_comment: None,
            contribution_comment: None,
            learning_comment: None,
            feedback_comment: None,
            manager_interaction_comment: None,
            career_clarity_comment: None,
            permanence_expectation_comment: None,
            enps_comment: None,
        }
    }

    fn raw_competency(&self, field: CompetencyField) -> Option<i16> {
        match field {
            CompetencyField::JobInterest => self.job_interest,
            CompetencyField::Contribution => self.contribution,
            CompetencyField::Learning => self.learning,
            CompetencyField::Feedback => self.feedback,
            CompetencyField::ManagerInteraction => self.manager_interaction,
            CompetencyField::CareerClarity => self.career_clarity,
            CompetencyField::PermanenceExpectation => self.permanence_expectation,
        }
    }

    /// Likert answer, `None` when missing or outside 1..=5.
    pub fn competency(&self, field: CompetencyField) -> Option<i16> {
        self.raw_competency(field).filter(|v| (1..=5).contains(v))
    }

    /// eNPS answer, `None` when missing or outside 0..=10.
    pub fn enps_score(&self) -> Option<i16> {
        self.enps.filter(|v| (0..=10).contains(v))
    }

    /// Answers present but outside their scale, as `(field key, value)`.
    pub fn out_of_range_answers(&self) -> Vec<(&'static str, i16)> {
        let mut invalid: Vec<(&'static str, i16)> = CompetencyField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = self.raw_competency(field)?;
                (self.competency(field).is_none()).then_some((field.key(), value))
            })
            .collect();
        if let Some(value) = self.enps.filter(|_| self.enps_score().is_none()) {
            invalid.push(("enps", value));
        }
        invalid
    }

    pub fn score(&self, source: ScoreSource) -> Option<i16> {
        match source {
            ScoreSource::Competency(field) => self.competency(field),
            ScoreSource::Enps => self.enps_score(),
        }
    }

    /// Comment text, `None` when missing or blank.
    pub fn comment(&self, field: CommentField) -> Option<&str> {
        let text = match field {
            CommentField::JobInterest => self.job_interest_comment.as_deref(),
            CommentField::Contribution => self.contribution_comment.as_deref(),
            CommentField::Learning => self.learning_comment.as_deref(),
            CommentField::Feedback => self.feedback_comment.as_deref(),
            CommentField::ManagerInteraction => self.manager_interaction_comment.as_deref(),
            CommentField::CareerClarity => self.career_clarity_comment.as_deref(),
            CommentField::PermanenceExpectation => self.permanence_expectation_comment.as_deref(),
            CommentField::Enps => self.enps_comment.as_deref(),
        };
        text.filter(|t| !t.trim().is_empty())
    }

    pub fn comments(&self) -> impl Iterator<Item = (CommentField, &str)> + '_ {
        CommentField::ALL
            .into_iter()
            .filter_map(move |field| self.comment(field).map(|text| (field, text)))
    }
}

/// Which response feeds the risk scorer when an employee answered more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveySelection {
    #[default]
    MostRecent,
    Earliest,
    FirstReturned,
}

impl SurveySelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MostRecent => "most_recent",
            Self::Earliest => "earliest",
            Self::FirstReturned => "first_returned",
        }
    }

    /// Picks one response; ties on date keep the order the store returned.
    pub fn pick<'a>(&self, responses: &'a [SurveyResponse]) -> Option<&'a SurveyResponse> {
        match self {
            Self::FirstReturned => responses.first(),
            Self::MostRecent => responses.iter().reduce(|best, candidate| {
                if candidate.response_date > best.response_date {
                    candidate
                } else {
                    best
                }
            }),
            Self::Earliest => responses.iter().reduce(|best, candidate| {
                if candidate.response_date < best.response_date {
                    candidate
                } else {
                    best
                }
            }),
        }
    }
}

impl TryFrom<&str> for SurveySelection {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "most_recent" | "latest" => Ok(Self::MostRecent),
            "earliest" | "oldest" => Ok(Self::Earliest),
            "first_returned" | "first" => Ok(Self::FirstReturned),
            _ => Err(()),
        }
    }
}

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::Critical
        } else if score >= 50.0 {
            Self::High
        } else if score >= 30.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn label_pt(&self) -> &'static str {
        match self {
            Self::Low => "Baixo",
            Self::Moderate => "Moderado",
            Self::High => "Alto",
            Self::Critical => "Crítico",
        }
    }
}

impl TryFrom<&str> for RiskLevel {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "low" | "baixo" => Ok(Self::Low),
            "moderate" | "moderado" => Ok(Self::Moderate),
            "high" | "alto" => Ok(Self::High),
            "critical" | "critico" | "crítico" => Ok(Self::Critical),
            _ => Err(()),
        }
    }
}
