pub mod memory;

use crate::domain::models::{AreaPath, Employee, SurveyResponse};
use crate::error::InsightsError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub area_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SurveyFilter {
    #[default]
    All,
    Employee(Uuid),
    Area(i64),
}

/// Logs each response carrying answers outside their scale, once per load.
/// Scoring treats those answers as missing.
pub fn warn_out_of_range(responses: &[SurveyResponse]) -> usize {
    let mut flagged = 0;
    for response in responses {
        let invalid = response.out_of_range_answers();
        if invalid.is_empty() {
            continue;
        }
        flagged += 1;
        tracing::warn!(
            "Ignoring out-of-range answers {:?} in response {}",
            invalid,
            response.id
        );
    }
    flagged
}

/// Read-only source of employees and survey responses.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn fetch_employee(&self, id: Uuid) -> Result<Option<Employee>, InsightsError>;

    async fn fetch_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, InsightsError>;

    async fn fetch_surveys(&self, filter: &SurveyFilter) -> Result<Vec<SurveyResponse>, InsightsError>;
}

/// Postgres-backed store. Expects `employees`, `areas` and `survey_responses`
/// tables whose columns mirror the domain structs.
#[derive(Clone)]
pub struct PgSurveyStore {
    pool: PgPool,
}

impl PgSurveyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    gender: Option<String>,
    generation: Option<String>,
    tenure: Option<String>,
    role: Option<String>,
    area_id: Option<i64>,
    company: Option<String>,
    directorate: Option<String>,
    management: Option<String>,
    coordination: Option<String>,
    area: Option<String>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        let area = row.area_id.map(|_| AreaPath {
            company: row.company,
            directorate: row.directorate,
            management: row.management,
            coordination: row.coordination,
            area: row.area,
        });
        Employee {
            id: row.id,
            name: row.name,
            email: row.email,
            gender: row.gender,
            generation: row.generation,
            tenure: row.tenure,
            role: row.role,
            area_id: row.area_id,
            area,
        }
    }
}

#[derive(Debug, FromRow)]
struct SurveyRow {
    id: Uuid,
    employee_id: Uuid,
    response_date: NaiveDate,
    job_interest: Option<i16>,
    contribution: Option<i16>,
    learning: Option<i16>,
    feedback: Option<i16>,
    manager_interaction: Option<i16>,
    career_clarity: Option<i16>,
    permanence_expectation: Option<i16>,
    enps: Option<i16>,
    job_interest_comment: Option<String>,
    contribution_comment: Option<String>,
    learning_comment: Option<String>,
    feedback_comment: Option<String>,
    manager_interaction_comment: Option<String>,
    career_clarity_comment: Option<String>,
    permanence_expectation_comment: Option<String>,
    enps_comment: Option<String>,
}

impl From<SurveyRow> for SurveyResponse {
    fn from(row: SurveyRow) -> Self {
        SurveyResponse {
            id: row.id,
            employee_id: row.employee_id,
            response_date: row.response_date,
            job_interest: row.job_interest,
            contribution: row.contribution,
            learning: row.learning,
            feedback: row.feedback,
            manager_interaction: row.manager_interaction,
            career_clarity: row.career_clarity,
            permanence_expectation: row.permanence_expectation,
            enps: row.enps,
            job_interest_comment: row.job_interest_comment,
            contribution_comment: row.contribution_comment,
            learning_comment: row.learning_comment,
            feedback_comment: row.feedback_comment,
            manager_interaction_comment: row.manager_interaction_comment,
            career_clarity_comment: row.career_clarity_comment,
            permanence_expectation_comment: row.permanence_expectation_comment,
            enps_comment: row.enps_comment,
        }
    }
}

const EMPLOYEE_COLUMNS: &str = r#"
    e.id, e.name, e.email, e.gender, e.generation, e.tenure, e.role, e.area_id,
    a.company, a.directorate, a.management, a.coordination, a.area
"#;

const SURVEY_COLUMNS: &str = r#"
    s.id, s.employee_id, s.response_date,
    s.job_interest, s.contribution, s.learning, s.feedback,
    s.manager_interaction, s.career_clarity, s.permanence_expectation, s.enps,
    s.job_interest_comment, s.contribution_comment, s.learning_comment,
    s.feedback_comment, s.manager_interaction_comment, s.career_clarity_comment,
    s.permanence_expectation_comment, s.enps_comment
"#;

#[async_trait]
impl SurveyStore for PgSurveyStore {
    async fn fetch_employee(&self, id: Uuid) -> Result<Option<Employee>, InsightsError> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees e LEFT JOIN areas a ON a.id = e.area_id WHERE e.id = $1"
        );
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::from))
    }

    async fn fetch_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, InsightsError> {
        let sql = format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}
            FROM employees e
            LEFT JOIN areas a ON a.id = e.area_id
            WHERE ($1::BIGINT IS NULL OR e.area_id = $1)
            ORDER BY e.name
            "#
        );
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(filter.area_id)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!("Fetched {} employees (area {:?})", rows.len(), filter.area_id);
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn fetch_surveys(&self, filter: &SurveyFilter) -> Result<Vec<SurveyResponse>, InsightsError> {
        let sql = match filter {
            SurveyFilter::All => format!("SELECT {SURVEY_COLUMNS} FROM survey_responses s"),
            SurveyFilter::Employee(_) => {
                format!("SELECT {SURVEY_COLUMNS} FROM survey_responses s WHERE s.employee_id = $1")
            }
            SurveyFilter::Area(_) => format!(
                r#"
                SELECT {SURVEY_COLUMNS}
                FROM survey_responses s
                JOIN employees e ON e.id = s.employee_id
                WHERE e.area_id = $1
                "#
            ),
        };

        let query = sqlx::query_as::<_, SurveyRow>(&sql);
        let query = match filter {
            SurveyFilter::All => query,
            SurveyFilter::Employee(employee_id) => query.bind(*employee_id),
            SurveyFilter::Area(area_id) => query.bind(*area_id),
        };
        let rows = query.fetch_all(&self.pool).await?;
        tracing::debug!("Fetched {} survey responses for {:?}", rows.len(), filter);
        let responses: Vec<SurveyResponse> = rows.into_iter().map(SurveyResponse::from).collect();
        warn_out_of_range(&responses);
        Ok(responses)
    }
}
