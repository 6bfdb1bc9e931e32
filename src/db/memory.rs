use super::{warn_out_of_range, EmployeeFilter, SurveyFilter, SurveyStore};
use crate::domain::models::{Employee, SurveyResponse};
use crate::error::InsightsError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// JSON export of employees and their responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub surveys: Vec<SurveyResponse>,
}

/// Store over data already in memory. Surveys come back in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    employees: Vec<Employee>,
    surveys: Vec<SurveyResponse>,
}

impl InMemoryStore {
    pub fn new(employees: Vec<Employee>, surveys: Vec<SurveyResponse>) -> Self {
        warn_out_of_range(&surveys);
        Self { employees, surveys }
    }

    pub async fn from_json_file(path: &Path) -> Result<Self, InsightsError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        tracing::info!(
            "Loaded snapshot {}: {} employees, {} survey responses",
            path.display(),
            snapshot.employees.len(),
            snapshot.surveys.len()
        );
        Ok(Self::from(snapshot))
    }
}

impl From<Snapshot> for InMemoryStore {
    fn from(snapshot: Snapshot) -> Self {
        Self::new(snapshot.employees, snapshot.surveys)
    }
}

#[async_trait]
impl SurveyStore for InMemoryStore {
    async fn fetch_employee(&self, id: Uuid) -> Result<Option<Employee>, InsightsError> {
        Ok(self.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn fetch_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, InsightsError> {
        Ok(self
            .employees
            .iter()
            .filter(|e| filter.area_id.is_none() || e.area_id == filter.area_id)
            .cloned()
            .collect())
    }

    async fn fetch_surveys(&self, filter: &SurveyFilter) -> Result<Vec<SurveyResponse>, InsightsError> {
        let surveys = match filter {
            SurveyFilter::All => self.surveys.clone(),
            SurveyFilter::Employee(employee_id) => self
                .surveys
                .iter()
                .filter(|s| s.employee_id == *employee_id)
                .cloned()
                .collect(),
            SurveyFilter::Area(area_id) => {
                let members: HashSet<Uuid> = self
                    .employees
                    .iter()
                    .filter(|e| e.area_id == Some(*area_id))
                    .map(|e| e.id)
                    .collect();
                self.surveys
                    .iter()
                    .filter(|s| members.contains(&s.employee_id))
                    .cloned()
                    .collect()
            }
        };
        Ok(surveys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn employee(area_id: Option<i64>) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Bruno".into(),
            email: None,
            gender: None,
            generation: None,
            tenure: None,
            role: None,
            area_id,
            area: None,
        }
    }

    #[tokio::test]
    async fn test_filters() {
        let a = employee(Some(1));
        let b = employee(Some(2));
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let store = InMemoryStore::new(
            vec![a.clone(), b.clone()],
            vec![
                SurveyResponse::blank(a.id, day),
                SurveyResponse::blank(b.id, day),
                SurveyResponse::blank(a.id, day),
            ],
        );

        assert_eq!(store.fetch_surveys(&SurveyFilter::All).await.unwrap().len(), 3);
        assert_eq!(store.fetch_surveys(&SurveyFilter::Employee(a.id)).await.unwrap().len(), 2);
        assert_eq!(store.fetch_surveys(&SurveyFilter::Area(2)).await.unwrap().len(), 1);
        assert_eq!(
            store
                .fetch_employees(&EmployeeFilter { area_id: Some(1) })
                .await
                .unwrap(),
            vec![a.clone()]
        );
        assert_eq!(store.fetch_employee(b.id).await.unwrap(), Some(b));
        assert_eq!(store.fetch_employee(Uuid::new_v4()).await.unwrap(), None);
    }

    #[test]
    fn test_out_of_range_responses_are_counted_once() {
        let id = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut bad = SurveyResponse::blank(id, day);
        bad.feedback = Some(7);
        bad.learning = Some(0);
        bad.enps = Some(12);
        let good = SurveyResponse::blank(id, day);
        assert_eq!(warn_out_of_range(&[bad, good]), 1);
    }

    #[test]
    fn test_snapshot_parses_with_missing_fields() {
        let json = r#"{
            "employees": [{"id": "6f1c5c1e-8a7e-4a57-9a59-2f3f1b2f9c11", "name": "Carla"}],
            "surveys": [{
                "id": "0b7f7a56-1f3e-4c1f-8c8a-3d6a4b1e2f10",
                "employee_id": "6f1c5c1e-8a7e-4a57-9a59-2f3f1b2f9c11",
                "response_date": "2024-03-10",
                "enps": 9,
                "feedback_comment": "Bom feedback"
            }]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.employees[0].tenure, None);
        assert_eq!(snapshot.surveys[0].enps, Some(9));
        assert_eq!(snapshot.surveys[0].feedback, None);
    }
}
