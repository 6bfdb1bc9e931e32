use crate::domain::models::SurveySelection;
use crate::error::InsightsError;
use std::path::PathBuf;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Postgres { url: String, max_connections: u32 },
    Snapshot(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: DataSource,
    pub lexicon_path: Option<PathBuf>,
    pub selection: SurveySelection,
}

impl Settings {
    /// Reads `DATABASE_URL` / `SURVEY_SNAPSHOT`, `DB_MAX_CONNECTIONS`,
    /// `LEXICON_PATH` and `SURVEY_SELECTION` from the process environment.
    pub fn from_env() -> Result<Self, InsightsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, InsightsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let source = match (var("DATABASE_URL"), var("SURVEY_SNAPSHOT")) {
            (Some(_), Some(_)) => {
                return Err(InsightsError::Config(
                    "set either DATABASE_URL or SURVEY_SNAPSHOT, not both".to_string(),
                ))
            }
            (Some(url), None) => {
                let max_connections = match var("DB_MAX_CONNECTIONS") {
                    Some(raw) => raw.parse().map_err(|_| {
                        InsightsError::Config(format!("DB_MAX_CONNECTIONS must be a number, got '{}'", raw))
                    })?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                DataSource::Postgres { url, max_connections }
            }
            (None, Some(path)) => DataSource::Snapshot(PathBuf::from(path)),
            (None, None) => {
                return Err(InsightsError::Config(
                    "DATABASE_URL or SURVEY_SNAPSHOT missing".to_string(),
                ))
            }
        };

        let selection = match var("SURVEY_SELECTION") {
            Some(raw) => SurveySelection::try_from(raw.as_str()).map_err(|_| {
                InsightsError::Config(format!(
                    "SURVEY_SELECTION must be most_recent, earliest or first_returned, got '{}'",
                    raw
                ))
            })?,
            None => SurveySelection::default(),
        };

        Ok(Self {
            source,
            lexicon_path: var("LEXICON_PATH").map(PathBuf::from),
            selection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, InsightsError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_snapshot_source_with_defaults() {
        let s = settings(&[("SURVEY_SNAPSHOT", "data/survey.json")]).unwrap();
        assert_eq!(s.source, DataSource::Snapshot(PathBuf::from("data/survey.json")));
        assert_eq!(s.selection, SurveySelection::MostRecent);
        assert_eq!(s.lexicon_path, None);
    }

    #[test]
    fn test_postgres_source() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://localhost/pulse"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("SURVEY_SELECTION", "first_returned"),
            ("LEXICON_PATH", "lexicon.json"),
        ])
        .unwrap();
        assert_eq!(
            s.source,
            DataSource::Postgres {
                url: "postgres://localhost/pulse".into(),
                max_connections: 12
            }
        );
        assert_eq!(s.selection, SurveySelection::FirstReturned);
        assert_eq!(s.lexicon_path, Some(PathBuf::from("lexicon.json")));
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(settings(&[]), Err(InsightsError::Config(_))));
        assert!(settings(&[("DATABASE_URL", "x"), ("SURVEY_SNAPSHOT", "y")]).is_err());
        assert!(settings(&[("SURVEY_SNAPSHOT", "y"), ("SURVEY_SELECTION", "random")]).is_err());
        assert!(settings(&[("DATABASE_URL", "x"), ("DB_MAX_CONNECTIONS", "many")]).is_err());
        // blank values count as unset
        assert!(settings(&[("DATABASE_URL", "  ")]).is_err());
    }
}
