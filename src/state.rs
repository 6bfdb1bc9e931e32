use crate::db::SurveyStore;
use crate::domain::models::SurveySelection;
use crate::services::lexicon::Lexicon;
use crate::services::sentiment::SentimentAnalyzer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SurveyStore>,
    pub lexicon: Arc<Lexicon>,
    pub selection: SurveySelection,
}

impl AppState {
    pub fn new(store: Arc<dyn SurveyStore>, lexicon: Arc<Lexicon>, selection: SurveySelection) -> Self {
        Self {
            store,
            lexicon,
            selection,
        }
    }

    pub fn analyzer(&self) -> SentimentAnalyzer {
        SentimentAnalyzer::new(self.lexicon.clone())
    }
}

pub type SharedState = Arc<AppState>;
