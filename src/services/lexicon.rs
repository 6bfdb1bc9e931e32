//! Word tables for rule-based sentiment scoring.
//!
//! A `Lexicon` is built once at startup and shared read-only (`Arc<Lexicon>`)
//! by every analyzer. Word weights are integer magnitudes 1..=3; negative words
//! are stored as positive magnitudes and negated on lookup.

use crate::error::InsightsError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const MAX_WORD_WEIGHT: u8 = 3;

/// Decompose, strip diacritic marks and lowercase: "Não" -> "nao".
pub fn fold(word: &str) -> String {
    word.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Serialized form of a lexicon, as read from `LEXICON_PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LexiconTables {
    #[serde(default)]
    pub positive: HashMap<String, u8>,
    #[serde(default)]
    pub negative: HashMap<String, u8>,
    #[serde(default)]
    pub negations: Vec<String>,
    #[serde(default)]
    pub intensifiers: HashMap<String, f64>,
    #[serde(default)]
    pub diminishers: HashMap<String, f64>,
    #[serde(default)]
    pub stop_words: Vec<String>,
}

impl LexiconTables {
    /// Returns every problem at once, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (table, entries) in [("positive", &self.positive), ("negative", &self.negative)] {
            let mut sorted: Vec<_> = entries.iter().collect();
            sorted.sort();
            for (word, weight) in sorted {
                if *weight == 0 || *weight > MAX_WORD_WEIGHT {
                    errors.push(format!(
                        "lexicon.{}[{}]: weight {} must be between 1 and {}",
                        table, word, weight, MAX_WORD_WEIGHT
                    ));
                }
            }
        }

        let mut intensifiers: Vec<_> = self.intensifiers.iter().collect();
        intensifiers.sort_by(|a, b| a.0.cmp(b.0));
        for (word, weight) in intensifiers {
            if !weight.is_finite() || *weight <= 1.0 {
                errors.push(format!(
                    "lexicon.intensifiers[{}]: multiplier {} must be greater than 1",
                    word, weight
                ));
            }
        }

        let mut diminishers: Vec<_> = self.diminishers.iter().collect();
        diminishers.sort_by(|a, b| a.0.cmp(b.0));
        for (word, weight) in diminishers {
            if !weight.is_finite() || *weight <= 0.0 || *weight >= 1.0 {
                errors.push(format!(
                    "lexicon.diminishers[{}]: multiplier {} must be between 0 and 1",
                    word, weight
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: HashMap<String, u8>,
    negative: HashMap<String, u8>,
    negations: HashSet<String>,
    intensifiers: HashMap<String, f64>,
    diminishers: HashMap<String, f64>,
    stop_words: HashSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::portuguese()
    }
}

impl Lexicon {
    /// Word tables keep their spelling; modifier and stop-word tables are
    /// folded because they are matched against folded tokens.
    pub fn from_tables(tables: LexiconTables) -> Result<Self, InsightsError> {
        tables.validate().map_err(InsightsError::Lexicon)?;
        Ok(Self::build(tables))
    }

    fn build(tables: LexiconTables) -> Self {
        Self {
            positive: tables.positive,
            negative: tables.negative,
            negations: tables.negations.iter().map(|w| fold(w)).collect(),
            intensifiers: tables
                .intensifiers
                .into_iter()
                .map(|(w, m)| (fold(&w), m))
                .collect(),
            diminishers: tables
                .diminishers
                .into_iter()
                .map(|(w, m)| (fold(&w), m))
                .collect(),
            stop_words: tables.stop_words.iter().map(|w| fold(w)).collect(),
        }
    }

    pub async fn from_json_file(path: &Path) -> Result<Self, InsightsError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let tables: LexiconTables = serde_json::from_str(&raw)?;
        let lexicon = Self::from_tables(tables)?;
        tracing::info!(
            "Loaded lexicon from {}: {} positive, {} negative words",
            path.display(),
            lexicon.positive.len(),
            lexicon.negative.len()
        );
        Ok(lexicon)
    }

    /// Signed score of a word; tries the folded form first, then the original
    /// spelling, positive table before negative.
    pub fn word_score(&self, normalized: &str, original: &str) -> Option<f64> {
        let positive = self
            .positive
            .get(normalized)
            .or_else(|| self.positive.get(original))
            .map(|w| *w as f64);
        let score = positive.or_else(|| {
            self.negative
                .get(normalized)
                .or_else(|| self.negative.get(original))
                .map(|w| -(*w as f64))
        })?;
        (score != 0.0).then_some(score)
    }

    pub fn is_negation(&self, normalized: &str) -> bool {
        self.negations.contains(normalized)
    }

    pub fn intensifier(&self, normalized: &str) -> Option<f64> {
        self.intensifiers.get(normalized).copied()
    }

    pub fn diminisher(&self, normalized: &str) -> Option<f64> {
        self.diminishers.get(normalized).copied()
    }

    pub fn is_stop_word(&self, normalized: &str) -> bool {
        self.stop_words.contains(normalized)
    }

    /// Built-in Brazilian Portuguese lexicon for workplace comments.
    pub fn portuguese() -> Self {
        let positive = weighted(&[
            // 3
            ("excelente", 3),
            ("ótimo", 3),
            ("ótima", 3),
            ("otimo", 3),
            ("maravilhoso", 3),
            ("maravilhosa", 3),
            ("incrível", 3),
            ("fantástico", 3),
            ("fantástica", 3),
            ("perfeito", 3),
            ("perfeita", 3),
            ("sensacional", 3),
            ("excepcional", 3),
            ("extraordinário", 3),
            ("adoro", 3),
            ("amo", 3),
            // 2
            ("bom", 2),
            ("boa", 2),
            ("satisfeito", 2),
            ("satisfeita", 2),
            ("feliz", 2),
            ("motivado", 2),
            ("motivada", 2),
            ("gosto", 2),
            ("agradável", 2),
            ("positivo", 2),
            ("positiva", 2),
            ("reconhecido", 2),
            ("reconhecida", 2),
            ("reconhecimento", 2),
            ("valorizado", 2),
            ("valorizada", 2),
            ("apoio", 2),
            ("crescimento", 2),
            ("aprendizado", 2),
            ("oportunidade", 2),
            ("oportunidades", 2),
            ("engajado", 2),
            ("engajada", 2),
            ("realizado", 2),
            ("realizada", 2),
            ("orgulho", 2),
            ("colaborativo", 2),
            ("colaborativa", 2),
            ("transparente", 2),
            ("transparência", 2),
            ("clareza", 2),
            ("eficiente", 2),
            ("competente", 2),
            ("inspirador", 2),
            ("inspiradora", 2),
            ("respeito", 2),
            ("confiança", 2),
            ("justo", 2),
            ("flexível", 2),
            ("flexibilidade", 2),
            ("equilíbrio", 2),
            ("acolhedor", 2),
            ("acolhedora", 2),
            ("contente", 2),
            // 1
            ("adequado", 1),
            ("adequada", 1),
            ("razoável", 1),
            ("ok", 1),
            ("legal", 1),
            ("tranquilo", 1),
            ("tranquila", 1),
            ("estável", 1),
            ("melhorou", 1),
            ("melhorando", 1),
            ("ajuda", 1),
            ("suporte", 1),
            ("interessante", 1),
            ("útil", 1),
            ("desenvolvimento", 1),
            ("evolução", 1),
            ("aprender", 1),
            ("claro", 1),
            ("clara", 1),
        ]);

        let negative = weighted(&[
            // 3
            ("péssimo", 3),
            ("péssima", 3),
            ("pessimo", 3),
            ("horrível", 3),
            ("terrível", 3),
            ("tóxico", 3),
            ("tóxica", 3),
            ("odeio", 3),
            ("abusivo", 3),
            ("abusiva", 3),
            ("assédio", 3),
            ("humilhante", 3),
            ("insuportável", 3),
            ("desrespeito", 3),
            // 2
            ("ruim", 2),
            ("estressante", 2),
            ("estressado", 2),
            ("estressada", 2),
            ("frustrado", 2),
            ("frustrada", 2),
            ("frustrante", 2),
            ("insatisfeito", 2),
            ("insatisfeita", 2),
            ("desmotivado", 2),
            ("desmotivada", 2),
            ("cansado", 2),
            ("cansada", 2),
            ("esgotado", 2),
            ("esgotada", 2),
            ("sobrecarregado", 2),
            ("sobrecarregada", 2),
            ("sobrecarga", 2),
            ("injusto", 2),
            ("injusta", 2),
            ("desvalorizado", 2),
            ("desvalorizada", 2),
            ("triste", 2),
            ("difícil", 2),
            ("confuso", 2),
            ("confusa", 2),
            ("desorganizado", 2),
            ("desorganizada", 2),
            ("falta", 2),
            ("ausente", 2),
            ("ausência", 2),
            ("problema", 2),
            ("problemas", 2),
            ("conflito", 2),
            ("conflitos", 2),
            ("pressão", 2),
            ("burnout", 2),
            ("ansioso", 2),
            ("ansiosa", 2),
            ("medo", 2),
            ("decepcionado", 2),
            ("decepcionada", 2),
            ("decepcionante", 2),
            ("negativo", 2),
            ("negativa", 2),
            ("estagnado", 2),
            ("estagnada", 2),
            ("precário", 2),
            // 1
            ("lento", 1),
            ("demorado", 1),
            ("regular", 1),
            ("mediano", 1),
            ("limitado", 1),
            ("limitada", 1),
            ("dúvida", 1),
            ("dúvidas", 1),
            ("incerto", 1),
            ("incerteza", 1),
            ("chato", 1),
            ("complicado", 1),
            ("burocrático", 1),
            ("burocracia", 1),
            ("raramente", 1),
        ]);

        let negations = words(&[
            "não", "nunca", "jamais", "nem", "nenhum", "nenhuma", "ninguém", "nada", "sem",
            "tampouco",
        ]);

        let intensifiers = multipliers(&[
            ("muito", 1.5),
            ("muita", 1.5),
            ("muitos", 1.5),
            ("muitas", 1.5),
            ("extremamente", 2.0),
            ("super", 1.5),
            ("bastante", 1.3),
            ("demais", 1.5),
            ("totalmente", 1.5),
            ("completamente", 1.5),
            ("absolutamente", 1.8),
            ("altamente", 1.5),
            ("realmente", 1.3),
            ("tão", 1.3),
        ]);

        let diminishers = multipliers(&[
            ("pouco", 0.5),
            ("pouca", 0.5),
            ("meio", 0.6),
            ("levemente", 0.5),
            ("ligeiramente", 0.5),
            ("razoavelmente", 0.7),
            ("quase", 0.7),
            ("relativamente", 0.8),
            ("parcialmente", 0.6),
        ]);

        let stop_words = words(&[
            "a", "o", "e", "é", "de", "da", "do", "das", "dos", "em", "no", "na", "nos", "nas",
            "um", "uma", "uns", "umas", "para", "pra", "com", "por", "que", "os", "as", "se",
            "mais", "mas", "como", "ao", "aos", "ou", "eu", "ele", "ela", "eles", "elas", "me",
            "meu", "minha", "meus", "minhas", "isso", "isto", "este", "esta", "esse", "essa",
            "há", "ser", "foi", "tem", "ter", "tenho", "está", "estou", "são", "já", "também",
            "quando", "onde", "sobre", "entre", "até", "pelo", "pela", "seu", "sua", "lhe",
            "nosso", "nossa", "muito", "bem", "todo", "toda", "todos", "todas", "ainda",
        ]);

        Self::build(LexiconTables {
            positive,
            negative,
            negations,
            intensifiers,
            diminishers,
            stop_words,
        })
    }
}

fn weighted(entries: &[(&str, u8)]) -> HashMap<String, u8> {
    entries.iter().map(|(w, s)| (w.to_string(), *s)).collect()
}

fn multipliers(entries: &[(&str, f64)]) -> HashMap<String, f64> {
    entries.iter().map(|(w, m)| (w.to_string(), *m)).collect()
}

fn words(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|w| w.to_string()).collect()
}
