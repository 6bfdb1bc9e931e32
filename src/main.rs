use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use survey_insights::analytics::{attrition, comments, fleet, survey};
use survey_insights::config::{DataSource, Settings};
use survey_insights::db::memory::InMemoryStore;
use survey_insights::db::{PgSurveyStore, SurveyFilter, SurveyStore};
use survey_insights::domain::models::{Demographic, RiskLevel};
use survey_insights::services::lexicon::Lexicon;
use survey_insights::state::{AppState, SharedState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "survey_insights")]
#[command(about = "Employee survey analytics and attrition risk reports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// eNPS, favorability and per-field statistics
    Overview(FilterArgs),
    /// Comment sentiment summary
    Sentiment(FilterArgs),
    /// Pearson correlation matrix across fields
    Correlations(FilterArgs),
    /// Results grouped by an employee attribute
    Demographics {
        /// gender, generation, tenure, role or area
        #[arg(long, value_parser = parse_demographic)]
        by: Demographic,
    },
    /// Fleet-level attrition risk summary
    RiskSummary,
    /// Paginated list of employee risk assessments
    RiskList {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = fleet::DEFAULT_PAGE_SIZE)]
        limit: usize,
        /// risk or name
        #[arg(long, default_value = "risk", value_parser = parse_sort)]
        sort: fleet::RiskSort,
        /// low, moderate, high or critical
        #[arg(long, value_parser = parse_level)]
        level: Option<RiskLevel>,
    },
    /// Risk assessment for one employee
    Employee { id: Uuid },
    /// Does low career clarity go with high risk?
    CareerHypothesis,
    /// Average risk by tenure bucket
    TenurePatterns,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Only this employee's responses
    #[arg(long, conflicts_with = "area")]
    employee: Option<Uuid>,
    /// Only responses from this area id
    #[arg(long)]
    area: Option<i64>,
}

impl FilterArgs {
    fn filter(&self) -> SurveyFilter {
        match (self.employee, self.area) {
            (Some(id), _) => SurveyFilter::Employee(id),
            (None, Some(area_id)) => SurveyFilter::Area(area_id),
            (None, None) => SurveyFilter::All,
        }
    }
}

fn parse_demographic(s: &str) -> Result<Demographic, String> {
    Demographic::try_from(s).map_err(|_| format!("unknown dimension '{}'", s))
}

fn parse_level(s: &str) -> Result<RiskLevel, String> {
    RiskLevel::try_from(s).map_err(|_| format!("unknown risk level '{}'", s))
}

fn parse_sort(s: &str) -> Result<fleet::RiskSort, String> {
    fleet::RiskSort::try_from(s).map_err(|_| format!("unknown sort '{}'", s))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn build_state(settings: Settings) -> anyhow::Result<SharedState> {
    let store: Arc<dyn SurveyStore> = match &settings.source {
        DataSource::Postgres { url, max_connections } => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(url)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to database: {}", e);
                    e
                })?;
            tracing::info!("Database connection established");
            Arc::new(PgSurveyStore::new(pool))
        }
        DataSource::Snapshot(path) => Arc::new(InMemoryStore::from_json_file(path).await?),
    };

    let lexicon = match &settings.lexicon_path {
        Some(path) => Lexicon::from_json_file(path).await.map_err(|e| {
            tracing::error!("Failed to load lexicon {}: {}", path.display(), e);
            e
        })?,
        None => Lexicon::portuguese(),
    };

    Ok(Arc::new(AppState::new(store, Arc::new(lexicon), settings.selection)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    tracing::info!("Survey selection policy: {}", settings.selection.as_str());
    let state = build_state(settings).await?;

    match cli.command {
        Commands::Overview(args) => print_json(&survey::survey_overview(&state, &args.filter()).await?)?,
        Commands::Sentiment(args) => {
            print_json(&comments::sentiment_summary(&state, &args.filter()).await?)?
        }
        Commands::Correlations(args) => {
            print_json(&survey::survey_correlations(&state, &args.filter()).await?)?
        }
        Commands::Demographics { by } => print_json(&survey::demographic_breakdown(&state, by).await?)?,
        Commands::RiskSummary => print_json(&fleet::attrition_summary(&state).await?)?,
        Commands::RiskList {
            page,
            limit,
            sort,
            level,
        } => {
            let query = fleet::RiskListQuery {
                page,
                limit,
                sort,
                level,
            };
            print_json(&fleet::list_risks(&state, &query).await?)?
        }
        Commands::Employee { id } => match attrition::calculate_employee_risk(&state, id).await? {
            Some(assessment) => print_json(&assessment)?,
            None => {
                tracing::warn!("No assessment for employee {}: unknown or no survey responses", id);
                std::process::exit(2);
            }
        },
        Commands::CareerHypothesis => print_json(&fleet::career_hypothesis(&state).await?)?,
        Commands::TenurePatterns => print_json(&fleet::tenure_patterns(&state).await?)?,
    }

    Ok(())
}
