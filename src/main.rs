use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use graph_tracker::config::AppConfig;
use graph_tracker::database::get_database_url;
use graph_tracker::repositories::SqlStore;
use graph_tracker::services::translation::{ProviderKind, TranslationClient};
use graph_tracker::services::{
    AsyncJobRunner, GraphAnalysisService, GraphMutationService, GraphScoreEngine,
    GroupStatusPropagator, NewEdge, NewNode, TranslationJobRequest,
};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// SQLite file path or URL, overrides DATABASE_URL
    #[clap(short, long, global = true)]
    database: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    Project {
        #[clap(subcommand)]
        command: ProjectCommands,
    },
    Node {
        #[clap(subcommand)]
        command: NodeCommands,
    },
    Edge {
        #[clap(subcommand)]
        command: EdgeCommands,
    },
    Analyze {
        #[clap(subcommand)]
        command: AnalyzeCommands,
    },
    Recompute {
        #[clap(subcommand)]
        command: RecomputeCommands,
    },
    /// Run a translation job for a project and wait for it to finish
    Translate {
        #[clap(short, long)]
        project: String,
        #[clap(long, default_value = "en")]
        lang: String,
        /// Leave node titles out
        #[clap(long)]
        no_nodes: bool,
        /// Include comment bodies
        #[clap(long)]
        comments: bool,
        /// Also re-translate stale items
        #[clap(long)]
        stale: bool,
        /// Re-translate everything
        #[clap(long)]
        force: bool,
        #[clap(long, value_enum)]
        provider: Option<ProviderKind>,
    },
    Job {
        #[clap(subcommand)]
        command: JobCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init,
}

#[derive(Subcommand, Debug)]
enum ProjectCommands {
    Create {
        #[clap(short, long)]
        name: String,
        #[clap(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum NodeCommands {
    Create {
        #[clap(short, long)]
        project: String,
        #[clap(short, long)]
        title: String,
        #[clap(long, default_value = "0")]
        planned_hours: f64,
        #[clap(long)]
        parent: Option<String>,
        #[clap(long)]
        group: bool,
    },
    History {
        #[clap(short, long)]
        node: String,
    },
}

#[derive(Subcommand, Debug)]
enum EdgeCommands {
    Create {
        #[clap(short, long)]
        project: String,
        #[clap(long)]
        from: String,
        #[clap(long)]
        to: String,
    },
}

#[derive(Subcommand, Debug)]
enum AnalyzeCommands {
    CriticalPath {
        #[clap(short, long)]
        project: String,
    },
    Metrics {
        #[clap(short, long)]
        project: String,
    },
}

#[derive(Subcommand, Debug)]
enum RecomputeCommands {
    Score {
        #[clap(short, long)]
        node: String,
    },
    Group {
        #[clap(short, long)]
        node: String,
    },
}

#[derive(Subcommand, Debug)]
enum JobCommands {
    Status {
        #[clap(short, long)]
        id: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let mut config = AppConfig::from_env();
    setup_logging(args.log_level.as_deref().unwrap_or(&config.log_level));
    if let Some(database) = args.database {
        config.database_url = get_database_url(Some(&database));
    }

    let store = Arc::new(
        SqlStore::connect(&config.database_url)
            .await
            .context("failed to open database")?,
    );

    match args.command {
        Commands::Db { command } => match command {
            DbCommands::Init => {
                info!("Database initialised at {}", config.database_url);
            }
        },
        Commands::Project { command } => match command {
            ProjectCommands::Create { name, description } => {
                let service = GraphMutationService::new(store.clone());
                print_json(&service.create_project(&name, description).await?)?;
            }
        },
        Commands::Node { command } => {
            let service = GraphMutationService::new(store.clone());
            match command {
                NodeCommands::Create {
                    project,
                    title,
                    planned_hours,
                    parent,
                    group,
                } => {
                    let mut new = NewNode::new(project, title).planned_hours(planned_hours);
                    new.parent_id = parent;
                    new.is_group = group;
                    print_json(&service.create_node(new).await?)?;
                }
                NodeCommands::History { node } => {
                    print_json(&service.status_history(&node).await?)?;
                }
            }
        }
        Commands::Edge { command } => match command {
            EdgeCommands::Create { project, from, to } => {
                let service = GraphMutationService::new(store.clone());
                print_json(&service.create_edge(NewEdge::new(project, from, to)).await?)?;
            }
        },
        Commands::Analyze { command } => {
            let analysis = GraphAnalysisService::new(store.clone());
            match command {
                AnalyzeCommands::CriticalPath { project } => {
                    print_json(&analysis.longest_path_by_planned_hours(&project).await?)?;
                }
                AnalyzeCommands::Metrics { project } => {
                    print_json(&analysis.project_metrics(&project).await?)?;
                }
            }
        }
        Commands::Recompute { command } => match command {
            RecomputeCommands::Score { node } => {
                let score = GraphScoreEngine::new(store.clone())
                    .recompute_importance(&node)
                    .await?;
                print_json(&score)?;
            }
            RecomputeCommands::Group { node } => {
                let written = GroupStatusPropagator::new(store.clone())
                    .recompute_group_status(&node)
                    .await?;
                print_json(&written)?;
            }
        },
        Commands::Translate {
            project,
            lang,
            no_nodes,
            comments,
            stale,
            force,
            provider,
        } => {
            let client = Arc::new(TranslationClient::new(config.translation.clone()));
            let runner = AsyncJobRunner::new(
                store.clone(),
                store.clone(),
                client,
                config.async_workers,
            );

            let mut request = TranslationJobRequest::new(project, lang)
                .nodes(!no_nodes)
                .comments(comments)
                .stale(stale)
                .force(force);
            request.provider = provider.map(|kind| kind.to_string());

            let handle = runner.enqueue_translation_job(request).await?;
            let job_id = handle.job_id.clone();
            handle.wait().await?;
            print_json(&runner.get_job_status(&job_id).await?)?;
        }
        Commands::Job { command } => match command {
            JobCommands::Status { id } => {
                let client = Arc::new(TranslationClient::new(config.translation.clone()));
                let runner = AsyncJobRunner::new(store.clone(), store.clone(), client, 1);
                match runner.get_job_status(&id).await? {
                    Some(snapshot) => print_json(&snapshot)?,
                    None => anyhow::bail!("Job '{}' not found", id),
                }
            }
        },
    }

    Ok(())
}

fn setup_logging(log_level: &str) {
    let log_level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sqlx=warn,sea_orm=warn,{}", log_level)))
        .without_time()
        .init();
}
