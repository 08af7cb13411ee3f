//! studyboard - progress dashboard for a textbook study group.
//!
//! Reads notebook submissions from each member's GitHub repository and
//! prints dashboards, rankings and reports as JSON on stdout. Logs go to
//! stderr; set `RUST_LOG=debug` for detail.

mod app;

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use studyboard_core::credentials::CredentialStore;
use studyboard_core::detector::detect_chapter;
use studyboard_core::models::{ChapterId, NewPaper, NewProject, ProjectUpdate};
use studyboard_core::{report, scoring, BoardError, StudyConfig};

use app::App;

/// Recent papers shown on the dashboard
const DASHBOARD_PAPERS: usize = 3;

#[derive(Parser)]
#[command(name = "studyboard")]
#[command(about = "Study group progress dashboard", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which chapter each filename maps to
    Detect {
        filenames: Vec<String>,
    },
    /// Per-cohort submission grid
    Progress {
        #[arg(long)]
        cohort: Option<String>,
    },
    /// Cohort summaries, chapter counts and recent papers
    Dashboard,
    /// Overall ranking with badges and levels
    Ranking,
    /// Skill scores for every member
    Skills,
    /// Member cards with average skill score
    Portfolio {
        #[arg(long)]
        cohort: Option<String>,
    },
    /// Detailed learning profile for one member
    Profile {
        handle: String,
    },
    /// Weekly learning report for one member
    Report {
        handle: String,
        week: u32,
    },
    /// Display names of all members
    Users,
    /// Recorded filenames next to the detected chapter
    Audit,
    /// Quiz statistics and completions
    Quiz {
        #[command(subcommand)]
        command: QuizCommand,
    },
    /// Shared papers and their comments
    Papers {
        #[command(subcommand)]
        command: PaperCommand,
    },
    /// Member portfolio projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Drop the cached submissions and rebuild them now
    Refresh,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Manage the GitHub token stored in the OS keychain
    Token {
        #[command(subcommand)]
        command: TokenCommand,
    },
}

#[derive(Subcommand)]
enum QuizCommand {
    /// Completion count and users per catalog quiz
    Stats,
    /// Members ranked by completed quizzes
    Leaderboard,
    /// Record a quiz completion
    Complete {
        #[arg(long)]
        user: String,
        #[arg(long)]
        quiz: String,
    },
}

#[derive(Subcommand)]
enum PaperCommand {
    List,
    /// A paper with its comments
    Show { id: i64 },
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        link: Option<String>,
    },
    Comments { id: i64 },
    Comment {
        id: i64,
        #[arg(long)]
        author: String,
        #[arg(long)]
        content: String,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    List {
        handle: String,
    },
    Add {
        handle: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notion_url: Option<String>,
        #[arg(long)]
        github_url: Option<String>,
        #[arg(long)]
        demo_url: Option<String>,
        #[arg(long, default_value = "")]
        status: String,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        /// Comma separated
        #[arg(long, value_delimiter = ',')]
        tech_stack: Vec<String>,
        /// Comma separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    Update {
        handle: String,
        id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        notion_url: Option<String>,
        #[arg(long)]
        github_url: Option<String>,
        #[arg(long)]
        demo_url: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    Delete {
        handle: String,
        id: String,
    },
}

#[derive(Subcommand)]
enum TokenCommand {
    Set { token: String },
    Clear,
}

#[derive(Serialize)]
struct Detection<'a> {
    filename: &'a str,
    chapter: Option<ChapterId>,
}

#[derive(Serialize)]
struct Ranking<'a> {
    ranking: &'a [scoring::RankingEntry],
    podium: BTreeMap<usize, Vec<&'a scoring::RankingEntry>>,
}

#[derive(Serialize)]
struct Refreshed {
    members: usize,
    completed: u32,
    cache_age: String,
}

#[derive(Serialize)]
struct Success {
    success: bool,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level, e.g. RUST_LOG=studyboard_core=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<BoardError>() {
            Some(board_error) => {
                let payload = board_error.payload();
                eprintln!(
                    "{}",
                    serde_json::to_string(&payload).unwrap_or_else(|_| payload.error.clone())
                );
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Commands that need no services
    match &cli.command {
        Commands::Detect { filenames } => {
            let detections: Vec<Detection> = filenames
                .iter()
                .map(|f| Detection {
                    filename: f,
                    chapter: detect_chapter(f),
                })
                .collect();
            return print_json(&detections);
        }
        Commands::Init { force } => return init_config(cli.config.clone(), *force),
        Commands::Token { command } => return manage_token(command),
        _ => {}
    }

    let mut app = App::new(cli.config.as_deref())?;
    info!(org = %app.config.org_name, "studyboard starting");

    match cli.command {
        Commands::Detect { .. } | Commands::Init { .. } | Commands::Token { .. } => {}
        Commands::Progress { cohort } => {
            let matrix = app.matrix().await;
            let mut grids = report::cohort_progress(&app.config, &matrix);
            if let Some(id) = cohort {
                grids.retain(|g| g.id == id);
            }
            print_json(&grids)?;
        }
        Commands::Dashboard => {
            let matrix = app.matrix().await;
            let activity = app.activity().await;
            let papers = app.board.recent_papers(DASHBOARD_PAPERS).await;
            print_json(&report::dashboard(&app.config, &matrix, &activity, papers))?;
        }
        Commands::Ranking => {
            let matrix = app.matrix().await;
            let activity = app.activity().await;
            let entries = scoring::leaderboard(&matrix, &activity);
            print_json(&Ranking {
                ranking: &entries,
                podium: scoring::podium(&entries),
            })?;
        }
        Commands::Skills => {
            let matrix = app.matrix().await;
            print_json(&report::skill_comparison(&matrix))?;
        }
        Commands::Portfolio { cohort } => {
            let matrix = app.matrix().await;
            print_json(&report::portfolio_cards(&app.config, &matrix, cohort.as_deref()))?;
        }
        Commands::Profile { handle } => {
            let progress = app.progress_of(&handle).await?;
            let quiz_count = app.board.quiz_count_for(&progress.name).await;
            print_json(&report::learning_profile(&app.config, &progress, quiz_count))?;
        }
        Commands::Report { handle, week } => {
            let progress = app.progress_of(&handle).await?;
            let report = report::weekly_report(&app.config, &progress, week)
                .ok_or_else(|| anyhow::anyhow!("Week {} is not scheduled", week))?;
            print_json(&report)?;
        }
        Commands::Users => print_json(&app.config.user_names())?,
        Commands::Audit => {
            let matrix = app.matrix().await;
            print_json(&report::submission_audit(&matrix))?;
        }
        Commands::Quiz { command } => run_quiz(&app, command).await?,
        Commands::Papers { command } => run_papers(&app, command).await?,
        Commands::Projects { command } => run_projects(&app, command).await?,
        Commands::Refresh => {
            let matrix = app.refresh().await?;
            print_json(&Refreshed {
                members: matrix.len(),
                completed: matrix.total_completed(),
                cache_age: app.snapshot_age(),
            })?;
        }
    }
    Ok(())
}

async fn run_quiz(app: &App, command: QuizCommand) -> Result<()> {
    match command {
        QuizCommand::Stats => print_json(&app.board.quiz_stats(&app.config.quizzes).await),
        QuizCommand::Leaderboard => print_json(&app.board.quiz_leaderboard().await),
        QuizCommand::Complete { user, quiz } => {
            app.board.complete_quiz(&user, &quiz, Utc::now()).await?;
            print_json(&Success { success: true })
        }
    }
}

async fn run_papers(app: &App, command: PaperCommand) -> Result<()> {
    match command {
        PaperCommand::List => print_json(&app.board.papers().await?),
        PaperCommand::Show { id } => print_json(&app.board.paper_thread(id).await?),
        PaperCommand::Add {
            title,
            author,
            content,
            link,
        } => {
            let paper = app
                .board
                .create_paper(NewPaper {
                    title,
                    author,
                    content,
                    link,
                })
                .await?;
            print_json(&paper)
        }
        PaperCommand::Comments { id } => print_json(&app.board.comments(id).await?),
        PaperCommand::Comment {
            id,
            author,
            content,
        } => print_json(&app.board.create_comment(id, &author, &content).await?),
    }
}

async fn run_projects(app: &App, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::List { handle } => {
            let member = app.member(&handle)?;
            print_json(&app.board.projects(&member.name).await)
        }
        ProjectCommand::Add {
            handle,
            title,
            description,
            notion_url,
            github_url,
            demo_url,
            status,
            start_date,
            end_date,
            tech_stack,
            tags,
        } => {
            let member = app.member(&handle)?;
            let project = app
                .board
                .add_project(NewProject {
                    user_name: member.name.clone(),
                    title,
                    description,
                    notion_url,
                    github_url,
                    demo_url,
                    status,
                    start_date,
                    end_date,
                    tech_stack,
                    tags,
                })
                .await?;
            print_json(&project)
        }
        ProjectCommand::Update {
            handle,
            id,
            status,
            notion_url,
            github_url,
            demo_url,
            end_date,
        } => {
            app.member(&handle)?;
            let update = ProjectUpdate {
                status,
                notion_url,
                github_url,
                demo_url,
                end_date,
            };
            app.board.update_project(&id, &update).await?;
            print_json(&Success { success: true })
        }
        ProjectCommand::Delete { handle, id } => {
            app.member(&handle)?;
            app.board.delete_project(&id).await?;
            print_json(&Success { success: true })
        }
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => StudyConfig::config_path()?,
    };
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    StudyConfig::default().save_to(&path)?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn manage_token(command: &TokenCommand) -> Result<()> {
    match command {
        TokenCommand::Set { token } => {
            CredentialStore::store_github_token(token)?;
            eprintln!("GitHub token stored in keychain");
        }
        TokenCommand::Clear => {
            CredentialStore::delete_github_token()?;
            eprintln!("GitHub token removed from keychain");
        }
    }
    Ok(())
}
