//! Classroom CLI
//!
//! Drives the learner workflow from a terminal: grade quiz files offline or
//! track progress against a running backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use classroom::{
    api::{HttpLearningApi, LearningApi},
    config::load_config,
    error::{AppError, Result},
    models::{CertificateLookup, Config, Position, RawQuiz},
    quiz::{Answers, evaluate, normalize},
    services::{LearnerEvent, LearningSession, SessionNotice},
    storage::LocalStorage,
};

/// Classroom - lecture progress and quiz evaluation
#[derive(Parser, Debug)]
#[command(name = "classroom", version, about = "Lecture progress and quiz evaluation")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file
    Validate,

    /// Grade answers against a quiz file without contacting the backend
    Grade {
        /// Quiz JSON as delivered by the backend
        #[arg(long)]
        quiz: PathBuf,

        /// Answers JSON: `{ "<question>": [<option>, ...] }`
        #[arg(long)]
        answers: PathBuf,
    },

    /// Show progress and certificate state for a course
    Status {
        #[arg(long)]
        course: String,
    },

    /// Mark a lecture complete (or toggle it)
    Complete {
        #[arg(long)]
        course: String,

        /// Section index; defaults to the resume position
        #[arg(long, requires = "lecture")]
        section: Option<usize>,

        /// Lecture index within the section
        #[arg(long, requires = "section")]
        lecture: Option<usize>,

        /// Toggle instead of marking complete
        #[arg(long)]
        toggle: bool,
    },

    /// Show where a course would resume
    Resume {
        #[arg(long)]
        course: String,
    },
}

/// Log level to start with: `debug` when verbose, else the level in the
/// config file, else `info`. Read quietly; `load_config` reports problems
/// once logging is up.
fn startup_level(verbose: bool, config_path: &Path) -> String {
    if verbose {
        return "debug".into();
    }
    Config::load(config_path)
        .map(|config| config.logging.level)
        .unwrap_or_else(|_| "info".into())
}

/// Initialize logging with the given default filter.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

async fn open_session(config: &Config, course: &str) -> Result<(Arc<HttpLearningApi>, LearningSession)> {
    let api = Arc::new(HttpLearningApi::new(&config.api)?);
    let store = Arc::new(LocalStorage::new(&config.storage.root_dir));
    let session = LearningSession::start(api.clone(), store, course, config).await?;
    Ok((api, session))
}

fn print_notices(notices: &[SessionNotice]) {
    for notice in notices {
        match notice {
            SessionNotice::Info(message) => log::info!("{}", message),
            SessionNotice::Error(message) => log::error!("{}", message),
            SessionNotice::Congratulations { certificate } => match certificate {
                Some(certificate) => log::info!(
                    "Congratulations! Certificate {} is ready.",
                    certificate
                        .certificate_number
                        .as_deref()
                        .unwrap_or(&certificate.id)
                ),
                None => log::info!("Congratulations! You completed the course."),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&startup_level(cli.verbose, &cli.config));
    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Validate => {
            log::info!("Configuration OK");
            log::info!("API: {}", config.api.base_url);
            log::info!("Storage: {}", config.storage.root_dir);
        }

        Command::Grade { quiz, answers } => {
            let raw: RawQuiz = read_json(&quiz)?;
            let answers: Answers = read_json(&answers)?;
            let quiz = normalize(&raw, config.quiz.default_passing_score)?;

            let result = evaluate(&quiz, &answers);
            println!("{}", serde_json::to_string_pretty(&result)?);
            log::info!(
                "{}/{} marks, {}% ({})",
                result.scored_marks,
                result.total_marks,
                result.percentage_score,
                if result.passed { "passed" } else { "not passed" }
            );
        }

        Command::Status { course } => {
            let (api, session) = open_session(&config, &course).await?;
            let tracker = session.tracker();
            let progress = tracker.progress();

            log::info!("Course: {}", tracker.course().title);
            log::info!(
                "Completed {}/{} lectures",
                progress.completed_count(tracker.course()),
                tracker.course().lecture_count()
            );
            if let Some(overall) = progress.overall_progress {
                log::info!("Overall progress: {}%", overall);
            }
            log::info!(
                "Course complete: {}",
                if tracker.is_course_complete() { "yes" } else { "no" }
            );

            match api.get_certificate_by_course(&course).await? {
                CertificateLookup::Found(certificate) => {
                    log::info!("Certificate: {}", certificate.id)
                }
                CertificateLookup::NotFound => log::info!("Certificate: none"),
                CertificateLookup::Unavailable(reason) => {
                    log::warn!("Certificate service unavailable: {}", reason)
                }
            }
        }

        Command::Complete {
            course,
            section,
            lecture,
            toggle,
        } => {
            let (_, mut session) = open_session(&config, &course).await?;

            if let (Some(section), Some(lecture)) = (section, lecture) {
                let notices = session
                    .handle(LearnerEvent::SelectLecture(Position::new(section, lecture)))
                    .await;
                if !notices.is_empty() {
                    print_notices(&notices);
                    return Err(AppError::validation("cannot select that lecture"));
                }
            }

            let event = if toggle {
                LearnerEvent::ToggleComplete
            } else {
                LearnerEvent::LectureCompleted
            };
            let notices = session.handle(event).await;
            if notices.is_empty() {
                log::info!("Nothing to do");
            }
            print_notices(&notices);
        }

        Command::Resume { course } => {
            let (_, session) = open_session(&config, &course).await?;
            let tracker = session.tracker();
            let position = tracker.position();

            match tracker.current_lecture() {
                Some((section, lecture)) => log::info!(
                    "Resume at section {} \"{}\", lecture {} \"{}\"",
                    position.section_index,
                    section.title,
                    position.lecture_index,
                    lecture.title
                ),
                None => log::info!("Course has no lectures"),
            }
        }
    }

    Ok(())
}
