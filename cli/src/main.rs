//! Wayfinder CLI - plays an exploration in the terminal.
//!
//! ```text
//! main() -> ExplorationProgressEngine::begin_session() -> play()
//!                                                          |
//!                                                          v
//!                          current_state_view -> prompt -> submit_answer | :prev | :next
//! ```
//!
//! Logs go to `~/.wayfinder/logs/wayfinder.log` so they never interleave with
//! the lesson text on stdout.

mod assets;

use anyhow::{Context, Result, bail};
use std::{
    env,
    fs::{self, File, OpenOptions},
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin, stdin};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use wayfinder_engine::{
    CurrentState, Destination, EngineError, EphemeralState, Exploration, ExplorationId,
    ExplorationLoader, ExplorationProgressEngine, InMemoryLoader, InteractionObject,
    JsonDirectoryLoader, RuleClassifier, StateKind, SubscriptionManager, WayfinderConfig,
    wayfinder_dir,
};

const USAGE: &str = "usage: wayfinder [--demo | --file <path> | <exploration-id>]";

fn init_tracing(config: Option<&WayfinderConfig>) {
    let fallback = config.map_or("info", WayfinderConfig::log_filter);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Without a log file, drop logs rather than interleave them with the lesson.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.wayfinder/logs/wayfinder.log
    if let Some(dir) = wayfinder_dir() {
        candidates.push(dir.join("logs").join("wayfinder.log"));
    }

    // Fallback: ./.wayfinder/logs/wayfinder.log
    candidates.push(PathBuf::from(".wayfinder").join("logs").join("wayfinder.log"));

    candidates
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Demo,
    File(PathBuf),
    Id(String),
}

impl Source {
    fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let source = match args.next().as_deref() {
            None | Some("--demo") => Self::Demo,
            Some("--file") => {
                let path = args.next().context(USAGE)?;
                Self::File(PathBuf::from(path))
            }
            Some("-h" | "--help") => bail!(USAGE),
            Some(flag) if flag.starts_with('-') => bail!("unknown option '{flag}'\n{USAGE}"),
            Some(id) => Self::Id(id.to_string()),
        };
        if let Some(extra) = args.next() {
            bail!("unexpected argument '{extra}'\n{USAGE}");
        }
        Ok(source)
    }

    /// Builds the loader for this source and the id to begin with.
    fn into_loader(
        self,
        config: Option<&WayfinderConfig>,
    ) -> Result<(Arc<dyn ExplorationLoader>, ExplorationId)> {
        match self {
            Self::Demo => {
                let exploration =
                    assets::demo_exploration().context("built-in demo exploration is invalid")?;
                let id = exploration.id.clone();
                let loader: Arc<dyn ExplorationLoader> =
                    Arc::new(InMemoryLoader::new().with_exploration(exploration));
                Ok((loader, id))
            }
            Self::File(path) => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let exploration: Exploration = serde_json::from_str(&content)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                let id = exploration.id.clone();
                let loader: Arc<dyn ExplorationLoader> =
                    Arc::new(InMemoryLoader::new().with_exploration(exploration));
                Ok((loader, id))
            }
            Self::Id(id) => {
                let dir = config
                    .and_then(WayfinderConfig::content_dir)
                    .or_else(|| WayfinderConfig::default().content_dir())
                    .context("cannot locate the content directory; set [content] dir")?;
                tracing::debug!(dir = %dir.display(), "Reading explorations from directory");
                let loader: Arc<dyn ExplorationLoader> = Arc::new(JsonDirectoryLoader::new(dir));
                Ok((loader, ExplorationId::new(id)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Previous,
    Next,
    Quit,
    Answer(InteractionObject),
}

/// Parses a line typed at a card whose interaction is `interaction_id`.
fn parse_command(line: &str, interaction_id: &str) -> Result<Command, String> {
    let line = line.trim();
    match line {
        ":prev" | ":p" => return Ok(Command::Previous),
        ":next" | ":n" => return Ok(Command::Next),
        ":quit" | ":q" => return Ok(Command::Quit),
        _ => {}
    }
    match interaction_id {
        "NumericInput" => line
            .parse::<f64>()
            .map(|value| Command::Answer(InteractionObject::Real(value)))
            .map_err(|_| "Enter a number.".to_string()),
        "MultipleChoiceInput" => line
            .parse::<u32>()
            .map(|choice| Command::Answer(InteractionObject::NonNegativeInt(choice)))
            .map_err(|_| "Enter the number of your choice.".to_string()),
        _ => Ok(Command::Answer(InteractionObject::text(line))),
    }
}

/// Strips markup from authored HTML for terminal display.
fn plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn answered_line(answer: &InteractionObject, feedback_html: &str) -> String {
    format!("  you answered \"{answer}\": {}", plain_text(feedback_html))
}

fn render(view: &EphemeralState) {
    println!();
    println!("== {} ==", view.state.name);
    println!("{}", plain_text(&view.state.content.html));
    match &view.kind {
        StateKind::Pending(pending) => {
            for entry in &pending.wrong_answers {
                println!("  earlier: {}", plain_text(&entry.feedback.html));
            }
        }
        StateKind::Completed(completed) => {
            for entry in &completed.answers {
                println!("{}", answered_line(&entry.user_answer, &entry.feedback.html));
            }
        }
        StateKind::Terminal => println!("(end of exploration)"),
    }

    let mut hints = Vec::new();
    if view.has_previous_state {
        hints.push(":prev");
    }
    if view.has_next_state {
        hints.push(":next");
    }
    hints.push(":quit");
    println!("[{}]", hints.join(" "));
}

fn report_outcome(destination: &Destination, feedback: &str, correct: bool) {
    let feedback = plain_text(feedback);
    if !feedback.is_empty() {
        println!("{}{feedback}", if correct { "+ " } else { "" });
    }
    match destination {
        Destination::RefresherExploration(id) => {
            println!("(a refresher exploration '{id}' is recommended)");
        }
        Destination::MissingPrerequisiteSkill(id) => {
            println!("(this builds on skill '{id}', which may need review)");
        }
        Destination::SameState | Destination::StateName(_) => {}
    }
}

async fn play(
    engine: &ExplorationProgressEngine,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    loop {
        let view = match engine
            .current_state_view()
            .await
            .context("failed to load the exploration")?
        {
            CurrentState::Available(view) => view,
            CurrentState::Pending(reason) => bail!("no card to show ({reason:?})"),
        };
        render(&view);

        let Some(line) = input.next_line().await.context("failed to read input")? else {
            return Ok(());
        };
        let command = match parse_command(&line, &view.state.interaction.id) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        let result = match command {
            Command::Quit => return Ok(()),
            Command::Previous => engine.move_to_previous_state().await,
            Command::Next => engine.move_to_next_state().await,
            Command::Answer(_) if view.is_terminal() || view.has_next_state => {
                println!("This card takes no answer. Use :next or :quit.");
                continue;
            }
            Command::Answer(answer) => engine.submit_answer(answer).await.map(|outcome| {
                report_outcome(
                    &outcome.destination,
                    &outcome.feedback.html,
                    outcome.labelled_as_correct,
                );
            }),
        };

        match result {
            Ok(()) => {}
            Err(
                err @ (EngineError::AtInitialState
                | EngineError::AtTopOfDeck
                | EngineError::Classification(_)),
            ) => println!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match WayfinderConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Ignoring config: {err}");
            None
        }
    };
    init_tracing(config.as_ref());

    let source = Source::from_args(env::args().skip(1))?;
    let (loader, exploration_id) = source.into_loader(config.as_ref())?;
    let engine = ExplorationProgressEngine::new(
        loader,
        Arc::new(RuleClassifier::new()),
        Arc::new(SubscriptionManager::new()),
    );

    engine.begin_session(exploration_id).await?;
    let mut input = BufReader::new(stdin()).lines();
    let result = play(&engine, &mut input).await;

    if let Err(e) = engine.end_session().await {
        tracing::warn!(error = %e, "Failed to end session");
    }
    result
}
