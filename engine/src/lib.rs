//! Exploration session engine for Wayfinder.
//!
//! [`ExplorationProgressEngine`] owns one learner's session: the play stage,
//! the state graph of the loaded exploration, and the deck of visited cards.
//! Every mutation goes through a single writer slot, so operations apply one
//! at a time in the order they were requested.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::{self, JoinError};

pub use wayfinder_core::{
    AnswerClassifier, ClassificationError, DeckError, ExplorationProgress, GraphError, PlayStage,
    ProgressError, RuleClassifier, StageTransitionError,
};
pub use wayfinder_types::{
    AnswerOutcome, Destination, EphemeralState, Exploration, ExplorationId, InteractionObject,
    StateKind,
};
use wayfinder_types::State;

mod config;
pub use config::{
    AppConfig, ConfigError, ContentConfig, WayfinderConfig, config_path, wayfinder_dir,
};

mod loader;
pub use loader::{ExplorationLoader, InMemoryLoader, JsonDirectoryLoader, LoadError};

mod notifications;
pub use notifications::{ChangeNotifier, DataTopic, SubscriptionManager};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a session is already active; end it before beginning another")]
    SessionAlreadyActive,
    #[error("no session is active")]
    NoActiveSession,
    #[error("the exploration is still loading")]
    SessionLoading,
    #[error("an answer is already being processed")]
    AnswerAlreadyPending,
    #[error("already at the first card")]
    AtInitialState,
    #[error("already at the most recent card")]
    AtTopOfDeck,
    #[error("the session ended while the answer was being processed")]
    SessionInterrupted,
    #[error("failed to load exploration: {0}")]
    Load(#[from] LoadError),
    #[error("failed to classify answer: {0}")]
    Classification(#[from] ClassificationError),
    #[error("background task failed: {0}")]
    Task(#[from] JoinError),
    #[error(transparent)]
    Stage(#[from] StageTransitionError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Deck(#[from] DeckError),
}

impl From<ProgressError> for EngineError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::Stage(err) => Self::Stage(err),
            ProgressError::Graph(err) => Self::Graph(err),
            ProgressError::Deck(err) => Self::Deck(err),
        }
    }
}

impl EngineError {
    /// True for errors that indicate a bug in the caller or the engine rather
    /// than a runtime condition.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Stage(_) | Self::Graph(_) | Self::Deck(_))
    }
}

/// Why [`CurrentState::Pending`] has no card to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReason {
    NoSession,
    AnswerInFlight,
}

/// Result of reading the current-state view.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentState {
    Pending(PendingReason),
    Available(EphemeralState),
}

impl CurrentState {
    #[must_use]
    pub fn available(&self) -> Option<&EphemeralState> {
        match self {
            Self::Available(state) => Some(state),
            Self::Pending(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Previous,
    Next,
}

/// Session state guarded by the writer slot.
#[derive(Debug, Default)]
struct Session {
    progress: ExplorationProgress,
    /// Bumped on every begin and end, so work started in one session can tell
    /// it has been superseded.
    generation: u64,
}

struct Shared {
    session: Mutex<Session>,
    loader: Arc<dyn ExplorationLoader>,
    classifier: Arc<dyn AnswerClassifier>,
    notifier: Arc<dyn ChangeNotifier>,
}

/// Drives one exploration session at a time.
///
/// Clones share the same session.
#[derive(Clone)]
pub struct ExplorationProgressEngine {
    shared: Arc<Shared>,
}

impl ExplorationProgressEngine {
    #[must_use]
    pub fn new(
        loader: Arc<dyn ExplorationLoader>,
        classifier: Arc<dyn AnswerClassifier>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session::default()),
                loader,
                classifier,
                notifier,
            }),
        }
    }

    pub async fn play_stage(&self) -> PlayStage {
        self.lock().await.progress.play_stage()
    }

    pub async fn exploration_id(&self) -> Option<ExplorationId> {
        self.lock().await.progress.exploration_id().cloned()
    }

    /// Starts a session for `exploration_id`.
    ///
    /// Only records intent; the exploration is loaded on the next
    /// [`Self::current_state_view`], which is also where load failures surface.
    pub async fn begin_session(
        &self,
        exploration_id: impl Into<ExplorationId>,
    ) -> Result<(), EngineError> {
        let exploration_id = exploration_id.into();
        let mut session = self.lock().await;
        if session.progress.play_stage() != PlayStage::NotPlaying {
            return Err(EngineError::SessionAlreadyActive);
        }
        session
            .progress
            .begin(exploration_id.clone())
            .map_err(contract_violation)?;
        session.generation += 1;
        tracing::info!(%exploration_id, "Session begun");
        self.notify_current_state();
        Ok(())
    }

    /// Abandons the active session from any stage.
    pub async fn end_session(&self) -> Result<(), EngineError> {
        let mut session = self.lock().await;
        let stage = session.progress.play_stage();
        if !stage.is_playing() {
            return Err(EngineError::NoActiveSession);
        }
        let exploration_id = session.progress.exploration_id().cloned();
        session.progress.end().map_err(contract_violation)?;
        session.generation += 1;
        tracing::info!(exploration_id = ?exploration_id, %stage, "Session ended");
        self.notify_current_state();
        Ok(())
    }

    /// Classifies `answer` against the top card and applies the outcome.
    ///
    /// Classification runs on the blocking pool with the writer slot released
    /// and the stage at [`PlayStage::SubmittingAnswer`]; other submissions and
    /// navigation are rejected with [`EngineError::AnswerAlreadyPending`] until
    /// it finishes. The stage is back at [`PlayStage::ViewingState`] before this
    /// returns, whether or not classification succeeded. Once accepted, the
    /// submission completes even if the returned future is dropped.
    pub async fn submit_answer(
        &self,
        answer: InteractionObject,
    ) -> Result<AnswerOutcome, EngineError> {
        let (state, generation) = {
            let mut session = self.lock().await;
            ensure_viewing(session.progress.play_stage())?;
            let deck = session.progress.deck();
            deck.check_top_is_answerable().map_err(contract_violation)?;
            let state = deck.get_pending_top_state().map_err(contract_violation)?.clone();
            session
                .progress
                .advance_play_stage_to(PlayStage::SubmittingAnswer)
                .map_err(contract_violation)?;
            self.notify_current_state();
            (state, session.generation)
        };

        // The rest runs detached so a caller that stops waiting cannot leave
        // the stage at SubmittingAnswer.
        let engine = self.clone();
        let completion =
            task::spawn(async move { engine.complete_submission(state, answer, generation).await });
        completion.await?
    }

    async fn complete_submission(
        &self,
        state: State,
        answer: InteractionObject,
        generation: u64,
    ) -> Result<AnswerOutcome, EngineError> {
        let classifier = Arc::clone(&self.shared.classifier);
        let state_name = state.name.clone();
        let classified = task::spawn_blocking(move || {
            classifier
                .classify(&state, &answer)
                .map(|outcome| (answer, outcome))
        })
        .await;

        let mut session = self.lock().await;
        if session.generation != generation {
            tracing::warn!(state = %state_name, "Session ended during classification");
            return Err(EngineError::SessionInterrupted);
        }

        let result = match classified {
            Ok(Ok((answer, outcome))) => session
                .progress
                .record_answer(answer, &outcome)
                .map_err(contract_violation),
            Ok(Err(err)) => {
                tracing::warn!(state = %state_name, error = %err, "Answer classification failed");
                Err(EngineError::Classification(err))
            }
            Err(err) => {
                tracing::error!(state = %state_name, error = %err, "Classifier task failed");
                Err(EngineError::Task(err))
            }
        };

        session
            .progress
            .advance_play_stage_to(PlayStage::ViewingState)
            .map_err(contract_violation)?;
        self.notify_current_state();

        if let Ok(outcome) = &result {
            tracing::debug!(
                state = %state_name,
                destination = ?outcome.destination,
                correct = outcome.labelled_as_correct,
                index = session.progress.deck().state_index(),
                "Answer submitted"
            );
        }
        result
    }

    pub async fn move_to_previous_state(&self) -> Result<(), EngineError> {
        self.navigate(Direction::Previous).await
    }

    pub async fn move_to_next_state(&self) -> Result<(), EngineError> {
        self.navigate(Direction::Next).await
    }

    /// Reads the card in view, loading the exploration first if the session
    /// has just begun.
    ///
    /// A failed load leaves the session loading; the next read retries.
    pub async fn current_state_view(&self) -> Result<CurrentState, EngineError> {
        let mut session = self.lock().await;
        match session.progress.play_stage() {
            PlayStage::NotPlaying => return Ok(CurrentState::Pending(PendingReason::NoSession)),
            PlayStage::SubmittingAnswer => {
                return Ok(CurrentState::Pending(PendingReason::AnswerInFlight));
            }
            PlayStage::LoadingExploration => self.load_exploration(&mut session).await?,
            PlayStage::ViewingState => {}
        }
        let view = session
            .progress
            .deck()
            .get_current_ephemeral_state()
            .map_err(contract_violation)?;
        Ok(CurrentState::Available(view))
    }

    async fn load_exploration(&self, session: &mut Session) -> Result<(), EngineError> {
        let Some(exploration_id) = session.progress.exploration_id().cloned() else {
            return Err(EngineError::NoActiveSession);
        };

        let loader = Arc::clone(&self.shared.loader);
        let id = exploration_id.clone();
        let loaded = task::spawn_blocking(move || loader.load_exploration(&id)).await?;
        let exploration = loaded.inspect_err(|err| {
            tracing::warn!(%exploration_id, error = %err, "Exploration load failed");
        })?;

        let state_count = exploration.states.len();
        if let Err(err) = session.progress.finish_load(exploration) {
            tracing::warn!(%exploration_id, error = %err, "Exploration content rejected");
            return Err(err.into());
        }
        tracing::info!(%exploration_id, states = state_count, "Exploration loaded");
        self.notify_current_state();
        Ok(())
    }

    async fn navigate(&self, direction: Direction) -> Result<(), EngineError> {
        let mut session = self.lock().await;
        ensure_viewing(session.progress.play_stage())?;
        let progress = &mut session.progress;
        let moved = match direction {
            Direction::Previous => progress.navigate_previous(),
            Direction::Next => progress.navigate_next(),
        };
        moved.map_err(|err| match err {
            DeckError::AtInitialState => EngineError::AtInitialState,
            DeckError::AtTopOfDeck => EngineError::AtTopOfDeck,
            other => contract_violation(other),
        })?;
        tracing::debug!(?direction, index = progress.deck().state_index(), "Navigated deck");
        self.notify_current_state();
        Ok(())
    }

    async fn lock(&self) -> MutexGuard<'_, Session> {
        self.shared.session.lock().await
    }

    fn notify_current_state(&self) {
        self.shared.notifier.notify(DataTopic::CurrentState);
    }
}

/// Rejects answers and navigation unless a card is in view.
fn ensure_viewing(stage: PlayStage) -> Result<(), EngineError> {
    match stage {
        PlayStage::ViewingState => Ok(()),
        PlayStage::NotPlaying => Err(EngineError::NoActiveSession),
        PlayStage::LoadingExploration => Err(EngineError::SessionLoading),
        PlayStage::SubmittingAnswer => Err(EngineError::AnswerAlreadyPending),
    }
}

fn contract_violation(err: impl Into<EngineError>) -> EngineError {
    let err = err.into();
    tracing::error!(error = %err, "Session contract violated");
    err
}
