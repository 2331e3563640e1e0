//! # Sessions
//!
//! One session is one play-through: an exclusively-owned engine, a history
//! log, a discovered atlas, and a cached world model. The registry owns the
//! lifecycle and enforces the single-active-session policy.
//!
//! ## Locking model
//!
//! The interpreter is not reentrant, so every engine-touching call goes
//! through the session's lane: an owned `tokio::sync::Mutex` guard is moved
//! into `spawn_blocking` together with the call, and the await is bounded by
//! a timeout. Concurrent callers queue on the mutex rather than interleave.
//! If the timeout fires, the caller gets `Timeout` but the dispatched engine
//! call cannot be cancelled - the blocking task keeps the guard until it
//! returns, so the lane stays busy and later calls queue behind it.
//!
//! Read-only queries never take the lane: they serve from the immutable
//! `Arc<WorldModel>` captured under the lane by the last state change.

use crate::engine::{DictWord, EngineAdapter, GameEngine, ObjectId, StepOutcome};
use crate::error::{self, Error, Result};
use crate::games::GameLibrary;
use crate::hash::StateHasher;
use crate::history::{HistoryLog, RecentTurn, unix_now};
use crate::slots::{SavedStateMeta, SlotStore};
use crate::template::{self, Vocabulary, VocabularyReport};
use crate::walkthrough::{WalkthroughComparator, WalkthroughReport};
use crate::world::{DiscoveredAtlas, Location, LocationGraph, WorldModel, WorldObject};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task;
use tokio::time;

/// Score-percentage milestones reported as they are crossed
pub const MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// Default bound on a single engine call
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Active,
    Ended,
}

/// Result of one `step`, enriched with session-level signals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub outcome: StepOutcome,
    /// The parser accepted the command (a turn was consumed)
    pub valid: bool,
    /// The resulting state was already seen earlier this session
    pub revisited: bool,
    /// Score-percentage milestones newly crossed by this step
    pub milestones: Vec<u8>,
    pub state_hash: String,
}

/// Agent-facing summary of where the game stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateView {
    pub session_id: String,
    pub game_id: String,
    pub location: String,
    pub score: i32,
    pub max_score: i32,
    pub moves: u32,
    pub game_over: bool,
    pub inventory: Vec<String>,
}

/// Everything the current snapshot knows about the world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObjectsView {
    pub objects: Vec<WorldObject>,
    pub locations: Vec<Location>,
}

/// Final accounting returned when a session closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub game_id: String,
    pub final_score: i32,
    pub max_score: i32,
    pub total_moves: u32,
    pub performance: String,
}

/// Registry status for the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryHealth {
    pub sessions: usize,
    pub active_session: Option<ActiveSessionInfo>,
    /// A session died from an engine failure and has not been closed yet
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSessionInfo {
    pub session_id: String,
    pub game_id: String,
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    failed: bool,
    history: HistoryLog,
    atlas: DiscoveredAtlas,
    model: Arc<WorldModel>,
    last_outcome: StepOutcome,
    reached_milestones: BTreeSet<u8>,
}

/// One in-progress play-through
pub struct Session {
    id: String,
    game_id: String,
    created_at: u64,
    max_score: i32,
    dictionary: Arc<Vec<DictWord>>,
    vocabulary: Arc<Vocabulary>,
    comparator: WalkthroughComparator,
    lane: Arc<Mutex<EngineAdapter>>,
    state: RwLock<SessionState>,
    slots: StdMutex<SlotStore>,
    last_accessed: AtomicU64,
    step_timeout: Duration,
}

impl Session {
    /// Boot a session: reset the engine, interrogate it once for the
    /// dictionary/walkthrough, and capture the opening snapshot.
    async fn open(
        id: String,
        game_id: String,
        engine: Box<dyn GameEngine>,
        slots: SlotStore,
        step_timeout: Duration,
    ) -> Result<(Arc<Session>, StepOutcome)> {
        let boot = task::spawn_blocking(move || -> Result<_> {
            let mut adapter = EngineAdapter::new(engine);
            let outcome = adapter.reset()?;
            let raw = adapter.world_snapshot()?;
            let dictionary = adapter.dictionary()?;
            let walkthrough = adapter.walkthrough();
            let max_score = adapter.max_score();
            let word_length = adapter.word_length();
            Ok((adapter, outcome, raw, dictionary, walkthrough, max_score, word_length))
        })
        .await
        .map_err(|e| error::engine_failure(format!("engine bootstrap panicked: {}", e)))??;
        let (adapter, outcome, raw, dictionary, walkthrough, max_score, word_length) = boot;

        let model = WorldModel::from_raw(&raw)?;
        let vocabulary = Vocabulary::from_dictionary(&dictionary, word_length);
        let mut atlas = DiscoveredAtlas::new();
        atlas.observe(&model);

        let session = Session {
            id,
            game_id,
            created_at: unix_now(),
            max_score,
            dictionary: Arc::new(dictionary),
            vocabulary: Arc::new(vocabulary),
            comparator: WalkthroughComparator::new(walkthrough),
            lane: Arc::new(Mutex::new(adapter)),
            state: RwLock::new(SessionState {
                status: SessionStatus::Active,
                failed: false,
                history: HistoryLog::new(),
                atlas,
                model: Arc::new(model),
                last_outcome: outcome.clone(),
                reached_milestones: BTreeSet::new(),
            }),
            slots: StdMutex::new(slots),
            last_accessed: AtomicU64::new(unix_now()),
            step_timeout,
        };
        Ok((Arc::new(session), outcome))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn max_score(&self) -> i32 {
        self.max_score
    }

    pub fn status(&self) -> SessionStatus {
        self.state.read().expect("state lock").status
    }

    pub fn is_failed(&self) -> bool {
        self.state.read().expect("state lock").failed
    }

    fn touch(&self) {
        self.last_accessed.store(unix_now(), Ordering::Relaxed);
    }

    /// Seconds since the last call that touched this session
    pub fn idle_secs(&self) -> u64 {
        unix_now().saturating_sub(self.last_accessed.load(Ordering::Relaxed))
    }

    fn ensure_active(&self) -> Result<()> {
        match self.status() {
            SessionStatus::Ended => Err(error::session_ended(&self.id)),
            _ => Ok(()),
        }
    }

    /// An engine failure kills the session; everything else passes through
    fn classify(&self, err: Error) -> Error {
        if err.is_session_fatal() {
            let mut state = self.state.write().expect("state lock");
            state.status = SessionStatus::Ended;
            state.failed = true;
            tracing::warn!(session = %self.id, error = %err, "session ended by engine failure");
        }
        err
    }

    fn mark_ended(&self) {
        let mut state = self.state.write().expect("state lock");
        state.status = SessionStatus::Ended;
    }

    // ------------------------------------------------------------------
    // Engine lane
    // ------------------------------------------------------------------

    /// Run one engine call on the session's exclusive lane, bounded by the
    /// step timeout. The owned guard travels into the blocking task, so a
    /// timed-out call keeps the lane busy until the engine actually returns.
    async fn with_engine<T, F>(&self, call_name: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut EngineAdapter) -> Result<T> + Send + 'static,
    {
        let secs = self.step_timeout.as_secs();
        let lane = Arc::clone(&self.lane);
        let call = async move {
            let mut guard = lane.lock_owned().await;
            task::spawn_blocking(move || {
                let result = f(&mut guard);
                drop(guard);
                result
            })
            .await
            .map_err(|e| error::engine_failure(format!("engine call panicked: {}", e)))?
        };
        match time::timeout(self.step_timeout, call).await {
            Ok(result) => result.map_err(|e| self.classify(e)),
            Err(_) => Err(error::timeout(call_name, secs)),
        }
    }

    // ------------------------------------------------------------------
    // State-changing calls
    // ------------------------------------------------------------------

    /// Execute one command and fold the result into the session
    pub async fn step(&self, command: &str) -> Result<StepReport> {
        self.touch();
        self.ensure_active()?;
        let command = command.trim().to_string();
        if command.is_empty() {
            return Err(error::invalid_argument("command must not be empty")
                .with_operation("session::step"));
        }

        let cmd = command.clone();
        let (outcome, raw) = self
            .with_engine("step", move |engine| {
                let outcome = engine.step(&cmd)?;
                let raw = engine.world_snapshot()?;
                Ok((outcome, raw))
            })
            .await?;

        let model = WorldModel::from_raw(&raw).map_err(|e| self.classify(e))?;
        let fingerprint = StateHasher::fingerprint(&model);
        let model = Arc::new(model);

        let mut state = self.state.write().expect("state lock");
        let valid = outcome.moves > state.last_outcome.moves;
        let revisited = state.history.contains_hash(&fingerprint);
        state
            .history
            .append(command, outcome.text.clone(), outcome.score, fingerprint.clone());
        state.atlas.observe(&model);
        state.model = model;
        state.last_outcome = outcome.clone();
        let milestones = crossed_milestones(
            outcome.score,
            self.max_score,
            &mut state.reached_milestones,
        );

        Ok(StepReport { outcome, valid, revisited, milestones, state_hash: fingerprint })
    }

    /// Reload the initial game state; history, atlas, and milestones are
    /// cleared atomically under the state lock.
    pub async fn reset(&self) -> Result<StepOutcome> {
        self.touch();
        self.ensure_active()?;

        let (outcome, raw) = self
            .with_engine("reset", |engine| {
                let outcome = engine.reset()?;
                let raw = engine.world_snapshot()?;
                Ok((outcome, raw))
            })
            .await?;

        let model = WorldModel::from_raw(&raw).map_err(|e| self.classify(e))?;
        let model = Arc::new(model);

        let mut state = self.state.write().expect("state lock");
        state.history.clear();
        state.atlas.clear();
        state.reached_milestones.clear();
        state.atlas.observe(&model);
        state.model = model;
        state.last_outcome = outcome.clone();

        Ok(outcome)
    }

    /// Serialize the engine state into a named slot
    pub async fn save(&self, slot: &str) -> Result<SavedStateMeta> {
        self.touch();
        self.ensure_active()?;
        let slot = slot.trim();
        if slot.is_empty() {
            return Err(error::invalid_argument("slot name must not be empty")
                .with_operation("session::save"));
        }

        let blob = self.with_engine("save", |engine| engine.serialize_state()).await?;
        self.slots.lock().expect("slot lock").save(slot, &blob)
    }

    /// Restore a previously saved slot and refresh the cached model
    pub async fn load(&self, slot: &str) -> Result<StepOutcome> {
        self.touch();
        self.ensure_active()?;
        let blob = self.slots.lock().expect("slot lock").load(slot)?;

        let (outcome, raw) = self
            .with_engine("load", move |engine| {
                let outcome = engine.deserialize_state(&blob)?;
                let raw = engine.world_snapshot()?;
                Ok((outcome, raw))
            })
            .await?;

        let model = WorldModel::from_raw(&raw).map_err(|e| self.classify(e))?;
        let model = Arc::new(model);

        let mut state = self.state.write().expect("state lock");
        state.atlas.observe(&model);
        state.model = model;
        state.last_outcome = outcome.clone();

        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Read-only introspection (cached snapshot; no engine lane)
    // ------------------------------------------------------------------

    pub fn game_state(&self) -> GameStateView {
        self.touch();
        let state = self.state.read().expect("state lock");
        GameStateView {
            session_id: self.id.clone(),
            game_id: self.game_id.clone(),
            location: state.model.player_location().name.clone(),
            score: state.last_outcome.score,
            max_score: self.max_score,
            moves: state.last_outcome.moves,
            game_over: state.last_outcome.game_over,
            inventory: state.model.inventory().iter().map(|o| o.name.clone()).collect(),
        }
    }

    pub fn world_objects(&self) -> WorldObjectsView {
        self.touch();
        let state = self.state.read().expect("state lock");
        WorldObjectsView {
            objects: state.model.objects().cloned().collect(),
            locations: state.model.locations().cloned().collect(),
        }
    }

    pub fn object_details(&self, object_id: ObjectId) -> Result<WorldObject> {
        self.touch();
        let state = self.state.read().expect("state lock");
        state.model.object_details(object_id).cloned()
    }

    /// The discovered subgraph of the map
    pub fn location_graph(&self) -> LocationGraph {
        self.touch();
        self.state.read().expect("state lock").atlas.graph()
    }

    /// Candidate commands for the current state
    pub fn valid_actions(&self, filter: Option<&[String]>) -> Vec<String> {
        self.touch();
        let state = self.state.read().expect("state lock");
        template::generate(&state.model, &self.vocabulary, filter)
    }

    /// The parser's dictionary grouped by part of speech
    pub fn vocabulary_report(&self) -> VocabularyReport {
        self.touch();
        VocabularyReport::from_words(&self.dictionary)
    }

    /// Trimmed recent turns plus the total move count
    pub fn recent_history(&self, count: usize) -> (Vec<RecentTurn>, usize) {
        self.touch();
        let state = self.state.read().expect("state lock");
        (state.history.recent(count), state.history.len())
    }

    /// Full history entries, most recent `count` (`None` = all)
    pub fn history_entries(&self, count: Option<usize>) -> Vec<crate::history::HistoryEntry> {
        let state = self.state.read().expect("state lock");
        state.history.entries(count).to_vec()
    }

    /// Progress against the reference solution
    pub fn compare_walkthrough(&self) -> WalkthroughReport {
        self.touch();
        let state = self.state.read().expect("state lock");
        self.comparator.compare(&state.history.commands())
    }

    /// The reference solution itself (normalized), for replay tooling
    pub fn walkthrough_commands(&self) -> Vec<String> {
        self.comparator.reference().to_vec()
    }

    pub fn summary(&self) -> SessionSummary {
        let state = self.state.read().expect("state lock");
        let performance = if self.max_score > 0 {
            format!(
                "{}%",
                (state.last_outcome.score as f64 / self.max_score as f64 * 100.0).round() as i64
            )
        } else {
            "n/a".to_string()
        };
        SessionSummary {
            session_id: self.id.clone(),
            game_id: self.game_id.clone(),
            final_score: state.last_outcome.score,
            max_score: self.max_score,
            total_moves: state.last_outcome.moves,
            performance,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("game_id", &self.game_id)
            .field("status", &self.status())
            .finish()
    }
}

fn crossed_milestones(score: i32, max_score: i32, reached: &mut BTreeSet<u8>) -> Vec<u8> {
    if max_score <= 0 {
        return Vec::new();
    }
    let pct = score as f64 / max_score as f64 * 100.0;
    MILESTONES
        .iter()
        .copied()
        .filter(|m| pct >= *m as f64 && reached.insert(*m))
        .collect()
}

// ============================================================================
// SessionRegistry
// ============================================================================

/// Owns every live session and enforces the single-active policy.
///
/// Sessions are keyed by id with fully independent lanes; the
/// one-active-at-a-time rule lives entirely in the conflict check inside
/// `create`, so relaxing it later is a policy change, not a redesign.
pub struct SessionRegistry {
    library: GameLibrary,
    sessions: tokio::sync::RwLock<HashMap<String, Arc<Session>>>,
    step_timeout: Duration,
    save_root: Option<PathBuf>,
    next_serial: AtomicU64,
}

impl SessionRegistry {
    pub fn new(library: GameLibrary) -> Self {
        Self {
            library,
            sessions: tokio::sync::RwLock::new(HashMap::new()),
            step_timeout: DEFAULT_STEP_TIMEOUT,
            save_root: None,
            next_serial: AtomicU64::new(0),
        }
    }

    /// Bound for individual engine calls
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Persist save slots under this directory (one subdirectory per session)
    pub fn with_save_root(mut self, save_root: PathBuf) -> Self {
        self.save_root = Some(save_root);
        self
    }

    pub fn library(&self) -> &GameLibrary {
        &self.library
    }

    fn generate_id(&self) -> String {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        format!("sess_{:x}_{:x}", millis, serial)
    }

    /// Start a new session. Fails with `SessionConflict` while another
    /// session is active, and `GameNotFound` for unknown games.
    pub async fn create(&self, game_id: &str) -> Result<(Arc<Session>, StepOutcome)> {
        self.library.get(game_id)?;
        {
            let sessions = self.sessions.read().await;
            if let Some(active) =
                sessions.values().find(|s| s.status() == SessionStatus::Active)
            {
                return Err(error::session_conflict(active.id())
                    .with_operation("registry::create"));
            }
        }

        let engine = self.library.open_engine(game_id)?;
        let id = self.generate_id();
        let slots = match &self.save_root {
            Some(root) => SlotStore::file(root.join(&id))?,
            None => SlotStore::memory(),
        };
        let (session, outcome) =
            Session::open(id.clone(), game_id.to_lowercase(), engine, slots, self.step_timeout)
                .await?;

        let mut sessions = self.sessions.write().await;
        if let Some(active) = sessions.values().find(|s| s.status() == SessionStatus::Active) {
            return Err(error::session_conflict(active.id()).with_operation("registry::create"));
        }
        sessions.insert(id.clone(), Arc::clone(&session));
        tracing::info!(session = %id, game = %session.game_id(), "session created");
        Ok((session, outcome))
    }

    pub async fn get(&self, session_id: &str) -> Result<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| error::session_not_found(session_id).with_operation("registry::get"))
    }

    pub async fn reset(&self, session_id: &str) -> Result<StepOutcome> {
        let session = self.get(session_id).await?;
        session.reset().await
    }

    /// Close a session, releasing its engine, and return the final summary
    pub async fn close(&self, session_id: &str) -> Result<SessionSummary> {
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id)
        }
        .ok_or_else(|| error::session_not_found(session_id).with_operation("registry::close"))?;
        session.mark_ended();
        tracing::info!(session = %session_id, "session closed");
        Ok(session.summary())
    }

    /// Drop sessions that have been idle longer than `max_idle`
    pub async fn expire_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.idle_secs() > max_idle.as_secs())
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            if let Some(session) = sessions.remove(id) {
                session.mark_ended();
                tracing::info!(session = %id, "session expired after inactivity");
            }
        }
        expired.len()
    }

    pub async fn health(&self) -> RegistryHealth {
        let sessions = self.sessions.read().await;
        let active_session = sessions
            .values()
            .find(|s| s.status() == SessionStatus::Active)
            .map(|s| ActiveSessionInfo {
                session_id: s.id().to_string(),
                game_id: s.game_id().to_string(),
            });
        RegistryHealth {
            sessions: sessions.len(),
            active_session,
            failed: sessions.values().any(|s| s.is_failed()),
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("library", &self.library)
            .finish()
    }
}
