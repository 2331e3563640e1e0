//! # Engine contract
//!
//! The narrow interface to the external text adventure interpreter.
//! The interpreter is a collaborator, not part of this crate: everything it
//! does is reached through the `GameEngine` trait, and everything the rest of
//! the engine layer knows about the game world enters through the raw
//! snapshot types defined here.
//!
//! ## Design
//! - `GameEngine` trait defines the core interface
//! - `EngineAdapter` owns the boxed engine for one session, tracks score
//!   deltas, and classifies failures
//! - Parser rejections ("I don't know the word ...") are normal observations;
//!   an `EngineFailure` means the interpreter itself is broken

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Object identifier, stable within a session (Z-machine object numbers)
pub type ObjectId = u32;

// ============================================================================
// Core Types
// ============================================================================

/// Result of advancing the game by one command (or of a reset/status read)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Narrative text the interpreter printed for this turn
    pub text: String,
    /// Current score
    pub score: i32,
    /// Turn counter
    pub moves: u32,
    /// Whether the game has ended (win or loss)
    pub game_over: bool,
    /// Score delta relative to the previous outcome, filled by the adapter
    pub reward: i32,
}

/// Object attribute flags as disclosed by the interpreter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// The object is a room
    Room,
    /// The object is the player avatar
    Player,
    /// Can be picked up
    Takeable,
    /// Can hold other objects
    Container,
    /// Can be opened and closed
    Openable,
    /// Currently open
    Open,
    /// Has readable text
    Readable,
    /// Fixed scenery, mentioned but not portable
    Scenery,
}

/// Directional exits between rooms
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
    Up,
    Down,
}

impl Direction {
    /// All directions in canonical order
    pub const ALL: [Direction; 10] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Northeast,
        Direction::Northwest,
        Direction::Southeast,
        Direction::Southwest,
        Direction::Up,
        Direction::Down,
    ];

    /// The word the parser accepts for this direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Northeast => "northeast",
            Direction::Northwest => "northwest",
            Direction::Southeast => "southeast",
            Direction::Southwest => "southwest",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Parse a direction word (full form only)
    pub fn parse(word: &str) -> Option<Direction> {
        Direction::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == word)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One object in the interpreter's object tree, as reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObject {
    pub id: ObjectId,
    pub name: String,
    /// Owning object. `None` only for rooms; every other object has exactly
    /// one owner (a room or a container).
    pub parent: Option<ObjectId>,
    pub attributes: Vec<Attribute>,
}

/// A directional edge the interpreter discloses (typically for the room the
/// player is standing in)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExit {
    pub from: ObjectId,
    pub direction: Direction,
    pub to: ObjectId,
}

/// Point-in-time read of the interpreter's world state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// The player object's id
    pub player: ObjectId,
    /// Current score (part of the simulated world, so part of the snapshot)
    pub score: i32,
    /// Every object the interpreter currently reports
    pub objects: Vec<RawObject>,
    /// Disclosed exits; edges only, never fabricated
    pub exits: Vec<RawExit>,
}

/// A word the game's parser recognizes, with its parts of speech.
/// A single word can carry several roles ("open" is a verb and an attribute
/// adjective in some games), so these are flags, not an enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictWord {
    pub word: String,
    #[serde(default)]
    pub is_verb: bool,
    #[serde(default)]
    pub is_noun: bool,
    #[serde(default)]
    pub is_adjective: bool,
    #[serde(default)]
    pub is_direction: bool,
    #[serde(default)]
    pub is_preposition: bool,
    #[serde(default)]
    pub is_meta: bool,
}

impl DictWord {
    pub fn verb(word: impl Into<String>) -> Self {
        Self { word: word.into(), is_verb: true, ..Default::default() }
    }

    pub fn noun(word: impl Into<String>) -> Self {
        Self { word: word.into(), is_noun: true, ..Default::default() }
    }

    pub fn adjective(word: impl Into<String>) -> Self {
        Self { word: word.into(), is_adjective: true, ..Default::default() }
    }

    pub fn direction(word: impl Into<String>) -> Self {
        Self { word: word.into(), is_direction: true, ..Default::default() }
    }

    pub fn preposition(word: impl Into<String>) -> Self {
        Self { word: word.into(), is_preposition: true, ..Default::default() }
    }

    pub fn meta(word: impl Into<String>) -> Self {
        Self { word: word.into(), is_meta: true, ..Default::default() }
    }
}

// ============================================================================
// GameEngine trait
// ============================================================================

/// The contract with the external interpreter.
///
/// Implementations wrap one loaded game. All calls are synchronous and
/// non-reentrant: the interpreter has internal mutable state with no locking
/// of its own, so callers serialize access (see the session lane).
///
/// `step` never fails on unrecognized input - the parser's own rejection text
/// is a valid observation. Errors are reserved for the interpreter itself
/// becoming unresponsive or inconsistent.
pub trait GameEngine: Send {
    /// Restore the initial game state and return the opening text
    fn reset(&mut self) -> Result<StepOutcome>;

    /// Execute one command
    fn step(&mut self, command: &str) -> Result<StepOutcome>;

    /// Current state without consuming a turn (room text, score, moves)
    fn status(&self) -> Result<StepOutcome>;

    /// Read the current object tree
    fn world_snapshot(&self) -> Result<RawSnapshot>;

    /// Serialize the full interpreter state to an opaque blob
    fn serialize_state(&self) -> Result<Vec<u8>>;

    /// Restore interpreter state from a blob produced by `serialize_state`
    fn deserialize_state(&mut self, blob: &[u8]) -> Result<()>;

    /// The parser's full vocabulary
    fn dictionary(&self) -> Result<Vec<DictWord>>;

    /// Maximum achievable score for this game
    fn max_score(&self) -> i32;

    /// Reference solution command sequence
    fn walkthrough(&self) -> Vec<String>;

    /// Number of significant characters the parser reads per word
    /// (classic Z-machine versions truncate at 6, later ones at 9)
    fn word_length(&self) -> usize {
        6
    }
}

// ============================================================================
// EngineAdapter
// ============================================================================

/// Owns the single interpreter instance for one session.
///
/// Thin by design: score-delta bookkeeping and failure classification live
/// here, everything stateful about the world lives in the interpreter.
pub struct EngineAdapter {
    engine: Box<dyn GameEngine>,
    last_score: i32,
}

impl EngineAdapter {
    pub fn new(engine: Box<dyn GameEngine>) -> Self {
        Self { engine, last_score: 0 }
    }

    /// Reset the game and clear the score baseline
    pub fn reset(&mut self) -> Result<StepOutcome> {
        let mut outcome = self.engine.reset()?;
        self.last_score = outcome.score;
        outcome.reward = 0;
        Ok(outcome)
    }

    /// Execute one command, filling in the score delta
    pub fn step(&mut self, command: &str) -> Result<StepOutcome> {
        let mut outcome = self.engine.step(command)?;
        outcome.reward = outcome.score - self.last_score;
        self.last_score = outcome.score;
        Ok(outcome)
    }

    /// Current state without consuming a turn
    pub fn status(&self) -> Result<StepOutcome> {
        let mut outcome = self.engine.status()?;
        outcome.reward = 0;
        Ok(outcome)
    }

    pub fn world_snapshot(&self) -> Result<RawSnapshot> {
        self.engine.world_snapshot()
    }

    pub fn serialize_state(&self) -> Result<Vec<u8>> {
        self.engine.serialize_state()
    }

    /// Restore a saved blob and resync the score baseline to the restored
    /// state, so the next step's reward is measured against it
    pub fn deserialize_state(&mut self, blob: &[u8]) -> Result<StepOutcome> {
        self.engine.deserialize_state(blob)?;
        let outcome = self.status()?;
        self.last_score = outcome.score;
        Ok(outcome)
    }

    pub fn dictionary(&self) -> Result<Vec<DictWord>> {
        self.engine.dictionary()
    }

    pub fn max_score(&self) -> i32 {
        self.engine.max_score()
    }

    pub fn walkthrough(&self) -> Vec<String> {
        self.engine.walkthrough()
    }

    pub fn word_length(&self) -> usize {
        self.engine.word_length()
    }
}

impl std::fmt::Debug for EngineAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineAdapter")
            .field("last_score", &self.last_score)
            .finish()
    }
}
