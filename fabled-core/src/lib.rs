//! # fabled-core
//!
//! The session and world-introspection engine that sits between a tool-call
//! surface and a text adventure interpreter.
//!
//! ## Core Concepts
//! - **GameEngine**: narrow trait contract with the external interpreter
//!   (step, snapshot, save/load blob, dictionary)
//! - **WorldModel**: traversable object/location tree rebuilt from snapshots
//! - **StateHasher**: canonical fingerprints for revisit/loop detection
//! - **ActionTemplateEngine**: verb templates x reachable nouns -> candidate commands
//! - **HistoryLog**: append-only (command, observation, score, hash) record
//! - **WalkthroughComparator**: longest-common-prefix progress against a
//!   reference solution
//! - **SessionRegistry**: session lifecycle with one exclusive engine lane
//!   per session

pub mod engine;
pub mod error;
pub mod games;
pub mod hash;
pub mod history;
pub mod script;
pub mod session;
pub mod slots;
pub mod template;
pub mod walkthrough;
pub mod world;

pub use engine::{
    Attribute, DictWord, Direction, EngineAdapter, GameEngine, ObjectId, RawExit, RawObject,
    RawSnapshot, StepOutcome,
};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use games::{EngineFactory, GameInfo, GameLibrary, GameSource, ScriptedFactory};
pub use hash::StateHasher;
pub use history::{HistoryEntry, HistoryLog, RecentTurn};
pub use script::{GameScript, ScriptObject, ScriptedEngine};
pub use session::{
    ActiveSessionInfo, GameStateView, RegistryHealth, Session, SessionRegistry, SessionStatus,
    SessionSummary, StepReport, WorldObjectsView, DEFAULT_STEP_TIMEOUT, MILESTONES,
};
pub use slots::{FileSlotStore, MemorySlotStore, SavedStateMeta, SlotBackend, SlotStore};
pub use template::{
    generate, templates, ActionTemplate, ObjPred, TemplateKind, Vocabulary, VocabularyReport,
};
pub use walkthrough::{WalkthroughComparator, WalkthroughReport};
pub use world::{
    DiscoveredAtlas, ExitEdge, Location, LocationGraph, LocationNode, Owner, WorldModel,
    WorldObject,
};
