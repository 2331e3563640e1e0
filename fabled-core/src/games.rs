//! # Game library
//!
//! Discovers playable games and opens engines for them. Two sources exist:
//! built-in scripted games (always present, so the process runs
//! self-contained) and Z-machine story files found in the configured games
//! directory. Opening a game goes through the `EngineFactory` seam - the
//! scripted factory handles built-ins, and a real interpreter binding would
//! register a factory for story files.

use crate::engine::GameEngine;
use crate::error::{self, Result};
use crate::script::ScriptedEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Story file extensions the discovery scan accepts
const STORY_EXTENSIONS: &[&str] = &["z3", "z4", "z5", "z8"];

/// Where a game's bytes come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSource {
    /// Shipped with the process
    Builtin,
    /// A story file on disk
    File(PathBuf),
}

/// One entry in the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    /// Lowercase identifier ("zork1")
    pub id: String,
    /// Display name
    pub name: String,
    pub source: GameSource,
}

/// Opens an engine for games it supports
pub trait EngineFactory: Send + Sync {
    fn supports(&self, info: &GameInfo) -> bool;
    fn open(&self, info: &GameInfo) -> Result<Box<dyn GameEngine>>;
}

/// Factory for the built-in scripted games
pub struct ScriptedFactory;

impl EngineFactory for ScriptedFactory {
    fn supports(&self, info: &GameInfo) -> bool {
        info.source == GameSource::Builtin
    }

    fn open(&self, info: &GameInfo) -> Result<Box<dyn GameEngine>> {
        match info.id.as_str() {
            "zork1" => Ok(Box::new(ScriptedEngine::zork_opening())),
            "cloak" => Ok(Box::new(ScriptedEngine::cloak_of_darkness())),
            other => Err(error::game_load_failed(other, "unknown built-in game")
                .with_operation("games::open")),
        }
    }
}

/// The set of known games, keyed by id
pub struct GameLibrary {
    games: BTreeMap<String, GameInfo>,
    factories: Vec<Box<dyn EngineFactory>>,
}

impl GameLibrary {
    /// Build the library: built-in games plus whatever story files the
    /// games directory holds (`None` = built-ins only).
    pub fn discover(games_dir: Option<&Path>) -> Self {
        let mut games = BTreeMap::new();

        for (id, name) in [
            ("zork1", "Zork I: The Great Underground Empire (opening)"),
            ("cloak", "Cloak of Darkness"),
        ] {
            games.insert(
                id.to_string(),
                GameInfo { id: id.to_string(), name: name.to_string(), source: GameSource::Builtin },
            );
        }

        if let Some(dir) = games_dir {
            match std::fs::read_dir(dir) {
                Ok(entries) => {
                    for entry in entries.filter_map(|e| e.ok()) {
                        let path = entry.path();
                        let is_story = path
                            .extension()
                            .and_then(|e| e.to_str())
                            .map(|e| STORY_EXTENSIONS.contains(&e))
                            .unwrap_or(false);
                        if !is_story {
                            continue;
                        }
                        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                            continue;
                        };
                        let id = stem.to_lowercase();
                        // Story files never shadow built-ins
                        games.entry(id.clone()).or_insert(GameInfo {
                            id: id.clone(),
                            name: stem.to_string(),
                            source: GameSource::File(path.clone()),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "games directory unreadable");
                }
            }
        }

        tracing::debug!(games = games.len(), "game library ready");
        Self { games, factories: vec![Box::new(ScriptedFactory)] }
    }

    /// Register an additional engine factory (e.g. a story-file interpreter)
    pub fn register_factory(&mut self, factory: impl EngineFactory + 'static) {
        self.factories.push(Box::new(factory));
    }

    /// Sorted listing, optionally capped (`0` = all)
    pub fn list(&self, limit: usize) -> Vec<GameInfo> {
        let iter = self.games.values().cloned();
        if limit > 0 {
            iter.take(limit).collect()
        } else {
            iter.collect()
        }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn get(&self, game_id: &str) -> Result<&GameInfo> {
        self.games
            .get(&game_id.to_lowercase())
            .ok_or_else(|| error::game_not_found(game_id).with_operation("games::get"))
    }

    /// Open an engine for a game
    pub fn open_engine(&self, game_id: &str) -> Result<Box<dyn GameEngine>> {
        let info = self.get(game_id)?;
        for factory in &self.factories {
            if factory.supports(info) {
                return factory.open(info);
            }
        }
        Err(error::game_load_failed(&info.id, "no engine registered for this game source")
            .with_operation("games::open_engine"))
    }
}

impl std::fmt::Debug for GameLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLibrary")
            .field("games", &self.games.len())
            .field("factories", &self.factories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_builtins_always_present() {
        let library = GameLibrary::discover(None);
        assert!(library.get("zork1").is_ok());
        assert!(library.get("cloak").is_ok());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let library = GameLibrary::discover(None);
        assert!(library.get("ZORK1").is_ok());
    }

    #[test]
    fn test_unknown_game() {
        let library = GameLibrary::discover(None);
        let err = library.get("trinity").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GameNotFound);
    }

    #[test]
    fn test_discovers_story_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Advent.z5"), b"not a real story file").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let library = GameLibrary::discover(Some(dir.path()));
        let info = library.get("advent").unwrap();
        assert!(matches!(info.source, GameSource::File(_)));
        assert!(library.get("notes").is_err());
    }

    #[test]
    fn test_list_respects_limit() {
        let library = GameLibrary::discover(None);
        assert_eq!(library.list(1).len(), 1);
        assert_eq!(library.list(0).len(), library.len());
    }

    #[test]
    fn test_open_builtin_engine() {
        let library = GameLibrary::discover(None);
        let mut engine = library.open_engine("zork1").unwrap();
        let outcome = engine.reset().unwrap();
        assert!(outcome.text.contains("West of House"));
    }

    #[test]
    fn test_story_file_without_interpreter_fails_to_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("advent.z5"), b"bytes").unwrap();
        let library = GameLibrary::discover(Some(dir.path()));
        let err = library.open_engine("advent").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::GameLoadFailed);
    }
}
