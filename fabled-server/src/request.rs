//! # Tool surface
//!
//! The closed request/response vocabulary of the service. Every tool is one
//! enum variant with typed arguments, dispatched by an exhaustive match -
//! adding a tool means adding a variant, and the compiler finds every place
//! that must handle it. No string-keyed routing.

use fabled_core::{
    GameInfo, GameStateView, LocationGraph, ObjectId, RecentTurn, SessionSummary,
    VocabularyReport, WalkthroughReport, WorldObject, WorldObjectsView,
};
use fabled_error::Error;
use serde::{Deserialize, Serialize};

fn default_recent_count() -> usize {
    5
}

/// One inbound tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    /// List available games (`limit` 0 = all)
    ListGames {
        #[serde(default)]
        limit: usize,
    },
    /// Start a new session for a game
    CreateGameSession { game_id: String },
    /// Execute one command in the game
    GameStep { session_id: String, command: String },
    /// Current state without consuming a turn
    GetGameState { session_id: String },
    /// Candidate commands for the current state, optionally filtered by verb
    GetValidActions {
        session_id: String,
        #[serde(default)]
        filter: Option<Vec<String>>,
    },
    /// Objects and rooms in the current snapshot
    GetWorldObjects { session_id: String },
    /// Attributes and ownership of one object
    GetObjectDetails { session_id: String, object_id: ObjectId },
    /// The discovered location graph
    GetWorldMap { session_id: String },
    /// Parser dictionary grouped by part of speech
    GameVocabulary { session_id: String },
    /// Recent turns (`count` 0 = all)
    RecentHistory {
        session_id: String,
        #[serde(default = "default_recent_count")]
        count: usize,
    },
    /// Progress against the reference solution
    CompareToWalkthrough { session_id: String },
    /// Restart the game from the beginning
    ResetGame { session_id: String },
    /// Serialize the game state into a named slot
    SaveGameState { session_id: String, slot: String },
    /// Restore a named slot
    LoadGameState { session_id: String, slot: String },
    /// End the session and release its engine
    CloseGameSession { session_id: String },
}

impl ToolRequest {
    /// Tool name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::ListGames { .. } => "list_games",
            ToolRequest::CreateGameSession { .. } => "create_game_session",
            ToolRequest::GameStep { .. } => "game_step",
            ToolRequest::GetGameState { .. } => "get_game_state",
            ToolRequest::GetValidActions { .. } => "get_valid_actions",
            ToolRequest::GetWorldObjects { .. } => "get_world_objects",
            ToolRequest::GetObjectDetails { .. } => "get_object_details",
            ToolRequest::GetWorldMap { .. } => "get_world_map",
            ToolRequest::GameVocabulary { .. } => "game_vocabulary",
            ToolRequest::RecentHistory { .. } => "recent_history",
            ToolRequest::CompareToWalkthrough { .. } => "compare_to_walkthrough",
            ToolRequest::ResetGame { .. } => "reset_game",
            ToolRequest::SaveGameState { .. } => "save_game_state",
            ToolRequest::LoadGameState { .. } => "load_game_state",
            ToolRequest::CloseGameSession { .. } => "close_game_session",
        }
    }
}

/// One tool call's result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ToolResponse {
    Games {
        games: Vec<GameInfo>,
        total_available: usize,
        showing: usize,
    },
    SessionCreated {
        session_id: String,
        game_id: String,
        text: String,
        score: i32,
        max_score: i32,
        moves: u32,
    },
    Step {
        session_id: String,
        text: String,
        score: i32,
        max_score: i32,
        moves: u32,
        reward: i32,
        valid: bool,
        game_over: bool,
        revisited_state: bool,
        milestones_reached: Vec<u8>,
        progress: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    GameState {
        state: GameStateView,
        progress: String,
    },
    Actions {
        actions: Vec<String>,
        count: usize,
    },
    WorldObjects {
        world: WorldObjectsView,
    },
    ObjectDetails {
        object: WorldObject,
    },
    WorldMap {
        map: LocationGraph,
    },
    Vocabulary {
        vocabulary: VocabularyReport,
    },
    History {
        recent: Vec<RecentTurn>,
        showing: usize,
        total_moves: usize,
    },
    Walkthrough {
        report: WalkthroughReport,
    },
    Observation {
        session_id: String,
        text: String,
        score: i32,
        moves: u32,
    },
    Saved {
        session_id: String,
        slot: String,
        size: usize,
    },
    Closed {
        summary: SessionSummary,
    },
}

/// Structured error surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    pub error: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&Error> for ToolError {
    fn from(err: &Error) -> Self {
        Self {
            error: err.kind().to_string(),
            message: err.message().to_string(),
            retryable: err.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = ToolRequest::GameStep {
            session_id: "sess_0".to_string(),
            command: "open mailbox".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tool"], "game_step");
        assert_eq!(json["session_id"], "sess_0");
        assert_eq!(json["command"], "open mailbox");

        let parsed: ToolRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn test_request_defaults() {
        let parsed: ToolRequest = serde_json::from_str(r#"{"tool": "list_games"}"#).unwrap();
        assert_eq!(parsed, ToolRequest::ListGames { limit: 0 });

        let parsed: ToolRequest =
            serde_json::from_str(r#"{"tool": "recent_history", "session_id": "s"}"#).unwrap();
        assert_eq!(parsed, ToolRequest::RecentHistory { session_id: "s".to_string(), count: 5 });
    }

    #[test]
    fn test_unknown_tool_is_rejected() {
        let result: Result<ToolRequest, _> =
            serde_json::from_str(r#"{"tool": "cast_fireball"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_tool_names() {
        let request = ToolRequest::CompareToWalkthrough { session_id: "s".to_string() };
        assert_eq!(request.name(), "compare_to_walkthrough");
    }

    #[test]
    fn test_tool_error_from_error() {
        let err = fabled_error::Error::timeout("engine busy");
        let tool_err = ToolError::from(&err);
        assert_eq!(tool_err.error, "Timeout");
        assert!(tool_err.retryable);
    }
}
