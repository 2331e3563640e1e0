//! # Game service
//!
//! Dispatches tool calls onto the session registry - one handler per request
//! variant, matched exhaustively. The service also owns the cross-cutting
//! response dressing the agent relies on: progress strings, revisit warnings,
//! and milestone callouts.

use crate::request::{ToolRequest, ToolResponse};
use fabled_core::{RegistryHealth, SessionRegistry, StepOutcome, StepReport};
use fabled_error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default idle expiry, matching one hour of inactivity
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Health endpoint payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub registry: RegistryHealth,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// The tool-call service
pub struct GameService {
    registry: SessionRegistry,
    idle_timeout: Duration,
}

impl GameService {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry, idle_timeout: DEFAULT_IDLE_TIMEOUT }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handle one tool call
    pub async fn handle(&self, request: ToolRequest) -> Result<ToolResponse> {
        // Inactive sessions are swept opportunistically, before every call
        let expired = self.registry.expire_idle(self.idle_timeout).await;
        if expired > 0 {
            tracing::debug!(expired, "idle sessions expired");
        }
        tracing::debug!(tool = request.name(), "tool call");

        match request {
            ToolRequest::ListGames { limit } => self.list_games(limit),
            ToolRequest::CreateGameSession { game_id } => self.create_session(&game_id).await,
            ToolRequest::GameStep { session_id, command } => {
                self.game_step(&session_id, &command).await
            }
            ToolRequest::GetGameState { session_id } => self.get_game_state(&session_id).await,
            ToolRequest::GetValidActions { session_id, filter } => {
                self.get_valid_actions(&session_id, filter).await
            }
            ToolRequest::GetWorldObjects { session_id } => {
                self.get_world_objects(&session_id).await
            }
            ToolRequest::GetObjectDetails { session_id, object_id } => {
                self.get_object_details(&session_id, object_id).await
            }
            ToolRequest::GetWorldMap { session_id } => self.get_world_map(&session_id).await,
            ToolRequest::GameVocabulary { session_id } => self.game_vocabulary(&session_id).await,
            ToolRequest::RecentHistory { session_id, count } => {
                self.recent_history(&session_id, count).await
            }
            ToolRequest::CompareToWalkthrough { session_id } => {
                self.compare_to_walkthrough(&session_id).await
            }
            ToolRequest::ResetGame { session_id } => self.reset_game(&session_id).await,
            ToolRequest::SaveGameState { session_id, slot } => {
                self.save_game_state(&session_id, &slot).await
            }
            ToolRequest::LoadGameState { session_id, slot } => {
                self.load_game_state(&session_id, &slot).await
            }
            ToolRequest::CloseGameSession { session_id } => self.close_session(&session_id).await,
        }
    }

    pub async fn health(&self) -> HealthReport {
        let registry = self.registry.health().await;
        let status = if registry.failed { "degraded" } else { "healthy" };
        HealthReport { status: status.to_string(), registry }
    }

    // ------------------------------------------------------------------
    // Handlers, one per tool
    // ------------------------------------------------------------------

    fn list_games(&self, limit: usize) -> Result<ToolResponse> {
        let games = self.registry.library().list(limit);
        Ok(ToolResponse::Games {
            total_available: self.registry.library().len(),
            showing: games.len(),
            games,
        })
    }

    async fn create_session(&self, game_id: &str) -> Result<ToolResponse> {
        let (session, opening) = self.registry.create(game_id).await?;
        Ok(ToolResponse::SessionCreated {
            session_id: session.id().to_string(),
            game_id: session.game_id().to_string(),
            text: opening.text,
            score: opening.score,
            max_score: session.max_score(),
            moves: opening.moves,
        })
    }

    async fn game_step(&self, session_id: &str, command: &str) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        let report = session.step(command).await?;
        let max_score = session.max_score();
        let message = step_message(&report, max_score);
        let StepReport { outcome, valid, revisited, milestones, .. } = report;
        Ok(ToolResponse::Step {
            session_id: session_id.to_string(),
            progress: progress_string(outcome.score, max_score),
            text: outcome.text,
            score: outcome.score,
            max_score,
            moves: outcome.moves,
            reward: outcome.reward,
            valid,
            game_over: outcome.game_over,
            revisited_state: revisited,
            milestones_reached: milestones,
            message,
        })
    }

    async fn get_game_state(&self, session_id: &str) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        let state = session.game_state();
        Ok(ToolResponse::GameState {
            progress: progress_string(state.score, state.max_score),
            state,
        })
    }

    async fn get_valid_actions(
        &self,
        session_id: &str,
        filter: Option<Vec<String>>,
    ) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        let actions = session.valid_actions(filter.as_deref());
        Ok(ToolResponse::Actions { count: actions.len(), actions })
    }

    async fn get_world_objects(&self, session_id: &str) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        Ok(ToolResponse::WorldObjects { world: session.world_objects() })
    }

    async fn get_object_details(
        &self,
        session_id: &str,
        object_id: fabled_core::ObjectId,
    ) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        Ok(ToolResponse::ObjectDetails { object: session.object_details(object_id)? })
    }

    async fn get_world_map(&self, session_id: &str) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        Ok(ToolResponse::WorldMap { map: session.location_graph() })
    }

    async fn game_vocabulary(&self, session_id: &str) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        Ok(ToolResponse::Vocabulary { vocabulary: session.vocabulary_report() })
    }

    async fn recent_history(&self, session_id: &str, count: usize) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        let (recent, total_moves) = session.recent_history(count);
        Ok(ToolResponse::History { showing: recent.len(), recent, total_moves })
    }

    async fn compare_to_walkthrough(&self, session_id: &str) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        Ok(ToolResponse::Walkthrough { report: session.compare_walkthrough() })
    }

    async fn reset_game(&self, session_id: &str) -> Result<ToolResponse> {
        let outcome = self.registry.reset(session_id).await?;
        Ok(observation(session_id, outcome))
    }

    async fn save_game_state(&self, session_id: &str, slot: &str) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        let meta = session.save(slot).await?;
        Ok(ToolResponse::Saved {
            session_id: session_id.to_string(),
            slot: meta.slot,
            size: meta.size,
        })
    }

    async fn load_game_state(&self, session_id: &str, slot: &str) -> Result<ToolResponse> {
        let session = self.registry.get(session_id).await?;
        let outcome = session.load(slot).await?;
        Ok(observation(session_id, outcome))
    }

    async fn close_session(&self, session_id: &str) -> Result<ToolResponse> {
        let summary = self.registry.close(session_id).await?;
        Ok(ToolResponse::Closed { summary })
    }
}

fn observation(session_id: &str, outcome: StepOutcome) -> ToolResponse {
    ToolResponse::Observation {
        session_id: session_id.to_string(),
        text: outcome.text,
        score: outcome.score,
        moves: outcome.moves,
    }
}

fn progress_string(score: i32, max_score: i32) -> String {
    if max_score > 0 {
        let pct = (score as f64 / max_score as f64 * 100.0).round() as i64;
        format!("{}/{} ({}%)", score, max_score, pct)
    } else {
        format!("{} points", score)
    }
}

/// Assemble the advisory message for a step response: score changes, game
/// end, loop warnings, milestone callouts. Absent when nothing noteworthy
/// happened.
fn step_message(report: &StepReport, max_score: i32) -> Option<String> {
    let mut parts = Vec::new();
    let outcome = &report.outcome;

    if outcome.game_over {
        if max_score > 0 && outcome.score >= max_score {
            parts.push(format!("You won! Final score: {}/{}.", outcome.score, max_score));
        } else {
            parts.push(format!(
                "Game over. Score: {}/{}. Reset to try again.",
                outcome.score, max_score
            ));
        }
    } else if outcome.reward > 0 {
        parts.push(format!("+{} points.", outcome.reward));
    } else if outcome.reward < 0 {
        parts.push(format!("{} points.", outcome.reward));
    }

    if report.revisited {
        parts.push(
            "You have returned to a previously visited state; you may be going in circles."
                .to_string(),
        );
    }

    for milestone in &report.milestones {
        parts.push(format!("Milestone reached: {}% completion!", milestone));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabled_core::{ErrorKind, GameLibrary, WalkthroughReport};

    fn service() -> GameService {
        GameService::new(SessionRegistry::new(GameLibrary::discover(None)))
    }

    async fn create(service: &GameService, game: &str) -> String {
        match service
            .handle(ToolRequest::CreateGameSession { game_id: game.to_string() })
            .await
            .unwrap()
        {
            ToolResponse::SessionCreated { session_id, .. } => session_id,
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_games() {
        let service = service();
        let response = service.handle(ToolRequest::ListGames { limit: 0 }).await.unwrap();
        match response {
            ToolResponse::Games { games, total_available, showing } => {
                assert_eq!(total_available, showing);
                assert!(games.iter().any(|g| g.id == "zork1"));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mailbox_scenario_end_to_end() {
        let service = service();
        let session_id = create(&service, "zork1").await;

        let response = service
            .handle(ToolRequest::GameStep {
                session_id: session_id.clone(),
                command: "open mailbox".to_string(),
            })
            .await
            .unwrap();
        match response {
            ToolResponse::Step { valid, text, .. } => {
                assert!(valid);
                assert!(text.contains("leaflet"));
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let response = service
            .handle(ToolRequest::GetWorldObjects { session_id: session_id.clone() })
            .await
            .unwrap();
        match response {
            ToolResponse::WorldObjects { world } => {
                let mailbox =
                    world.objects.iter().find(|o| o.name == "small mailbox").unwrap();
                assert!(mailbox.has(fabled_core::Attribute::Open));
                let leaflet = world.objects.iter().find(|o| o.name == "leaflet").unwrap();
                assert_eq!(leaflet.owner, fabled_core::Owner::Object(mailbox.id));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_step_message_carries_reward_and_milestones() {
        let service = service();
        let session_id = create(&service, "zork1").await;
        service
            .handle(ToolRequest::GameStep {
                session_id: session_id.clone(),
                command: "open mailbox".to_string(),
            })
            .await
            .unwrap();

        let response = service
            .handle(ToolRequest::GameStep {
                session_id: session_id.clone(),
                command: "take leaflet".to_string(),
            })
            .await
            .unwrap();
        match response {
            ToolResponse::Step { reward, milestones_reached, message, progress, .. } => {
                assert_eq!(reward, 5);
                assert_eq!(milestones_reached, vec![25, 50]);
                assert_eq!(progress, "5/10 (50%)");
                let message = message.unwrap();
                assert!(message.contains("+5 points"));
                assert!(message.contains("50% completion"));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_actions_filter() {
        let service = service();
        let session_id = create(&service, "zork1").await;
        let response = service
            .handle(ToolRequest::GetValidActions {
                session_id,
                filter: Some(vec!["open".to_string()]),
            })
            .await
            .unwrap();
        match response {
            ToolResponse::Actions { actions, count } => {
                assert_eq!(actions.len(), count);
                assert!(actions.contains(&"open small mailbox".to_string()));
                assert!(actions.iter().all(|a| a.starts_with("open ")));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_session_is_structured_error() {
        let service = service();
        let err = service
            .handle(ToolRequest::GetGameState { session_id: "sess_missing".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }

    #[tokio::test]
    async fn test_save_load_through_tools() {
        let service = service();
        let session_id = create(&service, "zork1").await;
        service
            .handle(ToolRequest::GameStep {
                session_id: session_id.clone(),
                command: "open mailbox".to_string(),
            })
            .await
            .unwrap();

        let response = service
            .handle(ToolRequest::SaveGameState {
                session_id: session_id.clone(),
                slot: "auto".to_string(),
            })
            .await
            .unwrap();
        match response {
            ToolResponse::Saved { slot, size, .. } => {
                assert_eq!(slot, "auto");
                assert!(size > 0);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        service
            .handle(ToolRequest::GameStep {
                session_id: session_id.clone(),
                command: "close mailbox".to_string(),
            })
            .await
            .unwrap();

        let response = service
            .handle(ToolRequest::LoadGameState {
                session_id: session_id.clone(),
                slot: "auto".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(response, ToolResponse::Observation { .. }));

        // Mailbox open again after the restore
        let response = service
            .handle(ToolRequest::GetWorldObjects { session_id })
            .await
            .unwrap();
        match response {
            ToolResponse::WorldObjects { world } => {
                let mailbox =
                    world.objects.iter().find(|o| o.name == "small mailbox").unwrap();
                assert!(mailbox.has(fabled_core::Attribute::Open));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_walkthrough_tool() {
        let service = service();
        let session_id = create(&service, "zork1").await;
        service
            .handle(ToolRequest::GameStep {
                session_id: session_id.clone(),
                command: "open mailbox".to_string(),
            })
            .await
            .unwrap();

        let response = service
            .handle(ToolRequest::CompareToWalkthrough { session_id })
            .await
            .unwrap();
        match response {
            ToolResponse::Walkthrough { report } => {
                assert_eq!(report, WalkthroughReport::OnTrack { matched: 1, remaining: 3 });
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_then_health() {
        let service = service();
        let session_id = create(&service, "cloak").await;

        let health = service.health().await;
        assert!(health.is_healthy());
        assert_eq!(
            health.registry.active_session.as_ref().unwrap().game_id,
            "cloak"
        );

        let response = service
            .handle(ToolRequest::CloseGameSession { session_id })
            .await
            .unwrap();
        match response {
            ToolResponse::Closed { summary } => assert_eq!(summary.game_id, "cloak"),
            other => panic!("unexpected response: {:?}", other),
        }

        let health = service.health().await;
        assert!(health.is_healthy());
        assert_eq!(health.registry.sessions, 0);
    }

    #[tokio::test]
    async fn test_vocabulary_and_history_tools() {
        let service = service();
        let session_id = create(&service, "zork1").await;
        service
            .handle(ToolRequest::GameStep {
                session_id: session_id.clone(),
                command: "look".to_string(),
            })
            .await
            .unwrap();

        let response = service
            .handle(ToolRequest::GameVocabulary { session_id: session_id.clone() })
            .await
            .unwrap();
        match response {
            ToolResponse::Vocabulary { vocabulary } => {
                assert!(vocabulary.verbs.contains(&"take".to_string()));
                assert!(vocabulary.nouns.contains(&"mailbox".to_string()));
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let response = service
            .handle(ToolRequest::RecentHistory { session_id, count: 5 })
            .await
            .unwrap();
        match response {
            ToolResponse::History { recent, showing, total_moves } => {
                assert_eq!(showing, 1);
                assert_eq!(total_moves, 1);
                assert_eq!(recent[0].command, "look");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
