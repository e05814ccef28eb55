//! The service's JSON API, served from a [`LocalBackend`].

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{LocalBackend, LocalConfig, Match};
use crate::backend::json::{Method, Request, Transport};
use crate::backend::policy::{GreedyPolicy, MovePolicy};
use crate::backend::wire::{self, routes};
use crate::backend::{BackendError, BackendResult, GameBackend};
use crate::core::{Cell, Difficulty};

/// Routes requests to a local backend and answers with the service's JSON.
///
/// Backend failures become `{"error": ...}` bodies, as the service sends
/// them. Only unknown routes fail at the transport level.
#[derive(Clone, Debug)]
pub struct LocalServer<P = GreedyPolicy> {
    backend: LocalBackend<P>,
}

impl LocalServer<GreedyPolicy> {
    /// Serve a fresh backend.
    #[must_use]
    pub fn new(config: LocalConfig) -> Self {
        Self::from_backend(LocalBackend::new(config))
    }
}

impl<P: MovePolicy> LocalServer<P> {
    /// Serve an existing backend.
    pub fn from_backend(backend: LocalBackend<P>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &LocalBackend<P> {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut LocalBackend<P> {
        &mut self.backend
    }

    fn route(&mut self, request: &Request) -> BackendResult<Value> {
        match (request.method, request.route) {
            (Method::Post, routes::START) => {
                let operation = "initialize_board";
                self.backend.initialize_board()?;
                let game = self
                    .backend
                    .game()
                    .ok_or_else(|| BackendError::rejected(operation, "no game"))?;
                wire::encode(operation, &game_state(game))
            }
            (Method::Post, routes::AUTOMATED_MATCH) => {
                let operation = "request_automated_match";
                let played = self.backend.request_automated_match()?;
                let response = wire::AutomatedMatchResponse {
                    simulation: wire::from_simulation(&played.simulation),
                    report: played.report,
                };
                wire::encode(operation, &response)
            }
            (Method::Get, routes::MACHINE_TURN) => {
                let simulation = self.backend.request_machine_move()?;
                let response = wire::SimulationResponse {
                    simulation: wire::from_simulation(&simulation),
                };
                wire::encode("request_machine_move", &response)
            }
            (Method::Post, routes::HUMAN_MOVE) => {
                let operation = "submit_human_move";
                let body: wire::HumanMoveRequest = parse_body(operation, request)?;
                let simulation = self.backend.submit_human_move(Cell::new(body.row, body.col))?;
                let response = wire::SimulationResponse {
                    simulation: wire::from_simulation(&simulation),
                };
                wire::encode(operation, &response)
            }
            (Method::Post, routes::UPDATE_DIFFICULTY) => {
                let operation = "set_difficulty";
                let body: wire::DifficultyRequest = parse_body(operation, request)?;
                let difficulty = u32::try_from(body.difficulty)
                    .ok()
                    .and_then(Difficulty::from_search_depth)
                    .ok_or_else(|| {
                        BackendError::rejected(operation, "difficulty must be a positive integer")
                    })?;
                self.backend.set_difficulty(difficulty)?;
                let response = wire::DifficultyResponse {
                    message: Some("difficulty updated".to_string()),
                    difficulty: body.difficulty,
                };
                wire::encode(operation, &response)
            }
            (Method::Get, routes::POINTS_REMAINING) => {
                let quedan_puntos = self.backend.points_remaining()?;
                wire::encode("points_remaining", &wire::PointsResponse { quedan_puntos })
            }
            (Method::Get, routes::RUN_EXPERIMENTS) => {
                let results = self.backend.run_experiments()?;
                wire::encode(
                    "run_experiments",
                    &wire::ExperimentsResponse::from_results(&results),
                )
            }
            (method, route) => Err(BackendError::Transport(format!(
                "no route for {} {}",
                method, route
            ))),
        }
    }
}

impl<P: MovePolicy> Transport for LocalServer<P> {
    fn send(&mut self, request: Request) -> BackendResult<Value> {
        match self.route(&request) {
            Ok(body) => Ok(body),
            Err(err @ BackendError::Transport(_)) => Err(err),
            Err(BackendError::Malformed { reason, .. } | BackendError::Rejected { reason, .. }) => {
                log::debug!("{} {} -> error: {}", request.method, request.route, reason);
                Ok(json!({ "error": reason }))
            }
        }
    }
}

/// Full game state, as `/api/start` returns it.
fn game_state(game: &Match) -> wire::WireFrame {
    let mut frame = wire::WireFrame::from_frame(&game.frame());
    frame.moves_count = Some(game.moves());
    frame.game_over = Some(game.is_over());
    frame.turn = Some(game.to_move().to_string());
    frame
}

fn parse_body<T: DeserializeOwned>(operation: &'static str, request: &Request) -> BackendResult<T> {
    let body = request
        .body
        .clone()
        .ok_or_else(|| BackendError::rejected(operation, "missing request body"))?;
    serde_json::from_value(body).map_err(|err| BackendError::rejected(operation, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> LocalServer {
        LocalServer::new(LocalConfig::new().with_games_per_matchup(1))
    }

    #[test]
    fn test_start_returns_game_state() {
        let mut server = server();
        let body = server.send(Request::post(routes::START, json!({}))).unwrap();

        assert_eq!(body["matrix"].as_array().map(Vec::len), Some(8));
        assert_eq!(body["turn"], json!("white"));
        assert_eq!(body["gameOver"], json!(false));
        assert_eq!(body["movesCount"], json!(0));
    }

    #[test]
    fn test_points_before_start_is_error_body() {
        let mut server = server();
        let body = server.send(Request::get(routes::POINTS_REMAINING)).unwrap();
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_update_difficulty() {
        let mut server = server();
        let body = server
            .send(Request::post(routes::UPDATE_DIFFICULTY, json!({"difficulty": 6})))
            .unwrap();
        assert_eq!(body["difficulty"], json!(6));
        assert_eq!(server.backend().difficulty(), Difficulty::Expert);

        let body = server
            .send(Request::post(routes::UPDATE_DIFFICULTY, json!({"difficulty": 0})))
            .unwrap();
        assert!(body["error"].is_string());

        let body = server
            .send(Request::post(routes::UPDATE_DIFFICULTY, json!({})))
            .unwrap();
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_unknown_route() {
        let mut server = server();
        let err = server.send(Request::get("/api/nope")).unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));

        // Right route, wrong method.
        assert!(server.send(Request::get(routes::START)).is_err());
    }

    #[test]
    fn test_machine_turn_wire_shape() {
        let mut server = server();
        server.send(Request::post(routes::START, json!({}))).unwrap();
        let body = server.send(Request::get(routes::MACHINE_TURN)).unwrap();

        let frames = body["simulation"].as_array().unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0]["whiteHorsePoints"].is_number());
        assert!(frames[1]["blackHorseMultiplier"].is_boolean());
    }
}
