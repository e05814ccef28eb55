//! [`GameBackend`] over the service's JSON API.

use serde_json::{json, Value};

use super::wire::{self, routes};
use super::{AutomatedMatch, BackendError, BackendResult, GameBackend};
use crate::core::{Board, Cell, Difficulty, Simulation};
use crate::experiments::ExperimentResults;

/// HTTP-style method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A request to the service. `body` is `None` for `GET`.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    pub route: &'static str,
    pub body: Option<Value>,
}

impl Request {
    /// Build a `GET` request.
    #[must_use]
    pub fn get(route: &'static str) -> Self {
        Self {
            method: Method::Get,
            route,
            body: None,
        }
    }

    /// Build a `POST` request.
    #[must_use]
    pub fn post(route: &'static str, body: Value) -> Self {
        Self {
            method: Method::Post,
            route,
            body: Some(body),
        }
    }
}

/// Delivers a request and returns the decoded JSON body.
///
/// Error statuses should still return their `{"error": ...}` body; only
/// failures to obtain any body are [`BackendError::Transport`].
pub trait Transport {
    fn send(&mut self, request: Request) -> BackendResult<Value>;
}

impl<F> Transport for F
where
    F: FnMut(Request) -> BackendResult<Value>,
{
    fn send(&mut self, request: Request) -> BackendResult<Value> {
        self(request)
    }
}

/// JSON client for the decision service.
#[derive(Debug)]
pub struct JsonBackend<T> {
    transport: T,
}

impl<T: Transport> JsonBackend<T> {
    /// Create a client over `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Recover the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn exchange<R: serde::de::DeserializeOwned>(
        &mut self,
        operation: &'static str,
        request: Request,
    ) -> BackendResult<R> {
        log::debug!("{} {}", request.method, request.route);
        let body = self.transport.send(request)?;
        wire::decode(operation, body)
    }
}

impl<T: Transport> GameBackend for JsonBackend<T> {
    fn initialize_board(&mut self) -> BackendResult<Board> {
        let response: wire::StartResponse =
            self.exchange("initialize_board", Request::post(routes::START, json!({})))?;
        Board::from_rows(&response.matrix)
            .map_err(|err| BackendError::malformed("initialize_board", err.to_string()))
    }

    fn request_automated_match(&mut self) -> BackendResult<AutomatedMatch> {
        let operation = "request_automated_match";
        let response: wire::AutomatedMatchResponse =
            self.exchange(operation, Request::post(routes::AUTOMATED_MATCH, json!({})))?;
        let simulation = wire::into_simulation(response.simulation)
            .map_err(|err| BackendError::malformed(operation, err.to_string()))?;
        Ok(AutomatedMatch {
            simulation,
            report: response.report,
        })
    }

    fn request_machine_move(&mut self) -> BackendResult<Simulation> {
        let operation = "request_machine_move";
        let response: wire::SimulationResponse =
            self.exchange(operation, Request::get(routes::MACHINE_TURN))?;
        wire::into_simulation(response.simulation)
            .map_err(|err| BackendError::malformed(operation, err.to_string()))
    }

    fn submit_human_move(&mut self, cell: Cell) -> BackendResult<Simulation> {
        let operation = "submit_human_move";
        let body = wire::encode(
            operation,
            &wire::HumanMoveRequest {
                row: cell.row,
                col: cell.col,
            },
        )?;
        let response: wire::SimulationResponse =
            self.exchange(operation, Request::post(routes::HUMAN_MOVE, body))?;
        wire::into_simulation(response.simulation)
            .map_err(|err| BackendError::malformed(operation, err.to_string()))
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) -> BackendResult<()> {
        let operation = "set_difficulty";
        let requested = i64::from(difficulty.search_depth());
        let body = wire::encode(
            operation,
            &wire::DifficultyRequest {
                difficulty: requested,
            },
        )?;
        let response: wire::DifficultyResponse =
            self.exchange(operation, Request::post(routes::UPDATE_DIFFICULTY, body))?;

        if response.difficulty != requested {
            return Err(BackendError::malformed(
                operation,
                format!(
                    "service confirmed difficulty {} instead of {}",
                    response.difficulty, requested
                ),
            ));
        }
        Ok(())
    }

    fn points_remaining(&mut self) -> BackendResult<bool> {
        let response: wire::PointsResponse =
            self.exchange("points_remaining", Request::get(routes::POINTS_REMAINING))?;
        Ok(response.quedan_puntos)
    }

    fn run_experiments(&mut self) -> BackendResult<ExperimentResults> {
        let operation = "run_experiments";
        let response: wire::ExperimentsResponse =
            self.exchange(operation, Request::get(routes::RUN_EXPERIMENTS))?;
        response
            .into_results()
            .map_err(|reason| BackendError::malformed(operation, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canned(body: Value) -> impl FnMut(Request) -> BackendResult<Value> {
        move |_| Ok(body.clone())
    }

    #[test]
    fn test_initialize_board() {
        let mut backend = JsonBackend::new(canned(json!({
            "matrix": [[12, 0], [0, 11]],
            "whiteHorsePoints": 0
        })));
        let board = backend.initialize_board().unwrap();
        assert_eq!(board.find_piece(), Some(Cell::new(0, 0)));
    }

    #[test]
    fn test_initialize_board_without_matrix() {
        let mut backend = JsonBackend::new(canned(json!({"whiteHorsePoints": 0})));
        assert!(matches!(
            backend.initialize_board(),
            Err(BackendError::Malformed {
                operation: "initialize_board",
                ..
            })
        ));
    }

    #[test]
    fn test_human_move_request_shape() {
        let mut seen = Vec::new();
        let transport = |request: Request| -> BackendResult<Value> {
            seen.push(request);
            Ok(json!({"simulation": []}))
        };
        let mut backend = JsonBackend::new(transport);
        let simulation = backend.submit_human_move(Cell::new(3, 5)).unwrap();
        drop(backend);

        assert!(simulation.is_empty());
        assert_eq!(
            seen,
            vec![Request::post(routes::HUMAN_MOVE, json!({"row": 3, "col": 5}))]
        );
    }

    #[test]
    fn test_set_difficulty_sends_depth() {
        let mut backend = JsonBackend::new(|request: Request| -> BackendResult<Value> {
            let depth = request.body.as_ref().and_then(|b| b["difficulty"].as_i64());
            Ok(json!({"message": "ok", "difficulty": depth}))
        });
        assert!(backend.set_difficulty(Difficulty::Expert).is_ok());
    }

    #[test]
    fn test_set_difficulty_mismatch() {
        let mut backend = JsonBackend::new(canned(json!({"difficulty": 2})));
        assert!(backend.set_difficulty(Difficulty::Expert).is_err());
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut backend = JsonBackend::new(|_: Request| -> BackendResult<Value> {
            Err(BackendError::Transport("connection refused".into()))
        });
        assert_eq!(
            backend.points_remaining(),
            Err(BackendError::Transport("connection refused".into()))
        );
    }

    #[test]
    fn test_error_body_rejected() {
        let mut backend = JsonBackend::new(canned(json!({"error": "juego no inicializado"})));
        assert!(matches!(
            backend.request_machine_move(),
            Err(BackendError::Rejected { .. })
        ));
    }
}
