//! Turn coordination between the human and the automated opponent.
//!
//! The coordinator owns the game session and is the only writer to it.
//! Every transition goes through [`TurnCoordinator::dispatch`]. Oracle calls
//! run on spawned tasks and report back over a channel; each reply is tagged
//! with the session and ticket that issued it and is dropped unless both
//! still match the outstanding request.
//!
//! Spawned work runs on the tokio runtime captured when the coordinator is
//! built, so the synchronous entry points may be called from any thread.

use crate::fallback::{FallbackSelector, RandomFallback};
use crate::games::chess::{
    IllegalMoveError, Move, Position, Provenance, Side, Verdict, classify, rules,
};
use crate::history::{GameRecord, NullResultSink, ResultSink};
use crate::oracle::{OracleClient, OracleRequest, OracleResponse};
use crate::session::{GameSession, PlayedMove, SessionId};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Where the game stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum TurnState {
    /// Waiting for the human to submit a move.
    AwaitingHumanMove,
    /// The automated side is to move; at most one oracle request is out.
    RequestingOracleMove,
    /// A move is being applied and classified.
    ApplyingMove,
    /// A verdict was reached; only a reset leaves this state.
    GameOver(Verdict),
}

/// Why the automated side played a move the oracle did not choose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The oracle failed or timed out.
    OracleFailed(String),
    /// The oracle named a move that was not usable.
    InvalidSuggestion(Option<String>),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A new session began.
    SessionStarted {
        /// New session.
        session: SessionId,
        /// Side played by the human.
        human_side: Side,
    },
    /// The automated side is thinking.
    OracleThinking {
        /// Session asking.
        session: SessionId,
    },
    /// The automated side played a move of its own choosing.
    AlternativeMove {
        /// Session concerned.
        session: SessionId,
        /// What went wrong with the oracle.
        reason: FallbackReason,
    },
    /// A move was applied.
    MovePlayed {
        /// Session concerned.
        session: SessionId,
        /// The applied move.
        played: PlayedMove,
    },
    /// The game ended.
    GameOver {
        /// Session concerned.
        session: SessionId,
        /// Terminal verdict.
        verdict: Verdict,
    },
}

/// Errors surfaced to the caller of a human move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CoordinatorError {
    /// The human moved while the automated side is to move.
    #[display("Not your turn: waiting for the {} side", _0)]
    NotYourTurn(Side),
    /// The rules engine refused the move.
    #[display("Illegal move: {}", _0)]
    IllegalMove(IllegalMoveError),
    /// The game already has a verdict.
    #[display("Game is already over: {}", _0)]
    GameOver(Verdict),
    /// No tokio runtime was available to run oracle calls on.
    #[display("No tokio runtime: build inside a runtime or pass a handle")]
    NoRuntime,
}

impl std::error::Error for CoordinatorError {}

impl From<IllegalMoveError> for CoordinatorError {
    fn from(err: IllegalMoveError) -> Self {
        Self::IllegalMove(err)
    }
}

/// A finished oracle call, tagged with who asked.
#[derive(Debug)]
pub struct OracleReply {
    session: SessionId,
    ticket: u64,
    request: OracleRequest,
    response: OracleResponse,
}

/// Inputs to the state machine.
#[derive(Debug)]
pub enum Command {
    /// The human submits a move.
    HumanMove(Move),
    /// Issue an oracle request if one is due and none is outstanding.
    TriggerOracle,
    /// An oracle call completed.
    OracleReply(OracleReply),
    /// Abandon the current session and start another.
    Reset {
        /// Side the human plays in the new session.
        human_side: Side,
        /// Starting position.
        start: Position,
    },
}

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A move was applied; see [`TurnCoordinator::state`] for what follows.
    Applied(PlayedMove),
    /// An oracle request was issued.
    OracleIssued,
    /// Nothing to do: a request is already out or it is not the oracle's turn.
    Ignored,
    /// A reply for a superseded session or request was dropped.
    StaleDiscarded,
    /// The game ended without a move being applied.
    Concluded(Verdict),
    /// A new session began.
    SessionStarted(SessionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRequest {
    session: SessionId,
    ticket: u64,
}

/// Builder for [`TurnCoordinator`].
pub struct TurnCoordinatorBuilder {
    client: OracleClient,
    fallback: Box<dyn FallbackSelector>,
    sink: Arc<dyn ResultSink>,
    events: Option<mpsc::UnboundedSender<GameEvent>>,
    human_side: Side,
    start: Position,
    runtime: Option<Handle>,
}

impl TurnCoordinatorBuilder {
    /// Sets the fallback selector (default: seeded from the OS, uniform random).
    pub fn fallback(mut self, fallback: Box<dyn FallbackSelector>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sets where finished games are recorded (default: discarded).
    pub fn sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the channel receiving [`GameEvent`]s.
    pub fn events(mut self, events: mpsc::UnboundedSender<GameEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Sets the side the human plays (default: first).
    pub fn human_side(mut self, side: Side) -> Self {
        self.human_side = side;
        self
    }

    /// Sets the starting position (default: standard start).
    pub fn start(mut self, start: Position) -> Self {
        self.start = start;
        self
    }

    /// Sets the runtime that oracle calls and result recording run on
    /// (default: the runtime `build` is called from).
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Starts the first session.
    ///
    /// Fails with [`CoordinatorError::NoRuntime`] when no handle was given
    /// and `build` is not called from within a tokio runtime.
    pub fn build(self) -> Result<TurnCoordinator, CoordinatorError> {
        let runtime = self
            .runtime
            .or_else(|| Handle::try_current().ok())
            .ok_or(CoordinatorError::NoRuntime)?;
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let session = GameSession::new(self.human_side, self.start.clone());
        let mut coordinator = TurnCoordinator {
            session,
            state: TurnState::AwaitingHumanMove,
            client: self.client,
            fallback: self.fallback,
            sink: self.sink,
            events: self.events,
            pending: None,
            next_ticket: 0,
            reply_tx,
            reply_rx,
            runtime,
        };
        coordinator.begin_session();
        Ok(coordinator)
    }
}

/// Race-free turn state machine for one client.
pub struct TurnCoordinator {
    session: GameSession,
    state: TurnState,
    client: OracleClient,
    fallback: Box<dyn FallbackSelector>,
    sink: Arc<dyn ResultSink>,
    events: Option<mpsc::UnboundedSender<GameEvent>>,
    pending: Option<PendingRequest>,
    next_ticket: u64,
    reply_tx: mpsc::UnboundedSender<OracleReply>,
    reply_rx: mpsc::UnboundedReceiver<OracleReply>,
    runtime: Handle,
}

impl std::fmt::Debug for TurnCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnCoordinator")
            .field("session", self.session.id())
            .field("state", &self.state)
            .field("oracle", &self.client.name())
            .field("fallback", &self.fallback.name())
            .field("pending", &self.pending)
            .finish()
    }
}

impl TurnCoordinator {
    /// Starts building a coordinator around an oracle client.
    pub fn builder(client: OracleClient) -> TurnCoordinatorBuilder {
        TurnCoordinatorBuilder {
            client,
            fallback: Box::new(RandomFallback::new()),
            sink: Arc::new(NullResultSink),
            events: None,
            human_side: Side::First,
            start: Position::new(),
            runtime: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Current session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Returns true while an oracle request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Submits a human move.
    pub fn submit_human_move(&mut self, mv: Move) -> Result<PlayedMove, CoordinatorError> {
        self.handle_human_move(mv)
    }

    /// Parses and submits a human move given in coordinate notation.
    pub fn submit_human_notation(
        &mut self,
        notation: &str,
    ) -> Result<PlayedMove, CoordinatorError> {
        self.check_human_turn()?;
        let mv = rules::parse_move(self.session.position(), notation.trim())?;
        self.submit_human_move(mv)
    }

    /// Issues an oracle request if one is due and none is outstanding.
    pub fn trigger_oracle(&mut self) -> Step {
        self.dispatch(Command::TriggerOracle)
            .unwrap_or(Step::Ignored)
    }

    /// Abandons the current session and starts a new one.
    ///
    /// Any reply still in flight for the old session is discarded on arrival.
    pub fn reset(&mut self, human_side: Side, start: Position) -> SessionId {
        match self.dispatch(Command::Reset { human_side, start }) {
            Ok(Step::SessionStarted(id)) => id,
            _ => *self.session.id(),
        }
    }

    /// Waits for the next oracle reply and dispatches it.
    ///
    /// Only call while a reply is expected (a request is pending, or a
    /// superseded one may still arrive); otherwise this waits forever.
    pub async fn next_reply(&mut self) -> Step {
        match self.reply_rx.recv().await {
            Some(reply) => self
                .dispatch(Command::OracleReply(reply))
                .unwrap_or(Step::Ignored),
            // The coordinator owns a sender, so the channel never closes.
            None => Step::Ignored,
        }
    }

    /// Processes oracle replies until no request is outstanding.
    ///
    /// Returns once it is the human's turn or the game is over.
    pub async fn settle(&mut self) {
        if self.state == TurnState::RequestingOracleMove && !self.is_pending() {
            self.trigger_oracle();
        }
        while self.is_pending() {
            self.next_reply().await;
        }
    }

    /// Single entry point for every state transition.
    #[instrument(skip(self), fields(session_id = %self.session.id(), state = %self.state))]
    pub fn dispatch(&mut self, command: Command) -> Result<Step, CoordinatorError> {
        match command {
            Command::Reset { human_side, start } => {
                if let Some(pending) = self.pending.take() {
                    debug!(
                        ticket = pending.ticket,
                        "Abandoning outstanding oracle request"
                    );
                }
                self.session = GameSession::new(human_side, start);
                Ok(self.begin_session())
            }
            Command::OracleReply(reply) => Ok(self.handle_reply(reply)),
            Command::TriggerOracle => Ok(self.issue_request()),
            Command::HumanMove(mv) => self.handle_human_move(mv).map(Step::Applied),
        }
    }

    /// Settles the initial state of a fresh session.
    fn begin_session(&mut self) -> Step {
        let id = *self.session.id();
        self.emit(GameEvent::SessionStarted {
            session: id,
            human_side: *self.session.human_side(),
        });

        if let Some(verdict) = classify(self.session.position(), self.session.history()) {
            self.conclude(verdict);
        } else {
            self.hand_turn_over();
        }
        Step::SessionStarted(id)
    }

    fn check_human_turn(&self) -> Result<(), CoordinatorError> {
        match self.state {
            TurnState::AwaitingHumanMove => Ok(()),
            TurnState::GameOver(verdict) => Err(CoordinatorError::GameOver(verdict)),
            TurnState::RequestingOracleMove | TurnState::ApplyingMove => {
                warn!("Human moved out of turn");
                Err(CoordinatorError::NotYourTurn(self.session.automated_side()))
            }
        }
    }

    #[instrument(skip(self, mv), fields(session_id = %self.session.id(), mv = %mv))]
    fn handle_human_move(&mut self, mv: Move) -> Result<PlayedMove, CoordinatorError> {
        self.check_human_turn()?;

        let next = rules::apply(self.session.position(), mv)?;
        let played = PlayedMove::new(*self.session.human_side(), mv, Provenance::Human);
        self.state = TurnState::ApplyingMove;
        self.commit(played, next);
        Ok(played)
    }

    fn issue_request(&mut self) -> Step {
        if self.state != TurnState::RequestingOracleMove {
            debug!("Oracle trigger ignored: not the oracle's turn");
            return Step::Ignored;
        }
        if let Some(pending) = self.pending {
            debug!(
                ticket = pending.ticket,
                "Oracle trigger ignored: request outstanding"
            );
            return Step::Ignored;
        }

        let request = OracleRequest::for_position(self.session.position());
        if request.legal_moves().is_empty() {
            info!("No legal moves for the automated side, skipping oracle");
            return self.conclude_without_move();
        }

        self.next_ticket += 1;
        let pending = PendingRequest {
            session: *self.session.id(),
            ticket: self.next_ticket,
        };
        self.pending = Some(pending);
        self.emit(GameEvent::OracleThinking {
            session: pending.session,
        });

        let client = self.client.clone();
        let replies = self.reply_tx.clone();
        self.runtime.spawn(async move {
            let response = client.request_move(&request).await;
            let reply = OracleReply {
                session: pending.session,
                ticket: pending.ticket,
                request,
                response,
            };
            if replies.send(reply).is_err() {
                debug!("Coordinator gone, dropping oracle reply");
            }
        });

        info!(ticket = pending.ticket, oracle = %self.client.name(), "Oracle request issued");
        Step::OracleIssued
    }

    fn handle_reply(&mut self, reply: OracleReply) -> Step {
        let tag = PendingRequest {
            session: reply.session,
            ticket: reply.ticket,
        };
        if reply.session != *self.session.id() || self.pending != Some(tag) {
            debug!(
                reply_session = %reply.session,
                ticket = reply.ticket,
                "Discarding stale oracle response"
            );
            return Step::StaleDiscarded;
        }
        self.pending = None;

        if reply.request.position() != self.session.position() {
            warn!("Oracle reply answers a different position, discarding");
            return self.issue_request();
        }

        let (mv, provenance) = match reply.response {
            OracleResponse::Success(mv) => (mv, Provenance::Oracle),
            OracleResponse::NoLegalMoves => return self.conclude_without_move(),
            OracleResponse::InvalidSuggestion { suggestion } => {
                warn!(?suggestion, "Oracle suggestion rejected, using fallback");
                match self.fallback_move(FallbackReason::InvalidSuggestion(suggestion)) {
                    Some(mv) => (mv, Provenance::Fallback),
                    None => return self.conclude_without_move(),
                }
            }
            OracleResponse::Failure(error) => {
                warn!(error = %error, "Oracle failed, using fallback");
                match self.fallback_move(FallbackReason::OracleFailed(error.kind.to_string())) {
                    Some(mv) => (mv, Provenance::Fallback),
                    None => return self.conclude_without_move(),
                }
            }
        };

        self.state = TurnState::ApplyingMove;
        let next = match rules::apply(self.session.position(), mv) {
            Ok(next) => next,
            Err(e) => {
                warn!(error = %e, "Automated move failed re-validation, using fallback");
                let retry = self
                    .fallback_move(FallbackReason::InvalidSuggestion(Some(mv.to_string())))
                    .and_then(|alt| {
                        rules::apply(self.session.position(), alt)
                            .ok()
                            .map(|n| (alt, n))
                    });
                match retry {
                    Some((alt, next)) => {
                        let played = PlayedMove::new(
                            self.session.automated_side(),
                            alt,
                            Provenance::Fallback,
                        );
                        self.commit(played, next);
                        return Step::Applied(played);
                    }
                    None => return self.conclude_without_move(),
                }
            }
        };

        let played = PlayedMove::new(self.session.automated_side(), mv, provenance);
        self.commit(played, next);
        Step::Applied(played)
    }

    fn fallback_move(&mut self, reason: FallbackReason) -> Option<Move> {
        let legal = rules::legal_moves(self.session.position());
        if legal.is_empty() {
            return None;
        }
        let mv = self.fallback.pick_move(self.session.position(), &legal)?;
        info!(%mv, fallback = %self.fallback.name(), "Fallback move chosen");
        self.emit(GameEvent::AlternativeMove {
            session: *self.session.id(),
            reason,
        });
        Some(mv)
    }

    /// Records an applied move and moves to the next state.
    fn commit(&mut self, played: PlayedMove, next: Position) {
        self.session.record(played, next);
        info!(
            mv = %played.mv(),
            side = %played.side(),
            provenance = %played.provenance(),
            "Move applied"
        );
        self.emit(GameEvent::MovePlayed {
            session: *self.session.id(),
            played,
        });

        match classify(self.session.position(), self.session.history()) {
            Some(verdict) => self.conclude(verdict),
            None => self.hand_turn_over(),
        }
    }

    /// Enters the state for whoever is to move, issuing a request if needed.
    fn hand_turn_over(&mut self) {
        if self.session.is_human_turn() {
            self.state = TurnState::AwaitingHumanMove;
        } else {
            self.state = TurnState::RequestingOracleMove;
            self.issue_request();
        }
    }

    /// Ends a turn whose side to move has no legal moves.
    fn conclude_without_move(&mut self) -> Step {
        let position = self.session.position();
        let verdict = if rules::is_check(position) {
            Verdict::Checkmate {
                winner: position.side_to_move().opponent(),
            }
        } else {
            Verdict::Stalemate
        };
        self.conclude(verdict);
        Step::Concluded(verdict)
    }

    fn conclude(&mut self, verdict: Verdict) {
        self.session.conclude(verdict);
        self.state = TurnState::GameOver(verdict);
        self.emit(GameEvent::GameOver {
            session: *self.session.id(),
            verdict,
        });

        if let Some(record) = GameRecord::from_session(&self.session) {
            let sink = Arc::clone(&self.sink);
            self.runtime.spawn(async move {
                if let Err(e) = sink.record(&record).await {
                    warn!(error = %e, "Failed to store game record");
                }
            });
        }
    }

    fn emit(&self, event: GameEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            debug!("Event receiver dropped");
        }
    }
}
