use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::ExitPolicy,
    state::{
        board::Cell,
        game::{Game, Outcome, QuestionId, Scores, Team},
    },
};

/// Phases a playing session moves through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// The board is shown and the host may pick a cell.
    Idle,
    /// A board question is displayed.
    QuestionOpen(OpenQuestion),
    /// Every board question has been played.
    RoundComplete,
    /// Final wager round.
    Wager(WagerPhase),
    /// Session finished; terminal.
    GameOver(Outcome),
}

/// Question currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenQuestion {
    /// Question being played.
    pub question_id: QuestionId,
    /// Its board cell.
    pub cell: Cell,
    /// Points at stake.
    pub points: u32,
    /// Whether the answer is shown.
    pub revealed: bool,
    /// Seconds left before the answer shows itself, `None` without a timer.
    pub countdown: Option<u32>,
}

impl OpenQuestion {
    /// True while the countdown is still ticking towards an automatic reveal.
    pub fn countdown_running(&self) -> bool {
        !self.revealed && self.countdown.is_some_and(|seconds| seconds > 0)
    }
}

/// Sub-phase of the final wager round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WagerPhase {
    /// Teams are placing their wagers.
    Pending(Wagers),
    /// The wager question is displayed; wagers can no longer change.
    QuestionOpen {
        /// Wagers at stake.
        wagers: LockedWagers,
        /// Whether the answer is shown.
        revealed: bool,
    },
    /// Wagers were settled against the scores.
    Resolved(WagerResult),
}

/// Wagers placed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wagers {
    /// Wager of the first team.
    pub team_a: Option<u32>,
    /// Wager of the second team.
    pub team_b: Option<u32>,
}

impl Wagers {
    /// Wager of `team`, if placed.
    pub fn get(&self, team: Team) -> Option<u32> {
        match team {
            Team::A => self.team_a,
            Team::B => self.team_b,
        }
    }

    /// Copy with `team`'s wager replaced.
    pub fn with(mut self, team: Team, amount: u32) -> Self {
        match team {
            Team::A => self.team_a = Some(amount),
            Team::B => self.team_b = Some(amount),
        }
        self
    }

    /// Both wagers, once both teams have placed one.
    pub fn locked(&self) -> Option<LockedWagers> {
        Some(LockedWagers {
            team_a: self.team_a?,
            team_b: self.team_b?,
        })
    }
}

/// Wagers of both teams after the wager question opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedWagers {
    /// Wager of the first team.
    pub team_a: u32,
    /// Wager of the second team.
    pub team_b: u32,
}

impl LockedWagers {
    /// Wager of `team`.
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::A => self.team_a,
            Team::B => self.team_b,
        }
    }

    /// Scores once `outcome` is applied. The winner gains its wager, every
    /// other team loses its own, clamped at zero.
    pub fn settle(&self, scores: Scores, outcome: WagerOutcome) -> Scores {
        [Team::A, Team::B]
            .into_iter()
            .fold(scores, |scores, team| match outcome {
                WagerOutcome::Correct(winner) if winner == team => {
                    scores.awarded(team, self.get(team))
                }
                _ => scores.deducted(team, self.get(team)),
            })
    }
}

/// Host's ruling on the wager question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WagerOutcome {
    /// This team answered correctly.
    Correct(Team),
    /// Neither team answered correctly.
    BothWrong,
}

/// Settled wager round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WagerResult {
    /// Wagers that were at stake.
    pub wagers: LockedWagers,
    /// Host ruling.
    pub outcome: WagerOutcome,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Host picks a board cell.
    SelectCell(Cell),
    /// One second of the question countdown elapsed.
    Tick,
    /// Show the answer of the open question.
    Reveal,
    /// Team answered the open question correctly.
    Award(Team),
    /// Nobody answered the open question correctly.
    MarkWrong,
    /// Close the open question without playing it.
    ExitToBoard,
    /// Leave the round summary or the wager result.
    Advance,
    /// Team commits or changes its wager.
    PlaceWager {
        /// Wagering team.
        team: Team,
        /// Points wagered, at most the team's score.
        amount: u32,
    },
    /// Show the wager question once both wagers are in.
    OpenWagerQuestion,
    /// Host rules on the wager question.
    ResolveWager(WagerOutcome),
}

/// Persistence the session must perform before a plan may be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Nothing to persist.
    None,
    /// Store `scores` and flag the question as used, atomically.
    ScoreQuestion {
        /// Question to flag.
        question_id: QuestionId,
        /// Scores to store.
        scores: Scores,
    },
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Event fits the phase but the game data forbids it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The selected cell is empty.
    #[error("cell {0} holds no question")]
    EmptyCell(Cell),
    /// The selected question was played before.
    #[error("question at cell {0} was already played")]
    QuestionUsed(Cell),
    /// A wager may not exceed the team's score.
    #[error("wager of {amount} exceeds the score of {score} held by {team:?}")]
    WagerExceedsScore {
        /// Wagering team.
        team: Team,
        /// Requested wager.
        amount: u32,
        /// Score of the team.
        score: u32,
    },
    /// The wager question needs both wagers.
    #[error("both teams must place a wager first")]
    WagersIncomplete,
    /// The exit policy requires the answer to be shown first.
    #[error("the answer must be revealed before leaving the question")]
    ExitBeforeReveal,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
    /// The transition is valid for the phase but refused for this game.
    Rejected(Rejection),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Expected phase.
        expected: SessionPhase,
        /// Actual phase.
        actual: SessionPhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Expected version.
        expected: usize,
        /// Actual version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique plan identifier.
    pub id: PlanId,
    /// Phase before the transition.
    pub from: SessionPhase,
    /// Phase after the transition.
    pub to: SessionPhase,
    /// Event that triggered the transition.
    pub event: SessionEvent,
    /// Persistence required before the plan may be applied.
    pub effect: Effect,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// When the plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: SessionPhase,
    /// Incremented on each applied transition.
    pub version: usize,
    /// Target phase of a planned but not yet applied transition.
    pub pending: Option<SessionPhase>,
}

/// Gameplay flow of one session.
///
/// Transitions follow a plan / apply / abort protocol: [`plan`](Self::plan)
/// validates an event against the game and computes both the next phase and
/// the [`Effect`] to persist, the caller persists it and then either applies
/// or aborts the plan.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    version: usize,
    pending: Option<Plan>,
    exit_policy: ExitPolicy,
}

impl SessionStateMachine {
    /// Machine starting in `phase`.
    pub fn new(phase: SessionPhase, exit_policy: ExitPolicy) -> Self {
        Self {
            phase,
            version: 0,
            pending: None,
            exit_policy,
        }
    }

    /// Machine resuming `game` where its stored progress left off.
    pub fn for_game(game: &Game, exit_policy: ExitPolicy) -> Self {
        Self::new(initial_phase(game), exit_policy)
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase.clone()
    }

    /// Number of applied transitions.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Whether the open question's countdown is still running.
    pub fn countdown_running(&self) -> bool {
        matches!(&self.phase, SessionPhase::QuestionOpen(open) if open.countdown_running())
    }

    /// Current phase, version and pending target.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase.clone(),
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to.clone()),
        }
    }

    /// Validate `event` against the current phase and `game`, returning a plan
    /// that must later be applied or aborted.
    pub fn plan(&mut self, event: SessionEvent, game: &Game) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let (next, effect) = self.compute_transition(event.clone(), game)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase.clone(),
            to: next,
            event,
            effect,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, returning the new phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<SessionPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase.clone(),
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase.clone())
    }

    /// Drop a planned transition, leaving the phase untouched.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(
        &self,
        event: SessionEvent,
        game: &Game,
    ) -> Result<(SessionPhase, Effect), PlanError> {
        let transition = match (&self.phase, &event) {
            (SessionPhase::Idle, SessionEvent::SelectCell(cell)) => {
                let question = game
                    .board
                    .question_at(*cell)
                    .ok_or(PlanError::Rejected(Rejection::EmptyCell(*cell)))?;
                if question.used {
                    return Err(PlanError::Rejected(Rejection::QuestionUsed(*cell)));
                }
                let open = OpenQuestion {
                    question_id: question.id.clone(),
                    cell: *cell,
                    points: question.points,
                    revealed: false,
                    countdown: (game.question_timer_seconds > 0)
                        .then_some(game.question_timer_seconds),
                };
                (SessionPhase::QuestionOpen(open), Effect::None)
            }
            (SessionPhase::QuestionOpen(open), SessionEvent::Tick) if open.countdown_running() => {
                let remaining = open.countdown.unwrap_or_default().saturating_sub(1);
                let next = OpenQuestion {
                    revealed: remaining == 0,
                    countdown: Some(remaining),
                    ..open.clone()
                };
                (SessionPhase::QuestionOpen(next), Effect::None)
            }
            (SessionPhase::QuestionOpen(open), SessionEvent::Reveal) if !open.revealed => {
                let next = OpenQuestion {
                    revealed: true,
                    ..open.clone()
                };
                (SessionPhase::QuestionOpen(next), Effect::None)
            }
            (SessionPhase::QuestionOpen(open), SessionEvent::Award(team)) if open.revealed => {
                let scores = game.scores.awarded(*team, open.points);
                close_question(open, scores, game)
            }
            (SessionPhase::QuestionOpen(open), SessionEvent::MarkWrong) if open.revealed => {
                close_question(open, game.scores, game)
            }
            (SessionPhase::QuestionOpen(open), SessionEvent::ExitToBoard) => {
                if !open.revealed && self.exit_policy == ExitPolicy::AfterReveal {
                    return Err(PlanError::Rejected(Rejection::ExitBeforeReveal));
                }
                (SessionPhase::Idle, Effect::None)
            }
            (SessionPhase::RoundComplete, SessionEvent::Advance) => {
                let next = match &game.wager_question {
                    Some(wager) if !wager.used => {
                        SessionPhase::Wager(WagerPhase::Pending(Wagers::default()))
                    }
                    _ => SessionPhase::GameOver(game.scores.outcome()),
                };
                (next, Effect::None)
            }
            (
                SessionPhase::Wager(WagerPhase::Pending(wagers)),
                SessionEvent::PlaceWager { team, amount },
            ) => {
                let score = game.scores.get(*team);
                if *amount > score {
                    return Err(PlanError::Rejected(Rejection::WagerExceedsScore {
                        team: *team,
                        amount: *amount,
                        score,
                    }));
                }
                let next = wagers.with(*team, *amount);
                (SessionPhase::Wager(WagerPhase::Pending(next)), Effect::None)
            }
            (
                SessionPhase::Wager(WagerPhase::Pending(wagers)),
                SessionEvent::OpenWagerQuestion,
            ) => {
                let wagers = wagers
                    .locked()
                    .ok_or(PlanError::Rejected(Rejection::WagersIncomplete))?;
                let next = WagerPhase::QuestionOpen {
                    wagers,
                    revealed: false,
                };
                (SessionPhase::Wager(next), Effect::None)
            }
            (
                SessionPhase::Wager(WagerPhase::QuestionOpen {
                    wagers,
                    revealed: false,
                }),
                SessionEvent::Reveal,
            ) => {
                let next = WagerPhase::QuestionOpen {
                    wagers: *wagers,
                    revealed: true,
                };
                (SessionPhase::Wager(next), Effect::None)
            }
            (
                SessionPhase::Wager(WagerPhase::QuestionOpen {
                    wagers,
                    revealed: true,
                }),
                SessionEvent::ResolveWager(outcome),
            ) => match &game.wager_question {
                Some(wager) => {
                    let effect = Effect::ScoreQuestion {
                        question_id: wager.id.clone(),
                        scores: wagers.settle(game.scores, *outcome),
                    };
                    let result = WagerResult {
                        wagers: *wagers,
                        outcome: *outcome,
                    };
                    (SessionPhase::Wager(WagerPhase::Resolved(result)), effect)
                }
                None => return Err(self.invalid(event.clone())),
            },
            (SessionPhase::Wager(WagerPhase::Resolved(_)), SessionEvent::Advance) => {
                (SessionPhase::GameOver(game.scores.outcome()), Effect::None)
            }
            _ => return Err(self.invalid(event.clone())),
        };

        Ok(transition)
    }

    fn invalid(&self, event: SessionEvent) -> PlanError {
        PlanError::InvalidTransition(InvalidTransition {
            from: self.phase.clone(),
            event,
        })
    }
}

/// Where a session resumes: on the board while questions remain, otherwise at
/// the round summary, or over when the wager question was already played.
pub fn initial_phase(game: &Game) -> SessionPhase {
    if !game.board.is_exhausted() {
        return SessionPhase::Idle;
    }
    match &game.wager_question {
        Some(wager) if wager.used => SessionPhase::GameOver(game.scores.outcome()),
        _ => SessionPhase::RoundComplete,
    }
}

/// Leave a question after it was played: it becomes used and the board is
/// shown again unless it was the last one.
fn close_question(open: &OpenQuestion, scores: Scores, game: &Game) -> (SessionPhase, Effect) {
    let remaining = game
        .board
        .questions()
        .iter()
        .any(|question| !question.used && question.id != open.question_id);
    let next = if remaining {
        SessionPhase::Idle
    } else {
        SessionPhase::RoundComplete
    };
    let effect = Effect::ScoreQuestion {
        question_id: open.question_id.clone(),
        scores,
    };
    (next, effect)
}
