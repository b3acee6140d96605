use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, sleep_until},
};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::{
    dto::view::RoundView,
    error::EngineError,
    state::{
        content::{GameDefinition, Question},
        feedback::{FeedbackPulse, FeedbackSignaler},
        state_machine::{Advance, QuizStateMachine, Resolution, RoundError},
        timer::CountdownTimer,
    },
};

const COMMAND_CAPACITY: usize = 16;

/// Per-session pacing and reward settings resolved when the session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Pause between a resolved round and the next one.
    pub advance_delay: Duration,
    /// Points flashed for every correct answer.
    pub points_per_correct: u32,
}

enum Command {
    Start {
        reply: oneshot::Sender<Result<RoundView, EngineError>>,
    },
    Submit {
        option: usize,
        reply: oneshot::Sender<Result<Resolution, EngineError>>,
    },
    Retry {
        reply: oneshot::Sender<RoundView>,
    },
    Close,
}

/// Countdown signals tagged with the round epoch they were armed for.
#[derive(Debug, Clone, Copy)]
enum TimerSignal {
    Tick { epoch: u64, remaining: u32 },
    Expired { epoch: u64 },
}

/// Handle to a running game instance.
///
/// Every instance runs as its own task that serialises player intents, countdown signals and the
/// feedback delay. The task stops when [`close`](SessionHandle::close) is called or the last
/// handle is dropped, cancelling its countdown and any pending advance.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    game_id: String,
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<RoundView>,
}

impl SessionHandle {
    /// Spawn the session task for `game`. Must be called from within a Tokio runtime.
    pub fn spawn(game: Arc<GameDefinition>, settings: SessionSettings) -> Result<Self, EngineError> {
        let machine = QuizStateMachine::new(
            game.questions.clone(),
            game.mode.round_seconds(),
            settings.points_per_correct,
            game.pass_threshold,
        )?;
        let feedback = FeedbackSignaler::new();
        let (view_tx, view_rx) = watch::channel(RoundView::build(&game, &machine, &feedback));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let id = Uuid::new_v4();
        let handle = Self {
            id,
            game_id: game.id.clone(),
            commands: command_tx,
            view: view_rx,
        };

        let actor = SessionActor {
            id,
            game,
            machine,
            feedback,
            timer: CountdownTimer::new(),
            advance_delay: settings.advance_delay,
            advance_at: None,
            view_tx,
            signal_tx,
        };
        info!(session_id = %id, game_id = %handle.game_id, "session opened");
        tokio::spawn(actor.run(command_rx, signal_rx));

        Ok(handle)
    }

    /// Identifier of the session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Game played in this session.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Latest published read model.
    pub fn view(&self) -> RoundView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every published read model.
    pub fn subscribe(&self) -> watch::Receiver<RoundView> {
        self.view.clone()
    }

    /// Whether the session task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Press "Start" on a timed game.
    pub async fn start(&self) -> Result<RoundView, EngineError> {
        self.request(|reply| Command::Start { reply }).await?
    }

    /// Pick `option` for the current question.
    pub async fn submit_answer(&self, option: usize) -> Result<Resolution, EngineError> {
        self.request(|reply| Command::Submit { option, reply })
            .await?
    }

    /// Press "Try Again": the game returns to its initial state.
    pub async fn retry(&self) -> Result<RoundView, EngineError> {
        self.request(|reply| Command::Retry { reply }).await
    }

    /// Stop the session task.
    pub async fn close(&self) {
        let _ = self.commands.send(Command::Close).await;
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| EngineError::SessionClosed)?;
        reply_rx.await.map_err(|_| EngineError::SessionClosed)
    }
}

struct SessionActor {
    id: Uuid,
    game: Arc<GameDefinition>,
    machine: QuizStateMachine<Question>,
    feedback: FeedbackSignaler,
    timer: CountdownTimer,
    advance_delay: Duration,
    advance_at: Option<Instant>,
    view_tx: watch::Sender<RoundView>,
    signal_tx: mpsc::UnboundedSender<TimerSignal>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut signals: mpsc::UnboundedReceiver<TimerSignal>,
    ) {
        loop {
            let advance_at = self.advance_at;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Close) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(signal) = signals.recv() => self.handle_signal(signal),
                () = wait_until(advance_at), if advance_at.is_some() => self.advance(),
            }
        }

        self.timer.disarm();
        self.advance_at = None;
        info!(session_id = %self.id, game_id = %self.game.id, "session closed");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let result = match self.machine.start() {
                    Ok(()) => {
                        debug!(session_id = %self.id, "game started");
                        self.open_round();
                        Ok(self.view())
                    }
                    Err(err) => Err(self.reject("start", err)),
                };
                let _ = reply.send(result);
            }
            Command::Submit { option, reply } => {
                let result = match self.machine.submit_answer(option) {
                    Ok(Resolution::Resolved(pulse)) => {
                        self.resolve_round(pulse);
                        Ok(Resolution::Resolved(pulse))
                    }
                    Ok(Resolution::Ignored) => {
                        debug!(
                            session_id = %self.id,
                            option,
                            "answer ignored; round already resolved"
                        );
                        Ok(Resolution::Ignored)
                    }
                    Err(err) => Err(self.reject("submit_answer", err)),
                };
                let _ = reply.send(result);
            }
            Command::Retry { reply } => {
                self.timer.disarm();
                self.advance_at = None;
                self.machine.reset();
                self.feedback.reset();
                info!(session_id = %self.id, game_id = %self.game.id, "game reset for retry");
                self.publish();
                let _ = reply.send(self.view());
            }
            Command::Close => {}
        }
    }

    fn handle_signal(&mut self, signal: TimerSignal) {
        match signal {
            TimerSignal::Tick { epoch, remaining } => {
                if epoch != self.machine.epoch() {
                    trace!(session_id = %self.id, epoch, "dropping stale tick");
                    return;
                }
                if self.machine.tick(remaining) {
                    self.publish();
                }
            }
            TimerSignal::Expired { epoch } => {
                if epoch != self.machine.epoch() {
                    trace!(session_id = %self.id, epoch, "dropping stale expiry");
                    return;
                }
                match self.machine.expire_round() {
                    Ok(Resolution::Resolved(pulse)) => {
                        debug!(
                            session_id = %self.id,
                            round = self.machine.snapshot().current_index,
                            "round expired"
                        );
                        self.resolve_round(pulse);
                    }
                    Ok(Resolution::Ignored) => {}
                    Err(err) => {
                        self.reject("expire_round", err);
                    }
                }
            }
        }
    }

    fn advance(&mut self) {
        self.advance_at = None;
        match self.machine.advance() {
            Ok(Advance::NextRound { index }) => {
                trace!(session_id = %self.id, round = index, "next round");
                self.open_round();
            }
            Ok(Advance::Finished(summary)) => {
                self.timer.disarm();
                info!(
                    session_id = %self.id,
                    game_id = %self.game.id,
                    score = summary.score,
                    total = summary.total,
                    passed = summary.passed(),
                    "game finished"
                );
                self.publish();
            }
            Err(err) => {
                self.reject("advance", err);
            }
        }
    }

    /// Clear the previous pulse and start the countdown of the round that just opened.
    fn open_round(&mut self) {
        self.feedback.reset();
        if let Some(seconds) = self.machine.round_seconds() {
            let epoch = self.machine.epoch();
            let tick_tx = self.signal_tx.clone();
            let expire_tx = self.signal_tx.clone();
            self.timer.arm(
                seconds,
                move |remaining| {
                    let _ = tick_tx.send(TimerSignal::Tick { epoch, remaining });
                },
                move || {
                    let _ = expire_tx.send(TimerSignal::Expired { epoch });
                },
            );
        }
        self.publish();
    }

    fn resolve_round(&mut self, pulse: FeedbackPulse) {
        self.timer.disarm();
        self.feedback.signal(pulse.points, pulse.is_correct);
        self.advance_at = Some(Instant::now() + self.advance_delay);

        let state = self.machine.snapshot();
        debug!(
            session_id = %self.id,
            round = state.current_index,
            correct = pulse.is_correct,
            score = state.score,
            "round resolved"
        );
        self.publish();
    }

    fn reject(&self, operation: &'static str, err: RoundError) -> EngineError {
        warn!(
            session_id = %self.id,
            game_id = %self.game.id,
            operation,
            error = %err,
            "rejected out-of-sequence intent"
        );
        err.into()
    }

    fn view(&self) -> RoundView {
        RoundView::build(&self.game, &self.machine, &self.feedback)
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::dto::phase::VisiblePhase;
    use crate::state::content::{GameMode, fixtures};
    use crate::state::summary::Outcome;

    const DELAY: Duration = Duration::from_millis(1_000);

    fn spawn(mode: GameMode) -> SessionHandle {
        SessionHandle::spawn(
            Arc::new(fixtures::game(mode)),
            SessionSettings {
                advance_delay: DELAY,
                points_per_correct: 10,
            },
        )
        .unwrap()
    }

    async fn wait_for(
        handle: &SessionHandle,
        predicate: impl FnMut(&RoundView) -> bool,
    ) -> RoundView {
        let mut rx = handle.subscribe();
        let view = timeout(Duration::from_secs(120), rx.wait_for(predicate))
            .await
            .expect("view never matched")
            .expect("session closed");
        view.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn untimed_game_scores_three_of_five_and_passes() {
        let handle = spawn(GameMode::Quiz);

        for (round, option) in [0, 1, 0, 2, 0].into_iter().enumerate() {
            wait_for(&handle, |view| {
                view.current_index == round as u32 && !view.answered
            })
            .await;
            assert!(matches!(
                handle.submit_answer(option).await.unwrap(),
                Resolution::Resolved(_)
            ));
        }

        let view = wait_for(&handle, |view| view.phase == VisiblePhase::Finished).await;
        assert_eq!(view.score, 3);
        assert_eq!(view.coins, 30);
        let summary = view.summary.unwrap();
        assert_eq!(summary.outcome, Outcome::Pass);
        assert!(view.question.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn double_click_only_scores_first_pick() {
        let handle = spawn(GameMode::Quiz);

        let first = handle.submit_answer(1).await.unwrap();
        let second = handle.submit_answer(0).await.unwrap();

        assert_eq!(first, Resolution::Resolved(FeedbackPulse::incorrect()));
        assert_eq!(second, Resolution::Ignored);
        let view = handle.view();
        assert_eq!(view.score, 0);
        assert_eq!(view.feedback, Some(FeedbackPulse::incorrect()));
    }

    #[tokio::test(start_paused = true)]
    async fn feedback_clears_when_next_round_opens() {
        let handle = spawn(GameMode::Quiz);
        handle.submit_answer(0).await.unwrap();
        assert_eq!(handle.view().feedback, Some(FeedbackPulse::correct(10)));

        let view = wait_for(&handle, |view| view.current_index == 1).await;
        assert_eq!(view.feedback, None);
        assert!(!view.answered);
    }

    #[tokio::test(start_paused = true)]
    async fn reflex_round_expires_without_answer() {
        let handle = spawn(GameMode::Reflex { round_seconds: 10 });
        assert_eq!(handle.view().phase, VisiblePhase::Ready);

        let started = handle.start().await.unwrap();
        assert_eq!(started.time_remaining, Some(10));

        let expired = wait_for(&handle, |view| view.answered).await;
        assert_eq!(expired.time_remaining, Some(0));
        assert_eq!(expired.score, 0);
        assert_eq!(expired.feedback, Some(FeedbackPulse::incorrect()));
        assert_eq!(handle.submit_answer(0).await.unwrap(), Resolution::Ignored);

        let next = wait_for(&handle, |view| view.current_index == 1).await;
        assert_eq!(next.score, 0);
        assert_eq!(next.time_remaining, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn answered_round_stops_ticking() {
        let handle = spawn(GameMode::Reflex { round_seconds: 10 });
        handle.start().await.unwrap();

        wait_for(&handle, |view| view.time_remaining == Some(8)).await;
        handle.submit_answer(0).await.unwrap();

        sleep(Duration::from_millis(900)).await;
        let view = handle.view();
        assert_eq!(view.current_index, 0);
        assert_eq!(view.time_remaining, Some(8));
        assert_eq!(view.score, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_rewards_keep_session_alive() {
        let mut game = fixtures::game(GameMode::Quiz);
        game.rewards.coins_per_round = u32::MAX;
        let handle = SessionHandle::spawn(
            Arc::new(game),
            SessionSettings {
                advance_delay: DELAY,
                points_per_correct: u32::MAX,
            },
        )
        .unwrap();

        for round in 0..2u32 {
            wait_for(&handle, |view| view.current_index == round && !view.answered).await;
            handle.submit_answer(0).await.unwrap();
        }

        let view = wait_for(&handle, |view| view.current_index == 2).await;
        assert_eq!(view.score, 2);
        assert_eq!(view.coins, u32::MAX);
        assert!(!handle.is_closed());
        assert!(handle.submit_answer(0).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_rejected_while_playing() {
        let handle = spawn(GameMode::Quiz);
        let err = handle.start().await.unwrap_err();
        assert!(err.is_sequencing());
    }

    #[tokio::test(start_paused = true)]
    async fn answers_after_finish_are_rejected() {
        let handle = spawn(GameMode::Quiz);
        for round in 0..5u32 {
            wait_for(&handle, |view| view.current_index == round && !view.answered).await;
            handle.submit_answer(0).await.unwrap();
        }
        wait_for(&handle, |view| view.phase == VisiblePhase::Finished).await;

        let err = handle.submit_answer(0).await.unwrap_err();
        assert!(matches!(err, EngineError::Round(RoundError::InvalidTransition(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_restores_initial_view() {
        let handle = spawn(GameMode::Reflex { round_seconds: 5 });
        let initial = handle.view();
        handle.start().await.unwrap();
        handle.submit_answer(0).await.unwrap();

        let reset = handle.retry().await.unwrap();
        assert_eq!(reset, initial);

        sleep(Duration::from_secs(20)).await;
        assert_eq!(handle.view(), initial);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_cancels_pending_advance() {
        let handle = spawn(GameMode::Quiz);
        let mut rx = handle.subscribe();
        handle.submit_answer(0).await.unwrap();
        rx.borrow_and_update();

        handle.close().await;
        sleep(DELAY * 3).await;

        assert!(handle.is_closed());
        assert!(rx.has_changed().is_err());
        assert_eq!(handle.view().current_index, 0);
        assert!(matches!(
            handle.submit_answer(0).await,
            Err(EngineError::SessionClosed)
        ));
    }
}
