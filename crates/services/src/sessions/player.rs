use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;

use quiz_core::model::QuestionPack;

use super::countdown::Countdown;
use super::options::OptionId;
use super::quiz::{QuizResult, QuizSession, SessionSnapshot, SessionState, TickOutcome};
use crate::error::SessionError;

/// Timing knobs for a `QuizPlayer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOptions {
    /// Length of one countdown second.
    pub tick: Duration,
    /// Move on automatically this long after a reveal.
    pub auto_advance: Option<Duration>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            auto_advance: None,
        }
    }
}

impl PlayerOptions {
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    #[must_use]
    pub fn with_auto_advance(mut self, delay: Duration) -> Self {
        self.auto_advance = Some(delay);
        self
    }
}

struct Shared {
    session: QuizSession,
    timer: Option<Countdown>,
    /// Bumped whenever the timer is disarmed; a timer callback carrying an
    /// older epoch is stale and does nothing.
    epoch: u64,
}

struct Inner {
    shared: Mutex<Shared>,
    updates: watch::Sender<SessionSnapshot>,
    runtime: Handle,
    options: PlayerOptions,
}

/// Drives a `QuizSession` in real time.
///
/// A countdown task ticks the current question once per second and reveals it
/// when time runs out. Every change is published as a `SessionSnapshot` on a
/// watch channel. Dropping the player cancels any pending timer.
pub struct QuizPlayer {
    inner: Arc<Inner>,
}

impl QuizPlayer {
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self::with_options(runtime, PlayerOptions::default())
    }

    #[must_use]
    pub fn with_options(runtime: Handle, options: PlayerOptions) -> Self {
        let session = QuizSession::new();
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    session,
                    timer: None,
                    epoch: 0,
                }),
                updates,
                runtime,
                options,
            }),
        }
    }

    /// Build a player on the runtime of the calling task.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoRuntime` outside a tokio runtime.
    pub fn current(options: PlayerOptions) -> Result<Self, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        Ok(Self::with_options(runtime, options))
    }

    /// Start playing `pack` and arm the countdown for its first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPack` for a pack without questions and
    /// `SessionError::AlreadyStarted` if this player was started before.
    pub fn start(&self, pack: &QuestionPack) -> Result<(), SessionError> {
        let mut shared = self.inner.lock();
        shared.session.start(pack)?;
        tracing::info!(
            pack = %pack.name(),
            questions = pack.question_count(),
            time_limit_secs = pack.time_limit_secs(),
            "quiz started"
        );
        self.inner.arm_countdown(&mut shared);
        self.inner.publish(&shared);
        Ok(())
    }

    /// Returns `true` if the answer was accepted.
    pub fn submit_answer(&self, option: OptionId) -> bool {
        let mut shared = self.inner.lock();
        if !shared.session.submit_answer(option) {
            return false;
        }
        tracing::debug!(
            question = shared.session.question_index(),
            correct = shared.session.correct_count(),
            "answer submitted"
        );
        self.inner.after_reveal(&mut shared);
        self.inner.publish(&shared);
        true
    }

    /// Returns `true` if the session moved past the revealed question.
    pub fn advance(&self) -> bool {
        self.inner.advance_with(None)
    }

    /// Stop the countdown and finish the session.
    pub fn end(&self) -> QuizResult {
        let mut shared = self.inner.lock();
        Inner::disarm(&mut shared);
        let already_finished = shared.session.state() == SessionState::Finished;
        let result = shared.session.end();
        if !already_finished {
            tracing::info!(%result, "quiz ended early");
        }
        self.inner.publish(&shared);
        result
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().session.snapshot()
    }

    /// Receiver that is notified after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock().session.state()
    }

    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        self.inner.lock().session.result()
    }

    /// Whether a countdown or auto-advance timer is currently pending.
    #[must_use]
    pub fn has_live_timer(&self) -> bool {
        self.inner
            .lock()
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, shared: &Shared) {
        self.updates.send_replace(shared.session.snapshot());
    }

    fn disarm(shared: &mut Shared) {
        shared.epoch = shared.epoch.wrapping_add(1);
        if let Some(timer) = shared.timer.take() {
            timer.cancel();
        }
    }

    fn arm_countdown(self: &Arc<Self>, shared: &mut Shared) {
        Self::disarm(shared);
        let epoch = shared.epoch;
        let weak = Arc::downgrade(self);
        shared.timer = Some(Countdown::repeating(
            &self.runtime,
            self.options.tick,
            move || match Weak::upgrade(&weak) {
                Some(inner) => inner.on_tick(epoch),
                None => ControlFlow::Break(()),
            },
        ));
    }

    /// Stops the countdown of a revealed question and schedules the
    /// auto-advance, if configured.
    fn after_reveal(self: &Arc<Self>, shared: &mut Shared) {
        Self::disarm(shared);
        let Some(delay) = self.options.auto_advance else {
            return;
        };
        let epoch = shared.epoch;
        let weak = Arc::downgrade(self);
        shared.timer = Some(Countdown::once(&self.runtime, delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.advance_with(Some(epoch));
            }
        }));
    }

    fn on_tick(self: &Arc<Self>, epoch: u64) -> ControlFlow<()> {
        let mut shared = self.lock();
        if shared.epoch != epoch {
            return ControlFlow::Break(());
        }
        match shared.session.tick() {
            TickOutcome::Ignored => ControlFlow::Break(()),
            TickOutcome::Running { remaining_secs } => {
                tracing::trace!(remaining_secs, "countdown tick");
                self.publish(&shared);
                ControlFlow::Continue(())
            }
            TickOutcome::Expired => {
                tracing::debug!(
                    question = shared.session.question_index(),
                    "time is up"
                );
                self.after_reveal(&mut shared);
                self.publish(&shared);
                ControlFlow::Break(())
            }
        }
    }

    /// `expected_epoch` is set when called from the auto-advance timer.
    fn advance_with(self: &Arc<Self>, expected_epoch: Option<u64>) -> bool {
        let mut shared = self.lock();
        if expected_epoch.is_some_and(|epoch| epoch != shared.epoch) {
            return false;
        }
        if !shared.session.advance() {
            return false;
        }
        Self::disarm(&mut shared);
        match shared.session.state() {
            SessionState::ShowingQuestion => self.arm_countdown(&mut shared),
            SessionState::Finished => {
                if let Some(result) = shared.session.result() {
                    tracing::info!(%result, "quiz finished");
                }
            }
            SessionState::Idle | SessionState::Revealed => {}
        }
        self.publish(&shared);
        true
    }
}

impl Drop for QuizPlayer {
    fn drop(&mut self) {
        Inner::disarm(&mut self.inner.lock());
    }
}
