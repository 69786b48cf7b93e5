//! The agent controller: tick scheduling and the decision state machine.
//!
//! One tick runs perceive → reflect (maybe pivot) → decide → act:
//!
//! ```text
//!            ┌──────── pivot warranted ────────┐
//!            │                                 ▼
//!  Idle ──perceive──► decide ──score≥8 & video──► Working ──► Idle
//!   ▲                    │
//!   │                    └──otherwise──► low-cost post (stays Idle)
//!   └──────────────── Reflecting ◄── pivot ─────┘
//! ```
//!
//! Ticks never overlap: the sentiment memory is locked for the whole tick,
//! and the background loop sleeps for the tick interval only after a tick
//! has finished. Every failure is caught at the tick boundary; the loop
//! keeps its schedule.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::agent::mailbox::TrendMailbox;
use crate::agent::selector::{ActionSelector, RoiDecision};
use crate::agent::state::{AgentLifecycleState, AgentStatus, MoodReading, StatusSnapshot};
use crate::interfaces::{
    with_deadline, Collaborators, ScenePrompt, VideoHandle, AUDIENCE_FEED, CONTENT_VERIFIER,
    SCRIPT_WRITER, TREND_SOURCE, VIDEO_SYNTHESIZER,
};
use crate::memory::{InteractionKind, InteractionRecord, SentimentMemory};
use crate::persona::{Persona, PersonaId, PersonaPivotExecutor, PivotOutcome};
use crate::utilities::config::AgentConfig;
use crate::utilities::errors::{AgentError, AgentResult, ConfigError, StoreError};

// ============================================================================
// Tick results
// ============================================================================

/// What a completed tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No persona exists; nothing happened.
    NoPersona,
    /// The persona was pivoted; decide/act did not run.
    Pivoted(PivotOutcome),
    /// A topic was scored and acted on.
    Acted {
        topic: String,
        decision: RoiDecision,
        action: ActionOutcome,
    },
}

/// Result of the action phase.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Low-cost text post published.
    TextPosted,
    /// Video synthesized, verified and published.
    VideoPublished(VideoHandle),
    /// Video synthesized but rejected by verification; discarded.
    VideoRejected(VideoHandle),
    /// Synthesis failed or no synthesizer is configured.
    VideoUnavailable,
}

// ============================================================================
// Controller
// ============================================================================

/// Handle on the background loop of one `start()`.
struct LoopHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    fn is_active(&self) -> bool {
        !*self.stop.borrow() && !self.task.is_finished()
    }
}

/// Drives one persona through the perceive/decide/act cycle.
///
/// Lifecycle: [`new`](Self::new) → [`start`](Self::start) →
/// [`stop`](Self::stop) → [`shutdown`](Self::shutdown). Dropping the
/// controller signals the loop to stop.
pub struct AgentController {
    core: Arc<ControllerCore>,
    run: Mutex<Option<LoopHandle>>,
}

struct ControllerCore {
    config: AgentConfig,
    collaborators: Collaborators,
    selector: ActionSelector,
    pivot: PersonaPivotExecutor,
    /// Held for the duration of a tick; serializes ticks.
    memory: AsyncMutex<SentimentMemory>,
    status: RwLock<AgentStatus>,
    focus: Mutex<Option<PersonaId>>,
    trends: TrendMailbox,
}

impl AgentController {
    /// Build a stopped controller around `collaborators`.
    ///
    /// Fails if `config` does not pass [`AgentConfig::validate`].
    pub fn new(config: AgentConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        config.validate()?;
        let memory = SentimentMemory::new(&config, collaborators.classifier.clone());
        let selector = ActionSelector::new(collaborators.scorer.clone(), config.collaborator_timeout);
        let pivot = PersonaPivotExecutor::new(
            collaborators.store.clone(),
            collaborators.interest_generator.clone(),
            config.fallback_interests.clone(),
            config.collaborator_timeout,
        );
        let status = AgentStatus::new(config.activity_log_capacity);

        Ok(Self {
            core: Arc::new(ControllerCore {
                config,
                collaborators,
                selector,
                pivot,
                memory: AsyncMutex::new(memory),
                status: RwLock::new(status),
                focus: Mutex::new(None),
                trends: TrendMailbox::new(),
            }),
            run: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.core.config
    }

    // ---- Schedule ----

    /// Begin the periodic schedule in the background.
    ///
    /// Returns `false` (and does nothing) if the loop is already running.
    /// A loop restarted after [`stop`](Self::stop) waits one tick interval
    /// before its first tick, so it never ticks straight after the previous
    /// run's last tick. Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut run = self.run.lock();
        if run.as_ref().is_some_and(LoopHandle::is_active) {
            debug!("Agent loop already running");
            return false;
        }
        let restarted = run.is_some();

        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(self.core.clone(), stop_rx, restarted));
        *run = Some(LoopHandle { stop, task });
        info!(
            interval_ms = self.core.config.tick_interval.as_millis() as u64,
            "Agent core started"
        );
        true
    }

    /// Stop scheduling further ticks. An in-flight tick runs to completion.
    pub fn stop(&self) {
        if let Some(handle) = self.run.lock().as_ref() {
            if !handle.stop.send_replace(true) {
                info!("Agent core stopping");
            }
        }
    }

    /// Stop the loop and wait for the background task to exit.
    pub async fn shutdown(&self) {
        let handle = self.run.lock().take();
        if let Some(handle) = handle {
            handle.stop.send_replace(true);
            if let Err(e) = handle.task.await {
                error!(error = %e, "Agent loop task ended abnormally");
            }
            info!("Agent core shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().as_ref().is_some_and(LoopHandle::is_active)
    }

    // ---- Operator inputs ----

    /// Queue `topic` for the next decide phase, replacing any unconsumed trend.
    pub fn inject_trend(&self, topic: impl Into<String>) {
        let topic = topic.into();
        if let Some(displaced) = self.core.trends.put(topic.clone()) {
            debug!(%displaced, "Replacing unconsumed injected trend");
        }
        self.core.log_activity(&format!("INJECTED TREND: {}", topic));
    }

    /// Act on `persona_id` from the next tick on. Existence is checked then.
    pub fn set_focus(&self, persona_id: PersonaId) {
        *self.core.focus.lock() = Some(persona_id);
        self.core
            .log_activity(&format!("SWITCHED FOCUS: Influencer ID {}", persona_id));
    }

    pub fn focus(&self) -> Option<PersonaId> {
        *self.core.focus.lock()
    }

    // ---- Status ----

    /// Consistent copy of the public status fields.
    pub fn status(&self) -> StatusSnapshot {
        let focus = self.focus();
        let running = self.is_running();
        self.core.status.read().snapshot(focus, running)
    }

    pub fn state(&self) -> AgentLifecycleState {
        self.core.status.read().state
    }

    pub fn last_roi_score(&self) -> f64 {
        self.core.status.read().last_roi_score
    }

    pub fn current_mood(&self) -> MoodReading {
        self.core.status.read().current_mood
    }

    pub fn recent_activity(&self) -> Vec<String> {
        self.core.status.read().activity.entries()
    }

    pub fn current_interests(&self) -> Vec<String> {
        self.core.status.read().current_interests.clone()
    }

    /// Run `f` against the sentiment memory once no tick holds it.
    pub async fn inspect_memory<R>(&self, f: impl FnOnce(&SentimentMemory) -> R) -> R {
        let memory = self.core.memory.lock().await;
        f(&memory)
    }

    // ---- Ticking ----

    /// Run one tick now.
    ///
    /// Waits for any in-flight tick first. Panics inside the tick are caught
    /// and reported as [`AgentError::TickPanicked`]; on any failure the
    /// lifecycle state is returned to `Idle`.
    pub async fn tick(&self) -> AgentResult<TickOutcome> {
        self.core.guarded_tick().await
    }
}

impl Drop for AgentController {
    fn drop(&mut self) {
        if let Some(handle) = self.run.get_mut().as_ref() {
            handle.stop.send_replace(true);
        }
    }
}

async fn run_loop(core: Arc<ControllerCore>, mut stop: watch::Receiver<bool>, restarted: bool) {
    if restarted {
        debug!("Restarted loop, waiting one interval before the first tick");
    }
    if !restarted || pause(&core, &mut stop).await {
        loop {
            if *stop.borrow() {
                break;
            }

            match core.guarded_tick().await {
                Ok(outcome) => debug!(?outcome, "Tick complete"),
                Err(e) => error!(error = %e, "Error in agent loop"),
            }

            if !pause(&core, &mut stop).await {
                break;
            }
        }
    }
    info!("Agent loop stopped");
}

/// Sleep one tick interval, waking early on a stop signal.
/// Returns `false` once the controller side of the channel is gone.
async fn pause(core: &ControllerCore, stop: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(core.config.tick_interval) => true,
        changed = stop.changed() => changed.is_ok(),
    }
}

// ============================================================================
// Tick implementation
// ============================================================================

impl ControllerCore {
    async fn guarded_tick(&self) -> AgentResult<TickOutcome> {
        let span = info_span!("agent_tick", tick_id = %Uuid::new_v4(), persona = field::Empty);
        let result = AssertUnwindSafe(self.run_tick())
            .catch_unwind()
            .instrument(span)
            .await
            .unwrap_or_else(|payload| {
                Err(AgentError::TickPanicked {
                    message: panic_message(payload),
                })
            });

        if result.is_err() {
            let mut status = self.status.write();
            if status.state != AgentLifecycleState::Idle {
                warn!(state = %status.state, "Tick failed mid-transition, returning to idle");
                status.state = AgentLifecycleState::Idle;
            }
        }
        result
    }

    async fn run_tick(&self) -> AgentResult<TickOutcome> {
        let mut memory = self.memory.lock().await;
        let state = self.status.read().state;
        info!(%state, "Agent tick");

        // 1. Resolve the focus persona.
        let Some(persona) = self.resolve_persona().await? else {
            debug!("No persona available, skipping tick");
            return Ok(TickOutcome::NoPersona);
        };
        Span::current().record("persona", persona.id.0);

        // 2. Sync interests for status reporting.
        self.status.write().current_interests = persona.interests.clone();

        // 3. Perceive and reflect.
        if state == AgentLifecycleState::Idle {
            let comments = self.recent_comments(&persona).await;
            let mood = memory.update_mood(&comments).await;
            self.status.write().current_mood = mood;
            self.log_activity(&format!("Analyzed audience mood: {}", mood));

            if memory.should_pivot(&persona.interests) {
                return self.pivot(&persona).await.map(TickOutcome::Pivoted);
            }
        }

        // 4. Pick the topic.
        let topic = match self.trends.take() {
            Some(trend) => {
                self.log_activity(&format!("MANUAL TRIGGER: Evaluating trend: {}", trend));
                trend
            }
            None => {
                let topic = self.default_topic().await;
                self.log_activity(&format!("Evaluating trend: {}", topic));
                topic
            }
        };

        // 5-6. Decide and publish the decision.
        let decision = self.selector.score(&topic, &persona).await;
        self.status.write().last_roi_score = decision.score;
        self.log_activity(&format!(
            "ROI decision: score {:.1} ({})",
            decision.score, decision.action
        ));

        // 7. Act.
        let action = if decision.warrants_video(self.config.video_score_threshold) {
            self.log_activity(&format!(
                "Action: VIDEO_POST (score {:.1}). Triggering high-cost action.",
                decision.score
            ));
            self.perform_high_cost_action(&mut memory, &persona, &topic).await
        } else {
            self.log_activity(&format!(
                "Action: TEXT_POST (score {:.1}). Triggering low-cost action.",
                decision.score
            ));
            self.perform_low_cost_action(&mut memory, &topic)
        };

        Ok(TickOutcome::Acted {
            topic,
            decision,
            action,
        })
    }

    /// Focused persona, else the default one. A stale focus is cleared.
    async fn resolve_persona(&self) -> AgentResult<Option<Persona>> {
        let focus = *self.focus.lock();
        if let Some(id) = focus {
            match self.collaborators.store.get(id).await {
                Ok(Some(persona)) => return Ok(Some(persona)),
                Ok(None) | Err(StoreError::NotFound { .. }) => {
                    {
                        let mut current = self.focus.lock();
                        if *current == Some(id) {
                            *current = None;
                        }
                    }
                    self.log_activity(&format!(
                        "Focused influencer {} not found. Reverting to default.",
                        id
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.collaborators.store.get_default().await?)
    }

    async fn recent_comments(&self, persona: &Persona) -> Vec<String> {
        let feed = &self.collaborators.audience;
        match with_deadline(AUDIENCE_FEED, self.config.collaborator_timeout, feed.recent_comments(persona)).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(error = %e, "Could not gather audience comments");
                Vec::new()
            }
        }
    }

    async fn default_topic(&self) -> String {
        let trends = &self.collaborators.trends;
        match with_deadline(TREND_SOURCE, self.config.collaborator_timeout, trends.current_topic()).await {
            Ok(topic) if !topic.trim().is_empty() => topic,
            Ok(_) => self.config.default_topic.clone(),
            Err(e) => {
                warn!(error = %e, "Trend source failed, using default topic");
                self.config.default_topic.clone()
            }
        }
    }

    async fn pivot(&self, persona: &Persona) -> AgentResult<PivotOutcome> {
        self.set_state(AgentLifecycleState::Reflecting);
        self.log_activity("Triggering persona pivot due to negative sentiment.");

        let result = self.pivot.execute(persona).await;
        self.set_state(AgentLifecycleState::Idle);

        let outcome = result?;
        self.status.write().current_interests = outcome.interests.clone();
        self.log_activity(&format!(
            "Persona pivoted. New interests: {}",
            outcome.interests.join(", ")
        ));
        Ok(outcome)
    }

    fn perform_low_cost_action(&self, memory: &mut SentimentMemory, topic: &str) -> ActionOutcome {
        info!(topic, "Generated text post");
        memory.record_interaction(InteractionRecord::new(
            InteractionKind::Text,
            topic,
            self.config.text_post_sentiment,
        ));
        ActionOutcome::TextPosted
    }

    async fn perform_high_cost_action(
        &self,
        memory: &mut SentimentMemory,
        persona: &Persona,
        topic: &str,
    ) -> ActionOutcome {
        self.set_state(AgentLifecycleState::Working);
        let outcome = self.produce_video(persona, topic).await;
        if let ActionOutcome::VideoPublished(_) = &outcome {
            memory.record_interaction(InteractionRecord::new(
                InteractionKind::Video,
                topic,
                self.config.video_post_sentiment,
            ));
        }
        self.set_state(AgentLifecycleState::Idle);
        outcome
    }

    async fn produce_video(&self, persona: &Persona, topic: &str) -> ActionOutcome {
        let timeout = self.config.collaborator_timeout;
        let context = format!("Topic: {}", topic);

        let scene = match &self.collaborators.script_writer {
            Some(writer) => with_deadline(SCRIPT_WRITER, timeout, writer.scene_prompt(persona, &context))
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Scene prompt failed, using fallback");
                    ScenePrompt::fallback()
                }),
            None => ScenePrompt::fallback(),
        };
        let script = scene.description;

        let handle = match &self.collaborators.video {
            Some(video) => with_deadline(VIDEO_SYNTHESIZER, timeout, async {
                Ok(video.synthesize(&script).await)
            })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Video synthesis did not complete");
                None
            }),
            None => None,
        };
        let Some(handle) = handle else {
            warn!("No video produced, skipping post");
            return ActionOutcome::VideoUnavailable;
        };

        let verified = match &self.collaborators.verifier {
            Some(verifier) => with_deadline(CONTENT_VERIFIER, timeout, async {
                Ok(verifier.verify(&handle, &script, persona.style_vibe()).await)
            })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Verification did not complete");
                false
            }),
            None => {
                warn!("No verifier configured, discarding video");
                false
            }
        };

        if verified {
            info!(uri = %handle.uri, "Video passed verification, posting");
            ActionOutcome::VideoPublished(handle)
        } else {
            warn!(uri = %handle.uri, "Video failed verification, discarding");
            ActionOutcome::VideoRejected(handle)
        }
    }

    fn set_state(&self, state: AgentLifecycleState) {
        let mut status = self.status.write();
        debug!(from = %status.state, to = %state, "State transition");
        status.state = state;
    }

    fn log_activity(&self, message: &str) {
        info!("{}", message);
        self.status.write().activity.push(message);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
