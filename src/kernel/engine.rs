use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::dialogue::{
    Completion, DialogueContext, DialogueMachine, DialogueSession, DialogueState, DispatchRequest,
    Effect, SessionId,
};
use super::dispatcher::CommandDispatcher;
use super::reply::Reply;
use super::telemetry::event::{CloseReason, DispatchOutcome, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Turn;
use crate::config::EngineConfig;
use crate::intent::{EntityExtractor, PhraseMatcher};
use crate::outputs::realize;
use crate::registry::ToolRegistry;

/// The dialogue engine. Owns the single conversation state.
///
/// Inputs are handled one at a time (`process` takes `&mut self`), so the
/// session is never mutated concurrently and a rebuild of the phrase index
/// cannot race with matching.
pub struct Engine {
    registry: Arc<ToolRegistry>,
    matcher: Arc<PhraseMatcher>,
    extractor: EntityExtractor,
    dispatcher: CommandDispatcher,
    config: EngineConfig,
    state: DialogueState,
    pub turn: Turn,
    pub telemetry: TelemetryRecorder,
}

impl Engine {
    pub fn new(registry: ToolRegistry, config: EngineConfig) -> Self {
        let matcher = PhraseMatcher::build(registry.index_entries());
        if registry.is_empty() {
            warn!("Engine starting with an empty tool registry");
        }

        Self {
            registry: Arc::new(registry),
            matcher: Arc::new(matcher),
            extractor: EntityExtractor::new(),
            dispatcher: CommandDispatcher::new(config.handler_timeout()),
            config,
            state: DialogueState::Idle,
            turn: Turn::new(),
            telemetry: TelemetryRecorder::new(),
        }
    }

    /// One conversational turn: text in, reply out. Never fails.
    pub async fn process(&mut self, text: &str) -> Reply {
        self.turn = self.turn.next();

        let previous = std::mem::take(&mut self.state);
        let prior = previous
            .session()
            .map(|s| (s.id, s.missing.len(), s.opened_at));

        let transition = {
            let ctx = DialogueContext {
                registry: &self.registry,
                matcher: &self.matcher,
                extractor: &self.extractor,
                config: &self.config,
            };
            DialogueMachine::step(&ctx, previous, text, self.turn)
        };

        self.state = transition.next;
        self.observe(prior, &transition.effect);

        match transition.effect {
            Effect::Dispatch(request) => self.dispatch(request).await,
            effect => Reply::prompt(realize(&effect, &self.config)),
        }
    }

    async fn dispatch(&mut self, request: DispatchRequest) -> Reply {
        let Some(meta) = self.registry.get_command_meta(&request.intent, &request.command) else {
            warn!(intent = %request.intent, command = %request.command, "Dispatch target missing");
            return Reply::prompt(format!(
                "Error executing {}: command is no longer available",
                request.command
            ));
        };
        let handler = meta.handler.clone();

        info!(
            intent = %request.intent,
            command = %request.command,
            params = request.params.len(),
            "Dispatching command"
        );

        let started = Instant::now();
        let result = self.dispatcher.try_execute(&handler, request.params).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match &result {
            Ok(_) => DispatchOutcome::Completed,
            Err(e) => DispatchOutcome::from(e),
        };
        self.telemetry.record(TelemetryEvent::Dispatch { outcome, latency_ms });

        CommandDispatcher::reply_for(&request.command, result)
    }

    /// Swaps in a new registry and a matcher built from it. An open session
    /// survives only if its command is still registered.
    pub fn reload(&mut self, registry: ToolRegistry) {
        let matcher = PhraseMatcher::build(registry.index_entries());

        if let Some(session) = self.state.session() {
            if registry.get_command_meta(&session.intent, &session.command).is_none() {
                warn!(session = %session.id, command = %session.command, "Session dropped by reload");
                let event = TelemetryEvent::SessionClosed {
                    session_id: session.id,
                    reason: CloseReason::Abandoned,
                    turns_open: self.turn.since(session.opened_at),
                };
                self.telemetry.record(event);
                self.state = DialogueState::Idle;
            }
        }

        self.registry = Arc::new(registry);
        self.matcher = Arc::new(matcher);
        info!(
            tools = self.registry.len(),
            examples = self.matcher.len(),
            "Engine reloaded"
        );
    }

    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    pub fn session(&self) -> Option<&DialogueSession> {
        self.state.session()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn matcher(&self) -> &PhraseMatcher {
        &self.matcher
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn observe(&mut self, prior: Option<(SessionId, usize, Turn)>, effect: &Effect) {
        let turn = self.turn;
        let closed = |reason| {
            prior.map(|(session_id, _, opened_at)| TelemetryEvent::SessionClosed {
                session_id,
                reason,
                turns_open: turn.since(opened_at),
            })
        };

        let event = match effect {
            Effect::Clarify(reason) => Some(TelemetryEvent::Clarification { reason: *reason }),
            Effect::Unavailable => Some(TelemetryEvent::Unavailable),
            Effect::Prompt { missing, opened: true } => {
                self.state.session().map(|s| {
                    info!(session = %s.id, command = %s.command, missing = missing.len(), "Session opened");
                    TelemetryEvent::SessionOpened {
                        session_id: s.id,
                        missing: missing.len(),
                        turn,
                    }
                })
            }
            Effect::Prompt { missing, opened: false } => {
                prior.map(|(session_id, missing_before, _)| TelemetryEvent::SessionProgress {
                    session_id,
                    missing_before,
                    missing_after: missing.len(),
                })
            }
            Effect::Abandoned { .. } => closed(CloseReason::Abandoned),
            Effect::Dispatch(request) => match request.completion {
                Completion::Immediate => None,
                Completion::Filled => closed(CloseReason::Filled),
                Completion::Early => closed(CloseReason::EarlyCompletion),
            },
        };

        if let Some(event) = event {
            self.telemetry.record(event);
        }
    }
}
