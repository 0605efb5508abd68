use tracing::{debug, warn};

use super::types::*;
use crate::config::EngineConfig;
use crate::intent::{EntityExtractor, PhraseMatcher};
use crate::kernel::time::Turn;
use crate::registry::{CommandMeta, ParamMap, ToolRegistry};

/// Read-only collaborators of a transition.
pub struct DialogueContext<'a> {
    pub registry: &'a ToolRegistry,
    pub matcher: &'a PhraseMatcher,
    pub extractor: &'a EntityExtractor,
    pub config: &'a EngineConfig,
}

pub struct DialogueMachine;

impl DialogueMachine {
    /// Pure transition: (State, Input) -> (State, Effect).
    /// MUST NOT run handlers. Dispatch is returned as an effect for the engine.
    pub fn step(ctx: &DialogueContext<'_>, state: DialogueState, text: &str, turn: Turn) -> Transition {
        match state {
            DialogueState::Idle => Self::from_idle(ctx, text, turn),
            DialogueState::AwaitingParams(session) => Self::from_awaiting(ctx, session, text),
        }
    }

    fn from_idle(ctx: &DialogueContext<'_>, text: &str, turn: Turn) -> Transition {
        let text = text.trim();
        if text.is_empty() {
            return Transition::idle(Effect::Clarify(ClarifyReason::EmptyInput));
        }
        if !ctx.matcher.is_enabled() {
            return Transition::idle(Effect::Unavailable);
        }

        let Some(found) = ctx.matcher.best_match(text) else {
            return Transition::idle(Effect::Clarify(ClarifyReason::NoMatch));
        };
        debug!(
            intent = %found.intent,
            command = %found.command,
            confidence = found.confidence,
            "Best phrase match"
        );
        if found.confidence < ctx.config.match_threshold {
            return Transition::idle(Effect::Clarify(ClarifyReason::LowConfidence));
        }

        let Some(meta) = ctx.registry.get_command_meta(&found.intent, &found.command) else {
            warn!(intent = %found.intent, command = %found.command, "Matched command is not registered");
            return Transition::idle(Effect::Clarify(ClarifyReason::NoMatch));
        };

        // defaults -> tool resolver -> generic extraction, later wins.
        // Open-ended capture is held back here: it would swallow the command phrase.
        let declared = meta.params();
        let mut params = ParamMap::new();
        overlay(&mut params, declared, meta.defaults().clone());
        overlay(&mut params, declared, resolve_with_tool(ctx.registry, meta, text));
        overlay(
            &mut params,
            declared,
            ctx.extractor.extract(text, &meta.spec.closed_candidates()),
        );

        let missing = missing_params(declared, &params);
        if missing.is_empty() {
            return Transition::idle(Effect::Dispatch(DispatchRequest {
                intent: meta.intent.clone(),
                command: meta.name.clone(),
                params,
                completion: Completion::Immediate,
            }));
        }

        let session = DialogueSession {
            id: SessionId::new(),
            intent: meta.intent.clone(),
            command: meta.name.clone(),
            params,
            missing: missing.clone(),
            opened_at: turn,
        };
        Transition {
            next: DialogueState::AwaitingParams(session),
            effect: Effect::Prompt {
                missing,
                opened: true,
            },
        }
    }

    fn from_awaiting(ctx: &DialogueContext<'_>, mut session: DialogueSession, text: &str) -> Transition {
        if ctx.config.is_completion(text) {
            return Transition::idle(Effect::Dispatch(DispatchRequest {
                intent: session.intent,
                command: session.command,
                params: session.params,
                completion: Completion::Early,
            }));
        }
        if ctx.config.is_abandon(text) {
            return Transition::idle(Effect::Abandoned {
                command: session.command,
            });
        }

        let Some(meta) = ctx.registry.get_command_meta(&session.intent, &session.command) else {
            warn!(session = %session.id, command = %session.command, "Session command vanished, abandoning");
            return Transition::idle(Effect::Abandoned {
                command: session.command,
            });
        };

        if !text.trim().is_empty() {
            // Only outstanding parameters are filled; known values stay put.
            let outstanding = session.missing.clone();
            let mut found = ParamMap::new();
            overlay(&mut found, &outstanding, resolve_with_tool(ctx.registry, meta, text));

            let candidates = meta
                .spec
                .candidates_for(outstanding.iter().filter(|p| !found.contains_key(p.as_str())));
            overlay(&mut found, &outstanding, ctx.extractor.extract(text, &candidates));

            overlay(&mut session.params, &outstanding, found);
            session.missing = missing_params(meta.params(), &session.params);
        }

        if session.missing.is_empty() {
            return Transition::idle(Effect::Dispatch(DispatchRequest {
                intent: session.intent,
                command: session.command,
                params: session.params,
                completion: Completion::Filled,
            }));
        }

        let missing = session.missing.clone();
        Transition {
            next: DialogueState::AwaitingParams(session),
            effect: Effect::Prompt {
                missing,
                opened: false,
            },
        }
    }
}

/// Copies produced values for declared parameters; `null` produces nothing.
fn overlay(target: &mut ParamMap, declared: &[String], layer: ParamMap) {
    for (name, value) in layer {
        if value.is_null() || !declared.contains(&name) {
            continue;
        }
        target.insert(name, value);
    }
}

fn missing_params(declared: &[String], params: &ParamMap) -> Vec<String> {
    declared
        .iter()
        .filter(|p| params.get(p.as_str()).map_or(true, |v| v.is_null()))
        .cloned()
        .collect()
}

/// A failing resolver contributes nothing.
fn resolve_with_tool(registry: &ToolRegistry, meta: &CommandMeta, text: &str) -> ParamMap {
    let Some(tool) = registry.get_tool(&meta.intent) else {
        return ParamMap::new();
    };
    match tool.module.resolve_params(text) {
        Ok(params) => params,
        Err(e) => {
            warn!(intent = %meta.intent, command = %meta.name, "resolve_params failed: {:#}", e);
            ParamMap::new()
        }
    }
}
