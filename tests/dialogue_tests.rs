use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use athena::kernel::dialogue::DialogueState;
use athena::registry::{sync_handler, Manifest, ParamMap, StaticTool, ToolCatalog, ToolRegistry};
use athena::tools::calendar::Calendar;
use athena::tools::lights::Lights;
use athena::{Engine, EngineConfig};
use serde_json::{json, Value};

fn text_param<'a>(params: &'a ParamMap, name: &str) -> &'a str {
    params.get(name).and_then(Value::as_str).unwrap_or("?")
}

/// One-command lighting tool counting its dispatches.
fn lights_tool(calls: Arc<AtomicUsize>) -> StaticTool {
    StaticTool::new(json!({
        "intent": "lights",
        "commands": {
            "turn_on_lights": {
                "examples": ["turn on my lights", "switch the lights on"],
                "params": ["device"],
                "defaults": { "device": "all" },
                "function": "turn_on_lights"
            }
        }
    }))
    .with_handler(
        "turn_on_lights",
        sync_handler(move |params| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("Turning on {} lights.", text_param(&params, "device")))
        }),
    )
}

fn music_tool() -> StaticTool {
    StaticTool::new(json!({
        "intent": "music",
        "commands": {
            "play_music": {
                "examples": ["play some music", "play music", "put on some music"],
                "params": ["genre", "room"],
                "choices": {
                    "genre": ["jazz", "rock", "pop"],
                    "room": ["kitchen", "bedroom"]
                },
                "function": "play_music"
            }
        }
    }))
    .with_handler(
        "play_music",
        sync_handler(|params| {
            Ok(format!(
                "Playing {} in the {}.",
                text_param(&params, "genre"),
                text_param(&params, "room")
            ))
        }),
    )
}

fn engine_with(catalog: ToolCatalog, manifest: &[(&str, &str)]) -> Engine {
    let manifest: Manifest = manifest.iter().copied().collect();
    Engine::new(ToolRegistry::load(&manifest, &catalog), EngineConfig::default())
}

fn home_engine(calls: Arc<AtomicUsize>) -> Engine {
    let catalog = ToolCatalog::new()
        .with("tools.lights", lights_tool(calls))
        .with("tools.music", music_tool());
    engine_with(catalog, &[("lights", "tools.lights"), ("music", "tools.music")])
}

#[tokio::test]
async fn test_complete_command_dispatches_immediately() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut engine = home_engine(calls.clone());

    let reply = engine.process("turn on my lights").await;

    assert_eq!(reply.text, "Turning on all lights.");
    assert!(!reply.continue_conversation, "A completed command ends the exchange");
    assert!(engine.state().is_idle(), "No session for a complete command");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_params_open_session_then_fill() {
    let calendar = Calendar::new();
    let catalog = ToolCatalog::new().with("tools.calendar", calendar.clone());
    let mut engine = engine_with(catalog, &[("calendar", "tools.calendar")]);

    // 1. Opening prompt names exactly what is missing
    let reply = engine.process("schedule a meeting").await;
    assert!(reply.continue_conversation);
    assert!(reply.text.contains("Required: title, time."), "got: {}", reply.text);

    let session = engine.session().expect("session should be open");
    assert_eq!(session.command, "schedule_meeting");
    assert_eq!(session.missing, vec!["title", "time"]);

    // 2. One follow-up supplies both
    let reply = engine.process("Standup at 9am").await;
    assert_eq!(reply.text, "Scheduled 'Standup' at 9am.");
    assert!(!reply.continue_conversation);
    assert!(engine.state().is_idle());

    let meetings = calendar.meetings();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0].title, "Standup");
}

#[tokio::test]
async fn test_unrecognized_input_asks_to_rephrase() {
    let mut engine = home_engine(Arc::new(AtomicUsize::new(0)));

    let reply = engine.process("purple elephants dance quietly").await;

    assert_eq!(reply.text, "I'm not sure what you mean. Can you rephrase?");
    assert!(reply.continue_conversation);
    assert_eq!(*engine.state(), DialogueState::Idle);
}

#[tokio::test]
async fn test_low_confidence_is_clarified() {
    let calls = Arc::new(AtomicUsize::new(0));
    let manifest: Manifest = [("lights", "tools.lights")].into_iter().collect();
    let catalog = ToolCatalog::new().with("tools.lights", lights_tool(calls.clone()));
    let config = EngineConfig {
        match_threshold: 0.99,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(ToolRegistry::load(&manifest, &catalog), config);

    let reply = engine.process("lights").await;

    assert!(reply.text.contains("rephrase"));
    assert_eq!(calls.load(Ordering::SeqCst), 0, "Below threshold nothing runs");
}

#[tokio::test]
async fn test_empty_input_while_idle() {
    let mut engine = home_engine(Arc::new(AtomicUsize::new(0)));

    let reply = engine.process("   ").await;

    assert_eq!(reply.text, "I didn't catch that. Could you please repeat?");
    assert!(reply.continue_conversation);
}

#[tokio::test]
async fn test_open_session_is_not_interrupted_by_new_command() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut engine = home_engine(calls.clone());

    engine.process("play some music").await;
    let opened = engine.session().unwrap().clone();
    assert_eq!(opened.missing, vec!["genre", "room"]);

    // Read as an answer, not as the lights command
    let reply = engine.process("turn on my lights").await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(reply.text.starts_with("Do you have info for genre, room?"), "got: {}", reply.text);

    let session = engine.session().unwrap();
    assert_eq!(session.id, opened.id);
    assert_eq!(session.command, "play_music");
}

#[tokio::test]
async fn test_missing_count_never_grows() {
    let mut engine = home_engine(Arc::new(AtomicUsize::new(0)));

    engine.process("play some music").await;
    let mut last = engine.session().unwrap().missing.len();

    for answer in ["jazz", "jazz", "nothing useful", "ROCK", "in the kitchen"] {
        let reply = engine.process(answer).await;
        match engine.session() {
            Some(session) => {
                assert!(session.missing.len() <= last, "'{}' grew the missing set", answer);
                last = session.missing.len();
            }
            None => {
                assert_eq!(reply.text, "Playing jazz in the kitchen.");
                return;
            }
        }
    }
    panic!("session never completed");
}

#[tokio::test]
async fn test_known_values_are_not_overwritten() {
    let mut engine = home_engine(Arc::new(AtomicUsize::new(0)));

    engine.process("play some music").await;
    engine.process("jazz").await;
    let reply = engine.process("rock in the bedroom").await;

    assert_eq!(reply.text, "Playing jazz in the bedroom.");
}

#[tokio::test]
async fn test_completion_phrase_dispatches_with_what_is_known() {
    let calendar = Calendar::new();
    let catalog = ToolCatalog::new().with("tools.calendar", calendar.clone());
    let mut engine = engine_with(catalog, &[("calendar", "tools.calendar")]);

    engine.process("schedule a meeting").await;
    let reply = engine.process("That's all.").await;

    assert_eq!(reply.text, "Scheduled 'Untitled meeting' with no time set.");
    assert!(!reply.continue_conversation);
    assert!(engine.state().is_idle());
    assert_eq!(calendar.meetings().len(), 1);
}

#[tokio::test]
async fn test_abandon_closes_session_without_dispatch() {
    let calendar = Calendar::new();
    let catalog = ToolCatalog::new()
        .with("tools.calendar", calendar.clone())
        .with("tools.lights", Lights);
    let mut engine = engine_with(
        catalog,
        &[("calendar", "tools.calendar"), ("light_control", "tools.lights")],
    );

    engine.process("schedule a meeting").await;
    let reply = engine.process("never mind").await;

    assert_eq!(reply.text, "Okay, I've cancelled schedule meeting.");
    assert!(reply.continue_conversation);
    assert!(engine.state().is_idle());
    assert!(calendar.meetings().is_empty());

    // Next input is a fresh command again
    let reply = engine.process("turn on my lights").await;
    assert_eq!(reply.text, "Turning on all lights.");
}

#[tokio::test]
async fn test_empty_input_reprompts_open_session() {
    let mut engine = home_engine(Arc::new(AtomicUsize::new(0)));

    engine.process("play some music").await;
    let before = engine.session().unwrap().clone();
    let reply = engine.process("").await;

    assert!(reply.text.contains("genre, room"));
    assert_eq!(engine.session(), Some(&before));
}

#[tokio::test]
async fn test_empty_registry_reports_unavailable() {
    let mut engine = Engine::new(ToolRegistry::empty(), EngineConfig::default());

    let reply = engine.process("turn on my lights").await;

    assert!(reply.text.contains("don't have any commands"), "got: {}", reply.text);
    assert!(reply.continue_conversation);
}

#[tokio::test]
async fn test_handler_failure_is_reported_and_session_cleared() {
    let failing = StaticTool::new(json!({
        "intent": "garage",
        "commands": {
            "open_garage": {
                "examples": ["open the garage"],
                "params": ["door"],
                "choices": { "door": ["left", "right"] },
                "function": "open"
            }
        }
    }))
    .with_handler("open", sync_handler(|_| Err(anyhow::anyhow!("motor jammed"))));
    let mut engine = engine_with(ToolCatalog::new().with("tools.garage", failing), &[("garage", "tools.garage")]);

    engine.process("open the garage").await;
    let reply = engine.process("the left one").await;

    assert_eq!(reply.text, "Error executing open_garage: motor jammed");
    assert!(reply.continue_conversation);
    assert!(engine.state().is_idle());
}

#[tokio::test]
async fn test_reload_swaps_commands() {
    let mut engine = home_engine(Arc::new(AtomicUsize::new(0)));
    engine.process("play some music").await;
    assert!(engine.session().is_some());

    // Music disappears: the open session goes with it
    let manifest: Manifest = [("calendar", "tools.calendar")].into_iter().collect();
    let catalog = ToolCatalog::new().with("tools.calendar", Calendar::new());
    engine.reload(ToolRegistry::load(&manifest, &catalog));

    assert!(engine.state().is_idle());
    let reply = engine.process("schedule a meeting").await;
    assert!(reply.text.contains("Required: title, time."));
}

#[tokio::test]
async fn test_reload_keeps_session_whose_command_survives() {
    let mut engine = home_engine(Arc::new(AtomicUsize::new(0)));
    engine.process("play some music").await;
    let id = engine.session().unwrap().id;

    let catalog = ToolCatalog::new().with("tools.music", music_tool());
    let manifest: Manifest = [("music", "tools.music")].into_iter().collect();
    engine.reload(ToolRegistry::load(&manifest, &catalog));

    assert_eq!(engine.session().map(|s| s.id), Some(id));
    let reply = engine.process("pop in the kitchen").await;
    assert_eq!(reply.text, "Playing pop in the kitchen.");
}

#[tokio::test]
async fn test_builtin_lights_resolve_device_from_text() {
    let catalog = ToolCatalog::new().with("tools.lights", Lights);
    let mut engine = engine_with(catalog, &[("light_control", "tools.lights")]);

    let reply = engine.process("turn off my lights").await;
    assert_eq!(reply.text, "Turning off all lights.");

    let reply = engine.process("make it warmer").await;
    assert_eq!(reply.text, "Set color temperature of all lights to 2700K.");
}

/// Music tool with a default genre and the given resolver.
fn resolving_music_tool<F>(resolver: F) -> StaticTool
where
    F: Fn(&str) -> anyhow::Result<ParamMap> + Send + Sync + 'static,
{
    StaticTool::new(json!({
        "intent": "music",
        "commands": {
            "play_music": {
                "examples": ["play some music", "play music"],
                "params": ["genre", "room"],
                "defaults": { "genre": "pop" },
                "choices": {
                    "genre": ["jazz", "rock", "pop"],
                    "room": ["kitchen", "bedroom"]
                },
                "function": "play_music"
            }
        }
    }))
    .with_handler(
        "play_music",
        sync_handler(|params| {
            Ok(format!(
                "Playing {} in the {}.",
                text_param(&params, "genre"),
                text_param(&params, "room")
            ))
        }),
    )
    .with_resolver(resolver)
}

#[tokio::test]
async fn test_extraction_overrides_resolver_overrides_defaults() {
    let resolved = Arc::new(AtomicUsize::new(0));
    let counter = resolved.clone();
    let tool = resolving_music_tool(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut params = ParamMap::new();
        params.insert("genre".into(), json!("rock"));
        Ok(params)
    });
    let mut engine = engine_with(ToolCatalog::new().with("tools.music", tool), &[("music", "tools.music")]);

    let (text, continues) = engine
        .process("play some jazz music in the kitchen")
        .await
        .into_parts();

    assert_eq!(resolved.load(Ordering::SeqCst), 1, "Resolver runs on the first turn");
    assert_eq!(text, "Playing jazz in the kitchen.");
    assert!(!continues);
    assert!(engine.state().is_idle());
}

#[tokio::test]
async fn test_failing_resolver_contributes_nothing() {
    let tool = resolving_music_tool(|_| Err(anyhow::anyhow!("resolver offline")));
    let mut engine = engine_with(ToolCatalog::new().with("tools.music", tool), &[("music", "tools.music")]);

    let (text, continues) = engine.process("play some music").await.into_parts();
    assert!(text.contains("Required: room."), "got: {}", text);
    assert!(continues);

    let session = engine.session().expect("session should be open");
    assert_eq!(session.missing, vec!["room"]);
    assert_eq!(session.params["genre"], json!("pop"));

    let (text, continues) = engine.process("kitchen").await.into_parts();
    assert_eq!(text, "Playing pop in the kitchen.");
    assert!(!continues);
}

#[tokio::test]
async fn test_prompts_offer_every_completion_phrase() {
    let mut engine = home_engine(Arc::new(AtomicUsize::new(0)));

    let reply = engine.process("play some music").await;
    assert!(
        reply
            .text
            .ends_with(r#"Say "that's all", "thats all" or "done" if that's everything."#),
        "got: {}",
        reply.text
    );

    let reply = engine.process("no idea").await;
    assert_eq!(
        reply.text,
        r#"Do you have info for genre, room? If not, say "that's all", "thats all" or "done"."#
    );
}
