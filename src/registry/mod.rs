//! Tool registry: loads the intent manifest, validates every tool's command
//! specification and binds handlers once, at load time.
//!
//! Loading is fail-soft. A tool whose module or spec is unusable is skipped;
//! a command whose handler is missing is skipped without dropping its tool.
//! An unreadable manifest leaves the registry empty.

pub mod manifest;
pub mod spec;
pub mod tool;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::error::RegistryError;
use crate::intent::matcher::PhraseEntry;

pub use manifest::Manifest;
pub use spec::{Candidates, CommandSpec, ToolSpec};
pub use tool::{
    async_handler, sync_handler, Handler, HandlerFuture, ParamMap, StaticTool, ToolCatalog,
    ToolModule,
};

/// A validated command with its handler bound.
#[derive(Clone)]
pub struct CommandMeta {
    pub intent: String,
    pub name: String,
    pub spec: CommandSpec,
    pub handler: Handler,
}

impl CommandMeta {
    pub fn examples(&self) -> &[String] {
        &self.spec.examples
    }

    pub fn params(&self) -> &[String] {
        &self.spec.params
    }

    pub fn defaults(&self) -> &ParamMap {
        &self.spec.defaults
    }
}

impl fmt::Debug for CommandMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMeta")
            .field("intent", &self.intent)
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct RegisteredTool {
    pub intent: String,
    pub description: String,
    pub module: Arc<dyn ToolModule>,
    commands: IndexMap<String, CommandMeta>,
}

impl RegisteredTool {
    pub fn commands(&self) -> impl Iterator<Item = &CommandMeta> {
        self.commands.values()
    }
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads the manifest at `path` and loads it. Never fails: an unreadable
    /// or unparsable manifest is logged and yields an empty registry.
    pub fn from_path(path: impl AsRef<Path>, catalog: &ToolCatalog) -> Self {
        match Manifest::from_path(path.as_ref()) {
            Ok(manifest) => Self::load(&manifest, catalog),
            Err(e) => {
                error!("Tool manifest unusable, no commands available: {}", e);
                Self::empty()
            }
        }
    }

    pub fn load(manifest: &Manifest, catalog: &ToolCatalog) -> Self {
        let mut registry = Self::empty();

        for (intent, reference) in manifest.iter() {
            match load_tool(intent, reference, catalog) {
                Ok(tool) => {
                    info!(intent, commands = tool.commands.len(), "Registered tool");
                    registry.tools.insert(intent.to_string(), tool);
                }
                Err(e) => warn!(intent, "Skipping tool: {}", e),
            }
        }

        info!(
            tools = registry.len(),
            commands = registry.command_count(),
            "Tool registry loaded"
        );
        registry
    }

    /// `{intent: {command: [examples...]}}`
    pub fn get_all_examples(&self) -> IndexMap<String, IndexMap<String, Vec<String>>> {
        self.tools
            .iter()
            .map(|(intent, tool)| {
                let commands = tool
                    .commands
                    .iter()
                    .map(|(name, meta)| (name.clone(), meta.spec.examples.clone()))
                    .collect();
                (intent.clone(), commands)
            })
            .collect()
    }

    pub fn get_command_meta(&self, intent: &str, command: &str) -> Option<&CommandMeta> {
        self.tools.get(intent)?.commands.get(command)
    }

    pub fn get_tool(&self, intent: &str) -> Option<&RegisteredTool> {
        self.tools.get(intent)
    }

    /// One entry per example phrase, in manifest then spec order.
    pub fn index_entries(&self) -> Vec<PhraseEntry> {
        self.tools
            .values()
            .flat_map(|tool| tool.commands.values())
            .flat_map(|meta| {
                meta.spec.examples.iter().map(move |phrase| PhraseEntry {
                    intent: meta.intent.clone(),
                    command: meta.name.clone(),
                    phrase: phrase.clone(),
                })
            })
            .collect()
    }

    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn command_count(&self) -> usize {
        self.tools.values().map(|t| t.commands.len()).sum()
    }
}

fn load_tool(
    intent: &str,
    reference: &str,
    catalog: &ToolCatalog,
) -> Result<RegisteredTool, RegistryError> {
    let module = catalog
        .get(reference)
        .ok_or_else(|| RegistryError::UnknownModule(reference.to_string()))?;
    let raw = module
        .spec()
        .ok_or_else(|| RegistryError::MissingSpec(reference.to_string()))?;
    let spec: ToolSpec =
        serde_json::from_value(raw).map_err(|source| RegistryError::MalformedSpec {
            module: reference.to_string(),
            source,
        })?;

    if !spec.intent.is_empty() && spec.intent != intent {
        warn!(
            manifest = intent,
            declared = %spec.intent,
            "Tool spec intent differs from manifest key, using manifest key"
        );
    }

    let mut commands = IndexMap::new();
    for (name, command) in spec.commands {
        match bind_command(intent, &name, command, module.as_ref()) {
            Ok(meta) => {
                commands.insert(name, meta);
            }
            Err(e) => warn!("Skipping command: {}", e),
        }
    }

    Ok(RegisteredTool {
        intent: intent.to_string(),
        description: spec.description,
        module,
        commands,
    })
}

fn bind_command(
    intent: &str,
    name: &str,
    spec: CommandSpec,
    module: &dyn ToolModule,
) -> Result<CommandMeta, RegistryError> {
    let missing_handler = || RegistryError::MissingHandler {
        intent: intent.to_string(),
        command: name.to_string(),
        function: spec.function.clone(),
    };

    if spec.function.is_empty() {
        return Err(missing_handler());
    }
    let handler = module.handler(&spec.function).ok_or_else(missing_handler)?;
    spec.validate(intent, name)?;

    Ok(CommandMeta {
        intent: intent.to_string(),
        name: name.to_string(),
        spec,
        handler,
    })
}
