use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value;

/// Parameter name -> value, in the order values were produced.
pub type ParamMap = IndexMap<String, Value>;

/// Every handler result is deferred, whether or not the work was immediate.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<String>>;

/// Typed callable bound to one (intent, command) at registry load.
pub type Handler = Arc<dyn Fn(ParamMap) -> HandlerFuture + Send + Sync>;

/// Wraps a synchronous function as a [`Handler`] returning a ready future.
pub fn sync_handler<F>(f: F) -> Handler
where
    F: Fn(ParamMap) -> anyhow::Result<String> + Send + Sync + 'static,
{
    Arc::new(move |params: ParamMap| futures::future::ready(f(params)).boxed())
}

pub fn async_handler<F, Fut>(f: F) -> Handler
where
    F: Fn(ParamMap) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    Arc::new(move |params: ParamMap| f(params).boxed())
}

/// A tool module as the registry sees it.
///
/// `spec` is the raw declarative specification; the registry validates its
/// shape, so a module can ship a broken spec without taking the rest down.
pub trait ToolModule: Send + Sync {
    fn spec(&self) -> Option<Value>;

    /// Looks up the handler a spec's `function` field names.
    fn handler(&self, function: &str) -> Option<Handler>;

    /// Tool-specific parsing that runs before generic extraction.
    /// The default contributes nothing.
    fn resolve_params(&self, _text: &str) -> anyhow::Result<ParamMap> {
        Ok(ParamMap::new())
    }
}

type Resolver = Arc<dyn Fn(&str) -> anyhow::Result<ParamMap> + Send + Sync>;

/// A [`ToolModule`] assembled from a JSON spec and closures. Handy for
/// embedding small tools without a dedicated type.
#[derive(Clone)]
pub struct StaticTool {
    spec: Option<Value>,
    handlers: IndexMap<String, Handler>,
    resolver: Option<Resolver>,
}

impl StaticTool {
    pub fn new(spec: Value) -> Self {
        Self {
            spec: Some(spec),
            handlers: IndexMap::new(),
            resolver: None,
        }
    }

    /// A module exposing no specification at all.
    pub fn without_spec() -> Self {
        Self {
            spec: None,
            handlers: IndexMap::new(),
            resolver: None,
        }
    }

    pub fn with_handler(mut self, function: &str, handler: Handler) -> Self {
        self.handlers.insert(function.to_string(), handler);
        self
    }

    pub fn with_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<ParamMap> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }
}

impl ToolModule for StaticTool {
    fn spec(&self) -> Option<Value> {
        self.spec.clone()
    }

    fn handler(&self, function: &str) -> Option<Handler> {
        self.handlers.get(function).cloned()
    }

    fn resolve_params(&self, text: &str) -> anyhow::Result<ParamMap> {
        match &self.resolver {
            Some(resolver) => resolver(text),
            None => Ok(ParamMap::new()),
        }
    }
}

/// Module reference -> module. Stands in for dynamic import: the manifest
/// names references, the catalog says what they resolve to.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    modules: IndexMap<String, Arc<dyn ToolModule>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, reference: &str, module: Arc<dyn ToolModule>) {
        self.modules.insert(reference.to_string(), module);
    }

    pub fn with(mut self, reference: &str, module: impl ToolModule + 'static) -> Self {
        self.register(reference, Arc::new(module));
        self
    }

    pub fn get(&self, reference: &str) -> Option<Arc<dyn ToolModule>> {
        self.modules.get(reference).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
