use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::warn;

use super::reply::Reply;
use crate::error::DispatchError;
use crate::registry::{Handler, ParamMap};

/// Runs handlers and folds every way they can end into one reply.
///
/// Handler errors, panics and timeouts never escape: the caller always gets
/// a response naming the failed command.
#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    timeout: Option<Duration>,
}

impl CommandDispatcher {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub async fn execute(&self, command: &str, handler: &Handler, params: ParamMap) -> Reply {
        let result = self.try_execute(handler, params).await;
        Self::reply_for(command, result)
    }

    /// Awaits the handler's deferred result, whether it was ready at once or not.
    pub async fn try_execute(&self, handler: &Handler, params: ParamMap) -> Result<String, DispatchError> {
        // The handler may panic before it even hands back a future.
        let future = std::panic::catch_unwind(AssertUnwindSafe(|| handler(params)))
            .map_err(|payload| DispatchError::Panicked(panic_message(&*payload)))?;

        let guarded = AssertUnwindSafe(future).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, guarded)
                .await
                .map_err(|_| DispatchError::TimedOut(limit))?,
            None => guarded.await,
        };

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(DispatchError::Failed(e)),
            Err(payload) => Err(DispatchError::Panicked(panic_message(&*payload))),
        }
    }

    pub fn reply_for(command: &str, result: Result<String, DispatchError>) -> Reply {
        match result {
            Ok(text) => Reply::done(text),
            Err(e) => {
                warn!(command, "Command failed: {}", e);
                Reply::prompt(format!("Error executing {}: {}", command, e))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
