//! Built-in demonstration tools. Real integrations plug in the same way:
//! implement [`ToolModule`](crate::registry::ToolModule) and register the
//! module under the reference the manifest uses.

pub mod calendar;
pub mod lights;

pub use calendar::Calendar;
pub use lights::Lights;

use crate::registry::ToolCatalog;

pub fn builtin_catalog() -> ToolCatalog {
    ToolCatalog::new()
        .with("tools.lights", Lights)
        .with("tools.calendar", Calendar::new())
}
