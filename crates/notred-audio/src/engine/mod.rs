//! Audio engine - voice orchestration, triggers and mixing
//!
//! This module contains the runtime side of the crate:
//! - AudioEngine: the context object owning the pool and every registry
//! - Per-tick orchestration and the final mix
//! - Trigger execution (`post_trigger`) and per-event control
//! - The game-thread update mailbox and deferred starts

mod engine;
mod stats;
mod trigger;
mod update;

pub use engine::*;
pub use stats::*;
pub use trigger::{MAX_TRIGGER_DEPTH, TRANSIENT_OBJECT_BASE};
pub use update::*;

#[cfg(test)]
pub(crate) mod test_support;
