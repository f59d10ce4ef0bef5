//! Side effects recorded by blocks
//!
//! Blocks never touch the thread list directly. Anything that starts or stops
//! threads is pushed here and applied by the scheduler right after the
//! requesting thread's turn.

use super::awaitable::Resolver;
use super::thread::ThreadId;
use crate::block::Trigger;
use crate::scene::TargetId;

#[derive(Debug)]
pub enum Effect {
    /// Dispatch a trigger. When `completion` is set it is resolved once every
    /// thread started by the trigger has finished.
    Broadcast {
        trigger: Trigger,
        completion: Option<Resolver>,
    },
    /// Stop every thread
    StopAll,
    /// Stop every thread of `target` except `except`
    StopOtherScripts {
        target: TargetId,
        except: Option<ThreadId>,
    },
}

#[derive(Debug, Default)]
pub struct Outbox {
    effects: Vec<Effect>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_broadcast(&mut self, trigger: Trigger, completion: Option<Resolver>) {
        self.effects.push(Effect::Broadcast {
            trigger,
            completion,
        });
    }

    pub fn push_stop_all(&mut self) {
        self.effects.push(Effect::StopAll);
    }

    pub fn push_stop_others(&mut self, target: TargetId, except: Option<ThreadId>) {
        self.effects
            .push(Effect::StopOtherScripts { target, except });
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Take every recorded effect, in order
    pub fn drain(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}
