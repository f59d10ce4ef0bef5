//! Hat metadata and the triggers that fire hats

use super::Block;
use crate::value::Value;

/// How a hat decides when its script starts
#[derive(Debug, Clone, PartialEq)]
pub enum HatKind {
    /// Fires when the named event is dispatched. When `key_input` is set, the
    /// hat only fires for triggers whose key equals that input's literal.
    Event {
        event: String,
        key_input: Option<String>,
    },
    /// Re-checked every tick; fires on a false→true transition of the hat's
    /// own reported value.
    Edge,
}

/// Entry-point metadata carried by a hat [`ProtoBlock`](super::ProtoBlock)
#[derive(Debug, Clone, PartialEq)]
pub struct Hat {
    pub kind: HatKind,
    /// Whether firing restarts an already-running instance of the script
    pub restart: bool,
}

impl Hat {
    /// An event hat. Non-restarting unless [`Hat::restarting`] says otherwise.
    pub fn event(event: impl Into<String>) -> Self {
        Self {
            kind: HatKind::Event {
                event: event.into(),
                key_input: None,
            },
            restart: false,
        }
    }

    /// An edge-activated hat. These always restart.
    pub fn edge() -> Self {
        Self {
            kind: HatKind::Edge,
            restart: true,
        }
    }

    pub fn restarting(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    /// Match triggers by the literal held in `input`
    pub fn keyed_by(mut self, input: impl Into<String>) -> Self {
        if let HatKind::Event { key_input, .. } = &mut self.kind {
            *key_input = Some(input.into());
        }
        self
    }

    pub fn is_edge(&self) -> bool {
        matches!(self.kind, HatKind::Edge)
    }

    /// Whether `trigger` fires this hat on `block`
    pub fn matches(&self, block: &Block, trigger: &Trigger) -> bool {
        let HatKind::Event { event, key_input } = &self.kind else {
            return false;
        };
        if *event != trigger.event {
            return false;
        }
        let Some(input) = key_input else {
            return true;
        };
        let Some(expected) = block.input(input).and_then(|i| i.literal()) else {
            return false;
        };
        let expected = expected.to_string();
        if expected.eq_ignore_ascii_case("any") {
            return true;
        }
        trigger
            .key
            .as_deref()
            .is_some_and(|key| key.eq_ignore_ascii_case(&expected))
    }
}

/// An event dispatched by the host (or by a running block) to start scripts
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub event: String,
    pub key: Option<String>,
    pub payload: Option<Value>,
}

impl Trigger {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            key: None,
            payload: None,
        }
    }

    pub fn green_flag() -> Self {
        Self::new(events::FLAG)
    }

    pub fn broadcast(message: impl Into<String>) -> Self {
        Self::new(events::BROADCAST).with_key(message)
    }

    pub fn key_pressed(key: impl Into<String>) -> Self {
        Self::new(events::KEY).with_key(key)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Well-known event names
pub mod events {
    pub const FLAG: &str = "flag";
    pub const BROADCAST: &str = "broadcast";
    pub const KEY: &str = "key";
}
