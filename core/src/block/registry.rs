//! Active block-definition set
//!
//! Holds the built-in library plus the custom blocks declared for one scene.
//! Opcodes are unique across both.

use super::{BlockBuilder, ProtoBlock};
use crate::errors::DefinitionError;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    protos: HashMap<String, Arc<ProtoBlock>>,
}

impl BlockRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the standard block library
    pub fn with_builtins() -> Result<Self, DefinitionError> {
        let mut registry = Self::new();
        crate::stdlib::register_builtins(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, proto: ProtoBlock) -> Result<Arc<ProtoBlock>, DefinitionError> {
        if self.protos.contains_key(proto.opcode()) {
            return Err(DefinitionError::DuplicateOpcode(proto.opcode().to_string()));
        }
        let proto = Arc::new(proto);
        self.protos
            .insert(proto.opcode().to_string(), proto.clone());
        Ok(proto)
    }

    pub fn get(&self, opcode: &str) -> Option<&Arc<ProtoBlock>> {
        self.protos.get(opcode)
    }

    pub fn require(&self, opcode: &str) -> Result<Arc<ProtoBlock>, DefinitionError> {
        self.get(opcode)
            .cloned()
            .ok_or_else(|| DefinitionError::UnknownOpcode(opcode.to_string()))
    }

    /// Start building a block of `opcode`
    pub fn block(&self, opcode: &str) -> Result<BlockBuilder, DefinitionError> {
        self.require(opcode).map(BlockBuilder::new)
    }

    pub fn contains(&self, opcode: &str) -> bool {
        self.protos.contains_key(opcode)
    }

    pub fn len(&self) -> usize {
        self.protos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protos.is_empty()
    }

    pub fn opcodes(&self) -> impl Iterator<Item = &str> {
        self.protos.keys().map(String::as_str)
    }
}
