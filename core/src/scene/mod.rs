//! Scene graph
//!
//! The targets (sprites plus at most one stage) that scripts run against,
//! together with the block definitions active for this scene.

pub mod script;
pub mod target;

pub use script::Script;
pub use target::{normalize_direction, Target};

use crate::block::{BlockBuilder, BlockId, BlockRegistry, Procedure};
use crate::errors::DefinitionError;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub usize);

#[derive(Debug)]
pub struct Scene {
    targets: Vec<Target>,
    stage: Option<TargetId>,
    registry: BlockRegistry,
    procedures: Vec<Arc<Procedure>>,
}

impl Scene {
    /// An empty scene with the standard block library
    pub fn new() -> Result<Self, DefinitionError> {
        Ok(Self::with_registry(BlockRegistry::with_builtins()?))
    }

    pub fn with_registry(registry: BlockRegistry) -> Self {
        Self {
            targets: Vec::new(),
            stage: None,
            registry,
            procedures: Vec::new(),
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BlockRegistry {
        &mut self.registry
    }

    /// Start building a block from the active definitions
    pub fn block(&self, opcode: &str) -> Result<BlockBuilder, DefinitionError> {
        self.registry.block(opcode)
    }

    /// Add a target. A second stage is rejected.
    pub fn add_target(&mut self, target: Target) -> Result<TargetId, DefinitionError> {
        let id = TargetId(self.targets.len());
        if target.is_stage {
            if let Some(existing) = self.stage {
                return Err(DefinitionError::DuplicateStage {
                    existing: self.targets[existing.0].name.clone(),
                    name: target.name,
                });
            }
            self.stage = Some(id);
        }
        self.targets.push(target);
        Ok(id)
    }

    pub fn stage(&self) -> Option<TargetId> {
        self.stage
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(id.0)
    }

    pub fn find_target(&self, name: &str) -> Option<TargetId> {
        self.targets
            .iter()
            .position(|t| t.name == name)
            .map(TargetId)
    }

    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, t)| (TargetId(i), t))
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /* ===================== Custom blocks ===================== */

    /// Declare a custom block and register its call block. The body is
    /// attached later with [`Procedure::define`].
    pub fn declare_procedure(
        &mut self,
        id: impl Into<BlockId>,
        signature: impl Into<String>,
        params: Vec<String>,
        warp: bool,
    ) -> Result<Arc<Procedure>, DefinitionError> {
        let procedure = Arc::new(Procedure::new(id, signature, params, warp));
        self.registry.register(procedure.proto()?)?;
        self.procedures.push(procedure.clone());
        Ok(procedure)
    }

    pub fn procedures(&self) -> &[Arc<Procedure>] {
        &self.procedures
    }

    pub fn procedure(&self, signature: &str) -> Option<&Arc<Procedure>> {
        self.procedures.iter().find(|p| p.signature() == signature)
    }

    /// Check the scene is complete: every declared custom block has a body
    pub fn validate(&self) -> Result<(), DefinitionError> {
        match self.procedures.iter().find(|p| !p.is_defined()) {
            Some(p) => Err(DefinitionError::MissingBody(p.signature().to_string())),
            None => Ok(()),
        }
    }

    /* ===================== Variables ===================== */

    fn owner_of<F>(&self, target: TargetId, has: F) -> Option<TargetId>
    where
        F: Fn(&Target) -> bool,
    {
        if self.targets.get(target.0).is_some_and(&has) {
            return Some(target);
        }
        self.stage
            .filter(|stage| self.targets.get(stage.0).is_some_and(&has))
    }

    /// A variable of `target`, falling back to the stage
    pub fn variable(&self, target: TargetId, name: &str) -> Option<&Value> {
        let owner = self.owner_of(target, |t| t.variables.contains_key(name))?;
        self.targets[owner.0].variables.get(name)
    }

    pub fn variable_mut(&mut self, target: TargetId, name: &str) -> Option<&mut Value> {
        let owner = self.owner_of(target, |t| t.variables.contains_key(name))?;
        self.targets[owner.0].variables.get_mut(name)
    }

    /// A list of `target`, falling back to the stage
    pub fn list(&self, target: TargetId, name: &str) -> Option<&Vec<Value>> {
        let owner = self.owner_of(target, |t| t.lists.contains_key(name))?;
        self.targets[owner.0].lists.get(name)
    }

    pub fn list_mut(&mut self, target: TargetId, name: &str) -> Option<&mut Vec<Value>> {
        let owner = self.owner_of(target, |t| t.lists.contains_key(name))?;
        self.targets[owner.0].lists.get_mut(name)
    }
}

impl Index<TargetId> for Scene {
    type Output = Target;

    fn index(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }
}

impl IndexMut<TargetId> for Scene {
    fn index_mut(&mut self, id: TargetId) -> &mut Target {
        &mut self.targets[id.0]
    }
}
