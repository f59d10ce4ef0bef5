//! Block model
//!
//! A [`ProtoBlock`] describes an operation: its opcode, typed inputs, body and
//! optional hat metadata. A [`Block`] binds a prototype to concrete inputs and
//! a stable identity. Both are immutable once built; they are shared by
//! reference between scripts, threads and the registry.

pub mod hat;
pub mod procedure;
pub mod registry;
pub mod shape;

pub use hat::{Hat, HatKind, Trigger};
pub use procedure::Procedure;
pub use registry::BlockRegistry;
pub use shape::{MalformedShape, Shape};

use crate::engine::context::Context;
use crate::engine::routine::{Args, EagerRoutine, Flow, Routine};
use crate::errors::{DefinitionError, ExecError};
use crate::value::{Value, ValueKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A sequence of command blocks run one after another
pub type Stack = Arc<[Arc<Block>]>;

/* ===================== Identity ===================== */

/// Stable block identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh id for blocks built in code rather than loaded
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/* ===================== Inputs ===================== */

/// A resolved block argument
#[derive(Clone)]
pub enum Input {
    /// A literal scalar (or literal list/object)
    Literal(Value),
    /// A nested block, evaluated when the body asks for it
    Block(Arc<Block>),
    /// A stack of command blocks
    Stack(Stack),
}

impl Input {
    pub fn literal(&self) -> Option<&Value> {
        match self {
            Input::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Arc<Block>> {
        match self {
            Input::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn stack(blocks: impl IntoIterator<Item = Arc<Block>>) -> Self {
        Input::Stack(blocks.into_iter().collect())
    }

    fn is_constant(&self) -> bool {
        match self {
            Input::Literal(_) => true,
            Input::Block(b) => b.is_constant(),
            Input::Stack(_) => false,
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Literal(v) => write!(f, "Literal({:?})", v),
            Input::Block(b) => write!(f, "Block({} #{})", b.opcode(), b.id()),
            Input::Stack(blocks) => f
                .debug_list()
                .entries(blocks.iter().map(|b| format!("{} #{}", b.opcode(), b.id())))
                .finish(),
        }
    }
}

impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Input::Literal(a), Input::Literal(b)) => a == b,
            (Input::Block(a), Input::Block(b)) => Arc::ptr_eq(a, b),
            (Input::Stack(a), Input::Stack(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| Arc::ptr_eq(x, y))
            }
            _ => false,
        }
    }
}

impl From<Value> for Input {
    fn from(v: Value) -> Self {
        Input::Literal(v)
    }
}

impl From<f64> for Input {
    fn from(n: f64) -> Self {
        Input::Literal(Value::Num(n))
    }
}

impl From<i32> for Input {
    fn from(n: i32) -> Self {
        Input::Literal(Value::from(n))
    }
}

impl From<bool> for Input {
    fn from(b: bool) -> Self {
        Input::Literal(Value::Bool(b))
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::Literal(Value::from(s))
    }
}

impl From<Arc<Block>> for Input {
    fn from(b: Arc<Block>) -> Self {
        Input::Block(b)
    }
}

impl From<Vec<Arc<Block>>> for Input {
    fn from(blocks: Vec<Arc<Block>>) -> Self {
        Input::Stack(blocks.into())
    }
}

/* ===================== Bodies ===================== */

/// Body that receives every non-stack input already evaluated
pub type EagerFn = Arc<dyn Fn(&mut Context<'_>, &Args) -> Result<Flow, ExecError> + Send + Sync>;

/// Factory for a hand-written resumable body
pub type RoutineFn =
    Arc<dyn Fn(&Arc<Block>, &mut Context<'_>) -> Result<Box<dyn Routine>, ExecError> + Send + Sync>;

/// How a prototype builds the resumable computation for one evaluation
#[derive(Clone)]
pub enum Execute {
    Eager(EagerFn),
    Routine(RoutineFn),
}

/* ===================== ProtoBlock ===================== */

/// Immutable description of an operation
pub struct ProtoBlock {
    opcode: String,
    inputs: IndexMap<String, Shape>,
    execute: Execute,
    return_type: Option<BTreeSet<ValueKind>>,
    pure: bool,
    hat: Option<Hat>,
}

impl ProtoBlock {
    pub fn builder(opcode: impl Into<String>) -> ProtoBlockBuilder {
        ProtoBlockBuilder::new(opcode)
    }

    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    pub fn inputs(&self) -> &IndexMap<String, Shape> {
        &self.inputs
    }

    pub fn execute(&self) -> &Execute {
        &self.execute
    }

    pub fn return_type(&self) -> Option<&BTreeSet<ValueKind>> {
        self.return_type.as_ref()
    }

    pub fn is_reporter(&self) -> bool {
        self.return_type.is_some()
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    pub fn hat(&self) -> Option<&Hat> {
        self.hat.as_ref()
    }
}

impl fmt::Debug for ProtoBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtoBlock")
            .field("opcode", &self.opcode)
            .field("inputs", &self.inputs)
            .field("return_type", &self.return_type)
            .field("pure", &self.pure)
            .field("hat", &self.hat)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ProtoBlock`]
pub struct ProtoBlockBuilder {
    opcode: String,
    inputs: Vec<(String, Result<Shape, MalformedShape>)>,
    execute: Option<Execute>,
    return_type: Option<BTreeSet<ValueKind>>,
    pure: bool,
    hat: Option<Hat>,
}

impl ProtoBlockBuilder {
    pub fn new(opcode: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            inputs: Vec::new(),
            execute: None,
            return_type: None,
            pure: false,
            hat: None,
        }
    }

    /// Declare an input. Inputs are evaluated in declaration order.
    pub fn input(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.inputs.push((name.into(), Ok(shape)));
        self
    }

    /// Declare an input from a JSON descriptor. Malformed descriptors are
    /// reported by [`ProtoBlockBuilder::build`].
    pub fn input_json(mut self, name: impl Into<String>, descriptor: &serde_json::Value) -> Self {
        self.inputs.push((name.into(), Shape::from_json(descriptor)));
        self
    }

    pub fn returns(mut self, kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        self.return_type = Some(kinds.into_iter().collect());
        self
    }

    pub fn pure(mut self) -> Self {
        self.pure = true;
        self
    }

    pub fn hat(mut self, hat: Hat) -> Self {
        self.hat = Some(hat);
        self
    }

    /// Body run once all non-stack inputs are evaluated
    pub fn eager<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut Context<'_>, &Args) -> Result<Flow, ExecError> + Send + Sync + 'static,
    {
        self.execute = Some(Execute::Eager(Arc::new(body)));
        self
    }

    /// Hand-written resumable body
    pub fn routine<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Arc<Block>, &mut Context<'_>) -> Result<Box<dyn Routine>, ExecError>
            + Send
            + Sync
            + 'static,
    {
        self.execute = Some(Execute::Routine(Arc::new(factory)));
        self
    }

    pub fn build(self) -> Result<ProtoBlock, DefinitionError> {
        let mut inputs = IndexMap::new();
        for (name, shape) in self.inputs {
            let shape = shape
                .and_then(|s| s.check().map(|_| s))
                .map_err(|e| DefinitionError::MalformedDescriptor {
                    opcode: self.opcode.clone(),
                    input: name.clone(),
                    reason: e.0,
                })?;
            if inputs.insert(name.clone(), shape).is_some() {
                return Err(DefinitionError::MalformedDescriptor {
                    opcode: self.opcode,
                    input: name,
                    reason: "input declared twice".to_string(),
                });
            }
        }

        let execute = match (self.execute, &self.hat) {
            (Some(execute), _) => execute,
            // Event hats do nothing when reached
            (None, Some(_)) => Execute::Eager(Arc::new(|_: &mut Context<'_>, _: &Args| {
                Ok(Flow::Return(Value::Null))
            })),
            (None, None) => {
                return Err(DefinitionError::MissingExecute {
                    opcode: self.opcode,
                })
            }
        };

        Ok(ProtoBlock {
            opcode: self.opcode,
            inputs,
            execute,
            return_type: self.return_type,
            pure: self.pure,
            hat: self.hat,
        })
    }
}

/* ===================== Block ===================== */

/// A prototype bound to concrete inputs
pub struct Block {
    proto: Arc<ProtoBlock>,
    id: BlockId,
    inputs: IndexMap<String, Input>,
}

impl Block {
    /// Bind `proto` to `inputs`, validating every input against its shape.
    ///
    /// Undeclared inputs are rejected. A declared input that is not given is
    /// filled with null when its shape accepts null, and is an error otherwise.
    pub fn new(
        proto: Arc<ProtoBlock>,
        id: impl Into<BlockId>,
        mut given: IndexMap<String, Input>,
    ) -> Result<Arc<Block>, DefinitionError> {
        let id = id.into();

        if let Some(name) = given.keys().find(|k| !proto.inputs.contains_key(*k)) {
            return Err(DefinitionError::UnexpectedInput {
                block: id.to_string(),
                opcode: proto.opcode.clone(),
                input: name.clone(),
            });
        }

        let mut inputs = IndexMap::with_capacity(proto.inputs.len());
        for (name, shape) in &proto.inputs {
            let input = match given.shift_remove(name) {
                Some(input) => {
                    if !shape.accepts(&input) {
                        return Err(DefinitionError::InvalidInput {
                            block: id.to_string(),
                            opcode: proto.opcode.clone(),
                            input: name.clone(),
                        });
                    }
                    input
                }
                None if shape.accepts_value(&Value::Null) => Input::Literal(Value::Null),
                None => {
                    return Err(DefinitionError::MissingInput {
                        block: id.to_string(),
                        opcode: proto.opcode.clone(),
                        input: name.clone(),
                    })
                }
            };
            inputs.insert(name.clone(), input);
        }

        Ok(Arc::new(Block { proto, id, inputs }))
    }

    pub fn builder(proto: Arc<ProtoBlock>) -> BlockBuilder {
        BlockBuilder::new(proto)
    }

    pub fn proto(&self) -> &Arc<ProtoBlock> {
        &self.proto
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn opcode(&self) -> &str {
        &self.proto.opcode
    }

    pub fn inputs(&self) -> &IndexMap<String, Input> {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.get(name)
    }

    pub fn hat(&self) -> Option<&Hat> {
        self.proto.hat()
    }

    /// A pure block whose inputs are all literals or constant blocks. Loaders
    /// may fold these ahead of time.
    pub fn is_constant(&self) -> bool {
        self.proto.pure && self.inputs.values().all(Input::is_constant)
    }

    /// Build the resumable computation for one evaluation of this block
    pub(crate) fn start(
        self: &Arc<Self>,
        cx: &mut Context<'_>,
    ) -> Result<Box<dyn Routine>, ExecError> {
        match &self.proto.execute {
            Execute::Eager(body) => Ok(Box::new(EagerRoutine::new(self.clone(), body.clone()))),
            Execute::Routine(factory) => factory(self, cx),
        }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("opcode", &self.proto.opcode)
            .field("id", &self.id)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// Builder for blocks assembled in code
pub struct BlockBuilder {
    proto: Arc<ProtoBlock>,
    id: Option<BlockId>,
    inputs: IndexMap<String, Input>,
}

impl BlockBuilder {
    pub fn new(proto: Arc<ProtoBlock>) -> Self {
        Self {
            proto,
            id: None,
            inputs: IndexMap::new(),
        }
    }

    pub fn id(mut self, id: impl Into<BlockId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn input(mut self, name: impl Into<String>, input: impl Into<Input>) -> Self {
        self.inputs.insert(name.into(), input.into());
        self
    }

    pub fn build(self) -> Result<Arc<Block>, DefinitionError> {
        let id = self.id.unwrap_or_else(BlockId::generate);
        Block::new(self.proto, id, self.inputs)
    }
}
