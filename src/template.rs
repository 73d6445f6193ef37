//! Four-slot loop template.
//!
//! A [`MethodSpec`] names up to four fragments, each a piece of source text
//! paired with the native step that executes it. [`MethodSpec::compile`]
//! fills the empty slots with defaults, renders the loop skeleton, runs it
//! through the invocation optimizer and yields a reusable [`LoopMethod`].

use crate::optimizer::{Invoker, optimize};
use crate::receiver::{array_length, element_at};
use crate::{LoopError, value::Value};

pub const DEFAULT_PROLOGUE: &str = "";
pub const DEFAULT_COUNT: &str = "receiver ? receiver.length : 0";
pub const DEFAULT_BODY: &str = "";
pub const DEFAULT_EPILOGUE: &str = "return receiver";

/// Formal parameters of every generated function.
pub const PARAMS: [&str; 2] = ["cb", "that"];

pub type Prologue = fn(&mut Frame<'_>) -> Result<(), LoopError>;
pub type Count = fn(&Frame<'_>) -> usize;
pub type Body = fn(&mut Frame<'_>, usize) -> Result<Flow, LoopError>;
pub type Epilogue = fn(Frame<'_>) -> Value;

/// What a loop body asks of the skeleton after one element.
#[derive(Debug)]
pub enum Flow {
    Continue,
    Return(Value),
}

/// Locals of one generated-function call.
pub struct Frame<'a> {
    pub receiver: &'a Value,
    pub callback: &'a Value,
    /// Invocation context for visitors, accumulator for folds.
    pub that: Value,
    /// Whether the caller passed the second argument at all.
    pub seeded: bool,
    /// Result under construction.
    pub out: Value,
    pub invoker: Invoker,
    /// Cached loop bound (`n`).
    pub count: usize,
}

impl<'a> Frame<'a> {
    pub fn new(receiver: &'a Value, callback: &'a Value, context_or_seed: Option<Value>) -> Self {
        Frame {
            receiver,
            callback,
            seeded: context_or_seed.is_some(),
            that: context_or_seed.unwrap_or_default(),
            out: Value::Undefined,
            invoker: Invoker::Unbound,
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        array_length(self.receiver)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element(&self, index: usize) -> Value {
        element_at(self.receiver, index)
    }

    /// `cb.call(that, args...)` after optimization.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, LoopError> {
        self.invoker.invoke(self.callback, args)
    }

    /// `cb(args...)`, never bound.
    pub fn call_plain(&self, args: &[Value]) -> Result<Value, LoopError> {
        self.callback.call(None, args)
    }

    /// Invokes the callback with `(element, index, receiver)`.
    pub fn visit(&self, index: usize) -> Result<Value, LoopError> {
        self.invoke(&[self.element(index), Value::from(index), self.receiver.clone()])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Fragment<S> {
    pub source: &'static str,
    pub step: S,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MethodSpec {
    pub prologue: Option<Fragment<Prologue>>,
    pub count: Option<Fragment<Count>>,
    pub body: Option<Fragment<Body>>,
    pub epilogue: Option<Fragment<Epilogue>>,
}

fn no_prologue(_: &mut Frame<'_>) -> Result<(), LoopError> {
    Ok(())
}

fn receiver_length(frame: &Frame<'_>) -> usize {
    frame.len()
}

fn no_body(_: &mut Frame<'_>, _: usize) -> Result<Flow, LoopError> {
    Ok(Flow::Continue)
}

fn return_receiver(frame: Frame<'_>) -> Value {
    frame.receiver.clone()
}

impl MethodSpec {
    pub const EMPTY: MethodSpec = MethodSpec { prologue: None, count: None, body: None, epilogue: None };

    pub const fn with_prologue(mut self, source: &'static str, step: Prologue) -> Self {
        self.prologue = Some(Fragment { source, step });
        self
    }

    pub const fn with_count(mut self, source: &'static str, step: Count) -> Self {
        self.count = Some(Fragment { source, step });
        self
    }

    pub const fn with_body(mut self, source: &'static str, step: Body) -> Self {
        self.body = Some(Fragment { source, step });
        self
    }

    pub const fn with_epilogue(mut self, source: &'static str, step: Epilogue) -> Self {
        self.epilogue = Some(Fragment { source, step });
        self
    }

    /// Renders the loop skeleton with every empty slot defaulted.
    pub fn assemble(&self) -> String {
        let prologue = self.prologue.map_or(DEFAULT_PROLOGUE, |f| f.source);
        let count = self.count.map_or(DEFAULT_COUNT, |f| f.source);
        let body = self.body.map_or(DEFAULT_BODY, |f| f.source);
        let epilogue = self.epilogue.map_or(DEFAULT_EPILOGUE, |f| f.source);
        format!("{prologue}\nfor (i = 0, n = {count}; i < n; ++i) {{ {body} }}\n{epilogue}")
    }

    pub fn compile(&self, name: &'static str) -> LoopMethod {
        let assembled = self.assemble();
        let source = optimize(&assembled);
        // Only bodies with a bound invocation ever consult the context.
        let binds_callback = source != assembled;
        log::debug!("compiled loop method '{name}' ({}, {}):\n{source}", PARAMS[0], PARAMS[1]);
        LoopMethod {
            name,
            source,
            binds_callback,
            prologue: self.prologue.map_or(no_prologue as Prologue, |f| f.step),
            count: self.count.map_or(receiver_length as Count, |f| f.step),
            body: self.body.map_or(no_body as Body, |f| f.step),
            epilogue: self.epilogue.map_or(return_receiver as Epilogue, |f| f.step),
        }
    }
}

/// A compiled loop: stateless, built once, called any number of times.
#[derive(Clone)]
pub struct LoopMethod {
    name: &'static str,
    source: String,
    binds_callback: bool,
    prologue: Prologue,
    count: Count,
    body: Body,
    epilogue: Epilogue,
}

impl std::fmt::Debug for LoopMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopMethod").field("name", &self.name).field("source", &self.source).finish()
    }
}

impl LoopMethod {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the loop body invokes the callback through the context branch.
    pub fn binds_callback(&self) -> bool {
        self.binds_callback
    }

    /// Optimized source of the assembled loop.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Runs the loop against `receiver`. `None` for `context_or_seed` means
    /// the argument was not passed; `Some(Value::Undefined)` means it was.
    pub fn call(&self, receiver: &Value, callback: &Value, context_or_seed: Option<Value>) -> Result<Value, LoopError> {
        let mut frame = Frame::new(receiver, callback, context_or_seed);
        (self.prologue)(&mut frame)?;
        if self.binds_callback {
            frame.invoker = Invoker::resolve(&frame.that);
        }
        let n = (self.count)(&frame);
        frame.count = n;
        log::trace!("{}: {n} iteration(s), bound={}", self.name, frame.invoker.is_bound());

        for i in 0..n {
            if let Flow::Return(value) = (self.body)(&mut frame, i)? {
                return Ok(value);
            }
        }
        Ok((self.epilogue)(frame))
    }
}
