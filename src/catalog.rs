//! The eight loop methods attached to collections.
//!
//! Each method is declared as a [`MethodSpec`] and compiled exactly once, the
//! first time the catalog is touched.

use crate::receiver::NODE_KEY;
use crate::template::{Flow, Frame, LoopMethod, MethodSpec};
use crate::{LoopError, range_error_here, value::Value};
use indexmap::IndexMap;
use std::sync::LazyLock;

fn each_body(frame: &mut Frame<'_>, i: usize) -> Result<Flow, LoopError> {
    frame.visit(i)?;
    Ok(Flow::Continue)
}

pub const EACH: MethodSpec = MethodSpec::EMPTY.with_body("cb.call(that, receiver[i], i, receiver)", each_body);

fn some_body(frame: &mut Frame<'_>, i: usize) -> Result<Flow, LoopError> {
    // Only a literal `true` counts; truthy results keep the loop going.
    if frame.visit(i)?.strict_equals(&Value::Boolean(true)) {
        return Ok(Flow::Return(Value::Boolean(true)));
    }
    Ok(Flow::Continue)
}

fn return_false(_: Frame<'_>) -> Value {
    Value::Boolean(false)
}

pub const SOME: MethodSpec = MethodSpec::EMPTY
    .with_body("if (cb.call(that, receiver[i], i, receiver) === true) return true", some_body)
    .with_epilogue("return false", return_false);

fn start_true(frame: &mut Frame<'_>) -> Result<(), LoopError> {
    frame.out = Value::Boolean(true);
    Ok(())
}

fn every_body(frame: &mut Frame<'_>, i: usize) -> Result<Flow, LoopError> {
    let result = frame.visit(i)?;
    frame.out = Value::Boolean(result.is_truthy() && frame.out.is_truthy());
    Ok(Flow::Continue)
}

fn return_out(frame: Frame<'_>) -> Value {
    frame.out
}

pub const EVERY: MethodSpec = MethodSpec::EMPTY
    .with_prologue("out = true", start_true)
    .with_body("out = cb.call(that, receiver[i], i, receiver) && out", every_body)
    .with_epilogue("return out", return_out);

/// Longest output `map` will preallocate, the largest valid array length.
pub const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

fn preallocate(frame: &mut Frame<'_>) -> Result<(), LoopError> {
    let len = frame.len();
    if len > MAX_ARRAY_LENGTH {
        return Err(range_error_here!("Invalid array length"));
    }
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|err| range_error_here!(format!("Invalid array length: {err}")))?;
    out.resize(len, Value::Undefined);
    frame.out = Value::array(out);
    Ok(())
}

fn map_body(frame: &mut Frame<'_>, i: usize) -> Result<Flow, LoopError> {
    let result = frame.visit(i)?;
    if let Value::Array(out) = &frame.out
        && let Some(slot) = out.borrow_mut().get_mut(i)
    {
        *slot = result;
    }
    Ok(Flow::Continue)
}

pub const MAP: MethodSpec = MethodSpec::EMPTY
    .with_prologue("out = Array(receiver && receiver.length || 0)", preallocate)
    .with_body("out[i] = cb.call(that, receiver[i], i, receiver)", map_body)
    .with_epilogue("return out", return_out);

fn start_empty(frame: &mut Frame<'_>) -> Result<(), LoopError> {
    frame.out = Value::array(Vec::new());
    Ok(())
}

fn filter_body(frame: &mut Frame<'_>, i: usize) -> Result<Flow, LoopError> {
    let element = frame.element(i);
    if frame.invoke(&[element.clone(), Value::from(i), frame.receiver.clone()])?.is_truthy()
        && let Value::Array(out) = &frame.out
    {
        out.borrow_mut().push(element);
    }
    Ok(Flow::Continue)
}

pub const FILTER: MethodSpec = MethodSpec::EMPTY
    .with_prologue("out = []", start_empty)
    .with_body("if (cb.call(that, receiver[i], i, receiver)) out.push(receiver[i])", filter_body)
    .with_epilogue("return out", return_out);

fn seed_first(frame: &mut Frame<'_>) -> Result<(), LoopError> {
    if !frame.seeded {
        frame.that = frame.element(0);
    }
    Ok(())
}

// Without a seed the first (or last) element is already folded in.
fn fold_count(frame: &Frame<'_>) -> usize {
    if frame.seeded { frame.len() } else { frame.len().saturating_sub(1) }
}

fn reduce_body(frame: &mut Frame<'_>, i: usize) -> Result<Flow, LoopError> {
    let k = if frame.seeded { i } else { i + 1 };
    let args = [frame.that.clone(), frame.element(k), Value::from(k), frame.receiver.clone()];
    frame.that = frame.call_plain(&args)?;
    Ok(Flow::Continue)
}

fn return_that(frame: Frame<'_>) -> Value {
    frame.that
}

const FOLD_COUNT: &str = "receiver ? receiver.length - (seeded ? 0 : 1) : 0";

pub const REDUCE: MethodSpec = MethodSpec::EMPTY
    .with_prologue("if (!seeded) that = receiver[0]", seed_first)
    .with_count(FOLD_COUNT, fold_count)
    .with_body("k = seeded ? i : i + 1; that = cb(that, receiver[k], k, receiver)", reduce_body)
    .with_epilogue("return that", return_that);

fn seed_last(frame: &mut Frame<'_>) -> Result<(), LoopError> {
    if !frame.seeded && !frame.is_empty() {
        frame.that = frame.element(frame.len() - 1);
    }
    Ok(())
}

fn reduce_right_body(frame: &mut Frame<'_>, i: usize) -> Result<Flow, LoopError> {
    let j = frame.count - i - 1;
    let args = [frame.that.clone(), frame.element(j), Value::from(j), frame.receiver.clone()];
    frame.that = frame.call_plain(&args)?;
    Ok(Flow::Continue)
}

pub const REDUCE_RIGHT: MethodSpec = MethodSpec::EMPTY
    .with_prologue("if (!seeded) that = receiver[receiver.length - 1]", seed_last)
    .with_count(FOLD_COUNT, fold_count)
    .with_body("j = n - i - 1; that = cb(that, receiver[j], j, receiver)", reduce_right_body)
    .with_epilogue("return that", return_that);

fn bind_receiver(frame: &mut Frame<'_>) -> Result<(), LoopError> {
    frame.that = frame.receiver.clone();
    Ok(())
}

fn legacy_body(frame: &mut Frame<'_>, i: usize) -> Result<Flow, LoopError> {
    let element = frame.element(i);
    let node = element.get(NODE_KEY)?;
    frame.invoke(&[node, element, Value::from(i)])?;
    Ok(Flow::Continue)
}

pub const LEGACY: MethodSpec = MethodSpec::EMPTY
    .with_prologue("that = receiver", bind_receiver)
    .with_body("cb.call(that, receiver[i]._node, receiver[i], i)", legacy_body);

/// Names and specs, in attachment order.
pub const SPECS: [(&str, MethodSpec); 8] = [
    ("each", EACH),
    ("some", SOME),
    ("every", EVERY),
    ("map", MAP),
    ("filter", FILTER),
    ("reduce", REDUCE),
    ("reduceRight", REDUCE_RIGHT),
    ("legacy", LEGACY),
];

static METHODS: LazyLock<IndexMap<&'static str, LoopMethod>> = LazyLock::new(|| {
    let methods = SPECS.iter().map(|(name, spec)| (*name, spec.compile(*name))).collect::<IndexMap<_, _>>();
    log::debug!("loop method catalog ready: {} method(s)", methods.len());
    methods
});

/// Name → compiled method mapping, ready to be merged onto a collection type.
pub fn methods() -> &'static IndexMap<&'static str, LoopMethod> {
    &METHODS
}

pub fn method(name: &str) -> Result<&'static LoopMethod, LoopError> {
    METHODS.get(name).ok_or_else(|| LoopError::UnknownMethod { name: name.to_string() })
}

/// Calls a catalog method by name.
pub fn invoke(name: &str, receiver: &Value, callback: &Value, context_or_seed: Option<Value>) -> Result<Value, LoopError> {
    method(name)?.call(receiver, callback, context_or_seed)
}

/// The loop methods as seen from a collection.
pub trait LoopMethods {
    fn each(&self, callback: &Value, context: Option<Value>) -> Result<Value, LoopError>;
    fn some(&self, callback: &Value, context: Option<Value>) -> Result<bool, LoopError>;
    fn every(&self, callback: &Value, context: Option<Value>) -> Result<bool, LoopError>;
    fn map(&self, callback: &Value, context: Option<Value>) -> Result<Value, LoopError>;
    fn filter(&self, callback: &Value, context: Option<Value>) -> Result<Value, LoopError>;
    fn reduce(&self, callback: &Value, seed: Option<Value>) -> Result<Value, LoopError>;
    fn reduce_right(&self, callback: &Value, seed: Option<Value>) -> Result<Value, LoopError>;
    /// Visits `(element._node, element, index)`, bound to the collection.
    fn legacy(&self, callback: &Value) -> Result<Value, LoopError>;
}

impl LoopMethods for Value {
    fn each(&self, callback: &Value, context: Option<Value>) -> Result<Value, LoopError> {
        invoke("each", self, callback, context)
    }

    fn some(&self, callback: &Value, context: Option<Value>) -> Result<bool, LoopError> {
        Ok(invoke("some", self, callback, context)?.is_truthy())
    }

    fn every(&self, callback: &Value, context: Option<Value>) -> Result<bool, LoopError> {
        Ok(invoke("every", self, callback, context)?.is_truthy())
    }

    fn map(&self, callback: &Value, context: Option<Value>) -> Result<Value, LoopError> {
        invoke("map", self, callback, context)
    }

    fn filter(&self, callback: &Value, context: Option<Value>) -> Result<Value, LoopError> {
        invoke("filter", self, callback, context)
    }

    fn reduce(&self, callback: &Value, seed: Option<Value>) -> Result<Value, LoopError> {
        invoke("reduce", self, callback, seed)
    }

    fn reduce_right(&self, callback: &Value, seed: Option<Value>) -> Result<Value, LoopError> {
        invoke("reduceRight", self, callback, seed)
    }

    fn legacy(&self, callback: &Value) -> Result<Value, LoopError> {
        invoke("legacy", self, callback, None)
    }
}
