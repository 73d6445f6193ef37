pub(crate) mod catalog;
pub(crate) mod error;
pub(crate) mod optimizer;
pub(crate) mod receiver;
pub(crate) mod template;
pub(crate) mod value;

pub use catalog::{
    EACH, EVERY, FILTER, LEGACY, LoopMethods, MAP, MAX_ARRAY_LENGTH, REDUCE, REDUCE_RIGHT, SOME, SPECS, invoke, method, methods,
};
pub use error::LoopError;
pub use optimizer::{Invoker, optimize};
pub use receiver::{NODE_KEY, array_length, array_like, element_at, wrap_node};
pub use template::{
    Body, Count, DEFAULT_BODY, DEFAULT_COUNT, DEFAULT_EPILOGUE, DEFAULT_PROLOGUE, Epilogue, Flow, Fragment, Frame, LoopMethod, MethodSpec,
    PARAMS, Prologue,
};
pub use value::{ArrayPtr, NativeFunction, ObjectPtr, Value};
