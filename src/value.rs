use crate::{LoopError, type_error_here};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type ArrayPtr = Rc<RefCell<Vec<Value>>>;
pub type ObjectPtr = Rc<RefCell<IndexMap<String, Value>>>;

type PlainFn = dyn Fn(&[Value]) -> Result<Value, LoopError>;
type MethodFn = dyn Fn(&Value, &[Value]) -> Result<Value, LoopError>;

/// A host function usable as a loop callback.
///
/// `Plain` functions have no self-reference and ignore any binding. `Method`
/// functions observe the value they are bound to; invoked unbound they see
/// `undefined`.
#[derive(Clone)]
pub enum NativeFunction {
    Plain(Rc<PlainFn>),
    Method(Rc<MethodFn>),
}

impl NativeFunction {
    pub fn call_bound(&self, this: &Value, args: &[Value]) -> Result<Value, LoopError> {
        match self {
            NativeFunction::Plain(f) => f(args),
            NativeFunction::Method(f) => f(this, args),
        }
    }

    pub fn call_unbound(&self, args: &[Value]) -> Result<Value, LoopError> {
        match self {
            NativeFunction::Plain(f) => f(args),
            NativeFunction::Method(f) => f(&Value::Undefined, args),
        }
    }

    fn same(&self, other: &NativeFunction) -> bool {
        match (self, other) {
            (NativeFunction::Plain(a), NativeFunction::Plain(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            (NativeFunction::Method(a), NativeFunction::Method(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(ArrayPtr), // shared, so a returned receiver keeps its identity
    Object(ObjectPtr), // insertion-ordered properties
    Function(NativeFunction),
}

impl Value {
    pub fn array(values: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(values.into_iter().collect())))
    }

    pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, Value)>) -> Value {
        let map = properties.into_iter().map(|(k, v)| (k.into(), v)).collect::<IndexMap<_, _>>();
        Value::Object(Rc::new(RefCell::new(map)))
    }

    /// A callback that never looks at its binding.
    pub fn function(f: impl Fn(&[Value]) -> Result<Value, LoopError> + 'static) -> Value {
        Value::Function(NativeFunction::Plain(Rc::new(f)))
    }

    /// A callback that receives its binding (`this`) as the first parameter.
    pub fn method(f: impl Fn(&Value, &[Value]) -> Result<Value, LoopError> + 'static) -> Value {
        Value::Function(NativeFunction::Method(Rc::new(f)))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::Undefined | Value::Null => false,
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// `===`: primitives compare by value, everything else by identity.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.same(b),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Snapshot of an array's elements.
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr.borrow().clone()),
            _ => None,
        }
    }

    /// Property read. Reading from `undefined` or `null` is a type error;
    /// other primitives have no own properties here.
    pub fn get(&self, key: &str) -> Result<Value, LoopError> {
        match self {
            Value::Undefined | Value::Null => Err(type_error_here!(format!("Cannot read properties of {self} (reading '{key}')"))),
            Value::Object(obj) => Ok(obj.borrow().get(key).cloned().unwrap_or_default()),
            Value::Array(arr) => {
                let arr = arr.borrow();
                if key == "length" {
                    return Ok(Value::Number(arr.len() as f64));
                }
                Ok(key.parse::<usize>().ok().and_then(|i| arr.get(i).cloned()).unwrap_or_default())
            }
            _ => Ok(Value::Undefined),
        }
    }

    /// Calls `self` as a function, bound to `this` when one is given.
    pub fn call(&self, this: Option<&Value>, args: &[Value]) -> Result<Value, LoopError> {
        match (self, this) {
            (Value::Function(f), Some(this)) => f.call_bound(this, args),
            (Value::Function(f), None) => f.call_unbound(args),
            _ => Err(type_error_here!(format!("{} is not a function", self.display_nested()))),
        }
    }

    fn display_nested(&self) -> String {
        match self {
            Value::String(s) => format!("{s:?}"),
            other => other.to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(arr) => {
                let Ok(arr) = arr.try_borrow() else {
                    return write!(f, "[Array]");
                };
                let items = arr.iter().map(Value::display_nested).collect::<Vec<_>>();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Object(obj) => {
                let Ok(obj) = obj.try_borrow() else {
                    return write!(f, "[Object]");
                };
                if obj.is_empty() {
                    return write!(f, "{{}}");
                }
                let items = obj.iter().map(|(k, v)| format!("{k}: {}", v.display_nested())).collect::<Vec<_>>();
                write!(f, "{{ {} }}", items.join(", "))
            }
            Value::Function(_) => write!(f, "[Function]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_nested())
    }
}

// Structural equality, for comparing results in tests and callers. Use
// `strict_equals` for `===` semantics.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => self.strict_equals(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::array(values)
    }
}
