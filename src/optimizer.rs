use crate::{LoopError, value::Value};
use regress::Regex;

/// `cb.call(<context>, <args...>)`, the bound callback invocation.
const CALL_PATTERN: &str = r"cb\.call\(([^)]+)\)";

/// Rewrites every bound callback invocation in `source` into a branch on the
/// context:
///
/// `cb.call(that, a, b)` becomes `(that ? cb.call(that, a, b) : cb(a, b))`.
///
/// Calls already inside a rewritten branch are left alone, so applying the
/// rewrite twice yields the same text.
pub fn optimize(source: &str) -> String {
    let pattern = match Regex::new(CALL_PATTERN) {
        Ok(pattern) => pattern,
        Err(err) => {
            log::warn!("callback pattern rejected ({err}); leaving source unoptimized");
            return source.to_string();
        }
    };

    let mut out = String::with_capacity(source.len() * 2);
    let mut last = 0;
    for m in pattern.find_iter(source) {
        let range = m.range.clone();
        let Some(args) = m.captures.first().cloned().flatten() else {
            continue;
        };
        let expr = &source[range.clone()];
        let mut args = source[args].split(',').map(str::trim);
        let context = args.next().unwrap_or_default();
        let rest = args.collect::<Vec<_>>().join(", ");

        // Already the bound arm of a rewritten branch.
        let head = format!("({context} ? ");
        let tail = format!(" : cb({rest}))");
        if source[..range.start].ends_with(&head) && source[range.end..].starts_with(&tail) {
            continue;
        }

        out.push_str(&source[last..range.start]);
        out.push_str(&format!("{head}{expr}{tail}"));
        last = range.end;
    }
    out.push_str(&source[last..]);
    out
}

/// How a generated loop invokes its callback, settled once per call.
#[derive(Debug, Clone, Default)]
pub enum Invoker {
    /// Positional call, no binding.
    #[default]
    Unbound,
    /// Call bound to the supplied context.
    Bound(Value),
}

impl Invoker {
    /// Mirrors the rewritten branch: a context counts as supplied when it is
    /// truthy.
    pub fn resolve(context: &Value) -> Invoker {
        if context.is_truthy() { Invoker::Bound(context.clone()) } else { Invoker::Unbound }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Invoker::Bound(_))
    }

    pub fn invoke(&self, callback: &Value, args: &[Value]) -> Result<Value, LoopError> {
        match self {
            Invoker::Bound(context) => callback.call(Some(context), args),
            Invoker::Unbound => callback.call(None, args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_bound_call() {
        let out = optimize("cb.call(that, this[i], i, this)");
        assert_eq!(out, "(that ? cb.call(that, this[i], i, this) : cb(this[i], i, this))");
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = optimize("if (cb.call(that, x, i) === true) return true");
        let twice = optimize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn rewrites_every_occurrence() {
        let out = optimize("a = cb.call(that, x); b = cb.call(that, y, z)");
        assert_eq!(out, "a = (that ? cb.call(that, x) : cb(x)); b = (that ? cb.call(that, y, z) : cb(y, z))");
    }

    #[test]
    fn rewrites_call_inside_ternary() {
        let out = optimize("out = flag ? cb.call(that, a) : 0");
        assert_eq!(out, "out = flag ? (that ? cb.call(that, a) : cb(a)) : 0");
        assert_eq!(optimize(&out), out);
    }

    #[test]
    fn partial_wrapper_is_not_mistaken_for_rewrite() {
        let out = optimize("x = (that ? cb.call(that, a) : 0)");
        assert_eq!(out, "x = (that ? (that ? cb.call(that, a) : cb(a)) : 0)");
    }

    #[test]
    fn context_only_call_drops_all_arguments() {
        assert_eq!(optimize("cb.call(that)"), "(that ? cb.call(that) : cb())");
    }

    #[test]
    fn plain_calls_are_untouched() {
        let body = "that = cb(that, receiver[j], j, receiver)";
        assert_eq!(optimize(body), body);
    }

    #[test]
    fn falsy_context_resolves_unbound() {
        assert!(!Invoker::resolve(&Value::Undefined).is_bound());
        assert!(!Invoker::resolve(&Value::from(0)).is_bound());
        assert!(Invoker::resolve(&Value::object([("k", Value::from(1))])).is_bound());
    }
}
