// Initialize logger for this integration test binary so `RUST_LOG` is honored.
// Using `ctor` ensures initialization runs before tests start.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

#[cfg(test)]
mod context_tests {
    use loop_methods::{Invoker, LoopMethods, Value, methods};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn nums(values: &[i32]) -> Value {
        Value::array(values.iter().map(|&n| Value::from(n)))
    }

    /// A method callback recording the `this` of every call and its argument count.
    fn this_recorder(result: Value) -> (Value, Rc<RefCell<Vec<(Value, usize)>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = calls.clone();
        let callback = Value::method(move |this, args| {
            seen.borrow_mut().push((this.clone(), args.len()));
            Ok(result.clone())
        });
        (callback, calls)
    }

    #[test]
    fn test_supplied_context_binds_callback() {
        let context = Value::object([("name", Value::from("ctx"))]);
        for name in ["each", "some", "every", "map", "filter"] {
            let (callback, calls) = this_recorder(Value::Boolean(false));
            methods()[name].call(&nums(&[1, 2]), &callback, Some(context.clone())).unwrap();

            let calls = calls.borrow();
            assert_eq!(calls.len(), 2, "{name}");
            for (this, argc) in calls.iter() {
                assert!(this.strict_equals(&context), "{name}");
                assert_eq!(*argc, 3, "{name}");
            }
        }
    }

    #[test]
    fn test_omitted_context_leaves_callback_unbound() {
        for name in ["each", "some", "every", "map", "filter"] {
            let (callback, calls) = this_recorder(Value::Boolean(false));
            methods()[name].call(&nums(&[1, 2]), &callback, None).unwrap();

            let calls = calls.borrow();
            assert_eq!(calls.len(), 2, "{name}");
            for (this, argc) in calls.iter() {
                assert_eq!(*this, Value::Undefined, "{name}");
                assert_eq!(*argc, 3, "{name}");
            }
        }
    }

    #[test]
    fn test_falsy_context_is_treated_as_absent() {
        for context in [Value::Undefined, Value::Null, Value::from(0), Value::from(""), Value::from(false)] {
            let (callback, calls) = this_recorder(Value::Undefined);
            nums(&[1]).each(&callback, Some(context.clone())).unwrap();
            assert_eq!(calls.borrow()[0].0, Value::Undefined, "context {context:?}");
        }
    }

    #[test]
    fn test_plain_callback_ignores_context() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = calls.clone();
        let callback = Value::function(move |args| {
            seen.borrow_mut().push(args.to_vec());
            Ok(Value::Undefined)
        });
        let receiver = nums(&[8]);
        receiver.each(&callback, Some(Value::from("ctx"))).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls[0].len(), 3);
        assert_eq!(calls[0][0], Value::from(8));
        assert_eq!(calls[0][1], Value::from(0));
        assert!(calls[0][2].strict_equals(&receiver));
    }

    #[test]
    fn test_context_visible_to_map_callback() {
        let scale = Value::object([("factor", Value::from(3))]);
        let callback = Value::method(|this, args| {
            let factor = this.get("factor")?.as_number().unwrap_or(1.0);
            Ok(Value::from(args[0].as_number().unwrap_or(0.0) * factor))
        });
        let out = nums(&[1, 2]).map(&callback, Some(scale)).unwrap();
        assert_eq!(out, nums(&[3, 6]));

        let err = nums(&[1]).map(&callback, None).unwrap_err();
        assert!(err.message().contains("Cannot read properties of undefined"));
    }

    #[test]
    fn test_invoker_dispatch() {
        let callback = Value::method(|this, args| Ok(Value::array([this.clone(), Value::from(args.len())])));
        let bound = Invoker::resolve(&Value::from("self"));
        assert!(bound.is_bound());
        assert_eq!(bound.invoke(&callback, &[Value::from(1)]).unwrap(), Value::array([Value::from("self"), Value::from(1)]));

        let unbound = Invoker::resolve(&Value::Undefined);
        assert_eq!(unbound.invoke(&callback, &[]).unwrap(), Value::array([Value::Undefined, Value::from(0)]));
    }
}
