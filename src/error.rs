#[derive(thiserror::Error, Debug)]
pub enum LoopError {
    #[error("Type error in {method}: {message}")]
    TypeError { message: String, method: String },

    #[error("Range error in {method}: {message}")]
    RangeError { message: String, method: String },

    #[error("Thrown value: {value}")]
    Throw { value: crate::value::Value },

    #[error("Loop method '{name}' not found")]
    UnknownMethod { name: String },
}

impl LoopError {
    /// Wraps a value raised by a callback.
    pub fn throw(value: impl Into<crate::value::Value>) -> Self {
        LoopError::Throw { value: value.into() }
    }

    pub fn message(&self) -> String {
        match self {
            LoopError::TypeError { message, .. } | LoopError::RangeError { message, .. } => message.clone(),
            LoopError::Throw { value } => value.to_string(),
            LoopError::UnknownMethod { name } => format!("{name} is not a loop method"),
        }
    }
}

// Macro that constructs a TypeError carrying the name of the enclosing
// function. Using a macro (rather than a function) makes `function_name!`
// expand at the site where the error is raised.
#[macro_export]
macro_rules! type_error_here {
    ($msg:expr) => {
        $crate::LoopError::TypeError {
            message: $msg.to_string(),
            method: $crate::function_name!().to_string(),
        }
    };
}

#[macro_export]
macro_rules! range_error_here {
    ($msg:expr) => {
        $crate::LoopError::RangeError {
            message: $msg.to_string(),
            method: $crate::function_name!().to_string(),
        }
    };
}

#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        // remove the trailing "::f"
        &name[..name.len() - 3]
    }};
}
