//! Argument router.
//!
//! Validates keyword arguments against a method's declared parameter set
//! before invocation: unknown keys are rejected outright, required keys
//! must be present. No silent parameter drops.

use crate::error::MethodError;
use crate::methods::context::MethodArgs;
use crate::methods::traits::ArgSpec;

/// Validates `args` against `spec` for the named method.
///
/// # Errors
///
/// Returns [`MethodError::UnknownArgument`] for a key outside the declared
/// set, or [`MethodError::MissingArgument`] for an absent required key.
pub fn validate_args(
    method: &str,
    spec: &ArgSpec,
    args: &MethodArgs,
) -> std::result::Result<(), MethodError> {
    for key in args.keys() {
        if !spec.accepts(key) {
            return Err(MethodError::UnknownArgument {
                method: method.to_string(),
                key: key.clone(),
            });
        }
    }
    for key in spec.required {
        if !args.contains_key(*key) {
            return Err(MethodError::MissingArgument {
                method: method.to_string(),
                key: (*key).to_string(),
            });
        }
    }
    Ok(())
}

/// Strips the optional arguments from `args`, keeping only required keys.
///
/// Used for the single retry after a first method failure.
#[must_use]
pub fn required_only(spec: &ArgSpec, args: &MethodArgs) -> MethodArgs {
    args.iter()
        .filter(|(key, _)| spec.required.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
