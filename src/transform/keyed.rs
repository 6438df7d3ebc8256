// src/transform/keyed.rs

//! Shared plumbing for transforms that operate on array payloads.
//!
//! A transform configured with an empty key list applies to a bare
//! `Value::Array`; with keys it applies to the named fields of a
//! `Value::Record`. The same closure is invoked for every targeted array,
//! in key order, so a transform can draw its random parameters once and
//! reuse them across paired fields (e.g. image and label mask).

use crate::error::{PipelineError, Result};
use crate::value::{Array, Value};

pub(crate) fn for_each_array(
    name: &'static str,
    value: Value,
    keys: &[String],
    f: &mut dyn FnMut(&mut Array) -> Result<()>,
) -> Result<Value> {
    match value {
        Value::Array(mut array) if keys.is_empty() => {
            f(&mut array)?;
            Ok(Value::Array(array))
        }
        Value::Record(mut record) if !keys.is_empty() => {
            for key in keys {
                match record.get_mut(key) {
                    Some(Value::Array(array)) => f(array)?,
                    Some(_) => {
                        return Err(PipelineError::transform(
                            name,
                            format!("field '{key}' is not an array"),
                        ));
                    }
                    None => {
                        return Err(PipelineError::transform(
                            name,
                            format!("field '{key}' not found in record"),
                        ));
                    }
                }
            }
            Ok(Value::Record(record))
        }
        Value::Array(_) => Err(PipelineError::transform(
            name,
            "keyed transform applied to a bare array",
        )),
        Value::Record(_) => Err(PipelineError::transform(
            name,
            "transform without keys applied to a record",
        )),
        _ => Err(PipelineError::transform(
            name,
            "expected an array or record sample",
        )),
    }
}
