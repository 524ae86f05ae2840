//! Update operations and threading combinators
//!
//! An [`UpdateOp`] is one step of an update chain. [`pipe`] threads a value
//! through a sequence of them on a single transient; [`pipe_cond`] guards
//! each step with a predicate over the in-progress transient.
//!
//! # Example
//! ```ignore
//! let updated = pipe(&person, &[
//!     UpdateOp::assoc("name", "Ann"),
//!     UpdateOp::assoc_in("address.city".parse()?, "Oslo"),
//!     UpdateOp::clear("email"),
//! ])?;
//! ```

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::error::MapResult;
use crate::path::KeyPath;
use crate::transient::Transient;
use crate::value::{FieldValue, Value};

/// Guard over an in-progress transient
pub type Pred = Arc<dyn Fn(&Transient) -> bool + Send + Sync>;

/// Function applied by [`UpdateOp::Update`]
pub type UpdateFn = Arc<dyn Fn(FieldValue) -> FieldValue + Send + Sync>;

/// One step of an update chain
#[derive(Clone)]
pub enum UpdateOp {
    Assoc { key: String, value: FieldValue },
    AssocIf { pred: Pred, key: String, value: FieldValue },
    Clear { key: String },
    AssocIn { path: KeyPath, value: FieldValue },
    Update { key: String, f: UpdateFn },
}

impl UpdateOp {
    pub fn assoc(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Assoc {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn assoc_if(
        pred: impl Fn(&Transient) -> bool + Send + Sync + 'static,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self::AssocIf {
            pred: Arc::new(pred),
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn clear(key: impl Into<String>) -> Self {
        Self::Clear { key: key.into() }
    }

    pub fn assoc_in(path: KeyPath, value: impl Into<FieldValue>) -> Self {
        Self::AssocIn {
            path,
            value: value.into(),
        }
    }

    pub fn update(key: impl Into<String>, f: impl Fn(FieldValue) -> FieldValue + Send + Sync + 'static) -> Self {
        Self::Update {
            key: key.into(),
            f: Arc::new(f),
        }
    }

    /// Apply to an owned transient
    ///
    /// # Errors
    /// Returns error if the underlying transient operation fails
    pub fn apply(&self, transient: Transient) -> MapResult<Transient> {
        match self {
            Self::Assoc { key, value } => transient.assoc(key, value.clone()),
            Self::AssocIf { pred, key, value } => transient.assoc_if(|t| pred(t), key, value.clone()),
            Self::Clear { key } => transient.clear_field(key),
            Self::AssocIn { path, value } => transient.assoc_in(path, value.clone()),
            Self::Update { key, f } => transient.update(key, |current| f(current)),
        }
    }
}

impl Debug for UpdateOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assoc { key, value } => f.debug_struct("Assoc").field("key", key).field("value", value).finish(),
            Self::AssocIf { key, value, .. } => {
                f.debug_struct("AssocIf").field("key", key).field("value", value).finish_non_exhaustive()
            }
            Self::Clear { key } => f.debug_struct("Clear").field("key", key).finish(),
            Self::AssocIn { path, value } => f
                .debug_struct("AssocIn")
                .field("path", &path.to_string())
                .field("value", value)
                .finish(),
            Self::Update { key, .. } => f.debug_struct("Update").field("key", key).finish_non_exhaustive(),
        }
    }
}

/// Apply `ops` in order to `value`, returning the final value
///
/// All steps share one transient; `value` itself is never changed.
///
/// # Errors
/// Returns the first failing step's error
pub fn pipe<'a>(value: &Value, ops: impl IntoIterator<Item = &'a UpdateOp>) -> MapResult<Value> {
    ops.into_iter()
        .try_fold(value.transient(), |transient, op| op.apply(transient))
        .map(Transient::persist)
}

/// Like [`pipe`], skipping each step whose predicate is false
///
/// # Errors
/// Returns the first failing step's error
pub fn pipe_cond<'a>(value: &Value, steps: impl IntoIterator<Item = &'a (Pred, UpdateOp)>) -> MapResult<Value> {
    steps
        .into_iter()
        .try_fold(value.transient(), |transient, (pred, op)| {
            if pred(&transient) {
                op.apply(transient)
            } else {
                Ok(transient)
            }
        })
        .map(Transient::persist)
}

/// Wrap a closure as a [`Pred`]
pub fn when(f: impl Fn(&Transient) -> bool + Send + Sync + 'static) -> Pred {
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use crate::mapper::{define_mapper, Mapper};
    use crate::options::MapperOptions;
    use protomap_schema::{FieldDescriptor, MessageSchema, ScalarType, SchemaPool};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn people() -> Mapper {
        let pool = SchemaPool::builder()
            .message(MessageSchema::new("Address").with_field(FieldDescriptor::scalar("city", 1, ScalarType::String)))
            .message(
                MessageSchema::new("Person")
                    .with_field(FieldDescriptor::scalar("name", 1, ScalarType::String))
                    .with_field(FieldDescriptor::scalar("visits", 2, ScalarType::Int32))
                    .with_field(FieldDescriptor::message("address", 3, "Address")),
            )
            .build()
            .unwrap();
        define_mapper("people", Arc::new(pool), &["Person"], MapperOptions::new()).unwrap()
    }

    fn bump(current: FieldValue) -> FieldValue {
        FieldValue::from(current.as_i64().unwrap_or(0) + 1)
    }

    #[test]
    fn pipe_threads_steps_in_order() {
        let person = people().empty("Person").unwrap();
        let ops = [
            UpdateOp::assoc("visits", 1_i32),
            UpdateOp::update("visits", bump),
            UpdateOp::assoc_in("address.city".parse().unwrap(), "Oslo"),
            UpdateOp::assoc("name", "Ann"),
            UpdateOp::clear("name"),
        ];
        let updated = pipe(&person, &ops).unwrap();

        assert_eq!(updated.get("visits").unwrap().as_i64(), Some(2));
        assert_eq!(updated.get_in(&"address.city".parse().unwrap()).unwrap().as_str(), Some("Oslo"));
        assert_eq!(updated.get("name").unwrap().as_str(), Some(""));
        assert!(!person.has_field("address").unwrap());
    }

    #[test]
    fn pipe_stops_at_first_error() {
        let person = people().construct("Person", [("name", "Ann")]).unwrap();
        let ops = [UpdateOp::assoc("name", "Bea"), UpdateOp::assoc("age", 3_i32), UpdateOp::clear("name")];
        assert!(matches!(pipe(&person, &ops), Err(MapError::NotFound { .. })));
        assert_eq!(person.get("name").unwrap().as_str(), Some("Ann"));
    }

    #[test]
    fn pipe_cond_skips_false_steps() {
        let person = people().empty("Person").unwrap();
        let steps = [
            (
                when(|t| !t.has_field("address").unwrap_or(true)),
                UpdateOp::assoc_in("address.city".parse().unwrap(), "Oslo"),
            ),
            (when(|t| t.has_field("address").unwrap_or(false)), UpdateOp::assoc("name", "Ann")),
            (when(|_| false), UpdateOp::assoc("undeclared", 1_i32)),
        ];
        let updated = pipe_cond(&person, &steps).unwrap();
        assert_eq!(updated.get("name").unwrap().as_str(), Some("Ann"));
    }

    #[test]
    fn pipe_cond_short_circuits_on_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = Arc::clone(&calls);
            when(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            })
        };
        let steps = [
            (counted.clone(), UpdateOp::assoc("visits", 1_i32)),
            (counted.clone(), UpdateOp::assoc("undeclared", 1_i32)),
            (counted, UpdateOp::assoc("visits", 2_i32)),
        ];
        let person = people().empty("Person").unwrap();
        assert!(pipe_cond(&person, &steps).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn assoc_if_sees_in_progress_state() {
        let person = people().empty("Person").unwrap();
        let ops = [
            UpdateOp::assoc("name", "Ann"),
            UpdateOp::assoc_if(|t| t.get("name").is_ok_and(|n| n.as_str() == Some("Ann")), "visits", 5_i32),
            UpdateOp::assoc_if(|t| t.has_field("address").unwrap_or(false), "name", "Bea"),
        ];
        let updated = pipe(&person, &ops).unwrap();
        assert_eq!(updated.get("visits").unwrap().as_i64(), Some(5));
        assert_eq!(updated.get("name").unwrap().as_str(), Some("Ann"));
    }

    #[test]
    fn debug_hides_closures() {
        assert_eq!(format!("{:?}", UpdateOp::clear("name")), "Clear { key: \"name\" }");
        assert_eq!(format!("{:?}", UpdateOp::update("visits", bump)), "Update { key: \"visits\", .. }");
        assert_eq!(
            format!("{:?}", UpdateOp::assoc_in("address.city".parse().unwrap(), "Oslo")),
            "AssocIn { path: \"address.city\", value: String(\"Oslo\") }"
        );
    }
}
