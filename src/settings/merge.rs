//! The settings merge engine.
//!
//! A pure function over JSON objects: no I/O, no logging, no mutation of
//! its inputs. Callers -- the installer, primarily -- turn the returned
//! [`MergeOutcome`] into user-facing messages in a separate step.
//!
//! Each top-level field is classified into one of three shapes and merged
//! under that shape's rule:
//!
//! - **Permission set** (the reserved `permissions` key holding
//!   `{allow, deny, ask}` string arrays on both sides): each array is
//!   unioned, existing elements first, duplicates and non-string items
//!   dropped.
//! - **Nested object** (plain objects on both sides): merged one level
//!   deep, copying only sub-keys absent from the existing object. On a
//!   sub-key conflict the existing value wins regardless of the
//!   `overwrite` flag, so a stack never silently reverses a choice the
//!   user already made.
//! - **Scalar** (everything else): absent keys are copied; conflicting
//!   keys keep the existing value unless `overwrite` is set, in which
//!   case only that key is replaced. Keys present only in the existing
//!   object are always preserved -- overwrite is selective, never a
//!   wholesale replace.

use serde_json::{Map, Value};

/// The reserved settings key receiving union-merge treatment.
pub const PERMISSIONS_KEY: &str = "permissions";

const PERMISSION_LISTS: [&str; 3] = ["allow", "deny", "ask"];

/// What happened to one field during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// The existing value was preserved.
    Kept,
    /// The incoming value was copied in (the field was absent, or a
    /// nested/permission sub-entry was new).
    Added,
    /// The incoming value replaced the existing one (`overwrite` only).
    Overwritten,
}

/// One field-level record in a merge outcome.
///
/// Nested additions are recorded with a dotted path (`editor.tabSize`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAction {
    pub field: String,
    pub action: MergeAction,
}

/// Result of merging an incoming settings object into an existing one.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The merged settings object.
    pub result: Map<String, Value>,
    /// Per-field record of what the merge did, in incoming-key order.
    pub actions: Vec<FieldAction>,
}

impl MergeOutcome {
    /// Number of fields copied in from the incoming object.
    #[must_use]
    pub fn added(&self) -> usize {
        self.actions.iter().filter(|a| a.action == MergeAction::Added).count()
    }

    /// Number of fields replaced under `overwrite`.
    #[must_use]
    pub fn overwritten(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.action == MergeAction::Overwritten)
            .count()
    }
}

/// Classification of a field pairing, selecting the merge rule.
#[derive(Debug)]
enum FieldShape<'a> {
    PermissionSet(&'a Map<String, Value>, &'a Map<String, Value>),
    NestedObject(&'a Map<String, Value>, &'a Map<String, Value>),
    Scalar,
}

fn classify<'a>(key: &str, existing: Option<&'a Value>, incoming: &'a Value) -> FieldShape<'a> {
    match (existing, incoming) {
        (Some(Value::Object(e)), Value::Object(i)) => {
            if key == PERMISSIONS_KEY && is_permission_shape(e) && is_permission_shape(i) {
                FieldShape::PermissionSet(e, i)
            } else {
                FieldShape::NestedObject(e, i)
            }
        }
        _ => FieldShape::Scalar,
    }
}

/// A permission set holds nothing but the three recognized string arrays.
fn is_permission_shape(obj: &Map<String, Value>) -> bool {
    obj.keys().all(|k| PERMISSION_LISTS.contains(&k.as_str()))
        && obj.values().all(Value::is_array)
}

/// Merge `incoming` into `existing`.
///
/// Neither input is mutated. `overwrite` affects only the scalar rule;
/// permission sets always union and nested objects always favor the
/// existing side on sub-key conflicts.
#[must_use]
pub fn merge(
    existing: &Map<String, Value>,
    incoming: &Map<String, Value>,
    overwrite: bool,
) -> MergeOutcome {
    let mut result = existing.clone();
    let mut actions = Vec::new();

    for (key, incoming_value) in incoming {
        match classify(key, existing.get(key), incoming_value) {
            FieldShape::PermissionSet(existing_obj, incoming_obj) => {
                let merged = merge_permission_sets(existing_obj, incoming_obj);
                result.insert(key.clone(), Value::Object(merged));
                actions.push(FieldAction {
                    field: key.clone(),
                    action: MergeAction::Kept,
                });
            }
            FieldShape::NestedObject(existing_obj, incoming_obj) => {
                let merged = merge_nested(key, existing_obj, incoming_obj, &mut actions);
                result.insert(key.clone(), Value::Object(merged));
            }
            FieldShape::Scalar => {
                if !existing.contains_key(key) {
                    result.insert(key.clone(), incoming_value.clone());
                    actions.push(FieldAction {
                        field: key.clone(),
                        action: MergeAction::Added,
                    });
                } else if overwrite {
                    result.insert(key.clone(), incoming_value.clone());
                    actions.push(FieldAction {
                        field: key.clone(),
                        action: MergeAction::Overwritten,
                    });
                } else {
                    actions.push(FieldAction {
                        field: key.clone(),
                        action: MergeAction::Kept,
                    });
                }
            }
        }
    }

    MergeOutcome { result, actions }
}

/// Union `allow`/`deny`/`ask`, existing entries first, no duplicates,
/// non-string items dropped.
fn merge_permission_sets(
    existing: &Map<String, Value>,
    incoming: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = Map::new();

    for list in PERMISSION_LISTS {
        let mut union: Vec<String> = Vec::new();
        for side in [existing.get(list), incoming.get(list)] {
            let Some(Value::Array(items)) = side else {
                continue;
            };
            for item in items {
                if let Value::String(s) = item {
                    if !union.iter().any(|u| u == s) {
                        union.push(s.clone());
                    }
                }
            }
        }
        if !union.is_empty()
            || existing.contains_key(list)
            || incoming.contains_key(list)
        {
            merged.insert(
                list.to_string(),
                Value::Array(union.into_iter().map(Value::String).collect()),
            );
        }
    }

    merged
}

/// One-level object merge: copy sub-keys absent from `existing`; on a
/// conflict the existing value wins.
fn merge_nested(
    key: &str,
    existing: &Map<String, Value>,
    incoming: &Map<String, Value>,
    actions: &mut Vec<FieldAction>,
) -> Map<String, Value> {
    let mut merged = existing.clone();

    for (sub_key, sub_value) in incoming {
        let field = format!("{key}.{sub_key}");
        if existing.contains_key(sub_key) {
            actions.push(FieldAction {
                field,
                action: MergeAction::Kept,
            });
        } else {
            merged.insert(sub_key.clone(), sub_value.clone());
            actions.push(FieldAction {
                field,
                action: MergeAction::Added,
            });
        }
    }

    merged
}
