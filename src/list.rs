//! Generic reorderable-list editing.
//!
//! One controller replaces the add/update/remove/reorder logic every form
//! page used to hand-roll per list field. It operates on the list's JSON
//! array in place, with the list's [`ListSpec`] supplying record defaults,
//! identity prefixes, and plan caps.

use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;
use crate::path::PathError;
use crate::schema::{ListSpec, Plan};

/// Editing operations over one list field's records.
///
/// Only `add` is tier-gated, so the plan is an argument there rather than
/// part of the controller.
pub struct ListController<'a> {
    items: &'a mut Vec<Value>,
    spec: &'a ListSpec,
    /// Path string used in error messages.
    field: &'a str,
}

impl<'a> ListController<'a> {
    pub fn new(items: &'a mut Vec<Value>, spec: &'a ListSpec, field: &'a str) -> Self {
        Self { items, spec, field }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the plan cap is reached. UIs disable their add control on
    /// this; `save()` never checks it.
    pub fn at_limit(&self, plan: Plan) -> bool {
        self.items.len() >= self.spec.max_items.for_plan(plan)
    }

    /// Append a blank record with a generated identity. Refused with
    /// [`StoreError::LimitReached`] at the plan cap.
    pub fn add(&mut self, plan: Plan) -> Result<usize, StoreError> {
        let limit = self.spec.max_items.for_plan(plan);
        if self.items.len() >= limit {
            return Err(StoreError::LimitReached { limit });
        }
        let id = format!("{}-{}", self.spec.id_prefix, Uuid::new_v4());
        self.items.push(self.spec.default_item(&id));
        self.renumber();
        Ok(self.items.len() - 1)
    }

    /// Shallow-merge a partial object over the record at `index`.
    pub fn update(&mut self, index: usize, patch: &Value) -> Result<(), StoreError> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(self.field, index, len))?;
        if let (Some(target), Some(fields)) = (item.as_object_mut(), patch.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }

    /// Delete the record at `index`. A list is never left truly empty: the
    /// last removal substitutes a single blank placeholder record.
    pub fn remove(&mut self, index: usize) -> Result<Value, StoreError> {
        let len = self.items.len();
        if index >= len {
            return Err(out_of_bounds(self.field, index, len));
        }
        let removed = self.items.remove(index);
        if self.items.is_empty() {
            let id = format!("{}-{}", self.spec.id_prefix, Uuid::new_v4());
            self.items.push(self.spec.default_item(&id));
        }
        self.renumber();
        Ok(removed)
    }

    /// Move a record from `from` to `to` (remove-then-insert), renumbering
    /// the sequential order field when the spec declares one.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        let len = self.items.len();
        if from >= len {
            return Err(out_of_bounds(self.field, from, len));
        }
        if to >= len {
            return Err(out_of_bounds(self.field, to, len));
        }
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
            self.renumber();
        }
        Ok(())
    }

    fn renumber(&mut self) {
        if let Some(order) = &self.spec.order_field {
            for (i, item) in self.items.iter_mut().enumerate() {
                if let Some(obj) = item.as_object_mut() {
                    obj.insert(order.clone(), serde_json::json!(i + 1));
                }
            }
        }
    }
}

fn out_of_bounds(field: &str, index: usize, len: usize) -> StoreError {
    StoreError::Path(PathError::IndexOutOfBounds {
        path: field.to_string(),
        index,
        len,
    })
}
