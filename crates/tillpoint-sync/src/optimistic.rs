//! Optimistic projections — pure, client-side approximations of a queued
//! mutation's effect, applied to the cached entity so the UI is not left
//! stale while the mutation waits for replay.
//!
//! One function per (table, action) pair, all `fn(&entity, &mutation_body)
//! -> projected_entity`. The server remains authoritative: the reload after
//! replay overwrites every projection with true state.

use std::collections::HashMap;

use serde_json::Value;

/// A pure projection: cached entity + mutation body → projected entity.
pub type ProjectionFn = fn(&Value, &Value) -> Value;

/// Registry of projections keyed by `table:action`.
pub struct ProjectionRegistry {
    entries: HashMap<String, ProjectionFn>,
}

impl ProjectionRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The built-in retail projections.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("products", "stock", project_set_stock);
        registry.register("accounts", "balance", project_adjust_balance);
        registry
    }

    pub fn register(&mut self, table: &str, action: &str, f: ProjectionFn) {
        self.entries.insert(format!("{table}:{action}"), f);
    }

    pub fn get(&self, table: &str, action: &str) -> Option<ProjectionFn> {
        self.entries.get(&format!("{table}:{action}")).copied()
    }
}

impl Default for ProjectionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// `PATCH /products/{id}/stock {newQuantity}` — set the stock level.
pub fn project_set_stock(entity: &Value, mutation: &Value) -> Value {
    let mut projected = entity.clone();
    if let (Some(obj), Some(qty)) = (projected.as_object_mut(), mutation.get("newQuantity")) {
        obj.insert("stock".to_string(), qty.clone());
    }
    projected
}

/// `POST /accounting/accounts/{code}/balance {delta}` — adjust the balance.
pub fn project_adjust_balance(entity: &Value, mutation: &Value) -> Value {
    let mut projected = entity.clone();
    let delta = mutation.get("delta").and_then(Value::as_f64).unwrap_or(0.0);
    if let Some(obj) = projected.as_object_mut() {
        let current = obj.get("balance").and_then(Value::as_f64).unwrap_or(0.0);
        obj.insert(
            "balance".to_string(),
            serde_json::json!(current + delta),
        );
    }
    projected
}

/// Shallow-merge a mutation body's fields into a cached entity — the
/// projection for plain `PUT`/`PATCH` edits with no action segment.
pub fn merge_fields(entity: &Value, mutation: &Value) -> Value {
    let mut projected = entity.clone();
    if let (Some(target), Some(source)) = (projected.as_object_mut(), mutation.as_object()) {
        for (field, value) in source {
            target.insert(field.clone(), value.clone());
        }
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_stock_replaces_only_the_stock_field() {
        let entity = json!({"id": "p1", "name": "Widget", "stock": 5});
        let projected = project_set_stock(&entity, &json!({"newQuantity": 4}));
        assert_eq!(projected, json!({"id": "p1", "name": "Widget", "stock": 4}));
        // Pure: the input is untouched.
        assert_eq!(entity["stock"], 5);
    }

    #[test]
    fn adjust_balance_is_additive() {
        let entity = json!({"code": "4000", "balance": 100.0});
        let projected = project_adjust_balance(&entity, &json!({"delta": -25.5}));
        assert_eq!(projected["balance"], 74.5);
    }

    #[test]
    fn adjust_balance_treats_missing_balance_as_zero() {
        let entity = json!({"code": "4000"});
        let projected = project_adjust_balance(&entity, &json!({"delta": 10.0}));
        assert_eq!(projected["balance"], 10.0);
    }

    #[test]
    fn merge_fields_overwrites_named_fields_only() {
        let entity = json!({"id": "c1", "name": "Ada", "email": "ada@example.com"});
        let projected = merge_fields(&entity, &json!({"email": "ada@shop.example"}));
        assert_eq!(projected["name"], "Ada");
        assert_eq!(projected["email"], "ada@shop.example");
    }

    #[test]
    fn registry_lookup_by_table_and_action() {
        let registry = ProjectionRegistry::with_defaults();
        assert!(registry.get("products", "stock").is_some());
        assert!(registry.get("products", "price").is_none());
        assert!(registry.get("accounts", "balance").is_some());
    }

    #[test]
    fn registry_accepts_custom_projections() {
        fn zero_stock(entity: &Value, _mutation: &Value) -> Value {
            let mut projected = entity.clone();
            if let Some(obj) = projected.as_object_mut() {
                obj.insert("stock".to_string(), json!(0));
            }
            projected
        }

        let mut registry = ProjectionRegistry::empty();
        registry.register("products", "clearance", zero_stock);
        let f = registry.get("products", "clearance").unwrap();
        assert_eq!(f(&json!({"id": "p1", "stock": 9}), &json!({}))["stock"], 0);
    }
}
