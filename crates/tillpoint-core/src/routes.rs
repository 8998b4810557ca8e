//! Declared routing table: endpoint prefix → cache table + key field.
//!
//! The cache-fallback path needs to know, for a given endpoint, which local
//! table mirrors it and how records in that table are keyed. That mapping is
//! declared here explicitly rather than guessed from the URL shape, so the
//! API surface and the cache schema can evolve independently.

use serde_json::Value;

/// How records in a cache table are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKey {
    /// Keyed by the named field of each record.
    Field(&'static str),
    /// Single-slot table holding at most one record, no key field.
    Singleton,
}

/// One declared route: an endpoint prefix and the cache table behind it.
#[derive(Debug, Clone)]
pub struct Route {
    /// Endpoint path prefix without the leading slash, e.g. `products` or
    /// `accounting/accounts`. May span multiple path segments.
    pub prefix: &'static str,
    /// Cache table name in the local store.
    pub table: &'static str,
    pub key: RouteKey,
}

impl Route {
    /// The key field name, or `None` for singleton tables.
    pub fn key_field(&self) -> Option<&'static str> {
        match self.key {
            RouteKey::Field(name) => Some(name),
            RouteKey::Singleton => None,
        }
    }

    /// Extract a record's key using the declared key field. String and
    /// integer identifiers are both accepted; integers are stringified.
    pub fn record_key(&self, record: &Value) -> Option<String> {
        let field = self.key_field()?;
        match record.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// The full declared catalog. Resolution walks the registered routes and
/// matches the longest prefix, so `accounting/accounts` wins over any
/// single-segment route that might share its first segment.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build an empty table. Most callers want [`RouteTable::retail_catalog`].
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// The default retail catalog: every entity type the application caches.
    /// `accounts` is keyed by its chart-of-accounts `code`; everything else
    /// by `id`; `settings` is the one singleton slot.
    pub fn retail_catalog() -> Self {
        let mut table = Self::new();
        table.register(Route {
            prefix: "products",
            table: "products",
            key: RouteKey::Field("id"),
        });
        table.register(Route {
            prefix: "customers",
            table: "customers",
            key: RouteKey::Field("id"),
        });
        table.register(Route {
            prefix: "suppliers",
            table: "suppliers",
            key: RouteKey::Field("id"),
        });
        table.register(Route {
            prefix: "sales",
            table: "sales",
            key: RouteKey::Field("id"),
        });
        table.register(Route {
            prefix: "purchases",
            table: "purchases",
            key: RouteKey::Field("id"),
        });
        table.register(Route {
            prefix: "expenses",
            table: "expenses",
            key: RouteKey::Field("id"),
        });
        table.register(Route {
            prefix: "accounting/accounts",
            table: "accounts",
            key: RouteKey::Field("code"),
        });
        table.register(Route {
            prefix: "accounting/journal-entries",
            table: "journal_entries",
            key: RouteKey::Field("id"),
        });
        table.register(Route {
            prefix: "settings",
            table: "settings",
            key: RouteKey::Singleton,
        });
        table
    }

    /// Register one route. Later registrations with a longer prefix take
    /// precedence during resolution.
    pub fn register(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Resolve an endpoint path to its declared route, longest prefix wins.
    /// Returns `None` for endpoints with no cache behind them.
    pub fn resolve(&self, endpoint: &str) -> Option<&Route> {
        let path = normalize(endpoint);
        self.routes
            .iter()
            .filter(|r| {
                path == r.prefix
                    || path
                        .strip_prefix(r.prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|r| r.prefix.len())
    }

    /// Extract the entity key from an endpoint, if present: the path segment
    /// immediately after the route prefix. `/products/p1/stock` → `p1`;
    /// `/products` → `None`.
    pub fn endpoint_key<'a>(&self, route: &Route, endpoint: &'a str) -> Option<&'a str> {
        let path = normalize(endpoint);
        let rest = path.strip_prefix(route.prefix)?.strip_prefix('/')?;
        let key = rest.split('/').next()?;
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// Extract the action segment of an endpoint: the path segment after the
    /// entity key, if any. `/products/p1/stock` → `stock`; `/products/p1`
    /// and `/products` → `None`.
    pub fn endpoint_action<'a>(&self, route: &Route, endpoint: &'a str) -> Option<&'a str> {
        let path = normalize(endpoint);
        let rest = path.strip_prefix(route.prefix)?.strip_prefix('/')?;
        let mut segments = rest.split('/');
        segments.next()?;
        let action = segments.next()?;
        if action.is_empty() {
            None
        } else {
            Some(action)
        }
    }

    /// Look up a route by its cache table name.
    pub fn route_for_table(&self, table: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.table == table)
    }

    /// All registered routes, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Every keyed (non-singleton) route — the set the controller fans out
    /// over during a full load.
    pub fn keyed_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes
            .iter()
            .filter(|r| !matches!(r.key, RouteKey::Singleton))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::retail_catalog()
    }
}

/// Strip the leading slash and any query string.
fn normalize(endpoint: &str) -> &str {
    let path = endpoint.strip_prefix('/').unwrap_or(endpoint);
    path.split('?').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_single_segment_routes() {
        let table = RouteTable::retail_catalog();
        let route = table.resolve("/products/p1/stock").unwrap();
        assert_eq!(route.table, "products");
        assert_eq!(table.endpoint_key(route, "/products/p1/stock"), Some("p1"));
    }

    #[test]
    fn action_segment_follows_the_key() {
        let table = RouteTable::retail_catalog();
        let route = table.resolve("/products/p1/stock").unwrap();
        assert_eq!(
            table.endpoint_action(route, "/products/p1/stock"),
            Some("stock")
        );
        assert_eq!(table.endpoint_action(route, "/products/p1"), None);
        assert_eq!(table.endpoint_action(route, "/products"), None);
    }

    #[test]
    fn collection_endpoint_has_no_key() {
        let table = RouteTable::retail_catalog();
        let route = table.resolve("/customers").unwrap();
        assert_eq!(table.endpoint_key(route, "/customers"), None);
    }

    #[test]
    fn longest_prefix_wins_for_nested_routes() {
        let table = RouteTable::retail_catalog();
        let route = table.resolve("/accounting/accounts/4000").unwrap();
        assert_eq!(route.table, "accounts");
        assert_eq!(route.key_field(), Some("code"));
        assert_eq!(
            table.endpoint_key(route, "/accounting/accounts/4000"),
            Some("4000")
        );
    }

    #[test]
    fn unregistered_endpoints_do_not_resolve() {
        let table = RouteTable::retail_catalog();
        assert!(table.resolve("/reports/daily").is_none());
        // A shared first segment is not enough: the declared prefix must match.
        assert!(table.resolve("/accounting/budgets").is_none());
    }

    #[test]
    fn query_strings_are_ignored() {
        let table = RouteTable::retail_catalog();
        let route = table.resolve("/sales?from=2024-01-01").unwrap();
        assert_eq!(route.table, "sales");
    }

    #[test]
    fn record_key_accepts_strings_and_numbers() {
        let table = RouteTable::retail_catalog();
        let products = table.route_for_table("products").unwrap();
        let accounts = table.route_for_table("accounts").unwrap();

        let rec = serde_json::json!({"id": "p1", "name": "Widget"});
        assert_eq!(products.record_key(&rec), Some("p1".to_string()));

        let acct = serde_json::json!({"code": 4000, "name": "Sales Revenue"});
        assert_eq!(accounts.record_key(&acct), Some("4000".to_string()));

        let missing = serde_json::json!({"name": "no id"});
        assert_eq!(products.record_key(&missing), None);
    }

    #[test]
    fn settings_route_is_singleton() {
        let table = RouteTable::retail_catalog();
        let route = table.resolve("/settings").unwrap();
        assert_eq!(route.key, RouteKey::Singleton);
        assert_eq!(route.key_field(), None);
    }

    proptest::proptest! {
        #[test]
        fn prop_endpoint_key_extraction(key in "[A-Za-z0-9-]{1,24}") {
            let table = RouteTable::retail_catalog();
            let endpoint = format!("/products/{key}");
            let route = table.resolve(&endpoint).unwrap();
            proptest::prop_assert_eq!(table.endpoint_key(route, &endpoint), Some(key.as_str()));
        }
    }
}
