//! Typed, path-scoped handling of diff operations.
//!
//! Instead of interpreting generic patches, a consumer registers rules: a
//! regular expression that must match the whole operation path, a set of
//! operation kinds, and a callback taking the value already decoded into the
//! type it expects.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//! use syncer_client::{PatchDispatcher, PatchOp};
//! use serde_json::json;
//!
//! let total = Arc::new(AtomicI64::new(0));
//! let sink = Arc::clone(&total);
//!
//! let mut dispatcher = PatchDispatcher::<()>::new();
//! dispatcher
//!     .add_rule(r"/items/([0-9]+)", PatchOp::Add | PatchOp::Replace, move |_, groups, _, value: i64| {
//!         assert_eq!(&groups[1], "7");
//!         sink.fetch_add(value, Ordering::SeqCst);
//!     })
//!     .expect("pattern compiles");
//!
//! assert_eq!(dispatcher.handle_op(&(), "/items/7", PatchOp::Replace, &json!(42)), 1);
//! assert_eq!(dispatcher.handle_op(&(), "/items/7", PatchOp::Remove, &json!(null)), 0);
//! assert_eq!(total.load(Ordering::SeqCst), 42);
//! ```

mod rule;

pub use rule::{OpHandler, PatchRule};

use crate::error::{ClientError, ClientResult};
use regex::{Captures, Regex};
use rule::TypedHandler;
use serde::de::DeserializeOwned;
use serde_json::Value;
use syncer_core::{Diff, PatchOp, PatchOpSet};

/// An ordered set of dispatch rules.
///
/// `C` is the context handed to every handler, typically the consumer's
/// current view of the replicated state.
///
/// Rules are registered during setup through `&mut self` and never change
/// afterwards. Dispatch only reads the rule list, so once setup is done a
/// dispatcher can be shared (`Arc<PatchDispatcher<C>>`) and driven from many
/// threads at once.
pub struct PatchDispatcher<C = Value> {
    rules: Vec<PatchRule<C>>,
}

impl<C> Default for PatchDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> PatchDispatcher<C> {
    /// Create a dispatcher with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register a rule.
    ///
    /// `pattern` must match the entire operation path; capture groups are
    /// passed to the handler. For add and replace operations the raw value is
    /// decoded into `T` first; if that fails a warning is logged and the
    /// handler receives `T::default()`. Remove operations always pass
    /// `T::default()` without decoding.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidPattern`] if `pattern` is not a valid
    /// regular expression.
    pub fn add_rule<T, F>(
        &mut self,
        pattern: &str,
        ops: impl Into<PatchOpSet>,
        handler: F,
    ) -> ClientResult<&mut Self>
    where
        T: DeserializeOwned + Default + 'static,
        F: Fn(&C, &Captures<'_>, PatchOp, T) + Send + Sync + 'static,
    {
        let invalid = |source| ClientError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        };
        // wrapping can balance a stray paren, so the bare pattern is checked first
        Regex::new(pattern).map_err(invalid)?;
        // whole-path match only
        let compiled = Regex::new(&format!("^(?:{pattern})$")).map_err(invalid)?;

        self.rules.push(PatchRule::new(
            pattern.to_string(),
            compiled,
            ops.into(),
            Box::new(TypedHandler::new(handler)),
        ));
        Ok(self)
    }

    /// Dispatch a single operation.
    ///
    /// Every rule whose mask contains `op` and whose pattern matches `path`
    /// runs exactly once, in registration order. Returns how many ran.
    pub fn handle_op(&self, ctx: &C, path: &str, op: PatchOp, raw: &Value) -> usize {
        let mut fired = 0;
        for rule in &self.rules {
            if let Some(groups) = rule.matches(path, op) {
                rule.handler().handle(ctx, &groups, op, raw);
                fired += 1;
            }
        }
        fired
    }

    /// Dispatch every operation of `diff` in order. Returns the total number
    /// of handler invocations.
    pub fn handle_diff(&self, ctx: &C, diff: &Diff) -> usize {
        diff.iter()
            .map(|op| self.handle_op(ctx, &op.path, op.op, op.value_or_null()))
            .sum()
    }

    /// The registered rules, in registration order.
    #[must_use]
    pub fn rules(&self) -> &[PatchRule<C>] {
        &self.rules
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<C> std::fmt::Debug for PatchDispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchDispatcher")
            .field("rules", &self.rules)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use syncer_core::DiffOp;

    type Log = Arc<Mutex<Vec<String>>>;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn items_pattern_scenario() {
        let seen = log();
        let sink = Arc::clone(&seen);
        let mut dispatcher = PatchDispatcher::<Value>::new();
        dispatcher
            .add_rule(
                "^/items/([0-9]+)$",
                PatchOp::Add | PatchOp::Replace,
                move |_, groups, op, value: i64| {
                    sink.lock().unwrap().push(format!("{op} {} {value}", &groups[1]));
                },
            )
            .unwrap();

        let ctx = json!({});
        assert_eq!(dispatcher.handle_op(&ctx, "/items/7", PatchOp::Replace, &json!(42)), 1);
        assert_eq!(dispatcher.handle_op(&ctx, "/items/7", PatchOp::Remove, &Value::Null), 0);
        assert_eq!(entries(&seen), vec!["replace 7 42"]);
    }

    #[test]
    fn requires_whole_path_match() {
        let seen = log();
        let sink = Arc::clone(&seen);
        let mut dispatcher = PatchDispatcher::<()>::new();
        dispatcher
            .add_rule("/items/[0-9]+", PatchOpSet::ANY, move |_, groups, _, _: Value| {
                sink.lock().unwrap().push(groups[0].to_string());
            })
            .unwrap();

        assert_eq!(dispatcher.handle_op(&(), "/items/12/name", PatchOp::Add, &json!("x")), 0);
        assert_eq!(dispatcher.handle_op(&(), "/root/items/12", PatchOp::Add, &json!("x")), 0);
        assert_eq!(dispatcher.handle_op(&(), "/items/12", PatchOp::Add, &json!("x")), 1);
        assert_eq!(entries(&seen), vec!["/items/12"]);
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let mut dispatcher = PatchDispatcher::<()>::new();
        dispatcher
            .add_rule("/a|/b", PatchOpSet::ANY, |_, _, _, _: Value| {})
            .unwrap();

        assert_eq!(dispatcher.handle_op(&(), "/a", PatchOp::Add, &json!(1)), 1);
        assert_eq!(dispatcher.handle_op(&(), "/b", PatchOp::Add, &json!(1)), 1);
        assert_eq!(dispatcher.handle_op(&(), "/a/b", PatchOp::Add, &json!(1)), 0);
    }

    #[test]
    fn all_matching_rules_fire_in_order() {
        let seen = log();
        let mut dispatcher = PatchDispatcher::<()>::new();

        for (name, pattern, ops) in [
            ("first", "/users/.*", PatchOpSet::ANY),
            ("replace-only", "/users/([a-z]+)", PatchOpSet::from(PatchOp::Replace)),
            ("add-only", "/users/([a-z]+)", PatchOpSet::from(PatchOp::Add)),
            ("other-path", "/groups/.*", PatchOpSet::ANY),
            ("last", "/users/bob", PatchOpSet::ANY),
        ] {
            let sink = Arc::clone(&seen);
            dispatcher
                .add_rule(pattern, ops, move |_, _, _, _: Value| {
                    sink.lock().unwrap().push(name.to_string());
                })
                .unwrap();
        }

        let fired = dispatcher.handle_op(&(), "/users/bob", PatchOp::Replace, &json!({}));
        assert_eq!(fired, 3);
        assert_eq!(entries(&seen), vec!["first", "replace-only", "last"]);
    }

    #[test]
    fn remove_skips_decoding() {
        #[derive(Debug, Default, Deserialize, PartialEq)]
        struct Item {
            name: String,
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut dispatcher = PatchDispatcher::<()>::new();
        dispatcher
            .add_rule("/items/.*", PatchOpSet::ANY, move |_, _, op, item: Item| {
                sink.lock().unwrap().push((op, item));
            })
            .unwrap();

        // a remove carrying a decodable value still yields the default
        dispatcher.handle_op(&(), "/items/1", PatchOp::Remove, &json!({"name": "kept?"}));
        dispatcher.handle_op(&(), "/items/1", PatchOp::Add, &json!({"name": "new"}));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], (PatchOp::Remove, Item::default()));
        assert_eq!(seen[1], (PatchOp::Add, Item { name: "new".into() }));
    }

    #[test]
    fn decode_failure_uses_default_and_isolates_rules() {
        let seen = log();
        let mut dispatcher = PatchDispatcher::<()>::new();

        let sink = Arc::clone(&seen);
        dispatcher
            .add_rule("/count", PatchOpSet::ANY, move |_, _, _, value: u32| {
                sink.lock().unwrap().push(format!("u32:{value}"));
            })
            .unwrap();
        let sink = Arc::clone(&seen);
        dispatcher
            .add_rule("/count", PatchOpSet::ANY, move |_, _, _, value: String| {
                sink.lock().unwrap().push(format!("string:{value}"));
            })
            .unwrap();

        let fired = dispatcher.handle_op(&(), "/count", PatchOp::Replace, &json!("seven"));
        assert_eq!(fired, 2);
        assert_eq!(entries(&seen), vec!["u32:0", "string:seven"]);
    }

    #[test]
    fn invalid_pattern_fails_fast() {
        let mut dispatcher = PatchDispatcher::<()>::new();
        let result = dispatcher.add_rule("/items/(", PatchOpSet::ANY, |_, _, _, _: Value| {});

        assert_matches!(result, Err(ClientError::InvalidPattern { ref pattern, .. }) if pattern == "/items/(");
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn pattern_balanced_only_by_anchoring_is_rejected() {
        let mut dispatcher = PatchDispatcher::<()>::new();
        let result = dispatcher.add_rule("/a)|(/b", PatchOpSet::ANY, |_, _, _, _: Value| {});

        assert_matches!(result, Err(ClientError::InvalidPattern { ref pattern, .. }) if pattern == "/a)|(/b");
        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.handle_op(&(), "/a/zzz", PatchOp::Add, &json!(1)), 0);
        assert_eq!(dispatcher.handle_op(&(), "/xx/b", PatchOp::Add, &json!(1)), 0);
    }

    #[test]
    fn handle_diff_visits_every_operation() {
        let seen = log();
        let sink = Arc::clone(&seen);
        let mut dispatcher = PatchDispatcher::<Value>::new();
        dispatcher
            .add_rule("/([a-z]+)", PatchOpSet::ANY, move |ctx, groups, op, _: Value| {
                let name = &groups[1];
                sink.lock()
                    .unwrap()
                    .push(format!("{op} {name} ctx={}", ctx[name]));
            })
            .unwrap();

        let diff = Diff(vec![
            DiffOp::replace("/a", json!(2)),
            DiffOp::remove("/b"),
            DiffOp::replace("/__syncer_data_version", json!(3)),
        ]);
        let ctx = json!({"a": 2});

        assert_eq!(dispatcher.handle_diff(&ctx, &diff), 2);
        assert_eq!(entries(&seen), vec!["replace a ctx=2", "remove b ctx=null"]);
    }

    #[test]
    fn context_is_passed_through() {
        let mut dispatcher = PatchDispatcher::<Mutex<Vec<i64>>>::new();
        dispatcher
            .add_rule("/n", PatchOp::Add, |ctx: &Mutex<Vec<i64>>, _, _, value: i64| {
                ctx.lock().unwrap().push(value);
            })
            .unwrap();

        let ctx = Mutex::new(Vec::new());
        dispatcher.handle_op(&ctx, "/n", PatchOp::Add, &json!(5));
        dispatcher.handle_op(&ctx, "/n", PatchOp::Add, &json!(6));
        assert_eq!(*ctx.lock().unwrap(), vec![5, 6]);
    }
}
