//! Structured events and rule violations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ACTOR_KEY: &str = "user";
const ACTOR_ALIAS: &str = "actor";
const ACTION_KEY: &str = "action";

/// An `{actor, action}` record extracted from a raw log line.
///
/// Either field may be missing when extraction only partly succeeded. Any
/// other keys the extractor produced are kept, unvalidated, in `extra`.
///
/// On the wire the actor is keyed `user`; `actor` is accepted as an alias.
/// Non-string or blank values for either key are treated as missing.
///
/// # Examples
///
/// ```rust
/// use alisa_core::StructuredEvent;
///
/// let event = StructuredEvent::new("u_finance_01", "Create_Invoice");
/// assert_eq!(event.actor(), Some("u_finance_01"));
///
/// let json = serde_json::json!({"actor": "root", "Component": "sshd"});
/// let partial: StructuredEvent = serde_json::from_value(json).unwrap();
/// assert_eq!(partial.actor(), Some("root"));
/// assert_eq!(partial.action(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct StructuredEvent {
    /// Identity that performed the action.
    pub actor: Option<String>,

    /// Name of the action performed.
    pub action: Option<String>,

    /// Additional fields carried through from extraction.
    pub extra: Map<String, Value>,
}

impl StructuredEvent {
    /// Creates a complete event.
    #[must_use]
    pub fn new(actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            actor: Some(actor.into()),
            action: Some(action.into()),
            extra: Map::new(),
        }
    }

    /// Creates an event with no actor and no action.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds an extra field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns the actor, ignoring blank values.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        non_blank(self.actor.as_deref())
    }

    /// Returns the action, ignoring blank values.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        non_blank(self.action.as_deref())
    }

    /// Returns true if both actor and action are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.actor().is_some() && self.action().is_some()
    }

    /// Returns true if the event carries no data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actor.is_none() && self.action.is_none() && self.extra.is_empty()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            // Non-string values stay in `extra`.
            map.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

impl From<Map<String, Value>> for StructuredEvent {
    fn from(mut map: Map<String, Value>) -> Self {
        let actor = take_string(&mut map, ACTOR_KEY).or_else(|| take_string(&mut map, ACTOR_ALIAS));
        let action = take_string(&mut map, ACTION_KEY);
        Self {
            actor,
            action,
            extra: map,
        }
    }
}

impl From<StructuredEvent> for Map<String, Value> {
    fn from(event: StructuredEvent) -> Self {
        let mut map = event.extra;
        if let Some(actor) = event.actor {
            map.insert(ACTOR_KEY.to_string(), Value::String(actor));
        }
        if let Some(action) = event.action {
            map.insert(ACTION_KEY.to_string(), Value::String(action));
        }
        map
    }
}

/// A segregation-of-duties violation: one actor holds both actions of a
/// conflicting pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Control identifier of the rule that was violated (e.g. "AC-5").
    pub control_id: String,

    /// Name of the rule in the policy document.
    pub rule: String,

    /// Actor holding both actions.
    pub actor: String,

    /// First action of the pair, as written in the policy.
    pub action_a: String,

    /// Second action of the pair, as written in the policy.
    pub action_b: String,

    /// Human-readable description of the finding.
    pub message: String,
}

impl Violation {
    /// Creates a violation with the standard message.
    #[must_use]
    pub fn new(
        control_id: impl Into<String>,
        rule: impl Into<String>,
        actor: impl Into<String>,
        action_a: impl Into<String>,
        action_b: impl Into<String>,
    ) -> Self {
        let control_id = control_id.into();
        let actor = actor.into();
        let action_a = action_a.into();
        let action_b = action_b.into();
        let message = format!(
            "SoD VIOLATION DETECTED ({control_id}): User '{actor}' performed conflicting actions: {action_a} + {action_b}"
        );
        Self {
            control_id,
            rule: rule.into(),
            actor,
            action_a,
            action_b,
            message,
        }
    }
}
