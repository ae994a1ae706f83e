//! Segregation-of-duties rule engine.
//!
//! The engine remembers, per actor, the distinct actions it has seen and
//! reports a [`Violation`] whenever an actor holds both actions of a
//! conflicting pair from the [`ConflictPolicy`].
//!
//! An actor is either unobserved (no entry) or observed with a set of
//! actions. Observing an action unions it into the set; observing the same
//! action again is a no-op. With the default [`HistoryMode::Unbounded`] the
//! set only ever grows.
//!
//! With the default [`ReportingMode::EveryEvent`], every satisfied pair is
//! reported on every event for that actor, including events whose action has
//! nothing to do with the pair.
//!
//! All history lives behind a single mutex owned by the engine, so
//! concurrent `analyze` calls for the same actor never lose an update.
//!
//! # Example
//!
//! ```rust
//! use alisa_core::{ConflictPolicy, ConflictRule, SoDRuleEngine, StructuredEvent};
//!
//! let policy = ConflictPolicy::from_rules(vec![
//!     ConflictRule::new("nist_ac2_sod", "AC-5").with_pair("Create_Invoice", "Approve_Payment"),
//! ]).unwrap();
//! let engine = SoDRuleEngine::new(policy);
//!
//! assert!(engine.analyze(&StructuredEvent::new("u1", "Create_Invoice")).is_empty());
//!
//! let violations = engine.analyze(&StructuredEvent::new("u1", "Approve_Payment"));
//! assert_eq!(violations.len(), 1);
//! assert_eq!(violations[0].control_id, "AC-5");
//! ```

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{StructuredEvent, Violation};
use crate::policy::ConflictPolicy;

/// How much per-actor history the engine keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HistoryMode {
    /// Remember every action ever observed.
    #[default]
    Unbounded,
    /// Remember only the `max_actions` most recently observed distinct
    /// actions per actor.
    Window {
        /// Maximum number of distinct actions kept per actor.
        max_actions: NonZeroUsize,
    },
}

/// When a satisfied conflict pair is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingMode {
    /// Report every satisfied pair on every event for the actor.
    #[default]
    EveryEvent,
    /// Report a pair once per actor, until one of its actions leaves the
    /// history window.
    FirstOccurrence,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// History retention.
    #[serde(default)]
    pub history: HistoryMode,
    /// Violation reporting.
    #[serde(default)]
    pub reporting: ReportingMode,
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the history mode.
    #[must_use]
    pub const fn with_history(mut self, history: HistoryMode) -> Self {
        self.history = history;
        self
    }

    /// Sets the reporting mode.
    #[must_use]
    pub const fn with_reporting(mut self, reporting: ReportingMode) -> Self {
        self.reporting = reporting;
        self
    }
}

#[derive(Debug, Default)]
struct ActorHistory {
    actions: HashSet<String>,
    // Least recently observed first. Only maintained in window mode.
    recency: VecDeque<String>,
    // Flattened pair indices whose two actions are both in `actions`.
    satisfied: BTreeSet<usize>,
    reported: HashSet<usize>,
}

impl ActorHistory {
    fn observe(&mut self, action: &str, policy: &ConflictPolicy, history: HistoryMode) {
        let window = match history {
            HistoryMode::Unbounded => None,
            HistoryMode::Window { max_actions } => Some(max_actions.get()),
        };

        if self.actions.contains(action) {
            if window.is_some() {
                self.touch(action);
            }
            return;
        }

        self.actions.insert(action.to_string());
        if let Some(max) = window {
            self.recency.push_back(action.to_string());
            while self.recency.len() > max {
                if let Some(evicted) = self.recency.pop_front() {
                    self.forget(&evicted, policy);
                }
            }
        }

        for partner in policy.partners(action) {
            if self.actions.contains(&partner.other) {
                self.satisfied.insert(partner.pair);
            }
        }
    }

    fn touch(&mut self, action: &str) {
        if let Some(pos) = self.recency.iter().position(|a| a == action) {
            if let Some(a) = self.recency.remove(pos) {
                self.recency.push_back(a);
            }
        }
    }

    fn forget(&mut self, action: &str, policy: &ConflictPolicy) {
        self.actions.remove(action);
        for partner in policy.partners(action) {
            self.satisfied.remove(&partner.pair);
            self.reported.remove(&partner.pair);
        }
    }
}

/// Rule engine holding per-actor action history.
#[derive(Debug)]
pub struct SoDRuleEngine {
    policy: ConflictPolicy,
    config: EngineConfig,
    history: Mutex<HashMap<String, ActorHistory>>,
}

impl SoDRuleEngine {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(policy: ConflictPolicy) -> Self {
        Self::with_config(policy, EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn with_config(policy: ConflictPolicy, config: EngineConfig) -> Self {
        Self {
            policy,
            config,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the loaded policy.
    #[must_use]
    pub const fn policy(&self) -> &ConflictPolicy {
        &self.policy
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Records the event's action for its actor and returns the violations
    /// now satisfied, in policy pair order.
    ///
    /// An event without an actor or without an action is ignored and leaves
    /// the history untouched.
    #[must_use]
    pub fn analyze(&self, event: &StructuredEvent) -> Vec<Violation> {
        let (Some(actor), Some(action)) = (event.actor(), event.action()) else {
            debug!(
                actor = ?event.actor(),
                action = ?event.action(),
                "Skipping event without actor or action"
            );
            return Vec::new();
        };

        let mut history = self.history.lock();
        let state = history.entry(actor.to_string()).or_default();
        state.observe(action, &self.policy, self.config.history);

        let mut violations = Vec::new();
        for &index in &state.satisfied {
            if self.config.reporting == ReportingMode::FirstOccurrence
                && !state.reported.insert(index)
            {
                continue;
            }
            if let Some((rule, pair)) = self.policy.pair(index) {
                violations.push(Violation::new(
                    &rule.control_id,
                    &rule.name,
                    actor,
                    &pair.first,
                    &pair.second,
                ));
            }
        }

        debug!(
            actor,
            action,
            known_actions = state.actions.len(),
            violations = violations.len(),
            "Analyzed event"
        );
        violations
    }

    /// Returns the actions currently recorded for `actor`.
    #[must_use]
    pub fn actions_for(&self, actor: &str) -> Option<BTreeSet<String>> {
        self.history
            .lock()
            .get(actor)
            .map(|state| state.actions.iter().cloned().collect())
    }

    /// Returns the number of observed actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.history.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ConflictRule;
    use std::sync::Arc;

    fn invoice_policy() -> ConflictPolicy {
        ConflictPolicy::from_rules(vec![
            ConflictRule::new("nist_ac2_sod", "AC-5")
                .with_pair("Create_Invoice", "Approve_Payment")
                .with_pair("Create_Vendor", "Pay_Vendor"),
            ConflictRule::new("change_control", "CM-5").with_pair("Commit_Change", "Approve_Change"),
        ])
        .unwrap()
    }

    fn window(max: usize) -> EngineConfig {
        EngineConfig::new().with_history(HistoryMode::Window {
            max_actions: NonZeroUsize::new(max).unwrap(),
        })
    }

    #[test]
    fn test_conflicting_pair_detected() {
        let engine = SoDRuleEngine::new(invoice_policy());

        assert!(engine
            .analyze(&StructuredEvent::new("u1", "Create_Invoice"))
            .is_empty());

        let violations = engine.analyze(&StructuredEvent::new("u1", "Approve_Payment"));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].control_id, "AC-5");
        assert_eq!(violations[0].rule, "nist_ac2_sod");
        assert_eq!(violations[0].actor, "u1");
        assert_eq!(violations[0].action_a, "Create_Invoice");
        assert_eq!(violations[0].action_b, "Approve_Payment");
    }

    #[test]
    fn test_detection_is_order_independent() {
        let engine = SoDRuleEngine::new(invoice_policy());

        let _ = engine.analyze(&StructuredEvent::new("u1", "Approve_Payment"));
        let violations = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].action_a, "Create_Invoice");
    }

    #[test]
    fn test_history_is_monotonic() {
        let engine = SoDRuleEngine::new(invoice_policy());

        let _ = engine.analyze(&StructuredEvent::new("a", "X"));
        let _ = engine.analyze(&StructuredEvent::new("a", "Y"));
        let _ = engine.analyze(&StructuredEvent::new("a", "X"));

        let actions = engine.actions_for("a").unwrap();
        assert_eq!(actions, BTreeSet::from(["X".to_string(), "Y".to_string()]));
    }

    #[test]
    fn test_no_cross_actor_leakage() {
        let engine = SoDRuleEngine::new(invoice_policy());

        let _ = engine.analyze(&StructuredEvent::new("alice", "Create_Invoice"));
        let violations = engine.analyze(&StructuredEvent::new("bob", "Approve_Payment"));

        assert!(violations.is_empty());
        assert_eq!(engine.actor_count(), 2);
    }

    #[test]
    fn test_partial_events_do_not_mutate_state() {
        let engine = SoDRuleEngine::new(invoice_policy());

        let no_action = StructuredEvent {
            actor: Some("u1".to_string()),
            ..StructuredEvent::default()
        };
        let no_actor = StructuredEvent {
            action: Some("x".to_string()),
            ..StructuredEvent::default()
        };

        assert!(engine.analyze(&no_action).is_empty());
        assert!(engine.analyze(&no_actor).is_empty());
        assert_eq!(engine.actor_count(), 0);
        assert!(engine.actions_for("u1").is_none());
    }

    #[test]
    fn test_violation_retriggers_on_every_event() {
        let engine = SoDRuleEngine::new(invoice_policy());

        let _ = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));
        let _ = engine.analyze(&StructuredEvent::new("u1", "Approve_Payment"));

        let again = engine.analyze(&StructuredEvent::new("u1", "Login"));
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].action_b, "Approve_Payment");

        let repeat = engine.analyze(&StructuredEvent::new("u1", "Approve_Payment"));
        assert_eq!(repeat.len(), 1);
    }

    #[test]
    fn test_violations_follow_policy_order() {
        let engine = SoDRuleEngine::new(invoice_policy());

        for action in ["Approve_Change", "Pay_Vendor", "Commit_Change", "Create_Vendor"] {
            let _ = engine.analyze(&StructuredEvent::new("u1", action));
        }
        let _ = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));
        let violations = engine.analyze(&StructuredEvent::new("u1", "Approve_Payment"));

        let controls: Vec<_> = violations
            .iter()
            .map(|v| (v.control_id.as_str(), v.action_a.as_str()))
            .collect();
        assert_eq!(
            controls,
            vec![
                ("AC-5", "Create_Invoice"),
                ("AC-5", "Create_Vendor"),
                ("CM-5", "Commit_Change"),
            ]
        );
    }

    #[test]
    fn test_first_occurrence_reporting() {
        let config = EngineConfig::new().with_reporting(ReportingMode::FirstOccurrence);
        let engine = SoDRuleEngine::with_config(invoice_policy(), config);

        let _ = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));
        assert_eq!(
            engine
                .analyze(&StructuredEvent::new("u1", "Approve_Payment"))
                .len(),
            1
        );
        assert!(engine
            .analyze(&StructuredEvent::new("u1", "Approve_Payment"))
            .is_empty());
        assert!(engine.analyze(&StructuredEvent::new("u1", "Login")).is_empty());
    }

    #[test]
    fn test_window_evicts_least_recent_action() {
        let engine = SoDRuleEngine::with_config(invoice_policy(), window(2));

        let _ = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));
        let _ = engine.analyze(&StructuredEvent::new("u1", "Login"));
        let _ = engine.analyze(&StructuredEvent::new("u1", "View_Report"));

        let actions = engine.actions_for("u1").unwrap();
        assert!(!actions.contains("Create_Invoice"));
        assert!(engine
            .analyze(&StructuredEvent::new("u1", "Approve_Payment"))
            .is_empty());
    }

    #[test]
    fn test_window_refreshes_recency() {
        let engine = SoDRuleEngine::with_config(invoice_policy(), window(2));

        let _ = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));
        let _ = engine.analyze(&StructuredEvent::new("u1", "Login"));
        let _ = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));

        let violations = engine.analyze(&StructuredEvent::new("u1", "Approve_Payment"));
        assert_eq!(violations.len(), 1);
        assert!(!engine.actions_for("u1").unwrap().contains("Login"));
    }

    #[test]
    fn test_window_eviction_clears_satisfied_pairs() {
        let config = window(2).with_reporting(ReportingMode::FirstOccurrence);
        let engine = SoDRuleEngine::with_config(invoice_policy(), config);

        let _ = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));
        assert_eq!(
            engine
                .analyze(&StructuredEvent::new("u1", "Approve_Payment"))
                .len(),
            1
        );
        // Evicts Create_Invoice.
        assert!(engine.analyze(&StructuredEvent::new("u1", "Login")).is_empty());
        // Evicts Approve_Payment.
        assert!(engine
            .analyze(&StructuredEvent::new("u1", "Create_Invoice"))
            .is_empty());
        // Satisfied again after eviction, so reported again.
        assert_eq!(
            engine
                .analyze(&StructuredEvent::new("u1", "Approve_Payment"))
                .len(),
            1
        );
    }

    #[test]
    fn test_empty_policy_never_reports() {
        let engine = SoDRuleEngine::new(ConflictPolicy::empty());

        let _ = engine.analyze(&StructuredEvent::new("u1", "Create_Invoice"));
        assert!(engine
            .analyze(&StructuredEvent::new("u1", "Approve_Payment"))
            .is_empty());
        assert_eq!(engine.actions_for("u1").unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_analyze_keeps_every_action() {
        let engine = Arc::new(SoDRuleEngine::new(invoice_policy()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let _ = engine.analyze(&StructuredEvent::new("shared", format!("action-{t}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.actions_for("shared").unwrap().len(), 400);
    }

    #[test]
    fn test_engine_config_serde() {
        let config: EngineConfig =
            serde_yaml::from_str("history:\n  mode: window\n  max_actions: 16\nreporting: first_occurrence\n")
                .unwrap();
        assert_eq!(config.reporting, ReportingMode::FirstOccurrence);
        assert_eq!(
            config.history,
            HistoryMode::Window {
                max_actions: NonZeroUsize::new(16).unwrap()
            }
        );
    }
}
