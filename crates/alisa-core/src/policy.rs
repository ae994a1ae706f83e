//! Conflict policy model and loading.
//!
//! A [`ConflictPolicy`] lists, per compliance control, the pairs of actions
//! that a single actor must never hold together. It is loaded once from a
//! YAML document and is immutable afterwards:
//!
//! ```yaml
//! rules:
//!   nist_ac2_sod:
//!     id: "AC-5"
//!     conflict_actions:
//!       - [Create_Invoice, Approve_Payment]
//! ```
//!
//! Rules and pairs keep document order. Every pair is also indexed by each of
//! its two actions so the engine can find the conflicts of an action without
//! scanning the whole pair list.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// An unordered pair of mutually exclusive actions.
///
/// The order the actions were written in is kept for reporting, but two
/// pairs with the same actions in either order are the same pair.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
    /// First action as written in the policy.
    pub first: String,
    /// Second action as written in the policy.
    pub second: String,
}

impl ConflictPair {
    /// Creates a new conflict pair.
    #[must_use]
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Returns true if `action` is one of the two actions.
    #[must_use]
    pub fn contains(&self, action: &str) -> bool {
        self.first == action || self.second == action
    }

    /// Returns the action paired with `action`, if `action` is in the pair.
    #[must_use]
    pub fn other(&self, action: &str) -> Option<&str> {
        if self.first == action {
            Some(&self.second)
        } else if self.second == action {
            Some(&self.first)
        } else {
            None
        }
    }
}

impl PartialEq for ConflictPair {
    fn eq(&self, other: &Self) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

/// A named rule: a control identifier and its conflicting pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRule {
    /// Rule name (the key in the policy document).
    pub name: String,

    /// Control identifier reported with violations (e.g. "AC-5").
    pub control_id: String,

    /// Optional description of the control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Conflicting action pairs, in document order.
    #[serde(default)]
    pub pairs: Vec<ConflictPair>,
}

impl ConflictRule {
    /// Creates a rule with no pairs.
    #[must_use]
    pub fn new(name: impl Into<String>, control_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            control_id: control_id.into(),
            description: None,
            pairs: Vec::new(),
        }
    }

    /// Adds a conflicting pair.
    #[must_use]
    pub fn with_pair(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.pairs.push(ConflictPair::new(first, second));
        self
    }

    /// Sets the rule description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// What the composition root does when the policy cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyFailureMode {
    /// Continue with an empty policy. No segregation-of-duties detection
    /// happens until the policy is fixed.
    Open,
    /// Refuse to start.
    #[default]
    Closed,
}

/// Position of a pair in the flattened, document-ordered pair list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PairRef {
    rule: usize,
    pair: usize,
}

/// One entry of the per-action lookup index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Partner {
    /// Index into the flattened pair list.
    pub(crate) pair: usize,
    /// The other action of the pair.
    pub(crate) other: String,
}

/// Immutable set of conflict rules.
#[derive(Debug, Clone, Default)]
pub struct ConflictPolicy {
    rules: Vec<ConflictRule>,
    pairs: Vec<PairRef>,
    index: HashMap<String, Vec<Partner>>,
}

#[derive(Debug, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    rules: Option<serde_yaml::Mapping>,
}

#[derive(Debug, Deserialize)]
struct RuleDocument {
    id: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    conflict_actions: Vec<Vec<String>>,
}

impl ConflictPolicy {
    /// Creates a policy with no rules.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a policy from rules, validating and indexing their pairs.
    ///
    /// Duplicate pairs within a rule are collapsed to their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PolicyValidation`] if a rule has an empty control id,
    /// or a pair has an empty action or the same action twice.
    pub fn from_rules(rules: Vec<ConflictRule>) -> Result<Self> {
        let mut policy = Self::empty();

        for mut rule in rules {
            if rule.control_id.trim().is_empty() {
                return Err(Error::PolicyValidation {
                    rule: rule.name,
                    reason: "missing control id".to_string(),
                });
            }

            let mut pairs: Vec<ConflictPair> = Vec::with_capacity(rule.pairs.len());
            for pair in rule.pairs.drain(..) {
                validate_pair(&rule.name, &pair)?;
                if !pairs.contains(&pair) {
                    pairs.push(pair);
                }
            }
            rule.pairs = pairs;

            let rule_index = policy.rules.len();
            for (pair_index, pair) in rule.pairs.iter().enumerate() {
                let flat = policy.pairs.len();
                policy.pairs.push(PairRef {
                    rule: rule_index,
                    pair: pair_index,
                });
                policy.index.entry(pair.first.clone()).or_default().push(Partner {
                    pair: flat,
                    other: pair.second.clone(),
                });
                policy.index.entry(pair.second.clone()).or_default().push(Partner {
                    pair: flat,
                    other: pair.first.clone(),
                });
            }
            policy.rules.push(rule);
        }

        Ok(policy)
    }

    /// Parses a policy from a YAML document.
    ///
    /// A document without a `rules` section is an empty policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PolicyParse`] for malformed YAML or a wrongly shaped
    /// document, and [`Error::PolicyValidation`] for invalid rules.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alisa_core::ConflictPolicy;
    ///
    /// let policy = ConflictPolicy::from_yaml_str(r#"
    /// rules:
    ///   nist_ac2_sod:
    ///     id: "AC-5"
    ///     conflict_actions:
    ///       - [Create_Invoice, Approve_Payment]
    /// "#).unwrap();
    ///
    /// assert_eq!(policy.pair_count(), 1);
    /// assert!(policy.conflicts_for("Approve_Payment").contains("Create_Invoice"));
    /// ```
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let document: PolicyDocument = serde_yaml::from_str(source)?;
        let mut rules = Vec::new();

        for (key, value) in document.rules.unwrap_or_default() {
            let name = key.as_str().map(str::to_string).ok_or_else(|| Error::PolicyParse {
                reason: format!("rule names must be strings, got {key:?}"),
            })?;
            let raw: RuleDocument =
                serde_yaml::from_value(value).map_err(|e| Error::PolicyParse {
                    reason: format!("rule '{name}': {e}"),
                })?;

            let Some(control_id) = raw.id else {
                return Err(Error::PolicyValidation {
                    rule: name,
                    reason: "missing control id".to_string(),
                });
            };

            let mut rule = ConflictRule::new(name, control_id);
            rule.description = raw.description;
            for actions in raw.conflict_actions {
                let [first, second]: [String; 2] =
                    actions.try_into().map_err(|actions: Vec<String>| {
                        Error::PolicyValidation {
                            rule: rule.name.clone(),
                            reason: format!(
                                "conflict pairs need exactly 2 actions, got {}",
                                actions.len()
                            ),
                        }
                    })?;
                rule.pairs.push(ConflictPair::new(first, second));
            }
            rules.push(rule);
        }

        Self::from_rules(rules)
    }

    /// Loads a policy from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PolicyRead`] if the file cannot be read, otherwise
    /// the errors of [`ConflictPolicy::from_yaml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::PolicyRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let policy = Self::from_yaml_str(&source)?;
        info!(
            path = %path.display(),
            rules = policy.rules.len(),
            pairs = policy.pair_count(),
            "Loaded conflict policy"
        );
        Ok(policy)
    }

    /// Loads a policy, applying `mode` if loading fails.
    ///
    /// # Errors
    ///
    /// With [`PolicyFailureMode::Closed`], returns the load error. With
    /// [`PolicyFailureMode::Open`] this never fails.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: PolicyFailureMode) -> Result<Self> {
        match (Self::load(&path), mode) {
            (Ok(policy), _) => Ok(policy),
            (Err(e), PolicyFailureMode::Open) => {
                warn!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "Conflict policy unavailable, continuing fail-open with no SoD detection"
                );
                Ok(Self::empty())
            }
            (Err(e), PolicyFailureMode::Closed) => Err(e),
        }
    }

    /// Returns the rules in document order.
    #[must_use]
    pub fn rules(&self) -> &[ConflictRule] {
        &self.rules
    }

    /// Returns the total number of conflict pairs across all rules.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if the policy has no conflict pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the control id of the first rule.
    #[must_use]
    pub fn primary_control(&self) -> Option<&str> {
        self.rules.first().map(|r| r.control_id.as_str())
    }

    /// Returns the actions that conflict with `action` under any rule.
    #[must_use]
    pub fn conflicts_for(&self, action: &str) -> BTreeSet<&str> {
        self.partners(action)
            .iter()
            .map(|p| p.other.as_str())
            .collect()
    }

    pub(crate) fn partners(&self, action: &str) -> &[Partner] {
        self.index.get(action).map_or(&[], Vec::as_slice)
    }

    /// Returns the rule and pair at a flattened pair index.
    pub(crate) fn pair(&self, index: usize) -> Option<(&ConflictRule, &ConflictPair)> {
        let PairRef { rule, pair } = *self.pairs.get(index)?;
        let rule = &self.rules[rule];
        Some((rule, &rule.pairs[pair]))
    }
}

fn validate_pair(rule: &str, pair: &ConflictPair) -> Result<()> {
    if pair.first.trim().is_empty() || pair.second.trim().is_empty() {
        return Err(Error::PolicyValidation {
            rule: rule.to_string(),
            reason: "conflict actions cannot be empty".to_string(),
        });
    }
    if pair.first == pair.second {
        return Err(Error::PolicyValidation {
            rule: rule.to_string(),
            reason: format!("action '{}' cannot conflict with itself", pair.first),
        });
    }
    Ok(())
}
