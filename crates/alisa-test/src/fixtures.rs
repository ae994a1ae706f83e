//! Shared fixtures: the sample policy and the LogHub reference lines.

use alisa_core::{ConflictPolicy, ConflictRule, StructuredEvent};

/// The sample conflict policy shipped as `config/policy.yaml`.
pub const SAMPLE_POLICY: &str = r#"rules:
  nist_ac2_sod:
    id: "AC-5"
    description: "Separation of duties for the invoice lifecycle"
    conflict_actions:
      - [Create_Invoice, Approve_Payment]
      - [Create_Vendor, Approve_Payment]
  nist_ac6_privilege:
    id: "AC-6"
    description: "Least privilege for account administration"
    conflict_actions:
      - [Create_User, Grant_Admin]
"#;

/// LogHub Linux reference line used in the tamper scenario.
pub const LOGHUB_AUTH_FAILURE: &str = "Jun 14 15:16:01 combo sshd(pam_unix)[19939]: authentication failure; logname= uid=0 euid=0 tty=NODEV ruser= rhost=218.188.2.4 user=root";

/// [`LOGHUB_AUTH_FAILURE`] rewritten to hide the failure.
pub const LOGHUB_TAMPERED: &str = "Jun 14 15:16:01 combo sshd(pam_unix)[19939]: accepted password; logname= uid=0 euid=0 tty=NODEV ruser= rhost=218.188.2.4 user=root";

/// Returns [`SAMPLE_POLICY`] parsed.
///
/// # Panics
///
/// Panics if the sample policy does not parse, which would be a bug in this crate.
#[must_use]
pub fn sample_policy() -> ConflictPolicy {
    ConflictPolicy::from_yaml_str(SAMPLE_POLICY).expect("sample policy is valid")
}

/// Returns the policy of a single invoice rule under `control_id`.
///
/// # Panics
///
/// Panics if `control_id` is empty.
#[must_use]
pub fn invoice_policy(control_id: &str) -> ConflictPolicy {
    let rule = ConflictRule::new("invoice", control_id).with_pair("Create_Invoice", "Approve_Payment");
    ConflictPolicy::from_rules(vec![rule]).expect("invoice policy is valid")
}

/// Returns a complete event.
#[must_use]
pub fn event(actor: &str, action: &str) -> StructuredEvent {
    StructuredEvent::new(actor, action)
}

/// Returns an application log line in the `User <actor> executed action: <action>` form.
#[must_use]
pub fn action_line(actor: &str, action: &str) -> String {
    format!("Jun 15 09:00:00 finance_app system[1]: User {actor} executed action: {action} ID=INV-2024-001")
}
