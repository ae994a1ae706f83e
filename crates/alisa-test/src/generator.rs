//! Synthetic log generation.
//!
//! Produces Linux auth lines in LogHub format plus the two scenario shapes
//! the pipeline is expected to catch: a segregation-of-duties sequence and a
//! tampered line.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Identities used in generated auth lines.
pub const USERS: [&str; 5] = ["root", "admin", "process_owner", "u_finance_01", "u_audit_01"];

/// Messages used in generated auth lines.
pub const MESSAGES: [&str; 3] = ["password check", "authentication failure", "accepted password"];

/// The actor that creates and approves in [`LogGenerator::sod_violation_sequence`].
pub const SOD_ACTOR: &str = "u_finance_01";

/// Invoice referenced by the SoD sequence.
pub const SOD_INVOICE: &str = "INV-2024-001";

/// Message forced into the original line of a tampered pair.
pub const TAMPER_ORIGINAL: &str = "authentication failure";

/// What the tampered copy says instead.
pub const TAMPER_REPLACEMENT: &str = "accepted password";

const TIMESTAMP_FORMAT: &str = "%b %d %H:%M:%S";
const SOD_GAP_SECS: i64 = 45;

/// A line before tampering and the same line after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TamperedPair {
    /// The line as first written.
    pub original: String,
    /// The line after modification.
    pub tampered: String,
}

/// Generates synthetic log lines.
///
/// A seeded generator with a fixed start time is fully deterministic.
///
/// # Examples
///
/// ```
/// use alisa_test::LogGenerator;
///
/// let mut a = LogGenerator::seeded(7);
/// let mut b = LogGenerator::seeded(7);
/// assert_eq!(a.normal_log(), b.normal_log());
/// ```
#[derive(Debug, Clone)]
pub struct LogGenerator {
    rng: StdRng,
    clock: NaiveDateTime,
}

impl Default for LogGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LogGenerator {
    /// Creates a generator seeded from entropy, starting at the local time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            clock: Local::now().naive_local(),
        }
    }

    /// Creates a deterministic generator starting at Jun 14 15:16:01.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        let clock = NaiveDate::from_ymd_opt(2024, 6, 14)
            .and_then(|d| d.and_hms_opt(15, 16, 1))
            .unwrap_or_default();
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock,
        }
    }

    /// Sets the time of the next generated line.
    #[must_use]
    pub const fn starting_at(mut self, clock: NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Generates one sshd auth line with a random user and message.
    ///
    /// Format: `<Mon dd HH:MM:SS> combo sshd(pam_unix)[<pid>]: <message>; user=<user>`.
    pub fn normal_log(&mut self) -> String {
        let message = self.pick(&MESSAGES);
        self.auth_line(message)
    }

    /// Generates the two-line sequence where [`SOD_ACTOR`] creates an
    /// invoice and then approves its payment 45 seconds later.
    pub fn sod_violation_sequence(&mut self) -> [String; 2] {
        let created = self.stamp();
        self.advance(SOD_GAP_SECS);
        let approved = self.stamp();
        self.tick();

        [
            finance_line(&created, "Create_Invoice"),
            finance_line(&approved, "Approve_Payment"),
        ]
    }

    /// Generates an auth failure line and a copy of it rewritten to read as
    /// a successful login.
    pub fn tampered_pair(&mut self) -> TamperedPair {
        let original = self.auth_line(TAMPER_ORIGINAL);
        let tampered = original.replace(TAMPER_ORIGINAL, TAMPER_REPLACEMENT);
        TamperedPair { original, tampered }
    }

    /// Returns a random number in `low..=high`.
    pub fn number(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }

    fn auth_line(&mut self, message: &str) -> String {
        let timestamp = self.stamp();
        let user = self.pick(&USERS);
        let pid = self.number(1000, 20000);
        self.tick();
        format!("{timestamp} combo sshd(pam_unix)[{pid}]: {message}; user={user}")
    }

    fn pick(&mut self, choices: &[&'static str]) -> &'static str {
        choices.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn stamp(&self) -> String {
        self.clock.format(TIMESTAMP_FORMAT).to_string()
    }

    fn tick(&mut self) {
        let secs = self.rng.gen_range(1..=5);
        self.advance(secs);
    }

    fn advance(&mut self, secs: i64) {
        self.clock += Duration::seconds(secs);
    }
}

fn finance_line(timestamp: &str, action: &str) -> String {
    format!(
        "{timestamp} finance_app system[1]: User {SOD_ACTOR} executed action: {action} ID={SOD_INVOICE}"
    )
}
