//! Textual fallback extraction.
//!
//! Application logs written as `... User <actor> executed action: <action> ...`
//! can be parsed without a model.

use alisa_core::StructuredEvent;
use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::extractor::Extractor;

const USER_MARKER: &str = "User ";
const ACTION_MARKER: &str = " executed action: ";

/// Parses the `User <actor> executed action: <action>` pattern.
///
/// The actor is the text between the first `User ` and ` executed action: `.
/// The action is the first space-delimited token after it. Returns `None` if
/// the pattern is absent or either part is empty.
///
/// # Examples
///
/// ```
/// use alisa_extract::parse_fallback;
///
/// let line = "Jun 15 09:00:00 combo app: User u_finance_01 executed action: Create_Invoice ID=INV-2024-001";
/// let event = parse_fallback(line).unwrap();
/// assert_eq!(event.actor(), Some("u_finance_01"));
/// assert_eq!(event.action(), Some("Create_Invoice"));
///
/// assert!(parse_fallback("sshd: session opened for user root").is_none());
/// ```
#[must_use]
pub fn parse_fallback(raw_log: &str) -> Option<StructuredEvent> {
    let (_, after_user) = raw_log.split_once(USER_MARKER)?;
    let segment = after_user.split(USER_MARKER).next()?;
    let (actor, rest) = segment.split_once(ACTION_MARKER)?;
    let action = rest.split(' ').next()?.trim_end();

    if actor.is_empty() || action.is_empty() {
        return None;
    }

    Some(StructuredEvent::new(actor, action))
}

/// Extractor that only applies [`parse_fallback`].
///
/// Lines that do not match yield an empty event.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl PatternExtractor {
    /// Creates a new pattern extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for PatternExtractor {
    async fn extract(&self, raw_log: &str) -> Result<StructuredEvent, ExtractionError> {
        Ok(parse_fallback(raw_log).unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_application_line() {
        let event = parse_fallback(
            "Jun 15 09:00:45 combo app: User u_finance_01 executed action: Approve_Payment ID=INV-2024-001",
        )
        .unwrap();
        assert_eq!(event.actor(), Some("u_finance_01"));
        assert_eq!(event.action(), Some("Approve_Payment"));
        assert!(event.extra.is_empty());
    }

    #[test]
    fn test_action_at_end_of_line() {
        let event = parse_fallback("User alice executed action: Delete_Vendor\n").unwrap();
        assert_eq!(event.action(), Some("Delete_Vendor"));
    }

    #[test]
    fn test_actor_bounded_by_next_user_marker() {
        assert!(parse_fallback("User a User b executed action: X").is_none());

        let event = parse_fallback("User bob executed action: Pay by User admin").unwrap();
        assert_eq!(event.actor(), Some("bob"));
        assert_eq!(event.action(), Some("Pay"));
    }

    #[test]
    fn test_no_match() {
        assert!(parse_fallback("").is_none());
        assert!(parse_fallback("User root logged in").is_none());
        assert!(parse_fallback("executed action: Create_Invoice").is_none());
        assert!(parse_fallback("User  executed action: Create_Invoice").is_none());
        assert!(parse_fallback("User bob executed action:  Create_Invoice").is_none());
    }

    #[tokio::test]
    async fn test_pattern_extractor() {
        let extractor = PatternExtractor::new();
        let event = extractor
            .extract("User carol executed action: Create_Vendor")
            .await
            .unwrap();
        assert!(event.is_complete());

        let empty = extractor.extract("kernel: eth0 link up").await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(extractor.name(), "pattern");
    }
}
