use crate::models::TransactionContext;

/// Amount at or above which the high-amount check fires (minor units).
pub const HIGH_AMOUNT_THRESHOLD: i64 = 20_000;

const DISPOSABLE_EMAIL_DOMAINS: [&str; 3] =
    ["mailinator.com", "10minutemail.com", "tempmail.com"];

pub struct RuleScorer {
    // Could load domain lists from configuration in future
}

impl RuleScorer {
    pub fn new() -> Self {
        RuleScorer {}
    }

    /// Evaluate the heuristic checks against a transaction context.
    ///
    /// Returns an additive score clamped to [0,1] and the comma-joined
    /// tags of the checks that fired, in evaluation order. Pure function
    /// of its input.
    pub fn score(&self, ctx: &TransactionContext) -> (f64, String) {
        let mut score: f64 = 0.0;
        let mut reasons: Vec<&str> = Vec::new();

        let email = ctx.email.as_deref().unwrap_or("");

        if email.is_empty() {
            score += 0.2;
            reasons.push("missing_email");
        }

        if is_disposable(email) {
            score += 0.7;
            reasons.push("disposable_email");
        }

        if ctx.amount >= HIGH_AMOUNT_THRESHOLD {
            score += 0.6;
            reasons.push("high_amount");
        }

        // Saturate, do not re-normalize
        score = score.min(1.0);

        if reasons.is_empty() {
            reasons.push("no_rules_triggered");
        }

        (score, reasons.join(","))
    }
}

impl Default for RuleScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the domain after the last `@` is a known throwaway provider.
/// An address with no `@` is not disposable, not an error.
fn is_disposable(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((_, domain)) => {
            let domain = domain.to_ascii_lowercase();
            DISPOSABLE_EMAIL_DOMAINS.contains(&domain.as_str())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(email: Option<&str>, amount: i64) -> TransactionContext {
        TransactionContext {
            email: email.map(str::to_string),
            ip_address: None,
            amount,
            currency: "USD".to_string(),
            raw_payload: json!({}),
        }
    }

    #[test]
    fn test_missing_email_only() {
        let scorer = RuleScorer::new();
        let (score, reason) = scorer.score(&ctx(None, 19_999));
        assert_eq!(score, 0.2);
        assert_eq!(reason, "missing_email");

        // empty string counts as missing too
        let (score, reason) = scorer.score(&ctx(Some(""), 100));
        assert_eq!(score, 0.2);
        assert_eq!(reason, "missing_email");
    }

    #[test]
    fn test_disposable_email() {
        let scorer = RuleScorer::new();
        let (score, reason) = scorer.score(&ctx(Some("x@mailinator.com"), 100));
        assert_eq!(score, 0.7);
        assert_eq!(reason, "disposable_email");

        // case-insensitive domain match
        let (score, _) = scorer.score(&ctx(Some("x@MailiNator.COM"), 100));
        assert_eq!(score, 0.7);
    }

    #[test]
    fn test_missing_and_disposable_mutually_exclusive() {
        let scorer = RuleScorer::new();
        // disposable requires a non-empty email, so the two tags can
        // never fire together
        let (_, reason) = scorer.score(&ctx(None, 100));
        assert!(reason.contains("missing_email"));
        assert!(!reason.contains("disposable_email"));

        let (_, reason) = scorer.score(&ctx(Some("x@tempmail.com"), 100));
        assert!(reason.contains("disposable_email"));
        assert!(!reason.contains("missing_email"));
    }

    #[test]
    fn test_high_amount_boundary() {
        let scorer = RuleScorer::new();
        let (score, reason) = scorer.score(&ctx(Some("a@example.com"), 20_000));
        assert_eq!(score, 0.6);
        assert_eq!(reason, "high_amount");

        let (score, reason) = scorer.score(&ctx(Some("a@example.com"), 19_999));
        assert_eq!(score, 0.0);
        assert_eq!(reason, "no_rules_triggered");
    }

    #[test]
    fn test_score_clamped_at_one() {
        let scorer = RuleScorer::new();
        // disposable + high amount = 0.7 + 0.6, clamps to 1.0
        let (score, reason) = scorer.score(&ctx(Some("x@10minutemail.com"), 50_000));
        assert_eq!(score, 1.0);
        assert_eq!(reason, "disposable_email,high_amount");
    }

    #[test]
    fn test_reason_order_follows_evaluation() {
        let scorer = RuleScorer::new();
        let (score, reason) = scorer.score(&ctx(None, 25_000));
        assert!((score - 0.8).abs() < 1e-9);
        assert_eq!(reason, "missing_email,high_amount");
    }

    #[test]
    fn test_email_without_at_is_not_disposable() {
        assert!(!is_disposable("mailinator.com"));
        assert!(!is_disposable(""));
        assert!(is_disposable("a@b@mailinator.com")); // last @ wins
    }

    #[test]
    fn test_no_rules_triggered() {
        let scorer = RuleScorer::new();
        let (score, reason) = scorer.score(&ctx(Some("a@example.com"), 500));
        assert_eq!(score, 0.0);
        assert_eq!(reason, "no_rules_triggered");
    }
}
