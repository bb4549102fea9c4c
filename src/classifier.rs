//! Maps the free-text result column to an [`AdmissionStatus`].
//!
//! Rules are evaluated in table order and the first match wins. Anything
//! that matches no rule is a fail, so classification is total.

use crate::models::AdmissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Contains(&'static str),
    Equals(&'static str),
}

impl Condition {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Condition::Contains(needle) => text.contains(needle),
            Condition::Equals(literal) => text == *literal,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatusRule {
    pub any_of: &'static [Condition],
    pub status: AdmissionStatus,
}

pub const STATUS_RULES: &[StatusRule] = &[
    StatusRule {
        any_of: &[Condition::Contains("최초"), Condition::Equals("합격")],
        status: AdmissionStatus::Pass,
    },
    StatusRule {
        any_of: &[Condition::Contains("충원")],
        status: AdmissionStatus::WaitlistPass,
    },
];

pub fn classify_status(result_text: &str) -> AdmissionStatus {
    STATUS_RULES
        .iter()
        .find(|rule| rule.any_of.iter().any(|cond| cond.matches(result_text)))
        .map(|rule| rule.status)
        .unwrap_or(AdmissionStatus::Fail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_pass() {
        assert_eq!(classify_status("최초합격"), AdmissionStatus::Pass);
        assert_eq!(classify_status("합격"), AdmissionStatus::Pass);
    }

    #[test]
    fn test_waitlist_pass() {
        assert_eq!(classify_status("2차충원합격"), AdmissionStatus::WaitlistPass);
        assert_eq!(classify_status("충원"), AdmissionStatus::WaitlistPass);
    }

    #[test]
    fn test_fail_is_default() {
        assert_eq!(classify_status("불합격"), AdmissionStatus::Fail);
        assert_eq!(classify_status(""), AdmissionStatus::Fail);
        assert_eq!(classify_status("예비 3번"), AdmissionStatus::Fail);
        // "합격" only counts as an exact value, not as a substring
        assert_eq!(classify_status(" 합격"), AdmissionStatus::Fail);
    }

    #[test]
    fn test_pass_rule_checked_before_waitlist() {
        assert_eq!(classify_status("최초 아님, 충원"), AdmissionStatus::Pass);
    }

    #[test]
    fn test_classifier_is_total() {
        let inputs = ["", " ", "abc", "🎓", "충", "최", "합", "불합", "0", "\n최초\n"];
        for input in inputs {
            let status = classify_status(input);
            assert!(matches!(
                status,
                AdmissionStatus::Pass | AdmissionStatus::WaitlistPass | AdmissionStatus::Fail
            ));
        }
    }
}
