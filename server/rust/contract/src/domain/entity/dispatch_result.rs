use serde::{Deserialize, Serialize};

/// DispatchPolicy は一部の宛先だけ送信に成功した場合の扱いを決める。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// 1 件でも失敗したら配信全体を失敗として扱う。
    #[default]
    AllOrNothing,
    /// 1 件以上成功すれば配信を成功として扱う。
    AllowPartial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientOutcome {
    pub recipient: String,
    pub success: bool,
    pub error_message: Option<String>,
}

/// DispatchResult は 1 回の配信試行の結果。宛先ごとに 1 つの outcome を持つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub artifact_ref: String,
    pub artifact_link: String,
    pub outcomes: Vec<RecipientOutcome>,
}

impl DispatchResult {
    pub fn failed_recipients(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.recipient.clone())
            .collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn is_complete(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.success)
    }

    pub fn is_acceptable(&self, policy: DispatchPolicy) -> bool {
        match policy {
            DispatchPolicy::AllOrNothing => self.is_complete(),
            DispatchPolicy::AllowPartial => self.succeeded_count() > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(recipient: &str, success: bool) -> RecipientOutcome {
        RecipientOutcome {
            recipient: recipient.to_string(),
            success,
            error_message: (!success).then(|| "smtp 550".to_string()),
        }
    }

    fn result(outcomes: Vec<RecipientOutcome>) -> DispatchResult {
        DispatchResult {
            artifact_ref: "contracts/x.pdf".to_string(),
            artifact_link: "https://files.example.com/contracts/x.pdf".to_string(),
            outcomes,
        }
    }

    #[test]
    fn partial_result_depends_on_policy() {
        let r = result(vec![outcome("a@x.com", true), outcome("b@x.com", false)]);
        assert!(!r.is_acceptable(DispatchPolicy::AllOrNothing));
        assert!(r.is_acceptable(DispatchPolicy::AllowPartial));
        assert_eq!(r.failed_recipients(), vec!["b@x.com".to_string()]);
    }

    #[test]
    fn all_failed_is_never_acceptable() {
        let r = result(vec![outcome("a@x.com", false)]);
        assert!(!r.is_acceptable(DispatchPolicy::AllOrNothing));
        assert!(!r.is_acceptable(DispatchPolicy::AllowPartial));
    }

    #[test]
    fn empty_result_is_not_complete() {
        assert!(!result(vec![]).is_complete());
    }
}
