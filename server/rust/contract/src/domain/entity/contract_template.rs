use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractTemplate {
    pub id: Uuid,
    pub name: String,
    pub body: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractTemplate {
    pub fn new(name: impl Into<String>, body: impl Into<String>, active: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            body: body.into(),
            active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    /// 有効なテンプレート群から現在のテンプレートを選択する。
    /// 複数ある場合は created_at が最新のもの（同時刻なら id が大きいもの）を返す。
    pub fn select_current(candidates: &[ContractTemplate]) -> Option<&ContractTemplate> {
        candidates
            .iter()
            .filter(|t| t.active)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_current_picks_newest_active() {
        let mut old = ContractTemplate::new("v1", "old", true);
        old.created_at = Utc::now() - chrono::Duration::days(3);
        let newest = ContractTemplate::new("v2", "new", true);
        let mut inactive = ContractTemplate::new("v3", "draft", false);
        inactive.created_at = Utc::now() + chrono::Duration::days(1);

        let all = vec![old, newest.clone(), inactive];
        let selected = ContractTemplate::select_current(&all).unwrap();
        assert_eq!(selected.id, newest.id);
    }

    #[test]
    fn select_current_none_when_nothing_active() {
        let all = vec![ContractTemplate::new("v1", "x", false)];
        assert!(ContractTemplate::select_current(&all).is_none());
        assert!(ContractTemplate::select_current(&[]).is_none());
    }

    #[test]
    fn select_current_breaks_ties_by_id() {
        let a = ContractTemplate::new("a", "a", true);
        let mut b = ContractTemplate::new("b", "b", true);
        b.created_at = a.created_at;
        let expected = if a.id > b.id { a.id } else { b.id };

        let all = vec![a, b];
        assert_eq!(ContractTemplate::select_current(&all).unwrap().id, expected);
    }
}
