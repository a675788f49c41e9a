// Account and role selection: exact match first, interactive fallback
mod picker;

pub use picker::TerminalPicker;

use crate::error::{Result, SelectionError};
use crate::models::{Account, Role};

/// Interactive list chooser
#[cfg_attr(test, mockall::automock)]
pub trait Chooser {
    /// Index of the picked option, or `None` when the operator aborts
    fn choose(&self, prompt: &str, options: &[String]) -> Result<Option<usize>>;
}

/// Something that can be picked by name
pub trait Candidate: Clone {
    const KIND: &'static str;

    fn name(&self) -> &str;

    /// Text shown in the chooser
    fn label(&self) -> String {
        self.name().to_string()
    }
}

impl Candidate for Account {
    const KIND: &'static str = "account";

    fn name(&self) -> &str {
        &self.display_name
    }

    fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.id)
    }
}

impl Candidate for Role {
    const KIND: &'static str = "role";

    fn name(&self) -> &str {
        &self.name
    }
}

/// Outcome of a selection; both variants carry the picked entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    /// The name hint matched, no prompt was shown
    Matched(T),
    /// Picked through the chooser
    Chosen(T),
}

impl<T> Selection<T> {
    pub fn was_matched(&self) -> bool {
        matches!(self, Selection::Matched(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Selection::Matched(item) | Selection::Chosen(item) => item,
        }
    }
}

/// Case-insensitive exact name comparison; no partial or fuzzy matching
pub fn names_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Sort, try the hint, then fall back to the chooser
fn select<T: Candidate>(
    mut candidates: Vec<T>,
    hint: Option<&str>,
    prompt: &str,
    chooser: &dyn Chooser,
) -> Result<Selection<T>> {
    candidates.sort_by(|a, b| a.name().cmp(b.name()));

    let hint = hint.map(str::trim).filter(|h| !h.is_empty());

    if let Some(hint) = hint {
        if let Some(found) = candidates.iter().find(|c| names_match(c.name(), hint)) {
            tracing::debug!("{} '{}' matched hint '{}'", T::KIND, found.name(), hint);
            return Ok(Selection::Matched(found.clone()));
        }
        tracing::info!("No {} named '{}', falling back to picker", T::KIND, hint);
    }

    let prompt = match hint {
        Some(hint) => format!("{} '{}' not found. {}", capitalize(T::KIND), hint, prompt),
        None => prompt.to_string(),
    };

    let options: Vec<String> = candidates.iter().map(Candidate::label).collect();
    match chooser.choose(&prompt, &options)? {
        Some(index) if index < candidates.len() => {
            Ok(Selection::Chosen(candidates.swap_remove(index)))
        }
        _ => Err(SelectionError::Aborted(T::KIND).into()),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn select_account(
    accounts: Vec<Account>,
    hint: Option<&str>,
    chooser: &dyn Chooser,
) -> Result<Selection<Account>> {
    if accounts.is_empty() {
        return Err(SelectionError::NoAccounts.into());
    }
    select(accounts, hint, "Select AWS account:", chooser)
}

pub fn select_role(
    roles: Vec<Role>,
    account: &Account,
    hint: Option<&str>,
    chooser: &dyn Chooser,
) -> Result<Selection<Role>> {
    if roles.is_empty() {
        return Err(SelectionError::NoRoles(account.display_name.clone()).into());
    }
    let prompt = format!("Select role for {}:", account.display_name);
    select(roles, hint, &prompt, chooser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AwswError;

    fn accounts() -> Vec<Account> {
        vec![Account::new("222", "Prod"), Account::new("111", "Dev")]
    }

    fn never_called() -> MockChooser {
        let mut chooser = MockChooser::new();
        chooser.expect_choose().never();
        chooser
    }

    #[test]
    fn test_hint_matches_case_insensitively_without_prompt() {
        let chooser = never_called();

        let selected = select_account(accounts(), Some("dev"), &chooser).unwrap();
        assert!(selected.was_matched());
        assert_eq!(selected.into_inner(), Account::new("111", "Dev"));

        let selected = select_account(accounts(), Some("PROD"), &chooser).unwrap();
        assert_eq!(selected.into_inner(), Account::new("222", "Prod"));
    }

    #[test]
    fn test_no_hint_prompts_with_sorted_candidates() {
        let mut chooser = MockChooser::new();
        chooser
            .expect_choose()
            .withf(|prompt, options| {
                prompt == "Select role for Dev:"
                    && options == ["Admin".to_string(), "ReadOnly".to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(Some(1)));

        let roles = vec![Role::new("ReadOnly"), Role::new("Admin")];
        let selected =
            select_role(roles, &Account::new("111", "Dev"), Some(""), &chooser).unwrap();

        assert!(!selected.was_matched());
        assert_eq!(selected.into_inner(), Role::new("ReadOnly"));
    }

    #[test]
    fn test_unmatched_hint_prompts_with_full_list() {
        let mut chooser = MockChooser::new();
        chooser
            .expect_choose()
            .withf(|prompt, options| {
                prompt.starts_with("Account 'stage' not found.")
                    && options == ["Dev (111)".to_string(), "Prod (222)".to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(Some(0)));

        let selected = select_account(accounts(), Some("stage"), &chooser).unwrap();
        assert_eq!(selected, Selection::Chosen(Account::new("111", "Dev")));
    }

    #[test]
    fn test_partial_hint_does_not_match() {
        let mut chooser = MockChooser::new();
        chooser
            .expect_choose()
            .times(1)
            .returning(|_, _| Ok(Some(1)));

        let selected = select_account(accounts(), Some("De"), &chooser).unwrap();
        assert_eq!(selected.into_inner(), Account::new("222", "Prod"));
    }

    #[test]
    fn test_duplicate_names_resolve_to_first_enumerated() {
        let chooser = never_called();
        let candidates = vec![
            Account::new("999", "Shared"),
            Account::new("100", "Alpha"),
            Account::new("555", "Shared"),
        ];

        let selected = select_account(candidates, Some("shared"), &chooser).unwrap();
        assert_eq!(selected.into_inner().id, "999");
    }

    #[test]
    fn test_abort_is_terminal() {
        let mut chooser = MockChooser::new();
        chooser.expect_choose().returning(|_, _| Ok(None));

        let err = select_account(accounts(), None, &chooser).unwrap_err();
        assert!(matches!(
            err,
            AwswError::Selection(SelectionError::Aborted("account"))
        ));
    }

    #[test]
    fn test_empty_candidates() {
        let chooser = never_called();

        let err = select_account(Vec::new(), Some("dev"), &chooser).unwrap_err();
        assert!(matches!(err, AwswError::Selection(SelectionError::NoAccounts)));

        let err = select_role(Vec::new(), &Account::new("111", "Dev"), None, &chooser).unwrap_err();
        assert!(matches!(
            err,
            AwswError::Selection(SelectionError::NoRoles(name)) if name == "Dev"
        ));
    }

    #[test]
    fn test_names_match() {
        assert!(names_match("Dev", "dev"));
        assert!(names_match("Ärzte", "ärzte"));
        assert!(!names_match("Dev", "Dev "));
        assert!(!names_match("Dev", "Development"));
    }
}
