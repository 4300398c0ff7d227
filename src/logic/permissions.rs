use anyhow::Result;

use crate::model::Principal;
use crate::store::traits::GrantStore;

/// Rule required to create or modify collections
pub const PUBLISHER: (&str, &str) = ("Apps", "Publisher");

/// Whether any of `rules` allows `app:action`.
///
/// Each entry may hold several comma separated `App:Action` rules. Either
/// side of a rule may be `*`. Entries without a `:` never match.
pub fn action_allowed<S: AsRef<str>>(rules: &[S], app: &str, action: &str) -> bool {
    rules
        .iter()
        .flat_map(|entry| entry.as_ref().split(','))
        .filter_map(|rule| rule.trim().split_once(':'))
        .any(|(rule_app, rule_action)| {
            let rule_app = rule_app.trim();
            let rule_action = rule_action.trim();
            (rule_app == "*" || rule_app == app) && (rule_action == "*" || rule_action == action)
        })
}

/// Look up the caller's grants and check `app:action`. Anonymous callers
/// are denied without touching the store.
pub async fn principal_allowed<S: GrantStore + ?Sized>(
    store: &S,
    principal: &Principal,
    (app, action): (&str, &str),
) -> Result<bool> {
    let Some(user_id) = principal.user_id() else {
        return Ok(false);
    };

    let rules = store.rules_for_user(user_id).await?;
    Ok(action_allowed(&rules, app, action))
}
