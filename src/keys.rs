//! Cache Key Naming
//!
//! Builders for the colon-delimited keys used by the dashboard, transaction,
//! report and quote read paths. Keeping them in one place is what makes
//! pattern invalidation reliable: a pattern only works if every writer spells
//! the key the same way.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::NaiveDate;

pub const DASHBOARD: &str = "dashboard";
pub const TRANSACTIONS: &str = "transactions";
pub const REPORTS: &str = "reports";
pub const QUOTES: &str = "quotes";

/// `dashboard:<user>`
pub fn dashboard(user_id: impl Display) -> String {
    format!("{}:{}", DASHBOARD, user_id)
}

/// `transactions:<user>:page:<n>`
pub fn transactions_page(user_id: impl Display, page: u32) -> String {
    format!("{}:{}:page:{}", TRANSACTIONS, user_id, page)
}

/// `transactions:<user>:<filters>`
///
/// Filters are sorted by name and rendered as `name=value` pairs joined by
/// `&`, so the same filter set always yields the same key regardless of the
/// order it was built in. Later duplicates of a name replace earlier ones.
/// Names and values are percent-escaped (`%`, `&`, `=`, `:`, `*`), so a value
/// can never forge another pair or a pattern wildcard.
pub fn transactions_filtered<I, K, V>(user_id: impl Display, filters: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Display,
{
    let sorted: BTreeMap<String, String> = filters
        .into_iter()
        .map(|(name, value)| {
            (
                escape_filter(&name.into()),
                escape_filter(&value.to_string()),
            )
        })
        .collect();

    let filter_key = sorted
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}:{}:{}", TRANSACTIONS, user_id, filter_key)
}

fn escape_filter(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' | '&' | '=' | ':' | '*' => escaped.push_str(&format!("%{:02X}", c as u32)),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `reports:<user>:<kind>:<YYYY-MM>`
pub fn report(user_id: impl Display, kind: &str, month: NaiveDate) -> String {
    format!("{}:{}:{}:{}", REPORTS, user_id, kind, month.format("%Y-%m"))
}

/// `quotes:<BASE>:<QUOTE>`, currency codes upper-cased.
pub fn exchange_rate(base: &str, quote: &str) -> String {
    format!(
        "{}:{}:{}",
        QUOTES,
        base.to_ascii_uppercase(),
        quote.to_ascii_uppercase()
    )
}

// == Invalidation Patterns ==
/// Every cached transaction listing for a user: `transactions:<user>:*`
pub fn user_transactions(user_id: impl Display) -> String {
    format!("{}:{}:*", TRANSACTIONS, user_id)
}

/// Patterns covering every per-user key: the dashboard, transaction
/// listings and reports of `user_id`. Quotes are shared and not included.
///
/// Each namespace gets its own pattern; a catch-all such as `*:<user>*`
/// would also hit other users whose id starts with `user_id`.
pub fn user_patterns(user_id: impl Display) -> Vec<String> {
    let user = user_id.to_string();
    vec![
        dashboard(&user),
        user_transactions(&user),
        format!("{}:{}:*", REPORTS, user),
    ]
}
