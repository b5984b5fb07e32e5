//! Free-text expense parser.
//!
//! Input like "Nasi ayam RM10.50" or "Makan tengahari RM15 di Restoran
//! ABC" becomes a typed [`ParsedExpense`]. Three patterns are tried in
//! a fixed order, first match wins:
//!
//! 1. `<item> RM<amount> [di <location>]`
//! 2. `<item> <amount> [di <location>]`   (bare numeral)
//! 3. `<item> RM<amount> <location>`      (location without "di")
//!
//! The overlap between 1 and 3 is deliberate: "Item RM10 Place" only
//! reaches pattern 3 because pattern 1 insists the trailing location is
//! introduced by "di".

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::category::{Category, categorize};

/// A structured expense extracted from one line of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedExpense {
    pub item: String,
    pub amount: f64,
    pub location: Option<String>,
    pub category: Category,
}

// Amounts accept 0 or exactly 2 decimal digits; "RM10.5" is rejected.
const PATTERNS: [&str; 3] = [
    r"(?i)^(.+?)\s+rm\s*(\d+(?:\.\d{2})?)\s*(?:di\s+(.+))?$",
    r"(?i)^(.+?)\s+(\d+(?:\.\d{2})?)\s*(?:di\s+(.+))?$",
    r"(?i)^(.+?)\s+rm\s*(\d+(?:\.\d{2})?)\s+(.+)$",
];

fn patterns() -> &'static [Regex; 3] {
    static COMPILED: OnceLock<[Regex; 3]> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS.map(|p| Regex::new(p).expect("static expense pattern"))
    })
}

/// Parse a free-text expense line. Returns `None` when no pattern
/// matches (the caller decides how to re-prompt the user).
pub fn parse_expense(text: &str) -> Option<ParsedExpense> {
    for re in patterns() {
        let Some(caps) = re.captures(text) else {
            continue;
        };

        let item = caps[1].trim();
        if item.is_empty() {
            // Whitespace-only description: let the next pattern try.
            continue;
        }

        let Ok(amount) = caps[2].parse::<f64>() else {
            continue;
        };

        let location = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());

        return Some(ParsedExpense {
            item: item.to_string(),
            amount,
            location,
            category: categorize(item),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_with_currency_marker() {
        let p = parse_expense("Nasi ayam RM10.50").unwrap();
        assert_eq!(p.item, "Nasi ayam");
        assert_eq!(p.amount, 10.50);
        assert_eq!(p.location, None);
        assert_eq!(p.category, Category::MakanMinum);
    }

    #[test]
    fn test_parse_with_di_location() {
        let p = parse_expense("Makan tengahari RM15 di Restoran ABC").unwrap();
        assert_eq!(p.item, "Makan tengahari");
        assert_eq!(p.amount, 15.0);
        assert_eq!(p.location.as_deref(), Some("Restoran ABC"));
        assert_eq!(p.category, Category::MakanMinum);
    }

    #[test]
    fn test_parse_free_text_location_without_di() {
        // Pattern 1 refuses "Tesco" (no "di"), pattern 3 captures it.
        let p = parse_expense("Groceries RM45.80 Tesco").unwrap();
        assert_eq!(p.item, "Groceries");
        assert_eq!(p.amount, 45.80);
        assert_eq!(p.location.as_deref(), Some("Tesco"));
        assert_eq!(p.category, Category::Groceries);
    }

    #[test]
    fn test_parse_bare_numeral() {
        let p = parse_expense("Petrol 60").unwrap();
        assert_eq!(p.item, "Petrol");
        assert_eq!(p.amount, 60.0);
        assert_eq!(p.category, Category::Pengangkutan);
    }

    #[test]
    fn test_currency_marker_is_case_insensitive() {
        let p = parse_expense("Teh tarik rm2.50").unwrap();
        assert_eq!(p.amount, 2.50);
        let p = parse_expense("Teh tarik Rm2.50 DI Mamak").unwrap();
        assert_eq!(p.location.as_deref(), Some("Mamak"));
    }

    #[test]
    fn test_rejects_one_decimal_digit() {
        assert!(parse_expense("Nasi RM10.5").is_none());
    }

    #[test]
    fn test_rejects_amount_only_and_plain_text() {
        assert!(parse_expense("RM10.50").is_none());
        assert!(parse_expense("   RM10").is_none());
        assert!(parse_expense("hello there").is_none());
        assert!(parse_expense("").is_none());
    }

    #[test]
    fn test_uncategorized_item_gets_catch_all() {
        let p = parse_expense("Baju RM35").unwrap();
        assert_eq!(p.category, Category::LainLain);
    }
}
