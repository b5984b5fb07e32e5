//! Deterministic keyword categorizer for expense descriptions.
//!
//! Categories are tried in declaration order; the first category with a
//! substring keyword hit wins. `LainLain` has no keywords and is the
//! catch-all, so `categorize` is total — every description gets exactly
//! one category.

use serde::{Deserialize, Serialize};

/// Expense categories, matched deterministically from the item text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "Makan & Minum")]
    MakanMinum,
    #[serde(rename = "Pengangkutan")]
    Pengangkutan,
    #[serde(rename = "Groceries")]
    Groceries,
    #[serde(rename = "Kesihatan")]
    Kesihatan,
    #[serde(rename = "Hiburan")]
    Hiburan,
    #[serde(rename = "Lain-lain")]
    LainLain,
}

impl Category {
    /// Match order. The catch-all must stay last.
    pub const ALL: [Category; 6] = [
        Category::MakanMinum,
        Category::Pengangkutan,
        Category::Groceries,
        Category::Kesihatan,
        Category::Hiburan,
        Category::LainLain,
    ];

    /// Display label, also the value written to the Category column.
    pub fn label(&self) -> &'static str {
        match self {
            Category::MakanMinum => "Makan & Minum",
            Category::Pengangkutan => "Pengangkutan",
            Category::Groceries => "Groceries",
            Category::Kesihatan => "Kesihatan",
            Category::Hiburan => "Hiburan",
            Category::LainLain => "Lain-lain",
        }
    }

    /// Reverse of [`label`](Self::label); unknown labels fall back to the
    /// catch-all so rows written by older builds still load.
    pub fn from_label(label: &str) -> Category {
        Category::ALL
            .into_iter()
            .find(|c| c.label() == label.trim())
            .unwrap_or(Category::LainLain)
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::MakanMinum => &[
                "nasi", "makan", "minum", "kopi", "teh", "restoran", "makanan", "sarapan",
                "lunch", "dinner",
            ],
            Category::Pengangkutan => &["petrol", "minyak", "grab", "taxi", "bus", "tol", "parking"],
            Category::Groceries => &[
                "groceries", "pasar", "sayur", "buah", "daging", "ikan", "beras",
            ],
            Category::Kesihatan => &["ubat", "hospital", "klinik", "doktor", "vitamin"],
            Category::Hiburan => &["wayang", "game", "movie", "entertainment"],
            Category::LainLain => &[],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorize an item description. Case-insensitive substring match,
/// first category in [`Category::ALL`] order wins.
pub fn categorize(description: &str) -> Category {
    let desc = description.to_lowercase();

    for cat in Category::ALL {
        if cat.keywords().iter().any(|kw| desc.contains(kw)) {
            return cat;
        }
    }

    Category::LainLain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_food() {
        assert_eq!(categorize("Nasi ayam"), Category::MakanMinum);
        assert_eq!(categorize("Kopi O ais"), Category::MakanMinum);
    }

    #[test]
    fn test_categorize_transport() {
        assert_eq!(categorize("Petrol Shell"), Category::Pengangkutan);
        assert_eq!(categorize("Tol PLUS"), Category::Pengangkutan);
    }

    #[test]
    fn test_categorize_is_case_insensitive() {
        assert_eq!(categorize("GROCERIES mingguan"), Category::Groceries);
        assert_eq!(categorize("UBAT batuk"), Category::Kesihatan);
    }

    #[test]
    fn test_categorize_first_category_wins() {
        // "makan" (food) appears before any transport keyword could.
        assert_eq!(categorize("makan selepas parking"), Category::MakanMinum);
    }

    #[test]
    fn test_catch_all_when_no_keyword() {
        assert_eq!(categorize("Baju baru"), Category::LainLain);
        assert_eq!(categorize(""), Category::LainLain);
    }

    #[test]
    fn test_label_round_trip() {
        for cat in Category::ALL {
            assert_eq!(Category::from_label(cat.label()), cat);
        }
        assert_eq!(Category::from_label("???"), Category::LainLain);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Category::MakanMinum).unwrap();
        assert_eq!(json, "\"Makan & Minum\"");
    }
}
