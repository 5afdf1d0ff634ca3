use crate::constants::{MISSING_ACTION, MISSING_JUSTIFICATION};
use serde::{Serialize, Serializer};
use std::fmt;

/// Six-level trading action, plus the engine's error marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StrongBuy,
    Buy,
    WeakBuy,
    Hold,
    Sell,
    StrongSell,
    /// The model call or its response could not be used
    Error,
    /// Model text that matches none of the levels, kept verbatim
    Other(String),
}

impl Action {
    /// Lenient parse of model output ("Strong Buy", "strong_buy", "1. Strong Buy")
    pub fn parse(text: &str) -> Self {
        let normalized: String = text
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c.is_whitespace())
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();

        match normalized.as_str() {
            "strongbuy" => Action::StrongBuy,
            "buy" => Action::Buy,
            "weakbuy" => Action::WeakBuy,
            "hold" => Action::Hold,
            "sell" => Action::Sell,
            "strongsell" => Action::StrongSell,
            "error" => Action::Error,
            _ => Action::Other(text.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Action::StrongBuy => "Strong Buy",
            Action::Buy => "Buy",
            Action::WeakBuy => "Weak Buy",
            Action::Hold => "Hold",
            Action::Sell => "Sell",
            Action::StrongSell => "Strong Sell",
            Action::Error => "error",
            Action::Other(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Action::Error)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Model verdict for one ticker
///
/// Either field may be absent when the model returns JSON without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub action: Option<Action>,
    pub justification: Option<String>,
}

impl Recommendation {
    pub fn new(action: Action, justification: impl Into<String>) -> Self {
        Self {
            action: Some(action),
            justification: Some(justification.into()),
        }
    }

    /// Error verdict carrying a failure description
    pub fn error(justification: impl Into<String>) -> Self {
        Self::new(Action::Error, justification)
    }

    pub fn is_error(&self) -> bool {
        self.action.as_ref().is_some_and(Action::is_error)
    }

    /// Summary-table text ("N/A" when missing)
    pub fn action_label(&self) -> &str {
        self.action.as_ref().map(Action::label).unwrap_or(MISSING_ACTION)
    }

    /// Ticker-tab text ("No justification provided." when missing)
    pub fn justification_text(&self) -> &str {
        self.justification.as_deref().unwrap_or(MISSING_JUSTIFICATION)
    }
}

/// One row of the summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Stock")]
    pub stock: String,
    #[serde(rename = "Recommendation")]
    pub recommendation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse_levels() {
        assert_eq!(Action::parse("Strong Buy"), Action::StrongBuy);
        assert_eq!(Action::parse("strong_buy"), Action::StrongBuy);
        assert_eq!(Action::parse("1. Strong Buy"), Action::StrongBuy);
        assert_eq!(Action::parse("Buy"), Action::Buy);
        assert_eq!(Action::parse("3. Weak Buy"), Action::WeakBuy);
        assert_eq!(Action::parse("HOLD"), Action::Hold);
        assert_eq!(Action::parse("Sell"), Action::Sell);
        assert_eq!(Action::parse("Strong-Sell"), Action::StrongSell);
        assert_eq!(Action::parse("error"), Action::Error);
    }

    #[test]
    fn test_action_parse_unrecognized_kept_verbatim() {
        let action = Action::parse("  Accumulate on dips ");
        assert_eq!(action, Action::Other("Accumulate on dips".to_string()));
        assert_eq!(action.label(), "Accumulate on dips");
    }

    #[test]
    fn test_recommendation_defaults() {
        let rec = Recommendation {
            action: None,
            justification: None,
        };
        assert_eq!(rec.action_label(), "N/A");
        assert_eq!(rec.justification_text(), "No justification provided.");
        assert!(!rec.is_error());
    }

    #[test]
    fn test_error_recommendation() {
        let rec = Recommendation::error("Value Error: Invalid JSON response");
        assert!(rec.is_error());
        assert_eq!(rec.action_label(), "error");
    }

    #[test]
    fn test_summary_row_serialize() {
        let row = SummaryRow {
            stock: "AAPL".to_string(),
            recommendation: "Buy".to_string(),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"Stock":"AAPL","Recommendation":"Buy"}"#);
    }
}
