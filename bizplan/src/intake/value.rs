//! Intake field values.

use serde::Serialize;

/// A value held by one intake field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IntakeValue {
    /// Free text.
    Text(String),
    /// A single chosen option.
    Choice(String),
    /// A set of chosen options, in selection order.
    Tags(Vec<String>),
}

impl IntakeValue {
    /// Renders the value for prompt interpolation. Tags join with ", ".
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) | Self::Choice(s) => s.clone(),
            Self::Tags(tags) => tags.join(", "),
        }
    }

    /// Returns true if the value carries no content.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) | Self::Choice(s) => s.trim().is_empty(),
            Self::Tags(tags) => tags.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tags_joined() {
        let value = IntakeValue::Tags(vec!["Quality".into(), "Price".into()]);
        assert_eq!(value.render(), "Quality, Price");
    }

    #[test]
    fn test_render_scalar() {
        assert_eq!(IntakeValue::Text("EcoFashion".into()).render(), "EcoFashion");
        assert_eq!(IntakeValue::Choice("Wide".into()).render(), "Wide");
    }

    #[test]
    fn test_blank() {
        assert!(IntakeValue::Text("  ".into()).is_blank());
        assert!(IntakeValue::Tags(vec![]).is_blank());
        assert!(!IntakeValue::Choice("Low".into()).is_blank());
    }

    #[test]
    fn test_serialize_untagged() {
        let json = serde_json::to_string(&IntakeValue::Tags(vec!["a".into()])).unwrap();
        assert_eq!(json, r#"["a"]"#);
    }
}
