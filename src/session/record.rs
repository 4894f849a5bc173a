use serde::{Deserialize, Serialize};

/// Index entry for one session.
///
/// On disk both fields are plain strings; an empty `filename` marks the draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "filename", default, with = "blank_as_none")]
    pub identifier: Option<String>,
    #[serde(default, with = "blank_as_none")]
    pub summary: Option<String>,
}

impl SessionRecord {
    /// A record that has not been flushed yet
    pub fn draft() -> Self {
        Self::default()
    }

    pub fn is_draft(&self) -> bool {
        self.identifier.is_none()
    }

    /// Summary shown to the user; drafts have none
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}

mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_entry_format() {
        let records = vec![
            SessionRecord::draft(),
            SessionRecord {
                identifier: Some("a1b2c3d4e5".to_string()),
                summary: Some("Rust lifetimes".to_string()),
            },
        ];

        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"filename": "", "summary": ""},
                {"filename": "a1b2c3d4e5", "summary": "Rust lifetimes"},
            ])
        );

        let parsed: Vec<SessionRecord> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, records);
        assert!(parsed[0].is_draft());
        assert_eq!(parsed[0].summary_text(), "");
    }

    #[test]
    fn test_null_fields_read_as_absent() {
        let parsed: SessionRecord =
            serde_json::from_str(r#"{"filename": null, "summary": null}"#).unwrap();
        assert!(parsed.is_draft());
        assert_eq!(parsed.summary, None);
    }
}
