//! # Change Events
//!
//! Typed notifications emitted for every committed document write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Revision;

/// Kind of change applied to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// Document created
    Insert,
    /// Existing document overwritten
    Update,
    /// Document removed
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "INSERT"),
            ChangeKind::Update => write!(f, "UPDATE"),
            ChangeKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// A committed change to one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Feed-wide, strictly increasing delivery sequence
    pub sequence: u64,

    /// Change kind
    pub kind: ChangeKind,

    /// Collection path (`nodes`, `nodes/{id}/votes`, ...)
    pub collection: String,

    /// Document id within the collection
    pub record_id: String,

    /// Commit that produced the change
    pub revision: Revision,

    /// Document after the change (INSERT/UPDATE)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Document before the change (UPDATE/DELETE)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,

    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Build an event from the before/after images of a write.
    ///
    /// Returns None when both images are absent (deleting a missing document).
    pub fn from_images(
        collection: String,
        record_id: String,
        revision: Revision,
        previous: Option<Value>,
        data: Option<Value>,
    ) -> Option<Self> {
        let kind = match (&previous, &data) {
            (None, Some(_)) => ChangeKind::Insert,
            (Some(_), Some(_)) => ChangeKind::Update,
            (Some(_), None) => ChangeKind::Delete,
            (None, None) => return None,
        };

        Some(Self {
            sequence: 0,
            kind,
            collection,
            record_id,
            revision,
            data,
            previous,
            timestamp: Utc::now(),
        })
    }

    /// Topic string for this event
    pub fn topic(&self) -> String {
        format!("changes:{}", self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(previous: Option<Value>, data: Option<Value>) -> Option<ChangeEvent> {
        ChangeEvent::from_images(
            "nodes".to_string(),
            "n1".to_string(),
            Revision::new(1),
            previous,
            data,
        )
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ChangeKind::Insert.to_string(), "INSERT");
        assert_eq!(ChangeKind::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_kind_from_images() {
        assert_eq!(event(None, Some(json!({}))).unwrap().kind, ChangeKind::Insert);
        assert_eq!(
            event(Some(json!({})), Some(json!({}))).unwrap().kind,
            ChangeKind::Update
        );
        assert_eq!(event(Some(json!({})), None).unwrap().kind, ChangeKind::Delete);
        assert!(event(None, None).is_none());
    }

    #[test]
    fn test_topic() {
        assert_eq!(event(None, Some(json!({}))).unwrap().topic(), "changes:nodes");
    }
}
