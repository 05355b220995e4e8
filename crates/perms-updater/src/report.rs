//! Per-document outcomes and the batch result.

use perms_diff::DocumentPreview;
use perms_fieldset::ApplySummary;
use perms_types::DocumentId;
use serde::Serialize;

use crate::error::UpdateError;

/// What happened to one document that was updated successfully.
#[derive(Clone, Debug)]
pub struct DocumentOutcome {
    pub id: DocumentId,
    pub summary: ApplySummary,
    /// `false` in dry-run mode.
    pub written: bool,
    /// Line diff of the rewrite, only computed in dry-run mode.
    pub preview: Option<DocumentPreview>,
}

/// Outcome of one batch, in selection order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub failures: Vec<(DocumentId, UpdateError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure(&self, id: &DocumentId) -> Option<&UpdateError> {
        self.failures
            .iter()
            .find(|(failed, _)| failed == id)
            .map(|(_, err)| err)
    }

    pub fn outcome(&self, id: &DocumentId) -> Option<&DocumentOutcome> {
        self.outcomes.iter().find(|o| &o.id == id)
    }

    /// Human-readable summary of every failure, or `None` on success.
    pub fn error_message(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let total = self.outcomes.len() + self.failures.len();
        let details: Vec<String> = self
            .failures
            .iter()
            .map(|(id, err)| format!("{}: {err}", id.title()))
            .collect();
        Some(format!(
            "{} of {total} permission sets failed: {}",
            self.failures.len(),
            details.join("; ")
        ))
    }

    /// Fold into the serializable result.
    pub fn result(&self) -> UpdateSummary {
        let mut documents: Vec<DocumentStatus> = self
            .outcomes
            .iter()
            .map(|o| DocumentStatus {
                id: o.id.clone(),
                status: if o.summary.changed() {
                    Status::Updated
                } else {
                    Status::Unchanged
                },
                inserted: o.summary.inserted,
                updated: o.summary.updated,
                written: o.written,
                error: None,
            })
            .collect();
        documents.extend(self.failures.iter().map(|(id, err)| DocumentStatus {
            id: id.clone(),
            status: Status::Failed,
            inserted: 0,
            updated: 0,
            written: false,
            error: Some(err.to_string()),
        }));
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        UpdateSummary {
            success: self.is_success(),
            error_message: self.error_message(),
            documents,
        }
    }
}

/// `{ success, errorMessage }` plus per-document detail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub documents: Vec<DocumentStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    pub id: DocumentId,
    pub status: Status,
    pub inserted: usize,
    pub updated: usize,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Updated,
    Unchanged,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> DocumentId {
        DocumentId::new(name).unwrap()
    }

    fn outcome(name: &str, inserted: usize) -> DocumentOutcome {
        DocumentOutcome {
            id: id(name),
            summary: ApplySummary {
                inserted,
                total: inserted,
                ..ApplySummary::default()
            },
            written: true,
            preview: None,
        }
    }

    #[test]
    fn success_serializes_without_message() {
        let report = BatchReport {
            outcomes: vec![outcome("A.xml", 2)],
            failures: vec![],
        };
        let json = serde_json::to_value(report.result()).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("errorMessage").is_none());
        assert_eq!(json["documents"][0]["status"], "updated");
        assert_eq!(json["documents"][0]["inserted"], 2);
    }

    #[test]
    fn failures_fold_into_message() {
        let report = BatchReport {
            outcomes: vec![outcome("A.permissionset-meta.xml", 0)],
            failures: vec![(
                id("B.permissionset-meta.xml"),
                UpdateError::DocumentNotFound(id("B.permissionset-meta.xml")),
            )],
        };
        let summary = report.result();
        assert!(!summary.success);
        let message = summary.error_message.unwrap();
        assert!(message.starts_with("1 of 2 permission sets failed: B: "));
        assert_eq!(summary.documents[0].status, Status::Unchanged);
        assert_eq!(summary.documents[1].status, Status::Failed);

        let json = serde_json::to_value(report.result()).unwrap();
        assert!(json["errorMessage"].is_string());
    }
}
