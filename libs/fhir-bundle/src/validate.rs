//! Structural validation of inbound submissions.
//!
//! Validation problems are data, not errors: a submission that fails these
//! checks is rejected with the full issue list so the sending party can see
//! every problem at once.

use serde_json::Value as JsonValue;

/// One problem found in a submitted document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: IssueCode,
    pub diagnostics: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    Structure,
    Required,
    Value,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Required => "required",
            Self::Value => "value",
        }
    }
}

impl ValidationIssue {
    pub fn error(code: IssueCode, diagnostics: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code,
            diagnostics: diagnostics.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    fn to_json(&self) -> JsonValue {
        let mut issue = serde_json::json!({
            "severity": self.severity.as_str(),
            "code": self.code.as_str(),
            "diagnostics": self.diagnostics,
        });
        if let Some(ref location) = self.location {
            issue["expression"] = serde_json::json!([location]);
        }
        issue
    }
}

/// Renders an issue list as the standard OperationOutcome document.
pub fn issues_to_operation_outcome(issues: &[ValidationIssue]) -> JsonValue {
    serde_json::json!({
        "resourceType": "OperationOutcome",
        "issue": issues.iter().map(|i| i.to_json()).collect::<Vec<_>>(),
    })
}

/// Checks that a submitted document has the structure ingestion relies on:
/// a Bundle with a type, well-formed entries, typed resources, and at least
/// one Patient to anchor a record. An empty result means acceptable.
pub fn validate_submission(document: &JsonValue) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let Some(root) = document.as_object() else {
        issues.push(ValidationIssue::error(
            IssueCode::Structure,
            "submission is not a JSON object",
        ));
        return issues;
    };

    match root.get("resourceType").and_then(|v| v.as_str()) {
        Some("Bundle") => {}
        Some(other) => issues.push(
            ValidationIssue::error(
                IssueCode::Value,
                format!("expected resourceType Bundle, found {other}"),
            )
            .with_location("Bundle.resourceType"),
        ),
        None => issues.push(
            ValidationIssue::error(IssueCode::Required, "resourceType is missing")
                .with_location("Bundle.resourceType"),
        ),
    }

    match root.get("type").and_then(|v| v.as_str()) {
        Some(t) if !t.is_empty() => {}
        _ => issues.push(
            ValidationIssue::error(IssueCode::Required, "bundle type is missing")
                .with_location("Bundle.type"),
        ),
    }

    let mut patient_seen = false;
    match root.get("entry") {
        None => {}
        Some(JsonValue::Array(entries)) => {
            for (index, entry) in entries.iter().enumerate() {
                let location = format!("Bundle.entry[{index}]");
                let Some(entry_obj) = entry.as_object() else {
                    issues.push(
                        ValidationIssue::error(IssueCode::Structure, "entry is not a JSON object")
                            .with_location(location),
                    );
                    continue;
                };
                match entry_obj.get("resource") {
                    Some(JsonValue::Object(resource)) => {
                        match resource
                            .get("resourceType")
                            .and_then(|v| v.as_str())
                            .filter(|t| !t.is_empty())
                        {
                            Some("Patient") => patient_seen = true,
                            Some(_) => {}
                            None => issues.push(
                                ValidationIssue::error(
                                    IssueCode::Required,
                                    "resource has no resourceType",
                                )
                                .with_location(format!("{location}.resource.resourceType")),
                            ),
                        }
                    }
                    Some(_) => issues.push(
                        ValidationIssue::error(
                            IssueCode::Structure,
                            "entry resource is not a JSON object",
                        )
                        .with_location(format!("{location}.resource")),
                    ),
                    None => issues.push(
                        ValidationIssue::error(IssueCode::Required, "entry has no resource")
                            .with_location(location),
                    ),
                }
            }
        }
        Some(_) => issues.push(
            ValidationIssue::error(IssueCode::Structure, "entry is not an array")
                .with_location("Bundle.entry"),
        ),
    }

    if !patient_seen {
        issues.push(
            ValidationIssue::error(
                IssueCode::Required,
                "submission contains no Patient resource",
            )
            .with_location("Bundle.entry"),
        );
    }

    issues
}
