use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::IssueScope;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingIssueSummary {
    pub has_issues: bool,
    pub resolveable_issues: u64,
    #[serde(default)]
    pub issues: Vec<ProcessingIssueItem>,
    #[serde(default)]
    pub num_issues: u64,
    #[serde(default)]
    pub issues_processing: u64,
    #[serde(default)]
    pub has_more_resolveable_issues: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl ProcessingIssueSummary {
    pub fn empty() -> Self {
        Self {
            has_issues: false,
            resolveable_issues: 0,
            issues: Vec::new(),
            num_issues: 0,
            issues_processing: 0,
            has_more_resolveable_issues: false,
            last_seen: None,
            project: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingIssueItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub num_events: u64,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub data: IssueData,
}

/// Free-form issue payload. Native symbolication issues describe the
/// offending debug image; everything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueData {
    #[serde(rename = "_scope", default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_arch: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl IssueData {
    pub fn scope(&self) -> Option<IssueScope> {
        IssueScope::from_raw(self.scope.as_deref())
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(serde_json::Value::as_str)
    }
}
