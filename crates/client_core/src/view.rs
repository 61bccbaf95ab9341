//! Pure rendering of [`ViewState`] into a page model a front end can draw.

use std::fmt;

use chrono::{DateTime, Utc};
use shared::{
    catalog::{self, EMPTY_STATE, LOADING_ERROR, PAGE_INTRO, PAGE_TITLE, RETRY_LABEL},
    domain::IssueScope,
    protocol::ProcessingIssueItem,
};

use crate::controller::ViewState;

#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub title: &'static str,
    pub intro: &'static str,
    pub body: PageBody,
    pub call_to_action: Option<ReprocessCallToAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    Loading,
    Error {
        message: &'static str,
        retry_label: &'static str,
    },
    Empty {
        message: &'static str,
    },
    Results {
        rows: Vec<IssueRow>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReprocessCallToAction {
    pub pending_events: u64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueRow {
    pub problem: String,
    pub help_link: Option<&'static str>,
    pub detail: IssueDetail,
    pub events: String,
    pub last_seen: DateTime<Utc>,
}

/// Debug image details; only populated for native issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDetail {
    pub image_uuid: Option<String>,
    pub image_arch: Option<String>,
    pub image_name: Option<String>,
}

impl IssueDetail {
    pub fn from_item(item: &ProcessingIssueItem) -> Self {
        if item.data.scope() != Some(IssueScope::Native) {
            return Self::default();
        }
        let non_empty = |value: &Option<String>| value.clone().filter(|value| !value.is_empty());
        Self {
            image_uuid: non_empty(&item.data.image_uuid),
            image_arch: non_empty(&item.data.image_arch),
            image_name: item
                .data
                .image_path
                .as_deref()
                .filter(|path| !path.is_empty())
                .map(|path| catalog::image_name(path).to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image_uuid.is_none() && self.image_arch.is_none() && self.image_name.is_none()
    }
}

impl fmt::Display for IssueDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if let Some(uuid) = &self.image_uuid {
            parts.push(uuid.clone());
        }
        if let Some(arch) = &self.image_arch {
            parts.push(arch.clone());
        }
        if let Some(name) = &self.image_name {
            parts.push(format!("(for {name})"));
        }
        f.write_str(&parts.join(" "))
    }
}

pub fn render_row(item: &ProcessingIssueItem) -> IssueRow {
    IssueRow {
        problem: catalog::describe_problem(item),
        help_link: catalog::help_link(&item.issue_type),
        detail: IssueDetail::from_item(item),
        events: item.num_events.to_string(),
        last_seen: item.last_seen,
    }
}

pub fn render_page(state: &ViewState) -> PageView {
    let body = if state.loading {
        PageBody::Loading
    } else if state.error {
        PageBody::Error {
            message: LOADING_ERROR,
            retry_label: RETRY_LABEL,
        }
    } else {
        match &state.processing_issues {
            Some(summary) if summary.has_issues => PageBody::Results {
                rows: summary.issues.iter().map(render_row).collect(),
            },
            Some(_) => PageBody::Empty {
                message: EMPTY_STATE,
            },
            None => PageBody::Loading,
        }
    };

    let call_to_action = state
        .processing_issues
        .as_ref()
        .filter(|summary| !state.reprocessing && summary.resolveable_issues > 0)
        .map(|summary| ReprocessCallToAction {
            pending_events: summary.resolveable_issues,
            label: catalog::reprocess_prompt(summary.resolveable_issues),
        });

    PageView {
        title: PAGE_TITLE,
        intro: PAGE_INTRO,
        body,
        call_to_action,
    }
}

/// Relative description of `then` as seen from `now`, e.g. "5 minutes ago".
pub fn time_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0) as f64;
    let minutes = seconds / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;

    if seconds < 45.0 {
        "a few seconds ago".to_string()
    } else if seconds < 90.0 {
        "a minute ago".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes ago", minutes.round())
    } else if minutes < 90.0 {
        "an hour ago".to_string()
    } else if hours < 22.0 {
        format!("{} hours ago", hours.round())
    } else if hours < 36.0 {
        "a day ago".to_string()
    } else if days < 26.0 {
        format!("{} days ago", days.round())
    } else if days < 46.0 {
        "a month ago".to_string()
    } else if days < 320.0 {
        format!("{} months ago", (days / 30.0).round())
    } else if days < 548.0 {
        "a year ago".to_string()
    } else {
        format!("{} years ago", (days / 365.0).round())
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
