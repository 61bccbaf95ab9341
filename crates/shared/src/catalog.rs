//! Static text for the processing issues page: issue type messages, help
//! links and the fixed page copy.

use crate::protocol::ProcessingIssueItem;

pub const PAGE_TITLE: &str = "Processing Issues";
pub const PAGE_INTRO: &str = "For some platforms the event processing requires configuration or \
manual action.  If a misconfiguration happens or some necessary steps are skipped issues can \
occur during processing.  In these cases you can see all the problems here with guides of how \
to correct them.";
pub const EMPTY_STATE: &str = "Good news! There are no processing issues.";
pub const LOADING_ERROR: &str = "There was an error loading data.";
pub const RETRY_LABEL: &str = "Retry";
pub const PRO_TIP: &str = "Pro Tip:";
pub const REPROCESSING_STARTED: &str = "Started reprocessing..";
pub const UNKNOWN_ERROR: &str = "Unknown Error";

pub const COLUMN_PROBLEM: &str = "Problem";
pub const COLUMN_DETAILS: &str = "Details";
pub const COLUMN_EVENTS: &str = "Events";
pub const COLUMN_LAST_SEEN: &str = "Last seen";

const ERROR_PLACEHOLDER: &str = "{error}";

const ISSUE_MESSAGES: &[(&str, &str)] = &[
    (
        "native_no_crashed_thread",
        "No crashed thread found in crash report",
    ),
    (
        "native_internal_failure",
        "Internal failure when attempting to symbolicate: {error}",
    ),
    (
        "native_no_symsynd",
        "The symbolizer is not configured for this system.",
    ),
    ("native_bad_dsym", "The debug symbol file used was broken."),
    (
        "native_missing_optionally_bundled_dsym",
        "An optional debug symbol file was missing.",
    ),
    (
        "native_missing_dsym",
        "A required debug symbol file was missing.",
    ),
    (
        "native_missing_system_dsym",
        "A system debug symbol file was missing.",
    ),
    ("native_missing_symbol", "Unable to resolve a symbol."),
    (
        "native_simulator_frame",
        "Encountered an unprocessable simulator frame.",
    ),
    (
        "native_unknown_image",
        "An binary image is referenced that is unknown.",
    ),
];

const HELP_LINKS: &[(&str, &str)] = &[
    (
        "native_missing_dsym",
        "https://docs.sentry.io/clients/cocoa/dsym/",
    ),
    ("native_bad_dsym", "https://docs.sentry.io/clients/cocoa/dsym/"),
    (
        "native_missing_system_dsym",
        "https://docs.sentry.io/server/dsym/",
    ),
    ("native_missing_symbol", "https://docs.sentry.io/server/dsym/"),
];

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, value)| *value)
}

pub fn problem_message(issue_type: &str) -> Option<&'static str> {
    lookup(ISSUE_MESSAGES, issue_type)
}

pub fn help_link(issue_type: &str) -> Option<&'static str> {
    lookup(HELP_LINKS, issue_type)
}

/// Human readable problem text: catalog message, then the backend's own
/// message, then [`UNKNOWN_ERROR`].
pub fn describe_problem(item: &ProcessingIssueItem) -> String {
    if let Some(message) = problem_message(&item.issue_type) {
        return match item.data.extra_str("error") {
            Some(error) if message.contains(ERROR_PLACEHOLDER) => {
                message.replace(ERROR_PLACEHOLDER, error)
            }
            _ => message.to_string(),
        };
    }
    item.message
        .clone()
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Last `/`-separated segment of an image path.
pub fn image_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn reprocess_prompt(pending_events: u64) -> String {
    if pending_events == 1 {
        format!("Click here to trigger reprocessing for {pending_events} pending event")
    } else {
        format!("Click here to trigger reprocessing for {pending_events} pending events")
    }
}
