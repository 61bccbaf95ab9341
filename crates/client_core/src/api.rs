use shared::{domain::ProjectRef, protocol::ProcessingIssueSummary};
use tracing::debug;
use url::Url;

use crate::{
    error::TransportError,
    transport::{ApiTransport, Method},
};

const PATH_BASE: &str = "http://localhost/";

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedIssues {
    pub summary: ProcessingIssueSummary,
    /// Raw `Link` header, kept as received.
    pub page_links: Option<String>,
}

fn project_path(project: &ProjectRef, endpoint: &str) -> Result<String, TransportError> {
    let mut url = Url::parse(PATH_BASE)?;
    url.path_segments_mut()
        .map_err(|()| TransportError::CannotBeABase(PATH_BASE.to_string()))?
        .pop_if_empty()
        .extend([
            "projects",
            project.org.as_str(),
            project.project.as_str(),
            endpoint,
            "",
        ]);
    Ok(url.path().to_string())
}

pub fn issues_path(project: &ProjectRef) -> Result<String, TransportError> {
    Ok(format!(
        "{}?detailed=1",
        project_path(project, "processingissues")?
    ))
}

pub fn reprocessing_path(project: &ProjectRef) -> Result<String, TransportError> {
    project_path(project, "reprocessing")
}

/// Typed access to the two processing issue endpoints.
pub struct ProcessingIssuesApi<T> {
    transport: T,
}

impl<T: ApiTransport> ProcessingIssuesApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn fetch_issues(&self, project: &ProjectRef) -> Result<FetchedIssues, TransportError> {
        let path = issues_path(project)?;
        let res = self.transport.request(Method::Get, &path).await?;
        let summary: ProcessingIssueSummary = res.json()?;
        debug!(
            %project,
            issues = summary.issues.len(),
            resolveable = summary.resolveable_issues,
            "fetched processing issues"
        );
        Ok(FetchedIssues {
            summary,
            page_links: res.link,
        })
    }

    pub async fn trigger_reprocessing(&self, project: &ProjectRef) -> Result<(), TransportError> {
        let path = reprocessing_path(project)?;
        self.transport.request(Method::Post, &path).await?;
        Ok(())
    }
}
