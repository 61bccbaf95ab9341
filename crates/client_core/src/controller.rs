use std::{
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};

use shared::{catalog::REPROCESSING_STARTED, domain::ProjectRef, protocol::ProcessingIssueSummary};
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    api::ProcessingIssuesApi,
    error::ControllerError,
    links::PageLinks,
    notify::{NotificationHandle, NotificationSink},
    transport::ApiTransport,
};

pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub loading: bool,
    pub reprocessing: bool,
    pub error: bool,
    pub processing_issues: Option<ProcessingIssueSummary>,
    pub page_links: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            loading: true,
            reprocessing: false,
            error: false,
            processing_issues: None,
            page_links: None,
        }
    }
}

impl ViewState {
    pub fn resolveable_issues(&self) -> u64 {
        self.processing_issues
            .as_ref()
            .map_or(0, |summary| summary.resolveable_issues)
    }

    /// Whether the "trigger reprocessing" action is on offer.
    pub fn can_reprocess(&self) -> bool {
        !self.reprocessing && self.resolveable_issues() > 0
    }

    pub fn page_links(&self) -> PageLinks {
        self.page_links
            .as_deref()
            .map(PageLinks::parse)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    StateChanged(ViewState),
    ReprocessFailed(String),
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Pause between a successful reprocessing trigger and the refetch, giving
    /// the backend time to pick the work up.
    pub refresh_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            refresh_delay: DEFAULT_REFRESH_DELAY,
        }
    }
}

struct ControllerState {
    view: ViewState,
    notification: Option<NotificationHandle>,
}

/// Drives the processing issues page: fetches the summary, tracks the
/// loading/error/reprocessing flags and runs the reprocessing workflow.
pub struct ProcessingIssuesController<T, N> {
    api: ProcessingIssuesApi<T>,
    notifications: N,
    project: ProjectRef,
    settings: ControllerSettings,
    inner: Mutex<ControllerState>,
    fetch_in_flight: Mutex<()>,
    events: broadcast::Sender<ControllerEvent>,
    shutdown: watch::Sender<bool>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl<T, N> ProcessingIssuesController<T, N>
where
    T: ApiTransport,
    N: NotificationSink,
{
    pub fn new(
        transport: T,
        notifications: N,
        project: ProjectRef,
        settings: ControllerSettings,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            api: ProcessingIssuesApi::new(transport),
            notifications,
            project,
            settings,
            inner: Mutex::new(ControllerState {
                view: ViewState::default(),
                notification: None,
            }),
            fetch_in_flight: Mutex::new(()),
            events,
            shutdown,
            tasks: StdMutex::new(Vec::new()),
        })
    }

    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ViewState {
        self.inner.lock().await.view.clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn ensure_open(&self) -> Result<(), ControllerError> {
        if self.is_closed() {
            Err(ControllerError::Closed)
        } else {
            Ok(())
        }
    }

    fn publish(&self, view: ViewState) {
        let _ = self.events.send(ControllerEvent::StateChanged(view));
    }

    pub async fn fetch_issues(&self) -> Result<(), ControllerError> {
        let _in_flight = self.fetch_in_flight.lock().await;
        self.ensure_open()?;

        debug!(project = %self.project, "fetching processing issues");
        let result = self.api.fetch_issues(&self.project).await;

        let mut inner = self.inner.lock().await;
        if self.is_closed() {
            debug!(project = %self.project, "dropping fetch response after teardown");
            return Err(ControllerError::Closed);
        }

        match result {
            Ok(fetched) => {
                info!(
                    project = %self.project,
                    has_issues = fetched.summary.has_issues,
                    resolveable = fetched.summary.resolveable_issues,
                    "processing issues loaded"
                );
                inner.view.error = false;
                inner.view.loading = false;
                inner.view.processing_issues = Some(fetched.summary);
                inner.view.page_links = fetched.page_links;
                self.publish(inner.view.clone());
                Ok(())
            }
            Err(err) => {
                warn!(project = %self.project, "failed to load processing issues: {err}");
                inner.view.error = true;
                inner.view.loading = false;
                self.publish(inner.view.clone());
                Err(ControllerError::FetchFailed(err))
            }
        }
    }

    /// Retry action offered by the error view.
    pub async fn retry(&self) -> Result<(), ControllerError> {
        info!(project = %self.project, "retrying processing issues fetch");
        self.fetch_issues().await
    }

    pub async fn trigger_reprocessing(&self) -> Result<(), ControllerError> {
        {
            let mut inner = self.inner.lock().await;
            self.ensure_open()?;
            if inner.view.reprocessing {
                return Err(ControllerError::AlreadyReprocessing);
            }
            if inner.view.resolveable_issues() == 0 {
                return Err(ControllerError::NothingToReprocess);
            }
            inner.view.reprocessing = true;
            inner.notification = Some(self.notifications.show(REPROCESSING_STARTED));
            self.publish(inner.view.clone());
        }

        info!(project = %self.project, "triggering reprocessing");
        match self.api.trigger_reprocessing(&self.project).await {
            Ok(()) => {
                let mut shutdown = self.shutdown.subscribe();
                let closed = *shutdown.borrow_and_update();
                if !closed {
                    tokio::select! {
                        _ = tokio::time::sleep(self.settings.refresh_delay) => {}
                        _ = shutdown.changed() => {}
                    }
                }
                self.finish_reprocessing().await;
                self.ensure_open()?;
                self.fetch_issues().await
            }
            Err(err) => {
                warn!(project = %self.project, "failed to trigger reprocessing: {err}");
                self.finish_reprocessing().await;
                self.ensure_open()?;
                let _ = self
                    .events
                    .send(ControllerEvent::ReprocessFailed(err.to_string()));
                Err(ControllerError::ReprocessFailed(err))
            }
        }
    }

    async fn finish_reprocessing(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(handle) = inner.notification.take() {
            self.notifications.dismiss(handle);
        }
        if self.is_closed() {
            return;
        }
        inner.view.reprocessing = false;
        self.publish(inner.view.clone());
    }

    /// Stops all work. Responses arriving afterwards leave the state as is.
    pub async fn teardown(&self) {
        // Flipped under the state lock so no publish can follow it.
        let mut inner = self.inner.lock().await;
        self.shutdown.send_replace(true);
        for task in self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            task.abort();
        }

        if let Some(handle) = inner.notification.take() {
            self.notifications.dismiss(handle);
        }
        debug!(project = %self.project, "processing issues view torn down");
    }
}

impl<T, N> ProcessingIssuesController<T, N>
where
    T: ApiTransport + 'static,
    N: NotificationSink + 'static,
{
    /// Initial load.
    pub fn mount(self: &Arc<Self>) {
        self.spawn_fetch();
    }

    pub fn spawn_fetch(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.track(tokio::spawn(async move {
            if let Err(err) = this.fetch_issues().await {
                debug!("background fetch ended: {err}");
            }
        }));
    }

    pub fn spawn_reprocessing(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.track(tokio::spawn(async move {
            if let Err(err) = this.trigger_reprocessing().await {
                debug!("background reprocessing ended: {err}");
            }
        }));
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        if self.is_closed() {
            handle.abort();
            return;
        }
        tasks.push(handle);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
