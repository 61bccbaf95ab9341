use std::{
    collections::VecDeque,
    sync::Mutex as StdMutex,
    time::{Duration, Instant},
};

use super::*;
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use crate::{
    error::TransportError,
    notify::IndicatorRegistry,
    transport::{ApiResponse, Method},
};

const TEST_DELAY: Duration = Duration::from_millis(50);

enum Reply {
    Json {
        body: serde_json::Value,
        link: Option<&'static str>,
    },
    Status(u16),
}

struct Step {
    reply: Reply,
    hold: Option<Arc<Notify>>,
}

#[derive(Default)]
struct ScriptedTransport {
    steps: StdMutex<VecDeque<Step>>,
    calls: StdMutex<Vec<(Method, String, Instant)>>,
}

impl ScriptedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, reply: Reply) {
        self.steps
            .lock()
            .expect("steps")
            .push_back(Step { reply, hold: None });
    }

    fn push_held(&self, reply: Reply, hold: Arc<Notify>) {
        self.steps.lock().expect("steps").push_back(Step {
            reply,
            hold: Some(hold),
        });
    }

    fn calls(&self) -> Vec<(Method, String)> {
        self.calls
            .lock()
            .expect("calls")
            .iter()
            .map(|(method, path, _)| (*method, path.clone()))
            .collect()
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .expect("calls")
            .iter()
            .map(|(_, _, at)| *at)
            .collect()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn request(&self, method: Method, path: &str) -> Result<ApiResponse, TransportError> {
        self.calls
            .lock()
            .expect("calls")
            .push((method, path.to_string(), Instant::now()));
        let step = self
            .steps
            .lock()
            .expect("steps")
            .pop_front()
            .expect("unexpected request");
        if let Some(hold) = step.hold {
            hold.notified().await;
        }
        match step.reply {
            Reply::Json { body, link } => Ok(ApiResponse {
                status: 200,
                link: link.map(str::to_string),
                body: serde_json::to_vec(&body).expect("encode"),
            }),
            Reply::Status(status) => Err(TransportError::status(
                status,
                br#"{"detail":"scripted failure"}"#,
            )),
        }
    }
}

fn summary_json(has_issues: bool, resolveable: u64) -> serde_json::Value {
    json!({
        "hasIssues": has_issues,
        "resolveableIssues": resolveable,
        "issues": if has_issues {
            json!([{
                "type": "native_missing_dsym",
                "numEvents": 5,
                "lastSeen": "2017-03-01T10:00:00Z",
                "data": {"_scope": "native", "image_path": "/a/b/App.dSYM"}
            }])
        } else {
            json!([])
        }
    })
}

fn ok(has_issues: bool, resolveable: u64) -> Reply {
    Reply::Json {
        body: summary_json(has_issues, resolveable),
        link: None,
    }
}

fn posted() -> Reply {
    Reply::Json {
        body: json!({}),
        link: None,
    }
}

type TestController = ProcessingIssuesController<Arc<ScriptedTransport>, Arc<IndicatorRegistry>>;

fn controller(transport: &Arc<ScriptedTransport>) -> (Arc<TestController>, Arc<IndicatorRegistry>) {
    let registry = Arc::new(IndicatorRegistry::new());
    let controller = ProcessingIssuesController::new(
        Arc::clone(transport),
        Arc::clone(&registry),
        ProjectRef::new("acme", "ios-app"),
        ControllerSettings {
            refresh_delay: TEST_DELAY,
        },
    );
    (controller, registry)
}

const ISSUES_PATH: &str = "/projects/acme/ios-app/processingissues/?detailed=1";
const REPROCESSING_PATH: &str = "/projects/acme/ios-app/reprocessing/";

#[tokio::test]
async fn starts_in_loading_state() {
    let transport = ScriptedTransport::new();
    let (controller, _) = controller(&transport);
    let state = controller.snapshot().await;
    assert!(state.loading);
    assert!(!state.error);
    assert!(!state.reprocessing);
    assert!(state.processing_issues.is_none());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn successful_fetch_stores_summary_and_link_header() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::Json {
        body: summary_json(true, 3),
        link: Some("<https://x/?cursor=0:100:0>; rel=\"next\"; results=\"true\"; cursor=\"0:100:0\""),
    });
    let (controller, _) = controller(&transport);

    controller.fetch_issues().await.expect("fetch");

    let state = controller.snapshot().await;
    assert!(!state.loading);
    assert!(!state.error);
    let summary = state.processing_issues.as_ref().expect("summary");
    assert_eq!(summary.resolveable_issues, 3);
    assert_eq!(summary.issues.len(), 1);
    assert!(state.page_links().has_next());
    assert_eq!(transport.calls(), vec![(Method::Get, ISSUES_PATH.to_string())]);
}

#[tokio::test]
async fn failed_fetch_sets_error_and_retry_refetches() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::Status(500));
    transport.push(ok(false, 0));
    let (controller, _) = controller(&transport);

    let err = controller.fetch_issues().await.expect_err("fetch should fail");
    assert!(matches!(err, ControllerError::FetchFailed(_)));
    let state = controller.snapshot().await;
    assert!(state.error);
    assert!(!state.loading);
    assert!(state.processing_issues.is_none());
    assert!(matches!(
        crate::view::render_page(&state).body,
        crate::view::PageBody::Error { .. }
    ));

    controller.retry().await.expect("retry");
    let state = controller.snapshot().await;
    assert!(!state.error);
    assert!(matches!(
        crate::view::render_page(&state).body,
        crate::view::PageBody::Empty { .. }
    ));
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn failed_refetch_keeps_previous_summary() {
    let transport = ScriptedTransport::new();
    transport.push(ok(true, 2));
    transport.push(Reply::Status(502));
    let (controller, _) = controller(&transport);

    controller.fetch_issues().await.expect("first fetch");
    controller
        .fetch_issues()
        .await
        .expect_err("second fetch fails");

    let state = controller.snapshot().await;
    assert!(state.error);
    assert_eq!(state.resolveable_issues(), 2);
}

#[tokio::test]
async fn reprocessing_success_refetches_after_delay() {
    let transport = ScriptedTransport::new();
    transport.push(ok(true, 3));
    transport.push(posted());
    transport.push(ok(false, 0));
    let (controller, registry) = controller(&transport);
    let mut events = controller.subscribe();

    controller.fetch_issues().await.expect("fetch");
    controller
        .trigger_reprocessing()
        .await
        .expect("reprocessing");

    assert_eq!(
        transport.calls(),
        vec![
            (Method::Get, ISSUES_PATH.to_string()),
            (Method::Post, REPROCESSING_PATH.to_string()),
            (Method::Get, ISSUES_PATH.to_string()),
        ]
    );
    let times = transport.call_times();
    assert!(times[2].duration_since(times[1]) >= TEST_DELAY);

    let state = controller.snapshot().await;
    assert!(!state.reprocessing);
    assert_eq!(state.resolveable_issues(), 0);
    assert!(registry.is_empty());
    assert_eq!(registry.shown_count(), 1);

    let mut saw_reprocessing = false;
    while let Ok(event) = events.try_recv() {
        if let ControllerEvent::StateChanged(view) = event {
            saw_reprocessing |= view.reprocessing;
        }
    }
    assert!(saw_reprocessing);
}

#[tokio::test]
async fn notification_is_visible_while_reprocessing() {
    let transport = ScriptedTransport::new();
    let hold = Arc::new(Notify::new());
    transport.push(ok(true, 1));
    transport.push_held(posted(), Arc::clone(&hold));
    transport.push(ok(true, 1));
    let (controller, registry) = controller(&transport);

    controller.fetch_issues().await.expect("fetch");
    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.trigger_reprocessing().await })
    };

    while transport.calls().len() < 2 {
        tokio::task::yield_now().await;
    }
    let active = registry.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].text, "Started reprocessing..");
    let state = controller.snapshot().await;
    assert!(state.reprocessing);
    assert!(crate::view::render_page(&state).call_to_action.is_none());

    hold.notify_one();
    task.await.expect("join").expect("reprocessing");
    assert!(registry.is_empty());
}

#[tokio::test]
async fn reprocessing_failure_clears_flags_without_refetch() {
    let transport = ScriptedTransport::new();
    transport.push(ok(true, 3));
    transport.push(Reply::Status(500));
    let (controller, registry) = controller(&transport);
    let mut events = controller.subscribe();

    controller.fetch_issues().await.expect("fetch");
    let err = controller
        .trigger_reprocessing()
        .await
        .expect_err("reprocessing should fail");
    assert!(matches!(err, ControllerError::ReprocessFailed(_)));

    assert_eq!(transport.calls().len(), 2);
    let state = controller.snapshot().await;
    assert!(!state.reprocessing);
    assert!(!state.error);
    assert!(state.can_reprocess());
    assert!(registry.is_empty());

    let mut failure = None;
    while let Ok(event) = events.try_recv() {
        if let ControllerEvent::ReprocessFailed(message) = event {
            failure = Some(message);
        }
    }
    assert!(failure.expect("failure event").contains("scripted failure"));
}

#[tokio::test]
async fn reprocessing_requires_resolveable_issues() {
    let transport = ScriptedTransport::new();
    transport.push(ok(true, 0));
    let (controller, registry) = controller(&transport);

    let err = controller
        .trigger_reprocessing()
        .await
        .expect_err("nothing loaded yet");
    assert!(matches!(err, ControllerError::NothingToReprocess));

    controller.fetch_issues().await.expect("fetch");
    let err = controller
        .trigger_reprocessing()
        .await
        .expect_err("nothing resolveable");
    assert!(matches!(err, ControllerError::NothingToReprocess));

    assert_eq!(transport.calls().len(), 1);
    assert_eq!(registry.shown_count(), 0);
}

#[tokio::test]
async fn double_trigger_sends_a_single_request() {
    let transport = ScriptedTransport::new();
    transport.push(ok(true, 3));
    transport.push(posted());
    transport.push(ok(true, 0));
    let (controller, registry) = controller(&transport);

    controller.fetch_issues().await.expect("fetch");
    let (first, second) = tokio::join!(
        controller.trigger_reprocessing(),
        controller.trigger_reprocessing()
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|result| matches!(result, Err(ControllerError::AlreadyReprocessing))));
    let posts = transport
        .calls()
        .into_iter()
        .filter(|(method, _)| *method == Method::Post)
        .count();
    assert_eq!(posts, 1);
    assert_eq!(registry.shown_count(), 1);
}

#[tokio::test]
async fn late_fetch_response_after_teardown_is_ignored() {
    let transport = ScriptedTransport::new();
    let hold = Arc::new(Notify::new());
    transport.push_held(ok(true, 3), Arc::clone(&hold));
    let (controller, _) = controller(&transport);

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.fetch_issues().await })
    };
    while transport.calls().is_empty() {
        tokio::task::yield_now().await;
    }

    controller.teardown().await;
    hold.notify_one();

    let result = task.await.expect("join");
    assert!(matches!(result, Err(ControllerError::Closed)));
    let state = controller.snapshot().await;
    assert!(state.loading);
    assert!(state.processing_issues.is_none());

    assert!(matches!(
        controller.fetch_issues().await,
        Err(ControllerError::Closed)
    ));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn teardown_waits_for_state_update_in_progress() {
    let transport = ScriptedTransport::new();
    let (controller, _) = controller(&transport);
    let mut events = controller.subscribe();

    let guard = controller.inner.lock().await;
    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.teardown().await })
    };
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!controller.is_closed());
    assert!(!task.is_finished());

    controller.publish(guard.view.clone());
    drop(guard);
    task.await.expect("join");

    assert!(controller.is_closed());
    assert!(matches!(
        events.try_recv(),
        Ok(ControllerEvent::StateChanged(_))
    ));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn teardown_during_refresh_delay_dismisses_notification() {
    let transport = ScriptedTransport::new();
    transport.push(ok(true, 3));
    transport.push(posted());
    let registry = Arc::new(IndicatorRegistry::new());
    let controller = ProcessingIssuesController::new(
        Arc::clone(&transport),
        Arc::clone(&registry),
        ProjectRef::new("acme", "ios-app"),
        ControllerSettings {
            refresh_delay: Duration::from_secs(30),
        },
    );

    controller.fetch_issues().await.expect("fetch");
    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.trigger_reprocessing().await })
    };
    while transport.calls().len() < 2 {
        tokio::task::yield_now().await;
    }
    tokio::task::yield_now().await;

    controller.teardown().await;
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("teardown should cut the delay short")
        .expect("join");
    assert!(matches!(result, Err(ControllerError::Closed)));
    assert!(registry.is_empty());
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn mount_loads_in_background_and_publishes_state() {
    let transport = ScriptedTransport::new();
    transport.push(ok(false, 0));
    let (controller, _) = controller(&transport);
    let mut events = controller.subscribe();

    controller.mount();

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event in time")
        .expect("event");
    match event {
        ControllerEvent::StateChanged(view) => {
            assert!(!view.loading);
            assert!(!view.processing_issues.expect("summary").has_issues);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn spawned_reprocessing_is_aborted_by_teardown() {
    let transport = ScriptedTransport::new();
    let hold = Arc::new(Notify::new());
    transport.push(ok(true, 3));
    transport.push_held(posted(), Arc::clone(&hold));
    let (controller, registry) = controller(&transport);

    controller.fetch_issues().await.expect("fetch");
    controller.spawn_reprocessing();
    while transport.calls().len() < 2 {
        tokio::task::yield_now().await;
    }
    assert_eq!(registry.active().len(), 1);

    controller.teardown().await;
    assert!(registry.is_empty());
    assert!(controller.is_closed());
}
