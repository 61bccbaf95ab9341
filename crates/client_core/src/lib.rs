pub mod api;
pub mod controller;
pub mod error;
pub mod links;
pub mod notify;
pub mod transport;
pub mod view;

pub use api::{FetchedIssues, ProcessingIssuesApi};
pub use controller::{
    ControllerEvent, ControllerSettings, ProcessingIssuesController, ViewState,
    DEFAULT_REFRESH_DELAY,
};
pub use error::{ControllerError, TransportError};
pub use links::{PageLink, PageLinks};
pub use notify::{IndicatorRegistry, LogNotifications, NotificationHandle, NotificationSink};
pub use transport::{ApiResponse, ApiTransport, HttpTransport, HttpTransportConfig, Method};
pub use view::{render_page, time_since, IssueDetail, IssueRow, PageBody, PageView};
