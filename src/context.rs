//! Shared navigation context
//!
//! [`ServerContext`] is the single piece of mutable state the router and the
//! host share: the current navigation intent, the target view slot key, the
//! active webview, and the last-matched route parameters. It is passed
//! explicitly (inside a [`RouterContext`]) rather than acquired ambiently.
//!
//! Single-writer discipline per field:
//! - `action`, `key` — written by the bootstrap/history driver before a
//!   dispatch starts.
//! - `webview`, `force` — written by the router's transition logic.
//! - `params` — written by the dispatch loop just before each handler call;
//!   it is a single in-flight value, so concurrent dispatches are not
//!   supported.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::animate::AnimateOptions;
use crate::params::RouteParams;
use crate::scheduler::Scheduler;
use crate::warn_log;
use crate::webview::{ViewNode, Webview};

/// Why a navigation is occurring.
///
/// The wire-string forms (`"HISTORY:FORWARD"` etc.) match what a host history
/// integration reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationIntent {
    /// Host history traversal toward a newer entry
    HistoryForward,
    /// Host history traversal toward an older entry
    HistoryBackward,
    /// App-level forward navigation
    ApplicationForward,
    /// App-level backward navigation
    ApplicationBackward,
    /// In-place refresh of the current view
    Refresh,
    /// First navigation, or any intent without a dedicated behavior
    #[default]
    Initial,
}

impl NavigationIntent {
    /// Wire-string form of this intent
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HistoryForward => "HISTORY:FORWARD",
            Self::HistoryBackward => "HISTORY:BACKWARD",
            Self::ApplicationForward => "APPLICATION:FORWARD",
            Self::ApplicationBackward => "APPLICATION:BACKWARD",
            Self::Refresh => "REFRESH",
            Self::Initial => "INITIAL",
        }
    }

    /// Parse a host-reported action string.
    ///
    /// Unknown actions map to [`NavigationIntent::Initial`], which resolves to
    /// the create-and-activate behavior.
    pub fn from_action(action: &str) -> Self {
        match action {
            "HISTORY:FORWARD" => Self::HistoryForward,
            "HISTORY:BACKWARD" => Self::HistoryBackward,
            "APPLICATION:FORWARD" => Self::ApplicationForward,
            "APPLICATION:BACKWARD" => Self::ApplicationBackward,
            "REFRESH" => Self::Refresh,
            _ => Self::Initial,
        }
    }

    /// Whether this intent resolves to a forward transition
    pub fn is_forward(self) -> bool {
        matches!(self, Self::HistoryForward | Self::ApplicationForward)
    }

    /// Whether this intent resolves to a backward transition
    pub fn is_backward(self) -> bool {
        matches!(self, Self::HistoryBackward | Self::ApplicationBackward)
    }
}

impl fmt::Display for NavigationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for the global navigation primitives on [`ServerContext`].
///
/// The bootstrap installs itself here; hosts embedding the router without the
/// bootstrap can install their own driver.
pub trait NavigationDriver {
    /// Replace the current entry and navigate without an animated transition
    fn redirect(&self, url: &str);

    /// Replace the current entry, presenting it as a backward transition
    fn reback(&self, url: &str);

    /// Push a new entry and navigate forward
    fn forward(&self, url: &str);

    /// Step back in history, optionally to the entry matching `url`
    fn back(&self, url: Option<&str>);

    /// Refresh the current view in place
    fn refresh(&self);
}

/// The shared mutable navigation state (the `$server` of the wire format).
///
/// Lifetime is the app lifetime. All interior mutability is single-threaded;
/// the type is deliberately `!Send`.
#[derive(Default)]
pub struct ServerContext {
    action: Cell<NavigationIntent>,
    key: RefCell<String>,
    webview: RefCell<Option<Rc<dyn Webview>>>,
    force: Cell<bool>,
    params: RefCell<RouteParams>,
    driver: RefCell<Option<Weak<dyn NavigationDriver>>>,
}

impl ServerContext {
    /// Create a fresh context with an [`NavigationIntent::Initial`] action
    pub fn new() -> Self {
        Self::default()
    }

    /// Current navigation intent
    pub fn action(&self) -> NavigationIntent {
        self.action.get()
    }

    /// Set the navigation intent for the upcoming dispatch
    pub fn set_action(&self, action: NavigationIntent) {
        self.action.set(action);
    }

    /// Identity of the target view slot
    pub fn key(&self) -> String {
        self.key.borrow().clone()
    }

    /// Set the target view slot for the upcoming dispatch
    pub fn set_key(&self, key: impl Into<String>) {
        *self.key.borrow_mut() = key.into();
    }

    /// The currently active webview, if any
    pub fn current_webview(&self) -> Option<Rc<dyn Webview>> {
        self.webview.borrow().clone()
    }

    /// Promote a webview to current
    pub fn set_current_webview(&self, webview: Option<Rc<dyn Webview>>) {
        *self.webview.borrow_mut() = webview;
    }

    /// Whether the next same-key navigation must still run activation logic
    pub fn force(&self) -> bool {
        self.force.get()
    }

    /// Set the force flag
    pub fn set_force(&self, force: bool) {
        self.force.set(force);
    }

    /// Read and clear the force flag
    pub fn take_force(&self) -> bool {
        self.force.replace(false)
    }

    /// Parameters captured by the most recently matched layer
    pub fn params(&self) -> RouteParams {
        self.params.borrow().clone()
    }

    /// Set the in-flight parameter value (done by the dispatch loop)
    pub fn set_params(&self, params: RouteParams) {
        *self.params.borrow_mut() = params;
    }

    /// Install the driver backing the navigation primitives.
    ///
    /// Held weakly so the driver (which usually owns this context) can be
    /// dropped without a reference cycle keeping it alive.
    pub fn install_driver(&self, driver: Weak<dyn NavigationDriver>) {
        *self.driver.borrow_mut() = Some(driver);
    }

    fn with_driver(&self, op: &str, f: impl FnOnce(&dyn NavigationDriver)) {
        let driver = self.driver.borrow().as_ref().and_then(Weak::upgrade);
        match driver {
            Some(driver) => f(driver.as_ref()),
            None => {
                warn_log!("{} ignored: no navigation driver installed", op);
            }
        }
    }

    /// Replace the current entry and navigate without an animated transition
    pub fn redirect(&self, url: &str) {
        self.with_driver("redirect", |d| d.redirect(url));
    }

    /// Replace the current entry, presenting it as a backward transition
    pub fn reback(&self, url: &str) {
        self.with_driver("reback", |d| d.reback(url));
    }

    /// Push a new entry and navigate forward
    pub fn forward(&self, url: &str) {
        self.with_driver("forward", |d| d.forward(url));
    }

    /// Step back in history, optionally to the entry matching `url`
    pub fn back(&self, url: Option<&str>) {
        self.with_driver("back", |d| d.back(url));
    }

    /// Refresh the current view in place
    pub fn refresh(&self) {
        self.with_driver("refresh", |d| d.refresh());
    }
}

impl fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerContext")
            .field("action", &self.action.get())
            .field("key", &self.key.borrow())
            .field("force", &self.force.get())
            .field("has_webview", &self.webview.borrow().is_some())
            .finish()
    }
}

/// App-level options consumed by the navigation layer.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Transition strategy configuration
    pub animate: AnimateOptions,
    /// Maximum retained history entries (0 = unlimited)
    pub history_limit: usize,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            animate: AnimateOptions::Default,
            history_limit: 50,
        }
    }
}

/// Registry mapping navigation keys to mounted webview instances.
pub type WebviewRegistry = Rc<RefCell<HashMap<String, Rc<dyn Webview>>>>;

/// Everything a router dispatch needs from its surroundings.
///
/// Built once by the bootstrap and passed explicitly into
/// [`Router::handle`](crate::router::Router::handle); a mounted sub-router is
/// dispatched with its parent's context rather than acquiring one of its own.
#[derive(Clone)]
pub struct RouterContext {
    /// Mount node webview containers are appended under
    pub node: Rc<dyn ViewNode>,
    /// Shared navigation state
    pub server: Rc<ServerContext>,
    /// Key → webview registry
    pub webviews: WebviewRegistry,
    /// App-level options
    pub options: Rc<AppOptions>,
    /// Next-tick scheduler for deferred callbacks
    pub scheduler: Rc<Scheduler>,
}

impl RouterContext {
    /// Build a context around a mount node with default options
    pub fn new(node: Rc<dyn ViewNode>) -> Self {
        Self::with_options(node, AppOptions::default())
    }

    /// Build a context around a mount node with explicit options
    pub fn with_options(node: Rc<dyn ViewNode>, options: AppOptions) -> Self {
        Self {
            node,
            server: Rc::new(ServerContext::new()),
            webviews: Rc::new(RefCell::new(HashMap::new())),
            options: Rc::new(options),
            scheduler: Rc::new(Scheduler::new()),
        }
    }
}

impl fmt::Debug for RouterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterContext")
            .field("server", &self.server)
            .field("webviews", &self.webviews.borrow().len())
            .finish()
    }
}
