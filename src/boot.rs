//! Application bootstrap
//!
//! [`Bootstrap`] wires the pieces together: it owns the root [`Router`], the
//! shared [`RouterContext`], and the [`History`] stack, and installs itself
//! as the [`NavigationDriver`] backing the global primitives on
//! [`ServerContext`](crate::context::ServerContext).
//!
//! Every navigation it issues follows the same shape: resolve the target
//! history entry, set action/key/route on the shared context, dispatch the
//! router, then drain the scheduler so deferred callbacks run. Navigation is
//! single-in-flight by construction — each call runs to scheduler idle before
//! the next one starts.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::context::{AppOptions, NavigationDriver, NavigationIntent, RouterContext};
use crate::error::NavigationError;
use crate::history::{History, HistoryEntry};
use crate::router::{normalize_path, Router};
use crate::webview::ViewNode;
use crate::{debug_log, error_log, warn_log};

/// The app-level entry point for the navigation layer.
pub struct Bootstrap {
    router: Router,
    ctx: RouterContext,
    history: RefCell<History>,
    last_error: Rc<RefCell<Option<NavigationError>>>,
}

impl Bootstrap {
    /// Build an app around a mount node.
    ///
    /// The `setup` callback registers layers on the root router before any
    /// navigation can occur.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let app = Bootstrap::new(node, AppOptions::default(), |router| {
    ///     router.define("/", home_factory);
    ///     router.define("/users/:id", user_factory);
    /// });
    /// app.start("/");
    /// ```
    pub fn new(
        node: Rc<dyn ViewNode>,
        options: AppOptions,
        setup: impl FnOnce(&mut Router),
    ) -> Rc<Self> {
        let mut router = Router::new();
        setup(&mut router);

        let history_limit = options.history_limit;
        let ctx = RouterContext::with_options(node, options);

        Rc::new_cyclic(|weak: &Weak<Self>| {
            let driver: Weak<dyn NavigationDriver> = weak.clone();
            ctx.server.install_driver(driver);

            Self {
                router,
                ctx,
                history: RefCell::new(History::with_limit("/", history_limit)),
                last_error: Rc::new(RefCell::new(None)),
            }
        })
    }

    /// The root router
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The shared dispatch context
    pub fn context(&self) -> &RouterContext {
        &self.ctx
    }

    /// Path of the current history entry
    pub fn current_path(&self) -> String {
        self.history.borrow().current_path().to_string()
    }

    /// Whether a backward step is possible
    pub fn can_go_back(&self) -> bool {
        self.history.borrow().can_go_back()
    }

    /// Whether a forward step is possible
    pub fn can_go_forward(&self) -> bool {
        self.history.borrow().can_go_forward()
    }

    /// The error left unhandled by the most recent navigation, if any
    pub fn last_error(&self) -> Option<NavigationError> {
        self.last_error.borrow().clone()
    }

    /// Seed history with the entry path and run the initial navigation
    /// (create-and-activate, no animated transition).
    pub fn start(&self, path: &str) {
        let path = normalize_path(path);
        let entry = self.history.borrow_mut().replace(path).clone();
        self.navigate(NavigationIntent::Initial, entry);
    }

    /// Push a new entry and navigate to it with a forward transition
    pub fn forward(&self, url: &str) {
        let path = normalize_path(url);
        let entry = self.history.borrow_mut().push(path).clone();
        self.navigate(NavigationIntent::ApplicationForward, entry);
    }

    /// Step back in history with a backward transition.
    ///
    /// With a `url`, moves to the nearest older entry with that path; without
    /// one, steps back a single entry. A step that isn't possible is ignored
    /// with a warning.
    pub fn back(&self, url: Option<&str>) {
        let entry = {
            let mut history = self.history.borrow_mut();
            match url {
                Some(url) => history.back_to(&normalize_path(url)).cloned(),
                None => history.back().cloned(),
            }
        };
        match entry {
            Some(entry) => self.navigate(NavigationIntent::ApplicationBackward, entry),
            None => warn_log!("back ignored: no matching history entry"),
        }
    }

    /// Replace the current entry (fresh view slot) and navigate forward
    pub fn redirect(&self, url: &str) {
        let path = normalize_path(url);
        let entry = self.history.borrow_mut().replace(path).clone();
        self.navigate(NavigationIntent::ApplicationForward, entry);
    }

    /// Replace the current entry (fresh view slot), presenting the change as
    /// a backward transition
    pub fn reback(&self, url: &str) {
        let path = normalize_path(url);
        let entry = self.history.borrow_mut().replace(path).clone();
        self.navigate(NavigationIntent::ApplicationBackward, entry);
    }

    /// Refresh the current view in place, creating it if absent
    pub fn refresh(&self) {
        let entry = self.history.borrow().current_entry().clone();
        self.navigate(NavigationIntent::Refresh, entry);
    }

    /// Host-reported history traversal toward a newer entry
    pub fn history_forward(&self) {
        let entry = self.history.borrow_mut().forward().cloned();
        match entry {
            Some(entry) => self.navigate(NavigationIntent::HistoryForward, entry),
            None => warn_log!("history forward ignored: already at newest entry"),
        }
    }

    /// Host-reported history traversal toward an older entry
    pub fn history_backward(&self) {
        let entry = self.history.borrow_mut().back().cloned();
        match entry {
            Some(entry) => self.navigate(NavigationIntent::HistoryBackward, entry),
            None => warn_log!("history backward ignored: already at oldest entry"),
        }
    }

    /// Re-issue navigation for the entry already current.
    ///
    /// Host history integrations use this when the platform reports an event
    /// for the current entry; whether it dispatches is subject to the force
    /// flag like any other same-key navigation.
    pub fn dispatch_current(&self, intent: NavigationIntent) {
        let entry = self.history.borrow().current_entry().clone();
        self.navigate(intent, entry);
    }

    fn navigate(&self, intent: NavigationIntent, entry: HistoryEntry) {
        let server = &self.ctx.server;

        // The force flag (set by every transition) makes a same-key
        // navigation still re-run activation; without it a same-key
        // non-refresh navigation is a no-op.
        let forced = server.take_force();
        let same_key = server.key() == entry.key;
        if same_key && !forced && intent != NavigationIntent::Refresh {
            debug_log!("navigation to {} skipped: same key, not forced", entry.path);
            return;
        }

        server.set_action(intent);
        server.set_key(entry.key);
        self.router.set_route(entry.path);
        self.last_error.borrow_mut().take();

        let last_error = Rc::clone(&self.last_error);
        self.router.handle(&self.ctx, move |err| {
            if let Some(err) = err {
                error_log!("navigation finished with unhandled error: {}", err);
                *last_error.borrow_mut() = Some(err);
            }
        });
        self.ctx.scheduler.run_until_idle();
    }
}

impl NavigationDriver for Bootstrap {
    fn redirect(&self, url: &str) {
        Bootstrap::redirect(self, url);
    }

    fn reback(&self, url: &str) {
        Bootstrap::reback(self, url);
    }

    fn forward(&self, url: &str) {
        Bootstrap::forward(self, url);
    }

    fn back(&self, url: Option<&str>) {
        Bootstrap::back(self, url);
    }

    fn refresh(&self) {
        Bootstrap::refresh(self);
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("router", &self.router)
            .field("history", &self.history.borrow().len())
            .finish()
    }
}
