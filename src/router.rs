//! The navigation middleware pipeline
//!
//! A [`Router`] owns an ordered stack of [`Layer`]s and a current route
//! string. `handle` walks the stack in registration order, matches each layer
//! against the route, and invokes matched handlers, threading a pending error
//! value and a [`Next`] continuation. Dispatch is cooperative and
//! single-threaded: between invoking a handler and that handler resuming
//! `Next`, the loop does no work, so a handler is free to defer (waiting on
//! an animation or a view's publish hook).
//!
//! Dispatch never fails out of `handle` itself. A handler that returns
//! `Err(..)` substitutes its error for the pending value and dispatch
//! continues, so a downstream error-handling layer can observe it; an error
//! still pending when the stack is exhausted is delivered to the terminal
//! `done` callback, one scheduler tick later.
//!
//! Contract notes: a handler must either resume its [`Next`] or return
//! `Err(..)`, never both — doing both advances dispatch twice, the same
//! hazard as calling `next()` twice in an Express middleware. Two overlapping
//! `handle` calls race on the shared [`ServerContext`](crate::context::ServerContext)
//! and are not supported; the bootstrap keeps navigation single-in-flight.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::animate::{choose, AnimationFn, Direction};
use crate::context::{NavigationIntent, RouterContext};
use crate::error::NavigationError;
use crate::layer::{Handler, Layer, MatchOptions};
use crate::webview::{Continuation, Webview, WebviewFactory, ACTIVE_CLASS, WEBVIEW_CLASS};
use crate::{debug_log, trace_log};

/// Terminal callback invoked when dispatch exhausts the stack.
pub type DoneFn = Box<dyn FnOnce(Option<NavigationError>)>;

/// Callback receiving a freshly created webview.
type ViewReady = Box<dyn FnOnce(Rc<dyn Webview>)>;

struct DispatchState {
    stack: Vec<Rc<Layer>>,
    route: Rc<RefCell<String>>,
    index: Cell<usize>,
    ctx: RouterContext,
    done: RefCell<Option<DoneFn>>,
}

/// The continuation a handler must invoke to advance dispatch.
///
/// Single-shot: resuming consumes it. The optional error becomes the pending
/// error for the remaining layers.
pub struct Next {
    state: Rc<DispatchState>,
}

impl Next {
    /// The context this dispatch runs with
    pub fn context(&self) -> &RouterContext {
        &self.state.ctx
    }

    /// Parameters captured by the layer that received this continuation
    pub fn params(&self) -> crate::params::RouteParams {
        self.state.ctx.server.params()
    }

    /// Advance dispatch, optionally carrying an error
    pub fn resume(self, err: Option<NavigationError>) {
        advance(self.state, err);
    }

    /// Advance dispatch with no error
    pub fn proceed(self) {
        self.resume(None);
    }

    /// Advance dispatch with a pending error
    pub fn fail(self, err: NavigationError) {
        self.resume(Some(err));
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.state.index.get())
            .field("stack", &self.state.stack.len())
            .finish()
    }
}

fn advance(state: Rc<DispatchState>, mut err: Option<NavigationError>) {
    loop {
        let idx = state.index.get();
        state.index.set(idx + 1);

        let Some(layer) = state.stack.get(idx).map(Rc::clone) else {
            // Stack exhausted: deliver `done` one tick later so the caller's
            // own stack unwinds before the terminal callback runs.
            if let Some(done) = state.done.borrow_mut().take() {
                state.ctx.scheduler.defer(move || done(err));
            }
            return;
        };

        let route = state.route.borrow().clone();
        let Some(params) = layer.match_route(&route) else {
            continue;
        };

        state.ctx.server.set_params(params);
        let next = Next {
            state: Rc::clone(&state),
        };

        let pending = err.take();
        match (&layer.handler, pending) {
            (Handler::Ordinary(handler), None) => match handler(next) {
                Ok(()) => return,
                Err(e) => err = Some(e),
            },
            (Handler::ErrorHandling(handler), Some(e)) => match handler(e, next) {
                Ok(()) => return,
                Err(e) => err = Some(e),
            },
            (Handler::Publish(factory), None) => {
                let factory = Rc::clone(factory);
                publish(&state.ctx, &factory, Box::new(move || next.resume(None)));
                return;
            }
            (Handler::SubRouter(sub), None) => {
                let sub = Rc::clone(sub);
                let ctx = state.ctx.clone();
                sub.handle(&ctx, move |e| next.resume(e));
                return;
            }
            (handler, pending) => {
                // Handler class does not fit the current error state: skip,
                // error value unchanged.
                trace_log!(
                    "skipping {} layer at {} (error pending: {})",
                    handler.kind(),
                    layer.path(),
                    pending.is_some()
                );
                err = pending;
            }
        }
    }
}

/// The router: an ordered layer stack plus the current route string.
///
/// Context ([`RouterContext`]) is supplied at dispatch time, not owned: a
/// mounted sub-router is dispatched with its parent's context.
pub struct Router {
    route: Rc<RefCell<String>>,
    stack: Vec<Rc<Layer>>,
}

impl Router {
    /// Create a router with the root route
    pub fn new() -> Self {
        Self {
            route: Rc::new(RefCell::new("/".to_string())),
            stack: Vec::new(),
        }
    }

    /// The current route string
    pub fn route(&self) -> String {
        self.route.borrow().clone()
    }

    /// Set the current route (done by the bootstrap before each dispatch)
    pub fn set_route(&self, route: impl Into<String>) {
        *self.route.borrow_mut() = normalize_path(&route.into());
    }

    /// The registered layer stack, in match-priority order
    pub fn layers(&self) -> &[Rc<Layer>] {
        &self.stack
    }

    fn push_layer(&mut self, route: &str, options: MatchOptions, handler: Handler) -> &mut Self {
        let path = normalize_path(route);
        trace_log!("registering {} layer at {}", handler.kind(), path);
        self.stack.push(Rc::new(Layer::new(path, options, handler)));
        self
    }

    /// Register prefix-matching middleware.
    ///
    /// Matches the route and everything below it (`/api` matches `/api` and
    /// `/api/sub`). Use `"/"` to run on every dispatch.
    pub fn use_fn<F>(&mut self, route: &str, handler: F) -> &mut Self
    where
        F: Fn(Next) -> Result<(), NavigationError> + 'static,
    {
        self.push_layer(
            route,
            MatchOptions::MIDDLEWARE,
            Handler::Ordinary(Box::new(handler)),
        )
    }

    /// Register prefix-matching error middleware.
    ///
    /// Invoked only when an error is pending; receives it and may resolve it
    /// (resume without an error) or replace it.
    pub fn use_err<F>(&mut self, route: &str, handler: F) -> &mut Self
    where
        F: Fn(NavigationError, Next) -> Result<(), NavigationError> + 'static,
    {
        self.push_layer(
            route,
            MatchOptions::MIDDLEWARE,
            Handler::ErrorHandling(Box::new(handler)),
        )
    }

    /// Register an exact-matching terminal handler
    pub fn at<F>(&mut self, route: &str, handler: F) -> &mut Self
    where
        F: Fn(Next) -> Result<(), NavigationError> + 'static,
    {
        self.push_layer(
            route,
            MatchOptions::TERMINAL,
            Handler::Ordinary(Box::new(handler)),
        )
    }

    /// Register a terminal layer that publishes a webview when its route is
    /// the current one
    pub fn define(&mut self, route: &str, factory: WebviewFactory) -> &mut Self {
        self.push_layer(route, MatchOptions::TERMINAL, Handler::Publish(factory))
    }

    /// Mount a sub-router at a path prefix.
    ///
    /// The sub-router's route is rewritten to the mount path and it is
    /// dispatched with the parent's context.
    pub fn use_router(&mut self, route: &str, sub: Router) -> &mut Self {
        sub.set_route(route);
        self.push_layer(
            route,
            MatchOptions::MIDDLEWARE,
            Handler::SubRouter(Rc::new(sub)),
        )
    }

    /// Start dispatch at stack index 0 with no pending error.
    ///
    /// `done` receives the still-pending error, if any, once the stack is
    /// exhausted — always deferred one scheduler tick, never synchronously
    /// from within this call.
    pub fn handle(&self, ctx: &RouterContext, done: impl FnOnce(Option<NavigationError>) + 'static) {
        debug_log!(
            "dispatching {} with {} ({} layers)",
            self.route(),
            ctx.server.action(),
            self.stack.len()
        );
        let state = Rc::new(DispatchState {
            stack: self.stack.clone(),
            route: Rc::clone(&self.route),
            index: Cell::new(0),
            ctx: ctx.clone(),
            done: RefCell::new(Some(Box::new(done))),
        });
        advance(state, None);
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("route", &self.route.borrow())
            .field("stack", &self.stack)
            .finish()
    }
}

/// Strip trailing slashes, keeping the root `/` intact.
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// Webview publication
// ============================================================================

/// Resolve the current navigation intent into a view behavior.
///
/// Forward/backward intents run an animated transition, `Refresh` refreshes
/// the current view in place, and anything else creates and activates the
/// view without an animated transition.
pub fn publish(ctx: &RouterContext, factory: &WebviewFactory, next: Continuation) {
    match ctx.server.action() {
        NavigationIntent::HistoryForward | NavigationIntent::ApplicationForward => {
            let animate = choose(&ctx.options.animate, Direction::Forward);
            transition(ctx, factory, next, animate);
        }
        NavigationIntent::HistoryBackward | NavigationIntent::ApplicationBackward => {
            let animate = choose(&ctx.options.animate, Direction::Backward);
            transition(ctx, factory, next, animate);
        }
        NavigationIntent::Refresh => refresh_view(ctx, factory, next),
        NavigationIntent::Initial => {
            create_view(
                ctx,
                factory,
                Box::new(move |view| {
                    view.node().add_class(ACTIVE_CLASS);
                    next();
                }),
            );
        }
    }
}

fn transition(ctx: &RouterContext, factory: &WebviewFactory, next: Continuation, animate: AnimationFn) {
    let old = ctx.server.current_webview();
    let target = ctx.webviews.borrow().get(&ctx.server.key()).cloned();

    // A transition to this key must re-run activation even when old and new
    // resolve to the same instance (refresh-on-return semantics).
    ctx.server.set_force(true);

    let wrap: Continuation = {
        let old = old.clone();
        let target = target.clone();
        Box::new(move || {
            run_lifecycle(old.as_ref(), target.as_ref());
            next();
        })
    };

    if let Some(target_view) = target {
        ctx.server.set_current_webview(Some(Rc::clone(&target_view)));
        animate(old, target_view, wrap);
    } else {
        create_view(
            ctx,
            factory,
            Box::new(move |created| animate(old, created, wrap)),
        );
    }
}

/// Post-animation lifecycle: same instance re-activates; otherwise the old
/// view deactivates and the target activates, each gated on its capability.
/// Views are the ones resolved before any creation took place.
fn run_lifecycle(old: Option<&Rc<dyn Webview>>, target: Option<&Rc<dyn Webview>>) {
    match (old, target) {
        (Some(old_view), Some(target_view)) if Rc::ptr_eq(old_view, target_view) => {
            if target_view.capabilities().activate {
                target_view.activate();
            }
        }
        _ => {
            if let Some(old_view) = old {
                if old_view.capabilities().deactivate {
                    old_view.deactivate();
                }
            }
            if let Some(target_view) = target {
                if target_view.capabilities().activate {
                    target_view.activate();
                }
            }
        }
    }
}

fn refresh_view(ctx: &RouterContext, factory: &WebviewFactory, next: Continuation) {
    match ctx.server.current_webview() {
        None => create_view(
            ctx,
            factory,
            Box::new(move |view| {
                view.node().add_class(ACTIVE_CLASS);
                next();
            }),
        ),
        Some(view) => {
            if view.capabilities().refresh {
                view.refresh();
            }
            next();
        }
    }
}

/// Allocate a container, mount the view, and register it under the current
/// key. Registration happens before the view's publish hook runs, so the
/// registry is consistent by the time `ready` fires.
fn create_view(ctx: &RouterContext, factory: &WebviewFactory, ready: ViewReady) {
    let node = ctx.node.append_container();
    node.add_class(WEBVIEW_CLASS);

    let view = factory(Rc::clone(&node));
    let key = ctx.server.key();
    debug_log!("created webview for key {}", key);

    ctx.webviews.borrow_mut().insert(key, Rc::clone(&view));
    view.bind_server(&ctx.server);
    ctx.server.set_current_webview(Some(Rc::clone(&view)));

    let published = Rc::clone(&view);
    view.publish(Box::new(move || ready(published)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webview::ViewNode;
    use std::cell::RefCell;

    #[derive(Default)]
    struct NullNode;

    impl ViewNode for NullNode {
        fn append_container(&self) -> Rc<dyn ViewNode> {
            Rc::new(NullNode)
        }
        fn add_class(&self, _name: &str) {}
        fn remove_class(&self, _name: &str) {}
        fn has_class(&self, _name: &str) -> bool {
            false
        }
    }

    fn test_ctx() -> RouterContext {
        RouterContext::new(Rc::new(NullNode))
    }

    #[test]
    fn test_dispatch_runs_layers_in_registration_order() {
        let ctx = test_ctx();
        let mut router = Router::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["L1", "L2", "L3"] {
            let log = log.clone();
            router.use_fn("/", move |next| {
                log.borrow_mut().push(name);
                next.proceed();
                Ok(())
            });
        }

        let done_log = log.clone();
        router.handle(&ctx, move |err| {
            assert!(err.is_none());
            done_log.borrow_mut().push("done");
        });
        ctx.scheduler.run_until_idle();

        assert_eq!(*log.borrow(), vec!["L1", "L2", "L3", "done"]);
    }

    #[test]
    fn test_empty_stack_invokes_done_asynchronously() {
        let ctx = test_ctx();
        let router = Router::new();
        let done = Rc::new(Cell::new(false));

        let flag = done.clone();
        router.handle(&ctx, move |err| {
            assert!(err.is_none());
            flag.set(true);
        });

        // Not within the same synchronous call frame.
        assert!(!done.get());
        ctx.scheduler.run_until_idle();
        assert!(done.get());
    }

    #[test]
    fn test_non_matching_layers_are_skipped() {
        let ctx = test_ctx();
        let mut router = Router::new();
        router.set_route("/home");
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        router.at("/other", move |next| {
            l1.borrow_mut().push("other");
            next.proceed();
            Ok(())
        });
        let l2 = log.clone();
        router.at("/home", move |next| {
            l2.borrow_mut().push("home");
            next.proceed();
            Ok(())
        });

        router.handle(&ctx, |_| {});
        ctx.scheduler.run_until_idle();

        assert_eq!(*log.borrow(), vec!["home"]);
    }

    #[test]
    fn test_error_skips_ordinary_and_reaches_error_handler() {
        let ctx = test_ctx();
        let mut router = Router::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        router.use_fn("/", move |_next| {
            l1.borrow_mut().push("L1");
            Err(NavigationError::handler("L1 exploded"))
        });
        let l2 = log.clone();
        router.use_fn("/", move |next| {
            l2.borrow_mut().push("L2");
            next.proceed();
            Ok(())
        });
        let l3 = log.clone();
        router.use_err("/", move |err, next| {
            l3.borrow_mut().push("L3");
            assert_eq!(err.message(), "L1 exploded");
            next.proceed();
            Ok(())
        });

        router.handle(&ctx, |err| assert!(err.is_none()));
        ctx.scheduler.run_until_idle();

        assert_eq!(*log.borrow(), vec!["L1", "L3"]);
    }

    #[test]
    fn test_error_handler_skipped_without_pending_error() {
        let ctx = test_ctx();
        let mut router = Router::new();
        let fired = Rc::new(Cell::new(false));

        let flag = fired.clone();
        router.use_err("/", move |_err, next| {
            flag.set(true);
            next.proceed();
            Ok(())
        });

        router.handle(&ctx, |err| assert!(err.is_none()));
        ctx.scheduler.run_until_idle();

        assert!(!fired.get());
    }

    #[test]
    fn test_unhandled_error_reaches_done() {
        let ctx = test_ctx();
        let mut router = Router::new();

        router.use_fn("/", |_next| Err(NavigationError::custom("unhandled")));

        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        router.handle(&ctx, move |err| {
            *sink.borrow_mut() = err;
        });
        ctx.scheduler.run_until_idle();

        assert_eq!(*seen.borrow(), Some(NavigationError::custom("unhandled")));
    }

    #[test]
    fn test_error_handler_can_resolve_the_error() {
        let ctx = test_ctx();
        let mut router = Router::new();

        router.use_fn("/", |_next| Err(NavigationError::custom("oops")));
        router.use_err("/", |_err, next| {
            next.proceed();
            Ok(())
        });

        let log = Rc::new(RefCell::new(Vec::new()));
        let after = log.clone();
        router.use_fn("/", move |next| {
            after.borrow_mut().push("after");
            next.proceed();
            Ok(())
        });

        router.handle(&ctx, |err| assert!(err.is_none()));
        ctx.scheduler.run_until_idle();

        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn test_trailing_slash_registration_is_normalized() {
        let mut router = Router::new();
        router.at("/foo/", |next| {
            next.proceed();
            Ok(())
        });

        assert_eq!(router.layers()[0].path(), "/foo");
        assert!(router.layers()[0].match_route("/foo").is_some());
    }

    #[test]
    fn test_params_are_set_before_handler_runs() {
        let ctx = test_ctx();
        let mut router = Router::new();
        router.set_route("/users/7");

        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        router.at("/users/:id", move |next| {
            *sink.borrow_mut() = next.params().get_as::<u32>("id");
            next.proceed();
            Ok(())
        });

        router.handle(&ctx, |_| {});
        ctx.scheduler.run_until_idle();

        assert_eq!(*seen.borrow(), Some(7));
    }

    #[test]
    fn test_sub_router_dispatches_with_parent_context() {
        let ctx = test_ctx();
        let log = Rc::new(RefCell::new(Vec::new()));

        let mut sub = Router::new();
        let inner = log.clone();
        sub.use_fn("/", move |next| {
            inner.borrow_mut().push("sub");
            next.proceed();
            Ok(())
        });

        let mut router = Router::new();
        router.set_route("/admin");
        let before = log.clone();
        router.use_fn("/", move |next| {
            before.borrow_mut().push("before");
            next.proceed();
            Ok(())
        });
        router.use_router("/admin", sub);
        let after = log.clone();
        router.use_fn("/", move |next| {
            after.borrow_mut().push("after");
            next.proceed();
            Ok(())
        });

        let done_log = log.clone();
        router.handle(&ctx, move |err| {
            assert!(err.is_none());
            done_log.borrow_mut().push("done");
        });
        ctx.scheduler.run_until_idle();

        assert_eq!(*log.borrow(), vec!["before", "sub", "after", "done"]);
    }

    #[test]
    fn test_sub_router_route_is_rewritten_to_mount_path() {
        let sub = Router::new();
        assert_eq!(sub.route(), "/");

        let mut router = Router::new();
        router.use_router("/admin/", sub);

        match &router.layers()[0].handler {
            Handler::SubRouter(mounted) => assert_eq!(mounted.route(), "/admin"),
            _ => panic!("expected sub-router layer"),
        }
    }

    #[test]
    fn test_error_propagates_through_sub_router() {
        let ctx = test_ctx();

        let mut sub = Router::new();
        sub.use_fn("/", |_next| Err(NavigationError::custom("from sub")));

        let mut router = Router::new();
        router.use_router("/", sub);
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        router.use_err("/", move |err, next| {
            l.borrow_mut().push(err.message().to_string());
            next.proceed();
            Ok(())
        });

        router.handle(&ctx, |err| assert!(err.is_none()));
        ctx.scheduler.run_until_idle();

        assert_eq!(*log.borrow(), vec!["from sub"]);
    }

    #[test]
    fn test_deferred_resume_continues_dispatch() {
        let ctx = test_ctx();
        let mut router = Router::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let scheduler = Rc::clone(&ctx.scheduler);
        let l1 = log.clone();
        router.use_fn("/", move |next| {
            l1.borrow_mut().push("first");
            // Withhold the continuation until the next tick.
            scheduler.defer(move || next.proceed());
            Ok(())
        });
        let l2 = log.clone();
        router.use_fn("/", move |next| {
            l2.borrow_mut().push("second");
            next.proceed();
            Ok(())
        });

        router.handle(&ctx, |_| {});
        assert_eq!(*log.borrow(), vec!["first"]);

        ctx.scheduler.run_until_idle();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }
}
