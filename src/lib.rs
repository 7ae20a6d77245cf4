//! # webview-navigator
//!
//! A single-page "webview" navigation layer for mobile-oriented UIs, built
//! around an Express-style middleware pipeline:
//!
//! - **Layer matching** - path templates with `:param` placeholders, prefix
//!   (`use_fn`) or exact (`at`/`define`) matching
//! - **Middleware dispatch** - handlers run in registration order, threading
//!   a pending error and a `Next` continuation
//! - **Directional transitions** - forward/backward animation drivers
//!   orchestrated from the navigation intent
//! - **Webview lifecycle** - activate/deactivate/refresh hooks, declared
//!   through an explicit capability set
//! - **Nested routing** - sub-routers mounted at a path prefix, dispatched
//!   with the parent's context
//! - **History & bootstrap** - a keyed history stack driving the shared
//!   navigation context
//!
//! The host GUI framework stays outside: it supplies a DOM-like mount node
//! ([`ViewNode`]) and view types ([`Webview`]); the crate orchestrates when
//! views are created, shown, and transitioned — never how they render.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::rc::Rc;
//! use webview_navigator::{AppOptions, Bootstrap};
//!
//! let app = Bootstrap::new(mount_node, AppOptions::default(), |router| {
//!     router.use_fn("/", |next| {
//!         // runs on every navigation
//!         next.proceed();
//!         Ok(())
//!     });
//!     router.define("/", Rc::new(|node| HomeView::mount(node)));
//!     router.define("/users/:id", Rc::new(|node| UserView::mount(node)));
//! });
//!
//! app.start("/");
//! app.forward("/users/42");
//! app.back(None);
//! ```
//!
//! # Dispatch model
//!
//! Dispatch is cooperative and single-threaded. A handler advances the
//! pipeline by resuming its [`Next`] — immediately, or later from an
//! animation or publish callback. Errors never unwind through `handle`: a
//! failing handler's error becomes the pending value consumed by the next
//! error-handling layer, and anything left over reaches the terminal
//! callback one scheduler tick after the stack is exhausted.
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually
//!   exclusive with `log`)

#![doc(html_root_url = "https://docs.rs/webview-navigator/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Core routing modules
pub mod layer;
pub mod params;
pub mod router;

// Webview orchestration
pub mod animate;
pub mod webview;

// Shared context and scheduling
pub mod context;
pub mod scheduler;

// Error handling
pub mod error;

// App shell
pub mod boot;
pub mod history;

// Re-export main types for convenient access
pub use animate::{
    animate_backward, animate_forward, AnimateOptions, AnimationFn, Direction, BACKWARD_CLASS,
    FORWARD_CLASS,
};
pub use boot::Bootstrap;
pub use context::{
    AppOptions, NavigationDriver, NavigationIntent, RouterContext, ServerContext, WebviewRegistry,
};
pub use error::NavigationError;
pub use history::{History, HistoryEntry};
pub use layer::{ErrorFn, Layer, MatchOptions, OrdinaryFn, PathPattern};
pub use params::RouteParams;
pub use router::{publish, DoneFn, Next, Router};
pub use scheduler::Scheduler;
pub use webview::{
    CapabilitySet, Continuation, ViewNode, Webview, WebviewFactory, ACTIVE_CLASS, WEBVIEW_CLASS,
};
