//! Webview and mount-node contracts
//!
//! The host GUI shell provides both halves of this module's surface: a
//! DOM-like mount node implementing [`ViewNode`], and view types implementing
//! [`Webview`]. The router only orchestrates them — it appends a container
//! per view, toggles marker classes, and drives the lifecycle hooks during
//! transitions.
//!
//! Lifecycle hooks are opt-in through an explicit [`CapabilitySet`]: the
//! router calls `activate`/`deactivate`/`refresh` only on views that declare
//! the matching capability, instead of probing for methods at call time.

use std::rc::Rc;

use crate::context::ServerContext;

/// Class placed on every container the router creates.
pub const WEBVIEW_CLASS: &str = "wn-webview";

/// Class marking the currently visible webview container.
pub const ACTIVE_CLASS: &str = "active";

/// One-shot callback signalling that an asynchronous step has completed.
///
/// Animation drivers and [`Webview::publish`] receive one and must invoke it
/// exactly once.
pub type Continuation = Box<dyn FnOnce()>;

/// DOM-like node provided by the host app shell.
///
/// The router needs only child-append and class-list mutation; everything
/// else about the host's widget tree stays opaque.
pub trait ViewNode {
    /// Create a child container, append it under this node, and return it
    fn append_container(&self) -> Rc<dyn ViewNode>;

    /// Add a class to this node's class list
    fn add_class(&self, name: &str);

    /// Remove a class from this node's class list
    fn remove_class(&self, name: &str);

    /// Check whether a class is present
    fn has_class(&self, name: &str) -> bool;
}

/// Lifecycle capabilities a webview declares.
///
/// The router consults this set before invoking the corresponding hook, so a
/// view without e.g. a `refresh` capability is simply skipped rather than
/// called into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    /// `activate()` is meaningful for this view
    pub activate: bool,
    /// `deactivate()` is meaningful for this view
    pub deactivate: bool,
    /// `refresh()` is meaningful for this view
    pub refresh: bool,
}

impl CapabilitySet {
    /// No lifecycle hooks
    pub const NONE: Self = Self {
        activate: false,
        deactivate: false,
        refresh: false,
    };

    /// All lifecycle hooks
    pub const ALL: Self = Self {
        activate: true,
        deactivate: true,
        refresh: true,
    };

    /// Enable the activate hook
    pub fn with_activate(mut self) -> Self {
        self.activate = true;
        self
    }

    /// Enable the deactivate hook
    pub fn with_deactivate(mut self) -> Self {
        self.deactivate = true;
        self
    }

    /// Enable the refresh hook
    pub fn with_refresh(mut self) -> Self {
        self.refresh = true;
        self
    }
}

/// A mounted, node-backed view managed by the router.
///
/// Instances are created on demand by a [`WebviewFactory`] and registered in
/// the view registry under the current navigation key. The router never
/// destroys them; eviction is the host's concern.
pub trait Webview {
    /// The container node this view owns
    fn node(&self) -> Rc<dyn ViewNode>;

    /// Lifecycle hooks this view supports
    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::NONE
    }

    /// Called when this view becomes the visible one.
    ///
    /// Only invoked when [`CapabilitySet::activate`] is set. Re-runs on
    /// same-instance transitions (refresh-on-return semantics).
    fn activate(&self) {}

    /// Called when this view stops being the visible one.
    ///
    /// Only invoked when [`CapabilitySet::deactivate`] is set.
    fn deactivate(&self) {}

    /// Called on an in-place refresh of the current view.
    ///
    /// Only invoked when [`CapabilitySet::refresh`] is set.
    fn refresh(&self) {}

    /// Called once right after creation with the shared navigation context
    fn bind_server(&self, _server: &Rc<ServerContext>) {}

    /// Called once after the view is mounted and registered.
    ///
    /// The view may defer (load data, run an entry animation) but must
    /// eventually invoke `ready` exactly once so dispatch can continue.
    fn publish(&self, ready: Continuation);
}

/// Factory constructing a webview from its freshly appended container node.
pub type WebviewFactory = Rc<dyn Fn(Rc<dyn ViewNode>) -> Rc<dyn Webview>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_default_is_none() {
        assert_eq!(CapabilitySet::default(), CapabilitySet::NONE);
        assert!(!CapabilitySet::NONE.activate);
        assert!(!CapabilitySet::NONE.deactivate);
        assert!(!CapabilitySet::NONE.refresh);
    }

    #[test]
    fn test_capability_set_builders() {
        let caps = CapabilitySet::default().with_activate().with_refresh();
        assert!(caps.activate);
        assert!(!caps.deactivate);
        assert!(caps.refresh);
    }

    #[test]
    fn test_capability_set_all() {
        let caps = CapabilitySet::ALL;
        assert!(caps.activate && caps.deactivate && caps.refresh);
    }
}
