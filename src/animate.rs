//! Transition animation strategies
//!
//! An animation driver is a plain function `(old, new, done)` that performs a
//! visual transition between two webviews and invokes `done` exactly once on
//! completion. The crate ships two built-in drivers, one per direction, that
//! work purely through class-list mutation; the host's stylesheet supplies
//! the actual motion. App-level configuration can replace them wholesale or
//! select a named variant of the built-ins.

use std::rc::Rc;

use crate::webview::{Continuation, Webview, ACTIVE_CLASS};

/// Class placed on the incoming view during a forward transition.
pub const FORWARD_CLASS: &str = "wn-forward";

/// Class placed on the incoming view during a backward transition.
pub const BACKWARD_CLASS: &str = "wn-backward";

/// Transition direction resolved from the navigation intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Moving to a newer entry
    Forward,
    /// Moving to an older entry
    Backward,
}

/// A transition driver.
///
/// Invoked as `(old_view, new_view, continuation)`; must eventually call the
/// continuation exactly once. `old_view` is `None` on the first transition.
pub type AnimationFn = Rc<dyn Fn(Option<Rc<dyn Webview>>, Rc<dyn Webview>, Continuation)>;

/// App-level animation configuration.
///
/// Three shapes are supported: the built-in drivers, the built-ins with a
/// named variant (an extra `wn-anim-<name>` class for the stylesheet to hook
/// into), or a custom forward/backward driver pair.
#[derive(Clone, Default)]
pub enum AnimateOptions {
    /// Built-in class-toggling drivers
    #[default]
    Default,
    /// Built-in drivers with a named variant class
    Named(String),
    /// Custom drivers, one per direction
    Pair {
        /// Driver for forward transitions
        forward: AnimationFn,
        /// Driver for backward transitions
        back: AnimationFn,
    },
}

impl std::fmt::Debug for AnimateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "AnimateOptions::Default"),
            Self::Named(name) => f.debug_tuple("AnimateOptions::Named").field(name).finish(),
            Self::Pair { .. } => write!(f, "AnimateOptions::Pair(..)"),
        }
    }
}

/// Built-in forward driver: promote `new` to the active view, marking it with
/// the forward class so the stylesheet can slide it in.
pub fn animate_forward(
    old: Option<&Rc<dyn Webview>>,
    new: &Rc<dyn Webview>,
    done: Continuation,
    variant: Option<&str>,
) {
    apply_classes(old, new, FORWARD_CLASS, BACKWARD_CLASS, variant);
    done();
}

/// Built-in backward driver: mirror image of [`animate_forward`].
pub fn animate_backward(
    old: Option<&Rc<dyn Webview>>,
    new: &Rc<dyn Webview>,
    done: Continuation,
    variant: Option<&str>,
) {
    apply_classes(old, new, BACKWARD_CLASS, FORWARD_CLASS, variant);
    done();
}

fn apply_classes(
    old: Option<&Rc<dyn Webview>>,
    new: &Rc<dyn Webview>,
    enter: &str,
    leave: &str,
    variant: Option<&str>,
) {
    if let Some(old) = old {
        let node = old.node();
        node.remove_class(ACTIVE_CLASS);
        node.remove_class(enter);
        node.remove_class(leave);
    }

    let node = new.node();
    node.remove_class(leave);
    node.add_class(enter);
    if let Some(variant) = variant {
        node.add_class(&format!("wn-anim-{}", variant));
    }
    node.add_class(ACTIVE_CLASS);
}

/// Resolve the driver to run for a transition in the given direction.
///
/// Falls back to the built-in driver when the configuration doesn't supply a
/// usable strategy for the direction.
pub fn choose(options: &AnimateOptions, direction: Direction) -> AnimationFn {
    match options {
        AnimateOptions::Default => builtin(direction, None),
        AnimateOptions::Named(name) => builtin(direction, Some(name.clone())),
        AnimateOptions::Pair { forward, back } => match direction {
            Direction::Forward => Rc::clone(forward),
            Direction::Backward => Rc::clone(back),
        },
    }
}

fn builtin(direction: Direction, variant: Option<String>) -> AnimationFn {
    Rc::new(move |old, new, done| match direction {
        Direction::Forward => animate_forward(old.as_ref(), &new, done, variant.as_deref()),
        Direction::Backward => animate_backward(old.as_ref(), &new, done, variant.as_deref()),
    })
}
