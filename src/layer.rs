//! Layers: one registered route-matching rule plus its handler
//!
//! A layer wraps a path pattern compiled once at registration, the flag set
//! it was registered with, and the handler to invoke on a match. Handler kind
//! is an explicit tagged variant decided by the registering call — an
//! ordinary middleware never sees a pending error and an error-handling
//! middleware only runs when one is pending.

use std::fmt;
use std::rc::Rc;

use crate::error::NavigationError;
use crate::params::RouteParams;
use crate::router::{Next, Router};
use crate::webview::WebviewFactory;

/// Ordinary middleware: runs when no error is pending.
pub type OrdinaryFn = Box<dyn Fn(Next) -> Result<(), NavigationError>>;

/// Error-handling middleware: runs only when an error is pending and
/// receives it.
pub type ErrorFn = Box<dyn Fn(NavigationError, Next) -> Result<(), NavigationError>>;

/// What a matched layer does.
pub(crate) enum Handler {
    /// Plain middleware
    Ordinary(OrdinaryFn),
    /// Middleware consuming a pending error
    ErrorHandling(ErrorFn),
    /// Terminal layer publishing a webview (built by `define`)
    Publish(WebviewFactory),
    /// Mounted sub-router, dispatched with the parent's context
    SubRouter(Rc<Router>),
}

impl Handler {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Ordinary(_) => "ordinary",
            Self::ErrorHandling(_) => "error-handling",
            Self::Publish(_) => "publish",
            Self::SubRouter(_) => "sub-router",
        }
    }
}

/// Flags controlling how a layer's pattern matches a candidate route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Case-sensitive literal segment comparison
    pub sensitive: bool,
    /// Trailing slash on the candidate is significant
    pub strict: bool,
    /// Require a full-string match instead of a prefix match
    pub end: bool,
}

impl MatchOptions {
    /// Preset used by `use_fn`: prefix match, forgiving slashes.
    pub const MIDDLEWARE: Self = Self {
        sensitive: false,
        strict: false,
        end: false,
    };

    /// Preset used by `at`/`define`: exact match.
    pub const TERMINAL: Self = Self {
        sensitive: false,
        strict: true,
        end: true,
    };
}

enum PatternSegment {
    Literal(String),
    Param(String),
}

/// A path template compiled from literal segments and `:param` placeholders.
pub struct PathPattern {
    segments: Vec<PatternSegment>,
    options: MatchOptions,
}

impl PathPattern {
    /// Compile a pattern.
    ///
    /// Expects the path to be registration-normalized: no trailing slash
    /// except on the root `/`.
    pub fn compile(path: &str, options: MatchOptions) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.strip_prefix(':').map_or_else(
                    || PatternSegment::Literal(s.to_string()),
                    |name| PatternSegment::Param(name.to_string()),
                )
            })
            .collect();

        Self { segments, options }
    }

    /// Match a candidate route.
    ///
    /// `Some(params)` on success — possibly empty when the pattern has no
    /// placeholders, which is distinct from the `None` returned on no match.
    pub fn matches(&self, candidate: &str) -> Option<RouteParams> {
        // Patterns never carry a trailing slash; under strict matching one on
        // the candidate therefore fails outright.
        if self.options.strict && candidate.len() > 1 && candidate.ends_with('/') {
            return None;
        }

        let parts: Vec<&str> = candidate.split('/').filter(|s| !s.is_empty()).collect();

        if self.options.end {
            if parts.len() != self.segments.len() {
                return None;
            }
        } else if parts.len() < self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                PatternSegment::Literal(lit) => {
                    let matched = if self.options.sensitive {
                        lit == part
                    } else {
                        lit.eq_ignore_ascii_case(part)
                    };
                    if !matched {
                        return None;
                    }
                }
                PatternSegment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }

        Some(params)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::new();
        for segment in &self.segments {
            rendered.push('/');
            match segment {
                PatternSegment::Literal(lit) => rendered.push_str(lit),
                PatternSegment::Param(name) => {
                    rendered.push(':');
                    rendered.push_str(name);
                }
            }
        }
        if rendered.is_empty() {
            rendered.push('/');
        }
        f.debug_struct("PathPattern")
            .field("pattern", &rendered)
            .field("options", &self.options)
            .finish()
    }
}

/// A single entry in a router's stack.
pub struct Layer {
    path: String,
    pattern: PathPattern,
    pub(crate) handler: Handler,
}

impl Layer {
    pub(crate) fn new(path: String, options: MatchOptions, handler: Handler) -> Self {
        let pattern = PathPattern::compile(&path, options);
        Self {
            path,
            pattern,
            handler,
        }
    }

    /// The registration-normalized path this layer was registered under
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Answer "does this path match the current route, and what are the
    /// captured parameters?"
    pub fn match_route(&self, route: &str) -> Option<RouteParams> {
        self.pattern.matches(route)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("path", &self.path)
            .field("handler", &self.handler.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn middleware_pattern(path: &str) -> PathPattern {
        PathPattern::compile(path, MatchOptions::MIDDLEWARE)
    }

    fn terminal_pattern(path: &str) -> PathPattern {
        PathPattern::compile(path, MatchOptions::TERMINAL)
    }

    #[test]
    fn test_prefix_match() {
        let pattern = middleware_pattern("/api");

        assert!(pattern.matches("/api").is_some());
        assert!(pattern.matches("/api/sub").is_some());
        assert!(pattern.matches("/api/sub/deep").is_some());
        assert!(pattern.matches("/other").is_none());
    }

    #[test]
    fn test_prefix_match_respects_segment_boundaries() {
        let pattern = middleware_pattern("/api");
        assert!(pattern.matches("/apifoo").is_none());
    }

    #[test]
    fn test_root_middleware_matches_everything() {
        let pattern = middleware_pattern("/");

        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/anything").is_some());
        assert!(pattern.matches("/a/b/c").is_some());
    }

    #[test]
    fn test_exact_match() {
        let pattern = terminal_pattern("/api");

        assert!(pattern.matches("/api").is_some());
        assert!(pattern.matches("/api/sub").is_none());
        assert!(pattern.matches("/").is_none());
    }

    #[test]
    fn test_exact_root() {
        let pattern = terminal_pattern("/");

        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/home").is_none());
    }

    #[test]
    fn test_strict_rejects_trailing_slash_on_candidate() {
        let strict = terminal_pattern("/foo");
        assert!(strict.matches("/foo").is_some());
        assert!(strict.matches("/foo/").is_none());

        let lenient = middleware_pattern("/foo");
        assert!(lenient.matches("/foo/").is_some());
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let pattern = terminal_pattern("/Users");

        assert!(pattern.matches("/users").is_some());
        assert!(pattern.matches("/USERS").is_some());
    }

    #[test]
    fn test_case_sensitive_flag() {
        let options = MatchOptions {
            sensitive: true,
            ..MatchOptions::TERMINAL
        };
        let pattern = PathPattern::compile("/Users", options);

        assert!(pattern.matches("/Users").is_some());
        assert!(pattern.matches("/users").is_none());
    }

    #[test]
    fn test_param_capture() {
        let pattern = terminal_pattern("/users/:id");

        let params = pattern.matches("/users/123").unwrap();
        assert_eq!(params.get("id"), Some(&"123".to_string()));

        assert!(pattern.matches("/users").is_none());
        assert!(pattern.matches("/users/123/posts").is_none());
    }

    #[test]
    fn test_multiple_params() {
        let pattern = terminal_pattern("/users/:user/posts/:post");

        let params = pattern.matches("/users/42/posts/7").unwrap();
        assert_eq!(params.get("user"), Some(&"42".to_string()));
        assert_eq!(params.get("post"), Some(&"7".to_string()));
    }

    #[test]
    fn test_match_without_params_is_not_no_match() {
        let pattern = terminal_pattern("/plain");

        let params = pattern.matches("/plain");
        assert!(params.is_some());
        assert!(params.unwrap().is_empty());
    }

    #[test]
    fn test_param_prefix_match_captures_from_prefix() {
        let pattern = middleware_pattern("/users/:id");

        let params = pattern.matches("/users/9/settings").unwrap();
        assert_eq!(params.get("id"), Some(&"9".to_string()));
    }
}
