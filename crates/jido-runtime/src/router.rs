//! Signal Router — per-agent `(type_pattern, handler)` bindings with
//! exact/prefix-glob matching and specificity-then-insertion-order priority
//! (spec §4.4).

use globset::{Glob, GlobMatcher};

/// One registered binding: the compiled pattern plus the handler reference
/// it resolves to (an action tag a strategy understands).
struct Route {
    pattern: String,
    matcher: GlobMatcher,
    handler: String,
    /// Patterns with no glob metacharacters are most specific; among globs,
    /// fewer wildcard characters is more specific.
    specificity: usize,
    insertion_order: usize,
}

/// Compiled route table for one agent. Built once at agent-server init from
/// the module's `signal_routes()`.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding. `pattern` is an exact type string or a glob such
    /// as `"jido.agent.*"`. Later-bound routes of equal specificity lose
    /// ties to earlier ones (insertion order).
    pub fn bind(&mut self, pattern: impl Into<String>, handler: impl Into<String>) {
        let pattern = pattern.into();
        let glob = Glob::new(&pattern).unwrap_or_else(|_| {
            // An unparsable glob degrades to a literal-only matcher that
            // never matches anything but itself.
            Glob::new(&glob::escape(&pattern)).expect("escaped literal is always a valid glob")
        });
        let specificity = specificity_of(&pattern);
        let insertion_order = self.routes.len();
        self.routes.push(Route {
            pattern,
            matcher: glob.compile_matcher(),
            handler: handler.into(),
            specificity,
            insertion_order,
        });
    }

    /// Match a signal type against every bound pattern, returning handler
    /// references ordered most-specific-first, ties broken by insertion
    /// order (spec §4.4).
    pub fn route(&self, signal_type: &str) -> Vec<&str> {
        let mut hits: Vec<&Route> = self
            .routes
            .iter()
            .filter(|r| r.matcher.is_match(signal_type))
            .collect();
        hits.sort_by(|a, b| {
            b.specificity
                .cmp(&a.specificity)
                .then(a.insertion_order.cmp(&b.insertion_order))
        });
        hits.into_iter().map(|r| r.handler.as_str()).collect()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.pattern.as_str())
    }
}

/// Exact literals are maximally specific; every glob metacharacter lowers
/// specificity by one.
fn specificity_of(pattern: &str) -> usize {
    let wildcards = pattern.chars().filter(|c| matches!(c, '*' | '?' | '[')).count();
    pattern.len().saturating_sub(wildcards * 2)
}

mod glob {
    /// Escape glob metacharacters so a literal string can still compile as
    /// a (never-matching-anything-else) `Glob`.
    pub fn escape(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            if matches!(c, '*' | '?' | '[' | ']' | '{' | '}') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_a_broader_glob() {
        let mut router = Router::new();
        router.bind("jido.agent.*", "broad");
        router.bind("jido.agent.child.exit", "exact");
        let hits = router.route("jido.agent.child.exit");
        assert_eq!(hits, vec!["exact", "broad"]);
    }

    #[test]
    fn ties_break_on_insertion_order() {
        let mut router = Router::new();
        router.bind("ping", "first");
        router.bind("ping", "second");
        assert_eq!(router.route("ping"), vec!["first", "second"]);
    }

    #[test]
    fn no_match_yields_empty() {
        let mut router = Router::new();
        router.bind("ping", "handler");
        assert!(router.route("pong").is_empty());
    }
}
