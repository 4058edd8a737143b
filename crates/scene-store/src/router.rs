//! # Routing
//!
//! Keeps scene state and the address bar telling the same story, in both
//! directions:
//!
//! - URL to state: a [`RouteTable`] maps location patterns to actions.
//!   [`bind_routes`] watches a [`Navigator`] and dispatches the matching
//!   action once per observed navigation, including the location current
//!   at bind time.
//! - State to URL: listeners call [`Navigator::update_query`] (or `push`/
//!   `replace`) to reflect view state such as the active tab.
//!
//! Echo loops between the two directions die out by value: the navigator
//! only emits a change event when the location actually differs, so a
//! listener writing the URL that is already current wakes nobody.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::handle::StoreHandle;
use crate::logic::SceneLogic;

/// Path parameters captured by a [`RoutePattern`], keyed by placeholder
/// name.
pub type PathParams = BTreeMap<String, String>;

/// Query (or hash) parameters, keyed by name.
pub type QueryParams = BTreeMap<String, String>;

/// A parsed location: path, query parameters and hash parameters.
///
/// ```
/// use scene_store::Location;
///
/// let loc = Location::parse("/pipelines/7?tab=metrics#panel=logs");
/// assert_eq!(loc.path, "/pipelines/7");
/// assert_eq!(loc.query.get("tab").map(String::as_str), Some("metrics"));
/// assert_eq!(loc.hash.get("panel").map(String::as_str), Some("logs"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: QueryParams,
    pub hash: QueryParams,
}

impl Location {
    /// Parses `path?query#hash`. Query and hash use `key=value` pairs
    /// joined by `&`; a pair without `=` becomes a key with an empty
    /// value. No percent-decoding is applied.
    pub fn parse(url: &str) -> Self {
        let (rest, hash) = match url.split_once('#') {
            Some((rest, hash)) => (rest, hash),
            None => (url, ""),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, query),
            None => (rest, ""),
        };
        Self {
            path: path.to_string(),
            query: parse_pairs(query),
            hash: parse_pairs(hash),
        }
    }

    /// Builder-style query parameter, handy in tests and demos.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Reassembles the canonical URL form. Parameters come out in key
    /// order.
    pub fn to_url(&self) -> String {
        let mut url = self.path.clone();
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&join_pairs(&self.query));
        }
        if !self.hash.is_empty() {
            url.push('#');
            url.push_str(&join_pairs(&self.hash));
        }
        url
    }
}

fn parse_pairs(raw: &str) -> QueryParams {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn join_pairs(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

enum Segment {
    Literal(String),
    Param(String),
}

/// A path pattern with `:name` placeholders, matched segment-wise.
///
/// ```
/// use scene_store::RoutePattern;
///
/// let pattern = RoutePattern::parse("/pipelines/:id");
/// let params = pattern.matches("/pipelines/42").unwrap();
/// assert_eq!(params.get("id").map(String::as_str), Some("42"));
/// assert!(pattern.matches("/pipelines").is_none());
/// assert!(pattern.matches("/surveys/42").is_none());
/// ```
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Matches `path` segment by segment, capturing placeholder values.
    /// The segment counts must agree exactly.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }
        Some(params)
    }
}

type RouteHandler<A> = Box<dyn Fn(&PathParams, &QueryParams) -> Option<A> + Send + Sync>;

/// Ordered pattern-to-action mapping for one scene. First match wins.
pub struct RouteTable<A> {
    routes: Vec<(RoutePattern, RouteHandler<A>)>,
}

impl<A> RouteTable<A> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route. The handler runs synchronously per navigation and
    /// returns the action to dispatch, or `None` to ignore the hit.
    pub fn on<F>(mut self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&PathParams, &QueryParams) -> Option<A> + Send + Sync + 'static,
    {
        self.routes.push((RoutePattern::parse(pattern), Box::new(handler)));
        self
    }

    /// Resolves a location against the table.
    pub fn resolve(&self, location: &Location) -> Option<A> {
        for (pattern, handler) in &self.routes {
            if let Some(params) = pattern.matches(&location.path) {
                return handler(&params, &location.query);
            }
        }
        None
    }
}

impl<A> Default for RouteTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// The address bar, behind a trait so scenes and tests never touch a
/// concrete history implementation.
pub trait Navigator: Send + Sync {
    /// The current location.
    fn current(&self) -> Location;

    /// Navigates, recording a history entry.
    fn push(&self, location: Location);

    /// Navigates in place, replacing the current entry.
    fn replace(&self, location: Location);

    /// A subscription to location changes. Only locations that differ by
    /// value from the previous one are emitted.
    fn changes(&self) -> watch::Receiver<Location>;

    /// Sets or removes one query parameter on the current location and
    /// replaces in place, leaving path, sibling parameters and hash
    /// untouched. Writing the value already present is a no-op and emits
    /// no change event.
    fn update_query(&self, key: &str, value: Option<&str>) {
        let mut location = self.current();
        match value {
            Some(value) => {
                location.query.insert(key.to_string(), value.to_string());
            }
            None => {
                location.query.remove(key);
            }
        }
        self.replace(location);
    }
}

/// In-process [`Navigator`] backed by a watch channel. The production
/// binding for a real address bar lives with the embedding application;
/// this one serves demos and tests, and keeps a log of pushed locations
/// for assertions.
pub struct MemoryNavigator {
    feed: watch::Sender<Location>,
    pushed: Mutex<Vec<Location>>,
}

impl MemoryNavigator {
    pub fn new(initial: Location) -> Self {
        let (feed, _) = watch::channel(initial);
        Self { feed, pushed: Mutex::new(Vec::new()) }
    }

    /// Shorthand for starting at a parsed URL.
    pub fn at(url: &str) -> Self {
        Self::new(Location::parse(url))
    }

    /// Every location passed to [`Navigator::push`], in order.
    pub fn pushed(&self) -> Vec<Location> {
        self.pushed.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, location: Location) {
        self.feed.send_if_modified(|current| {
            if *current == location {
                false
            } else {
                debug!(url = %location.to_url(), "Navigated");
                *current = location;
                true
            }
        });
    }
}

impl Navigator for MemoryNavigator {
    fn current(&self) -> Location {
        self.feed.borrow().clone()
    }

    fn push(&self, location: Location) {
        self.pushed.lock().unwrap_or_else(|e| e.into_inner()).push(location.clone());
        self.set(location);
    }

    fn replace(&self, location: Location) {
        self.set(location);
    }

    fn changes(&self) -> watch::Receiver<Location> {
        self.feed.subscribe()
    }
}

/// Connects a navigator to a store: resolves the location current at bind
/// time, then every subsequent change, dispatching the table's action.
/// Each observed navigation resolves exactly once. The task ends when the
/// navigator or the store goes away.
pub fn bind_routes<L>(
    handle: StoreHandle<L>,
    navigator: Arc<dyn Navigator>,
    table: RouteTable<L::Action>,
) -> JoinHandle<()>
where
    L: SceneLogic,
{
    let mut changes = navigator.changes();
    tokio::spawn(async move {
        loop {
            let location = changes.borrow_and_update().clone();
            if let Some(action) = table.resolve(&location) {
                if handle.dispatch(action).await.is_err() {
                    return;
                }
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    })
}
