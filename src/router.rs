//! Route table and navigation guard
//!
//! Routes correspond to the views of the assistant:
//! - Home (`/`): agent chat, requires a session
//! - Login (`/login`), Signup (`/signup`): guests only
//! - DbQuery (`/db-query`), DocQuery (`/doc-query`): require a session
//!
//! Every navigation goes through [`guard`]. Paths that match no route fall
//! through to a catch-all that redirects to Login.

use colored::Colorize;
use std::fmt;

/// A navigable view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Agent chat
    Home,
    /// Credentials form
    Login,
    /// Account creation form
    Signup,
    /// Natural-language database queries
    DbQuery,
    /// Questions answered from uploaded documents
    DocQuery,
}

/// Per-route navigation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    /// Unauthenticated visitors are sent to Login
    pub requires_auth: bool,
    /// Authenticated visitors are sent to Home
    pub guest_only: bool,
}

impl Route {
    /// Every route, in menu order.
    pub const ALL: [Route; 5] = [
        Route::Home,
        Route::DbQuery,
        Route::DocQuery,
        Route::Login,
        Route::Signup,
    ];

    /// Canonical path.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::DbQuery => "/db-query",
            Self::DocQuery => "/doc-query",
        }
    }

    pub fn meta(&self) -> RouteMeta {
        match self {
            Self::Home | Self::DbQuery | Self::DocQuery => RouteMeta {
                requires_auth: true,
                guest_only: false,
            },
            Self::Login | Self::Signup => RouteMeta {
                requires_auth: false,
                guest_only: true,
            },
        }
    }

    /// Resolve a path. `None` means the catch-all.
    ///
    /// Trailing slashes and case are ignored; `/home` is an alias of `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use querydesk::router::Route;
    ///
    /// assert_eq!(Route::from_path("/db-query"), Some(Route::DbQuery));
    /// assert_eq!(Route::from_path("/home/"), Some(Route::Home));
    /// assert_eq!(Route::from_path("/admin"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/').to_lowercase();
        match normalized.as_str() {
            "" | "/home" => Some(Self::Home),
            "/login" => Some(Self::Login),
            "/signup" => Some(Self::Signup),
            "/db-query" => Some(Self::DbQuery),
            "/doc-query" => Some(Self::DocQuery),
            _ => None,
        }
    }

    /// Colored tag for prompts.
    pub fn colored_tag(&self) -> String {
        match self {
            Self::Home => format!("[{}]", "AGENT".purple()),
            Self::DbQuery => format!("[{}]", "DB".cyan()),
            Self::DocQuery => format!("[{}]", "DOCS".green()),
            Self::Login => format!("[{}]", "LOGIN".yellow()),
            Self::Signup => format!("[{}]", "SIGNUP".yellow()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "Home"),
            Self::Login => write!(f, "Login"),
            Self::Signup => write!(f, "Signup"),
            Self::DbQuery => write!(f, "DbQuery"),
            Self::DocQuery => write!(f, "DocQuery"),
        }
    }
}

/// Guard outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Enter the requested route
    Proceed(Route),
    /// Enter this route instead
    Redirect(Route),
}

impl Navigation {
    /// The route that ends up active.
    pub fn destination(&self) -> Route {
        match self {
            Self::Proceed(route) | Self::Redirect(route) => *route,
        }
    }
}

/// Decide whether `target` may be entered.
///
/// `None` is the catch-all and always redirects to Login.
pub fn guard(target: Option<Route>, is_authenticated: bool) -> Navigation {
    let Some(route) = target else {
        return Navigation::Redirect(Route::Login);
    };
    let meta = route.meta();
    if meta.requires_auth && !is_authenticated {
        Navigation::Redirect(Route::Login)
    } else if meta.guest_only && is_authenticated {
        Navigation::Redirect(Route::Home)
    } else {
        Navigation::Proceed(route)
    }
}

/// Current route plus the trail that led to it.
#[derive(Debug, Clone)]
pub struct Router {
    current: Route,
    history: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            current: Route::Login,
            history: Vec::new(),
        }
    }
}

impl Router {
    pub fn current(&self) -> Route {
        self.current
    }

    /// Routes entered before the current one, oldest first.
    pub fn history(&self) -> &[Route] {
        &self.history
    }

    /// Navigate through the guard and return where we ended up.
    pub fn push(&mut self, target: Option<Route>, is_authenticated: bool) -> Navigation {
        let navigation = guard(target, is_authenticated);
        if let Navigation::Redirect(to) = navigation {
            tracing::debug!(
                requested = ?target,
                redirected_to = %to,
                "Navigation redirected by guard"
            );
        }
        self.enter(navigation.destination());
        navigation
    }

    /// Navigate by path.
    pub fn push_path(&mut self, path: &str, is_authenticated: bool) -> Navigation {
        self.push(Route::from_path(path), is_authenticated)
    }

    /// Enter a route without consulting the guard (forced logout).
    pub fn force(&mut self, route: Route) {
        self.enter(route);
    }

    fn enter(&mut self, route: Route) {
        if route != self.current {
            self.history.push(self.current);
            self.current = route;
        }
    }
}
