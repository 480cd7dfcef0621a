//! Route protection.
//!
//! `guard` is a pure decision over a session snapshot. `Router` keeps the
//! navigation stack and applies the guard to whatever is on top of it.

use super::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Profile,
    Compose,
    History,
    LogDetail(i64),
}

impl Route {
    /// Every screen except the login entry point needs a session.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Log in",
            Route::Home => "Check-in",
            Route::Profile => "Profile",
            Route::Compose => "New entry",
            Route::History => "History",
            Route::LogDetail(_) => "Entry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session is still settling; show a neutral waiting indicator.
    Wait,
    Redirect(Route),
    Render,
}

pub fn guard(route: &Route, session: &Session) -> GuardDecision {
    if !route.requires_auth() {
        return GuardDecision::Render;
    }
    if session.loading {
        return GuardDecision::Wait;
    }
    match session.user {
        Some(_) => GuardDecision::Render,
        None => GuardDecision::Redirect(Route::Login),
    }
}

/// What the front end should draw for the current navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Waiting,
    Screen(Route),
}

/// Navigation stack with the guard applied on every resolve.
#[derive(Debug, Clone)]
pub struct Router {
    stack: Vec<Route>,
}

impl Router {
    pub fn new(start: Route) -> Self {
        Self { stack: vec![start] }
    }

    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::Home)
    }

    pub fn navigate(&mut self, route: Route) {
        if self.current() != route {
            self.stack.push(route);
        }
    }

    /// Pop back one screen. Returns false at the root.
    pub fn back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Swap the current screen without growing history.
    pub fn replace(&mut self, route: Route) {
        self.stack.pop();
        self.stack.push(route);
    }

    /// Drop all history and start over at `route`.
    pub fn reset(&mut self, route: Route) {
        self.stack.clear();
        self.stack.push(route);
    }

    pub fn resolve(&mut self, session: &Session) -> Resolved {
        let current = self.current();
        match guard(&current, session) {
            GuardDecision::Wait => Resolved::Waiting,
            GuardDecision::Render => Resolved::Screen(current),
            GuardDecision::Redirect(to) => {
                self.reset(to);
                Resolved::Screen(to)
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn authenticated(loading: bool) -> Session {
        Session {
            token: Some("tok".to_string()),
            user: Some(User::new(1)),
            loading,
        }
    }

    const PROTECTED: [Route; 5] = [
        Route::Home,
        Route::Profile,
        Route::Compose,
        Route::History,
        Route::LogDetail(3),
    ];

    #[test]
    fn test_guard_never_redirects_while_loading() {
        for route in PROTECTED {
            assert_eq!(guard(&route, &Session::initializing()), GuardDecision::Wait);
            assert_eq!(guard(&route, &authenticated(true)), GuardDecision::Wait);
        }
    }

    #[test]
    fn test_guard_redirects_when_settled_without_user() {
        for route in PROTECTED {
            assert_eq!(
                guard(&route, &Session::default()),
                GuardDecision::Redirect(Route::Login)
            );
        }
    }

    #[test]
    fn test_guard_renders_for_user() {
        for route in PROTECTED {
            assert_eq!(guard(&route, &authenticated(false)), GuardDecision::Render);
        }
    }

    #[test]
    fn test_login_route_is_public() {
        assert_eq!(guard(&Route::Login, &Session::initializing()), GuardDecision::Render);
        assert_eq!(guard(&Route::Login, &Session::default()), GuardDecision::Render);
    }

    #[test]
    fn test_router_redirect_resets_history() {
        let mut router = Router::default();
        router.navigate(Route::History);
        router.navigate(Route::LogDetail(4));

        assert_eq!(router.resolve(&Session::initializing()), Resolved::Waiting);
        assert_eq!(router.current(), Route::LogDetail(4));

        assert_eq!(router.resolve(&Session::default()), Resolved::Screen(Route::Login));
        assert!(!router.back());
    }

    #[test]
    fn test_router_back_and_replace() {
        let mut router = Router::default();
        router.navigate(Route::History);
        router.navigate(Route::History);
        router.navigate(Route::LogDetail(1));
        router.replace(Route::LogDetail(2));

        assert_eq!(router.resolve(&authenticated(false)), Resolved::Screen(Route::LogDetail(2)));
        assert!(router.back());
        assert_eq!(router.current(), Route::History);
        assert!(router.back());
        assert_eq!(router.current(), Route::Home);
        assert!(!router.back());
    }
}
