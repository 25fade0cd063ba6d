//! Console views and the guard deciding who may open them

use crate::session::SessionState;

/// A view of the admin console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Users,
    Tags,
    Stations,
    Songs,
    /// Songs of a single station
    StationSongs(i64),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Users => "/users".to_string(),
            Route::Tags => "/tags".to_string(),
            Route::Stations => "/stations".to_string(),
            Route::Songs => "/songs".to_string(),
            Route::StationSongs(id) => format!("/stations/{}/songs", id),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => return Some(Route::Dashboard),
            "/login" => return Some(Route::Login),
            "/users" => return Some(Route::Users),
            "/tags" => return Some(Route::Tags),
            "/stations" => return Some(Route::Stations),
            "/songs" => return Some(Route::Songs),
            _ => {}
        }

        let id = trimmed
            .strip_prefix("/stations/")?
            .strip_suffix("/songs")?
            .parse::<i64>()
            .ok()?;
        (id > 0).then_some(Route::StationSongs(id))
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// Outcome of guarding a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Allow,
    /// Session still resolving; render nothing yet
    Pending,
    RedirectToLogin { from: Route },
}

/// Nothing renders while the session is resolving, the login view included
pub fn guard(route: Route, state: &SessionState) -> Guard {
    match state {
        SessionState::Resolving => Guard::Pending,
        _ if !route.requires_auth() => Guard::Allow,
        SessionState::Anonymous => Guard::RedirectToLogin { from: route },
        SessionState::Authenticated(_) => Guard::Allow,
    }
}
