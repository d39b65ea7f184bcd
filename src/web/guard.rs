//! Navigation policy for the single-page client.
//!
//! The client keeps authentication state in two places: the session context
//! (populated after login) and browser storage (`token`, `userRole`). The two
//! are not kept in sync, so a visitor counts as authenticated if either one
//! says so. Decisions depend only on the snapshot passed in.

use crate::auth::repo_types::Role;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_HOME: &str = "/admin/dashboard";
pub const USER_HOME: &str = "/user/dashboard";

/// What the client knows about the visitor at navigation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub loading: bool,
    /// Role of the user held by the session context, if any.
    pub context_role: Option<Role>,
    pub stored_token: Option<String>,
    /// Raw `userRole` value from storage.
    pub stored_role: Option<String>,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.context_role.is_some() || self.stored_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Context role first; the stored role only when there is no context user.
    pub fn has_role(&self, required: Role) -> bool {
        match self.context_role {
            Some(role) => role == required,
            None => self.stored_role.as_deref() == Some(required.as_str()),
        }
    }

    /// Dashboard for the stored role; anything but `admin` lands on the user one.
    pub fn role_home(&self) -> &'static str {
        if self.stored_role.as_deref() == Some(Role::Admin.as_str()) {
            ADMIN_HOME
        } else {
            USER_HOME
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// `/`: sends visitors to their dashboard or to the login page.
    Root,
    /// Only for signed-out visitors.
    Public,
    /// Signed-in visitors, optionally with a specific role.
    Protected { required_role: Option<Role> },
    /// Reduced dashboard shell for signed-out visitors.
    DashboardPreview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub guard: Guard,
}

const fn route(path: &'static str, guard: Guard) -> Route {
    Route { path, guard }
}

const ANY_USER: Guard = Guard::Protected { required_role: None };
const ADMIN_ONLY: Guard = Guard::Protected {
    required_role: Some(Role::Admin),
};

pub const ROUTES: &[Route] = &[
    route("/", Guard::Root),
    route("/login", Guard::Public),
    route("/signup", Guard::Public),
    route("/forgot-password", Guard::Public),
    route("/reset-password", Guard::Public),
    route("/dashboard", Guard::DashboardPreview),
    route("/landing", ANY_USER),
    route("/admin/dashboard", ADMIN_ONLY),
    route("/admin/users", ADMIN_ONLY),
    route("/admin/manage-users", ADMIN_ONLY),
    route("/admin/manage-tasks", ADMIN_ONLY),
    route("/admin/settings", ADMIN_ONLY),
    route("/admin/user-logs", ADMIN_ONLY),
    route("/admin/task-filter", ADMIN_ONLY),
    route("/admin/logs", ANY_USER),
    route("/user/dashboard", ANY_USER),
    route("/user/userpage", ANY_USER),
    route("/user/notifications", ANY_USER),
    route("/user/calendar", ANY_USER),
    route("/user/profile", ANY_USER),
    route("/user/task-filter", ANY_USER),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Auth state still resolving; show a spinner.
    Loading,
    Render,
    /// Render inside the reduced signed-out shell.
    RenderPreview,
    Redirect {
        to: &'static str,
        /// Path to return to after signing in.
        from: Option<String>,
    },
}

impl Decision {
    fn redirect(to: &'static str) -> Self {
        Decision::Redirect { to, from: None }
    }
}

pub fn find_route(path: &str) -> Option<&'static Route> {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };
    ROUTES.iter().find(|r| r.path == path)
}

/// Decides what the client shows for `path`. Unknown paths go back to `/`.
pub fn navigate(path: &str, auth: &AuthSnapshot) -> Decision {
    match find_route(path) {
        Some(route) => decide(route, path, auth),
        None => Decision::redirect("/"),
    }
}

fn decide(route: &Route, path: &str, auth: &AuthSnapshot) -> Decision {
    if auth.loading {
        return Decision::Loading;
    }
    let authenticated = auth.is_authenticated();

    match route.guard {
        Guard::Root if authenticated => Decision::redirect(auth.role_home()),
        Guard::Root => Decision::redirect(LOGIN_PATH),
        Guard::Public if authenticated => Decision::redirect(auth.role_home()),
        Guard::Public => Decision::Render,
        Guard::DashboardPreview if authenticated => Decision::redirect(auth.role_home()),
        Guard::DashboardPreview => Decision::RenderPreview,
        Guard::Protected { .. } if !authenticated => Decision::Redirect {
            to: LOGIN_PATH,
            from: Some(path.to_string()),
        },
        Guard::Protected {
            required_role: Some(role),
        } if !auth.has_role(role) => Decision::redirect(auth.role_home()),
        Guard::Protected { .. } => Decision::Render,
    }
}
