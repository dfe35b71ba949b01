//! Navigable paths of the back office and their public/protected partition.
//!
//! The partition is a `match` on the route type, so it is fixed at build
//! time. Unknown paths resolve to [`Route::NotFound`], which is public.

use std::fmt;

/// Admin resources that have a table view and a form view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    StoreInfo,
    Branch,
    Category,
    User,
    Product,
    Order,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::StoreInfo,
        Resource::Branch,
        Resource::Category,
        Resource::User,
        Resource::Product,
        Resource::Order,
    ];

    /// Path segment, shared by the route and the `/admin/<segment>` endpoints.
    pub fn segment(&self) -> &'static str {
        match self {
            Resource::StoreInfo => "inforWeb",
            Resource::Branch => "branch",
            Resource::Category => "category",
            Resource::User => "user",
            Resource::Product => "product",
            Resource::Order => "order",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.segment() == segment)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::StoreInfo => "Store info",
            Resource::Branch => "Branches",
            Resource::Category => "Categories",
            Resource::User => "Users",
            Resource::Product => "Products",
            Resource::Order => "Orders",
        }
    }

    /// Rows per table page.
    pub fn page_size(&self) -> usize {
        match self {
            Resource::User => 8,
            _ => 6,
        }
    }

    /// Orders are never deleted from the back office, only moved between statuses.
    pub fn supports_delete(&self) -> bool {
        !matches!(self, Resource::Order)
    }
}

/// Which record a form view edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormTarget {
    Create,
    Existing(i64),
}

impl FormTarget {
    /// Parse the last path segment of a form: `create` or `new` for a new
    /// record, otherwise a numeric id.
    pub fn parse(segment: &str) -> Option<FormTarget> {
        match segment {
            "create" | "new" => Some(FormTarget::Create),
            id => id.parse().ok().map(FormTarget::Existing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    SignIn,
    NotFound,
    Home,
    Admin,
    Profile,
    List(Resource),
    Form(Resource, FormTarget),
}

/// Where the session gate sends unauthenticated callers.
pub const LOGIN_ROUTE: Route = Route::SignIn;

/// Landing page after login for ordinary users.
pub const DEFAULT_LANDING: Route = Route::Home;

/// Landing page after login for administrators.
pub const ADMIN_LANDING: Route = Route::Admin;

impl Route {
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["signin"] => Route::SignIn,
            ["admin"] => Route::Admin,
            ["profile"] => Route::Profile,
            [segment] => Resource::from_segment(segment)
                .map(Route::List)
                .unwrap_or(Route::NotFound),
            [segment, target] => {
                let Some(resource) = Resource::from_segment(segment) else {
                    return Route::NotFound;
                };
                FormTarget::parse(target)
                    .map(|target| Route::Form(resource, target))
                    .unwrap_or(Route::NotFound)
            }
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::SignIn => "/signin".to_string(),
            Route::NotFound => "/404".to_string(),
            Route::Home => "/".to_string(),
            Route::Admin => "/admin".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::List(resource) => format!("/{}", resource.segment()),
            Route::Form(resource, FormTarget::Create) => format!("/{}/create", resource.segment()),
            Route::Form(resource, FormTarget::Existing(id)) => {
                format!("/{}/{}", resource.segment(), id)
            }
        }
    }

    /// Whether the route needs a valid session before it may render.
    pub fn is_protected(&self) -> bool {
        match self {
            Route::SignIn | Route::NotFound => false,
            Route::Home
            | Route::Admin
            | Route::Profile
            | Route::List(_)
            | Route::Form(_, _) => true,
        }
    }

    /// Landing page for a user with the given admin status.
    pub fn landing(is_admin: bool) -> Route {
        if is_admin {
            ADMIN_LANDING
        } else {
            DEFAULT_LANDING
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
