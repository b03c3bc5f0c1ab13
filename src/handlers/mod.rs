pub mod appointments;
pub mod prices;
pub mod waitlist;

use std::sync::Arc;

use axum::Extension;

use crate::middleware::AuthUser;
use crate::query::Principal;
use crate::services::{SearchService, WaitlistService};

#[derive(Clone)]
pub struct AppState {
    pub search: SearchService,
    pub waitlist: Arc<WaitlistService>,
}

/// The principal, if the auth middleware ran and accepted a token. Handlers
/// pass this straight to the engine, which owns the missing-principal
/// rejection.
pub(crate) fn principal_of(auth: &Option<Extension<AuthUser>>) -> Option<&Principal> {
    auth.as_ref().map(|Extension(user)| &user.0)
}
