//! Admin console API. Everything except login and logout sits behind
//! [`require_admin`].

pub mod auth;
pub mod bookings;
pub mod checkins;
pub mod content;
pub mod faq;
pub mod images;
pub mod invitations;
pub mod rooms;

use crate::{
    auth::{require_admin, AdminAuth},
    AppState,
};
use axum::{middleware, routing::post, Router};
use std::sync::Arc;

pub fn admin_routes(admin_auth: Arc<AdminAuth>) -> Router<AppState> {
    let protected = Router::new()
        .nest("/rooms", rooms::room_routes())
        .nest("/faq", faq::faq_routes())
        .nest("/content", content::content_routes())
        .nest("/images", images::image_routes())
        .nest("/bookings", bookings::booking_routes())
        .nest("/checkins", checkins::checkin_routes())
        .nest("/invitations", invitations::invitation_routes())
        .route_layer(middleware::from_fn_with_state(admin_auth, require_admin));

    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .merge(protected)
}
