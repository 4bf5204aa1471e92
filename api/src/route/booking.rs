use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::booking::{
    cancel_booking, check_booking, create_booking, pay_booking, show_booking,
    show_booking_equipments, show_my_bookings,
};

pub fn build_booking_routers() -> Router<AppRegistry> {
    let booking_routers = Router::new()
        .route("/check", post(check_booking))
        .route("/create", post(create_booking))
        .route("/pay", post(pay_booking))
        .route("/cancel", post(cancel_booking))
        .route("/my", get(show_my_bookings))
        .route("/:booking_id", get(show_booking))
        .route("/:booking_id/equipments", get(show_booking_equipments));

    Router::new().nest("/booking", booking_routers)
}
