use axum::{routing::get, Router};
use registry::AppRegistry;

use crate::handler::site_type::show_price_calendar;

pub fn build_site_type_routers() -> Router<AppRegistry> {
    let site_type_routers = Router::new().route("/:type_id/calendar", get(show_price_calendar));

    Router::new().nest("/site-types", site_type_routers)
}
