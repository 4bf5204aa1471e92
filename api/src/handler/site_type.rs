use axum::{
    extract::{Path, Query, State},
    Json,
};
use kernel::model::id::SiteTypeId;
use registry::AppRegistry;
use shared::error::AppResult;

use crate::model::site_type::{DailyPriceResponse, PriceCalendarQuery, PriceCalendarResponse};

pub async fn show_price_calendar(
    Path(type_id): Path<SiteTypeId>,
    Query(query): Query<PriceCalendarQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<PriceCalendarResponse>> {
    let rates = registry
        .booking_coordinator()
        .price_calendar(type_id, query.start_date, query.end_date)
        .await?;

    Ok(Json(PriceCalendarResponse {
        type_id,
        items: rates.into_iter().map(DailyPriceResponse::from).collect(),
    }))
}
