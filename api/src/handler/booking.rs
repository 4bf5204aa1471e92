use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::{booking::event::CreateBooking, id::BookingId};
use registry::AppRegistry;
use shared::error::AppResult;

use crate::model::booking::{
    BookingEquipmentsResponse, BookingIdRequest, BookingResponse, BookingsResponse,
    CheckBookingQuery, CheckBookingRequest, CheckBookingResponse, CreateBookingRequest,
    CreateBookingResponse, MyBookingsQuery,
};

pub async fn check_booking(
    State(registry): State<AppRegistry>,
    Json(req): Json<CheckBookingRequest>,
) -> AppResult<Json<CheckBookingResponse>> {
    req.validate(&())?;

    let CheckBookingQuery {
        site_type_id,
        stay,
        equipments,
    } = req.try_into()?;
    registry
        .booking_coordinator()
        .check(site_type_id, stay, equipments)
        .await
        .map(CheckBookingResponse::from)
        .map(Json)
}

pub async fn create_booking(
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<CreateBookingResponse>)> {
    req.validate(&())?;

    let event = CreateBooking::try_from(req)?;
    registry
        .booking_coordinator()
        .create(event)
        .await
        .map(|receipt| (StatusCode::CREATED, Json(receipt.into())))
}

pub async fn pay_booking(
    State(registry): State<AppRegistry>,
    Json(req): Json<BookingIdRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    registry
        .booking_coordinator()
        .pay(req.try_into()?)
        .await
        .map(|_| StatusCode::OK)
}

pub async fn cancel_booking(
    State(registry): State<AppRegistry>,
    Json(req): Json<BookingIdRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    registry
        .booking_coordinator()
        .cancel(req.try_into()?)
        .await
        .map(|_| StatusCode::OK)
}

pub async fn show_my_bookings(
    Query(query): Query<MyBookingsQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    query.validate(&())?;

    let (user_id, status) = query.parse()?;
    registry
        .booking_coordinator()
        .list_bookings(user_id, status)
        .await
        .map(BookingsResponse::from)
        .map(Json)
}

pub async fn show_booking(
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingResponse>> {
    registry
        .booking_coordinator()
        .find_booking(booking_id)
        .await
        .map(BookingResponse::from)
        .map(Json)
}

pub async fn show_booking_equipments(
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingEquipmentsResponse>> {
    registry
        .booking_coordinator()
        .booking_equipments(booking_id)
        .await
        .map(BookingEquipmentsResponse::from)
        .map(Json)
}
