use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        booking::{
            event::{NewBooking, UpdateBookingStatus},
            Booking, BookingEquipment, BookingStatus, EquipmentUsage,
        },
        id::{BookingId, EquipmentId, SiteTypeId, UserId},
        stay::StayRange,
    },
    repository::booking::BookingRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{
    classify_db_error,
    model::booking::{BookingEquipmentRow, BookingRow, EquipmentUsageRow},
    set_transaction_serializable, ConnectionPool,
};

const BOOKING_COLUMNS: &str = r#"
    b.booking_id,
    b.user_id,
    b.site_type_id,
    b.site_id,
    s.site_no,
    b.check_in,
    b.check_out,
    b.guest_name,
    b.guest_phone,
    b.total_price,
    b.status,
    b.created_at,
    b.updated_at
"#;

#[derive(new)]
pub struct BookingRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn insert_booking(&self, event: NewBooking) -> AppResult<BookingId> {
        let mut tx = self.db.begin().await?;

        // トランザクション分離レベルを SERIALIZABLE に設定する
        set_transaction_serializable(&mut tx).await?;

        let res = sqlx::query(
            r#"
                INSERT INTO bookings
                (booking_id, user_id, site_type_id, site_id, check_in, check_out,
                guest_name, guest_phone, total_price, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            "#,
        )
        .bind(event.booking_id)
        .bind(event.user_id)
        .bind(event.site_type_id)
        .bind(event.site_id)
        .bind(event.stay.check_in())
        .bind(event.stay.check_out())
        .bind(&event.guest_name)
        .bind(&event.guest_phone)
        .bind(event.total_price)
        .bind(BookingStatus::Pending.as_ref())
        .bind(event.created_at)
        .execute(&mut *tx)
        .await
        .map_err(classify_db_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No booking record has been created".into(),
            ));
        }

        // 装備の確保は予約と同じトランザクションで行う
        for line in &event.equipments {
            sqlx::query(
                r#"
                    INSERT INTO booking_equipments (booking_id, equipment_id, quantity)
                    VALUES ($1, $2, $3)
                "#,
            )
            .bind(event.booking_id)
            .bind(line.equipment_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;
        }

        tx.commit().await.map_err(classify_db_error)?;

        Ok(event.booking_id)
    }

    async fn update_booking_status(&self, event: UpdateBookingStatus) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE bookings
                SET status = $1, updated_at = $2
                WHERE booking_id = $3 AND status = $4
            "#,
        )
        .bind(event.next.as_ref())
        .bind(event.updated_at)
        .bind(event.booking_id)
        .bind(event.expected.as_ref())
        .execute(self.db.inner_ref())
        .await
        .map_err(classify_db_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(format!(
                "booking {} is no longer {}",
                event.booking_id, event.expected
            )));
        }

        Ok(())
    }

    async fn cancel_booking(&self, event: UpdateBookingStatus) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        let res = sqlx::query(
            r#"
                UPDATE bookings
                SET status = $1, updated_at = $2
                WHERE booking_id = $3 AND status = $4
            "#,
        )
        .bind(event.next.as_ref())
        .bind(event.updated_at)
        .bind(event.booking_id)
        .bind(event.expected.as_ref())
        .execute(&mut *tx)
        .await
        .map_err(classify_db_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(format!(
                "booking {} is no longer {}",
                event.booking_id, event.expected
            )));
        }

        // 装備行を削除して在庫を解放する
        sqlx::query("DELETE FROM booking_equipments WHERE booking_id = $1")
            .bind(event.booking_id)
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;

        tx.commit().await.map_err(classify_db_error)?;

        Ok(())
    }

    async fn find_overlapping(
        &self,
        site_type_id: SiteTypeId,
        stay: StayRange,
    ) -> AppResult<Vec<Booking>> {
        // 重複条件: existing.check_in < new.check_out AND existing.check_out > new.check_in
        let sql = format!(
            r#"
                SELECT {BOOKING_COLUMNS}
                FROM bookings AS b
                INNER JOIN sites AS s ON b.site_id = s.site_id
                WHERE b.site_type_id = $1
                  AND b.status IN ('PENDING', 'PAID')
                  AND b.check_in < $3
                  AND b.check_out > $2
            "#
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(site_type_id)
            .bind(stay.check_in())
            .bind(stay.check_out())
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn find_equipment_usage(
        &self,
        equipment_id: EquipmentId,
        stay: StayRange,
    ) -> AppResult<Vec<EquipmentUsage>> {
        let rows: Vec<EquipmentUsageRow> = sqlx::query_as(
            r#"
                SELECT be.booking_id, b.check_in, b.check_out, be.quantity
                FROM booking_equipments AS be
                INNER JOIN bookings AS b ON be.booking_id = b.booking_id
                WHERE be.equipment_id = $1
                  AND b.status IN ('PENDING', 'PAID')
                  AND b.check_in < $3
                  AND b.check_out > $2
            "#,
        )
        .bind(equipment_id)
        .bind(stay.check_in())
        .bind(stay.check_out())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(EquipmentUsage::try_from).collect()
    }

    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        let sql = format!(
            r#"
                SELECT {BOOKING_COLUMNS}
                FROM bookings AS b
                INNER JOIN sites AS s ON b.site_id = s.site_id
                WHERE b.booking_id = $1
            "#
        );
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(booking_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let sql = format!(
            r#"
                SELECT {BOOKING_COLUMNS}
                FROM bookings AS b
                INNER JOIN sites AS s ON b.site_id = s.site_id
                WHERE b.user_id = $1
                  AND ($2::VARCHAR IS NULL OR b.status = $2)
                ORDER BY b.created_at DESC
            "#
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(status.map(|s| s.to_string()))
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn find_booking_equipments(
        &self,
        booking_id: BookingId,
    ) -> AppResult<Vec<BookingEquipment>> {
        let rows: Vec<BookingEquipmentRow> = sqlx::query_as(
            r#"
                SELECT booking_id, equipment_id, quantity
                FROM booking_equipments
                WHERE booking_id = $1
                ORDER BY equipment_id ASC
            "#,
        )
        .bind(booking_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(BookingEquipment::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use kernel::model::id::SiteId;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // シードデータ（各サイトタイプ 10 区画、装備 6 種）を前提とする
    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing to a Postgres instance"]
    async fn cancel_releases_equipment_rows(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let (site_type_id, site_id): (SiteTypeId, SiteId) = sqlx::query_as(
            "SELECT site_type_id, site_id FROM sites ORDER BY site_no LIMIT 1",
        )
        .fetch_one(&pool)
        .await?;
        let (equipment_id,): (EquipmentId,) =
            sqlx::query_as("SELECT equipment_id FROM equipments LIMIT 1")
                .fetch_one(&pool)
                .await?;
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));
        let stay = StayRange::new(date("2024-06-01"), date("2024-06-03"))?;
        let booking_id = BookingId::new();

        repo.insert_booking(NewBooking {
            booking_id,
            user_id: UserId::new(),
            site_type_id,
            site_id,
            stay,
            guest_name: "Test Guest".into(),
            guest_phone: "000-0000".into(),
            total_price: dec!(296.00),
            equipments: vec![BookingEquipment {
                booking_id,
                equipment_id,
                quantity: 2,
            }],
            created_at: Utc::now(),
        })
        .await?;
        assert_eq!(repo.find_equipment_usage(equipment_id, stay).await?.len(), 1);

        repo.cancel_booking(UpdateBookingStatus::new(
            booking_id,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
            Utc::now(),
        ))
        .await?;

        let booking = repo.find_by_id(booking_id).await?.unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert!(repo.find_booking_equipments(booking_id).await?.is_empty());
        assert!(repo.find_overlapping(site_type_id, stay).await?.is_empty());
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing to a Postgres instance"]
    async fn site_of_another_type_is_refused(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let (site_type_id, site_id): (SiteTypeId, SiteId) = sqlx::query_as(
            "SELECT site_type_id, site_id FROM sites ORDER BY site_no LIMIT 1",
        )
        .fetch_one(&pool)
        .await?;
        let (other_type_id,): (SiteTypeId,) =
            sqlx::query_as("SELECT site_type_id FROM site_types WHERE site_type_id <> $1 LIMIT 1")
                .bind(site_type_id)
                .fetch_one(&pool)
                .await?;
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));
        let stay = StayRange::new(date("2024-06-01"), date("2024-06-03"))?;

        let res = repo
            .insert_booking(NewBooking {
                booking_id: BookingId::new(),
                user_id: UserId::new(),
                site_type_id: other_type_id,
                site_id,
                stay,
                guest_name: "Test Guest".into(),
                guest_phone: "000-0000".into(),
                total_price: dec!(240.00),
                equipments: vec![],
                created_at: Utc::now(),
            })
            .await;

        assert!(matches!(res, Err(AppError::SpecificOperationError(_))));
        assert!(repo.find_overlapping(other_type_id, stay).await?.is_empty());
        Ok(())
    }
}
