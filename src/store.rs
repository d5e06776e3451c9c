use actix_web::web;
use async_trait::async_trait;
use diesel::{r2d2, PgConnection};

use crate::actions;
use crate::error::StoreError;
use crate::models::{Booking, Enrollment, Room, Ticket, TicketType};

pub type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

/// Ticket joined with its type, as the admission checks need both.
#[derive(Debug, Clone)]
pub struct TicketWithType {
    pub ticket: Ticket,
    pub ticket_type: TicketType,
}

/// Room together with the number of bookings currently referencing it.
#[derive(Debug, Clone)]
pub struct RoomOccupancy {
    pub room: Room,
    pub occupancy: i64,
}

#[derive(Debug, Clone)]
pub struct BookingWithRoom {
    pub booking: Booking,
    pub room: Room,
}

#[async_trait]
pub trait EnrollmentReader: Send + Sync {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<Enrollment>, StoreError>;
}

#[async_trait]
pub trait TicketReader: Send + Sync {
    async fn find_by_enrollment_id(
        &self,
        enrollment_id: i32,
    ) -> Result<Option<TicketWithType>, StoreError>;
}

#[async_trait]
pub trait RoomReader: Send + Sync {
    async fn find_by_id(&self, room_id: i32) -> Result<Option<RoomOccupancy>, StoreError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<BookingWithRoom>, StoreError>;

    /// Atomic conditional write: re-checks room capacity and the
    /// one-booking-per-user invariant inside a single transaction, failing
    /// with `RoomFull` or `AlreadyBooked` when a concurrent writer won.
    async fn create(&self, user_id: i32, room_id: i32) -> Result<Booking, StoreError>;

    /// Moves an existing booking to another room, re-checking target
    /// capacity transactionally.
    async fn reassign(&self, booking_id: i32, room_id: i32) -> Result<Booking, StoreError>;
}

/// Postgres-backed implementation of all four collaborator traits. Diesel
/// queries are blocking, so each call runs the sync action on the blocking
/// thread pool.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        PgStore { pool }
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        web::block(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|_| StoreError::Canceled)?
    }
}

#[async_trait]
impl EnrollmentReader for PgStore {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<Enrollment>, StoreError> {
        self.run(move |conn| actions::find_enrollment_by_user_id(conn, user_id))
            .await
    }
}

#[async_trait]
impl TicketReader for PgStore {
    async fn find_by_enrollment_id(
        &self,
        enrollment_id: i32,
    ) -> Result<Option<TicketWithType>, StoreError> {
        let row = self
            .run(move |conn| actions::find_ticket_by_enrollment_id(conn, enrollment_id))
            .await?;
        Ok(row.map(|(ticket, ticket_type)| TicketWithType { ticket, ticket_type }))
    }
}

#[async_trait]
impl RoomReader for PgStore {
    async fn find_by_id(&self, room_id: i32) -> Result<Option<RoomOccupancy>, StoreError> {
        let row = self
            .run(move |conn| actions::find_room_with_occupancy(conn, room_id))
            .await?;
        Ok(row.map(|(room, occupancy)| RoomOccupancy { room, occupancy }))
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<BookingWithRoom>, StoreError> {
        let row = self
            .run(move |conn| actions::find_booking_by_user_id(conn, user_id))
            .await?;
        Ok(row.map(|(booking, room)| BookingWithRoom { booking, room }))
    }

    async fn create(&self, user_id: i32, room_id: i32) -> Result<Booking, StoreError> {
        self.run(move |conn| actions::create_booking_checked(conn, user_id, room_id))
            .await
    }

    async fn reassign(&self, booking_id: i32, room_id: i32) -> Result<Booking, StoreError> {
        self.run(move |conn| actions::reassign_booking(conn, booking_id, room_id))
            .await
    }
}
