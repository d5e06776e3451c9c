use std::sync::Arc;

use crate::error::{BookingError, StoreError};
use crate::models::{Booking, Room, TicketStatus};
use crate::store::{BookingStore, EnrollmentReader, RoomReader, TicketReader};

/// The user's current booking together with its room, as returned by the get
/// operation.
#[derive(Debug, Clone)]
pub struct BookingView {
    pub id: i32,
    pub room: Room,
}

/// Booking admission core. Orchestrates the collaborator reads, evaluates the
/// eligibility preconditions in a fixed order, and only then writes.
pub struct BookingService {
    enrollments: Arc<dyn EnrollmentReader>,
    tickets: Arc<dyn TicketReader>,
    rooms: Arc<dyn RoomReader>,
    bookings: Arc<dyn BookingStore>,
}

impl BookingService {
    pub fn new(
        enrollments: Arc<dyn EnrollmentReader>,
        tickets: Arc<dyn TicketReader>,
        rooms: Arc<dyn RoomReader>,
        bookings: Arc<dyn BookingStore>,
    ) -> Self {
        BookingService {
            enrollments,
            tickets,
            rooms,
            bookings,
        }
    }

    /// Builds the service from a single backing store that implements all
    /// four collaborator traits.
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: EnrollmentReader + TicketReader + RoomReader + BookingStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    pub async fn get_booking(&self, user_id: i32) -> Result<BookingView, BookingError> {
        let current = self
            .bookings
            .find_by_user_id(user_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        Ok(BookingView {
            id: current.booking.id,
            room: current.room,
        })
    }

    pub async fn create_booking(&self, user_id: i32, room_id: i32) -> Result<Booking, BookingError> {
        let enrollment = self
            .enrollments
            .find_by_user_id(user_id)
            .await?
            .ok_or(BookingError::Forbidden)?;

        let ticket = self
            .tickets
            .find_by_enrollment_id(enrollment.id)
            .await?
            .ok_or(BookingError::Forbidden)?;
        if ticket.ticket.status == TicketStatus::RESERVED
            || !ticket.ticket_type.includes_hotel
            || ticket.ticket_type.is_remote
        {
            return Err(BookingError::Forbidden);
        }

        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or(BookingError::NotFound)?;
        if room.occupancy >= room.room.capacity as i64 {
            return Err(BookingError::Forbidden);
        }

        if self.bookings.find_by_user_id(user_id).await?.is_some() {
            return Err(BookingError::Forbidden);
        }

        // The store re-runs the capacity and uniqueness checks atomically, so
        // losing a race comes out as the same policy rejection.
        match self.bookings.create(user_id, room_id).await {
            Ok(booking) => Ok(booking),
            Err(StoreError::RoomFull) | Err(StoreError::AlreadyBooked) => {
                Err(BookingError::Forbidden)
            }
            Err(StoreError::RoomMissing) => Err(BookingError::NotFound),
            Err(e) => Err(BookingError::Internal(e)),
        }
    }

    pub async fn update_booking(
        &self,
        user_id: i32,
        room_id: i32,
        booking_id: i32,
    ) -> Result<Booking, BookingError> {
        let enrollment = self
            .enrollments
            .find_by_user_id(user_id)
            .await?
            .ok_or(BookingError::Unauthorized)?;

        // Unlike create, a hotel-excluded ticket type may still move an
        // existing booking; only remote attendance and unpaid status bar it.
        let ticket = self
            .tickets
            .find_by_enrollment_id(enrollment.id)
            .await?
            .ok_or(BookingError::Unauthorized)?;
        if ticket.ticket.status == TicketStatus::RESERVED || ticket.ticket_type.is_remote {
            return Err(BookingError::Unauthorized);
        }

        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or(BookingError::NotFound)?;
        if room.occupancy >= room.room.capacity as i64 {
            return Err(BookingError::Unauthorized);
        }

        let current = self
            .bookings
            .find_by_user_id(user_id)
            .await?
            .ok_or(BookingError::Unauthorized)?;
        if current.booking.user_id != user_id || current.booking.id != booking_id {
            return Err(BookingError::Unauthorized);
        }

        match self.bookings.reassign(booking_id, room_id).await {
            Ok(booking) => Ok(booking),
            Err(StoreError::RoomFull) => Err(BookingError::Unauthorized),
            Err(StoreError::RoomMissing) | Err(StoreError::BookingMissing) => {
                Err(BookingError::NotFound)
            }
            Err(e) => Err(BookingError::Internal(e)),
        }
    }
}
