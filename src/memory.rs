//! In-memory implementation of the storage collaborators, used by the
//! service and boundary tests in place of Postgres.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};

use crate::error::StoreError;
use crate::models::{Booking, Enrollment, Room, Ticket, TicketStatus, TicketType};
use crate::store::{
    BookingStore, BookingWithRoom, EnrollmentReader, RoomOccupancy, RoomReader, TicketReader,
    TicketWithType,
};

#[derive(Default)]
struct State {
    enrollments: HashMap<i32, Enrollment>,
    tickets: HashMap<i32, (Ticket, TicketType)>,
    rooms: HashMap<i32, Room>,
    bookings: HashMap<i32, Booking>,
    next_id: i32,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store mutex poisoned")
    }

    pub fn add_enrollment(&self, id: i32, user_id: i32) {
        self.state().enrollments.insert(
            user_id,
            Enrollment {
                id,
                user_id,
                name: format!("user {}", user_id),
                created_at: now(),
            },
        );
    }

    pub fn add_ticket(
        &self,
        enrollment_id: i32,
        status: TicketStatus,
        includes_hotel: bool,
        is_remote: bool,
    ) {
        let mut state = self.state();
        let id = state.tickets.len() as i32 + 1;
        state.tickets.insert(
            enrollment_id,
            (
                Ticket {
                    id,
                    enrollment_id,
                    ticket_type_id: id,
                    status,
                    created_at: now(),
                },
                TicketType {
                    id,
                    name: "conference".to_string(),
                    includes_hotel,
                    is_remote,
                    created_at: now(),
                },
            ),
        );
    }

    pub fn add_room(&self, id: i32, capacity: i32) -> Room {
        let room = Room {
            id,
            name: format!("room {}", id),
            capacity,
            hotel_id: 1,
            created_at: now(),
            updated_at: now(),
        };
        self.state().rooms.insert(id, room.clone());
        room
    }
}

#[async_trait]
impl EnrollmentReader for MemoryStore {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<Enrollment>, StoreError> {
        Ok(self.state().enrollments.get(&user_id).cloned())
    }
}

#[async_trait]
impl TicketReader for MemoryStore {
    async fn find_by_enrollment_id(
        &self,
        enrollment_id: i32,
    ) -> Result<Option<TicketWithType>, StoreError> {
        Ok(self
            .state()
            .tickets
            .get(&enrollment_id)
            .cloned()
            .map(|(ticket, ticket_type)| TicketWithType { ticket, ticket_type }))
    }
}

#[async_trait]
impl RoomReader for MemoryStore {
    async fn find_by_id(&self, room_id: i32) -> Result<Option<RoomOccupancy>, StoreError> {
        let state = self.state();
        Ok(state.rooms.get(&room_id).cloned().map(|room| {
            let occupancy = state
                .bookings
                .values()
                .filter(|b| b.room_id == room_id)
                .count() as i64;
            RoomOccupancy { room, occupancy }
        }))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<BookingWithRoom>, StoreError> {
        let state = self.state();
        Ok(state
            .bookings
            .values()
            .find(|b| b.user_id == user_id)
            .cloned()
            .and_then(|booking| {
                let room = state.rooms.get(&booking.room_id).cloned()?;
                Some(BookingWithRoom { booking, room })
            }))
    }

    // The whole check-and-insert happens under one lock, mirroring the
    // transactional create in the Postgres store.
    async fn create(&self, user_id: i32, room_id: i32) -> Result<Booking, StoreError> {
        let mut state = self.state();

        let room = state
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(StoreError::RoomMissing)?;

        let occupancy = state
            .bookings
            .values()
            .filter(|b| b.room_id == room_id)
            .count() as i64;
        if occupancy >= room.capacity as i64 {
            return Err(StoreError::RoomFull);
        }

        if state.bookings.values().any(|b| b.user_id == user_id) {
            return Err(StoreError::AlreadyBooked);
        }

        state.next_id += 1;
        let booking = Booking {
            id: state.next_id,
            user_id,
            room_id,
            created_at: now(),
            updated_at: now(),
        };
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn reassign(&self, booking_id: i32, room_id: i32) -> Result<Booking, StoreError> {
        let mut state = self.state();

        if !state.bookings.contains_key(&booking_id) {
            return Err(StoreError::BookingMissing);
        }

        let room = state
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(StoreError::RoomMissing)?;

        let occupancy = state
            .bookings
            .values()
            .filter(|b| b.room_id == room_id && b.id != booking_id)
            .count() as i64;
        if occupancy >= room.capacity as i64 {
            return Err(StoreError::RoomFull);
        }

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(StoreError::BookingMissing)?;
        booking.room_id = room.id;
        booking.updated_at = now();
        Ok(booking.clone())
    }
}
