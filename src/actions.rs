use diesel::prelude::*;
use chrono::Utc;
use crate::error::StoreError;
use crate::models;

pub fn find_enrollment_by_user_id(
    conn: &mut PgConnection,
    uid: i32,
) -> Result<Option<models::Enrollment>, StoreError> {
    use crate::schema::enrollments::dsl::{enrollments, user_id};

    let enrollment = enrollments
        .filter(user_id.eq(uid))
        .select(models::Enrollment::as_select())
        .first::<models::Enrollment>(conn)
        .optional()?;

    Ok(enrollment)
}

pub fn find_ticket_by_enrollment_id(
    conn: &mut PgConnection,
    enrollment: i32,
) -> Result<Option<(models::Ticket, models::TicketType)>, StoreError> {
    use crate::schema::{ticket_types, tickets};

    let row = tickets::table
        .inner_join(ticket_types::table)
        .filter(tickets::enrollment_id.eq(enrollment))
        .select((models::Ticket::as_select(), models::TicketType::as_select()))
        .first::<(models::Ticket, models::TicketType)>(conn)
        .optional()?;

    Ok(row)
}

pub fn find_room_with_occupancy(
    conn: &mut PgConnection,
    rid: i32,
) -> Result<Option<(models::Room, i64)>, StoreError> {
    use crate::schema::{bookings, rooms};

    let room = rooms::table
        .find(rid)
        .select(models::Room::as_select())
        .first::<models::Room>(conn)
        .optional()?;

    let Some(room) = room else {
        return Ok(None);
    };

    let occupancy: i64 = bookings::table
        .filter(bookings::room_id.eq(rid))
        .count()
        .get_result(conn)?;

    Ok(Some((room, occupancy)))
}

pub fn find_booking_by_user_id(
    conn: &mut PgConnection,
    uid: i32,
) -> Result<Option<(models::Booking, models::Room)>, StoreError> {
    use crate::schema::{bookings, rooms};

    let row = bookings::table
        .inner_join(rooms::table)
        .filter(bookings::user_id.eq(uid))
        .select((models::Booking::as_select(), models::Room::as_select()))
        .first::<(models::Booking, models::Room)>(conn)
        .optional()?;

    Ok(row)
}

// Atomic check-and-create: locks the room row so the capacity and
// one-booking-per-user checks cannot be invalidated between read and insert.
// The unique index on bookings.user_id backs the per-user invariant as well.
pub fn create_booking_checked(
    conn: &mut PgConnection,
    uid: i32,
    rid: i32,
) -> Result<models::Booking, StoreError> {
    use crate::schema::{bookings, rooms};

    conn.transaction(|conn| {
        let room: Option<models::Room> = rooms::table
            .find(rid)
            .select(models::Room::as_select())
            .for_update()
            .first::<models::Room>(conn)
            .optional()?;

        let room = room.ok_or(StoreError::RoomMissing)?;

        let occupancy: i64 = bookings::table
            .filter(bookings::room_id.eq(rid))
            .count()
            .get_result(conn)?;

        if occupancy >= room.capacity as i64 {
            return Err(StoreError::RoomFull);
        }

        let existing: Option<i32> = bookings::table
            .filter(bookings::user_id.eq(uid))
            .select(bookings::id)
            .first(conn)
            .optional()?;

        if existing.is_some() {
            return Err(StoreError::AlreadyBooked);
        }

        let new_booking = models::NewBooking {
            user_id: uid,
            room_id: rid,
        };

        let new_id = diesel::insert_into(bookings::table)
            .values(&new_booking)
            .returning(bookings::id)
            .get_result::<i32>(conn)?;

        let booking = bookings::table
            .find(new_id)
            .select(models::Booking::as_select())
            .first::<models::Booking>(conn)?;

        Ok(booking)
    })
}

// Reassign an existing booking to another room, re-checking the target room's
// capacity under the same row lock used by create.
pub fn reassign_booking(
    conn: &mut PgConnection,
    bid: i32,
    rid: i32,
) -> Result<models::Booking, StoreError> {
    use crate::schema::{bookings, rooms};

    conn.transaction(|conn| {
        let booking: Option<models::Booking> = bookings::table
            .find(bid)
            .select(models::Booking::as_select())
            .first::<models::Booking>(conn)
            .optional()?;

        let booking = booking.ok_or(StoreError::BookingMissing)?;

        let room: Option<models::Room> = rooms::table
            .find(rid)
            .select(models::Room::as_select())
            .for_update()
            .first::<models::Room>(conn)
            .optional()?;

        let room = room.ok_or(StoreError::RoomMissing)?;

        let occupancy: i64 = bookings::table
            .filter(bookings::room_id.eq(rid))
            .filter(bookings::id.ne(booking.id))
            .count()
            .get_result(conn)?;

        if occupancy >= room.capacity as i64 {
            return Err(StoreError::RoomFull);
        }

        diesel::update(bookings::table.find(booking.id))
            .set((
                bookings::room_id.eq(rid),
                bookings::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        let updated = bookings::table
            .find(booking.id)
            .select(models::Booking::as_select())
            .first::<models::Booking>(conn)?;

        Ok(updated)
    })
}
