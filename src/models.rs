use serde::{Deserialize, Serialize};
use crate::schema::{bookings, enrollments, rooms, ticket_types, tickets};
use chrono::NaiveDateTime;
use diesel::{deserialize::{self, FromSql}, pg::{Pg, PgValue}, serialize::{self, Output, ToSql}, sql_types::Text, Insertable, Selectable};

#[derive(Debug, Clone, Queryable, Serialize, Deserialize, Selectable)]
#[diesel(table_name = enrollments)]
pub struct Enrollment {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::TicketStatus)]
pub enum TicketStatus {
    PAID,
    RESERVED,
}

impl ToSql<crate::schema::sql_types::TicketStatus, Pg> for TicketStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let s = match *self {
            TicketStatus::PAID => "PAID",
            TicketStatus::RESERVED => "RESERVED",
        };
        <str as ToSql<Text, Pg>>::to_sql(s, out)
    }
}

impl FromSql<crate::schema::sql_types::TicketStatus, Pg> for TicketStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match <String as FromSql<Text, Pg>>::from_sql(bytes)?.as_str() {
            "PAID" => Ok(TicketStatus::PAID),
            "RESERVED" => Ok(TicketStatus::RESERVED),
            s => Err(format!("Unrecognized ticket status: {}", s).into()),
        }
    }
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize, Selectable)]
#[diesel(table_name = tickets)]
pub struct Ticket {
    pub id: i32,
    pub enrollment_id: i32,
    pub ticket_type_id: i32,
    pub status: TicketStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize, Selectable)]
#[diesel(table_name = ticket_types)]
pub struct TicketType {
    pub id: i32,
    pub name: String,
    pub includes_hotel: bool,
    pub is_remote: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize, Selectable)]
#[diesel(table_name = rooms)]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub hotel_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize, Selectable)]
#[diesel(table_name = bookings)]
pub struct Booking {
    pub id: i32,
    pub user_id: i32,
    pub room_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBooking {
    pub user_id: i32,
    pub room_id: i32,
}

// Request/Response models for API
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub room_id: i32,
}

#[derive(Debug, Serialize)]
pub struct BookingIdResponse {
    pub id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub hotel_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        RoomResponse {
            id: room.id,
            name: room.name,
            capacity: room.capacity,
            hotel_id: room.hotel_id,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: i32,
    #[serde(rename = "Room")]
    pub room: RoomResponse,
}
