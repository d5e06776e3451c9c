#[macro_use]
extern crate diesel;

use std::sync::Arc;

use actix_web::{error::InternalError, get, middleware, post, put, web, App, HttpResponse, HttpServer, Responder};
use diesel::{r2d2, PgConnection};
use regex::Regex;

mod actions;
mod auth;
mod error;
#[cfg(test)]
mod memory;
mod models;
mod schema;
mod service;
mod store;

use auth::AuthenticatedUser;
use error::BookingError;
use service::BookingService;
use store::{DbPool, PgStore};

#[get("/bookings")]
async fn get_booking(
    service: web::Data<BookingService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, BookingError> {
    let view = service.get_booking(user.user_id).await?;

    Ok(HttpResponse::Ok().json(models::BookingResponse {
        id: view.id,
        room: view.room.into(),
    }))
}

#[post("/bookings")]
async fn create_booking(
    service: web::Data<BookingService>,
    user: AuthenticatedUser,
    form: web::Json<models::CreateBookingRequest>,
) -> Result<impl Responder, BookingError> {
    if form.room_id < 1 {
        return Err(BookingError::BadRequest);
    }

    let booking = service.create_booking(user.user_id, form.room_id).await?;

    Ok(HttpResponse::Ok().json(models::BookingIdResponse { id: booking.id }))
}

#[put("/bookings/{booking_id}")]
async fn update_booking(
    service: web::Data<BookingService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    form: web::Json<models::CreateBookingRequest>,
) -> Result<impl Responder, BookingError> {
    let raw_booking_id = path.into_inner();

    let re = Regex::new(r"^[0-9]+$").unwrap();
    if raw_booking_id.is_empty() || re.captures(&raw_booking_id).is_none() {
        return Err(BookingError::BadRequest);
    }
    let booking_id: i32 = raw_booking_id
        .parse()
        .map_err(|_| BookingError::BadRequest)?;

    if form.room_id < 1 {
        return Err(BookingError::BadRequest);
    }

    let booking = service
        .update_booking(user.user_id, form.room_id, booking_id)
        .await?;

    Ok(HttpResponse::Ok().json(models::BookingIdResponse { id: booking.id }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // initialize DB pool outside of `HttpServer::new` so that it is shared across all workers
    let pool = initialize_db_pool();
    let service = web::Data::new(BookingService::with_store(Arc::new(PgStore::new(pool))));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("starting HTTP server at http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(middleware::Logger::default())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                // malformed body is a bare 400, same as the in-handler checks
                InternalError::from_response(err, HttpResponse::BadRequest().finish()).into()
            }))
            .service(get_booking)
            .service(create_booking)
            .service(update_booking)
    })
    .bind(bind_addr)?
    .run()
    .await
}

fn initialize_db_pool() -> DbPool {
    let conn_spec = std::env::var("DATABASE_URL").expect("DATABASE_URL should be set");
    let manager = r2d2::ConnectionManager::<PgConnection>::new(conn_spec);
    r2d2::Pool::builder()
        .build(manager)
        .expect("DATABASE_URL should be a valid Postgres connection string")
}
