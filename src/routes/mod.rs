use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::error::AppError;
use crate::handlers::{
    admin, bookings, documents, drivers, health, hotels, promos, tour_guides, uploads, users,
    vehicles,
};
use crate::middleware::auth::{
    auth_middleware, optional_auth, require_admin, require_driver, require_tour_guide,
    require_traveler,
};
use crate::middleware::errors::expose_error_detail;
use crate::middleware::role_rate_limit::{create_user_governor, RateLimitedRoute};
use crate::storage::UploadCategory;
use crate::AppState;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn create_router(state: AppState) -> Router {
    let auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);
    let optional = || middleware::from_fn_with_state(state.clone(), optional_auth);

    let user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .merge(
            Router::new()
                .route("/profile", get(users::get_profile).put(users::update_profile))
                .route_layer(auth()),
        );

    // Catalogs: browsing is public, detail pages recognise their owner,
    // everything else needs a token.
    let vehicle_routes = Router::new()
        .route("/", get(vehicles::list_vehicles))
        .route("/available", get(vehicles::list_available_vehicles))
        .route("/{id}", get(vehicles::get_vehicle).route_layer(optional()))
        .merge(
            Router::new()
                .route("/mine", get(vehicles::my_vehicles))
                .route("/", post(vehicles::create_vehicle))
                .route("/{id}", put(vehicles::update_vehicle).delete(vehicles::delete_vehicle))
                .route_layer(auth()),
        );

    let hotel_routes = Router::new()
        .route("/", get(hotels::list_hotels))
        .route("/available", get(hotels::list_available_hotels))
        .route("/{id}", get(hotels::get_hotel).route_layer(optional()))
        .merge(
            Router::new()
                .route("/mine", get(hotels::my_hotels))
                .route("/", post(hotels::create_hotel))
                .route("/{id}", put(hotels::update_hotel).delete(hotels::delete_hotel))
                .route_layer(auth()),
        );

    let driver_routes = Router::new()
        .route("/", get(drivers::list_drivers))
        .route("/available", get(drivers::list_available_drivers))
        .route("/{id}", get(drivers::get_driver).route_layer(optional()))
        .merge(
            Router::new()
                .route("/mine", get(drivers::my_driver_profile))
                .route("/", post(drivers::create_driver_profile))
                .route(
                    "/{id}",
                    put(drivers::update_driver_profile).delete(drivers::delete_driver_profile),
                )
                .route_layer(auth()),
        );

    let tour_guide_routes = Router::new()
        .route("/", get(tour_guides::list_tour_guides))
        .route("/available", get(tour_guides::list_available_tour_guides))
        .route("/{id}", get(tour_guides::get_tour_guide).route_layer(optional()))
        .merge(
            Router::new()
                .route("/mine", get(tour_guides::my_tour_guide_profile))
                .route("/", post(tour_guides::create_tour_guide_profile))
                .route(
                    "/{id}",
                    put(tour_guides::update_tour_guide_profile)
                        .delete(tour_guides::delete_tour_guide_profile),
                )
                .route_layer(auth()),
        );

    // Per-user limiter sits inside auth so the claims are already attached.
    let booking_routes = Router::new()
        .route("/", get(bookings::list_bookings))
        .route(
            "/",
            post(bookings::create_booking).route_layer(middleware::from_fn(require_traveler)),
        )
        .route("/{id}", get(bookings::get_booking).delete(bookings::delete_booking))
        .route("/{id}/accept", put(bookings::accept_booking))
        .route("/{id}/reject", put(bookings::reject_booking))
        .route("/{id}/cancel", put(bookings::cancel_booking))
        .route("/{id}/complete", put(bookings::complete_booking))
        .route_layer(create_user_governor(RateLimitedRoute::Booking))
        .route_layer(auth());

    let upload_routes = Router::new()
        .route(
            "/driver/photo",
            post(uploads::upload_driver_photo).route_layer(middleware::from_fn(require_driver)),
        )
        .route(
            "/tour-guide/photo",
            post(uploads::upload_tour_guide_photo)
                .route_layer(middleware::from_fn(require_tour_guide)),
        )
        .route("/hotel/photo", post(uploads::upload_hotel_photo))
        .route("/vehicle/photo", post(uploads::upload_vehicle_photo))
        .route(
            "/driver/license",
            post(uploads::upload_license).route_layer(middleware::from_fn(require_driver)),
        )
        .route("/nid", post(uploads::upload_nid))
        .route_layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + MULTIPART_OVERHEAD,
        ))
        .route_layer(create_user_governor(RateLimitedRoute::Upload))
        .route_layer(auth());

    let document_routes = Router::new()
        .route("/mine", get(documents::my_documents))
        .route("/approved", get(documents::check_approved))
        .route("/{id}/file", get(documents::document_file))
        .route_layer(auth());

    let promo_routes = Router::new().route("/validate", post(promos::validate_promo));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/bookings", get(admin::list_all_bookings))
        .route("/documents", get(documents::list_documents))
        .route("/documents/{id}/status", put(documents::review_document))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(auth());

    // Photos are public; identity documents go through `/api/documents/{id}/file`.
    let public_files = UploadCategory::PUBLIC
        .iter()
        .fold(Router::<AppState>::new(), |router, category| {
            router.nest_service(
                &format!("/uploads/{}", category.dir()),
                ServeDir::new(state.storage.dir(*category)),
            )
        });

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/users", user_routes)
        .nest("/api/vehicles", vehicle_routes)
        .nest("/api/hotels", hotel_routes)
        .nest("/api/drivers", driver_routes)
        .nest("/api/tour-guides", tour_guide_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/uploads", upload_routes)
        .nest("/api/documents", document_routes)
        .nest("/api/promos", promo_routes)
        .nest("/api/admin", admin_routes)
        .merge(public_files)
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), expose_error_detail))
        .with_state(state)
}
