use crate::vestibule::auth::{RequireAdmin, SessionUser};
use axum::response::{IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin landing for the signed-in admin", body = SessionUser),
        (status = 302, description = "No valid session; redirect to the login page"),
        (status = 404, description = "Signed in but not an admin")
    ),
    tag = "admin"
)]
pub async fn landing(admin: RequireAdmin) -> impl IntoResponse {
    (admin.jar, Json(admin.user))
}
