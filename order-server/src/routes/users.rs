use axum::Json;
use models::User;

use crate::auth::CurrentUser;

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
