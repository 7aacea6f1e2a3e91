use actix_web::{get, post, web, HttpResponse, Responder};
use log::{info, warn};
use serde::Deserialize;

use crate::config::Config;
use crate::models::{NewUser, UserInfo};
use crate::storage::Storage;
use crate::util::api_util::*;
use crate::util::cipher_util;

use actix_session::Session;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    // Max 100.
    username: String,
    password: String,
}

impl APIRequest for RegisterRequest {
    fn ok(&self) -> bool {
        let name = self.username.chars().count();
        let password = self.password.chars().count();
        (1..=100).contains(&name) && (1..=128).contains(&password)
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

impl APIRequest for LoginRequest {
    fn ok(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

// [[API]]
// desp: Create an account and log in as it.
// Method: POST
// URL: /register
// Request Body: `RegisterRequest`
// Response Body: `UserInfo`, 201
//
#[post("/register")]
pub async fn register_user(
    storage: web::Data<dyn Storage>,
    config: web::Data<Config>,
    form: web::Json<RegisterRequest>,
    session: Session,
) -> Result<impl Responder, APIError> {
    let location = "register";
    form.sanity()?;

    let (salt, password) = cipher_util::gen_salted_password(&form.password, &config.login_token);
    let user = storage
        .create_user_if_absent(NewUser {
            username: form.username.clone(),
            password,
            salt,
        })
        .ok_or(APIError::UsernameTaken)?;

    set_loggedin_session(&session, &user, storage.get_ref(), location)?;
    info!("Registered user {} ({})", user.id, user.username);

    Ok(HttpResponse::Created().json(UserInfo::from(&user)))
}

// [[API]]
// desp: Login with password.
// Method: POST
// URL: /login
// Request Body: `LoginRequest`
// Response Body: `UserInfo`
//
#[post("/login")]
pub async fn login_user(
    storage: web::Data<dyn Storage>,
    config: web::Data<Config>,
    form: web::Json<LoginRequest>,
    session: Session,
) -> Result<impl Responder, APIError> {
    let location = "login";
    form.sanity()?;

    let user = storage
        .get_user_by_username(&form.username)
        .filter(|user| {
            cipher_util::check_salted_password(user, &form.password, &config.login_token)
                .is_some()
        })
        .ok_or(APIError::WrongCredentials)
        .inspect_err(|_| warn!("Failed login for {:?}", form.username))?;

    set_loggedin_session(&session, &user, storage.get_ref(), location)?;
    info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(UserInfo::from(&user)))
}

#[post("/logout")]
pub async fn logout_user(session: Session) -> impl Responder {
    session.purge();
    HttpResponse::Ok().finish()
}

#[get("/user")]
pub async fn get_user(
    storage: web::Data<dyn Storage>,
    session: Session,
) -> Result<impl Responder, APIError> {
    let user = require_user(&session, storage.get_ref())?;
    Ok(HttpResponse::Ok().json(UserInfo::from(&user)))
}
