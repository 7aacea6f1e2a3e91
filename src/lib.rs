pub mod api;
pub mod config;
pub mod util;

pub mod models;
pub mod storage;

use actix_multipart::form::MultipartFormConfig;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, web};

use config::Config;

use api::{rank, register, submission, task};

/// Registers every route of the portal.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register::register_user)
        .service(register::login_user)
        .service(register::logout_user)
        .service(register::get_user)
        .service(task::list_tasks)
        .service(submission::list_submissions)
        .service(submission::submit)
        .service(rank::leaderboard);
}

pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(secure)
        .cookie_same_site(actix_web::cookie::SameSite::None)
        .build()
}

/// Caps the whole `/submit` body at `MAX_UPLOAD_BYTES`.
pub fn multipart_config(config: &Config) -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(config.max_upload_bytes)
        .memory_limit(config.max_upload_bytes)
}

pub trait Ext<R>: Sized {
    fn tap(self, f: impl FnOnce(&Self) -> R) -> Self {
        f(&self);
        self
    }
}

impl<T, R> Ext<R> for T {}
