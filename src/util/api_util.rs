use actix_session::Session;
use actix_web::{error, http::StatusCode, HttpResponse};
use derive_more::Display;
use log::{error, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{User, UserId},
    storage::Storage,
    Ext,
};

pub trait APIRequest: Sized {
    fn ok(&self) -> bool;
    fn sanity(&self) -> Result<(), APIError> {
        if self.ok() {
            Ok(())
        } else {
            Err(APIError::InvalidFormData)
        }
    }
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum APIError {
    #[display("Invalid form data")]
    InvalidFormData,

    #[display("Invalid task id")]
    InvalidTaskId,

    #[display("No code file uploaded")]
    MissingCodeFile,

    #[display("Malformed upload")]
    MalformedUpload,

    #[display("Username already exists")]
    UsernameTaken,

    #[display("Wrong username or password")]
    WrongCredentials,

    #[display("Invalid session")]
    InvalidSession,

    #[display("Not logged in")]
    NotLogin,

    #[display("Server error at {location}, ref[{refnum}]: {msg}")]
    ServerError {
        location: &'static str,
        msg: &'static str,
        refnum: Uuid,
    },
}

impl APIError {
    pub fn set_location(self, location: &'static str) -> Self {
        match self {
            APIError::ServerError {
                location: _,
                msg,
                refnum,
            } => APIError::ServerError {
                location,
                msg,
                refnum,
            },
            _ => self,
        }
    }

    pub fn log(&self) {
        if let APIError::ServerError {
            location,
            msg,
            refnum,
        } = self
        {
            error!("Server error at {location}, ref[{refnum}]: {msg}");
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl error::ResponseError for APIError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            APIError::NotLogin | APIError::InvalidSession | APIError::WrongCredentials => {
                StatusCode::UNAUTHORIZED
            }
            APIError::ServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Marks `session` as belonging to `user`, dropping whatever it held before.
pub fn set_loggedin_session(
    session: &Session,
    user: &User,
    storage: &dyn Storage,
    location: &'static str,
) -> Result<(), APIError> {
    session.clear();
    session
        .insert(SESSION_USER_ID, user.id)
        .map_err(|e| log_server_error(e, location, ERROR_SESSION_INSERT))?;
    session
        .insert(SESSION_INSTANCE, storage.instance_id())
        .map_err(|e| log_server_error(e, location, ERROR_SESSION_INSERT))?;
    session.renew();
    Ok(())
}

/// Resolves the logged-in user, clearing sessions that no longer match the store.
///
/// A cookie can outlive the process that issued it; the instance id check
/// keeps it from landing on a different user with a reused id.
pub fn require_user(session: &Session, storage: &dyn Storage) -> Result<User, APIError> {
    let Ok(Some(user_id)) = session.get::<UserId>(SESSION_USER_ID) else {
        return Err(APIError::NotLogin);
    };

    let same_instance = session
        .get::<Uuid>(SESSION_INSTANCE)
        .ok()
        .flatten()
        .is_some_and(|instance| instance == storage.instance_id());

    same_instance
        .then(|| storage.get_user(user_id))
        .flatten()
        .ok_or(APIError::InvalidSession)
        .inspect_err(|_| warn!("Dropping stale session of user {user_id}"))
        .inspect_err(kill_session(session))
}

pub fn log_server_error<E>(error: E, location: &'static str, msg: &'static str) -> APIError
where
    E: std::fmt::Display,
{
    new_unlocated_server_error(error, msg)
        .set_location(location)
        .tap(APIError::log)
}

pub fn new_unlocated_server_error<E>(error: E, msg: &'static str) -> APIError
where
    E: std::fmt::Display,
{
    let refnum = Uuid::new_v4();
    error!("Error [{refnum}]: {error}");
    APIError::ServerError {
        location: LOCATION_UNKNOWN,
        msg,
        refnum,
    }
}

pub fn kill_session(session: &Session) -> impl FnMut(&APIError) + '_ {
    |result| {
        if result == &APIError::InvalidSession {
            session.clear()
        };
    }
}

pub static SESSION_USER_ID: &str = "user_id";
pub static SESSION_INSTANCE: &str = "store_instance";

pub static ERROR_SESSION_INSERT: &str = "session_setting_failed";

pub static LOCATION_UNKNOWN: &str = "[unknown]";
