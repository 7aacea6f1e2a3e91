use actix_multipart::form::{bytes::Bytes, text::Text, MultipartForm};
use actix_session::Session;
use actix_web::{get, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::info;

use crate::models::{NewSubmission, SubmissionStatus, TaskId};
use crate::storage::Storage;
use crate::util::api_util::*;

#[derive(MultipartForm)]
pub struct SubmitForm {
    #[multipart(rename = "taskId")]
    task_id: Option<Text<String>>,
    code: Option<Bytes>,
}

impl SubmitForm {
    /// Checks the form before anything is stored.
    fn validate(self) -> Result<(TaskId, String), APIError> {
        let task_id = self
            .task_id
            .and_then(|text| text.trim().parse::<TaskId>().ok())
            .ok_or(APIError::InvalidTaskId)?;

        // A plain `code` field without a filename is not an uploaded file.
        let file = self
            .code
            .filter(|file| file.file_name.is_some())
            .ok_or(APIError::MissingCodeFile)?;

        Ok((task_id, String::from_utf8_lossy(&file.data).into_owned()))
    }
}

// [[API]]
// desp: Submissions of the logged in user, oldest first.
// Method: GET
// URL: /submissions
// Response Body: `Vec<Submission>`
#[get("/submissions")]
pub async fn list_submissions(
    storage: web::Data<dyn Storage>,
    session: Session,
) -> Result<impl Responder, APIError> {
    let user = require_user(&session, storage.get_ref())?;
    Ok(HttpResponse::Ok().json(storage.get_submissions(Some(user.id))))
}

// [[API]]
// desp: Upload a code file for a task. Every submission is accepted.
// Method: POST
// URL: /submit
// Request Body: multipart form, `taskId` and file field `code`
// Response Body: `Submission`
//
// The body is only read once the session resolves to a user.
#[post("/submit")]
pub async fn submit(
    storage: web::Data<dyn Storage>,
    req: HttpRequest,
    payload: web::Payload,
    session: Session,
) -> Result<impl Responder, APIError> {
    let user = require_user(&session, storage.get_ref())?;

    let mut payload = payload.into_inner();
    let (task_id, code) = MultipartForm::<SubmitForm>::from_request(&req, &mut payload)
        .await
        .map_err(|_| APIError::MalformedUpload)?
        .into_inner()
        .validate()?;

    let submission = storage.create_submission(NewSubmission {
        user_id: user.id,
        task_id,
        code,
        status: SubmissionStatus::Accepted,
        submitted_at: Utc::now(),
    });
    info!(
        "Submission {} by user {} for task {}",
        submission.id, user.id, task_id
    );

    Ok(HttpResponse::Ok().json(submission))
}
