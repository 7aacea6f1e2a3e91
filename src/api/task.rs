use actix_web::{get, web, HttpResponse, Responder};

use crate::storage::Storage;

// [[API]]
// desp: All tasks of the contest.
// Method: GET
// URL: /tasks
// Response Body: `Vec<Task>`
#[get("/tasks")]
pub async fn list_tasks(storage: web::Data<dyn Storage>) -> impl Responder {
    HttpResponse::Ok().json(storage.get_tasks())
}
