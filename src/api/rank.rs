use actix_web::{get, web, HttpResponse, Responder};
use log::debug;

use crate::storage::Storage;
use crate::util::leaderboard::rank_with_names;

// [[API]]
// desp: Participants ordered by accepted points, recomputed on every call.
// Method: GET
// URL: /leaderboard
// Response Body: `Vec<LeaderboardEntry>`
#[get("/leaderboard")]
pub async fn leaderboard(storage: web::Data<dyn Storage>) -> impl Responder {
    let submissions = storage.get_submissions(None);
    let tasks = storage.get_tasks();

    let board = rank_with_names(&submissions, &tasks, |user_id| {
        storage.get_user(user_id).map(|user| user.username)
    });
    debug!(
        "Leaderboard over {} submissions: {} entries",
        submissions.len(),
        board.len()
    );

    HttpResponse::Ok().json(board)
}
