use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use log::{info, warn};
use portal::config::Config;
use portal::storage::{MemStorage, Storage};
use portal::util::cipher_util;

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = Config::from_env().map_err(std::io::Error::other)?;

    if !config.production {
        warn!("Under development mode.");
    }

    let storage: Arc<dyn Storage> = if config.seed_tasks {
        Arc::new(MemStorage::with_sample_tasks())
    } else {
        Arc::new(MemStorage::default())
    };
    info!("Serving {} tasks", storage.get_tasks().len());

    let secret_key = cipher_util::gen_cookie_key(&config.cookie_token);
    let bind_addr = config.bind_addr.clone();
    let config = web::Data::new(config);
    let storage = web::Data::from(storage);

    info!("Listening on {bind_addr}");
    HttpServer::new(move || {
        let origins = config.allowed_origins.clone();
        App::new()
            .app_data(storage.clone())
            .app_data(config.clone())
            .app_data(portal::multipart_config(&config))
            .wrap(
                Cors::default()
                    .allowed_origin_fn(move |origin, _| {
                        origin
                            .to_str()
                            .is_ok_and(|origin| origins.iter().any(|allowed| allowed == origin))
                    })
                    .allow_any_header()
                    .allow_any_method()
                    .supports_credentials(),
            )
            .wrap(portal::session_middleware(
                secret_key.clone(),
                config.production,
            ))
            .wrap(Logger::default())
            .configure(portal::routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
