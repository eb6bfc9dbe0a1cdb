use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use log::{error, info};

use backend::config::Settings;
use backend::ml::loader;
use backend::ml::service::ModelState;
use backend::routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env();

    // A failed load must not take the process down: the API starts anyway
    // and reports itself unavailable until artifacts are present.
    let state = ModelState::empty();
    match loader::load_bundle(&settings.model_dir) {
        Ok(bundle) => state.install(bundle),
        Err(e) => {
            error!("Failed to load model artifacts at startup: {e}");
            error!(
                "Serving in unavailable mode; place artifacts under {} and restart",
                settings.model_dir.display()
            );
        }
    }

    let bind_address = format!("{}:{}", settings.host, settings.port);
    info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
