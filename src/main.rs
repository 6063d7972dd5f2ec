use crate::app::App;
use crate::config::read_config;
use crate::db::{init_db, Database, SqliteListingStore};
use crate::media::{CloudinaryMediaStore, MediaStore, MemoryMediaStore};
use astra::Server;
use std::net::SocketAddr;
use std::sync::Arc;

mod app;
mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod handlers;
mod logger;
mod media;
mod responses;
mod router;
mod search;
mod seed;


fn main() {
    let config = read_config();

    if let Err(e) = logger::setup_logger(&config.log_level) {
        eprintln!("Logger initialization failed: {e}");
        std::process::exit(1);
    }

    let db = Database::new(config.db_path.clone());
    if let Err(e) = init_db(&db) {
        log::error!("Database initialization failed: {e}");
        std::process::exit(1);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("seed") {
        let path = args.get(1).map(String::as_str).unwrap_or(seed::DEFAULT_SEED_PATH);
        let store = SqliteListingStore::new(db.clone());
        if let Err(e) = seed::run(&db, &store, path) {
            log::error!("Seeding failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    let media: Arc<dyn MediaStore> = match config.cloudinary.clone() {
        Some(cloudinary) => match CloudinaryMediaStore::new(cloudinary) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::error!("Media store initialization failed: {e}");
                std::process::exit(1);
            }
        },
        None => {
            log::warn!("no media host credentials configured, images are kept in memory");
            Arc::new(MemoryMediaStore::new())
        }
    };

    let addr: SocketAddr = match config.bind_address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            log::error!("Invalid bind address {}: {e}", config.bind_address);
            std::process::exit(1);
        }
    };

    let app = App::new(db, media, &config);
    log::info!("Starting server at http://{addr}");

    let server = Server::bind(&addr).max_workers(config.max_workers);
    let result = server.serve(move |req, _info| router::respond(req, &app));

    if let Err(e) = result {
        log::error!("Server ended with error: {e}");
    }

    log::info!("Server shut down cleanly.");
}
