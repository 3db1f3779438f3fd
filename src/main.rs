//! geo-distance CLI entry point
//!
//! Distance ranking against a geocoded address - CLI + web API

use geo_distance::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
