//! Rank command handler
//!
//! Ranks record ids for a configured field against the store described by
//! the config (dataset file and coordinate cache).

use crate::cli::{parse_key_value, print_with};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::field::RecordId;
use crate::format::RankingReport;
use crate::request::RequestParams;
use crate::server::state::AppState;
use crate::store::SortDirection;
use clap::Args;
use std::collections::HashMap;

/// Rank command arguments
#[derive(Args)]
pub struct RankArgs {
    /// Field id from the config
    #[arg(long, short = 'f')]
    pub field: String,

    /// Record ids, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub ids: Vec<RecordId>,

    /// Sort direction: asc or desc
    #[arg(long, short = 'd', default_value = "asc")]
    pub direction: SortDirection,

    /// GET parameter (name=value), repeatable
    #[arg(long, value_parser = parse_key_value)]
    pub get: Vec<(String, String)>,

    /// POST parameter (name=value), repeatable
    #[arg(long, value_parser = parse_key_value)]
    pub post: Vec<(String, String)>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Run the rank command
pub async fn run(args: RankArgs, config: Config) -> Result<()> {
    let state = tokio::task::spawn_blocking(move || AppState::from_config(config))
        .await
        .map_err(|e| Error::Server(format!("Failed to open stores: {}", e)))??;

    let engine = state
        .engine(&args.field)
        .await
        .ok_or_else(|| Error::Config(format!("Unknown field: {}", args.field)))?;

    let request = RequestParams::from_maps(
        args.get.into_iter().collect::<HashMap<_, _>>(),
        args.post.into_iter().collect::<HashMap<_, _>>(),
    );
    let candidates = args.ids;
    let direction = args.direction;

    let (ids, distances) = tokio::task::spawn_blocking(move || {
        let ids = engine.sort_ids(&candidates, direction, &request);
        let distances = engine.get_data_for(&ids, &request);
        (ids, distances)
    })
    .await
    .map_err(|e| Error::Server(format!("Ranking task failed: {}", e)))?;

    let report = RankingReport {
        field: args.field,
        direction,
        ids,
        distances,
    };
    print_with(&args.format, |f| f.format_ranking(&report))
}
