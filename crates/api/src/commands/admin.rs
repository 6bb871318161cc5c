//! `cache rebuild`.

use tyria_core::card::Reply;

use super::{CommandError, Invocation, NoArgs};
use crate::state::AppState;

/// Start a rebuild in the background; commands answer "unavailable" until
/// it finishes.
pub fn cache_rebuild(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    let rebuilder = state.rebuilder.clone();
    let requested_by = inv.user_id;
    tokio::spawn(async move {
        match rebuilder.rebuild().await {
            Ok(report) => tracing::info!(
                requested_by,
                inserted = report.total_inserted(),
                failed_catalogs = report.failed_catalogs(),
                "Requested rebuild finished"
            ),
            Err(e) => tracing::warn!(requested_by, error = %e, "Requested rebuild refused"),
        }
    });
    Ok(Reply::text(
        "Rebuilding the reference cache. Commands are unavailable until it finishes.",
    ))
}
