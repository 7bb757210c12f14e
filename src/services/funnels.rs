// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Funnel ownership lookup shared by the funnel, ROI and import paths.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::SalesFunnel;

/// Fetch a funnel the user owns.
///
/// Funnels owned by someone else are reported as missing so their IDs
/// cannot be discovered.
pub async fn owned_funnel(
    db: &FirestoreDb,
    user_id: u64,
    funnel_id: &str,
) -> Result<SalesFunnel, AppError> {
    match db.get_funnel(funnel_id).await? {
        Some(funnel) if funnel.is_owned_by(user_id) => Ok(funnel),
        Some(_) => {
            tracing::warn!(user_id, funnel_id, "Funnel access denied: not owner");
            Err(AppError::NotFound(format!("Funnel {}", funnel_id)))
        }
        None => Err(AppError::NotFound(format!("Funnel {}", funnel_id))),
    }
}
