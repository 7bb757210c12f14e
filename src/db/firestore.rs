// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Sales funnels (including ROI baseline and latest performance)
//! - Leads (de-duplicated per funnel and email)
//! - Platform connections (encrypted credentials)
//! - Subscriptions and usage records

use crate::db::collections;
use crate::error::AppError;
use crate::models::connection::connection_document_id;
use crate::models::lead::lead_document_id;
use crate::models::{Lead, Platform, PlatformConnection, SalesFunnel, Subscription, UsageRecord, UsageResource};
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{paths, FirestoreTransaction};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator needs no credentials; skip the ADC lookup entirely
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Funnel Operations ───────────────────────────────────────

    pub async fn get_funnel(&self, funnel_id: &str) -> Result<Option<SalesFunnel>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SALES_FUNNELS)
            .obj()
            .one(funnel_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a funnel.
    pub async fn upsert_funnel(&self, funnel: &SalesFunnel) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SALES_FUNNELS)
            .document_id(&funnel.id)
            .object(funnel)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All funnels owned by a user, newest first.
    pub async fn list_funnels_for_user(&self, user_id: u64) -> Result<Vec<SalesFunnel>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SALES_FUNNELS)
            .filter(move |q| q.field("user_id").eq(user_id))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn count_funnels_for_user(&self, user_id: u64) -> Result<u32, AppError> {
        let funnels: Vec<SalesFunnel> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SALES_FUNNELS)
            .filter(move |q| q.field("user_id").eq(user_id))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(funnels.len() as u32)
    }

    /// Atomically add `amount` to a funnel's generated revenue.
    ///
    /// Runs as a Firestore transaction (retried on contention) and writes only
    /// the revenue fields, so a concurrent ROI update is not overwritten.
    /// Returns `false` if the funnel does not exist.
    pub async fn add_funnel_revenue(&self, funnel_id: &str, amount: f64) -> Result<bool, AppError> {
        let funnel_id = funnel_id.to_string();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let funnel_id = funnel_id.clone();
                Box::pin(async move {
                    add_revenue_in_transaction(db, transaction, &funnel_id, amount).await
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Revenue transaction failed: {}", e)))
    }

    // ─── Lead Operations ─────────────────────────────────────────

    pub async fn get_lead(&self, funnel_id: &str, email: &str) -> Result<Option<Lead>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LEADS)
            .obj()
            .one(&lead_document_id(funnel_id, email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record the buyer of an order as a converted customer.
    ///
    /// An existing lead keeps its source, contact details and creation time;
    /// only the order-derived fields change. Runs as a transaction.
    pub async fn record_order_lead(&self, order_lead: &Lead) -> Result<(), AppError> {
        let order_lead = order_lead.clone();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let order_lead = order_lead.clone();
                Box::pin(async move { merge_lead_in_transaction(db, transaction, order_lead).await })
            })
            .await
            .map_err(|e| AppError::Database(format!("Lead transaction failed: {}", e)))
    }

    /// Insert a lead unless one already exists for its funnel and email.
    ///
    /// Returns `true` if the lead was created.
    pub async fn insert_lead_if_absent(&self, lead: &Lead) -> Result<bool, AppError> {
        let result: Result<Lead, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::LEADS)
            .document_id(lead.document_id())
            .object(lead)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Insert many leads, skipping ones that already exist.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    /// Returns the number of leads created.
    pub async fn insert_leads_if_absent(&self, leads: &[Lead]) -> Result<usize, AppError> {
        self.get_client()?;

        let created = stream::iter(leads.to_vec())
            .map(|lead| async move { self.insert_lead_if_absent(&lead).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<bool, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<bool>, AppError>>()?;

        Ok(created.into_iter().filter(|c| *c).count())
    }

    /// Leads for a funnel, highest score first.
    pub async fn list_leads_for_funnel(
        &self,
        funnel_id: &str,
        limit: u32,
    ) -> Result<Vec<Lead>, AppError> {
        let funnel_id = funnel_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LEADS)
            .filter(move |q| q.field("funnel_id").eq(funnel_id.clone()))
            .order_by([("lead_score", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Platform Connection Operations ─────────────────────────

    pub async fn get_connection(
        &self,
        user_id: u64,
        platform: Platform,
    ) -> Result<Option<PlatformConnection>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PLATFORM_CONNECTIONS)
            .obj()
            .one(&connection_document_id(user_id, platform))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn set_connection(&self, connection: &PlatformConnection) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PLATFORM_CONNECTIONS)
            .document_id(connection.document_id())
            .object(connection)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Subscription & Usage Operations ────────────────────────

    pub async fn get_subscription(&self, user_id: u64) -> Result<Option<Subscription>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTIONS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn set_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTIONS)
            .document_id(subscription.user_id.to_string())
            .object(subscription)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Append a usage record under a fresh ID.
    pub async fn record_usage(&self, record: &UsageRecord) -> Result<(), AppError> {
        let doc_id = uuid::Uuid::new_v4().to_string();
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USAGE_RECORDS)
            .document_id(&doc_id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count a user's usage of `resource` recorded at or after `since` (RFC3339).
    pub async fn count_usage_since(
        &self,
        user_id: u64,
        resource: UsageResource,
        since: &str,
    ) -> Result<u32, AppError> {
        let since = since.to_string();
        let records: Vec<UsageRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USAGE_RECORDS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("resource").eq(resource.as_str()),
                    q.field("recorded_at").greater_than_or_equal(since.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(records.len() as u32)
    }
}

// Transaction bodies. The `db` handed out by `run_transaction` reads inside
// the transaction, so these reads take part in conflict detection.

async fn add_revenue_in_transaction(
    db: firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    funnel_id: &str,
    amount: f64,
) -> Result<bool, BackoffError<FirestoreError>> {
    let funnel: Option<SalesFunnel> = db
        .fluent()
        .select()
        .by_id_in(collections::SALES_FUNNELS)
        .obj()
        .one(funnel_id)
        .await?;

    let Some(mut funnel) = funnel else {
        return Ok(false);
    };

    funnel.generated_revenue += amount;
    funnel.updated_at = chrono::Utc::now().to_rfc3339();

    db.fluent()
        .update()
        .fields(paths!(SalesFunnel::{generated_revenue, updated_at}))
        .in_col(collections::SALES_FUNNELS)
        .document_id(funnel_id)
        .object(&funnel)
        .add_to_transaction(transaction)?;

    Ok(true)
}

async fn merge_lead_in_transaction(
    db: firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    order_lead: Lead,
) -> Result<(), BackoffError<FirestoreError>> {
    let doc_id = order_lead.document_id();
    let existing: Option<Lead> = db
        .fluent()
        .select()
        .by_id_in(collections::LEADS)
        .obj()
        .one(&doc_id)
        .await?;

    let lead = match existing {
        Some(mut lead) => {
            lead.absorb_order(order_lead);
            lead
        }
        None => order_lead,
    };

    db.fluent()
        .update()
        .in_col(collections::LEADS)
        .document_id(&doc_id)
        .object(&lead)
        .add_to_transaction(transaction)?;

    Ok(())
}
