// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed user operations.
//!
//! Layout:
//! - `users/{id}`: the full user record, session included
//! - `user_names/{hex(lowercase name)}`: `{ user_id }`, created in the same
//!   transaction as the user document so that a create-only insert
//!   arbitrates name uniqueness

use crate::db::collections;
use crate::error::AppError;
use crate::models::user::normalize_user_name;
use crate::models::{NewUser, Session, User};
use firestore::FirestoreConsistencySelector;
use ring::rand::{self, SystemRandom};
use serde::{Deserialize, Serialize};

/// Attempts at picking an unused random user id before giving up.
const MAX_ID_ATTEMPTS: usize = 3;

/// Largest id that survives a round trip through a JSON number.
const MAX_USER_ID: u64 = (1 << 53) - 1;

/// Body of a `user_names` index document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserNameIndex {
    user_id: i64,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
    rng: SystemRandom,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client,
            rng: SystemRandom::new(),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

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

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client,
            rng: SystemRandom::new(),
        })
    }

    // ─── Reads ───────────────────────────────────────────────────

    /// Get a user by numeric ID.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user through the lowercased-name index.
    pub async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, AppError> {
        match self.name_index(&name_doc_id(user_name)).await? {
            Some(index) => self.get_user(index.user_id).await,
            None => Ok(None),
        }
    }

    // ─── Writes ──────────────────────────────────────────────────

    /// Create a user under a fresh random ID.
    ///
    /// The name index document and the user document are inserted in one
    /// transaction. Both inserts are create-only, so a taken name or a
    /// colliding id fails the commit and neither document is written.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let name_id = name_doc_id(&new_user.user_name);

        for _ in 0..MAX_ID_ATTEMPTS {
            let user = User {
                id: self.random_user_id()?,
                user_name: new_user.user_name.clone(),
                password_hash: new_user.password_hash.clone(),
                password_salt: new_user.password_salt.clone(),
                session: None,
                created_at: chrono::Utc::now(),
            };
            let index = UserNameIndex { user_id: user.id };

            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            self.client
                .fluent()
                .insert()
                .into(collections::USER_NAMES)
                .document_id(&name_id)
                .object(&index)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add name index to transaction: {}", e))
                })?;

            self.client
                .fluent()
                .insert()
                .into(collections::USERS)
                .document_id(user.id.to_string())
                .object(&user)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add user to transaction: {}", e))
                })?;

            let err = match transaction.commit().await {
                Ok(_) => {
                    tracing::debug!(user_id = user.id, "User document created");
                    return Ok(user);
                }
                Err(e) => e,
            };

            // The commit says which precondition failed only in its message,
            // so look at what is stored now.
            if self.name_index(&name_id).await?.is_some() {
                return Err(AppError::UserAlreadyExists);
            }
            if self.get_user(user.id).await?.is_none() {
                return Err(AppError::Database(format!(
                    "Transaction commit failed: {}",
                    err
                )));
            }
            tracing::warn!(user_id = user.id, "User id collision, retrying");
        }

        Err(AppError::Database(
            "Could not allocate a unique user id".to_string(),
        ))
    }

    /// Overwrite the user's session if the stored refresh token still
    /// matches `expected_token`.
    ///
    /// The read is made inside the transaction, so a rotation committed by
    /// someone else between our read and our commit aborts the commit.
    pub async fn replace_session(
        &self,
        user_id: i64,
        expected_token: Option<&str>,
        session: &Session,
    ) -> Result<(), AppError> {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Read the current record within the transaction
        let tx_client = self.client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );
        let current: Option<User> = match tx_client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
        {
            Ok(current) => current,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(AppError::Database(e.to_string()));
            }
        };
        let mut user = match current {
            Some(user) => user,
            None => {
                let _ = transaction.rollback().await;
                return Err(AppError::UserNotFound);
            }
        };

        // 2. Compare against what the caller read
        if user.refresh_token() != expected_token {
            tracing::warn!(user_id, "Refresh token changed since read, aborting rotation");
            let _ = transaction.rollback().await;
            return Err(AppError::ConcurrentRefresh);
        }

        // 3. Write the new session over the record read in step 1
        user.session = Some(session.clone());
        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id.to_string())
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add session to transaction: {}", e))
            })?;

        if let Err(e) = transaction.commit().await {
            // An aborted commit after a competing rotation is a lost race
            let stored = self.get_user(user_id).await?;
            if stored.as_ref().and_then(User::refresh_token) != expected_token {
                tracing::warn!(user_id, "Concurrent rotation won, commit aborted");
                return Err(AppError::ConcurrentRefresh);
            }
            return Err(AppError::Database(format!(
                "Transaction commit failed: {}",
                e
            )));
        }

        Ok(())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    async fn name_index(&self, name_id: &str) -> Result<Option<UserNameIndex>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USER_NAMES)
            .obj()
            .one(name_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A positive random id in `1..=MAX_USER_ID`.
    fn random_user_id(&self) -> Result<i64, AppError> {
        let bytes: [u8; 8] = rand::generate(&self.rng)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?
            .expose();
        let id = u64::from_le_bytes(bytes) & MAX_USER_ID;
        Ok(id.max(1) as i64)
    }
}

/// Document id for a username in the name index.
///
/// Hex keeps arbitrary usernames (slashes, dots) valid as document ids.
fn name_doc_id(user_name: &str) -> String {
    hex::encode(normalize_user_name(user_name))
}
