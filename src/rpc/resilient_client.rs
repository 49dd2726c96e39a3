// DANS : src/rpc/resilient_client.rs

use anyhow::{Context, Result};
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_client::GetConfirmedSignaturesForAddress2Config,
    rpc_config::RpcTransactionConfig,
    rpc_response::RpcConfirmedTransactionStatusWithSignature,
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature,
};
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::warn;

/// Un "wrapper" autour du RpcClient de Solana qui ajoute une logique de
/// ré-essai automatique pour les appels RPC qui échouent à cause d'erreurs réseau temporaires.
/// Un ré-essai rejoue exactement la même requête (même curseur de pagination).
#[derive(Clone)]
pub struct ResilientRpcClient {
    client: Arc<RpcClient>,
    max_retries: u8,
    delay_ms: u64,
}

impl ResilientRpcClient {
    /// Construit un nouveau client RPC résilient (commitment `confirmed`).
    pub fn new(rpc_url: String, max_retries: u8, delay_ms: u64) -> Self {
        Self {
            client: Arc::new(RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed())),
            max_retries,
            delay_ms,
        }
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.client.commitment()
    }

    /// Détermine si une erreur du client est temporaire et si une nouvelle tentative doit être effectuée.
    fn is_retryable(error: &ClientError) -> bool {
        matches!(
            error.kind,
            ClientErrorKind::Reqwest(_) | ClientErrorKind::RpcError(_) | ClientErrorKind::Io(_)
        )
    }

    async fn pause_before_retry(&self, method: &str, attempt: u8, error: &ClientError) {
        warn!(
            method,
            attempt = attempt + 1,
            max_retries = self.max_retries,
            error = %error,
            "[RPC] Erreur temporaire, nouvelle tentative."
        );
        sleep(Duration::from_millis(self.delay_ms)).await;
    }

    // --- MÉTHODES WRAPPÉES AVEC LOGIQUE DE RÉ-ESSAI ---

    /// Une page de signatures pour une adresse, de la plus récente à la plus ancienne,
    /// en partant de `before` (exclu).
    pub async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<RpcConfirmedTransactionStatusWithSignature>> {
        for attempt in 0..=self.max_retries {
            let config = GetConfirmedSignaturesForAddress2Config {
                before,
                until: None,
                limit: Some(limit),
                commitment: Some(self.commitment()),
            };
            match self.client.get_signatures_for_address_with_config(address, config).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    if Self::is_retryable(&e) && attempt < self.max_retries {
                        self.pause_before_retry("getSignaturesForAddress", attempt, &e).await;
                    } else {
                        return Err(e).with_context(|| format!("Échec final de get_signatures_for_address pour {}", address));
                    }
                }
            }
        }
        unreachable!()
    }

    /// Récupère une transaction encodée en JSON (transactions v0 acceptées).
    pub async fn get_transaction(&self, signature: &Signature) -> Result<EncodedConfirmedTransactionWithStatusMeta> {
        for attempt in 0..=self.max_retries {
            let config = RpcTransactionConfig {
                encoding: Some(UiTransactionEncoding::Json),
                commitment: Some(self.commitment()),
                max_supported_transaction_version: Some(0),
            };
            match self.client.get_transaction_with_config(signature, config).await {
                Ok(transaction) => return Ok(transaction),
                Err(e) => {
                    if Self::is_retryable(&e) && attempt < self.max_retries {
                        self.pause_before_retry("getTransaction", attempt, &e).await;
                    } else {
                        return Err(e).with_context(|| format!("Échec final de get_transaction pour {}", signature));
                    }
                }
            }
        }
        unreachable!()
    }

    /// Récupère plusieurs comptes.
    pub async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> Result<Vec<Option<Account>>> {
        for attempt in 0..=self.max_retries {
            match self.client.get_multiple_accounts(pubkeys).await {
                Ok(accounts) => return Ok(accounts),
                Err(e) => {
                    if Self::is_retryable(&e) && attempt < self.max_retries {
                        self.pause_before_retry("getMultipleAccounts", attempt, &e).await;
                    } else {
                        return Err(e).with_context(|| "Échec final de get_multiple_accounts");
                    }
                }
            }
        }
        unreachable!()
    }
}
