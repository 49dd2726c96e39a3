// src/decoders/transaction.rs

use super::DecodeError;
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;

/// Une instruction telle que livrée par le RPC, avec ses index de comptes
/// déjà résolus en adresses. `data` reste dans son encodage filaire (base58).
#[derive(Debug, Clone, PartialEq)]
pub struct RawInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<Pubkey>,
    pub data: String,
}

impl RawInstruction {
    /// Construit une instruction à partir d'un payload binaire brut.
    pub fn with_payload(program_id: Pubkey, accounts: Vec<Pubkey>, payload: &[u8]) -> Self {
        Self {
            program_id,
            accounts,
            data: bs58::encode(payload).into_string(),
        }
    }
}

/// Une entrée du snapshot `postTokenBalances`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalance {
    pub account_index: usize,
    pub mint: Pubkey,
    pub decimals: u8,
    /// Montant déjà ajusté par les décimales.
    pub ui_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTransaction {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub signature: String,
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<RawInstruction>,
    /// Index de l'instruction top-level -> ses inner instructions, dans l'ordre d'exécution.
    pub inner_instructions: BTreeMap<usize, Vec<RawInstruction>>,
    pub post_token_balances: Vec<TokenBalance>,
}

/// Vue empruntée d'une instruction dans la séquence aplatie.
/// Elle n'a pas d'identité propre en dehors de sa position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatInstruction<'a> {
    pub program_id: &'a Pubkey,
    pub accounts: &'a [Pubkey],
    pub data: &'a str,
}

impl<'a> From<&'a RawInstruction> for FlatInstruction<'a> {
    fn from(ix: &'a RawInstruction) -> Self {
        Self {
            program_id: &ix.program_id,
            accounts: &ix.accounts,
            data: &ix.data,
        }
    }
}

impl FlatInstruction<'_> {
    /// Décode `data` depuis le base58 vers les octets bruts.
    pub fn payload(&self) -> Result<Vec<u8>, DecodeError> {
        let bytes = bs58::decode(self.data)
            .into_vec()
            .map_err(|_| DecodeError::InvalidEncoding)?;
        if bytes.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }
        Ok(bytes)
    }
}

/// Fusionne les instructions top-level et leurs inner instructions en une seule
/// séquence fidèle à l'ordre d'exécution : l'instruction `i`, puis tout le groupe `i`,
/// puis l'instruction `i + 1`. Rien n'est réordonné, dédupliqué ni supprimé.
/// Un groupe dont l'index n'a pas d'instruction top-level est ajouté à la fin.
pub fn flatten_instructions<'a>(
    instructions: &'a [RawInstruction],
    inner_instructions: &'a BTreeMap<usize, Vec<RawInstruction>>,
) -> Vec<FlatInstruction<'a>> {
    let nested = inner_instructions.values().map(Vec::len).sum::<usize>();
    let mut flat = Vec::with_capacity(instructions.len() + nested);

    for (index, ix) in instructions.iter().enumerate() {
        flat.push(FlatInstruction::from(ix));
        if let Some(group) = inner_instructions.get(&index) {
            flat.extend(group.iter().map(FlatInstruction::from));
        }
    }

    for (_, orphan_group) in inner_instructions.range(instructions.len()..) {
        flat.extend(orphan_group.iter().map(FlatInstruction::from));
    }

    flat
}

impl RawTransaction {
    pub fn flattened(&self) -> Vec<FlatInstruction<'_>> {
        flatten_instructions(&self.instructions, &self.inner_instructions)
    }

    /// Position d'une adresse dans la liste des comptes de la transaction.
    pub fn account_index(&self, account: &Pubkey) -> Option<usize> {
        self.account_keys.iter().position(|key| key == account)
    }

    /// Balance post-exécution d'un compte de token, retrouvée par son index.
    pub fn post_balance(&self, account: &Pubkey) -> Option<&TokenBalance> {
        let index = self.account_index(account)?;
        self.post_token_balances
            .iter()
            .find(|balance| balance.account_index == index)
    }

    /// Décimales d'un mint d'après le snapshot. 0 si le mint n'y apparaît pas.
    pub fn mint_decimals(&self, mint: &Pubkey) -> u8 {
        self.post_token_balances
            .iter()
            .find(|balance| &balance.mint == mint)
            .map_or(0, |balance| balance.decimals)
    }
}

/// Trie les transactions par (block_time, slot) croissants.
/// Le RPC les livre du plus récent au plus ancien : le calcul de l'ATH exige l'inverse.
pub fn sort_chronologically(transactions: &mut [RawTransaction]) {
    transactions.sort_by_key(|tx| (tx.block_time.unwrap_or(i64::MIN), tx.slot));
}
