use claimgate_core::authorization::VestingConfig;
use claimgate_core::error::ClaimError;
use claimgate_core::types::{Address, Amount, MessageHash, Nonce};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError, TransactionalTree,
    Transactional,
};
use std::path::Path;

const META_OWNER: &str = "owner";
const META_AUTHORIZER: &str = "authorizer";
const META_VESTING: &str = "vesting_config";
const META_CUSTODY: &str = "custody";
const META_ADMIN_NONCE: &str = "admin_nonce";

fn storage(e: sled::Error) -> ClaimError {
    ClaimError::Storage(e.to_string())
}

fn tx_error(e: TransactionError<ClaimError>) -> ClaimError {
    match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => storage(e),
    }
}

fn decode_amount(bytes: &[u8]) -> Result<Amount, ClaimError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| ClaimError::Serialization(format!("amount is {} bytes, expected 16", bytes.len())))?;
    Ok(Amount::from_be_bytes(arr))
}

fn redemption_key(recipient: &Address, hash: &MessageHash) -> [u8; 52] {
    let mut key = [0u8; 52];
    key[..20].copy_from_slice(recipient.as_bytes());
    key[20..].copy_from_slice(hash.as_bytes());
    key
}

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   redemptions: recipient ‖ hash → u128 BE cumulative amount
///   used:        hash             → [] (membership set)
///   balances:    address          → u128 BE (ledger custodian)
///
/// Writes that must land together (a redemption and its used-set entry, a
/// debit and its credit) go through one sled transaction.
///   meta:        utf8 key         → raw bytes
pub struct StateDb {
    _db: sled::Db,
    redemptions: sled::Tree,
    used: sled::Tree,
    balances: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ClaimError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// In-memory database removed on drop. Used by tests and dry runs.
    pub fn temporary() -> Result<Self, ClaimError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, ClaimError> {
        let redemptions = db.open_tree("redemptions").map_err(storage)?;
        let used        = db.open_tree("used").map_err(storage)?;
        let balances    = db.open_tree("balances").map_err(storage)?;
        let meta        = db.open_tree("meta").map_err(storage)?;
        Ok(Self { _db: db, redemptions, used, balances, meta })
    }

    // ── Redemption records ───────────────────────────────────────────────────

    pub fn get_redeemed(&self, recipient: &Address, hash: &MessageHash) -> Result<Option<Amount>, ClaimError> {
        match self.redemptions.get(redemption_key(recipient, hash)).map_err(storage)? {
            Some(bytes) => Ok(Some(decode_amount(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write the cumulative amount for (recipient, hash) and, when
    /// `fully_used`, add the hash to the used set. Both land or neither does.
    pub fn commit_redemption(
        &self,
        recipient: &Address,
        hash: &MessageHash,
        cumulative: Amount,
        fully_used: bool,
    ) -> Result<(), ClaimError> {
        let key = redemption_key(recipient, hash);
        (&self.redemptions, &self.used)
            .transaction(
                |(redemptions, used): &(TransactionalTree, TransactionalTree)| -> ConflictableTransactionResult<(), ClaimError> {
                    redemptions.insert(&key[..], &cumulative.to_be_bytes()[..])?;
                    if fully_used {
                        used.insert(hash.as_bytes(), b"".as_ref())?;
                    }
                    Ok(())
                },
            )
            .map_err(tx_error)
    }

    /// Put (recipient, hash) back to a previously read state in one
    /// transaction. Only used to undo an uncommitted claim; committed records
    /// are never removed.
    pub(crate) fn revert_redemption(
        &self,
        recipient: &Address,
        hash: &MessageHash,
        redeemed: Option<Amount>,
        fully_used: bool,
    ) -> Result<(), ClaimError> {
        let key = redemption_key(recipient, hash);
        (&self.redemptions, &self.used)
            .transaction(
                |(redemptions, used): &(TransactionalTree, TransactionalTree)| -> ConflictableTransactionResult<(), ClaimError> {
                    match redeemed {
                        Some(amount) => {
                            redemptions.insert(&key[..], &amount.to_be_bytes()[..])?;
                        }
                        None => {
                            redemptions.remove(&key[..])?;
                        }
                    }
                    if !fully_used {
                        used.remove(hash.as_bytes())?;
                    }
                    Ok(())
                },
            )
            .map_err(tx_error)
    }

    /// Every redemption record as (recipient, hash, cumulative amount).
    pub fn iter_redemptions(&self) -> Result<Vec<(Address, MessageHash, Amount)>, ClaimError> {
        let mut out = Vec::new();
        for item in self.redemptions.iter() {
            let (key, value) = item.map_err(storage)?;
            if key.len() != 52 {
                return Err(ClaimError::Serialization(format!("bad redemption key length {}", key.len())));
            }
            let mut recipient = [0u8; 20];
            recipient.copy_from_slice(&key[..20]);
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&key[20..]);
            out.push((
                Address::from_bytes(recipient),
                MessageHash::from_bytes(hash),
                decode_amount(&value)?,
            ));
        }
        Ok(out)
    }

    // ── Used set ─────────────────────────────────────────────────────────────

    pub fn is_used(&self, hash: &MessageHash) -> Result<bool, ClaimError> {
        self.used.contains_key(hash.as_bytes()).map_err(storage)
    }

    pub fn used_hashes(&self) -> Result<Vec<MessageHash>, ClaimError> {
        let mut out = Vec::new();
        for item in self.used.iter() {
            let (key, _) = item.map_err(storage)?;
            let arr: [u8; 32] = key
                .as_ref()
                .try_into()
                .map_err(|_| ClaimError::Serialization(format!("bad used-set key length {}", key.len())))?;
            out.push(MessageHash::from_bytes(arr));
        }
        Ok(out)
    }

    // ── Ledger balances ──────────────────────────────────────────────────────

    pub fn get_balance(&self, holder: &Address) -> Result<Amount, ClaimError> {
        match self.balances.get(holder.as_bytes()).map_err(storage)? {
            Some(bytes) => decode_amount(&bytes),
            None => Ok(0),
        }
    }

    pub fn put_balance(&self, holder: &Address, amount: Amount) -> Result<(), ClaimError> {
        self.balances
            .insert(holder.as_bytes(), amount.to_be_bytes().to_vec())
            .map_err(storage)?;
        Ok(())
    }

    /// Move `amount` from `from` to `to` in one transaction. Returns `false`
    /// without writing when `from` is short or `to` would overflow.
    pub fn move_balance(&self, from: &Address, to: &Address, amount: Amount) -> Result<bool, ClaimError> {
        if from == to {
            return Ok(false);
        }
        self.balances
            .transaction(|balances: &TransactionalTree| -> ConflictableTransactionResult<bool, ClaimError> {
                let read = |holder: &Address| -> Result<Amount, ConflictableTransactionError<ClaimError>> {
                    match balances.get(holder.as_bytes())? {
                        Some(bytes) => decode_amount(&bytes).map_err(ConflictableTransactionError::Abort),
                        None => Ok(0),
                    }
                };
                let from_balance = read(from)?;
                let to_balance = read(to)?;
                let (Some(debited), Some(credited)) =
                    (from_balance.checked_sub(amount), to_balance.checked_add(amount))
                else {
                    return Ok(false);
                };
                balances.insert(from.as_bytes(), &debited.to_be_bytes()[..])?;
                balances.insert(to.as_bytes(), &credited.to_be_bytes()[..])?;
                Ok(true)
            })
            .map_err(tx_error)
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn owner(&self) -> Result<Option<Address>, ClaimError> {
        self.get_address(META_OWNER)
    }

    pub fn put_owner(&self, owner: &Address) -> Result<(), ClaimError> {
        self.put_meta(META_OWNER, owner.as_bytes())
    }

    pub fn authorizer(&self) -> Result<Option<Address>, ClaimError> {
        self.get_address(META_AUTHORIZER)
    }

    pub fn put_authorizer(&self, key: &Address) -> Result<(), ClaimError> {
        self.put_meta(META_AUTHORIZER, key.as_bytes())
    }

    /// Ledger address the deployment's custodian pays out of.
    pub fn custody(&self) -> Result<Option<Address>, ClaimError> {
        self.get_address(META_CUSTODY)
    }

    pub fn put_custody(&self, custody: &Address) -> Result<(), ClaimError> {
        self.put_meta(META_CUSTODY, custody.as_bytes())
    }

    /// Nonce the next owner command must carry. Starts at 0.
    pub fn admin_nonce(&self) -> Result<Nonce, ClaimError> {
        match self.get_meta(META_ADMIN_NONCE)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ClaimError::Serialization("meta admin_nonce is not a u64".into()))?;
                Ok(Nonce::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn put_admin_nonce(&self, nonce: Nonce) -> Result<(), ClaimError> {
        self.put_meta(META_ADMIN_NONCE, &nonce.to_be_bytes())
    }

    pub fn vesting_config(&self) -> Result<Option<VestingConfig>, ClaimError> {
        match self.get_meta(META_VESTING)? {
            Some(bytes) => {
                let cfg = bincode::deserialize(&bytes)
                    .map_err(|e| ClaimError::Serialization(e.to_string()))?;
                Ok(Some(cfg))
            }
            None => Ok(None),
        }
    }

    pub fn put_vesting_config(&self, config: &VestingConfig) -> Result<(), ClaimError> {
        let bytes = bincode::serialize(config)
            .map_err(|e| ClaimError::Serialization(e.to_string()))?;
        self.put_meta(META_VESTING, &bytes)
    }

    fn get_address(&self, key: &str) -> Result<Option<Address>, ClaimError> {
        match self.get_meta(key)? {
            Some(bytes) => {
                let arr: [u8; 20] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ClaimError::Serialization(format!("meta {key} is not an address")))?;
                Ok(Some(Address::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), ClaimError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, ClaimError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), ClaimError> {
        self._db.flush().map_err(storage)?;
        Ok(())
    }
}
