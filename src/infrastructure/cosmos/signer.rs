use std::fmt;

use cosmrs::crypto::{secp256k1::SigningKey, PublicKey};
use cosmrs::tx::SignDoc;

use crate::domain::error::{SpyError, SpyResult};

/// Account exposed by a signer
#[derive(Debug, Clone, PartialEq)]
pub struct AccountData {
    pub address: String,
    pub public_key: PublicKey,
}

/// Credential that can sign transactions without holding a chain connection
pub trait OfflineSigner: Send + Sync {
    /// Accounts in wallet order; the first one is the active address
    fn accounts(&self) -> Vec<AccountData>;

    /// Sign in direct (protobuf) mode and return the raw transaction bytes
    fn sign_direct(&self, sign_doc: SignDoc) -> SpyResult<Vec<u8>>;
}

/// secp256k1 key held in memory
#[derive(Clone)]
pub struct LocalSigner {
    public_key: PublicKey,
    address: String,
    private_key: Vec<u8>,
}

impl LocalSigner {
    pub fn new(private_key: Vec<u8>, prefix: &str) -> SpyResult<Self> {
        let signing_key = Self::build_signing_key(&private_key)?;
        let public_key = signing_key.public_key();
        let address = public_key
            .account_id(prefix)
            .map_err(SpyError::signing)?
            .to_string();
        Ok(Self {
            public_key,
            address,
            private_key,
        })
    }

    /// Parse a hex private key, with or without `0x`
    pub fn from_hex(key: &str, prefix: &str) -> SpyResult<Self> {
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let bytes = hex::decode(key).map_err(|err| SpyError::signing(format!("bad key hex: {err}")))?;
        Self::new(bytes, prefix)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `SigningKey` is not `Sync`, so it is rebuilt for every signature
    fn build_signing_key(private_key: &[u8]) -> SpyResult<SigningKey> {
        SigningKey::from_slice(private_key).map_err(SpyError::signing)
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl OfflineSigner for LocalSigner {
    fn accounts(&self) -> Vec<AccountData> {
        vec![AccountData {
            address: self.address.clone(),
            public_key: self.public_key,
        }]
    }

    fn sign_direct(&self, sign_doc: SignDoc) -> SpyResult<Vec<u8>> {
        let key = Self::build_signing_key(&self.private_key)?;
        let raw = sign_doc.sign(&key).map_err(SpyError::signing)?;
        raw.to_bytes().map_err(SpyError::signing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

    #[test]
    fn test_address_uses_network_prefix() {
        let juno = LocalSigner::from_hex(KEY, "juno").unwrap();
        let stars = LocalSigner::from_hex(KEY, "stars").unwrap();
        assert!(juno.address().starts_with("juno1"));
        assert!(stars.address().starts_with("stars1"));
        assert_eq!(juno.accounts()[0].address, juno.address());
        assert_eq!(juno.accounts()[0].public_key, stars.accounts()[0].public_key);
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(LocalSigner::from_hex("zz", "juno").is_err());
        assert!(LocalSigner::from_hex("0x0000", "juno").is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = LocalSigner::from_hex(KEY, "juno").unwrap();
        let rendered = format!("{:?}", signer);
        assert!(!rendered.contains("0101010101"));
    }
}
