use serde::{Deserialize, Serialize};
use serde_bytes;
use sha3::{Digest, Keccak256};

use crate::address::Address;
use crate::name::{LabelId, NodeId};

/// The closed set of state-changing calls this service ever submits.
///
/// Only two contracts are ever targeted: the registry (`CreateSubnode`,
/// `SetOwner`) and the resolver (`SetAddr`). Ownership transfer, whether as
/// the final step of a registration run or as a standalone repair operation,
/// is a `SetOwner` submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryCall {
    /// Bind a subordinate name under `parent` to an owner and resolver.
    CreateSubnode {
        parent: NodeId,
        label: LabelId,
        owner: Address,
        resolver: Address,
        ttl: u64,
    },
    /// Set the resolved address for a name on the resolver.
    SetAddr { node: NodeId, addr: Address },
    /// Set the owner of a name on the registry.
    SetOwner { node: NodeId, owner: Address },
}

impl RegistryCall {
    /// Wire-level method name, used in logs and by the ledger endpoint.
    pub fn method(&self) -> &'static str {
        match self {
            RegistryCall::CreateSubnode { .. } => "create_subnode",
            RegistryCall::SetAddr { .. } => "set_addr",
            RegistryCall::SetOwner { .. } => "set_owner",
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            RegistryCall::CreateSubnode { .. } => 0,
            RegistryCall::SetAddr { .. } => 1,
            RegistryCall::SetOwner { .. } => 2,
        }
    }

    /// Append the call's canonical byte encoding to a signing payload.
    fn encode_into(&self, payload: &mut Vec<u8>) {
        payload.push(self.discriminant());
        match self {
            RegistryCall::CreateSubnode {
                parent,
                label,
                owner,
                resolver,
                ttl,
            } => {
                payload.extend_from_slice(parent.as_bytes());
                payload.extend_from_slice(label.as_bytes());
                payload.extend_from_slice(owner.as_bytes());
                payload.extend_from_slice(resolver.as_bytes());
                payload.extend_from_slice(&ttl.to_be_bytes());
            }
            RegistryCall::SetAddr { node, addr } => {
                payload.extend_from_slice(node.as_bytes());
                payload.extend_from_slice(addr.as_bytes());
            }
            RegistryCall::SetOwner { node, owner } => {
                payload.extend_from_slice(node.as_bytes());
                payload.extend_from_slice(owner.as_bytes());
            }
        }
    }
}

/// An unsigned state-changing request against one of the two fixed contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Target contract address (registry or resolver).
    pub to: Address,
    /// Signing account the ledger charges and sequence-checks.
    pub from: Address,
    /// Pre-allocated sequence number for `from`.
    pub nonce: u64,
    /// The registry/resolver call being made.
    pub call: RegistryCall,
}

const SIGNING_DOMAIN: &[u8] = b"nomen/tx/v1";

impl TransactionRequest {
    /// Canonical byte encoding covered by the signature.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(SIGNING_DOMAIN.len() + 128);
        payload.extend_from_slice(SIGNING_DOMAIN);
        payload.extend_from_slice(self.to.as_bytes());
        payload.extend_from_slice(self.from.as_bytes());
        payload.extend_from_slice(&self.nonce.to_be_bytes());
        self.call.encode_into(&mut payload);
        payload
    }
}

/// Pending transaction identifier handed back by the ledger on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<TxId> for String {
    fn from(value: TxId) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for TxId {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let payload = value.strip_prefix("0x").unwrap_or(&value);
        let decoded = hex::decode(payload)?;
        let bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(TxId(bytes))
    }
}

/// A signed request ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub request: TransactionRequest,
    /// Signer's ed25519 public key (32 bytes).
    #[serde(with = "serde_bytes")]
    pub public_key: [u8; 32],
    /// Ed25519 signature over the request's signing payload (64 bytes).
    #[serde(with = "serde_bytes")]
    pub signature: [u8; 64],
}

impl SignedTransaction {
    /// Deterministic transaction identifier: keccak-256 over the signed
    /// payload and the signature.
    pub fn tx_id(&self) -> TxId {
        let mut hasher = Keccak256::new();
        hasher.update(self.request.signing_payload());
        hasher.update(self.signature);
        TxId(hasher.finalize().into())
    }
}
