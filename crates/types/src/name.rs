use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Errors raised while canonicalizing or hashing a name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("label must be at most {max} characters, got {actual}")]
    LabelTooLong { max: usize, actual: usize },
    #[error("label contains disallowed character {0:?} (allowed: a-z, 0-9, '-')")]
    DisallowedCharacter(char),
    #[error("label must not start or end with '-'")]
    HyphenAtEdge,
    #[error("name must not be empty")]
    EmptyName,
}

/// Maximum length of a single canonical label.
pub const MAX_LABEL_LENGTH: usize = 63;

/// Canonicalize a user-supplied leaf label.
///
/// ASCII uppercase letters fold to lowercase, so `Alice` and `alice` name the
/// same subname. Anything outside `[a-z0-9-]` after folding is rejected, as
/// are hyphens at either edge. The label is hashed, never interpolated into
/// on-chain logic, but it does get interpolated into further names, so the
/// character set stays deliberately narrow.
pub fn canonicalize_label(label: &str) -> Result<String, NameError> {
    if label.is_empty() {
        return Err(NameError::EmptyLabel);
    }
    if label.len() > MAX_LABEL_LENGTH {
        return Err(NameError::LabelTooLong {
            max: MAX_LABEL_LENGTH,
            actual: label.len(),
        });
    }

    let mut canonical = String::with_capacity(label.len());
    for ch in label.chars() {
        let folded = ch.to_ascii_lowercase();
        match folded {
            'a'..='z' | '0'..='9' | '-' => canonical.push(folded),
            other => return Err(NameError::DisallowedCharacter(other)),
        }
    }

    if canonical.starts_with('-') || canonical.ends_with('-') {
        return Err(NameError::HyphenAtEdge);
    }

    Ok(canonical)
}

/// Hash of a single name label (keccak-256 of its UTF-8 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelId(pub [u8; 32]);

/// Fixed-width node identifier deterministically derived from a full name.
///
/// Derived by the standard recursive scheme: the node of the empty name is
/// all zeroes, and the node of `label.rest` is
/// `keccak256(node(rest) || labelhash(label))`. Always recomputed from the
/// name, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(pub [u8; 32]);

macro_rules! hex_wrapper {
    ($ty:ident) => {
        impl $ty {
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.to_hex()
            }
        }

        impl TryFrom<String> for $ty {
            type Error = hex::FromHexError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                let payload = value.strip_prefix("0x").unwrap_or(&value);
                let decoded = hex::decode(payload)?;
                let bytes: [u8; 32] = decoded
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok($ty(bytes))
            }
        }
    };
}

hex_wrapper!(LabelId);
hex_wrapper!(NodeId);

/// Hash a single label into its fixed-width identifier.
pub fn labelhash(label: &str) -> LabelId {
    let mut hasher = Keccak256::new();
    hasher.update(label.as_bytes());
    LabelId(hasher.finalize().into())
}

/// Derive the node identifier for a dot-separated hierarchical name.
///
/// The empty-name node is the zero hash; an empty input string is rejected so
/// callers cannot accidentally address the root.
pub fn namehash(name: &str) -> Result<NodeId, NameError> {
    if name.is_empty() {
        return Err(NameError::EmptyName);
    }

    let mut node = [0u8; 32];
    for label in name.rsplit('.') {
        if label.is_empty() {
            return Err(NameError::EmptyLabel);
        }
        let label_id = labelhash(label);
        let mut hasher = Keccak256::new();
        hasher.update(node);
        hasher.update(label_id.0);
        node = hasher.finalize().into();
    }

    Ok(NodeId(node))
}

/// A dot-separated name anchored at a fixed, pre-registered parent suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalName {
    label: String,
    parent: String,
}

impl HierarchicalName {
    /// Build the canonical name `<label>.<parent>` for an untrusted leaf
    /// label. The label is canonicalized; the parent suffix is operator
    /// configuration and taken as-is.
    pub fn new(label: &str, parent: &str) -> Result<Self, NameError> {
        // Reject a malformed parent up front so node derivation below can
        // never fail.
        namehash(parent)?;
        let label = canonicalize_label(label)?;
        Ok(Self {
            label,
            parent: parent.to_string(),
        })
    }

    /// The canonicalized leaf label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The parent suffix the name is anchored at.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// The full dot-separated name.
    pub fn full(&self) -> String {
        format!("{}.{}", self.label, self.parent)
    }

    /// Hash of the leaf label alone.
    pub fn label_id(&self) -> LabelId {
        labelhash(&self.label)
    }

    /// Node identifier of the full name.
    pub fn node(&self) -> NodeId {
        namehash(&self.full()).expect("canonical name is never empty")
    }

    /// Node identifier of the parent name.
    pub fn parent_node(&self) -> NodeId {
        namehash(&self.parent).expect("parent suffix is never empty")
    }
}

impl std::fmt::Display for HierarchicalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.label, self.parent)
    }
}
