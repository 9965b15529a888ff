// Copyright (c) 2025 - Cowboy AI, Inc.
//! Object Store Specification

use serde::{Deserialize, Serialize};

/// Public access blocking level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPublicAccess {
    BlockAll,
    BlockAcls,
    None,
}

/// Server-side encryption mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEncryption {
    S3Managed,
    KmsManaged,
    Unencrypted,
}

/// Durable artifact storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub block_public_access: BlockPublicAccess,
    pub encryption: BucketEncryption,
}

impl BucketSpec {
    /// Encrypted and closed to the public
    pub fn private_encrypted() -> Self {
        Self {
            block_public_access: BlockPublicAccess::BlockAll,
            encryption: BucketEncryption::S3Managed,
        }
    }

    pub fn is_locked_down(&self) -> bool {
        self.block_public_access == BlockPublicAccess::BlockAll
            && self.encryption != BucketEncryption::Unencrypted
    }
}

impl Default for BucketSpec {
    fn default() -> Self {
        Self::private_encrypted()
    }
}
