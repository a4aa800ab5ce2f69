// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dill::*;
use internal_error::ErrorIntoInternal;
use nada_platform_apis::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const KEY_MASK: u8 = 0x5a;

/// Reversible stand-in for a KMS key ring. Ciphertexts are bound to the key
/// they were produced with.
pub struct InMemoryKms {
    decrypt_calls: AtomicUsize,
    encrypt_hangs: AtomicBool,
}

#[component(pub)]
#[interface(dyn KmsApi)]
#[scope(Singleton)]
impl InMemoryKms {
    pub fn new() -> Self {
        Self {
            decrypt_calls: AtomicUsize::new(0),
            encrypt_hangs: AtomicBool::new(false),
        }
    }

    pub fn decrypt_count(&self) -> usize {
        self.decrypt_calls.load(Ordering::Relaxed)
    }

    /// While set, `encrypt` never returns, like a key ring that stopped
    /// answering
    pub fn set_encrypt_hangs(&self, hangs: bool) {
        self.encrypt_hangs.store(hangs, Ordering::Relaxed);
    }

    fn prefix(key_id: &str) -> Vec<u8> {
        format!("kms:{key_id}:").into_bytes()
    }
}

#[async_trait::async_trait]
impl KmsApi for InMemoryKms {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, ApiError> {
        if self.encrypt_hangs.load(Ordering::Relaxed) {
            std::future::pending::<()>().await;
        }

        let mut ciphertext = Self::prefix(key_id);
        ciphertext.extend(plaintext.iter().map(|b| b ^ KEY_MASK));
        Ok(ciphertext)
    }

    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>, ApiError> {
        self.decrypt_calls.fetch_add(1, Ordering::Relaxed);

        let Some(body) = ciphertext.strip_prefix(Self::prefix(key_id).as_slice()) else {
            return Err(format!("Ciphertext was not produced with key {key_id}")
                .int_err()
                .into());
        };
        Ok(body.iter().map(|b| b ^ KEY_MASK).collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
