//! # Veil Testkit
//!
//! Deterministic in-memory stand-ins for the external collaborators:
//! a [`CleartextCoprocessor`] that implements the homomorphic operation
//! surface over plaintext `u64`s, and a [`RecordingSink`] that captures
//! emitted events.
//!
//! The coprocessor exposes `reveal_*` accessors so tests can assert on
//! decrypted outcomes. Those accessors exist only here; production crates
//! have no way to read a handle's plaintext.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use veil_core::{
    AttestationProof, CiphertextHandle, CiphertextKind, Coprocessor, EventSink,
    ExternalCiphertext, Result, VeilError, VeilEvent,
};

const PROOF_DOMAIN: &[u8] = b"veil-testkit-attestation-v1";

// value (8 bytes big-endian) + kind tag (1 byte) + session nonce (32 bytes)
const PAYLOAD_LEN: usize = 41;

fn kind_tag(kind: CiphertextKind) -> u8 {
    match kind {
        CiphertextKind::U8 => 0,
        CiphertextKind::U16 => 1,
        CiphertextKind::U32 => 2,
        CiphertextKind::U64 => 3,
        CiphertextKind::Bool => 4,
    }
}

fn kind_max(kind: CiphertextKind) -> u64 {
    match kind {
        CiphertextKind::U8 => u64::from(u8::MAX),
        CiphertextKind::U16 => u64::from(u16::MAX),
        CiphertextKind::U32 => u64::from(u32::MAX),
        CiphertextKind::U64 => u64::MAX,
        CiphertextKind::Bool => 1,
    }
}

fn attest(nonce: &[u8; 32]) -> AttestationProof {
    let mut hasher = Sha256::new();
    hasher.update(PROOF_DOMAIN);
    hasher.update(nonce);
    AttestationProof(hasher.finalize().to_vec())
}

/// Plaintext-backed implementation of the coprocessor surface
///
/// Handles and session nonces are minted from monotonic counters, so a
/// fresh coprocessor replays identically. Values are stored as `u64` with
/// booleans as 0/1. One attestation proof covers one encryption session,
/// which may hold several ciphertexts; this mirrors the shared-proof
/// batches the engines ingest.
#[derive(Debug, Default)]
pub struct CleartextCoprocessor {
    values: HashMap<CiphertextHandle, u64>,
    next: u64,
    session: u64,
}

impl CleartextCoprocessor {
    /// Create an empty coprocessor
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a well-formed (ciphertext, proof) pair for one plaintext
    /// value, as a subject's client-side encryption step would.
    pub fn encrypt(
        &mut self,
        value: u64,
        kind: CiphertextKind,
    ) -> (ExternalCiphertext, AttestationProof) {
        let (mut batch, proof) = self.encrypt_all(&[(value, kind)]);
        // encrypt_all returns exactly as many ciphertexts as inputs.
        (batch.remove(0), proof)
    }

    /// Encrypt a batch of values under one session, attested by a single
    /// shared proof.
    pub fn encrypt_all(
        &mut self,
        values: &[(u64, CiphertextKind)],
    ) -> (Vec<ExternalCiphertext>, AttestationProof) {
        let mut hasher = Sha256::new();
        hasher.update(b"veil-testkit-session");
        hasher.update(self.session.to_be_bytes());
        self.session += 1;
        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(&hasher.finalize());

        let proof = attest(&nonce);
        let batch = values
            .iter()
            .map(|(value, kind)| {
                let mut payload = value.to_be_bytes().to_vec();
                payload.push(kind_tag(*kind));
                payload.extend_from_slice(&nonce);
                ExternalCiphertext(payload)
            })
            .collect();
        (batch, proof)
    }

    /// Read back a handle's integer plaintext. Test-only surface.
    pub fn reveal_u64(&self, handle: CiphertextHandle) -> Option<u64> {
        self.values.get(&handle).copied()
    }

    /// Read back a handle's boolean plaintext. Test-only surface.
    pub fn reveal_bool(&self, handle: CiphertextHandle) -> Option<bool> {
        self.values.get(&handle).map(|v| *v != 0)
    }

    fn mint(&mut self, value: u64, kind: CiphertextKind) -> CiphertextHandle {
        let mut hasher = Sha256::new();
        hasher.update(b"veil-testkit-handle");
        hasher.update(self.next.to_be_bytes());
        self.next += 1;
        let digest = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        let handle = CiphertextHandle::new(id, kind);
        self.values.insert(handle, value);
        handle
    }

    fn operand(&self, handle: CiphertextHandle) -> Result<u64> {
        self.values
            .get(&handle)
            .copied()
            .ok_or_else(|| VeilError::validation(format!("unknown handle {handle}")))
    }

    fn same_kind(a: CiphertextHandle, b: CiphertextHandle) -> Result<()> {
        if a.kind() == b.kind() {
            Ok(())
        } else {
            Err(VeilError::kind_mismatch(format!(
                "operands are {} and {}",
                a.kind(),
                b.kind()
            )))
        }
    }
}

impl Coprocessor for CleartextCoprocessor {
    fn ingest(
        &mut self,
        raw: &ExternalCiphertext,
        kind: CiphertextKind,
        proof: &AttestationProof,
    ) -> Result<CiphertextHandle> {
        if raw.0.len() != PAYLOAD_LEN {
            return Err(VeilError::proof_invalid("malformed external ciphertext"));
        }
        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(&raw.0[9..]);
        if *proof != attest(&nonce) {
            return Err(VeilError::proof_invalid("attestation does not verify"));
        }
        if raw.0[8] != kind_tag(kind) {
            return Err(VeilError::kind_mismatch(format!(
                "ciphertext was not encrypted as {kind}"
            )));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&raw.0[..8]);
        let value = u64::from_be_bytes(bytes);
        if value > kind_max(kind) {
            return Err(VeilError::validation(format!("value does not fit {kind}")));
        }
        Ok(self.mint(value, kind))
    }

    fn ge(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle> {
        Self::same_kind(a, b)?;
        let result = u64::from(self.operand(a)? >= self.operand(b)?);
        Ok(self.mint(result, CiphertextKind::Bool))
    }

    fn le(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle> {
        Self::same_kind(a, b)?;
        let result = u64::from(self.operand(a)? <= self.operand(b)?);
        Ok(self.mint(result, CiphertextKind::Bool))
    }

    fn eq(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle> {
        Self::same_kind(a, b)?;
        let result = u64::from(self.operand(a)? == self.operand(b)?);
        Ok(self.mint(result, CiphertextKind::Bool))
    }

    fn bit_and(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle> {
        Self::same_kind(a, b)?;
        if !a.kind().is_integer() {
            return Err(VeilError::kind_mismatch("bitwise AND needs integer operands"));
        }
        let result = self.operand(a)? & self.operand(b)?;
        Ok(self.mint(result, a.kind()))
    }

    fn bool_and(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle> {
        if a.kind() != CiphertextKind::Bool || b.kind() != CiphertextKind::Bool {
            return Err(VeilError::kind_mismatch("boolean AND needs boolean operands"));
        }
        let result = u64::from(self.operand(a)? != 0 && self.operand(b)? != 0);
        Ok(self.mint(result, CiphertextKind::Bool))
    }
}

/// Event sink that captures everything it is handed
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<VeilEvent>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured events, in emission order
    pub fn events(&self) -> Vec<VeilEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &VeilEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
