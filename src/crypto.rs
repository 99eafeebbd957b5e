//! Hash and signature capabilities (§6: "abstracted as capabilities").
//!
//! The ledger core depends on two abstract primitives: a collision-resistant
//! hash and a deterministic signature scheme over digests. Concrete
//! implementations live here (BLAKE2b-256 via the `blake2` crate, Ed25519 via
//! `ed25519-dalek`) but every rule function is generic over the traits, not
//! the concrete types, so swapping primitives never touches rule logic.

use blake2::Blake2b;
use blake2::digest::{Digest, consts::U32};
use ed25519_dalek::{Signature, Signer as DalekSigner, SigningKey, Verifier as DalekVerifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::credential::Hash28;

/// A 32-byte cryptographic digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest32(pub [u8; 32]);

/// Collision-resistant hash capability. `hash_28` is the truncation used for
/// credential hashes (§3: `Credential` carries 28-byte hashes); `hash_32` is
/// used for transaction and body identity hashes.
pub trait Hasher {
    fn hash_32(bytes: &[u8]) -> Digest32;
    fn hash_28(bytes: &[u8]) -> Hash28 {
        let Digest32(full) = Self::hash_32(bytes);
        let mut out = [0u8; 28];
        out.copy_from_slice(&full[..28]);
        Hash28(out)
    }
}

/// BLAKE2b-256 hasher, the digest width the real ledger uses for body and
/// transaction identity hashes.
pub struct Blake2bHasher;

impl Hasher for Blake2bHasher {
    fn hash_32(bytes: &[u8]) -> Digest32 {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(bytes);
        let out = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&out);
        Digest32(digest)
    }
}

/// A verification key, tagged by role to prevent cross-role misuse (§9:
/// "phantom role tags on keys" re-architected as distinct newtypes rather
/// than a runtime check). `Witness` keys are produced from payment/staking
/// keys via [`VKey::as_witness`], the one legal coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VKey<Role> {
    pub bytes: [u8; 32],
    #[serde(skip)]
    _role: std::marker::PhantomData<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staking;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Witness;

impl<Role> VKey<Role> {
    pub fn new(bytes: [u8; 32]) -> Self {
        VKey {
            bytes,
            _role: std::marker::PhantomData,
        }
    }

    pub fn hash<H: Hasher>(&self) -> Hash28 {
        H::hash_28(&self.bytes)
    }
}

impl VKey<Payment> {
    pub fn as_witness(&self) -> VKey<Witness> {
        VKey::new(self.bytes)
    }
}

impl VKey<Staking> {
    pub fn as_witness(&self) -> VKey<Witness> {
        VKey::new(self.bytes)
    }
}

/// A signature over a digest. `serde` only derives array (de)serialization up
/// to 32 elements, so the 64-byte Ed25519 signature gets a manual impl that
/// round-trips through a byte vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sig(pub [u8; 64]);

impl Serialize for Sig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.to_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Sig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let array: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("signature must be 64 bytes"))?;
        Ok(Sig(array))
    }
}

/// A verification-key/signature pair as it appears in a witness set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWitness {
    pub vkey: VKey<Witness>,
    pub signature: Sig,
}

/// A generated signing keypair, used for test fixtures and `makeWitness`.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Self {
        KeyPair {
            signing_key: SigningKey::generate(rng),
        }
    }

    pub fn vkey<Role>(&self) -> VKey<Role> {
        VKey::new(self.signing_key.verifying_key().to_bytes())
    }

    /// `makeWitness(hash, keyPair) = (vkey, sign(sk, hash))` (§4.D).
    pub fn make_witness(&self, body_hash: Digest32) -> KeyWitness {
        let signature: Signature = self.signing_key.sign(&body_hash.0);
        KeyWitness {
            vkey: self.vkey(),
            signature: Sig(signature.to_bytes()),
        }
    }
}

/// `verify(bodyHash, (vkey, sig))` (§4.D).
pub fn verify_witness(body_hash: Digest32, witness: &KeyWitness) -> bool {
    let Ok(vk) = VerifyingKey::from_bytes(&witness.vkey.bytes) else {
        return false;
    };
    let sig = Signature::from_bytes(&witness.signature.0);
    vk.verify(&body_hash.0, &sig).is_ok()
}
