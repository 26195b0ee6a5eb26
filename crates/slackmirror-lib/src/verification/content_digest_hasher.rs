use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Verification failed: expected {expected}, got {actual}")]
    VerificationFailed {
        expected: ContentDigest,
        actual: ContentDigest,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// Infers the algorithm from the length of a hex encoded digest.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(Self::Md5),
            40 => Some(Self::Sha1),
            64 => Some(Self::Sha256),
            128 => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl ContentDigest {
    /// Parses a hex digest, inferring its algorithm from the length.
    ///
    /// Returns `None` for strings that are not hex or whose length matches no
    /// supported algorithm.
    pub fn from_hex(hex_digest: &str) -> Option<Self> {
        let algorithm = DigestAlgorithm::from_hex_len(hex_digest.len())?;
        let bytes = hex::decode(hex_digest).ok()?;
        Some(Self { algorithm, bytes })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.name(), self.to_hex())
    }
}

enum HasherState {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

pub struct ContentDigestHasher {
    algorithm: DigestAlgorithm,
    state: HasherState,
}

impl ContentDigestHasher {
    #[inline]
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        let state = match algorithm {
            DigestAlgorithm::Md5 => HasherState::Md5(Md5::new()),
            DigestAlgorithm::Sha1 => HasherState::Sha1(Sha1::new()),
            DigestAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => HasherState::Sha512(Sha512::new()),
        };
        Self { algorithm, state }
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        match &mut self.state {
            HasherState::Md5(digest) => Digest::update(digest, data.as_ref()),
            HasherState::Sha1(digest) => Digest::update(digest, data.as_ref()),
            HasherState::Sha256(digest) => Digest::update(digest, data.as_ref()),
            HasherState::Sha512(digest) => Digest::update(digest, data.as_ref()),
        };
    }

    pub fn finalize(self) -> ContentDigest {
        let bytes = match self.state {
            HasherState::Md5(digest) => digest.finalize().to_vec(),
            HasherState::Sha1(digest) => digest.finalize().to_vec(),
            HasherState::Sha256(digest) => digest.finalize().to_vec(),
            HasherState::Sha512(digest) => digest.finalize().to_vec(),
        };
        ContentDigest {
            algorithm: self.algorithm,
            bytes,
        }
    }
}

pub struct ContentDigestVerifier {
    hasher: ContentDigestHasher,
    expected_digest: ContentDigest,
}

impl ContentDigestVerifier {
    #[inline]
    pub fn new(expected_digest: ContentDigest) -> Self {
        Self {
            hasher: ContentDigestHasher::new(expected_digest.algorithm()),
            expected_digest,
        }
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        self.hasher.update(data);
    }

    pub fn verify(self) -> Result<ContentDigest, VerificationError> {
        let actual_digest = self.hasher.finalize();

        if actual_digest == self.expected_digest {
            Ok(actual_digest)
        } else {
            Err(VerificationError::VerificationFailed {
                expected: self.expected_digest,
                actual: actual_digest,
            })
        }
    }
}
