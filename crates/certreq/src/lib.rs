//! Certreq - encrypted RSA key pairs and PKCS#10 certificate requests
//!
//! Generates an RSA key pair, stores the private key as
//! passphrase-encrypted PKCS#8 PEM, and issues a signed PKCS#10
//! Certificate Signing Request for it.
//!
//! ## Modules
//!
//! - `key` - RSA key pair generation and PKCS#8 serialization
//! - `csr` - PKCS#10 request construction and parsing
//! - `issue` - one-shot key + CSR issuance to files
//! - `error` - error types

pub mod csr;
pub mod error;
pub mod issue;
pub mod key;

// Re-export commonly used types
pub use csr::{build_unsigned, create_csr, CertReqInfo, Csr, CsrSubject};
pub use error::{Error, Result};
pub use issue::{issue_csr, issue_csr_status, issue_csr_with_bits};
pub use key::{public_key_from_spki_der, verify_with_spki_der, RsaKey, DEFAULT_KEY_BITS};

/// Prelude with the most common types and functions
pub mod prelude {
    pub use crate::{
        csr::{create_csr, Csr, CsrSubject},
        error::{Error, Result},
        issue::{issue_csr, issue_csr_with_bits},
        key::RsaKey,
    };
}
