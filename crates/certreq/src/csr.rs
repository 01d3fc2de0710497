//! PKCS#10 Certificate Signing Request construction
//!
//! Builds, signs, serializes, and parses Certificate Signing Requests for
//! RSA keys. Requests are signed with sha256WithRSAEncryption over the
//! DER-encoded `CertReqInfo`.

use der::{
    asn1::{Ia5StringRef, ObjectIdentifier, PrintableStringRef, SetOfVec, Utf8StringRef},
    Decode, Encode,
};
use pkcs8::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use serde::{Deserialize, Serialize};
use x509_cert::{
    attr::AttributeTypeAndValue,
    name::{RdnSequence, RelativeDistinguishedName},
    request::CertReq,
};

use crate::{
    error::{Error, Result},
    key::{verify_with_spki_der, RsaKey},
};

const OID_CN: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const OID_C: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const OID_L: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const OID_ST: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const OID_O: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const OID_OU: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
// PKCS#9 emailAddress
const OID_EMAIL: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// Certificate Signing Request
#[derive(Debug, Clone)]
pub struct Csr {
    inner: CertReq,
}

/// CSR subject information
///
/// Only the common name is required. Optional fields that are `None` or
/// empty strings are omitted from the encoded distinguished name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsrSubject {
    /// Common Name (CN)
    pub common_name: String,
    /// Organization (O)
    pub organization: Option<String>,
    /// Organizational Unit (OU)
    pub organizational_unit: Option<String>,
    /// Country (C)
    pub country: Option<String>,
    /// State or Province (ST)
    pub state: Option<String>,
    /// Locality (L)
    pub locality: Option<String>,
    /// Email address (PKCS#9 emailAddress)
    pub email: Option<String>,
}

impl CsrSubject {
    /// Create a subject with the given common name and no optional fields
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..Default::default()
        }
    }
}

/// Build an unsigned CertReqInfo from subject and public key
///
/// # Arguments
/// * `subject` - The subject information for the CSR
/// * `spki_der` - The RSA public key in SPKI DER format
///
/// # Returns
/// Returns the unsigned CertReqInfo structure that can be encoded and signed
pub fn build_unsigned(
    subject: CsrSubject,
    spki_der: &[u8],
) -> Result<x509_cert::request::CertReqInfo> {
    let subject_dn = Csr::build_distinguished_name(&subject)?;

    let spki = SubjectPublicKeyInfoOwned::from_der(spki_der)
        .map_err(|e| Error::ParseError(format!("Failed to parse SPKI: {}", e)))?;

    if spki.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
        return Err(Error::KeyError(
            "Only RSA public keys are supported".to_string(),
        ));
    }

    Ok(x509_cert::request::CertReqInfo {
        version: x509_cert::request::Version::V1,
        subject: subject_dn,
        public_key: spki,
        attributes: Default::default(),
    })
}

/// Create a new CSR for the given key and subject
///
/// Combines build_unsigned, signing, and assemble into a single operation.
pub fn create_csr(key: &RsaKey, subject: CsrSubject) -> Result<Csr> {
    let spki_der = key.to_spki_der()?;

    let cert_req_info = build_unsigned(subject, &spki_der)?;

    let info_der = cert_req_info
        .to_der()
        .map_err(|e| Error::EncodingError(format!("Failed to encode CertReqInfo: {}", e)))?;

    let signature = key.sign(&info_der)?;

    Csr::assemble(cert_req_info, &signature)
}

impl Csr {
    /// Assemble a complete CSR from CertReqInfo and an RSA signature
    ///
    /// The signature must be a PKCS#1 v1.5 / SHA-256 signature over the
    /// DER encoding of `cert_req_info`.
    pub fn assemble(
        cert_req_info: x509_cert::request::CertReqInfo,
        signature: &[u8],
    ) -> Result<Self> {
        // sha256WithRSAEncryption carries an explicit NULL parameter
        let sig_alg = AlgorithmIdentifierOwned {
            oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            parameters: Some(der::Any::from(der::AnyRef::NULL)),
        };

        let inner = CertReq {
            info: cert_req_info,
            algorithm: sig_alg,
            signature: der::asn1::BitString::from_bytes(signature)
                .map_err(|e| Error::EncodingError(format!("Failed to encode signature: {}", e)))?,
        };

        Ok(Self { inner })
    }

    /// Parse CSR from PEM format
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = pem::parse(pem)
            .map_err(|e| Error::ParseError(format!("Failed to parse PEM: {}", e)))?;

        if der.tag() != "CERTIFICATE REQUEST" && der.tag() != "NEW CERTIFICATE REQUEST" {
            return Err(Error::ParseError(
                "Invalid PEM tag, expected CERTIFICATE REQUEST or NEW CERTIFICATE REQUEST"
                    .to_string(),
            ));
        }

        Self::from_der(der.contents())
    }

    /// Parse CSR from DER format
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertReq::from_der(der)
            .map_err(|e| Error::ParseError(format!("Failed to parse DER: {}", e)))?;

        Ok(Self { inner })
    }

    /// Export CSR to PEM format
    pub fn to_pem(&self) -> Result<String> {
        let der = self.to_der()?;
        Ok(pem::encode(&pem::Pem::new("CERTIFICATE REQUEST", der)))
    }

    /// Export CSR to DER format
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| Error::EncodingError(format!("Failed to encode DER: {}", e)))
    }

    /// Get the subject of the CSR
    pub fn subject(&self) -> Result<CsrSubject> {
        Self::parse_distinguished_name(&self.inner.info.subject)
    }

    /// Get the embedded public key in SPKI DER format
    pub fn public_key_spki_der(&self) -> Result<Vec<u8>> {
        self.inner
            .info
            .public_key
            .to_der()
            .map_err(|e| Error::EncodingError(format!("Failed to encode SPKI: {}", e)))
    }

    /// Verify the CSR signature against the embedded public key
    pub fn verify_signature(&self) -> Result<()> {
        let info_der = self.inner.info.to_der().map_err(|e| {
            Error::EncodingError(format!("Failed to encode info for verification: {}", e))
        })?;

        let spki_der = self.public_key_spki_der()?;
        let signature = self.inner.signature.raw_bytes();

        if verify_with_spki_der(&spki_der, &info_der, signature)? {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }

    // ========================================================================
    // File I/O Operations
    // ========================================================================

    /// Save CSR to PEM file
    pub fn save_pem_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let pem = self.to_pem()?;
        std::fs::write(path, pem).map_err(Error::IoError)
    }

    /// Load CSR from PEM file
    pub fn load_pem_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let pem = std::fs::read_to_string(path).map_err(Error::IoError)?;
        Self::from_pem(&pem)
    }

    /// Build X.509 Distinguished Name from CsrSubject
    pub(crate) fn build_distinguished_name(subject: &CsrSubject) -> Result<x509_cert::name::Name> {
        if subject.common_name.is_empty() {
            return Err(Error::EncodingError(
                "Common Name (CN) is required".to_string(),
            ));
        }

        let mut rdns = Vec::new();
        rdns.push(utf8_rdn(OID_CN, &subject.common_name)?);

        for (oid, value) in [
            (OID_O, &subject.organization),
            (OID_OU, &subject.organizational_unit),
            (OID_C, &subject.country),
            (OID_ST, &subject.state),
            (OID_L, &subject.locality),
        ] {
            if let Some(value) = value {
                if !value.is_empty() {
                    rdns.push(utf8_rdn(oid, value)?);
                }
            }
        }

        // emailAddress is an IA5String, unlike the directory string attributes
        if let Some(email) = &subject.email {
            if !email.is_empty() {
                let value = Ia5StringRef::new(email)
                    .map_err(|e| Error::EncodingError(format!("Invalid email value: {}", e)))?;
                rdns.push(single_rdn(AttributeTypeAndValue {
                    oid: OID_EMAIL,
                    value: der::Any::from(der::AnyRef::from(value)),
                })?);
            }
        }

        Ok(x509_cert::name::Name::from(RdnSequence::from(rdns)))
    }

    /// Parse X.509 Distinguished Name to CsrSubject
    pub(crate) fn parse_distinguished_name(name: &x509_cert::name::Name) -> Result<CsrSubject> {
        let mut subject = CsrSubject::default();

        for rdn in name.0.iter() {
            for attr in rdn.0.iter() {
                if attr.oid == OID_EMAIL {
                    if let Ok(ia5) = Ia5StringRef::try_from(&attr.value) {
                        subject.email = Some(ia5.as_str().to_string());
                    }
                    continue;
                }

                // Our own output uses UTF8String, but external CSRs may
                // carry PrintableString attributes
                let value_str = if let Ok(utf8_str) = Utf8StringRef::try_from(&attr.value) {
                    utf8_str.as_str().to_string()
                } else if let Ok(printable) = PrintableStringRef::try_from(&attr.value) {
                    printable.as_str().to_string()
                } else {
                    continue;
                };

                if attr.oid == OID_CN {
                    subject.common_name = value_str;
                } else if attr.oid == OID_O {
                    subject.organization = Some(value_str);
                } else if attr.oid == OID_OU {
                    subject.organizational_unit = Some(value_str);
                } else if attr.oid == OID_C {
                    subject.country = Some(value_str);
                } else if attr.oid == OID_ST {
                    subject.state = Some(value_str);
                } else if attr.oid == OID_L {
                    subject.locality = Some(value_str);
                }
            }
        }

        if subject.common_name.is_empty() {
            return Err(Error::ParseError(
                "Distinguished name missing required CN".to_string(),
            ));
        }

        Ok(subject)
    }
}

fn utf8_rdn(oid: ObjectIdentifier, value: &str) -> Result<RelativeDistinguishedName> {
    let value = Utf8StringRef::new(value)
        .map_err(|e| Error::EncodingError(format!("Invalid attribute value: {}", e)))?;
    single_rdn(AttributeTypeAndValue {
        oid,
        value: der::Any::from(value),
    })
}

fn single_rdn(attr: AttributeTypeAndValue) -> Result<RelativeDistinguishedName> {
    let mut set = SetOfVec::new();
    set.insert(attr)
        .map_err(|e| Error::EncodingError(format!("Failed to build RDN: {}", e)))?;
    Ok(RelativeDistinguishedName(set))
}

// Re-export CertReqInfo for external use in build_unsigned/assemble pattern
pub use x509_cert::request::CertReqInfo;

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_csr_creation() {
        let key = RsaKey::generate_2048().unwrap();

        let subject = CsrSubject {
            common_name: "test.example.com".to_string(),
            organization: Some("Test Org".to_string()),
            organizational_unit: None,
            country: Some("PL".to_string()),
            state: None,
            locality: Some("Krakow".to_string()),
            email: Some("admin@example.com".to_string()),
        };

        let csr = create_csr(&key, subject.clone()).unwrap();

        let parsed_subject = csr.subject().unwrap();
        assert_eq!(parsed_subject, subject);
    }

    #[test]
    fn test_empty_optional_fields_are_omitted() {
        let key = RsaKey::generate_2048().unwrap();

        let subject = CsrSubject {
            common_name: "test.example.com".to_string(),
            organization: Some(String::new()),
            email: Some(String::new()),
            ..Default::default()
        };

        let csr = create_csr(&key, subject).unwrap();

        let parsed_subject = csr.subject().unwrap();
        assert_eq!(parsed_subject.organization, None);
        assert_eq!(parsed_subject.email, None);
    }

    #[test]
    fn test_csr_pem_roundtrip() {
        let key = RsaKey::generate_2048().unwrap();

        let original_csr = create_csr(&key, CsrSubject::new("test.example.com")).unwrap();
        let pem = original_csr.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));

        let parsed_csr = Csr::from_pem(&pem).unwrap();
        assert_eq!(parsed_csr.to_der().unwrap(), original_csr.to_der().unwrap());
    }

    #[test]
    fn test_csr_file_operations() {
        let dir = tempdir().unwrap();
        let pem_path = dir.path().join("test.csr");

        let key = RsaKey::generate_2048().unwrap();
        let original_csr = create_csr(&key, CsrSubject::new("file-test.example.com")).unwrap();

        original_csr.save_pem_file(&pem_path).unwrap();
        let loaded = Csr::load_pem_file(&pem_path).unwrap();
        assert_eq!(loaded.to_der().unwrap(), original_csr.to_der().unwrap());
    }

    #[test]
    fn test_empty_common_name_rejected() {
        let key = RsaKey::generate_2048().unwrap();
        assert!(create_csr(&key, CsrSubject::new("")).is_err());
    }

    #[test]
    fn test_signature_verification() {
        let key = RsaKey::generate_2048().unwrap();

        let csr = create_csr(&key, CsrSubject::new("verify.example.com")).unwrap();
        csr.verify_signature().unwrap();
    }

    #[test]
    fn test_embedded_public_key_matches_signing_key() {
        let key = RsaKey::generate_2048().unwrap();

        let csr = create_csr(&key, CsrSubject::new("pubkey.example.com")).unwrap();
        assert_eq!(
            csr.public_key_spki_der().unwrap(),
            key.to_spki_der().unwrap()
        );
    }

    #[test]
    fn test_from_pem_with_different_tags() {
        let key = RsaKey::generate_2048().unwrap();

        let original_csr = create_csr(&key, CsrSubject::new("tag-test.example.com")).unwrap();
        let der = original_csr.to_der().unwrap();

        let pem1 = pem::encode(&pem::Pem::new("CERTIFICATE REQUEST", der.clone()));
        assert_eq!(Csr::from_pem(&pem1).unwrap().to_der().unwrap(), der);

        let pem2 = pem::encode(&pem::Pem::new("NEW CERTIFICATE REQUEST", der.clone()));
        assert_eq!(Csr::from_pem(&pem2).unwrap().to_der().unwrap(), der);

        let pem3 = pem::encode(&pem::Pem::new("INVALID TAG", der));
        assert!(Csr::from_pem(&pem3).is_err());
    }

    #[test]
    fn test_build_unsigned_and_assemble() {
        let key = RsaKey::generate_2048().unwrap();
        let subject = CsrSubject {
            common_name: "test-unsigned.example.com".to_string(),
            organization: Some("Test Org".to_string()),
            country: Some("PL".to_string()),
            ..Default::default()
        };

        let spki_der = key.to_spki_der().unwrap();
        let cert_req_info = build_unsigned(subject, &spki_der).unwrap();

        let parsed_subject = Csr::parse_distinguished_name(&cert_req_info.subject).unwrap();
        assert_eq!(parsed_subject.common_name, "test-unsigned.example.com");
        assert_eq!(parsed_subject.organization, Some("Test Org".to_string()));
        assert_eq!(parsed_subject.country, Some("PL".to_string()));

        let info_der = cert_req_info.to_der().unwrap();
        let signature = key.sign(&info_der).unwrap();

        let csr = Csr::assemble(cert_req_info, &signature).unwrap();
        csr.verify_signature().unwrap();

        // Garbage SPKI bytes must be rejected
        assert!(build_unsigned(CsrSubject::new("test.example.com"), &[0u8; 32]).is_err());
    }

    #[test]
    fn test_printable_string_attributes_parsed() {
        let cn = PrintableStringRef::new("printable.example.com").unwrap();
        let c = PrintableStringRef::new("PL").unwrap();

        let rdns = vec![
            single_rdn(AttributeTypeAndValue {
                oid: OID_CN,
                value: der::Any::from(der::AnyRef::from(cn)),
            })
            .unwrap(),
            single_rdn(AttributeTypeAndValue {
                oid: OID_C,
                value: der::Any::from(der::AnyRef::from(c)),
            })
            .unwrap(),
        ];
        let name = x509_cert::name::Name::from(RdnSequence::from(rdns));

        let subject = Csr::parse_distinguished_name(&name).unwrap();
        assert_eq!(subject.common_name, "printable.example.com");
        assert_eq!(subject.country.as_deref(), Some("PL"));
    }

    #[test]
    fn test_non_rsa_spki_rejected() {
        // A minimal Ed25519 SPKI (RFC 8410 example structure, zeroed key)
        let mut spki = vec![
            0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
        ];
        spki.extend_from_slice(&[0u8; 32]);

        let err = build_unsigned(CsrSubject::new("test.example.com"), &spki).unwrap_err();
        assert!(matches!(err, Error::KeyError(_)));
    }
}
