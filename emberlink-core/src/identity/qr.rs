// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fingerprint QR Payload
//!
//! The out-of-band verification artifact: one node displays its fingerprint
//! as a QR code, the other scans it and checks it against the public key it
//! learned in-band. An attacker in the middle of the key exchange cannot
//! forge this without also controlling the visual channel.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

use crate::crypto::fingerprint;

/// Payload format version.
const QR_VERSION: u8 = 1;

/// Magic bytes identifying an Emberlink fingerprint QR.
const MAGIC: &[u8; 4] = b"EMFP";

/// QR payload errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QrError {
    #[error("Not an Emberlink fingerprint QR")]
    InvalidFormat,
    #[error("Unsupported QR payload version {0}")]
    UnsupportedVersion(u8),
}

/// Fingerprint QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintQr {
    version: u8,
    /// The 16 raw bytes behind the 32-hex-char fingerprint.
    fingerprint_bytes: [u8; 16],
}

impl FingerprintQr {
    /// Builds the payload for a public key.
    pub fn new(public_key: &[u8; 32]) -> Self {
        let fp_hex = fingerprint(public_key);
        let mut fingerprint_bytes = [0u8; 16];
        // fingerprint() always yields 32 hex chars
        let decoded = hex::decode(&fp_hex).expect("fingerprint is valid hex");
        fingerprint_bytes.copy_from_slice(&decoded);

        FingerprintQr {
            version: QR_VERSION,
            fingerprint_bytes,
        }
    }

    /// The fingerprint in display/scan form (32 lowercase hex chars).
    pub fn fingerprint(&self) -> String {
        hex::encode(self.fingerprint_bytes)
    }

    /// Encodes the payload to a string for embedding in a QR code.
    pub fn to_data_string(&self) -> String {
        // Format: base64(MAGIC || version || fingerprint_bytes)
        let mut data = Vec::with_capacity(4 + 1 + 16);
        data.extend_from_slice(MAGIC);
        data.push(self.version);
        data.extend_from_slice(&self.fingerprint_bytes);
        BASE64.encode(&data)
    }

    /// Parses a scanned QR data string back into a payload.
    pub fn from_data_string(data: &str) -> Result<Self, QrError> {
        let bytes = BASE64.decode(data.trim()).map_err(|_| QrError::InvalidFormat)?;

        // MAGIC(4) + version(1) + fingerprint(16)
        if bytes.len() != 21 || &bytes[0..4] != MAGIC {
            return Err(QrError::InvalidFormat);
        }

        let version = bytes[4];
        if version != QR_VERSION {
            return Err(QrError::UnsupportedVersion(version));
        }

        let mut fingerprint_bytes = [0u8; 16];
        fingerprint_bytes.copy_from_slice(&bytes[5..21]);

        Ok(FingerprintQr {
            version,
            fingerprint_bytes,
        })
    }

    /// Renders the QR code as a terminal-friendly string.
    pub fn to_qr_image_string(&self) -> String {
        use qrcode::QrCode;

        let data = self.to_data_string();
        let code = QrCode::new(&data).expect("QR generation should not fail");

        code.render()
            .light_color(' ')
            .dark_color('\u{2588}')
            .quiet_zone(false)
            .build()
    }
}
