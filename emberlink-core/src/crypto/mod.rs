// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod agreement;
pub mod encryption;
pub mod fingerprint;

pub use agreement::IdentityKeyPair;
pub use encryption::{decrypt, encrypt, EncryptedPayload, EncryptionError, SymmetricKey};
pub use fingerprint::{fingerprint, sender_id, verify_fingerprint, FINGERPRINT_HEX_LEN};
