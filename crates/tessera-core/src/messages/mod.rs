//! Protocol messages exchanged between a requester and ritual participants.

mod decryption;
mod kit;

pub use decryption::{
    DecryptionRequest, DecryptionResponse, DecryptionShare, EncryptedDecryptionRequest,
    EncryptedDecryptionResponse,
};
pub use kit::{
    AccessControlPolicy, AuthenticatedData, Ciphertext, CiphertextHeader, Conditions, Context,
    ThresholdMessageKit,
};
