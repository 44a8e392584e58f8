pub mod aead;
pub mod key;
