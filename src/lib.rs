//! Codec FSE (tabled asymmetric numeral systems) sur alphabet octet.
//!
//! Le point d'entrée de haut niveau est [`block::compress`]/
//! [`block::decompress`] (et leurs variantes `compress2`/`decompress_safe`
//! pour contrôler `tableLog`, le nombre de flux d'état et la borne de
//! sortie à la décompression). Les modules internes restent publics pour
//! qui veut piloter le pipeline étape par étape : compter, normaliser,
//! étaler, assembler les tables, coder le flux.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

pub mod block;
pub mod config;
pub mod count;
pub mod error;
pub mod header;
pub mod normalization;
pub mod spreads;
pub mod stats;
pub mod stream;
pub mod tables;

pub use block::{compress, compress2, decompress, decompress_safe};
pub use config::{Config, NbStates, FSE_MAX_NB_SYMBOLS, FSE_MAX_TABLELOG, FSE_MIN_TABLELOG};
pub use error::{FseError, FseResult};
pub use stats::BlockStats;
