//! Erreurs renvoyées par le codec FSE.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use std::fmt;

/// Taxonomie d'erreur du coeur FSE. Chaque variante correspond à une des
/// quatre familles décrites dans la spécification : paramètre invalide,
/// en-tête malformé, flux corrompu, dépassement de capacité en sortie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FseError {
    /// `tableLog` hors bornes, `nbSymbols` trop grand, entrée vide...
    InvalidParameter(&'static str),
    /// L'en-tête consomme plus de symboles qu'annoncé, ou `remaining < 0`.
    MalformedHeader(&'static str),
    /// Le décodage se termine avec des bits restants, ou le pointeur
    /// n'est pas revenu au début du flux.
    CorruptStream(&'static str),
    /// Mode sûr uniquement : la charge utile lirait au-delà de la
    /// capacité déclarée par l'appelant.
    OutputOverrun(&'static str),
}

impl fmt::Display for FseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FseError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            FseError::MalformedHeader(msg) => write!(f, "malformed header: {msg}"),
            FseError::CorruptStream(msg) => write!(f, "corrupt stream: {msg}"),
            FseError::OutputOverrun(msg) => write!(f, "output overrun: {msg}"),
        }
    }
}

impl std::error::Error for FseError {}

pub type FseResult<T> = Result<T, FseError>;
