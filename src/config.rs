//! Réglages par appel du codec, en remplacement de constantes globales.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

/// Plafond dur du `tableLog`. La source historique documente 15 mais
/// n'asserte que 13 ; on retient ici la valeur par défaut documentée par
/// la spécification (voir `FSE_MEMORY_USAGE - 2`).
pub const FSE_MAX_TABLELOG: u8 = 12;

/// Précision minimale du `tableLog`.
pub const FSE_MIN_TABLELOG: u8 = 5;

/// Nombre maximal de symboles gérés par les tables internes. Le coeur
/// octet n'en utilise jamais plus de 256, mais le budget mémoire suit la
/// constante historique.
pub const FSE_MAX_NB_SYMBOLS: usize = 286;

/// Nombre de flux d'état entrelacés (ILP, §4.5). Le coeur octet ne
/// propose que un ou deux flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NbStates {
    #[default]
    One,
    Two,
}

impl NbStates {
    pub fn count(self) -> usize {
        match self {
            NbStates::One => 1,
            NbStates::Two => 2,
        }
    }
}

/// Réglages par appel, dans l'esprit de `compressor::Context` : les
/// connaissances nécessaires à un bloc donné sont passées explicitement
/// plutôt que figées à la compilation.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// `tableLog` demandé. `None` laisse le normaliseur choisir la
    /// précision la plus adaptée à la taille du bloc.
    pub table_log: Option<u8>,
    /// Nombre de flux d'état entrelacés à utiliser à l'encodage.
    pub nb_states: NbStates,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            table_log: None,
            nb_states: NbStates::One,
        }
    }
}
