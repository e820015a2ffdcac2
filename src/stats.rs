//! Statistiques par appel, en remplacement des compteurs globaux du
//! programme d'origine (voir §9 : "process-wide statistics counters").
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

/// Instantané des statistiques d'un seul bloc, renvoyé par l'appelant
/// au lieu d'être accumulé dans une variable globale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStats {
    pub source_bytes: usize,
    pub output_bytes: usize,
    pub table_log: u8,
    pub used_symbols: usize,
    /// Entropie de Shannon du bloc source, en bits par symbole.
    pub entropy_bits_per_symbol: f64,
}

impl BlockStats {
    pub fn new(
        source_bytes: usize,
        output_bytes: usize,
        table_log: u8,
        used_symbols: usize,
        count: &[usize],
    ) -> Self {
        BlockStats {
            source_bytes,
            output_bytes,
            table_log,
            used_symbols,
            entropy_bits_per_symbol: shannon_entropy(count, source_bytes),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.output_bytes == 0 {
            0.0
        } else {
            self.source_bytes as f64 / self.output_bytes as f64
        }
    }
}

/// Entropie de Shannon explicite, calculée en flottant : la source
/// historique accumule `log2` sans `<math.h>` visible dans le fichier
/// montré (un include transitif probable) ; ici on calcule sans ambiguïté.
fn shannon_entropy(count: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    count
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}
