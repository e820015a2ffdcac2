//! Construction des tables de compression (CTable) et de décompression
//! (DTable) à partir des comptes normalisés (§4.4).
//!
//! Généralise `t_ans::build_encode_table` / `build_decode_table` : même
//! algorithme, mais avec des champs nommés plutôt qu'un triplet de
//! vecteurs parallèles, et un alphabet dont les comptes peuvent dépasser
//! `u8` une fois normalisés sur une grande `table_log`.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::error::{FseError, FseResult};
use crate::spreads::stride_spread;

/// Transformée d'un symbole, utilisée à l'encodage pour déterminer le
/// nombre de bits à écrire et retrouver la ligne successeure dans
/// `next_state_table`. Non initialisée (mise à zéro) pour les symboles
/// absents de l'alphabet : jamais référencée dans ce cas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolTransform {
    pub min_bits_out: u32,
    pub max_state: u32,
    pub delta_find_state: i32,
}

/// Table de compression : un successeur par emplacement d'état, et une
/// transformée par symbole.
#[derive(Debug, Clone)]
pub struct CTable {
    pub table_log: u8,
    pub nb_symbols: usize,
    /// `next_state_table[i]` est l'état atteint après avoir émis le
    /// symbole regroupé à la position `i` ; `i` parcourt `0..table_size`
    /// et correspond à un état source `table_size + i`.
    pub next_state_table: Vec<u32>,
    pub symbol_tt: Vec<SymbolTransform>,
}

/// Une ligne de la table de décompression.
#[derive(Debug, Clone, Copy, Default)]
pub struct DEntry {
    pub symbol: u8,
    pub nb_bits: u8,
    pub new_state: u32,
}

/// Table de décompression : `table_size` lignes, indexées par l'état
/// courant.
#[derive(Debug, Clone)]
pub struct DTable {
    pub table_log: u8,
    pub decode: Vec<DEntry>,
}

fn check_normalized(norm: &[usize], table_log: u8) -> FseResult<usize> {
    let table_size = 1usize << table_log;
    if norm.iter().sum::<usize>() != table_size {
        return Err(FseError::InvalidParameter(
            "normalized counts must sum to exactly 2^table_log",
        ));
    }
    Ok(table_size)
}

/// Assemble la table de compression depuis les comptes normalisés
/// (§4.4, "CTable assembly").
pub fn build_c_table(norm: &[usize], table_log: u8) -> FseResult<CTable> {
    let table_size = check_normalized(norm, table_log)?;
    let slot_symbol = stride_spread(norm, table_log as usize);

    let mut symbol_tt = vec![SymbolTransform::default(); norm.len()];
    // cumul[s] = somme des norm[s'] pour s' < s ("total" dans la spec).
    let mut cumul = vec![0u32; norm.len()];
    let mut total: u32 = 0;
    for (s, &n) in norm.iter().enumerate() {
        cumul[s] = total;
        if n == 1 {
            symbol_tt[s] = SymbolTransform {
                min_bits_out: table_log as u32,
                max_state: (2 * table_size - 1) as u32,
                delta_find_state: total as i32 - 1,
            };
        } else if n > 1 {
            let hb = usize::BITS - 1 - (n - 1).leading_zeros();
            let min_bits_out = (table_log as u32 - 1) - hb;
            symbol_tt[s] = SymbolTransform {
                min_bits_out,
                max_state: ((n << (min_bits_out + 1)) - 1) as u32,
                delta_find_state: total as i32 - n as i32,
            };
        }
        total += n as u32;
    }
    debug_assert_eq!(total as usize, table_size);

    let mut next_state_table = vec![0u32; table_size];
    let mut next_cumul = cumul.clone();
    for (i, &sym) in slot_symbol.iter().enumerate() {
        let idx = next_cumul[sym as usize] as usize;
        next_state_table[idx] = (table_size + i) as u32;
        next_cumul[sym as usize] += 1;
    }

    Ok(CTable {
        table_log,
        nb_symbols: norm.len(),
        next_state_table,
        symbol_tt,
    })
}

/// Assemble la table de décompression depuis les comptes normalisés
/// (§4.4, "DTable assembly").
pub fn build_d_table(norm: &[usize], table_log: u8) -> FseResult<DTable> {
    let table_size = check_normalized(norm, table_log)?;
    let slot_symbol = stride_spread(norm, table_log as usize);

    let mut symbol_next = norm.to_vec();
    let mut decode = vec![DEntry::default(); table_size];
    for (i, entry) in decode.iter_mut().enumerate() {
        let sym = slot_symbol[i];
        let x = symbol_next[sym as usize];
        symbol_next[sym as usize] += 1;
        let hb = usize::BITS - 1 - x.leading_zeros();
        let nb_bits = table_log as u32 - hb;
        let new_state = ((x << nb_bits) - table_size) as u32;
        *entry = DEntry {
            symbol: sym,
            nb_bits: nb_bits as u8,
            new_state,
        };
    }

    Ok(DTable { table_log, decode })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm_4_abcd() -> Vec<usize> {
        // table_log = 3, table_size = 8: A=3 B=2 C=2 D=1
        vec![3, 2, 2, 1]
    }

    #[test]
    fn rejects_counts_not_summing_to_table_size() {
        assert!(build_c_table(&[1, 1, 1], 3).is_err());
        assert!(build_d_table(&[1, 1, 1], 3).is_err());
    }

    #[test]
    fn ctable_next_state_table_is_a_permutation_of_the_state_range() {
        let norm = norm_4_abcd();
        let ct = build_c_table(&norm, 3).unwrap();
        let table_size = 8;
        let mut seen = vec![false; table_size];
        for &next in &ct.next_state_table {
            let idx = next as usize - table_size;
            assert!(!seen[idx], "each destination slot visited once");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn dtable_every_slot_has_a_symbol_within_alphabet() {
        let norm = norm_4_abcd();
        let dt = build_d_table(&norm, 3).unwrap();
        assert_eq!(dt.decode.len(), 8);
        for entry in &dt.decode {
            assert!((entry.symbol as usize) < norm.len());
            assert!(entry.nb_bits as u8 <= 3);
        }
    }

    #[test]
    fn single_symbol_alphabet_gets_constant_transform() {
        // norm[s] == 1 special case, table_size == 1.
        let ct = build_c_table(&[1], 0).unwrap();
        assert_eq!(ct.symbol_tt[0].min_bits_out, 0);
        assert_eq!(ct.symbol_tt[0].max_state, 1);
        assert_eq!(ct.symbol_tt[0].delta_find_state, -1);
    }
}
