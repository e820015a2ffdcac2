//! Histogramme des symboles d'un bloc source (§4.1).
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::error::{FseError, FseResult};

/// Compute an histogram with a very basic method.
pub fn simple_count_u8(src: &[u8], ret: &mut [usize; 256]) {
    src.iter().for_each(|&c| ret[c as usize] += 1)
}

/// Même histogramme, mais accumulé directement dans un vecteur déjà
/// alloué par l'appelant plutôt que retourné par valeur.
pub fn count_u8_inplace(src: &[u8], ret: &mut [usize; 256]) -> usize {
    four_way_count(src, ret);
    used_symbols(ret)
}

/// Quatre accumulateurs nourris par des octets entrelacés, pour exposer du
/// parallélisme d'instructions au CPU ; la somme finale est la somme
/// élément par élément des quatre compteurs. Le découpage en quatre voies
/// est un contrat de performance, pas de correction : n'importe quelle
/// implémentation correcte doit produire le même histogramme.
fn four_way_count(src: &[u8], ret: &mut [usize; 256]) {
    let mut c0 = [0usize; 256];
    let mut c1 = [0usize; 256];
    let mut c2 = [0usize; 256];
    let mut c3 = [0usize; 256];

    let chunks = src.chunks_exact(4);
    let remainder = chunks.remainder();
    for chunk in chunks {
        c0[chunk[0] as usize] += 1;
        c1[chunk[1] as usize] += 1;
        c2[chunk[2] as usize] += 1;
        c3[chunk[3] as usize] += 1;
    }
    for &b in remainder {
        c0[b as usize] += 1;
    }

    for i in 0..256 {
        ret[i] += c0[i] + c1[i] + c2[i] + c3[i];
    }
}

/// Un test pour vérifier si l'OoO en rust est possible, de cette manière
/// on obtient des résultat un peu plus lent que le conteur simple.
/// Plus d'investigation autour des conteurs sera nécessaire.
pub fn multi_bucket_count_u8(src: &[u8], ret: &mut [usize; 256]) {
    four_way_count(src, ret)
}

fn used_symbols(count: &[usize; 256]) -> usize {
    count
        .iter()
        .rposition(|&c| c > 0)
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Contrat canonique de la spécification : lit le bloc une fois, renvoie
/// l'histogramme plein-alphabet ainsi que l'indice du plus grand symbole
/// non nul, plus un. Échoue si `src` est vide.
pub fn count(src: &[u8]) -> FseResult<([usize; 256], usize)> {
    if src.is_empty() {
        return Err(FseError::InvalidParameter("cannot count an empty block"));
    }
    let mut hist = [0usize; 256];
    let used = count_u8_inplace(src, &mut hist);
    Ok((hist, used))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_rejects_empty_input() {
        assert!(count(&[]).is_err());
    }

    #[test]
    fn count_matches_simple_count() {
        let src: Vec<u8> = (0..997u32).map(|i| (i % 251) as u8).collect();
        let mut simple = [0usize; 256];
        simple_count_u8(&src, &mut simple);

        let (fast, used) = count(&src).unwrap();
        assert_eq!(simple, fast);
        assert_eq!(used, 251);
    }

    #[test]
    fn count_handles_tail_not_multiple_of_four() {
        let src = vec![1u8, 2, 3, 4, 5];
        let mut simple = [0usize; 256];
        simple_count_u8(&src, &mut simple);
        let mut fast = [0usize; 256];
        four_way_count(&src, &mut fast);
        assert_eq!(simple, fast);
    }

    #[test]
    fn used_symbols_tracks_highest_nonzero_index() {
        let mut hist = [0usize; 256];
        hist[0] = 3;
        hist[5] = 1;
        assert_eq!(used_symbols(&hist), 6);
    }
}
