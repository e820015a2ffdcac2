//! Codec de l'en-tête auto-descriptif des comptes normalisés (§4.3).
//!
//! L'en-tête sérialise `(tableLog, norm[])` en largeur de bits adaptative :
//! plus la masse de probabilité restante rétrécit, moins de bits sont
//! nécessaires pour exprimer le compte du symbole suivant. Une évasion à
//! deux niveaux absorbe les longues suites de symboles absents sans leur
//! faire payer un bit plein chacun.
//!
//! Contrairement au mécanisme historique de `fse.c`, qui désambiguïse la
//! largeur courte/longue en partageant un bit avec le symbole suivant puis
//! en le "rendant" au flux si l'hypothèse était fausse, ce module écrit un
//! bit de fanion explicite devant chaque valeur. `tiny-bitstream` n'expose
//! pas de primitive de "retour en arrière" d'un bit déjà lu ; le fanion
//! explicite coûte un bit de plus par symbole mais rend l'encodage et le
//! décodage trivialement symétriques. Voir DESIGN.md.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use tiny_bitstream::{BitDstream, BitEstream, BitReader, BitWriter};

use crate::config::{FSE_MAX_NB_SYMBOLS, FSE_MIN_TABLELOG};
use crate::error::{FseError, FseResult};

/// Écrit `4 bits (tableLog - FSE_MIN_TABLELOG)` suivis des comptes
/// normalisés. `norm` doit sommer exactement à `2^table_log` et ne pas
/// contenir de zéros de fin (le dernier symbole doit être non nul) : c'est
/// la longueur du vecteur qui fixe implicitement `nbSymbols` à la lecture.
pub fn write_header(norm: &[usize], table_log: u8) -> FseResult<Vec<u8>> {
    if table_log < FSE_MIN_TABLELOG {
        return Err(FseError::InvalidParameter(
            "table_log below FSE_MIN_TABLELOG",
        ));
    }
    let table_size = 1usize << table_log;
    if norm.iter().sum::<usize>() != table_size {
        return Err(FseError::InvalidParameter(
            "normalized counts must sum to 2^table_log",
        ));
    }
    if norm.len() > FSE_MAX_NB_SYMBOLS {
        return Err(FseError::InvalidParameter("too many symbols for a header"));
    }

    // `BitEstream`/`BitDstream` pair up the way the core stream codec uses
    // them (§4.5): a `BitDstream` replays a `BitEstream`'s writes back in
    // reverse chronological order, not in write order (the same mechanism
    // that lets `encode_single` store its final state "for free" as the
    // first thing the decoder reads). The header has no such reverse
    // relationship to exploit; its fields must come back out in the order
    // they describe the alphabet. So every field below is staged into
    // `fields` in logical order first, then pushed onto `estream` back to
    // front, with `table_log` written last so it lands first on read.
    let mut fields: Vec<(usize, u8)> = Vec::new();

    let mut remaining: i64 = table_size as i64;
    let mut threshold: i64 = table_size as i64;
    let mut nb_bits: u32 = table_log as u32 + 1;
    let mut previous_is_0 = false;

    let mut symbol = 0usize;
    while symbol < norm.len() {
        if previous_is_0 {
            let start = symbol;
            while symbol < norm.len() && norm[symbol] == 0 {
                symbol += 1;
            }
            stage_zero_run(&mut fields, symbol - start);
            if symbol >= norm.len() {
                break;
            }
        }

        let count = norm[symbol];
        let max = 2 * threshold - 1 - remaining;
        if (count as i64) < max {
            fields.push((0, 1));
            fields.push((count, (nb_bits - 1) as u8));
        } else {
            fields.push((1, 1));
            fields.push((count, nb_bits as u8));
        }
        remaining -= count as i64;
        symbol += 1;
        previous_is_0 = count == 0;
        while remaining < threshold {
            nb_bits -= 1;
            threshold >>= 1;
        }
    }

    if remaining != 0 {
        return Err(FseError::InvalidParameter(
            "normalized counts did not exhaust the probability budget",
        ));
    }

    let mut estream = BitEstream::new();
    for (value, width) in fields.iter().rev() {
        estream.unchecked_write(*value, *width);
    }
    estream.unchecked_write((table_log - FSE_MIN_TABLELOG) as usize, 4);

    Ok(estream.try_into().unwrap())
}

fn stage_zero_run(fields: &mut Vec<(usize, u8)>, mut run: usize) {
    while run >= 24 {
        fields.push((0xFFFF, 16));
        run -= 24;
    }
    while run >= 3 {
        fields.push((0b11, 2));
        run -= 3;
    }
    fields.push((run, 2));
}

fn read_zero_run(dstream: &mut BitDstream) -> FseResult<usize> {
    let mut run = 0usize;
    loop {
        let group = dstream
            .read(2)
            .map_err(|_| FseError::MalformedHeader("truncated zero run"))?;
        run += group;
        if group != 3 {
            break;
        }
        if run > FSE_MAX_NB_SYMBOLS {
            return Err(FseError::MalformedHeader("zero run longer than the alphabet"));
        }
    }
    Ok(run)
}

/// Parse `writeHeader`'s output, inverse exact de `write_header`. Le
/// nombre de symboles décodés n'est pas stocké explicitement : la lecture
/// s'arrête dès que `remaining` atteint zéro, ce qui fixe `nbSymbols`.
pub fn read_header(src: Vec<u8>) -> FseResult<(Vec<usize>, u8)> {
    let mut dstream: BitDstream = src
        .try_into()
        .map_err(|_| FseError::MalformedHeader("could not open header bitstream"))?;
    dstream
        .read(1)
        .map_err(|_| FseError::MalformedHeader("truncated header bitstream"))?; // read mark

    let table_log = FSE_MIN_TABLELOG
        + dstream
            .read(4)
            .map_err(|_| FseError::MalformedHeader("truncated table log field"))? as u8;
    let table_size = 1usize << table_log;

    let mut norm = Vec::new();
    let mut remaining: i64 = table_size as i64;
    let mut threshold: i64 = table_size as i64;
    let mut nb_bits: u32 = table_log as u32 + 1;
    let mut previous_is_0 = false;

    while remaining > 0 {
        if previous_is_0 {
            let extra = read_zero_run(&mut dstream)?;
            for _ in 0..extra {
                norm.push(0);
            }
        }
        if remaining == 0 {
            break;
        }
        if norm.len() >= FSE_MAX_NB_SYMBOLS {
            return Err(FseError::MalformedHeader(
                "header consumes more symbols than the alphabet allows",
            ));
        }

        let flag = dstream
            .read(1)
            .map_err(|_| FseError::MalformedHeader("truncated symbol flag"))?;
        let count = if flag == 0 {
            dstream
                .read((nb_bits - 1) as u8)
                .map_err(|_| FseError::MalformedHeader("truncated short count"))?
        } else {
            dstream
                .read(nb_bits as u8)
                .map_err(|_| FseError::MalformedHeader("truncated long count"))?
        };

        if count as i64 > remaining {
            return Err(FseError::MalformedHeader(
                "symbol count exceeds remaining probability mass",
            ));
        }
        norm.push(count);
        remaining -= count as i64;
        previous_is_0 = count == 0;
        while remaining < threshold {
            nb_bits -= 1;
            threshold >>= 1;
        }
    }

    if remaining != 0 {
        return Err(FseError::MalformedHeader(
            "header did not exhaust the probability budget",
        ));
    }

    Ok((norm, table_log))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(norm: Vec<usize>, table_log: u8) {
        let bytes = write_header(&norm, table_log).expect("write_header should succeed");
        let (decoded, decoded_log) = read_header(bytes).expect("read_header should succeed");
        assert_eq!(decoded, norm);
        assert_eq!(decoded_log, table_log);
    }

    #[test]
    fn roundtrips_a_small_dense_alphabet() {
        roundtrip(vec![3, 2, 2, 1], 3);
    }

    #[test]
    fn roundtrips_sparse_alphabet_with_short_zero_runs() {
        // table_log = 4, table_size = 16.
        roundtrip(vec![8, 0, 0, 4, 0, 3, 1], 4);
    }

    #[test]
    fn roundtrips_long_zero_run_spanning_the_16_bit_escape() {
        // 30 zeros between two non-zero symbols exercises the 24-zero
        // escape followed by a 3-zero and a 2-bit tail.
        let mut norm = vec![0usize; 32];
        norm[0] = 480;
        norm[31] = 32;
        roundtrip(norm, 9); // table_size = 512
    }

    #[test]
    fn roundtrips_full_byte_alphabet() {
        let table_log = 8u8;
        let table_size = 1usize << table_log;
        let norm = vec![1usize; table_size];
        roundtrip(norm, table_log);
    }

    #[test]
    fn rejects_counts_not_summing_to_table_size() {
        assert!(write_header(&[1, 1, 1], 4).is_err());
    }

    #[test]
    fn rejects_truncated_header_bytes() {
        let bytes = write_header(&[3, 2, 2, 1], 3).unwrap();
        let truncated = bytes[..1].to_vec();
        assert!(read_header(truncated).is_err());
    }
}
