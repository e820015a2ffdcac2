//! Codec du flux d'états tANS (§4.5) : encodage/décodage d'une séquence de
//! symboles sur un CTable/DTable déjà construit, avec conteneur de bits LSB
//! first, et le format de flux, parallèle ou non.
//!
//! Généralise `t_ans::encode_symbol` / `decode_symbol` / `encode_tans` /
//! `decode_tans` : même mécanique de transition d'état, mais branchée sur
//! les structures typées de [`crate::tables`] plutôt que sur un triplet de
//! vecteurs parallèles, et augmentée d'un descripteur de flux explicite
//! (§4.5, "stream descriptor") plutôt que de laisser l'appelant se
//! souvenir hors-bande de l'état final et de la position du dernier bit.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use tiny_bitstream::{BitDstream, BitEstream, BitReader, BitWriter};

use crate::config::NbStates;
use crate::error::{FseError, FseResult};
use crate::tables::{CTable, DTable};

/// `bits 0..=2`: position du dernier bit significatif dans le dernier
/// octet du payload (0 signifie "l'octet est plein"). `bits 3..=29`:
/// longueur du payload en bits. `bits 30..=31`: `nbStates - 1`.
fn pack_descriptor(payload_bits: u32, final_bit_pos: u8, nb_states: NbStates) -> u32 {
    debug_assert!(final_bit_pos < 8);
    debug_assert!(payload_bits < (1 << 27));
    let nb_states_field = (nb_states.count() - 1) as u32;
    (final_bit_pos as u32) | (payload_bits << 3) | (nb_states_field << 30)
}

fn unpack_descriptor(descriptor: u32) -> (u32, u8, NbStates) {
    let final_bit_pos = (descriptor & 0b111) as u8;
    let payload_bits = (descriptor >> 3) & ((1 << 27) - 1);
    let nb_states = match descriptor >> 30 {
        0 => NbStates::One,
        1 => NbStates::Two,
        _ => NbStates::One,
    };
    (payload_bits, final_bit_pos, nb_states)
}

/// Encode `src` sur un seul état tANS. Les symboles sont poussés dans le
/// flux en ordre inverse (le dernier symbole de `src` est le premier émis)
/// afin que le décodeur, qui lit dans l'ordre direct, retrouve `src` dans
/// son ordre d'origine.
///
/// Renvoie `[descriptor:4 octets LE][payload]`.
pub fn encode_single(src: &[u8], ctable: &CTable) -> FseResult<Vec<u8>> {
    if src.is_empty() {
        return Err(FseError::InvalidParameter("cannot encode an empty block"));
    }
    let table_size = 1u32 << ctable.table_log;
    let mut estream = BitEstream::new();
    let mut state = table_size;
    let mut bits_written: u32 = 0;

    for &symbol in src.iter().rev() {
        let tt = ctable
            .symbol_tt
            .get(symbol as usize)
            .ok_or(FseError::InvalidParameter("symbol outside of the trained alphabet"))?;
        let nb_bits_out = if state <= tt.max_state {
            tt.min_bits_out
        } else {
            tt.min_bits_out + 1
        };
        estream.unchecked_write(state as usize, nb_bits_out as u8);
        bits_written += nb_bits_out;
        let idx = (state >> nb_bits_out) as i32 + tt.delta_find_state;
        state = ctable.next_state_table[idx as usize];
    }

    // Cheap last-symbol storage: emit the final state itself, using
    // table_log bits, so the decoder recovers its starting state directly
    // without walking a sentinel symbol through the table.
    estream.unchecked_write(state as usize, ctable.table_log);
    bits_written += ctable.table_log as u32;

    let final_bit_pos = (bits_written % 8) as u8;
    let payload: Vec<u8> = estream.try_into().unwrap();
    let payload_bits = (payload.len() * 8) as u32;

    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&pack_descriptor(payload_bits, final_bit_pos as u8, NbStates::One).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Décode un flux produit par [`encode_single`]. `nb_symbols` est le
/// nombre de symboles à restituer (porté hors-bande par le format de bloc,
/// §4.6).
pub fn decode_single(src: &[u8], dtable: &DTable, nb_symbols: usize) -> FseResult<Vec<u8>> {
    if src.len() < 4 {
        return Err(FseError::CorruptStream("stream too short for a descriptor"));
    }
    let descriptor = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
    let (payload_bits, _final_bit_pos, nb_states) = unpack_descriptor(descriptor);
    if !matches!(nb_states, NbStates::One) {
        return Err(FseError::CorruptStream(
            "descriptor requests two interleaved states but decode_single only knows one",
        ));
    }
    let payload = &src[4..];
    if (payload.len() * 8) as u32 != payload_bits {
        return Err(FseError::CorruptStream("payload length does not match descriptor"));
    }

    let mut dstream: BitDstream = payload
        .to_vec()
        .try_into()
        .map_err(|_| FseError::CorruptStream("could not open payload bitstream"))?;
    dstream
        .read(1)
        .map_err(|_| FseError::CorruptStream("truncated payload bitstream"))?; // read mark

    let mut state = dstream
        .read(dtable.table_log)
        .map_err(|_| FseError::CorruptStream("truncated initial state"))? as u32;

    let mut out = vec![0u8; nb_symbols];
    for byte in out.iter_mut() {
        let entry = dtable
            .decode
            .get(state as usize)
            .ok_or(FseError::CorruptStream("state escaped the decode table"))?;
        *byte = entry.symbol;
        let bits = dstream
            .read(entry.nb_bits)
            .map_err(|_| FseError::OutputOverrun("stream exhausted before nb_symbols were produced"))?
            as u32;
        state = entry.new_state + bits;
    }
    Ok(out)
}

/// Encode `src` sur deux états interentrelacés partageant le même CTable
/// (ILP, §4.5). Les symboles pairs alimentent l'état 0, les impairs
/// l'état 1 ; chaque état est avancé à son tour, de sorte qu'un décodeur
/// scalaire et un décodeur superscalaire produisent la même séquence.
///
/// Un préambule de rattrapage gère le cas où `src.len()` est impair : le
/// dernier symbole ne traverse que l'état 0.
pub fn encode_dual(src: &[u8], ctable: &CTable) -> FseResult<Vec<u8>> {
    if src.is_empty() {
        return Err(FseError::InvalidParameter("cannot encode an empty block"));
    }
    let table_size = 1u32 << ctable.table_log;
    let mut estream = BitEstream::new();
    let mut state0 = table_size;
    let mut state1 = table_size;

    let mut bits_written: u32 = 0;
    let mut push = |state: &mut u32, symbol: u8, estream: &mut BitEstream| -> FseResult<()> {
        let tt = ctable
            .symbol_tt
            .get(symbol as usize)
            .ok_or(FseError::InvalidParameter("symbol outside of the trained alphabet"))?;
        let nb_bits_out = if *state <= tt.max_state {
            tt.min_bits_out
        } else {
            tt.min_bits_out + 1
        };
        estream.unchecked_write(*state as usize, nb_bits_out as u8);
        bits_written += nb_bits_out;
        let idx = (*state >> nb_bits_out) as i32 + tt.delta_find_state;
        *state = ctable.next_state_table[idx as usize];
        Ok(())
    };

    let mut it = src.iter().rev();
    // Catch-up preamble: if the length is odd, the oldest symbol only
    // travels through state0 so both lanes finish on an even boundary.
    if src.len() % 2 == 1 {
        let &symbol = it.next().unwrap();
        push(&mut state0, symbol, &mut estream)?;
    }
    while let (Some(&b), Some(&a)) = (it.next(), it.next()) {
        push(&mut state1, b, &mut estream)?;
        push(&mut state0, a, &mut estream)?;
    }

    estream.unchecked_write(state0 as usize, ctable.table_log);
    estream.unchecked_write(state1 as usize, ctable.table_log);
    bits_written += 2 * ctable.table_log as u32;

    let final_bit_pos = (bits_written % 8) as u8;
    let payload: Vec<u8> = estream.try_into().unwrap();
    let payload_bits = (payload.len() * 8) as u32;

    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&pack_descriptor(payload_bits, final_bit_pos as u8, NbStates::Two).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Décode un flux produit par [`encode_dual`].
pub fn decode_dual(src: &[u8], dtable: &DTable, nb_symbols: usize) -> FseResult<Vec<u8>> {
    if src.len() < 4 {
        return Err(FseError::CorruptStream("stream too short for a descriptor"));
    }
    let descriptor = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
    let (payload_bits, _final_bit_pos, nb_states) = unpack_descriptor(descriptor);
    if !matches!(nb_states, NbStates::Two) {
        return Err(FseError::CorruptStream(
            "descriptor requests a single state but decode_dual expects two",
        ));
    }
    let payload = &src[4..];
    if (payload.len() * 8) as u32 != payload_bits {
        return Err(FseError::CorruptStream("payload length does not match descriptor"));
    }

    let mut dstream: BitDstream = payload
        .to_vec()
        .try_into()
        .map_err(|_| FseError::CorruptStream("could not open payload bitstream"))?;
    dstream
        .read(1)
        .map_err(|_| FseError::CorruptStream("truncated payload bitstream"))?; // read mark

    // The encoder wrote state0 then state1 last, so the LIFO container
    // hands them back most-recently-written-first: the first read here is
    // already the true final state1, the second the true final state0. No
    // swap needed — these two reads are already correctly named.
    let mut state1 = dstream
        .read(dtable.table_log)
        .map_err(|_| FseError::CorruptStream("truncated initial state"))? as u32;
    let mut state0 = dstream
        .read(dtable.table_log)
        .map_err(|_| FseError::CorruptStream("truncated initial state"))? as u32;

    let mut pull = |state: &mut u32, dstream: &mut BitDstream| -> FseResult<u8> {
        let entry = dtable
            .decode
            .get(*state as usize)
            .ok_or(FseError::CorruptStream("state escaped the decode table"))?;
        let bits = dstream
            .read(entry.nb_bits)
            .map_err(|_| FseError::OutputOverrun("stream exhausted before nb_symbols were produced"))?
            as u32;
        *state = entry.new_state + bits;
        Ok(entry.symbol)
    };

    // Symbols come off the stream in the reverse of the encoder's push
    // order, which alternates state0/state1 starting at state0 regardless
    // of the catch-up preamble: for an odd-length source the catch-up
    // symbol was the encoder's very first push (so it's the decoder's very
    // last pull), landing on whichever state the plain alternation already
    // reaches at the final index. No separate odd-length case is needed.
    let mut out = vec![0u8; nb_symbols];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = if i % 2 == 0 {
            pull(&mut state0, &mut dstream)?
        } else {
            pull(&mut state1, &mut dstream)?
        };
    }
    Ok(out)
}
