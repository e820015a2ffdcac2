//! Ce fichier contient multiple implémentation de normalisation. Il est
//! utilisé par la bibliothèque en interne, bien qu'acessible en soit par
//! un utilisateur externe.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::config::{FSE_MAX_TABLELOG, FSE_MIN_TABLELOG};
use crate::error::{FseError, FseResult};

#[derive(Debug)]
pub enum NormError {
    RunLengthEncoding(&'static str),
    MultiplicationOverflow,
    NormalizationError,
}

fn ceil_log2(x: usize) -> u32 {
    debug_assert!(x > 0);
    if x <= 1 {
        0
    } else {
        usize::BITS - (x - 1).leading_zeros()
    }
}

/// Choisit la `table_log` effective (§4.2): bornée par `FSE_MIN_TABLELOG`,
/// `FSE_MAX_TABLELOG`, l'alphabet (chaque symbole doit être représentable)
/// et la précision réellement portée par les données (`ceil(log2(total))`).
fn pick_table_log(total: usize, nb_symbols: usize, requested: Option<u8>) -> FseResult<u8> {
    let min_for_symbols = ceil_log2(nb_symbols.max(1)) as u8;
    let max_for_precision = ceil_log2(total.max(1)) as u8;

    let lower = FSE_MIN_TABLELOG.max(min_for_symbols);
    let upper = FSE_MAX_TABLELOG.min(max_for_precision.max(lower));

    let table_log = match requested {
        Some(t) => t,
        None => upper,
    };
    let table_log = table_log.max(lower).min(upper.max(lower));

    if table_log < FSE_MIN_TABLELOG || table_log > FSE_MAX_TABLELOG {
        return Err(FseError::InvalidParameter(
            "table_log out of [FSE_MIN_TABLELOG, FSE_MAX_TABLELOG]",
        ));
    }
    Ok(table_log)
}

/// Normalisation canonique du coeur (§4.2, "Normalizer" contract):
/// met à l'échelle `count[0..nb_symbols]` pour que la somme vaille
/// exactement `2^actualTableLog`, tout en garantissant qu'aucun symbole
/// non nul ne s'effondre à zéro.
///
/// Renvoie `actualTableLog == 0` dans le cas dégénéré d'un alphabet à un
/// seul symbole (à encoder en RLE par l'appelant, pas par ce module).
pub fn normalize(
    count: &[usize],
    total: usize,
    nb_symbols: usize,
    requested_table_log: Option<u8>,
) -> FseResult<(Vec<usize>, u8)> {
    if total == 0 {
        return Err(FseError::InvalidParameter("total must be non-zero"));
    }
    if nb_symbols == 0 || nb_symbols > count.len() {
        return Err(FseError::InvalidParameter("nb_symbols out of range"));
    }

    let nonzero = count[..nb_symbols].iter().filter(|&&c| c > 0).count();
    if nonzero <= 1 {
        return Ok((vec![0; nb_symbols], 0));
    }

    let table_log = pick_table_log(total, nb_symbols, requested_table_log)?;
    let table_size = 1usize << table_log;

    // Step 1: pre-shift raw counts if the virtual 2^30 range would
    // overflow the scaling multiplication. Each non-zero count rounds up
    // rather than down, so compensation in step 2 never has to raise a
    // count from true zero.
    let log2_total = ceil_log2(total) as i64;
    let shift = (log2_total + table_log as i64 - 30).max(0) as u32;
    let mut working: Vec<usize> = if shift > 0 {
        count[..nb_symbols]
            .iter()
            .map(|&c| if c == 0 { 0 } else { ((c + (1 << shift) - 1) >> shift).max(1) })
            .collect()
    } else {
        count[..nb_symbols].to_vec()
    };

    // Step 2: compensation. If some non-zero symbol would round to zero
    // slots under proportional scaling, boost every non-zero count by a
    // geometrically growing additive term until none would.
    if total > table_size {
        let mut boost = 1usize;
        loop {
            let v_total: u128 = working.iter().map(|&c| c as u128).sum();
            let starved = working
                .iter()
                .any(|&c| c > 0 && (c as u128 * table_size as u128) / v_total == 0);
            if !starved {
                break;
            }
            for c in working.iter_mut() {
                if *c > 0 {
                    *c += boost;
                }
            }
            boost *= 2;
        }
    }

    // Step 3: proportional distribution with a largest-remainder carry,
    // guaranteeing the sum is exactly `table_size` (P2) while never
    // letting a non-zero symbol's allotment reach zero (P3).
    let v_total: u128 = working.iter().map(|&c| c as u128).sum();
    let mut norm = vec![0usize; nb_symbols];
    let mut remainders: Vec<(u128, usize)> = Vec::new();
    let mut allocated: usize = 0;
    for (s, &c) in working.iter().enumerate() {
        if c == 0 {
            continue;
        }
        let scaled = c as u128 * table_size as u128;
        let q = (scaled / v_total).max(1) as usize;
        let r = scaled % v_total;
        norm[s] = q;
        allocated += q;
        remainders.push((r, s));
    }
    remainders.sort_by(|a, b| b.0.cmp(&a.0));

    let mut leftover = table_size as i64 - allocated as i64;
    let mut i = 0;
    while leftover > 0 && !remainders.is_empty() {
        let s = remainders[i % remainders.len()].1;
        norm[s] += 1;
        leftover -= 1;
        i += 1;
    }
    let mut guard = remainders.len().max(1) * 4 + table_size;
    while leftover < 0 && !remainders.is_empty() && guard > 0 {
        let s = remainders[i % remainders.len()].1;
        if norm[s] > 1 {
            norm[s] -= 1;
            leftover += 1;
        }
        i += 1;
        guard -= 1;
    }

    debug_assert_eq!(norm.iter().sum::<usize>(), table_size);
    debug_assert!(count[..nb_symbols]
        .iter()
        .zip(norm.iter())
        .all(|(&c, &n)| c == 0 || n >= 1));

    Ok((norm, table_log))
}

/// Normalisation de la bibliothèque FSE écrite par Yann Collet.
///
/// Notes : Il manque rtbTable et quelques optimisations. Mon objectif
/// principale étant d'écrire ce que je comprend et uniquement ce que je
/// comprend. Une PR avec une amélioration serait la bienvenue avec une
/// excellente description des tenants et des aboutissants ! Sinon je continue
/// à étudier donc les améliorations viendront toute seule.
pub fn fast_normalization_1(
    hist: &[usize],
    table_log: usize,
) -> Result<Vec<usize>, Box<NormError>> {
    let mut norm = vec![0usize; hist.len()];
    let len = hist.len();

    const HIGH_NUM: usize = (usize::BITS - 2) as usize;

    // L'échelle nous permet de travailler sans utiliser des nombres réels,
    // tout en conservant une certaine précision. Les types tels que float,
    // double, etc. sont souvent difficiles à optimiser pour un programme.
    // On cherche un nombre suffisement grand, mais pas trop pour éviter les
    // difficulté de multiplications.
    let scale: usize = HIGH_NUM - table_log;
    let step: usize = (1usize << HIGH_NUM) / hist.iter().sum::<usize>();
    let mut max = 0;
    let mut max_norm = &mut 0;
    let mut still_to_distribute: isize = 1 << table_log;
    for (s, n) in hist.iter().copied().zip(norm.iter_mut()) {
        if s == len {
            // Lorsque la probabilité de trouver un symbole est égale au nombre
            // total de symboles, la méthode de compression la plus simple
            // consiste à compresser en indiquant une plage de ce symbole.
            //
            // C: [Header, Symbol, Len] = [ "rle", "s", 32 ]
            //
            // Il est probable que pour certaines autres caractéristiques, une
            // compression par plage soit préférable. Cependant, cette question
            // devrait être analysée en dehors de la bibliothèque.
            return Err(Box::new(NormError::RunLengthEncoding(
                "An rle compression should be more accurate",
            )));
        } else if s > 0 {
            // La mise à l'échelle a pour biais le fait qu'une grande
            // statistique d'apparition peut potentiellement dépasser
            // la limite d'un nombre sur 32 ou 64 bits (selon l'architecture).
            // D'où le test de multiplication.
            let proba = s
                .checked_mul(step)
                .ok_or(NormError::MultiplicationOverflow)?
                >> scale;
            *n = proba;
            if proba > max {
                max_norm = n;
                max = proba;
            }
            still_to_distribute -= proba as isize;
        }
    }
    if -still_to_distribute >= (max >> 1) as isize {
        return Err(Box::new(NormError::NormalizationError));
    }
    *max_norm += still_to_distribute as usize;
    Ok(norm)
}

/// Même fonction que `fast_normalisation_1` à l'exception qu'on n'augmente pas
/// artificiellement les variables avec une grande valeur. Le fait de
/// travailler avec des nombres rationnels ralentit énormément le calcul.
/// (utiliser la commande `cargo test` pour voir les différences)
pub fn slow_normalization(hist: &[usize], table_log: usize) -> Result<Vec<usize>, Box<NormError>> {
    let mut norm = vec![0usize; hist.len()];
    let step = (1usize << table_log) as isize / hist.iter().sum::<usize>() as isize;
    let mut max = 0;
    let mut max_norm = &mut 0;
    let mut still_to_distribute: isize = 1 << table_log;
    for (s, n) in hist.iter().copied().zip(norm.iter_mut()) {
        if s > 0 {
            let proba = s as isize * step;
            *n = proba as usize;
            if proba > max {
                max_norm = n;
                max = proba;
            }
            still_to_distribute -= proba as isize;
        }
    }
    if -still_to_distribute >= (max >> 1) as isize {
        return Err(Box::new(NormError::NormalizationError));
    }
    *max_norm += still_to_distribute as usize;
    Ok(norm)
}

pub fn zstd_normalization_1_inplace(
    hist: &mut [usize],
    table_log: usize,
) -> Result<(), Box<NormError>> {
    let len = hist.len();
    const HIGH_NUM: usize = (usize::BITS - 2) as usize;

    let scale: usize = HIGH_NUM - table_log;
    let step: usize = (1usize << HIGH_NUM) / hist.iter().sum::<usize>();
    let mut max = 0;
    let mut max_norm = &mut 0;
    let mut still_to_distribute: isize = 1 << table_log;
    for s in hist.iter_mut() {
        if *s == len {
            return Err(Box::new(NormError::RunLengthEncoding(
                "An rle compression should be more accurate",
            )));
        } else if *s > 0 {
            let proba = ((*s) * step) >> scale;
            *s = proba;
            if proba > max {
                max_norm = s;
                max = proba;
            }
            still_to_distribute -= proba as isize;
        }
    }
    if -still_to_distribute >= (max >> 1) as isize {
        // todo: erreur
    }
    *max_norm += still_to_distribute as usize;
    Ok(())
}

/// Build cs = f0 + f1 + ... + fs-1
///
/// # hist
///
/// hist[symbol_index] is symbol frequency
/// hist.len() is number of symbols
pub fn build_cumulative_function(hist: &[usize]) -> Vec<usize> {
    let mut cs = Vec::with_capacity(hist.len() + 1);

    let cumul_fn = |acc, frequency| {
        cs.push(acc);
        acc + frequency
    };
    let sum = hist.iter().fold(0, cumul_fn);
    cs.push(sum);
    cs
}

/// Normalisation utilisant une interpolation linéaire de la somme cumulative
/// de l'histogramme. On normalise la fonction cumulative et on en déduis
/// l'histogramme en calculant la dérivée de la fonction.
///
/// On pourrait surement améliorer cette méthode en la rendant plus robuste.
/// Par exemple on pourrait tenter de normaliser avec une table log < total de
/// l'histogramme. Mais cette méthode reste un peu plus lente que l'original,
/// de plus je ne peux pas affirmer qu'elle soit performante pour la
/// compression. À tester.
///
/// # Return
/// The cumulative function in a Ok, or a normalization error in an Err.
/// The input `histogram` is modified in a side effect.
pub fn derivative_normalization(
    histogram: &mut [usize],
    table_log: usize,
) -> Result<Vec<usize>, NormError> {
    // linear interpolation naïve sur une fonction de cumulation
    let mut previous = 0;
    let mut cumul = build_cumulative_function(histogram);
    let max_cumul = *cumul.last().unwrap();
    let target_range = 1 << table_log; // D - C
    let actual_range = max_cumul; // B - A

    cumul.iter_mut().enumerate().skip(1).for_each(|(i, c)| {
        *c = (target_range * (*c)) / actual_range;
        if *c <= previous {
            panic!("table log too low");
            // todo: we expect to never force value actually...
            // we need to increase table_log instead

            // note: we could force to previous + 1 and accumulate a dept that
            //       we substract to the nexts values. If at the end we keep
            //       a dept > 0 we should panic. If not just inform user that
            //       we got to force the normalized counter to fit.

            // D'autres idées:
            // 1. Correction à posteriorie, si j'ai une dette, après avoir
            // calculé ma cdf je verifie si je peut pas supprimer quelques
            // truc pour forcer a faire entrer dans mon table_log.
            // 2. Panic je double
            // 3. Lorsque je tombe sur un pépin, j'invertie les deux dernières
            // valeurs.
        }

        histogram[i - 1] = *c - previous;
        previous = *c;
    });
    Ok(cumul)
}

/// Pareil en somme à la normalisation dérivative. Excepté qu'on augmente le
/// numérateur avec un nombre important (2^62 ou 2^30 selon l'architecture).
/// Cette méthode peut ne pas être adapté avec des fréquence d'aparitions trop
/// grandes.
pub fn derivative_normalization_fast(
    histogram: &mut [usize],
    table_log: usize,
) -> Result<Vec<usize>, NormError> {
    let mut previous = 0;
    let mut cumul = build_cumulative_function(histogram);
    let max_cumul = *cumul.last().unwrap();
    const HIGH_NUM: usize = usize::BITS as usize - 2;
    let scale: usize = HIGH_NUM - table_log;
    let step = (1 << HIGH_NUM) / max_cumul;
    let mut still_to_distribute = 1 << table_log;
    for (i, c) in cumul.iter_mut().enumerate().skip(1) {
        *c = (*c)
            .checked_mul(step)
            .ok_or(NormError::MultiplicationOverflow)?
            >> scale;
        if *c <= previous {
            panic!("table log too low");
        }
        histogram[i - 1] = *c - previous;
        still_to_distribute -= histogram[i - 1];
        previous = *c;
    }
    if still_to_distribute > 0 {
        *cumul.last_mut().unwrap() += still_to_distribute;
        *histogram.last_mut().unwrap() += still_to_distribute;
    }
    Ok(cumul)
}
