//! Occupation-number (Fock) states encoded as bitmasks.
//!
//! A many-body basis state for one spin species on `n` orbitals is an unsigned
//! integer whose bit `i` is set when orbital `i` is occupied. A fixed particle
//! number `k` selects the C(n, k) masks with exactly `k` set bits; they are
//! generated in increasing numeric order so that lookups can use binary search.

use crate::error::{EdError, EdErrorKind};

/// Bitmask representation of an occupation-number state.
pub type FockState = u64;

/// Largest number of orbitals supported. Packed states use `2 * n` bits.
pub const MAX_ORBITALS: usize = 32;

/// Binomial coefficient C(n, k), zero when `k > n`.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    // Each partial product is itself a binomial coefficient, so the division is exact.
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}

/// Dimension of the (nup, ndw) sector on `n` orbitals.
pub fn sector_dim(n: usize, nup: usize, ndw: usize) -> usize {
    binomial(n, nup) * binomial(n, ndw)
}

/// Generates all `n`-bit masks with exactly `k` set bits, sorted ascending.
///
/// Uses Gosper's next-combination recurrence: from a mask `s` the next larger
/// mask with the same popcount is `(((r ^ s) >> 2) / c) | r` with `c = s & -s`
/// and `r = s + c`. The sequence is strictly increasing, hence sorted and free
/// of duplicates.
///
/// # Panics
/// Panics if `n > MAX_ORBITALS`.
pub fn generate_states(n: usize, k: usize) -> Vec<FockState> {
    assert!(
        n <= MAX_ORBITALS,
        "At most {MAX_ORBITALS} orbitals are supported, got {n}."
    );
    if k > n {
        return Vec::new();
    }
    if k == 0 {
        return vec![0];
    }

    let limit: FockState = 1 << n;
    let mut states = Vec::with_capacity(binomial(n, k));
    let mut s: FockState = (1 << k) - 1;
    while s < limit {
        states.push(s);
        let c = s & s.wrapping_neg();
        let r = s + c;
        s = (((r ^ s) >> 2) / c) | r;
    }
    states
}

/// Generates the states of the (nup, ndw) sector packed into single masks of
/// width `2 * n`: bits `0..n` hold the up occupation, bits `n..2n` the down one.
///
/// The order follows the composite index `iup + idw * dup`.
pub fn generate_packed_states(n: usize, nup: usize, ndw: usize) -> Vec<FockState> {
    let up = generate_states(n, nup);
    let dw = generate_states(n, ndw);
    dw.iter()
        .flat_map(|&sdw| up.iter().map(move |&sup| pack(n, sup, sdw)))
        .collect()
}

/// Packs an up and a down mask into one `2 * n`-bit mask.
#[inline]
pub fn pack(n: usize, up: FockState, dw: FockState) -> FockState {
    up | (dw << n)
}

/// Splits a packed `2 * n`-bit mask into its (up, down) halves.
#[inline]
pub fn unpack(n: usize, state: FockState) -> (FockState, FockState) {
    let mask_up: FockState = (1 << n) - 1;
    (state & mask_up, (state >> n) & mask_up)
}

/// Returns the index of `state` in the sorted array `states`.
///
/// Callers only search for states known to belong to the array (for example
/// the image of a basis state under an operator that maps into this sector),
/// so a miss indicates a broken invariant and is reported as an error.
pub fn binsearch(states: &[FockState], state: FockState) -> Result<usize, EdError> {
    states
        .binary_search(&state)
        .map_err(|_| EdErrorKind::StateNotFound { state }.into())
}
