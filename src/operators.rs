//! Fermionic creation and annihilation operators acting on bitmask states.
//!
//! With orbitals ordered by bit position, `c†_pos` and `c_pos` pick up the sign
//! `(-1)^m`, where `m` is the number of occupied orbitals below `pos`.

use crate::fock::FockState;
use serde::{Deserialize, Serialize};

/// Anticommutation sign for an operator acting at `pos`.
#[inline]
fn jordan_wigner_sign(state: FockState, pos: usize) -> f64 {
    let below = state & ((1 << pos) - 1);
    // 1 - 2 * parity maps even -> +1, odd -> -1 without branching.
    1.0 - 2.0 * (below.count_ones() & 1) as f64
}

/// Returns `true` if orbital `pos` is occupied in `state`.
#[inline]
pub fn is_occupied(state: FockState, pos: usize) -> bool {
    (state >> pos) & 1 == 1
}

/// Returns `true` if orbital `pos` is empty in `state`.
#[inline]
pub fn is_empty(state: FockState, pos: usize) -> bool {
    !is_occupied(state, pos)
}

/// Applies `c†_pos`. The orbital must be empty (see [`is_empty`]).
#[inline]
pub fn create(state: FockState, pos: usize) -> (f64, FockState) {
    debug_assert!(is_empty(state, pos));
    (jordan_wigner_sign(state, pos), state | (1 << pos))
}

/// Applies `c_pos`. The orbital must be occupied (see [`is_occupied`]).
#[inline]
pub fn annihilate(state: FockState, pos: usize) -> (f64, FockState) {
    debug_assert!(is_occupied(state, pos));
    (jordan_wigner_sign(state, pos), state & !(1 << pos))
}

/// A single-orbital fermionic operator together with its occupation guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FermionOp {
    /// `c†`: adds a particle.
    Create,
    /// `c`: removes a particle.
    Annihilate,
}

impl FermionOp {
    /// Applies the operator at `pos`, or returns `None` when the result is the
    /// zero vector (creating on an occupied or annihilating an empty orbital).
    #[inline]
    pub fn apply(self, state: FockState, pos: usize) -> Option<(f64, FockState)> {
        match self {
            FermionOp::Create if is_empty(state, pos) => Some(create(state, pos)),
            FermionOp::Annihilate if is_occupied(state, pos) => Some(annihilate(state, pos)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fock::generate_states;

    #[test]
    fn test_signs() {
        // |0b1011>: orbitals 0, 1, 3 occupied.
        let s = 0b1011;
        assert_eq!(create(s, 2), (1.0, 0b1111));
        assert_eq!(annihilate(s, 0), (1.0, 0b1010));
        assert_eq!(annihilate(s, 1), (-1.0, 0b1001));
        assert_eq!(annihilate(s, 3), (1.0, 0b0011));
        assert_eq!(create(0b0110, 4), (1.0, 0b10110));
        assert_eq!(create(0b0111, 4), (-1.0, 0b10111));
    }

    #[test]
    fn test_guards() {
        assert!(FermionOp::Create.apply(0b10, 1).is_none());
        assert!(FermionOp::Annihilate.apply(0b10, 0).is_none());
        assert_eq!(FermionOp::Create.apply(0b10, 0), Some((1.0, 0b11)));
        assert_eq!(FermionOp::Annihilate.apply(0b11, 1), Some((-1.0, 0b01)));
    }

    #[test]
    fn test_create_then_annihilate_round_trip() {
        let n = 6;
        for k in 0..n {
            for s in generate_states(n, k) {
                for pos in (0..n).filter(|&p| is_empty(s, p)) {
                    let (s1, t) = create(s, pos);
                    let (s2, back) = annihilate(t, pos);
                    assert_eq!(back, s);
                    assert_eq!(s1 * s1, 1.0);
                    // Bits below `pos` are untouched, so c c† picks up sign^2 = +1.
                    assert_eq!(s1 * s2, 1.0);
                }
            }
        }
    }

    #[test]
    fn test_anticommutation_on_distinct_orbitals() {
        // c†_i c†_j = - c†_j c†_i
        let s = 0b0100;
        let (a1, t1) = create(s, 0);
        let (a2, t2) = create(t1, 3);
        let (b1, u1) = create(s, 3);
        let (b2, u2) = create(u1, 0);
        assert_eq!(t2, u2);
        assert_eq!(a1 * a2, -(b1 * b2));
    }
}
