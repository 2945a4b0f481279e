use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::EspeaError;

/// Draws parent couples that are as distinct as possible.
///
/// A couple never pairs a parent with itself, and no unordered pair repeats
/// until all `n * (n - 1) / 2` pairs of `n` parents have been drawn. Each side
/// of a couple is the winner of a tournament over a random subsample of at
/// most `tournament_size` eligible parents.
#[derive(Debug, Clone)]
pub struct DistinctTournamentCoupler {
    tournament_size: usize,
}

impl DistinctTournamentCoupler {
    /// # Panics
    ///
    /// Panics if `tournament_size` is 0.
    pub fn new(tournament_size: usize) -> Self {
        assert!(tournament_size > 0, "tournament size must be at least 1");
        Self { tournament_size }
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }

    /// Returns `requested` couples of parent indices in `0..parent_count`.
    ///
    /// `compare` orders parents by preference; the least parent of a
    /// tournament wins.
    pub fn couples<R, F>(
        &self,
        requested: usize,
        parent_count: usize,
        compare: F,
        rng: &mut R,
    ) -> Result<Vec<(usize, usize)>, EspeaError>
    where
        R: Rng,
        F: Fn(usize, usize) -> Ordering,
    {
        if parent_count < 2 {
            return Err(EspeaError::InsufficientParents(parent_count));
        }
        let distinct = parent_count * (parent_count - 1) / 2;
        let mut couples = Vec::with_capacity(requested);

        while couples.len() < requested {
            // Every parent starts out eligible with every other parent.
            let mut partners: BTreeMap<usize, BTreeSet<usize>> = (0..parent_count)
                .map(|p| (p, (0..parent_count).filter(|&q| q != p).collect()))
                .collect();

            let todo = (requested - couples.len()).min(distinct);
            for _ in 0..todo {
                let Some(male) = self.tournament(partners.keys().copied(), &compare, rng) else {
                    panic!("coupling pass ran out of parents");
                };
                let Some(female) = self.tournament(partners[&male].iter().copied(), &compare, rng)
                else {
                    panic!("parent {male} has no eligible partner left");
                };
                unlink(&mut partners, male, female);
                unlink(&mut partners, female, male);
                couples.push((male, female));
            }
        }
        Ok(couples)
    }

    fn tournament<R, F>(
        &self,
        pool: impl Iterator<Item = usize>,
        compare: &F,
        rng: &mut R,
    ) -> Option<usize>
    where
        R: Rng,
        F: Fn(usize, usize) -> Ordering,
    {
        let pool: Vec<usize> = pool.collect();
        pool.choose_multiple(rng, self.tournament_size)
            .copied()
            .min_by(|&a, &b| compare(a, b))
    }
}

/// Removes `partner` from the eligible set of `parent`, dropping `parent`
/// from the pass once nobody is left for it.
fn unlink(partners: &mut BTreeMap<usize, BTreeSet<usize>>, parent: usize, partner: usize) {
    if let Some(set) = partners.get_mut(&parent) {
        set.remove(&partner);
        if set.is_empty() {
            partners.remove(&parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use std::collections::HashSet;

    fn unordered(couples: &[(usize, usize)]) -> Vec<(usize, usize)> {
        couples.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect()
    }

    #[test]
    fn test_first_pass_has_no_repeats_or_self_pairs() {
        let mut rng = Pcg64::seed_from_u64(7);
        for n in 2..9 {
            let coupler = DistinctTournamentCoupler::new(2);
            let requested = n * (n - 1) / 2;
            let couples = coupler
                .couples(requested, n, |a, b| a.cmp(&b), &mut rng)
                .unwrap();
            assert_eq!(couples.len(), requested);
            assert!(couples.iter().all(|(a, b)| a != b && *a < n && *b < n));
            let distinct: HashSet<_> = unordered(&couples).into_iter().collect();
            assert_eq!(distinct.len(), requested, "n = {n}");
        }
    }

    #[test]
    fn test_exhausted_pass_starts_over() {
        let mut rng = Pcg64::seed_from_u64(3);
        let coupler = DistinctTournamentCoupler::new(1);
        let couples = coupler.couples(7, 3, |_, _| Ordering::Equal, &mut rng).unwrap();
        assert_eq!(couples.len(), 7);
        // Three full passes over the 3 possible pairs, then one more couple.
        for pass in unordered(&couples).chunks(3).filter(|c| c.len() == 3) {
            let distinct: HashSet<_> = pass.iter().collect();
            assert_eq!(distinct.len(), 3);
        }
    }

    #[test]
    fn test_full_tournament_always_picks_preferred_parents() {
        let mut rng = Pcg64::seed_from_u64(11);
        let coupler = DistinctTournamentCoupler::new(10);
        let couples = coupler.couples(10, 5, |a, b| a.cmp(&b), &mut rng).unwrap();
        assert_eq!(
            couples,
            vec![
                (0, 1),
                (0, 2),
                (0, 3),
                (0, 4),
                (1, 2),
                (1, 3),
                (1, 4),
                (2, 3),
                (2, 4),
                (3, 4)
            ]
        );
    }

    #[test]
    fn test_rejects_fewer_than_two_parents() {
        let mut rng = Pcg64::seed_from_u64(0);
        let coupler = DistinctTournamentCoupler::new(2);
        for n in [0, 1] {
            let err = coupler.couples(1, n, |a, b| a.cmp(&b), &mut rng).unwrap_err();
            assert!(matches!(err, EspeaError::InsufficientParents(c) if c == n));
        }
    }

    #[test]
    fn test_zero_requested_is_empty() {
        let mut rng = Pcg64::seed_from_u64(0);
        let couples = DistinctTournamentCoupler::new(2)
            .couples(0, 4, |a, b| a.cmp(&b), &mut rng)
            .unwrap();
        assert!(couples.is_empty());
    }
}
