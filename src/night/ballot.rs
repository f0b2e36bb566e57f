//! Wolf-vote collection and finalization (spec.md §4.4 "Wolf-vote
//! finalization"). Votes accumulate order-independently in a
//! `WolfBallot`; only the finalizer's tally is observable state.

use std::collections::HashMap;

use crate::night::action::Action;
use crate::protocol::types::Seat;

/// In-progress wolf-meeting vote collection for one night.
#[derive(Debug, Clone, Default)]
pub struct WolfBallot {
    /// `voterSeat -> targetSeat`; `None` target means an explicit abstain.
    votes: HashMap<Seat, Option<Seat>>,
}

impl WolfBallot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or overwrites one voter's ballot. The once-guard on the
    /// finalized `Action` (not on individual votes) is what spec.md means
    /// by "one vote per wolf seat" — a voter may change their vote freely
    /// until the finalizer runs.
    pub fn cast(&mut self, voter: Seat, target: Option<Seat>) {
        self.votes.insert(voter, target);
    }

    pub fn has_voted(&self, voter: Seat) -> bool {
        self.votes.contains_key(&voter)
    }

    pub fn voter_count(&self) -> usize {
        self.votes.len()
    }

    /// The raw ballot a given voter cast, if any: `Some(None)` means an
    /// explicit abstain, `None` means the voter hasn't cast yet. Used to
    /// read nightmare's individual pick separately from the tallied wolf
    /// kill outcome (spec.md §4.5 nightmare block).
    pub fn vote_of(&self, voter: Seat) -> Option<Option<Seat>> {
        self.votes.get(&voter).copied()
    }

    /// Whether every live participant listed in `live_voters` has cast a
    /// ballot (spec.md §4.4: "every live wolf-meeting participant has
    /// voted").
    pub fn quorum_reached(&self, live_voters: &[Seat]) -> bool {
        live_voters.iter().all(|seat| self.has_voted(*seat))
    }

    /// Tallies the collected votes into the finalized wolf action:
    /// majority wins, lowest-seat-index breaks ties; an abstain-majority
    /// or no live voters yields a peaceful night
    /// (`Action::Target { seat: None }`). `immune_ids`/`alive` exclude
    /// illegal targets from counting toward a winner (ingress validation
    /// should already have rejected such votes, but the tally stays
    /// defensive against stale ballots from a seat that died mid-night).
    pub fn tally(&self, alive: impl Fn(Seat) -> bool) -> Action {
        let mut counts: HashMap<Seat, u32> = HashMap::new();
        for target in self.votes.values().flatten() {
            if alive(*target) {
                *counts.entry(*target).or_insert(0) += 1;
            }
        }

        let winner = counts
            .into_iter()
            .max_by(|(seat_a, count_a), (seat_b, count_b)| {
                count_a
                    .cmp(count_b)
                    .then_with(|| seat_b.cmp(seat_a)) // reverse: lower seat wins ties
            })
            .map(|(seat, _)| seat);

        Action::Target { seat: winner }
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_wins() {
        let mut ballot = WolfBallot::new();
        ballot.cast(Seat(0), Some(Seat(5)));
        ballot.cast(Seat(1), Some(Seat(5)));
        ballot.cast(Seat(2), Some(Seat(6)));
        assert_eq!(ballot.tally(|_| true), Action::Target { seat: Some(Seat(5)) });
    }

    #[test]
    fn tie_breaks_to_lowest_seat() {
        let mut ballot = WolfBallot::new();
        ballot.cast(Seat(0), Some(Seat(5)));
        ballot.cast(Seat(1), Some(Seat(3)));
        assert_eq!(ballot.tally(|_| true), Action::Target { seat: Some(Seat(3)) });
    }

    #[test]
    fn all_abstain_yields_peaceful_night() {
        let mut ballot = WolfBallot::new();
        ballot.cast(Seat(0), None);
        ballot.cast(Seat(1), None);
        assert_eq!(ballot.tally(|_| true), Action::Target { seat: None });
    }

    #[test]
    fn no_live_voters_yields_peaceful_night() {
        let ballot = WolfBallot::new();
        assert_eq!(ballot.tally(|_| true), Action::Target { seat: None });
    }

    #[test]
    fn quorum_reached_checks_every_live_voter() {
        let mut ballot = WolfBallot::new();
        ballot.cast(Seat(0), Some(Seat(1)));
        assert!(!ballot.quorum_reached(&[Seat(0), Seat(2)]));
        ballot.cast(Seat(2), Some(Seat(1)));
        assert!(ballot.quorum_reached(&[Seat(0), Seat(2)]));
    }

    #[test]
    fn dead_target_votes_are_excluded_from_tally() {
        let mut ballot = WolfBallot::new();
        ballot.cast(Seat(0), Some(Seat(5)));
        ballot.cast(Seat(1), Some(Seat(6)));
        // seat 5 is dead; only seat 6's vote should count.
        let result = ballot.tally(|seat| seat != Seat(5));
        assert_eq!(result, Action::Target { seat: Some(Seat(6)) });
    }
}
