use proptest::prelude::*;

use dao_governance::{Direction, GovernanceEngine, GovernanceError};
use dao_nullables::NullClock;
use dao_types::{FundAmount, GovernanceParams, Principal, ProposalId, UNIT};
use std::sync::Arc;

const WEEK: u64 = 7 * 24 * 3_600;

fn principal(n: u8) -> Principal {
    Principal::from_bytes([n; 20])
}

/// Engine with four funded voters (balances 1..=4 whole tokens) and one
/// open proposal.
fn funded() -> (GovernanceEngine, Arc<NullClock>, ProposalId) {
    let clock = Arc::new(NullClock::new(0));
    let engine = GovernanceEngine::new(GovernanceParams::default(), clock.clone());
    for n in 1u8..=4 {
        engine
            .contribute(&principal(n), FundAmount::new(u128::from(n) * UNIT))
            .unwrap();
    }
    let id = engine.propose(&principal(4), "Prop", "Body").unwrap().value;
    (engine, clock, id)
}

proptest! {
    /// Tallies never decrease while voting, and never move once decided.
    #[test]
    fn tallies_are_monotone_and_frozen(
        votes in prop::collection::vec((1u8..=4, any::<bool>(), 1u128..6), 1..30),
    ) {
        let (engine, clock, id) = funded();
        let mut last = (0u128, 0u128);
        for (who, up, weight) in &votes {
            let _ = engine.vote(&principal(*who), id, Direction::from_bool(*up), *weight);
            let p = engine.get_protocol(id).unwrap().value;
            prop_assert!(p.upvotes >= last.0 && p.downvotes >= last.1);
            last = (p.upvotes, p.downvotes);
        }
        clock.advance(WEEK);
        engine.execute(&principal(1), id).unwrap();
        for (who, up, weight) in &votes {
            prop_assert_eq!(
                engine.vote(&principal(*who), id, Direction::from_bool(*up), *weight),
                Err(GovernanceError::VotingClosed(id))
            );
        }
        let p = engine.get_protocol(id).unwrap().value;
        prop_assert_eq!((p.upvotes, p.downvotes), last);
    }

    /// A vote heavier than the voter's whole-token balance is rejected and
    /// changes nothing.
    #[test]
    fn overweight_vote_is_rejected_without_mutation(who in 1u8..=4, extra in 1u128..1_000) {
        let (engine, _clock, id) = funded();
        let before_seq = engine.commit_seq();
        let before = engine.get_protocol(id).unwrap().value;
        let weight = u128::from(who) + extra;
        let is_insufficient = matches!(
            engine.vote(&principal(who), id, Direction::Up, weight),
            Err(GovernanceError::InsufficientBalance { .. })
        );
        prop_assert!(is_insufficient);
        prop_assert_eq!(engine.commit_seq(), before_seq);
        prop_assert_eq!(engine.get_protocol(id).unwrap().value, before);
        prop_assert!(engine.get_votes_of(id).unwrap().value.is_empty());
    }

    /// Passing requires a strict majority; repeated executes agree.
    #[test]
    fn execute_is_idempotent_and_ties_fail(ups in 0u8..4, downs in 0u8..4, repeats in 1usize..5) {
        let (engine, clock, id) = funded();
        for _ in 0..ups {
            engine.vote(&principal(1), id, Direction::Up, 1).unwrap();
        }
        for _ in 0..downs {
            engine.vote(&principal(2), id, Direction::Down, 1).unwrap();
        }
        clock.advance(WEEK);
        let first = engine.execute(&principal(3), id).unwrap().value;
        prop_assert_eq!(first.passed, ups > downs);
        prop_assert!(first.newly_decided);
        for _ in 0..repeats {
            clock.advance(1);
            let again = engine.execute(&principal(3), id).unwrap().value;
            prop_assert_eq!(again.passed, first.passed);
            prop_assert!(!again.newly_decided);
        }
    }
}
