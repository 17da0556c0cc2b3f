//! Property tests for the ARM rating engine

use proptest::prelude::*;
use skeeboard::rating::{ArmRatingCalculator, RatingCalculator, RatingState};
use skeeboard::types::SessionScores;

fn games() -> impl Strategy<Value = [u32; 5]> {
    proptest::array::uniform5(0u32..=90).prop_map(|games| games.map(|game| game * 10))
}

/// Ratings already on the one-decimal grid inside [7.0, 25.0]
fn rating() -> impl Strategy<Value = f64> {
    (70u32..=250).prop_map(|tenths| tenths as f64 / 10.0)
}

fn scores(games: [u32; 5]) -> SessionScores {
    SessionScores::new(&games).unwrap()
}

proptest! {
    #[test]
    fn rating_stays_in_range(
        current in -100.0f64..100.0,
        games in games(),
        session_count in 0u32..500,
    ) {
        let calculator = ArmRatingCalculator::default();
        let update = calculator.update(current, &scores(games), session_count).unwrap();

        prop_assert!(update.new_rating >= 7.0);
        prop_assert!(update.new_rating <= 25.0);
        prop_assert!(update.rating_before >= 7.0 && update.rating_before <= 25.0);
        // One decimal place
        prop_assert!((update.new_rating * 10.0 - (update.new_rating * 10.0).round()).abs() < 1e-9);
    }

    #[test]
    fn session_total_is_sum_of_games(games in games()) {
        let calculator = ArmRatingCalculator::default();
        let update = calculator.update(10.0, &scores(games), 0).unwrap();

        prop_assert_eq!(update.session_total, games.iter().sum::<u32>());
    }

    #[test]
    fn rating_is_deterministic(
        rating in rating(),
        games in games(),
        session_count in 3u32..200,
    ) {
        let calculator = ArmRatingCalculator::default();
        let prior = RatingState { rating, session_count };

        let first = calculator.rate_session(&prior, &scores(games), &[]).unwrap();
        let second = calculator.rate_session(&prior, &scores(games), &[]).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn established_rating_is_deterministic(
        rating in rating(),
        earlier in proptest::collection::vec((0u32..=450).prop_map(|t| t * 10), 2),
        games in games(),
    ) {
        let calculator = ArmRatingCalculator::default();
        let prior = RatingState { rating, session_count: 2 };

        let first = calculator.rate_session(&prior, &scores(games), &earlier).unwrap();
        let second = calculator.rate_session(&prior, &scores(games), &earlier).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!(first.established);
        // Depends on the totals only, not on the provisional rating
        let from_seed = calculator
            .rate_session(&RatingState { rating: 10.0, session_count: 2 }, &scores(games), &earlier)
            .unwrap();
        prop_assert_eq!(first.new_rating, from_seed.new_rating);
    }

    #[test]
    fn higher_total_never_rates_lower(
        rating in rating(),
        a in games(),
        b in games(),
        session_count in 0u32..200,
    ) {
        let calculator = ArmRatingCalculator::default();
        let (low, high) = if a.iter().sum::<u32>() <= b.iter().sum::<u32>() {
            (a, b)
        } else {
            (b, a)
        };

        let low = calculator.update(rating, &scores(low), session_count).unwrap();
        let high = calculator.update(rating, &scores(high), session_count).unwrap();
        prop_assert!(low.new_rating <= high.new_rating);
    }

    #[test]
    fn fewer_sessions_never_move_less(
        rating in rating(),
        games in games(),
        a in 0u32..120,
        b in 0u32..120,
    ) {
        let calculator = ArmRatingCalculator::default();
        let (fewer, more) = if a <= b { (a, b) } else { (b, a) };
        let newcomer = calculator.update(rating, &scores(games), fewer).unwrap();
        let veteran = calculator.update(rating, &scores(games), more).unwrap();

        prop_assert!(calculator.k_factor(fewer) >= calculator.k_factor(more));
        prop_assert!(newcomer.delta.abs() + 1e-9 >= veteran.delta.abs());
        prop_assert!(newcomer.delta * veteran.delta >= 0.0);
    }

    #[test]
    fn established_rating_stays_in_range(
        earlier in proptest::collection::vec((0u32..=450).prop_map(|t| t * 10), 2),
        games in games(),
    ) {
        let calculator = ArmRatingCalculator::default();
        let prior = RatingState { rating: 10.0, session_count: 2 };

        let update = calculator
            .rate_session(&prior, &scores(games), &earlier)
            .unwrap();
        prop_assert!(update.established);
        prop_assert!(!update.is_provisional);
        prop_assert!(update.new_rating >= 7.0 && update.new_rating <= 25.0);
    }
}

#[test]
fn volatility_steps_down_at_tier_boundaries() {
    let calculator = ArmRatingCalculator::default();
    let games = scores([200, 200, 200, 200, 100]);

    for (last, first) in [(9, 10), (24, 25), (49, 50)] {
        assert!(calculator.k_factor(last) > calculator.k_factor(first));

        let before = calculator.update(10.0, &games, last).unwrap();
        let after = calculator.update(10.0, &games, first).unwrap();
        assert!(before.delta > after.delta, "{} vs {}", last, first);
    }
}
