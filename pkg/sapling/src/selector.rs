//! Choosing which unspent notes pay for a transaction

use num_bigint::BigUint;
use sapling_primitives::Element;

use crate::{
    bookkeeper::{get_unspends, sum_notes},
    Ciphertext, Error, InputNote, Result, ViewingKey,
};

/// Pick unspent notes of `viewing_key` worth at least `target`
///
/// Notes are taken first-fit, in the order [`get_unspends`] returns them (most recent first),
/// until the running total reaches `target`. Returns the chosen notes and their total, which may
/// exceed `target`: the caller pays the surplus back to the spender.
///
/// Fails with [`Error::InsufficientBalance`] if and only if all unspent notes together are worth
/// less than `target`
#[tracing::instrument(skip(viewing_key, commitments_and_ciphertexts, nullifiers), err)]
pub fn choose_inputs(
    viewing_key: &ViewingKey,
    commitments_and_ciphertexts: &[(Element, Ciphertext)],
    nullifiers: &[Element],
    target: u64,
) -> Result<(Vec<InputNote>, BigUint)> {
    let unspends = get_unspends(viewing_key, commitments_and_ciphertexts, nullifiers);
    let balance = sum_notes(&unspends);

    if balance < BigUint::from(target) {
        return Err(Error::InsufficientBalance {
            balance,
            required: target,
        });
    }

    let target = BigUint::from(target);
    let mut total = BigUint::default();
    let mut chosen = Vec::new();

    for input in unspends {
        if total >= target {
            break;
        }

        total += input.value();
        chosen.push(input);
    }

    Ok((chosen, total))
}

#[cfg(test)]
mod tests {
    use test_strategy::proptest;

    use crate::test::pool::Pool;

    use super::*;

    #[test]
    fn covers_target_with_both_notes() {
        let mut pool = Pool::new();
        let wallet = pool.new_wallet();
        pool.add_note(&wallet, 10);
        pool.add_note(&wallet, 5);

        let (chosen, total) = choose_inputs(
            &wallet.viewing_key,
            &pool.diff.commitments_and_ciphertexts,
            &pool.diff.nullifiers,
            12,
        )
        .unwrap();

        // most recent first
        let values: Vec<_> = chosen.iter().map(InputNote::value).collect();
        assert_eq!(values, vec![5, 10]);
        assert_eq!(total, BigUint::from(15u32));
    }

    #[test]
    fn stops_once_target_is_reached() {
        let mut pool = Pool::new();
        let wallet = pool.new_wallet();
        pool.add_note(&wallet, 10);
        pool.add_note(&wallet, 5);

        let (chosen, total) = choose_inputs(
            &wallet.viewing_key,
            &pool.diff.commitments_and_ciphertexts,
            &pool.diff.nullifiers,
            4,
        )
        .unwrap();

        // most recent first
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].value(), 5);
        assert_eq!(total, BigUint::from(5u32));
    }

    #[test]
    fn zero_target_selects_nothing() {
        let pool = Pool::new();
        let wallet = Pool::new().new_wallet();

        let (chosen, total) = choose_inputs(
            &wallet.viewing_key,
            &pool.diff.commitments_and_ciphertexts,
            &pool.diff.nullifiers,
            0,
        )
        .unwrap();

        assert!(chosen.is_empty());
        assert_eq!(total, BigUint::default());
    }

    #[test]
    fn insufficient_balance_reports_balance() {
        let mut pool = Pool::new();
        let wallet = pool.new_wallet();
        pool.add_note(&wallet, 10);

        let error = choose_inputs(
            &wallet.viewing_key,
            &pool.diff.commitments_and_ciphertexts,
            &pool.diff.nullifiers,
            11,
        )
        .unwrap_err();

        assert!(matches!(
            error,
            Error::InsufficientBalance { balance, required: 11 } if balance == BigUint::from(10u32)
        ));
    }

    #[proptest(cases = 16)]
    fn never_selects_less_than_target(
        #[strategy(proptest::collection::vec(0u64..1_000, 0..6))] values: Vec<u64>,
        #[strategy(0u64..3_000)] target: u64,
    ) {
        let mut pool = Pool::new();
        let wallet = pool.new_wallet();
        for value in &values {
            pool.add_note(&wallet, *value);
        }

        let balance: u64 = values.iter().sum();
        let result = choose_inputs(
            &wallet.viewing_key,
            &pool.diff.commitments_and_ciphertexts,
            &pool.diff.nullifiers,
            target,
        );

        match result {
            Ok((chosen, total)) => {
                assert!(balance >= target);
                assert!(total >= BigUint::from(target));
                assert_eq!(sum_notes(&chosen), total);
            }
            Err(Error::InsufficientBalance { .. }) => assert!(balance < target),
            Err(error) => panic!("unexpected error: {error}"),
        }
    }
}
