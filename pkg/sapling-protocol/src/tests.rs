use num_bigint::BigUint;
use commitment_tree::build_state_tree;
use parking_lot::Mutex;
use sapling::{
    encoder::decode,
    encryption::try_decrypt_incoming,
    test::pool::{Pool, Wallet},
    InputNote, SaplingTransaction, SpendingKey, TransparentProver,
};
use sapling_node::{NodeClient, StaticLedger};

use crate::address::{decode_shielded_address, encode_shielded_address, BaseChainAddress, Curve};

use super::*;

const CHAIN_ID: &str = "NetXdQprcVkpaWU";

#[derive(Debug, Default)]
struct RecordingChain {
    calls: Mutex<Vec<(String, ContractCall, u64)>>,
}

#[async_trait::async_trait]
impl BaseChain for RecordingChain {
    async fn prepare_contract_call(
        &self,
        public_key: &str,
        call: ContractCall,
        fee: u64,
    ) -> Result<Vec<u8>, BaseChainError> {
        self.calls.lock().push((public_key.to_owned(), call, fee));
        Ok(b"forged operation".to_vec())
    }
}

#[derive(Debug)]
struct RejectingChain(BaseChainError);

#[async_trait::async_trait]
impl BaseChain for RejectingChain {
    async fn prepare_contract_call(
        &self,
        _public_key: &str,
        _call: ContractCall,
        _fee: u64,
    ) -> Result<Vec<u8>, BaseChainError> {
        Err(self.0.clone())
    }
}

type Protocol<B = RecordingChain> = SaplingProtocol<StaticLedger, TransparentProver, B>;

fn protocol_with<B: BaseChain>(pool: &Pool, base_chain: B) -> Protocol<B> {
    SaplingProtocol::new(
        ProtocolConfig::default(),
        StaticLedger::new(pool.diff.clone(), CHAIN_ID),
        TransparentProver::new(),
        base_chain,
    )
}

fn protocol(pool: &Pool) -> Protocol {
    protocol_with(pool, RecordingChain::default())
}

/// A pool where `wallet` holds notes of 10 and 5, and a stranger holds 99
fn funded_pool() -> (Pool, Wallet) {
    let mut pool = Pool::new();
    let wallet = pool.new_wallet();
    let stranger = pool.new_wallet();

    pool.add_note(&wallet, 10);
    pool.add_note(&stranger, 99);
    pool.add_note(&wallet, 5);

    (pool, wallet)
}

fn base_chain_address() -> BaseChainAddress {
    BaseChainAddress {
        curve: Curve::Ed25519,
        key_hash: [7; 20],
    }
}

fn zet(wallet: &Wallet) -> String {
    encode_shielded_address(&wallet.viewing_key.default_address())
}

fn decode_signed(signed: &str) -> SaplingTransaction {
    decode(&hex::decode(signed).unwrap()).unwrap()
}

#[tokio::test]
async fn balance_counts_unspent_notes() {
    let (mut pool, wallet) = funded_pool();
    let protocol = protocol(&pool);
    let vk = &wallet.viewing_key;

    assert_eq!(protocol.get_balance(vk).await.unwrap(), BigUint::from(15u32));
    assert_eq!(
        protocol.estimate_max_transaction_value(vk).await.unwrap(),
        BigUint::from(15u32)
    );

    let spent = pool.add_note(&wallet, 1);
    pool.publish_nullifier(&wallet, &spent);
    protocol.ledger().set_diff(pool.diff.clone());

    assert_eq!(protocol.get_balance(vk).await.unwrap(), BigUint::from(15u32));
}

#[tokio::test]
async fn unshield_pays_back_surplus() {
    let (pool, wallet) = funded_pool();
    let protocol = protocol(&pool);
    let target = base_chain_address().to_string();

    let unsigned = protocol
        .prepare_unshield(&wallet.viewing_key, &target, 12)
        .await
        .unwrap();

    let values: Vec<_> = unsigned.ins.iter().map(InputNote::value).collect();
    assert_eq!(values, vec![5, 10]);
    assert_eq!(unsigned.outs.len(), 1);
    assert_eq!(unsigned.outs[0].value, 3);
    assert_eq!(unsigned.outs[0].address, wallet.viewing_key.default_address());
    assert_eq!(unsigned.unshield_target.as_deref(), Some(target.as_str()));
    assert_eq!(unsigned.chain_id, CHAIN_ID);

    let details = protocol
        .get_transaction_details(&unsigned, &wallet.viewing_key)
        .unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].from, vec![zet(&wallet)]);
    assert_eq!(details[0].to, vec![target]);
    assert_eq!(details[0].amount, 12);
    assert_eq!(
        details[0].destination.as_deref(),
        Some("KT1Wr1z3CwrZamPsazpVXefpEjXUBScUPuHZ")
    );
    assert_eq!(details[0].chain_id.as_deref(), Some(CHAIN_ID));
}

#[tokio::test]
async fn exact_unshield_has_no_payback() {
    let (pool, wallet) = funded_pool();
    let protocol = protocol(&pool);

    let unsigned = protocol
        .prepare_unshield(&wallet.viewing_key, &base_chain_address().to_string(), 15)
        .await
        .unwrap();

    assert_eq!(unsigned.ins.len(), 2);
    assert!(unsigned.outs.is_empty());
}

#[tokio::test]
async fn signed_unshield_binds_target() {
    let (pool, wallet) = funded_pool();
    let protocol = protocol(&pool);
    let target = base_chain_address();

    let unsigned = protocol
        .prepare_unshield(&wallet.viewing_key, &target.to_string(), 12)
        .await
        .unwrap();
    let signed = protocol
        .sign_with_spending_key(&wallet.spending_key, &unsigned)
        .await
        .unwrap();

    let transaction = decode_signed(&signed);
    assert_eq!(transaction.spends.len(), 2);
    assert_eq!(transaction.outputs.len(), 1);
    assert_eq!(transaction.balance, 12);
    assert_eq!(transaction.bound_data, target.pack());
    assert_eq!(transaction.root, pool.diff.root);
    assert_eq!(
        transaction.anti_replay,
        format!("KT1Wr1z3CwrZamPsazpVXefpEjXUBScUPuHZ{CHAIN_ID}").into_bytes()
    );

    let details = protocol
        .get_transaction_details_from_signed(&signed, &[wallet.viewing_key.clone()])
        .unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].from, vec![SHIELDED_POOL.to_owned()]);
    assert_eq!(details[0].to, vec![target.to_string()]);
    assert_eq!(details[0].amount, 12);
}

#[tokio::test]
async fn transfer_with_dummies() {
    let (mut pool, wallet) = funded_pool();
    let recipient = pool.new_wallet();
    let protocol = protocol(&pool);

    let unsigned = protocol
        .prepare_transfer(&wallet.viewing_key, &zet(&recipient), 5, 1, 2)
        .await
        .unwrap();

    assert_eq!(unsigned.ins.len(), 2);
    assert_eq!(unsigned.outs.len(), 3);
    assert_eq!(unsigned.ins[1].value(), 0);
    assert!(unsigned.outs[1..].iter().all(|output| output.value == 0));
    assert_eq!(unsigned.unshield_target, None);

    let details = protocol
        .get_transaction_details(&unsigned, &wallet.viewing_key)
        .unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].to, vec![zet(&recipient)]);
    assert_eq!(details[0].amount, 5);

    let signed = protocol
        .sign_with_spending_key(&wallet.spending_key, &unsigned)
        .await
        .unwrap();
    let transaction = decode_signed(&signed);

    assert_eq!(transaction.spends.len(), 2);
    assert_eq!(transaction.outputs.len(), 3);
    assert_eq!(transaction.balance, 0);
    assert!(transaction.bound_data.is_empty());

    let payment = &transaction.outputs[0];
    let note = try_decrypt_incoming(&recipient.viewing_key, payment.cm, &payment.ciphertext)
        .unwrap();
    assert_eq!(note.value, 5);
}

#[tokio::test]
async fn transfer_pays_back_to_sender() {
    let (mut pool, wallet) = funded_pool();
    let recipient = pool.new_wallet();
    let protocol = protocol(&pool);

    let unsigned = protocol
        .prepare_transfer(&wallet.viewing_key, &zet(&recipient), 12, 0, 0)
        .await
        .unwrap();

    let outs: Vec<_> = unsigned
        .outs
        .iter()
        .map(|output| (output.address, output.value))
        .collect();
    assert_eq!(
        outs,
        vec![
            (recipient.viewing_key.default_address(), 12),
            (wallet.viewing_key.default_address(), 3),
        ]
    );
}

#[tokio::test]
async fn shield_on_empty_pool() {
    let mut pool = Pool::new();
    let recipient = pool.new_wallet();
    let protocol = protocol(&pool);

    let encoded = protocol.prepare_shield(&zet(&recipient), 100).await.unwrap();
    let transaction = decode(&encoded).unwrap();

    assert!(transaction.spends.is_empty());
    assert_eq!(transaction.outputs.len(), 1);
    assert_eq!(transaction.balance, -100);

    let padded = build_state_tree(std::iter::empty(), 32, true).unwrap();
    let unpadded = build_state_tree(std::iter::empty(), 32, false).unwrap();
    assert_eq!(transaction.root, padded.root());
    assert_ne!(transaction.root, unpadded.root());

    let output = &transaction.outputs[0];
    let note =
        try_decrypt_incoming(&recipient.viewing_key, output.cm, &output.ciphertext).unwrap();
    assert_eq!(note.value, 100);
}

#[tokio::test]
async fn shield_transaction_carries_shielded_value() {
    let mut pool = Pool::new();
    let recipient = pool.new_wallet();
    let protocol = protocol(&pool);

    let operation = protocol
        .prepare_shield_transaction("edpk", &zet(&recipient), 100, 1_000)
        .await
        .unwrap();
    assert_eq!(operation, b"forged operation");

    let second = protocol.prepare_shield(&zet(&recipient), 20).await.unwrap();
    protocol
        .wrap_sapling_transactions("edpk", &[second.clone(), second], 500)
        .await
        .unwrap();

    let calls = protocol.base_chain_calls();
    assert_eq!(calls.len(), 2);

    let (public_key, call, fee) = &calls[0];
    assert_eq!(public_key, "edpk");
    assert_eq!(*fee, 1_000);
    assert_eq!(call.destination, "KT1Wr1z3CwrZamPsazpVXefpEjXUBScUPuHZ");
    assert_eq!(call.transactions.len(), 1);
    assert_eq!(call.amount, 100);

    assert_eq!(calls[1].1.amount, 40);
}

impl Protocol {
    fn base_chain_calls(&self) -> Vec<(String, ContractCall, u64)> {
        self.base_chain().calls.lock().clone()
    }
}

#[tokio::test]
async fn unshield_transactions_carry_no_value() {
    let (pool, wallet) = funded_pool();
    let protocol = protocol(&pool);

    let unsigned = protocol
        .prepare_unshield(&wallet.viewing_key, &base_chain_address().to_string(), 12)
        .await
        .unwrap();
    let signed = protocol
        .sign_with_spending_key(&wallet.spending_key, &unsigned)
        .await
        .unwrap();

    protocol
        .wrap_sapling_transactions("edpk", &[hex::decode(signed).unwrap()], 0)
        .await
        .unwrap();

    assert_eq!(protocol.base_chain_calls()[0].1.amount, 0);
}

fn rejected(id: &str) -> BaseChainError {
    BaseChainError::Rejected(vec![RpcError {
        id: id.to_owned(),
        kind: "temporary".to_owned(),
    }])
}

#[tokio::test]
async fn broadcast_errors_are_mapped() {
    let mut pool = Pool::new();
    let recipient = pool.new_wallet();

    let cases = [
        (
            rejected("proto.014-PtKathma.contract.cannot_pay_storage_fee"),
            Some(BroadcastRejection::InsufficientStorageFee),
        ),
        (
            rejected("proto.014-PtKathma.contract.balance_too_low"),
            Some(BroadcastRejection::BalanceTooLow),
        ),
        (rejected("proto.014-PtKathma.gas_exhausted.operation"), None),
        (BaseChainError::Other("connection reset".to_owned()), None),
    ];

    for (error, expected) in cases {
        let protocol = protocol_with(&pool, RejectingChain(error.clone()));

        let result = protocol
            .prepare_shield_transaction("edpk", &zet(&recipient), 1, 0)
            .await;

        match (result, expected) {
            (Err(Error::BroadcastRejected(rejection)), Some(expected)) => {
                assert_eq!(rejection, expected);
            }
            (Err(Error::BaseChain(unchanged)), None) => assert_eq!(unchanged, error),
            (result, _) => panic!("unexpected result for {error}: {result:?}"),
        }
    }
}

#[tokio::test]
async fn invalid_recipient_fails_before_fetching() {
    let (pool, wallet) = funded_pool();
    let protocol = protocol(&pool);
    let vk = &wallet.viewing_key;

    let result = protocol
        .prepare_transaction(vk, &["hello".to_owned()], &[1], TransferOptions::default())
        .await;
    assert!(matches!(
        result,
        Err(Error::Sapling(sapling::Error::InvalidRecipient(_)))
    ));

    let tz = base_chain_address().to_string();
    assert!(matches!(
        protocol.prepare_shield(&tz, 1).await,
        Err(Error::Sapling(sapling::Error::InvalidRecipient(_)))
    ));
    assert!(matches!(
        protocol.prepare_unshield(vk, &zet(&wallet), 1).await,
        Err(Error::Sapling(sapling::Error::InvalidRecipient(_)))
    ));
    assert!(matches!(
        protocol.prepare_transfer(vk, &tz, 1, 0, 0).await,
        Err(Error::Sapling(sapling::Error::InvalidRecipient(_)))
    ));

    assert_eq!(protocol.ledger().fetches(), 0);
}

#[tokio::test]
async fn one_recipient_per_transaction() {
    let (pool, wallet) = funded_pool();
    let protocol = protocol(&pool);
    let vk = &wallet.viewing_key;
    let tz = base_chain_address().to_string();

    for (recipients, values) in [
        (vec![tz.clone(), tz.clone()], vec![1, 1]),
        (vec![], vec![]),
        (vec![tz.clone()], vec![]),
    ] {
        let result = protocol
            .prepare_transaction(vk, &recipients, &values, TransferOptions::default())
            .await;

        assert!(
            matches!(
                result,
                Err(Error::Sapling(sapling::Error::UnsupportedOperation(_)))
            ),
            "{recipients:?} {values:?}"
        );
    }
}

#[tokio::test]
async fn transaction_dispatches_by_address_family() {
    let (mut pool, wallet) = funded_pool();
    let recipient = pool.new_wallet();
    let protocol = protocol(&pool);
    let vk = &wallet.viewing_key;

    let options = TransferOptions {
        dummy_inputs: 1,
        dummy_outputs: 1,
    };

    let unshield = protocol
        .prepare_transaction(vk, &[base_chain_address().to_string()], &[4], options)
        .await
        .unwrap();
    assert!(unshield.unshield_target.is_some());
    assert_eq!(unshield.ins.len(), 1);

    let transfer = protocol
        .prepare_transaction(vk, &[zet(&recipient)], &[4], options)
        .await
        .unwrap();
    assert_eq!(transfer.unshield_target, None);
    assert_eq!(transfer.ins.len(), 2);
    assert_eq!(transfer.outs.len(), 3);
}

#[tokio::test]
async fn insufficient_balance() {
    let (pool, wallet) = funded_pool();
    let protocol = protocol(&pool);

    let result = protocol
        .prepare_unshield(&wallet.viewing_key, &base_chain_address().to_string(), 16)
        .await;

    assert!(matches!(
        result,
        Err(Error::Sapling(sapling::Error::InsufficientBalance { required: 16, .. }))
    ));
}

#[tokio::test]
async fn history_pages_backwards_without_paybacks() {
    let (mut pool, wallet) = funded_pool();
    let other = pool.new_wallet();
    pool.add_note_from(&wallet, &other, 3);
    pool.add_note_from(&wallet, &wallet, 2);

    let protocol = protocol(&pool);

    let page = protocol
        .get_transaction_history(&wallet.viewing_key, 10, None)
        .await
        .unwrap();

    let entries: Vec<_> = page
        .transactions
        .iter()
        .map(|entry| (entry.is_inbound, entry.amount))
        .collect();
    assert_eq!(entries, vec![(true, 2), (true, 5), (true, 10), (false, 3)]);
    assert_eq!(page.cursor, TransactionCursor { page: 1 });

    let inbound = &page.transactions[0];
    assert_eq!(inbound.from, vec![SHIELDED_POOL.to_owned()]);
    assert_eq!(inbound.to, vec![zet(&wallet)]);
    assert_eq!(inbound.memo.as_deref(), Some("0000000000000000"));

    let outbound = &page.transactions[3];
    assert_eq!(outbound.from, vec![zet(&wallet)]);
    assert_eq!(outbound.to, vec![zet(&other)]);

    let next = protocol
        .get_transaction_history(&wallet.viewing_key, 10, Some(page.cursor))
        .await
        .unwrap();
    assert!(next.transactions.is_empty());
    assert_eq!(next.cursor, page.cursor);
}

#[tokio::test]
async fn history_cursor_advances_by_page() {
    let (pool, wallet) = funded_pool();
    let protocol = protocol(&pool);

    let first = protocol
        .get_transaction_history(&wallet.viewing_key, 1, None)
        .await
        .unwrap();
    assert_eq!(first.transactions.len(), 1);
    assert_eq!(first.transactions[0].amount, 5);
    assert_eq!(first.cursor, TransactionCursor { page: 1 });

    // the stranger's note fills page 1, so page 2 is read too
    let second = protocol
        .get_transaction_history(&wallet.viewing_key, 1, Some(first.cursor))
        .await
        .unwrap();
    assert_eq!(second.transactions.len(), 1);
    assert_eq!(second.transactions[0].amount, 10);
    assert_eq!(second.cursor, TransactionCursor { page: 3 });
}

#[tokio::test]
async fn addresses_are_shielded_text() {
    let pool = Pool::new();
    let protocol = protocol(&pool);
    let vk = SpendingKey::new([5; 32]).viewing_key();

    let default = protocol.get_address(&vk);
    assert_eq!(decode_shielded_address(&default).unwrap(), vk.default_address());
    assert_eq!(protocol.get_address_at(&vk, 3), encode_shielded_address(&vk.address(3)));

    let (index, next) = protocol.get_next_address(&vk, 3).unwrap();
    assert!(index > 3);
    assert_eq!(next, protocol.get_address_at(&vk, index));
}

#[tokio::test]
async fn base_chain_queries_are_unsupported() {
    let pool = Pool::new();
    let protocol = protocol(&pool);
    let tz = vec![base_chain_address().to_string()];

    let unsupported = |result: Result<()>| {
        matches!(
            result,
            Err(Error::Sapling(sapling::Error::UnsupportedOperation(_)))
        )
    };

    assert!(unsupported(
        protocol.get_balance_of_addresses(&tz).await.map(drop)
    ));
    assert!(unsupported(
        protocol
            .get_available_balance_of_addresses(&tz)
            .await
            .map(drop)
    ));
    assert!(unsupported(
        protocol
            .get_balance_of_public_key_for_sub_protocols("edpk", &tz)
            .await
            .map(drop)
    ));
    assert!(unsupported(
        protocol
            .get_transactions_from_addresses(&tz, 10, None)
            .await
            .map(drop)
    ));
    assert!(unsupported(
        protocol
            .get_block_explorer_link_for_address(&tz[0])
            .map(drop)
    ));
    assert_eq!(protocol.ledger().fetches(), 0);
}

#[tokio::test]
async fn parameters_load_once() {
    let pool = Pool::new();
    let protocol = protocol(&pool);

    protocol.init_parameters(b"spend", b"output").await.unwrap();
    protocol.init_parameters(b"spend", b"output").await.unwrap();

    assert!(matches!(
        protocol.init_parameters(b"other", b"output").await,
        Err(Error::Sapling(sapling::Error::Prover(_)))
    ));
}

#[test]
fn connect_reads_the_configured_node() {
    let config = ProtocolConfig {
        name: "Test Pool".to_owned(),
        rpc_url: "http://localhost:8732".to_owned(),
        ..ProtocolConfig::default()
    };

    let protocol: SaplingProtocol<NodeClient, _, _> =
        SaplingProtocol::connect(config, TransparentProver::new(), RecordingChain::default());

    assert_eq!(protocol.name(), "Test Pool");
    assert_eq!(protocol.ledger().rpc_url(), "http://localhost:8732");
    assert_eq!(
        protocol.ledger().contract_address(),
        "KT1Wr1z3CwrZamPsazpVXefpEjXUBScUPuHZ"
    );
}
