use async_trait::async_trait;
use num_bigint::BigUint;
use sapling::{
    bookkeeper::{
        get_transactions_partial_details, get_unsigned_transaction_details, get_unspends,
        sum_notes,
    },
    encoder::{decode, encode},
    forger::forge_sapling_transaction,
    selector::choose_inputs,
    InputNote, PaymentAddress, Prover, SaplingOutput, SpendingKey, StateDiff,
    UnsignedSaplingTransaction, ViewingKey,
};
use sapling_node::{LedgerState, NodeClient};

use crate::{
    address::{
        decode_shielded_address, encode_shielded_address, is_base_chain_address,
        is_shielded_address, BaseChainAddress,
    },
    base_chain::{BaseChain, BaseChainError, ContractCall},
    capability::{BalanceQuery, HistoryQuery, TransferBuilder, TransferOptions},
    details::{filter_out_paybacks, DisplayDetails, SHIELDED_POOL},
    history::{walk_pages, TransactionCursor, TransactionPage},
    BroadcastRejection, Error, ProtocolConfig, Result,
};

fn unsupported(operation: &str) -> Error {
    sapling::Error::UnsupportedOperation(format!("`{operation}` is not supported")).into()
}

fn map_broadcast_error(err: BaseChainError) -> Error {
    if let BaseChainError::Rejected(errors) = &err {
        let rejected_with = |suffix: &str| errors.iter().any(|error| error.id.ends_with(suffix));

        if rejected_with(".contract.cannot_pay_storage_fee") {
            return Error::BroadcastRejected(BroadcastRejection::InsufficientStorageFee);
        }

        if rejected_with(".contract.balance_too_low") {
            return Error::BroadcastRejected(BroadcastRejection::BalanceTooLow);
        }
    }

    Error::BaseChain(err)
}

/// Run CPU-bound note scanning off the async runtime
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}

/// The shielded pool protocol of one sapling contract
///
/// Reads the pool through a [`LedgerState`], proves through a [`Prover`], and hands contract
/// calls to a [`BaseChain`]. Nothing is cached: every call starts from a fresh state diff.
/// Concurrent calls for the same viewing key can therefore choose the same notes, and only one of
/// the resulting transactions will be accepted
#[derive(Debug)]
pub struct SaplingProtocol<L, P, B> {
    config: ProtocolConfig,
    ledger: L,
    prover: P,
    base_chain: B,
}

impl<P, B> SaplingProtocol<NodeClient, P, B>
where
    P: Prover,
    B: BaseChain,
{
    /// A protocol reading the pool from the node and contract named in `config`
    pub fn connect(config: ProtocolConfig, prover: P, base_chain: B) -> Self {
        tracing::info!(
            name = %config.name,
            rpc_url = %config.rpc_url,
            contract = %config.contract_address,
            "connecting to sapling contract"
        );

        let ledger = config.node_client();
        Self::new(config, ledger, prover, base_chain)
    }
}

impl<L, P, B> SaplingProtocol<L, P, B>
where
    L: LedgerState,
    P: Prover,
    B: BaseChain,
{
    pub fn new(config: ProtocolConfig, ledger: L, prover: P, base_chain: B) -> Self {
        Self {
            config,
            ledger,
            prover,
            base_chain,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// The display name of the pool
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn base_chain(&self) -> &B {
        &self.base_chain
    }

    pub async fn init_parameters(
        &self,
        spend_parameters: &[u8],
        output_parameters: &[u8],
    ) -> Result<()> {
        self.prover
            .init_parameters(spend_parameters, output_parameters)
            .await
            .map_err(sapling::Error::from)?;
        Ok(())
    }

    pub fn get_address(&self, viewing_key: &ViewingKey) -> String {
        encode_shielded_address(&viewing_key.default_address())
    }

    pub fn get_address_at(&self, viewing_key: &ViewingKey, index: u64) -> String {
        encode_shielded_address(&viewing_key.address(index))
    }

    /// The address after the one at `index`, with its index
    pub fn get_next_address(&self, viewing_key: &ViewingKey, index: u64) -> Option<(u64, String)> {
        viewing_key
            .next_address(index)
            .map(|(index, address)| (index, encode_shielded_address(&address)))
    }

    pub fn get_block_explorer_link_for_address(&self, _address: &str) -> Result<String> {
        Err(unsupported("get_block_explorer_link_for_address"))
    }

    fn anti_replay(contract_address: &str, chain_id: &str) -> Vec<u8> {
        format!("{contract_address}{chain_id}").into_bytes()
    }

    async fn fetch_diff_and_chain_id(&self) -> Result<(StateDiff, String)> {
        Ok(tokio::try_join!(
            self.ledger.state_diff(),
            self.ledger.chain_id()
        )?)
    }

    /// Unspent notes of `viewing_key` worth at least `value`, with their total
    async fn select(
        &self,
        viewing_key: &ViewingKey,
        diff: StateDiff,
        value: u64,
    ) -> Result<(StateDiff, Vec<InputNote>, BigUint)> {
        let viewing_key = viewing_key.clone();

        let (diff, chosen) = blocking(move || {
            let chosen = choose_inputs(
                &viewing_key,
                &diff.commitments_and_ciphertexts,
                &diff.nullifiers,
                value,
            );
            (diff, chosen)
        })
        .await?;

        let (ins, total) = chosen?;
        Ok((diff, ins, total))
    }

    /// An output returning the selected value beyond `value` to `address`, if there is any
    fn payback(
        &self,
        address: PaymentAddress,
        total: &BigUint,
        value: u64,
    ) -> Result<Option<SaplingOutput>> {
        let surplus = total - BigUint::from(value);
        if surplus == BigUint::default() {
            return Ok(None);
        }

        let surplus = u64::try_from(&surplus).map_err(|_| {
            sapling::Error::ValueOverflow(format!("payback of {surplus} does not fit in 64 bits"))
        })?;

        Ok(Some(SaplingOutput::new(
            address,
            surplus,
            self.config.memo_size,
        )))
    }

    /// Forge a transaction minting `value` to the shielded address `recipient`, and encode it
    ///
    /// The transaction has no inputs, and is proven against the current pool, padded if empty
    #[tracing::instrument(err, skip(self))]
    pub async fn prepare_shield(&self, recipient: &str, value: u64) -> Result<Vec<u8>> {
        let address = decode_shielded_address(recipient)?;
        let (diff, chain_id) = self.fetch_diff_and_chain_id().await?;

        let output = SaplingOutput::new(address, value, self.config.memo_size);
        let state_tree = diff.state_tree(self.config.merkle_tree_height, true)?;
        let anti_replay = Self::anti_replay(&self.config.contract_address, &chain_id);

        let transaction = forge_sapling_transaction(
            &self.prover,
            &[],
            &[output],
            &state_tree,
            &anti_replay,
            None,
            None,
        )
        .await?;

        Ok(encode(&transaction)?)
    }

    /// Shield `value` to `recipient`, wrapped in a contract call from the account of `public_key`
    pub async fn prepare_shield_transaction(
        &self,
        public_key: &str,
        recipient: &str,
        value: u64,
        fee: u64,
    ) -> Result<Vec<u8>> {
        let transaction = self.prepare_shield(recipient, value).await?;
        self.wrap_sapling_transactions(public_key, &[transaction], fee)
            .await
    }

    /// Prepare a transaction moving `value` out of the pool to the base-chain address `recipient`
    ///
    /// Any surplus of the chosen notes is paid back to the default address of `viewing_key`.
    /// `recipient` is bound into the transaction when it is signed
    #[tracing::instrument(err, skip(self, viewing_key))]
    pub async fn prepare_unshield(
        &self,
        viewing_key: &ViewingKey,
        recipient: &str,
        value: u64,
    ) -> Result<UnsignedSaplingTransaction> {
        let _: BaseChainAddress = recipient.parse()?;
        let (diff, chain_id) = self.fetch_diff_and_chain_id().await?;

        let (state_diff, ins, total) = self.select(viewing_key, diff, value).await?;
        let outs = self
            .payback(viewing_key.default_address(), &total, value)?
            .into_iter()
            .collect();

        Ok(UnsignedSaplingTransaction {
            ins,
            outs,
            contract_address: self.config.contract_address.clone(),
            chain_id,
            state_diff,
            unshield_target: Some(recipient.to_owned()),
        })
    }

    /// Prepare a transaction paying `value` to the shielded address `recipient`
    ///
    /// Outputs are the payment, then the payback if any, then `dummy_outputs` dummies. Inputs are
    /// the chosen notes, then `dummy_inputs` dummies owned by `viewing_key`
    #[tracing::instrument(err, skip(self, viewing_key))]
    pub async fn prepare_transfer(
        &self,
        viewing_key: &ViewingKey,
        recipient: &str,
        value: u64,
        dummy_inputs: usize,
        dummy_outputs: usize,
    ) -> Result<UnsignedSaplingTransaction> {
        let recipient = decode_shielded_address(recipient)?;
        let (diff, chain_id) = self.fetch_diff_and_chain_id().await?;

        let (state_diff, mut ins, total) = self.select(viewing_key, diff, value).await?;
        let own_address = viewing_key.default_address();

        let mut outs = vec![SaplingOutput::new(
            recipient,
            value,
            self.config.memo_size,
        )];
        outs.extend(self.payback(own_address, &total, value)?);

        let (dummy_ins, dummy_outs) = self.dummies(own_address, dummy_inputs, dummy_outputs);
        ins.extend(dummy_ins);
        outs.extend(dummy_outs);

        Ok(UnsignedSaplingTransaction {
            ins,
            outs,
            contract_address: self.config.contract_address.clone(),
            chain_id,
            state_diff,
            unshield_target: None,
        })
    }

    fn dummies(
        &self,
        owner: PaymentAddress,
        inputs: usize,
        outputs: usize,
    ) -> (Vec<InputNote>, Vec<SaplingOutput>) {
        let mut rng = rand::thread_rng();

        let ins = (0..inputs)
            .map(|_| InputNote::dummy(owner, &mut rng))
            .collect();
        let outs = (0..outputs)
            .map(|_| SaplingOutput::dummy(self.config.memo_size, &mut rng))
            .collect();

        (ins, outs)
    }

    /// Wrap encoded transactions into one call to the sapling contract
    ///
    /// The call carries as much base-chain value as the transactions shield. Rejections for
    /// storage fees or low balance become [`Error::BroadcastRejected`]
    #[tracing::instrument(err, skip(self, transactions), fields(transactions = transactions.len()))]
    pub async fn wrap_sapling_transactions(
        &self,
        public_key: &str,
        transactions: &[Vec<u8>],
        fee: u64,
    ) -> Result<Vec<u8>> {
        let mut amount = 0u64;
        for bytes in transactions {
            let shielded = decode(bytes)?.balance.min(0).unsigned_abs();
            amount = amount.checked_add(shielded).ok_or_else(|| {
                sapling::Error::ValueOverflow("shielded amount does not fit in 64 bits".to_owned())
            })?;
        }

        let call = ContractCall {
            destination: self.config.contract_address.clone(),
            transactions: transactions.to_vec(),
            amount,
        };

        self.base_chain
            .prepare_contract_call(public_key, call, fee)
            .await
            .map_err(|err| {
                tracing::warn!(%err, "base chain refused the contract call");
                map_broadcast_error(err)
            })
    }

    /// Describe an unsigned transaction prepared for `viewing_key`
    pub fn get_transaction_details(
        &self,
        transaction: &UnsignedSaplingTransaction,
        viewing_key: &ViewingKey,
    ) -> Result<Vec<DisplayDetails>> {
        let unshield_target = match transaction.unshield_target.as_deref() {
            Some(target) if !target.is_empty() => Some(target.parse::<BaseChainAddress>()?.pack()),
            _ => None,
        };

        let details = get_unsigned_transaction_details(
            &viewing_key.default_address(),
            &transaction.ins,
            &transaction.outs,
            unshield_target.as_deref(),
        )?
        .into_iter()
        .map(|details| DisplayDetails {
            destination: Some(transaction.contract_address.clone()),
            chain_id: Some(transaction.chain_id.clone()),
            ..DisplayDetails::from(details)
        })
        .collect();

        Ok(filter_out_paybacks(details))
    }

    /// Describe a signed transaction, as returned by
    /// [`sign_with_spending_key`](TransferBuilder::sign_with_spending_key), as far as
    /// `known_viewing_keys` can see into it
    pub fn get_transaction_details_from_signed(
        &self,
        transaction: &str,
        known_viewing_keys: &[ViewingKey],
    ) -> Result<Vec<DisplayDetails>> {
        let transaction = decode(&hex::decode(transaction)?)?;

        let details = get_transactions_partial_details(&[transaction], known_viewing_keys)
            .into_iter()
            .map(DisplayDetails::from)
            .collect();

        Ok(filter_out_paybacks(details))
    }
}

#[async_trait]
impl<L, P, B> BalanceQuery for SaplingProtocol<L, P, B>
where
    L: LedgerState,
    P: Prover,
    B: BaseChain,
{
    #[tracing::instrument(err, skip_all)]
    async fn get_balance(&self, viewing_key: &ViewingKey) -> Result<BigUint> {
        let diff = self.ledger.state_diff().await?;
        let viewing_key = viewing_key.clone();

        blocking(move || {
            let unspends = get_unspends(
                &viewing_key,
                &diff.commitments_and_ciphertexts,
                &diff.nullifiers,
            );
            sum_notes(&unspends)
        })
        .await
    }

    async fn estimate_max_transaction_value(&self, viewing_key: &ViewingKey) -> Result<BigUint> {
        self.get_balance(viewing_key).await
    }

    async fn get_balance_of_addresses(&self, _addresses: &[String]) -> Result<BigUint> {
        Err(unsupported("get_balance_of_addresses"))
    }

    async fn get_available_balance_of_addresses(&self, _addresses: &[String]) -> Result<BigUint> {
        Err(unsupported("get_available_balance_of_addresses"))
    }

    async fn get_balance_of_public_key_for_sub_protocols(
        &self,
        _public_key: &str,
        _sub_protocols: &[String],
    ) -> Result<Vec<BigUint>> {
        Err(unsupported("get_balance_of_public_key_for_sub_protocols"))
    }
}

#[async_trait]
impl<L, P, B> TransferBuilder for SaplingProtocol<L, P, B>
where
    L: LedgerState,
    P: Prover,
    B: BaseChain,
{
    /// A single recipient is supported. Base-chain recipients get an unshield, shielded
    /// recipients a transfer. Recipients of neither kind are rejected before anything is fetched
    async fn prepare_transaction(
        &self,
        viewing_key: &ViewingKey,
        recipients: &[String],
        values: &[u64],
        options: TransferOptions,
    ) -> Result<UnsignedSaplingTransaction> {
        let (recipient, value) = match (recipients, values) {
            ([recipient], [value]) => (recipient.as_str(), *value),
            ([], _) | (_, []) => {
                return Err(sapling::Error::UnsupportedOperation(
                    "no recipients and values have been provided".to_owned(),
                )
                .into())
            }
            _ => {
                return Err(sapling::Error::UnsupportedOperation(
                    "multiple sapling transactions are not supported".to_owned(),
                )
                .into())
            }
        };

        if is_base_chain_address(recipient) {
            self.prepare_unshield(viewing_key, recipient, value).await
        } else if is_shielded_address(recipient) {
            self.prepare_transfer(
                viewing_key,
                recipient,
                value,
                options.dummy_inputs,
                options.dummy_outputs,
            )
            .await
        } else {
            Err(sapling::Error::InvalidRecipient(format!(
                "expected a 'tz' or 'zet' address, got {recipient}"
            ))
            .into())
        }
    }

    #[tracing::instrument(err, skip_all, fields(ins = transaction.ins.len(), outs = transaction.outs.len()))]
    async fn sign_with_spending_key(
        &self,
        spending_key: &SpendingKey,
        transaction: &UnsignedSaplingTransaction,
    ) -> Result<String> {
        let state_tree = transaction
            .state_diff
            .state_tree(self.config.merkle_tree_height, false)?;

        let bound_data = match transaction.unshield_target.as_deref() {
            Some(target) if !target.is_empty() => Some(target.parse::<BaseChainAddress>()?.pack()),
            _ => None,
        };

        let anti_replay = Self::anti_replay(&transaction.contract_address, &transaction.chain_id);

        let forged = forge_sapling_transaction(
            &self.prover,
            &transaction.ins,
            &transaction.outs,
            &state_tree,
            &anti_replay,
            bound_data.as_deref(),
            Some(spending_key),
        )
        .await?;

        Ok(hex::encode(encode(&forged)?))
    }
}

#[async_trait]
impl<L, P, B> HistoryQuery for SaplingProtocol<L, P, B>
where
    L: LedgerState,
    P: Prover,
    B: BaseChain,
{
    #[tracing::instrument(err, skip(self, viewing_key))]
    async fn get_transaction_history(
        &self,
        viewing_key: &ViewingKey,
        limit: usize,
        cursor: Option<TransactionCursor>,
    ) -> Result<TransactionPage> {
        let diff = self.ledger.state_diff().await?;
        let own_address = self.get_address(viewing_key);
        let viewing_key = viewing_key.clone();

        let (incoming, outgoing, cursor) = blocking(move || {
            walk_pages(&viewing_key, &diff, limit, cursor.unwrap_or_default())
        })
        .await?;

        let record = |from: String, note: &InputNote, is_inbound: bool| DisplayDetails {
            from: vec![from],
            to: vec![encode_shielded_address(note.address())],
            is_inbound,
            amount: note.value(),
            fee: 0,
            memo: Some(hex::encode(&note.note.memo)),
            destination: None,
            chain_id: None,
        };

        let transactions = incoming
            .iter()
            .map(|note| record(SHIELDED_POOL.to_owned(), note, true))
            .chain(
                outgoing
                    .iter()
                    .map(|note| record(own_address.clone(), note, false)),
            )
            .collect();

        Ok(TransactionPage {
            transactions: filter_out_paybacks(transactions),
            cursor,
        })
    }

    async fn get_transactions_from_addresses(
        &self,
        _addresses: &[String],
        _limit: usize,
        _cursor: Option<TransactionCursor>,
    ) -> Result<TransactionPage> {
        Err(unsupported("get_transactions_from_addresses"))
    }
}
