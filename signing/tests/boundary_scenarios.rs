//! End-to-end dialogues exercising `SigningHandler` against the same boundary scenarios used to
//! seed this workspace's design notes: a plain spend, a change output, a 2-of-3 multisig change
//! output, a fee over the per-kilobyte ceiling, a tampered replay, and a lying previous-transaction
//! hash. Each test drives the full eight-stage dialogue by hand, answering every `TxRequest` with
//! canned data rather than a real wallet.

use std::cell::RefCell;
use std::rc::Rc;

use txbitcoin::{LegacyTx, Outpoint, ScriptPubkey, ScriptSig, TxIn, TxOut};
use txcore::hashes::Hash256Digest;
use txhal::coin::CoinParams;
use txhal::confirm::Confirmer;
use txhal::keys::{
    DerivationPath, DerivesPrivateKey, KeyError, PrivateKey, PublicKey, Secp256k1Signature,
    Secp256k1Signer,
};
use txhal::progress::{LoggingProgressSink, ProgressSink};
use txsigning::error::{OtherError, SigningError};
use txsigning::protocol::{
    InputScriptType, MultisigRedeemScriptType, OutputScriptType, PrevTxMeta, RequestType, TxAck,
    TxInputType, TxOutputBinType, TxOutputType,
};
use txsigning::{SigningHandler, TxRequest};

/// Derives a "private key" deterministically from a path, with no real field arithmetic: good
/// enough to exercise the dialogue, not a key-derivation implementation.
struct FixedRoot;

impl DerivesPrivateKey for FixedRoot {
    fn derive_private_key(&self, path: &DerivationPath) -> Result<PrivateKey, KeyError> {
        let mut seed = Vec::new();
        for index in path.as_slice() {
            seed.extend_from_slice(&index.to_le_bytes());
        }
        Ok(PrivateKey::from_bytes(txcore::hashes::sha256(&seed)))
    }
}

/// Produces deterministic, structurally DER-shaped signatures from a digest and key, with no real
/// secp256k1 arithmetic behind them.
struct FixedSigner;

impl Secp256k1Signer for FixedSigner {
    fn sign_digest(
        &self,
        privkey: &PrivateKey,
        digest: [u8; 32],
    ) -> Result<Secp256k1Signature, KeyError> {
        let mut der = vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01];
        der.extend_from_slice(privkey.as_bytes());
        der.extend_from_slice(&digest);
        Ok(Secp256k1Signature(der))
    }

    fn derive_pubkey(&self, privkey: &PrivateKey) -> Result<PublicKey, KeyError> {
        let digest = txcore::hashes::sha256(privkey.as_bytes());
        let mut bytes = [0u8; 33];
        bytes[0] = 0x02;
        bytes[1..].copy_from_slice(&digest[..32]);
        Ok(PublicKey(bytes))
    }
}

#[derive(Default, Clone)]
struct ConfirmLog {
    output_calls: Vec<(String, u64)>,
    fee_calls: Vec<u64>,
    total_calls: Vec<(u64, u64)>,
}

/// A `Confirmer` that answers every gate with a fixed verdict, logging every call to a shared cell
/// so the test can inspect what the dialogue actually asked for.
#[derive(Clone)]
struct ScriptedConfirmer {
    accept: bool,
    log: Rc<RefCell<ConfirmLog>>,
}

impl ScriptedConfirmer {
    fn accepting() -> Self {
        Self {
            accept: true,
            log: Rc::new(RefCell::new(ConfirmLog::default())),
        }
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm_output(&mut self, address: &str, amount: u64) -> bool {
        self.log.borrow_mut().output_calls.push((address.to_string(), amount));
        self.accept
    }

    fn confirm_fee(&mut self, fee: u64) -> bool {
        self.log.borrow_mut().fee_calls.push(fee);
        self.accept
    }

    fn confirm_total(&mut self, total_amount: u64, fee: u64) -> bool {
        self.log.borrow_mut().total_calls.push((total_amount, fee));
        self.accept
    }
}

type Handler = SigningHandler<FixedRoot, FixedSigner, ScriptedConfirmer, LoggingProgressSink>;

fn handler(confirmer: ScriptedConfirmer) -> Handler {
    SigningHandler::new(confirmer, LoggingProgressSink)
}

/// A previous transaction plus the hash the *input* claims it has. Ordinarily these agree; the
/// bad-prevhash scenario deliberately sets `claimed_hash` to something the transaction's real
/// content does not hash to, simulating a host that lies about which transaction it is streaming.
#[derive(Clone)]
struct PrevTxFixture {
    claimed_hash: [u8; 32],
    tx: LegacyTx,
}

impl PrevTxFixture {
    fn new(tx: LegacyTx) -> Self {
        let claimed_hash = tx.txid().as_bytes();
        Self { claimed_hash, tx }
    }

    fn with_claimed_hash(tx: LegacyTx, claimed_hash: [u8; 32]) -> Self {
        Self { claimed_hash, tx }
    }

    fn meta(&self) -> PrevTxMeta {
        PrevTxMeta {
            inputs_cnt: self.tx.vin.len() as u32,
            outputs_cnt: self.tx.vout.len() as u32,
            version: self.tx.version,
            lock_time: self.tx.locktime,
        }
    }

    fn input_ack(&self, idx: usize) -> TxInputType {
        let txin = &self.tx.vin[idx];
        TxInputType {
            address_n: DerivationPath::new(vec![]),
            prev_hash: txin.outpoint.txid.as_bytes(),
            prev_index: txin.outpoint.index,
            script_sig: txin.script_sig.clone(),
            sequence: txin.sequence,
            script_type: InputScriptType::SpendAddress,
            multisig: None,
        }
    }

    fn output_bin_ack(&self, idx: usize) -> TxOutputBinType {
        let out = &self.tx.vout[idx];
        TxOutputBinType {
            amount: out.value,
            script_pubkey: out.script_pubkey.clone(),
        }
    }
}

/// A one-input, one-output previous transaction, just rich enough to have a verifiable `prev_hash`
/// and a spendable output at index 0.
fn trivial_prev_tx(output_value: u64, output_script: ScriptPubkey) -> LegacyTx {
    let dummy_in = TxIn::new(
        Outpoint::new(Hash256Digest([0u8; 32]).into(), 0),
        ScriptSig::null(),
        0xffff_ffff,
    );
    LegacyTx::new(1, vec![dummy_in], vec![TxOut::new(output_value, output_script)], 0)
}

/// Answers whatever `req` is asking for, given the session's own inputs/outputs and the previous
/// transactions they spend from. Works for every stage because the own-transaction's input/output
/// acks are identical across Phase 1 and Phase 2 -- the dialogue re-asks for the same data, not new
/// data, each time it replays.
fn build_ack(
    req: &TxRequest,
    inputs: &[TxInputType],
    prevs: &[PrevTxFixture],
    outputs: &[TxOutputType],
) -> Option<TxAck> {
    match req.request_type {
        RequestType::TxFinished => None,
        RequestType::TxMeta => {
            let hash = req.details.tx_hash.expect("TxMeta always carries a tx_hash");
            let prev = prevs
                .iter()
                .find(|p| p.claimed_hash == hash)
                .expect("no fixture claims this prev hash");
            Some(TxAck::Meta(prev.meta()))
        }
        RequestType::TxInput => {
            if let Some(hash) = req.details.tx_hash {
                let prev = prevs
                    .iter()
                    .find(|p| p.claimed_hash == hash)
                    .expect("no fixture claims this prev hash");
                Some(TxAck::Input(prev.input_ack(req.details.request_index as usize)))
            } else {
                Some(TxAck::Input(inputs[req.details.request_index as usize].clone()))
            }
        }
        RequestType::TxOutput => {
            if let Some(hash) = req.details.tx_hash {
                let prev = prevs
                    .iter()
                    .find(|p| p.claimed_hash == hash)
                    .expect("no fixture claims this prev hash");
                Some(TxAck::BinOutput(prev.output_bin_ack(req.details.request_index as usize)))
            } else {
                Some(TxAck::Output(outputs[req.details.request_index as usize].clone()))
            }
        }
    }
}

/// Drives `handler` to completion or error, answering every request with `ack_for`. Returns every
/// `TxRequest` seen, in order, including the initial one from `init`.
fn drive_with<F>(
    handler: &mut Handler,
    first: TxRequest,
    mut ack_for: F,
) -> Result<Vec<TxRequest>, SigningError>
where
    F: FnMut(&TxRequest) -> Option<TxAck>,
{
    let mut responses = vec![first.clone()];
    let mut current = first;
    loop {
        match ack_for(&current) {
            None => break,
            Some(ack) => {
                current = handler.ack(ack)?;
                responses.push(current.clone());
                if current.request_type == RequestType::TxFinished {
                    break;
                }
            }
        }
    }
    Ok(responses)
}

fn drive(
    handler: &mut Handler,
    first: TxRequest,
    inputs: &[TxInputType],
    prevs: &[PrevTxFixture],
    outputs: &[TxOutputType],
) -> Result<Vec<TxRequest>, SigningError> {
    drive_with(handler, first, |req| build_ack(req, inputs, prevs, outputs))
}

const MAINNET_ADDRESS_A: &str = "12ZEw5Hcv1hTb6YUQJ69y1V7uhcoDz92PH"; // hash160 = 0x11 repeated
const MAINNET_ADDRESS_B: &str = "147Us9aEq2PvBC5wobBJw1yEpQEbPKzssA"; // hash160 = 0x22 repeated

fn spend_address_input(prev_hash: [u8; 32]) -> TxInputType {
    TxInputType {
        address_n: DerivationPath::new(vec![0x8000_002c, 0x8000_0000, 0x8000_0000, 0, 0]),
        prev_hash,
        prev_index: 0,
        script_sig: ScriptSig::null(),
        sequence: 0xffff_ffff,
        script_type: InputScriptType::SpendAddress,
        multisig: None,
    }
}

fn external_output(address: &str, amount: u64) -> TxOutputType {
    TxOutputType {
        address: Some(address.to_string()),
        address_n: DerivationPath::new(vec![]),
        amount,
        script_type: OutputScriptType::PayToAddress,
        address_type: None,
        multisig: None,
    }
}

fn change_output(amount: u64) -> TxOutputType {
    TxOutputType {
        address: None,
        address_n: DerivationPath::new(vec![0x8000_002c, 0x8000_0000, 0x8000_0000, 1, 0]),
        amount,
        script_type: OutputScriptType::PayToAddress,
        address_type: None,
        multisig: None,
    }
}

#[test]
fn one_input_one_output_no_change_produces_a_valid_transaction() {
    let prev = PrevTxFixture::new(trivial_prev_tx(100_000, ScriptPubkey::p2pkh(&[0xaau8; 20])));
    let inputs = vec![spend_address_input(prev.claimed_hash)];
    let outputs = vec![external_output(MAINNET_ADDRESS_A, 90_000)];

    let confirmer = ScriptedConfirmer::accepting();
    let log = confirmer.log.clone();
    let mut handler = handler(confirmer);

    let first = handler.init(1, 1, 1, 0, CoinParams::bitcoin_mainnet(), FixedRoot, FixedSigner);
    let responses = drive(&mut handler, first, &inputs, &[prev], &outputs).unwrap();

    assert!(!handler.is_signing());
    assert_eq!(responses.last().unwrap().request_type, RequestType::TxFinished);

    assert_eq!(
        log.borrow().output_calls,
        vec![(MAINNET_ADDRESS_A.to_string(), 90_000)]
    );
    assert!(log.borrow().fee_calls.is_empty());
    assert_eq!(log.borrow().total_calls, vec![(100_000, 10_000)]);

    let signed_inputs: Vec<_> = responses
        .iter()
        .filter(|r| r.serialized.as_ref().map_or(false, |s| s.signature.is_some()))
        .collect();
    assert_eq!(signed_inputs.len(), 1);

    let tx_bytes: Vec<u8> = responses
        .iter()
        .filter_map(|r| r.serialized.as_ref().map(|s| s.serialized_tx.clone()))
        .flatten()
        .collect();
    let rebuilt = LegacyTx::deserialize_hex(&hex::encode(&tx_bytes)).unwrap();
    assert_eq!(rebuilt.version, 1);
    assert_eq!(rebuilt.locktime, 0);
    assert_eq!(rebuilt.vin.len(), 1);
    assert_eq!(rebuilt.vout.len(), 1);
    assert_eq!(rebuilt.vout[0].value, 90_000);
}

#[test]
fn one_input_two_outputs_classifies_the_derivation_path_output_as_change() {
    let prev = PrevTxFixture::new(trivial_prev_tx(100_000, ScriptPubkey::p2pkh(&[0xaau8; 20])));
    let inputs = vec![spend_address_input(prev.claimed_hash)];
    let outputs = vec![external_output(MAINNET_ADDRESS_A, 70_000), change_output(29_000)];

    let confirmer = ScriptedConfirmer::accepting();
    let log = confirmer.log.clone();
    let mut handler = handler(confirmer);

    let first = handler.init(1, 2, 1, 0, CoinParams::bitcoin_mainnet(), FixedRoot, FixedSigner);
    let responses = drive(&mut handler, first, &inputs, &[prev], &outputs).unwrap();

    assert_eq!(responses.last().unwrap().request_type, RequestType::TxFinished);
    assert_eq!(
        log.borrow().output_calls,
        vec![(MAINNET_ADDRESS_A.to_string(), 70_000)]
    );
    assert!(log.borrow().fee_calls.is_empty());
    assert_eq!(log.borrow().total_calls, vec![(71_000, 1_000)]);
}

#[test]
fn two_multisig_inputs_sign_independently_and_the_sole_output_is_change() {
    let pubkeys = vec![[1u8; 33], [2u8; 33], [3u8; 33]];
    let multisig = MultisigRedeemScriptType {
        pubkeys: pubkeys.clone(),
        signatures_required: 2,
    };

    let prev_a = PrevTxFixture::new(trivial_prev_tx(60_000, ScriptPubkey::p2sh(&[0x01u8; 20])));
    let prev_b = PrevTxFixture::new(trivial_prev_tx(50_000, ScriptPubkey::p2sh(&[0x02u8; 20])));

    let multisig_input = |prev_hash: [u8; 32]| TxInputType {
        address_n: DerivationPath::new(vec![]),
        prev_hash,
        prev_index: 0,
        script_sig: ScriptSig::null(),
        sequence: 0xffff_ffff,
        script_type: InputScriptType::SpendMultisig,
        multisig: Some(multisig.clone()),
    };

    let inputs = vec![multisig_input(prev_a.claimed_hash), multisig_input(prev_b.claimed_hash)];
    let outputs = vec![TxOutputType {
        address: None,
        address_n: DerivationPath::new(vec![]),
        amount: 109_000,
        script_type: OutputScriptType::PayToMultisig,
        address_type: None,
        multisig: Some(multisig),
    }];

    let confirmer = ScriptedConfirmer::accepting();
    let log = confirmer.log.clone();
    let mut handler = handler(confirmer);

    let first = handler.init(2, 1, 1, 0, CoinParams::bitcoin_mainnet(), FixedRoot, FixedSigner);
    let responses = drive(&mut handler, first, &inputs, &[prev_a, prev_b], &outputs).unwrap();

    assert_eq!(responses.last().unwrap().request_type, RequestType::TxFinished);
    assert!(log.borrow().output_calls.is_empty(), "the sole output is change, never confirmed");
    assert_eq!(log.borrow().total_calls, vec![(1_000, 1_000)]);

    let signed_inputs: Vec<_> = responses
        .iter()
        .filter(|r| r.serialized.as_ref().map_or(false, |s| s.signature.is_some()))
        .collect();
    assert_eq!(signed_inputs.len(), 2);
}

#[test]
fn a_fee_past_the_coins_ceiling_triggers_an_extra_confirmation() {
    let prev = PrevTxFixture::new(trivial_prev_tx(100_000, ScriptPubkey::p2pkh(&[0xaau8; 20])));
    let inputs = vec![spend_address_input(prev.claimed_hash)];
    let outputs = vec![external_output(MAINNET_ADDRESS_A, 90_000)];

    let mut coin = CoinParams::bitcoin_mainnet();
    coin.maxfee_kb = 5_000; // the 10,000 sat fee now exceeds the ceiling

    let confirmer = ScriptedConfirmer::accepting();
    let log = confirmer.log.clone();
    let mut handler = handler(confirmer);

    let first = handler.init(1, 1, 1, 0, coin, FixedRoot, FixedSigner);
    let responses = drive(&mut handler, first, &inputs, &[prev], &outputs).unwrap();

    assert_eq!(responses.last().unwrap().request_type, RequestType::TxFinished);
    assert_eq!(log.borrow().fee_calls, vec![10_000]);
}

#[test]
fn declining_the_fee_prompt_cancels_the_session() {
    let prev = PrevTxFixture::new(trivial_prev_tx(100_000, ScriptPubkey::p2pkh(&[0xaau8; 20])));
    let inputs = vec![spend_address_input(prev.claimed_hash)];
    let outputs = vec![external_output(MAINNET_ADDRESS_A, 90_000)];

    let mut coin = CoinParams::bitcoin_mainnet();
    coin.maxfee_kb = 5_000;

    let mut handler = handler(ScriptedConfirmer {
        accept: false,
        log: Rc::new(RefCell::new(ConfirmLog::default())),
    });

    let first = handler.init(1, 1, 1, 0, coin, FixedRoot, FixedSigner);
    let err = drive(&mut handler, first, &inputs, &[prev], &outputs).unwrap_err();

    assert!(matches!(err, SigningError::ActionCancelled));
    assert!(!handler.is_signing());
}

#[test]
fn a_mutated_replay_in_phase_two_is_caught_by_the_checksum() {
    let prev = PrevTxFixture::new(trivial_prev_tx(100_000, ScriptPubkey::p2pkh(&[0xaau8; 20])));
    let original_input = spend_address_input(prev.claimed_hash);
    let outputs = vec![external_output(MAINNET_ADDRESS_A, 90_000)];

    let mut handler = handler(ScriptedConfirmer::accepting());
    let first = handler.init(1, 1, 1, 0, CoinParams::bitcoin_mainnet(), FixedRoot, FixedSigner);

    let mut own_input_requests = 0u32;
    let err = drive_with(&mut handler, first, |req| {
        if req.request_type == RequestType::TxInput
            && req.details.tx_hash.is_none()
            && req.details.request_index == 0
        {
            own_input_requests += 1;
            if own_input_requests == 2 {
                // Phase 2's replay of the same input, tampered: the sequence number now disagrees
                // with what Phase 1 saw and committed to the checksum.
                let mut tampered = original_input.clone();
                tampered.sequence = 0xdead_beef;
                return Some(TxAck::Input(tampered));
            }
            return Some(TxAck::Input(original_input.clone()));
        }
        build_ack(req, &[], &[prev], &outputs)
    })
    .unwrap_err();

    assert!(matches!(
        err,
        SigningError::Other(OtherError::ChecksumMismatch)
    ));
    assert!(!handler.is_signing());
}

#[test]
fn a_mutated_replay_on_the_second_signing_pass_is_also_caught() {
    // Two inputs means Stage 4 replays the whole input/output shape twice (once per `idx1`).
    // Tampering only on the second pass proves the checksum is re-armed and compared every pass,
    // not just the first -- the bug this guards against silently trusted every pass after idx1 0.
    let prev_a = PrevTxFixture::new(trivial_prev_tx(60_000, ScriptPubkey::p2pkh(&[0xaau8; 20])));
    let prev_b = PrevTxFixture::new(trivial_prev_tx(50_000, ScriptPubkey::p2pkh(&[0xbbu8; 20])));
    let original_second_input = spend_address_input(prev_b.claimed_hash);
    let inputs = vec![spend_address_input(prev_a.claimed_hash), original_second_input.clone()];
    let outputs = vec![external_output(MAINNET_ADDRESS_A, 90_000)];

    let mut handler = handler(ScriptedConfirmer::accepting());
    let first = handler.init(2, 1, 1, 0, CoinParams::bitcoin_mainnet(), FixedRoot, FixedSigner);

    let mut second_input_requests = 0u32;
    let err = drive_with(&mut handler, first, |req| {
        if req.request_type == RequestType::TxInput
            && req.details.tx_hash.is_none()
            && req.details.request_index == 1
        {
            second_input_requests += 1;
            if second_input_requests == 3 {
                // The third time input 1 is asked for is Stage 4's second pass (idx1 == 1):
                // once in Stage 1, once in Stage 4's idx1 == 0 pass, now idx1 == 1.
                let mut tampered = original_second_input.clone();
                tampered.sequence = 0xdead_beef;
                return Some(TxAck::Input(tampered));
            }
            return Some(TxAck::Input(original_second_input.clone()));
        }
        build_ack(req, &inputs, &[prev_a.clone(), prev_b.clone()], &outputs)
    })
    .unwrap_err();

    assert!(matches!(
        err,
        SigningError::Other(OtherError::ChecksumMismatch)
    ));
    assert!(!handler.is_signing());
}

/// Records every `tick` call, so a test can distinguish the 20-ack cadence from stage-boundary
/// ticks without needing a real display.
#[derive(Clone, Default)]
struct CountingProgressSink {
    ticks: Rc<RefCell<Vec<u32>>>,
}

impl ProgressSink for CountingProgressSink {
    fn tick(&mut self, acks_processed: u32) {
        self.ticks.borrow_mut().push(acks_processed);
    }
}

#[test]
fn stage_transitions_tick_progress_even_on_a_short_session() {
    // A 1-in/1-out session never reaches the 20-ack cadence, but every one of its 8 acks moves
    // the dialogue to a new stage, so progress should still tick 8 times.
    let prev = PrevTxFixture::new(trivial_prev_tx(100_000, ScriptPubkey::p2pkh(&[0xaau8; 20])));
    let inputs = vec![spend_address_input(prev.claimed_hash)];
    let outputs = vec![external_output(MAINNET_ADDRESS_A, 90_000)];

    let sink = CountingProgressSink::default();
    let ticks = sink.ticks.clone();
    let mut handler: SigningHandler<FixedRoot, FixedSigner, ScriptedConfirmer, CountingProgressSink> =
        SigningHandler::new(ScriptedConfirmer::accepting(), sink);

    let first = handler.init(1, 1, 1, 0, CoinParams::bitcoin_mainnet(), FixedRoot, FixedSigner);
    drive(&mut handler, first, &inputs, &[prev], &outputs).unwrap();

    assert_eq!(ticks.borrow().len(), 8);
}

#[test]
fn a_previous_transaction_that_does_not_hash_to_its_claimed_id_is_rejected() {
    let real_tx = trivial_prev_tx(100_000, ScriptPubkey::p2pkh(&[0xaau8; 20]));
    let claimed_hash = [0xeeu8; 32]; // not this transaction's real double-SHA256
    let prev = PrevTxFixture::with_claimed_hash(real_tx, claimed_hash);

    let inputs = vec![spend_address_input(claimed_hash)];
    let outputs = vec![external_output(MAINNET_ADDRESS_A, 90_000)];

    let mut handler = handler(ScriptedConfirmer::accepting());
    let first = handler.init(1, 1, 1, 0, CoinParams::bitcoin_mainnet(), FixedRoot, FixedSigner);
    let err = drive(&mut handler, first, &inputs, &[prev], &outputs).unwrap_err();

    assert!(matches!(
        err,
        SigningError::Other(OtherError::InvalidPrevhash)
    ));
    assert!(!handler.is_signing());
}
