//! The eight-stage signing dialogue.
//!
//! `SigningHandler` is the dispatcher: it holds at most one active `Session` (`Option<Session>`),
//! exactly mirroring the original firmware's single process-wide `signing` bool (see the design
//! notes' "session teardown is type-level" entry) -- a stray ack when no session is active simply
//! finds `None` and produces `SigningError::UnexpectedMessage`, and `abort` is idempotent because
//! `Option::take` on an already-`None` session is a no-op.

use txbitcoin::{ScriptSig, TxBuilder, TxHasher, TxIn, TxOut};
use txhal::keys::{DerivesPrivateKey, Secp256k1Signer};
use txhal::{CoinParams, Confirmer, ProgressSink};

use crate::change::ChangeDetector;
use crate::checksum::TxChecksum;
use crate::error::{OtherError, SigningError, SigningResult};
use crate::protocol::{
    OutputScriptType, PrevTxMeta, RequestType, TxAck, TxInputType, TxOutputType, TxRequest,
};
use crate::signer;

/// Report confirmation/progress ticks after this many acks, matching the original firmware's
/// animation cadence.
const PROGRESS_TICK_ACKS: u32 = 20;

/// The eight stages of the dialogue, plus the two terminal states.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stage {
    RequestInput1,
    RequestPrevMeta,
    RequestPrevInput,
    RequestPrevOutput,
    RequestOutput3,
    RequestInput4,
    RequestOutput4,
    RequestOutput5,
    Finished,
}

/// All process-wide state for one signing session. Created by `SigningHandler::init`, mutated
/// only by `SigningHandler::ack`, and dropped on `abort`/`finish`.
pub struct Session<R, S> {
    inputs_count: u32,
    outputs_count: u32,
    version: u32,
    lock_time: u32,
    coin: CoinParams,
    root: R,
    signer: S,

    stage: Stage,
    idx1: u32,
    idx2: u32,
    acks_processed: u32,

    to_spend: u64,
    spending: u64,
    change_spend: Option<u64>,
    change_detector: ChangeDetector,
    /// The output index classified as change in Stage 3, if any. Stages 4 and 5 re-stream every
    /// output but must not re-run `ChangeDetector::classify` against it (that would trip its
    /// at-most-one-change-output bookkeeping a second time) -- they look the index up here instead.
    change_index: Option<u32>,

    checksum: TxChecksum,
    checksum_phase1: Option<[u8; 32]>,

    prev_meta: Option<PrevTxMeta>,
    prev_tx_ctx: Option<TxHasher>,
    current_input: Option<TxInputType>,

    sign_tx_ctx: Option<TxHasher>,
    out_tx_ctx: TxBuilder,

    signatures_emitted: u32,
    chunks_emitted: u32,
}

impl<R: DerivesPrivateKey, S: Secp256k1Signer> Session<R, S> {
    fn new(inputs_count: u32, outputs_count: u32, version: u32, lock_time: u32, coin: CoinParams, root: R, signer: S) -> Self {
        Self {
            inputs_count,
            outputs_count,
            version,
            lock_time,
            coin,
            root,
            signer,
            stage: Stage::RequestInput1,
            idx1: 0,
            idx2: 0,
            acks_processed: 0,
            to_spend: 0,
            spending: 0,
            change_spend: None,
            change_detector: ChangeDetector::new(),
            change_index: None,
            checksum: TxChecksum::new(inputs_count, outputs_count, version, lock_time),
            checksum_phase1: None,
            prev_meta: None,
            prev_tx_ctx: None,
            current_input: None,
            sign_tx_ctx: None,
            out_tx_ctx: TxBuilder::new(version, inputs_count as u64, outputs_count as u64),
            signatures_emitted: 0,
            chunks_emitted: 0,
        }
    }

    fn fee(&self) -> u64 {
        self.to_spend.saturating_sub(self.spending)
    }
}

/// Runs the state machine. Holds the injected key-derivation root, signing backend, confirmer,
/// and progress sink for the lifetime of the handler; a session is created per `init` call and
/// torn down on `finish`/`abort`.
pub struct SigningHandler<R, S, C, P> {
    session: Option<Session<R, S>>,
    confirmer: C,
    progress: P,
}

impl<R, S, C, P> SigningHandler<R, S, C, P>
where
    R: DerivesPrivateKey,
    S: Secp256k1Signer,
    C: Confirmer,
    P: ProgressSink,
{
    /// Build a handler with no active session.
    pub fn new(confirmer: C, progress: P) -> Self {
        Self {
            session: None,
            confirmer,
            progress,
        }
    }

    /// `true` while a session is in progress.
    pub fn is_signing(&self) -> bool {
        self.session.is_some()
    }

    /// Begin a new session. Panics via a logged error path is not this crate's style; instead,
    /// starting a second session while one is active simply replaces it -- callers own enforcing
    /// single-session USB semantics, exactly as the design notes describe (re-entry into
    /// `signing_init` without prior teardown is the caller's responsibility to avoid).
    pub fn init(
        &mut self,
        inputs_count: u32,
        outputs_count: u32,
        version: u32,
        lock_time: u32,
        coin: CoinParams,
        root: R,
        signer: S,
    ) -> TxRequest {
        log::debug!(
            "signing_init: {} inputs, {} outputs",
            inputs_count,
            outputs_count
        );
        self.session = Some(Session::new(
            inputs_count,
            outputs_count,
            version,
            lock_time,
            coin,
            root,
            signer,
        ));
        TxRequest::input(0)
    }

    /// Abort the active session, if any. A no-op if no session is active (idempotent by
    /// construction: the second call observes `None`).
    pub fn abort(&mut self) {
        if self.session.take().is_some() {
            log::debug!("signing_abort: session torn down");
        }
    }

    /// Process one `TxAck`, returning the next `TxRequest` or a fatal `SigningError`. On error,
    /// the session is torn down (mirroring "all errors are fatal to the session... clears
    /// signing").
    pub fn ack(&mut self, ack: TxAck) -> SigningResult<TxRequest> {
        let result = self.dispatch(ack);
        if result.is_err() {
            self.session = None;
        }
        result
    }

    /// `Failure` to report to the host for a fatal `SigningError`.
    pub fn to_failure(err: &SigningError) -> crate::error::Failure {
        crate::error::Failure::from(err)
    }

    fn dispatch(&mut self, ack: TxAck) -> SigningResult<TxRequest> {
        let session = self
            .session
            .as_mut()
            .ok_or(SigningError::UnexpectedMessage)?;

        session.acks_processed += 1;
        if session.acks_processed % PROGRESS_TICK_ACKS == 0 {
            self.progress.tick(session.acks_processed);
        }

        log::trace!("signing_txack: stage = {:?}, ack = {:?}", session.stage, ack);

        let stage_before = session.stage;
        let request = match stage_before {
            Stage::RequestInput1 => Self::on_request_input1(session, ack)?,
            Stage::RequestPrevMeta => Self::on_request_prev_meta(session, ack)?,
            Stage::RequestPrevInput => Self::on_request_prev_input(session, ack)?,
            Stage::RequestPrevOutput => Self::on_request_prev_output(session, ack)?,
            Stage::RequestOutput3 => Self::on_request_output3(session, ack, &mut self.confirmer)?,
            Stage::RequestInput4 => Self::on_request_input4(session, ack)?,
            Stage::RequestOutput4 => Self::on_request_output4(session, ack)?,
            Stage::RequestOutput5 => Self::on_request_output5(session, ack)?,
            Stage::Finished => return Err(SigningError::UnexpectedMessage),
        };

        // Phase/stage boundaries also tick the progress animation, independent of the 20-ack
        // cadence above -- a stage that only lasts a handful of acks (e.g. Stage 3 on a
        // single-output transaction) would otherwise never animate at all.
        if session.stage != stage_before {
            self.progress.tick(session.acks_processed);
        }

        if session.stage == Stage::Finished {
            log::debug!("signing session finished");
            self.session = None;
        }

        Ok(request)
    }

    fn expect_input(ack: TxAck) -> SigningResult<TxInputType> {
        match ack {
            TxAck::Input(input) => Ok(input),
            _ => Err(SigningError::UnexpectedMessage),
        }
    }

    fn expect_output(ack: TxAck) -> SigningResult<TxOutputType> {
        match ack {
            TxAck::Output(output) => Ok(output),
            _ => Err(SigningError::UnexpectedMessage),
        }
    }

    fn expect_bin_output(ack: TxAck) -> SigningResult<TxOut> {
        match ack {
            TxAck::BinOutput(bin) => Ok(TxOut::new(bin.amount, bin.script_pubkey)),
            _ => Err(SigningError::UnexpectedMessage),
        }
    }

    fn expect_meta(ack: TxAck) -> SigningResult<PrevTxMeta> {
        match ack {
            TxAck::Meta(meta) => Ok(meta),
            _ => Err(SigningError::UnexpectedMessage),
        }
    }

    /// Stage 1: collect input `idx1`. Feeds the Phase 1 checksum and the change-detector's
    /// multisig fingerprint tracker. On the last input, moves on to streaming its previous
    /// transaction (Stage 2); otherwise asks for the next input.
    fn on_request_input1(session: &mut Session<R, S>, ack: TxAck) -> SigningResult<TxRequest> {
        let input = Self::expect_input(ack)?;
        session.change_detector.observe_input(&input);
        session.checksum.update_input(&input);
        session.current_input = Some(input.clone());

        session.idx2 = 0;
        session.prev_tx_ctx = Some(TxHasher::new(0, 0, 0)); // re-seeded once prev_meta arrives
        session.stage = Stage::RequestPrevMeta;
        Ok(TxRequest::prev_meta(input.prev_hash))
    }

    /// Stage 2 (metadata): learn the previous transaction's shape, re-seed the rolling
    /// previous-tx hasher accordingly, and move to its first input.
    fn on_request_prev_meta(session: &mut Session<R, S>, ack: TxAck) -> SigningResult<TxRequest> {
        let meta = Self::expect_meta(ack)?;
        let input = session
            .current_input
            .clone()
            .expect("Stage 2 is only entered after Stage 1 latches current_input");

        session.prev_tx_ctx = Some(TxHasher::new(
            meta.version,
            meta.inputs_cnt as u64,
            meta.outputs_cnt as u64,
        ));
        session.prev_meta = Some(meta);
        session.idx2 = 0;
        session.stage = Stage::RequestPrevInput;
        Ok(TxRequest::prev_input(input.prev_hash, 0))
    }

    /// Stage 2 (previous inputs): re-hash each of the previous transaction's own inputs. These
    /// are opaque to this core -- it only needs their bytes to reproduce `prev_hash`.
    fn on_request_prev_input(session: &mut Session<R, S>, ack: TxAck) -> SigningResult<TxRequest> {
        let input = Self::expect_input(ack)?;
        let current = session
            .current_input
            .clone()
            .expect("latched by Stage 1");
        let meta = *session.prev_meta.as_ref().expect("set in Stage 2 meta");

        let txin = TxIn::new(input.outpoint(), input.script_sig.clone(), input.sequence);
        session
            .prev_tx_ctx
            .as_mut()
            .expect("seeded in Stage 2 meta")
            .serialize_input(&txin);

        session.idx2 += 1;
        if session.idx2 < meta.inputs_cnt {
            Ok(TxRequest::prev_input(current.prev_hash, session.idx2))
        } else {
            session.idx2 = 0;
            session.stage = Stage::RequestPrevOutput;
            Ok(TxRequest::prev_output(current.prev_hash, 0))
        }
    }

    /// Stage 2 (previous outputs): re-hash each output, accumulating `to_spend` when it is the
    /// one this input actually spends. On the last output, verifies the rehashed previous
    /// transaction matches the input's declared `prev_hash` -- the device's defense against a
    /// host lying about an input's value.
    fn on_request_prev_output(session: &mut Session<R, S>, ack: TxAck) -> SigningResult<TxRequest> {
        let bin_output = Self::expect_bin_output(ack)?;
        let current = session
            .current_input
            .clone()
            .expect("latched by Stage 1");
        let meta = *session.prev_meta.as_ref().expect("set in Stage 2 meta");

        if session.idx2 == current.prev_index {
            session.to_spend += bin_output.value;
        }

        session
            .prev_tx_ctx
            .as_mut()
            .expect("seeded in Stage 2 meta")
            .serialize_output(&bin_output);

        session.idx2 += 1;
        if session.idx2 < meta.outputs_cnt {
            return Ok(TxRequest::prev_output(current.prev_hash, session.idx2));
        }

        let hasher = session.prev_tx_ctx.take().expect("seeded in Stage 2 meta");
        let mut footer = hasher;
        footer.add_u32_le(meta.lock_time);
        let rehashed = footer.finalize(true);
        if rehashed != current.prev_hash {
            return Err(SigningError::Other(OtherError::InvalidPrevhash));
        }

        session.idx1 += 1;
        if session.idx1 < session.inputs_count {
            session.stage = Stage::RequestInput1;
            Ok(TxRequest::input(session.idx1))
        } else {
            session.idx1 = 0;
            session.stage = Stage::RequestOutput3;
            Ok(TxRequest::output(0))
        }
    }

    /// Stage 3: classify, confirm, and accumulate each output. On the last output, runs the fee
    /// and final-total confirmation gates and finalizes the Phase 1 checksum.
    fn on_request_output3(
        session: &mut Session<R, S>,
        ack: TxAck,
        confirmer: &mut C,
    ) -> SigningResult<TxRequest> {
        let output = Self::expect_output(ack)?;
        let is_change = session.change_detector.classify(&output)?;

        let compiled = compile_output(session, &output, is_change)?;
        session.checksum.update_output(&compiled);

        // `spending` is the sum of every output's amount, change included: the fee gate below
        // relies on `to_spend - spending` equalling the miner fee, and the final confirmation's
        // `total_amount = to_spend - change_spend` only holds if `spending` already counts the
        // change output's value (see the worked boundary scenarios in the design notes).
        session.spending += output.amount;
        if is_change {
            session.change_index = Some(session.idx1);
            session.change_spend = Some(session.change_spend.unwrap_or(0) + output.amount);
        } else {
            let address = output.address.clone().unwrap_or_default();
            if !confirmer.confirm_output(&address, output.amount) {
                return Err(SigningError::ActionCancelled);
            }
        }

        session.idx1 += 1;
        if session.idx1 < session.outputs_count {
            return Ok(TxRequest::output(session.idx1));
        }

        if session.spending > session.to_spend {
            return Err(SigningError::NotEnoughFunds {
                spending: session.spending,
                to_spend: session.to_spend,
            });
        }

        let fee = session.fee();
        let tx_est_size_kb: u64 = 1; // a single-kilobyte ceiling
        if fee > tx_est_size_kb * session.coin.maxfee_kb {
            if !confirmer.confirm_fee(fee) {
                return Err(SigningError::ActionCancelled);
            }
        }

        let total_amount = session.to_spend - session.change_spend.unwrap_or(0);
        if !confirmer.confirm_total(total_amount, fee) {
            return Err(SigningError::ActionCancelled);
        }

        session.checksum_phase1 = Some(session.checksum.finalize());
        // `on_request_input4` reseeds `checksum` itself at the start of every pass (`idx2 == 0`,
        // including this first one), so no reset is needed here.

        session.idx1 = 0;
        session.idx2 = 0;
        session.sign_tx_ctx = Some(TxHasher::new(
            session.version,
            session.inputs_count as u64,
            session.outputs_count as u64,
        ));
        session.stage = Stage::RequestInput4;
        Ok(TxRequest::input(0))
    }

    /// Stage 4 (inputs): rebuild the sighash preimage's input vector for the input currently
    /// being signed (`idx1`), substituting its prevout script at `idx2 == idx1` and an empty
    /// script everywhere else. Every pass re-sends the host's full declared shape, so the
    /// checksum is reseeded at the start of each pass (`idx2 == 0`) and fed on every pass, not
    /// just the first.
    fn on_request_input4(session: &mut Session<R, S>, ack: TxAck) -> SigningResult<TxRequest> {
        let input = Self::expect_input(ack)?;

        if session.idx2 == 0 {
            session.checksum = TxChecksum::new(
                session.inputs_count,
                session.outputs_count,
                session.version,
                session.lock_time,
            );
        }
        session.checksum.update_input(&input);

        let script_sig = if session.idx2 == session.idx1 {
            let pubkey = session.signer.derive_pubkey(
                &session.root.derive_private_key(&input.address_n)?,
            )?;
            let script = signer::prevout_script(&input, &pubkey)?;
            ScriptSig::new(script.items().to_vec())
        } else {
            ScriptSig::null()
        };

        let txin = TxIn::new(input.outpoint(), script_sig, input.sequence);
        session
            .sign_tx_ctx
            .as_mut()
            .expect("seeded at end of Stage 3")
            .serialize_input(&txin);

        if session.idx2 == session.idx1 {
            session.current_input = Some(input);
        }

        session.idx2 += 1;
        if session.idx2 < session.inputs_count {
            Ok(TxRequest::input(session.idx2))
        } else {
            session.idx2 = 0;
            session.stage = Stage::RequestOutput4;
            Ok(TxRequest::output(0))
        }
    }

    /// Stage 4 (outputs): rebuild the sighash preimage's output vector. On the last output of
    /// *every* pass, finalizes the Phase 2 checksum and compares it against Phase 1 -- each pass
    /// is an independent full re-send of the host's declared shape, so every one of them must
    /// agree, not just the first. On the last output of every pass, also finalizes and signs the
    /// sighash for input `idx1`, then emits the finished input as the next chunk.
    fn on_request_output4(session: &mut Session<R, S>, ack: TxAck) -> SigningResult<TxRequest> {
        let output = Self::expect_output(ack)?;
        let is_change = session.change_index == Some(session.idx2);
        let compiled = compile_output(session, &output, is_change)?;

        session.checksum.update_output(&compiled);

        session
            .sign_tx_ctx
            .as_mut()
            .expect("seeded at end of Stage 3")
            .serialize_output(&compiled);

        session.idx2 += 1;
        if session.idx2 < session.outputs_count {
            return Ok(TxRequest::output(session.idx2));
        }

        let checksum_phase2 = session.checksum.finalize();
        let checksum_phase1 = session
            .checksum_phase1
            .expect("finalized at end of Stage 3");
        if checksum_phase2 != checksum_phase1 {
            return Err(SigningError::Other(OtherError::ChecksumMismatch));
        }

        let input = session
            .current_input
            .clone()
            .expect("latched when idx2 == idx1 in Stage 4 inputs");

        let hasher = session
            .sign_tx_ctx
            .take()
            .expect("seeded at end of Stage 3");
        let mut footer = hasher;
        footer.add_u32_le(session.lock_time);
        footer.add_u32_le(1); // SIGHASH_ALL
        let digest = footer.finalize(true);

        let privkey = session.root.derive_private_key(&input.address_n)?;
        let pubkey = session.signer.derive_pubkey(&privkey)?;
        let signature = session.signer.sign_digest(&privkey, digest)?;
        let final_script_sig = signer::finalize_script_sig(&input, signature.as_bytes(), &pubkey)?;
        let final_input = TxIn::new(input.outpoint(), final_script_sig, input.sequence);

        let chunk = session.out_tx_ctx.serialize_input(&final_input);
        session.signatures_emitted += 1;
        session.chunks_emitted += 1;

        let signature_index = session.idx1;
        session.idx1 += 1;
        session.idx2 = 0;

        if session.idx1 < session.inputs_count {
            session.sign_tx_ctx = Some(TxHasher::new(
                session.version,
                session.inputs_count as u64,
                session.outputs_count as u64,
            ));
            session.stage = Stage::RequestInput4;
            Ok(TxRequest::signed_input(
                0,
                signature_index,
                signature.as_bytes().to_vec(),
                chunk,
            ))
        } else {
            session.stage = Stage::RequestOutput5;
            // The next ack is the first output of Stage 5, not another input -- build the
            // request directly rather than through `TxRequest::signed_input`, which always
            // asks for an input.
            Ok(TxRequest {
                request_type: RequestType::TxOutput,
                details: crate::protocol::RequestDetails {
                    request_index: 0,
                    tx_hash: None,
                },
                serialized: Some(crate::protocol::SerializedChunk {
                    signature_index: Some(signature_index),
                    signature: Some(signature.as_bytes().to_vec()),
                    serialized_tx: chunk,
                }),
            })
        }
    }

    /// Stage 5: re-walk outputs once more (resolving change addresses again) and emit each as a
    /// final serialized chunk. On the last output, emits `TXFINISHED`.
    fn on_request_output5(session: &mut Session<R, S>, ack: TxAck) -> SigningResult<TxRequest> {
        let output = Self::expect_output(ack)?;
        let is_change = session.change_index == Some(session.idx1);
        let compiled = compile_output(session, &output, is_change)?;

        let chunk = session.out_tx_ctx.serialize_output(&compiled);
        session.chunks_emitted += 1;

        session.idx1 += 1;
        if session.idx1 < session.outputs_count {
            Ok(TxRequest::output_chunk(session.idx1, chunk))
        } else {
            let hasher = std::mem::replace(
                &mut session.out_tx_ctx,
                TxBuilder::new(session.version, 0, 0),
            );
            let footer = hasher.finalize(session.lock_time);
            let mut combined = chunk;
            combined.extend(footer);
            session.stage = Stage::Finished;
            log::debug!(
                "signing session complete: {} signatures, {} chunks emitted",
                session.signatures_emitted,
                session.chunks_emitted
            );
            Ok(TxRequest {
                request_type: RequestType::TxFinished,
                details: Default::default(),
                serialized: Some(crate::protocol::SerializedChunk {
                    signature_index: None,
                    signature: None,
                    serialized_tx: combined,
                }),
            })
        }
    }
}

/// Turns a `TxOutputType` into its compiled wire form, resolving a change output's address from
/// its own derivation path (external collaborator: `DerivesPrivateKey`/`Secp256k1Signer`) rather
/// than trusting whatever `address` string the host supplied.
fn compile_output<R: DerivesPrivateKey, S: Secp256k1Signer>(
    session: &Session<R, S>,
    output: &TxOutputType,
    is_change: bool,
) -> SigningResult<TxOut> {
    match output.script_type {
        OutputScriptType::PayToMultisig => {
            let multisig = output
                .multisig
                .as_ref()
                .ok_or(SigningError::Other(OtherError::MissingMultisigInfo))?;
            let redeem = signer::redeem_script(multisig);
            let hash160 = txcore::hashes::hash160(&redeem);
            Ok(TxOut::new(output.amount, txbitcoin::ScriptPubkey::p2sh(&hash160)))
        }
        OutputScriptType::PayToAddress => {
            if is_change {
                let privkey = session.root.derive_private_key(&output.address_n)?;
                let pubkey = session.signer.derive_pubkey(&privkey)?;
                let hash160 = txcore::hashes::hash160(pubkey.as_bytes());
                Ok(TxOut::new(output.amount, txbitcoin::ScriptPubkey::p2pkh(&hash160)))
            } else {
                let address = output.address.as_ref().ok_or_else(|| {
                    SigningError::Other(OtherError::CompileOutputFailed(
                        "output has no address and is not a recognized change output".into(),
                    ))
                })?;
                let hash160 = decode_base58check_payload(address, session.coin.address_version)
                    .map_err(|e| SigningError::Other(OtherError::CompileOutputFailed(e)))?;
                Ok(TxOut::new(output.amount, txbitcoin::ScriptPubkey::p2pkh(&hash160)))
            }
        }
    }
}

/// Minimal base58check decoding sufficient to recover a P2PKH address's 20-byte hash. Address
/// *formatting* is an external collaborator; this is just enough to validate/compile an
/// externally-supplied destination, not a general-purpose encoder.
fn decode_base58check_payload(address: &str, expected_version: u8) -> Result<[u8; 20], String> {
    let decoded = decode_base58_full(address)?;
    if decoded.len() != 21 {
        return Err(format!("unexpected address payload length {}", decoded.len()));
    }
    if decoded[0] != expected_version {
        return Err(format!(
            "address version byte {:#x} does not match coin's {:#x}",
            decoded[0], expected_version
        ));
    }
    let mut hash160 = [0u8; 20];
    hash160.copy_from_slice(&decoded[1..]);
    Ok(hash160)
}

const BASE58_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Decodes a base58check string into its raw payload (version byte + hash), verifying the
/// trailing 4-byte checksum. Address *encoding* is an external collaborator per the scope notes;
/// this is just enough to validate a host-supplied destination string.
fn decode_base58_full(s: &str) -> Result<Vec<u8>, String> {
    let mut bytes: Vec<u8> = vec![0];
    for c in s.chars() {
        let digit = BASE58_ALPHABET
            .iter()
            .position(|&b| b as char == c)
            .ok_or_else(|| format!("invalid base58 character {:?}", c))? as u32;
        let mut carry = digit;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    for c in s.chars() {
        if c == '1' {
            bytes.push(0);
        } else {
            break;
        }
    }
    bytes.reverse();
    if bytes.len() < 4 {
        return Err("base58check payload too short".into());
    }
    let (payload, checksum) = bytes.split_at(bytes.len() - 4);
    let expected = txcore::hashes::sha256(&txcore::hashes::sha256(payload));
    if &expected[..4] != checksum {
        return Err("base58check checksum mismatch".into());
    }
    Ok(payload.to_vec())
}

