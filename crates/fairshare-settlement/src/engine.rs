//! Sale engine — sequences every externally-triggered operation.
//!
//! Each public method is one serializable unit of work: it takes `&mut
//! self`, so no two operations can interleave their read-modify-write of
//! the ledger or a participant record, and any external transfer runs only
//! after the operation's bookkeeping mutation is applied. Nothing here
//! blocks or suspends; the only waiting in the system is wall-clock time
//! crossing phase boundaries.
//!
//! Every method takes an explicit `now`. The engine keeps a high-water
//! mark over observed instants, so a caller with a skewed clock can never
//! move the phase backward.

use chrono::{DateTime, Utc};
use tracing::info;

use fairshare_ledger::{AllowlistGate, CommitmentLedger, MerkleProver};
use fairshare_types::{
    AccountId, AuthorityCapability, CurrencyAmount, FairshareError, MembershipProver,
    PhaseClock, PhaseWindows, Result, SaleConfig, SaleEvent, SaleMode, SalePhase, SaleState,
    TransferCapability,
};

use crate::calculator::{Settlement, SettlementCalculator};
use crate::claim::ClaimProcessor;
use crate::conservation::ConservationTracker;
use crate::sweep::{SweepFinalizer, SweepOutcome};

/// The allocation-and-settlement engine for one sale.
pub struct SaleEngine<T, A, P = MerkleProver>
where
    T: TransferCapability,
    A: AuthorityCapability,
    P: MembershipProver,
{
    config: SaleConfig,
    calculator: SettlementCalculator,
    sweeper: SweepFinalizer,
    ledger: CommitmentLedger,
    gate: Option<AllowlistGate<P>>,
    transfer: T,
    authority: A,
    clock: Option<PhaseClock>,
    started: bool,
    finalized: bool,
    tracker: ConservationTracker,
    events: Vec<SaleEvent>,
    high_water: Option<DateTime<Utc>>,
}

impl<T, A> SaleEngine<T, A, MerkleProver>
where
    T: TransferCapability,
    A: AuthorityCapability,
{
    /// Build an engine from validated config. Gated sales get a Merkle
    /// membership prover against the configured allowlist root.
    ///
    /// # Errors
    /// [`FairshareError::InvalidConfig`] if the config invariants fail.
    pub fn new(config: SaleConfig, transfer: T, authority: A) -> Result<Self> {
        let gate = match config.mode {
            SaleMode::Gated { allowlist_root } => {
                Some(AllowlistGate::new(MerkleProver::new(allowlist_root)))
            }
            SaleMode::Open => None,
        };
        Self::build(config, transfer, authority, gate)
    }
}

impl<T, A, P> SaleEngine<T, A, P>
where
    T: TransferCapability,
    A: AuthorityCapability,
    P: MembershipProver,
{
    /// Build a gated engine with a caller-supplied membership prover.
    ///
    /// # Errors
    /// [`FairshareError::InvalidConfig`] if the config invariants fail or
    /// the sale is not gated.
    pub fn with_prover(config: SaleConfig, transfer: T, authority: A, prover: P) -> Result<Self> {
        if !config.mode.is_gated() {
            return Err(FairshareError::InvalidConfig {
                reason: "membership prover supplied for an open sale".to_string(),
            });
        }
        Self::build(config, transfer, authority, Some(AllowlistGate::new(prover)))
    }

    fn build(
        config: SaleConfig,
        transfer: T,
        authority: A,
        gate: Option<AllowlistGate<P>>,
    ) -> Result<Self> {
        config.validate()?;
        let calculator = SettlementCalculator::from_config(&config);
        let sweeper = SweepFinalizer::from_config(&config);
        let ledger = CommitmentLedger::new(config.min_pledge, config.max_pledge);
        Ok(Self {
            config,
            calculator,
            sweeper,
            ledger,
            gate,
            transfer,
            authority,
            clock: None,
            started: false,
            finalized: false,
            tracker: ConservationTracker::new(),
            events: Vec::new(),
            high_water: None,
        })
    }

    // =====================================================================
    // Authority-gated lifecycle
    // =====================================================================

    /// Set the phase windows. Authority-only, once, before the sale opens.
    ///
    /// # Errors
    /// - [`FairshareError::NotAuthorized`]
    /// - [`FairshareError::WindowsAlreadySet`]
    /// - [`FairshareError::AlreadyStarted`]
    /// - [`FairshareError::InvalidConfig`] for non-increasing or
    ///   mode-mismatched boundaries
    pub fn set_windows(&mut self, caller: AccountId, windows: PhaseWindows) -> Result<()> {
        self.require_authority(caller)?;
        if self.started {
            return Err(FairshareError::AlreadyStarted);
        }
        if self.clock.is_some() {
            return Err(FairshareError::WindowsAlreadySet);
        }
        windows.validate(&self.config.mode)?;
        self.clock = Some(PhaseClock::new(windows));
        info!(sale = %self.config.sale_id, "phase windows set");
        Ok(())
    }

    /// Open the sale: pull the full asset pool into custody and set
    /// `started`. Authority-only, single-shot.
    ///
    /// The pull runs before the flag flips — a failed collection rejects
    /// the whole operation and leaves the sale unopened.
    ///
    /// # Errors
    /// - [`FairshareError::NotAuthorized`]
    /// - [`FairshareError::AlreadyStarted`]
    /// - [`FairshareError::InvalidConfig`] if the windows are not set yet
    /// - [`FairshareError::TransferFailed`]
    pub fn open(&mut self, caller: AccountId, now: DateTime<Utc>) -> Result<()> {
        self.require_authority(caller)?;
        if self.started {
            return Err(FairshareError::AlreadyStarted);
        }
        if self.clock.is_none() {
            return Err(FairshareError::InvalidConfig {
                reason: "phase windows must be set before opening".to_string(),
            });
        }
        self.observe(now);

        self.transfer
            .collect_asset(self.config.issuer, self.config.asset_pool)?;
        self.started = true;
        self.tracker.record_asset_in(self.config.asset_pool);

        info!(sale = %self.config.sale_id, asset_pool = self.config.asset_pool, "sale opened");
        self.emit(SaleEvent::SaleOpened {
            sale_id: self.config.sale_id,
            asset_pool: self.config.asset_pool,
        });
        Ok(())
    }

    /// Final issuer-side settlement. Authority-only, single-shot, legal
    /// only once every participant window has closed.
    ///
    /// `finalized` is set **before** the sweep transfers run and is not
    /// rolled back if one fails.
    ///
    /// # Errors
    /// - [`FairshareError::NotAuthorized`]
    /// - [`FairshareError::NotStarted`] / [`FairshareError::AlreadyFinalized`]
    /// - [`FairshareError::WrongPhase`] before the windows close
    /// - [`FairshareError::TransferFailed`]
    pub fn finalize(&mut self, caller: AccountId, now: DateTime<Utc>) -> Result<SweepOutcome> {
        self.require_authority(caller)?;
        if !self.started {
            return Err(FairshareError::NotStarted);
        }
        if self.finalized {
            return Err(FairshareError::AlreadyFinalized);
        }
        let phase = self.phase_now(now);
        if phase != SalePhase::Closed {
            return Err(FairshareError::WrongPhase {
                expected: SalePhase::Closed,
                actual: phase,
            });
        }

        // Mark before transferring.
        self.finalized = true;

        let total = self.ledger.total_pledged();
        let outcome =
            self.sweeper
                .finalize(total, self.tracker.held_currency(), &mut self.transfer)?;

        self.tracker.record_currency_out(outcome.currency_swept);
        self.tracker
            .record_asset_out(outcome.asset_burned + outcome.asset_returned);

        self.emit(SaleEvent::SaleFinalized {
            currency_swept: outcome.currency_swept,
            asset_burned: outcome.asset_burned,
        });
        Ok(outcome)
    }

    // =====================================================================
    // Participant operations
    // =====================================================================

    /// Record a pledge. Requires the sale to be open, the clock in the
    /// pledging phase, and — for gated sales — a valid membership proof.
    ///
    /// Order of effects: bounds precheck, currency collection, ledger
    /// record. A rejection at any precheck leaves both the ledger and the
    /// participant's funds untouched.
    ///
    /// Returns the participant's new cumulative pledge.
    ///
    /// # Errors
    /// - [`FairshareError::NotStarted`] / [`FairshareError::WrongPhase`]
    /// - [`FairshareError::NotAuthorized`] on a failed or missing proof
    /// - [`FairshareError::PledgeOutOfRange`]
    /// - [`FairshareError::TransferFailed`] if the collection fails
    pub fn record_pledge(
        &mut self,
        participant: AccountId,
        amount: CurrencyAmount,
        proof: Option<&[u8]>,
        now: DateTime<Utc>,
    ) -> Result<CurrencyAmount> {
        if !self.started {
            return Err(FairshareError::NotStarted);
        }
        let phase = self.phase_now(now);
        if phase != SalePhase::Pledging {
            return Err(FairshareError::WrongPhase {
                expected: SalePhase::Pledging,
                actual: phase,
            });
        }
        if let Some(gate) = &self.gate {
            gate.authorize(participant, proof.unwrap_or(&[]))?;
        }

        self.ledger.would_accept(&participant, amount)?;
        self.transfer.collect_currency(participant, amount)?;
        let cumulative = self.ledger.record_pledge(participant, amount)?;
        self.tracker.record_currency_in(amount);

        self.emit(SaleEvent::PledgeRecorded {
            participant,
            amount,
        });
        Ok(cumulative)
    }

    /// Claim a participant's settlement against the final total.
    ///
    /// # Errors
    /// See [`ClaimProcessor::claim`]; additionally
    /// [`FairshareError::NotStarted`] and [`FairshareError::WrongPhase`]
    /// before the claim window opens.
    pub fn claim(&mut self, participant: AccountId, now: DateTime<Utc>) -> Result<Settlement> {
        if !self.started {
            return Err(FairshareError::NotStarted);
        }
        let phase = self.phase_now(now);
        if phase < SalePhase::Claiming {
            return Err(FairshareError::WrongPhase {
                expected: SalePhase::Claiming,
                actual: phase,
            });
        }

        let total = self.ledger.total_pledged();
        let gated = self.config.mode.is_gated();
        let record = self
            .ledger
            .record_mut(&participant)
            .ok_or(FairshareError::NoCommitment(participant))?;

        let paid = ClaimProcessor::new(&self.calculator, &mut self.transfer, gated)
            .claim(participant, record, total)?;

        self.tracker.record_currency_out(paid.refund);
        self.tracker.record_asset_out(paid.asset);
        if paid.asset > 0 {
            self.emit(SaleEvent::AssetClaimed {
                participant,
                amount: paid.asset,
            });
        }
        if paid.refund > 0 {
            self.emit(SaleEvent::CurrencyRefunded {
                participant,
                amount: paid.refund,
            });
        }
        Ok(paid)
    }

    /// Claim the overflow refund (gated sales). Returns the refunded
    /// amount.
    ///
    /// # Errors
    /// See [`ClaimProcessor::overflow_refund`]; additionally
    /// [`FairshareError::NotStarted`] and [`FairshareError::WrongPhase`]
    /// before the refund window opens (open-mode sales never reach that
    /// phase, so the call always rejects there).
    pub fn overflow_refund(
        &mut self,
        participant: AccountId,
        now: DateTime<Utc>,
    ) -> Result<CurrencyAmount> {
        if !self.started {
            return Err(FairshareError::NotStarted);
        }
        let phase = self.phase_now(now);
        if !self.config.mode.is_gated() || phase < SalePhase::OverflowRefunding {
            return Err(FairshareError::WrongPhase {
                expected: SalePhase::OverflowRefunding,
                actual: phase,
            });
        }

        let total = self.ledger.total_pledged();
        let record = self
            .ledger
            .record_mut(&participant)
            .ok_or(FairshareError::NoCommitment(participant))?;

        let refund = ClaimProcessor::new(&self.calculator, &mut self.transfer, true)
            .overflow_refund(participant, record, total)?;

        self.tracker.record_currency_out(refund);
        if refund > 0 {
            self.emit(SaleEvent::CurrencyRefunded {
                participant,
                amount: refund,
            });
        }
        Ok(refund)
    }

    // =====================================================================
    // Read-only queries
    // =====================================================================

    /// What `claim`/`overflow_refund` would compute against the *current*
    /// total. Pure; callable at any time; provisional until pledging
    /// closes.
    #[must_use]
    pub fn simulate_settlement(&self, participant: &AccountId) -> Settlement {
        let pledged = self
            .ledger
            .record(participant)
            .map_or(0, fairshare_ledger::PledgeRecord::pledged);
        self.calculator.settle(pledged, self.ledger.total_pledged())
    }

    /// The phase at `now`, through the monotonic high-water mark.
    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> SalePhase {
        self.clock
            .as_ref()
            .map_or(SalePhase::NotOpened, |clock| {
                clock.phase_at(self.effective(now))
            })
    }

    /// Snapshot of the lifecycle flags and running total.
    #[must_use]
    pub fn state(&self) -> SaleState {
        SaleState {
            started: self.started,
            finalized: self.finalized,
            total_pledged: self.ledger.total_pledged(),
        }
    }

    #[must_use]
    pub fn total_pledged(&self) -> CurrencyAmount {
        self.ledger.total_pledged()
    }

    #[must_use]
    pub fn config(&self) -> &SaleConfig {
        &self.config
    }

    /// The transfer capability, for balance inspection.
    #[must_use]
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }

    /// Events emitted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[SaleEvent] {
        &self.events
    }

    /// Drain the event journal (for an indexer that has consumed it).
    pub fn drain_events(&mut self) -> Vec<SaleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Re-derive the global conservation invariants from the ledger and
    /// the custody tracker.
    ///
    /// # Errors
    /// [`FairshareError::ConservationViolation`] or
    /// [`FairshareError::Internal`] describing the imbalance.
    pub fn verify_conservation(&self) -> Result<()> {
        self.ledger.check_total()?;
        self.tracker.verify_currency(self.ledger.total_pledged())?;
        if self.started {
            self.tracker.verify_asset(self.config.asset_pool)?;
        }
        Ok(())
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn require_authority(&self, caller: AccountId) -> Result<()> {
        if self.authority.authorize(&caller) {
            Ok(())
        } else {
            Err(FairshareError::NotAuthorized(caller))
        }
    }

    /// Effective instant: observed time never moves backward.
    fn effective(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.high_water.map_or(now, |hw| hw.max(now))
    }

    fn observe(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let effective = self.effective(now);
        self.high_water = Some(effective);
        effective
    }

    fn phase_now(&mut self, now: DateTime<Utc>) -> SalePhase {
        let effective = self.observe(now);
        self.clock
            .as_ref()
            .map_or(SalePhase::NotOpened, |clock| clock.phase_at(effective))
    }

    fn emit(&mut self, event: SaleEvent) {
        self.events.push(event);
    }
}
