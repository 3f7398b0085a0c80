//! Property tests for the token ledger.
//!
//! - Supply conservation: Σ(balances) == total_supply after any call sequence
//! - Pause: no transfer succeeds while paused
//! - Idempotency: repeated grant/revoke leaves one membership state
//! - Round trip: mint then burn restores the previous supply and balance

use flewpay_ledger::TokenLedger;
use flewpay_types::{AccountId, FlewpayError, LedgerConfig, Role, TokenAmount};
use proptest::prelude::*;

const HOLDERS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Mint { to: usize, units: u64 },
    Burn { from: usize, units: u64 },
    Transfer { from: usize, to: usize, units: u64 },
    Approve { owner: usize, spender: usize, units: u64 },
    TransferFrom { spender: usize, from: usize, to: usize, units: u64 },
    Pause,
    Unpause,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let idx = 0..HOLDERS;
    let units = 0u64..1_000;
    prop_oneof![
        (idx.clone(), 1u64..1_000).prop_map(|(to, units)| Op::Mint { to, units }),
        (idx.clone(), units.clone()).prop_map(|(from, units)| Op::Burn { from, units }),
        (idx.clone(), idx.clone(), units.clone())
            .prop_map(|(from, to, units)| Op::Transfer { from, to, units }),
        (idx.clone(), idx.clone(), units.clone())
            .prop_map(|(owner, spender, units)| Op::Approve { owner, spender, units }),
        (idx.clone(), idx.clone(), idx, units).prop_map(|(spender, from, to, units)| {
            Op::TransferFrom {
                spender,
                from,
                to,
                units,
            }
        }),
        Just(Op::Pause),
        Just(Op::Unpause),
    ]
}

struct Fixture {
    ledger: TokenLedger,
    owner: AccountId,
    holders: Vec<AccountId>,
}

impl Fixture {
    fn new() -> Self {
        let owner = AccountId([0xD0; 20]);
        let holders = (1..=HOLDERS as u8).map(|b| AccountId([b; 20])).collect();
        let ledger = TokenLedger::new(AccountId([0xEE; 20]), owner, LedgerConfig::default())
            .expect("ledger deploys");
        Self {
            ledger,
            owner,
            holders,
        }
    }

    fn apply(&mut self, op: &Op) -> Result<(), FlewpayError> {
        let amt = |units: u64| TokenAmount::tokens(units);
        let h = &self.holders;
        match *op {
            Op::Mint { to, units } => self.ledger.mint(self.owner, h[to], amt(units)),
            Op::Burn { from, units } => self.ledger.burn(h[from], amt(units)),
            Op::Transfer { from, to, units } => self.ledger.transfer(h[from], h[to], amt(units)),
            Op::Approve {
                owner,
                spender,
                units,
            } => self.ledger.approve(h[owner], h[spender], amt(units)),
            Op::TransferFrom {
                spender,
                from,
                to,
                units,
            } => self
                .ledger
                .transfer_from(h[spender], h[from], h[to], amt(units)),
            Op::Pause => self.ledger.pause(self.owner),
            Op::Unpause => self.ledger.unpause(self.owner),
        }
    }

    fn balance_sum(&self) -> TokenAmount {
        TokenAmount::checked_sum(self.holders.iter().map(|a| self.ledger.balance_of(*a)))
            .expect("no overflow at test scale")
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: Σ(balances) == total_supply == minted - burned after every call.
    #[test]
    fn prop_supply_conserved(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut fx = Fixture::new();
        for op in &ops {
            let _ = fx.apply(op);
            prop_assert_eq!(fx.balance_sum(), fx.ledger.total_supply());
            prop_assert!(fx.ledger.verify_supply().is_ok());
        }
    }

    /// Property: a failed call leaves balances, supply and log untouched.
    #[test]
    fn prop_failed_calls_change_nothing(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut fx = Fixture::new();
        for op in &ops {
            let balances: Vec<TokenAmount> =
                fx.holders.iter().map(|a| fx.ledger.balance_of(*a)).collect();
            let supply = fx.ledger.total_supply();
            let logged = fx.ledger.events().len();

            if fx.apply(op).is_err() {
                let after: Vec<TokenAmount> =
                    fx.holders.iter().map(|a| fx.ledger.balance_of(*a)).collect();
                prop_assert_eq!(after, balances);
                prop_assert_eq!(fx.ledger.total_supply(), supply);
                prop_assert_eq!(fx.ledger.events().len(), logged);
            }
        }
    }

    /// Property: transfer always fails while paused.
    #[test]
    fn prop_paused_blocks_transfer(
        from in 0..HOLDERS,
        to in 0..HOLDERS,
        units in 1u64..1_000,
    ) {
        prop_assume!(from != to);
        let mut fx = Fixture::new();
        fx.ledger.mint(fx.owner, fx.holders[from], TokenAmount::tokens(units)).unwrap();
        fx.ledger.pause(fx.owner).unwrap();

        let err = fx
            .ledger
            .transfer(fx.holders[from], fx.holders[to], TokenAmount::tokens(units))
            .unwrap_err();
        let is_blocked = matches!(err, FlewpayError::OperationBlocked { .. });
        prop_assert!(is_blocked);
    }

    /// Property: grant twice == grant once; revoke twice == revoke once.
    #[test]
    fn prop_role_changes_idempotent(role_idx in 0..Role::ALL.len(), who in 0..HOLDERS) {
        let role = Role::ALL[role_idx];
        let mut once = Fixture::new();
        let mut twice = Fixture::new();
        let account = once.holders[who];

        once.ledger.grant_role(once.owner, role, account).unwrap();
        twice.ledger.grant_role(twice.owner, role, account).unwrap();
        twice.ledger.grant_role(twice.owner, role, account).unwrap();
        prop_assert_eq!(once.ledger.access().members(role), twice.ledger.access().members(role));

        once.ledger.revoke_role(once.owner, role, account).unwrap();
        twice.ledger.revoke_role(twice.owner, role, account).unwrap();
        twice.ledger.revoke_role(twice.owner, role, account).unwrap();
        prop_assert_eq!(once.ledger.access().members(role), twice.ledger.access().members(role));
        prop_assert!(!twice.ledger.has_role(role, account));
    }

    /// Property: mint(a, x) then burn(x) by a restores supply and balance.
    #[test]
    fn prop_mint_burn_round_trip(seed in 0u64..1_000, units in 1u64..1_000_000) {
        let mut fx = Fixture::new();
        let a = fx.holders[0];
        if seed > 0 {
            fx.ledger.mint(fx.owner, a, TokenAmount::tokens(seed)).unwrap();
        }
        let supply = fx.ledger.total_supply();
        let balance = fx.ledger.balance_of(a);

        fx.ledger.mint(fx.owner, a, TokenAmount::tokens(units)).unwrap();
        fx.ledger.burn(a, TokenAmount::tokens(units)).unwrap();

        prop_assert_eq!(fx.ledger.total_supply(), supply);
        prop_assert_eq!(fx.ledger.balance_of(a), balance);
    }
}
