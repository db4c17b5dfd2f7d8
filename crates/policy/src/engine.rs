//! Flight registration, insurance purchase and payout crediting

use surety_core::{Amount, FlightKey, FlightStatus, PolicyConfig, Principal, SuretyEvent};
use surety_ledger::{authorize, Capability, Flight, LedgerError, LedgerStore};

use crate::error::PolicyError;

/// Result of a successful insurance purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub flight: FlightKey,
    pub passenger: Principal,
    /// Cumulative premium on the policy after this purchase
    pub total_premium: Amount,
    /// Airline pool after the premium was added
    pub airline_funds: Amount,
}

/// What a status decision credited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayoutSummary {
    pub policies_credited: usize,
    pub total_credited: Amount,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    config: PolicyConfig,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Payout owed for `premium` (premium x numerator / denominator, rounded down)
    pub fn payout_for(&self, premium: Amount) -> Result<Amount, PolicyError> {
        premium
            .mul_ratio_floor(self.config.payout_numerator, self.config.payout_denominator)
            .ok_or(PolicyError::PayoutOverflow(premium))
    }

    /// Register a flight operated by `airline`.
    ///
    /// Returns `false` if the flight already existed (no-op).
    pub fn register_flight<S: LedgerStore>(
        &self,
        store: &mut S,
        airline: &Principal,
        designator: &str,
        timestamp: u64,
        sender: &Principal,
    ) -> Result<bool, PolicyError> {
        authorize(store, sender, Capability::FlightOperator(airline.clone()))
            .map_err(PolicyError::Unauthorized)?;

        let key = FlightKey::new(airline.clone(), designator, timestamp);
        if store.flight(&key).is_some() {
            tracing::debug!(flight = %key, "Flight already registered");
            return Ok(false);
        }

        store.insert_flight(Flight::scheduled(key.clone()))?;
        store.emit(SuretyEvent::FlightRegistered { flight: key.clone() });
        tracing::info!(flight = %key, "Flight registered");

        Ok(true)
    }

    /// Buy (or top up) insurance on `flight` for `sender`
    pub fn buy_insurance<S: LedgerStore>(
        &self,
        store: &mut S,
        flight: &FlightKey,
        sender: &Principal,
        premium: Amount,
    ) -> Result<PurchaseReceipt, PolicyError> {
        authorize(store, sender, Capability::Purchaser).map_err(PolicyError::InvalidBuyer)?;

        if premium.is_zero() {
            return Err(PolicyError::ZeroPremium);
        }

        if store.airline(&flight.airline).is_none() {
            return Err(LedgerError::AirlineNotFound(flight.airline.clone()).into());
        }

        if let Some(existing) = store.flight(flight) {
            if existing.status.is_final() {
                return Err(PolicyError::FlightFinalized {
                    flight: flight.clone(),
                    status: existing.status,
                });
            }
        }

        let already_paid = store
            .policy(flight, sender)
            .map(|p| p.premium_paid)
            .unwrap_or(Amount::ZERO);
        let exceeded = || PolicyError::PremiumExceeded {
            requested: premium,
            already_paid,
            maximum: self.config.max_premium,
        };
        let total_premium = already_paid.checked_add(&premium).ok_or_else(exceeded)?;
        if total_premium > self.config.max_premium {
            return Err(exceeded());
        }

        let airline = store
            .airline_mut(&flight.airline)
            .ok_or_else(|| LedgerError::AirlineNotFound(flight.airline.clone()))?;
        let airline_funds = airline
            .funds_contributed
            .checked_add(&premium)
            .ok_or_else(|| LedgerError::Overflow {
                account: flight.airline.to_string(),
            })?;
        airline.funds_contributed = airline_funds;

        store.policy_entry(flight, sender).premium_paid = total_premium;

        store.emit(SuretyEvent::InsurancePurchased {
            flight: flight.clone(),
            passenger: sender.clone(),
            premium,
            total_premium,
        });
        tracing::info!(flight = %flight, passenger = %sender, %premium, %total_premium, "Insurance purchased");

        Ok(PurchaseReceipt {
            flight: flight.clone(),
            passenger: sender.clone(),
            total_premium,
            airline_funds,
        })
    }

    /// Credit every open policy on `flight` if `status` is insurable.
    ///
    /// Called by the oracle coordinator once a status is finalized. Each
    /// policy is credited at most once.
    pub fn credit_payout<S: LedgerStore>(
        &self,
        store: &mut S,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<PayoutSummary, PolicyError> {
        if !status.is_insurable() {
            tracing::debug!(flight = %flight, %status, "Status not insurable, no payout");
            return Ok(PayoutSummary::default());
        }

        let mut owed = Vec::new();
        for policy in store.flight_policies_mut(flight) {
            if policy.payout_credited {
                continue;
            }
            let payout = self.payout_for(policy.premium_paid)?;
            policy.payout_credited = true;
            owed.push((policy.passenger.clone(), payout));
        }

        let mut summary = PayoutSummary::default();
        for (passenger, amount) in owed {
            store.credit_balance(&passenger, amount)?;
            summary.policies_credited += 1;
            summary.total_credited = summary
                .total_credited
                .checked_add(&amount)
                .ok_or(PolicyError::PayoutOverflow(amount))?;
            store.emit(SuretyEvent::PayoutCredited {
                flight: flight.clone(),
                passenger,
                amount,
            });
        }

        tracing::info!(
            flight = %flight,
            policies = summary.policies_credited,
            total = %summary.total_credited,
            "Payouts credited"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use surety_ledger::{AccessDenied, InMemoryLedger};

    fn p(id: &str) -> Principal {
        Principal::from(id)
    }

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    fn flight() -> FlightKey {
        FlightKey::new(p("A1"), "ND1309", 1624103191959)
    }

    fn setup() -> (PolicyEngine, InMemoryLedger) {
        let mut ledger = InMemoryLedger::with_genesis_airline(p("OWNER"), p("A1"), "Airline 1");
        ledger.airline_mut(&p("A1")).unwrap().active = true;
        (PolicyEngine::default(), ledger)
    }

    #[test]
    fn test_register_flight() {
        let (engine, mut ledger) = setup();
        let created = engine
            .register_flight(&mut ledger, &p("A1"), "ND1309", 1624103191959, &p("A1"))
            .unwrap();

        assert!(created);
        assert!(ledger.is_flight_registered(&flight()));
        assert_eq!(ledger.flight(&flight()).unwrap().status, FlightStatus::Unknown);
    }

    #[test]
    fn test_register_flight_is_idempotent() {
        let (engine, mut ledger) = setup();
        engine
            .register_flight(&mut ledger, &p("A1"), "ND1309", 1624103191959, &p("A1"))
            .unwrap();
        let created = engine
            .register_flight(&mut ledger, &p("A1"), "ND1309", 1624103191959, &p("A1"))
            .unwrap();
        assert!(!created);
        assert_eq!(ledger.drain_events().len(), 1);
    }

    #[test]
    fn test_register_flight_for_other_airline_rejected() {
        let (engine, mut ledger) = setup();
        let result = engine.register_flight(&mut ledger, &p("A1"), "ND1309", 1, &p("P7"));
        assert!(matches!(
            result,
            Err(PolicyError::Unauthorized(AccessDenied::NotFlightOperator { .. }))
        ));
    }

    #[test]
    fn test_inactive_airline_cannot_register_flight() {
        let (engine, mut ledger) = setup();
        ledger.airline_mut(&p("A1")).unwrap().active = false;
        let result = engine.register_flight(&mut ledger, &p("A1"), "ND1309", 1, &p("A1"));
        assert!(matches!(
            result,
            Err(PolicyError::Unauthorized(AccessDenied::AirlineInactive(_)))
        ));
        assert!(!ledger.is_flight_registered(&FlightKey::new(p("A1"), "ND1309", 1)));
    }

    #[test]
    fn test_airline_cannot_buy_insurance() {
        let (engine, mut ledger) = setup();
        let result = engine.buy_insurance(&mut ledger, &flight(), &p("A1"), amount(dec!(1)));
        assert!(matches!(result, Err(PolicyError::InvalidBuyer(_))));
        assert_eq!(ledger.get_airline_funds(&p("A1")).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_premium_above_maximum_rejected() {
        let (engine, mut ledger) = setup();
        let result = engine.buy_insurance(&mut ledger, &flight(), &p("P7"), amount(dec!(10)));
        assert!(matches!(result, Err(PolicyError::PremiumExceeded { .. })));
        assert!(ledger.policy(&flight(), &p("P7")).is_none());
    }

    #[test]
    fn test_cumulative_premium_capped() {
        let (engine, mut ledger) = setup();
        engine
            .buy_insurance(&mut ledger, &flight(), &p("P7"), amount(dec!(0.6)))
            .unwrap();
        let result = engine.buy_insurance(&mut ledger, &flight(), &p("P7"), amount(dec!(0.5)));

        assert_eq!(
            result,
            Err(PolicyError::PremiumExceeded {
                requested: amount(dec!(0.5)),
                already_paid: amount(dec!(0.6)),
                maximum: Amount::units(1),
            })
        );

        let receipt = engine
            .buy_insurance(&mut ledger, &flight(), &p("P7"), amount(dec!(0.4)))
            .unwrap();
        assert_eq!(receipt.total_premium, Amount::units(1));
    }

    #[test]
    fn test_zero_premium_rejected() {
        let (engine, mut ledger) = setup();
        let result = engine.buy_insurance(&mut ledger, &flight(), &p("P7"), Amount::ZERO);
        assert_eq!(result, Err(PolicyError::ZeroPremium));
    }

    #[test]
    fn test_premium_capitalizes_airline() {
        let (engine, mut ledger) = setup();
        let receipt = engine
            .buy_insurance(&mut ledger, &flight(), &p("P7"), Amount::units(1))
            .unwrap();

        assert_eq!(receipt.airline_funds, Amount::units(1));
        assert_eq!(ledger.get_airline_funds(&p("A1")).unwrap(), Amount::units(1));
        assert_eq!(
            ledger.policy(&flight(), &p("P7")).unwrap().premium_paid,
            Amount::units(1)
        );
    }

    #[test]
    fn test_airline_funds_equal_sum_of_premiums() {
        let (engine, mut ledger) = setup();
        let other = FlightKey::new(p("A1"), "ND1310", 1);
        let purchases = [
            (flight(), "P1", dec!(0.5)),
            (flight(), "P2", dec!(0.25)),
            (other.clone(), "P1", dec!(1)),
            (flight(), "P1", dec!(0.5)),
        ];

        for (key, passenger, premium) in purchases {
            engine
                .buy_insurance(&mut ledger, &key, &p(passenger), amount(premium))
                .unwrap();
        }

        assert_eq!(ledger.get_airline_funds(&p("A1")).unwrap().value(), dec!(2.25));
    }

    #[test]
    fn test_unknown_airline_rejected() {
        let (engine, mut ledger) = setup();
        let key = FlightKey::new(p("ZZ"), "ZZ1", 1);
        let result = engine.buy_insurance(&mut ledger, &key, &p("P7"), amount(dec!(0.5)));
        assert_eq!(
            result,
            Err(PolicyError::Ledger(LedgerError::AirlineNotFound(p("ZZ"))))
        );
    }

    #[test]
    fn test_finalized_flight_cannot_be_insured() {
        let (engine, mut ledger) = setup();
        engine
            .register_flight(&mut ledger, &p("A1"), "ND1309", 1624103191959, &p("A1"))
            .unwrap();
        ledger.flight_mut(&flight()).unwrap().status = FlightStatus::OnTime;

        let result = engine.buy_insurance(&mut ledger, &flight(), &p("P7"), amount(dec!(0.5)));
        assert!(matches!(result, Err(PolicyError::FlightFinalized { .. })));
    }

    #[test]
    fn test_late_airline_credits_one_and_a_half() {
        let (engine, mut ledger) = setup();
        engine
            .buy_insurance(&mut ledger, &flight(), &p("P1"), amount(dec!(0.5)))
            .unwrap();
        engine
            .buy_insurance(&mut ledger, &flight(), &p("P2"), amount(dec!(1)))
            .unwrap();

        let summary = engine
            .credit_payout(&mut ledger, &flight(), FlightStatus::LateAirline)
            .unwrap();

        assert_eq!(summary.policies_credited, 2);
        assert_eq!(summary.total_credited.value(), dec!(2.25));
        assert_eq!(ledger.get_balance(&p("P1")).value(), dec!(0.75));
        assert_eq!(ledger.get_balance(&p("P2")).value(), dec!(1.5));
        assert!(ledger.policy(&flight(), &p("P1")).unwrap().payout_credited);
    }

    #[test]
    fn test_payout_credited_once() {
        let (engine, mut ledger) = setup();
        engine
            .buy_insurance(&mut ledger, &flight(), &p("P1"), amount(dec!(0.5)))
            .unwrap();

        engine
            .credit_payout(&mut ledger, &flight(), FlightStatus::LateAirline)
            .unwrap();
        let again = engine
            .credit_payout(&mut ledger, &flight(), FlightStatus::LateAirline)
            .unwrap();

        assert_eq!(again, PayoutSummary::default());
        assert_eq!(ledger.get_balance(&p("P1")).value(), dec!(0.75));
    }

    #[test]
    fn test_other_statuses_pay_nothing() {
        let (engine, mut ledger) = setup();
        engine
            .buy_insurance(&mut ledger, &flight(), &p("P1"), amount(dec!(0.5)))
            .unwrap();

        for status in [
            FlightStatus::OnTime,
            FlightStatus::LateWeather,
            FlightStatus::LateTechnical,
            FlightStatus::LateOther,
        ] {
            let summary = engine.credit_payout(&mut ledger, &flight(), status).unwrap();
            assert_eq!(summary.policies_credited, 0);
        }

        assert_eq!(ledger.get_balance(&p("P1")), Amount::ZERO);
        assert!(!ledger.policy(&flight(), &p("P1")).unwrap().payout_credited);
    }
}
