//! Capability checks
//!
//! Every mutating operation names the capability it needs and asks
//! [`authorize`] for a [`Grant`]. The sender identity itself is trusted;
//! only its relationship to ledger state is checked here.

use surety_core::Principal;
use thiserror::Error;

use crate::store::LedgerStore;

/// What a sender must be allowed to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// The system owner
    Owner,
    /// A registered airline that has paid its participation fee
    ActiveAirline,
    /// The given airline itself, and active
    FlightOperator(Principal),
    /// Anyone who is not a registered airline
    Purchaser,
    /// A registered oracle holding the given index
    OracleIndex(u8),
}

/// Proof that a capability check passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub principal: Principal,
    pub capability: Capability,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("{0} is not the owner")]
    NotOwner(Principal),

    #[error("{0} is not a registered airline")]
    NotAirline(Principal),

    #[error("Airline {0} has not paid its participation fee")]
    AirlineInactive(Principal),

    #[error("{sender} cannot operate flights of {airline}")]
    NotFlightOperator { sender: Principal, airline: Principal },

    #[error("Airline {0} cannot buy insurance")]
    AirlinePurchaser(Principal),

    #[error("{0} is not a registered oracle")]
    NotOracle(Principal),

    #[error("Oracle {oracle} does not hold index {index}")]
    IndexNotAssigned { oracle: Principal, index: u8 },
}

/// Check that `sender` holds `capability` against current ledger state
pub fn authorize<S>(store: &S, sender: &Principal, capability: Capability) -> Result<Grant, AccessDenied>
where
    S: LedgerStore + ?Sized,
{
    match &capability {
        Capability::Owner => {
            if store.owner() != sender {
                return Err(AccessDenied::NotOwner(sender.clone()));
            }
        }
        Capability::ActiveAirline => require_active_airline(store, sender)?,
        Capability::FlightOperator(airline) => {
            if airline != sender {
                return Err(AccessDenied::NotFlightOperator {
                    sender: sender.clone(),
                    airline: airline.clone(),
                });
            }
            require_active_airline(store, sender)?;
        }
        Capability::Purchaser => {
            if store.is_airline(sender) {
                return Err(AccessDenied::AirlinePurchaser(sender.clone()));
            }
        }
        Capability::OracleIndex(index) => match store.oracle(sender) {
            Some(oracle) if oracle.registered => {
                if !oracle.holds_index(*index) {
                    return Err(AccessDenied::IndexNotAssigned {
                        oracle: sender.clone(),
                        index: *index,
                    });
                }
            }
            _ => return Err(AccessDenied::NotOracle(sender.clone())),
        },
    }

    Ok(Grant {
        principal: sender.clone(),
        capability,
    })
}

fn require_active_airline<S>(store: &S, sender: &Principal) -> Result<(), AccessDenied>
where
    S: LedgerStore + ?Sized,
{
    if !store.is_airline(sender) {
        return Err(AccessDenied::NotAirline(sender.clone()));
    }
    if !store.is_airline_active(sender) {
        return Err(AccessDenied::AirlineInactive(sender.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Oracle;
    use crate::InMemoryLedger;
    use surety_core::Amount;

    fn ledger() -> InMemoryLedger {
        let mut ledger =
            InMemoryLedger::with_genesis_airline("OWNER".into(), "A1".into(), "Airline 1");
        ledger
            .insert_oracle(Oracle {
                id: "O1".into(),
                indexes: vec![1, 2, 3],
                registered: true,
                fee_paid: Amount::units(1),
            })
            .unwrap();
        ledger
    }

    #[test]
    fn test_owner_capability() {
        let ledger = ledger();
        assert!(authorize(&ledger, &"OWNER".into(), Capability::Owner).is_ok());
        assert_eq!(
            authorize(&ledger, &"A1".into(), Capability::Owner),
            Err(AccessDenied::NotOwner("A1".into()))
        );
    }

    #[test]
    fn test_inactive_airline_denied() {
        let mut ledger = ledger();
        assert_eq!(
            authorize(&ledger, &"A1".into(), Capability::ActiveAirline),
            Err(AccessDenied::AirlineInactive("A1".into()))
        );

        ledger.airline_mut(&"A1".into()).unwrap().active = true;
        let grant = authorize(&ledger, &"A1".into(), Capability::ActiveAirline).unwrap();
        assert_eq!(grant.principal, Principal::from("A1"));
    }

    #[test]
    fn test_flight_operator_must_be_airline_itself() {
        let mut ledger = ledger();
        ledger.airline_mut(&"A1".into()).unwrap().active = true;

        assert!(authorize(&ledger, &"A1".into(), Capability::FlightOperator("A1".into())).is_ok());
        assert!(matches!(
            authorize(&ledger, &"P1".into(), Capability::FlightOperator("A1".into())),
            Err(AccessDenied::NotFlightOperator { .. })
        ));
    }

    #[test]
    fn test_airline_cannot_purchase() {
        let ledger = ledger();
        assert_eq!(
            authorize(&ledger, &"A1".into(), Capability::Purchaser),
            Err(AccessDenied::AirlinePurchaser("A1".into()))
        );
        assert!(authorize(&ledger, &"P1".into(), Capability::Purchaser).is_ok());
    }

    #[test]
    fn test_oracle_index_capability() {
        let ledger = ledger();
        assert!(authorize(&ledger, &"O1".into(), Capability::OracleIndex(2)).is_ok());
        assert_eq!(
            authorize(&ledger, &"O1".into(), Capability::OracleIndex(7)),
            Err(AccessDenied::IndexNotAssigned {
                oracle: "O1".into(),
                index: 7
            })
        );
        assert_eq!(
            authorize(&ledger, &"O9".into(), Capability::OracleIndex(2)),
            Err(AccessDenied::NotOracle("O9".into()))
        );
    }
}
