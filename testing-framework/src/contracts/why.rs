//! The `Why` contract
//!
//! Three ABI methods:
//! - `randomFail`: stores `block.timestamp`, reverts when it is odd
//! - `worksWell`: increments the counter, never reverts
//! - `inc`: read-only counter accessor

use super::{BlockEnv, ContractCode, ContractStorage, MethodKind, Revert, U256};

/// Artifact name
pub const CONTRACT_NAME: &str = "Why";

/// Nondeterministically reverting mutator
pub const RANDOM_FAIL: &str = "randomFail";
/// Always-succeeding mutator
pub const WORKS_WELL: &str = "worksWell";
/// Counter accessor
pub const INC: &str = "inc";

/// Revert reason of `randomFail`
pub const ODD_TIMESTAMP_REASON: &str = "randomFail: odd block timestamp";

/// Counter slot
pub const SLOT_INC: &str = "inc";
/// Last timestamp written by `randomFail`
pub const SLOT_STAMP: &str = "stamp";

/// Stateless code of the `Why` contract
#[derive(Debug, Clone, Copy, Default)]
pub struct WhyContract;

impl ContractCode for WhyContract {
    fn name(&self) -> &str {
        CONTRACT_NAME
    }

    fn method_kind(&self, method: &str) -> Option<MethodKind> {
        match method {
            RANDOM_FAIL | WORKS_WELL => Some(MethodKind::Mutator),
            INC => Some(MethodKind::View),
            _ => None,
        }
    }

    fn execute(
        &self,
        method: &str,
        storage: &mut ContractStorage,
        env: &BlockEnv,
    ) -> Result<(), Revert> {
        match method {
            RANDOM_FAIL => {
                // Written before the check: a revert must roll this back
                storage.set(SLOT_STAMP, U256::from(env.timestamp));
                if env.timestamp % 2 == 1 {
                    return Err(Revert::new(ODD_TIMESTAMP_REASON));
                }
                Ok(())
            }
            WORKS_WELL => {
                let next = storage
                    .get(SLOT_INC)
                    .checked_add(U256::one())
                    .ok_or_else(|| Revert::new("worksWell: counter overflow"))?;
                storage.set(SLOT_INC, next);
                Ok(())
            }
            other => Err(Revert::new(format!("unknown method {}", other))),
        }
    }

    fn query(&self, method: &str, storage: &ContractStorage) -> Result<U256, Revert> {
        match method {
            INC => Ok(storage.get(SLOT_INC)),
            other => Err(Revert::new(format!("unknown view {}", other))),
        }
    }
}
