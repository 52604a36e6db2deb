use rust_decimal::Decimal;
use thiserror::Error;

use crate::flows::states::{
    CouponAction, CouponEvent, CouponEventKind, CouponPhase, CouponState, TransitionOutcome,
};

/// Coupon-entry widget lifecycle: `Idle -> Validating -> {Applied | Rejected}`.
///
/// Editing the code or changing the party size always drops back to `Idle` and clears
/// any discount. A rejected coupon may be re-submitted directly; that is the only
/// retry path and it is always user-initiated.
#[derive(Clone, Debug, Default)]
pub struct CouponFlow;

impl CouponFlow {
    pub fn new() -> Self {
        Self
    }

    pub fn initial_state(&self) -> CouponState {
        CouponState::Idle
    }

    pub fn apply(
        &self,
        current: &CouponState,
        event: CouponEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_coupon(current, event)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid coupon transition from {state:?} using event {event:?}")]
    InvalidTransition { state: CouponPhase, event: CouponEventKind },
    #[error("discarded coupon result for request {token}; it no longer matches the form")]
    StaleResult { token: u64 },
}

fn transition_coupon(
    current: &CouponState,
    event: CouponEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use CouponAction::{ApplyDiscount, CallOfferService, ClearDiscount, ShowError};

    let from = current.phase();
    let kind = event.kind();

    let (to, actions) = match (current, event) {
        (_, CouponEvent::CodeEdited) | (_, CouponEvent::TravelerCountChanged) => {
            (CouponState::Idle, vec![ClearDiscount])
        }
        (CouponState::Idle, CouponEvent::ApplyRequested(request))
        | (CouponState::Rejected { .. }, CouponEvent::ApplyRequested(request)) => {
            (CouponState::Validating { request }, vec![CallOfferService])
        }
        (CouponState::Validating { request }, CouponEvent::DiscountGranted { token, discount }) => {
            if request.token != token {
                return Err(FlowTransitionError::StaleResult { token });
            }
            let discount = discount.max(Decimal::ZERO).min(request.subtotal.max(Decimal::ZERO));
            (
                CouponState::Applied {
                    code: request.code.clone(),
                    discount,
                    subtotal: request.subtotal,
                },
                vec![ApplyDiscount],
            )
        }
        (CouponState::Validating { request }, CouponEvent::CouponDeclined { token, message }) => {
            if request.token != token {
                return Err(FlowTransitionError::StaleResult { token });
            }
            (
                CouponState::Rejected { code: request.code.clone(), message },
                vec![ClearDiscount, ShowError],
            )
        }
        (_, CouponEvent::DiscountGranted { token, .. })
        | (_, CouponEvent::CouponDeclined { token, .. }) => {
            return Err(FlowTransitionError::StaleResult { token });
        }
        (_, CouponEvent::ApplyRequested(_)) => {
            return Err(FlowTransitionError::InvalidTransition { state: from, event: kind });
        }
    };

    Ok(TransitionOutcome { from, to, event: kind, actions })
}
