pub mod engine;
pub mod states;

pub use engine::{CouponFlow, FlowTransitionError};
pub use states::{
    CouponAction, CouponEvent, CouponEventKind, CouponPhase, CouponRequest, CouponState,
    TransitionOutcome,
};
