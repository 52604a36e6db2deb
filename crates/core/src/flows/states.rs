use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies one coupon validation round-trip so late answers can be told apart
/// from the request currently pending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRequest {
    pub token: u64,
    pub code: String,
    pub subtotal: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponState {
    #[default]
    Idle,
    Validating { request: CouponRequest },
    Applied { code: String, discount: Decimal, subtotal: Decimal },
    Rejected { code: String, message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponPhase {
    Idle,
    Validating,
    Applied,
    Rejected,
}

impl CouponState {
    pub fn phase(&self) -> CouponPhase {
        match self {
            Self::Idle => CouponPhase::Idle,
            Self::Validating { .. } => CouponPhase::Validating,
            Self::Applied { .. } => CouponPhase::Applied,
            Self::Rejected { .. } => CouponPhase::Rejected,
        }
    }

    /// The discount that may be trusted right now; zero unless a coupon is applied.
    pub fn discount(&self) -> Decimal {
        match self {
            Self::Applied { discount, .. } => *discount,
            _ => Decimal::ZERO,
        }
    }

    pub fn applied_code(&self) -> Option<&str> {
        match self {
            Self::Applied { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponEvent {
    ApplyRequested(CouponRequest),
    DiscountGranted { token: u64, discount: Decimal },
    CouponDeclined { token: u64, message: String },
    CodeEdited,
    TravelerCountChanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponEventKind {
    ApplyRequested,
    DiscountGranted,
    CouponDeclined,
    CodeEdited,
    TravelerCountChanged,
}

impl CouponEvent {
    pub fn kind(&self) -> CouponEventKind {
        match self {
            Self::ApplyRequested(_) => CouponEventKind::ApplyRequested,
            Self::DiscountGranted { .. } => CouponEventKind::DiscountGranted,
            Self::CouponDeclined { .. } => CouponEventKind::CouponDeclined,
            Self::CodeEdited => CouponEventKind::CodeEdited,
            Self::TravelerCountChanged => CouponEventKind::TravelerCountChanged,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponAction {
    CallOfferService,
    ApplyDiscount,
    ClearDiscount,
    ShowError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: CouponPhase,
    pub to: CouponState,
    pub event: CouponEventKind,
    pub actions: Vec<CouponAction>,
}
