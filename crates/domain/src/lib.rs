//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod activity;
mod exemption;
mod policy;
mod scope;
mod subject;

pub use activity::ActivityEvent;
pub use exemption::{
    ESTABLISHED_ACCOUNT_MIN_AGE_DAYS, ESTABLISHED_ACCOUNT_MIN_SUBMISSION_POINTS, Exemption,
    ExemptionRule,
};
pub use policy::{QuotaDecision, QuotaPolicy, QuotaPolicyInput, QuotaPolicySet, QuotaViolation};
pub use scope::{Scope, ScopeMode, ScopeName};
pub use subject::{ActionKind, Subject, SubjectId};
