//! Core library for the marketplace seller onboarding service.
//!
//! The one subsystem with real invariants lives under
//! [`workflows::onboarding::applications`]: the seller application review
//! workflow, from applicant submission through an administrator's terminal
//! approve/reject decision and the resulting account-role transition.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
