//! Seller onboarding workflows.

pub mod applications;
