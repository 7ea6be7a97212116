//! Users: profile lookup and the post-signup onboarding flow.

pub mod handlers;
