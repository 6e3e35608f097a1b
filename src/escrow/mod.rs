pub mod orchestrator;
pub mod otp;
pub mod payout;
