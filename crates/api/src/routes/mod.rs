pub mod call;
pub mod telephony;
