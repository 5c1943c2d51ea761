#[path = "prop_hash.rs"]
mod hash;
#[path = "prop_sign.rs"]
mod sign;
