use rand::Rng;

/// A delivery OTP is exactly four ASCII decimal digits.
pub fn is_well_formed(otp: &str) -> bool {
    otp.len() == 4 && otp.bytes().all(|b| b.is_ascii_digit())
}

/// Generates a fresh delivery OTP.
pub fn generate() -> String {
    let code: u16 = rand::thread_rng().gen_range(1000..=9999);
    code.to_string()
}
