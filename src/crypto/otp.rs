use rand::Rng;

/// Four-digit one-time code mailed for email verification.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_four_digits() {
        for _ in 0..500 {
            let code = generate_code();
            assert_eq!(code.len(), 4);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }
}
