//! 密码重置令牌

use rand::Rng;
use rand::distr::Alphanumeric;

pub const RESET_TOKEN_LENGTH: usize = 64;

/// 由线程本地 CSPRNG 生成 64 位字母数字令牌
pub fn generate_reset_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }
}
