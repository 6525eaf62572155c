use crate::error::FieldError;

const USERNAME_MIN: usize = 3;
const PASSWORD_MIN: usize = 8;

pub fn username(value: &str) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::UsernameRequired);
    }
    if value.chars().count() < USERNAME_MIN {
        return Err(FieldError::UsernameInvalidLength);
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::EmailRequired);
    }
    if !is_well_formed_email(value) {
        return Err(FieldError::EmailInvalid);
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Err(FieldError::PasswordRequired);
    }
    if value.chars().count() < PASSWORD_MIN {
        return Err(FieldError::PasswordInvalidLength);
    }
    Ok(())
}

pub fn comment_message(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::CommentMessageRequired);
    }
    Ok(())
}

pub fn refresh_token(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::RefreshTokenRequired);
    }
    Ok(())
}

pub fn code(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::CodeRequired);
    }
    Ok(())
}

// local@domain.tld, no whitespace, single '@'
fn is_well_formed_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert_eq!(username(""), Err(FieldError::UsernameRequired));
        assert_eq!(username("  "), Err(FieldError::UsernameRequired));
        assert_eq!(username("al"), Err(FieldError::UsernameInvalidLength));
        assert_eq!(username("ali"), Ok(()));
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(email(""), Err(FieldError::EmailRequired));
        assert_eq!(email("a@x.com"), Ok(()));
        assert_eq!(email("first.last@mail.example.org"), Ok(()));

        for bad in ["ax.com", "@x.com", "a@x", "a@.com", "a@x.com.", "a@@x.com", "a b@x.com", "a@x..com"] {
            assert_eq!(email(bad), Err(FieldError::EmailInvalid), "{}", bad);
        }
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(password(""), Err(FieldError::PasswordRequired));
        assert_eq!(password("short"), Err(FieldError::PasswordInvalidLength));
        assert_eq!(password("password1"), Ok(()));
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(comment_message("   "), Err(FieldError::CommentMessageRequired));
        assert_eq!(comment_message("nice"), Ok(()));
        assert_eq!(refresh_token(""), Err(FieldError::RefreshTokenRequired));
        assert_eq!(code(""), Err(FieldError::CodeRequired));
    }
}
