use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newsletter sign-up as sent by the site footer form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscriber {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl NewSubscriber {
    /// Trimmed names and a lowercased address, used for uniqueness checks.
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_ascii_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn from_new(id: i64, subscribed_at: DateTime<Utc>, new: NewSubscriber) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            subscribed_at,
        }
    }
}

/// Minimal `local@domain.tld` shape check; delivery is the real validation.
pub fn plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(plausible_email("fan@example.com"));
        assert!(plausible_email("first.last@mail.example.org"));
        assert!(!plausible_email("no-at-sign.com"));
        assert!(!plausible_email("@example.com"));
        assert!(!plausible_email("fan@localhost"));
        assert!(!plausible_email("fan@@example.com"));
        assert!(!plausible_email("f an@example.com"));
    }

    #[test]
    fn normalization_lowercases_email() {
        let subscriber = NewSubscriber {
            first_name: " Dolly ".to_string(),
            last_name: "Parton".to_string(),
            email: " Dolly@Example.COM ".to_string(),
        }
        .normalized();

        assert_eq!(subscriber.first_name, "Dolly");
        assert_eq!(subscriber.email, "dolly@example.com");
    }
}
