//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MOMENT_CARD_PREFIX, PHOTO_PREFIXES, PROVIDER_GOOGLE, PROVIDER_LOCAL};
use crate::reset_token::ResetToken;

/// Identity provider an account authenticates through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
}

impl AuthProvider {
    /// Federated accounts never authenticate with a password
    pub fn is_federated(&self) -> bool {
        matches!(self, AuthProvider::Google)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => PROVIDER_LOCAL,
            AuthProvider::Google => PROVIDER_GOOGLE,
        }
    }
}

impl From<&str> for AuthProvider {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case(PROVIDER_GOOGLE) {
            AuthProvider::Google
        } else {
            AuthProvider::Local
        }
    }
}

impl From<String> for AuthProvider {
    fn from(s: String) -> Self {
        AuthProvider::from(s.as_str())
    }
}

impl From<AuthProvider> for String {
    fn from(provider: AuthProvider) -> Self {
        provider.as_str().to_string()
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-case and trim an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim a photo reference; blank becomes `None`.
pub fn normalize_photo(photo: Option<&str>) -> Option<String> {
    photo
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Whether a (trimmed) photo reference is an inline image or a URL.
pub fn is_acceptable_photo(photo: &str) -> bool {
    let lower = photo.trim().to_ascii_lowercase();
    PHOTO_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// User domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    /// Identity id assigned by the federated provider
    pub external_id: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub display_name: String,
    pub slug: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub provider: AuthProvider,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub terms_accepted: bool,
    pub privacy_accepted: bool,
}

impl User {
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    pub fn has_slug(&self) -> bool {
        self.slug.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Give a legacy account its slug. Never replaces an existing one.
    pub fn assign_slug_if_missing(&mut self, slug: String) -> bool {
        if self.has_slug() {
            return false;
        }
        self.slug = Some(slug);
        true
    }

    /// Refresh profile fields reported by the identity provider.
    ///
    /// A blank incoming photo keeps the stored one.
    pub fn apply_federated_profile(&mut self, display_name: &str, photo: Option<&str>) {
        let display_name = display_name.trim();
        if !display_name.is_empty() {
            self.display_name = display_name.to_string();
        }
        if let Some(photo) = normalize_photo(photo) {
            self.photo_url = Some(photo);
        }
    }

    /// Attach a federated identity to an existing account.
    pub fn link_external_identity(&mut self, external_id: &str) {
        self.external_id = Some(external_id.to_string());
        self.provider = AuthProvider::Google;
    }

    /// Apply a user-initiated profile edit. Returns whether a photo was
    /// supplied but rejected.
    pub fn update_profile(
        &mut self,
        display_name: Option<&str>,
        bio: Option<&str>,
        photo: Option<&str>,
    ) -> bool {
        if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
            self.display_name = name.to_string();
        }
        if let Some(bio) = bio {
            self.bio = if bio.is_empty() {
                None
            } else {
                Some(bio.to_string())
            };
        }

        match normalize_photo(photo) {
            Some(photo) if is_acceptable_photo(&photo) => {
                self.photo_url = Some(photo);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn accept_agreements(&mut self, terms: bool, privacy: bool) {
        self.terms_accepted = terms;
        self.privacy_accepted = privacy;
    }

    /// Store a reset token, replacing any earlier one.
    pub fn set_reset_token(&mut self, token: &ResetToken) {
        self.password_reset_token = Some(token.code().to_string());
        self.password_reset_expires_at = Some(token.expires_at());
    }

    pub fn reset_token(&self) -> Option<ResetToken> {
        match (&self.password_reset_token, self.password_reset_expires_at) {
            (Some(code), Some(expires_at)) => Some(ResetToken::new(code.clone(), expires_at)),
            _ => None,
        }
    }

    /// Whether `presented` is this user's live reset code at `now`.
    pub fn reset_token_matches(&self, presented: &str, now: DateTime<Utc>) -> bool {
        self.reset_token()
            .is_some_and(|token| token.accepts(presented, now))
    }

    /// Card ids reviews about this user are filed under
    pub fn review_card_ids(&self) -> [String; 2] {
        [
            self.display_name.clone(),
            format!("{}{}", MOMENT_CARD_PREFIX, self.display_name),
        ]
    }
}

/// Data needed to insert a new account
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub external_id: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub display_name: String,
    pub slug: String,
    pub photo_url: Option<String>,
    pub provider: AuthProvider,
}

/// Public projection of a user (safe to return to client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub email: String,
    pub display_name: String,
    pub slug: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub provider: AuthProvider,
    pub is_active: bool,
    pub terms_accepted: bool,
    pub privacy_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            slug: user.slug.clone(),
            photo_url: user.photo_url.clone(),
            bio: user.bio.clone(),
            provider: user.provider,
            is_active: user.is_active,
            terms_accepted: user.terms_accepted,
            privacy_accepted: user.privacy_accepted,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView::from(&user)
    }
}

/// Follow and review counts shown on a public profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub stats_id: i32,
    pub followers: u64,
    pub following: u64,
    pub reviews: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        User {
            id: 7,
            external_id: None,
            email: "ayse@example.com".to_string(),
            password_hash: Some("$argon2id$stub".to_string()),
            display_name: "Ayşe".to_string(),
            slug: None,
            photo_url: Some("https://cdn.example.com/a.png".to_string()),
            bio: Some("Dog person".to_string()),
            provider: AuthProvider::Local,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
            password_reset_token: None,
            password_reset_expires_at: None,
            terms_accepted: false,
            privacy_accepted: false,
        }
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!(AuthProvider::from("google"), AuthProvider::Google);
        assert_eq!(AuthProvider::from("Google "), AuthProvider::Google);
        assert_eq!(AuthProvider::from("local"), AuthProvider::Local);
        assert_eq!(AuthProvider::from("anything"), AuthProvider::Local);
        assert_eq!(AuthProvider::Google.to_string(), "google");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ayse@Example.COM "), "ayse@example.com");
    }

    #[test]
    fn test_photo_helpers() {
        assert_eq!(normalize_photo(Some("   ")), None);
        assert_eq!(normalize_photo(None), None);
        assert_eq!(normalize_photo(Some(" http://x ")), Some("http://x".to_string()));

        assert!(is_acceptable_photo("HTTPS://cdn/x.png"));
        assert!(is_acceptable_photo("data:image/png;base64,AAAA"));
        assert!(!is_acceptable_photo("ftp://x"));
        assert!(!is_acceptable_photo("file.png"));
    }

    #[test]
    fn test_slug_assigned_only_once() {
        let mut user = sample_user();
        assert!(user.assign_slug_if_missing("ayse".to_string()));
        assert!(!user.assign_slug_if_missing("other".to_string()));
        assert_eq!(user.slug.as_deref(), Some("ayse"));
    }

    #[test]
    fn test_empty_slug_counts_as_missing() {
        let mut user = sample_user();
        user.slug = Some(String::new());
        assert!(user.assign_slug_if_missing("ayse".to_string()));
    }

    #[test]
    fn test_federated_profile_keeps_photo_on_blank() {
        let mut user = sample_user();
        user.apply_federated_profile("Ayşe Y.", Some("  "));

        assert_eq!(user.display_name, "Ayşe Y.");
        assert_eq!(user.photo_url.as_deref(), Some("https://cdn.example.com/a.png"));

        user.apply_federated_profile("", Some("https://new/p.png"));
        assert_eq!(user.display_name, "Ayşe Y.");
        assert_eq!(user.photo_url.as_deref(), Some("https://new/p.png"));
    }

    #[test]
    fn test_link_external_identity() {
        let mut user = sample_user();
        user.link_external_identity("g-123");

        assert_eq!(user.external_id.as_deref(), Some("g-123"));
        assert_eq!(user.provider, AuthProvider::Google);
    }

    #[test]
    fn test_update_profile_rejects_invalid_photo() {
        let mut user = sample_user();
        let rejected = user.update_profile(Some("New Name"), Some(""), Some("not-a-photo"));

        assert!(rejected);
        assert_eq!(user.display_name, "New Name");
        assert_eq!(user.bio, None);
        assert_eq!(user.photo_url.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_update_profile_accepts_data_image() {
        let mut user = sample_user();
        let rejected = user.update_profile(None, None, Some(" data:image/jpeg;base64,/9j/ "));

        assert!(!rejected);
        assert_eq!(user.photo_url.as_deref(), Some("data:image/jpeg;base64,/9j/"));
        assert_eq!(user.display_name, "Ayşe");
        assert_eq!(user.bio.as_deref(), Some("Dog person"));
    }

    #[test]
    fn test_reset_token_overwrite_and_match() {
        let now = Utc::now();
        let mut user = sample_user();
        user.set_reset_token(&ResetToken::new("111111", now + Duration::hours(1)));
        user.set_reset_token(&ResetToken::new("222222", now + Duration::hours(1)));

        assert!(!user.reset_token_matches("111111", now));
        assert!(user.reset_token_matches("222222", now));
        assert!(!user.reset_token_matches("222222", now + Duration::hours(2)));
    }

    #[test]
    fn test_view_hides_secrets() {
        let mut user = sample_user();
        user.set_reset_token(&ResetToken::new("123456", Utc::now()));
        let json = serde_json::to_string(&UserView::from(&user)).unwrap();

        assert!(!json.contains("password"));
        assert!(!json.contains("123456"));
        assert!(json.contains("displayName"));
    }

    #[test]
    fn test_review_card_ids() {
        let user = sample_user();
        let [plain, moment] = user.review_card_ids();

        assert_eq!(plain, user.display_name);
        assert_eq!(moment, format!("moment_{}", user.display_name));
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = UserStats {
            stats_id: 7,
            followers: 2,
            following: 1,
            reviews: 0,
        };
        let json = serde_json::to_value(stats).unwrap();

        assert_eq!(json["statsId"], 7);
        assert_eq!(json["followers"], 2);
    }
}
