use shared::domain::Identity;

use crate::session::SessionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Photo(String),
    Initial(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationBadge {
    Verified,
    Unverified,
}

impl VerificationBadge {
    pub fn label(self) -> &'static str {
        match self {
            VerificationBadge::Verified => "Verified",
            VerificationBadge::Unverified => "Unverified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub avatar: Avatar,
    pub badge: VerificationBadge,
}

impl ProfileSummary {
    pub fn from_identity(identity: &Identity) -> Self {
        let display_name = non_empty(identity.display_name.as_deref());
        let avatar = match non_empty(identity.photo_url.as_deref()) {
            Some(url) => Avatar::Photo(url.to_string()),
            None => Avatar::Initial(
                display_name
                    .and_then(first_upper)
                    .or_else(|| first_upper(&identity.email))
                    .unwrap_or('U'),
            ),
        };

        Self {
            display_name: display_name.unwrap_or("Unnamed user").to_string(),
            email: identity.email.clone(),
            phone: non_empty(identity.phone_number.as_deref())
                .unwrap_or("No phone on file")
                .to_string(),
            avatar,
            badge: if identity.email_verified {
                VerificationBadge::Verified
            } else {
                VerificationBadge::Unverified
            },
        }
    }
}

/// What the MainArea dashboard shows for a given session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dashboard {
    Loading,
    SignedOut,
    Ready(ProfileSummary),
}

impl Dashboard {
    pub fn from_session(snapshot: &SessionSnapshot) -> Self {
        if snapshot.is_resolving {
            return Dashboard::Loading;
        }
        match &snapshot.current_identity {
            Some(identity) => Dashboard::Ready(ProfileSummary::from_identity(identity)),
            None => Dashboard::SignedOut,
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Dashboard::Loading => Some("Loading..."),
            Dashboard::SignedOut => Some("Please sign in to view your dashboard."),
            Dashboard::Ready(_) => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn first_upper(value: &str) -> Option<char> {
    value.chars().next().and_then(|c| c.to_uppercase().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_for_missing_profile_fields() {
        let identity = Identity::new("u1", "me@x.com");
        let summary = ProfileSummary::from_identity(&identity);
        assert_eq!(summary.display_name, "Unnamed user");
        assert_eq!(summary.phone, "No phone on file");
        assert_eq!(summary.avatar, Avatar::Initial('M'));
        assert_eq!(summary.badge.label(), "Unverified");
    }

    #[test]
    fn prefers_photo_then_display_name_initial() {
        let mut identity = Identity::new("u1", "me@x.com").verified();
        identity.display_name = Some("zoe".into());
        assert_eq!(
            ProfileSummary::from_identity(&identity).avatar,
            Avatar::Initial('Z')
        );

        identity.photo_url = Some("https://img.example/zoe.png".into());
        let summary = ProfileSummary::from_identity(&identity);
        assert_eq!(
            summary.avatar,
            Avatar::Photo("https://img.example/zoe.png".into())
        );
        assert_eq!(summary.display_name, "zoe");
        assert_eq!(summary.badge, VerificationBadge::Verified);
    }

    #[test]
    fn empty_email_and_name_use_default_initial() {
        let mut identity = Identity::new("u1", "");
        identity.display_name = Some(String::new());
        assert_eq!(
            ProfileSummary::from_identity(&identity).avatar,
            Avatar::Initial('U')
        );
    }

    #[test]
    fn dashboard_tracks_session_state() {
        let resolving = SessionSnapshot::default();
        assert_eq!(Dashboard::from_session(&resolving), Dashboard::Loading);
        assert_eq!(
            Dashboard::from_session(&resolving).placeholder(),
            Some("Loading...")
        );

        let signed_out = SessionSnapshot {
            current_identity: None,
            is_resolving: false,
        };
        assert_eq!(Dashboard::from_session(&signed_out), Dashboard::SignedOut);

        let signed_in = SessionSnapshot {
            current_identity: Some(Identity::new("u1", "me@x.com")),
            is_resolving: false,
        };
        assert!(matches!(
            Dashboard::from_session(&signed_in),
            Dashboard::Ready(ref summary) if summary.email == "me@x.com"
        ));
    }
}
