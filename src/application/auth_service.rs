use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use uuid::Uuid;

use crate::application::events::{EventBus, StoreEvent};
use crate::domain::errors::DomainError;
use crate::domain::identity::{
    normalize_email, AuthFailure, Credentials, Identity, NewProfile, Profile, SignUp,
};
use crate::domain::ports::ProfileRepository;

#[derive(Clone)]
pub struct AuthService {
    profiles: Arc<dyn ProfileRepository>,
    events: EventBus,
}

impl AuthService {
    pub fn new(profiles: Arc<dyn ProfileRepository>, events: EventBus) -> Self {
        Self { profiles, events }
    }

    pub fn sign_in(&self, credentials: &Credentials) -> Result<Identity, DomainError> {
        let stored = self
            .profiles
            .find_by_email(credentials.email())?
            .ok_or(AuthFailure::InvalidCredentials)?;

        let parsed = PasswordHash::new(&stored.password_hash)
            .map_err(|e| DomainError::Remote(format!("stored password hash is invalid: {e}")))?;
        Argon2::default()
            .verify_password(credentials.password().as_bytes(), &parsed)
            .map_err(|_| AuthFailure::InvalidCredentials)?;

        let identity = stored.profile.identity();
        log::info!("user {} signed in", identity.user_id);
        self.events.publish(StoreEvent::IdentityChanged {
            user_id: Some(identity.user_id),
        });
        Ok(identity)
    }

    pub fn sign_up(&self, request: SignUp) -> Result<Profile, DomainError> {
        let request = SignUp {
            email: normalize_email(&request.email),
            ..request
        };
        request.check()?;

        let email = request.email.clone();
        if self.profiles.find_by_email(&email)?.is_some() {
            return Err(AuthFailure::EmailTaken.into());
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(|e| DomainError::Remote(format!("password hashing failed: {e}")))?
            .to_string();

        let profile = self.profiles.create(NewProfile {
            id: Uuid::new_v4(),
            email,
            full_name: request.full_name.trim().to_string(),
            phone: request
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            password_hash,
        })?;

        log::info!("user {} signed up", profile.id);
        self.events.publish(StoreEvent::IdentityChanged {
            user_id: Some(profile.id),
        });
        Ok(profile)
    }

    pub fn sign_out(&self, identity: Option<&Identity>) {
        if let Some(identity) = identity {
            log::info!("user {} signed out", identity.user_id);
        }
        self.events
            .publish(StoreEvent::IdentityChanged { user_id: None });
    }

    /// Resolve a session identity against the profile store. A profile that
    /// has since been removed yields `None`.
    pub fn current_identity(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Option<Profile>, DomainError> {
        match identity {
            Some(identity) => self.profiles.find_by_id(identity.user_id),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryStore;

    fn service() -> (AuthService, EventBus) {
        let events = EventBus::new();
        let svc = AuthService::new(Arc::new(InMemoryStore::new()), events.clone());
        (svc, events)
    }

    fn request(email: &str, password: &str) -> SignUp {
        SignUp {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
            full_name: "Fern Gully".to_string(),
            phone: Some("  ".to_string()),
        }
    }

    #[test]
    fn sign_up_then_sign_in() {
        let (svc, _) = service();
        let profile = svc
            .sign_up(request("Fern@Example.com", "Greenery1"))
            .expect("sign up");
        assert_eq!(profile.email, "fern@example.com");
        assert_eq!(profile.phone, None);

        let creds = Credentials::try_new("fern@example.com", "Greenery1").expect("creds");
        let identity = svc.sign_in(&creds).expect("sign in");
        assert_eq!(identity.user_id, profile.id);
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let (svc, _) = service();
        svc.sign_up(request("fern@example.com", "Greenery1"))
            .expect("sign up");

        for (email, password) in [
            ("fern@example.com", "Greenery2"),
            ("nobody@example.com", "Greenery1"),
        ] {
            let creds = Credentials::try_new(email, password).expect("creds");
            assert!(matches!(
                svc.sign_in(&creds),
                Err(DomainError::Auth(AuthFailure::InvalidCredentials))
            ));
        }
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (svc, _) = service();
        svc.sign_up(request("fern@example.com", "Greenery1"))
            .expect("first");
        assert!(matches!(
            svc.sign_up(request("FERN@example.com", "Greenery1")),
            Err(DomainError::Auth(AuthFailure::EmailTaken))
        ));
    }

    #[test]
    fn weak_password_is_rejected() {
        let (svc, _) = service();
        assert!(matches!(
            svc.sign_up(request("fern@example.com", "password")),
            Err(DomainError::Auth(AuthFailure::WeakPassword))
        ));
    }

    #[test]
    fn identity_changes_are_published() {
        let (svc, events) = service();
        let mut rx = events.subscribe();

        let profile = svc
            .sign_up(request("fern@example.com", "Greenery1"))
            .expect("sign up");
        svc.sign_out(Some(&profile.identity()));

        assert_eq!(
            rx.try_recv(),
            Ok(StoreEvent::IdentityChanged {
                user_id: Some(profile.id)
            })
        );
        assert_eq!(
            rx.try_recv(),
            Ok(StoreEvent::IdentityChanged { user_id: None })
        );
    }

    #[test]
    fn current_identity_resolves_profile() {
        let (svc, _) = service();
        let profile = svc
            .sign_up(request("fern@example.com", "Greenery1"))
            .expect("sign up");
        assert_eq!(
            svc.current_identity(Some(&profile.identity()))
                .expect("lookup"),
            Some(profile)
        );
        assert_eq!(svc.current_identity(None).expect("lookup"), None);
    }
}
