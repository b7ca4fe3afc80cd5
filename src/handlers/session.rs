//! Cookie session access for handlers: the signed-in identity and the
//! in-progress checkout flow.

use actix_session::Session;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::domain::checkout::CheckoutFlow;
use crate::domain::identity::Identity;
use crate::errors::AppError;

pub(crate) const IDENTITY_KEY: &str = "identity";
pub(crate) const CHECKOUT_KEY: &str = "checkout";

#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Start a fresh session for `identity`. Anything stored under the
    /// previous identity, including a checkout, is dropped.
    pub fn sign_in(&self, identity: &Identity) -> Result<(), AppError> {
        // A purged session ignores inserts, so renew the key and clear instead.
        self.0.renew();
        self.0.clear();
        self.0
            .insert(IDENTITY_KEY, identity)
            .map_err(|e| AppError::Internal(format!("failed to persist session: {e}")))
    }

    pub fn sign_out(&self) {
        self.0.purge();
    }

    pub fn identity(&self) -> Result<Option<Identity>, AppError> {
        match self.0.get::<Identity>(IDENTITY_KEY) {
            Ok(identity) => Ok(identity),
            Err(e) => {
                log::warn!("discarding unreadable identity in session cookie: {e}");
                self.0.remove(IDENTITY_KEY);
                Ok(None)
            }
        }
    }

    pub fn require_identity(&self) -> Result<Identity, AppError> {
        self.identity()?.ok_or(AppError::Unauthenticated)
    }

    /// The stored flow, or a fresh one at the first step.
    pub fn checkout(&self) -> CheckoutFlow {
        match self.0.get::<CheckoutFlow>(CHECKOUT_KEY) {
            Ok(flow) => flow.unwrap_or_default(),
            Err(e) => {
                log::warn!("discarding unreadable checkout in session cookie: {e}");
                CheckoutFlow::new()
            }
        }
    }

    pub fn store_checkout(&self, flow: &CheckoutFlow) -> Result<(), AppError> {
        self.0
            .insert(CHECKOUT_KEY, flow)
            .map_err(|e| AppError::Internal(format!("failed to persist checkout: {e}")))
    }

    pub fn discard_checkout(&self) {
        self.0.remove(CHECKOUT_KEY);
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_session::storage::CookieSessionStore;
    use actix_session::SessionMiddleware;
    use actix_web::cookie::Key;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};
    use uuid::Uuid;

    use crate::domain::checkout::CheckoutStep;

    fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build()
    }

    #[actix_web::test]
    async fn identity_round_trips_and_sign_out_drops_checkout() {
        let user_id = Uuid::new_v4();
        let app = test::init_service(
            App::new()
                .wrap(session_middleware())
                .route(
                    "/sign-in",
                    web::post().to(move |session: SessionContext| async move {
                        session.sign_in(&Identity {
                            user_id,
                            email: "fern@example.com".to_string(),
                        })?;
                        let mut flow = CheckoutFlow::new();
                        flow.continue_to_address(1).map_err(AppError::from)?;
                        session.store_checkout(&flow)?;
                        Ok::<_, AppError>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/sign-out",
                    web::post().to(|session: SessionContext| async move {
                        session.sign_out();
                        HttpResponse::Ok()
                    }),
                )
                .route(
                    "/state",
                    web::get().to(|session: SessionContext| async move {
                        let identity = session.require_identity()?;
                        let step = session.checkout().step();
                        Ok::<_, AppError>(
                            HttpResponse::Ok().body(format!("{} {:?}", identity.user_id, step)),
                        )
                    }),
                ),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/sign-in").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/state")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(
            String::from_utf8_lossy(&body),
            format!("{} {:?}", user_id, CheckoutStep::Address)
        );

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/sign-out")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let cleared = res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("removal cookie")
            .into_owned();
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/state")
                .cookie(cleared)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn missing_identity_is_unauthenticated() {
        let app = test::init_service(App::new().wrap(session_middleware()).route(
            "/me",
            web::get().to(|session: SessionContext| async move {
                session.require_identity()?;
                Ok::<_, AppError>(HttpResponse::Ok())
            }),
        ))
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
