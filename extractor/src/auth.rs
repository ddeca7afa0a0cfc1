use std::sync::Arc;

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
};
use db::{RecordStore, models::user::User};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

pub const AUTH_REQUIRED: &str = "Authentication required";

/// User id from a bearer token the extraction middleware accepted.
pub fn claimed_user_id<M: HttpMessage>(msg: &M) -> Option<Uuid> {
    msg.extensions()
        .get::<Res<JwtClaims>>()
        .and_then(|claims| claims.as_ref().ok())
        .map(|claims| claims.user_id)
}

/// The authenticated caller's user record.
///
/// Extraction fails with a bad request when the token is missing or invalid,
/// or when no user record exists for the claimed id.
#[derive(Debug, Clone)]
pub struct AuthRecord(pub User);

impl FromRequest for AuthRecord {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user_id = claimed_user_id(req);
        let store = req.app_data::<web::Data<Arc<dyn RecordStore>>>().cloned();

        Box::pin(async move {
            let Some(user_id) = user_id else {
                log::info!("Authentication failed - no valid bearer token");
                return Err(AppError::bad_request(AUTH_REQUIRED));
            };
            let store = store
                .ok_or_else(|| AppError::Internal("record store not registered".to_string()))?;

            match store.find_user_by_id(user_id).await {
                Ok(Some(user)) => Ok(AuthRecord(user)),
                Ok(None) => {
                    log::info!("Authentication failed - no user record for {}", user_id);
                    Err(AppError::bad_request(AUTH_REQUIRED))
                }
                Err(e) => {
                    log::error!("Failed to load auth record {}: {}", user_id, e);
                    Err(AppError::bad_request(AUTH_REQUIRED))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use db::MemoryStore;

    use super::*;

    fn claims(user_id: Uuid) -> Res<JwtClaims> {
        Ok(JwtClaims {
            user_id,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        })
    }

    fn store_with(user: &User) -> web::Data<Arc<dyn RecordStore>> {
        let store = MemoryStore::new();
        store.insert_user(user.clone());
        let store: Arc<dyn RecordStore> = Arc::new(store);
        web::Data::new(store)
    }

    #[actix_web::test]
    async fn resolves_known_user() {
        let user = User::new_free("a@example.com", 15);
        let req = TestRequest::default()
            .app_data(store_with(&user))
            .to_http_request();
        req.extensions_mut().insert(claims(user.id));

        let AuthRecord(found) = AuthRecord::extract(&req).await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[actix_web::test]
    async fn missing_token_is_bad_request() {
        let user = User::new_free("a@example.com", 15);
        let req = TestRequest::default()
            .app_data(store_with(&user))
            .to_http_request();

        let err = AuthRecord::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == AUTH_REQUIRED));
    }

    #[actix_web::test]
    async fn unknown_user_is_bad_request() {
        let user = User::new_free("a@example.com", 15);
        let req = TestRequest::default()
            .app_data(store_with(&user))
            .to_http_request();
        req.extensions_mut().insert(claims(Uuid::new_v4()));

        assert!(AuthRecord::extract(&req).await.is_err());
    }

    #[actix_web::test]
    async fn rejected_token_yields_no_user_id() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut()
            .insert::<Res<JwtClaims>>(Err(AppError::Internal("bad token".into())));
        assert_eq!(claimed_user_id(&req), None);
    }
}
