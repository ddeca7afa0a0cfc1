#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use api_billing::provider::{
    BillingProvider, CheckoutSessionParams, CreatedCheckoutSession, DryRunProvider,
};
use async_trait::async_trait;
use chrono::Utc;
use common::{
    env_config::{BillingConfig, Config, JwtConfig, RecordStoreKind, StripeConfig},
    error::{AppError, Res},
    jwt,
};
use db::{
    MemoryStore, RecordStore,
    models::{plan::Plan, user::User},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const FAKE_SESSION_ID: &str = "cs_test_a1b2c3";
pub const FAKE_CHECKOUT_URL: &str = "https://checkout.stripe.com/c/pay/cs_test_a1b2c3";
pub const FAKE_PORTAL_URL: &str = "https://billing.stripe.com/p/session/test_123";

/// Builds the billing app the way `main` does, against a [`TestState`].
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.config.clone()))
                .app_data(actix_web::web::Data::new($state.record_store()))
                .app_data(actix_web::web::Data::new($state.provider.clone()))
                .wrap(extractor::middleware())
                .service(actix_web::web::scope("/api").configure(api_billing::configure)),
        )
        .await
    };
}

/// Records what the routes asked of the provider.
#[derive(Default)]
pub struct FakeProvider {
    pub fail: bool,
    pub checkouts: Mutex<Vec<CheckoutSessionParams>>,
    pub portals: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeProvider {
    pub fn failing() -> Self {
        FakeProvider {
            fail: true,
            ..Default::default()
        }
    }

    pub fn checkout_calls(&self) -> Vec<CheckoutSessionParams> {
        self.checkouts.lock().unwrap().clone()
    }

    pub fn portal_calls(&self) -> Vec<(String, Option<String>)> {
        self.portals.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingProvider for FakeProvider {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Res<CreatedCheckoutSession> {
        self.checkouts.lock().unwrap().push(params.clone());
        if self.fail {
            return Err(AppError::Internal("card network down".to_string()));
        }
        Ok(CreatedCheckoutSession {
            id: FAKE_SESSION_ID.to_string(),
            url: FAKE_CHECKOUT_URL.to_string(),
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: Option<&str>,
    ) -> Res<String> {
        self.portals
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.map(str::to_string)));
        if self.fail {
            return Err(AppError::Internal("portal disabled".to_string()));
        }
        Ok(FAKE_PORTAL_URL.to_string())
    }
}

pub fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        record_store: RecordStoreKind::Memory,
        database_url: String::new(),
        jwt_config: JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiration_hours: 1,
        },
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        num_workers: 1,
        cors_allowed_origin: "http://localhost:3000".to_string(),
        console_logging_enabled: false,
        log_file: "test.log".to_string(),
        stripe: StripeConfig {
            secret_key: "sk_test_123".to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            webhook_tolerance_secs: 300,
            checkout_dry_run: false,
        },
        billing: BillingConfig::default(),
    }
}

pub struct TestState {
    pub config: Arc<Config>,
    pub store: Arc<MemoryStore>,
    pub fake: Arc<FakeProvider>,
    pub provider: Arc<dyn BillingProvider>,
}

impl TestState {
    pub fn new() -> Self {
        Self::with(test_config(), FakeProvider::default())
    }

    pub fn with(config: Config, fake: FakeProvider) -> Self {
        let fake = Arc::new(fake);
        TestState {
            config: Arc::new(config),
            store: Arc::new(MemoryStore::new()),
            provider: fake.clone(),
            fake,
        }
    }

    pub fn dry_run() -> Self {
        let mut config = test_config();
        config.stripe.checkout_dry_run = true;
        let mut state = Self::with(config, FakeProvider::default());
        state.provider = Arc::new(DryRunProvider) as Arc<dyn BillingProvider>;
        state
    }

    pub fn record_store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    pub fn seed_plan(&self, name: &str, price_id: &str, usage_limit: i32) -> Plan {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: name.to_string(),
            stripe_price_id: price_id.to_string(),
            usage_limit,
        };
        self.store.insert_plan(plan.clone());
        plan
    }

    pub fn seed_user(&self, email: &str) -> User {
        let user = User::new_free(email, self.config.billing.free_tier_usage_limit);
        self.store.insert_user(user.clone());
        user
    }

    pub fn seed_customer(&self, email: &str, customer_id: &str) -> User {
        let mut user = User::new_free(email, self.config.billing.free_tier_usage_limit);
        user.stripe_customer_id = Some(customer_id.to_string());
        self.store.insert_user(user.clone());
        user
    }

    pub async fn user(&self, id: Uuid) -> User {
        self.store.find_user_by_id(id).await.unwrap().unwrap()
    }

    pub fn bearer(&self, user_id: Uuid) -> (&'static str, String) {
        let token = jwt::generate_jwt(user_id, &self.config.jwt_config).unwrap();
        ("Authorization", format!("Bearer {}", token))
    }
}

/// `Stripe-Signature` header for `payload`, signed at `timestamp`.
pub fn signature_at(payload: &str, timestamp: i64) -> (&'static str, String) {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    let sig = hex::encode(mac.finalize().into_bytes());
    ("Stripe-Signature", format!("t={},v1={}", timestamp, sig))
}

pub fn signature(payload: &str) -> (&'static str, String) {
    signature_at(payload, Utc::now().timestamp())
}
