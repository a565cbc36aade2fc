use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use quiz_common::{
    helpers::{parse_boolean_flag, parse_number},
    Coins,
    Secret,
};
use quiz_engine::{DeckApiOptions, ReconcilerOptions};

const DEFAULT_QUIZ_HOST: &str = "127.0.0.1";
const DEFAULT_QUIZ_PORT: u16 = 8360;
const DEFAULT_PAYMENT_API_URL: &str = "https://api.mercadopago.com";
const DEFAULT_PAYMENT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DECK_GENERATOR_TIMEOUT_SECS: u64 = 60;
const DEFAULT_DECK_COST: i64 = 50;
const DEFAULT_LOOKUP_RETRIES: u32 = 3;
const DEFAULT_LOOKUP_DELAY_MS: u64 = 500;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub payment: PaymentProviderConfig,
    pub deck_generator: DeckGeneratorConfig,
    /// What a generated deck costs its owner.
    pub deck_cost: Coins,
    /// How often the webhook handler looks for the local transaction of an approved payment before giving up.
    pub webhook_lookup_retries: u32,
    pub webhook_lookup_delay: Duration,
}

#[derive(Clone, Debug)]
pub struct PaymentProviderConfig {
    /// The base url of the payment provider's REST API.
    pub api_url: String,
    pub access_token: Secret<String>,
    /// Where the provider should deliver payment notifications. If empty, the provider's account default is used.
    pub notification_url: String,
    pub timeout: Duration,
    /// The secret used to sign webhook notifications.
    pub webhook_secret: Secret<String>,
    /// If false, webhook signatures are not checked. **DANGER**
    pub signature_checks: bool,
}

#[derive(Clone, Debug)]
pub struct DeckGeneratorConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_QUIZ_HOST.to_string(),
            port: DEFAULT_QUIZ_PORT,
            database_url: String::default(),
            payment: PaymentProviderConfig::default(),
            deck_generator: DeckGeneratorConfig::default(),
            deck_cost: Coins::from(DEFAULT_DECK_COST),
            webhook_lookup_retries: DEFAULT_LOOKUP_RETRIES,
            webhook_lookup_delay: Duration::from_millis(DEFAULT_LOOKUP_DELAY_MS),
        }
    }
}

impl Default for PaymentProviderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_PAYMENT_API_URL.to_string(),
            access_token: Secret::default(),
            notification_url: String::default(),
            timeout: Duration::from_secs(DEFAULT_PAYMENT_TIMEOUT_SECS),
            webhook_secret: Secret::default(),
            signature_checks: true,
        }
    }
}

impl Default for DeckGeneratorConfig {
    fn default() -> Self {
        Self { url: String::default(), timeout: Duration::from_secs(DEFAULT_DECK_GENERATOR_TIMEOUT_SECS) }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("QUIZ_HOST").ok().unwrap_or_else(|| DEFAULT_QUIZ_HOST.into());
        let port = number_from_env("QUIZ_PORT", DEFAULT_QUIZ_PORT);
        let database_url = env::var("QUIZ_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ QUIZ_DATABASE_URL is not set. Please set it to the URL for the quiz database.");
            String::default()
        });
        let payment = PaymentProviderConfig::from_env_or_defaults();
        let deck_generator = DeckGeneratorConfig::from_env_or_defaults();
        let deck_cost = Coins::from(number_from_env("QUIZ_DECK_COST", DEFAULT_DECK_COST));
        if !deck_cost.is_positive() {
            warn!("🪛️ QUIZ_DECK_COST is {deck_cost}. Generated decks will be free.");
        }
        let webhook_lookup_retries = number_from_env("QUIZ_WEBHOOK_LOOKUP_RETRIES", DEFAULT_LOOKUP_RETRIES);
        let webhook_lookup_delay =
            Duration::from_millis(number_from_env("QUIZ_WEBHOOK_LOOKUP_DELAY_MS", DEFAULT_LOOKUP_DELAY_MS));
        Self {
            host,
            port,
            database_url,
            payment,
            deck_generator,
            deck_cost,
            webhook_lookup_retries,
            webhook_lookup_delay,
        }
    }

    pub fn reconciler_options(&self) -> ReconcilerOptions {
        ReconcilerOptions {
            lookup_retries: self.webhook_lookup_retries,
            lookup_delay: self.webhook_lookup_delay,
            provider_timeout: self.payment.timeout,
        }
    }

    pub fn deck_options(&self) -> DeckApiOptions {
        DeckApiOptions { deck_cost: self.deck_cost, provider_timeout: self.deck_generator.timeout }
    }
}

impl PaymentProviderConfig {
    pub fn from_env_or_defaults() -> Self {
        let api_url = env::var("QUIZ_PAYMENT_API_URL").ok().unwrap_or_else(|| {
            info!("🪛️ QUIZ_PAYMENT_API_URL is not set. Using {DEFAULT_PAYMENT_API_URL}");
            DEFAULT_PAYMENT_API_URL.to_string()
        });
        let access_token = env::var("QUIZ_PAYMENT_ACCESS_TOKEN").ok().unwrap_or_else(|| {
            error!(
                "🪛️ QUIZ_PAYMENT_ACCESS_TOKEN is not set. Please set it to the access token for your payment provider \
                 account. Coin purchases will fail until it is set."
            );
            String::default()
        });
        let notification_url = env::var("QUIZ_PAYMENT_NOTIFICATION_URL").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ QUIZ_PAYMENT_NOTIFICATION_URL is not set. The provider will deliver notifications to the default \
                 url configured for your account."
            );
            String::default()
        });
        let timeout = Duration::from_secs(number_from_env("QUIZ_PAYMENT_TIMEOUT_SECS", DEFAULT_PAYMENT_TIMEOUT_SECS));
        let webhook_secret = Secret::new(env::var("QUIZ_WEBHOOK_SECRET").ok().unwrap_or_default());
        let signature_checks = parse_boolean_flag(env::var("QUIZ_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        match (signature_checks, webhook_secret.is_set()) {
            (true, false) => error!(
                "🪛️ Webhook signature checks are enabled, but QUIZ_WEBHOOK_SECRET is not set. Every payment \
                 notification will be rejected."
            ),
            (false, _) => warn!(
                "🚨️ Webhook signature checks are DISABLED. Anyone can trigger payment lookups. Do not run production \
                 like this."
            ),
            (true, true) => info!("🪛️ Webhook signature checks are enabled"),
        }
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: Secret::new(access_token),
            notification_url,
            timeout,
            webhook_secret,
            signature_checks,
        }
    }
}

impl DeckGeneratorConfig {
    pub fn from_env_or_defaults() -> Self {
        let url = env::var("QUIZ_DECK_GENERATOR_URL").ok().unwrap_or_else(|| {
            error!(
                "🪛️ QUIZ_DECK_GENERATOR_URL is not set. Please set it to the url of the deck generation service. Deck \
                 purchases and the daily deck will fail until it is set."
            );
            String::default()
        });
        let timeout = Duration::from_secs(number_from_env(
            "QUIZ_DECK_GENERATOR_TIMEOUT_SECS",
            DEFAULT_DECK_GENERATOR_TIMEOUT_SECS,
        ));
        Self { url, timeout }
    }
}

fn number_from_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    parse_number(env::var(name).ok(), default).unwrap_or_else(|e| {
        error!("🪛️ Invalid configuration value for {name}. {e} Using the default, {default}, instead.");
        default
    })
}
