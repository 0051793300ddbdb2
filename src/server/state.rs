use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::client::{AsyncUpstreamClient, AsyncUpstreamClientImpl, UpstreamClient};
use crate::config::Config;
use crate::metrics::Metrics;
use crate::pricing::TradeRates;
use crate::rate_limit::SlidingWindowLimiter;
use crate::repositories::{
    InventoryRepository, ListingPublisher, ShopifyPublisher, SupabaseInventoryRepository,
};
use crate::services::{
    CardService, CardServiceImpl, InventoryService, InventoryServiceImpl, PriceLookupService,
    PriceLookupServiceImpl,
};
use crate::sources::{
    EbaySource, OneThirtyPointSource, PsaAuctionSource, PsaCertClient, TcgPlayerCatalog,
    TcgPlayerSource,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub onethirty: Arc<dyn PriceLookupService>,
    pub psa: Arc<dyn PriceLookupService>,
    pub ebay: Arc<dyn PriceLookupService>,
    pub tcgplayer: Arc<dyn PriceLookupService>,
    pub cards: Arc<dyn CardService>,
    pub inventory: Arc<dyn InventoryService>,
    pub trade_rates: TradeRates,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub metrics: Metrics,
}

/// Sweepers and other periodic tasks started with the state.
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Abort every task.
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

impl AppState {
    /// Wire sources, services and repositories from configuration and start
    /// the periodic cache sweeps. Must be called from within a tokio runtime.
    pub fn start(config: &Config, metrics: Metrics) -> (Self, BackgroundTasks) {
        let client: Arc<dyn AsyncUpstreamClient> = Arc::new(AsyncUpstreamClientImpl::new(
            UpstreamClient::new(config, metrics.clone()),
        ));

        let onethirty = PriceLookupServiceImpl::new(
            Arc::new(OneThirtyPointSource::new(
                client.clone(),
                config.onethirty_base_url.clone(),
            )),
            config.onethirty_cache_ttl_secs,
            metrics.clone(),
        );
        let psa = PriceLookupServiceImpl::new(
            Arc::new(PsaAuctionSource::new(client.clone(), config.psa_base_url.clone())),
            config.psa_cache_ttl_secs,
            metrics.clone(),
        );
        let ebay = PriceLookupServiceImpl::new(
            Arc::new(EbaySource::new(
                client.clone(),
                config.ebay_base_url.clone(),
                config.ebay_oauth_token.clone(),
            )),
            config.ebay_cache_ttl_secs,
            metrics.clone(),
        );
        let tcgplayer = PriceLookupServiceImpl::new(
            Arc::new(TcgPlayerSource::new(
                client.clone(),
                config.tcgplayer_mp_api_url.clone(),
            )),
            config.tcgplayer_cache_ttl_secs,
            metrics.clone(),
        );
        let cards = CardServiceImpl::new(
            Arc::new(TcgPlayerCatalog::new(
                client.clone(),
                config.tcgplayer_search_url.clone(),
            )),
            Arc::new(PsaCertClient::new(
                client.clone(),
                config.psa_api_base_url.clone(),
                config.psa_api_token.clone(),
            )),
            config.tcgplayer_cache_ttl_secs,
            metrics.clone(),
        );

        let repository = match (&config.supabase_url, &config.supabase_service_key) {
            (Some(url), Some(key)) => Some(Arc::new(SupabaseInventoryRepository::new(
                client.clone(),
                url,
                key.clone(),
            )) as Arc<dyn InventoryRepository>),
            _ => {
                info!("Supabase is not configured; inventory routes will answer 503");
                None
            }
        };
        let publisher = match (&config.shopify_store_url, &config.shopify_access_token) {
            (Some(url), Some(token)) => Some(Arc::new(ShopifyPublisher::new(
                client.clone(),
                url.clone(),
                token.clone(),
            )) as Arc<dyn ListingPublisher>),
            _ => {
                info!("Shopify is not configured; publishing will answer 503");
                None
            }
        };

        let limiter = Arc::new(SlidingWindowLimiter::new(config.rate_limit_per_minute));

        let period = config.cache_sweep_interval();
        let handles = vec![
            onethirty.cache().spawn_sweeper("130point", period),
            psa.cache().spawn_sweeper("psa", period),
            ebay.cache().spawn_sweeper("ebay", period),
            tcgplayer.cache().spawn_sweeper("tcgplayer", period),
            cards.cache().spawn_sweeper("tcgplayer-search", period),
            spawn_limiter_cleanup(limiter.clone(), period),
        ];

        let state = Self {
            onethirty: Arc::new(onethirty),
            psa: Arc::new(psa),
            ebay: Arc::new(ebay),
            tcgplayer: Arc::new(tcgplayer),
            cards: Arc::new(cards),
            inventory: Arc::new(InventoryServiceImpl::new(repository, publisher)),
            trade_rates: TradeRates::new(
                f64::from(config.cash_percentage),
                f64::from(config.credit_percentage),
            ),
            limiter,
            metrics,
        };

        (state, BackgroundTasks { handles })
    }
}

/// Drop rate-limit entries for clients that have gone quiet.
fn spawn_limiter_cleanup(limiter: Arc<SlidingWindowLimiter>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.cleanup_idle();
            if removed > 0 {
                tracing::debug!(removed, "Pruned idle rate-limit clients");
            }
        }
    })
}
