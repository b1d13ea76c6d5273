use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use pricewatch_api::AppServices;
use pricewatch_catalog::PriceRecord;
use pricewatch_client::{
    CatalogClient, ChannelNotifier, ClientPriceCache, PriceNotification, PriceSubscriber,
    Reconciler, SharedPriceCache,
};
use pricewatch_core::{MinorUnits, PriceId, ProductId, StoreId};

fn update(product: i64, store: i64, price: i64) -> String {
    format!(r#"{{"type":"PRICE_UPDATE","data":{{"productId":{product},"storeId":{store},"price":{price}}}}}"#)
}

fn cache_holding_product_1() -> SharedPriceCache {
    let mut cache = ClientPriceCache::new();
    let records: Vec<PriceRecord> = [(1, 600), (2, 500)]
        .into_iter()
        .map(|(store, price)| PriceRecord {
            id: PriceId::new(store),
            product_id: ProductId::new(1),
            store_id: StoreId::new(store),
            price: MinorUnits::new(price).unwrap(),
            last_updated: chrono::Utc::now(),
        })
        .collect();
    cache.load_product(ProductId::new(1), &records);
    cache.shared()
}

fn price(cache: &SharedPriceCache, product: i64, store: i64) -> Option<i64> {
    cache
        .read()
        .unwrap()
        .price(ProductId::new(product), StoreId::new(store))
        .map(MinorUnits::get)
}

async fn next_notification(rx: &mut mpsc::Receiver<PriceNotification>) -> PriceNotification {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("notifier dropped")
}

/// Serve `/ws` connections; connection `n` (0-based) is sent `scripts[n]` and then closed.
/// Connections beyond the script list stay open and silent.
async fn spawn_scripted_server(scripts: Vec<Vec<String>>) -> (Url, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}/ws", listener.local_addr().unwrap())).unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        loop {
            let Ok((tcp, _)) = listener.accept().await else { return };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let script = scripts.get(n).cloned();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else { return };
                match script {
                    Some(frames) => {
                        for text in frames {
                            let _ = ws.send(Message::Text(text)).await;
                        }
                        let _ = ws.close(None).await;
                    }
                    None => {
                        use futures_util::StreamExt;
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                }
            });
        }
    });

    (url, accepted)
}

fn subscriber(url: Url, cache: SharedPriceCache) -> (PriceSubscriber, mpsc::Receiver<PriceNotification>) {
    let (notifier, rx) = ChannelNotifier::new(16);
    let reconciler = Arc::new(Reconciler::new(cache, Arc::new(notifier)));
    let sub = PriceSubscriber::new(url, reconciler).with_reconnect_delay(Duration::from_millis(50));
    (sub, rx)
}

#[tokio::test]
async fn malformed_messages_do_not_stop_the_loop() {
    let (url, _) = spawn_scripted_server(vec![vec![
        "not json".to_string(),
        r#"{"type":"PRICE_UPDATE","data":{"productId":1}}"#.to_string(),
        update(1, 1, 650),
    ]])
    .await;
    let cache = cache_holding_product_1();
    let (sub, mut notes) = subscriber(url, cache.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(sub.run(shutdown_rx));

    let n = next_notification(&mut notes).await;
    assert_eq!(n.new_price.get(), 650);
    assert_eq!(n.old_price.map(MinorUnits::get), Some(600));
    assert_eq!(price(&cache, 1, 1), Some(650));
    assert_eq!(price(&cache, 1, 2), Some(500));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn reconnects_after_close_with_fixed_delay() {
    let (url, accepted) = spawn_scripted_server(vec![
        vec![update(1, 1, 610)],
        vec![],
        vec![update(1, 2, 490)],
    ])
    .await;
    let cache = cache_holding_product_1();
    let (sub, mut notes) = subscriber(url, cache.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(sub.run(shutdown_rx));

    assert_eq!(next_notification(&mut notes).await.new_price.get(), 610);
    assert_eq!(next_notification(&mut notes).await.new_price.get(), 490);
    assert!(accepted.load(Ordering::SeqCst) >= 3);
    assert_eq!(price(&cache, 1, 1), Some(610));
    assert_eq!(price(&cache, 1, 2), Some(490));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn keeps_retrying_while_server_is_down_and_stops_on_shutdown() {
    // Reserve a port, then free it so every connect is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}/ws", listener.local_addr().unwrap())).unwrap();
    drop(listener);

    let (sub, _notes) = subscriber(url, cache_holding_product_1());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(sub.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!task.is_finished(), "subscriber gave up retrying");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}

/// Serve the real API router (seeded in-memory catalog) on `listener`.
fn spawn_api(listener: TcpListener) -> (Arc<AppServices>, tokio::task::JoinHandle<()>) {
    let services = Arc::new(AppServices::in_memory());
    let app = pricewatch_api::app::build_app_with(services.clone());
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (services, server)
}

async fn wait_for_price(cache: &SharedPriceCache, product: i64, store: i64, expected: i64) -> bool {
    for _ in 0..300 {
        if price(cache, product, store) == Some(expected) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn patch_price(api: &str, id: i64, price: i64) {
    let res = reqwest::Client::new()
        .patch(format!("{api}/api/prices/{id}"))
        .json(&serde_json::json!({ "price": price }))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
}

#[tokio::test]
async fn watched_products_load_once_the_api_comes_up() {
    // Nothing listens on this port until the API starts below.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = format!("http://{addr}");

    let catalog = CatalogClient::new(api.clone()).unwrap();
    let cache = ClientPriceCache::new().shared();
    assert_eq!(catalog.load_watched(&cache, &[ProductId::new(1)]).await, 0);
    assert!(cache.read().unwrap().holds(ProductId::new(1)));
    assert_eq!(price(&cache, 1, 1), None);

    let (sub, _notes) = subscriber(Url::parse(&format!("ws://{addr}/ws")).unwrap(), cache.clone());
    let sub = sub.with_catalog(catalog);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(sub.run(shutdown_rx));

    // Let a few connect attempts fail first.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let (services, server) = spawn_api(TcpListener::bind(addr).await.unwrap());

    assert!(
        wait_for_price(&cache, 1, 1, 649).await,
        "watched product was never fetched after the API came up"
    );
    assert_eq!(price(&cache, 1, 2), Some(599));

    for _ in 0..200 {
        if services.hub.session_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(services.hub.session_count(), 1);

    patch_price(&api, 1, 650).await;
    assert!(wait_for_price(&cache, 1, 1, 650).await, "push for watched product was ignored");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    server.abort();
}

#[tokio::test]
async fn catches_up_by_full_fetch_after_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (services, server) = spawn_api(listener);
    let api = format!("http://{addr}");

    let catalog = CatalogClient::new(api.clone()).unwrap();
    assert!(catalog.check_connectivity().await);
    let cache = ClientPriceCache::new().shared();
    catalog.load_product(&cache, ProductId::new(1)).await.unwrap();
    assert_eq!(price(&cache, 1, 1), Some(649));

    let (sub, _notes) = subscriber(Url::parse(&format!("ws://{addr}/ws")).unwrap(), cache.clone());
    let sub = sub.with_catalog(catalog);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(sub.run(shutdown_rx));

    for _ in 0..200 {
        if services.hub.session_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(services.hub.session_count(), 1);

    patch_price(&api, 1, 650).await;
    assert!(wait_for_price(&cache, 1, 1, 650).await);

    // Drop the client's session, then change a price it may never be pushed.
    services.hub.close_all();
    patch_price(&api, 2, 520).await;

    assert!(
        wait_for_price(&cache, 1, 2, 520).await,
        "client never caught up after reconnect"
    );
    assert_eq!(price(&cache, 1, 1), Some(650));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    server.abort();
}
