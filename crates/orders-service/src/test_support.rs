//! In-memory doubles for the record store and the distributed cache.

use crate::cache::DistributedCache;
use async_trait::async_trait;
use orders_core::{Order, OrdersError, OrdersResult};
use orders_repository::{OrderRepository, ScannedOrder};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub fn sample_order(order_uid: &str, track_number: &str) -> Order {
    Order::new(
        order_uid,
        track_number,
        format!(r#"{{"name":"Test Testov","city":"Kiryat Mozkin","track":"{}"}}"#, track_number),
        r#"{"transaction":"b563feb7b2b84b6test","currency":"USD","amount":1817}"#,
        r#"[{"chrt_id":9934930,"price":453,"name":"Mascaras"}]"#,
    )
    .unwrap()
}

pub fn sample_payload(order_uid: &str, track_number: &str) -> Vec<u8> {
    sample_order(order_uid, track_number).to_json().unwrap().into_bytes()
}

#[derive(Default)]
pub struct InMemoryRepository {
    orders: Mutex<BTreeMap<String, Order>>,
    malformed: Mutex<BTreeSet<String>>,
    failing: AtomicBool,
    find_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.orders.lock().unwrap();
            for order in orders {
                map.insert(order.order_uid.clone(), order);
            }
        }
        repo
    }

    /// Adds a row that the bulk scan reports as undecodable.
    pub fn add_malformed(&self, order_uid: &str) {
        self.malformed.lock().unwrap().insert(order_uid.to_string());
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn row_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn stored(&self, order_uid: &str) -> Option<Order> {
        self.orders.lock().unwrap().get(order_uid).cloned()
    }

    fn check_failing(&self) -> OrdersResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(OrdersError::Database("record store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn find_by_uid(&self, order_uid: &str) -> OrdersResult<Option<Order>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        Ok(self.orders.lock().unwrap().get(order_uid).cloned())
    }

    async fn insert_if_absent(&self, order: &Order) -> OrdersResult<bool> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        let mut orders = self.orders.lock().unwrap();
        if orders.contains_key(&order.order_uid) {
            return Ok(false);
        }
        orders.insert(order.order_uid.clone(), order.clone());
        Ok(true)
    }

    async fn find_recent(&self, limit: u32) -> OrdersResult<Vec<ScannedOrder>> {
        self.check_failing()?;
        let orders = self.orders.lock().unwrap();
        let malformed = self.malformed.lock().unwrap();

        let mut uids: Vec<&String> = orders.keys().chain(malformed.iter()).collect();
        uids.sort_unstable_by(|a, b| b.cmp(a));
        uids.dedup();

        Ok(uids
            .into_iter()
            .take(limit as usize)
            .map(|uid| {
                if malformed.contains(uid) {
                    Err(OrdersError::malformed(format!("Undecodable order row: {}", uid)))
                } else {
                    Ok(orders[uid].clone())
                }
            })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryDistributedCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
    failing: AtomicBool,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
}

impl InMemoryDistributedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.live_value(key).is_some()
    }

    /// Returns `Some(true)` if the live entry carries an expiry.
    pub fn expires(&self, key: &str) -> Option<bool> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|(_, deadline)| deadline.map_or(true, |d| Instant::now() < d))
            .map(|(_, deadline)| deadline.is_some())
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, None)) => Some(value.clone()),
            Some((value, Some(deadline))) if Instant::now() < *deadline => Some(value.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl DistributedCache for InMemoryDistributedCache {
    async fn get_raw(&self, key: &str) -> OrdersResult<Option<String>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(OrdersError::Cache("distributed cache unavailable".to_string()));
        }
        Ok(self.live_value(key))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> OrdersResult<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(OrdersError::Cache("distributed cache unavailable".to_string()));
        }
        let deadline = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
