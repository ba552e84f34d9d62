/// 인메모리 데이터 저장소
/// 외부 문서 저장소를 대신하는 참조 구현으로, 데모와 테스트가 사용한다.
/// 쓰기마다 watch 채널로 완전한 스냅샷을 발행하며, 잠금을 쥔 채 발행해
/// 스냅샷 순서가 쓰기 순서와 일치하도록 한다.
// region:    --- Imports
use crate::auction::engine;
use crate::bidding::model::{Bid, Offer, UserRecord};
use crate::sources::{BidSource, OfferSource, SharedClock, UserDirectory};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::info;

// endregion: --- Imports

// region:    --- Store State

#[derive(Default)]
struct StoreState {
    offers: BTreeMap<String, Offer>,
    bids: BTreeMap<String, Vec<Bid>>,
    users: BTreeMap<String, UserRecord>,
    next_offer_seq: u64,
    next_bid_seq: u64,
    /// 단일 오퍼 구독 채널. 첫 구독 시점에 만들어 저장소와 수명을 같이한다.
    offer_txs: HashMap<String, watch::Sender<Option<Offer>>>,
    /// 오퍼별 입찰 구독 채널
    bid_txs: HashMap<String, watch::Sender<Vec<Bid>>>,
}

impl StoreState {
    fn offers_snapshot(&self) -> Vec<Offer> {
        self.offers.values().cloned().collect()
    }

    fn bids_snapshot(&self, offer_id: &str) -> Vec<Bid> {
        self.bids.get(offer_id).cloned().unwrap_or_default()
    }
}

// endregion: --- Store State

// region:    --- Memory Store

pub struct MemoryStore {
    state: Mutex<StoreState>,
    clock: SharedClock,
    offers_tx: watch::Sender<Vec<Offer>>,
}

impl MemoryStore {
    pub fn new(clock: SharedClock) -> Self {
        let (offers_tx, _) = watch::channel(Vec::new());
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
            offers_tx,
        }
    }

    pub fn new_shared(clock: SharedClock) -> Arc<Self> {
        Arc::new(Self::new(clock))
    }

    /// 오퍼 추가 (시드용). id가 비어 있으면 사전식 증가 id를 부여한다.
    /// 0 채움 폭 20은 u64 전 범위를 덮으므로 사전식 순서가 숫자 순서와 항상 일치한다.
    pub fn insert_offer(&self, mut offer: Offer) -> Offer {
        let mut state = self.state.lock().expect("lock");
        if offer.id.is_empty() {
            state.next_offer_seq += 1;
            offer.id = format!("offer-{:020}", state.next_offer_seq);
        }
        state.offers.insert(offer.id.clone(), offer.clone());
        Self::publish_offer(&mut state, &offer.id);
        self.offers_tx.send_replace(state.offers_snapshot());
        info!("{:<12} --> 오퍼 추가: {}", "Store", offer.id);
        offer
    }

    /// 사용자 추가 (시드용)
    pub fn insert_user(&self, user: UserRecord) {
        let mut state = self.state.lock().expect("lock");
        info!("{:<12} --> 사용자 추가: {}", "Store", user.id);
        state.users.insert(user.id.clone(), user);
    }

    /// 단일 오퍼 채널에 현재 값 발행
    fn publish_offer(state: &mut StoreState, offer_id: &str) {
        let current = state.offers.get(offer_id).cloned();
        if let Some(tx) = state.offer_txs.get(offer_id) {
            tx.send_replace(current);
        }
    }

    /// 오퍼별 입찰 채널에 현재 값 발행
    fn publish_bids(state: &mut StoreState, offer_id: &str) {
        let snapshot = state.bids_snapshot(offer_id);
        if let Some(tx) = state.bid_txs.get(offer_id) {
            tx.send_replace(snapshot);
        }
    }
}

// endregion: --- Memory Store

// region:    --- OfferSource 구현

#[async_trait]
impl OfferSource for MemoryStore {
    fn subscribe_all(&self) -> watch::Receiver<Vec<Offer>> {
        self.offers_tx.subscribe()
    }

    fn subscribe_offer(&self, offer_id: &str) -> watch::Receiver<Option<Offer>> {
        let mut state = self.state.lock().expect("lock");
        let current = state.offers.get(offer_id).cloned();
        state
            .offer_txs
            .entry(offer_id.to_string())
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    async fn submit_edit(
        &self,
        offer_id: &str,
        title: &str,
        description: &str,
        end_date: &str,
    ) -> Result<(), serde_json::Value> {
        let mut state = self.state.lock().expect("lock");
        let offer = state.offers.get_mut(offer_id).ok_or_else(|| {
            serde_json::json!({"error": "존재하지 않는 오퍼입니다.", "code": "NOT_FOUND"})
        })?;
        offer.title = title.to_string();
        offer.description = description.to_string();
        offer.end_date = end_date.to_string();

        Self::publish_offer(&mut state, offer_id);
        self.offers_tx.send_replace(state.offers_snapshot());
        info!("{:<12} --> 오퍼 수정: {}", "Store", offer_id);
        Ok(())
    }

    async fn submit_delete(&self, offer_id: &str) -> Result<(), serde_json::Value> {
        let mut state = self.state.lock().expect("lock");
        if state.offers.remove(offer_id).is_none() {
            return Err(
                serde_json::json!({"error": "존재하지 않는 오퍼입니다.", "code": "NOT_FOUND"}),
            );
        }
        // 오퍼에 귀속된 입찰도 함께 제거
        state.bids.remove(offer_id);

        Self::publish_offer(&mut state, offer_id);
        Self::publish_bids(&mut state, offer_id);
        self.offers_tx.send_replace(state.offers_snapshot());
        info!("{:<12} --> 오퍼 삭제: {}", "Store", offer_id);
        Ok(())
    }
}

// endregion: --- OfferSource 구현

// region:    --- BidSource 구현

#[async_trait]
impl BidSource for MemoryStore {
    fn subscribe_bids(&self, offer_id: &str) -> watch::Receiver<Vec<Bid>> {
        let mut state = self.state.lock().expect("lock");
        let current = state.bids_snapshot(offer_id);
        state
            .bid_txs
            .entry(offer_id.to_string())
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    /// 입찰 제출
    /// 금액 규칙(유한한 양수, 시작가 초과)만 여기서 강제한다. 경매 상태는
    /// 검사하지 않는다. 동시 제출은 마지막 쓰기가 이기는 외부 저장소 의미론.
    async fn submit_bid(
        &self,
        offer_id: &str,
        user_id: &str,
        user_name: &str,
        amount: f64,
    ) -> Result<(), serde_json::Value> {
        let mut state = self.state.lock().expect("lock");
        let offer = state.offers.get(offer_id).cloned().ok_or_else(|| {
            serde_json::json!({"error": "존재하지 않는 오퍼입니다.", "code": "NOT_FOUND"})
        })?;

        if !engine::validate_bid_submission(&offer, amount) {
            return Err(serde_json::json!({
                "error": "입찰 금액은 시작가보다 높아야 합니다.",
                "code": "LOW_BID",
                "price": offer.price,
            }));
        }

        state.next_bid_seq += 1;
        let bid = Bid {
            id: format!("bid-{:020}", state.next_bid_seq),
            offer_id: offer_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            amount,
            date: self.clock.utc_now().to_rfc3339(),
        };
        info!(
            "{:<12} --> 입찰 기록: {} {} {}",
            "Store", offer_id, bid.id, amount
        );
        state.bids.entry(offer_id.to_string()).or_default().push(bid);

        Self::publish_bids(&mut state, offer_id);
        Ok(())
    }
}

// endregion: --- BidSource 구현

// region:    --- UserDirectory 구현

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn lookup(&self, user_id: &str) -> Option<UserRecord> {
        let state = self.state.lock().expect("lock");
        state.users.get(user_id).cloned()
    }
}

// endregion: --- UserDirectory 구현
