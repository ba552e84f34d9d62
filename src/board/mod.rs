/// 반응형 현황판 피드
/// 저장소 구독과 주기적 스윕으로 파생 상태를 다시 계산해 watch 채널로
/// 발행한다. 데이터 변경이 없어도 시간이 지나면 경매가 종료되므로
/// 1초 간격 스윕이 상태 전환을 보장한다.
/// 파생 계산 자체는 전부 auction::engine의 순수 함수에 위임한다.
// region:    --- Imports
use crate::auction::engine;
use crate::bidding::model::{Bid, Lifecycle, Offer, Settlement};
use crate::sources::{SharedBidSource, SharedClock, SharedOfferSource, SharedUserDirectory};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- View Models

/// 오퍼 상세 화면용 파생 상태
#[derive(Debug, Serialize, Clone)]
pub struct OfferDetail {
    pub offer: Offer,
    /// 입찰 이력 (최신 입찰이 앞)
    pub bids: Vec<Bid>,
    pub lifecycle: Lifecycle,
    pub winning_bid: Option<Bid>,
    /// 낙찰자 이메일. 종료된 오퍼에서만 채워진다
    pub winner_contact: Option<String>,
}

/// 판매자 현황판용 파생 상태
#[derive(Debug, Serialize, Clone, Default)]
pub struct OwnerBoard {
    /// 진행 중인 내 오퍼 (스냅샷 순서 보존)
    pub active: Vec<Offer>,
    /// 종료된 내 오퍼의 낙찰 결과
    pub finished: Vec<Settlement>,
}

// endregion: --- View Models

// region:    --- Offer Detail Feed

/// 단일 오퍼 상세 피드
/// 오퍼/입찰 스냅샷 변경과 스윕 틱마다 상태를 다시 계산한다.
/// 낙찰자 연락처는 (종료 여부, 낙찰자) 키가 바뀔 때만 다시 조회하며,
/// 키가 바뀌면 이전 값을 먼저 비워 다른 낙찰자의 연락처가 남지 않게 한다.
pub struct OfferDetailFeed {
    offer_id: String,
    offers: SharedOfferSource,
    bids: SharedBidSource,
    directory: SharedUserDirectory,
    clock: SharedClock,
    sweep: Duration,
}

impl OfferDetailFeed {
    pub fn new(
        offer_id: impl Into<String>,
        offers: SharedOfferSource,
        bids: SharedBidSource,
        directory: SharedUserDirectory,
        clock: SharedClock,
        sweep: Duration,
    ) -> Self {
        Self {
            offer_id: offer_id.into(),
            offers,
            bids,
            directory,
            clock,
            // interval은 0 주기를 허용하지 않으므로 최소 1ms로 보정한다
            sweep: sweep.max(Duration::from_millis(1)),
        }
    }

    /// 피드 시작. 수신자가 모두 사라지면 태스크는 스스로 종료한다.
    pub fn start(self) -> watch::Receiver<Option<OfferDetail>> {
        let (tx, rx) = watch::channel(None);
        info!("{:<12} --> 오퍼 상세 피드 시작: {}", "DetailFeed", self.offer_id);
        tokio::spawn(async move {
            self.run(tx).await;
        });
        rx
    }

    async fn run(self, tx: watch::Sender<Option<OfferDetail>>) {
        let mut offer_rx = self.offers.subscribe_offer(&self.offer_id);
        let mut bids_rx = self.bids.subscribe_bids(&self.offer_id);
        let mut sweep = interval(self.sweep);

        // 연락처 재조회 키: (종료 여부, 낙찰자 식별자)
        let mut contact_key: Option<(bool, Option<String>)> = None;
        let mut contact: Option<String> = None;

        loop {
            let now = self.clock.local_now();
            let offer = offer_rx.borrow_and_update().clone();
            let bid_list = bids_rx.borrow_and_update().clone();

            let detail = match offer {
                None => None,
                Some(offer) => {
                    let lifecycle = engine::classify_lifecycle(&offer, now);
                    let winning_bid = engine::resolve_winning_bid(&bid_list).cloned();

                    let key = (
                        lifecycle.is_finished(),
                        winning_bid.as_ref().map(|bid| bid.user_id.clone()),
                    );
                    if contact_key.as_ref() != Some(&key) {
                        // 키가 바뀌면 이전 연락처를 버리고 새로 조회한다
                        contact = engine::resolve_winner_contact(
                            &offer,
                            winning_bid.as_ref(),
                            now,
                            &*self.directory,
                        )
                        .await;
                        contact_key = Some(key);
                    }

                    // 입찰 이력은 최신 입찰이 앞에 오도록 정렬
                    let mut history = bid_list;
                    history.sort_by(|a, b| {
                        (b.date.as_str(), b.id.as_str()).cmp(&(a.date.as_str(), a.id.as_str()))
                    });

                    Some(OfferDetail {
                        offer,
                        bids: history,
                        lifecycle,
                        winning_bid,
                        winner_contact: contact.clone(),
                    })
                }
            };

            debug!(
                "{:<12} --> 오퍼 상태 재계산: {}",
                "DetailFeed", self.offer_id
            );
            if tx.send(detail).is_err() {
                break;
            }

            tokio::select! {
                changed = offer_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = bids_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = sweep.tick() => {}
            }
        }
        debug!(
            "{:<12} --> 오퍼 상세 피드 종료: {}",
            "DetailFeed", self.offer_id
        );
    }
}

// endregion: --- Offer Detail Feed

// region:    --- Owner Board Feed

/// 판매자 현황판 피드
/// 전체 오퍼 스냅샷을 판매자 기준으로 걸러 (진행 중, 종료)로 분할하고,
/// 종료된 오퍼마다 낙찰 결과를 계산한다. 판매자 식별자는 생성 시점에
/// 명시적으로 받는다.
pub struct OwnerBoardFeed {
    owner_id: String,
    offers: SharedOfferSource,
    bids: SharedBidSource,
    directory: SharedUserDirectory,
    clock: SharedClock,
    sweep: Duration,
}

impl OwnerBoardFeed {
    pub fn new(
        owner_id: impl Into<String>,
        offers: SharedOfferSource,
        bids: SharedBidSource,
        directory: SharedUserDirectory,
        clock: SharedClock,
        sweep: Duration,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            offers,
            bids,
            directory,
            clock,
            // interval은 0 주기를 허용하지 않으므로 최소 1ms로 보정한다
            sweep: sweep.max(Duration::from_millis(1)),
        }
    }

    /// 피드 시작. 수신자가 모두 사라지면 태스크는 스스로 종료한다.
    pub fn start(self) -> watch::Receiver<OwnerBoard> {
        let (tx, rx) = watch::channel(OwnerBoard::default());
        info!(
            "{:<12} --> 판매자 현황판 피드 시작: {}",
            "OwnerFeed", self.owner_id
        );
        tokio::spawn(async move {
            self.run(tx).await;
        });
        rx
    }

    async fn run(self, tx: watch::Sender<OwnerBoard>) {
        let mut offers_rx = self.offers.subscribe_all();
        let mut sweep = interval(self.sweep);

        // 오퍼별 연락처 캐시: 낙찰자 키가 같은 동안만 재사용
        let mut contacts: HashMap<String, (Option<String>, Option<String>)> = HashMap::new();

        loop {
            let now = self.clock.local_now();
            let snapshot = offers_rx.borrow_and_update().clone();
            let mine = engine::filter_by_owner(&snapshot, &self.owner_id);
            let (active, finished) = engine::partition_offers(&mine, now);

            let mut settlements = Vec::with_capacity(finished.len());
            for offer in &finished {
                // 종료된 오퍼의 입찰은 스윕 시점 점 조회로 충분하다
                let bid_list = self.bids.subscribe_bids(&offer.id).borrow().clone();
                let winning_bid = engine::resolve_winning_bid(&bid_list).cloned();

                let key = winning_bid.as_ref().map(|bid| bid.user_id.clone());
                let contact = match contacts.get(&offer.id) {
                    Some((cached_key, cached_contact)) if *cached_key == key => {
                        cached_contact.clone()
                    }
                    _ => {
                        let fresh = engine::resolve_winner_contact(
                            offer,
                            winning_bid.as_ref(),
                            now,
                            &*self.directory,
                        )
                        .await;
                        contacts.insert(offer.id.clone(), (key, fresh.clone()));
                        fresh
                    }
                };

                settlements.push(Settlement {
                    offer: offer.clone(),
                    winning_bid,
                    winner_contact: contact,
                });
            }
            contacts.retain(|offer_id, _| finished.iter().any(|offer| offer.id == *offer_id));

            debug!(
                "{:<12} --> 현황판 재계산: {} (진행 {} / 종료 {})",
                "OwnerFeed",
                self.owner_id,
                active.len(),
                settlements.len()
            );
            if tx
                .send(OwnerBoard {
                    active,
                    finished: settlements,
                })
                .is_err()
            {
                break;
            }

            tokio::select! {
                changed = offers_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = sweep.tick() => {}
            }
        }
        debug!(
            "{:<12} --> 판매자 현황판 피드 종료: {}",
            "OwnerFeed", self.owner_id
        );
    }
}

// endregion: --- Owner Board Feed
