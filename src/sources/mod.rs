/// 외부 데이터 소스 계약
/// 오퍼/입찰/사용자 레코드는 외부 문서 저장소가 소유한다고 가정하고,
/// 본 서비스는 아래 트레이트를 통해서만 구독과 제출을 수행한다.
// region:    --- Imports
use crate::bidding::model::{Bid, Offer, UserRecord};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

// endregion: --- Imports

// region:    --- Source Traits

/// 오퍼 소스
/// 구독은 완전한 스냅샷을 나르는 watch 채널이다. 중간 스냅샷을 건너뛰어도
/// 각 스냅샷이 자체 완결이므로 최신 값만 보면 된다.
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// 전체 오퍼 컬렉션 구독
    fn subscribe_all(&self) -> watch::Receiver<Vec<Offer>>;

    /// 단일 오퍼 구독. 없는(또는 삭제된) 오퍼는 None으로 흐른다.
    fn subscribe_offer(&self, offer_id: &str) -> watch::Receiver<Option<Offer>>;

    /// 오퍼 수정 제출
    async fn submit_edit(
        &self,
        offer_id: &str,
        title: &str,
        description: &str,
        end_date: &str,
    ) -> Result<(), serde_json::Value>;

    /// 오퍼 삭제 제출
    async fn submit_delete(&self, offer_id: &str) -> Result<(), serde_json::Value>;
}

/// 입찰 소스
#[async_trait]
pub trait BidSource: Send + Sync {
    /// 오퍼별 입찰 컬렉션 구독
    fn subscribe_bids(&self, offer_id: &str) -> watch::Receiver<Vec<Bid>>;

    /// 입찰 제출. 금액 규칙(시작가 초과)은 제출 시점에만 검증된다.
    async fn submit_bid(
        &self,
        offer_id: &str,
        user_id: &str,
        user_name: &str,
        amount: f64,
    ) -> Result<(), serde_json::Value>;
}

/// 사용자 디렉터리
/// 조회 실패(없는 사용자, 일시적 오류)는 모두 None으로 수렴한다.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, user_id: &str) -> Option<UserRecord>;
}

pub type SharedOfferSource = Arc<dyn OfferSource>;
pub type SharedBidSource = Arc<dyn BidSource>;
pub type SharedUserDirectory = Arc<dyn UserDirectory>;

// endregion: --- Source Traits

// region:    --- Clock

/// 시계
/// 경매 상태 분류는 타임존 없는 로컬 시각을, 입찰 기록은 UTC를 쓴다.
pub trait Clock: Send + Sync {
    fn local_now(&self) -> NaiveDateTime;
    fn utc_now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

/// 시스템 시계
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// endregion: --- Clock
