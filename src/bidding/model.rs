use serde::{Deserialize, Serialize};

// 오퍼(판매 상품) 모델
// 외부 문서 저장소가 소유하는 레코드이며 본 서비스는 읽기만 한다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Offer {
    pub id: String,
    pub title: String,
    pub description: String,
    /// 시작가(최저 입찰 기준 가격)
    pub price: f64,
    /// 종료 시각. 타임존 없는 로컬 ISO-8601 문자열 (예: "2025-07-01T18:30:00")
    pub end_date: String,
    /// 판매자 식별자
    pub user_id: String,
    pub image_url: Option<String>,
}

// 입찰 모델
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Bid {
    /// 저장소가 부여하는 식별자. 입력 순서대로 사전식 증가
    pub id: String,
    pub offer_id: String,
    /// 입찰자 식별자
    pub user_id: String,
    /// 입찰자 표시 이름
    pub user_name: String,
    pub amount: f64,
    /// 입찰 시각. 타임존 포함 RFC 3339 문자열
    pub date: String,
}

// 사용자 모델
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// 경매 상태
/// 종료 시각이 파싱되지 않는 오퍼는 Unknown으로 분류하며,
/// 모든 소비자는 Unknown을 "종료되지 않음"으로 취급한다.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Finished,
    Unknown,
}

impl Lifecycle {
    pub fn is_finished(self) -> bool {
        matches!(self, Lifecycle::Finished)
    }
}

/// 낙찰 결과 (파생 데이터, 저장되지 않음)
/// 오퍼 또는 입찰 컬렉션이 변경될 때마다 처음부터 다시 계산한다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settlement {
    pub offer: Offer,
    pub winning_bid: Option<Bid>,
    /// 낙찰자 이메일. 종료된 오퍼에서 낙찰자가 조회된 경우에만 존재
    pub winner_contact: Option<String>,
}
