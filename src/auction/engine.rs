/// 경매 상태 파생 엔진
/// 1. 종료 시각 기준 경매 상태 분류 (Active / Finished / Unknown)
/// 2. 낙찰 입찰 결정 (최고 금액, 동률이면 최신 입찰)
/// 3. 낙찰자 연락처 조회
/// 구독 콜백에 파생 로직을 심지 않고, 입력 컬렉션과 현재 시각만으로
/// 결정되는 순수 함수로 분리해 둔다.
// region:    --- Imports
use crate::bidding::model::{Bid, Lifecycle, Offer, Settlement};
use crate::sources::UserDirectory;
use chrono::NaiveDateTime;
use std::cmp::Ordering;

// endregion: --- Imports

// region:    --- Lifecycle

/// 종료 시각 문자열 포맷. 초/소수점 초는 생략될 수 있다.
const END_DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// 종료 시각 파싱. 실패해도 오류를 전파하지 않는다.
pub fn parse_end_date(raw: &str) -> Option<NaiveDateTime> {
    END_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// 경매 상태 분류
/// 종료 시각이 현재 시각보다 엄격히 이전이면 Finished,
/// 경계 시각(종료 시각 == 현재 시각)은 Active로 취급한다.
/// 파싱 불가능한 종료 시각은 항상 Unknown 하나로만 분류한다.
pub fn classify_lifecycle(offer: &Offer, now: NaiveDateTime) -> Lifecycle {
    match parse_end_date(&offer.end_date) {
        Some(end) if end < now => Lifecycle::Finished,
        Some(_) => Lifecycle::Active,
        None => Lifecycle::Unknown,
    }
}

/// 오퍼 컬렉션을 (진행 중, 종료) 순서 보존 분할
/// Unknown은 종료되지 않은 것으로 보고 진행 중 쪽에 둔다.
pub fn partition_offers(offers: &[Offer], now: NaiveDateTime) -> (Vec<Offer>, Vec<Offer>) {
    let mut active = Vec::new();
    let mut finished = Vec::new();
    for offer in offers {
        if classify_lifecycle(offer, now).is_finished() {
            finished.push(offer.clone());
        } else {
            active.push(offer.clone());
        }
    }
    (active, finished)
}

/// 판매자 기준 필터링. 현재 사용자 식별자는 호출자가 명시적으로 전달한다.
pub fn filter_by_owner(offers: &[Offer], owner_id: &str) -> Vec<Offer> {
    offers
        .iter()
        .filter(|offer| offer.user_id == owner_id)
        .cloned()
        .collect()
}

// endregion: --- Lifecycle

// region:    --- Winning Bid

/// 낙찰 입찰 결정
/// 최고 금액(부동소수점 완전 일치 기준) 입찰 중 date 문자열이 가장 큰
/// 입찰이 낙찰이며, date까지 같으면 id가 큰 쪽을 택한다.
/// id는 저장소가 입력 순서대로 사전식 증가로 부여하므로 결과는 결정적이다.
pub fn resolve_winning_bid(bids: &[Bid]) -> Option<&Bid> {
    let max_amount = bids
        .iter()
        .map(|bid| bid.amount)
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))?;

    bids.iter()
        .filter(|bid| bid.amount == max_amount)
        .max_by_key(|bid| (bid.date.as_str(), bid.id.as_str()))
}

// endregion: --- Winning Bid

// region:    --- Bid Validation

/// 입찰 금액 검증
/// 유한한 양수이면서 시작가보다 엄격히 커야 한다. 시작가와 같은 금액은 거절.
pub fn validate_bid_submission(offer: &Offer, amount: f64) -> bool {
    amount.is_finite() && amount > 0.0 && amount > offer.price
}

/// 입력 문자열 기반 입찰 금액 검증
/// 숫자가 아니거나 검증에 실패하면 조용히 None을 돌려준다.
pub fn validate_bid_input(offer: &Offer, raw: &str) -> Option<f64> {
    let amount = raw.trim().parse::<f64>().ok()?;
    validate_bid_submission(offer, amount).then_some(amount)
}

// endregion: --- Bid Validation

// region:    --- Settlement

/// 낙찰자 연락처 조회
/// 종료된 오퍼에 낙찰 입찰이 있을 때만 사용자 디렉터리를 조회한다.
/// 조회 실패(없는 사용자 포함)는 연락처 없음으로 처리한다.
pub async fn resolve_winner_contact(
    offer: &Offer,
    winning_bid: Option<&Bid>,
    now: NaiveDateTime,
    directory: &dyn UserDirectory,
) -> Option<String> {
    if !classify_lifecycle(offer, now).is_finished() {
        return None;
    }
    let winner = winning_bid?;
    directory.lookup(&winner.user_id).await.map(|user| user.email)
}

/// 오퍼 하나에 대한 낙찰 결과 계산
pub async fn settle_offer(
    offer: &Offer,
    bids: &[Bid],
    now: NaiveDateTime,
    directory: &dyn UserDirectory,
) -> Settlement {
    let winning_bid = resolve_winning_bid(bids);
    let winner_contact = resolve_winner_contact(offer, winning_bid, now, directory).await;
    Settlement {
        offer: offer.clone(),
        winning_bid: winning_bid.cloned(),
        winner_contact,
    }
}

// endregion: --- Settlement
