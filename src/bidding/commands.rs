/// 쓰기 경계 커맨드 처리
/// 1. 입찰
/// 2. 오퍼 수정
/// 3. 오퍼 삭제
/// 요청자(현재 사용자)는 전역 상태가 아니라 호출자가 명시적으로 전달한다.
// region:    --- Imports
use crate::auction::engine;
use crate::sources::{BidSource, Clock, OfferSource};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub offer_id: String,
    pub bidder_id: String,
    pub bidder_name: String,
    pub amount: f64,
}

/// 오퍼 수정 명령
#[derive(Debug, Serialize, Deserialize)]
pub struct EditOfferCommand {
    pub offer_id: String,
    pub title: String,
    pub description: String,
    pub end_date: String,
}

/// 오퍼 삭제 명령
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteOfferCommand {
    pub offer_id: String,
}

/// 1. 입찰
/// 종료된 오퍼는 거절하고(Unknown은 진행 중으로 취급), 금액 검증을 통과한
/// 입찰만 제출한다. 성공 시 수용된 금액을 돌려준다. 재시도는 하지 않는다.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    offers: &dyn OfferSource,
    bids: &dyn BidSource,
    clock: &dyn Clock,
) -> Result<f64, serde_json::Value> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    // 오퍼 현재 스냅샷 조회
    let offer = offers
        .subscribe_offer(&cmd.offer_id)
        .borrow()
        .clone()
        .ok_or_else(|| {
            serde_json::json!({"error": "존재하지 않는 오퍼입니다.", "code": "NOT_FOUND"})
        })?;

    // 경매 상태 검증
    if engine::classify_lifecycle(&offer, clock.local_now()).is_finished() {
        return Err(
            serde_json::json!({"error": "경매가 이미 종료되었습니다.", "code": "ALREADY_ENDED"}),
        );
    }

    // 입찰 금액 검증
    if !engine::validate_bid_submission(&offer, cmd.amount) {
        return Err(serde_json::json!({
            "error": "입찰 금액은 시작가보다 높아야 합니다.",
            "code": "LOW_BID",
            "amount": cmd.amount,
        }));
    }

    // 입찰 제출
    bids.submit_bid(&cmd.offer_id, &cmd.bidder_id, &cmd.bidder_name, cmd.amount)
        .await?;
    Ok(cmd.amount)
}

/// 2. 오퍼 수정
/// 판매자 본인만 수정할 수 있다. 파싱되지 않는 종료 시각도 제출은 하되
/// 경고를 남긴다 (외부 저장소 데이터에는 이미 그런 값이 있을 수 있다).
pub async fn handle_edit_offer(
    cmd: EditOfferCommand,
    requester_id: &str,
    offers: &dyn OfferSource,
) -> Result<(), serde_json::Value> {
    info!("{:<12} --> 오퍼 수정 요청 처리 시작: {:?}", "Command", cmd);

    let offer = offers
        .subscribe_offer(&cmd.offer_id)
        .borrow()
        .clone()
        .ok_or_else(|| {
            serde_json::json!({"error": "존재하지 않는 오퍼입니다.", "code": "NOT_FOUND"})
        })?;

    if offer.user_id != requester_id {
        return Err(
            serde_json::json!({"error": "자신의 오퍼만 수정할 수 있습니다.", "code": "NOT_OWNER"}),
        );
    }

    if engine::parse_end_date(&cmd.end_date).is_none() {
        warn!(
            "{:<12} --> 파싱되지 않는 종료 시각으로 수정: {} ({})",
            "Command", cmd.offer_id, cmd.end_date
        );
    }

    offers
        .submit_edit(&cmd.offer_id, &cmd.title, &cmd.description, &cmd.end_date)
        .await
}

/// 3. 오퍼 삭제
/// 판매자 본인만 삭제할 수 있다.
pub async fn handle_delete_offer(
    cmd: DeleteOfferCommand,
    requester_id: &str,
    offers: &dyn OfferSource,
) -> Result<(), serde_json::Value> {
    info!("{:<12} --> 오퍼 삭제 요청 처리 시작: {:?}", "Command", cmd);

    let offer = offers
        .subscribe_offer(&cmd.offer_id)
        .borrow()
        .clone()
        .ok_or_else(|| {
            serde_json::json!({"error": "존재하지 않는 오퍼입니다.", "code": "NOT_FOUND"})
        })?;

    if offer.user_id != requester_id {
        return Err(
            serde_json::json!({"error": "자신의 오퍼만 삭제할 수 있습니다.", "code": "NOT_OWNER"}),
        );
    }

    offers.submit_delete(&cmd.offer_id).await
}

// endregion: --- Commands
