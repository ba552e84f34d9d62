// region:    --- Imports
use auction_settlement::bidding::commands::{
    handle_delete_offer, handle_edit_offer, handle_place_bid, DeleteOfferCommand,
    EditOfferCommand, PlaceBidCommand,
};
use auction_settlement::bidding::model::{Offer, UserRecord};
use auction_settlement::board::{OfferDetailFeed, OwnerBoardFeed};
use auction_settlement::sources::{
    SharedBidSource, SharedClock, SharedOfferSource, SharedUserDirectory, SystemClock,
};
use auction_settlement::store::MemoryStore;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 스윕 주기 설정 (밀리초, 0은 무효)
    let sweep_ms = std::env::var("SWEEP_INTERVAL_MS")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .unwrap_or(1000);
    let sweep = Duration::from_millis(sweep_ms);
    info!("{:<12} --> 스윕 주기: {}ms", "Main", sweep_ms);

    // 시계와 인메모리 저장소 생성
    let clock: SharedClock = Arc::new(SystemClock);
    let store = MemoryStore::new_shared(Arc::clone(&clock));

    // 데모 사용자 시드
    store.insert_user(UserRecord {
        id: "user-001".to_string(),
        name: "김서연".to_string(),
        email: "seoyeon@example.com".to_string(),
    });
    store.insert_user(UserRecord {
        id: "user-002".to_string(),
        name: "이준호".to_string(),
        email: "junho@example.com".to_string(),
    });
    store.insert_user(UserRecord {
        id: "user-003".to_string(),
        name: "박민지".to_string(),
        email: "minji@example.com".to_string(),
    });

    // 데모 오퍼 시드 (모두 user-001 소유)
    let now = clock.local_now();
    let camera = store.insert_offer(Offer {
        id: String::new(),
        title: "빈티지 필름 카메라".to_string(),
        description: "1970년대 수동 필름 카메라".to_string(),
        price: 50000.0,
        end_date: (now + chrono::Duration::seconds(4))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string(),
        user_id: "user-001".to_string(),
        image_url: None,
    });
    let desk = store.insert_offer(Offer {
        id: String::new(),
        title: "원목 책상".to_string(),
        description: "폭 120cm 원목 책상".to_string(),
        price: 120000.0,
        end_date: (now - chrono::Duration::hours(1))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string(),
        user_id: "user-001".to_string(),
        image_url: None,
    });
    let sneakers = store.insert_offer(Offer {
        id: String::new(),
        title: "한정판 스니커즈".to_string(),
        description: "275mm 미착용".to_string(),
        price: 90000.0,
        end_date: (now + chrono::Duration::days(1))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string(),
        user_id: "user-001".to_string(),
        image_url: None,
    });

    // 공유 소스 핸들
    let offers: SharedOfferSource = store.clone();
    let bids: SharedBidSource = store.clone();
    let directory: SharedUserDirectory = store.clone();

    // 피드 시작
    let detail_rx = OfferDetailFeed::new(
        camera.id.clone(),
        Arc::clone(&offers),
        Arc::clone(&bids),
        Arc::clone(&directory),
        Arc::clone(&clock),
        sweep,
    )
    .start();
    let board_rx = OwnerBoardFeed::new(
        "user-001",
        Arc::clone(&offers),
        Arc::clone(&bids),
        Arc::clone(&directory),
        Arc::clone(&clock),
        sweep,
    )
    .start();

    // 입찰 시나리오: 시작가 50000원 카메라에 세 건의 유효 입찰과 한 건의 낮은 입찰
    for (bidder_id, bidder_name, amount) in [
        ("user-002", "이준호", 55000.0),
        ("user-003", "박민지", 52000.0),
        ("user-002", "이준호", 45000.0),
        ("user-003", "박민지", 60000.0),
    ] {
        let cmd = PlaceBidCommand {
            offer_id: camera.id.clone(),
            bidder_id: bidder_id.to_string(),
            bidder_name: bidder_name.to_string(),
            amount,
        };
        if let Err(e) = handle_place_bid(cmd, store.as_ref(), store.as_ref(), clock.as_ref()).await
        {
            error!("{:<12} --> 입찰 거절: {}", "Main", e);
        }
    }

    // 이미 종료된 오퍼에는 입찰할 수 없다
    let late = PlaceBidCommand {
        offer_id: desk.id.clone(),
        bidder_id: "user-002".to_string(),
        bidder_name: "이준호".to_string(),
        amount: 150000.0,
    };
    if let Err(e) = handle_place_bid(late, store.as_ref(), store.as_ref(), clock.as_ref()).await {
        error!("{:<12} --> 입찰 거절: {}", "Main", e);
    }

    // 소유자가 아니면 오퍼를 수정할 수 없다
    let foreign_edit = EditOfferCommand {
        offer_id: desk.id.clone(),
        title: "원목 책상 (가격 인하)".to_string(),
        description: desk.description.clone(),
        end_date: desk.end_date.clone(),
    };
    if let Err(e) = handle_edit_offer(foreign_edit, "user-002", store.as_ref()).await {
        error!("{:<12} --> 수정 거절: {}", "Main", e);
    }

    // 소유자는 수정할 수 있다
    let owner_edit = EditOfferCommand {
        offer_id: sneakers.id.clone(),
        title: "한정판 스니커즈 (미개봉)".to_string(),
        description: sneakers.description.clone(),
        end_date: sneakers.end_date.clone(),
    };
    if let Err(e) = handle_edit_offer(owner_edit, "user-001", store.as_ref()).await {
        error!("{:<12} --> 수정 거절: {}", "Main", e);
    }

    // 진행 중 상태 확인
    sleep(Duration::from_secs(1)).await;
    if let Some(detail) = detail_rx.borrow().clone() {
        info!(
            "{:<12} --> 상세 현황: {:?} / 최고 입찰 {:?} / 연락처 {:?}",
            "Main",
            detail.lifecycle,
            detail.winning_bid.as_ref().map(|bid| bid.amount),
            detail.winner_contact
        );
    }

    // 종료 시각이 지나면 스윕이 상태를 넘겨받아 낙찰자 연락처가 채워진다
    sleep(Duration::from_secs(4)).await;
    if let Some(detail) = detail_rx.borrow().clone() {
        info!(
            "{:<12} --> 상세 현황: {:?} / 최고 입찰 {:?} / 연락처 {:?}",
            "Main",
            detail.lifecycle,
            detail.winning_bid.as_ref().map(|bid| bid.amount),
            detail.winner_contact
        );
    }

    // 판매자 현황판 확인
    let board = board_rx.borrow().clone();
    info!(
        "{:<12} --> 현황판: 진행 {} / 종료 {}",
        "Main",
        board.active.len(),
        board.finished.len()
    );
    for settlement in &board.finished {
        info!(
            "{:<12} --> 낙찰 결과: {} / 낙찰가 {:?} / 연락처 {:?}",
            "Main",
            settlement.offer.title,
            settlement.winning_bid.as_ref().map(|bid| bid.amount),
            settlement.winner_contact
        );
    }

    // 오퍼 삭제 후 현황판에서 사라진다
    let drop_cmd = DeleteOfferCommand {
        offer_id: sneakers.id.clone(),
    };
    if let Err(e) = handle_delete_offer(drop_cmd, "user-001", store.as_ref()).await {
        error!("{:<12} --> 삭제 거절: {}", "Main", e);
    }
    sleep(Duration::from_millis(sweep_ms + 500)).await;
    let board = board_rx.borrow().clone();
    info!(
        "{:<12} --> 삭제 후 현황판: 진행 {} / 종료 {}",
        "Main",
        board.active.len(),
        board.finished.len()
    );

    Ok(())
}
// endregion: --- Main
